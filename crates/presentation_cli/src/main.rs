//! Trip planner CLI
//!
//! Command-line front end for address search, route planning and the saved
//! route cache.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod app;
mod render;

use std::path::PathBuf;

use anyhow::{Context, bail};
use app::App;
use clap::{Parser, Subcommand};
use domain::{Endpoint, RouteSource};
use infrastructure::{AppConfig, init_telemetry};

/// Trip planner CLI
#[derive(Parser)]
#[command(name = "tripplanner-cli")]
#[command(author, version, about = "Plan trips between two addresses", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./config.toml if present)
    #[arg(short, long, env = "TRIPPLANNER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current device location and its address
    Locate,

    /// Look up address candidates
    ///
    /// Example: tripplanner-cli search "Tverskaya 7"
    Search {
        /// Free-form address text
        query: String,
    },

    /// Find routes between two places
    ///
    /// Each endpoint is an address, a "lat, lon" pair, or "current" for the
    /// device location (origin only).
    ///
    /// Example: tripplanner-cli plan --from current --to "Olympic Avenue 1"
    Plan {
        /// Origin
        #[arg(short, long)]
        from: String,

        /// Destination
        #[arg(short, long)]
        to: String,
    },

    /// Inspect or prune saved routes
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Subcommand)]
enum CacheCommand {
    /// List saved routes, newest first
    List,

    /// Show one saved route
    Show {
        /// Route identifier
        id: String,
    },

    /// Delete one saved route
    Delete {
        /// Route identifier
        id: String,
    },

    /// Delete every saved route
    Clear,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Resolve one endpoint from user text and store it in the planner
async fn resolve_endpoint(app: &App, input: &str, endpoint: Endpoint) -> anyhow::Result<()> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("current") {
        if endpoint == Endpoint::To {
            bail!("\"current\" can only be used as the origin");
        }
        app.planner.set_current_location().await;
        return Ok(());
    }

    if let Some(coordinate) = render::parse_coordinate(input) {
        app.planner.set_coordinate(coordinate, endpoint).await;
        return Ok(());
    }

    let min_chars = app.planner.config().min_query_chars;
    if input.chars().count() < min_chars {
        bail!("{} address must be at least {min_chars} characters", endpoint.label());
    }

    let candidates = app.planner.search_address(input, endpoint).await?;
    let Some(first) = candidates.first() else {
        bail!("No address found for '{input}'");
    };
    app.planner.select_result(first, endpoint);
    Ok(())
}

/// Print the effective configuration with the API key masked
fn print_config(mut config: AppConfig) -> anyhow::Result<()> {
    if !config.geocoding.api_key.is_empty() {
        config.geocoding.api_key = "***".to_string();
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

async fn locate(app: &App) -> anyhow::Result<()> {
    let coordinate = app.planner.set_current_location().await;
    let state = app.planner.snapshot();

    println!("📍 {}", state.from_address);
    println!("   {coordinate}");
    Ok(())
}

async fn search(app: &App, query: &str) -> anyhow::Result<()> {
    let query = query.trim();
    let min_chars = app.planner.config().min_query_chars;
    if query.chars().count() < min_chars {
        bail!("Query must be at least {min_chars} characters");
    }

    let candidates = app.planner.search_address(query, Endpoint::To).await?;
    if candidates.is_empty() {
        println!("No matches for '{query}'");
    }
    for (i, candidate) in candidates.iter().enumerate() {
        println!("{}", render::candidate_line(i, candidate));
    }
    Ok(())
}

async fn plan(app: &App, from: &str, to: &str) -> anyhow::Result<()> {
    resolve_endpoint(app, from, Endpoint::From).await?;
    resolve_endpoint(app, to, Endpoint::To).await?;

    let routes = app.planner.load_routes().await?;
    let state = app.planner.snapshot();

    println!(
        "🧭 {} → {}",
        state.address(Endpoint::From),
        state.address(Endpoint::To)
    );
    if state.route_source == RouteSource::Cached {
        println!("⚠️  Routing service unavailable, showing saved routes");
    }
    if let Some(error) = &state.last_error {
        eprintln!("⚠️  {error}");
    }
    if routes.is_empty() {
        println!("No routes found");
    }
    for (i, route) in routes.iter().enumerate() {
        println!("{}", render::route_line(i, route));
    }
    Ok(())
}

async fn cache(app: &App, action: CacheCommand) -> anyhow::Result<()> {
    let saved = app.planner.route_service();
    match action {
        CacheCommand::List => {
            let routes = saved.saved_routes().await?;
            if routes.is_empty() {
                println!("No saved routes");
            }
            for (i, route) in routes.iter().enumerate() {
                println!("{}", render::route_line(i, route));
            }
        },
        CacheCommand::Show { id } => {
            let route = saved.saved_route(&id).await?;
            println!("{}", render::route_details(&route));
        },
        CacheCommand::Delete { id } => {
            if saved.forget_route(&id).await? {
                println!("🗑️  Deleted {id}");
            } else {
                println!("No saved route with id {id}");
            }
        },
        CacheCommand::Clear => {
            let removed = saved.forget_all().await?;
            println!("🧹 Removed {removed} saved route(s)");
        },
    }
    Ok(())
}

async fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Config => print_config(config),
        Commands::Locate => locate(&App::build(&config)?).await,
        Commands::Search { query } => search(&App::build(&config)?, &query).await,
        Commands::Plan { from, to } => plan(&App::build(&config)?, &from, &to).await,
        Commands::Cache { action } => cache(&App::build(&config)?, action).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.telemetry.log_filter = filter.to_string();
    }
    init_telemetry(&config.telemetry)?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    run(cli.command, config).await
}
