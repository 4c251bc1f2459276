//! SQLite route cache
//!
//! Implements the `RouteCachePort` using SQLite. Route paths are stored as a
//! JSON array next to the scalar columns.

use std::sync::Arc;

use application::{error::ApplicationError, ports::RouteCachePort};
use async_trait::async_trait;
use chrono::Utc;
use domain::{Coordinate, RouteOption};
use rusqlite::{OptionalExtension, Row, params};
use tokio::task;
use tracing::{debug, instrument, warn};

use super::connection::ConnectionPool;

const SELECT_COLUMNS: &str =
    "SELECT id, name, description, duration_secs, distance, price, transport_type, points FROM routes";

/// SQLite-based route cache
#[derive(Debug, Clone)]
pub struct SqliteRouteCache {
    pool: Arc<ConnectionPool>,
}

impl SqliteRouteCache {
    /// Create a new SQLite route cache
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RouteCachePort for SqliteRouteCache {
    #[instrument(skip(self, routes), fields(count = routes.len()))]
    async fn upsert_all(&self, routes: &[RouteOption]) -> Result<(), ApplicationError> {
        if routes.is_empty() {
            return Ok(());
        }

        let pool = Arc::clone(&self.pool);
        let routes = routes.to_vec();

        task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;
            let tx = conn
                .transaction()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;
            let cached_at = Utc::now().to_rfc3339();

            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO routes (id, name, description, duration_secs, distance, price, transport_type, points, cached_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                         ON CONFLICT(id) DO UPDATE SET
                            name = excluded.name,
                            description = excluded.description,
                            duration_secs = excluded.duration_secs,
                            distance = excluded.distance,
                            price = excluded.price,
                            transport_type = excluded.transport_type,
                            points = excluded.points,
                            cached_at = excluded.cached_at",
                    )
                    .map_err(|e| ApplicationError::Internal(e.to_string()))?;

                for route in &routes {
                    let points = serde_json::to_string(&route.points)
                        .map_err(|e| ApplicationError::Internal(e.to_string()))?;
                    stmt.execute(params![
                        route.id,
                        route.name,
                        route.description,
                        i64::try_from(route.duration_secs).unwrap_or(i64::MAX),
                        route.distance,
                        route.price,
                        route.transport_type,
                        points,
                        cached_at,
                    ])
                    .map_err(|e| ApplicationError::Internal(e.to_string()))?;
                }
            }

            tx.commit()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            debug!(count = routes.len(), "Cached routes");
            Ok(())
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<RouteOption>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [&id], row_to_route)
                .optional()
                .map_err(|e| ApplicationError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<RouteOption>, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            let mut stmt = conn
                .prepare(&format!("{SELECT_COLUMNS} ORDER BY cached_at DESC, rowid ASC"))
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            let routes = stmt
                .query_map([], row_to_route)
                .map_err(|e| ApplicationError::Internal(e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            debug!(count = routes.len(), "Listed cached routes");
            Ok(routes)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            let affected = conn
                .execute("DELETE FROM routes WHERE id = ?1", [&id])
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            Ok(affected > 0)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            let affected = conn
                .execute("DELETE FROM routes", [])
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            debug!(count = affected, "Cleared route cache");
            Ok(affected)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}

fn row_to_route(row: &Row<'_>) -> rusqlite::Result<RouteOption> {
    let id: String = row.get(0)?;
    let duration_secs: i64 = row.get(3)?;
    let points_json: String = row.get(7)?;

    let points: Vec<Coordinate> = serde_json::from_str(&points_json).unwrap_or_else(|e| {
        warn!(route_id = %id, error = %e, "Dropping unreadable route path");
        Vec::new()
    });

    Ok(RouteOption {
        name: row.get(1)?,
        description: row.get(2)?,
        duration_secs: u64::try_from(duration_secs).unwrap_or(0),
        distance: row.get(4)?,
        price: row.get(5)?,
        transport_type: row.get(6)?,
        points,
        id,
    })
}
