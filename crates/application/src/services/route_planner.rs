//! Trip planning orchestrator
//!
//! Owns the [`PlanningState`] of one planning session and coordinates the
//! geocoding, location and routing collaborators. Every command may run
//! concurrently with any other; state lives behind a mutex that is never held
//! across an `.await`, and each mutation publishes a fresh snapshot on a
//! `watch` channel.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use domain::{AddressCandidate, Coordinate, DomainError, Endpoint, PlanningState, RouteOption};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::route_service::RouteService;
use crate::error::ApplicationError;
use crate::ports::{GeocodingPort, LocationPort};

/// Whether a failed route fetch is reported when cached routes are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackErrorPolicy {
    /// Show cached routes without reporting the failure
    #[default]
    Silent,
    /// Show cached routes and set `last_error`
    Surface,
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Shortest query (in characters) that is sent to the geocoder
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Quiet period before a typed query is searched (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Reporting of route fetch failures that fell back to the cache
    #[serde(default)]
    pub fallback_error_policy: FallbackErrorPolicy,
}

const fn default_min_query_chars() -> usize {
    3
}

const fn default_debounce_ms() -> u64 {
    500
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_query_chars: default_min_query_chars(),
            debounce_ms: default_debounce_ms(),
            fallback_error_policy: FallbackErrorPolicy::default(),
        }
    }
}

impl PlannerConfig {
    /// Debounce delay as a `Duration`
    #[must_use]
    pub const fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_query_chars == 0 {
            return Err("min_query_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}

struct Session {
    state: PlanningState,
    in_flight: usize,
}

/// Planning-session orchestrator
pub struct RoutePlanner {
    geocoding: Arc<dyn GeocodingPort>,
    location: Arc<dyn LocationPort>,
    routes: RouteService,
    config: PlannerConfig,
    session: Mutex<Session>,
    updates: watch::Sender<PlanningState>,
    search_ticket: AtomicU64,
}

impl fmt::Debug for RoutePlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePlanner")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

/// Keeps `is_loading` raised while alive
struct LoadingGuard<'a> {
    planner: &'a RoutePlanner,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.planner.modify(|session| {
            session.in_flight = session.in_flight.saturating_sub(1);
            session.state.is_loading = session.in_flight > 0;
        });
    }
}

impl RoutePlanner {
    /// Start a new planning session with empty state
    #[must_use]
    pub fn new(
        geocoding: Arc<dyn GeocodingPort>,
        location: Arc<dyn LocationPort>,
        routes: RouteService,
        config: PlannerConfig,
    ) -> Self {
        let (updates, _) = watch::channel(PlanningState::default());
        Self {
            geocoding,
            location,
            routes,
            config,
            session: Mutex::new(Session {
                state: PlanningState::default(),
                in_flight: 0,
            }),
            updates,
            search_ticket: AtomicU64::new(0),
        }
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> PlanningState {
        self.session.lock().state.clone()
    }

    /// Observe state changes; the receiver starts at the current value
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlanningState> {
        self.updates.subscribe()
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The route service used for loading
    #[must_use]
    pub const fn route_service(&self) -> &RouteService {
        &self.routes
    }

    fn modify<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.lock();
        let result = f(&mut session);
        self.updates.send_replace(session.state.clone());
        result
    }

    fn update<R>(&self, f: impl FnOnce(&mut PlanningState) -> R) -> R {
        self.modify(|session| f(&mut session.state))
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.modify(|session| {
            session.in_flight += 1;
            session.state.is_loading = true;
        });
        LoadingGuard { planner: self }
    }

    fn next_search_ticket(&self) -> u64 {
        self.search_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current_search(&self, ticket: u64) -> bool {
        self.search_ticket.load(Ordering::SeqCst) == ticket
    }

    /// Geocode a query for one endpoint and publish the candidates
    ///
    /// Queries shorter than `min_query_chars` are ignored without calling the
    /// geocoder. If another search starts while this one is in flight, this
    /// result is discarded, whichever endpoint the newer search is for: both
    /// endpoints share the single `search_results` list.
    ///
    /// # Errors
    ///
    /// Returns the geocoder error after clearing the suggestions and setting
    /// `last_error`.
    #[instrument(skip(self))]
    pub async fn search_address(
        &self,
        query: &str,
        endpoint: Endpoint,
    ) -> Result<Vec<AddressCandidate>, ApplicationError> {
        if query.chars().count() < self.config.min_query_chars {
            debug!("Query too short, skipping search");
            return Ok(Vec::new());
        }

        let ticket = self.next_search_ticket();
        let _loading = self.begin_loading();

        match self.geocoding.geocode(query).await {
            Ok(results) => {
                debug!(count = results.len(), "Geocoding returned candidates");
                self.update(|state| {
                    if self.is_current_search(ticket) {
                        state.search_results.clone_from(&results);
                        state.search_target = Some(endpoint);
                    } else {
                        debug!(ticket, "Discarding superseded search results");
                    }
                });
                Ok(results)
            },
            Err(e) => {
                warn!(error = %e, "Address search failed");
                self.update(|state| {
                    if self.is_current_search(ticket) {
                        state.search_results.clear();
                        state.search_target = None;
                        state.last_error = Some(format!("Address search failed: {e}"));
                    }
                });
                Err(e)
            },
        }
    }

    /// Use a search candidate as the given endpoint
    ///
    /// Clears the suggestion list; searches still in flight are discarded.
    #[instrument(skip(self, candidate), fields(name = %candidate.name))]
    pub fn select_result(&self, candidate: &AddressCandidate, endpoint: Endpoint) {
        self.search_ticket.fetch_add(1, Ordering::SeqCst);
        self.update(|state| {
            state.set_endpoint(
                endpoint,
                candidate.coordinate,
                candidate.formatted_address.clone(),
            );
            state.search_results.clear();
            state.search_target = None;
        });
        debug!(coordinate = %candidate.coordinate, "Endpoint selected");
    }

    /// Use a raw point (e.g. a map tap) as the given endpoint
    ///
    /// The address text starts as `"lat, lon"` and is replaced by the first
    /// reverse-geocoding candidate, unless the endpoint changed meanwhile.
    #[instrument(skip(self), fields(coordinate = %coordinate))]
    pub async fn set_coordinate(&self, coordinate: Coordinate, endpoint: Endpoint) {
        self.update(|state| state.set_endpoint(endpoint, coordinate, coordinate.raw_label()));

        let _loading = self.begin_loading();
        match self.geocoding.reverse_geocode(&coordinate).await {
            Ok(candidates) => {
                if let Some(first) = candidates.into_iter().next() {
                    self.update(|state| {
                        if state.coordinate(endpoint) == Some(coordinate) {
                            state.set_endpoint(endpoint, coordinate, first.formatted_address);
                        }
                    });
                }
            },
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed");
                self.update(|state| {
                    state.last_error = Some(format!("Failed to resolve address: {e}"));
                });
            },
        }
    }

    /// Use the device position as the origin
    ///
    /// The origin address becomes the first reverse-geocoding candidate, or
    /// `"lat, lon"` when there is none.
    #[instrument(skip(self))]
    pub async fn set_current_location(&self) -> Coordinate {
        let _loading = self.begin_loading();

        let coordinate = self.location.current_location().await;
        info!(%coordinate, "Current location resolved");
        self.update(|state| state.from_coordinate = Some(coordinate));

        let (address, error) = match self.geocoding.reverse_geocode(&coordinate).await {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(first) => (first.formatted_address, None),
                None => {
                    debug!("No address for current location");
                    (coordinate.raw_label(), None)
                },
            },
            Err(e) => {
                warn!(error = %e, "Reverse geocoding of current location failed");
                (
                    coordinate.raw_label(),
                    Some(format!("Failed to determine location: {e}")),
                )
            },
        };

        self.update(|state| {
            state.from_address = address;
            if error.is_some() {
                state.last_error = error;
            }
        });

        coordinate
    }

    /// Load routes between the selected endpoints
    ///
    /// # Errors
    ///
    /// Returns a validation error, after setting `last_error`, when an
    /// endpoint is missing. Backend failures do not produce an error; the
    /// cached routes are returned instead.
    #[instrument(skip(self))]
    pub async fn load_routes(&self) -> Result<Vec<RouteOption>, ApplicationError> {
        let snapshot = self.snapshot();
        let Some((from, to)) = snapshot.endpoints() else {
            let missing = match (snapshot.from_coordinate, snapshot.to_coordinate) {
                (None, None) => "origin and destination",
                (None, Some(_)) => "origin",
                _ => "destination",
            };
            let err = DomainError::MissingEndpoint(missing.to_string());
            warn!(%missing, "Cannot load routes without both endpoints");
            self.update(|state| state.last_error = Some(err.to_string()));
            return Err(err.into());
        };

        let _loading = self.begin_loading();
        let fetch = self.routes.fetch_with_fallback(&from, &to).await;
        let surface = self.config.fallback_error_policy == FallbackErrorPolicy::Surface;

        self.update(|state| {
            state.routes.clone_from(&fetch.routes);
            state.route_source = fetch.source;
            if let (true, Some(e)) = (surface, fetch.fetch_error.as_ref()) {
                state.last_error = Some(format!("Failed to load routes, showing saved ones: {e}"));
            }
        });

        info!(count = fetch.routes.len(), source = ?fetch.source, "Routes loaded");
        Ok(fetch.routes)
    }

    /// Exchange origin and destination
    pub fn swap_endpoints(&self) {
        self.update(PlanningState::swap_endpoints);
    }

    /// Dismiss the current error
    pub fn clear_error(&self) {
        self.update(|state| state.last_error = None);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use domain::RouteSource;

    use super::*;
    use crate::ports::{
        MockGeocodingPort, MockLocationPort, MockRouteCachePort, MockRoutePort, RouteCachePort,
        RoutePort,
    };

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn candidate(name: &str, lat: f64, lon: f64) -> AddressCandidate {
        AddressCandidate::new(name, format!("{name}, full"), coord(lat, lon))
    }

    fn route(id: &str) -> RouteOption {
        RouteOption {
            id: id.to_string(),
            name: format!("Route {id}"),
            description: String::new(),
            duration_secs: 3600,
            distance: 700.0,
            price: 1500.0,
            transport_type: "train".to_string(),
            points: Vec::new(),
        }
    }

    fn idle_routes() -> RouteService {
        RouteService::new(
            Arc::new(MockRoutePort::new()),
            Arc::new(MockRouteCachePort::new()),
        )
    }

    fn planner_with(
        geocoding: impl GeocodingPort + 'static,
        location: impl LocationPort + 'static,
        routes: RouteService,
        config: PlannerConfig,
    ) -> RoutePlanner {
        RoutePlanner::new(Arc::new(geocoding), Arc::new(location), routes, config)
    }

    /// Geocoder answering each query after a per-query delay
    #[derive(Default)]
    struct SlowGeocoder {
        delays: HashMap<String, Duration>,
    }

    #[async_trait::async_trait]
    impl GeocodingPort for SlowGeocoder {
        async fn geocode(&self, query: &str) -> Result<Vec<AddressCandidate>, ApplicationError> {
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            Ok(vec![candidate(query, 55.0, 37.0)])
        }

        async fn reverse_geocode(
            &self,
            _coordinate: &Coordinate,
        ) -> Result<Vec<AddressCandidate>, ApplicationError> {
            Ok(Vec::new())
        }
    }

    /// Route cache backed by a map, for checking what was persisted
    #[derive(Default)]
    struct MemoryCache {
        routes: parking_lot::Mutex<Vec<RouteOption>>,
    }

    #[async_trait::async_trait]
    impl RouteCachePort for MemoryCache {
        async fn upsert_all(&self, routes: &[RouteOption]) -> Result<(), ApplicationError> {
            let mut stored = self.routes.lock();
            for route in routes {
                stored.retain(|r| r.id != route.id);
                stored.push(route.clone());
            }
            Ok(())
        }

        async fn get(&self, id: &str) -> Result<Option<RouteOption>, ApplicationError> {
            Ok(self.routes.lock().iter().find(|r| r.id == id).cloned())
        }

        async fn list_all(&self) -> Result<Vec<RouteOption>, ApplicationError> {
            Ok(self.routes.lock().clone())
        }

        async fn delete(&self, id: &str) -> Result<bool, ApplicationError> {
            let mut stored = self.routes.lock();
            let before = stored.len();
            stored.retain(|r| r.id != id);
            Ok(stored.len() < before)
        }

        async fn clear(&self) -> Result<usize, ApplicationError> {
            let mut stored = self.routes.lock();
            let n = stored.len();
            stored.clear();
            Ok(n)
        }
    }

    #[tokio::test]
    async fn short_query_never_reaches_geocoder() {
        let mut geocoding = MockGeocodingPort::new();
        geocoding.expect_geocode().never();

        let planner = planner_with(
            geocoding,
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        );

        for query in ["", "a", "ab", "яб"] {
            let results = planner.search_address(query, Endpoint::From).await.unwrap();
            assert!(results.is_empty());
        }
        let state = planner.snapshot();
        assert!(state.search_results.is_empty());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn search_replaces_results() {
        let mut geocoding = MockGeocodingPort::new();
        geocoding
            .expect_geocode()
            .withf(|q: &str| q == "Tverskaya")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    candidate("Tverskaya 1", 55.757, 37.613),
                    candidate("Tverskaya 7", 55.760, 37.609),
                ])
            });

        let planner = planner_with(
            geocoding,
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        );

        let results = planner
            .search_address("Tverskaya", Endpoint::To)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let state = planner.snapshot();
        assert_eq!(state.search_results, results);
        assert_eq!(state.search_target, Some(Endpoint::To));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn search_failure_clears_results_and_sets_error() {
        let mut geocoding = MockGeocodingPort::new();
        let mut first = true;
        geocoding.expect_geocode().times(2).returning(move |_| {
            if first {
                first = false;
                Ok(vec![candidate("Arbat", 55.75, 37.59)])
            } else {
                Err(ApplicationError::ExternalService("503".to_string()))
            }
        });

        let planner = planner_with(
            geocoding,
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        );

        planner.search_address("Arbat", Endpoint::From).await.unwrap();
        assert_eq!(planner.snapshot().search_results.len(), 1);

        assert!(planner.search_address("Arbat 2", Endpoint::From).await.is_err());
        let state = planner.snapshot();
        assert!(state.search_results.is_empty());
        assert!(state.last_error.unwrap().contains("503"));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_search_does_not_overwrite_newer_results() {
        let geocoding = SlowGeocoder {
            delays: HashMap::from([
                ("Nevsky".to_string(), Duration::from_millis(800)),
                ("Nevsky prospekt".to_string(), Duration::from_millis(100)),
            ]),
        };
        let planner = Arc::new(planner_with(
            geocoding,
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        ));

        let slow = {
            let planner = Arc::clone(&planner);
            tokio::spawn(async move { planner.search_address("Nevsky", Endpoint::To).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        planner
            .search_address("Nevsky prospekt", Endpoint::To)
            .await
            .unwrap();

        // The slow call still completes and reports its own results.
        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale[0].name, "Nevsky");

        let state = planner.snapshot();
        assert_eq!(state.search_results.len(), 1);
        assert_eq!(state.search_results[0].name, "Nevsky prospekt");
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn search_for_other_endpoint_supersedes_in_flight_search() {
        let geocoding = SlowGeocoder {
            delays: HashMap::from([
                ("Tverskaya".to_string(), Duration::from_millis(800)),
                ("Kazan station".to_string(), Duration::from_millis(100)),
            ]),
        };
        let planner = Arc::new(planner_with(
            geocoding,
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        ));

        let from_search = {
            let planner = Arc::clone(&planner);
            tokio::spawn(async move { planner.search_address("Tverskaya", Endpoint::From).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        planner
            .search_address("Kazan station", Endpoint::To)
            .await
            .unwrap();
        from_search.await.unwrap().unwrap();

        let state = planner.snapshot();
        assert_eq!(state.search_target, Some(Endpoint::To));
        assert_eq!(state.search_results.len(), 1);
        assert_eq!(state.search_results[0].name, "Kazan station");
    }

    #[tokio::test]
    async fn select_result_only_touches_its_endpoint() {
        let planner = planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        );

        let to = candidate("Nevsky prospekt", 59.94, 30.31);
        planner.select_result(&to, Endpoint::To);
        let from = candidate("Red Square", 55.75, 37.62);
        planner.select_result(&from, Endpoint::From);

        let state = planner.snapshot();
        assert_eq!(state.from_coordinate, Some(from.coordinate));
        assert_eq!(state.from_address, "Red Square, full");
        assert_eq!(state.to_coordinate, Some(to.coordinate));
        assert_eq!(state.to_address, "Nevsky prospekt, full");
        assert!(state.search_results.is_empty());
    }

    #[tokio::test]
    async fn current_location_uses_first_reverse_candidate() {
        let mut location = MockLocationPort::new();
        location
            .expect_current_location()
            .returning(|| coord(55.751_244, 37.618_423));

        let mut geocoding = MockGeocodingPort::new();
        geocoding.expect_reverse_geocode().returning(|_| {
            Ok(vec![
                candidate("Red Square", 55.751, 37.618),
                candidate("Kremlin", 55.752, 37.617),
            ])
        });

        let planner = planner_with(geocoding, location, idle_routes(), PlannerConfig::default());
        let coordinate = planner.set_current_location().await;

        let state = planner.snapshot();
        assert_eq!(state.from_coordinate, Some(coordinate));
        assert_eq!(state.from_address, "Red Square, full");
        assert!(!state.is_loading);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn current_location_falls_back_to_raw_label() {
        let mut location = MockLocationPort::new();
        location
            .expect_current_location()
            .returning(|| coord(55.75, 37.62));

        let mut geocoding = MockGeocodingPort::new();
        geocoding.expect_reverse_geocode().returning(|_| Ok(Vec::new()));

        let planner = planner_with(geocoding, location, idle_routes(), PlannerConfig::default());
        planner.set_current_location().await;

        let state = planner.snapshot();
        assert_eq!(state.from_address, "55.75, 37.62");
        assert!(state.last_error.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn current_location_reverse_error_sets_error() {
        let mut location = MockLocationPort::new();
        location
            .expect_current_location()
            .returning(|| coord(55.75, 37.62));

        let mut geocoding = MockGeocodingPort::new();
        geocoding
            .expect_reverse_geocode()
            .returning(|_| Err(ApplicationError::ExternalService("offline".to_string())));

        let planner = planner_with(geocoding, location, idle_routes(), PlannerConfig::default());
        planner.set_current_location().await;

        let state = planner.snapshot();
        assert_eq!(state.from_coordinate, Some(coord(55.75, 37.62)));
        assert_eq!(state.from_address, "55.75, 37.62");
        assert!(state.last_error.unwrap().contains("offline"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn set_coordinate_resolves_address() {
        let mut geocoding = MockGeocodingPort::new();
        geocoding
            .expect_reverse_geocode()
            .returning(|c| Ok(vec![candidate("Palace Square", c.latitude(), c.longitude())]));

        let planner = planner_with(
            geocoding,
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        );
        planner.set_coordinate(coord(59.939, 30.315), Endpoint::To).await;

        let state = planner.snapshot();
        assert_eq!(state.to_coordinate, Some(coord(59.939, 30.315)));
        assert_eq!(state.to_address, "Palace Square, full");
        assert!(state.from_coordinate.is_none());
    }

    #[tokio::test]
    async fn load_routes_without_destination_is_rejected() {
        let mut port = MockRoutePort::new();
        port.expect_fetch_routes().never();
        let mut cache = MockRouteCachePort::new();
        cache.expect_list_all().never();

        let planner = planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            RouteService::new(Arc::new(port), Arc::new(cache)),
            PlannerConfig::default(),
        );
        planner.select_result(&candidate("Red Square", 55.75, 37.62), Endpoint::From);

        let err = planner.load_routes().await.unwrap_err();

        assert!(err.is_validation());
        let state = planner.snapshot();
        let message = state.last_error.unwrap();
        assert!(!message.is_empty());
        assert!(message.contains("destination"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn load_routes_persists_fresh_routes() {
        let mut port = MockRoutePort::new();
        port.expect_fetch_routes()
            .withf(|from: &Coordinate, to: &Coordinate| {
                (from.latitude() - 55.75).abs() < 1e-9 && (to.latitude() - 59.94).abs() < 1e-9
            })
            .times(1)
            .returning(|_, _| Ok(vec![route("sapsan"), route("night-train")]));
        let cache = Arc::new(MemoryCache::default());

        let planner = planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            RouteService::new(Arc::new(port), cache.clone()),
            PlannerConfig::default(),
        );
        planner.select_result(&candidate("Moscow", 55.75, 37.62), Endpoint::From);
        planner.select_result(&candidate("Saint Petersburg", 59.94, 30.31), Endpoint::To);

        let mut updates = planner.subscribe();
        let routes = planner.load_routes().await.unwrap();

        assert_eq!(routes.len(), 2);
        let state = planner.snapshot();
        assert_eq!(state.routes.len(), 2);
        assert_eq!(state.route_source, RouteSource::Fresh);
        assert!(!state.is_loading);
        assert_eq!(cache.list_all().await.unwrap().len(), 2);

        // The receiver replays the latest value; loading already went true -> false.
        assert!(updates.has_changed().unwrap());
        assert!(!updates.borrow_and_update().is_loading);
    }

    #[tokio::test]
    async fn is_loading_goes_true_then_false() {
        struct GatedRoutes {
            gate: tokio::sync::Notify,
        }

        #[async_trait::async_trait]
        impl RoutePort for GatedRoutes {
            async fn fetch_routes(
                &self,
                _from: &Coordinate,
                _to: &Coordinate,
            ) -> Result<Vec<RouteOption>, ApplicationError> {
                self.gate.notified().await;
                Ok(vec![route("a"), route("b")])
            }
        }

        let port = Arc::new(GatedRoutes {
            gate: tokio::sync::Notify::new(),
        });
        let planner = Arc::new(planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            RouteService::new(port.clone(), Arc::new(MemoryCache::default())),
            PlannerConfig::default(),
        ));
        planner.select_result(&candidate("Moscow", 55.75, 37.62), Endpoint::From);
        planner.select_result(&candidate("Saint Petersburg", 59.94, 30.31), Endpoint::To);

        let mut updates = planner.subscribe();
        let task = {
            let planner = Arc::clone(&planner);
            tokio::spawn(async move { planner.load_routes().await })
        };

        updates.wait_for(|s| s.is_loading).await.unwrap();
        port.gate.notify_one();
        let done = updates.wait_for(|s| !s.is_loading).await.unwrap().clone();

        assert_eq!(done.routes.len(), 2);
        assert_eq!(task.await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_serves_cache_silently_by_default() {
        let mut port = MockRoutePort::new();
        port.expect_fetch_routes()
            .returning(|_, _| Err(ApplicationError::ExternalService("timeout".to_string())));
        let cache = Arc::new(MemoryCache::default());
        cache.upsert_all(&[route("yesterday")]).await.unwrap();

        let planner = planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            RouteService::new(Arc::new(port), cache),
            PlannerConfig::default(),
        );
        planner.select_result(&candidate("A", 55.75, 37.62), Endpoint::From);
        planner.select_result(&candidate("B", 59.94, 30.31), Endpoint::To);

        let routes = planner.load_routes().await.unwrap();

        assert_eq!(routes, vec![route("yesterday")]);
        let state = planner.snapshot();
        assert_eq!(state.route_source, RouteSource::Cached);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn failed_fetch_is_surfaced_when_configured() {
        let mut port = MockRoutePort::new();
        port.expect_fetch_routes()
            .returning(|_, _| Err(ApplicationError::ExternalService("timeout".to_string())));

        let planner = planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            RouteService::new(Arc::new(port), Arc::new(MemoryCache::default())),
            PlannerConfig {
                fallback_error_policy: FallbackErrorPolicy::Surface,
                ..PlannerConfig::default()
            },
        );
        planner.select_result(&candidate("A", 55.75, 37.62), Endpoint::From);
        planner.select_result(&candidate("B", 59.94, 30.31), Endpoint::To);

        let routes = planner.load_routes().await.unwrap();

        assert!(routes.is_empty());
        assert!(planner.snapshot().last_error.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn swap_and_clear_error() {
        let planner = planner_with(
            MockGeocodingPort::new(),
            MockLocationPort::new(),
            idle_routes(),
            PlannerConfig::default(),
        );
        planner.select_result(&candidate("A", 55.75, 37.62), Endpoint::From);
        let _ = planner.load_routes().await;
        assert!(planner.snapshot().last_error.is_some());

        planner.swap_endpoints();
        planner.clear_error();

        let state = planner.snapshot();
        assert!(state.from_coordinate.is_none());
        assert_eq!(state.to_address, "A, full");
        assert!(state.last_error.is_none());
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = PlannerConfig::default();
        assert_eq!(config.min_query_chars, 3);
        assert_eq!(config.debounce_delay(), Duration::from_millis(500));
        assert_eq!(config.fallback_error_policy, FallbackErrorPolicy::Silent);
        assert!(config.validate().is_ok());

        let bad = PlannerConfig {
            min_query_chars: 0,
            ..PlannerConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"fallback_error_policy": "surface"}"#).unwrap();
        assert_eq!(config.fallback_error_policy, FallbackErrorPolicy::Surface);
        assert_eq!(config.min_query_chars, 3);
    }
}
