//! Debounced address search for one input field

use std::sync::Arc;
use std::time::Duration;

use domain::Endpoint;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::route_planner::RoutePlanner;

/// Turns keystrokes of one endpoint's input field into searches
///
/// Each `input` call restarts the quiet period. A search whose delay already
/// elapsed is left to finish; only the pending delay can be cancelled.
#[derive(Debug)]
pub struct SearchDebouncer {
    planner: Arc<RoutePlanner>,
    endpoint: Endpoint,
    delay: Duration,
    min_query_chars: usize,
    pending: Mutex<Option<oneshot::Sender<()>>>,
}

impl SearchDebouncer {
    /// Debouncer using the planner's configured delay
    #[must_use]
    pub fn new(planner: Arc<RoutePlanner>, endpoint: Endpoint) -> Self {
        let delay = planner.config().debounce_delay();
        Self::with_delay(planner, endpoint, delay)
    }

    /// Debouncer with an explicit delay
    #[must_use]
    pub fn with_delay(planner: Arc<RoutePlanner>, endpoint: Endpoint, delay: Duration) -> Self {
        let min_query_chars = planner.config().min_query_chars;
        Self {
            planner,
            endpoint,
            delay,
            min_query_chars,
            pending: Mutex::new(None),
        }
    }

    /// The field this debouncer feeds
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Register a new value of the input field
    ///
    /// Cancels the pending search of this field. Returns the handle of the
    /// newly scheduled search, or `None` when the trimmed text is too short.
    pub fn input(&self, text: &str) -> Option<JoinHandle<()>> {
        let query = text.trim().to_string();
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            let _ = previous.send(());
        }

        if query.chars().count() < self.min_query_chars {
            return None;
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        *pending = Some(cancel_tx);
        drop(pending);

        let planner = Arc::clone(&self.planner);
        let endpoint = self.endpoint;
        let delay = self.delay;
        Some(tokio::spawn(async move {
            let mut cancel_rx = cancel_rx;
            tokio::select! {
                biased;
                _ = &mut cancel_rx => {
                    debug!(%endpoint, "Search superseded before delay elapsed");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }
            if cancel_rx.try_recv().is_ok() {
                debug!(%endpoint, "Search superseded at the delay deadline");
                return;
            }
            // The search is committed; a later `cancel` must report false.
            drop(cancel_rx);

            if let Err(e) = planner.search_address(&query, endpoint).await {
                debug!(%endpoint, error = %e, "Debounced search failed");
            }
        }))
    }

    /// Drop the pending search, if its delay has not elapsed yet
    ///
    /// Returns `true` if a pending search was cancelled.
    pub fn cancel(&self) -> bool {
        self.pending
            .lock()
            .take()
            .is_some_and(|pending| pending.send(()).is_ok())
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use domain::{AddressCandidate, Coordinate};
    use tokio::time::Instant;

    use super::*;
    use crate::error::ApplicationError;
    use crate::ports::{GeocodingPort, MockLocationPort, MockRouteCachePort, MockRoutePort};
    use crate::services::{PlannerConfig, RouteService};

    /// Geocoder recording each query with the (paused) time it arrived
    struct RecordingGeocoder {
        started: Instant,
        calls: Mutex<Vec<(String, Duration)>>,
        latency: Duration,
        finished: AtomicUsize,
    }

    impl RecordingGeocoder {
        fn new(latency: Duration) -> Self {
            Self {
                started: Instant::now(),
                calls: Mutex::new(Vec::new()),
                latency,
                finished: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> Vec<(String, Duration)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl GeocodingPort for RecordingGeocoder {
        async fn geocode(&self, query: &str) -> Result<Vec<AddressCandidate>, ApplicationError> {
            self.calls
                .lock()
                .push((query.to_string(), self.started.elapsed()));
            tokio::time::sleep(self.latency).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(vec![AddressCandidate::new(
                query,
                query,
                Coordinate::moscow_center(),
            )])
        }

        async fn reverse_geocode(
            &self,
            _coordinate: &Coordinate,
        ) -> Result<Vec<AddressCandidate>, ApplicationError> {
            Ok(Vec::new())
        }
    }

    fn planner(geocoder: Arc<RecordingGeocoder>) -> Arc<RoutePlanner> {
        Arc::new(RoutePlanner::new(
            geocoder,
            Arc::new(MockLocationPort::new()),
            RouteService::new(
                Arc::new(MockRoutePort::new()),
                Arc::new(MockRouteCachePort::new()),
            ),
            PlannerConfig::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_produce_one_search() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let debouncer = SearchDebouncer::new(planner(geocoder.clone()), Endpoint::From);

        let first = debouncer.input("Mos").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = debouncer.input("Mosc").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = debouncer.input("Moscow").unwrap();

        first.await.unwrap();
        second.await.unwrap();
        last.await.unwrap();

        let calls = geocoder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Moscow");
        assert!(calls[0].1 >= Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn input_is_trimmed() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let debouncer = SearchDebouncer::new(planner(geocoder.clone()), Endpoint::To);

        debouncer.input("  Arbat  ").unwrap().await.unwrap();

        assert_eq!(geocoder.calls()[0].0, "Arbat");
    }

    #[tokio::test(start_paused = true)]
    async fn short_input_is_not_scheduled_and_cancels_pending() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let debouncer = SearchDebouncer::new(planner(geocoder.clone()), Endpoint::From);

        let pending = debouncer.input("Tver").unwrap();
        assert!(debouncer.input("Tv").is_none());
        assert!(debouncer.input("  ab  ").is_none());

        pending.await.unwrap();
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn streams_do_not_cancel_each_other() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let planner = planner(geocoder.clone());
        let from = SearchDebouncer::new(Arc::clone(&planner), Endpoint::From);
        let to = SearchDebouncer::new(planner, Endpoint::To);

        let a = from.input("Moscow").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let b = to.input("Kazan").unwrap();

        a.await.unwrap();
        b.await.unwrap();

        let queries: Vec<String> = geocoder.calls().into_iter().map(|(q, _)| q).collect();
        assert_eq!(queries, vec!["Moscow".to_string(), "Kazan".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_delay_drops_search() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let debouncer = SearchDebouncer::new(planner(geocoder.clone()), Endpoint::From);

        let handle = debouncer.input("Moscow").unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(debouncer.cancel());
        handle.await.unwrap();
        assert!(geocoder.calls().is_empty());
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn keystroke_at_deadline_supersedes_pending_search() {
        for _ in 0..50 {
            let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
            let debouncer = SearchDebouncer::new(planner(geocoder.clone()), Endpoint::From);

            let first = debouncer.input("Mos").unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(geocoder.calls().is_empty());
            let last = debouncer.input("Moscow").unwrap();

            first.await.unwrap();
            last.await.unwrap();

            let queries: Vec<String> = geocoder.calls().into_iter().map(|(q, _)| q).collect();
            assert_eq!(queries, vec!["Moscow".to_string()]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_at_deadline_drops_search() {
        for _ in 0..50 {
            let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
            let debouncer = SearchDebouncer::new(planner(geocoder.clone()), Endpoint::To);

            let handle = debouncer.input("Kazan").unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(geocoder.calls().is_empty());

            assert!(debouncer.cancel());
            handle.await.unwrap();
            assert!(geocoder.calls().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_delay_lets_request_finish() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::from_millis(300)));
        let planner = planner(geocoder.clone());
        let debouncer = SearchDebouncer::new(Arc::clone(&planner), Endpoint::To);

        let handle = debouncer.input("Kazan").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(geocoder.calls().len(), 1);

        assert!(!debouncer.cancel());
        handle.await.unwrap();

        assert_eq!(geocoder.finished.load(Ordering::SeqCst), 1);
        assert_eq!(planner.snapshot().search_results.len(), 1);
    }
}
