//! Application state for the web layer.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use tokio::sync::Mutex;

use crate::fetcher::{DerivedResult, TransitFetcher};
use crate::transport::ConnectionSource;

/// Source of the current time for a run.
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// Shared application state.
///
/// Runs are serialized so that concurrent requests never race on the
/// cache file.
pub struct AppState<S> {
    pub fetcher: Arc<TransitFetcher<S>>,
    clock: Clock,
    run_lock: Arc<Mutex<()>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            clock: Arc::clone(&self.clock),
            run_lock: Arc::clone(&self.run_lock),
        }
    }
}

impl<S: ConnectionSource> AppState<S> {
    /// Create a new app state that runs at the current local time.
    pub fn new(fetcher: TransitFetcher<S>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            clock: Arc::new(|| Local::now().fixed_offset()),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the clock that decides "now" for each run.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<FixedOffset> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Run the fetcher at the clock's current time.
    pub async fn run(&self) -> DerivedResult {
        let _guard = self.run_lock.lock().await;
        let now = (self.clock)();
        self.fetcher.run(&now).await
    }
}
