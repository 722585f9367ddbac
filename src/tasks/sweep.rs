//! Cache Sweep Task
//!
//! Background task that periodically removes expired cache entries so memory
//! stays bounded between lookups. Lookups re-check expiry themselves, so a
//! late or missed sweep never yields a stale hit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;

/// Owned handle to the running sweep task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct SweepTask {
    handle: JoinHandle<()>,
}

impl SweepTask {
    /// Stops the sweep task.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(ResponseCache::new(Duration::from_secs(300))));
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task<T>(cache: Arc<RwLock<ResponseCache<T>>>, interval: Duration) -> SweepTask
where
    T: Clone + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting cache sweep task");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("cache sweep: removed {} expired entries", removed);
            } else {
                debug!("cache sweep: no expired entries found");
            }
        }
    });

    SweepTask { handle }
}
