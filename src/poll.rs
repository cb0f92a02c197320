//! Periodic refresh primitive for polled views (incidents, arrivals).
//!
//! Each tick issues an independent fetch; a slow response never delays the
//! next tick. Responses from superseded ticks are accepted as-is — the
//! endpoints are idempotent GETs, so last-write-wins is acceptable there,
//! unlike the tag-checked search pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::warn;

use crate::error::ApiError;

/// Handle to a running poll loop. Dropping it stops the loop; fetches
/// already in flight finish and are discarded with the channel.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns a poll loop calling `fetch` every `period`, starting immediately.
///
/// Successful results are published on the returned channel; a failed tick
/// logs and keeps the last-good value, so views degrade to slightly stale
/// data instead of flashing errors.
pub fn spawn_polling<T, F, Fut>(period: Duration, fetch: F) -> (PollHandle, watch::Receiver<Option<T>>)
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let (tx, rx) = watch::channel(None);
    let tx = Arc::new(tx);
    let fetch = Arc::new(fetch);

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let fetch = Arc::clone(&fetch);
            let tx = Arc::clone(&tx);
            tokio::spawn(async move {
                match fetch().await {
                    Ok(value) => {
                        let _ = tx.send(Some(value));
                    }
                    Err(e) => warn!(error = %e, "poll tick failed, keeping last-good value"),
                }
            });
        }
    });

    (PollHandle { task }, rx)
}
