//! Periodic Scheduler (spec §4.8): `(interval, callable)` runs until
//! cancelled; handler exceptions are logged and do not stop the task.
//! Simplified from the reference `CronService`'s `BTreeMap<Instant, Entry>`
//! timer queue since this spec only needs fixed-interval repetition, not
//! one-shot/cron scheduling.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::error;

pub type Task = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Spawns a task that runs `callable` every `interval` until `shutdown` is
/// cancelled. Cancellation is cooperative: the loop checks between runs and
/// while sleeping, never mid-callable.
pub fn spawn_periodic(interval: Duration, callable: Task, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    let fut = callable();
                    if let Err(join_err) = tokio::spawn(fut).await {
                        error!(error = %join_err, "periodic task panicked");
                    }
                }
            }
        }
    })
}
