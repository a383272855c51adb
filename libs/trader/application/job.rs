//! Recurring job runner.
//!
//! Each maintenance concern runs as its own cooperative loop: execute,
//! log-and-continue on error, then wait out the rest of the interval.
//! Jobs are isolated: one job's failure or overrun never blocks the
//! others. The run budget is advisory; an overrunning body is warned
//! about but never aborted, because killing a half-submitted order
//! batch is worse than a slow job.

use crate::utils::ShutdownManager;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Static description of one recurring job.
#[derive(Debug, Clone, Copy)]
pub struct JobSpec {
    pub name: &'static str,
    pub interval: Duration,
    /// Soft per-run budget; exceeding it logs a warning.
    pub run_budget: Duration,
}

impl JobSpec {
    pub fn new(name: &'static str, interval: Duration, run_budget: Duration) -> Self {
        Self {
            name,
            interval,
            run_budget,
        }
    }
}

/// Drive `body` on the job's interval until shutdown.
///
/// The wait after each run is `interval − elapsed` (clamped at zero),
/// so a slow run delays its successor instead of stacking runs.
pub async fn run_recurring<F, Fut>(spec: JobSpec, shutdown: Arc<ShutdownManager>, mut body: F)
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    info!(
        "[{}] job started (interval {}s)",
        spec.name,
        spec.interval.as_secs()
    );

    while shutdown.is_running() {
        let started = Instant::now();

        let run = body();
        tokio::pin!(run);
        let mut warned = false;
        let result = loop {
            tokio::select! {
                result = &mut run => break result,
                _ = sleep(spec.run_budget), if !warned => {
                    warn!(
                        "[{}] run exceeded its {}s budget, letting it finish",
                        spec.name,
                        spec.run_budget.as_secs()
                    );
                    warned = true;
                }
            }
        };

        match result {
            Ok(()) => debug!("[{}] run completed in {:?}", spec.name, started.elapsed()),
            Err(e) => warn!("[{}] run failed: {:#}", spec.name, e),
        }

        let wait = spec.interval.saturating_sub(started.elapsed());
        shutdown.interruptible_sleep(wait).await;
    }

    info!("[{}] job stopped", spec.name);
}
