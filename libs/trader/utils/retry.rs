//! Bounded startup retry.
//!
//! Start-up work (first rules fetch, first account snapshot, first
//! stream connection) gets a short fixed ladder of retries before the
//! engine gives up and surfaces the error to the host. Steady-state
//! work never uses this: recurring jobs simply try again on their next
//! scheduled tick.

use crate::utils::shutdown::ShutdownManager;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Delays between startup attempts. One initial attempt plus one
/// attempt after each delay.
pub const STARTUP_BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(30),
    Duration::from_secs(60),
];

/// Why startup did not produce a value.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The operator requested shutdown while we were retrying. Not a
    /// failure; nothing further should be attempted.
    #[error("startup cancelled by shutdown request")]
    Cancelled,

    /// Every attempt failed; carries the last underlying error.
    #[error("startup failed after {attempts} attempts: {last_error:#}")]
    Exhausted {
        attempts: usize,
        last_error: anyhow::Error,
    },
}

/// Run `op` until it succeeds, retrying on the fixed ladder.
///
/// Transient failures are retried; a shutdown request during a wait or
/// between attempts surfaces as [`StartupError::Cancelled`] instead.
pub async fn with_startup_retry<T, F, Fut>(
    name: &str,
    shutdown: &Arc<ShutdownManager>,
    mut op: F,
) -> Result<T, StartupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = STARTUP_BACKOFF.len() + 1;
    let mut last_error = None;

    for (attempt, delay) in std::iter::once(Duration::ZERO)
        .chain(STARTUP_BACKOFF.iter().copied())
        .enumerate()
    {
        if !delay.is_zero() {
            shutdown.interruptible_sleep(delay).await;
        }
        if !shutdown.is_running() {
            return Err(StartupError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    "[startup] {} failed (attempt {}/{}): {:#}",
                    name,
                    attempt + 1,
                    attempts,
                    e
                );
                last_error = Some(e);
            }
        }
    }

    Err(StartupError::Exhausted {
        attempts,
        last_error: last_error.expect("at least one attempt ran"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let shutdown = Arc::new(ShutdownManager::new());
        let calls = AtomicUsize::new(0);

        let result = with_startup_retry("test", &shutdown, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(42) }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_when_shutdown_requested() {
        let shutdown = Arc::new(ShutdownManager::new());
        shutdown.request_shutdown();

        let result: Result<(), _> = with_startup_retry("test", &shutdown, || async {
            anyhow::bail!("always fails")
        })
        .await;

        assert!(matches!(result, Err(StartupError::Cancelled)));
    }
}
