//! Graceful shutdown management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tracing::info;

/// Cooperative shutdown flag shared by every background task.
///
/// The flag starts in the running state; flipping it is one-way. Tasks
/// poll [`is_running`](Self::is_running) between units of work and use
/// [`interruptible_sleep`](Self::interruptible_sleep) for their waits so
/// a shutdown request is honored within tens of milliseconds.
pub struct ShutdownManager {
    flag: Arc<AtomicBool>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Spawn a Ctrl+C handler that requests shutdown.
    pub fn spawn_signal_handler(&self) {
        let flag = Arc::clone(&self.flag);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal, stopping gracefully");
                flag.store(false, Ordering::Release);
            }
        });
    }

    /// Request shutdown programmatically.
    pub fn request_shutdown(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clone of the underlying flag for tasks that only need the bool.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Sleep for `duration`, waking early when shutdown is requested.
    pub async fn interruptible_sleep(&self, duration: Duration) {
        let check_interval = Duration::from_millis(50);
        let mut elapsed = Duration::ZERO;

        while elapsed < duration && self.is_running() {
            sleep(check_interval).await;
            elapsed += check_interval;
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_shutdown_flips_flag() {
        let shutdown = ShutdownManager::new();
        assert!(shutdown.is_running());
        shutdown.request_shutdown();
        assert!(!shutdown.is_running());
    }

    #[tokio::test]
    async fn interruptible_sleep_wakes_on_shutdown() {
        let shutdown = Arc::new(ShutdownManager::new());
        let sleeper = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let started = std::time::Instant::now();
            sleeper.interruptible_sleep(Duration::from_secs(30)).await;
            started.elapsed()
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.request_shutdown();
        let slept = handle.await.unwrap();
        assert!(slept < Duration::from_secs(5));
    }
}
