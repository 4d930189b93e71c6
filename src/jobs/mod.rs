//! Pass scheduling
//!
//! Runs the reconciliation loop once or forever on a fixed interval. A
//! cancellation token ends the schedule. It is observed before a pass, between
//! entries and during the sleep; an entry in progress always finishes and
//! writes its marker.

pub mod reconcile;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

pub use reconcile::{PassSummary, ReconcileSettings, ReconciliationLoop, pending_entries};

/// How often passes run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass, then return
    Once,
    /// Pass, sleep for the interval, repeat
    Continuous(Duration),
}

impl RunMode {
    pub fn from_config(config: &crate::config::Config) -> Self {
        if config.run_once {
            RunMode::Once
        } else {
            RunMode::Continuous(config.check_interval())
        }
    }
}

/// Drive passes according to `mode` until done or cancelled.
///
/// Returns the number of passes started. A pass cut short by cancellation
/// still counts, since every entry it began was finished.
pub async fn run(reconciler: &ReconciliationLoop, mode: RunMode, cancel: CancellationToken) -> usize {
    match mode {
        RunMode::Once => info!("Running in single-run mode"),
        RunMode::Continuous(interval) => info!(
            interval_secs = interval.as_secs(),
            "Running in continuous mode"
        ),
    }

    let mut passes = 0;
    loop {
        if cancel.is_cancelled() {
            info!("Shutdown requested, stopping scheduler");
            break;
        }

        reconciler.run_pass_until(&cancel).await;
        passes += 1;

        let RunMode::Continuous(interval) = mode else {
            break;
        };

        info!(interval_secs = interval.as_secs(), "Sleeping until next pass");
        if !sleep_or_cancel(interval, &cancel).await {
            info!("Shutdown requested, stopping scheduler");
            break;
        }
    }

    passes
}

/// Sleep for `duration`; returns `false` if cancelled first
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_completes() {
        assert!(sleep_or_cancel(Duration::from_millis(5), &CancellationToken::new()).await);
    }

    #[tokio::test]
    async fn test_sleep_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!sleep_or_cancel(Duration::from_secs(3600), &cancel).await);
    }

    #[test]
    fn test_mode_from_config() {
        let mut config = crate::config::Config::default();
        assert_eq!(
            RunMode::from_config(&config),
            RunMode::Continuous(Duration::from_secs(3600))
        );
        config.run_once = true;
        assert_eq!(RunMode::from_config(&config), RunMode::Once);
    }
}
