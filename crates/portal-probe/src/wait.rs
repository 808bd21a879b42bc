//! Wait mechanisms shared by locators and expectations.
//!
//! Everything that waits in this crate funnels through [`poll`]: run a
//! probe, sleep for the poll interval, repeat until the probe is ready or
//! the timeout elapses. A probe that errors aborts the wait immediately.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::result::{PortalError, PortalResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for expectations (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for navigations and load states (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// `document.readyState` values that satisfy this state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::DomContentLoaded => &["interactive", "complete"],
            Self::Load | Self::NetworkIdle => &["complete"],
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Timeout and poll interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Sleep between probes
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_EXPECT_TIMEOUT_MS),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        )
    }
}

impl WaitOptions {
    /// Create wait options
    #[must_use]
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Replace the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition holds; stop polling
    Ready(T),
    /// Condition does not hold yet; carries what was observed
    Pending(String),
}

/// Result of a complete wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The probe became ready
    Ready(T),
    /// The timeout elapsed first
    TimedOut {
        /// Last observation reported by the probe
        observed: String,
        /// Time spent waiting
        elapsed: Duration,
    },
}

/// Poll `probe` until it is ready or `options.timeout` elapses.
///
/// The probe always runs at least once, so a zero timeout is a single check.
pub async fn poll<T, F, Fut>(options: &WaitOptions, mut probe: F) -> PortalResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortalResult<Probe<T>>>,
{
    let start = Instant::now();
    loop {
        let observed = match probe().await? {
            Probe::Ready(value) => return Ok(PollOutcome::Ready(value)),
            Probe::Pending(observed) => observed,
        };
        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            return Ok(PollOutcome::TimedOut { observed, elapsed });
        }
        let remaining = options.timeout.saturating_sub(elapsed);
        tokio::time::sleep(options.poll_interval.min(remaining)).await;
    }
}

/// Poll like [`poll`], turning a timeout into an assertion failure
/// that names `expectation` and the last observation.
pub async fn poll_until<T, F, Fut>(
    expectation: &str,
    options: &WaitOptions,
    probe: F,
) -> PortalResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortalResult<Probe<T>>>,
{
    match poll(options, probe).await? {
        PollOutcome::Ready(value) => Ok(value),
        PollOutcome::TimedOut { observed, elapsed } => Err(PortalError::assertion(format!(
            "expected {expectation} within {}ms, last observed {observed}",
            elapsed.as_millis()
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(60), Duration::from_millis(5))
    }

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_event_names() {
            assert_eq!(LoadState::Load.event_name(), "load");
            assert_eq!(LoadState::DomContentLoaded.to_string(), "DOMContentLoaded");
            assert_eq!(LoadState::default(), LoadState::Load);
        }

        #[test]
        fn test_ready_states() {
            assert!(LoadState::DomContentLoaded
                .ready_states()
                .contains(&"interactive"));
            assert_eq!(LoadState::Load.ready_states(), &["complete"]);
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_ready_on_third_probe() {
            let calls = AtomicU32::new(0);
            let value = poll_until("three calls", &fast(), || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(if n >= 3 {
                    Probe::Ready(n)
                } else {
                    Probe::Pending(format!("{n} calls"))
                })
            })
            .await
            .unwrap();
            assert_eq!(value, 3);
        }

        #[tokio::test]
        async fn test_timeout_reports_last_observation() {
            let err = poll_until::<(), _, _>("the moon", &fast(), || async {
                Ok(Probe::Pending("cheese".to_string()))
            })
            .await
            .unwrap_err();
            assert!(err.is_assertion());
            let text = err.to_string();
            assert!(text.contains("the moon"));
            assert!(text.contains("cheese"));
        }

        #[tokio::test]
        async fn test_zero_timeout_probes_once() {
            let calls = AtomicU32::new(0);
            let options = fast().with_timeout(Duration::ZERO);
            let outcome = poll::<(), _, _>(&options, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Probe::Pending("nope".to_string()))
            })
            .await
            .unwrap();
            assert!(matches!(outcome, PollOutcome::TimedOut { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_probe_error_aborts() {
            let err = poll::<(), _, _>(&fast(), || async { Err(PortalError::driver("gone")) })
                .await
                .unwrap_err();
            assert!(matches!(err, PortalError::Driver { .. }));
        }
    }
}
