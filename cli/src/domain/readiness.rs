//! Platform readiness state machine.
//!
//! `STARTING` loops on failed or incomplete peer queries until the control
//! peer shows up (`READY`), the process dies (`EXITED`) or the policy's
//! deadline passes (`TIMED_OUT`).

use std::time::Duration;

use crate::domain::invocations::lists_control_peer;

/// Pause between peer queries.
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on a single `vctl peerlist` call.
pub const PEER_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How long and how often to poll for readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            interval: READY_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl ReadyPolicy {
    #[must_use]
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn expired(&self, elapsed: Duration) -> bool {
        self.timeout.is_some_and(|t| elapsed >= t)
    }

    /// Time left before the deadline; `None` waits forever.
    #[must_use]
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.timeout.map(|t| t.saturating_sub(elapsed))
    }

    /// Budget for one peer query, never reaching past the deadline.
    #[must_use]
    pub fn query_timeout(&self, elapsed: Duration) -> Duration {
        self.remaining(elapsed)
            .map_or(PEER_QUERY_TIMEOUT, |left| left.min(PEER_QUERY_TIMEOUT))
    }

    /// Pause before the next query, never reaching past the deadline.
    #[must_use]
    pub fn pause(&self, elapsed: Duration) -> Duration {
        self.remaining(elapsed)
            .map_or(self.interval, |left| left.min(self.interval))
    }
}

/// What one poll round saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The platform process is gone.
    ProcessExited { code: Option<i32> },
    /// The peer query could not run, timed out, or exited non-zero.
    QueryFailed,
    /// Output of a successful peer query.
    PeerListing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformState {
    Starting,
    Ready,
    Exited { code: Option<i32> },
    TimedOut,
}

/// Transition out of `STARTING` given one observation.
#[must_use]
pub fn next_state(observation: &Observation, elapsed: Duration, policy: &ReadyPolicy) -> PlatformState {
    match observation {
        Observation::ProcessExited { code } => PlatformState::Exited { code: *code },
        Observation::PeerListing(listing) if lists_control_peer(listing) => PlatformState::Ready,
        _ if policy.expired(elapsed) => PlatformState::TimedOut,
        _ => PlatformState::Starting,
    }
}
