// ABOUTME: Bounded reconnect schedule for the realtime gateway connection.
// ABOUTME: Defaults to 5 attempts with a fixed 1s delay, then gives up.

use std::time::Duration;

/// How the connection manager retries a dropped or failed link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before each retry
    pub delay: Duration,
    /// Consecutive failed attempts allowed before giving up (0 = never retry)
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1), 5)
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

/// Attempt counter for one connection's lifetime
#[derive(Debug)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// A link came up; the next drop starts a fresh schedule
    pub fn record_success(&mut self) {
        self.attempts = 0;
    }

    /// Schedule another attempt, or `None` once the budget is spent
    pub fn next_attempt(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.policy.delay)
    }

    /// Attempts scheduled since the last successful link
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_gateway_client() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 5);
    }

    #[test]
    fn test_fixed_delay_gives_up_after_budget() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());
        for _ in 0..5 {
            assert_eq!(state.next_attempt(), Some(Duration::from_secs(1)));
        }
        assert_eq!(state.next_attempt(), None);
        assert_eq!(state.attempts(), 5);
    }

    #[test]
    fn test_success_resets_budget() {
        let mut state = ReconnectState::new(ReconnectPolicy::fixed(Duration::from_millis(200), 2));
        state.next_attempt();
        state.next_attempt();
        assert_eq!(state.next_attempt(), None);

        state.record_success();
        assert_eq!(state.attempts(), 0);
        assert_eq!(state.next_attempt(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let mut state = ReconnectState::new(ReconnectPolicy::fixed(Duration::from_secs(1), 0));
        assert_eq!(state.next_attempt(), None);
        assert_eq!(state.attempts(), 0);
    }
}
