use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the estimator retries a tracker connection after a failure or drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Stay disconnected
    Never,

    /// Retry on a fixed interval
    FixedInterval {
        interval_ms: u64,
        #[serde(default)]
        max_attempts: Option<usize>,
    },

    /// Exponential backoff between retries
    Exponential {
        base_ms: u64,
        max_ms: u64,
        max_attempts: usize,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::FixedInterval {
            interval_ms: 2000,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (0-based), or None when the
    /// policy gives up
    pub fn delay_for(&self, attempt: usize) -> Option<Duration> {
        match self {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::FixedInterval {
                interval_ms,
                max_attempts,
            } => {
                if max_attempts.map_or(false, |max| attempt >= max) {
                    return None;
                }
                Some(Duration::from_millis(*interval_ms))
            }
            ReconnectPolicy::Exponential {
                base_ms,
                max_ms,
                max_attempts,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = 1u64.checked_shl(attempt.min(32) as u32).unwrap_or(u64::MAX);
                Some(Duration::from_millis(base_ms.saturating_mul(factor).min(*max_ms)))
            }
        }
    }
}

/// Retry bookkeeping driven by the frame clock
#[derive(Debug, Clone)]
pub struct ReconnectSchedule {
    policy: ReconnectPolicy,
    attempts: usize,
    next_at: Option<Duration>,
}

impl ReconnectSchedule {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            next_at: None,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Failed attempts since the last success
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Time of the next retry, if one is scheduled
    pub fn next_at(&self) -> Option<Duration> {
        self.next_at
    }

    /// Record a failure at `now` and schedule the next retry.
    /// Returns false when the policy has given up.
    pub fn on_failure(&mut self, now: Duration) -> bool {
        let delay = self.policy.delay_for(self.attempts);
        self.attempts += 1;
        match delay {
            Some(delay) => {
                self.next_at = Some(now + delay);
                true
            }
            None => {
                self.next_at = None;
                false
            }
        }
    }

    /// True once when a scheduled retry is due
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.next_at {
            Some(at) if now >= at => {
                self.next_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.next_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_interval() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(100), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_exponential_caps_and_gives_up() {
        let policy = ReconnectPolicy::Exponential {
            base_ms: 100,
            max_ms: 1000,
            max_attempts: 6,
        };
        assert_eq!(policy.delay_for(0), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_for(6), None);
    }

    #[test]
    fn test_never() {
        assert_eq!(ReconnectPolicy::Never.delay_for(0), None);
    }

    #[test]
    fn test_schedule_due_once() {
        let mut schedule = ReconnectSchedule::new(ReconnectPolicy::FixedInterval {
            interval_ms: 500,
            max_attempts: None,
        });
        assert!(schedule.on_failure(Duration::from_secs(1)));
        assert!(!schedule.take_due(Duration::from_millis(1499)));
        assert!(schedule.take_due(Duration::from_millis(1500)));
        assert!(!schedule.take_due(Duration::from_secs(5)));
        assert_eq!(schedule.attempts(), 1);

        schedule.reset();
        assert_eq!(schedule.attempts(), 0);
    }

    #[test]
    fn test_policy_from_json() {
        let policy: ReconnectPolicy =
            serde_json::from_value(serde_json::json!({ "strategy": "fixed_interval", "interval_ms": 750 }))
                .unwrap();
        assert_eq!(
            policy,
            ReconnectPolicy::FixedInterval {
                interval_ms: 750,
                max_attempts: None
            }
        );
    }
}
