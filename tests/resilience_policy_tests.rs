use gazeflow::resilience::{ReconnectPolicy, ReconnectSchedule};
use std::time::Duration;

#[test]
fn test_never_gives_up_immediately() {
    let mut schedule = ReconnectSchedule::new(ReconnectPolicy::Never);
    assert!(!schedule.on_failure(Duration::ZERO));
    assert_eq!(schedule.next_at(), None);
    assert!(!schedule.take_due(Duration::from_secs(100)));
}

#[test]
fn test_fixed_interval_fires_once_when_due() {
    let mut schedule = ReconnectSchedule::new(ReconnectPolicy::default());
    let t0 = Duration::from_secs(5);
    assert!(schedule.on_failure(t0));
    assert_eq!(schedule.next_at(), Some(t0 + Duration::from_secs(2)));

    assert!(!schedule.take_due(t0 + Duration::from_millis(1999)));
    assert!(schedule.take_due(t0 + Duration::from_secs(2)));
    assert!(!schedule.take_due(t0 + Duration::from_secs(3)));
}

#[test]
fn test_fixed_interval_attempt_limit() {
    let policy = ReconnectPolicy::FixedInterval {
        interval_ms: 100,
        max_attempts: Some(2),
    };
    let mut schedule = ReconnectSchedule::new(policy);
    assert!(schedule.on_failure(Duration::ZERO));
    assert!(schedule.on_failure(Duration::ZERO));
    assert!(!schedule.on_failure(Duration::ZERO));
    assert_eq!(schedule.attempts(), 3);

    schedule.reset();
    assert_eq!(schedule.attempts(), 0);
    assert!(schedule.on_failure(Duration::ZERO));
}

#[test]
fn test_exponential_backoff_is_capped() {
    let policy = ReconnectPolicy::Exponential {
        base_ms: 250,
        max_ms: 1000,
        max_attempts: 6,
    };
    let delays: Vec<Option<Duration>> = (0..7).map(|n| policy.delay_for(n)).collect();
    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(250)),
            Some(Duration::from_millis(500)),
            Some(Duration::from_millis(1000)),
            Some(Duration::from_millis(1000)),
            Some(Duration::from_millis(1000)),
            Some(Duration::from_millis(1000)),
            None,
        ]
    );
}

#[test]
fn test_policy_json_shape() {
    let policy: ReconnectPolicy = serde_json::from_value(serde_json::json!({
        "strategy": "fixed_interval",
        "interval_ms": 750
    }))
    .unwrap();
    assert_eq!(
        policy,
        ReconnectPolicy::FixedInterval {
            interval_ms: 750,
            max_attempts: None
        }
    );
}
