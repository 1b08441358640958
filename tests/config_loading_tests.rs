use gazeflow::config::GazeConfig;
use gazeflow::filter::FilterKernel;
use gazeflow::resilience::ReconnectPolicy;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_load_partial_file_fills_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "source": {{ "kind": "replay", "params": {{ "path": "session.json" }} }},
            "filter": {{ "kernel": "uniform", "window_ms": 100 }},
            "reconnect": {{ "strategy": "exponential", "base_ms": 500, "max_ms": 8000, "max_attempts": 5 }}
        }}"#
    )
    .unwrap();

    let config = GazeConfig::load(file.path()).unwrap();
    assert_eq!(config.source.kind, "replay");
    assert_eq!(config.source.params["path"], "session.json");
    assert_eq!(config.filter.kernel, FilterKernel::Uniform);
    assert_eq!(config.filter.window_ms, 100);
    assert_eq!(
        config.reconnect,
        ReconnectPolicy::Exponential {
            base_ms: 500,
            max_ms: 8000,
            max_attempts: 5
        }
    );
    assert_eq!(config.estimator.stale_threshold_s, 0.5);
    assert_eq!(config.magnification.zoom, 0.5);
    assert_eq!(config.host.max_lifetime_s, None);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = GazeConfig::load(dir.path().join("absent.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config"));
}

#[test]
fn test_malformed_json_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ \"filter\": ").unwrap();
    let err = GazeConfig::load(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config"));
}

#[test]
fn test_out_of_range_values_fail_validation() {
    for bad in [
        serde_json::json!({ "magnification": { "zoom": 2.0 } }),
        serde_json::json!({ "magnification": { "zoom": 0.0 } }),
        serde_json::json!({ "magnification": { "animation_s": 0.0 } }),
        serde_json::json!({ "filter": { "window_ms": 0 } }),
        serde_json::json!({ "filter": { "max_history": 0 } }),
        serde_json::json!({ "trigger": { "offsets": [] } }),
        serde_json::json!({ "host": { "max_lifetime_s": -1.0 } }),
    ] {
        assert!(GazeConfig::from_json(bad.clone()).is_err(), "accepted {}", bad);
    }
}

#[test]
fn test_save_then_load_preserves_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gazeflow.json");

    let mut config = GazeConfig::default();
    config.trigger.dwell_s = 0.9;
    config.host.max_lifetime_s = Some(45.0);
    config.reconnect = ReconnectPolicy::Never;
    config.save(&path).unwrap();

    let loaded = GazeConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}
