use vmon_core::settings::{DEFAULT_ANALYSIS_INTERVAL_MS, DEFAULT_RENDER_INTERVAL_MS};
use vmon_core::{MonitorError, MonitorSettings};

#[test]
fn defaults_match_startup_window() {
    let settings = MonitorSettings::default();
    let config = settings.config().unwrap();
    assert_eq!(config.capacity(), 500);
    assert_eq!(settings.render_interval_ms, DEFAULT_RENDER_INTERVAL_MS);
    assert_eq!(settings.analysis_interval_ms, DEFAULT_ANALYSIS_INTERVAL_MS);
    assert_eq!(settings.axis_labels[0], "Field X (nT)");
    assert_eq!(settings.readout_labels, vec!["BX", "BY", "BZ"]);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("monitor.json");
    let settings = MonitorSettings {
        window_duration_s: 2.0,
        sample_rate_hz: 250.0,
        ..MonitorSettings::default()
    };
    settings.save_to_file(&path).unwrap();
    let loaded = MonitorSettings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn load_fills_missing_fields_and_clamps_intervals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    std::fs::write(
        &path,
        r#"{"window_duration_s": 1.0, "sample_rate_hz": 10.0, "render_interval_ms": 0, "axis_labels": ["", "Y"]}"#,
    )
    .unwrap();
    let loaded = MonitorSettings::load_from_file(&path).unwrap();
    assert_eq!(loaded.render_interval_ms, 10);
    assert_eq!(loaded.analysis_interval_ms, DEFAULT_ANALYSIS_INTERVAL_MS);
    assert_eq!(loaded.axis_labels, vec!["Field X (nT)", "Y", "Field Z (nT)"]);
    assert_eq!(loaded.unit, "nT");
}

#[test]
fn load_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    std::fs::write(&path, r#"{"window_duration_s": -3.0, "sample_rate_hz": 10.0}"#).unwrap();
    let err = MonitorSettings::load_from_file(&path).unwrap_err();
    assert!(matches!(err, MonitorError::InvalidConfig { .. }));
}

#[test]
fn load_reports_missing_file_and_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let missing = MonitorSettings::load_from_file(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, MonitorError::Io(_)));

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{not json").unwrap();
    let broken = MonitorSettings::load_from_file(&path).unwrap_err();
    assert!(matches!(broken, MonitorError::Json(_)));
}
