use std::time::Duration;
use vmon_core::{MemorySurface, MonitorError, MonitorSettings, Sample};
use vmon_runtime::MonitorService;
use vmon_stream::{FieldModel, IngestStatus, ManualSource, SimulatedSource};

fn fast_settings() -> MonitorSettings {
    MonitorSettings {
        window_duration_s: 1.0,
        sample_rate_hz: 200.0,
        render_interval_ms: 20,
        analysis_interval_ms: 50,
        ..MonitorSettings::default()
    }
}

fn quiet_model() -> FieldModel {
    FieldModel {
        noise: 0.0,
        ..FieldModel::default()
    }
}

#[test]
fn simulated_stream_renders_and_analyzes() {
    let settings = fast_settings();
    let mut service = MonitorService::new(
        &settings,
        Box::new(SimulatedSource::new(quiet_model())),
        Box::new(MemorySurface::new()),
        Box::new(MemorySurface::new()),
    )
    .unwrap();

    service.run_for_duration(Duration::from_millis(400)).unwrap();
    let state = service.poll_state().cloned().unwrap();
    assert!(state.render_ticks > 0);
    assert!(state.total_samples > 0);
    assert!(state.buffered <= 200);
    assert_eq!(state.ingest, IngestStatus::Streaming { rate_hz: 200.0 });
    assert!(state.latest.is_some());

    let snapshot = service.snapshot();
    assert!(snapshot.len() <= snapshot.capacity());
    assert_eq!(snapshot.capacity(), 200);

    service.shutdown().unwrap();
}

#[test]
fn operator_commands_are_validated_and_applied() {
    let mut service = MonitorService::new(
        &fast_settings(),
        Box::new(SimulatedSource::new(quiet_model())),
        Box::new(MemorySurface::new()),
        Box::new(MemorySurface::new()),
    )
    .unwrap();

    let err = service.set_sample_rate(-1.0).unwrap_err();
    assert!(matches!(err, MonitorError::InvalidConfig { value, .. } if value == -1.0));
    assert!(matches!(
        service.set_window_duration(f64::INFINITY),
        Err(MonitorError::InvalidConfig { .. })
    ));
    assert_eq!(service.buffer().capacity(), 200);

    let config = service.set_window_duration(0.5).unwrap();
    assert_eq!(config.capacity(), 100);
    assert_eq!(service.buffer().capacity(), 100);

    let config = service.set_sample_rate(50.0).unwrap();
    assert_eq!(config.window_duration_s, 0.5);
    assert_eq!(config.capacity(), 25);
    assert_eq!(service.buffer().capacity(), 25);

    service.run_for_duration(Duration::from_millis(100)).unwrap();
    let state = service.poll_state().unwrap();
    assert_eq!(state.config.sample_rate_hz, 50.0);
    service.shutdown().unwrap();
}

#[test]
fn oversized_window_is_rejected_and_runtime_survives() {
    let mut service = MonitorService::new(
        &fast_settings(),
        Box::new(SimulatedSource::new(quiet_model())),
        Box::new(MemorySurface::new()),
        Box::new(MemorySurface::new()),
    )
    .unwrap();

    for window in [1e18, 1e7] {
        let err = service.set_window_duration(window).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidConfig {
                field: "window_duration_s",
                ..
            }
        ));
    }
    assert_eq!(service.buffer().capacity(), 200);

    let config = service.set_window_duration(2.0).unwrap();
    assert_eq!(config.capacity(), 400);
    service.shutdown().unwrap();
}

#[test]
fn disconnect_is_reported_and_reconnect_recovers() {
    let (source, feed) = ManualSource::channel();
    let mut service = MonitorService::new(
        &fast_settings(),
        Box::new(source),
        Box::new(MemorySurface::new()),
        Box::new(MemorySurface::new()),
    )
    .unwrap();

    for v in 0..10 {
        feed.push(Sample::new(v as f64, 0.0, 0.0));
    }
    feed.disconnect();
    service.run_for_duration(Duration::from_millis(100)).unwrap();
    let state = service.poll_state().cloned().unwrap();
    assert_eq!(state.ingest, IngestStatus::Disconnected);
    assert_eq!(state.buffered, 10);
    assert!(state.last_error.is_some());
    assert_eq!(service.snapshot().len(), 10);

    service.reconnect().unwrap();
    assert!(feed.push(Sample::new(99.0, 0.0, 0.0)));
    service.run_for_duration(Duration::from_millis(100)).unwrap();
    let state = service.poll_state().unwrap();
    assert_eq!(state.ingest, IngestStatus::Streaming { rate_hz: 200.0 });
    assert_eq!(state.latest, Some(Sample::new(99.0, 0.0, 0.0)));
    assert_eq!(feed.subscriptions(), vec![200.0, 200.0]);
}

#[test]
fn simulated_device_disconnect_keeps_last_window() {
    let mut service = MonitorService::new(
        &fast_settings(),
        Box::new(SimulatedSource::new(quiet_model()).with_disconnect_after(20)),
        Box::new(MemorySurface::new()),
        Box::new(MemorySurface::new()),
    )
    .unwrap();

    service.run_for_duration(Duration::from_millis(400)).unwrap();
    let state = service.poll_state().cloned().unwrap();
    assert_eq!(state.ingest, IngestStatus::Disconnected);
    assert_eq!(state.total_samples, 20);
    assert_eq!(service.snapshot().len(), 20);
}

#[test]
fn commands_after_shutdown_fail_cleanly() {
    let mut service = MonitorService::new(
        &fast_settings(),
        Box::new(SimulatedSource::default()),
        Box::new(MemorySurface::new()),
        Box::new(MemorySurface::new()),
    )
    .unwrap();
    service.shutdown().unwrap();
    assert!(matches!(
        service.set_window_duration(2.0),
        Err(MonitorError::Runtime(_))
    ));
    assert!(service.shutdown().is_ok());
}
