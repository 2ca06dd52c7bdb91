use std::process::Command;

#[test]
fn init_then_show_settings() {
    let exe = env!("CARGO_BIN_EXE_vmon");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vmon").join("settings.json");

    let status = Command::new(exe)
        .arg("init-settings")
        .arg(&path)
        .status()
        .expect("run vmon init-settings");
    assert!(status.success());
    assert!(path.exists());

    let output = Command::new(exe)
        .arg("show-settings")
        .arg("--settings")
        .arg(&path)
        .output()
        .expect("run vmon show-settings");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"sample_rate_hz\": 100.0"), "{stdout}");
}

#[test]
fn short_run_exits_cleanly() {
    let exe = env!("CARGO_BIN_EXE_vmon");
    let output = Command::new(exe)
        .args(["run", "--duration-seconds", "1", "--window", "1", "--rate", "50"])
        .output()
        .expect("run vmon");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("samples ingested"), "{stderr}");
}

#[test]
fn invalid_rate_fails() {
    let exe = env!("CARGO_BIN_EXE_vmon");
    let output = Command::new(exe)
        .args(["run", "--duration-seconds", "1", "--rate", "-5"])
        .output()
        .expect("run vmon");
    assert!(!output.status.success());
}
