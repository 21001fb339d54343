#![cfg(not(target_arch = "wasm32"))]

use std::path::Path;
use std::process::{Command, Output};

fn run_replay(script: &Path, config: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ps2kbc-replay"));
    cmd.arg("--script").arg(script);
    if let Some(config) = config {
        cmd.arg("--config").arg(config);
    }
    cmd.output().expect("failed to spawn ps2kbc-replay")
}

#[test]
fn replays_keyboard_identify_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("identify.json");
    std::fs::write(
        &script,
        r#"[
            {"op": "write", "port": 100, "value": 96},
            {"op": "write", "port": 96, "value": 1},
            {"op": "write", "port": 96, "value": 242},
            {"op": "read", "port": 96, "expect": 250},
            {"op": "read", "port": 96, "expect": 171},
            {"op": "read", "port": 96, "expect": 131}
        ]"#,
    )
    .unwrap();

    let output = run_replay(&script, None);
    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "300000 0x0060 0xfa\n\
         400000 0x0060 0xab\n\
         500000 0x0060 0x83\n\
         irq1 pulses: 3\n\
         irq12 pulses: 0\n\
         ticks: 600000\n"
    );
}

#[test]
fn honors_relocated_ports_and_latency() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"data_port": 352, "command_port": 356, "latency": 7}"#,
    )
    .unwrap();
    let script = dir.path().join("status.json");
    std::fs::write(&script, r#"[{"op": "read", "port": 356, "expect": 0}]"#).unwrap();

    let output = run_replay(&script, Some(&config));
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("0 0x0164 0x00\n"), "{stdout}");
    assert!(stdout.ends_with("ticks: 7\n"), "{stdout}");
}

#[test]
fn fatal_controller_command_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("reset.json");
    std::fs::write(
        &script,
        r#"[
            {"op": "read", "port": 100},
            {"op": "write", "port": 100, "value": 254}
        ]"#,
    )
    .unwrap();

    let output = run_replay(&script, None);
    assert!(!output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "0 0x0064 0x00\n");
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("System reset"),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}
