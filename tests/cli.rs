use std::process::Command;
use tempfile::TempDir;

fn elaris_apu() -> Command {
    Command::new(env!("CARGO_BIN_EXE_elaris-apu"))
}

const LOG: &str = "\
# pulse 1 at 440 Hz for a few frames
0      $4015 $01
0      $4000 $BF
0      $4002 $FD
0      $4003 $08
";

#[test]
fn test_headless_trace_prints_a_line_per_frame() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("tone.txt");
    std::fs::write(&log, LOG).unwrap();

    let output = elaris_apu()
        .args([log.to_str().unwrap(), "--no-audio", "--trace", "--seconds", "0.1"])
        .output()
        .expect("failed to run elaris-apu");

    assert!(output.status.success(), "elaris-apu failed: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().filter(|l| l.contains("CYC:")).collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].contains("P1:"));
    assert!(lines[0].contains("440."), "{}", lines[0]);
}

#[test]
fn test_demo_runs_headless() {
    let output = elaris_apu()
        .args(["--no-audio", "--seconds", "0.5"])
        .output()
        .expect("failed to run elaris-apu");

    assert!(output.status.success(), "elaris-apu failed: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn test_save_state_writes_json() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("tone.txt");
    let state = temp.path().join("state.json");
    std::fs::write(&log, LOG).unwrap();

    let output = elaris_apu()
        .args([log.to_str().unwrap(), "--no-audio", "--region", "pal", "--seconds", "0.05"])
        .args(["--save-state", state.to_str().unwrap()])
        .output()
        .expect("failed to run elaris-apu");

    assert!(output.status.success(), "elaris-apu failed: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(json["region"], "Pal");
    assert_eq!(json["pulse1"]["period"], 0xFD);
    assert!(json["cycle"].as_u64().unwrap() > 0);
}

#[test]
fn test_dmc_data_is_fetched() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("dmc.txt");
    let data = temp.path().join("sample.bin");
    let state = temp.path().join("state.json");
    std::fs::write(&log, "0 $4010 $0F\n0 $4012 $04\n0 $4013 $00\n0 $4015 $10\n").unwrap();
    std::fs::write(&data, [0xFFu8]).unwrap();

    let output = elaris_apu()
        .args([log.to_str().unwrap(), "--no-audio", "--seconds", "0.01"])
        .args(["--dmc-data", data.to_str().unwrap(), "--dmc-base", "$C100"])
        .args(["--save-state", state.to_str().unwrap()])
        .output()
        .expect("failed to run elaris-apu");

    assert!(output.status.success(), "elaris-apu failed: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
    // One byte of rising deltas from level 0.
    assert_eq!(json["dmc"]["output_level"], 16);
}

#[test]
fn test_bad_log_reports_line_number() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("bad.txt");
    std::fs::write(&log, "0 $4015 $0F\n10 $4000\n").unwrap();

    let output = elaris_apu()
        .args([log.to_str().unwrap(), "--no-audio"])
        .output()
        .expect("failed to run elaris-apu");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{}", stderr);
}

#[test]
fn test_seconds_must_be_finite_and_non_negative() {
    for seconds in ["inf", "NaN", "-1"] {
        let output = elaris_apu()
            .args(["--no-audio", "--seconds", seconds])
            .output()
            .expect("failed to run elaris-apu");

        assert!(!output.status.success(), "--seconds {} was accepted", seconds);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("--seconds"), "{}", stderr);
    }
}

#[test]
fn test_missing_log_fails() {
    let temp = TempDir::new().unwrap();

    let output = elaris_apu()
        .args([temp.path().join("nope.txt").to_str().unwrap(), "--no-audio"])
        .output()
        .expect("failed to run elaris-apu");

    assert!(!output.status.success());
}
