use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn cli(session: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_peat"));
    cmd.arg("--session").arg(session);
    cmd
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} exited with {:?}: {}",
        what,
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");

    let output = cli(&session).args(["config", "init"]).output().expect("config init");
    assert_success(&output, "config init");
    assert!(session.exists());

    // second init without --force refuses to overwrite
    let output = cli(&session).args(["config", "init"]).output().expect("config init");
    assert!(!output.status.success());

    let output = cli(&session).args(["config", "show"]).output().expect("config show");
    assert_success(&output, "config show");
    let json: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(json["stimulus"]["sample_rate"], 48000);
}

#[test]
fn calibrate_offset_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");

    let output = cli(&session)
        .args(["calibrate", "offset", "--reading", "72.5", "--cal-level", "-30"])
        .output()
        .expect("calibrate offset");
    assert_success(&output, "calibrate offset");
    assert!(String::from_utf8_lossy(&output.stdout).contains("102.50"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&session).unwrap()).unwrap();
    assert_eq!(saved["calibration"]["slm_offset"], 102.5);
}

#[test]
fn calibrate_tone_writes_wav() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    let wav = dir.path().join("cal.wav");

    let output = cli(&session)
        .args(["calibrate", "tone", "--duration", "0.5", "--output"])
        .arg(&wav)
        .output()
        .expect("calibrate tone");
    assert_success(&output, "calibrate tone");

    let reader = hound::WavReader::open(&wav).expect("wav written");
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 24000);
}

#[test]
fn calibrate_play_presents_and_saves_cal_file() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    let capture = dir.path().join("capture");
    let custom = dir.path().join("custom.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&custom, spec).unwrap();
    for i in 0..4410 {
        writer.write_sample(if i % 2 == 0 { 0.5_f32 } else { -0.5 }).unwrap();
    }
    writer.finalize().unwrap();

    let output = cli(&session)
        .args(["calibrate", "play", "--cal-file"])
        .arg(&custom)
        .arg("--capture-dir")
        .arg(&capture)
        .output()
        .expect("calibrate play");
    assert_success(&output, "calibrate play");

    let saved: Value = serde_json::from_str(&fs::read_to_string(&session).unwrap()).unwrap();
    assert_eq!(saved["calibration"]["cal_file"], custom.display().to_string());

    // presented at the default -30 dB FS calibration level
    let mut reader = hound::WavReader::open(capture.join("presentation_0001.wav")).unwrap();
    assert_eq!(reader.len(), 4410);
    let first: f32 = reader.samples::<f32>().next().unwrap().unwrap();
    assert!((first - 0.5 * 10f32.powf(-30.0 / 20.0)).abs() < 1e-3, "got {first}");

    // --builtin forgets the saved file and plays the 2 s warble
    let output = cli(&session)
        .args(["calibrate", "play", "--builtin", "--capture-dir"])
        .arg(&capture)
        .output()
        .expect("calibrate play --builtin");
    assert_success(&output, "calibrate play --builtin");
    let saved: Value = serde_json::from_str(&fs::read_to_string(&session).unwrap()).unwrap();
    assert!(saved["calibration"]["cal_file"].is_null());
    let reader = hound::WavReader::open(capture.join("presentation_0001.wav")).unwrap();
    assert_eq!(reader.len(), 96000);
}

#[test]
fn simulate_then_score() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    let data = dir.path().join("Data");

    let output = cli(&session)
        .args(["simulate", "--subject", "S9", "--condition", "aided"])
        .args(["--freqs", "500, 2000", "--threshold", "15", "--seed", "3"])
        .arg("--data-dir")
        .arg(&data)
        .output()
        .expect("simulate");
    assert_success(&output, "simulate");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Testing 500 Hz"), "got {stdout}");

    let output = cli(&session)
        .args(["score", "--reversals", "3", "--dir"])
        .arg(&data)
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .expect("score");
    assert_success(&output, "score");

    let thresholds = fs::read_to_string(dir.path().join("thresholds.csv")).unwrap();
    let lines: Vec<&str> = thresholds.lines().collect();
    assert_eq!(lines[0], "subject,condition,freq,threshold,reversals_used");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("S9,aided,500,"));
    assert!(lines[2].starts_with("S9,aided,2000,"));
}

#[test]
fn unsupported_frequency_fails() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");

    let output = cli(&session)
        .args(["simulate", "--freqs", "1100"])
        .arg("--data-dir")
        .arg(dir.path())
        .output()
        .expect("simulate");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1100"));
}
