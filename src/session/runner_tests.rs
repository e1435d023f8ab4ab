use super::*;
use crate::audio::NullSink;
use crate::error::{AudioError, ErrorCode};
use crate::observer::SimulatedListener;
use crate::session::pacer::NoopPacer;
use chrono::NaiveDate;
use std::fs;

/// Answers from a fixed script of correct/incorrect outcomes
struct ScriptedResponder {
    script: Vec<bool>,
    next: usize,
    contexts: Vec<TrialContext>,
}

impl ScriptedResponder {
    fn new(script: Vec<bool>) -> Self {
        Self {
            script,
            next: 0,
            contexts: Vec::new(),
        }
    }
}

impl ResponseSource for ScriptedResponder {
    fn respond(&mut self, context: &TrialContext) -> Result<Interval, SessionError> {
        let correct = *self.script.get(self.next).ok_or_else(|| SessionError::Response {
            reason: "script exhausted".to_string(),
        })?;
        self.next += 1;
        self.contexts.push(context.clone());
        Ok(if correct {
            context.target
        } else {
            context.target.other()
        })
    }
}

fn test_config(data_dir: &std::path::Path) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.subject = "P1".to_string();
    config.condition = "quiet".to_string();
    config.stimulus.test_freqs = vec![1000.0];
    config.stimulus.duration = 0.1;
    config.staircase.starting_level = 10.0;
    config.staircase.num_reversals = 3;
    config.data_dir = data_dir.to_path_buf();
    config
}

fn fixed_log(config: &SessionConfig) -> TrialLog {
    let stamp = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    TrialLog::with_timestamp(&config.data_dir, &config.subject, &config.condition, stamp)
}

fn runner(config: SessionConfig) -> SessionRunner<NullSink, NoopPacer> {
    let log = fixed_log(&config);
    SessionRunner::new(config, NullSink::new(), NoopPacer::new())
        .unwrap()
        .with_seed(3)
        .unwrap()
        .with_trial_log(log)
}

// T,F,T,T,F with rapid descend: 10 -> 0 (rev, step 5) -> 5 -> 5 (rev, step 2) -> 3 (rev, stop)
const SCRIPT: [bool; 5] = [true, false, true, true, false];

#[test]
fn test_scripted_session_logs_every_trial() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(test_config(dir.path()));
    let mut responder = ScriptedResponder::new(SCRIPT.to_vec());

    let summary = runner.run(&mut responder).unwrap();
    assert_eq!(summary.frequencies.len(), 1);
    assert_eq!(summary.total_trials(), 5);
    assert_eq!(summary.frequencies[0].reversal_levels, vec![0.0, 5.0, 3.0]);
    let threshold = summary.frequencies[0].threshold.unwrap();
    assert!((threshold - 8.0 / 3.0).abs() < 1e-9);

    let levels: Vec<f64> = responder.contexts.iter().map(|c| c.stair_level).collect();
    assert_eq!(levels, vec![10.0, 0.0, 5.0, 5.0, 3.0]);

    let contents = fs::read_to_string(&summary.log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(summary
        .log_path
        .ends_with("P1_quiet_2024_Jan_02_0930.csv"));
    // trial 2 was incorrect at stair 0 dB -> 0.8 dB SPL at 1 kHz
    assert!(lines[2].starts_with("2,P1,quiet,"));
    assert!(lines[2].contains(",0.8,"));
    assert!(lines[2].ends_with(",1000,0,-1,true"));
}

#[test]
fn test_calibration_applied_to_each_trial() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(test_config(dir.path()));
    let mut responder = ScriptedResponder::new(SCRIPT.to_vec());
    runner.run(&mut responder).unwrap();

    // last trial: stair 3 dB + RETSPL 0.8 = 3.8 dB SPL; offset 100 -> -96.2 dB FS
    let cal = &runner.config().calibration;
    assert!((cal.desired_level_db - 3.8).abs() < 1e-9);
    assert!((cal.adjusted_level_db + 96.2).abs() < 1e-9);
    assert_eq!(runner.sink().last_level_db(), Some(cal.adjusted_level_db));
}

#[test]
fn test_one_presentation_per_trial_and_pacing() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(test_config(dir.path()));
    let mut responder = ScriptedResponder::new(SCRIPT.to_vec());
    runner.run(&mut responder).unwrap();

    assert_eq!(runner.sink().presentations(), 5);
    let per_trial = [0.5, 0.25, 0.5, 0.25];
    let pauses = runner.pacer().pauses();
    assert_eq!(pauses.len(), 20);
    for (pause, expected) in pauses.iter().zip(per_trial.iter().cycle()) {
        assert!((pause - expected).abs() < 1e-9);
    }
}

#[test]
fn test_progress_events() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.stimulus.test_freqs = vec![1000.0, 2000.0];
    let mut runner = runner(config);
    let mut rx = runner.subscribe();
    let mut script = SCRIPT.to_vec();
    script.extend_from_slice(&SCRIPT);
    let mut responder = ScriptedResponder::new(script);

    runner.run(&mut responder).unwrap();

    let mut percents = Vec::new();
    let mut trials = 0;
    let mut finished = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            SessionProgress::FrequencyStarted { percent, .. } => percents.push(percent),
            SessionProgress::TrialCompleted { .. } => trials += 1,
            SessionProgress::SessionFinished { frequencies } => {
                assert_eq!(frequencies, 2);
                finished = true;
            }
            SessionProgress::FrequencyFinished(_) => {}
        }
    }
    assert_eq!(percents, vec![50.0, 100.0]);
    assert_eq!(trials, 10);
    assert!(finished);
}

#[test]
fn test_log_trial_numbers_continue_across_frequencies() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.stimulus.test_freqs = vec![1000.0, 2000.0];
    let mut runner = runner(config);
    let mut script = SCRIPT.to_vec();
    script.extend_from_slice(&SCRIPT);
    let mut responder = ScriptedResponder::new(script);

    let summary = runner.run(&mut responder).unwrap();

    let contents = fs::read_to_string(&summary.log_path).unwrap();
    let trials: Vec<&str> = contents
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(trials, vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
    // each staircase still counts its own trials
    let per_staircase: Vec<usize> = responder.contexts.iter().map(|c| c.trial).collect();
    assert_eq!(per_staircase, vec![1, 2, 3, 4, 5, 1, 2, 3, 4, 5]);
}

#[test]
fn test_clipping_aborts_before_presentation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.calibration.slm_offset = 0.0;
    config.staircase.starting_level = 80.0;
    let mut runner = runner(config);
    let mut responder = ScriptedResponder::new(SCRIPT.to_vec());

    let err = runner.run(&mut responder).unwrap_err();
    assert!(matches!(err, SessionError::Audio(AudioError::Clipping { .. })));
    assert_eq!(runner.sink().presentations(), 0);
    assert!(responder.contexts.is_empty());
}

#[test]
fn test_routing_checked_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.stimulus.num_stim_chans = 2;
    config.audio.channel_routing = vec![1];

    let err = SessionRunner::new(config, NullSink::new(), NoopPacer::new())
        .err()
        .unwrap();
    assert_eq!(err.code(), 3001);
}

#[test]
fn test_responder_failure_stops_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(test_config(dir.path()));
    let mut responder = ScriptedResponder::new(vec![true, true]);

    let err = runner.run(&mut responder).unwrap_err();
    assert_eq!(err.code(), 5001);
    // both answered trials were logged
    let contents = fs::read_to_string(runner.trial_log().path()).unwrap();
    assert_eq!(contents.lines().count(), 3);
}

#[test]
fn test_simulated_listener_converges() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.staircase.starting_level = 40.0;
    config.staircase.num_reversals = 12;
    config.staircase.step_sizes = vec![8.0, 4.0, 2.0];
    let mut runner = runner(config);
    let mut listener = SimulatedListener::new(5.0, 1.0, 11);

    let summary = runner.run(&mut listener).unwrap();
    let threshold = summary.frequencies[0].threshold.unwrap();
    assert!(
        (threshold - 5.0).abs() < 8.0,
        "threshold {} too far from 5.0",
        threshold
    );
}
