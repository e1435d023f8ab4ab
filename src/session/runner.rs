// SessionRunner - drives one staircase per test frequency
//
// Per trial:
// 1. Place the target in interval 1 or 2
// 2. Staircase level -> RETSPL/channel corrected SPL -> calibrated dB FS
// 3. Pace and present both intervals (target interval only)
// 4. Ask the response source which interval held the target
// 5. Score, move the staircase and append the trial log row

use tokio::sync::broadcast;

use crate::audio::playback::check_routing;
use crate::audio::{prepare, OutputSink, Signal};
use crate::calibration::CalibrationModel;
use crate::config::SessionConfig;
use crate::data::{TrialLog, TrialRecord};
use crate::error::{log_audio_error, SessionError};
use crate::observer::{ResponseSource, TrialContext};
use crate::session::pacer::{
    Pacer, INTERVAL_PADDING_SECS, INTER_STIMULUS_SECS, PRE_TRIAL_PAUSE_SECS,
};
use crate::session::progress::{FrequencySummary, SessionProgress, SessionSummary};
use crate::staircase::Staircase;
use crate::stimulus::{Interval, StimulusModel};

/// Capacity of the progress broadcast channel
const PROGRESS_CHANNEL_CAPACITY: usize = 1024;

/// Runs a full threshold session against an output sink and a pacer
pub struct SessionRunner<S: OutputSink, P: Pacer> {
    config: SessionConfig,
    stimulus: StimulusModel,
    calibration: CalibrationModel,
    trial_log: TrialLog,
    sink: S,
    pacer: P,
    progress_tx: broadcast::Sender<SessionProgress>,
    /// Trials run so far across all frequencies
    session_trials: usize,
}

impl<S: OutputSink, P: Pacer> SessionRunner<S, P> {
    /// Validate the session parameters and prepare a runner
    ///
    /// The trial log is stamped with the current time and placed in the
    /// configured data directory.
    pub fn new(config: SessionConfig, sink: S, pacer: P) -> Result<Self, SessionError> {
        config.validate()?;
        check_routing(config.stimulus.num_stim_chans, &config.audio.channel_routing)
            .inspect_err(|err| log_audio_error(err, "SessionRunner::new"))?;

        let stimulus = StimulusModel::new(config.stimulus.num_stim_chans)?;
        let calibration = CalibrationModel::from_config(&config.calibration);
        let trial_log = TrialLog::new(&config.data_dir, &config.subject, &config.condition);
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            stimulus,
            calibration,
            trial_log,
            sink,
            pacer,
            progress_tx,
            session_trials: 0,
        })
    }

    /// Use a reproducible interval assignment
    pub fn with_seed(mut self, seed: u64) -> Result<Self, SessionError> {
        self.stimulus = StimulusModel::with_seed(self.config.stimulus.num_stim_chans, seed)?;
        Ok(self)
    }

    /// Write trials to an explicit log instead of the time-stamped default
    pub fn with_trial_log(mut self, trial_log: TrialLog) -> Self {
        self.trial_log = trial_log;
        self
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionProgress> {
        self.progress_tx.subscribe()
    }

    /// Session parameters, including the calibration levels of the last trial
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn trial_log(&self) -> &TrialLog {
        &self.trial_log
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Test every frequency in order
    pub fn run(
        &mut self,
        responder: &mut dyn ResponseSource,
    ) -> Result<SessionSummary, SessionError> {
        let span = tracing::info_span!(
            "session",
            subject = %self.config.subject,
            condition = %self.config.condition
        );
        let _guard = span.enter();

        let freqs = self.config.stimulus.test_freqs.clone();
        tracing::info!(
            "[SessionRunner] Starting session: {} frequencies, output {}, log {}",
            freqs.len(),
            self.sink.name(),
            self.trial_log.path().display()
        );

        let mut summaries = Vec::with_capacity(freqs.len());
        for (index, &freq) in freqs.iter().enumerate() {
            self.publish(SessionProgress::FrequencyStarted {
                freq,
                index: index + 1,
                total: freqs.len(),
                percent: 100.0 * (index + 1) as f64 / freqs.len() as f64,
            });
            let summary = self.run_frequency(freq, responder)?;
            self.publish(SessionProgress::FrequencyFinished(summary.clone()));
            summaries.push(summary);
        }

        self.publish(SessionProgress::SessionFinished {
            frequencies: summaries.len(),
        });
        tracing::info!("[SessionRunner] Session complete");

        Ok(SessionSummary {
            subject: self.config.subject.clone(),
            condition: self.config.condition.clone(),
            log_path: self.trial_log.path().to_path_buf(),
            frequencies: summaries,
        })
    }

    /// Run one staircase at `freq` until it stops
    pub fn run_frequency(
        &mut self,
        freq: f64,
        responder: &mut dyn ResponseSource,
    ) -> Result<FrequencySummary, SessionError> {
        let span = tracing::info_span!("frequency", freq);
        let _guard = span.enter();
        tracing::info!("[SessionRunner] Testing {} Hz", freq);

        let stim = &self.config.stimulus;
        let signal = self.stimulus.create_stimulus(
            stim.duration,
            stim.sample_rate,
            freq,
            stim.mod_rate,
            stim.mod_depth,
        )?;
        let mut staircase = Staircase::new(self.config.staircase_params())?;

        while staircase.is_running() {
            self.run_trial(freq, &signal, &mut staircase, responder)?;
        }

        let reversal_levels = staircase.reversal_levels();
        let summary = FrequencySummary {
            freq,
            trials: staircase.trials(),
            threshold: staircase.threshold(reversal_levels.len()),
            reversal_levels,
        };
        tracing::info!(
            "[SessionRunner] {} Hz finished after {} trials, threshold {:?}",
            freq,
            summary.trials,
            summary.threshold
        );
        Ok(summary)
    }

    fn run_trial(
        &mut self,
        freq: f64,
        signal: &Signal,
        staircase: &mut Staircase,
        responder: &mut dyn ResponseSource,
    ) -> Result<(), SessionError> {
        let trial = staircase.trials() + 1;
        let target = self.stimulus.assign_stimulus_interval();
        let stair_level = staircase.current_level();

        let desired = self.stimulus.presentation_level(stair_level, freq)?;
        let adjusted = self.calibration.level_for(desired);
        self.calibration.apply_to(&mut self.config.calibration);
        tracing::debug!(
            "[SessionRunner] Trial {}: target interval {}, stair {:.2} -> {:.2} dB SPL -> {:.2} dB FS",
            trial,
            target.number(),
            stair_level,
            desired,
            adjusted
        );

        let prepared = prepare(
            signal,
            adjusted,
            &self.config.audio.channel_routing,
            self.sink.max_output_channels(),
        )?;

        let interval_secs = self.config.stimulus.duration + INTERVAL_PADDING_SECS;
        self.pacer.pause(PRE_TRIAL_PAUSE_SECS);
        for interval in [Interval::First, Interval::Second] {
            if interval == Interval::Second {
                self.pacer.pause(INTER_STIMULUS_SECS);
            }
            if interval == target {
                self.sink.play(&prepared)?;
            }
            self.pacer.pause(interval_secs);
        }
        self.sink.stop()?;

        let context = TrialContext {
            freq,
            trial,
            stair_level,
            desired_level_db: desired,
            target,
        };
        let answer = responder.respond(&context)?;
        let correct = answer == target;

        let point = staircase.add_response(correct)?.clone();
        self.session_trials += 1;
        let record = TrialRecord::from_session(&self.config, self.session_trials, freq, &point);
        self.trial_log.append(&record)?;

        self.publish(SessionProgress::TrialCompleted {
            freq,
            trial: point.trial,
            stair_level: point.level,
            desired_level_db: desired,
            correct,
            reversal: point.reversal,
        });
        Ok(())
    }

    fn publish(&self, event: SessionProgress) {
        // no subscribers is fine
        let _ = self.progress_tx.send(event);
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
