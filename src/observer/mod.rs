//! Response sources for 2IAFC trials.
//!
//! The session runner asks a [ResponseSource] which interval held the
//! target after both intervals have played. Interactive sessions read the
//! answer from a terminal; simulations draw it from a psychometric
//! function.

use std::io::{BufRead, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SessionError;
use crate::stimulus::Interval;

/// What a response source knows about the trial being answered
#[derive(Debug, Clone, PartialEq)]
pub struct TrialContext {
    /// Test frequency (Hz)
    pub freq: f64,
    /// 1-based trial number within the current frequency
    pub trial: usize,
    /// Staircase level of this trial
    pub stair_level: f64,
    /// Calibrated SPL the target was presented at
    pub desired_level_db: f64,
    /// Interval that held the target
    pub target: Interval,
}

/// Trait implemented by anything that can answer a trial
pub trait ResponseSource {
    fn respond(&mut self, context: &TrialContext) -> Result<Interval, SessionError>;
}

/// Reads "1" or "2" per trial from a line-oriented input
pub struct KeyboardResponder<R, W> {
    input: R,
    prompt: W,
}

impl<R: BufRead, W: Write> KeyboardResponder<R, W> {
    pub fn new(input: R, prompt: W) -> Self {
        Self { input, prompt }
    }
}

impl<R: BufRead, W: Write> ResponseSource for KeyboardResponder<R, W> {
    fn respond(&mut self, context: &TrialContext) -> Result<Interval, SessionError> {
        let io_failure = |err: std::io::Error| SessionError::Response {
            reason: err.to_string(),
        };

        loop {
            write!(
                self.prompt,
                "Trial {} ({} Hz): which interval had the tone? [1/2, q to quit] ",
                context.trial, context.freq
            )
            .map_err(io_failure)?;
            self.prompt.flush().map_err(io_failure)?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(io_failure)?;
            if read == 0 {
                return Err(SessionError::Response {
                    reason: "input closed before a response was given".to_string(),
                });
            }

            match line.trim() {
                "1" => return Ok(Interval::First),
                "2" => return Ok(Interval::Second),
                "q" | "Q" => {
                    return Err(SessionError::Response {
                        reason: "session aborted by user".to_string(),
                    })
                }
                other => {
                    log::debug!("[KeyboardResponder] ignoring input {:?}", other);
                    writeln!(self.prompt, "Please press 1 or 2.").map_err(io_failure)?;
                }
            }
        }
    }
}

/// Simulated listener with a logistic 2IAFC psychometric function
///
/// The probability of a correct answer rises from 0.5 (guessing) to 1.0,
/// passing 0.75 at `threshold` (in staircase units).
#[derive(Debug, Clone)]
pub struct SimulatedListener {
    threshold: f64,
    slope: f64,
    rng: StdRng,
}

impl SimulatedListener {
    pub fn new(threshold: f64, slope: f64, seed: u64) -> Self {
        Self {
            threshold,
            slope: slope.abs().max(f64::EPSILON),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Probability of choosing the correct interval at `level`
    pub fn p_correct(&self, level: f64) -> f64 {
        0.5 + 0.5 / (1.0 + (-(level - self.threshold) / self.slope).exp())
    }
}

impl ResponseSource for SimulatedListener {
    fn respond(&mut self, context: &TrialContext) -> Result<Interval, SessionError> {
        let p = self.p_correct(context.stair_level);
        let correct = self.rng.gen::<f64>() < p;
        Ok(if correct {
            context.target
        } else {
            context.target.other()
        })
    }
}
