// Staircase - transformed up-down tracking for 2IAFC threshold search
//
// The track moves down after `n_down` consecutive correct responses and up
// after `n_up` consecutive incorrect responses. With the default 1-up/2-down
// rule it converges on the 70.7% correct point (Levitt, 1971).
//
// Step sizes shrink with each reversal; the last step size is repeated until
// the requested number of reversals has been collected.

use crate::error::{log_staircase_error, StaircaseError};
use crate::staircase::datapoint::{DataPoint, Direction, Response};

/// Construction parameters for a staircase
#[derive(Debug, Clone, PartialEq)]
pub struct StaircaseParams {
    pub start_level: f64,
    pub step_sizes: Vec<f64>,
    pub n_up: usize,
    pub n_down: usize,
    /// Stop after this many trials (0 = no trial limit)
    pub n_trials: usize,
    /// Stop after this many reversals
    pub n_reversals: usize,
    /// Use a 1-down rule until the first incorrect response
    pub rapid_descend: bool,
    pub min_level: f64,
    pub max_level: f64,
}

impl Default for StaircaseParams {
    fn default() -> Self {
        Self {
            start_level: 30.0,
            step_sizes: vec![10.0, 5.0, 2.0],
            n_up: 1,
            n_down: 2,
            n_trials: 0,
            n_reversals: 5,
            rapid_descend: true,
            min_level: -50.0,
            max_level: 90.0,
        }
    }
}

impl StaircaseParams {
    /// Check step sizes, bounds and the reversal count
    pub fn validate(&self) -> Result<(), StaircaseError> {
        if self.step_sizes.is_empty() {
            return Err(StaircaseError::InvalidStepSizes {
                reason: "at least one step size is required".to_string(),
            });
        }
        if let Some(bad) = self
            .step_sizes
            .iter()
            .find(|step| !step.is_finite() || **step <= 0.0)
        {
            return Err(StaircaseError::InvalidStepSizes {
                reason: format!("step size {} must be positive", bad),
            });
        }
        if self.n_up == 0 || self.n_down == 0 {
            return Err(StaircaseError::InvalidStepSizes {
                reason: format!(
                    "n_up ({}) and n_down ({}) must be at least 1",
                    self.n_up, self.n_down
                ),
            });
        }
        if self.max_level <= self.min_level {
            return Err(StaircaseError::InvalidBounds {
                min_level: self.min_level,
                max_level: self.max_level,
            });
        }
        if self.start_level < self.min_level || self.start_level > self.max_level {
            return Err(StaircaseError::StartOutOfBounds {
                start: self.start_level,
                min_level: self.min_level,
                max_level: self.max_level,
            });
        }
        if self.n_reversals < self.step_sizes.len() {
            return Err(StaircaseError::NotEnoughReversals {
                reversals: self.n_reversals,
                steps: self.step_sizes.len(),
            });
        }
        Ok(())
    }
}

/// Adaptive staircase state machine
#[derive(Debug, Clone)]
pub struct Staircase {
    params: StaircaseParams,
    current_level: f64,
    correct_run: usize,
    incorrect_run: usize,
    last_direction: Option<Direction>,
    reversals: usize,
    rapid_descend_active: bool,
    data: Vec<DataPoint>,
    running: bool,
}

impl Staircase {
    /// Create a staircase after validating its parameters
    pub fn new(params: StaircaseParams) -> Result<Self, StaircaseError> {
        params.validate().inspect_err(|err| {
            log_staircase_error(err, "Staircase::new");
        })?;

        log::debug!(
            "[Staircase] start={} steps={:?} {}-up/{}-down reversals={} trials={} rapid_descend={} bounds=[{}, {}]",
            params.start_level,
            params.step_sizes,
            params.n_up,
            params.n_down,
            params.n_reversals,
            params.n_trials,
            params.rapid_descend,
            params.min_level,
            params.max_level
        );

        Ok(Self {
            current_level: params.start_level,
            rapid_descend_active: params.rapid_descend,
            params,
            correct_run: 0,
            incorrect_run: 0,
            last_direction: None,
            reversals: 0,
            data: Vec::new(),
            running: true,
        })
    }

    /// Level for the next trial
    pub fn current_level(&self) -> f64 {
        self.current_level
    }

    /// False once the stopping rule has been met
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn reversals(&self) -> usize {
        self.reversals
    }

    pub fn trials(&self) -> usize {
        self.data.len()
    }

    pub fn params(&self) -> &StaircaseParams {
        &self.params
    }

    pub fn data_points(&self) -> &[DataPoint] {
        &self.data
    }

    /// Most recently recorded trial
    pub fn last_data_point(&self) -> Option<&DataPoint> {
        self.data.last()
    }

    /// Step size currently in effect
    pub fn current_step(&self) -> f64 {
        let idx = self.reversals.min(self.params.step_sizes.len() - 1);
        self.params.step_sizes[idx]
    }

    /// Levels of every reversal trial, in order
    pub fn reversal_levels(&self) -> Vec<f64> {
        self.data
            .iter()
            .filter(|point| point.reversal)
            .map(|point| point.level)
            .collect()
    }

    /// Mean of the last `last_n` reversal levels
    ///
    /// Uses every available reversal when fewer than `last_n` exist.
    /// Returns `None` without reversals or when `last_n` is 0.
    pub fn threshold(&self, last_n: usize) -> Option<f64> {
        if last_n == 0 {
            return None;
        }
        let levels = self.reversal_levels();
        if levels.is_empty() {
            return None;
        }
        let tail = &levels[levels.len().saturating_sub(last_n)..];
        Some(tail.iter().sum::<f64>() / tail.len() as f64)
    }

    /// Score the trial presented at `current_level` and move the track
    ///
    /// # Returns
    /// * `Ok(&DataPoint)` - The recorded trial
    /// * `Err(StaircaseError::AlreadyComplete)` - Stopping rule already met
    pub fn add_response(&mut self, correct: bool) -> Result<&DataPoint, StaircaseError> {
        if !self.running {
            let err = StaircaseError::AlreadyComplete {
                trials: self.trials(),
                reversals: self.reversals,
            };
            log_staircase_error(&err, "add_response");
            return Err(err);
        }

        let response = Response::from_correct(correct);
        let presented_level = self.current_level;
        let movement = self.next_direction(response);

        let mut reversal = false;
        if let Some(direction) = movement {
            if matches!(self.last_direction, Some(prev) if prev != direction) {
                reversal = true;
                self.reversals += 1;
            }
            self.last_direction = Some(direction);

            let step = self.current_step();
            self.current_level = (self.current_level + direction.sign() * step)
                .clamp(self.params.min_level, self.params.max_level);
        }

        self.data.push(DataPoint {
            trial: self.data.len() + 1,
            level: presented_level,
            response,
            reversal,
        });

        log::debug!(
            "[Staircase] trial {} at {:.2} -> {:?}{} next={:.2} reversals={}/{}",
            self.data.len(),
            presented_level,
            response,
            if reversal { " (reversal)" } else { "" },
            self.current_level,
            self.reversals,
            self.params.n_reversals
        );

        self.update_status();

        // `data` was pushed above
        Ok(&self.data[self.data.len() - 1])
    }

    fn next_direction(&mut self, response: Response) -> Option<Direction> {
        if self.rapid_descend_active {
            return match response {
                Response::Correct => Some(Direction::Down),
                Response::Incorrect => {
                    self.rapid_descend_active = false;
                    log::debug!("[Staircase] rapid descend ended at {}", self.current_level);
                    Some(Direction::Up)
                }
            };
        }

        match response {
            Response::Correct => {
                self.correct_run += 1;
                self.incorrect_run = 0;
                if self.correct_run >= self.params.n_down {
                    self.correct_run = 0;
                    return Some(Direction::Down);
                }
            }
            Response::Incorrect => {
                self.incorrect_run += 1;
                self.correct_run = 0;
                if self.incorrect_run >= self.params.n_up {
                    self.incorrect_run = 0;
                    return Some(Direction::Up);
                }
            }
        }
        None
    }

    fn update_status(&mut self) {
        let reversals_done = self.reversals >= self.params.n_reversals;
        let trials_done = self.params.n_trials > 0 && self.trials() >= self.params.n_trials;
        if reversals_done || trials_done {
            self.running = false;
            log::info!(
                "[Staircase] complete after {} trials ({} reversals)",
                self.trials(),
                self.reversals
            );
        }
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
