// StimulusModel - multichannel warble tones and 2IAFC interval assignment

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::audio::Signal;
use crate::error::StimulusError;
use crate::stimulus::retspl;
use crate::stimulus::warble::{self, STIMULUS_RAMP_SECS, STIMULUS_RMS_DB};

/// Vetted modulator starting phases in degrees
pub const STARTING_PHASES_DEG: [f64; 9] = [0.0, 40.0, 80.0, 120.0, 150.0, -40.0, -80.0, -120.0, -150.0];

/// Seed for the phase generator; every run draws the same phase set
pub const PHASE_SEED: u64 = 217;

/// One of the two observation intervals of a 2IAFC trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    First,
    Second,
}

impl Interval {
    /// 1-based interval number as shown to the listener
    pub fn number(&self) -> u8 {
        match self {
            Interval::First => 1,
            Interval::Second => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Interval::First),
            2 => Some(Interval::Second),
            _ => None,
        }
    }

    /// The interval that does not hold the target
    pub fn other(&self) -> Self {
        match self {
            Interval::First => Interval::Second,
            Interval::Second => Interval::First,
        }
    }
}

/// Parse comma-separated numbers ("500, 1000, 2000")
pub fn parse_number_list(input: &str) -> Result<Vec<f64>, StimulusError> {
    let values = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<f64>().map_err(|err| StimulusError::InvalidList {
                input: input.to_string(),
                reason: format!("'{}': {}", token, err),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.is_empty() {
        return Err(StimulusError::InvalidList {
            input: input.to_string(),
            reason: "no values".to_string(),
        });
    }
    Ok(values)
}

/// Parse test frequencies and check each has a RETSPL entry
pub fn parse_test_freqs(input: &str) -> Result<Vec<f64>, StimulusError> {
    let freqs = parse_number_list(input)?;
    if let Some(bad) = freqs.iter().find(|f| !retspl::is_supported(**f)) {
        return Err(StimulusError::UnsupportedFrequency { freq: *bad });
    }
    Ok(freqs)
}

/// Generates stimuli for a fixed number of sound-field channels
pub struct StimulusModel {
    num_channels: usize,
    rng: StdRng,
}

impl StimulusModel {
    /// Create a model with an entropy-seeded interval generator
    pub fn new(num_channels: usize) -> Result<Self, StimulusError> {
        Self::with_rng(num_channels, StdRng::from_entropy())
    }

    /// Create a model with a reproducible interval generator
    pub fn with_seed(num_channels: usize, seed: u64) -> Result<Self, StimulusError> {
        Self::with_rng(num_channels, StdRng::seed_from_u64(seed))
    }

    fn with_rng(num_channels: usize, rng: StdRng) -> Result<Self, StimulusError> {
        if num_channels == 0 || num_channels > STARTING_PHASES_DEG.len() {
            return Err(StimulusError::TooManyChannels {
                requested: num_channels,
                available: STARTING_PHASES_DEG.len(),
            });
        }
        Ok(Self { num_channels, rng })
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Randomly place the target in interval 1 or 2
    pub fn assign_stimulus_interval(&mut self) -> Interval {
        if self.rng.gen_bool(0.5) {
            Interval::First
        } else {
            Interval::Second
        }
    }

    /// Distinct starting phases (radians), one per channel
    pub fn random_phases(&self) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(PHASE_SEED);
        STARTING_PHASES_DEG
            .choose_multiple(&mut rng, self.num_channels)
            .map(|deg| deg.to_radians())
            .collect()
    }

    /// Single-channel presentation level for `stair_level` at `freq`
    pub fn presentation_level(&self, stair_level: f64, freq: f64) -> Result<f64, StimulusError> {
        retspl::presentation_level(stair_level, freq, self.num_channels)
    }

    /// Build an n-channel warble tone using the vetted starting phases
    pub fn create_stimulus(
        &self,
        dur: f64,
        fs: u32,
        fc: f64,
        mod_rate: f64,
        mod_depth: f64,
    ) -> Result<Signal, StimulusError> {
        let phases = self.random_phases();
        self.create_stimulus_with_phases(dur, fs, fc, mod_rate, mod_depth, &phases)
    }

    /// Build an n-channel warble tone with explicit starting phases
    ///
    /// Each channel is gated and scaled to the stimulus RMS independently.
    pub fn create_stimulus_with_phases(
        &self,
        dur: f64,
        fs: u32,
        fc: f64,
        mod_rate: f64,
        mod_depth: f64,
        phases: &[f64],
    ) -> Result<Signal, StimulusError> {
        if phases.len() != self.num_channels {
            return Err(StimulusError::TooManyChannels {
                requested: self.num_channels,
                available: phases.len(),
            });
        }

        let channels = phases
            .iter()
            .map(|&phi| {
                let tone = warble::warble_tone(dur, fs, fc, phi, mod_rate, mod_depth)?;
                let gated = warble::gate(&tone, STIMULUS_RAMP_SECS, fs)?;
                Ok(warble::set_rms(&gated, STIMULUS_RMS_DB)
                    .into_iter()
                    .map(|s| s as f32)
                    .collect::<Vec<f32>>())
            })
            .collect::<Result<Vec<Vec<f32>>, StimulusError>>()?;

        log::debug!(
            "[StimulusModel] {} Hz warble: {} channel(s), {} samples, phases {:?}",
            fc,
            channels.len(),
            channels[0].len(),
            phases
        );

        Signal::from_channels(&channels, fs).map_err(|_| StimulusError::InvalidDuration { duration: dur })
    }
}
