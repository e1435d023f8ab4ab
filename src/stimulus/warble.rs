//! Warble tone synthesis and level helpers
//!
//! Pure, allocation-per-call functions used to build sound-field stimuli:
//! - FM warble tone with a selectable modulator starting phase
//! - Raised-cosine onset/offset gating
//! - RMS scaling to a dB full-scale target

use std::f64::consts::PI;

use crate::error::StimulusError;

/// Onset/offset ramp applied to every stimulus (seconds)
pub const STIMULUS_RAMP_SECS: f64 = 0.04;

/// RMS of every generated channel before level scaling (dB FS)
pub const STIMULUS_RMS_DB: f64 = -40.0;

/// Number of samples in `dur` seconds at `fs`
pub fn num_samples(dur: f64, fs: u32) -> usize {
    (dur * fs as f64).round() as usize
}

/// Convert decibels to a linear magnitude
#[inline]
pub fn db_to_mag(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Convert a linear magnitude to decibels
#[inline]
pub fn mag_to_db(mag: f64) -> f64 {
    20.0 * mag.log10()
}

/// Generates a single-channel warble (sinusoidal FM) tone.
///
/// `y(t) = sin(wc·t + (B/wd)·(sin(wd·t − phi) + 1))` where
/// `wc = 2π·fc`, `wd = 2π·mod_rate` and `B = (mod_depth/100)·wc`.
///
/// # Arguments
/// * `dur` - Duration in seconds
/// * `fs` - Sampling rate in Hz
/// * `fc` - Carrier (centre) frequency in Hz
/// * `phi` - Modulator starting phase in radians
/// * `mod_rate` - Modulation rate in Hz
/// * `mod_depth` - Modulation depth in percent of `fc`
pub fn warble_tone(
    dur: f64,
    fs: u32,
    fc: f64,
    phi: f64,
    mod_rate: f64,
    mod_depth: f64,
) -> Result<Vec<f64>, StimulusError> {
    if fs == 0 {
        return Err(StimulusError::InvalidSampleRate { sample_rate: fs });
    }
    if !dur.is_finite() || dur <= 0.0 {
        return Err(StimulusError::InvalidDuration { duration: dur });
    }

    let wc = 2.0 * PI * fc;
    let wd = 2.0 * PI * mod_rate;
    let beta = (mod_depth / 100.0) * wc;
    // Without modulation the tone reduces to a plain sinusoid
    let index = if wd == 0.0 { 0.0 } else { beta / wd };

    let n = num_samples(dur, fs);
    Ok((0..n)
        .map(|k| {
            let t = k as f64 / fs as f64;
            (wc * t + index * ((wd * t - phi).sin() + 1.0)).sin()
        })
        .collect())
}

/// Applies raised-cosine rising and falling ramps of `ramp_dur` seconds.
///
/// Returns `InvalidDuration` when the signal is shorter than both ramps.
pub fn gate(signal: &[f64], ramp_dur: f64, fs: u32) -> Result<Vec<f64>, StimulusError> {
    let ramp_len = (fs as f64 * ramp_dur) as usize;
    if signal.len() < 2 * ramp_len {
        return Err(StimulusError::InvalidDuration {
            duration: signal.len() as f64 / fs.max(1) as f64,
        });
    }
    if ramp_len == 0 {
        return Ok(signal.to_vec());
    }

    // cos over [pi, 2pi] mapped into [0, 1]
    let denom = (ramp_len.max(2) - 1) as f64;
    let ramp: Vec<f64> = (0..ramp_len)
        .map(|i| {
            let theta = PI + PI * (i as f64 / denom);
            (theta.cos() + 1.0) / 2.0
        })
        .collect();

    let offset_start = signal.len() - ramp_len;
    Ok(signal
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            if i < ramp_len {
                s * ramp[i]
            } else if i >= offset_start {
                s * ramp[ramp_len - 1 - (i - offset_start)]
            } else {
                s
            }
        })
        .collect())
}

/// Root-mean-square of a signal
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|s| s * s).sum::<f64>() / signal.len() as f64).sqrt()
}

/// Scales `signal` so its RMS equals `db` dB full scale.
///
/// A silent signal is returned unchanged.
pub fn set_rms(signal: &[f64], db: f64) -> Vec<f64> {
    let current = rms(signal);
    if current == 0.0 {
        return signal.to_vec();
    }
    let gain = db_to_mag(db) / current;
    signal.iter().map(|s| s * gain).collect()
}
