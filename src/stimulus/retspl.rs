// Reference equivalent threshold SPLs and presentation level arithmetic
//
// RETSPLs for binaural listening in a diffuse sound field, ANSI S3.6
// Table 9a. Staircase levels are expressed re: these values, so adding the
// RETSPL converts a staircase level into dB SPL at the listening position.

use crate::error::StimulusError;

/// (frequency Hz, RETSPL dB SPL)
pub const RETSPL: [(f64, f64); 34] = [
    (20.0, 78.1),
    (25.0, 68.7),
    (31.5, 59.5),
    (40.0, 51.1),
    (50.0, 44.0),
    (63.0, 37.5),
    (80.0, 31.5),
    (100.0, 26.5),
    (125.0, 22.1),
    (160.0, 17.9),
    (200.0, 14.4),
    (250.0, 11.4),
    (315.0, 8.4),
    (400.0, 5.8),
    (500.0, 3.8),
    (630.0, 2.1),
    (750.0, 1.2),
    (800.0, 1.0),
    (1000.0, 0.8),
    (1250.0, 1.9),
    (1500.0, 1.0),
    (1600.0, 0.5),
    (2000.0, -1.5),
    (2500.0, -3.1),
    (3000.0, -4.0),
    (4000.0, -3.8),
    (6000.0, 1.4),
    (6300.0, 2.5),
    (8000.0, 6.8),
    (9000.0, 8.4),
    (10000.0, 9.8),
    (11200.0, 11.5),
    (14000.0, 23.2),
    (16000.0, 43.7),
];

/// Look up the RETSPL for an exact table frequency
pub fn retspl(freq: f64) -> Result<f64, StimulusError> {
    RETSPL
        .iter()
        .find(|(f, _)| (*f - freq).abs() < 1e-6)
        .map(|(_, level)| *level)
        .ok_or(StimulusError::UnsupportedFrequency { freq })
}

/// Whether `freq` has a RETSPL entry
pub fn is_supported(freq: f64) -> bool {
    retspl(freq).is_ok()
}

/// Per-source level so that `num_sources` incoherent sources sum to
/// `desired_spl` at the listening position.
pub fn rms_based_on_sources(desired_spl: f64, num_sources: usize) -> f64 {
    desired_spl - 10.0 * (num_sources.max(1) as f64).log10()
}

/// Round to 0.01 dB
fn round_centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Single-channel presentation level for a staircase level at `freq`.
///
/// 1. Add the RETSPL at `freq`
/// 2. Reduce for the number of sound-field sources
pub fn presentation_level(
    stair_level: f64,
    freq: f64,
    num_sources: usize,
) -> Result<f64, StimulusError> {
    let retspl_adjusted = stair_level + retspl(freq)?;
    Ok(round_centi(rms_based_on_sources(retspl_adjusted, num_sources)))
}
