// Playback preparation - level, clipping and routing checks
//
// A presentation is prepared in this order:
// 1. Routing must list one speaker per signal channel
// 2. Scale by the dB FS presentation level
// 3. Refuse to play anything that would clip
// 4. Drop channels the output device cannot carry

use crate::audio::Signal;
use crate::error::{log_audio_error, AudioError};
use crate::stimulus::warble::db_to_mag;

/// Signal ready to hand to an output sink
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAudio {
    pub signal: Signal,
    /// 1-based speaker numbers, one per channel of `signal`
    pub routing: Vec<usize>,
    /// Applied level in dB FS
    pub level_db: f64,
}

/// Check routing against the signal channel count
pub fn check_routing(num_channels: usize, routing: &[usize]) -> Result<(), AudioError> {
    if routing.is_empty() || routing.len() != num_channels || routing.contains(&0) {
        return Err(AudioError::InvalidRouting {
            num_channels,
            routing: routing.to_vec(),
        });
    }
    Ok(())
}

/// Prepare a signal for playback on a device with `max_outputs` channels
pub fn prepare(
    signal: &Signal,
    level_db: f64,
    routing: &[usize],
    max_outputs: usize,
) -> Result<PreparedAudio, AudioError> {
    check_routing(signal.num_channels(), routing).inspect_err(|err| {
        log_audio_error(err, "prepare");
    })?;

    let gain = db_to_mag(level_db);
    log::debug!("[Playback] level {:.2} dB -> gain {:.8}", level_db, gain);
    let scaled = signal.scaled(gain as f32);

    let peak = scaled.peak();
    if peak > 1.0 {
        let err = AudioError::Clipping { peak, level_db };
        log_audio_error(&err, "prepare");
        return Err(err);
    }

    let mut routing = routing.to_vec();
    let signal = if max_outputs > 0 && max_outputs < scaled.num_channels() {
        log::warn!(
            "[Playback] {}-channel signal but only {} device outputs; dropping {} channel(s)",
            scaled.num_channels(),
            max_outputs,
            scaled.num_channels() - max_outputs
        );
        routing.truncate(max_outputs);
        scaled.truncate_channels(max_outputs)
    } else {
        scaled
    };

    Ok(PreparedAudio {
        signal,
        routing,
        level_db,
    })
}
