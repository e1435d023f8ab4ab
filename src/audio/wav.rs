//! WAV file I/O for calibration tones and captured presentations.

use std::path::Path;

use crate::audio::Signal;
use crate::error::AudioError;

fn wav_error(path: &Path, err: impl std::fmt::Display) -> AudioError {
    AudioError::WavIo {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Read a WAV file of any channel count into a float signal
///
/// Integer formats are normalised to ±1.0.
pub fn read_wav(path: &Path) -> Result<Signal, AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| wav_error(path, err))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|err| wav_error(path, err))?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|value| value as f32 / max))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|err| wav_error(path, err))?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / max))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|err| wav_error(path, err))?,
                other => {
                    return Err(wav_error(
                        path,
                        format!("unsupported bits per sample {}", other),
                    ))
                }
            }
        }
    };

    log::info!(
        "[Wav] Loaded {}: {} Hz, {} channel(s), {} samples",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );

    Signal::from_interleaved(samples, spec.channels as usize, spec.sample_rate)
}

/// Write a signal as 32-bit float WAV
pub fn write_wav(path: &Path, signal: &Signal) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: signal.num_channels() as u16,
        sample_rate: signal.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|err| wav_error(path, err))?;
    for &sample in signal.samples() {
        writer
            .write_sample(sample)
            .map_err(|err| wav_error(path, err))?;
    }
    writer.finalize().map_err(|err| wav_error(path, err))?;
    Ok(())
}
