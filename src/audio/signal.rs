//! Interleaved multichannel sample buffer shared by stimulus generation,
//! playback preparation and WAV I/O.

use crate::error::AudioError;

/// Frame-major (interleaved) audio buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    sample_rate: u32,
    num_channels: usize,
    samples: Vec<f32>,
}

impl Signal {
    /// Build from interleaved samples
    pub fn from_interleaved(
        samples: Vec<f32>,
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        if num_channels == 0 || samples.is_empty() || samples.len() % num_channels != 0 {
            return Err(AudioError::EmptySignal);
        }
        Ok(Self {
            sample_rate,
            num_channels,
            samples,
        })
    }

    /// Build from one buffer per channel; channels must share a length
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: u32) -> Result<Self, AudioError> {
        let num_frames = channels.first().map(Vec::len).unwrap_or(0);
        if num_frames == 0 || channels.iter().any(|ch| ch.len() != num_frames) {
            return Err(AudioError::EmptySignal);
        }

        let mut samples = Vec::with_capacity(num_frames * channels.len());
        for frame in 0..num_frames {
            for channel in channels {
                samples.push(channel[frame]);
            }
        }

        Ok(Self {
            sample_rate,
            num_channels: channels.len(),
            samples,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.num_channels
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Copy out a single channel
    pub fn channel(&self, index: usize) -> Vec<f32> {
        self.samples
            .iter()
            .skip(index)
            .step_by(self.num_channels)
            .copied()
            .collect()
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    /// Multiply every sample by `gain`
    pub fn scaled(&self, gain: f32) -> Self {
        Self {
            sample_rate: self.sample_rate,
            num_channels: self.num_channels,
            samples: self.samples.iter().map(|s| s * gain).collect(),
        }
    }

    /// Keep only the first `keep` channels
    pub fn truncate_channels(&self, keep: usize) -> Self {
        if keep >= self.num_channels || keep == 0 {
            return self.clone();
        }
        let samples = self
            .samples
            .chunks_exact(self.num_channels)
            .flat_map(|frame| frame[..keep].iter().copied())
            .collect();
        Self {
            sample_rate: self.sample_rate,
            num_channels: keep,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_channels_interleaves() {
        let signal = Signal::from_channels(&[vec![1.0, 2.0], vec![-1.0, -2.0]], 48000).unwrap();
        assert_eq!(signal.samples(), &[1.0, -1.0, 2.0, -2.0]);
        assert_eq!(signal.num_frames(), 2);
        assert_eq!(signal.channel(1), vec![-1.0, -2.0]);
    }

    #[test]
    fn test_from_channels_rejects_ragged_input() {
        let result = Signal::from_channels(&[vec![1.0, 2.0], vec![1.0]], 48000);
        assert_eq!(result.unwrap_err(), AudioError::EmptySignal);
    }

    #[test]
    fn test_truncate_channels_keeps_leading_channels() {
        let signal =
            Signal::from_interleaved(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 3, 48000).unwrap();
        let truncated = signal.truncate_channels(2);
        assert_eq!(truncated.num_channels(), 2);
        assert_eq!(truncated.samples(), &[0.1, 0.2, 0.4, 0.5]);
    }

    #[test]
    fn test_peak_and_scale() {
        let signal = Signal::from_interleaved(vec![0.25, -0.5], 1, 48000).unwrap();
        assert_eq!(signal.peak(), 0.5);
        assert_eq!(signal.scaled(2.0).peak(), 1.0);
        assert!((signal.duration_secs() - 2.0 / 48000.0).abs() < 1e-12);
    }
}
