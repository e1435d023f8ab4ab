//! Output sink abstraction for stimulus presentation.
//!
//! Sound-card drivers live outside this crate; the session runner hands
//! prepared buffers to whatever implements [OutputSink].

use std::path::{Path, PathBuf};

use crate::audio::playback::PreparedAudio;
use crate::audio::wav::write_wav;
use crate::error::AudioError;

/// Trait implemented by presentation targets.
pub trait OutputSink {
    /// Human-readable device name for logs
    fn name(&self) -> String;

    /// Number of output channels the device can drive (0 = unlimited)
    fn max_output_channels(&self) -> usize;

    /// Present a prepared buffer
    fn play(&mut self, audio: &PreparedAudio) -> Result<(), AudioError>;

    /// Stop any ongoing presentation
    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn max_output_channels(&self) -> usize {
        (**self).max_output_channels()
    }

    fn play(&mut self, audio: &PreparedAudio) -> Result<(), AudioError> {
        (**self).play(audio)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        (**self).stop()
    }
}

/// Sink that discards audio, used for simulations and tests.
#[derive(Debug, Default)]
pub struct NullSink {
    presentations: usize,
    last_level_db: Option<f64>,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers received so far
    pub fn presentations(&self) -> usize {
        self.presentations
    }

    pub fn last_level_db(&self) -> Option<f64> {
        self.last_level_db
    }
}

impl OutputSink for NullSink {
    fn name(&self) -> String {
        "null".to_string()
    }

    fn max_output_channels(&self) -> usize {
        0
    }

    fn play(&mut self, audio: &PreparedAudio) -> Result<(), AudioError> {
        self.presentations += 1;
        self.last_level_db = Some(audio.level_db);
        Ok(())
    }
}

/// Sink that writes each presentation to a numbered WAV file.
pub struct WavCaptureSink {
    directory: PathBuf,
    max_outputs: usize,
    counter: usize,
}

impl WavCaptureSink {
    /// Capture into `directory`, creating it if needed
    pub fn new(directory: impl AsRef<Path>, max_outputs: usize) -> Result<Self, AudioError> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory).map_err(|err| AudioError::InvalidDevice {
            device: directory.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            directory,
            max_outputs,
            counter: 0,
        })
    }

    /// Path the next presentation will be written to
    pub fn next_path(&self) -> PathBuf {
        self.directory
            .join(format!("presentation_{:04}.wav", self.counter + 1))
    }

    pub fn captured(&self) -> usize {
        self.counter
    }
}

impl OutputSink for WavCaptureSink {
    fn name(&self) -> String {
        format!("wav:{}", self.directory.display())
    }

    fn max_output_channels(&self) -> usize {
        self.max_outputs
    }

    fn play(&mut self, audio: &PreparedAudio) -> Result<(), AudioError> {
        let path = self.next_path();
        write_wav(&path, &audio.signal)?;
        self.counter += 1;
        log::debug!(
            "[WavCaptureSink] wrote {} (routing {:?})",
            path.display(),
            audio.routing
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Signal;

    fn prepared() -> PreparedAudio {
        PreparedAudio {
            signal: Signal::from_channels(&[vec![0.1, 0.2]], 48000).unwrap(),
            routing: vec![1],
            level_db: -10.0,
        }
    }

    #[test]
    fn test_null_sink_counts() {
        let mut sink = NullSink::new();
        sink.play(&prepared()).unwrap();
        sink.play(&prepared()).unwrap();
        assert_eq!(sink.presentations(), 2);
        assert_eq!(sink.last_level_db(), Some(-10.0));
        assert!(sink.stop().is_ok());
    }

    #[test]
    fn test_wav_capture_writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavCaptureSink::new(dir.path().join("capture"), 2).unwrap();

        sink.play(&prepared()).unwrap();
        sink.play(&prepared()).unwrap();

        assert_eq!(sink.captured(), 2);
        assert!(dir.path().join("capture/presentation_0001.wav").exists());
        assert!(dir.path().join("capture/presentation_0002.wav").exists());
        assert_eq!(sink.max_output_channels(), 2);
    }
}
