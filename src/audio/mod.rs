// Audio module - sample buffers, playback preparation and output sinks

pub mod playback;
pub mod signal;
pub mod sink;
pub mod wav;

// Re-export commonly used types for convenience
pub use playback::{prepare, PreparedAudio};
pub use signal::Signal;
pub use sink::{NullSink, OutputSink, WavCaptureSink};
pub use wav::{read_wav, write_wav};
