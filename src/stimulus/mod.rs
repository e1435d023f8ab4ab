// Stimulus module - sound-field warble tones and level arithmetic
//
// warble: tone synthesis, gating and RMS scaling
// retspl: ANSI S3.6 reference levels and per-source level correction
// model: multichannel stimulus assembly and interval assignment

pub mod model;
pub mod retspl;
pub mod warble;

pub use model::{parse_number_list, parse_test_freqs, Interval, StimulusModel};
pub use retspl::{presentation_level, retspl, rms_based_on_sources};
