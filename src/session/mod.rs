// Session module - trial loop, pacing and progress reporting

pub mod pacer;
pub mod progress;
pub mod runner;

pub use pacer::{NoopPacer, Pacer, ThreadPacer};
pub use progress::{FrequencySummary, SessionProgress, SessionSummary};
pub use runner::SessionRunner;
