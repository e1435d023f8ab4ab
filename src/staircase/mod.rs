// Staircase module - adaptive level tracking for threshold estimation
//
// A staircase is created per test frequency. Each 2IAFC response is fed
// back with `add_response`, which records a DataPoint and moves the level.
// The track ends when enough reversals (or trials) have been collected.

pub mod datapoint;
pub mod procedure;

pub use datapoint::{DataPoint, Direction, Response};
pub use procedure::{Staircase, StaircaseParams};
