// Per-trial staircase bookkeeping

use serde::{Deserialize, Serialize};

/// Direction of a level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Sign applied to the step size
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }
}

/// Scored 2IAFC response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Correct,
    Incorrect,
}

impl Response {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Response::Correct
        } else {
            Response::Incorrect
        }
    }

    /// Value written to trial logs (1 = correct, -1 = incorrect)
    pub fn as_score(&self) -> i8 {
        match self {
            Response::Correct => 1,
            Response::Incorrect => -1,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Response::Correct)
    }
}

/// One presented trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// 1-based trial number within this staircase
    pub trial: usize,
    /// Level at which the trial was presented
    pub level: f64,
    pub response: Response,
    /// Whether this trial's response reversed the track direction
    pub reversal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_scores() {
        assert_eq!(Response::Correct.as_score(), 1);
        assert_eq!(Response::Incorrect.as_score(), -1);
        assert_eq!(Response::from_correct(false), Response::Incorrect);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Up.sign(), 1.0);
        assert_eq!(Direction::Down.sign(), -1.0);
    }
}
