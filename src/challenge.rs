//! Challenge steps and randomized challenge sequences.

use crate::{motion_validator::Direction, Error, Result};
use rand::{seq::SliceRandom, Rng};
use std::fmt;

/// One discrete liveness test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeStep {
    /// Hold the head centered
    Center,
    /// Turn the head in a direction
    Head(Direction),
    /// Blink both eyes
    Blink,
}

impl ChallengeStep {
    /// Instruction shown while this step is active
    #[must_use]
    pub const fn instruction(self) -> &'static str {
        match self {
            ChallengeStep::Center => "Look straight at the camera and hold still",
            ChallengeStep::Head(Direction::TurnLeft) => "Slowly turn your head to the left",
            ChallengeStep::Head(Direction::TurnRight) => "Slowly turn your head to the right",
            ChallengeStep::Head(Direction::LookUp) => "Slowly tilt your head up",
            ChallengeStep::Head(Direction::LookDown) => "Slowly tilt your head down",
            ChallengeStep::Blink => "Blink your eyes",
        }
    }
}

impl fmt::Display for ChallengeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeStep::Center => f.write_str("center"),
            ChallengeStep::Head(direction) => write!(f, "{direction}"),
            ChallengeStep::Blink => f.write_str("blink"),
        }
    }
}

/// Ordered steps of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSequence {
    steps: Vec<ChallengeStep>,
}

impl ChallengeSequence {
    /// Generate a randomized sequence: `Center`, then `direction_count` distinct
    /// directions, each followed by a blink.
    ///
    /// # Errors
    ///
    /// Returns an error if `direction_count` is zero or exceeds the number of directions
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, direction_count: usize) -> Result<Self> {
        if direction_count == 0 || direction_count > Direction::ALL.len() {
            return Err(Error::InvalidInput(format!(
                "Direction count must be between 1 and {}, got {direction_count}",
                Direction::ALL.len()
            )));
        }

        let mut steps = Vec::with_capacity(1 + 2 * direction_count);
        steps.push(ChallengeStep::Center);
        let mut directions = Direction::ALL;
        directions.shuffle(rng);
        for direction in directions.into_iter().take(direction_count) {
            steps.push(ChallengeStep::Head(direction));
            steps.push(ChallengeStep::Blink);
        }

        Ok(Self { steps })
    }

    /// Build a fixed sequence
    ///
    /// # Errors
    ///
    /// Returns an error if no steps are given
    pub fn from_steps(steps: Vec<ChallengeStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::InvalidInput("Challenge sequence must not be empty".to_string()));
        }
        Ok(Self { steps })
    }

    /// Step at an index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ChallengeStep> {
        self.steps.get(index).copied()
    }

    /// All steps in order
    #[must_use]
    pub fn steps(&self) -> &[ChallengeStep] {
        &self.steps
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
