//! Blink cycle detection from eye closure expression scores.
//!
//! Closing and reopening use separate thresholds so that scores hovering around
//! a single cutoff cannot produce a blink. Both eyes must cross each threshold,
//! which rules out winks and one-sided noise.

use crate::{config::BlinkConfig, landmarks::ExpressionScores};
use log::debug;

/// Phase of the blink cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlinkPhase {
    /// Waiting for both eyes to close
    #[default]
    Waiting,
    /// Both eyes closed, waiting for them to reopen
    EyesClosed,
    /// A full close and reopen cycle was observed
    Detected,
}

impl BlinkPhase {
    /// Coarse completion fraction for progress display
    #[must_use]
    pub const fn progress(self) -> f64 {
        match self {
            BlinkPhase::Waiting => 0.0,
            BlinkPhase::EyesClosed => 0.5,
            BlinkPhase::Detected => 1.0,
        }
    }
}

/// Three-phase blink detector
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    config: BlinkConfig,
    phase: BlinkPhase,
}

impl BlinkDetector {
    /// Create a new blink detector
    #[must_use]
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            phase: BlinkPhase::Waiting,
        }
    }

    /// Feed one frame of expression scores.
    ///
    /// Returns `true` on the frame the cycle completes and on every call after
    /// that until [`BlinkDetector::reset`]. Missing scores leave the phase unchanged.
    pub fn add_frame(&mut self, scores: Option<&ExpressionScores>) -> bool {
        if self.phase == BlinkPhase::Detected {
            return true;
        }

        let Some((left, right)) = scores.and_then(ExpressionScores::eye_closure) else {
            return false;
        };

        match self.phase {
            BlinkPhase::Waiting => {
                if left > self.config.closed_threshold && right > self.config.closed_threshold {
                    debug!("Eyes closed ({left:.2}, {right:.2})");
                    self.phase = BlinkPhase::EyesClosed;
                }
                false
            }
            BlinkPhase::EyesClosed => {
                if left < self.config.reopen_threshold && right < self.config.reopen_threshold {
                    debug!("Eyes reopened ({left:.2}, {right:.2}), blink detected");
                    self.phase = BlinkPhase::Detected;
                    true
                } else {
                    false
                }
            }
            BlinkPhase::Detected => true,
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Reset the detector
    pub fn reset(&mut self) {
        self.phase = BlinkPhase::Waiting;
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(BlinkConfig::default())
    }
}
