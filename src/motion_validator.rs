//! Head-turn validation over a sliding window of poses.
//!
//! A genuine turn is slow, mostly monotonic, and covers a minimum distance on
//! the challenge axis. A single frame-to-frame jump larger than any natural
//! motion (a swapped photo, a cut in a replayed video) rejects the window
//! outright until it ages out.

use crate::{config::MotionConfig, pose_estimation::HeadPose};
use log::debug;
use std::collections::VecDeque;
use std::fmt;

/// Requested head-turn direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Turn the head to the left
    TurnLeft,
    /// Turn the head to the right
    TurnRight,
    /// Tilt the head up
    LookUp,
    /// Tilt the head down
    LookDown,
}

/// Pose axis a direction is measured on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal rotation
    Yaw,
    /// Vertical rotation
    Pitch,
}

impl Direction {
    /// All directions in declaration order
    pub const ALL: [Direction; 4] = [
        Direction::TurnLeft,
        Direction::TurnRight,
        Direction::LookUp,
        Direction::LookDown,
    ];

    /// Axis the direction moves along
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Direction::TurnLeft | Direction::TurnRight => Axis::Yaw,
            Direction::LookUp | Direction::LookDown => Axis::Pitch,
        }
    }

    /// Sign of the axis change for this direction.
    ///
    /// Tied to the coordinate convention of [`crate::pose_estimation`].
    #[must_use]
    pub const fn expected_sign(self) -> f64 {
        match self {
            Direction::TurnLeft | Direction::LookDown => 1.0,
            Direction::TurnRight | Direction::LookUp => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::TurnLeft => "turn left",
            Direction::TurnRight => "turn right",
            Direction::LookUp => "look up",
            Direction::LookDown => "look down",
        };
        f.write_str(name)
    }
}

impl Axis {
    /// Value of this axis in a pose
    #[must_use]
    pub const fn value(self, pose: &HeadPose) -> f64 {
        match self {
            Axis::Yaw => pose.yaw,
            Axis::Pitch => pose.pitch,
        }
    }
}

/// Why a window was rejected outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// A frame-to-frame change exceeded natural head motion
    SuddenMovement,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::SuddenMovement => f.write_str("sudden movement"),
        }
    }
}

/// Per-frame judgment of the current window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionResult {
    /// Whether the window shows a complete turn in the requested direction
    pub is_valid: bool,
    /// Fraction of the required displacement covered, in [0, 1]
    pub progress: f64,
    /// Set when the window contains an impossible jump
    pub rejection_reason: Option<RejectionReason>,
}

impl MotionResult {
    const fn pending(progress: f64) -> Self {
        Self {
            is_valid: false,
            progress,
            rejection_reason: None,
        }
    }

    const fn rejected(reason: RejectionReason) -> Self {
        Self {
            is_valid: false,
            progress: 0.0,
            rejection_reason: Some(reason),
        }
    }
}

/// Sliding-window head-turn validator
#[derive(Debug, Clone)]
pub struct MotionValidator {
    config: MotionConfig,
    history: VecDeque<HeadPose>,
    started: bool,
}

impl MotionValidator {
    /// Create a new motion validator
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.window_size),
            config,
            started: false,
        }
    }

    /// Add a pose and judge the window against the requested direction.
    ///
    /// A pose with a non-finite value on the direction's axis is not added; the
    /// window is judged as it stands.
    pub fn add_frame(&mut self, pose: HeadPose, direction: Direction) -> MotionResult {
        if !self.started {
            debug!("Motion tracking started for {direction}");
            self.started = true;
        }

        if direction.axis().value(&pose).is_finite() {
            self.history.push_back(pose);
            while self.history.len() > self.config.window_size {
                self.history.pop_front();
            }
        } else {
            debug!("Dropping non-finite pose for {direction}");
        }

        if self.history.len() < self.config.min_samples {
            return MotionResult::pending(0.0);
        }

        let axis = direction.axis();
        let sign = direction.expected_sign();
        let values: Vec<f64> = self.history.iter().map(|p| axis.value(p)).collect();

        let deltas: Vec<f64> = values.windows(2).map(|pair| pair[1] - pair[0]).collect();
        if deltas.iter().any(|d| d.abs() > self.config.max_frame_delta) {
            debug!("Rejecting {direction}: frame delta above {}", self.config.max_frame_delta);
            return MotionResult::rejected(RejectionReason::SuddenMovement);
        }

        let (first, last) = match (values.first(), values.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return MotionResult::pending(0.0),
        };
        let displacement = (last - first) * sign;
        let required = self.required_displacement(axis);

        let matching = deltas.iter().filter(|d| **d * sign > 0.0).count();
        let directional_ratio = matching as f64 / deltas.len() as f64;

        let progress = (displacement / required).clamp(0.0, 1.0);
        let is_valid = displacement >= required && directional_ratio >= self.config.min_directional_ratio;

        if is_valid {
            debug!("Valid {direction}: displacement {displacement:.3}, ratio {directional_ratio:.2}");
        }

        MotionResult {
            is_valid,
            progress,
            rejection_reason: None,
        }
    }

    /// Minimum displacement for an axis
    #[must_use]
    pub fn required_displacement(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Yaw => self.config.min_horizontal_displacement,
            Axis::Pitch => self.config.min_vertical_displacement,
        }
    }

    /// Number of poses in the window
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the window is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Reset the validator
    pub fn reset(&mut self) {
        self.history.clear();
        self.started = false;
    }
}

impl Default for MotionValidator {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaw_pose(yaw: f64) -> HeadPose {
        HeadPose::new(yaw, 0.0)
    }

    #[test]
    fn test_requires_minimum_samples() {
        let mut validator = MotionValidator::default();
        for i in 0..5 {
            let result = validator.add_frame(yaw_pose(f64::from(i) * 0.1), Direction::TurnLeft);
            assert_eq!(result, MotionResult::pending(0.0));
        }
        assert_eq!(validator.len(), 5);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut validator = MotionValidator::default();
        for _ in 0..40 {
            validator.add_frame(yaw_pose(0.0), Direction::TurnLeft);
        }
        assert_eq!(validator.len(), 18);
        validator.reset();
        assert!(validator.is_empty());
    }

    #[test]
    fn test_linear_turn_left_becomes_valid() {
        let mut validator = MotionValidator::default();
        let step = 0.35 / 17.0;
        let mut first_valid = None;
        for i in 0..18 {
            let result = validator.add_frame(yaw_pose(f64::from(i) * step), Direction::TurnLeft);
            assert!(result.rejection_reason.is_none());
            if result.is_valid && first_valid.is_none() {
                first_valid = Some(i);
            }
        }
        // 15 deltas of 0.35/17 is the first displacement above 0.30
        assert_eq!(first_valid, Some(15));
    }

    #[test]
    fn test_wrong_direction_never_valid() {
        let mut validator = MotionValidator::default();
        for i in 0..18 {
            let result = validator.add_frame(yaw_pose(f64::from(i) * 0.03), Direction::TurnRight);
            assert!(!result.is_valid);
            assert_eq!(result.progress, 0.0);
        }
    }

    #[test]
    fn test_vertical_threshold_is_smaller() {
        let mut validator = MotionValidator::default();
        let mut last = MotionResult::pending(0.0);
        for i in 0..10 {
            last = validator.add_frame(HeadPose::new(0.0, -f64::from(i) * 0.025), Direction::LookUp);
        }
        // 9 * 0.025 = 0.225 >= 0.18
        assert!(last.is_valid);
        assert_eq!(last.progress, 1.0);
    }

    #[test]
    fn test_jump_rejects_until_it_ages_out() {
        let mut validator = MotionValidator::default();
        for _ in 0..6 {
            validator.add_frame(yaw_pose(0.0), Direction::TurnLeft);
        }
        let result = validator.add_frame(yaw_pose(0.5), Direction::TurnLeft);
        assert_eq!(result.rejection_reason, Some(RejectionReason::SuddenMovement));
        assert_eq!(result.progress, 0.0);

        // The jump stays in the window for 17 more frames
        for _ in 0..16 {
            let result = validator.add_frame(yaw_pose(0.5), Direction::TurnLeft);
            assert!(result.rejection_reason.is_some());
        }
        let result = validator.add_frame(yaw_pose(0.5), Direction::TurnLeft);
        assert!(result.rejection_reason.is_none());
    }

    #[test]
    fn test_flat_window_fails_displacement() {
        let mut validator = MotionValidator::default();
        let mut last = MotionResult::pending(0.0);
        for _ in 0..18 {
            last = validator.add_frame(yaw_pose(0.1), Direction::TurnLeft);
        }
        assert!(!last.is_valid);
        assert_eq!(last.progress, 0.0);
        assert!(last.rejection_reason.is_none());
    }

    #[test]
    fn test_jittery_turn_below_directional_ratio() {
        let mut validator = MotionValidator::default();
        // Large forward steps alternate with slightly smaller backward steps
        let mut yaw = 0.0;
        let mut last = MotionResult::pending(0.0);
        for i in 0..18 {
            yaw += if i % 2 == 0 { 0.115 } else { -0.06 };
            last = validator.add_frame(yaw_pose(yaw), Direction::TurnLeft);
        }
        assert!(last.rejection_reason.is_none());
        assert_eq!(last.progress, 1.0);
        assert!(!last.is_valid);
    }

    #[test]
    fn test_non_finite_pose_is_dropped() {
        let mut validator = MotionValidator::default();
        for _ in 0..5 {
            validator.add_frame(yaw_pose(0.0), Direction::TurnLeft);
        }
        let result = validator.add_frame(yaw_pose(f64::NAN), Direction::TurnLeft);
        assert_eq!(result, MotionResult::pending(0.0));
        assert_eq!(validator.len(), 5);

        // A jump already in the window keeps rejecting through a NaN frame
        validator.add_frame(yaw_pose(0.5), Direction::TurnLeft);
        let result = validator.add_frame(yaw_pose(f64::NAN), Direction::TurnLeft);
        assert_eq!(result.rejection_reason, Some(RejectionReason::SuddenMovement));
        assert_eq!(result.progress, 0.0);

        validator.reset();
        let mut last = MotionResult::pending(0.0);
        for i in 0..10 {
            last = validator.add_frame(yaw_pose(f64::from(i) * 0.04), Direction::TurnLeft);
            let result = validator.add_frame(yaw_pose(f64::INFINITY), Direction::TurnLeft);
            assert!((0.0..=1.0).contains(&result.progress));
        }
        assert!(last.progress.is_finite());
        assert!(last.is_valid);
    }

    #[test]
    fn test_direction_signs() {
        assert_eq!(Direction::TurnLeft.expected_sign(), 1.0);
        assert_eq!(Direction::TurnRight.expected_sign(), -1.0);
        assert_eq!(Direction::LookUp.expected_sign(), -1.0);
        assert_eq!(Direction::LookDown.expected_sign(), 1.0);
        assert_eq!(Direction::LookDown.axis(), Axis::Pitch);
        assert_eq!(RejectionReason::SuddenMovement.to_string(), "sudden movement");
    }
}
