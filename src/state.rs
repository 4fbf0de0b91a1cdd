//! Observable session state for the presentation layer.

use crate::challenge::ChallengeStep;

/// Session-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    /// Camera and inference engine are being acquired
    Loading,
    /// Resources are ready; no challenge running
    Ready,
    /// A challenge sequence is in progress
    Running,
    /// Every step passed
    Success,
    /// The session failed; a restart is required
    Failed,
}

impl OverallStatus {
    /// Whether the session reached a verdict
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, OverallStatus::Success | OverallStatus::Failed)
    }
}

/// Status of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Not reached yet
    Pending,
    /// Currently being evaluated
    Active,
    /// Passed
    Success,
    /// Failed the session
    Failed,
}

/// A step together with its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepState {
    /// The challenge
    pub step: ChallengeStep,
    /// Its status
    pub status: StepStatus,
}

/// Read-only snapshot published after every tick
#[derive(Debug, Clone, PartialEq)]
pub struct LivenessState {
    /// Session-level status
    pub overall_status: OverallStatus,
    /// Every step of the sequence with its status
    pub steps: Vec<StepState>,
    /// Index of the step being evaluated (or last evaluated)
    pub current_step_index: usize,
    /// Human-readable instruction or outcome
    pub message: String,
    /// Progress of the current step in [0, 1]
    pub progress: f64,
    /// Whether a face was found in the last frame
    pub is_face_detected: bool,
    /// Time left before the current step times out
    pub time_remaining_ms: u64,
    /// Frames processed while running
    pub frame_count: u64,
    /// Reason for a failed verdict
    pub failure_reason: Option<String>,
}

impl LivenessState {
    /// The step currently being evaluated, if any
    #[must_use]
    pub fn current_step(&self) -> Option<StepState> {
        self.steps.get(self.current_step_index).copied()
    }

    /// The step with `Active` status, if any
    #[must_use]
    pub fn active_step(&self) -> Option<ChallengeStep> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Active)
            .map(|s| s.step)
    }
}
