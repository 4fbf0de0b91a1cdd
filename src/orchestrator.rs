//! Challenge orchestration state machine.
//!
//! One authoritative [`Session`] holds all mutable session data. After every
//! command or tick the observable [`LivenessState`] is recomputed from it, and
//! step statuses are derived from the current index rather than stored, so
//! exactly one step is `Active` while a step is being evaluated.

use crate::{
    blink_detector::BlinkDetector,
    challenge::{ChallengeSequence, ChallengeStep},
    config::LivenessConfig,
    face_selection::SelectedFace,
    motion_validator::{Direction, MotionValidator},
    pose_estimation::estimate_head_pose,
    state::{LivenessState, OverallStatus, StepState, StepStatus},
    Error, Result,
};
use log::{debug, info, warn};
use rand::Rng;
use std::cmp::Ordering;

const LOADING_MESSAGE: &str = "Loading camera and face detection";
const READY_MESSAGE: &str = "Ready. Press start to begin the liveness check";
const NO_FACE_MESSAGE: &str = "No face detected. Position your face in the frame";
const HOLD_STILL_MESSAGE: &str = "Hold still";
const NO_SCORES_MESSAGE: &str = "Blink your eyes. Eye tracking unavailable, keep your face well lit";
const STEP_PASSED_MESSAGE: &str = "Great!";
const VERIFIED_MESSAGE: &str = "Liveness verified";

/// Authoritative mutable state of one session
#[derive(Debug, Clone)]
struct Session {
    status: OverallStatus,
    sequence: Option<ChallengeSequence>,
    current_step: usize,
    step_started_at_ms: u64,
    advance_at_ms: Option<u64>,
    hold_frames: u32,
    frame_count: u64,
    progress: f64,
    message: String,
    is_face_detected: bool,
    time_remaining_ms: u64,
    failure_reason: Option<String>,
}

impl Session {
    fn idle(status: OverallStatus, message: &str) -> Self {
        Self {
            status,
            sequence: None,
            current_step: 0,
            step_started_at_ms: 0,
            advance_at_ms: None,
            hold_frames: 0,
            frame_count: 0,
            progress: 0.0,
            message: message.to_string(),
            is_face_detected: false,
            time_remaining_ms: 0,
            failure_reason: None,
        }
    }

    fn current(&self) -> Option<ChallengeStep> {
        self.sequence.as_ref()?.get(self.current_step)
    }
}

/// Drives one liveness session from per-frame face data
#[derive(Debug, Clone)]
pub struct ChallengeOrchestrator {
    config: LivenessConfig,
    motion: MotionValidator,
    blink: BlinkDetector,
    session: Session,
    resources_ready: bool,
    state: LivenessState,
}

impl ChallengeOrchestrator {
    /// Create an orchestrator in the `Loading` state
    #[must_use]
    pub fn new(config: LivenessConfig) -> Self {
        let session = Session::idle(OverallStatus::Loading, LOADING_MESSAGE);
        let mut orchestrator = Self {
            motion: MotionValidator::new(config.motion.clone()),
            blink: BlinkDetector::new(config.blink.clone()),
            config,
            session,
            resources_ready: false,
            state: LivenessState {
                overall_status: OverallStatus::Loading,
                steps: Vec::new(),
                current_step_index: 0,
                message: String::new(),
                progress: 0.0,
                is_face_detected: false,
                time_remaining_ms: 0,
                frame_count: 0,
                failure_reason: None,
            },
        };
        orchestrator.publish();
        orchestrator
    }

    /// Camera and inference engine are available
    pub fn mark_ready(&mut self) {
        if self.session.status != OverallStatus::Loading {
            warn!("Ignoring ready signal in {:?} state", self.session.status);
            return;
        }
        self.resources_ready = true;
        self.session = Session::idle(OverallStatus::Ready, READY_MESSAGE);
        info!("Liveness session ready");
        self.publish();
    }

    /// Camera or inference engine could not be acquired
    pub fn fail_loading(&mut self, reason: impl Into<String>) {
        if self.session.status != OverallStatus::Loading {
            warn!("Ignoring load failure in {:?} state", self.session.status);
            return;
        }
        let reason = reason.into();
        warn!("Liveness session failed to load: {reason}");
        self.resources_ready = false;
        self.session.status = OverallStatus::Failed;
        self.session.message.clone_from(&reason);
        self.session.failure_reason = Some(reason);
        self.publish();
    }

    /// Start a session with a freshly generated challenge sequence.
    ///
    /// Does nothing while a session is already running.
    ///
    /// # Errors
    ///
    /// Returns an error if resources are not ready
    pub fn start_challenge<R: Rng + ?Sized>(&mut self, rng: &mut R, now_ms: u64) -> Result<()> {
        if self.session.status == OverallStatus::Running {
            debug!("Challenge already running");
            return Ok(());
        }
        let sequence = ChallengeSequence::generate(rng, self.config.session.direction_count)?;
        self.start_with_sequence(sequence, now_ms)
    }

    /// Start a session with a given challenge sequence.
    ///
    /// Does nothing while a session is already running. A finished session is
    /// reset before the new one starts.
    ///
    /// # Errors
    ///
    /// Returns an error if resources are still loading or failed to load
    pub fn start_with_sequence(&mut self, sequence: ChallengeSequence, now_ms: u64) -> Result<()> {
        match self.session.status {
            OverallStatus::Running => {
                debug!("Challenge already running");
                return Ok(());
            }
            OverallStatus::Loading => {
                return Err(Error::InvalidState("Resources are still loading".to_string()));
            }
            _ if !self.resources_ready => {
                return Err(Error::InvalidState(
                    "Resources unavailable, reset to reload them".to_string(),
                ));
            }
            _ => {}
        }

        let Some(first) = sequence.get(0) else {
            return Err(Error::InvalidInput("Challenge sequence must not be empty".to_string()));
        };

        self.reset_validators();
        info!(
            "Starting liveness challenge: {}",
            sequence
                .steps()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.session = Session {
            status: OverallStatus::Running,
            sequence: Some(sequence),
            step_started_at_ms: now_ms,
            time_remaining_ms: self.config.session.step_timeout_ms,
            ..Session::idle(OverallStatus::Running, first.instruction())
        };
        self.publish();
        Ok(())
    }

    /// Discard all session state.
    ///
    /// Returns to `Ready`, or to `Loading` when resources never became available.
    pub fn reset(&mut self) {
        self.reset_validators();
        self.session = if self.resources_ready {
            Session::idle(OverallStatus::Ready, READY_MESSAGE)
        } else {
            Session::idle(OverallStatus::Loading, LOADING_MESSAGE)
        };
        info!("Liveness session reset");
        self.publish();
    }

    /// Process one scheduling tick
    pub fn tick(&mut self, face: Option<&SelectedFace>, now_ms: u64) -> &LivenessState {
        if self.session.status != OverallStatus::Running {
            return &self.state;
        }

        self.session.frame_count += 1;
        self.session.is_face_detected = face.is_some();

        if let Some(advance_at) = self.session.advance_at_ms {
            if now_ms >= advance_at {
                self.complete_advance(now_ms);
            }
            self.publish();
            return &self.state;
        }

        let timeout = self.config.session.step_timeout_ms;
        let elapsed = now_ms.saturating_sub(self.session.step_started_at_ms);
        self.session.time_remaining_ms = timeout.saturating_sub(elapsed);

        let Some(step) = self.session.current() else {
            self.publish();
            return &self.state;
        };

        if elapsed > timeout {
            self.fail(format!("Timed out waiting for {step}. Please try again"));
        } else if let Some(face) = face {
            match step {
                ChallengeStep::Center => self.evaluate_center(face, now_ms),
                ChallengeStep::Head(direction) => self.evaluate_head(face, direction, now_ms),
                ChallengeStep::Blink => self.evaluate_blink(face, now_ms),
            }
        } else {
            self.session.message = NO_FACE_MESSAGE.to_string();
        }

        self.publish();
        &self.state
    }

    /// Latest observable snapshot
    #[must_use]
    pub fn state(&self) -> &LivenessState {
        &self.state
    }

    /// Session-level status
    #[must_use]
    pub fn status(&self) -> OverallStatus {
        self.session.status
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    fn evaluate_center(&mut self, face: &SelectedFace, now_ms: u64) {
        let pose = estimate_head_pose(&face.landmarks);
        let center = &self.config.center;

        if pose.yaw.abs() < center.max_yaw && pose.pitch.abs() < center.max_pitch {
            self.session.hold_frames += 1;
        } else {
            self.session.hold_frames = 0;
        }

        let hold_frames = self.session.hold_frames;
        self.session.progress = (f64::from(hold_frames) / f64::from(center.hold_frames)).min(1.0);

        if hold_frames >= center.hold_frames {
            self.begin_advance(now_ms);
        } else if hold_frames > 0 {
            self.session.message = HOLD_STILL_MESSAGE.to_string();
        } else {
            self.session.message = ChallengeStep::Center.instruction().to_string();
        }
    }

    fn evaluate_head(&mut self, face: &SelectedFace, direction: Direction, now_ms: u64) {
        let pose = estimate_head_pose(&face.landmarks);
        let result = self.motion.add_frame(pose, direction);

        if let Some(reason) = result.rejection_reason {
            self.fail(format!(
                "Rejected: {reason} detected. Move your head slowly and try again"
            ));
            return;
        }

        self.session.progress = result.progress;
        if result.is_valid {
            self.begin_advance(now_ms);
        } else {
            self.session.message = ChallengeStep::Head(direction).instruction().to_string();
        }
    }

    fn evaluate_blink(&mut self, face: &SelectedFace, now_ms: u64) {
        let scores = face
            .expression_scores
            .as_ref()
            .filter(|scores| scores.eye_closure().is_some());

        let Some(scores) = scores else {
            self.session.message = NO_SCORES_MESSAGE.to_string();
            return;
        };

        if self.blink.add_frame(Some(scores)) {
            self.begin_advance(now_ms);
        } else {
            self.session.progress = self.blink.phase().progress();
            self.session.message = ChallengeStep::Blink.instruction().to_string();
        }
    }

    fn begin_advance(&mut self, now_ms: u64) {
        if let Some(step) = self.session.current() {
            info!("Step {} ({step}) passed", self.session.current_step + 1);
        }
        self.session.progress = 1.0;
        self.session.message = STEP_PASSED_MESSAGE.to_string();

        let delay = self.config.session.advance_delay_ms;
        if delay == 0 {
            self.complete_advance(now_ms);
        } else {
            self.session.advance_at_ms = Some(now_ms.saturating_add(delay));
        }
    }

    fn complete_advance(&mut self, now_ms: u64) {
        self.reset_validators();
        let session = &mut self.session;
        session.advance_at_ms = None;
        session.hold_frames = 0;
        session.progress = 0.0;
        session.step_started_at_ms = now_ms;
        session.time_remaining_ms = self.config.session.step_timeout_ms;
        session.current_step += 1;

        match session.current() {
            Some(next) => {
                debug!("Advancing to step {} ({next})", session.current_step + 1);
                session.message = next.instruction().to_string();
            }
            None => {
                info!("Liveness verified after {} frames", session.frame_count);
                session.status = OverallStatus::Success;
                session.progress = 1.0;
                session.message = VERIFIED_MESSAGE.to_string();
            }
        }
    }

    fn fail(&mut self, reason: String) {
        warn!("Liveness check failed: {reason}");
        self.session.status = OverallStatus::Failed;
        self.session.advance_at_ms = None;
        self.session.message.clone_from(&reason);
        self.session.failure_reason = Some(reason);
    }

    fn reset_validators(&mut self) {
        self.motion.reset();
        self.blink.reset();
    }

    fn step_status(&self, index: usize) -> StepStatus {
        let session = &self.session;
        match index.cmp(&session.current_step) {
            Ordering::Less => StepStatus::Success,
            Ordering::Greater => StepStatus::Pending,
            Ordering::Equal => match session.status {
                OverallStatus::Running if session.advance_at_ms.is_some() => StepStatus::Success,
                OverallStatus::Running => StepStatus::Active,
                OverallStatus::Failed => StepStatus::Failed,
                OverallStatus::Success => StepStatus::Success,
                OverallStatus::Loading | OverallStatus::Ready => StepStatus::Pending,
            },
        }
    }

    fn publish(&mut self) {
        let steps = self
            .session
            .sequence
            .as_ref()
            .map(|sequence| {
                sequence
                    .steps()
                    .iter()
                    .enumerate()
                    .map(|(index, step)| StepState {
                        step: *step,
                        status: self.step_status(index),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let session = &self.session;
        self.state = LivenessState {
            overall_status: session.status,
            steps,
            current_step_index: session.current_step,
            message: session.message.clone(),
            progress: session.progress,
            is_face_detected: session.is_face_detected,
            time_remaining_ms: session.time_remaining_ms,
            frame_count: session.frame_count,
            failure_reason: session.failure_reason.clone(),
        };
    }
}

impl Default for ChallengeOrchestrator {
    fn default() -> Self {
        Self::new(LivenessConfig::default())
    }
}
