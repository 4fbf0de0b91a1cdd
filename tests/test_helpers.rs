//! Helper functions and utilities for tests

#![allow(dead_code)]

use face_liveness::{
    challenge::{ChallengeSequence, ChallengeStep},
    config::LivenessConfig,
    face_selection::SelectedFace,
    landmarks::ExpressionScores,
    orchestrator::ChallengeOrchestrator,
    simulation::synthesize_face,
};

/// Frame interval of a 30 fps camera
pub const FRAME_MS: u64 = 33;

/// Orchestrator with resources ready and the given sequence started at t=0
pub fn running_orchestrator(config: LivenessConfig, steps: &[ChallengeStep]) -> ChallengeOrchestrator {
    let mut orchestrator = ChallengeOrchestrator::new(config);
    orchestrator.mark_ready();
    let sequence = ChallengeSequence::from_steps(steps.to_vec()).unwrap();
    orchestrator.start_with_sequence(sequence, 0).unwrap();
    orchestrator
}

/// Face at the given pose without expression scores
pub fn face_at(yaw: f64, pitch: f64) -> SelectedFace {
    synthesize_face(yaw, pitch, None)
}

/// Frontal face with the given eye closure scores
pub fn face_with_eyes(left: f64, right: f64) -> SelectedFace {
    synthesize_face(0.0, 0.0, Some(ExpressionScores::eye_blink(left, right)))
}
