//! End-to-end tests of the challenge state machine

mod test_helpers;

use face_liveness::{
    challenge::ChallengeStep,
    config::LivenessConfig,
    face_selection::SelectedFace,
    motion_validator::Direction,
    orchestrator::ChallengeOrchestrator,
    state::{OverallStatus, StepStatus},
};
use rand::{rngs::StdRng, SeedableRng};
use test_helpers::{face_at, face_with_eyes, running_orchestrator, FRAME_MS};

fn active_count(orchestrator: &ChallengeOrchestrator) -> usize {
    orchestrator
        .state()
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Active)
        .count()
}

#[test]
fn test_center_hold_completes_on_fifteenth_frame() {
    let mut orchestrator =
        running_orchestrator(LivenessConfig::default(), &[ChallengeStep::Center, ChallengeStep::Blink]);
    let face = face_at(0.0, 0.0);

    for frame in 1..15 {
        let state = orchestrator.tick(Some(&face), frame * FRAME_MS);
        assert!(state.progress < 1.0, "progress reached 1.0 at frame {frame}");
        assert_eq!(state.steps[0].status, StepStatus::Active);
    }

    let state = orchestrator.tick(Some(&face), 15 * FRAME_MS);
    assert_eq!(state.progress, 1.0);
    assert_eq!(state.steps[0].status, StepStatus::Success);
    assert_eq!(state.message, "Great!");
    assert_eq!(state.active_step(), None);

    // Still pausing before the advance
    let state = orchestrator.tick(Some(&face), 15 * FRAME_MS + 400);
    assert_eq!(state.current_step_index, 0);

    let state = orchestrator.tick(Some(&face), 15 * FRAME_MS + 800);
    assert_eq!(state.current_step_index, 1);
    assert_eq!(state.active_step(), Some(ChallengeStep::Blink));
    assert_eq!(state.message, ChallengeStep::Blink.instruction());
    assert_eq!(state.progress, 0.0);
    assert_eq!(state.time_remaining_ms, 5000);
}

#[test]
fn test_linear_turn_left_passes_head_step() {
    let mut orchestrator =
        running_orchestrator(LivenessConfig::default(), &[ChallengeStep::Head(Direction::TurnLeft)]);
    let step = 0.35 / 17.0;

    let mut last_progress = 0.0;
    let mut passed_at = None;
    for i in 0..18u32 {
        let face = face_at(f64::from(i) * step, 0.0);
        let state = orchestrator.tick(Some(&face), u64::from(i + 1) * FRAME_MS);
        assert!(state.progress >= last_progress);
        last_progress = state.progress;
        if state.steps[0].status == StepStatus::Success {
            passed_at = Some(i);
            break;
        }
    }
    assert_eq!(passed_at, Some(15));

    let state = orchestrator.tick(Some(&face_at(0.35, 0.0)), 16 * FRAME_MS + 800);
    assert_eq!(state.overall_status, OverallStatus::Success);
    assert_eq!(state.message, "Liveness verified");
}

#[test]
fn test_sudden_jump_fails_session() {
    let mut orchestrator = running_orchestrator(
        LivenessConfig::default(),
        &[ChallengeStep::Head(Direction::TurnLeft), ChallengeStep::Blink],
    );
    for frame in 1..=5 {
        orchestrator.tick(Some(&face_at(0.0, 0.0)), frame * FRAME_MS);
    }
    assert_eq!(orchestrator.status(), OverallStatus::Running);

    let state = orchestrator.tick(Some(&face_at(0.5, 0.0)), 6 * FRAME_MS);
    assert_eq!(state.overall_status, OverallStatus::Failed);
    assert_eq!(state.steps[0].status, StepStatus::Failed);
    assert_eq!(state.steps[1].status, StepStatus::Pending);
    let reason = state.failure_reason.as_deref().unwrap();
    assert!(reason.contains("sudden movement"), "unexpected reason: {reason}");
    assert_eq!(state.message, reason);
}

#[test]
fn test_step_times_out_after_five_seconds() {
    let mut orchestrator = running_orchestrator(LivenessConfig::default(), &[ChallengeStep::Center]);
    let turned = face_at(0.4, 0.0);

    let state = orchestrator.tick(Some(&turned), 1000);
    assert_eq!(state.time_remaining_ms, 4000);

    let state = orchestrator.tick(Some(&turned), 5000);
    assert_eq!(state.overall_status, OverallStatus::Running);
    assert_eq!(state.time_remaining_ms, 0);

    let state = orchestrator.tick(Some(&turned), 5001);
    assert_eq!(state.overall_status, OverallStatus::Failed);
    assert_eq!(state.steps[0].status, StepStatus::Failed);
    assert!(state.message.starts_with("Timed out waiting for center"));
}

#[test]
fn test_timeout_accrues_without_a_face() {
    let mut orchestrator = running_orchestrator(LivenessConfig::default(), &[ChallengeStep::Blink]);
    let mut now = 0;
    while orchestrator.status() == OverallStatus::Running {
        now += FRAME_MS;
        let state = orchestrator.tick(None, now);
        assert!(!state.is_face_detected);
    }
    assert!(now > 5000 && now <= 5000 + FRAME_MS);
    assert!(orchestrator.state().message.contains("blink"));
}

#[test]
fn test_ticks_after_failure_are_ignored() {
    let mut orchestrator = running_orchestrator(LivenessConfig::default(), &[ChallengeStep::Center]);
    orchestrator.tick(None, 6000);
    let failed = orchestrator.state().clone();
    assert_eq!(failed.overall_status, OverallStatus::Failed);

    let state = orchestrator.tick(Some(&face_at(0.0, 0.0)), 6033);
    assert_eq!(*state, failed);
}

#[test]
fn test_restart_after_failure_starts_fresh() {
    let mut orchestrator = running_orchestrator(LivenessConfig::default(), &[ChallengeStep::Center]);
    orchestrator.tick(None, 6000);
    assert_eq!(orchestrator.status(), OverallStatus::Failed);

    orchestrator.reset();
    assert_eq!(orchestrator.status(), OverallStatus::Ready);

    let mut rng = StdRng::seed_from_u64(3);
    orchestrator.start_challenge(&mut rng, 10_000).unwrap();
    let state = orchestrator.state();
    assert_eq!(state.overall_status, OverallStatus::Running);
    assert_eq!(state.steps.len(), 7);
    assert_eq!(state.frame_count, 0);
    assert_eq!(state.failure_reason, None);
    assert_eq!(state.active_step(), Some(ChallengeStep::Center));
}

#[test]
fn test_full_sequence_keeps_single_active_step() {
    let mut config = LivenessConfig::default();
    config.session.advance_delay_ms = 0;
    let mut orchestrator = running_orchestrator(
        config,
        &[
            ChallengeStep::Center,
            ChallengeStep::Head(Direction::LookUp),
            ChallengeStep::Blink,
        ],
    );

    let mut now = 0;
    let mut tick = |orchestrator: &mut ChallengeOrchestrator, face: SelectedFace| {
        now += FRAME_MS;
        orchestrator.tick(Some(&face), now);
        if orchestrator.status() == OverallStatus::Running {
            assert_eq!(active_count(orchestrator), 1);
        }
        let progress = orchestrator.state().progress;
        assert!((0.0..=1.0).contains(&progress));
    };

    for _ in 0..15 {
        tick(&mut orchestrator, face_at(0.01, -0.02));
    }
    assert_eq!(orchestrator.state().active_step(), Some(ChallengeStep::Head(Direction::LookUp)));

    for i in 0..10 {
        tick(&mut orchestrator, face_at(0.0, -f64::from(i) * 0.025));
    }
    assert_eq!(orchestrator.state().active_step(), Some(ChallengeStep::Blink));

    tick(&mut orchestrator, face_with_eyes(0.9, 0.85));
    assert_eq!(orchestrator.state().progress, 0.5);
    tick(&mut orchestrator, face_with_eyes(0.1, 0.1));

    let state = orchestrator.state();
    assert_eq!(state.overall_status, OverallStatus::Success);
    assert!(state.steps.iter().all(|s| s.status == StepStatus::Success));
    assert_eq!(state.frame_count, 27);
}
