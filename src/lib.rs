//! Face liveness verification through randomized challenge-response.
//!
//! A session asks the person in front of the camera to center their face, turn
//! their head in a few randomly chosen directions and blink after each turn.
//! Each frame flows through the same pipeline:
//! 1. Face landmark inference (external, behind [`inference::FaceLandmarker`])
//! 2. Face selection, keeping the largest face in the frame
//! 3. Head pose extraction from a handful of landmarks
//! 4. Step evaluation by the motion validator or the blink detector
//! 5. A state update published for the presentation layer
//!
//! # Examples
//!
//! ## Driving the orchestrator directly
//!
//! ```
//! use face_liveness::{
//!     challenge::{ChallengeSequence, ChallengeStep},
//!     orchestrator::ChallengeOrchestrator,
//!     simulation::synthesize_face,
//!     state::OverallStatus,
//! };
//!
//! # fn main() -> face_liveness::Result<()> {
//! let mut orchestrator = ChallengeOrchestrator::default();
//! orchestrator.mark_ready();
//! orchestrator.start_with_sequence(ChallengeSequence::from_steps(vec![ChallengeStep::Center])?, 0)?;
//!
//! let face = synthesize_face(0.0, 0.0, None);
//! for frame in 1..=15 {
//!     orchestrator.tick(Some(&face), frame * 33);
//! }
//! orchestrator.tick(Some(&face), 15 * 33 + 800);
//! assert_eq!(orchestrator.status(), OverallStatus::Success);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a simulated session
//!
//! ```no_run
//! use face_liveness::{
//!     app::LivenessApp,
//!     config::LivenessConfig,
//!     inference::SharedEngine,
//!     simulation::{SimulatedCamera, SubjectBehaviour, SyntheticLandmarker},
//! };
//!
//! # fn main() -> face_liveness::Result<()> {
//! let engine = SharedEngine::new();
//! let mut app = LivenessApp::new(LivenessConfig::default());
//! let state = app.run(
//!     || Ok(SimulatedCamera::new(SubjectBehaviour::Compliant, 30.0, 7)),
//!     &engine,
//!     || Ok(SyntheticLandmarker::new()),
//!     &mut rand::thread_rng(),
//! )?;
//! println!("{:?}: {}", state.overall_status, state.message);
//! # Ok(())
//! # }
//! ```

/// Landmark and expression score types
pub mod landmarks;

/// Head pose extraction from face mesh landmarks
pub mod pose_estimation;

/// Largest-face selection
pub mod face_selection;

/// Sliding-window head-turn validation
pub mod motion_validator;

/// Blink cycle detection
pub mod blink_detector;

/// Challenge steps and sequence generation
pub mod challenge;

/// Observable session state
pub mod state;

/// Challenge state machine
pub mod orchestrator;

/// Camera and inference engine interfaces
pub mod inference;

/// Session runner
pub mod app;

/// Synthetic subjects for demos and tests
pub mod simulation;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
