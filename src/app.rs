//! Session runner wiring a camera and an inference engine to the orchestrator.

use crate::{
    config::LivenessConfig,
    face_selection::select_face,
    inference::{FaceLandmarker, FrameSource, SharedEngine},
    orchestrator::ChallengeOrchestrator,
    state::{LivenessState, OverallStatus},
    Error, Result,
};
use log::{debug, info, warn};
use rand::Rng;
use std::ops::{Deref, DerefMut};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Consecutive camera read failures tolerated before the session is abandoned
const MAX_CONSECUTIVE_READ_FAILURES: u32 = 10;

/// Handle used to stop a running session from another thread.
///
/// A stop ends only the run that observes it; the next run starts normally.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request the session loop to stop
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Releases the camera when the session loop exits, however it exits
struct CameraGuard<C: FrameSource> {
    camera: C,
}

impl<C: FrameSource> Deref for CameraGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.camera
    }
}

impl<C: FrameSource> DerefMut for CameraGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.camera
    }
}

impl<C: FrameSource> Drop for CameraGuard<C> {
    fn drop(&mut self) {
        debug!("Releasing camera");
        self.camera.release();
    }
}

/// Main application struct
pub struct LivenessApp {
    orchestrator: ChallengeOrchestrator,
    stop: StopHandle,
}

impl LivenessApp {
    /// Create a new liveness application
    #[must_use]
    pub fn new(config: LivenessConfig) -> Self {
        Self {
            orchestrator: ChallengeOrchestrator::new(config),
            stop: StopHandle::default(),
        }
    }

    /// Handle that stops the current or next [`LivenessApp::run`] at its next frame
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The session state machine
    #[must_use]
    pub fn orchestrator(&self) -> &ChallengeOrchestrator {
        &self.orchestrator
    }

    /// Run one liveness session to a verdict.
    ///
    /// Opens the camera and leases the inference engine, starts a freshly
    /// generated challenge on the first frame and feeds every frame through
    /// detection, face selection and the orchestrator. Returns when the session
    /// reaches a verdict, the stream ends, or a stop is requested. A stop discards
    /// the session. Resource failures are reported through the returned state.
    ///
    /// # Errors
    ///
    /// Returns an error if the challenge cannot be started or the camera keeps
    /// failing to deliver frames
    pub fn run<C, L, O, F, R>(
        &mut self,
        open_camera: O,
        engine: &SharedEngine<L>,
        load_engine: F,
        rng: &mut R,
    ) -> Result<LivenessState>
    where
        C: FrameSource,
        L: FaceLandmarker<Frame = C::Frame>,
        O: FnOnce() -> Result<C>,
        F: FnOnce() -> Result<L>,
        R: Rng + ?Sized,
    {
        info!("Initializing liveness session");
        self.orchestrator = ChallengeOrchestrator::new(self.orchestrator.config().clone());

        let mut camera = match open_camera() {
            Ok(camera) => CameraGuard { camera },
            Err(e) => {
                self.orchestrator.fail_loading(e.to_string());
                return Ok(self.orchestrator.state().clone());
            }
        };
        let lease = match engine.acquire_with(load_engine) {
            Ok(lease) => lease,
            Err(e) => {
                self.orchestrator.fail_loading(e.to_string());
                return Ok(self.orchestrator.state().clone());
            }
        };

        self.orchestrator.mark_ready();
        let max_faces = self.orchestrator.config().session.max_faces;
        let mut read_failures = 0;
        let mut last_message = String::new();

        info!("Entering main loop");
        loop {
            if self.stop.is_stopped() {
                info!("Stop requested, discarding session");
                self.stop.stopped.store(false, Ordering::SeqCst);
                self.orchestrator.reset();
                break;
            }

            let captured = match camera.next_frame() {
                Ok(Some(captured)) => {
                    read_failures = 0;
                    captured
                }
                Ok(None) => {
                    info!("End of stream reached");
                    break;
                }
                Err(e) => {
                    read_failures += 1;
                    warn!("Failed to read frame ({read_failures}): {e}");
                    if read_failures >= MAX_CONSECUTIVE_READ_FAILURES {
                        return Err(Error::ResourceUnavailable(format!(
                            "Camera failed {read_failures} times in a row: {e}"
                        )));
                    }
                    continue;
                }
            };

            if self.orchestrator.status() == OverallStatus::Ready {
                self.orchestrator.start_challenge(rng, captured.timestamp_ms)?;
            }

            let mut faces = match lease.detect_faces(&captured.frame, captured.timestamp_ms) {
                Ok(faces) => faces,
                Err(e) => {
                    warn!("Face detection failed at {} ms, skipping frame: {e}", captured.timestamp_ms);
                    continue;
                }
            };
            faces.truncate(max_faces);
            let face = select_face(faces);

            let state = self.orchestrator.tick(face.as_ref(), captured.timestamp_ms);
            if state.message != last_message {
                info!("{}", state.message);
                last_message.clone_from(&state.message);
            }
            camera.present(state);

            if state.overall_status.is_terminal() {
                break;
            }
        }

        info!("Session finished: {:?}", self.orchestrator.status());
        Ok(self.orchestrator.state().clone())
    }
}
