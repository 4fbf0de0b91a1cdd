//! Synthetic subjects for demos and end-to-end tests.
//!
//! [`SimulatedCamera`] plays a person in front of a camera who reads the
//! instruction on screen and reacts to it frame by frame, or one of several
//! spoofing behaviours. [`SyntheticLandmarker`] turns its scenes into the same
//! landmark and expression output a real inference engine produces.

use crate::{
    challenge::ChallengeStep,
    constants::{
        CHIN, EYE_BLINK_LEFT, EYE_BLINK_RIGHT, FOREHEAD, LEFT_CHEEK, LEFT_EYE_OUTER, NOSE_TIP,
        NUM_FACE_MESH_LANDMARKS, RIGHT_CHEEK, RIGHT_EYE_OUTER,
    },
    face_selection::SelectedFace,
    inference::{CapturedFrame, FaceLandmarker, FrameSource},
    landmarks::{DetectedFaces, ExpressionScores, FaceLandmarks, Landmark},
    motion_validator::{Axis, Direction},
    pose_estimation::Point2,
    state::LivenessState,
    Error, Result,
};
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Half the distance between the outer eye corners, relative to face size
const EYE_HALF_SPAN: f64 = 0.35;
/// Eye line offset above the face center, relative to face size
const EYE_LINE_OFFSET: f64 = 0.1;

/// Per-frame head speed of a simulated subject
const TURN_SPEED: f64 = 0.03;
/// Amplitude of involuntary head jitter
const JITTER: f64 = 0.004;
/// Poses closer than this to center count as recentered
const RECENTERED: f64 = 0.05;
/// Head-turn targets on each axis
const YAW_TARGET: f64 = 0.45;
const PITCH_TARGET: f64 = 0.3;
/// Blink cycle: closed frames followed by open frames
const BLINK_CLOSED_FRAMES: u32 = 4;
const BLINK_CYCLE_FRAMES: u32 = 14;
/// Frame of a head-turn step at which a swapped photo appears
const PHOTO_SWAP_FRAME: u32 = 3;
const PHOTO_SWAP_JUMP: f64 = 0.5;

const OPEN_EYES: (f64, f64) = (0.05, 0.04);
const CLOSED_EYES: (f64, f64) = (0.85, 0.9);

/// Landmarks for a face with the given pose ratios.
///
/// Pose extraction on the result returns `yaw` and `pitch`; the face bounding
/// area is `scale * scale`.
#[must_use]
pub fn synthesize_landmarks(yaw: f64, pitch: f64, center: Point2, scale: f64) -> FaceLandmarks {
    let mut points = [Landmark::new(center.x, center.y, 0.0); NUM_FACE_MESH_LANDMARKS];

    let eye_y = center.y - EYE_LINE_OFFSET * scale;
    points[LEFT_EYE_OUTER] = Landmark::new(center.x - EYE_HALF_SPAN * scale, eye_y, 0.0);
    points[RIGHT_EYE_OUTER] = Landmark::new(center.x + EYE_HALF_SPAN * scale, eye_y, 0.0);
    points[FOREHEAD] = Landmark::new(center.x, center.y - 0.5 * scale, 0.0);
    points[CHIN] = Landmark::new(center.x, center.y + 0.5 * scale, 0.0);
    points[LEFT_CHEEK] = Landmark::new(center.x - 0.5 * scale, center.y, 0.0);
    points[RIGHT_CHEEK] = Landmark::new(center.x + 0.5 * scale, center.y, 0.0);
    points[NOSE_TIP] = Landmark::new(
        center.x + yaw * 2.0 * EYE_HALF_SPAN * scale,
        eye_y + pitch * scale,
        -0.05 * scale,
    );

    FaceLandmarks::from(points)
}

/// A centered face at the given pose, as the face selector would return it
#[must_use]
pub fn synthesize_face(yaw: f64, pitch: f64, expression_scores: Option<ExpressionScores>) -> SelectedFace {
    SelectedFace {
        landmarks: synthesize_landmarks(yaw, pitch, Point2 { x: 0.5, y: 0.5 }, 0.4),
        expression_scores,
        face_index: 0,
    }
}

/// One face in a synthetic scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticFace {
    /// Yaw ratio
    pub yaw: f64,
    /// Pitch ratio
    pub pitch: f64,
    /// Face center in the frame
    pub center: Point2,
    /// Face size; the bounding area is `scale * scale`
    pub scale: f64,
    /// Left and right eye closure scores
    pub eye_closure: (f64, f64),
}

/// The "frame" produced by a simulated camera
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntheticScene {
    /// Faces in detection order
    pub faces: Vec<SyntheticFace>,
}

/// Inference engine stand-in for synthetic scenes
#[derive(Debug, Clone)]
pub struct SyntheticLandmarker {
    emit_expressions: bool,
    fail_every: Option<u64>,
    calls: u64,
}

impl SyntheticLandmarker {
    /// Engine producing landmarks and expression scores
    #[must_use]
    pub fn new() -> Self {
        Self {
            emit_expressions: true,
            fail_every: None,
            calls: 0,
        }
    }

    /// Engine producing landmarks only
    #[must_use]
    pub fn without_expressions(mut self) -> Self {
        self.emit_expressions = false;
        self
    }

    /// Fail every `n`th call with a transient inference error
    #[must_use]
    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Number of detection calls served
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Default for SyntheticLandmarker {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceLandmarker for SyntheticLandmarker {
    type Frame = SyntheticScene;

    fn detect_faces(&mut self, frame: &SyntheticScene, timestamp_ms: u64) -> Result<DetectedFaces> {
        self.calls += 1;
        if let Some(n) = self.fail_every {
            if self.calls % n == 0 {
                return Err(Error::Inference(format!("Synthetic detection failure at {timestamp_ms} ms")));
            }
        }

        let landmark_sets = frame
            .faces
            .iter()
            .map(|face| synthesize_landmarks(face.yaw, face.pitch, face.center, face.scale))
            .collect();
        let expression_sets = self.emit_expressions.then(|| {
            frame
                .faces
                .iter()
                .map(|face| {
                    ExpressionScores::new([
                        (EYE_BLINK_LEFT, face.eye_closure.0),
                        (EYE_BLINK_RIGHT, face.eye_closure.1),
                    ])
                })
                .collect()
        });

        Ok(DetectedFaces {
            landmark_sets,
            expression_sets,
        })
    }
}

/// How the simulated subject behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectBehaviour {
    /// A live person following every instruction
    Compliant,
    /// Follows instructions, but a photo is swapped in during the first head turn
    PhotoSwap,
    /// A printed photo held still in front of the camera
    StaticPhoto,
    /// Nobody in front of the camera
    Absent,
}

impl FromStr for SubjectBehaviour {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "compliant" | "live" => Ok(SubjectBehaviour::Compliant),
            "photo-swap" | "photoswap" | "swap" => Ok(SubjectBehaviour::PhotoSwap),
            "static" | "static-photo" | "photo" => Ok(SubjectBehaviour::StaticPhoto),
            "absent" | "none" => Ok(SubjectBehaviour::Absent),
            _ => Err(Error::InvalidInput(format!("Unknown subject behaviour: {s}"))),
        }
    }
}

impl fmt::Display for SubjectBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubjectBehaviour::Compliant => "compliant",
            SubjectBehaviour::PhotoSwap => "photo-swap",
            SubjectBehaviour::StaticPhoto => "static",
            SubjectBehaviour::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// Camera stand-in filmed from a simulated subject
#[derive(Debug)]
pub struct SimulatedCamera {
    behaviour: SubjectBehaviour,
    rng: StdRng,
    frame_interval_ms: u64,
    max_frames: u64,
    frame_index: u64,
    yaw: f64,
    pitch: f64,
    active_step: Option<ChallengeStep>,
    step_frames: u32,
    blink_frames: u32,
    swapped: bool,
    bystander: bool,
    released: Arc<AtomicBool>,
}

impl SimulatedCamera {
    /// Create a simulated camera at the given frame rate
    #[must_use]
    pub fn new(behaviour: SubjectBehaviour, fps: f64, seed: u64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { crate::constants::DEFAULT_FPS };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frame_interval_ms = (1000.0 / fps).round().max(1.0) as u64;
        Self {
            behaviour,
            rng: StdRng::seed_from_u64(seed),
            frame_interval_ms,
            max_frames: 3000,
            frame_index: 0,
            yaw: 0.0,
            pitch: 0.0,
            active_step: None,
            step_frames: 0,
            blink_frames: 0,
            swapped: false,
            bystander: false,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a smaller second face in the background
    #[must_use]
    pub fn with_bystander(mut self) -> Self {
        self.bystander = true;
        self
    }

    /// End the stream after `max_frames` frames
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Flag set once the camera has been released
    #[must_use]
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    /// Time between frames
    #[must_use]
    pub fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms
    }

    fn move_toward(current: f64, target: f64) -> f64 {
        let delta = (target - current).clamp(-TURN_SPEED, TURN_SPEED);
        current + delta
    }

    fn jitter(&mut self) -> f64 {
        self.rng.gen_range(-JITTER..=JITTER)
    }

    fn recenter(&mut self) {
        self.yaw = Self::move_toward(self.yaw, 0.0);
        self.pitch = Self::move_toward(self.pitch, 0.0);
    }

    fn is_centered(&self) -> bool {
        self.yaw.abs() < RECENTERED && self.pitch.abs() < RECENTERED
    }

    /// Advance the subject by one frame and return its face, if visible
    fn perform(&mut self) -> Option<SyntheticFace> {
        let mut eyes = OPEN_EYES;

        match self.behaviour {
            SubjectBehaviour::Absent => return None,
            SubjectBehaviour::StaticPhoto => {
                return Some(Self::subject_face(0.0, 0.02, eyes));
            }
            SubjectBehaviour::Compliant | SubjectBehaviour::PhotoSwap => {}
        }

        match self.active_step {
            Some(ChallengeStep::Head(direction)) => self.turn(direction),
            Some(ChallengeStep::Blink) => {
                if self.is_centered() {
                    if self.blink_frames % BLINK_CYCLE_FRAMES < BLINK_CLOSED_FRAMES {
                        eyes = CLOSED_EYES;
                    }
                    self.blink_frames += 1;
                } else {
                    self.recenter();
                }
            }
            Some(ChallengeStep::Center) | None => self.recenter(),
        }
        self.step_frames += 1;

        let yaw = self.yaw + self.jitter();
        let pitch = self.pitch + self.jitter();
        Some(Self::subject_face(yaw, pitch, eyes))
    }

    fn turn(&mut self, direction: Direction) {
        let sign = direction.expected_sign();
        match direction.axis() {
            Axis::Yaw => {
                self.yaw = Self::move_toward(self.yaw, YAW_TARGET * sign);
                self.pitch = Self::move_toward(self.pitch, 0.0);
            }
            Axis::Pitch => {
                self.pitch = Self::move_toward(self.pitch, PITCH_TARGET * sign);
                self.yaw = Self::move_toward(self.yaw, 0.0);
            }
        }

        if self.behaviour == SubjectBehaviour::PhotoSwap && !self.swapped && self.step_frames == PHOTO_SWAP_FRAME {
            debug!("Swapping in a photo during {direction}");
            self.swapped = true;
            match direction.axis() {
                Axis::Yaw => self.yaw += PHOTO_SWAP_JUMP * sign,
                Axis::Pitch => self.pitch += PHOTO_SWAP_JUMP * sign,
            }
        }
    }

    fn subject_face(yaw: f64, pitch: f64, eye_closure: (f64, f64)) -> SyntheticFace {
        SyntheticFace {
            yaw,
            pitch,
            center: Point2 { x: 0.5, y: 0.5 },
            scale: 0.4,
            eye_closure,
        }
    }

    fn bystander_face() -> SyntheticFace {
        SyntheticFace {
            yaw: 0.3,
            pitch: 0.1,
            center: Point2 { x: 0.15, y: 0.3 },
            scale: 0.15,
            eye_closure: OPEN_EYES,
        }
    }
}

impl FrameSource for SimulatedCamera {
    type Frame = SyntheticScene;

    fn next_frame(&mut self) -> Result<Option<CapturedFrame<SyntheticScene>>> {
        if self.released.load(Ordering::SeqCst) {
            return Err(Error::ResourceUnavailable("Camera already released".to_string()));
        }
        if self.frame_index >= self.max_frames {
            return Ok(None);
        }

        let timestamp_ms = self.frame_index * self.frame_interval_ms;
        self.frame_index += 1;

        let mut faces = Vec::with_capacity(2);
        if self.bystander {
            faces.push(Self::bystander_face());
        }
        if let Some(face) = self.perform() {
            faces.push(face);
        }

        Ok(Some(CapturedFrame {
            frame: SyntheticScene { faces },
            timestamp_ms,
        }))
    }

    fn present(&mut self, state: &LivenessState) {
        let active = state.active_step();
        if active != self.active_step {
            self.active_step = active;
            self.step_frames = 0;
            self.blink_frames = 0;
        }
    }

    fn release(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            debug!("Simulated camera released after {} frames", self.frame_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{face_selection::bounding_area, pose_estimation::estimate_head_pose};

    #[test]
    fn test_synthesized_landmarks_invert_pose_extraction() {
        for &(yaw, pitch) in &[(0.0, 0.0), (0.3, -0.1), (-0.45, 0.25)] {
            let landmarks = synthesize_landmarks(yaw, pitch, Point2 { x: 0.4, y: 0.6 }, 0.3);
            let pose = estimate_head_pose(&landmarks);
            assert!((pose.yaw - yaw).abs() < 1e-9);
            assert!((pose.pitch - pitch).abs() < 1e-9);
            assert!((bounding_area(&landmarks) - 0.09).abs() < 1e-9);
        }
    }

    #[test]
    fn test_behaviour_parsing() {
        assert_eq!("photo-swap".parse::<SubjectBehaviour>().unwrap(), SubjectBehaviour::PhotoSwap);
        assert_eq!("Compliant".parse::<SubjectBehaviour>().unwrap(), SubjectBehaviour::Compliant);
        assert!("mask".parse::<SubjectBehaviour>().is_err());
        assert_eq!(SubjectBehaviour::StaticPhoto.to_string(), "static");
    }

    #[test]
    fn test_landmarker_failures_and_expressions() {
        let scene = SyntheticScene {
            faces: vec![SyntheticFace {
                yaw: 0.0,
                pitch: 0.0,
                center: Point2 { x: 0.5, y: 0.5 },
                scale: 0.4,
                eye_closure: CLOSED_EYES,
            }],
        };
        let mut landmarker = SyntheticLandmarker::new().failing_every(2);
        let faces = landmarker.detect_faces(&scene, 0).unwrap();
        assert_eq!(faces.len(), 1);
        let scores = faces.expression_sets.unwrap();
        assert_eq!(scores[0].eye_closure(), Some(CLOSED_EYES));
        assert!(matches!(landmarker.detect_faces(&scene, 33), Err(Error::Inference(_))));

        let mut plain = SyntheticLandmarker::new().without_expressions();
        assert!(plain.detect_faces(&scene, 0).unwrap().expression_sets.is_none());
    }

    #[test]
    fn test_camera_timestamps_and_release() {
        let mut camera = SimulatedCamera::new(SubjectBehaviour::Absent, 25.0, 1).with_max_frames(2);
        assert_eq!(camera.frame_interval_ms(), 40);
        let first = camera.next_frame().unwrap().unwrap();
        assert_eq!(first.timestamp_ms, 0);
        assert!(first.frame.faces.is_empty());
        assert_eq!(camera.next_frame().unwrap().unwrap().timestamp_ms, 40);
        assert!(camera.next_frame().unwrap().is_none());

        let flag = camera.released_flag();
        camera.release();
        assert!(flag.load(Ordering::SeqCst));
        assert!(camera.next_frame().is_err());
    }
}
