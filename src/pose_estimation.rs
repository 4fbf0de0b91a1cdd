//! Pose extraction from face mesh landmarks.
//!
//! Yaw and pitch are geometric ratios rather than Euler angles: the offset of
//! the nose tip from the eye midpoint, normalized by inter-eye distance
//! (horizontal) and face height (vertical). A frontal face yields values near
//! zero regardless of its size or position in the frame.

use crate::{
    constants::{CHIN, DEGENERATE_GEOMETRY_EPSILON, FOREHEAD, LEFT_EYE_OUTER, NOSE_TIP, RIGHT_EYE_OUTER},
    landmarks::FaceLandmarks,
};

/// 2D point in normalized frame coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

/// Compact head pose estimate for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadPose {
    /// Horizontal rotation ratio; increases as the nose moves toward +x
    pub yaw: f64,
    /// Vertical rotation ratio; increases as the nose moves toward +y (down)
    pub pitch: f64,
    /// Nose tip position
    pub nose_tip: Point2,
}

impl HeadPose {
    /// Pose with the given ratios and the nose tip at the origin
    #[must_use]
    pub const fn new(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw,
            pitch,
            nose_tip: Point2 { x: 0.0, y: 0.0 },
        }
    }
}

/// Estimate head pose from a landmark set
///
/// Degenerate geometry (a face too small or edge-on to measure) yields a zero
/// ratio on the affected axis instead of an error.
#[must_use]
pub fn estimate_head_pose(landmarks: &FaceLandmarks) -> HeadPose {
    let nose = landmarks.point(NOSE_TIP);
    let left_eye = landmarks.point(LEFT_EYE_OUTER);
    let right_eye = landmarks.point(RIGHT_EYE_OUTER);
    let chin = landmarks.point(CHIN);
    let forehead = landmarks.point(FOREHEAD);

    let mid_eye_x = (left_eye.x + right_eye.x) / 2.0;
    let mid_eye_y = (left_eye.y + right_eye.y) / 2.0;

    let inter_eye_distance = (right_eye.x - left_eye.x).hypot(right_eye.y - left_eye.y);
    let face_height = (chin.y - forehead.y).abs();

    let yaw = if inter_eye_distance < DEGENERATE_GEOMETRY_EPSILON {
        0.0
    } else {
        (nose.x - mid_eye_x) / inter_eye_distance
    };

    let pitch = if face_height < DEGENERATE_GEOMETRY_EPSILON {
        0.0
    } else {
        (nose.y - mid_eye_y) / face_height
    };

    HeadPose {
        yaw,
        pitch,
        nose_tip: Point2 { x: nose.x, y: nose.y },
    }
}
