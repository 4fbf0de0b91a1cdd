//! Selection of the single subject to evaluate when a frame contains several faces.
//!
//! The largest face wins. No identity is tracked between frames, so a different
//! person may be picked on the next frame if they come closer to the camera.

use crate::{
    constants::{CHIN, FOREHEAD, LEFT_CHEEK, RIGHT_CHEEK},
    landmarks::{DetectedFaces, ExpressionScores, FaceLandmarks},
};

/// The face chosen for evaluation in the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFace {
    /// Landmarks of the chosen face
    pub landmarks: FaceLandmarks,
    /// Expression scores of the chosen face, when available
    pub expression_scores: Option<ExpressionScores>,
    /// Position of the face in the detection output
    pub face_index: usize,
}

impl SelectedFace {
    /// Wrap a single face without expression scores
    #[must_use]
    pub fn from_landmarks(landmarks: FaceLandmarks) -> Self {
        Self {
            landmarks,
            expression_scores: None,
            face_index: 0,
        }
    }

    /// Attach expression scores
    #[must_use]
    pub fn with_expression_scores(mut self, scores: ExpressionScores) -> Self {
        self.expression_scores = Some(scores);
        self
    }
}

/// Bounding-box area spanned by the cheek and forehead/chin silhouette points
#[must_use]
pub fn bounding_area(landmarks: &FaceLandmarks) -> f64 {
    let width = (landmarks.point(RIGHT_CHEEK).x - landmarks.point(LEFT_CHEEK).x).abs();
    let height = (landmarks.point(CHIN).y - landmarks.point(FOREHEAD).y).abs();
    width * height
}

/// Index of the largest face; the earliest face wins ties
#[must_use]
pub fn largest_face_index(landmark_sets: &[FaceLandmarks]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, landmarks) in landmark_sets.iter().enumerate() {
        let area = bounding_area(landmarks);
        match best {
            Some((_, best_area)) if area > best_area => best = Some((index, area)),
            None => best = Some((index, area)),
            _ => {}
        }
    }
    best.map(|(index, _)| index)
}

/// Pick the largest face from a detection result
///
/// Returns `None` when no face was detected.
#[must_use]
pub fn select_face(faces: DetectedFaces) -> Option<SelectedFace> {
    let face_index = largest_face_index(&faces.landmark_sets)?;
    let expression_scores = faces
        .expression_sets
        .and_then(|mut sets| (face_index < sets.len()).then(|| sets.swap_remove(face_index)))
        .filter(|scores| !scores.is_empty());
    let landmarks = faces.landmark_sets.into_iter().nth(face_index)?;

    Some(SelectedFace {
        landmarks,
        expression_scores,
        face_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::NUM_FACE_MESH_LANDMARKS, landmarks::Landmark};

    fn face_with_box(width: f64, height: f64) -> FaceLandmarks {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); NUM_FACE_MESH_LANDMARKS];
        points[LEFT_CHEEK] = Landmark::new(0.5 - width / 2.0, 0.5, 0.0);
        points[RIGHT_CHEEK] = Landmark::new(0.5 + width / 2.0, 0.5, 0.0);
        points[FOREHEAD] = Landmark::new(0.5, 0.5 - height / 2.0, 0.0);
        points[CHIN] = Landmark::new(0.5, 0.5 + height / 2.0, 0.0);
        FaceLandmarks::new(points).unwrap()
    }

    #[test]
    fn test_empty_detection_selects_nothing() {
        assert!(select_face(DetectedFaces::default()).is_none());
    }

    #[test]
    fn test_largest_face_selected() {
        let faces = DetectedFaces {
            landmark_sets: vec![face_with_box(0.2, 0.5), face_with_box(0.5, 0.5)],
            expression_sets: Some(vec![
                ExpressionScores::eye_blink(0.1, 0.1),
                ExpressionScores::eye_blink(0.9, 0.9),
            ]),
        };
        let selected = select_face(faces).unwrap();
        assert_eq!(selected.face_index, 1);
        assert!((bounding_area(&selected.landmarks) - 0.25).abs() < 1e-9);
        assert_eq!(selected.expression_scores.and_then(|s| s.eye_closure()), Some((0.9, 0.9)));
    }

    #[test]
    fn test_tie_keeps_first_face() {
        let sets = vec![face_with_box(0.4, 0.4), face_with_box(0.4, 0.4)];
        assert_eq!(largest_face_index(&sets), Some(0));
    }

    #[test]
    fn test_missing_expression_sets() {
        let faces = DetectedFaces {
            landmark_sets: vec![face_with_box(0.3, 0.3)],
            expression_sets: Some(vec![ExpressionScores::default()]),
        };
        let selected = select_face(faces).unwrap();
        assert!(selected.expression_scores.is_none());

        let faces = DetectedFaces {
            landmark_sets: vec![face_with_box(0.1, 0.1), face_with_box(0.3, 0.3)],
            expression_sets: Some(vec![ExpressionScores::eye_blink(0.5, 0.5)]),
        };
        assert!(select_face(faces).unwrap().expression_scores.is_none());
    }
}
