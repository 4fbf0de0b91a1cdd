//! Landmark and expression score types produced by the face inference engine.

use crate::constants::{EYE_BLINK_LEFT, EYE_BLINK_RIGHT, NUM_FACE_MESH_LANDMARKS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Normalized 3D landmark position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, normalized to frame width
    pub x: f64,
    /// Vertical position, normalized to frame height
    pub y: f64,
    /// Relative depth
    pub z: f64,
}

impl Landmark {
    /// Create a new landmark
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A full face mesh landmark set for one detected face.
///
/// Construction checks the point count so that every fixed index used by pose
/// extraction and face selection is in bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    /// Wrap a landmark list
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 478 points are supplied or a point has a
    /// non-finite x or y coordinate
    pub fn new(points: Vec<Landmark>) -> Result<Self> {
        if points.len() < NUM_FACE_MESH_LANDMARKS {
            return Err(Error::InvalidInput(format!(
                "Expected {} landmarks, got {}",
                NUM_FACE_MESH_LANDMARKS,
                points.len()
            )));
        }
        if let Some(index) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::InvalidInput(format!("Landmark {index} has a non-finite coordinate")));
        }
        Ok(Self { points })
    }

    /// Landmark at a topology index
    ///
    /// Only called with indices from [`crate::constants`], all below the checked minimum length.
    #[must_use]
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    /// All points in topology order
    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl From<[Landmark; NUM_FACE_MESH_LANDMARKS]> for FaceLandmarks {
    fn from(points: [Landmark; NUM_FACE_MESH_LANDMARKS]) -> Self {
        Self { points: points.to_vec() }
    }
}

impl TryFrom<Vec<Landmark>> for FaceLandmarks {
    type Error = Error;

    fn try_from(points: Vec<Landmark>) -> Result<Self> {
        Self::new(points)
    }
}

/// Named expression intensity in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionScore {
    /// Expression name, e.g. `eyeBlinkLeft`
    pub name: String,
    /// Intensity in [0, 1]
    pub score: f64,
}

/// Expression scores ("blendshapes") for one face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionScores {
    scores: Vec<ExpressionScore>,
}

impl ExpressionScores {
    /// Build from (name, score) pairs
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            scores: pairs
                .into_iter()
                .map(|(name, score)| ExpressionScore { name: name.into(), score })
                .collect(),
        }
    }

    /// Scores with only the two eye closure entries set
    #[must_use]
    pub fn eye_blink(left: f64, right: f64) -> Self {
        Self::new([(EYE_BLINK_LEFT, left), (EYE_BLINK_RIGHT, right)])
    }

    /// Look up a score by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores.iter().find(|s| s.name == name).map(|s| s.score)
    }

    /// Left and right eye closure scores, if both are present
    #[must_use]
    pub fn eye_closure(&self) -> Option<(f64, f64)> {
        Some((self.get(EYE_BLINK_LEFT)?, self.get(EYE_BLINK_RIGHT)?))
    }

    /// Whether no scores were produced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Output of one face detection call
#[derive(Debug, Clone, Default)]
pub struct DetectedFaces {
    /// One landmark set per detected face
    pub landmark_sets: Vec<FaceLandmarks>,
    /// Expression scores parallel to `landmark_sets`, when the engine produces them
    pub expression_sets: Option<Vec<ExpressionScores>>,
}

impl DetectedFaces {
    /// Number of detected faces
    #[must_use]
    pub fn len(&self) -> usize {
        self.landmark_sets.len()
    }

    /// Whether no face was detected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landmark_sets.is_empty()
    }

    /// Keep only the first `max_faces` detections
    pub fn truncate(&mut self, max_faces: usize) {
        self.landmark_sets.truncate(max_faces);
        if let Some(sets) = &mut self.expression_sets {
            sets.truncate(max_faces);
        }
    }
}
