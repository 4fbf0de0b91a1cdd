//! Configuration management for liveness sessions

use crate::constants::{
    DEFAULT_ADVANCE_DELAY_MS, DEFAULT_BLINK_CLOSED_THRESHOLD, DEFAULT_BLINK_REOPEN_THRESHOLD,
    DEFAULT_CENTER_HOLD_FRAMES, DEFAULT_CENTER_MAX_PITCH, DEFAULT_CENTER_MAX_YAW, DEFAULT_DIRECTION_COUNT,
    DEFAULT_MAX_FACES, DEFAULT_MAX_FRAME_DELTA, DEFAULT_MIN_DIRECTIONAL_RATIO, DEFAULT_MIN_HORIZONTAL_DISPLACEMENT,
    DEFAULT_MIN_VERTICAL_DISPLACEMENT, DEFAULT_MOTION_MIN_SAMPLES, DEFAULT_MOTION_WINDOW, DEFAULT_STEP_TIMEOUT_MS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Liveness session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Head-turn motion validation
    pub motion: MotionConfig,

    /// Blink detection
    pub blink: BlinkConfig,

    /// Center hold challenge
    pub center: CenterConfig,

    /// Session timing and sequencing
    pub session: SessionConfig,
}

/// Motion validator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Number of poses kept in the sliding window
    pub window_size: usize,

    /// Samples required before any judgment is made
    pub min_samples: usize,

    /// Largest natural frame-to-frame change on the challenge axis
    pub max_frame_delta: f64,

    /// Displacement required for left/right turns
    pub min_horizontal_displacement: f64,

    /// Displacement required for up/down turns
    pub min_vertical_displacement: f64,

    /// Fraction of deltas that must move in the requested direction
    pub min_directional_ratio: f64,
}

/// Blink detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Both eye scores above this value count as closed
    pub closed_threshold: f64,

    /// Both eye scores below this value count as reopened
    pub reopen_threshold: f64,
}

/// Center hold parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterConfig {
    /// Largest absolute yaw accepted as centered
    pub max_yaw: f64,

    /// Largest absolute pitch accepted as centered
    pub max_pitch: f64,

    /// Consecutive centered frames needed to pass
    pub hold_frames: u32,
}

/// Session timing and sequencing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Time allowed for each step before the session fails
    pub step_timeout_ms: u64,

    /// Feedback pause between a passed step and the next one
    pub advance_delay_ms: u64,

    /// Number of distinct head-turn directions per sequence
    pub direction_count: usize,

    /// Maximum number of faces considered per frame
    pub max_faces: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_MOTION_WINDOW,
            min_samples: DEFAULT_MOTION_MIN_SAMPLES,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            min_horizontal_displacement: DEFAULT_MIN_HORIZONTAL_DISPLACEMENT,
            min_vertical_displacement: DEFAULT_MIN_VERTICAL_DISPLACEMENT,
            min_directional_ratio: DEFAULT_MIN_DIRECTIONAL_RATIO,
        }
    }
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            closed_threshold: DEFAULT_BLINK_CLOSED_THRESHOLD,
            reopen_threshold: DEFAULT_BLINK_REOPEN_THRESHOLD,
        }
    }
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            max_yaw: DEFAULT_CENTER_MAX_YAW,
            max_pitch: DEFAULT_CENTER_MAX_PITCH,
            hold_frames: DEFAULT_CENTER_HOLD_FRAMES,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            direction_count: DEFAULT_DIRECTION_COUNT,
            max_faces: DEFAULT_MAX_FACES,
        }
    }
}

impl LivenessConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let motion = &self.motion;
        if motion.min_samples < 2 {
            return Err(Error::ConfigError(
                "Motion min_samples must be at least 2".to_string(),
            ));
        }
        if motion.min_samples > motion.window_size {
            return Err(Error::ConfigError(format!(
                "Motion min_samples ({}) must not exceed window_size ({})",
                motion.min_samples, motion.window_size
            )));
        }
        if motion.max_frame_delta <= 0.0 {
            return Err(Error::ConfigError(
                "Motion max_frame_delta must be greater than 0".to_string(),
            ));
        }
        if motion.min_horizontal_displacement <= 0.0 || motion.min_vertical_displacement <= 0.0 {
            return Err(Error::ConfigError(
                "Motion displacements must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&motion.min_directional_ratio) {
            return Err(Error::ConfigError(
                "Motion min_directional_ratio must be between 0.0 and 1.0".to_string(),
            ));
        }

        let blink = &self.blink;
        if !(0.0..=1.0).contains(&blink.closed_threshold) || !(0.0..=1.0).contains(&blink.reopen_threshold) {
            return Err(Error::ConfigError(
                "Blink thresholds must be between 0.0 and 1.0".to_string(),
            ));
        }
        if blink.reopen_threshold >= blink.closed_threshold {
            return Err(Error::ConfigError(format!(
                "Blink reopen_threshold ({}) must be below closed_threshold ({})",
                blink.reopen_threshold, blink.closed_threshold
            )));
        }

        if self.center.max_yaw <= 0.0 || self.center.max_pitch <= 0.0 {
            return Err(Error::ConfigError(
                "Center tolerances must be greater than 0".to_string(),
            ));
        }
        if self.center.hold_frames == 0 {
            return Err(Error::ConfigError(
                "Center hold_frames must be greater than 0".to_string(),
            ));
        }

        let session = &self.session;
        if session.step_timeout_ms == 0 {
            return Err(Error::ConfigError(
                "Session step_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if !(1..=4).contains(&session.direction_count) {
            return Err(Error::ConfigError(
                "Session direction_count must be between 1 and 4".to_string(),
            ));
        }
        if session.max_faces == 0 {
            return Err(Error::ConfigError(
                "Session max_faces must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Liveness Configuration

# Head-turn motion validation
motion:
  window_size: 18
  min_samples: 6
  max_frame_delta: 0.12
  min_horizontal_displacement: 0.3
  min_vertical_displacement: 0.18
  min_directional_ratio: 0.55

# Blink detection (close above, reopen below)
blink:
  closed_threshold: 0.4
  reopen_threshold: 0.2

# Center hold
center:
  max_yaw: 0.25
  max_pitch: 0.2
  hold_frames: 15

# Session timing
session:
  step_timeout_ms: 5000
  advance_delay_ms: 800
  direction_count: 3
  max_faces: 4
"#;
