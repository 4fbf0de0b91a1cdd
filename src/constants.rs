//! Constants used throughout the library

/// Number of points in the face mesh landmark topology
pub const NUM_FACE_MESH_LANDMARKS: usize = 478;

/// Face mesh landmark indices consumed by pose extraction and face selection
pub const NOSE_TIP: usize = 1;
pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;
pub const CHIN: usize = 152;
pub const FOREHEAD: usize = 10;
pub const LEFT_CHEEK: usize = 234;
pub const RIGHT_CHEEK: usize = 454;

/// Expression score names for eye closure
pub const EYE_BLINK_LEFT: &str = "eyeBlinkLeft";
pub const EYE_BLINK_RIGHT: &str = "eyeBlinkRight";

/// Below this inter-eye distance or face height the geometry is degenerate
pub const DEGENERATE_GEOMETRY_EPSILON: f64 = 0.001;

/// Motion validator defaults
pub const DEFAULT_MOTION_WINDOW: usize = 18;
pub const DEFAULT_MOTION_MIN_SAMPLES: usize = 6;
pub const DEFAULT_MAX_FRAME_DELTA: f64 = 0.12;
pub const DEFAULT_MIN_HORIZONTAL_DISPLACEMENT: f64 = 0.30;
pub const DEFAULT_MIN_VERTICAL_DISPLACEMENT: f64 = 0.18;
pub const DEFAULT_MIN_DIRECTIONAL_RATIO: f64 = 0.55;

/// Blink detector hysteresis thresholds
pub const DEFAULT_BLINK_CLOSED_THRESHOLD: f64 = 0.4;
pub const DEFAULT_BLINK_REOPEN_THRESHOLD: f64 = 0.2;

/// Center hold defaults
pub const DEFAULT_CENTER_MAX_YAW: f64 = 0.25;
pub const DEFAULT_CENTER_MAX_PITCH: f64 = 0.20;
pub const DEFAULT_CENTER_HOLD_FRAMES: u32 = 15;

/// Session timing defaults
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 800;

/// Number of head-turn directions per challenge sequence
pub const DEFAULT_DIRECTION_COUNT: usize = 3;

/// Maximum number of faces requested from the inference engine
pub const DEFAULT_MAX_FACES: usize = 4;

/// Default simulated frame rate
pub const DEFAULT_FPS: f64 = 30.0;
