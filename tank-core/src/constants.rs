//! Battlefield and tank constants.
//!
//! Angles are degrees. 0° points east (+x), 90° points south (+y).

// Battlefield
pub const BATTLEFIELD_WIDTH: f64 = 850.0;
pub const BATTLEFIELD_HEIGHT: f64 = 550.0;

// Compass bearings
pub const SOUTH: f64 = 90.0;
pub const NORTH: f64 = -90.0;
pub const WEST: f64 = -180.0;
pub const EAST: f64 = 0.0;

// Tank body
pub const TANK_WIDTH: f64 = 36.0;
pub const TANK_MAX_SPEED: f64 = 2.0; // per tick at full throttle
pub const BOOST_MULTIPLIER: f64 = 2.0;

// Ballistics
pub const BULLET_SPEED: f64 = 4.0; // per tick
pub const GUN_GAIN: f64 = 0.3;
pub const AIM_TOLERANCE_DEG: f64 = 2.0;
pub const AIMED_SHOT_POWER: f64 = 0.1;

// Navigation
pub const THROTTLE_CUTOFF_DEG: f64 = 60.0;
pub const DEFAULT_PATH_TOLERANCE: f64 = 50.0;
pub const DEFAULT_WALL_LOOKAHEAD_TICKS: f64 = 3.0;

// Calibration: walls sit on whole coordinates.
pub const WHOLE_TOLERANCE: f64 = 0.000_000_01;

// Trackers: one radar revolution.
pub const TRACKER_TTL_TICKS: u64 = 60;
