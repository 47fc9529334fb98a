use serde::{Deserialize, Serialize};

use crate::constants::{
    AIM_TOLERANCE_DEG, BATTLEFIELD_HEIGHT, BATTLEFIELD_WIDTH, BULLET_SPEED, GUN_GAIN, TANK_WIDTH,
    THROTTLE_CUTOFF_DEG, TRACKER_TTL_TICKS, WHOLE_TOLERANCE,
};
use crate::error::AutopilotError;

/// Per-unit tunables. Every field falls back to the crate constants, so a
/// partial JSON document is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    pub battlefield_width: f64,
    pub battlefield_height: f64,
    pub tank_width: f64,
    pub bullet_speed: f64,
    pub tracker_ttl_ticks: u64,
    pub whole_tolerance: f64,
    pub throttle_cutoff_deg: f64,
    pub gun_gain: f64,
    pub aim_tolerance_deg: f64,

    // Broadcast own position as a `friendly` message every N ticks; 0 disables.
    pub self_report_interval: u64,

    // Hosts that already know the field can skip calibration.
    pub known_origin: Option<[f64; 2]>,

    pub seed: u32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            battlefield_width: BATTLEFIELD_WIDTH,
            battlefield_height: BATTLEFIELD_HEIGHT,
            tank_width: TANK_WIDTH,
            bullet_speed: BULLET_SPEED,
            tracker_ttl_ticks: TRACKER_TTL_TICKS,
            whole_tolerance: WHOLE_TOLERANCE,
            throttle_cutoff_deg: THROTTLE_CUTOFF_DEG,
            gun_gain: GUN_GAIN,
            aim_tolerance_deg: AIM_TOLERANCE_DEG,
            self_report_interval: 0,
            known_origin: None,
            seed: 0xC0FF_EE00,
        }
    }
}

impl TankConfig {
    pub fn validate(&self) -> Result<(), AutopilotError> {
        positive("battlefield_width", self.battlefield_width)?;
        positive("battlefield_height", self.battlefield_height)?;
        positive("tank_width", self.tank_width)?;
        positive("bullet_speed", self.bullet_speed)?;
        positive("whole_tolerance", self.whole_tolerance)?;
        positive("throttle_cutoff_deg", self.throttle_cutoff_deg)?;
        positive("aim_tolerance_deg", self.aim_tolerance_deg)?;
        if self.tracker_ttl_ticks == 0 {
            return Err(AutopilotError::InvalidConfig {
                field: "tracker_ttl_ticks",
                reason: "must be at least 1 tick".to_string(),
            });
        }
        if let Some([x, y]) = self.known_origin {
            if !x.is_finite() || !y.is_finite() {
                return Err(AutopilotError::InvalidConfig {
                    field: "known_origin",
                    reason: format!("coordinates must be finite, got ({x}, {y})"),
                });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), AutopilotError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AutopilotError::InvalidConfig {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}
