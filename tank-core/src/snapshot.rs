//! Wire types exchanged with the host: the per-tick sensor [`Snapshot`] and
//! the [`Command`] accumulator the behaviors write into.
//!
//! Snapshots use camelCase keys; commands use the host's upper-case control
//! names (`TURN`, `THROTTLE`, ...).

use serde::{Deserialize, Serialize};

pub type TankId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        crate::angle::distance(self.x, self.y, other.x, other.y)
    }
}

/// A tank seen by the radar, or relayed over the radio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensedTank {
    pub id: TankId,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub speed: f64,
    pub energy: f64,
}

impl SensedTank {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensedBullet {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub speed: f64,
    pub damage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadarState {
    /// Relative to the hull heading.
    pub angle: f64,
    pub wall_distance: Option<f64>,
    pub enemy: Option<SensedTank>,
    pub ally: Option<SensedTank>,
    pub bullets: Vec<SensedBullet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunState {
    /// Relative to the hull heading.
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collisions {
    pub wall: bool,
    pub enemy: bool,
    pub ally: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Enemy { enemy: SensedTank },
    Friendly { friendly: SensedTank },
    Shooting { sender: TankId, target: TankId },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Radio {
    pub inbox: Vec<Message>,
}

/// Everything the host reports for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub id: TankId,
    pub x: f64,
    pub y: f64,
    /// Hull heading.
    pub angle: f64,
    pub energy: f64,
    pub radar: RadarState,
    pub gun: GunState,
    pub collisions: Collisions,
    pub radio: Radio,
}

impl Snapshot {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Partial command: only `Some` fields are written on merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandPatch {
    pub turn: Option<f64>,
    pub throttle: Option<f64>,
    pub boost: Option<bool>,
    pub gun_turn: Option<f64>,
    pub radar_turn: Option<f64>,
    pub shoot: Option<f64>,
}

impl CommandPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turn(mut self, value: f64) -> Self {
        self.turn = Some(value);
        self
    }

    pub fn with_throttle(mut self, value: f64) -> Self {
        self.throttle = Some(value);
        self
    }

    pub fn with_boost(mut self, value: bool) -> Self {
        self.boost = Some(value);
        self
    }

    pub fn with_gun_turn(mut self, value: f64) -> Self {
        self.gun_turn = Some(value);
        self
    }

    pub fn with_radar_turn(mut self, value: f64) -> Self {
        self.radar_turn = Some(value);
        self
    }

    pub fn with_shoot(mut self, value: f64) -> Self {
        self.shoot = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Actuation accumulator for one tick.
///
/// Rotation and throttle requests are clamped into [-1, 1] and fire power
/// into [0, 1] on every write, so no behavior can hand the host an
/// out-of-range control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Command {
    turn: f64,
    throttle: f64,
    boost: bool,
    gun_turn: f64,
    radar_turn: f64,
    shoot: f64,
    pub outbox: Vec<Message>,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turn(&self) -> f64 {
        self.turn
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn boost(&self) -> bool {
        self.boost
    }

    pub fn gun_turn(&self) -> f64 {
        self.gun_turn
    }

    pub fn radar_turn(&self) -> f64 {
        self.radar_turn
    }

    pub fn shoot(&self) -> f64 {
        self.shoot
    }

    pub fn set_turn(&mut self, value: f64) {
        self.turn = signed_unit(value);
    }

    pub fn set_throttle(&mut self, value: f64) {
        self.throttle = signed_unit(value);
    }

    pub fn set_boost(&mut self, value: bool) {
        self.boost = value;
    }

    pub fn set_gun_turn(&mut self, value: f64) {
        self.gun_turn = signed_unit(value);
    }

    pub fn set_radar_turn(&mut self, value: f64) {
        self.radar_turn = signed_unit(value);
    }

    pub fn set_shoot(&mut self, value: f64) {
        self.shoot = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }

    /// Last write wins per field.
    pub fn apply(&mut self, patch: &CommandPatch) {
        if let Some(v) = patch.turn {
            self.set_turn(v);
        }
        if let Some(v) = patch.throttle {
            self.set_throttle(v);
        }
        if let Some(v) = patch.boost {
            self.set_boost(v);
        }
        if let Some(v) = patch.gun_turn {
            self.set_gun_turn(v);
        }
        if let Some(v) = patch.radar_turn {
            self.set_radar_turn(v);
        }
        if let Some(v) = patch.shoot {
            self.set_shoot(v);
        }
    }

    pub fn send(&mut self, message: Message) {
        self.outbox.push(message);
    }

    pub fn drain_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }
}

fn signed_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
