use crate::angle::{cos_deg, normalize, sin_deg};
use crate::snapshot::{Point, Snapshot};

/// Bit-exact fingerprint of where the tank stands and where it looks.
/// Only ever compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientationFingerprint([u64; 4]);

/// Per-tick geometry computed from a [`Snapshot`]. Rebuilt every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedState {
    pub position: Point,
    pub heading: f64,
    /// Radar angle relative to the hull, as reported.
    pub radar_angle: f64,
    pub absolute_radar_angle: f64,
    /// Gun angle relative to the hull, as reported.
    pub gun_angle: f64,
    pub wall_distance: Option<f64>,
    pub wall_collision: bool,
}

impl DerivedState {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            position: snapshot.position(),
            heading: snapshot.angle,
            radar_angle: snapshot.radar.angle,
            absolute_radar_angle: normalize(snapshot.radar.angle + snapshot.angle),
            gun_angle: snapshot.gun.angle,
            wall_distance: snapshot.radar.wall_distance,
            wall_collision: snapshot.collisions.wall,
        }
    }

    pub fn orientation(&self) -> OrientationFingerprint {
        // Adding 0.0 folds -0.0 into 0.0 so the sign of zero is not a change.
        OrientationFingerprint([
            (self.position.x + 0.0).to_bits(),
            (self.position.y + 0.0).to_bits(),
            (self.heading + 0.0).to_bits(),
            (self.radar_angle + 0.0).to_bits(),
        ])
    }

    /// The world point `distance` units out along the absolute radar bearing.
    pub fn point_at_radar_distance(&self, distance: f64) -> Point {
        Point::new(
            self.position.x + cos_deg(self.absolute_radar_angle) * distance,
            self.position.y + sin_deg(self.absolute_radar_angle) * distance,
        )
    }
}
