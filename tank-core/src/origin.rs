//! Battlefield origin discovery from radar wall echoes.
//!
//! Walls sit on whole coordinates. When the radar reports a wall whose
//! projected coordinate on one axis is whole, that rounded value is
//! remembered; if the very next whole reading on that axis repeats it while
//! the tank's orientation has changed in between, the wall is real and the
//! origin on that axis follows from the side of the field the radar faced.
//! Each axis resolves independently and never changes afterwards.

use tracing::info;

use crate::angle::is_whole;
use crate::config::TankConfig;
use crate::derived::{DerivedState, OrientationFingerprint};
use crate::snapshot::Point;

/// Top-left corner of the battlefield in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Origin {
    x: Option<f64>,
    y: Option<f64>,
}

impl Origin {
    pub fn x(&self) -> Option<f64> {
        self.x
    }

    pub fn y(&self) -> Option<f64> {
        self.y
    }

    pub fn is_known(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    pub fn known(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    /// Set-once; returns false if the axis was already resolved.
    fn resolve_x(&mut self, value: f64) -> bool {
        if self.x.is_some() {
            return false;
        }
        self.x = Some(value);
        true
    }

    fn resolve_y(&mut self, value: f64) -> bool {
        if self.y.is_some() {
            return false;
        }
        self.y = Some(value);
        true
    }
}

#[derive(Debug, Clone)]
pub struct OriginFinder {
    origin: Origin,
    last_x: Option<f64>,
    last_y: Option<f64>,
    last_orientation: Option<OrientationFingerprint>,
    field_width: f64,
    field_height: f64,
    tolerance: f64,
}

impl OriginFinder {
    pub fn new(config: &TankConfig) -> Self {
        let mut finder = Self {
            origin: Origin::default(),
            last_x: None,
            last_y: None,
            last_orientation: None,
            field_width: config.battlefield_width,
            field_height: config.battlefield_height,
            tolerance: config.whole_tolerance,
        };
        if let Some([x, y]) = config.known_origin {
            finder.preset(x, y);
        }
        finder
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Adopt a host-supplied origin for any axis not yet resolved.
    pub fn preset(&mut self, x: f64, y: f64) {
        self.origin.resolve_x(x);
        self.origin.resolve_y(y);
    }

    pub fn update(&mut self, derived: &DerivedState) {
        if self.origin.is_known() {
            return;
        }

        // No echo, no information.
        let Some(wall_distance) = derived.wall_distance.filter(|d| *d > 0.0) else {
            return;
        };

        let orientation = derived.orientation();
        let orientation_changed = self
            .last_orientation
            .is_some_and(|last| last != orientation);
        self.last_orientation = Some(orientation);

        let point = derived.point_at_radar_distance(wall_distance);
        let bearing = derived.absolute_radar_angle;

        if self.origin.x.is_none() && is_whole(point.x, self.tolerance) {
            let rounded = point.x.round();
            if orientation_changed && self.last_x == Some(rounded) {
                let offset = if bearing.abs() >= 90.0 {
                    0.0
                } else {
                    self.field_width
                };
                if self.origin.resolve_x(rounded - offset) {
                    info!(wall_x = rounded, origin_x = rounded - offset, "origin x resolved");
                }
            }
            self.last_x = Some(rounded);
        }

        if self.origin.y.is_none() && is_whole(point.y, self.tolerance) {
            let rounded = point.y.round();
            if orientation_changed && self.last_y == Some(rounded) {
                let offset = if bearing > 0.0 { self.field_height } else { 0.0 };
                if self.origin.resolve_y(rounded - offset) {
                    info!(wall_y = rounded, origin_y = rounded - offset, "origin y resolved");
                }
            }
            self.last_y = Some(rounded);
        }
    }
}
