//! Navigation and targeting primitives shared by all behaviors.

use std::collections::VecDeque;

use crate::angle::{bearing_to, cos_deg, distance, normalize, shortest_diff, sin_deg};
use crate::config::TankConfig;
use crate::constants::{AIMED_SHOT_POWER, BOOST_MULTIPLIER, DEFAULT_WALL_LOOKAHEAD_TICKS, TANK_MAX_SPEED};
use crate::derived::DerivedState;
use crate::error::AutopilotError;
use crate::origin::{Origin, OriginFinder};
use crate::snapshot::{Command, CommandPatch, Point, Snapshot};
use crate::trackers::TrackedEntity;

/// Where to aim to meet a target moving at constant velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadShot {
    pub distance: f64,
    pub bullet_time: f64,
    pub aim_point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireSolution {
    pub lead: LeadShot,
    /// Gun error left after this tick's request, degrees.
    pub aim_error: f64,
    /// The fields `shoot_enemy` wrote, for callers layering fire control.
    pub patch: CommandPatch,
}

/// World-space battlefield rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl FieldBounds {
    pub fn is_outside_or_on_edge(&self, p: Point) -> bool {
        p.x <= self.left || p.x >= self.right || p.y <= self.top || p.y >= self.bottom
    }
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    config: TankConfig,
    origin_finder: OriginFinder,
    state: DerivedState,
    path: VecDeque<Point>,
    next_waypoint: Option<Point>,
}

impl Autopilot {
    pub fn new(config: &TankConfig) -> Self {
        Self {
            config: config.clone(),
            origin_finder: OriginFinder::new(config),
            state: DerivedState::default(),
            path: VecDeque::new(),
            next_waypoint: None,
        }
    }

    /// Rebuild the derived view for this tick and feed the calibration.
    pub fn update(&mut self, snapshot: &Snapshot) {
        self.state = DerivedState::from_snapshot(snapshot);
        self.origin_finder.update(&self.state);
    }

    pub fn state(&self) -> &DerivedState {
        &self.state
    }

    pub fn origin(&self) -> Origin {
        self.origin_finder.origin()
    }

    pub fn is_origin_known(&self) -> bool {
        self.origin().is_known()
    }

    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.origin_finder.preset(x, y);
    }

    pub fn field_bounds(&self) -> Option<FieldBounds> {
        let origin = self.origin().known()?;
        Some(FieldBounds {
            left: origin.x,
            top: origin.y,
            right: origin.x + self.config.battlefield_width,
            bottom: origin.y + self.config.battlefield_height,
        })
    }

    /// Translate an origin-relative point into world space.
    pub fn to_world(&self, point: Point, operation: &'static str) -> Result<Point, AutopilotError> {
        let origin = self
            .origin()
            .known()
            .ok_or(AutopilotError::OriginUnknown { operation })?;
        Ok(Point::new(point.x + origin.x, point.y + origin.y))
    }

    pub fn look_everywhere(&self, command: &mut Command) {
        command.set_radar_turn(1.0);
    }

    /// Swing the radar toward `target`; returns the remaining error.
    pub fn look_at(&self, target: Point, command: &mut Command) -> f64 {
        let desired = self.relative_bearing_to(target);
        let error = shortest_diff(desired, self.state.radar_angle);
        command.set_radar_turn(error);
        error
    }

    /// Damped turn: requests half the heading error and returns the full
    /// error as a progress signal.
    pub fn turn_to_angle(&self, angle: f64, command: &mut Command) -> f64 {
        let error = shortest_diff(normalize(angle), self.state.heading);
        command.set_turn(error / 2.0);
        error
    }

    pub fn turn_to_point(
        &self,
        x: f64,
        y: f64,
        relative_to_origin: bool,
        command: &mut Command,
    ) -> Result<f64, AutopilotError> {
        let target = self.resolve(Point::new(x, y), relative_to_origin, "turn to point")?;
        Ok(self.turn_to_angle(self.bearing_to(target), command))
    }

    pub fn move_to_point(
        &self,
        x: f64,
        y: f64,
        relative_to_origin: bool,
        command: &mut Command,
    ) -> Result<f64, AutopilotError> {
        let target = self.resolve(Point::new(x, y), relative_to_origin, "move to point")?;
        Ok(self.move_along_angle(self.bearing_to(target), command))
    }

    /// Turn toward `angle`, only driving once roughly lined up.
    pub fn move_along_angle(&self, angle: f64, command: &mut Command) -> f64 {
        command.set_throttle(0.0);
        let error = self.turn_to_angle(angle, command);
        let cutoff = self.config.throttle_cutoff_deg;
        if error.abs() < cutoff {
            command.set_throttle((cutoff - error.abs()) / cutoff);
        }
        error
    }

    /// Drive a closed loop over `waypoints`. The first non-empty call adopts
    /// the path; later calls keep cycling it regardless of their argument.
    pub fn loop_on_path(
        &mut self,
        waypoints: &[Point],
        relative_to_origin: bool,
        tolerance: f64,
        command: &mut Command,
    ) -> Result<(), AutopilotError> {
        if waypoints.is_empty() {
            return Ok(());
        }

        if self.path.is_empty() {
            let mut adopted = VecDeque::with_capacity(waypoints.len());
            for waypoint in waypoints {
                adopted.push_back(self.resolve(*waypoint, relative_to_origin, "loop on path")?);
            }
            self.path = adopted;
        }

        let mut target = match self.next_waypoint {
            Some(target) => target,
            None => self.advance_path(),
        };
        if target.distance_to(self.state.position) <= tolerance {
            target = self.advance_path();
        }

        self.move_along_angle(self.bearing_to(target), command);
        Ok(())
    }

    pub fn next_waypoint(&self) -> Option<Point> {
        self.next_waypoint
    }

    pub fn stop_loop_on_path(&mut self, command: &mut Command) {
        self.path.clear();
        self.next_waypoint = None;
        self.stop(command);
    }

    pub fn stop(&self, command: &mut Command) {
        command.set_turn(0.0);
        command.set_throttle(0.0);
        command.set_boost(false);
    }

    pub fn lead_shot(&self, enemy: &TrackedEntity) -> LeadShot {
        let distance = distance(self.state.position.x, self.state.position.y, enemy.x, enemy.y);
        let bullet_time = distance / self.config.bullet_speed;
        LeadShot {
            distance,
            bullet_time,
            aim_point: Self::extrapolate(enemy.position(), enemy.angle, enemy.speed, bullet_time),
        }
    }

    /// Point the gun at the enemy's predicted position and fire once the gun
    /// is within the aim tolerance.
    pub fn shoot_enemy(&self, enemy: &TrackedEntity, command: &mut Command) -> FireSolution {
        let lead = self.lead_shot(enemy);
        let gun_target = self.relative_bearing_to(lead.aim_point);
        let aim_error = shortest_diff(gun_target, self.state.gun_angle);

        let mut patch = CommandPatch::new().with_gun_turn(self.config.gun_gain * aim_error);
        if aim_error.abs() < self.config.aim_tolerance_deg {
            patch = patch.with_shoot(AIMED_SHOT_POWER);
        }
        command.apply(&patch);

        FireSolution {
            lead,
            aim_error,
            patch,
        }
    }

    /// Commanded ground speed per tick.
    pub fn speed(&self, command: &Command) -> f64 {
        let boost = if command.boost() { BOOST_MULTIPLIER } else { 1.0 };
        command.throttle() * TANK_MAX_SPEED * boost
    }

    pub fn extrapolate(start: Point, travel_angle: f64, travel_speed: f64, ticks: f64) -> Point {
        Point::new(
            start.x + ticks * travel_speed * cos_deg(travel_angle),
            start.y + ticks * travel_speed * sin_deg(travel_angle),
        )
    }

    pub fn extrapolated_position(&self, ticks: f64, command: &Command) -> Point {
        Self::extrapolate(self.state.position, self.state.heading, self.speed(command), ticks)
    }

    /// Extrapolated position pushed out to the hull corner leading in the
    /// current heading's quadrant.
    pub fn extrapolated_outer_position(&self, ticks: f64, command: &Command) -> Point {
        let center = self.extrapolated_position(ticks, command);
        let half_diagonal = std::f64::consts::SQRT_2 * self.config.tank_width / 2.0;
        let heading = self.state.heading;
        Point::new(
            center.x + half_diagonal * if heading.abs() >= 90.0 { -1.0 } else { 1.0 },
            center.y + half_diagonal * if heading < 0.0 { -1.0 } else { 1.0 },
        )
    }

    /// `None` while the field is unknown: callers must not read that as safe.
    pub fn is_wall_collision_imminent(&self, ticks: Option<f64>, command: &Command) -> Option<bool> {
        if self.state.wall_collision {
            return Some(true);
        }
        let bounds = self.field_bounds()?;
        let ahead = self.extrapolated_outer_position(
            ticks.unwrap_or(DEFAULT_WALL_LOOKAHEAD_TICKS),
            command,
        );
        Some(bounds.is_outside_or_on_edge(ahead))
    }

    pub fn bearing_to(&self, target: Point) -> f64 {
        bearing_to(target.x - self.state.position.x, target.y - self.state.position.y)
    }

    /// Bearing to `target` measured from the hull heading.
    pub fn relative_bearing_to(&self, target: Point) -> f64 {
        normalize(self.bearing_to(target) - self.state.heading)
    }

    fn resolve(
        &self,
        point: Point,
        relative_to_origin: bool,
        operation: &'static str,
    ) -> Result<Point, AutopilotError> {
        if relative_to_origin {
            self.to_world(point, operation)
        } else {
            Ok(point)
        }
    }

    fn advance_path(&mut self) -> Point {
        // Only called with a non-empty path.
        let next = self.path.pop_front().unwrap_or(self.state.position);
        self.path.push_back(next);
        self.next_waypoint = Some(next);
        next
    }
}
