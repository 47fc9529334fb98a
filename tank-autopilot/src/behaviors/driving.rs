//! Hull movement: cruising, wandering, spacing, ramming and patrols.

use tank_core::angle::shortest_diff;
use tank_core::constants::DEFAULT_PATH_TOLERANCE;
use tank_core::{
    AutopilotError, Behavior, Command, CommandPatch, Point, Snapshot, TankContext, Verdict,
};
use tracing::debug;

const WANDER_ODDS: u32 = 20;
const MIN_SPACING: f64 = 50.0;
const MAX_SPACING: f64 = 250.0;
const RAM_DISTANCE: f64 = 80.0;
const RAM_CONE_DEG: f64 = 20.0;
const RAM_BACKOFF_TICKS: u64 = 20;

pub struct AlwaysBeDriving;

impl Behavior for AlwaysBeDriving {
    fn id(&self) -> &'static str {
        "always-be-driving"
    }

    fn evaluate(
        &mut self,
        _ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        Ok(Verdict::Apply(CommandPatch::new().with_throttle(1.0)))
    }
}

/// One tick in twenty picks a fresh random turn rate; otherwise the
/// current one stands.
pub struct MoveRandomly;

impl Behavior for MoveRandomly {
    fn id(&self) -> &'static str {
        "move-randomly"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if ctx.rng.next_int(WANDER_ODDS) != 2 {
            return Ok(Verdict::Abstain);
        }
        Ok(Verdict::Apply(
            CommandPatch::new().with_turn(ctx.rng.next_signed_unit()),
        ))
    }
}

/// With exactly one enemy tracked, turns against its bearing inside the
/// minimum spacing and into it beyond the maximum.
pub struct TryToMaintainDistance;

impl Behavior for TryToMaintainDistance {
    fn id(&self) -> &'static str {
        "try-to-maintain-distance"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        let Some(enemy) = ctx.trackers.enemies.sole() else {
            return Ok(Verdict::Abstain);
        };
        let state = ctx.autopilot.state();
        let distance = state.position.distance_to(enemy.position());
        let error = shortest_diff(ctx.autopilot.bearing_to(enemy.position()), state.heading);

        let turn = if distance < MIN_SPACING {
            -error
        } else if distance > MAX_SPACING {
            error
        } else {
            return Ok(Verdict::Abstain);
        };
        Ok(Verdict::Apply(CommandPatch::new().with_turn(turn)))
    }
}

/// Charges an enemy that is close and dead ahead; after contact, backs off
/// at full boost for a while.
pub struct Ram;

impl Behavior for Ram {
    fn id(&self) -> &'static str {
        "ram"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if snapshot.collisions.enemy {
            debug!(tick = ctx.tick, "rammed, backing off");
            return Ok(Verdict::pinned(
                CommandPatch::new().with_throttle(-1.0).with_boost(true),
                ctx.tick + RAM_BACKOFF_TICKS,
            ));
        }

        let state = ctx.autopilot.state();
        let Some(enemy) = ctx.trackers.enemies.nearest_to(state.position) else {
            return Ok(Verdict::Abstain);
        };
        let distance = state.position.distance_to(enemy.position());
        let error = shortest_diff(ctx.autopilot.bearing_to(enemy.position()), state.heading);
        if distance >= RAM_DISTANCE || error.abs() >= RAM_CONE_DEG {
            return Ok(Verdict::Abstain);
        }

        Ok(Verdict::Apply(
            CommandPatch::new()
                .with_turn(error)
                .with_throttle(1.0)
                .with_boost(true),
        ))
    }
}

/// Loops a rectangle inset from the field edges, in field coordinates.
/// Stays idle until the origin is calibrated.
pub struct PatrolPerimeter {
    pub inset: f64,
}

impl Default for PatrolPerimeter {
    fn default() -> Self {
        Self { inset: 100.0 }
    }
}

impl PatrolPerimeter {
    fn waypoints(&self, width: f64, height: f64) -> [Point; 4] {
        let (near, far_x, far_y) = (self.inset, width - self.inset, height - self.inset);
        [
            Point::new(near, near),
            Point::new(far_x, near),
            Point::new(far_x, far_y),
            Point::new(near, far_y),
        ]
    }
}

impl Behavior for PatrolPerimeter {
    fn id(&self) -> &'static str {
        "patrol-perimeter"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if !ctx.autopilot.is_origin_known() {
            return Ok(Verdict::Abstain);
        }
        let waypoints = self.waypoints(ctx.config.battlefield_width, ctx.config.battlefield_height);
        ctx.autopilot
            .loop_on_path(&waypoints, true, DEFAULT_PATH_TOLERANCE, command)?;
        Ok(Verdict::Apply(
            CommandPatch::new()
                .with_turn(command.turn())
                .with_throttle(command.throttle()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::fixtures::{calibrated, context, enemy, observe, snapshot_at};

    #[test]
    fn spacing_turns_away_when_too_close_and_toward_when_too_far() {
        let mut ctx = context();
        let mut snapshot = snapshot_at(100.0, 100.0, 0.0);
        // 30 units due south.
        snapshot.radar.enemy = Some(enemy(2, 100.0, 130.0));
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = TryToMaintainDistance
            .evaluate(&mut ctx, &snapshot, &mut command)
            .unwrap();
        assert_eq!(verdict, Verdict::Apply(CommandPatch::new().with_turn(-90.0)));

        let mut ctx = context();
        snapshot.radar.enemy = Some(enemy(2, 100.0, 400.0));
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = TryToMaintainDistance
            .evaluate(&mut ctx, &snapshot, &mut command)
            .unwrap();
        assert_eq!(verdict, Verdict::Apply(CommandPatch::new().with_turn(90.0)));

        let mut ctx = context();
        snapshot.radar.enemy = Some(enemy(2, 100.0, 200.0));
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = TryToMaintainDistance
            .evaluate(&mut ctx, &snapshot, &mut command)
            .unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }

    #[test]
    fn spacing_is_left_alone_with_several_enemies() {
        let mut ctx = context();
        let mut first = snapshot_at(100.0, 100.0, 0.0);
        first.radar.enemy = Some(enemy(2, 100.0, 130.0));
        observe(&mut ctx, &first);
        let mut second = snapshot_at(100.0, 100.0, 0.0);
        second.radar.enemy = Some(enemy(3, 600.0, 100.0));
        let mut command = observe(&mut ctx, &second);

        let verdict = TryToMaintainDistance
            .evaluate(&mut ctx, &second, &mut command)
            .unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }

    #[test]
    fn ram_charges_close_enemy_ahead() {
        let mut ctx = context();
        let mut snapshot = snapshot_at(100.0, 100.0, 0.0);
        snapshot.radar.enemy = Some(enemy(2, 160.0, 100.0));
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = Ram.evaluate(&mut ctx, &snapshot, &mut command).unwrap();
        assert_eq!(
            verdict,
            Verdict::Apply(
                CommandPatch::new()
                    .with_turn(0.0)
                    .with_throttle(1.0)
                    .with_boost(true)
            )
        );
    }

    #[test]
    fn ram_ignores_enemy_off_axis() {
        let mut ctx = context();
        let mut snapshot = snapshot_at(100.0, 100.0, 0.0);
        snapshot.radar.enemy = Some(enemy(2, 100.0, 160.0));
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = Ram.evaluate(&mut ctx, &snapshot, &mut command).unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }

    #[test]
    fn ram_backs_off_after_contact() {
        let mut ctx = context();
        let mut snapshot = snapshot_at(100.0, 100.0, 0.0);
        snapshot.collisions.enemy = true;
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = Ram.evaluate(&mut ctx, &snapshot, &mut command).unwrap();
        assert_eq!(
            verdict,
            Verdict::pinned(
                CommandPatch::new().with_throttle(-1.0).with_boost(true),
                1 + RAM_BACKOFF_TICKS
            )
        );
    }

    #[test]
    fn patrol_waits_for_calibration() {
        let mut ctx = context();
        let snapshot = snapshot_at(300.0, 300.0, 0.0);
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = PatrolPerimeter::default()
            .evaluate(&mut ctx, &snapshot, &mut command)
            .unwrap();
        assert_eq!(verdict, Verdict::Abstain);
        assert_eq!(ctx.autopilot.next_waypoint(), None);
    }

    #[test]
    fn patrol_heads_for_first_corner_once_calibrated() {
        let mut ctx = calibrated();
        // Facing north-west toward the (100, 100) corner.
        let snapshot = snapshot_at(300.0, 300.0, -135.0);
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = PatrolPerimeter::default()
            .evaluate(&mut ctx, &snapshot, &mut command)
            .unwrap();
        assert_eq!(ctx.autopilot.next_waypoint(), Some(Point::new(100.0, 100.0)));
        assert_eq!(
            verdict,
            Verdict::Apply(CommandPatch::new().with_turn(0.0).with_throttle(1.0))
        );
    }
}
