//! Pinned escape maneuvers. Each one commits the hull for a number of ticks
//! so later, calmer behaviors cannot cancel it halfway.

use tank_core::autopilot::FieldBounds;
use tank_core::{
    AutopilotError, Behavior, Command, CommandPatch, PinnedPatch, Point, Snapshot, TankContext,
    Verdict,
};
use tracing::debug;

const DANGEROUS_BULLET_DAMAGE: f64 = 8.0;
const EVASION_TICKS: u64 = 15;
const WALL_LOOKAHEAD_TICKS: f64 = 30.0;
const WALL_ESCAPE_TICKS: u64 = 50;
const ALLY_REVERSE_TICKS: u64 = 50;
const ALLY_ESCAPE_TICKS: u64 = 100;

/// Crazy Ivan: on a heavy bullet on radar, boost out of its line, flipping
/// the drive direction.
pub struct DodgeBullets;

impl Behavior for DodgeBullets {
    fn id(&self) -> &'static str {
        "dodge-bullets"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        let threatened = snapshot
            .radar
            .bullets
            .iter()
            .any(|bullet| bullet.damage > DANGEROUS_BULLET_DAMAGE);
        if !threatened {
            return Ok(Verdict::Abstain);
        }

        let turn = if ctx.rng.chance(0.5) { 1.0 } else { 0.0 };
        let throttle = (-command.throttle()).ceil();
        debug!(tick = ctx.tick, turn, throttle, "evading bullet");
        Ok(Verdict::pinned(
            CommandPatch::new()
                .with_turn(turn)
                .with_boost(true)
                .with_throttle(throttle),
            ctx.tick + EVASION_TICKS,
        ))
    }
}

/// Stops and turns away when the leading hull corner would leave the field
/// within the lookahead.
pub struct AvoidCollidingWithWalls;

impl AvoidCollidingWithWalls {
    /// Turn direction that swings the heading away from whichever edge
    /// `ahead` crossed. `None` when it crossed nothing.
    fn escape_turn(bounds: &FieldBounds, ahead: Point, heading: f64) -> Option<f64> {
        let facing_east = heading.abs() < 90.0;
        let facing_south = heading > 0.0;
        if ahead.x <= bounds.left {
            Some(if facing_south { -1.0 } else { 1.0 })
        } else if ahead.x >= bounds.right {
            Some(if facing_south { 1.0 } else { -1.0 })
        } else if ahead.y <= bounds.top {
            Some(if facing_east { 1.0 } else { -1.0 })
        } else if ahead.y >= bounds.bottom {
            Some(if facing_east { -1.0 } else { 1.0 })
        } else {
            None
        }
    }
}

impl Behavior for AvoidCollidingWithWalls {
    fn id(&self) -> &'static str {
        "avoid-colliding-with-walls"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        let autopilot = &ctx.autopilot;
        if autopilot.is_wall_collision_imminent(Some(WALL_LOOKAHEAD_TICKS), command) != Some(true) {
            return Ok(Verdict::Abstain);
        }

        // Touching a wall before calibration: no edge to reason about, just spin.
        let ahead = autopilot.extrapolated_outer_position(WALL_LOOKAHEAD_TICKS, command);
        let turn = autopilot
            .field_bounds()
            .and_then(|bounds| Self::escape_turn(&bounds, ahead, autopilot.state().heading))
            .unwrap_or(1.0);
        debug!(tick = ctx.tick, x = ahead.x, y = ahead.y, turn, "wall ahead");
        Ok(Verdict::pinned(
            CommandPatch::new().with_turn(turn).with_throttle(0.0),
            ctx.tick + WALL_ESCAPE_TICKS,
        ))
    }
}

/// After bumping an ally, reverse on a random turn, then drive forward on
/// another.
pub struct AvoidSelfCollision;

impl Behavior for AvoidSelfCollision {
    fn id(&self) -> &'static str {
        "avoid-self-collision"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if !snapshot.collisions.ally {
            return Ok(Verdict::Abstain);
        }
        let reverse = CommandPatch::new()
            .with_throttle(-1.0)
            .with_turn(ctx.rng.next_signed_unit());
        let escape = CommandPatch::new()
            .with_throttle(1.0)
            .with_turn(ctx.rng.next_signed_unit());
        Ok(Verdict::ApplyPinned(vec![
            PinnedPatch {
                patch: reverse,
                until_tick: ctx.tick + ALLY_REVERSE_TICKS,
            },
            PinnedPatch {
                patch: escape,
                until_tick: ctx.tick + ALLY_ESCAPE_TICKS,
            },
        ]))
    }
}
