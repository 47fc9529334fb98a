//! Radar behaviors: sweep until the field is calibrated, keep sweeping, and
//! lock on when exactly one enemy is around.

use tank_core::{AutopilotError, Behavior, Command, CommandPatch, Snapshot, TankContext, Verdict};
use tracing::trace;

/// Sweeps the radar until both origin axes are resolved.
pub struct DiscoverOrigin;

impl Behavior for DiscoverOrigin {
    fn id(&self) -> &'static str {
        "discover-origin"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if ctx.autopilot.is_origin_known() {
            return Ok(Verdict::Abstain);
        }
        Ok(Verdict::Apply(CommandPatch::new().with_radar_turn(1.0)))
    }
}

pub struct AlwaysBeScanning;

impl Behavior for AlwaysBeScanning {
    fn id(&self) -> &'static str {
        "always-be-scanning"
    }

    fn evaluate(
        &mut self,
        _ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        Ok(Verdict::Apply(CommandPatch::new().with_radar_turn(1.0)))
    }
}

/// Holds the radar on the only tracked enemy. With several enemies in play
/// the sweep continues so none of them goes stale.
pub struct LockRadarOnNearbyEnemies;

impl Behavior for LockRadarOnNearbyEnemies {
    fn id(&self) -> &'static str {
        "lock-radar-on-nearby-enemies"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        let Some(enemy) = ctx.trackers.enemies.sole() else {
            return Ok(Verdict::Abstain);
        };
        let error = ctx.autopilot.look_at(enemy.position(), command);
        trace!(enemy = enemy.id, error, "radar lock");
        Ok(Verdict::Apply(CommandPatch::new().with_radar_turn(error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::fixtures::{calibrated, context, enemy, observe, snapshot_at};

    #[test]
    fn discover_origin_sweeps_only_while_uncalibrated() {
        let mut ctx = context();
        let snapshot = snapshot_at(10.0, 10.0, 0.0);
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = DiscoverOrigin.evaluate(&mut ctx, &snapshot, &mut command).unwrap();
        assert_eq!(verdict, Verdict::Apply(CommandPatch::new().with_radar_turn(1.0)));

        let mut ctx = calibrated();
        let mut command = observe(&mut ctx, &snapshot);
        let verdict = DiscoverOrigin.evaluate(&mut ctx, &snapshot, &mut command).unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }

    #[test]
    fn radar_locks_on_a_sole_enemy() {
        let mut ctx = context();
        let mut snapshot = snapshot_at(100.0, 100.0, 0.0);
        snapshot.radar.angle = 30.0;
        // Enemy due south: absolute bearing 90, relative 90 from a heading of 0.
        snapshot.radar.enemy = Some(enemy(2, 100.0, 300.0));
        let mut command = observe(&mut ctx, &snapshot);

        let verdict = LockRadarOnNearbyEnemies
            .evaluate(&mut ctx, &snapshot, &mut command)
            .unwrap();
        // Error of 60 degrees, clamped into the unit range.
        assert_eq!(verdict, Verdict::Apply(CommandPatch::new().with_radar_turn(60.0)));
        assert_eq!(command.radar_turn(), 1.0);
    }

    #[test]
    fn radar_keeps_sweeping_with_two_enemies() {
        let mut ctx = context();
        let mut first = snapshot_at(100.0, 100.0, 0.0);
        first.radar.enemy = Some(enemy(2, 100.0, 300.0));
        observe(&mut ctx, &first);
        let mut second = snapshot_at(100.0, 100.0, 0.0);
        second.radar.enemy = Some(enemy(3, 300.0, 100.0));
        let mut command = observe(&mut ctx, &second);

        let verdict = LockRadarOnNearbyEnemies
            .evaluate(&mut ctx, &second, &mut command)
            .unwrap();
        assert_eq!(verdict, Verdict::Abstain);
    }
}
