//! Gun behaviors.

use tank_core::angle::shortest_diff;
use tank_core::constants::AIMED_SHOT_POWER;
use tank_core::{
    AutopilotError, Behavior, Command, CommandPatch, Message, Snapshot, TankContext, TankId,
    TrackedEntity, Verdict,
};
use tracing::debug;

const FULL_POWER: f64 = 1.0;
const POINT_BLANK_DISTANCE: f64 = 100.0;
const CLOSE_DISTANCE: f64 = 200.0;
const SLOW_TARGET_SPEED: f64 = 2.0;
const FRIENDLY_FIRE_CONE_DEG: f64 = 10.0;

/// Keep a low-power shot queued at all times.
pub struct AlwaysBeShooting;

impl Behavior for AlwaysBeShooting {
    fn id(&self) -> &'static str {
        "always-be-shooting"
    }

    fn evaluate(
        &mut self,
        _ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        Ok(Verdict::Apply(CommandPatch::new().with_shoot(AIMED_SHOT_POWER)))
    }
}

/// Spin the gun against the radar sweep so the two cover different arcs.
pub struct CounterGunTurn;

impl Behavior for CounterGunTurn {
    fn id(&self) -> &'static str {
        "counter-gun-turn"
    }

    fn evaluate(
        &mut self,
        _ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        Ok(Verdict::Apply(CommandPatch::new().with_gun_turn(-1.0)))
    }
}

/// Keeps the gun on the last enemy it heard of, even after the tracker
/// forgets it.
#[derive(Default)]
pub struct TrackLastKnownEnemy {
    last_known: Option<TrackedEntity>,
}

impl TrackLastKnownEnemy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for TrackLastKnownEnemy {
    fn id(&self) -> &'static str {
        "track-last-known-enemy"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        _snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if let Some(first) = ctx.trackers.enemies.first() {
            self.last_known = Some(first.clone());
        }
        let Some(target) = &self.last_known else {
            return Ok(Verdict::Abstain);
        };

        let desired = ctx.autopilot.relative_bearing_to(target.position());
        let error = shortest_diff(desired, ctx.autopilot.state().gun_angle);
        Ok(Verdict::Apply(
            CommandPatch::new().with_gun_turn(ctx.config.gun_gain * error),
        ))
    }
}

/// Lead-shoots the preferred target and tells allies which enemy it took.
/// Close or slow targets get a full-power shot.
#[derive(Default)]
pub struct ShootAtVisibleTanks {
    announced: Option<(TankId, u64)>,
}

impl ShootAtVisibleTanks {
    pub fn new() -> Self {
        Self::default()
    }

    fn should_announce(&self, target: TankId, tick: u64, interval: u64) -> bool {
        match self.announced {
            Some((last, at)) => last != target || tick >= at.saturating_add(interval),
            None => true,
        }
    }
}

impl Behavior for ShootAtVisibleTanks {
    fn id(&self) -> &'static str {
        "shoot-at-visible-tanks"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        let position = ctx.autopilot.state().position;
        let Some(target) = ctx.trackers.preferred_target(position).cloned() else {
            return Ok(Verdict::Abstain);
        };

        let solution = ctx.autopilot.shoot_enemy(&target, command);
        let distance = solution.lead.distance;
        let mut patch = solution.patch;
        // Evaluate the coin flip last so the RNG only advances on close, slow targets.
        let forced = distance < POINT_BLANK_DISTANCE
            || (patch.shoot.is_some()
                && distance < CLOSE_DISTANCE
                && target.speed < SLOW_TARGET_SPEED
                && ctx.rng.chance(0.5));
        if forced {
            patch = patch.with_shoot(FULL_POWER);
        }

        // Claims expire on the receivers after one TTL; refresh at half that.
        let interval = (ctx.config.tracker_ttl_ticks / 2).max(1);
        if self.should_announce(target.id, ctx.tick, interval) {
            debug!(target = target.id, distance, "announcing target");
            command.send(Message::Shooting {
                sender: snapshot.id,
                target: target.id,
            });
            self.announced = Some((target.id, ctx.tick));
        }

        Ok(Verdict::Apply(patch))
    }
}

/// Holds fire while an ally sits inside the gun's cone. The radar is the
/// only sensor that reports allies, so it is used as the line of sight.
pub struct AvoidShootingSelf;

impl Behavior for AvoidShootingSelf {
    fn id(&self) -> &'static str {
        "avoid-shooting-self"
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        _command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        if snapshot.radar.ally.is_none() {
            return Ok(Verdict::Abstain);
        }
        let state = ctx.autopilot.state();
        if shortest_diff(state.gun_angle, state.radar_angle).abs() < FRIENDLY_FIRE_CONE_DEG {
            return Ok(Verdict::Apply(CommandPatch::new().with_shoot(0.0)));
        }
        Ok(Verdict::Abstain)
    }
}
