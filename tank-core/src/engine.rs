//! Priority-ordered behavior arbitration with command pinning.
//!
//! Behaviors run in declaration order every tick and merge their patches into
//! one shared [`Command`]; on overlapping fields the later behavior wins. A
//! behavior may pin a sequence of patches until given ticks: while the head of
//! its sequence is unexpired the engine replays it instead of re-invoking the
//! behavior.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AutopilotError;
use crate::snapshot::{Command, CommandPatch, Snapshot};
use crate::tank::TankContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedPatch {
    pub patch: CommandPatch,
    /// First tick on which this patch no longer applies.
    pub until_tick: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Abstain,
    Apply(CommandPatch),
    /// Apply the first patch now and replay the sequence on later ticks.
    ApplyPinned(Vec<PinnedPatch>),
}

impl Verdict {
    pub fn pinned(patch: CommandPatch, until_tick: u64) -> Self {
        Self::ApplyPinned(vec![PinnedPatch { patch, until_tick }])
    }
}

pub trait Behavior {
    fn id(&self) -> &'static str;

    /// Inspect the tick and optionally write into `command` directly; the
    /// returned verdict is merged on top. Returning `Err` abstains for the
    /// tick and rolls back anything written to `command`.
    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError>;
}

/// Closure-backed behavior.
pub struct FnBehavior<F> {
    id: &'static str,
    f: F,
}

pub fn from_fn<F>(id: &'static str, f: F) -> FnBehavior<F>
where
    F: FnMut(&mut TankContext, &Snapshot, &mut Command) -> Result<Verdict, AutopilotError>,
{
    FnBehavior { id, f }
}

impl<F> Behavior for FnBehavior<F>
where
    F: FnMut(&mut TankContext, &Snapshot, &mut Command) -> Result<Verdict, AutopilotError>,
{
    fn id(&self) -> &'static str {
        self.id
    }

    fn evaluate(
        &mut self,
        ctx: &mut TankContext,
        snapshot: &Snapshot,
        command: &mut Command,
    ) -> Result<Verdict, AutopilotError> {
        (self.f)(ctx, snapshot, command)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BehaviorStats {
    pub id: &'static str,
    pub invocations: u64,
    pub replays: u64,
    pub abstentions: u64,
    pub pins: u64,
    pub failures: u64,
}

struct Slot {
    behavior: Box<dyn Behavior>,
    pinned: Vec<PinnedPatch>,
    stats: BehaviorStats,
}

#[derive(Default)]
pub struct ArbitrationEngine {
    slots: Vec<Slot>,
}

impl ArbitrationEngine {
    pub fn new(behaviors: Vec<Box<dyn Behavior>>) -> Self {
        let mut engine = Self::default();
        for behavior in behaviors {
            engine.push(behavior);
        }
        engine
    }

    /// Append at the lowest precedence so far (it runs last, so it wins).
    pub fn push(&mut self, behavior: Box<dyn Behavior>) {
        let stats = BehaviorStats {
            id: behavior.id(),
            ..BehaviorStats::default()
        };
        self.slots.push(Slot {
            behavior,
            pinned: Vec::new(),
            stats,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.slots.iter().map(|slot| slot.behavior.id()).collect()
    }

    pub fn stats(&self) -> Vec<BehaviorStats> {
        self.slots.iter().map(|slot| slot.stats.clone()).collect()
    }

    /// The patch a behavior currently has pinned, if any.
    pub fn pinned(&self, id: &str, tick: u64) -> Option<&PinnedPatch> {
        self.slots
            .iter()
            .find(|slot| slot.behavior.id() == id)?
            .pinned
            .iter()
            .find(|pin| pin.until_tick > tick)
    }

    pub fn run(&mut self, ctx: &mut TankContext, snapshot: &Snapshot, command: &mut Command) {
        let tick = ctx.tick;
        for slot in &mut self.slots {
            slot.pinned.retain(|pin| pin.until_tick > tick);
            if let Some(pin) = slot.pinned.first() {
                command.apply(&pin.patch);
                slot.stats.replays += 1;
                continue;
            }

            slot.stats.invocations += 1;
            let checkpoint = command.clone();
            match slot.behavior.evaluate(ctx, snapshot, command) {
                Ok(Verdict::Abstain) => slot.stats.abstentions += 1,
                Ok(Verdict::Apply(patch)) => command.apply(&patch),
                Ok(Verdict::ApplyPinned(sequence)) => {
                    let Some(first) = sequence.first() else {
                        slot.stats.abstentions += 1;
                        continue;
                    };
                    command.apply(&first.patch);
                    debug!(
                        behavior = slot.behavior.id(),
                        tick,
                        until = first.until_tick,
                        steps = sequence.len(),
                        "pinned command"
                    );
                    slot.stats.pins += 1;
                    slot.pinned = sequence;
                }
                Err(err) => {
                    *command = checkpoint;
                    slot.stats.failures += 1;
                    warn!(behavior = slot.behavior.id(), tick, "behavior abstained: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TankConfig;
    use std::cell::Cell;
    use std::rc::Rc;

    fn context() -> TankContext {
        TankContext::new(TankConfig::default()).unwrap()
    }

    #[test]
    fn later_behaviors_win_overlapping_fields() {
        let mut engine = ArbitrationEngine::new(vec![
            Box::new(from_fn("drive", |_, _, _| {
                Ok(Verdict::Apply(CommandPatch::new().with_throttle(1.0).with_turn(0.5)))
            })),
            Box::new(from_fn("brake", |_, _, _| {
                Ok(Verdict::Apply(CommandPatch::new().with_throttle(0.0)))
            })),
        ]);
        let mut ctx = context();
        let mut command = Command::new();
        ctx.tick = 1;
        engine.run(&mut ctx, &Snapshot::default(), &mut command);
        assert_eq!(command.throttle(), 0.0);
        assert_eq!(command.turn(), 0.5);
    }

    #[test]
    fn behaviors_see_earlier_writes() {
        let mut engine = ArbitrationEngine::new(vec![
            Box::new(from_fn("drive", |_, _, _| {
                Ok(Verdict::Apply(CommandPatch::new().with_throttle(0.75)))
            })),
            Box::new(from_fn("reverse", |_, _, command: &mut Command| {
                Ok(Verdict::Apply(CommandPatch::new().with_throttle(-command.throttle())))
            })),
        ]);
        let mut ctx = context();
        let mut command = Command::new();
        engine.run(&mut ctx, &Snapshot::default(), &mut command);
        assert_eq!(command.throttle(), -0.75);
    }

    #[test]
    fn pinned_result_is_replayed_until_expiry() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        let mut engine = ArbitrationEngine::new(vec![
            Box::new(from_fn("steady", |_, _, _| {
                Ok(Verdict::Apply(CommandPatch::new().with_turn(0.0)))
            })),
            Box::new(from_fn("evade", move |ctx: &mut TankContext, _, _| {
                counter.set(counter.get() + 1);
                Ok(Verdict::pinned(CommandPatch::new().with_turn(-1.0), ctx.tick + 50))
            })),
        ]);
        let mut ctx = context();
        let mut command = Command::new();

        ctx.tick = 10;
        engine.run(&mut ctx, &Snapshot::default(), &mut command);
        assert_eq!(calls.get(), 1);

        for tick in 11..60 {
            ctx.tick = tick;
            engine.run(&mut ctx, &Snapshot::default(), &mut command);
            assert_eq!(calls.get(), 1, "re-invoked at tick {tick}");
            assert_eq!(command.turn(), -1.0);
        }
        assert_eq!(engine.pinned("evade", 59).map(|p| p.until_tick), Some(60));

        ctx.tick = 60;
        engine.run(&mut ctx, &Snapshot::default(), &mut command);
        assert_eq!(calls.get(), 2);

        let stats = engine.stats();
        assert_eq!(stats[1].replays, 49);
        assert_eq!(stats[1].invocations, 2);
    }

    #[test]
    fn pinned_sequences_advance_in_order() {
        let mut engine = ArbitrationEngine::new(vec![Box::new(from_fn(
            "unstick",
            |ctx: &mut TankContext, _, _| {
                Ok(Verdict::ApplyPinned(vec![
                    PinnedPatch {
                        patch: CommandPatch::new().with_throttle(-1.0),
                        until_tick: ctx.tick + 5,
                    },
                    PinnedPatch {
                        patch: CommandPatch::new().with_throttle(1.0),
                        until_tick: ctx.tick + 10,
                    },
                ]))
            },
        ))]);
        let mut ctx = context();
        let mut command = Command::new();
        let mut seen = Vec::new();
        for tick in 1..=12 {
            ctx.tick = tick;
            engine.run(&mut ctx, &Snapshot::default(), &mut command);
            seen.push(command.throttle());
        }
        assert_eq!(
            seen,
            vec![-1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, -1.0]
        );
    }

    #[test]
    fn failing_behavior_rolls_back_and_others_still_run() {
        let mut engine = ArbitrationEngine::new(vec![
            Box::new(from_fn("gun", |_, _, _| {
                Ok(Verdict::Apply(CommandPatch::new().with_gun_turn(0.4)))
            })),
            Box::new(from_fn("patrol", |_, _, command: &mut Command| {
                command.set_gun_turn(-1.0);
                command.set_throttle(1.0);
                Err(AutopilotError::OriginUnknown {
                    operation: "loop on path",
                })
            })),
            Box::new(from_fn("scan", |_, _, _| {
                Ok(Verdict::Apply(CommandPatch::new().with_radar_turn(1.0)))
            })),
        ]);
        let mut ctx = context();
        let mut command = Command::new();
        engine.run(&mut ctx, &Snapshot::default(), &mut command);

        assert_eq!(command.gun_turn(), 0.4);
        assert_eq!(command.throttle(), 0.0);
        assert_eq!(command.radar_turn(), 1.0);
        assert_eq!(engine.stats()[1].failures, 1);
    }

    #[test]
    fn abstaining_leaves_command_untouched() {
        let mut engine = ArbitrationEngine::new(vec![
            Box::new(from_fn("idle", |_, _, _| Ok(Verdict::Abstain))),
            Box::new(from_fn("empty-pin", |_, _, _| Ok(Verdict::ApplyPinned(Vec::new())))),
        ]);
        let mut ctx = context();
        let mut command = Command::new();
        command.set_turn(0.2);
        engine.run(&mut ctx, &Snapshot::default(), &mut command);
        assert_eq!(command.turn(), 0.2);
        assert_eq!(engine.ids(), vec!["idle", "empty-pin"]);
        assert!(engine.stats().iter().all(|s| s.abstentions == 1));
    }
}
