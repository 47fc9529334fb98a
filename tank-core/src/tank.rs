use tracing::trace;

use crate::autopilot::Autopilot;
use crate::config::TankConfig;
use crate::engine::{ArbitrationEngine, Behavior, BehaviorStats};
use crate::error::AutopilotError;
use crate::rng::SeededRng;
use crate::snapshot::{Command, Snapshot};
use crate::trackers::SharedTrackers;

/// All mutable state one unit carries between ticks, handed to every
/// behavior. Units never share a context.
#[derive(Debug, Clone)]
pub struct TankContext {
    /// 0 before the first tick, then incremented once per tick.
    pub tick: u64,
    pub config: TankConfig,
    pub autopilot: Autopilot,
    pub trackers: SharedTrackers,
    pub rng: SeededRng,
}

impl TankContext {
    pub fn new(config: TankConfig) -> Result<Self, AutopilotError> {
        config.validate()?;
        Ok(Self {
            tick: 0,
            autopilot: Autopilot::new(&config),
            trackers: SharedTrackers::new(&config),
            rng: SeededRng::new(config.seed),
            config,
        })
    }
}

/// One autonomous unit: its context plus its behavior roster.
pub struct Tank {
    ctx: TankContext,
    engine: ArbitrationEngine,
}

impl Tank {
    pub fn new(config: TankConfig, behaviors: Vec<Box<dyn Behavior>>) -> Result<Self, AutopilotError> {
        Ok(Self {
            ctx: TankContext::new(config)?,
            engine: ArbitrationEngine::new(behaviors),
        })
    }

    pub fn context(&self) -> &TankContext {
        &self.ctx
    }

    pub fn tick_count(&self) -> u64 {
        self.ctx.tick
    }

    pub fn behavior_ids(&self) -> Vec<&'static str> {
        self.engine.ids()
    }

    pub fn behavior_stats(&self) -> Vec<BehaviorStats> {
        self.engine.stats()
    }

    /// Process one tick: derive geometry, calibrate, track, arbitrate.
    /// The inbox is consumed; messages are visible for this tick only.
    pub fn tick(&mut self, snapshot: &mut Snapshot, command: &mut Command) {
        self.ctx.tick += 1;
        let tick = self.ctx.tick;
        trace!(tick, x = snapshot.x, y = snapshot.y, heading = snapshot.angle, "tick");

        self.ctx.autopilot.update(snapshot);
        self.ctx.trackers.ingest(snapshot, tick, command);
        self.engine.run(&mut self.ctx, snapshot, command);

        snapshot.radio.inbox.clear();
    }
}
