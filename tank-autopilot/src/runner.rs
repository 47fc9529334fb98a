use crate::behaviors::{create_roster, roster_ids};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tank_core::{BehaviorStats, Command, Snapshot, Tank, TankConfig};
use tracing::info;

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunMetrics {
    pub roster: String,
    pub seed: u32,
    pub tick_count: u64,
    pub origin_resolved_at: Option<u64>,
    pub origin: Option<[f64; 2]>,
    pub fire_ticks: u64,
    pub boost_ticks: u64,
    pub reverse_ticks: u64,
    pub messages_sent: u64,
    pub peak_enemies_tracked: usize,
    pub behaviors: Vec<BehaviorStats>,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub commands: Vec<Command>,
}

/// One unit driven tick by tick, standing in for the host: the command
/// carries over between ticks and the outbox is emptied after each one.
pub struct Session {
    tank: Tank,
    command: Command,
    metrics: RunMetrics,
}

impl Session {
    pub fn new(roster: &str, config: &TankConfig) -> Result<Self> {
        let behaviors = create_roster(roster).ok_or_else(|| {
            let available = roster_ids().join(", ");
            anyhow!("unknown roster '{roster}'. available: {available}")
        })?;
        let tank = Tank::new(config.clone(), behaviors).context("invalid tank config")?;
        Ok(Self::with_tank(tank, roster))
    }

    pub fn with_tank(tank: Tank, roster: &str) -> Self {
        let seed = tank.context().config.seed;
        Self {
            tank,
            command: Command::new(),
            metrics: RunMetrics {
                roster: roster.to_string(),
                seed,
                ..RunMetrics::default()
            },
        }
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    /// Process one snapshot and return the command to send, outbox included.
    pub fn step(&mut self, mut snapshot: Snapshot) -> Command {
        self.tank.tick(&mut snapshot, &mut self.command);
        let ctx = self.tank.context();
        let metrics = &mut self.metrics;

        metrics.tick_count = ctx.tick;
        if metrics.origin_resolved_at.is_none() {
            if let Some(origin) = ctx.autopilot.origin().known() {
                info!(tick = ctx.tick, x = origin.x, y = origin.y, "origin resolved");
                metrics.origin_resolved_at = Some(ctx.tick);
                metrics.origin = Some([origin.x, origin.y]);
            }
        }
        if self.command.shoot() > 0.0 {
            metrics.fire_ticks += 1;
        }
        if self.command.boost() {
            metrics.boost_ticks += 1;
        }
        if self.command.throttle() < 0.0 {
            metrics.reverse_ticks += 1;
        }
        metrics.peak_enemies_tracked = metrics.peak_enemies_tracked.max(ctx.trackers.enemies.len());

        let emitted = self.command.clone();
        metrics.messages_sent += self.command.drain_outbox().len() as u64;
        emitted
    }

    pub fn finish(self) -> RunMetrics {
        RunMetrics {
            behaviors: self.tank.behavior_stats(),
            ..self.metrics
        }
    }
}

pub fn run_roster(
    roster: &str,
    config: &TankConfig,
    snapshots: impl IntoIterator<Item = Snapshot>,
) -> Result<RunArtifact> {
    let session = Session::new(roster, config)?;
    Ok(run_session(session, snapshots))
}

/// Drive an already-built unit over a recorded stream.
pub fn run_snapshots(
    tank: Tank,
    label: &str,
    snapshots: impl IntoIterator<Item = Snapshot>,
) -> RunArtifact {
    run_session(Session::with_tank(tank, label), snapshots)
}

fn run_session(mut session: Session, snapshots: impl IntoIterator<Item = Snapshot>) -> RunArtifact {
    let commands: Vec<Command> = snapshots.into_iter().map(|s| session.step(s)).collect();
    let metrics = session.finish();
    info!(
        roster = %metrics.roster,
        ticks = metrics.tick_count,
        origin_resolved_at = ?metrics.origin_resolved_at,
        messages = metrics.messages_sent,
        "run finished"
    );
    RunArtifact { metrics, commands }
}

/// Blank lines and `#` comments are skipped.
pub fn parse_snapshot_line(line: &str) -> Result<Option<Snapshot>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let snapshot = serde_json::from_str(trimmed).context("malformed snapshot")?;
    Ok(Some(snapshot))
}

pub fn read_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed reading snapshots {}", path.display()))?;
    let mut snapshots = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed reading {}", path.display()))?;
        if let Some(snapshot) = parse_snapshot_line(&line)
            .with_context(|| format!("{}:{}", path.display(), index + 1))?
        {
            snapshots.push(snapshot);
        }
    }
    if snapshots.is_empty() {
        return Err(anyhow!("snapshot stream {} is empty", path.display()));
    }
    Ok(snapshots)
}

pub fn write_commands(path: &Path, commands: &[Command]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    let file = fs::File::create(path)
        .with_context(|| format!("failed writing commands {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for command in commands {
        serde_json::to_writer(&mut writer, command)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
