use crate::runner::{read_snapshots, run_roster, write_commands, RunMetrics};
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tank_core::TankConfig;
use tracing::info;

#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub roster: String,
    pub streams: Vec<PathBuf>,
    pub config: TankConfig,
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StreamRun {
    pub stream: String,
    pub metrics: RunMetrics,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub roster: String,
    pub streams: usize,
    pub total_ticks: u64,
    pub calibrated_streams: usize,
    pub avg_origin_resolved_at: Option<f64>,
    pub fire_ratio: f64,
    pub boost_ratio: f64,
    pub messages_sent: u64,
    pub behavior_failures: u64,
    pub runs: Vec<StreamRun>,
}

/// Each stream gets a fresh unit; stream `i` is seeded with `seed + i` so
/// parallel runs stay reproducible regardless of scheduling.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    if config.streams.is_empty() {
        return Err(anyhow!("batch requires at least one snapshot stream"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("batch --jobs must be >= 1 when provided"));
        }
    }
    if let Some(out_dir) = &config.out_dir {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed creating {}", out_dir.display()))?;
    }

    let work: Vec<(usize, &PathBuf)> = config.streams.iter().enumerate().collect();
    let run_one = |(index, path): &(usize, &PathBuf)| -> Result<StreamRun> {
        let tank_config = TankConfig {
            seed: config.config.seed.wrapping_add(*index as u32),
            ..config.config.clone()
        };
        let snapshots = read_snapshots(path)?;
        let artifact = run_roster(&config.roster, &tank_config, snapshots)
            .with_context(|| format!("batch run failed for {}", path.display()))?;

        if let Some(out_dir) = &config.out_dir {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("stream-{index}"));
            write_commands(&out_dir.join(format!("{stem}.commands.jsonl")), &artifact.commands)?;
        }
        Ok(StreamRun {
            stream: path.display().to_string(),
            metrics: artifact.metrics,
        })
    };

    let results: Vec<Result<StreamRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| work.par_iter().map(run_one).collect())
    } else {
        work.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(results.len());
    for result in results {
        runs.push(result?);
    }

    let report = summarize(&config.roster, runs);
    info!(
        roster = %report.roster,
        streams = report.streams,
        ticks = report.total_ticks,
        calibrated = report.calibrated_streams,
        "batch finished"
    );
    Ok(report)
}

fn summarize(roster: &str, runs: Vec<StreamRun>) -> BatchReport {
    let total_ticks: u64 = runs.iter().map(|r| r.metrics.tick_count).sum();
    let resolved: Vec<u64> = runs
        .iter()
        .filter_map(|r| r.metrics.origin_resolved_at)
        .collect();
    let avg_origin_resolved_at = if resolved.is_empty() {
        None
    } else {
        Some(resolved.iter().sum::<u64>() as f64 / resolved.len() as f64)
    };
    let ratio = |count: u64| {
        if total_ticks == 0 {
            0.0
        } else {
            count as f64 / total_ticks as f64
        }
    };

    BatchReport {
        roster: roster.to_string(),
        streams: runs.len(),
        total_ticks,
        calibrated_streams: resolved.len(),
        avg_origin_resolved_at,
        fire_ratio: ratio(runs.iter().map(|r| r.metrics.fire_ticks).sum()),
        boost_ratio: ratio(runs.iter().map(|r| r.metrics.boost_ticks).sum()),
        messages_sent: runs.iter().map(|r| r.metrics.messages_sent).sum(),
        behavior_failures: runs
            .iter()
            .flat_map(|r| r.metrics.behaviors.iter())
            .map(|b| b.failures)
            .sum(),
        runs,
    }
}
