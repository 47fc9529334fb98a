use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tank_autopilot::batch::{run_batch, BatchConfig};
use tank_autopilot::behaviors::describe_rosters;
use tank_autopilot::runner::{parse_snapshot_line, read_snapshots, run_roster, write_commands, Session};
use tank_autopilot::util::{collect_streams, load_config, parse_seed, seed_to_hex};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "tank-autopilot")]
#[command(about = "Behavior-arbitrated tank autopilot: replay snapshot streams or drive a live host")]
struct Cli {
    /// JSON tank config; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// RNG seed override (decimal or 0x-prefixed hex)
    #[arg(long, global = true)]
    seed: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available behavior rosters
    ListRosters,
    /// Replay one snapshot stream and write the resulting commands
    Run {
        #[arg(long, default_value = "jamro")]
        roster: String,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Replay many streams in parallel, one fresh unit per stream
    Batch {
        #[arg(long, default_value = "jamro")]
        roster: String,
        /// Snapshot files, or directories of *.jsonl files
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Host adapter: one snapshot per stdin line, one command per stdout line
    Drive {
        #[arg(long, default_value = "jamro")]
        roster: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let Cli {
        config,
        seed,
        command,
    } = Cli::parse();
    let mut tank_config = load_config(config.as_deref())?;
    if let Some(seed) = seed {
        tank_config.seed = parse_seed(&seed)?;
    }

    match command {
        Commands::ListRosters => {
            for (id, description) in describe_rosters() {
                println!("{id:10} {description}");
            }
        }
        Commands::Run {
            roster,
            input,
            output,
            metrics,
        } => {
            let snapshots = read_snapshots(&input)?;
            let artifact = run_roster(&roster, &tank_config, snapshots)?;
            let output_path = output.unwrap_or_else(|| input.with_extension("commands.jsonl"));
            write_commands(&output_path, &artifact.commands)?;

            let m = &artifact.metrics;
            println!("roster={}", m.roster);
            println!("seed={}", seed_to_hex(m.seed));
            println!("ticks={}", m.tick_count);
            match m.origin {
                Some([x, y]) => println!(
                    "origin=({x}, {y}) resolved_at={}",
                    m.origin_resolved_at.unwrap_or_default()
                ),
                None => println!("origin=unknown"),
            }
            println!("fire_ticks={}", m.fire_ticks);
            println!("boost_ticks={}", m.boost_ticks);
            println!("messages_sent={}", m.messages_sent);
            println!("output={}", output_path.display());
            if let Some(path) = metrics {
                write_json(&path, m)?;
                println!("metrics={}", path.display());
            }
        }
        Commands::Batch {
            roster,
            inputs,
            out_dir,
            report,
            jobs,
        } => {
            let streams = collect_streams(&inputs)?;
            let summary = run_batch(&BatchConfig {
                roster,
                streams,
                config: tank_config,
                out_dir,
                jobs,
            })?;
            println!("roster={}", summary.roster);
            println!("streams={}", summary.streams);
            println!("total_ticks={}", summary.total_ticks);
            println!(
                "calibrated={}/{}",
                summary.calibrated_streams, summary.streams
            );
            if let Some(avg) = summary.avg_origin_resolved_at {
                println!("avg_origin_resolved_at={avg:.1}");
            }
            println!("fire_ratio={:.3}", summary.fire_ratio);
            println!("behavior_failures={}", summary.behavior_failures);
            if let Some(path) = report {
                write_json(&path, &summary)?;
                println!("report={}", path.display());
            }
        }
        Commands::Drive { roster } => drive(&roster, &tank_config)?,
    }

    Ok(())
}

fn drive(roster: &str, config: &tank_core::TankConfig) -> Result<()> {
    let mut session = Session::new(roster, config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed reading stdin")?;
        let Some(snapshot) =
            parse_snapshot_line(&line).with_context(|| format!("stdin line {}", index + 1))?
        else {
            continue;
        };
        let command = session.step(snapshot);
        serde_json::to_writer(&mut stdout, &command)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }
    let metrics = session.finish();
    tracing::info!(
        ticks = metrics.tick_count,
        messages = metrics.messages_sent,
        "host closed the stream"
    );
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let encoded = serde_json::to_vec_pretty(value)?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
