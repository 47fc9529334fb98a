use std::fs;
use std::path::Path;
use tank_autopilot::batch::{run_batch, BatchConfig};
use tank_autopilot::runner::{read_snapshots, run_roster, write_commands};
use tank_core::TankConfig;

/// Stationary unit mid-field with an enemy 300 units due south.
const STANDOFF: &str = r#"# recorded standoff
{"id": 1, "x": 425, "y": 100, "angle": 0, "energy": 100, "radar": {"angle": 0, "enemy": {"id": 2, "x": 425, "y": 400, "angle": 0, "speed": 0, "energy": 100}}}
{"id": 1, "x": 425, "y": 100, "angle": 0, "energy": 100}

{"id": 1, "x": 425, "y": 100, "angle": 0, "energy": 100}
"#;

/// Wall echoes that pin the field to x in [60, 910] and y in [-450, 100].
const ECHOES: &str = r#"{"id": 1, "x": 100, "y": 70.5, "angle": 0, "radar": {"angle": 180, "wallDistance": 40}}
{"id": 1, "x": 130, "y": 70.5, "angle": 0, "radar": {"angle": 180, "wallDistance": 70}}
{"id": 1, "x": 130, "y": 70.5, "angle": 90, "radar": {"angle": 0, "wallDistance": 29.5}}
{"id": 1, "x": 140, "y": 80, "angle": 90, "radar": {"angle": 0, "wallDistance": 20}}
"#;

fn known_field() -> TankConfig {
    TankConfig {
        known_origin: Some([0.0, 0.0]),
        ..TankConfig::default()
    }
}

fn write_stream(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn standoff_replay_emits_one_command_per_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stream(dir.path(), "standoff.jsonl", STANDOFF);

    let snapshots = read_snapshots(&input).unwrap();
    assert_eq!(snapshots.len(), 3);
    let artifact = run_roster("jamro", &known_field(), snapshots).unwrap();

    let metrics = &artifact.metrics;
    assert_eq!(metrics.tick_count, 3);
    assert_eq!(metrics.origin_resolved_at, Some(1));
    assert_eq!(metrics.fire_ticks, 3);
    assert_eq!(metrics.boost_ticks, 0);
    // One relay of the sighting and one target claim.
    assert_eq!(metrics.messages_sent, 2);
    assert!(metrics.behaviors.iter().all(|b| b.failures == 0));

    let output = dir.path().join("out/standoff.commands.jsonl");
    write_commands(&output, &artifact.commands).unwrap();
    let lines: Vec<serde_json::Value> = fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["THROTTLE"], 1.0);
    assert_eq!(lines[0]["OUTBOX"].as_array().map(Vec::len), Some(2));
    assert_eq!(lines[1]["OUTBOX"].as_array().map(Vec::len), Some(0));
}

#[test]
fn patrol_calibrates_from_echoes_without_failures() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stream(dir.path(), "echoes.jsonl", ECHOES);

    let artifact = run_roster("patrol", &TankConfig::default(), read_snapshots(&input).unwrap())
        .unwrap();
    let metrics = &artifact.metrics;
    assert_eq!(metrics.origin_resolved_at, Some(4));
    assert_eq!(metrics.origin, Some([60.0, -450.0]));
    assert!(metrics.behaviors.iter().all(|b| b.failures == 0));

    let patrol = metrics
        .behaviors
        .iter()
        .find(|b| b.id == "patrol-perimeter")
        .unwrap();
    // Idle until the y echo repeats on the last tick.
    assert_eq!(patrol.abstentions, 3);
    assert_eq!(patrol.invocations, 4);
}

#[test]
fn malformed_line_reports_its_position() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stream(dir.path(), "broken.jsonl", "{\"id\": 1}\n{\"id\": \n");
    let err = format!("{:#}", read_snapshots(&input).unwrap_err());
    assert!(err.contains("broken.jsonl:2"), "{err}");
}

#[test]
fn batch_runs_each_stream_on_a_fresh_seeded_unit() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_stream(dir.path(), "a.jsonl", STANDOFF);
    let b = write_stream(dir.path(), "b.jsonl", STANDOFF);
    let out_dir = dir.path().join("commands");

    let config = TankConfig {
        seed: 100,
        ..known_field()
    };
    let report = run_batch(&BatchConfig {
        roster: "jamro".to_string(),
        streams: vec![a, b],
        config,
        out_dir: Some(out_dir.clone()),
        jobs: Some(2),
    })
    .unwrap();

    assert_eq!(report.streams, 2);
    assert_eq!(report.total_ticks, 6);
    assert_eq!(report.calibrated_streams, 2);
    assert_eq!(report.avg_origin_resolved_at, Some(1.0));
    assert_eq!(report.messages_sent, 4);
    assert_eq!(report.behavior_failures, 0);
    let seeds: Vec<u32> = report.runs.iter().map(|r| r.metrics.seed).collect();
    assert_eq!(seeds, vec![100, 101]);
    assert!(out_dir.join("a.commands.jsonl").exists());
    assert!(out_dir.join("b.commands.jsonl").exists());
}

#[test]
fn batch_rejects_zero_jobs() {
    let report = run_batch(&BatchConfig {
        roster: "jamro".to_string(),
        streams: vec!["missing.jsonl".into()],
        config: TankConfig::default(),
        out_dir: None,
        jobs: Some(0),
    });
    assert!(report.is_err());
}
