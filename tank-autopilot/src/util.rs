use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tank_core::TankConfig;

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"))
    } else {
        s.parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}"))
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

/// Read a JSON config file, or the defaults when no path is given. Unknown
/// fields fall back to their defaults; the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<TankConfig> {
    let config = match path {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_str::<TankConfig>(&data)
                .with_context(|| format!("failed parsing config {}", path.display()))?
        }
        None => TankConfig::default(),
    };
    config
        .validate()
        .map_err(|err| anyhow!("config rejected: {err}"))?;
    Ok(config)
}

/// Expand directories into their `*.jsonl` files, sorted by name; plain
/// files pass through.
pub fn collect_streams(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut streams = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in fs::read_dir(input)
                .with_context(|| format!("failed listing {}", input.display()))?
            {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "jsonl") {
                    found.push(path);
                }
            }
            found.sort();
            streams.extend(found);
        } else {
            streams.push(input.clone());
        }
    }
    if streams.is_empty() {
        return Err(anyhow!("no snapshot streams found"));
    }
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_as_hex_or_decimal() {
        assert_eq!(parse_seed("0xC0FFEE00").unwrap(), 0xC0FF_EE00);
        assert_eq!(parse_seed(" 42 ").unwrap(), 42);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
        assert_eq!(seed_to_hex(0xbeef), "0x0000beef");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tank.json");
        fs::write(&path, r#"{"seed": 7, "known_origin": [10.0, 20.0]}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.known_origin, Some([10.0, 20.0]));
        assert_eq!(config.battlefield_width, TankConfig::default().battlefield_width);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tank.json");
        fs::write(&path, r#"{"tracker_ttl_ticks": 0}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err().to_string();
        assert!(err.contains("tracker_ttl_ticks"), "{err}");
    }

    #[test]
    fn directories_expand_to_sorted_streams() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jsonl", "a.jsonl", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let streams = collect_streams(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = streams
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl"]);
    }
}
