//! TOML configuration accepted by the `run` subcommand.
//!
//! ```toml
//! [simulation]
//! logic_tick_rate = 15
//! heartbeat_ms = 16
//!
//! [spawner]
//! seed = 12345
//! max_per_tick = 2
//! ```
//!
//! Every key is optional; omitted simulation settings keep their defaults and
//! an omitted `[spawner]` table leaves the entity list empty.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use lockstep_core::SyncConfig;
use serde::Deserialize;

const DEFAULT_MAX_PER_TICK: i32 = 2;

/// Parsed contents of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    pub(crate) simulation: SyncConfig,
    pub(crate) spawner: Option<SpawnerConfig>,
}

/// Settings for the seeded entity spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpawnerConfig {
    pub(crate) seed: i32,
    #[serde(default = "default_max_per_tick")]
    pub(crate) max_per_tick: i32,
}

impl SpawnerConfig {
    pub(crate) const fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            max_per_tick: DEFAULT_MAX_PER_TICK,
        }
    }
}

const fn default_max_per_tick() -> i32 {
    DEFAULT_MAX_PER_TICK
}

/// Loads the configuration at `path`, or the defaults when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse(contents: &str) -> Result<CliConfig> {
    let config: CliConfig = toml::from_str(contents).context("failed to parse config toml")?;
    config.simulation.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{load, parse, SpawnerConfig};
    use lockstep_core::SyncConfig;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load(None).expect("defaults");
        assert_eq!(config.simulation, SyncConfig::default());
        assert_eq!(config.spawner, None);
    }

    #[test]
    fn partial_tables_keep_defaults() {
        let config = parse(
            r#"
            [simulation]
            logic_tick_rate = 30

            [spawner]
            seed = 7
            "#,
        )
        .expect("valid config");

        assert_eq!(config.simulation.logic_tick_rate, 30);
        assert_eq!(config.simulation.heartbeat_ms, 16);
        assert_eq!(config.spawner, Some(SpawnerConfig::with_seed(7)));
    }

    #[test]
    fn unrunnable_settings_are_rejected() {
        let error = parse("[simulation]\nheartbeat_ms = 500\n").expect_err("slow heartbeat");
        assert!(error.to_string().contains("heartbeat"), "{error:#}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("[simulation]\n[renderer]\nfps = 60\n").is_err());
    }
}
