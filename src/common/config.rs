//! Configuration for ringkv components

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default size of the hash ring coordinate space
pub const DEFAULT_RING_SIZE: u64 = 512;

/// Default number of ticks a pending request may wait for quorum
pub const DEFAULT_WAIT_TICKS: u64 = 20;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Protocol parameters shared by every node
    pub node: NodeConfig,

    /// Simulation harness parameters
    pub sim: SimConfig,

    /// Audit sink settings
    pub audit: AuditConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            sim: SimConfig::default(),
            audit: AuditConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration: optional TOML file, then `RINGKV__*` environment
    /// variables, then defaults for anything left unset.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix("RINGKV")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.node.validate()?;
        config.sim.validate()?;
        Ok(config)
    }
}

/// Protocol parameters. Every node of a cluster must agree on these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Modulus of the ring coordinate space
    #[serde(default = "default_ring_size")]
    pub ring_size: u64,

    /// Ticks a pending request may wait before the reaper fails it
    #[serde(default = "default_wait_ticks")]
    pub wait_ticks: u64,
}

fn default_ring_size() -> u64 {
    DEFAULT_RING_SIZE
}
fn default_wait_ticks() -> u64 {
    DEFAULT_WAIT_TICKS
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
            wait_ticks: DEFAULT_WAIT_TICKS,
        }
    }
}

impl NodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ring_size == 0 {
            return Err(Error::InvalidConfig("ring_size must be positive".into()));
        }
        if self.wait_ticks == 0 {
            return Err(Error::InvalidConfig("wait_ticks must be positive".into()));
        }
        Ok(())
    }
}

/// Simulation harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of nodes started at tick zero
    #[serde(default = "default_nodes")]
    pub nodes: usize,

    /// Probability that the network drops any single message
    #[serde(default)]
    pub drop_rate: f64,

    /// Shuffle each node's inbound batch before delivery
    #[serde(default)]
    pub reorder: bool,

    /// Wall-clock interval between ticks
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Number of ticks to run
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Client operations issued per tick
    #[serde(default = "default_ops_per_tick")]
    pub ops_per_tick: usize,

    /// Tick at which a random node is failed
    #[serde(default)]
    pub fail_at_tick: Option<u64>,

    /// Tick at which a fresh node joins
    #[serde(default)]
    pub join_at_tick: Option<u64>,

    /// Seed for the network and workload RNGs
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_nodes() -> usize {
    10
}
fn default_tick_ms() -> u64 {
    10
}
fn default_ticks() -> u64 {
    200
}
fn default_ops_per_tick() -> usize {
    1
}
fn default_seed() -> u64 {
    42
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            drop_rate: 0.0,
            reorder: false,
            tick_ms: default_tick_ms(),
            ticks: default_ticks(),
            ops_per_tick: default_ops_per_tick(),
            fail_at_tick: None,
            join_at_tick: None,
            seed: default_seed(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.drop_rate) {
            return Err(Error::InvalidConfig(format!(
                "drop_rate must be within [0, 1], got {}",
                self.drop_rate
            )));
        }
        if self.tick_ms == 0 {
            return Err(Error::InvalidConfig("tick_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Audit sink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// JSON-lines file receiving every outcome
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Mirror audit lines to stdout
    #[serde(default)]
    pub stdout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.node.ring_size, 512);
        assert_eq!(config.node.wait_ticks, 20);
        assert_eq!(config.sim.nodes, 10);
        assert!(config.audit.path.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\n[node]\nwait_ticks = 7\n[sim]\nnodes = 5\ndrop_rate = 0.1"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.node.wait_ticks, 7);
        assert_eq!(config.node.ring_size, DEFAULT_RING_SIZE);
        assert_eq!(config.sim.nodes, 5);
        assert!((config.sim.drop_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/ringkv.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ring() {
        let node = NodeConfig {
            ring_size: 0,
            ..Default::default()
        };
        assert!(node.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_drop_rate() {
        let sim = SimConfig {
            drop_rate: 1.5,
            ..Default::default()
        };
        assert!(sim.validate().is_err());
    }
}
