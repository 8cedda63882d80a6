//! Core configuration types and loading.

use dynamo_proto::{ReplicaIdentity, preference_list_for};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Cluster configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Quorum sizes and timing shared by every node.
    pub cluster: ClusterConfig,
    /// Optional Prometheus endpoint.
    pub metrics: Option<MetricsConfig>,
    /// The replica set, in canonical ring order.
    #[serde(rename = "node", default)]
    pub nodes: Vec<NodeConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Every node's identity in configuration order.
    pub fn ring(&self) -> Vec<ReplicaIdentity> {
        self.nodes.iter().map(NodeConfig::identity).collect()
    }

    /// Preference list for the node at `index`: the ring rotated so it starts there.
    pub fn preference_list(&self, index: usize) -> Vec<ReplicaIdentity> {
        preference_list_for(&self.ring(), index)
    }

    pub fn node(&self, id: &str) -> Option<(usize, &NodeConfig)> {
        self.nodes.iter().enumerate().find(|(_, n)| n.id == id)
    }
}

/// Settings shared by the whole replica set.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Replicas (including the coordinator) a Put tries to reach (W).
    pub write_quorum: usize,
    /// Replicas (including the coordinator) a Get reads from (R).
    pub read_quorum: usize,
    /// Bound on a single peer call, in milliseconds.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// Period of automatic gossip rounds. Absent means gossip only on demand.
    #[serde(default)]
    pub gossip_interval_secs: Option<u64>,
}

impl ClusterConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn gossip_interval(&self) -> Option<Duration> {
        self.gossip_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn default_rpc_timeout_ms() -> u64 {
    500
}

/// Prometheus endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Port for `/metrics`; 0 disables the endpoint.
    pub port: u16,
}

/// One replica.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Identifier stamped into vector clocks.
    pub id: String,
    pub address: String,
    pub port: u16,
}

impl NodeConfig {
    pub fn identity(&self) -> ReplicaIdentity {
        ReplicaIdentity::new(self.address.clone(), self.port)
    }
}
