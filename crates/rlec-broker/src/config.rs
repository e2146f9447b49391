// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Broker configuration loaded from a YAML file.
//!
//! The configuration carries the cluster address and credentials, the
//! service descriptor advertised to the platform (including its plans), and
//! an optional list of peer clusters used for replicated databases.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use rlec_client::PeerCluster;

/// Peer cluster grammar: `user:pass@fqdn[/ipv4]`.
static PEER_CLUSTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<user>.*?):(?P<pass>.*?)@(?P<fqdn>[^/]*)(/(?P<addr>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}))?$")
        .expect("peer cluster pattern is valid")
});

/// Top-level broker configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// The cluster this broker provisions databases on.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// The service descriptor and its plans.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Peer clusters participating in replicated databases.
    #[serde(default)]
    pub peer_clusters: PeerClustersConfig,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse a configuration document.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(raw)?;
        if !config.peer_clusters.string.is_empty() {
            config.peer_clusters.clusters = parse_peer_clusters(&config.peer_clusters.string)?;
        }
        Ok(config)
    }

    /// Look up a plan by id.
    pub fn plan(&self, id: &str) -> Option<&PlanConfig> {
        self.broker.plans.iter().find(|plan| plan.id == id)
    }

    /// The peer clusters in the form the API client consumes.
    pub fn peer_clusters(&self) -> Vec<PeerCluster> {
        self.peer_clusters
            .clusters
            .iter()
            .map(|cluster| PeerCluster {
                name: cluster.name.clone(),
                address: cluster.address.clone(),
                username: cluster.auth.username.clone(),
                password: cluster.auth.password.clone(),
            })
            .collect()
    }
}

/// Address and credentials of one cluster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterConfig {
    /// Management API address (`host:port` or full URL).
    #[serde(default)]
    pub address: String,
    /// Management API credentials.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Cluster FQDN; only meaningful for peer clusters.
    #[serde(default)]
    pub name: String,
}

/// A username/password pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Account username.
    #[serde(default)]
    pub username: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
}

/// The service descriptor advertised to the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerConfig {
    /// Service name.
    #[serde(default)]
    pub name: String,
    /// Service id the platform addresses this broker by.
    #[serde(default)]
    pub service_id: String,
    /// Port the platform-facing HTTP adapter listens on.
    #[serde(default)]
    pub port: u16,
    /// Service description.
    #[serde(default)]
    pub description: String,
    /// Credentials the platform authenticates with.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Catalog presentation metadata.
    #[serde(default)]
    pub metadata: ServiceMetadata,
    /// The plans this broker offers.
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
}

/// Catalog presentation metadata for the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceMetadata {
    /// Display name shown in marketplaces.
    #[serde(default)]
    pub display_name: String,
    /// Base64 logo image.
    #[serde(default)]
    pub image: String,
    /// Provider display name.
    #[serde(default)]
    pub provider_display_name: String,
}

/// One plan: a named database configuration template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanConfig {
    /// Plan id the platform addresses this plan by.
    #[serde(default)]
    pub id: String,
    /// Plan name.
    #[serde(default)]
    pub name: String,
    /// Plan description.
    #[serde(default)]
    pub description: String,
    /// Catalog presentation metadata.
    #[serde(default)]
    pub metadata: PlanMetadata,
    /// The database template instances of this plan are created from.
    #[serde(default)]
    pub settings: InstanceConfig,
}

/// Catalog presentation metadata for a plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanMetadata {
    /// Feature bullet points.
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// Database template a plan provisions from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceConfig {
    /// Memory limit in bytes.
    #[serde(default, rename = "memory")]
    pub memory_limit: u64,
    /// Whether the database keeps an in-cluster replica.
    #[serde(default)]
    pub replication: bool,
    /// Number of shards; sharding engages above one.
    #[serde(default)]
    pub shard_count: u64,
    /// Data persistence policy.
    #[serde(default)]
    pub persistence: PersistencePolicy,
    /// Snapshot schedule, used when persistence is `snapshot`.
    #[serde(default)]
    pub snapshot: Option<SnapshotConfig>,
}

/// Data persistence policy for a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistencePolicy {
    /// No persistence.
    #[default]
    Disabled,
    /// Append-only file.
    Aof,
    /// Periodic snapshots.
    Snapshot,
}

impl PersistencePolicy {
    /// The policy name as the cluster API spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistencePolicy::Disabled => "disabled",
            PersistencePolicy::Aof => "aof",
            PersistencePolicy::Snapshot => "snapshot",
        }
    }
}

/// Snapshot schedule: a snapshot every `secs` seconds if at least `writes`
/// writes occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SnapshotConfig {
    /// Minimum number of writes.
    pub writes: u32,
    /// Schedule period in seconds.
    pub secs: u32,
}

/// Peer clusters as configured: a single string of `user:pass@fqdn[/ipv4]`
/// entries joined by `;`, parsed into [`ClusterConfig`] entries at load
/// time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeerClustersConfig {
    /// The raw peer clusters string.
    #[serde(default)]
    pub string: String,
    /// Parsed entries; populated by [`Config::from_yaml`].
    #[serde(skip)]
    pub clusters: Vec<ClusterConfig>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid YAML.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// A peer clusters entry does not match `user:pass@fqdn[/ipv4]`.
    #[error("invalid peer clusters entry: {0}")]
    InvalidPeerClusters(String),
}

fn parse_peer_clusters(raw: &str) -> Result<Vec<ClusterConfig>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let caps = PEER_CLUSTER
                .captures(part)
                .ok_or_else(|| ConfigError::InvalidPeerClusters(part.to_string()))?;
            let fqdn = caps["fqdn"].to_string();
            // Without an explicit /ipv4 the FQDN doubles as the address.
            let address = caps
                .name("addr")
                .map(|addr| addr.as_str().to_string())
                .unwrap_or_else(|| fqdn.clone());
            Ok(ClusterConfig {
                auth: AuthConfig {
                    username: caps["user"].to_string(),
                    password: caps["pass"].to_string(),
                },
                address,
                name: fqdn,
            })
        })
        .collect()
}
