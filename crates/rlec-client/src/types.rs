// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire and value types for the cluster API.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};

/// Identifier of a database on the cluster.
///
/// Regular databases are addressed by integer uid, replicated databases by
/// GUID. The kind is tracked explicitly so update and delete requests route
/// to the right endpoint family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseId {
    /// A regular database (`/v1/bdbs/{uid}`).
    Bdb(u64),
    /// A conflict-free replicated database (`/v1/crdbs/{guid}`).
    Crdb(String),
}

impl DatabaseId {
    /// Whether this identifies a replicated database.
    pub fn is_crdb(&self) -> bool {
        matches!(self, DatabaseId::Crdb(_))
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseId::Bdb(uid) => write!(f, "{uid}"),
            DatabaseId::Crdb(guid) => f.write_str(guid),
        }
    }
}

impl From<u64> for DatabaseId {
    fn from(uid: u64) -> Self {
        DatabaseId::Bdb(uid)
    }
}

impl From<&str> for DatabaseId {
    fn from(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(uid) => DatabaseId::Bdb(uid),
            Err(_) => DatabaseId::Crdb(raw.to_string()),
        }
    }
}

// State files written by older broker versions store the uid as either a
// bare number or a GUID string; keep that schema on the wire.
impl Serialize for DatabaseId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DatabaseId::Bdb(uid) => serializer.serialize_u64(*uid),
            DatabaseId::Crdb(guid) => serializer.serialize_str(guid),
        }
    }
}

impl<'de> Deserialize<'de> for DatabaseId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .map(DatabaseId::Bdb)
                .ok_or_else(|| D::Error::custom("database uid must be a non-negative integer")),
            Value::String(s) => Ok(DatabaseId::from(s.as_str())),
            other => Err(D::Error::custom(format!(
                "unexpected database id: {other}"
            ))),
        }
    }
}

/// Properties necessary for identifying a database and connecting to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceCredentials {
    /// Cluster-side database identifier.
    pub uid: DatabaseId,
    /// Hostname applications connect to.
    pub host: String,
    /// Port applications connect to.
    pub port: u16,
    /// Endpoint IP addresses.
    #[serde(default)]
    pub ip_list: Vec<String>,
    /// Redis authentication password.
    pub password: String,
}

/// One peer cluster participating in CRDB replication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCluster {
    /// Cluster FQDN as known to the replication mesh.
    pub name: String,
    /// Address the management API is reached at.
    pub address: String,
    /// Management API username.
    pub username: String,
    /// Management API password.
    pub password: String,
}

/// Status of an asynchronous CRDB task.
#[derive(Debug, Clone, Deserialize)]
pub struct CrdbTaskStatus {
    /// Task identifier, used for status polling.
    #[serde(default)]
    pub id: String,
    /// GUID of the replicated database the task is building or removing.
    #[serde(default)]
    pub crdb_guid: String,
    /// Task state as reported by the cluster (e.g. `queued`, `finished`).
    #[serde(default)]
    pub status: String,
    /// Per-cluster task failures.
    #[serde(default)]
    pub errors: Vec<CrdbTaskError>,
}

/// One per-cluster failure attached to a CRDB task.
#[derive(Debug, Clone, Deserialize)]
pub struct CrdbTaskError {
    /// Cluster the failure originates from.
    #[serde(default)]
    pub cluster_name: String,
    /// Machine-readable error code.
    #[serde(default)]
    pub error_code: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// Error payload carried by non-200 cluster responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub error_code: String,
}

/// One endpoint entry in the current status-response shape.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Endpoint {
    pub dns_name: String,
    pub port: u16,
    #[serde(default)]
    pub addr: Vec<String>,
}

/// Database status as reported by `/v1/bdbs` endpoints.
///
/// The API has evolved; both the current `endpoints` shape and the legacy
/// `dns_address_master`/`endpoint_ip` fields are accepted.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub uid: Option<DatabaseId>,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "authentication_redis_pass")]
    pub password: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub dns_address_master: String,
    #[serde(default)]
    pub endpoint_ip: Vec<String>,
    #[serde(default)]
    pub crdt_guid: String,
}

impl StatusResponse {
    /// Extract connection credentials for the database identified by `uid`.
    ///
    /// `endpoints[0]` wins when both response shapes are present.
    pub(crate) fn credentials_with_uid(&self, uid: DatabaseId) -> Result<InstanceCredentials> {
        if let Some(endpoint) = self.endpoints.first() {
            return Ok(InstanceCredentials {
                uid,
                host: endpoint.dns_name.clone(),
                port: endpoint.port,
                ip_list: endpoint.addr.clone(),
                password: self.password.clone(),
            });
        }
        if !self.dns_address_master.is_empty() {
            let (host, port) = split_host_port(&self.dns_address_master)?;
            return Ok(InstanceCredentials {
                uid,
                host,
                port,
                ip_list: self.endpoint_ip.clone(),
                password: self.password.clone(),
            });
        }
        Err(ClientError::MalformedResponse(
            "status response carries no endpoints".to_string(),
        ))
    }
}

/// Settings payload for `/v1/crdbs` creation requests.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CrdbSettings {
    pub name: String,
    pub default_db_config: Map<String, Value>,
    pub instances: Vec<CrdbInstance>,
}

/// One participating cluster in a CRDB creation request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CrdbInstance {
    pub cluster: CrdbClusterInfo,
}

/// Connection details for a participating cluster.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CrdbClusterInfo {
    pub name: String,
    pub url: String,
    pub credentials: CrdbClusterCredentials,
}

/// Management credentials for a participating cluster.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CrdbClusterCredentials {
    pub username: String,
    pub password: String,
}

/// Split `host:port` on the last colon.
fn split_host_port(address: &str) -> Result<(String, u16)> {
    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        ClientError::MalformedResponse(format!("address '{address}' carries no port"))
    })?;
    let port = port.parse().map_err(|_| {
        ClientError::MalformedResponse(format!("address '{address}' has a non-numeric port"))
    })?;
    Ok((host.to_string(), port))
}
