// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Broker state persistence.
//!
//! The broker keeps one durable document: the list of provisioned
//! instances with their credentials. The [`StatePersister`] trait is the
//! seam; [`LocalPersister`] is the file-backed default.

/// File-backed state persistence.
pub mod local;

pub use self::local::{LocalPersister, default_state_path};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rlec_client::InstanceCredentials;

/// One provisioned service instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Platform-assigned opaque instance id.
    pub id: String,
    /// Plan the instance was provisioned under; resolves defaults for
    /// parameter-only updates. Absent in records written by older broker
    /// versions.
    #[serde(default)]
    pub plan_id: String,
    /// Connection credentials captured once the database became active.
    pub credentials: InstanceCredentials,
}

/// The whole persisted broker state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Every instance this broker has provisioned and not yet removed.
    #[serde(default)]
    pub available_instances: Vec<ServiceInstance>,
}

impl State {
    /// Find an instance by its platform id.
    pub fn instance(&self, id: &str) -> Option<&ServiceInstance> {
        self.available_instances
            .iter()
            .find(|instance| instance.id == id)
    }

    /// Whether an instance with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.instance(id).is_some()
    }

    /// Remove and return the instance with this id.
    pub fn remove(&mut self, id: &str) -> Option<ServiceInstance> {
        let index = self
            .available_instances
            .iter()
            .position(|instance| instance.id == id)?;
        Some(self.available_instances.remove(index))
    }
}

/// Errors from state load/save.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// State file could not be read or written.
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),

    /// State document could not be encoded or decoded.
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable store for the broker state.
///
/// `save` replaces the whole document; there is no partial update. Callers
/// must serialize concurrent load-modify-save sequences — the orchestrator
/// holds a process-wide lock across every mutating triple.
#[async_trait]
pub trait StatePersister: Send + Sync {
    /// Load the current state. A store that was never written to yields an
    /// empty state.
    async fn load(&self) -> Result<State, PersistenceError>;

    /// Replace the stored state.
    async fn save(&self, state: &State) -> Result<(), PersistenceError>;
}
