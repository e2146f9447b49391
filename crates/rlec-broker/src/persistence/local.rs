// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! File-backed state persistence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{PersistenceError, State, StatePersister};

/// Stores the broker state as a single JSON document on the local
/// filesystem.
///
/// Writes go to a sibling temp file which is renamed over the target, so a
/// concurrent reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct LocalPersister {
    path: PathBuf,
}

impl LocalPersister {
    /// Create a persister backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The default state location, `$HOME/.redislabs-broker/state.json`.
pub fn default_state_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".redislabs-broker")
        .join("state.json")
}

#[async_trait]
impl StatePersister for LocalPersister {
    async fn load(&self) -> Result<State, PersistenceError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(State::default());
            }
            Err(err) => return Err(err.into()),
        };
        if raw.is_empty() {
            return Ok(State::default());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn save(&self, state: &State) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            path = %self.path.display(),
            instances = state.available_instances.len(),
            "broker state saved"
        );
        Ok(())
    }
}
