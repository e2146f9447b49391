// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conflict-free replicated database (CRDB) operations.
//!
//! A CRDB spans several peer clusters; the cluster builds it through an
//! asynchronous task, so readiness is tracked by polling
//! `/v1/crdb_tasks/{id}` rather than the database itself.

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::types::{
    CrdbClusterCredentials, CrdbClusterInfo, CrdbInstance, CrdbSettings, CrdbTaskStatus,
    DatabaseId, InstanceCredentials, PeerCluster, StatusResponse,
};

impl ApiClient {
    /// Request creation of a replicated database spanning the given peer
    /// clusters and return a channel that yields its credentials once the
    /// cluster-side task finishes.
    ///
    /// The settings map must carry a `name`; it doubles as the default
    /// per-database configuration. Each peer cluster contributes one
    /// instance.
    pub async fn create_crdb(
        &self,
        settings: Map<String, Value>,
        peers: &[PeerCluster],
    ) -> Result<oneshot::Receiver<InstanceCredentials>> {
        let name = settings
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::InvalidSettings(
                    "replicated databases require a name parameter".to_string(),
                )
            })?
            .to_string();

        let payload = CrdbSettings {
            name,
            default_db_config: settings,
            instances: peers
                .iter()
                .map(|peer| CrdbInstance {
                    cluster: CrdbClusterInfo {
                        name: peer.name.clone(),
                        url: format!("http://{}:8080", peer.address),
                        credentials: CrdbClusterCredentials {
                            username: peer.username.clone(),
                            password: peer.password.clone(),
                        },
                    },
                })
                .collect(),
        };

        debug!(name = %payload.name, instances = payload.instances.len(), "sending CRDB creation request");
        let res = self
            .send(self.http.post(self.url("/v1/crdbs")).json(&payload))
            .await?;
        let task: CrdbTaskStatus = self.decode_or_reject(res).await?;
        info!(task_id = %task.id, crdb_guid = %task.crdb_guid, "CRDB creation scheduled");

        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        tokio::spawn(async move { client.poll_crdb_task(task.id, task.crdb_guid, tx).await });
        Ok(rx)
    }

    /// Fetch the status of an asynchronous CRDB task.
    pub async fn crdb_task_status(&self, id: &str) -> Result<CrdbTaskStatus> {
        let res = self
            .send(self.http.get(self.url(&format!("/v1/crdb_tasks/{id}"))))
            .await?;
        self.decode_or_reject(res).await
    }

    /// Resolve connection credentials for a replicated database.
    ///
    /// The CRDB API returns neither database settings nor a mapping from
    /// GUID to local database ids, so the whole database list is scanned
    /// for a matching `crdt_guid` instead.
    pub async fn crdb_credentials(&self, guid: &str) -> Result<InstanceCredentials> {
        let res = self.send(self.http.get(self.url("/v1/bdbs"))).await?;
        let databases: Vec<StatusResponse> = self.decode_or_reject(res).await?;
        for db in databases {
            if db.crdt_guid != guid {
                continue;
            }
            if db.status != "active" {
                return Err(ClientError::NotActive);
            }
            return db.credentials_with_uid(DatabaseId::Crdb(guid.to_string()));
        }
        Err(ClientError::MalformedResponse(format!(
            "no database matches replicated database {guid}"
        )))
    }

    /// Request removal of a replicated database.
    ///
    /// The cluster runs the removal as a task; it is not awaited.
    pub async fn delete_crdb(&self, guid: &str) -> Result<()> {
        let res = self
            .send(self.http.delete(self.url(&format!("/v1/crdbs/{guid}"))))
            .await?;
        let task: CrdbTaskStatus = self.decode_or_reject(res).await?;
        info!(guid, task_id = %task.id, "CRDB removal scheduled");
        Ok(())
    }

    /// Poll a CRDB task to completion, then resolve and deliver the
    /// database credentials.
    async fn poll_crdb_task(
        &self,
        task_id: String,
        guid: String,
        tx: oneshot::Sender<InstanceCredentials>,
    ) {
        let deadline = self.config.polling_timeout.map(|t| Instant::now() + t);
        loop {
            tokio::time::sleep(self.config.polling_interval).await;
            if tx.is_closed() {
                debug!(task_id = %task_id, "readiness receiver dropped, stopping poller");
                return;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(task_id = %task_id, "gave up waiting for the CRDB task to finish");
                    return;
                }
            }
            match self.crdb_task_status(&task_id).await {
                Ok(task) if task.status == "finished" => {
                    match self.crdb_credentials(&guid).await {
                        Ok(credentials) => {
                            info!(crdb_guid = %guid, "CRDB is active");
                            let _ = tx.send(credentials);
                            return;
                        }
                        Err(err) => {
                            warn!(crdb_guid = %guid, error = %err, "credential resolution failed, retrying");
                        }
                    }
                }
                Ok(task) => {
                    debug!(task_id = %task_id, status = %task.status, "CRDB task still in progress");
                }
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "task status probe failed, retrying");
                }
            }
        }
    }
}
