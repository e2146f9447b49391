// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database operations against the cluster's `/v1/bdbs` endpoints.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{DatabaseId, ErrorResponse, InstanceCredentials, StatusResponse};

/// Typed client for the RLEC management REST API.
///
/// Cheap to clone; all clones share one connection pool. The client keeps no
/// per-request state and is safe for concurrent use.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
}

impl ApiClient {
    /// Create a client for the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { http, config })
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request creation of a database and return a channel that yields its
    /// credentials once the cluster reports it active.
    ///
    /// The cluster acknowledges creation immediately; a background task then
    /// polls `/v1/bdbs/{uid}` every
    /// [`polling_interval`](ClientConfig::polling_interval) until the
    /// database activates. The receiver is single-shot; dropping it cancels
    /// the poller.
    pub async fn create_database(
        &self,
        settings: Map<String, JsonValue>,
    ) -> Result<oneshot::Receiver<InstanceCredentials>> {
        debug!(settings = %JsonValue::Object(settings.clone()), "sending database creation request");
        let res = self
            .send(self.http.post(self.url("/v1/bdbs")).json(&settings))
            .await?;
        let status: StatusResponse = self.decode_or_reject(res).await?;
        let uid = match status.uid {
            Some(DatabaseId::Bdb(uid)) => uid,
            _ => {
                return Err(ClientError::MalformedResponse(
                    "creation response carries no database uid".to_string(),
                ));
            }
        };
        info!(uid, "database creation scheduled");

        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        tokio::spawn(async move { client.poll_database(uid, tx).await });
        Ok(rx)
    }

    /// Fetch credentials of an active database.
    ///
    /// Returns [`ClientError::NotActive`] while the database is still
    /// pending.
    pub async fn get_database(&self, uid: u64) -> Result<InstanceCredentials> {
        let res = self
            .send(self.http.get(self.url(&format!("/v1/bdbs/{uid}"))))
            .await?;
        let status: StatusResponse = self.decode_or_reject(res).await?;
        if status.status != "active" {
            return Err(ClientError::NotActive);
        }
        status.credentials_with_uid(DatabaseId::Bdb(uid))
    }

    /// Apply new settings to an existing database.
    ///
    /// The cluster applies the change asynchronously; this call does not
    /// wait for it.
    pub async fn update_database(
        &self,
        uid: &DatabaseId,
        params: Map<String, JsonValue>,
    ) -> Result<()> {
        debug!(uid = %uid, params = %JsonValue::Object(params.clone()), "sending database update request");
        let res = self
            .send(self.http.put(self.url(&format!("/v1/bdbs/{uid}"))).json(&params))
            .await?;
        if res.status() != StatusCode::OK {
            return Err(self.rejection(res).await);
        }
        info!(uid = %uid, "database update scheduled");
        Ok(())
    }

    /// Request removal of a database. Replicated databases route to the
    /// CRDB endpoint; neither flavor is awaited.
    pub async fn delete_database(&self, uid: &DatabaseId) -> Result<()> {
        match uid {
            DatabaseId::Crdb(guid) => self.delete_crdb(guid).await,
            DatabaseId::Bdb(uid) => {
                let res = self
                    .send(self.http.delete(self.url(&format!("/v1/bdbs/{uid}"))))
                    .await?;
                if res.status() != StatusCode::OK {
                    return Err(self.rejection(res).await);
                }
                info!(uid = *uid, "database removal scheduled");
                Ok(())
            }
        }
    }

    /// Poll a database until it activates, then deliver its credentials.
    ///
    /// Transient probe failures are logged and retried; the loop only ends
    /// on success, receiver drop, or the optional polling deadline.
    async fn poll_database(&self, uid: u64, tx: oneshot::Sender<InstanceCredentials>) {
        let deadline = self.config.polling_timeout.map(|t| Instant::now() + t);
        loop {
            tokio::time::sleep(self.config.polling_interval).await;
            if tx.is_closed() {
                debug!(uid, "readiness receiver dropped, stopping poller");
                return;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(uid, "gave up waiting for the database to become active");
                    return;
                }
            }
            match self.get_database(uid).await {
                Ok(credentials) => {
                    info!(uid, "database is active");
                    let _ = tx.send(credentials);
                    return;
                }
                Err(ClientError::NotActive) => {
                    debug!(uid, "database is not active yet");
                }
                Err(err) => {
                    warn!(uid, error = %err, "readiness probe failed, retrying");
                }
            }
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let res = request
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;
        Ok(res)
    }

    /// Decode a 200 response body, or turn a non-200 response into
    /// [`ClientError::RemoteRejected`].
    pub(crate) async fn decode_or_reject<T: DeserializeOwned>(
        &self,
        res: reqwest::Response,
    ) -> Result<T> {
        if res.status() != StatusCode::OK {
            return Err(self.rejection(res).await);
        }
        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// Build the rejection error for a non-200 response, degrading to a
    /// generic message when the error body itself cannot be decoded.
    pub(crate) async fn rejection(&self, res: reqwest::Response) -> ClientError {
        let status = res.status();
        let payload = res
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<ErrorResponse>(&bytes).ok());
        match payload {
            Some(payload) if !payload.description.is_empty() => {
                error!(status = %status, code = %payload.error_code, description = %payload.description, "cluster rejected the request");
                ClientError::RemoteRejected(payload.description)
            }
            _ => {
                error!(status = %status, "cluster rejected the request with an undecodable error body");
                ClientError::RemoteRejected("an unknown server error occurred".to_string())
            }
        }
    }
}
