// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for rlec-client.

use thiserror::Error;

/// Result type using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the cluster API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Cluster returned a non-200 response; the message is the
    /// cluster-supplied description.
    #[error("cluster rejected the request: {0}")]
    RemoteRejected(String),

    /// HTTP transport failure.
    #[error("cluster unreachable: {0}")]
    RemoteUnreachable(#[from] reqwest::Error),

    /// Response body could not be decoded or lacks required fields.
    #[error("malformed cluster response: {0}")]
    MalformedResponse(String),

    /// Database exists but has not reached the active state yet.
    #[error("database is not active yet")]
    NotActive,

    /// A request payload could not be built from the given settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The readiness poller stopped before the database became active.
    #[error("timed out waiting for the database to become active")]
    PollingTimedOut,
}
