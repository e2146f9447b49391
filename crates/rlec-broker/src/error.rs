// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for broker operations.

use thiserror::Error;

use crate::persistence::PersistenceError;

/// Result type using BrokerError.
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Errors the broker surfaces to the platform adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrokerError {
    /// Requested service id is not the one this broker offers.
    #[error("the requested service does not exist")]
    ServiceDoesNotExist,

    /// Requested plan id is not configured.
    #[error("the requested plan does not exist")]
    PlanDoesNotExist,

    /// Instance id is not present in the broker state.
    #[error("the service instance does not exist")]
    InstanceDoesNotExist,

    /// An instance with this id has already been provisioned.
    #[error("the service instance already exists")]
    InstanceAlreadyExists,

    /// A cluster API call failed.
    #[error(transparent)]
    Client(#[from] rlec_client::ClientError),

    /// Broker state could not be loaded or saved.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
