// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Service broker core for Redis Labs Enterprise Cluster databases.
//!
//! This crate mediates between a platform control plane and an RLEC
//! cluster: it translates provision, bind, update, and deprovision requests
//! into cluster REST calls via [`rlec_client`], waits for asynchronous
//! database readiness, and persists the mapping between platform instance
//! ids and cluster databases together with connection credentials.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Platform control plane                    │
//! │            (catalog / provision / bind / update)             │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   rlec-broker (this crate)                   │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────────────┐  │
//! │  │   Plans    │  │  Settings  │  │     ServiceBroker      │  │
//! │  │  (config)  │  │ translator │  │     (orchestrator)     │  │
//! │  └────────────┘  └────────────┘  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!           │                                     │
//!           ▼                                     ▼
//! ┌───────────────────┐              ┌───────────────────────────┐
//! │    State file     │              │  RLEC cluster REST API    │
//! │   (state.json)    │              │       (rlec-client)       │
//! └───────────────────┘              └───────────────────────────┘
//! ```
//!
//! The platform-facing HTTP surface is not part of this crate; an adapter
//! maps [`broker::ServiceBroker`] results onto broker-contract HTTP status
//! codes.
//!
//! # Modules
//!
//! - [`broker`]: the orchestrator implementing the broker contract
//! - [`catalog`]: platform-facing request and response value types
//! - [`config`]: YAML broker configuration (cluster, service, plans, peers)
//! - [`error`]: the broker error taxonomy
//! - [`persistence`]: durable instance-to-credentials state
//! - [`settings`]: plan template and parameter translation

#![deny(missing_docs)]

/// The orchestrator implementing the broker contract.
pub mod broker;

/// Platform-facing request and response value types.
pub mod catalog;

/// YAML broker configuration.
pub mod config;

/// Error types for broker operations.
pub mod error;

/// Durable instance-to-credentials state.
pub mod persistence;

/// Plan template and parameter translation.
pub mod settings;

pub use broker::ServiceBroker;
pub use config::Config;
pub use error::{BrokerError, Result};
