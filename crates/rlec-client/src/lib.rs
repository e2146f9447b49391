// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Client for the Redis Labs Enterprise Cluster (RLEC) management REST API.
//!
//! This crate wraps the cluster's `/v1` endpoints with typed operations for
//! creating, inspecting, updating, and deleting databases, including
//! conflict-free replicated databases (CRDBs) that span multiple peer
//! clusters.
//!
//! Database creation is asynchronous on the cluster side: the cluster
//! acknowledges the request immediately and activates the database later.
//! [`ApiClient::create_database`] therefore returns a single-shot channel
//! instead of credentials; a background task polls the cluster and delivers
//! the credentials once the database reports `active`. Dropping the receiver
//! cancels the poller.
//!
//! # Example
//!
//! ```no_run
//! use rlec_client::{ApiClient, ClientConfig};
//! use serde_json::{Map, json};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ClientConfig::new(
//!     "cluster.local:9443",
//!     "admin@example.com",
//!     "secret",
//! ))?;
//!
//! let mut settings = Map::new();
//! settings.insert("name".into(), json!("demo"));
//! settings.insert("memory_size".into(), json!(1024));
//!
//! let readiness = client.create_database(settings).await?;
//! let credentials = readiness.await?;
//! println!("redis at {}:{}", credentials.host, credentials.port);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod crdb;
mod error;
mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use types::{CrdbTaskError, CrdbTaskStatus, DatabaseId, InstanceCredentials, PeerCluster};
