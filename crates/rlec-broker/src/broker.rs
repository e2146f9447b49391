// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The broker orchestrator.
//!
//! [`ServiceBroker`] implements the platform-facing contract: catalog,
//! provision, bind, unbind, update, deprovision. It validates requests
//! against the configuration and the persisted state, drives the cluster
//! through [`rlec_client::ApiClient`], and commits state only after the
//! cluster reports a database active.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use rlec_client::{ApiClient, ClientConfig, ClientError, DatabaseId, InstanceCredentials};

use crate::catalog::{
    BindDetails, Binding, DeprovisionDetails, PlanCatalogMetadata, ProvisionDetails, Service,
    ServiceCatalogMetadata, ServicePlan, UpdateDetails,
};
use crate::config::Config;
use crate::error::{BrokerError, Result};
use crate::persistence::{ServiceInstance, StatePersister};
use crate::settings::DatabaseSettings;

/// Catalog tag attached to the offered service.
const SERVICE_TAG: &str = "redislabs";

/// The broker contract surface.
///
/// One broker serves one cluster and one service descriptor. Instances may
/// be used concurrently; every state-file mutation happens under a
/// process-wide lock, so running two broker processes against the same
/// state file is unsupported.
pub struct ServiceBroker {
    config: Config,
    client: ApiClient,
    persister: Arc<dyn StatePersister>,
    // Serializes every load-modify-save of the state file.
    state_lock: Mutex<()>,
}

impl ServiceBroker {
    /// Create a broker from its parts.
    pub fn new(config: Config, client: ApiClient, persister: Arc<dyn StatePersister>) -> Self {
        Self {
            config,
            client,
            persister,
            state_lock: Mutex::new(()),
        }
    }

    /// Create a broker whose API client is derived from the configuration.
    pub fn from_config(
        config: Config,
        persister: Arc<dyn StatePersister>,
    ) -> rlec_client::Result<Self> {
        let client = ApiClient::new(ClientConfig::new(
            &config.cluster.address,
            &config.cluster.auth.username,
            &config.cluster.auth.password,
        ))?;
        Ok(Self::new(config, client, persister))
    }

    /// The service catalog offered to the platform.
    pub fn services(&self) -> Vec<Service> {
        let broker = &self.config.broker;
        vec![Service {
            id: broker.service_id.clone(),
            name: broker.name.clone(),
            description: broker.description.clone(),
            bindable: true,
            tags: vec![SERVICE_TAG.to_string()],
            plan_updatable: true,
            plans: broker
                .plans
                .iter()
                .map(|plan| ServicePlan {
                    id: plan.id.clone(),
                    name: plan.name.clone(),
                    description: plan.description.clone(),
                    metadata: PlanCatalogMetadata {
                        bullets: plan.metadata.bullets.clone(),
                    },
                })
                .collect(),
            metadata: ServiceCatalogMetadata {
                display_name: broker.metadata.display_name.clone(),
                image_url: broker.metadata.image.clone(),
                provider_display_name: broker.metadata.provider_display_name.clone(),
            },
        }]
    }

    /// Provision a new database instance.
    ///
    /// Blocks until the cluster reports the database active; credentials
    /// are persisted only after that point. Provisioning an id that
    /// already exists fails with
    /// [`BrokerError::InstanceAlreadyExists`].
    pub async fn provision(&self, instance_id: &str, details: ProvisionDetails) -> Result<()> {
        if details.service_id != self.config.broker.service_id {
            return Err(BrokerError::ServiceDoesNotExist);
        }
        let plan = self
            .config
            .plan(&details.plan_id)
            .ok_or(BrokerError::PlanDoesNotExist)?;

        {
            let _guard = self.state_lock.lock().await;
            let state = self.persister.load().await?;
            if state.contains(instance_id) {
                return Err(BrokerError::InstanceAlreadyExists);
            }
        }

        let parameters = details.parameters.unwrap_or_default();
        let settings = DatabaseSettings::from_plan(&plan.settings).apply_parameters(&parameters);

        info!(
            instance_id,
            plan_id = %details.plan_id,
            crdb = settings.is_crdb(),
            "provisioning instance"
        );

        let readiness = if settings.is_crdb() {
            self.client
                .create_crdb(settings.into_map(), &self.config.peer_clusters())
                .await?
        } else {
            self.client.create_database(settings.into_map()).await?
        };

        let credentials = readiness
            .await
            .map_err(|_| ClientError::PollingTimedOut)?;

        self.commit_instance(instance_id, &details.plan_id, credentials)
            .await
    }

    /// Return the credentials of a provisioned instance.
    pub async fn bind(
        &self,
        instance_id: &str,
        binding_id: &str,
        _details: BindDetails,
    ) -> Result<Binding> {
        let state = self.persister.load().await?;
        let instance = state
            .instance(instance_id)
            .ok_or(BrokerError::InstanceDoesNotExist)?;

        let credentials = &instance.credentials;
        let host = self.resolve_host(credentials).await;
        info!(instance_id, binding_id, "returning instance credentials");
        Ok(Binding {
            host,
            port: credentials.port,
            ip_list: credentials.ip_list.clone(),
            password: credentials.password.clone(),
        })
    }

    /// Release a binding. Credentials are not per-binding, so there is
    /// nothing to revoke.
    pub async fn unbind(&self, _instance_id: &str, _binding_id: &str) -> Result<()> {
        Ok(())
    }

    /// Apply new settings to a provisioned instance.
    ///
    /// When `plan_id` is supplied the new plan's defaults are the base;
    /// otherwise the instance's recorded plan is. User parameters overlay
    /// either base. The cluster applies the change asynchronously.
    pub async fn update(&self, instance_id: &str, details: UpdateDetails) -> Result<()> {
        if details.service_id != self.config.broker.service_id {
            return Err(BrokerError::ServiceDoesNotExist);
        }

        let state = self.persister.load().await?;
        let instance = state
            .instance(instance_id)
            .ok_or(BrokerError::InstanceDoesNotExist)?;

        let plan_id = details.plan_id.as_deref().unwrap_or(&instance.plan_id);
        let plan = self.config.plan(plan_id).ok_or(BrokerError::PlanDoesNotExist)?;

        let parameters = details.parameters.unwrap_or_default();
        let settings = DatabaseSettings::from_plan(&plan.settings).apply_parameters(&parameters);

        info!(instance_id, plan_id = %plan_id, "updating instance");
        self.client
            .update_database(&instance.credentials.uid, settings.into_map())
            .await?;
        Ok(())
    }

    /// Remove a provisioned instance.
    ///
    /// The cluster-side removal is fire-and-forget; the record is dropped
    /// once the cluster accepts the request.
    pub async fn deprovision(
        &self,
        instance_id: &str,
        _details: DeprovisionDetails,
    ) -> Result<()> {
        let _guard = self.state_lock.lock().await;
        let mut state = self.persister.load().await?;
        let instance = state
            .remove(instance_id)
            .ok_or(BrokerError::InstanceDoesNotExist)?;

        self.client.delete_database(&instance.credentials.uid).await?;
        self.persister.save(&state).await?;
        info!(instance_id, "instance deprovisioned");
        Ok(())
    }

    /// Append a freshly activated instance to the state under the lock.
    async fn commit_instance(
        &self,
        instance_id: &str,
        plan_id: &str,
        credentials: InstanceCredentials,
    ) -> Result<()> {
        let _guard = self.state_lock.lock().await;
        let mut state = self.persister.load().await?;
        // Re-validated under the lock: a concurrent provision of the same
        // id may have committed while this one was polling.
        if state.contains(instance_id) {
            return Err(BrokerError::InstanceAlreadyExists);
        }
        state.available_instances.push(ServiceInstance {
            id: instance_id.to_string(),
            plan_id: plan_id.to_string(),
            credentials,
        });
        self.persister.save(&state).await?;
        info!(instance_id, "instance provisioned");
        Ok(())
    }

    /// Records written before hosts were persisted carry an empty host;
    /// recover it from the cluster.
    async fn resolve_host(&self, credentials: &InstanceCredentials) -> String {
        if !credentials.host.is_empty() {
            return credentials.host.clone();
        }
        let DatabaseId::Bdb(uid) = &credentials.uid else {
            return String::new();
        };
        match self.client.get_database(*uid).await {
            Ok(fresh) => fresh.host,
            Err(err) => {
                error!(uid = *uid, error = %err, "failed to recover instance host from the cluster");
                String::new()
            }
        }
    }
}
