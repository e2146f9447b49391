// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Platform-facing request and response value types.
//!
//! These are the shapes the broker contract exchanges with the platform;
//! the HTTP adapter serializing them lives outside this crate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Service descriptor advertised through the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    /// Service id.
    pub id: String,
    /// Service name.
    pub name: String,
    /// Service description.
    pub description: String,
    /// Whether instances of this service can be bound.
    pub bindable: bool,
    /// Catalog tags.
    pub tags: Vec<String>,
    /// Whether instances can move between plans.
    #[serde(rename = "plan_updateable")]
    pub plan_updatable: bool,
    /// The plans on offer.
    pub plans: Vec<ServicePlan>,
    /// Presentation metadata.
    pub metadata: ServiceCatalogMetadata,
}

/// One plan entry in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ServicePlan {
    /// Plan id.
    pub id: String,
    /// Plan name.
    pub name: String,
    /// Plan description.
    pub description: String,
    /// Presentation metadata.
    pub metadata: PlanCatalogMetadata,
}

/// Presentation metadata for the service entry.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCatalogMetadata {
    /// Display name shown in marketplaces.
    pub display_name: String,
    /// Logo image.
    pub image_url: String,
    /// Provider display name.
    pub provider_display_name: String,
}

/// Presentation metadata for a plan entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanCatalogMetadata {
    /// Feature bullet points.
    pub bullets: Vec<String>,
}

/// A provisioning request forwarded by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionDetails {
    /// Requested service id.
    pub service_id: String,
    /// Requested plan id.
    pub plan_id: String,
    /// Organization the instance is provisioned for.
    #[serde(default)]
    pub organization_guid: String,
    /// Space the instance is provisioned for.
    #[serde(default)]
    pub space_guid: String,
    /// Free-form user parameters overlaid on the plan defaults.
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
}

/// An update request forwarded by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDetails {
    /// Requested service id.
    pub service_id: String,
    /// New plan, when the update moves the instance between plans.
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Free-form user parameters overlaid on the effective plan defaults.
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
}

/// A bind request forwarded by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindDetails {
    /// Requested service id.
    #[serde(default)]
    pub service_id: String,
    /// Requested plan id.
    #[serde(default)]
    pub plan_id: String,
    /// Application the credentials are for.
    #[serde(default)]
    pub app_guid: String,
}

/// A deprovision request forwarded by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeprovisionDetails {
    /// Requested service id.
    #[serde(default)]
    pub service_id: String,
    /// Requested plan id.
    #[serde(default)]
    pub plan_id: String,
}

/// Connection credentials handed to a bound application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    /// Hostname applications connect to.
    pub host: String,
    /// Port applications connect to.
    pub port: u16,
    /// Endpoint IP addresses.
    pub ip_list: Vec<String>,
    /// Redis authentication password.
    pub password: String,
}
