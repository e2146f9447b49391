// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the cluster API client.

use std::time::Duration;

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Cluster API address, either `host:port` or a full `http(s)://` URL.
    /// A bare `host:port` is reached over HTTPS.
    pub address: String,
    /// HTTP basic-auth username sent on every request.
    pub username: String,
    /// HTTP basic-auth password sent on every request.
    pub password: String,
    /// Accept self-signed cluster certificates (common on RLEC
    /// installations).
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Delay between readiness probes while waiting for a database to
    /// activate.
    pub polling_interval: Duration,
    /// Upper bound on readiness polling. `None` polls until the database
    /// activates, matching the cluster's own lack of a deadline.
    pub polling_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9443".to_string(),
            username: String::new(),
            password: String::new(),
            accept_invalid_certs: false,
            request_timeout: Duration::from_secs(30),
            polling_interval: Duration::from_millis(500),
            polling_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given cluster address and
    /// credentials.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Enable or disable certificate verification skipping.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the delay between readiness probes.
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Bound readiness polling to the given duration.
    pub fn with_polling_timeout(mut self, timeout: Duration) -> Self {
        self.polling_timeout = Some(timeout);
        self
    }

    pub(crate) fn base_url(&self) -> String {
        if self.address.starts_with("http://") || self.address.starts_with("https://") {
            self.address.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.address)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.polling_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.polling_timeout.is_none());
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::new("cluster.local:9443", "admin", "secret")
            .with_accept_invalid_certs(true)
            .with_request_timeout(Duration::from_secs(5))
            .with_polling_interval(Duration::from_millis(100))
            .with_polling_timeout(Duration::from_secs(60));

        assert_eq!(config.address, "cluster.local:9443");
        assert_eq!(config.username, "admin");
        assert!(config.accept_invalid_certs);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.polling_interval, Duration::from_millis(100));
        assert_eq!(config.polling_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_base_url_prefixes_bare_addresses() {
        let config = ClientConfig::new("cluster.local:9443", "", "");
        assert_eq!(config.base_url(), "https://cluster.local:9443");
    }

    #[test]
    fn test_base_url_keeps_explicit_schemes() {
        let config = ClientConfig::new("http://127.0.0.1:8080/", "", "");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }
}
