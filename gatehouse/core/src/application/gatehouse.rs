// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Gatehouse Facade
//!
//! Single owner of the activated layers. A host builds one [`Gatehouse`] from a
//! [`GatehouseConfig`], activates the layers it wants, then hands the resulting
//! `Arc`s to its middleware and guards. Nothing is looked up from process-wide
//! state: every guard and middleware instance receives its engine explicitly.
//!
//! ```text
//! let mut gatehouse = Gatehouse::new(config);
//! gatehouse.activate_gateway()?;
//! gatehouse.activate_permissions();
//! let app = gatehouse.protect(router);      // presentation::middleware
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::application::gateway::GatewayPipeline;
use crate::application::policy::PolicyEngine;
use crate::domain::config::GatehouseConfig;
use crate::domain::layer::{Layer, LayerStatus};
use crate::domain::rate_limit::RateLimitBackend;
use crate::domain::role::RoleRegistry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Snapshot of which layers are active, served by `GET /gatehouse/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub version: String,
    pub layers: BTreeMap<String, LayerStatus>,
    pub active_count: usize,
    pub total_layers: usize,
}

#[derive(Debug)]
pub struct Gatehouse {
    config: GatehouseConfig,
    gateway: Option<Arc<GatewayPipeline>>,
    policy: Option<Arc<PolicyEngine>>,
}

impl Gatehouse {
    pub fn new(config: GatehouseConfig) -> Self {
        Self {
            config,
            gateway: None,
            policy: None,
        }
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.config
    }

    /// Activate the sutra layer over an in-memory rate-limit backend.
    pub fn activate_gateway(&mut self) -> anyhow::Result<Arc<GatewayPipeline>> {
        let pipeline = GatewayPipeline::from_config(&self.config)?;
        Ok(self.install_gateway(pipeline))
    }

    /// Activate the sutra layer over a caller-supplied backend.
    pub fn activate_gateway_with_backend(
        &mut self,
        backend: Arc<dyn RateLimitBackend>,
    ) -> anyhow::Result<Arc<GatewayPipeline>> {
        let pipeline = GatewayPipeline::with_backend(&self.config, backend)?;
        Ok(self.install_gateway(pipeline))
    }

    fn install_gateway(&mut self, pipeline: GatewayPipeline) -> Arc<GatewayPipeline> {
        let gateway = &self.config.gateway;
        info!(
            allowed_origins = ?gateway.allowed_origins,
            rate_limit_per_ip = gateway.rate_limit_per_ip,
            rate_limit_per_agent = gateway.rate_limit_per_agent,
            window_seconds = gateway.rate_limit_window_seconds,
            tls_enforce = gateway.tls_enforce,
            "Gateway layer activated"
        );
        let pipeline = Arc::new(pipeline);
        self.gateway = Some(Arc::clone(&pipeline));
        pipeline
    }

    /// Activate the dharma layer over the built-in roles.
    pub fn activate_permissions(&mut self) -> Arc<PolicyEngine> {
        self.activate_permissions_with(RoleRegistry::new())
    }

    pub fn activate_permissions_with(&mut self, registry: RoleRegistry) -> Arc<PolicyEngine> {
        let engine = Arc::new(PolicyEngine::with_registry(
            registry,
            self.config.permissions.clone(),
        ));
        info!(
            roles = engine.role_count(),
            default_deny = engine.default_deny(),
            "Permission layer activated"
        );
        self.policy = Some(Arc::clone(&engine));
        engine
    }

    pub fn gateway(&self) -> Option<&Arc<GatewayPipeline>> {
        self.gateway.as_ref()
    }

    pub fn policy(&self) -> Option<&Arc<PolicyEngine>> {
        self.policy.as_ref()
    }

    pub fn status(&self) -> StatusReport {
        let layers: BTreeMap<String, LayerStatus> = Layer::ALL
            .into_iter()
            .map(|layer| (layer.as_str().to_string(), self.layer_status(layer)))
            .collect();
        let active_count = layers.values().filter(|s| s.active).count();
        StatusReport {
            version: VERSION.to_string(),
            active_count,
            total_layers: layers.len(),
            layers,
        }
    }

    fn layer_status(&self, layer: Layer) -> LayerStatus {
        match layer {
            Layer::Sutra => match &self.gateway {
                Some(pipeline) => {
                    let settings = pipeline.settings();
                    LayerStatus::active(
                        layer,
                        VERSION,
                        format!(
                            "Gateway: {} req/{}s per IP",
                            settings.rate_limit_per_ip, settings.rate_limit_window_seconds
                        ),
                    )
                }
                None => LayerStatus::inactive(layer, VERSION),
            },
            Layer::Dharma => match &self.policy {
                Some(engine) => LayerStatus::active(
                    layer,
                    VERSION,
                    format!(
                        "Permissions: {} roles, default-deny={}",
                        engine.role_count(),
                        engine.default_deny()
                    ),
                ),
                None => LayerStatus::inactive(layer, VERSION),
            },
            _ => LayerStatus::inactive(layer, VERSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_before_activation() {
        let status = Gatehouse::new(GatehouseConfig::default()).status();
        assert_eq!(status.total_layers, 8);
        assert_eq!(status.active_count, 0);
        assert!(status.layers.values().all(|l| !l.active));
        assert_eq!(status.version, VERSION);
    }

    #[test]
    fn test_status_after_activation() {
        let mut gatehouse = Gatehouse::new(GatehouseConfig::default());
        gatehouse.activate_gateway().unwrap();
        gatehouse.activate_permissions();

        let status = gatehouse.status();
        assert_eq!(status.active_count, 2);
        assert_eq!(status.layers["sutra"].detail, "Gateway: 100 req/60s per IP");
        assert_eq!(
            status.layers["dharma"].detail,
            "Permissions: 7 roles, default-deny=true"
        );
        assert!(!status.layers["nirvana"].active);
    }

    #[test]
    fn test_activation_fails_on_bad_origin_pattern() {
        let mut config = GatehouseConfig::default();
        config.gateway.allowed_origins = vec!["https://[oops".into()];
        let mut gatehouse = Gatehouse::new(config);
        assert!(gatehouse.activate_gateway().is_err());
        assert!(gatehouse.gateway().is_none());
    }

    #[test]
    fn test_activation_fails_on_zero_window() {
        let mut config = GatehouseConfig::default();
        config.gateway.rate_limit_per_ip = 1;
        config.gateway.rate_limit_window_seconds = 0;
        let mut gatehouse = Gatehouse::new(config);
        assert!(gatehouse.activate_gateway().is_err());
        assert!(gatehouse.gateway().is_none());
        assert!(!gatehouse.status().layers["sutra"].active);
    }

    #[test]
    fn test_status_serializes() {
        let json = serde_json::to_value(Gatehouse::new(GatehouseConfig::default()).status()).unwrap();
        assert_eq!(json["total_layers"], 8);
        assert_eq!(json["layers"]["karma"]["active"], false);
    }
}
