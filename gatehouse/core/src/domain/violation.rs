// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Decision Errors
//!
//! One error kind per decision point. None of these represent a bug: each is an
//! expected, final outcome for the request that produced it, caught at the
//! gateway middleware or permission guard and turned into an HTTP response by
//! [`crate::presentation::response`].
//!
//! | Error | Layer | HTTP |
//! |-------|-------|------|
//! | [`GatewayViolation::TransportInsecure`] | sutra | 403 |
//! | [`GatewayViolation::OriginDenied`] | sutra | 403 |
//! | [`GatewayViolation::RateLimitExceeded`] | sutra | 429 + `Retry-After` |
//! | [`PermissionDenied`] | dharma | 403 |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layer::Layer;
use super::permission::Permission;

/// Which limiter rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    Ip,
    Agent,
}

impl RateLimitScope {
    fn message(&self) -> &'static str {
        match self {
            RateLimitScope::Ip => "Rate limit exceeded",
            RateLimitScope::Agent => "Agent rate limit exceeded",
        }
    }
}

/// A rejection produced by the gateway pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayViolation {
    #[error("HTTPS required")]
    TransportInsecure,

    #[error("Origin not allowed: {origin}")]
    OriginDenied { origin: String },

    #[error("{}", .scope.message())]
    RateLimitExceeded {
        scope: RateLimitScope,
        /// Seconds the caller should wait; equals the rejecting limiter's window.
        retry_after_secs: u64,
    },
}

impl GatewayViolation {
    pub fn layer(&self) -> Layer {
        Layer::Sutra
    }

    /// Machine-readable reason, used for metrics labels and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayViolation::TransportInsecure => "transport_insecure",
            GatewayViolation::OriginDenied { .. } => "origin_denied",
            GatewayViolation::RateLimitExceeded {
                scope: RateLimitScope::Ip,
                ..
            } => "ip_rate_limited",
            GatewayViolation::RateLimitExceeded {
                scope: RateLimitScope::Agent,
                ..
            } => "agent_rate_limited",
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GatewayViolation::RateLimitExceeded {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// An agent lacks a permission it needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Agent {agent_id} ({agent_type}) lacks permission: {permission}")]
pub struct PermissionDenied {
    pub agent_id: String,
    pub agent_type: String,
    pub permission: Permission,
}

impl PermissionDenied {
    pub fn layer(&self) -> Layer {
        Layer::Dharma
    }
}
