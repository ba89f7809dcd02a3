// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # WebSocket Token Admission (sutra)
//!
//! Upgrade requests cannot carry the usual identity headers from a browser, so
//! agents present a token instead (query string or first frame, as the host
//! decides). [`WebSocketAuth`] turns that token into an [`AgentIdentity`].
//!
//! | Token | Validator | Result |
//! |-------|-----------|--------|
//! | absent | any | `TokenRequired` |
//! | present | none configured | `Ok(None)` (pass through) |
//! | present | returns `None` | `InvalidToken` |
//! | present | returns identity | `Ok(Some(identity))` |

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::agent::AgentIdentity;
use crate::domain::layer::Layer;

/// Resolves a bearer token to the agent it belongs to.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Option<AgentIdentity>;
}

impl<F> TokenValidator for F
where
    F: Fn(&str) -> Option<AgentIdentity> + Send + Sync,
{
    fn validate(&self, token: &str) -> Option<AgentIdentity> {
        self(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebSocketAuthError {
    #[error("WebSocket token required")]
    TokenRequired,
    #[error("Invalid WebSocket token")]
    InvalidToken,
}

impl WebSocketAuthError {
    pub fn layer(&self) -> Layer {
        Layer::Sutra
    }
}

#[derive(Clone, Default)]
pub struct WebSocketAuth {
    validator: Option<Arc<dyn TokenValidator>>,
}

impl WebSocketAuth {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator: Some(validator),
        }
    }

    /// No validator: any non-empty token is accepted without an identity.
    pub fn pass_through() -> Self {
        Self::default()
    }

    pub fn authenticate(
        &self,
        token: Option<&str>,
    ) -> Result<Option<AgentIdentity>, WebSocketAuthError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            warn!("WebSocket connection attempted without token");
            return Err(WebSocketAuthError::TokenRequired);
        };
        let Some(validator) = &self.validator else {
            return Ok(None);
        };
        match validator.validate(token) {
            Some(identity) => {
                debug!(agent = %identity, "WebSocket token accepted");
                Ok(Some(identity))
            }
            None => {
                warn!("WebSocket connection rejected: invalid token");
                Err(WebSocketAuthError::InvalidToken)
            }
        }
    }
}

impl std::fmt::Debug for WebSocketAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketAuth")
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
