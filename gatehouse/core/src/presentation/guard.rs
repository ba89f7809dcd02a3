// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Permission Guards (axum)
//!
//! Two equivalent ways to gate a handler on [`PolicyEngine`] resolution, both
//! reading the agent id and agent type headers named in
//! [`PermissionSettings`](crate::domain::config::PermissionSettings):
//!
//! | Form | Use |
//! |------|-----|
//! | [`AgentContext`] extractor | `async fn h(ctx: AgentContext) -> Result<_, PermissionDenied> { ctx.require(P)?; .. }` |
//! | [`RequirePermissionLayer`] | `.route_layer(guard.layer([P, Q]))` on a router or method router |
//!
//! A request missing either header is first-party traffic and passes unchecked.
//! With both present, every required permission must resolve to allow; the
//! first one that does not produces [`PermissionDenied`], rendered as a 403
//! with layer `dharma`.

use axum::extract::{FromRef, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

use crate::application::policy::PolicyEngine;
use crate::domain::agent::AgentIdentity;
use crate::domain::permission::{Permission, PermissionSet};
use crate::domain::violation::PermissionDenied;

/// Reads agent identity headers and resolves permissions against an engine.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    engine: Arc<PolicyEngine>,
    agent_header: HeaderName,
    agent_type_header: HeaderName,
}

impl PermissionGuard {
    /// Guard using the header names from the engine's settings.
    pub fn new(engine: Arc<PolicyEngine>) -> anyhow::Result<Self> {
        let settings = engine.settings();
        let agent_header = HeaderName::from_bytes(settings.agent_header.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid agent header '{}': {}", settings.agent_header, e))?;
        let agent_type_header = HeaderName::from_bytes(settings.agent_type_header.as_bytes())
            .map_err(|e| {
                anyhow::anyhow!(
                    "invalid agent type header '{}': {}",
                    settings.agent_type_header,
                    e
                )
            })?;
        Ok(Self {
            engine,
            agent_header,
            agent_type_header,
        })
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// The asserted agent, if both identity headers carry a non-empty value.
    pub fn identity(&self, headers: &HeaderMap) -> Option<AgentIdentity> {
        let read = |name: &HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        };
        let agent_id = read(&self.agent_header)?;
        let agent_type = read(&self.agent_type_header)?;
        Some(AgentIdentity::new(agent_id, agent_type))
    }

    pub fn authorize(
        &self,
        headers: &HeaderMap,
        permission: Permission,
    ) -> Result<Option<AgentIdentity>, PermissionDenied> {
        self.authorize_all(headers, &[permission])
    }

    /// Check every permission in order. `Ok(None)` for non-agent traffic.
    pub fn authorize_all(
        &self,
        headers: &HeaderMap,
        permissions: &[Permission],
    ) -> Result<Option<AgentIdentity>, PermissionDenied> {
        let Some(identity) = self.identity(headers) else {
            debug!("No agent identity headers; passing through");
            return Ok(None);
        };
        self.engine
            .require_all(&identity.agent_id, &identity.agent_type, permissions)?;
        Ok(Some(identity))
    }

    /// Route decorator requiring all of `permissions`.
    pub fn layer<I>(&self, permissions: I) -> RequirePermissionLayer
    where
        I: IntoIterator<Item = Permission>,
    {
        RequirePermissionLayer {
            guard: Arc::new(self.clone()),
            permissions: permissions.into_iter().collect(),
        }
    }
}

// ── Extractor ──

/// Request-scoped view of the calling agent.
///
/// Resolves `Arc<PermissionGuard>` from router state; never rejects by itself.
#[derive(Debug, Clone)]
pub struct AgentContext {
    guard: Arc<PermissionGuard>,
    identity: Option<AgentIdentity>,
}

impl AgentContext {
    pub fn identity(&self) -> Option<&AgentIdentity> {
        self.identity.as_ref()
    }

    pub fn is_agent(&self) -> bool {
        self.identity.is_some()
    }

    /// Passes for non-agent traffic.
    pub fn require(&self, permission: Permission) -> Result<(), PermissionDenied> {
        self.require_all(&[permission])
    }

    pub fn require_all(&self, permissions: &[Permission]) -> Result<(), PermissionDenied> {
        match &self.identity {
            Some(identity) => {
                self.guard
                    .engine
                    .require_all(&identity.agent_id, &identity.agent_type, permissions)
            }
            None => Ok(()),
        }
    }

    /// The calling agent with its effective permission set; `None` for non-agent traffic.
    pub fn effective_permissions(&self) -> Option<(&AgentIdentity, PermissionSet)> {
        let identity = self.identity.as_ref()?;
        let permissions = self
            .guard
            .engine
            .get_effective_permissions(&identity.agent_id, &identity.agent_type);
        Some((identity, permissions))
    }
}

impl<S> FromRequestParts<S> for AgentContext
where
    Arc<PermissionGuard>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = Arc::<PermissionGuard>::from_ref(state);
        let identity = guard.identity(&parts.headers);
        Ok(Self { guard, identity })
    }
}

// ── Route layer ──

#[derive(Debug, Clone)]
pub struct RequirePermissionLayer {
    guard: Arc<PermissionGuard>,
    permissions: Arc<[Permission]>,
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermission<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermission {
            inner,
            guard: Arc::clone(&self.guard),
            permissions: Arc::clone(&self.permissions),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequirePermission<S> {
    inner: S,
    guard: Arc<PermissionGuard>,
    permissions: Arc<[Permission]>,
}

impl<S> Service<Request> for RequirePermission<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        if let Err(denied) = self.guard.authorize_all(request.headers(), &self.permissions) {
            return Box::pin(async move { Ok(denied.into_response()) });
        }
        // The readied service goes with this call; a fresh clone takes its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}
