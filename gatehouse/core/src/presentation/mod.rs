// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (axum binding)
//!
//! | Module | Hook |
//! |--------|------|
//! | [`middleware`] | `enforce_gateway` middleware, `Gatehouse::protect` |
//! | [`guard`] | `PermissionGuard`, `AgentContext` extractor, `RequirePermissionLayer` |
//! | [`response`] | `IntoResponse` for every decision error |
//! | [`api`] | `GET /gatehouse/status` |

pub mod api;
pub mod guard;
pub mod middleware;
pub mod response;

pub use guard::{AgentContext, PermissionGuard, RequirePermission, RequirePermissionLayer};
pub use middleware::enforce_gateway;
pub use response::{
    ErrorBody, AGENT_RATE_REMAINING_HEADER, GATEWAY_MARKER_HEADER, RATE_REMAINING_HEADER,
};
