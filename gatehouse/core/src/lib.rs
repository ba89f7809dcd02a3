// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # gatehouse-core
//!
//! Inline request admission for agent traffic. Two layers carry an
//! implementation:
//!
//! - **sutra** (gateway): transport security, origin allow-list, per-IP and
//!   per-agent sliding-window rate limits, applied as axum middleware.
//! - **dharma** (permissions): four-tier permission resolution over roles,
//!   per-agent grants and denials, applied as an extractor or route layer.
//!
//! The remaining six layers are trait contracts only
//! ([`domain::layer_contracts`]).
//!
//! ## Layout
//!
//! | Layer | Path |
//! |-------|------|
//! | Domain | [`domain`] |
//! | Application | [`application`] |
//! | Infrastructure | [`infrastructure`] |
//! | Presentation | [`presentation`] |

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::{Gatehouse, GatewayPipeline, PolicyEngine};
pub use domain::{GatehouseConfig, Permission, PermissionSet, Role, RoleRegistry};
pub use presentation::{AgentContext, PermissionGuard};
