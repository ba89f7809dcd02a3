// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`gatehouse-core`)
//!
//! Value objects, error taxonomy, configuration and capability traits. Nothing
//! here performs I/O or holds shared mutable state.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`permission`] | `Permission` catalog, `PermissionSet` |
//! | [`role`] | `Role`, built-in roles, `RoleRegistry` |
//! | [`agent`] | `AgentIdentity` |
//! | [`violation`] | `GatewayViolation`, `PermissionDenied` |
//! | [`layer`] | `Layer` identifiers, `LayerStatus` |
//! | [`rate_limit`] | `RateLimitBackend` capability |
//! | [`config`] | `GatehouseConfig` |
//! | [`layer_contracts`] | Interfaces for the unimplemented layers |

pub mod agent;
pub mod config;
pub mod layer;
pub mod layer_contracts;
pub mod permission;
pub mod rate_limit;
pub mod role;
pub mod violation;

pub use agent::AgentIdentity;
pub use config::{GatehouseConfig, GatewaySettings, PermissionSettings};
pub use layer::{Layer, LayerStatus};
pub use permission::{Permission, PermissionSet, UnknownPermission};
pub use rate_limit::{RateLimitBackend, RateLimitOutcome};
pub use role::{Role, RoleRegistry};
pub use violation::{GatewayViolation, PermissionDenied, RateLimitScope};
