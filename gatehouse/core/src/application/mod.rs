// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Layer (`gatehouse-core`)
//!
//! Decision services built from domain types. Everything here is synchronous
//! and I/O free; the HTTP binding lives in [`crate::presentation`].
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`origin`] | sutra | `OriginValidator` |
//! | [`transport`] | sutra | `TransportSecurityChecker` |
//! | [`rate_limiter`] | sutra | `SlidingWindowLimiter` |
//! | [`gateway`] | sutra | `GatewayPipeline`, `RequestFacts` |
//! | [`websocket_auth`] | sutra | `WebSocketAuth`, `TokenValidator` |
//! | [`policy`] | dharma | `PolicyEngine` |
//! | [`gatehouse`] | both | `Gatehouse` facade, `StatusReport` |

pub mod gatehouse;
pub mod gateway;
pub mod origin;
pub mod policy;
pub mod rate_limiter;
pub mod transport;
pub mod websocket_auth;

pub use gatehouse::{Gatehouse, StatusReport};
pub use gateway::{Admission, GatewayDecision, GatewayPipeline, RequestFacts};
pub use origin::OriginValidator;
pub use policy::{PolicyEngine, Resolution};
pub use rate_limiter::SlidingWindowLimiter;
pub use transport::TransportSecurityChecker;
pub use websocket_auth::{TokenValidator, WebSocketAuth, WebSocketAuthError};
