// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Rejection Responses
//!
//! Every decision error becomes a JSON body `{"detail": <message>, "layer": <layer>}`.
//!
//! | Error | Status | Extra headers |
//! |-------|--------|---------------|
//! | `TransportInsecure`, `OriginDenied` | 403 | marker |
//! | `RateLimitExceeded` | 429 | marker, `Retry-After: <window secs>` |
//! | `PermissionDenied` | 403 | |
//! | `WebSocketAuthError` | 401 | |

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::websocket_auth::WebSocketAuthError;
use crate::domain::layer::Layer;
use crate::domain::violation::{GatewayViolation, PermissionDenied};

/// Marks every response that went through the gateway middleware.
pub const GATEWAY_MARKER_HEADER: HeaderName = HeaderName::from_static("x-gatehouse-layer");
pub const RATE_REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const AGENT_RATE_REMAINING_HEADER: HeaderName =
    HeaderName::from_static("x-ratelimit-agent-remaining");

pub(crate) fn marker_value() -> HeaderValue {
    HeaderValue::from_static("sutra")
}

/// Body of every rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub layer: Layer,
}

fn rejection(status: StatusCode, detail: String, layer: Layer) -> Response {
    (status, Json(ErrorBody { detail, layer })).into_response()
}

impl IntoResponse for GatewayViolation {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayViolation::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayViolation::TransportInsecure | GatewayViolation::OriginDenied { .. } => {
                StatusCode::FORBIDDEN
            }
        };
        let retry_after = self.retry_after_secs();
        let mut response = rejection(status, self.to_string(), self.layer());
        let headers = response.headers_mut();
        headers.insert(GATEWAY_MARKER_HEADER, marker_value());
        if let Some(secs) = retry_after {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl IntoResponse for PermissionDenied {
    fn into_response(self) -> Response {
        rejection(StatusCode::FORBIDDEN, self.to_string(), self.layer())
    }
}

impl IntoResponse for WebSocketAuthError {
    fn into_response(self) -> Response {
        rejection(StatusCode::UNAUTHORIZED, self.to_string(), self.layer())
    }
}
