// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Gateway Middleware (axum)
//!
//! Wraps [`GatewayPipeline`] as an axum middleware. Install it with
//! [`Gatehouse::protect`] or directly:
//!
//! ```text
//! router.layer(axum::middleware::from_fn_with_state(pipeline, enforce_gateway))
//! ```
//!
//! The client peer address is read from `ConnectInfo<SocketAddr>`, which is only
//! present when the server runs `into_make_service_with_connect_info`. Without
//! it the forwarded-for header or the `unknown` sentinel keys the IP limiter.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::response::{
    marker_value, AGENT_RATE_REMAINING_HEADER, GATEWAY_MARKER_HEADER, RATE_REMAINING_HEADER,
};
use crate::application::gatehouse::Gatehouse;
use crate::application::gateway::{Admission, GatewayDecision, GatewayPipeline, RequestFacts};

struct RequestLine {
    method: String,
    path: String,
    origin: Option<String>,
}

/// Run the gateway pipeline, then the downstream handler when admitted.
pub async fn enforce_gateway(
    State(pipeline): State<Arc<GatewayPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (decision, line) = {
        let facts = RequestFacts::from_http(
            request.method(),
            request.uri(),
            request.headers(),
            pipeline.headers(),
            peer,
        );
        let line = pipeline.settings().log_requests.then(|| RequestLine {
            method: facts.method.to_string(),
            path: facts.path.to_string(),
            origin: facts.origin().map(str::to_string),
        });
        (pipeline.evaluate(&facts), line)
    };

    match decision {
        Err(violation) => violation.into_response(),
        Ok(GatewayDecision::Bypass) => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(GATEWAY_MARKER_HEADER, marker_value());
            response
        }
        Ok(GatewayDecision::Admit(admission)) => {
            let started = Instant::now();
            let mut response = next.run(request).await;
            stamp_admission(&mut response, &admission);
            if let Some(line) = line {
                info!(
                    method = %line.method,
                    path = %line.path,
                    client_ip = %admission.client_ip,
                    origin = line.origin.as_deref().unwrap_or("-"),
                    status = response.status().as_u16(),
                    duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "Request admitted"
                );
            }
            response
        }
    }
}

fn stamp_admission(response: &mut Response, admission: &Admission) {
    let headers = response.headers_mut();
    headers.insert(GATEWAY_MARKER_HEADER, marker_value());
    headers.insert(RATE_REMAINING_HEADER, HeaderValue::from(admission.ip_remaining));
    if let Some(agent_remaining) = admission.agent_remaining {
        headers.insert(AGENT_RATE_REMAINING_HEADER, HeaderValue::from(agent_remaining));
    }
}

impl Gatehouse {
    /// Wrap `router` in the gateway middleware. A no-op until the gateway is activated.
    ///
    /// Apply this last so the gateway runs before any route-level permission guard.
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self.gateway() {
            Some(pipeline) => router.layer(middleware::from_fn_with_state(
                Arc::clone(pipeline),
                enforce_gateway,
            )),
            None => {
                debug!("Gateway not activated; router left unprotected");
                router
            }
        }
    }
}
