// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Gateway Pipeline (sutra)
//!
//! Admission decision for one inbound request, independent of any web framework.
//! The axum binding lives in [`crate::presentation::middleware`].
//!
//! ## Processing Pipeline
//!
//! ```text
//! RequestFacts
//!   └─ GatewayPipeline::evaluate(&facts)
//!         1. excluded path?        → Bypass (no further checks)
//!         2. transport security    → TransportInsecure      (403)
//!         3. origin allow-list     → OriginDenied           (403)
//!         4. per-IP limiter        → RateLimitExceeded{Ip}   (429)
//!         5. per-agent limiter     → RateLimitExceeded{Agent} (429), only with an agent header
//!         6. Admit { ip_remaining, agent_remaining }
//! ```
//!
//! Stages run strictly in this order and the first rejection is terminal, so a
//! request refused on origin never consumes rate-limit quota. Only stages 4 and
//! 5 mutate state.
//!
//! ## Client IP
//!
//! First comma-separated entry of the forwarded-for header, else the connection
//! peer address, else [`UNKNOWN_CLIENT`]. The per-IP limiter is keyed
//! `ip:{client_ip}`, the per-agent limiter `agent:{agent_id}`.

use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use std::borrow::Cow;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::origin::OriginValidator;
use crate::application::rate_limiter::SlidingWindowLimiter;
use crate::application::transport::TransportSecurityChecker;
use crate::domain::config::{GatehouseConfig, GatewaySettings};
use crate::domain::rate_limit::RateLimitBackend;
use crate::domain::violation::{GatewayViolation, RateLimitScope};
use crate::infrastructure::rate_limit::InMemoryRateLimitBackend;

/// Client IP used when neither a forwarded-for header nor a peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Header names the pipeline reads, parsed once at construction.
#[derive(Debug, Clone)]
pub struct GatewayHeaders {
    pub origin: HeaderName,
    pub forwarded_for: HeaderName,
    pub forwarded_proto: HeaderName,
    pub agent_id: HeaderName,
}

impl GatewayHeaders {
    pub fn from_config(config: &GatehouseConfig) -> anyhow::Result<Self> {
        let gateway = &config.gateway;
        Ok(Self {
            origin: parse_header(&gateway.origin_header)?,
            forwarded_for: parse_header(&gateway.forwarded_for_header)?,
            forwarded_proto: parse_header(&gateway.forwarded_proto_header)?,
            agent_id: parse_header(&config.permissions.agent_header)?,
        })
    }
}

fn parse_header(name: &str) -> anyhow::Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid header name '{}': {}", name, e))
}

/// The parts of a request the pipeline decides on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFacts<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Connection scheme, when known (absolute-form request URI).
    pub scheme: Option<&'a str>,
    pub peer_addr: Option<IpAddr>,
    pub origin: Option<Cow<'a, str>>,
    pub forwarded_for: Option<Cow<'a, str>>,
    pub forwarded_proto: Option<Cow<'a, str>>,
    pub agent_id: Option<Cow<'a, str>>,
}

impl<'a> RequestFacts<'a> {
    /// Borrow the relevant pieces out of an HTTP request head.
    ///
    /// Header values that are not visible ASCII are decoded as latin-1, so a
    /// present header always takes part in the checks.
    pub fn from_http(
        method: &'a Method,
        uri: &'a Uri,
        headers: &'a HeaderMap,
        names: &GatewayHeaders,
        peer_addr: Option<IpAddr>,
    ) -> Self {
        let header = |name: &HeaderName| headers.get(name).map(decode_header);
        Self {
            method: method.as_str(),
            path: uri.path(),
            scheme: uri.scheme_str(),
            peer_addr,
            origin: header(&names.origin),
            forwarded_for: header(&names.forwarded_for),
            forwarded_proto: header(&names.forwarded_proto),
            agent_id: header(&names.agent_id).filter(|id| !id.is_empty()),
        }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    /// Resolve the client IP used as the per-IP rate-limit key.
    pub fn client_ip(&self) -> String {
        if let Some(first) = self
            .forwarded_for
            .as_deref()
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return first.to_string();
        }
        match self.peer_addr {
            Some(addr) => addr.to_string(),
            None => UNKNOWN_CLIENT.to_string(),
        }
    }
}

fn decode_header(value: &HeaderValue) -> Cow<'_, str> {
    match value.to_str() {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(value.as_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}

/// Outcome of a request that was not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayDecision {
    /// Path is excluded; no checks ran and no quota was consumed.
    Bypass,
    Admit(Admission),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub client_ip: String,
    pub ip_remaining: u64,
    /// `Some` only when an agent header was present and the agent limiter ran.
    pub agent_remaining: Option<u64>,
}

/// The sutra layer: transport, origin and rate-limit enforcement.
pub struct GatewayPipeline {
    settings: GatewaySettings,
    headers: GatewayHeaders,
    excluded: HashSet<String>,
    origin: OriginValidator,
    transport: TransportSecurityChecker,
    ip_limiter: SlidingWindowLimiter,
    agent_limiter: SlidingWindowLimiter,
}

impl GatewayPipeline {
    /// Build the pipeline over a fresh in-memory rate-limit backend.
    pub fn from_config(config: &GatehouseConfig) -> anyhow::Result<Self> {
        let backend = Arc::new(InMemoryRateLimitBackend::with_sweep_interval(
            config.gateway.key_sweep_interval,
        ));
        Self::with_backend(config, backend)
    }

    /// Build the pipeline over a caller-supplied backend (shared store, tests).
    ///
    /// Fails on any gateway setting [`GatewaySettings::validate`] rejects; a zero
    /// window or quota would otherwise never limit or always reject.
    pub fn with_backend(
        config: &GatehouseConfig,
        backend: Arc<dyn RateLimitBackend>,
    ) -> anyhow::Result<Self> {
        config.gateway.validate()?;
        let settings = config.gateway.clone();
        let origin = OriginValidator::new(&settings.allowed_origins)
            .map_err(|e| anyhow::anyhow!("invalid allowed origin pattern: {}", e))?;
        let headers = GatewayHeaders::from_config(config)?;
        let ip_limiter = SlidingWindowLimiter::with_backend(
            settings.rate_limit_per_ip,
            settings.ip_window(),
            Arc::clone(&backend),
        );
        let agent_limiter = SlidingWindowLimiter::with_backend(
            settings.rate_limit_per_agent,
            settings.agent_window(),
            backend,
        );

        Ok(Self {
            excluded: settings.excluded_paths.iter().cloned().collect(),
            transport: TransportSecurityChecker::new(settings.tls_enforce, settings.tls_warn),
            origin,
            headers,
            ip_limiter,
            agent_limiter,
            settings,
        })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn headers(&self) -> &GatewayHeaders {
        &self.headers
    }

    pub fn ip_limiter(&self) -> &SlidingWindowLimiter {
        &self.ip_limiter
    }

    pub fn agent_limiter(&self) -> &SlidingWindowLimiter {
        &self.agent_limiter
    }

    /// Exact-match check against the bypass list.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.contains(path)
    }

    /// Run the pipeline stages in order; the first failing stage decides.
    pub fn evaluate(&self, facts: &RequestFacts<'_>) -> Result<GatewayDecision, GatewayViolation> {
        if self.is_excluded(facts.path) {
            debug!(path = facts.path, "Gateway bypass for excluded path");
            return Ok(GatewayDecision::Bypass);
        }

        let client_ip = facts.client_ip();
        let result = self.run_checks(facts, &client_ip);
        match &result {
            Ok(_) => {
                metrics::counter!("gatehouse_gateway_admissions_total").increment(1);
            }
            Err(violation) => {
                metrics::counter!(
                    "gatehouse_gateway_rejections_total",
                    "reason" => violation.reason()
                )
                .increment(1);
                warn!(
                    method = facts.method,
                    path = facts.path,
                    client_ip = %client_ip,
                    origin = facts.origin().unwrap_or("-"),
                    agent_id = facts.agent_id().unwrap_or("-"),
                    reason = violation.reason(),
                    "Gateway rejected request: {}",
                    violation
                );
            }
        }
        result.map(GatewayDecision::Admit)
    }

    fn run_checks(
        &self,
        facts: &RequestFacts<'_>,
        client_ip: &str,
    ) -> Result<Admission, GatewayViolation> {
        self.transport
            .check(facts.scheme, facts.forwarded_proto.as_deref())?;
        self.origin.validate(facts.origin())?;

        let ip = self.ip_limiter.check(&format!("ip:{client_ip}"));
        if !ip.allowed {
            return Err(GatewayViolation::RateLimitExceeded {
                scope: RateLimitScope::Ip,
                retry_after_secs: self.ip_limiter.retry_after_secs(),
            });
        }

        let agent_remaining = match facts.agent_id() {
            Some(agent_id) => {
                let agent = self.agent_limiter.check(&format!("agent:{agent_id}"));
                if !agent.allowed {
                    return Err(GatewayViolation::RateLimitExceeded {
                        scope: RateLimitScope::Agent,
                        retry_after_secs: self.agent_limiter.retry_after_secs(),
                    });
                }
                Some(agent.remaining)
            }
            None => None,
        };

        Ok(Admission {
            client_ip: client_ip.to_string(),
            ip_remaining: ip.remaining,
            agent_remaining,
        })
    }
}

impl std::fmt::Debug for GatewayPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayPipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
