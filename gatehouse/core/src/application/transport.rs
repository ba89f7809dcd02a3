// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Transport Security Check (Gateway Layer)
//!
//! A forwarded-protocol header, when present, is authoritative (a single trusted
//! reverse proxy terminates TLS in front of us). Otherwise the connection scheme
//! is used; no scheme at all counts as insecure.
//!
//! `enforce` rejects insecure requests; `warn` only logs. With both set the
//! request is rejected and no warning is emitted.

use tracing::warn;

use crate::domain::violation::GatewayViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSecurityChecker {
    enforce: bool,
    warn: bool,
}

impl TransportSecurityChecker {
    pub fn new(enforce: bool, warn: bool) -> Self {
        Self { enforce, warn }
    }

    pub fn is_secure(&self, scheme: Option<&str>, forwarded_proto: Option<&str>) -> bool {
        if let Some(proto) = forwarded_proto.filter(|p| !p.is_empty()) {
            return proto.trim().eq_ignore_ascii_case("https");
        }
        matches!(scheme, Some(s) if s.eq_ignore_ascii_case("https"))
    }

    pub fn check(
        &self,
        scheme: Option<&str>,
        forwarded_proto: Option<&str>,
    ) -> Result<(), GatewayViolation> {
        if self.is_secure(scheme, forwarded_proto) {
            return Ok(());
        }
        if self.enforce {
            return Err(GatewayViolation::TransportInsecure);
        }
        if self.warn {
            warn!(
                scheme = scheme.unwrap_or("-"),
                forwarded_proto = forwarded_proto.unwrap_or("-"),
                "Request is not over HTTPS"
            );
        }
        Ok(())
    }
}

impl Default for TransportSecurityChecker {
    fn default() -> Self {
        Self::new(false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_proto_is_authoritative() {
        let checker = TransportSecurityChecker::new(true, false);
        assert!(checker.is_secure(Some("http"), Some("https")));
        assert!(checker.is_secure(Some("http"), Some("HTTPS")));
        assert!(!checker.is_secure(Some("https"), Some("http")));
    }

    #[test]
    fn test_falls_back_to_scheme() {
        let checker = TransportSecurityChecker::default();
        assert!(checker.is_secure(Some("https"), None));
        assert!(!checker.is_secure(Some("http"), None));
        assert!(!checker.is_secure(None, None));
    }

    #[test]
    fn test_enforce_rejects_insecure() {
        let checker = TransportSecurityChecker::new(true, true);
        assert_eq!(
            checker.check(Some("http"), None),
            Err(GatewayViolation::TransportInsecure)
        );
        assert!(checker.check(Some("http"), Some("https")).is_ok());
    }

    #[test]
    fn test_warn_only_passes() {
        let checker = TransportSecurityChecker::new(false, true);
        assert!(checker.check(Some("http"), None).is_ok());
        let silent = TransportSecurityChecker::new(false, false);
        assert!(silent.check(None, None).is_ok());
    }
}
