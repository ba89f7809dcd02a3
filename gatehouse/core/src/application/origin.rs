// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Origin Validation (Gateway Layer)
//!
//! Decides whether a request's declared `Origin` is acceptable.
//!
//! - No `Origin` header: always allowed (same-origin, CLI and server-to-server
//!   traffic never send one).
//! - Allow-list contains `"*"`: everything allowed, checked before any matching.
//! - Otherwise: case-sensitive glob match against each pattern, first match wins.
//!   `*` matches any run of characters, `?` exactly one.

use glob::{MatchOptions, Pattern, PatternError};

use crate::domain::violation::GatewayViolation;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
pub struct OriginValidator {
    allow_all: bool,
    patterns: Vec<Pattern>,
}

impl OriginValidator {
    /// Compile the allow-list. Fails on a malformed glob.
    pub fn new<S: AsRef<str>>(allowed_origins: &[S]) -> Result<Self, PatternError> {
        let allow_all = allowed_origins.iter().any(|p| p.as_ref() == "*");
        let patterns = if allow_all {
            Vec::new()
        } else {
            allowed_origins
                .iter()
                .map(|p| Pattern::new(p.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(Self { allow_all, patterns })
    }

    pub fn allow_all(&self) -> bool {
        self.allow_all
    }

    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };
        if self.allow_all {
            return true;
        }
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(origin, MATCH_OPTIONS))
    }

    pub fn validate(&self, origin: Option<&str>) -> Result<(), GatewayViolation> {
        if self.is_allowed(origin) {
            Ok(())
        } else {
            Err(GatewayViolation::OriginDenied {
                origin: origin.unwrap_or_default().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_origin_always_allowed() {
        let validator = OriginValidator::new(&["https://good.com"]).unwrap();
        assert!(validator.validate(None).is_ok());

        let empty = OriginValidator::new::<&str>(&[]).unwrap();
        assert!(empty.validate(None).is_ok());
    }

    #[test]
    fn test_exact_match() {
        let validator = OriginValidator::new(&["https://good.com"]).unwrap();
        assert!(validator.validate(Some("https://good.com")).is_ok());
        assert!(matches!(
            validator.validate(Some("https://evil.com")),
            Err(GatewayViolation::OriginDenied { origin }) if origin == "https://evil.com"
        ));
    }

    #[test]
    fn test_wildcard_subdomain() {
        let validator = OriginValidator::new(&["*.good.com"]).unwrap();
        assert!(validator.validate(Some("https://a.good.com")).is_ok());
        assert!(validator.validate(Some("https://good.org")).is_err());

        let scheme_aware = OriginValidator::new(&["https://*.sutra.team"]).unwrap();
        assert!(scheme_aware.is_allowed(Some("https://app.sutra.team")));
        assert!(!scheme_aware.is_allowed(Some("http://app.sutra.team")));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        let validator = OriginValidator::new(&["http://localhost:300?"]).unwrap();
        assert!(validator.is_allowed(Some("http://localhost:3000")));
        assert!(!validator.is_allowed(Some("http://localhost:30000")));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let validator = OriginValidator::new(&["https://good.com"]).unwrap();
        assert!(!validator.is_allowed(Some("https://GOOD.com")));
    }

    #[test]
    fn test_star_sentinel_allows_everything() {
        let validator = OriginValidator::new(&["https://good.com", "*"]).unwrap();
        assert!(validator.allow_all());
        assert!(validator.is_allowed(Some("https://anything.example")));
    }

    #[test]
    fn test_malformed_pattern_rejected() {
        assert!(OriginValidator::new(&["https://[broken"]).is_err());
    }
}
