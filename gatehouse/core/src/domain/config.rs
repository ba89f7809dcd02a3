// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gatehouse Configuration
//
// Two sections, each fully defaulted:
// - gateway: origin allow-list, per-IP / per-agent limits, TLS flags, bypass paths
// - permissions: default-deny, decision logging, identity header names
//
// Loaded from YAML (explicit path or discovery), then overridden by SUTRA_* and
// DHARMA_* environment variables, then validated. Malformed origin globs are
// rejected here so the request path never has to deal with them.

use http::HeaderName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatehouseConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub permissions: PermissionSettings,
}

/// Gateway (transport / origin / rate limit) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Allowed origins. Glob patterns (`https://*.example.com`); `"*"` allows everything.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Max requests per client IP within the window
    #[serde(default = "default_rate_limit_per_ip")]
    pub rate_limit_per_ip: u32,

    /// Max requests per agent id within the window
    #[serde(default = "default_rate_limit_per_agent")]
    pub rate_limit_per_agent: u32,

    /// Sliding window length in seconds (per-IP limiter, and per-agent unless overridden)
    #[serde(default = "default_window_seconds")]
    pub rate_limit_window_seconds: u64,

    /// Optional separate window for the per-agent limiter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_rate_limit_window_seconds: Option<u64>,

    /// Reject requests that did not arrive over HTTPS
    #[serde(default)]
    pub tls_enforce: bool,

    /// Log a warning for requests that did not arrive over HTTPS
    #[serde(default = "default_true")]
    pub tls_warn: bool,

    /// Exact paths that bypass every gateway check
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Log one line per admitted request
    #[serde(default = "default_true")]
    pub log_requests: bool,

    #[serde(default = "default_origin_header")]
    pub origin_header: String,

    #[serde(default = "default_forwarded_for_header")]
    pub forwarded_for_header: String,

    #[serde(default = "default_forwarded_proto_header")]
    pub forwarded_proto_header: String,

    /// Recorded hits between sweeps of idle rate-limit keys (0 disables sweeping)
    #[serde(default = "default_key_sweep_interval")]
    pub key_sweep_interval: u64,
}

/// Permission resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionSettings {
    /// Deny anything not reachable through denial/grant/role resolution.
    ///
    /// When `false`, every permission in the catalog that is not explicitly
    /// denied is allowed for every agent, whatever its type or role.
    #[serde(default = "default_true")]
    pub default_deny: bool,

    #[serde(default = "default_true")]
    pub log_denials: bool,

    /// Verbose: log every successful resolution
    #[serde(default)]
    pub log_grants: bool,

    /// Header carrying the agent id
    #[serde(default = "default_agent_header")]
    pub agent_header: String,

    /// Header carrying the agent type (role name)
    #[serde(default = "default_agent_type_header")]
    pub agent_type_header: String,
}

fn default_true() -> bool {
    true
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_rate_limit_per_ip() -> u32 {
    100
}

fn default_rate_limit_per_agent() -> u32 {
    200
}

fn default_window_seconds() -> u64 {
    60
}

fn default_excluded_paths() -> Vec<String> {
    ["/health", "/docs", "/openapi.json", "/redoc", "/"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_origin_header() -> String {
    "origin".to_string()
}

fn default_forwarded_for_header() -> String {
    "x-forwarded-for".to_string()
}

fn default_forwarded_proto_header() -> String {
    "x-forwarded-proto".to_string()
}

fn default_key_sweep_interval() -> u64 {
    1024
}

fn default_agent_header() -> String {
    "x-agent-id".to_string()
}

fn default_agent_type_header() -> String {
    "x-agent-type".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            rate_limit_per_ip: default_rate_limit_per_ip(),
            rate_limit_per_agent: default_rate_limit_per_agent(),
            rate_limit_window_seconds: default_window_seconds(),
            agent_rate_limit_window_seconds: None,
            tls_enforce: false,
            tls_warn: true,
            excluded_paths: default_excluded_paths(),
            log_requests: true,
            origin_header: default_origin_header(),
            forwarded_for_header: default_forwarded_for_header(),
            forwarded_proto_header: default_forwarded_proto_header(),
            key_sweep_interval: default_key_sweep_interval(),
        }
    }
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            default_deny: true,
            log_denials: true,
            log_grants: false,
            agent_header: default_agent_header(),
            agent_type_header: default_agent_type_header(),
        }
    }
}

impl GatewaySettings {
    pub fn ip_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn agent_window(&self) -> Duration {
        Duration::from_secs(
            self.agent_rate_limit_window_seconds
                .unwrap_or(self.rate_limit_window_seconds),
        )
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for pattern in &self.allowed_origins {
            if pattern == "*" {
                continue;
            }
            glob::Pattern::new(pattern).map_err(|e| {
                anyhow::anyhow!("Invalid origin pattern '{}': {}", pattern, e)
            })?;
        }

        if self.rate_limit_per_ip == 0 {
            anyhow::bail!("gateway.rate_limit_per_ip must be greater than zero");
        }
        if self.rate_limit_per_agent == 0 {
            anyhow::bail!("gateway.rate_limit_per_agent must be greater than zero");
        }
        if self.rate_limit_window_seconds == 0 {
            anyhow::bail!("gateway.rate_limit_window_seconds must be greater than zero");
        }
        if self.agent_rate_limit_window_seconds == Some(0) {
            anyhow::bail!("gateway.agent_rate_limit_window_seconds must be greater than zero");
        }

        for path in &self.excluded_paths {
            if !path.starts_with('/') {
                anyhow::bail!("Excluded path '{}' must start with '/'", path);
            }
        }

        validate_header_name("gateway.origin_header", &self.origin_header)?;
        validate_header_name("gateway.forwarded_for_header", &self.forwarded_for_header)?;
        validate_header_name("gateway.forwarded_proto_header", &self.forwarded_proto_header)?;

        Ok(())
    }
}

impl PermissionSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_header_name("permissions.agent_header", &self.agent_header)?;
        validate_header_name("permissions.agent_type_header", &self.agent_type_header)?;
        if self.agent_header.eq_ignore_ascii_case(&self.agent_type_header) {
            anyhow::bail!("permissions.agent_header and agent_type_header must differ");
        }
        Ok(())
    }
}

fn validate_header_name(field: &str, value: &str) -> anyhow::Result<()> {
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", field);
    }
    HeaderName::from_bytes(value.as_bytes())
        .map_err(|_| anyhow::anyhow!("{} is not a valid header name: '{}'", field, value))?;
    Ok(())
}

impl GatehouseConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GATEHOUSE_CONFIG_PATH environment variable
    /// 2. ./gatehouse.yaml (working directory)
    /// 3. ~/.gatehouse/config.yaml (user home)
    /// 4. /etc/gatehouse/config.yaml (Unix only)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GATEHOUSE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./gatehouse.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".gatehouse").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/gatehouse/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply SUTRA_* / DHARMA_* environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let gw = &mut self.gateway;
        override_list(&lookup, "SUTRA_ALLOWED_ORIGINS", &mut gw.allowed_origins);
        override_parsed(&lookup, "SUTRA_RATE_LIMIT_PER_IP", &mut gw.rate_limit_per_ip);
        override_parsed(&lookup, "SUTRA_RATE_LIMIT_PER_AGENT", &mut gw.rate_limit_per_agent);
        override_parsed(
            &lookup,
            "SUTRA_RATE_LIMIT_WINDOW_SECONDS",
            &mut gw.rate_limit_window_seconds,
        );
        if let Some(raw) = lookup("SUTRA_AGENT_RATE_LIMIT_WINDOW_SECONDS") {
            match raw.trim().parse::<u64>() {
                Ok(v) => gw.agent_rate_limit_window_seconds = Some(v),
                Err(_) => tracing::warn!(
                    "Invalid value for SUTRA_AGENT_RATE_LIMIT_WINDOW_SECONDS: '{}'. Ignoring.",
                    raw
                ),
            }
        }
        override_bool(&lookup, "SUTRA_TLS_ENFORCE", &mut gw.tls_enforce);
        override_bool(&lookup, "SUTRA_TLS_WARN", &mut gw.tls_warn);
        override_list(&lookup, "SUTRA_EXCLUDED_PATHS", &mut gw.excluded_paths);
        override_bool(&lookup, "SUTRA_LOG_REQUESTS", &mut gw.log_requests);

        let perms = &mut self.permissions;
        override_bool(&lookup, "DHARMA_DEFAULT_DENY", &mut perms.default_deny);
        override_bool(&lookup, "DHARMA_LOG_DENIALS", &mut perms.log_denials);
        override_bool(&lookup, "DHARMA_LOG_GRANTS", &mut perms.log_grants);
        override_parsed(&lookup, "DHARMA_AGENT_HEADER", &mut perms.agent_header);
        override_parsed(&lookup, "DHARMA_AGENT_TYPE_HEADER", &mut perms.agent_type_header);
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.gateway.validate()?;
        self.permissions.validate()?;
        Ok(())
    }
}

fn override_bool(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut bool) {
    let Some(val) = lookup(name) else {
        return;
    };
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => {
            tracing::info!("Environment override: {}=true", name);
            *target = true;
        }
        "false" | "0" | "no" | "off" => {
            tracing::info!("Environment override: {}=false", name);
            *target = false;
        }
        _ => {
            tracing::warn!(
                "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                name,
                val
            );
        }
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) {
    let Some(val) = lookup(name) else {
        return;
    };
    match val.trim().parse::<T>() {
        Ok(parsed) => {
            tracing::info!("Environment override: {}={}", name, val.trim());
            *target = parsed;
        }
        Err(_) => tracing::warn!("Invalid value for {}: '{}'. Ignoring.", name, val),
    }
}

/// Comma-separated list. An empty variable yields an empty list.
fn override_list(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut Vec<String>) {
    let Some(val) = lookup(name) else {
        return;
    };
    tracing::info!("Environment override: {}={}", name, val);
    *target = val
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatehouseConfig::default();
        assert_eq!(config.gateway.allowed_origins, vec!["*"]);
        assert_eq!(config.gateway.rate_limit_per_ip, 100);
        assert_eq!(config.gateway.rate_limit_per_agent, 200);
        assert_eq!(config.gateway.ip_window(), Duration::from_secs(60));
        assert_eq!(config.gateway.agent_window(), Duration::from_secs(60));
        assert!(!config.gateway.tls_enforce);
        assert!(config.gateway.tls_warn);
        assert!(config.gateway.excluded_paths.contains(&"/health".to_string()));
        assert!(config.permissions.default_deny);
        assert_eq!(config.permissions.agent_header, "x-agent-id");
        assert_eq!(config.permissions.agent_type_header, "x-agent-type");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
gateway:
  allowed_origins: ["https://onezeroeight.ai", "https://*.sutra.team"]
  rate_limit_per_ip: 5
  agent_rate_limit_window_seconds: 30
permissions:
  log_grants: true
"#;
        let config = GatehouseConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.gateway.allowed_origins.len(), 2);
        assert_eq!(config.gateway.rate_limit_per_ip, 5);
        assert_eq!(config.gateway.rate_limit_per_agent, 200);
        assert_eq!(config.gateway.agent_window(), Duration::from_secs(30));
        assert!(config.permissions.log_grants);
        assert!(config.permissions.default_deny);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatehouse.yaml");

        let mut config = GatehouseConfig::default();
        config.gateway.tls_enforce = true;
        config.permissions.agent_header = "x-bot-id".to_string();
        config.to_yaml_file(&path).unwrap();

        let loaded = GatehouseConfig::load_or_default(Some(path)).unwrap();
        assert!(loaded.gateway.tls_enforce);
        assert_eq!(loaded.permissions.agent_header, "x-bot-id");
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(GatehouseConfig::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatehouseConfig::default();
        config.apply_overrides_from(lookup_from(&[
            ("SUTRA_ALLOWED_ORIGINS", "https://a.com, https://*.b.com"),
            ("SUTRA_RATE_LIMIT_PER_IP", "7"),
            ("SUTRA_TLS_ENFORCE", "yes"),
            ("SUTRA_EXCLUDED_PATHS", "/healthz"),
            ("DHARMA_DEFAULT_DENY", "off"),
            ("DHARMA_AGENT_HEADER", "x-bot-id"),
        ]));

        assert_eq!(
            config.gateway.allowed_origins,
            vec!["https://a.com", "https://*.b.com"]
        );
        assert_eq!(config.gateway.rate_limit_per_ip, 7);
        assert!(config.gateway.tls_enforce);
        assert_eq!(config.gateway.excluded_paths, vec!["/healthz"]);
        assert!(!config.permissions.default_deny);
        assert_eq!(config.permissions.agent_header, "x-bot-id");
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = GatehouseConfig::default();
        config.apply_overrides_from(lookup_from(&[
            ("SUTRA_RATE_LIMIT_PER_IP", "lots"),
            ("SUTRA_TLS_WARN", "maybe"),
        ]));
        assert_eq!(config.gateway.rate_limit_per_ip, 100);
        assert!(config.gateway.tls_warn);
    }

    #[test]
    fn test_validation() {
        let mut config = GatehouseConfig::default();

        config.gateway.allowed_origins = vec!["https://[oops".to_string()];
        assert!(config.validate().is_err());
        config.gateway.allowed_origins = vec!["https://*.good.com".to_string()];
        assert!(config.validate().is_ok());

        config.gateway.rate_limit_per_ip = 0;
        assert!(config.validate().is_err());
        config.gateway.rate_limit_per_ip = 10;

        config.gateway.rate_limit_window_seconds = 0;
        assert!(config.validate().is_err());
        config.gateway.rate_limit_window_seconds = 60;

        config.gateway.excluded_paths = vec!["health".to_string()];
        assert!(config.validate().is_err());
        config.gateway.excluded_paths = vec!["/health".to_string()];

        config.permissions.agent_header = "bad header".to_string();
        assert!(config.validate().is_err());
        config.permissions.agent_header = "x-agent-type".to_string();
        assert!(config.validate().is_err());
        config.permissions.agent_header = "x-agent-id".to_string();

        assert!(config.validate().is_ok());
    }
}
