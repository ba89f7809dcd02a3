// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `gatehouse check <agent-type> <permission>`
//!
//! Resolves a permission the way a guarded route would, against the built-in
//! roles and the configured default-deny mode. No per-agent overrides exist
//! outside a running server, so only tiers 3 and 4 can decide here.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use gatehouse_core::application::policy::{PolicyEngine, Resolution};
use gatehouse_core::domain::config::GatehouseConfig;
use gatehouse_core::domain::permission::Permission;

/// Print the decision and return it; the caller maps a denial to a failing exit code.
pub async fn execute(
    agent_type: String,
    permission: String,
    agent_id: Option<String>,
    config_override: Option<PathBuf>,
) -> Result<Resolution> {
    let config = GatehouseConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let permission: Permission = permission.parse()?;
    let agent_id = agent_id.unwrap_or_else(|| format!("{agent_type}-cli"));

    let engine = PolicyEngine::new(config.permissions);
    let resolution = engine.resolve(&agent_id, &agent_type, permission);

    let (verdict, verb) = if resolution.allowed() {
        ("ALLOW".green().bold(), "may")
    } else {
        ("DENY".red().bold(), "may not")
    };
    println!(
        "{} {} ({}) {} {} [{}]",
        verdict,
        agent_id,
        agent_type,
        verb,
        permission,
        resolution.tier()
    );
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(yaml: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatehouse.yaml");
        std::fs::write(&path, yaml).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_role_and_default_tiers() {
        let (_dir, path) = write_config("permissions:\n  default_deny: true\n");

        let resolution = execute("playlist".into(), "playlist_read".into(), None, Some(path.clone()))
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Role);

        let resolution = execute("playlist".into(), "admin_write".into(), None, Some(path))
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::DefaultDeny);
        assert!(!resolution.allowed());
    }

    #[tokio::test]
    async fn test_permissive_config() {
        let (_dir, path) = write_config("permissions:\n  default_deny: false\n");
        let resolution = execute(
            "unknown".into(),
            "shell_exec".into(),
            Some("x".into()),
            Some(path),
        )
        .await
        .unwrap();
        assert_eq!(resolution, Resolution::Permissive);
    }

    #[tokio::test]
    async fn test_unknown_permission_is_an_error() {
        let (_dir, path) = write_config("permissions:\n  default_deny: true\n");
        assert!(execute("admin".into(), "fly".into(), None, Some(path)).await.is_err());
    }
}
