// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Role inspection commands
//!
//! Commands: list, show

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use gatehouse_core::domain::role::{Role, RoleRegistry};

#[derive(Subcommand)]
pub enum RolesCommand {
    /// List built-in roles
    List,

    /// Show one role's permissions
    Show {
        /// Role name (agent type)
        name: String,
    },
}

pub async fn handle_command(command: RolesCommand) -> Result<()> {
    let registry = RoleRegistry::new();
    match command {
        RolesCommand::List => {
            println!("{}", "Roles:".bold());
            for role in registry.list_roles() {
                println!("{}", summary_line(role));
            }
            Ok(())
        }
        RolesCommand::Show { name } => match registry.get(&name) {
            Some(role) => {
                print!("{}", detail(role));
                Ok(())
            }
            None => anyhow::bail!(
                "Unknown role '{}'. Known roles: {}",
                name,
                registry
                    .list_roles()
                    .iter()
                    .map(|r| r.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
    }
}

pub fn summary_line(role: &Role) -> String {
    format!(
        "  {:<10} {:>2} permissions  {}",
        role.name(),
        role.permissions().len(),
        role.description()
    )
}

pub fn detail(role: &Role) -> String {
    let mut out = format!("{} - {}\n", role.name(), role.description());
    for perm in role.permissions() {
        out.push_str("  - ");
        out.push_str(perm.as_str());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_lists_every_permission() {
        let role = Role::curator();
        let text = detail(&role);
        assert!(text.starts_with("curator - "));
        assert_eq!(text.lines().count(), 1 + role.permissions().len());
        assert!(text.contains("  - curator_write"));
    }

    #[test]
    fn test_summary_line() {
        let line = summary_line(&Role::admin());
        assert!(line.contains("admin"));
        assert!(line.contains("33 permissions"));
    }
}
