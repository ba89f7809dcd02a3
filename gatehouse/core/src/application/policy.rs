// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Engine (dharma)
//!
//! Resolves whether an agent may exercise a [`Permission`]. Resolution is
//! deterministic and each tier short-circuits the next:
//!
//! | Tier | Condition | Result |
//! |------|-----------|--------|
//! | 1 | permission in the agent's explicit denials | deny |
//! | 2 | permission in the agent's explicit grants | allow |
//! | 3 | `agent_type` names a role holding the permission | allow |
//! | 4 | anything else (including unknown `agent_type`) | deny, or allow when `default_deny` is off |
//!
//! Effective permissions follow the same order: `(role ∪ grants) − denials`,
//! with the denial subtraction applied last.
//!
//! Grant and denial tables are additive. Granting a permission never clears an
//! existing denial of it; the denial keeps winning.
//!
//! All state sits behind read-mostly [`RwLock`]s: `check` only takes read
//! locks, administrative `grant`/`deny`/`register_role` take write locks.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::domain::config::PermissionSettings;
use crate::domain::permission::{Permission, PermissionSet};
use crate::domain::role::{Role, RoleRegistry};
use crate::domain::violation::PermissionDenied;

/// Which tier decided a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    ExplicitDenial,
    ExplicitGrant,
    Role,
    DefaultDeny,
    /// Tier 4 with `default_deny` switched off.
    Permissive,
}

impl Resolution {
    pub fn allowed(&self) -> bool {
        matches!(
            self,
            Resolution::ExplicitGrant | Resolution::Role | Resolution::Permissive
        )
    }

    /// Stable label for logs and metrics.
    pub fn tier(&self) -> &'static str {
        match self {
            Resolution::ExplicitDenial => "explicit_denial",
            Resolution::ExplicitGrant => "explicit_grant",
            Resolution::Role => "role",
            Resolution::DefaultDeny => "default_deny",
            Resolution::Permissive => "permissive",
        }
    }
}

pub struct PolicyEngine {
    settings: PermissionSettings,
    roles: RwLock<RoleRegistry>,
    grants: RwLock<HashMap<String, PermissionSet>>,
    denials: RwLock<HashMap<String, PermissionSet>>,
}

impl PolicyEngine {
    /// Engine over the built-in roles.
    pub fn new(settings: PermissionSettings) -> Self {
        Self::with_registry(RoleRegistry::new(), settings)
    }

    pub fn with_registry(registry: RoleRegistry, settings: PermissionSettings) -> Self {
        if !settings.default_deny {
            warn!("Permission engine running with default-deny disabled; unresolved permissions are allowed");
        }
        Self {
            settings,
            roles: RwLock::new(registry),
            grants: RwLock::new(HashMap::new()),
            denials: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &PermissionSettings {
        &self.settings
    }

    pub fn default_deny(&self) -> bool {
        self.settings.default_deny
    }

    // ── Roles ──

    /// Insert or replace a role binding. Returns the role it replaced.
    pub fn register_role(&self, role: Role) -> Option<Role> {
        info!(role = role.name(), permissions = role.permissions().len(), "Registering role");
        self.roles.write().register(role)
    }

    pub fn role(&self, name: &str) -> Option<Role> {
        self.roles.read().get(name).cloned()
    }

    pub fn list_roles(&self) -> Vec<Role> {
        self.roles.read().list_roles().into_iter().cloned().collect()
    }

    pub fn role_count(&self) -> usize {
        self.roles.read().len()
    }

    // ── Per-agent overrides ──

    /// Union `perms` into the agent's explicit grants.
    pub fn grant<I>(&self, agent_id: &str, perms: I)
    where
        I: IntoIterator<Item = Permission>,
    {
        let added: PermissionSet = perms.into_iter().collect();
        info!(agent_id, permissions = %added, "Granting permissions");
        merge_into(&mut self.grants.write(), agent_id, &added);
    }

    /// Union `perms` into the agent's explicit denials.
    pub fn deny<I>(&self, agent_id: &str, perms: I)
    where
        I: IntoIterator<Item = Permission>,
    {
        let added: PermissionSet = perms.into_iter().collect();
        info!(agent_id, permissions = %added, "Denying permissions");
        merge_into(&mut self.denials.write(), agent_id, &added);
    }

    pub fn grants_for(&self, agent_id: &str) -> PermissionSet {
        self.grants.read().get(agent_id).cloned().unwrap_or_default()
    }

    pub fn denials_for(&self, agent_id: &str) -> PermissionSet {
        self.denials.read().get(agent_id).cloned().unwrap_or_default()
    }

    // ── Resolution ──

    /// Walk the four tiers and report which one decided.
    pub fn resolve(&self, agent_id: &str, agent_type: &str, permission: Permission) -> Resolution {
        if self
            .denials
            .read()
            .get(agent_id)
            .is_some_and(|set| set.has(permission))
        {
            return Resolution::ExplicitDenial;
        }
        if self
            .grants
            .read()
            .get(agent_id)
            .is_some_and(|set| set.has(permission))
        {
            return Resolution::ExplicitGrant;
        }
        if self
            .roles
            .read()
            .get(agent_type)
            .is_some_and(|role| role.permissions().has(permission))
        {
            return Resolution::Role;
        }
        if self.settings.default_deny {
            Resolution::DefaultDeny
        } else {
            Resolution::Permissive
        }
    }

    /// `true` if the agent may exercise `permission`. Never fails.
    pub fn check(&self, agent_id: &str, agent_type: &str, permission: Permission) -> bool {
        let resolution = self.resolve(agent_id, agent_type, permission);
        if resolution.allowed() {
            if self.settings.log_grants {
                info!(
                    agent_id,
                    agent_type,
                    permission = %permission,
                    tier = resolution.tier(),
                    "Permission granted"
                );
            }
            true
        } else {
            metrics::counter!(
                "gatehouse_permission_denials_total",
                "tier" => resolution.tier()
            )
            .increment(1);
            if self.settings.log_denials {
                info!(
                    agent_id,
                    agent_type,
                    permission = %permission,
                    tier = resolution.tier(),
                    "Permission denied"
                );
            }
            false
        }
    }

    /// Like [`check`](Self::check), failing with [`PermissionDenied`] on denial.
    pub fn require(
        &self,
        agent_id: &str,
        agent_type: &str,
        permission: Permission,
    ) -> Result<(), PermissionDenied> {
        if self.check(agent_id, agent_type, permission) {
            Ok(())
        } else {
            Err(PermissionDenied {
                agent_id: agent_id.to_string(),
                agent_type: agent_type.to_string(),
                permission,
            })
        }
    }

    /// Require every permission in order, failing on the first missing one.
    pub fn require_all<'p, I>(
        &self,
        agent_id: &str,
        agent_type: &str,
        permissions: I,
    ) -> Result<(), PermissionDenied>
    where
        I: IntoIterator<Item = &'p Permission>,
    {
        for permission in permissions {
            self.require(agent_id, agent_type, *permission)?;
        }
        Ok(())
    }

    /// `(role(agent_type) ∪ grants(agent_id)) − denials(agent_id)`.
    ///
    /// With `default_deny` off every permission not denied is effective.
    pub fn get_effective_permissions(&self, agent_id: &str, agent_type: &str) -> PermissionSet {
        let base = if self.settings.default_deny {
            let role_perms = self
                .roles
                .read()
                .get(agent_type)
                .map(|role| role.permissions().clone())
                .unwrap_or_default();
            role_perms.union(&self.grants_for(agent_id))
        } else {
            PermissionSet::all()
        };
        let effective = base.difference(&self.denials_for(agent_id));
        debug!(agent_id, agent_type, count = effective.len(), "Computed effective permissions");
        effective
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(PermissionSettings::default())
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("settings", &self.settings)
            .field("roles", &self.role_count())
            .finish_non_exhaustive()
    }
}

fn merge_into(table: &mut HashMap<String, PermissionSet>, agent_id: &str, added: &PermissionSet) {
    let merged = match table.get(agent_id) {
        Some(existing) => existing.union(added),
        None => added.clone(),
    };
    table.insert(agent_id.to_string(), merged);
}
