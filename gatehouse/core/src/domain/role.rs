// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Roles (Policy Layer)
//!
//! A [`Role`] binds an agent-type name (`"playlist"`, `"admin"`, ...) to a default
//! [`PermissionSet`]. Roles are immutable once built; redefining a role replaces
//! the binding held by the [`RoleRegistry`], it never edits the old value.
//!
//! | Role | Purpose |
//! |------|---------|
//! | `playlist` | Manages artist placements |
//! | `social` | Social media posting |
//! | `pr` | Outreach and press |
//! | `curator` | Curator-facing operations |
//! | `sutra` | System office-manager agent |
//! | `dharma` | System HR agent, performance reviews |
//! | `admin` | Entire catalog |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::permission::{Permission, PermissionSet};

/// A named role with a default permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: String,
    description: String,
    permissions: PermissionSet,
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: impl Into<PermissionSet>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            permissions: permissions.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn playlist() -> Self {
        Self::new(
            "playlist",
            "Playlist agent - manages artist placements",
            [
                Permission::PlaylistRead,
                Permission::PlaylistWrite,
                Permission::ArtistRead,
                Permission::CampaignRead,
                Permission::CuratorRead,
                Permission::SutraEarn,
                Permission::SutraView,
                Permission::DbRead,
                Permission::DbWrite,
                Permission::AgentView,
                Permission::EmailSend,
                Permission::NotificationSend,
            ],
        )
    }

    pub fn social() -> Self {
        Self::new(
            "social",
            "Social media agent - manages social posting",
            [
                Permission::SocialPost,
                Permission::SocialRead,
                Permission::ArtistRead,
                Permission::CampaignRead,
                Permission::SutraEarn,
                Permission::SutraView,
                Permission::DbRead,
                Permission::ApiExternal,
                Permission::AgentView,
            ],
        )
    }

    pub fn pr() -> Self {
        Self::new(
            "pr",
            "PR agent - handles outreach and press",
            [
                Permission::PrOutreach,
                Permission::PrRead,
                Permission::ArtistRead,
                Permission::CampaignRead,
                Permission::EmailSend,
                Permission::SutraEarn,
                Permission::SutraView,
                Permission::DbRead,
                Permission::ApiExternal,
                Permission::AgentView,
            ],
        )
    }

    pub fn curator() -> Self {
        Self::new(
            "curator",
            "Curator agent - curator-facing operations",
            [
                Permission::CuratorRead,
                Permission::CuratorWrite,
                Permission::PlaylistRead,
                Permission::ArtistRead,
                Permission::SutraView,
                Permission::DbRead,
                Permission::AgentView,
            ],
        )
    }

    pub fn sutra() -> Self {
        Self::new(
            "sutra",
            "System agent - office manager, welcomes artists and curators",
            [
                Permission::ArtistRead,
                Permission::ArtistWrite,
                Permission::CuratorRead,
                Permission::CuratorWrite,
                Permission::CampaignRead,
                Permission::SutraEarn,
                Permission::SutraTransfer,
                Permission::SutraView,
                Permission::DbRead,
                Permission::DbWrite,
                Permission::EmailSend,
                Permission::NotificationSend,
                Permission::AgentView,
                Permission::AgentManage,
                Permission::WebhookCall,
            ],
        )
    }

    pub fn dharma() -> Self {
        Self::new(
            "dharma",
            "System agent - HR manager, performance reviews",
            [
                Permission::AgentView,
                Permission::AgentManage,
                Permission::AgentSpawn,
                Permission::ArtistRead,
                Permission::CampaignRead,
                Permission::SutraEarn,
                Permission::SutraTransfer,
                Permission::SutraView,
                Permission::DbRead,
                Permission::DbWrite,
                Permission::AdminRead,
            ],
        )
    }

    pub fn admin() -> Self {
        Self::new("admin", "Admin - full system access", PermissionSet::all())
    }

    /// The roles a fresh [`RoleRegistry`] starts with.
    pub fn builtin() -> Vec<Role> {
        vec![
            Self::playlist(),
            Self::social(),
            Self::pr(),
            Self::curator(),
            Self::sutra(),
            Self::dharma(),
            Self::admin(),
        ]
    }
}

/// Lookup of roles by agent-type name. Last write wins on re-registration.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: HashMap<String, Role>,
}

impl RoleRegistry {
    /// Registry pre-populated with [`Role::builtin`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for role in Role::builtin() {
            registry.register(role);
        }
        registry
    }

    /// Registry with no roles at all.
    pub fn empty() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Insert or replace the binding for `role.name()`, returning the previous role.
    pub fn register(&mut self, role: Role) -> Option<Role> {
        self.roles.insert(role.name.clone(), role)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Role> {
        self.roles.remove(name)
    }

    /// All roles, sorted by name.
    pub fn list_roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.values().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_has_expected_permissions() {
        let role = Role::playlist();
        assert!(role.permissions().has(Permission::PlaylistRead));
        assert!(role.permissions().has(Permission::AgentView));
        assert!(!role.permissions().has(Permission::AdminWrite));
    }

    #[test]
    fn test_system_roles() {
        assert!(Role::sutra().permissions().has(Permission::SutraTransfer));
        assert!(Role::sutra().permissions().has(Permission::WebhookCall));
        assert!(Role::dharma().permissions().has(Permission::AgentSpawn));
        assert!(Role::dharma().permissions().has(Permission::AdminRead));
        assert!(!Role::dharma().permissions().has(Permission::AdminWrite));
    }

    #[test]
    fn test_admin_has_entire_catalog() {
        let admin = Role::admin();
        for perm in Permission::ALL {
            assert!(admin.permissions().has(perm), "admin lacks {perm}");
        }
    }

    #[test]
    fn test_default_roles_loaded() {
        let registry = RoleRegistry::new();
        for name in ["playlist", "social", "pr", "curator", "sutra", "dharma", "admin"] {
            assert!(registry.contains(name), "missing builtin role {name}");
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_unknown_role_returns_none() {
        assert!(RoleRegistry::new().get("nonexistent").is_none());
        assert!(RoleRegistry::empty().get("admin").is_none());
    }

    #[test]
    fn test_register_custom_role_and_replace() {
        let mut registry = RoleRegistry::new();
        let custom = Role::new("scraper", "Reads the web", [Permission::ApiExternal]);
        assert!(registry.register(custom).is_none());
        assert!(registry.get("scraper").unwrap().permissions().has(Permission::ApiExternal));

        let replacement = Role::new("scraper", "Reads files", [Permission::FileRead]);
        let previous = registry.register(replacement).unwrap();
        assert!(previous.permissions().has(Permission::ApiExternal));

        let current = registry.get("scraper").unwrap();
        assert!(current.permissions().has(Permission::FileRead));
        assert!(!current.permissions().has(Permission::ApiExternal));
    }

    #[test]
    fn test_list_roles_sorted() {
        let registry = RoleRegistry::new();
        let names: Vec<&str> = registry.list_roles().iter().map(|r| r.name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
