// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Permission Catalog (Policy Layer)
//!
//! The closed set of capabilities an agent can be granted, plus the immutable
//! [`PermissionSet`] value object built over it.
//!
//! The catalog is versioned with the deployed binary. It is **not** extensible
//! at runtime: a role or an override can only reference a [`Permission`] that
//! exists here. Wire names are stable snake_case strings (`"file_read"`,
//! `"admin_write"`, ...) and round-trip through [`Permission::as_str`] and
//! [`std::str::FromStr`].
//!
//! ## Set Semantics
//!
//! `PermissionSet` never mutates: [`PermissionSet::union`] and
//! [`PermissionSet::difference`] return new sets and leave both operands intact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // File operations
    FileRead,
    FileWrite,
    FileDelete,

    // Shell / execution
    ShellExec,
    ProcessSpawn,

    // Communication
    EmailSend,
    NotificationSend,
    WebhookCall,

    // Token ledger
    SutraEarn,
    SutraTransfer,
    SutraView,

    // Database
    DbRead,
    DbWrite,
    DbDelete,

    // Agent management
    AgentSpawn,
    AgentManage,
    AgentView,

    // Administration
    AdminRead,
    AdminWrite,
    AdminDelete,

    // Artist / campaign
    ArtistRead,
    ArtistWrite,
    CampaignRead,
    CampaignWrite,

    // Curator
    CuratorRead,
    CuratorWrite,

    // Playlist
    PlaylistRead,
    PlaylistWrite,

    // Outbound API calls
    ApiExternal,

    // Social media
    SocialPost,
    SocialRead,

    // Press relations
    PrOutreach,
    PrRead,
}

impl Permission {
    /// Every permission in the catalog, in declaration order.
    pub const ALL: [Permission; 33] = [
        Permission::FileRead,
        Permission::FileWrite,
        Permission::FileDelete,
        Permission::ShellExec,
        Permission::ProcessSpawn,
        Permission::EmailSend,
        Permission::NotificationSend,
        Permission::WebhookCall,
        Permission::SutraEarn,
        Permission::SutraTransfer,
        Permission::SutraView,
        Permission::DbRead,
        Permission::DbWrite,
        Permission::DbDelete,
        Permission::AgentSpawn,
        Permission::AgentManage,
        Permission::AgentView,
        Permission::AdminRead,
        Permission::AdminWrite,
        Permission::AdminDelete,
        Permission::ArtistRead,
        Permission::ArtistWrite,
        Permission::CampaignRead,
        Permission::CampaignWrite,
        Permission::CuratorRead,
        Permission::CuratorWrite,
        Permission::PlaylistRead,
        Permission::PlaylistWrite,
        Permission::ApiExternal,
        Permission::SocialPost,
        Permission::SocialRead,
        Permission::PrOutreach,
        Permission::PrRead,
    ];

    /// Stable wire name of this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FileRead => "file_read",
            Permission::FileWrite => "file_write",
            Permission::FileDelete => "file_delete",
            Permission::ShellExec => "shell_exec",
            Permission::ProcessSpawn => "process_spawn",
            Permission::EmailSend => "email_send",
            Permission::NotificationSend => "notification_send",
            Permission::WebhookCall => "webhook_call",
            Permission::SutraEarn => "sutra_earn",
            Permission::SutraTransfer => "sutra_transfer",
            Permission::SutraView => "sutra_view",
            Permission::DbRead => "db_read",
            Permission::DbWrite => "db_write",
            Permission::DbDelete => "db_delete",
            Permission::AgentSpawn => "agent_spawn",
            Permission::AgentManage => "agent_manage",
            Permission::AgentView => "agent_view",
            Permission::AdminRead => "admin_read",
            Permission::AdminWrite => "admin_write",
            Permission::AdminDelete => "admin_delete",
            Permission::ArtistRead => "artist_read",
            Permission::ArtistWrite => "artist_write",
            Permission::CampaignRead => "campaign_read",
            Permission::CampaignWrite => "campaign_write",
            Permission::CuratorRead => "curator_read",
            Permission::CuratorWrite => "curator_write",
            Permission::PlaylistRead => "playlist_read",
            Permission::PlaylistWrite => "playlist_write",
            Permission::ApiExternal => "api_external",
            Permission::SocialPost => "social_post",
            Permission::SocialRead => "social_read",
            Permission::PrOutreach => "pr_outreach",
            Permission::PrRead => "pr_read",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// An immutable set of unique permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    perms: BTreeSet<Permission>,
}

impl PermissionSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The whole catalog.
    pub fn all() -> Self {
        Permission::ALL.into_iter().collect()
    }

    pub fn has(&self, perm: Permission) -> bool {
        self.perms.contains(&perm)
    }

    pub fn has_all<I>(&self, perms: I) -> bool
    where
        I: IntoIterator<Item = Permission>,
    {
        perms.into_iter().all(|p| self.has(p))
    }

    pub fn has_any<I>(&self, perms: I) -> bool
    where
        I: IntoIterator<Item = Permission>,
    {
        perms.into_iter().any(|p| self.has(p))
    }

    /// `self ∪ other` as a new set.
    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        Self {
            perms: self.perms.union(&other.perms).copied().collect(),
        }
    }

    /// `self − other` as a new set.
    pub fn difference(&self, other: &PermissionSet) -> PermissionSet {
        Self {
            perms: self.perms.difference(&other.perms).copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.perms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }

    /// Iterates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.perms.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            perms: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSet {
    fn from(perms: [Permission; N]) -> Self {
        perms.into_iter().collect()
    }
}

impl From<&[Permission]> for PermissionSet {
    fn from(perms: &[Permission]) -> Self {
        perms.iter().copied().collect()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = Permission;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, Permission>>;

    fn into_iter(self) -> Self::IntoIter {
        self.perms.iter().copied()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.perms.iter().map(Permission::as_str).collect();
        names.sort_unstable();
        write!(f, "PermissionSet([{}])", names.join(", "))
    }
}
