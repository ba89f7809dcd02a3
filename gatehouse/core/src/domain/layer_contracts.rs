// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Layer Contracts (sangha, karma, sila, metta, bodhi, nirvana)
//!
//! Interfaces for the six layers that sit beside the gateway and permission
//! engine. No implementation ships in this crate; host applications provide
//! their own and the status facade reports these layers as inactive until then.
//!
//! | Trait | Layer | Concern |
//! |-------|-------|---------|
//! | [`SkillVetter`] | sangha | Vet skills/tools before agents may use them |
//! | [`CostController`] | karma | Per-agent spend budgets |
//! | [`Auditor`] | sila | Audit trail and anomaly detection |
//! | [`IdentityManager`] | metta | Agent certificates and signatures |
//! | [`SandboxManager`] | bodhi | Isolated execution |
//! | [`RecoveryManager`] | nirvana | Snapshots, rollback, kill switch |

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type Metadata = HashMap<String, serde_json::Value>;

// ── sangha ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillStatus {
    Pending,
    Approved,
    Rejected,
    Quarantined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillManifest {
    pub skill_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub permissions_required: Vec<String>,
    pub status: SkillStatus,
    #[serde(default)]
    pub scanned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[async_trait]
pub trait SkillVetter: Send + Sync {
    /// Scan a skill for security issues and return the findings.
    async fn scan_skill(&self, manifest: &SkillManifest) -> Result<serde_json::Value>;
    /// Exercise a skill in a sandbox; `true` if it behaved.
    async fn sandbox_test(&self, manifest: &SkillManifest) -> Result<bool>;
    async fn approve_skill(&self, skill_id: &str) -> Result<SkillManifest>;
    async fn revoke_skill(&self, skill_id: &str) -> Result<SkillManifest>;
}

// ── karma ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBudget {
    pub agent_id: String,
    pub daily_limit: f64,
    pub monthly_limit: f64,
    pub spent_today: f64,
    pub spent_this_month: f64,
    pub currency: String,
    #[serde(default)]
    pub last_reset: Option<DateTime<Utc>>,
}

impl AgentBudget {
    pub fn remaining_today(&self) -> f64 {
        (self.daily_limit - self.spent_today).max(0.0)
    }

    pub fn remaining_this_month(&self) -> f64 {
        (self.monthly_limit - self.spent_this_month).max(0.0)
    }
}

#[async_trait]
pub trait CostController: Send + Sync {
    /// `true` if the agent can afford `estimated_cost`.
    async fn check_budget(&self, agent_id: &str, estimated_cost: f64) -> Result<bool>;
    async fn record_spend(&self, agent_id: &str, amount: f64, description: &str)
        -> Result<AgentBudget>;
    async fn get_balance(&self, agent_id: &str) -> Result<AgentBudget>;
    async fn set_budget(&self, agent_id: &str, daily_limit: f64, monthly_limit: f64)
        -> Result<AgentBudget>;
}

// ── sila ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Debug,
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(default)]
    pub event_id: String,
    pub layer: String,
    pub event_type: String,
    pub severity: AuditSeverity,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub detail: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[async_trait]
pub trait Auditor: Send + Sync {
    /// Persist an event and return its id.
    async fn log_event(&self, event: AuditEvent) -> Result<String>;
    async fn detect_anomaly(&self, agent_id: &str, window_minutes: u32) -> Result<Vec<AuditEvent>>;
    async fn get_audit_trail(&self, agent_id: Option<&str>, limit: usize) -> Result<Vec<AuditEvent>>;
}

// ── metta ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCertificate {
    pub agent_id: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub issuer: String,
    #[serde(default)]
    pub revoked: bool,
}

impl AgentCertificate {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.revoked {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => now <= expires_at,
            None => true,
        }
    }
}

#[async_trait]
pub trait IdentityManager: Send + Sync {
    async fn register_identity(&self, agent_id: &str) -> Result<AgentCertificate>;
    async fn sign_message(&self, agent_id: &str, message: &[u8]) -> Result<Vec<u8>>;
    async fn verify_signature(&self, agent_id: &str, message: &[u8], signature: &[u8])
        -> Result<bool>;
    async fn revoke_identity(&self, agent_id: &str) -> Result<AgentCertificate>;
}

// ── bodhi ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationLevel {
    None,
    Process,
    Container,
    Vm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub agent_id: String,
    pub isolation_level: IsolationLevel,
    pub max_memory_mb: u64,
    pub max_cpu_seconds: u64,
    #[serde(default)]
    pub network_allowed: bool,
    #[serde(default)]
    pub allowed_egress: Vec<String>,
    #[serde(default = "default_readonly")]
    pub filesystem_readonly: bool,
}

fn default_readonly() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxResult {
    pub success: bool,
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub duration_ms: f64,
    #[serde(default)]
    pub egress_attempts: Vec<String>,
}

#[async_trait]
pub trait SandboxManager: Send + Sync {
    /// Create a sandbox and return its id.
    async fn create_sandbox(&self, config: SandboxConfig) -> Result<String>;
    async fn execute_in_sandbox(&self, sandbox_id: &str, code: &str) -> Result<SandboxResult>;
    /// Unauthorized egress attempts observed so far.
    async fn check_egress(&self, sandbox_id: &str) -> Result<Vec<String>>;
    async fn destroy_sandbox(&self, sandbox_id: &str) -> Result<()>;
}

// ── nirvana ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub snapshot_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub state_data: Metadata,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub size_bytes: u64,
}

#[async_trait]
pub trait RecoveryManager: Send + Sync {
    async fn snapshot(&self, agent_id: &str, label: &str) -> Result<StateSnapshot>;
    async fn rollback(&self, snapshot_id: &str) -> Result<bool>;
    /// Emergency stop: freeze every operation of the agent.
    async fn kill_switch(&self, agent_id: &str) -> Result<bool>;
    async fn list_snapshots(&self, agent_id: &str) -> Result<Vec<StateSnapshot>>;
}
