// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An automated caller as asserted by the `x-agent-id` / `x-agent-type` headers.
///
/// Identity is trusted as asserted; nothing here is cryptographically verified.
/// `agent_type` is the key into [`super::role::RoleRegistry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub agent_id: String,
    pub agent_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentIdentity {
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            name: String::new(),
            is_system: false,
            metadata: HashMap::new(),
        }
    }
}

impl std::fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.agent_id, self.agent_type)
    }
}
