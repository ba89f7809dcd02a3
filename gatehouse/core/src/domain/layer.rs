// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Security Layers
//!
//! Gatehouse is organised as eight logical layers. Only the first two carry an
//! implementation in this crate; the rest are interface contracts (see
//! [`super::layer_contracts`]) reported as inactive by the status facade.
//!
//! | Layer | Concern |
//! |-------|---------|
//! | `sutra` | Gateway: transport, origin, rate limits |
//! | `dharma` | Permissions: roles, overrides, default-deny |
//! | `sangha` | Skill vetting |
//! | `karma` | Cost controls |
//! | `sila` | Audit trail |
//! | `metta` | Identity |
//! | `bodhi` | Isolation |
//! | `nirvana` | Recovery |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Sutra,
    Dharma,
    Sangha,
    Karma,
    Sila,
    Metta,
    Bodhi,
    Nirvana,
}

impl Layer {
    pub const ALL: [Layer; 8] = [
        Layer::Sutra,
        Layer::Dharma,
        Layer::Sangha,
        Layer::Karma,
        Layer::Sila,
        Layer::Metta,
        Layer::Bodhi,
        Layer::Nirvana,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Sutra => "sutra",
            Layer::Dharma => "dharma",
            Layer::Sangha => "sangha",
            Layer::Karma => "karma",
            Layer::Sila => "sila",
            Layer::Metta => "metta",
            Layer::Bodhi => "bodhi",
            Layer::Nirvana => "nirvana",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activation state of one layer, as shown by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStatus {
    pub name: String,
    pub active: bool,
    pub version: String,
    #[serde(default)]
    pub detail: String,
}

impl LayerStatus {
    pub fn inactive(layer: Layer, version: &str) -> Self {
        Self {
            name: layer.as_str().to_string(),
            active: false,
            version: version.to_string(),
            detail: String::new(),
        }
    }

    pub fn active(layer: Layer, version: &str, detail: impl Into<String>) -> Self {
        Self {
            name: layer.as_str().to_string(),
            active: true,
            version: version.to_string(),
            detail: detail.into(),
        }
    }
}
