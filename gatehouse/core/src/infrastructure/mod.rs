// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure adapters for domain capabilities.

pub mod rate_limit;

pub use rate_limit::InMemoryRateLimitBackend;
