// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Gatehouse CLI

pub mod check;
pub mod config;
pub mod roles;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::roles::RolesCommand;
