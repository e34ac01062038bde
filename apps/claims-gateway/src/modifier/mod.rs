// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Modifiers
//!
//! - `rules` - projection rules and their JSON configuration
//! - `engine` - `ClaimsModifier`, which applies a rule set to a request
//! - `query` - query string merge and re-encoding
//! - `registry` - type-name registry and the modifier pipeline run by the gateway

pub mod engine;
pub mod query;
pub mod registry;
pub mod rules;

pub use engine::{ApplyOutcome, ClaimsModifier};
pub use registry::{ModifierError, ModifierPipeline, ModifierRegistry, RequestModifier};
pub use rules::{ProjectionRule, RuleSet, TargetKind};
