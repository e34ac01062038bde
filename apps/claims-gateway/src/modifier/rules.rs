// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Projection rules and their JSON configuration.
//!
//! ```json
//! {
//!   "required": true,
//!   "set": [
//!     { "name": "X-Auth-User", "type": "header", "claim": ["sub"] },
//!     { "name": "sub", "type": "query", "claim": ["sub"] }
//!   ]
//! }
//! ```

use axum::http::HeaderName;
use serde::Deserialize;

use crate::error::ConfigError;

/// Where a projected claim is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// Request header, validated at load time
    Header(HeaderName),
    /// Query parameter
    Query,
    /// Unrecognised `type` value; the rule is kept but writes nothing
    Ignored(String),
}

impl TargetKind {
    /// Short label used in logs.
    pub fn label(&self) -> &str {
        match self {
            TargetKind::Header(_) => "header",
            TargetKind::Query => "query",
            TargetKind::Ignored(kind) => kind,
        }
    }
}

/// Maps one claim path to one header or query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionRule {
    name: String,
    claim_path: Vec<String>,
    target: TargetKind,
}

impl ProjectionRule {
    /// Build a rule from its configuration fields.
    ///
    /// `kind` is `"header"` or `"query"`. Any other value produces a rule that
    /// is a no-op at request time.
    pub fn new(
        name: impl Into<String>,
        kind: &str,
        claim_path: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let target = match kind {
            "header" => TargetKind::Header(
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))?,
            ),
            "query" => TargetKind::Query,
            other => TargetKind::Ignored(other.to_string()),
        };

        Ok(Self {
            name,
            claim_path,
            target,
        })
    }

    /// Rule writing to a request header.
    pub fn header(name: impl Into<String>, claim_path: &[&str]) -> Result<Self, ConfigError> {
        Self::new(name, "header", to_path(claim_path))
    }

    /// Rule writing to a query parameter.
    pub fn query(name: impl Into<String>, claim_path: &[&str]) -> Self {
        Self {
            name: name.into(),
            claim_path: to_path(claim_path),
            target: TargetKind::Query,
        }
    }

    /// Header or query parameter name as configured.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn claim_path(&self) -> &[String] {
        &self.claim_path
    }

    pub fn target(&self) -> &TargetKind {
        &self.target
    }
}

fn to_path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Ordered projection rules plus the token presence policy.
///
/// Immutable after construction and shared read-only between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ProjectionRule>,
    required: bool,
}

#[derive(Debug, Deserialize)]
struct RuleSetJson {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    set: Vec<RuleJson>,
}

#[derive(Debug, Deserialize)]
struct RuleJson {
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    claim: Vec<String>,
}

impl RuleSet {
    pub fn new(rules: Vec<ProjectionRule>, required: bool) -> Self {
        Self { rules, required }
    }

    /// Parse `{ "required": bool, "set": [ ... ] }`.
    pub fn from_json(config: &serde_json::Value) -> Result<Self, ConfigError> {
        let parsed = RuleSetJson::deserialize(config)?;

        let rules = parsed
            .set
            .into_iter()
            .map(|entry| ProjectionRule::new(entry.name, &entry.kind, entry.claim))
            .collect::<Result<Vec<_>, _>>()?;

        for rule in &rules {
            if let TargetKind::Ignored(_) = rule.target() {
                tracing::warn!(
                    rule = %rule.name(),
                    kind = %rule.target().label(),
                    "Projection rule has an unknown type and will never write a value"
                );
            }
        }

        Ok(Self::new(rules, parsed.required))
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[ProjectionRule] {
        &self.rules
    }

    /// Whether a missing or undecodable token fails the request.
    pub fn required(&self) -> bool {
        self.required
    }
}
