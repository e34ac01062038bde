// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Configuration-driven modifier construction.
//!
//! The host builds a [`ModifierRegistry`] at startup, mapping type names to
//! constructors, and hands it the modifier documents from configuration. A
//! document names its type as its single key:
//!
//! ```json
//! { "claims.Modifier": { "required": true, "set": [ ... ] } }
//! ```
//!
//! A JSON array of such documents builds a [`ModifierPipeline`] that runs
//! each modifier in order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::engine::ClaimsModifier;
use crate::auth::ApplyError;
use crate::error::{ApiError, ConfigError};

/// A request-phase modifier hosted by the gateway.
pub trait RequestModifier: Send + Sync + fmt::Debug {
    /// Mutate the request before it is forwarded, or reject it.
    fn modify_request(&self, request: &mut Request<Body>) -> Result<(), ModifierError>;
}

/// Why a modifier rejected a request.
#[derive(Debug, thiserror::Error)]
pub enum ModifierError {
    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl IntoResponse for ModifierError {
    fn into_response(self) -> Response {
        match self {
            ModifierError::Apply(err) => err.into_response(),
            ModifierError::Rejected(message) => ApiError::bad_request(message).into_response(),
        }
    }
}

impl RequestModifier for ClaimsModifier {
    fn modify_request(&self, request: &mut Request<Body>) -> Result<(), ModifierError> {
        self.apply(request)?;
        Ok(())
    }
}

/// Builds a modifier from its type-specific configuration.
pub type ModifierConstructor = fn(&Value) -> Result<Arc<dyn RequestModifier>, ConfigError>;

fn claims_modifier_from_json(config: &Value) -> Result<Arc<dyn RequestModifier>, ConfigError> {
    Ok(Arc::new(ClaimsModifier::from_json(config)?))
}

/// Type name to constructor map, owned by the host.
#[derive(Clone, Default)]
pub struct ModifierRegistry {
    constructors: HashMap<String, ModifierConstructor>,
}

impl ModifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in modifier types (`claims.Modifier`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ClaimsModifier::TYPE_NAME, claims_modifier_from_json);
        registry
    }

    /// Register a constructor, replacing any previous one under `type_name`.
    pub fn register(&mut self, type_name: impl Into<String>, constructor: ModifierConstructor) {
        self.constructors.insert(type_name.into(), constructor);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Build one modifier from a `{ "<type>": <config> }` document.
    pub fn build(&self, document: &Value) -> Result<Arc<dyn RequestModifier>, ConfigError> {
        let (type_name, config) = match document {
            Value::Object(map) if map.len() == 1 => map
                .iter()
                .next()
                .ok_or_else(|| ConfigError::InvalidDocument(describe(document)))?,
            other => return Err(ConfigError::InvalidDocument(describe(other))),
        };

        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| ConfigError::UnknownModifier(type_name.clone()))?;

        let modifier = constructor(config)?;
        tracing::info!(modifier = %type_name, "Loaded request modifier");
        Ok(modifier)
    }

    /// Build a pipeline from one document or an array of documents.
    pub fn build_pipeline(&self, config: &Value) -> Result<ModifierPipeline, ConfigError> {
        let modifiers = match config {
            Value::Array(documents) => documents
                .iter()
                .map(|document| self.build(document))
                .collect::<Result<Vec<_>, _>>()?,
            document => vec![self.build(document)?],
        };

        Ok(ModifierPipeline { modifiers })
    }

    /// Parse raw JSON and build a pipeline from it.
    pub fn pipeline_from_slice(&self, bytes: &[u8]) -> Result<ModifierPipeline, ConfigError> {
        let config: Value = serde_json::from_slice(bytes)?;
        self.build_pipeline(&config)
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("ModifierRegistry")
            .field("types", &names)
            .finish()
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Object(map) => format!("an object with {} keys", map.len()),
        Value::Array(_) => "an array".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Ordered modifiers applied to every proxied request.
#[derive(Debug, Clone, Default)]
pub struct ModifierPipeline {
    modifiers: Vec<Arc<dyn RequestModifier>>,
}

impl ModifierPipeline {
    pub fn new(modifiers: Vec<Arc<dyn RequestModifier>>) -> Self {
        Self { modifiers }
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl RequestModifier for ModifierPipeline {
    /// Run modifiers in order, stopping at the first rejection.
    fn modify_request(&self, request: &mut Request<Body>) -> Result<(), ModifierError> {
        for modifier in &self.modifiers {
            modifier.modify_request(request)?;
        }
        Ok(())
    }
}
