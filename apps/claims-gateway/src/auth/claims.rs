// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoded token payloads and claim lookup by path.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

/// Claims decoded from a bearer token payload.
///
/// Holds the raw payload bytes and parses them into a JSON tree on first
/// lookup. The tree is never mutated and lives for a single request.
/// A payload that is not JSON is not an error here: every lookup against it
/// resolves to an absent value.
#[derive(Debug)]
pub struct DecodedClaims {
    payload: Vec<u8>,
    document: OnceLock<Option<Value>>,
}

impl DecodedClaims {
    /// Wrap the base64-decoded payload segment of a token.
    pub fn from_payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            document: OnceLock::new(),
        }
    }

    /// Raw payload bytes as decoded from the token.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The parsed payload, or `None` if it is not valid JSON.
    pub fn document(&self) -> Option<&Value> {
        self.document
            .get_or_init(|| serde_json::from_slice(&self.payload).ok())
            .as_ref()
    }

    /// Resolve a claim by descending one path segment at a time.
    ///
    /// Segments are object keys, or decimal indices when the current node is
    /// an array. A segment that does not resolve yields an absent value
    /// instead of an error. The empty path resolves to the whole document.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> ClaimValue<'_> {
        let mut node = self.document();
        for segment in path {
            node = node.and_then(|current| child(current, segment.as_ref()));
        }
        ClaimValue(node)
    }
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            segment.parse::<usize>().ok().and_then(|idx| items.get(idx))
        }
        _ => None,
    }
}

/// A resolved claim, possibly absent.
///
/// `Display` produces the header/query representation:
///
/// | Claim | Rendered as |
/// |-------|-------------|
/// | absent, `null` | empty string |
/// | boolean | `true` / `false` |
/// | number | its JSON number text |
/// | string | the string, unquoted |
/// | array, object | compact JSON, e.g. `["admin","group1"]` |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimValue<'a>(Option<&'a Value>);

impl<'a> ClaimValue<'a> {
    /// True when the path did not resolve.
    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// The resolved JSON node, if any.
    pub fn as_json(&self) -> Option<&'a Value> {
        self.0
    }
}

impl fmt::Display for ClaimValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Bool(b)) => write!(f, "{b}"),
            Some(Value::Number(n)) => write!(f, "{n}"),
            Some(Value::String(s)) => f.write_str(s),
            Some(nested @ (Value::Array(_) | Value::Object(_))) => write!(f, "{nested}"),
        }
    }
}
