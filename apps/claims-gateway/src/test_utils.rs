// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared helpers for unit tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Create an unsigned test JWT carrying `claims` as its payload.
pub fn create_test_jwt(claims: &serde_json::Value) -> String {
    let header = r#"{"alg":"HS256","typ":"JWT"}"#;

    let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());

    // Signature is never checked
    format!("{header_b64}.{claims_b64}.fake_signature")
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
