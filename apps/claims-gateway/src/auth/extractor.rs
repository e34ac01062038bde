// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token payload decoding.
//!
//! The token signature is NOT verified here. Tokens reaching this service
//! have already been checked upstream; this module only takes the token
//! apart structurally to read its claims.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use super::{DecodedClaims, ExtractError};

/// Scheme prefix expected on the `Authorization` header (case-sensitive).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Unpadded base64url that ignores non-zero bits in the final symbol.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Decode the claims carried by an `Authorization` header value.
///
/// The value must be `Bearer <header>.<payload>.<signature>`. Extra segments
/// after the third are tolerated. The payload must be unpadded base64url; it
/// is not parsed as JSON until a claim is looked up.
pub fn decode(authorization: &str) -> Result<DecodedClaims, ExtractError> {
    let token = authorization
        .strip_prefix(BEARER_PREFIX)
        .ok_or(ExtractError::NotBearer)?;

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() < 3 {
        return Err(ExtractError::MalformedToken);
    }

    let payload = PAYLOAD_ENGINE
        .decode(segments[1])
        .map_err(|_| ExtractError::BadEncoding)?;

    Ok(DecodedClaims::from_payload(payload))
}

/// Decode the claims from a request's `Authorization` header.
///
/// A missing header, or one that is not visible ASCII, is treated the same
/// as a non-bearer credential.
pub fn decode_from_headers(headers: &HeaderMap) -> Result<DecodedClaims, ExtractError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .ok_or(ExtractError::NotBearer)?
        .to_str()
        .map_err(|_| ExtractError::NotBearer)?;

    decode(authorization)
}
