// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Claim Extraction Module
//!
//! Reads the claims embedded in a bearer token so they can be projected onto
//! the upstream request.
//!
//! ## Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. `extractor::decode` splits the token and base64url-decodes the payload
//! 3. `DecodedClaims::lookup` walks a claim path (object keys / array indices)
//! 4. `ClaimValue` renders the result as a header or query value
//!
//! ## Security
//!
//! - Signatures, expiry and issuer are NOT checked here; this service must sit
//!   behind a hop that verifies tokens
//! - Token contents are never logged

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{ClaimValue, DecodedClaims};
pub use error::{ApplyError, ExtractError};
pub use extractor::{decode, decode_from_headers};
