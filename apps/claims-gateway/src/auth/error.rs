// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim extraction and projection errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure to obtain a claim set from the `Authorization` header.
///
/// None of these are retried: the token shape is fixed for the lifetime of
/// the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// Header missing, not text, or not prefixed with `Bearer `
    #[error("Authorization header is not a bearer credential")]
    NotBearer,
    /// Fewer than three period-delimited segments
    #[error("Bearer token is malformed (expected header.payload.signature)")]
    MalformedToken,
    /// Payload segment is not unpadded URL-safe base64
    #[error("Bearer token payload is not valid base64url")]
    BadEncoding,
}

/// Failure of a claims projection for the current request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The rule set requires a token and none could be decoded.
    #[error("A valid bearer token is required: {0}")]
    AuthRequired(#[source] ExtractError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl ExtractError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractError::NotBearer => "not_bearer",
            ExtractError::MalformedToken => "malformed_token",
            ExtractError::BadEncoding => "bad_encoding",
        }
    }
}

impl ApplyError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApplyError::AuthRequired(_) => "auth_required",
        }
    }

    /// Get the HTTP status code the host should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplyError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// The extractor failure behind this error.
    pub fn cause(&self) -> &ExtractError {
        match self {
            ApplyError::AuthRequired(cause) => cause,
        }
    }
}

impl IntoResponse for ApplyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
