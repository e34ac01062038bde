// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised while building the gateway at startup.
///
/// None of these occur on the request path.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstream(#[from] url::ParseError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid modifier configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Modifier document must be an object with exactly one type key, got {0}")]
    InvalidDocument(String),

    #[error("Unknown modifier type: {0}")]
    UnknownModifier(String),

    #[error("Invalid header name in projection rule: {0:?}")]
    InvalidHeaderName(String),

    #[error("Failed to build upstream HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let big = ApiError::payload_too_large("too big");
        assert_eq!(big.status, StatusCode::PAYLOAD_TOO_LARGE);

        let gw = ApiError::bad_gateway("upstream down");
        assert_eq!(gw.status, StatusCode::BAD_GATEWAY);
        assert_eq!(gw.message, "upstream down");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_gateway("upstream down").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"upstream down"}"#);
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::UnknownModifier("fifo.Group".to_string());
        assert_eq!(err.to_string(), "Unknown modifier type: fifo.Group");

        let err = ConfigError::InvalidEnv {
            name: "PORT",
            value: "eighty".to_string(),
        };
        assert_eq!(err.to_string(), r#"Invalid value for PORT: "eighty""#);
    }
}
