// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Catch-all reverse proxy handler.
//!
//! Runs the modifier pipeline on the inbound request, then forwards the
//! (possibly rewritten) request to the upstream and relays its response.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONNECTION, HeaderMap, HeaderName, Uri},
    response::{IntoResponse, Response},
};
use tracing::warn;
use url::Url;

use crate::error::ApiError;
use crate::modifier::RequestModifier;
use crate::state::AppState;

/// Headers that describe a single connection and are never forwarded.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "content-length"
            | "host"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Proxy handler mounted as the router fallback.
pub async fn forward(State(state): State<AppState>, mut request: Request) -> Response {
    if let Err(err) = state.pipeline.modify_request(&mut request) {
        return err.into_response();
    }

    match send_upstream(&state, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn send_upstream(state: &AppState, request: Request) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, state.max_body_bytes).await.map_err(|_| {
        ApiError::payload_too_large(format!(
            "Request body exceeds {} bytes",
            state.max_body_bytes
        ))
    })?;

    let url = upstream_url(&state.upstream_url, &parts.uri);
    let upstream = state
        .client
        .request(parts.method, url)
        .headers(end_to_end(&parts.headers))
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "Upstream request failed");
            ApiError::bad_gateway("Upstream service unavailable")
        })?;

    let status = upstream.status();
    let headers = end_to_end(upstream.headers());
    let bytes = upstream.bytes().await.map_err(|e| {
        warn!(error = %e, "Failed to read upstream response body");
        ApiError::bad_gateway("Upstream response was interrupted")
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Join the upstream base URL with the request's path and raw query.
fn upstream_url(base: &Url, uri: &Uri) -> Url {
    let mut url = base.clone();
    let base_path = base.path().trim_end_matches('/');
    url.set_path(&format!("{base_path}{}", uri.path()));
    url.set_query(uri.query());
    url
}

/// Copy the headers meant for the next hop.
///
/// Drops the fixed hop-by-hop set plus any header the `Connection` header
/// names as connection-specific.
fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let connection_scoped: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) && !connection_scoped.iter().any(|t| t == name.as_str()) {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}
