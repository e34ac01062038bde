// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Query string parsing, merging and re-encoding.

use std::collections::BTreeMap;

use axum::http::{uri::PathAndQuery, Uri};
use url::form_urlencoded;

/// Query parameters grouped by key. Keys iterate in sorted order, values keep
/// their original order.
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// Parse an `application/x-www-form-urlencoded` query string.
pub fn parse(raw: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

/// Overwrite `params` with `staged`. A staged key replaces every existing
/// value under that key; other keys are untouched.
pub fn merge(params: &mut QueryParams, staged: BTreeMap<String, String>) {
    for (key, value) in staged {
        params.insert(key, vec![value]);
    }
}

/// Encode parameters sorted by key.
pub fn encode(params: &QueryParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in params {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Rebuild `uri` with its query replaced by `query`, keeping scheme,
/// authority and path.
pub fn replace_query(uri: &Uri, query: &str) -> Result<Uri, axum::http::Error> {
    let path = uri.path();
    let path_and_query = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}
