// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::error::ConfigError;
use crate::modifier::ModifierPipeline;

/// Upstream request timeout.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared, read-only state for every proxied request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ModifierPipeline>,
    pub upstream_url: Arc<Url>,
    pub client: reqwest::Client,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: ModifierPipeline, upstream_url: Url) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            pipeline: Arc::new(pipeline),
            upstream_url: Arc::new(upstream_url),
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
