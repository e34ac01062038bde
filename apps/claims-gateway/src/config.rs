// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `UPSTREAM_URL` | Base URL requests are forwarded to | Required |
//! | `MODIFIERS_CONFIG` | Path to the JSON modifier document(s) | Required |
//! | `MAX_BODY_BYTES` | Request body buffer limit | `10485760` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;
use crate::modifier::{ModifierPipeline, ModifierRegistry};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const UPSTREAM_URL_ENV: &str = "UPSTREAM_URL";
pub const MODIFIERS_CONFIG_ENV: &str = "MODIFIERS_CONFIG";
pub const MAX_BODY_BYTES_ENV: &str = "MAX_BODY_BYTES";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Default request body buffer limit (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Default `RUST_LOG` filter when none is set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Gateway settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub upstream_url: Url,
    pub modifiers_path: PathBuf,
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(|_| {
            ConfigError::InvalidEnv {
                name: HOST_ENV,
                value: host.clone(),
            }
        })?;

        let upstream = lookup(UPSTREAM_URL_ENV).ok_or(ConfigError::MissingEnv(UPSTREAM_URL_ENV))?;
        let upstream_url = Url::parse(&upstream)?;
        if !matches!(upstream_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnv {
                name: UPSTREAM_URL_ENV,
                value: upstream,
            });
        }

        let modifiers_path = lookup(MODIFIERS_CONFIG_ENV)
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingEnv(MODIFIERS_CONFIG_ENV))?;

        let max_body_bytes = match lookup(MAX_BODY_BYTES_ENV) {
            Some(value) => value.parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                name: MAX_BODY_BYTES_ENV,
                value,
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnv {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            upstream_url,
            modifiers_path,
            max_body_bytes,
            log_format,
        })
    }

    /// Read the modifier documents and build the pipeline.
    pub fn load_pipeline(
        &self,
        registry: &ModifierRegistry,
    ) -> Result<ModifierPipeline, ConfigError> {
        let bytes = std::fs::read(&self.modifiers_path).map_err(|source| ConfigError::Io {
            path: self.modifiers_path.clone(),
            source,
        })?;
        registry.pipeline_from_slice(&bytes)
    }
}
