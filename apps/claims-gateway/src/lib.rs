// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Claims Gateway - JWT Claim Projection Proxy
//!
//! This crate provides a reverse proxy that reads the claims of a bearer
//! token and copies selected claim values into the headers and query string
//! of the request it forwards upstream.
//!
//! ## Modules
//!
//! - `auth` - Bearer token decoding and claim lookup
//! - `modifier` - Projection rules, the claims modifier, and the modifier registry
//! - `api` - HTTP router (Axum): health probe and proxy fallback
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod modifier;
pub mod state;

#[cfg(test)]
mod test_utils;
