// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Applies a rule set to a live request.
//!
//! Per request the modifier moves through:
//!
//! ```text
//! Start -> decode credential -+-> decoded -> apply rules -> Done
//!                             +-> failed, required      -> Aborted (ApplyError)
//!                             +-> failed, not required  -> PassThrough
//! ```
//!
//! Once the token decodes, application cannot fail: claims that do not
//! resolve are written as empty strings.

use std::collections::BTreeMap;

use axum::http::{HeaderValue, Request};
use tracing::{debug, warn};

use super::query;
use super::rules::{RuleSet, TargetKind};
use crate::auth::{decode_from_headers, ApplyError};
use crate::error::ConfigError;

/// Result of a successful [`ClaimsModifier::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Rules ran; counts of headers set and query parameters staged.
    Applied { headers: usize, query: usize },
    /// No usable token and the rule set is optional; request untouched.
    PassThrough,
}

/// Projects bearer-token claims into request headers and query parameters.
#[derive(Debug, Clone)]
pub struct ClaimsModifier {
    rule_set: RuleSet,
}

impl ClaimsModifier {
    /// Registry type name for this modifier.
    pub const TYPE_NAME: &'static str = "claims.Modifier";

    pub fn new(rule_set: RuleSet) -> Self {
        Self { rule_set }
    }

    /// Build from the `{ "required": ..., "set": [...] }` configuration.
    pub fn from_json(config: &serde_json::Value) -> Result<Self, ConfigError> {
        Ok(Self::new(RuleSet::from_json(config)?))
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Apply every rule, in declaration order, to `request`.
    ///
    /// Headers are set (overwriting any existing value). Query rules are
    /// staged and merged into the existing query string once at the end; if
    /// no query rule exists the URI is left byte-for-byte unchanged.
    pub fn apply<B>(&self, request: &mut Request<B>) -> Result<ApplyOutcome, ApplyError> {
        let claims = match decode_from_headers(request.headers()) {
            Ok(claims) => claims,
            Err(err) if self.rule_set.required() => {
                debug!(error = %err, "Rejecting request without a usable bearer token");
                return Err(ApplyError::AuthRequired(err));
            }
            Err(err) => {
                debug!(error = %err, "No usable bearer token, skipping claim projection");
                return Ok(ApplyOutcome::PassThrough);
            }
        };

        let mut headers_written = 0;
        let mut staged = BTreeMap::new();

        for rule in self.rule_set.rules() {
            match rule.target() {
                TargetKind::Header(name) => {
                    let value = claims.lookup(rule.claim_path()).to_string();
                    match HeaderValue::from_bytes(value.as_bytes()) {
                        Ok(value) => {
                            request.headers_mut().insert(name.clone(), value);
                            headers_written += 1;
                        }
                        Err(_) => warn!(
                            header = %name,
                            "Claim value contains characters not allowed in a header, skipping"
                        ),
                    }
                }
                TargetKind::Query => {
                    let value = claims.lookup(rule.claim_path()).to_string();
                    staged.insert(rule.name().to_string(), value);
                }
                TargetKind::Ignored(_) => {}
            }
        }

        let query_written = staged.len();
        if !staged.is_empty() {
            let mut params = query::parse(request.uri().query().unwrap_or_default());
            query::merge(&mut params, staged);
            let encoded = query::encode(&params);

            match query::replace_query(request.uri(), &encoded) {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => warn!(error = %e, "Failed to rewrite request query string"),
            }
        }

        debug!(
            headers = headers_written,
            query = query_written,
            "Projected token claims onto request"
        );

        Ok(ApplyOutcome::Applied {
            headers: headers_written,
            query: query_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ExtractError;
    use crate::modifier::rules::ProjectionRule;
    use crate::test_utils::{bearer, create_test_jwt};
    use axum::http::header::AUTHORIZATION;
    use serde_json::json;

    fn identity_token() -> String {
        create_test_jwt(&json!({
            "https://hoop.perx.ru/identity": {
                "user": "github|403358",
                "groups": ["admin", "group1", "group2", "root"]
            },
            "iss": "https://adwz.auth0.com/",
            "sub": "github|403358",
            "iat": 1562083546
        }))
    }

    fn request_with_token(uri: &str, token: &str) -> Request<()> {
        Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, bearer(token))
            .body(())
            .unwrap()
    }

    fn full_modifier(required: bool) -> ClaimsModifier {
        ClaimsModifier::from_json(&json!({
            "required": required,
            "set": [
                { "name": "X-Auth-User", "type": "header", "claim": ["sub"] },
                {
                    "name": "X-Auth-Groups",
                    "type": "header",
                    "claim": ["https://hoop.perx.ru/identity", "groups"]
                },
                { "name": "sub", "type": "query", "claim": ["sub"] }
            ]
        }))
        .unwrap()
    }

    fn header_only(required: bool) -> ClaimsModifier {
        ClaimsModifier::new(RuleSet::new(
            vec![ProjectionRule::header("X-Auth-User", &["sub"]).unwrap()],
            required,
        ))
    }

    #[test]
    fn projects_headers_and_query() {
        let mut request = request_with_token("/url", &identity_token());

        let outcome = full_modifier(true).apply(&mut request).unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { headers: 2, query: 1 });

        assert_eq!(request.headers()["x-auth-user"], "github|403358");
        assert_eq!(
            request.headers()["x-auth-groups"],
            r#"["admin","group1","group2","root"]"#
        );
        let params = query::parse(request.uri().query().unwrap());
        assert_eq!(params["sub"], ["github|403358"]);
    }

    #[test]
    fn header_rule_sets_subject() {
        let token = create_test_jwt(&json!({"sub": "github|403358"}));
        let mut request = request_with_token("/", &token);

        header_only(true).apply(&mut request).unwrap();
        assert_eq!(request.headers()["X-Auth-User"], "github|403358");
    }

    #[test]
    fn header_rule_overwrites_existing_value() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        let mut request = Request::builder()
            .uri("/")
            .header(AUTHORIZATION, bearer(&token))
            .header("X-Auth-User", "spoofed")
            .header("X-Auth-User", "spoofed-again")
            .body(())
            .unwrap();

        header_only(true).apply(&mut request).unwrap();
        let values: Vec<_> = request.headers().get_all("x-auth-user").iter().collect();
        assert_eq!(values, ["u1"]);
    }

    #[test]
    fn missing_token_fails_when_required() {
        let mut request = Request::builder().uri("/a?x=1").body(()).unwrap();
        let headers_before = request.headers().clone();

        let err = header_only(true).apply(&mut request).unwrap_err();
        assert_eq!(err, ApplyError::AuthRequired(ExtractError::NotBearer));
        assert_eq!(request.headers(), &headers_before);
        assert_eq!(request.uri(), "/a?x=1");
    }

    #[test]
    fn malformed_token_passes_through_when_optional() {
        let mut request = request_with_token("/a?x=1", "abc");
        let headers_before = request.headers().clone();

        let outcome = full_modifier(false).apply(&mut request).unwrap();
        assert_eq!(outcome, ApplyOutcome::PassThrough);
        assert_eq!(request.headers(), &headers_before);
        assert_eq!(request.uri(), "/a?x=1");
    }

    #[test]
    fn bad_encoding_is_reported_when_required() {
        let mut request = request_with_token("/", "aaa.!!!.ccc");
        let err = full_modifier(true).apply(&mut request).unwrap_err();
        assert_eq!(err.cause(), &ExtractError::BadEncoding);
    }

    #[test]
    fn query_rule_preserves_existing_parameters() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        let mut request = request_with_token("/items?foo=bar", &token);
        let modifier =
            ClaimsModifier::new(RuleSet::new(vec![ProjectionRule::query("sub", &["sub"])], true));

        modifier.apply(&mut request).unwrap();
        assert_eq!(request.uri().path(), "/items");
        let params = query::parse(request.uri().query().unwrap());
        assert_eq!(params["foo"], ["bar"]);
        assert_eq!(params["sub"], ["u1"]);
    }

    #[test]
    fn query_rule_overwrites_same_named_parameter() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        let mut request = request_with_token("/items?sub=forged&sub=again", &token);
        let modifier =
            ClaimsModifier::new(RuleSet::new(vec![ProjectionRule::query("sub", &["sub"])], true));

        modifier.apply(&mut request).unwrap();
        assert_eq!(request.uri().query(), Some("sub=u1"));
    }

    #[test]
    fn later_rule_wins_for_same_name() {
        let token = create_test_jwt(&json!({"sub": "u1", "email": "u1@example.com"}));
        let mut request = request_with_token("/items?sub=forged", &token);
        let modifier = ClaimsModifier::new(RuleSet::new(
            vec![
                ProjectionRule::header("X-Auth-User", &["sub"]).unwrap(),
                ProjectionRule::query("sub", &["sub"]),
                ProjectionRule::header("X-Auth-User", &["email"]).unwrap(),
                ProjectionRule::query("sub", &["email"]),
            ],
            true,
        ));

        modifier.apply(&mut request).unwrap();
        let values: Vec<_> = request.headers().get_all("x-auth-user").iter().collect();
        assert_eq!(values, ["u1@example.com"]);
        assert_eq!(request.uri().query(), Some("sub=u1%40example.com"));
    }

    #[test]
    fn raw_query_untouched_without_query_rules() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        // Unsorted and oddly escaped: re-encoding would change it
        let mut request = request_with_token("/items?z=1&a=%7e&a=2", &token);

        header_only(true).apply(&mut request).unwrap();
        assert_eq!(request.uri().query(), Some("z=1&a=%7e&a=2"));
    }

    #[test]
    fn unresolved_claim_projects_empty_string() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        let mut request = request_with_token("/", &token);
        let modifier = ClaimsModifier::new(RuleSet::new(
            vec![
                ProjectionRule::header("X-Email", &["email"]).unwrap(),
                ProjectionRule::header("X-Auth-User", &["sub"]).unwrap(),
            ],
            true,
        ));

        let outcome = modifier.apply(&mut request).unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { headers: 2, query: 0 });
        assert_eq!(request.headers()["x-email"], "");
        assert_eq!(request.headers()["x-auth-user"], "u1");
    }

    #[test]
    fn empty_claim_path_projects_whole_payload() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        let mut request = request_with_token("/", &token);
        let modifier = ClaimsModifier::new(RuleSet::new(
            vec![ProjectionRule::header("X-Claims", &[]).unwrap()],
            true,
        ));

        modifier.apply(&mut request).unwrap();
        assert_eq!(request.headers()["x-claims"], r#"{"sub":"u1"}"#);
    }

    #[test]
    fn ignored_rules_write_nothing() {
        let token = create_test_jwt(&json!({"sub": "u1"}));
        let mut request = request_with_token("/?a=1", &token);
        let modifier = ClaimsModifier::from_json(&json!({
            "set": [{ "name": "X-Cookie", "type": "cookie", "claim": ["sub"] }]
        }))
        .unwrap();

        let outcome = modifier.apply(&mut request).unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { headers: 0, query: 0 });
        assert!(request.headers().get("x-cookie").is_none());
        assert_eq!(request.uri().query(), Some("a=1"));
    }

    #[test]
    fn invalid_header_value_skips_only_that_rule() {
        let token = create_test_jwt(&json!({"sub": "u1", "bio": "line one\nline two"}));
        let mut request = request_with_token("/", &token);
        let modifier = ClaimsModifier::new(RuleSet::new(
            vec![
                ProjectionRule::header("X-Bio", &["bio"]).unwrap(),
                ProjectionRule::header("X-Auth-User", &["sub"]).unwrap(),
            ],
            true,
        ));

        let outcome = modifier.apply(&mut request).unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { headers: 1, query: 0 });
        assert!(request.headers().get("x-bio").is_none());
        assert_eq!(request.headers()["x-auth-user"], "u1");
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let token = identity_token();
        let modifier = full_modifier(true);

        let mut once = request_with_token("/items?foo=bar", &token);
        modifier.apply(&mut once).unwrap();

        let mut twice = request_with_token("/items?foo=bar", &token);
        modifier.apply(&mut twice).unwrap();
        modifier.apply(&mut twice).unwrap();

        assert_eq!(once.headers(), twice.headers());
        assert_eq!(once.uri(), twice.uri());
    }
}
