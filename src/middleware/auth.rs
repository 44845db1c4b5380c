use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::router::OukaState;

/// An unset key never matches.
fn key_matches(candidate: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// Ensure the request comes from the chat front-end.
/// Accepts either:
/// - Header: `x-ouka-key: ...`
/// - Header: `Authorization: Bearer ...`
/// - Query string: `?key=...`
pub fn ensure_authorized(
    headers: &HeaderMap,
    query: Option<&str>,
    expected: &str,
) -> Result<(), Response> {
    if let Some(hv) = headers.get("x-ouka-key").and_then(|v| v.to_str().ok())
        && key_matches(hv, expected)
    {
        return Ok(());
    }

    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        let auth = auth.trim();
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            && key_matches(token, expected)
        {
            return Ok(());
        }
    }

    if let Some(qs) = query {
        for (k, v) in url::form_urlencoded::parse(qs.as_bytes()) {
            if k == "key" && key_matches(&v, expected) {
                return Ok(());
            }
        }
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized", "reason": "invalid or missing key"})),
    )
        .into_response())
}

#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

impl FromRequestParts<OukaState> for RequireKeyAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &OukaState,
    ) -> Result<Self, Self::Rejection> {
        ensure_authorized(&parts.headers, parts.uri.query(), &state.gateway_key)?;
        Ok(Self)
    }
}
