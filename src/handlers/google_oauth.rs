use crate::error::OukaError;
use crate::router::OukaState;
use crate::types::reply::Reply;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use time::Duration;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

const CSRF_COOKIE: &str = "drive_oauth_csrf_token";
const PKCE_COOKIE: &str = "drive_oauth_pkce_verifier";

/// GET /auth/{secret} -> redirects the operator to Google's consent page
/// when the secret matches the gateway key.
pub async fn drive_oauth_entry(
    State(state): State<OukaState>,
    Path(secret): Path<String>,
    jar: PrivateCookieJar,
) -> Result<Response, OukaError> {
    let expected = state.gateway_key.as_bytes();
    if expected.is_empty() || !bool::from(secret.as_bytes().ct_eq(expected)) {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let request = state.session.authorize_url().await?;
    let jar = store_oauth_cookies(jar, &request.csrf_state, &request.pkce_verifier);

    info!("Dispatching Drive OAuth redirect");
    Ok((jar, Redirect::temporary(request.url.as_str())).into_response())
}

/// GET /auth/callback -> exchanges the code and wakes callers waiting for a
/// Drive token.
pub async fn drive_oauth_callback(
    State(state): State<OukaState>,
    Query(query): Query<AuthCallbackQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let (pkce_verifier, csrf_cookie, jar) = match load_oauth_session(jar) {
        Ok(data) => data,
        Err((jar, err)) => return respond_with_error(jar, err),
    };

    let Some(state_param) = query.state.as_deref() else {
        return respond_with_error(
            jar,
            OukaError::OauthFlow("missing `state` in callback".to_string()),
        );
    };

    if !bool::from(state_param.as_bytes().ct_eq(csrf_cookie.as_bytes())) {
        return respond_with_error(
            jar,
            OukaError::OauthFlow("CSRF token mismatch".to_string()),
        );
    }

    let Some(code) = query.code else {
        return respond_with_error(
            jar,
            OukaError::OauthFlow("missing `code` in callback".to_string()),
        );
    };

    if let Err(err) = state.session.complete_authorization(code, pkce_verifier).await {
        return respond_with_error(jar, err);
    }

    info!("Drive OAuth callback completed");
    (
        jar,
        Json(Reply::ephemeral("Google Drive access granted. 🎉")),
    )
        .into_response()
}

fn store_oauth_cookies(jar: PrivateCookieJar, csrf: &str, pkce_verifier: &str) -> PrivateCookieJar {
    jar.add(build_cookie(CSRF_COOKIE, csrf.to_string()))
        .add(build_cookie(PKCE_COOKIE, pkce_verifier.to_string()))
}

fn load_oauth_session(
    jar: PrivateCookieJar,
) -> Result<(String, String, PrivateCookieJar), (PrivateCookieJar, OukaError)> {
    let Some(csrf_cookie) = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned()) else {
        let jar = clear_oauth_cookies(jar);
        return Err((
            jar,
            OukaError::OauthFlow("Missing CSRF token in cookie".to_string()),
        ));
    };

    let Some(pkce_cookie) = jar.get(PKCE_COOKIE).map(|c| c.value().to_owned()) else {
        let jar = clear_oauth_cookies(jar);
        return Err((
            jar,
            OukaError::OauthFlow("Missing PKCE verifier in cookie".to_string()),
        ));
    };

    let jar = clear_oauth_cookies(jar);

    Ok((pkce_cookie, csrf_cookie, jar))
}

fn clear_oauth_cookies(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(CSRF_COOKIE))
        .remove(clear_cookie(PKCE_COOKIE))
}

fn build_cookie(name: &str, value: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(15))
        .build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn respond_with_error(jar: PrivateCookieJar, err: OukaError) -> Response {
    (jar, err.into_response()).into_response()
}
