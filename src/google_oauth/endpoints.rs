use crate::config::DRIVE_SCOPE;
use crate::error::OukaError;
use crate::google_oauth::secrets::ClientSecrets;

use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken,
    Scope, StandardRevocableToken, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenResponse,
    },
};
use tracing::info;
use url::Url;

/// What the consent entry point needs to redirect the operator and later
/// verify the callback.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Stateless Google OAuth endpoints for the Drive scope.
pub(crate) struct DriveOauthEndpoints;

impl DriveOauthEndpoints {
    /// Consent URL for an offline (refreshable) Drive token.
    pub(crate) fn build_authorize_url(
        secrets: &ClientSecrets,
        redirect_url: &Url,
    ) -> Result<AuthorizationRequest, OukaError> {
        let client = build_oauth2_client(secrets, redirect_url)?;
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(challenge)
            .url();
        Ok(AuthorizationRequest {
            url,
            csrf_state: csrf.secret().to_string(),
            pkce_verifier: verifier.secret().to_string(),
        })
    }

    pub(crate) async fn exchange_authorization_code(
        secrets: &ClientSecrets,
        redirect_url: &Url,
        code: String,
        pkce_verifier: String,
        http_client: &reqwest::Client,
    ) -> Result<BasicTokenResponse, OukaError> {
        let client = build_oauth2_client(secrets, redirect_url)?;
        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(http_client)
            .await?;
        info!("Drive authorization code exchanged");
        Ok(token)
    }

    pub(crate) async fn refresh_access_token(
        secrets: &ClientSecrets,
        redirect_url: &Url,
        refresh_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<BasicTokenResponse, OukaError> {
        let client = build_oauth2_client(secrets, redirect_url)?;
        let token = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(http_client)
            .await?;
        info!("Drive access token refreshed");
        Ok(token)
    }
}

fn build_oauth2_client(
    secrets: &ClientSecrets,
    redirect_url: &Url,
) -> Result<DriveOauth2Client, OukaError> {
    let client = OAuth2Client::new(ClientId::new(secrets.client_id.clone()))
        .set_client_secret(ClientSecret::new(secrets.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(secrets.auth_uri.clone())?)
        .set_token_uri(TokenUrl::new(secrets.token_uri.clone())?)
        .set_redirect_uri(RedirectUrl::new(redirect_url.to_string())?);
    Ok(client)
}

type DriveOauth2Client = OAuth2Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
