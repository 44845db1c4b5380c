use crate::error::OukaError;
use crate::google_oauth::endpoints::DriveOauthEndpoints;
use crate::google_oauth::{AuthorizationRequest, ClientSecrets, StoredToken};

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

type TokenReply = RpcReplyPort<Result<String, OukaError>>;

/// Messages handled by the Drive session actor.
#[derive(Debug)]
pub enum DriveSessionMessage {
    /// Hand out a usable access token, refreshing or waiting for consent first.
    AccessToken(TokenReply),
    /// Build a fresh consent URL with PKCE and CSRF state.
    AuthorizeUrl(RpcReplyPort<Result<AuthorizationRequest, OukaError>>),
    /// Operator finished consent: authorization code and PKCE verifier.
    CompleteAuthorization(String, String, RpcReplyPort<Result<(), OukaError>>),
}

/// Everything the session needs at construction time.
pub struct DriveSessionArgs {
    pub http: reqwest::Client,
    pub client_secrets_path: PathBuf,
    pub token_path: PathBuf,
    pub redirect_url: Url,
}

/// Handle for interacting with the Drive session actor.
#[derive(Clone)]
pub struct DriveSessionHandle {
    actor: ActorRef<DriveSessionMessage>,
}

impl DriveSessionHandle {
    /// Returns a valid access token. Blocks while the session waits for the
    /// operator to complete consent.
    pub async fn access_token(&self) -> Result<String, OukaError> {
        ractor::call!(self.actor, DriveSessionMessage::AccessToken)
            .map_err(|e| OukaError::Ractor(format!("AccessToken RPC failed: {e}")))?
    }

    pub async fn authorize_url(&self) -> Result<AuthorizationRequest, OukaError> {
        ractor::call!(self.actor, DriveSessionMessage::AuthorizeUrl)
            .map_err(|e| OukaError::Ractor(format!("AuthorizeUrl RPC failed: {e}")))?
    }

    pub async fn complete_authorization(
        &self,
        code: String,
        pkce_verifier: String,
    ) -> Result<(), OukaError> {
        ractor::call!(
            self.actor,
            DriveSessionMessage::CompleteAuthorization,
            code,
            pkce_verifier
        )
        .map_err(|e| OukaError::Ractor(format!("CompleteAuthorization RPC failed: {e}")))?
    }
}

struct DriveSessionState {
    http: reqwest::Client,
    secrets: ClientSecrets,
    token_path: PathBuf,
    redirect_url: Url,
    token: Option<StoredToken>,
    /// Callers parked until consent completes.
    waiting: Vec<TokenReply>,
}

struct DriveSessionActor;

#[ractor::async_trait]
impl Actor for DriveSessionActor {
    type Msg = DriveSessionMessage;
    type State = DriveSessionState;
    type Arguments = DriveSessionArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let secrets = ClientSecrets::load(&args.client_secrets_path)
            .await
            .map_err(|e| {
                ActorProcessingErr::from(format!(
                    "failed to load client secrets from {}: {}",
                    args.client_secrets_path.display(),
                    e
                ))
            })?;
        let token = StoredToken::load(&args.token_path).await;

        info!(
            has_token = token.is_some(),
            token_path = %args.token_path.display(),
            "DriveSession started"
        );

        Ok(DriveSessionState {
            http: args.http,
            secrets,
            token_path: args.token_path,
            redirect_url: args.redirect_url,
            token,
            waiting: Vec::new(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DriveSessionMessage::AccessToken(reply) => {
                self.handle_access_token(state, reply).await;
            }
            DriveSessionMessage::AuthorizeUrl(reply) => {
                let _ = reply.send(DriveOauthEndpoints::build_authorize_url(
                    &state.secrets,
                    &state.redirect_url,
                ));
            }
            DriveSessionMessage::CompleteAuthorization(code, verifier, reply) => {
                let result = self.handle_complete_authorization(state, code, verifier).await;
                let _ = reply.send(result);
            }
        }
        Ok(())
    }
}

impl DriveSessionActor {
    async fn handle_access_token(&self, state: &mut DriveSessionState, reply: TokenReply) {
        if let Some(token) = state.token.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            let _ = reply.send(Ok(token.access_token.clone()));
            return;
        }

        if let Some(refresh) = state.token.as_ref().and_then(|t| t.refresh_token.clone()) {
            match DriveOauthEndpoints::refresh_access_token(
                &state.secrets,
                &state.redirect_url,
                &refresh,
                &state.http,
            )
            .await
            {
                Ok(resp) => {
                    let token = StoredToken::from_response(&resp, Some(refresh));
                    let access = token.access_token.clone();
                    self.store_token(state, token).await;
                    let _ = reply.send(Ok(access));
                    return;
                }
                Err(OukaError::Oauth2Server { error }) => {
                    warn!(error, "refresh token rejected; re-authorization required");
                    state.token = None;
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    return;
                }
            }
        }

        state.waiting.push(reply);
        warn!(
            waiting = state.waiting.len(),
            "Drive authorization required; open /auth/<gateway key> to grant access"
        );
    }

    async fn handle_complete_authorization(
        &self,
        state: &mut DriveSessionState,
        code: String,
        verifier: String,
    ) -> Result<(), OukaError> {
        let resp = DriveOauthEndpoints::exchange_authorization_code(
            &state.secrets,
            &state.redirect_url,
            code,
            verifier,
            &state.http,
        )
        .await?;

        let previous = state.token.as_ref().and_then(|t| t.refresh_token.clone());
        let token = StoredToken::from_response(&resp, previous);
        let access = token.access_token.clone();
        self.store_token(state, token).await;

        let woken = state.waiting.len();
        for waiter in state.waiting.drain(..) {
            let _ = waiter.send(Ok(access.clone()));
        }
        info!(woken, "Drive authorization completed");
        Ok(())
    }

    /// Keep the token in memory and on disk. A failed write only costs a
    /// consent prompt on next start, so it is logged, not returned.
    async fn store_token(&self, state: &mut DriveSessionState, token: StoredToken) {
        if let Err(e) = token.save(&state.token_path).await {
            warn!(
                path = %state.token_path.display(),
                error = %e,
                "failed to persist Drive token"
            );
        } else {
            debug!(path = %state.token_path.display(), "Drive token persisted");
        }
        state.token = Some(token);
    }
}

/// Spawn the Drive session actor and return a handle.
pub async fn spawn(args: DriveSessionArgs) -> Result<DriveSessionHandle, OukaError> {
    let (actor, _jh) = Actor::spawn(None, DriveSessionActor, args)
        .await
        .map_err(|e| OukaError::Ractor(format!("failed to spawn DriveSession: {e}")))?;
    Ok(DriveSessionHandle { actor })
}
