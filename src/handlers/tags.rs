use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::error::OukaError;
use crate::middleware::auth::RequireKeyAuth;
use crate::router::OukaState;
use crate::service::tag_commands;
use crate::types::commands::{AutocompleteQuery, ConfirmCreateCommand, CreateTagCommand};
use crate::types::reply::Reply;

/// POST /tags
pub async fn create_tag(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Json(cmd): Json<CreateTagCommand>,
) -> Result<(StatusCode, Json<Reply>), OukaError> {
    let reply = tag_commands::create(&state.tags, &cmd.name, cmd.user_id).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// DELETE /tags/{name}
pub async fn delete_tag(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Path(name): Path<String>,
) -> Result<Json<Reply>, OukaError> {
    Ok(Json(tag_commands::delete(&state.tags, &name).await?))
}

/// POST /tags/{name}/confirm-create
pub async fn confirm_create(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Path(name): Path<String>,
    Json(cmd): Json<ConfirmCreateCommand>,
) -> Result<Json<Reply>, OukaError> {
    Ok(Json(
        tag_commands::confirm_create(&state.tags, &name, cmd.user_id).await?,
    ))
}

/// GET /tags/autocomplete?query=
pub async fn autocomplete(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Query(q): Query<AutocompleteQuery>,
) -> Result<Json<Vec<String>>, OukaError> {
    Ok(Json(state.tags.autocomplete(&q.query).await?))
}
