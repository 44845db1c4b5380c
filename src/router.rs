use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::db::TagStore;
use crate::handlers::{google_oauth, images, tags};
use crate::service::catalog::ImageCatalog;
use crate::service::drive_session::DriveSessionHandle;

/// Shared state for every command gateway route.
#[derive(Clone)]
pub struct OukaState {
    pub tags: TagStore,
    pub catalog: ImageCatalog,
    pub session: DriveSessionHandle,
    pub gateway_key: Arc<str>,
    cookie_key: Key,
}

impl OukaState {
    pub fn new(
        tags: TagStore,
        catalog: ImageCatalog,
        session: DriveSessionHandle,
        gateway_key: Arc<str>,
    ) -> Self {
        Self {
            tags,
            catalog,
            session,
            gateway_key,
            // consent cookies only need to outlive one browser round trip
            cookie_key: Key::generate(),
        }
    }
}

impl FromRef<OukaState> for Key {
    fn from_ref(state: &OukaState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn ouka_router(state: OukaState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/tags", post(tags::create_tag))
        .route("/tags/autocomplete", get(tags::autocomplete))
        .route("/tags/{name}", delete(tags::delete_tag))
        .route("/tags/{name}/confirm-create", post(tags::confirm_create))
        .route("/images", post(images::ingest).get(images::list_by_tag))
        .route("/images/{id}", get(images::download).delete(images::remove))
        .route("/auth/callback", get(google_oauth::drive_oauth_callback))
        .route("/auth/{secret}", get(google_oauth::drive_oauth_entry))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
