mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{Fixture, fixture};
use ouka2::router::{OukaState, ouka_router};
use ouka2::types::reply::Reply;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "gateway-secret";

struct App {
    router: Router,
    fx: Fixture,
    _dir: tempfile::TempDir,
}

async fn app(max_upload_bytes: usize) -> App {
    let fx = fixture().await;
    let dir = tempfile::tempdir().unwrap();
    let session = common::session(&dir).await;
    let state = OukaState::new(fx.tags.clone(), fx.catalog.clone(), session, Arc::from(KEY));
    App {
        router: ouka_router(state, max_upload_bytes),
        fx,
        _dir: dir,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-ouka-key", KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bare_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn reply(resp: axum::response::Response) -> Reply {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

#[tokio::test]
async fn create_then_duplicate_tag() {
    let app = app(1024).await;

    let resp = app
        .router
        .clone()
        .oneshot(json_request("POST", "/tags", json!({"name": "cute", "user_id": 7})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(reply(resp).await.content, "Tag `cute` created successfully! 🎉");

    let resp = app
        .router
        .clone()
        .oneshot(json_request("POST", "/tags", json!({"name": "cute", "user_id": 8})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let r = reply(resp).await;
    assert!(r.content.contains("`cute` already exists"));
    assert!(r.ephemeral);

    let tag = app.fx.tags.get("cute").await.unwrap().unwrap();
    assert_eq!(tag.creator_id, 7);
}

#[tokio::test]
async fn deleting_missing_tag_offers_creation() {
    let app = app(1024).await;

    let resp = app
        .router
        .clone()
        .oneshot(bare_request("DELETE", "/tags/ghost"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(reply(resp).await.offer_create.as_deref(), Some("ghost"));

    let resp = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/tags/ghost/confirm-create",
            json!({"user_id": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(app.fx.tags.exists("ghost").await.unwrap());

    // second confirmation answers with the conflict text instead of failing
    let resp = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/tags/ghost/confirm-create",
            json!({"user_id": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(reply(resp).await.content.contains("already exists"));

    let resp = app
        .router
        .clone()
        .oneshot(bare_request("DELETE", "/tags/ghost"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        reply(resp).await.content,
        "Tag `ghost` deleted successfully! 🎉"
    );
}

#[tokio::test]
async fn requests_without_key_are_rejected() {
    let app = app(1024).await;

    let req = Request::builder()
        .method("POST")
        .uri("/tags")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"name": "x", "user_id": 1}).to_string()))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(!app.fx.tags.exists("x").await.unwrap());

    let req = Request::builder()
        .uri("/tags/autocomplete?query=x&key=wrong")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn autocomplete_returns_matching_names() {
    let app = app(1024).await;
    for name in ["catgirl", "cat", "dog"] {
        app.fx.tags.create(name, 1).await.unwrap();
    }

    let req = Request::builder()
        .uri(format!("/tags/autocomplete?query=cat&key={KEY}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let names: Vec<String> = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(names, vec!["cat", "catgirl"]);
}

#[tokio::test]
async fn ingest_list_and_download_image() {
    let app = app(1024).await;
    app.fx.tags.create("cute", 1).await.unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/images?user_id=9&file_name=neko.png&tags=cute")
        .header("x-ouka-key", KEY)
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(&b"PNGDATA"[..]))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let record: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let id = record["id"].as_str().unwrap().to_string();
    assert_eq!(record["tags"], json!(["cute"]));
    assert_eq!(record["file_size"], json!(7));

    let resp = app
        .router
        .clone()
        .oneshot(bare_request("GET", "/images?tag=cute"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Vec<Value> = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(id));

    let resp = app
        .router
        .clone()
        .oneshot(bare_request("GET", &format!("/images/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(resp).await, b"PNGDATA");
}

#[tokio::test]
async fn ingest_with_unknown_tag_reports_generic_failure() {
    let app = app(1024).await;

    let req = Request::builder()
        .method("POST")
        .uri("/images?user_id=9&file_name=neko.png&tags=missing")
        .header("x-ouka-key", KEY)
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(&b"PNGDATA"[..]))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply(resp).await.content,
        "❌ An error occurred while processing your request. ❌"
    );
    assert_eq!(app.fx.transport.stored(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = app(16).await;

    let req = Request::builder()
        .method("POST")
        .uri("/images?user_id=9&file_name=big.png")
        .header("x-ouka-key", KEY)
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0u8; 64]))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.fx.transport.stored(), 0);
}

#[tokio::test]
async fn removing_an_image_requires_the_owner() {
    let app = app(1024).await;
    let record = app
        .fx
        .catalog
        .add(ouka2::service::catalog::NewImage {
            content: bytes::Bytes::from_static(b"x"),
            user_id: 2,
            file_name: "x.png",
            mime_type: "image/png",
            tags: &[],
        })
        .await
        .unwrap();
    let id = record.image.id;

    let resp = app
        .router
        .clone()
        .oneshot(bare_request("DELETE", &format!("/images/{id}?user_id=2")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(reply(resp).await.content.contains("not the owner"));

    let resp = app
        .router
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/images/{id}?user_id={}", common::OWNER_ID),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!app.fx.transport.contains(&id));
}

#[tokio::test]
async fn consent_entry_hides_behind_gateway_key() {
    let app = app(1024).await;

    let req = Request::builder()
        .uri("/auth/not-the-key")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
        .uri(format!("/auth/{KEY}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.contains("client_id=cid"));
    assert!(location.contains("code_challenge="));
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn callback_without_consent_cookies_is_refused() {
    let app = app(1024).await;

    let req = Request::builder()
        .uri("/auth/callback?code=abc&state=xyz")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
