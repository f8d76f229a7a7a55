use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use models::User;
use serde_json::{json, Value};
use server::{startup::build_app, ServerState};
use service::storage::repository::mock::UnavailableUserRepository;
use service::test_support::{sample_users, UserFixture};
use tower::ServiceExt;

async fn app_with_samples() -> anyhow::Result<(Router, UserFixture)> {
    let fx = UserFixture::in_memory();
    fx.seed(sample_users()).await?;
    let app = build_app(ServerState::new(fx.repository()));
    Ok((app, fx))
}

fn json_request(method: &str, uri: &str, body: Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?)
}

fn empty_request(method: &str, uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().method(method).uri(uri).body(Body::empty())?)
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Vec<u8>)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok((status, bytes.to_vec()))
}

#[tokio::test]
async fn list_returns_every_user() -> anyhow::Result<()> {
    let (app, _fx) = app_with_samples().await?;
    let (status, body) = send(&app, empty_request("GET", "/api/v1/users")?).await?;
    assert_eq!(status, StatusCode::OK);
    let mut users: Vec<User> = serde_json::from_slice(&body)?;
    users.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(users, sample_users());
    Ok(())
}

#[tokio::test]
async fn list_of_empty_store_is_empty_array() -> anyhow::Result<()> {
    let fx = UserFixture::in_memory();
    let app = build_app(ServerState::new(fx.repository()));
    let (status, body) = send(&app, empty_request("GET", "/api/v1/users")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
    Ok(())
}

#[tokio::test]
async fn create_assigns_fresh_id_and_ignores_client_id() -> anyhow::Result<()> {
    let (app, fx) = app_with_samples().await?;
    let req = json_request(
        "POST",
        "/api/v1/users",
        json!({"id": "001", "firstName": "Kullapat", "lastName": "T"}),
    )?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    let created: User = serde_json::from_slice(&body)?;
    let id = created.id.clone().unwrap();
    assert!(!id.is_empty());
    assert_ne!(id, "001");
    assert_eq!((created.first_name.as_str(), created.last_name.as_str()), ("Kullapat", "T"));

    let (status, body) = send(&app, empty_request("GET", &format!("/api/v1/users/{id}"))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<User>(&body)?, created);
    assert_eq!(fx.service().get_user_by_id("001").await?, Some(sample_users()[0].clone()));
    Ok(())
}

#[tokio::test]
async fn get_by_id_and_missing_id() -> anyhow::Result<()> {
    let (app, _fx) = app_with_samples().await?;
    let (status, body) = send(&app, empty_request("GET", "/api/v1/users/001")?).await?;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body)?;
    assert_eq!(v, json!({"id": "001", "firstName": "First 1", "lastName": "Last 2"}));

    let (status, body) = send(&app, empty_request("GET", "/api/v1/users/404")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let v: Value = serde_json::from_slice(&body)?;
    assert_eq!(v["error"], "Not Found");
    Ok(())
}

#[tokio::test]
async fn update_replaces_names_and_keeps_id() -> anyhow::Result<()> {
    let (app, fx) = app_with_samples().await?;
    let req = json_request(
        "PUT",
        "/api/v1/users/002",
        json!({"id": "999", "firstName": "Kullapat", "lastName": "T"}),
    )?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<User>(&body)?, User::with_id("002", "Kullapat", "T"));

    let svc = fx.service();
    assert_eq!(svc.get_user_by_id("002").await?, Some(User::with_id("002", "Kullapat", "T")));
    assert_eq!(svc.get_user_by_id("001").await?, Some(User::with_id("001", "First 1", "Last 2")));
    assert_eq!(svc.get_user_by_id("999").await?, None);
    Ok(())
}

#[tokio::test]
async fn update_of_missing_user_is_not_found_and_creates_nothing() -> anyhow::Result<()> {
    let (app, fx) = app_with_samples().await?;
    let req = json_request("PUT", "/api/v1/users/404", json!({"firstName": "A", "lastName": "B"}))?;
    let (status, _) = send(&app, req).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(fx.service().get_user_by_id("404").await?, None);
    Ok(())
}

#[tokio::test]
async fn delete_then_repeat_delete() -> anyhow::Result<()> {
    let (app, _fx) = app_with_samples().await?;
    let (status, body) = send(&app, empty_request("DELETE", "/api/v1/users/002")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, body) = send(&app, empty_request("GET", "/api/v1/users")?).await?;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<User> = serde_json::from_slice(&body)?;
    assert_eq!(users, vec![User::with_id("001", "First 1", "Last 2")]);

    let (status, _) = send(&app, empty_request("DELETE", "/api/v1/users/002")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, empty_request("GET", "/api/v1/users/002")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_rejected() -> anyhow::Result<()> {
    let (app, fx) = app_with_samples().await?;

    let bad_json = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(&app, bad_json).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(serde_json::from_slice::<Value>(&body)?["error"], "Malformed Request");

    let missing_field = json_request("PUT", "/api/v1/users/001", json!({"firstName": "Only"}))?;
    let (status, _) = send(&app, missing_field).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .body(Body::from(r#"{"firstName":"A","lastName":"B"}"#))?;
    let (status, _) = send(&app, no_content_type).await?;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // nothing was written by any rejected request
    assert_eq!(fx.service().get_user_by_id("001").await?, Some(User::with_id("001", "First 1", "Last 2")));
    assert_eq!(fx.service().get_users().count().await, 2);
    Ok(())
}

#[tokio::test]
async fn storage_failures_are_server_errors() -> anyhow::Result<()> {
    let app = build_app(ServerState::new(Arc::new(UnavailableUserRepository)));

    let (status, body) = send(&app, empty_request("GET", "/api/v1/users")?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(serde_json::from_slice::<Value>(&body)?["error"], "Storage Error");

    let req = json_request("POST", "/api/v1/users", json!({"firstName": "A", "lastName": "B"}))?;
    assert_eq!(send(&app, req).await?.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        send(&app, empty_request("GET", "/api/v1/users/1")?).await?.0,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    let req = json_request("PUT", "/api/v1/users/1", json!({"firstName": "A", "lastName": "B"}))?;
    assert_eq!(send(&app, req).await?.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        send(&app, empty_request("DELETE", "/api/v1/users/1")?).await?.0,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    Ok(())
}

#[tokio::test]
async fn health_and_metrics_are_served() -> anyhow::Result<()> {
    let (app, _fx) = app_with_samples().await?;
    let (status, body) = send(&app, empty_request("GET", "/health")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body)?, json!({"status": "ok"}));

    let _ = send(&app, empty_request("GET", "/api/v1/users/001")?).await?;
    let (status, body) = send(&app, empty_request("GET", "/metrics")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body)?.contains("user_api_operations_total"));
    Ok(())
}
