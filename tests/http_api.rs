//! HTTP API tests.
//!
//! Drive the axum router in-process with `oneshot` and check status codes,
//! response shapes and error bodies.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::test_db;
use pr_review_service::config::Config;
use pr_review_service::{build_state, server};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn app_with_team() -> (common::TestDb, Router) {
    let db = test_db().await;
    let app = server::router(build_state(db.pool.clone(), &Config::default()));

    let (status, _) = send(
        &app,
        Method::POST,
        "/team/add",
        Some(json!({
            "team_name": "backend",
            "members": [
                {"user_id": "u1", "username": "Alice", "is_active": true},
                {"user_id": "u2", "username": "Bob", "is_active": true},
                {"user_id": "u3", "username": "Carol", "is_active": true}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (db, app)
}

#[tokio::test]
async fn test_team_add_and_get() {
    let (_db, app) = app_with_team().await;

    let (status, body) = send(&app, Method::GET, "/team/get?team_name=backend", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_name"], "backend");
    assert_eq!(body["members"].as_array().unwrap().len(), 3);
    assert_eq!(body["members"][0]["user_id"], "u1");
}

#[tokio::test]
async fn test_team_add_duplicate_is_bad_request() {
    let (_db, app) = app_with_team().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/team/add",
        Some(json!({
            "team_name": "backend",
            "members": [{"user_id": "u9", "username": "Zed", "is_active": true}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "TEAM_EXISTS");
}

#[tokio::test]
async fn test_unknown_team_is_not_found() {
    let (_db, app) = app_with_team().await;

    let (status, body) = send(&app, Method::GET, "/team/get?team_name=frontend", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_pull_request() {
    let (_db, app) = app_with_team().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr-1",
            "pull_request_name": "Add search",
            "author_id": "u1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let pr = &body["pr"];
    assert_eq!(pr["pull_request_id"], "pr-1");
    assert_eq!(pr["status"], "OPEN");
    assert_eq!(pr["assigned_reviewers"], json!(["u2", "u3"]));
    assert!(pr["createdAt"].is_string());
    assert!(pr.get("mergedAt").is_none());
}

#[tokio::test]
async fn test_create_duplicate_is_conflict() {
    let (_db, app) = app_with_team().await;
    let payload = json!({
        "pull_request_id": "pr-1",
        "pull_request_name": "Add search",
        "author_id": "u1"
    });
    send(&app, Method::POST, "/pullRequest/create", Some(payload.clone())).await;

    let (status, body) = send(&app, Method::POST, "/pullRequest/create", Some(payload)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_EXISTS");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (_db, app) = app_with_team().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({"pull_request_id": 17})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_merge_and_reassign_flow() {
    let (_db, app) = app_with_team().await;
    send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr-1",
            "pull_request_name": "Add search",
            "author_id": "u1"
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/reassign",
        Some(json!({"pull_request_id": "pr-1", "old_reviewer_id": "u2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NO_CANDIDATE");

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/merge",
        Some(json!({"pull_request_id": "pr-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr"]["status"], "MERGED");
    assert!(body["pr"]["mergedAt"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/reassign",
        Some(json!({"pull_request_id": "pr-1", "old_reviewer_id": "u3"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_MERGED");
}

#[tokio::test]
async fn test_reassign_returns_replacement() {
    let (_db, app) = app_with_team().await;
    send(
        &app,
        Method::POST,
        "/team/add",
        Some(json!({
            "team_name": "platform",
            "members": [
                {"user_id": "p1", "username": "Dan", "is_active": true},
                {"user_id": "p2", "username": "Eve", "is_active": true},
                {"user_id": "p3", "username": "Fay", "is_active": true},
                {"user_id": "p4", "username": "Gus", "is_active": true}
            ]
        })),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr-7",
            "pull_request_name": "Tune cache",
            "author_id": "p1"
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/reassign",
        Some(json!({"pull_request_id": "pr-7", "old_reviewer_id": "p2"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replaced_by"], "p4");
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["p3", "p4"]));
}

#[tokio::test]
async fn test_users_set_is_active_and_get_review() {
    let (_db, app) = app_with_team().await;
    send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr-1",
            "pull_request_name": "Add search",
            "author_id": "u1"
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/setIsActive",
        Some(json!({"user_id": "u3", "is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], false);
    assert_eq!(body["user"]["team_name"], "backend");

    let (status, body) = send(&app, Method::GET, "/users/getReview?user_id=u2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u2");
    assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");
    assert_eq!(body["pull_requests"][0]["status"], "OPEN");

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/setIsActive",
        Some(json!({"user_id": "ghost", "is_active": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_statistics() {
    let (_db, app) = app_with_team().await;
    send(
        &app,
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr-1",
            "pull_request_name": "Add search",
            "author_id": "u1"
        })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/pullRequest/statistics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"stat": [{"pull_request_id": "pr-1", "quantity_reviewers": 2}]})
    );
}

#[tokio::test]
async fn test_not_found_names_the_operation() {
    let (_db, app) = app_with_team().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pullRequest/merge",
        Some(json!({"pull_request_id": "pr-404"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"]["message"],
        "Not found: PullRequest pr-404 (in MergePR: read pull request)"
    );
}
