//! REST API routes.
//!
//! Request bodies and query strings are decoded here and handed to the
//! services with a deadline derived from the configured request timeout.

use super::AppState;
use crate::error::{AppError, ConflictCode};
use crate::models::{NewPullRequest, PullRequest, PullRequestStatus, Team};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ── Error handling ───────────────────────────────────────────────────────────

/// Wrapper to make AppError usable as an axum error response.
pub(crate) struct ApiErr(AppError);

impl ApiErr {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict {
                code: ConflictCode::TeamExists,
                ..
            } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Database { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("[server] {:?}", self.0);
        } else {
            log::debug!("[server] {} {}", status.as_u16(), self.0);
        }

        (
            status,
            Json(json!({
                "error": {
                    "code": self.0.code(),
                    "message": self.0.to_string(),
                }
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(err: JsonRejection) -> Self {
        Self(AppError::invalid_input(err.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(err: QueryRejection) -> Self {
        Self(AppError::invalid_input(err.body_text()))
    }
}

fn require(value: &str, field: &str) -> Result<(), ApiErr> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_input_field(format!("{} is required", field), field).into());
    }
    Ok(())
}

// ── DTOs ─────────────────────────────────────────────────────────────────────

/// Pull request as rendered over HTTP.
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.assigned_reviewers,
            created_at: DateTime::from_timestamp(pr.created_at, 0).unwrap_or_default(),
            merged_at: pr.merged_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

#[derive(Deserialize)]
struct TeamQuery {
    team_name: String,
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
struct SetIsActiveRequest {
    user_id: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct MergeRequest {
    pull_request_id: String,
}

#[derive(Deserialize)]
struct ReassignRequest {
    pull_request_id: String,
    old_reviewer_id: String,
}

// ── Routes ───────────────────────────────────────────────────────────────────

pub fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}

pub fn pull_request_routes() -> Router<AppState> {
    Router::new()
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/pullRequest/statistics", get(statistics))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(team) = payload?;
    let team = state.teams.add_team(team, state.deadline()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "team": team }))))
}

async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let Query(query) = query?;
    require(&query.team_name, "team_name")?;
    let team = state
        .teams
        .get_team(&query.team_name, state.deadline())
        .await?;
    Ok(Json(team))
}

async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(req) = payload?;
    require(&req.user_id, "user_id")?;
    let user = state
        .users
        .set_is_active(&req.user_id, req.is_active, state.deadline())
        .await?;
    Ok(Json(json!({ "user": user })))
}

async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Query(query) = query?;
    require(&query.user_id, "user_id")?;
    let reviews = state
        .users
        .get_reviews(&query.user_id, state.deadline())
        .await?;
    Ok(Json(reviews))
}

async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(input) = payload?;
    require(&input.id, "pull_request_id")?;
    require(&input.author_id, "author_id")?;
    let pr = state.engine.create_pr(input, state.deadline()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "pr": PullRequestResponse::from(pr) })),
    ))
}

async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(req) = payload?;
    require(&req.pull_request_id, "pull_request_id")?;
    let pr = state
        .engine
        .merge_pr(&req.pull_request_id, state.deadline())
        .await?;
    Ok(Json(json!({ "pr": PullRequestResponse::from(pr) })))
}

async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(req) = payload?;
    require(&req.pull_request_id, "pull_request_id")?;
    require(&req.old_reviewer_id, "old_reviewer_id")?;
    let outcome = state
        .engine
        .reassign_pr(&req.pull_request_id, &req.old_reviewer_id, state.deadline())
        .await?;
    Ok(Json(json!({
        "pr": PullRequestResponse::from(outcome.pull_request),
        "replaced_by": outcome.replaced_by,
    })))
}

async fn statistics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiErr> {
    let stat = state.engine.statistics(state.deadline()).await?;
    Ok(Json(json!({ "stat": stat })))
}
