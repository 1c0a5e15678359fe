//! User model.

use super::PullRequestShort;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user with their team membership.
///
/// Only active users are eligible reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

/// Pull requests a user is assigned to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}
