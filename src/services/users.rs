//! User management.

use crate::db::pool::DbPool;
use crate::db::users;
use crate::error::AppError;
use crate::models::{User, UserReviews};
use crate::services::deadline::with_deadline;
use tokio::time::Instant;

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Set a user's activity flag. Inactive users are never picked as reviewers.
    pub async fn set_is_active(
        &self,
        user_id: &str,
        is_active: bool,
        deadline: Instant,
    ) -> Result<User, AppError> {
        with_deadline("SetIsActive", deadline, async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| AppError::from_db(e.into(), "SetIsActive: acquire"))?;

            let user = users::set_is_active(&mut conn, user_id, is_active)
                .await
                .map_err(|e| AppError::from_db(e, "SetIsActive: update user"))?;

            log::info!("[users] Set {} active={}", user_id, is_active);

            Ok(user)
        })
        .await
    }

    /// Pull requests assigned to `user_id` for review.
    pub async fn get_reviews(
        &self,
        user_id: &str,
        deadline: Instant,
    ) -> Result<UserReviews, AppError> {
        with_deadline("GetReview", deadline, async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| AppError::from_db(e.into(), "GetReview: acquire"))?;

            let pull_requests = users::review_assignments(&mut conn, user_id)
                .await
                .map_err(|e| AppError::from_db(e, "GetReview: list reviews"))?;

            Ok(UserReviews {
                user_id: user_id.to_string(),
                pull_requests,
            })
        })
        .await
    }
}
