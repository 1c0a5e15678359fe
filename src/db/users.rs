//! Database queries for users.

use super::DbError;
use crate::models::{PullRequestShort, User};
use sqlx::SqliteConnection;

/// Set a user's activity flag and return the updated user.
pub async fn set_is_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
) -> Result<User, DbError> {
    let user: Option<User> = sqlx::query_as(
        r#"
        UPDATE users
        SET is_active = ?
        WHERE user_id = ?
        RETURNING user_id, username, team_name, is_active
        "#,
    )
    .bind(is_active)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    user.ok_or_else(|| DbError::not_found("User", user_id))
}

/// Pull requests the user is assigned to review, ordered by pull request id.
pub async fn review_assignments(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PullRequestShort>, DbError> {
    let pull_requests = sqlx::query_as::<_, PullRequestShort>(
        r#"
        SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
        FROM assigned_reviewers ar
        JOIN pull_requests pr ON pr.pull_request_id = ar.pull_request_id
        WHERE ar.reviewer_user_id = ?
        ORDER BY pr.pull_request_id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(pull_requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, pull_requests, teams};
    use crate::models::{NewPullRequest, TeamMember};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_is_active_and_reviews() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db"), 1).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        teams::create_team(&mut conn, "backend").await.unwrap();
        teams::upsert_members(
            &mut conn,
            "backend",
            &[
                TeamMember {
                    user_id: "u1".into(),
                    username: "alice".into(),
                    is_active: true,
                },
                TeamMember {
                    user_id: "u2".into(),
                    username: "bob".into(),
                    is_active: true,
                },
            ],
        )
        .await
        .unwrap();

        let user = set_is_active(&mut conn, "u2", false).await.unwrap();
        assert_eq!(
            user,
            User {
                user_id: "u2".into(),
                username: "bob".into(),
                team_name: "backend".into(),
                is_active: false,
            }
        );

        pull_requests::insert(
            &mut conn,
            &NewPullRequest {
                id: "pr-1".into(),
                name: "payments".into(),
                author_id: "u1".into(),
            },
        )
        .await
        .unwrap();
        pull_requests::assign_reviewer(&mut conn, "pr-1", "u2")
            .await
            .unwrap();

        let reviews = review_assignments(&mut conn, "u2").await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].pull_request_id, "pr-1");
        assert_eq!(reviews[0].status, "OPEN");

        assert!(review_assignments(&mut conn, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_is_active_unknown_user() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db"), 1).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let err = set_is_active(&mut conn, "ghost", true).await.unwrap_err();

        assert!(err.is_not_found());
    }
}
