//! Database queries for pull requests and reviewer assignments.

use super::{is_unique_violation, DbError};
use crate::models::{NewPullRequest, PullRequest, PullRequestStatus, ReviewerCount};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

#[derive(Debug, FromRow)]
struct PullRequestRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
    created_at: i64,
    merged_at: Option<i64>,
}

impl PullRequestRow {
    fn into_pull_request(self, assigned_reviewers: Vec<String>) -> PullRequest {
        PullRequest {
            status: PullRequestStatus::from(self.status.as_str()),
            id: self.pull_request_id,
            name: self.pull_request_name,
            author_id: self.author_id,
            assigned_reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        }
    }
}

/// Insert a new OPEN pull request.
///
/// Timestamps and status come from column defaults.
pub async fn insert(conn: &mut SqliteConnection, pr: &NewPullRequest) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(pr.id.as_str())
    .bind(pr.name.as_str())
    .bind(pr.author_id.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::AlreadyExists {
                entity: "PullRequest",
                id: pr.id.clone(),
            }
        } else {
            DbError::from(e)
        }
    })?;

    Ok(())
}

/// Get a pull request with its reviewers.
pub async fn get_by_id(conn: &mut SqliteConnection, pr_id: &str) -> Result<PullRequest, DbError> {
    let row: Option<PullRequestRow> = sqlx::query_as(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = ?
        "#,
    )
    .bind(pr_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Err(DbError::not_found("PullRequest", pr_id));
    };

    let reviewers = reviewers(conn, pr_id).await?;

    Ok(row.into_pull_request(reviewers))
}

/// Reviewer ids assigned to a pull request, ascending.
pub async fn reviewers(conn: &mut SqliteConnection, pr_id: &str) -> Result<Vec<String>, DbError> {
    let reviewers = sqlx::query_scalar(
        r#"
        SELECT reviewer_user_id
        FROM assigned_reviewers
        WHERE pull_request_id = ?
        ORDER BY reviewer_user_id
        "#,
    )
    .bind(pr_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(reviewers)
}

/// Mark a pull request as merged.
///
/// `merged_at` keeps its first value if the row was already merged.
pub async fn merge(conn: &mut SqliteConnection, pr_id: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        r#"
        UPDATE pull_requests
        SET status = 'MERGED',
            merged_at = COALESCE(merged_at, strftime('%s', 'now'))
        WHERE pull_request_id = ?
        "#,
    )
    .bind(pr_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("PullRequest", pr_id));
    }

    Ok(())
}

/// Assign one reviewer. Assigning an existing pair is a no-op.
pub async fn assign_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer_id: &str,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO assigned_reviewers (pull_request_id, reviewer_user_id)
        VALUES (?, ?)
        ON CONFLICT (pull_request_id, reviewer_user_id) DO NOTHING
        "#,
    )
    .bind(pr_id)
    .bind(reviewer_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Assign several reviewers in one statement. Empty input is a no-op.
pub async fn assign_reviewers(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer_ids: &[String],
) -> Result<(), DbError> {
    if reviewer_ids.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "INSERT INTO assigned_reviewers (pull_request_id, reviewer_user_id) ",
    );
    query.push_values(reviewer_ids, |mut row, reviewer_id| {
        row.push_bind(pr_id).push_bind(reviewer_id.as_str());
    });
    query.push(" ON CONFLICT (pull_request_id, reviewer_user_id) DO NOTHING");

    query.build().execute(&mut *conn).await?;

    Ok(())
}

/// Remove one reviewer from one pull request.
///
/// Fails with `NotFound` if the reviewer was not assigned.
pub async fn unassign_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer_id: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "DELETE FROM assigned_reviewers WHERE pull_request_id = ? AND reviewer_user_id = ?",
    )
    .bind(pr_id)
    .bind(reviewer_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(
            "ReviewerAssignment",
            format!("{}/{}", pr_id, reviewer_id),
        ));
    }

    Ok(())
}

/// Reviewer count for every pull request, ordered by pull request id.
pub async fn reviewer_counts(conn: &mut SqliteConnection) -> Result<Vec<ReviewerCount>, DbError> {
    let counts = sqlx::query_as::<_, ReviewerCount>(
        r#"
        SELECT pr.pull_request_id, COUNT(ar.reviewer_user_id) AS reviewer_count
        FROM pull_requests pr
        LEFT JOIN assigned_reviewers ar ON ar.pull_request_id = pr.pull_request_id
        GROUP BY pr.pull_request_id
        ORDER BY pr.pull_request_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(counts)
}
