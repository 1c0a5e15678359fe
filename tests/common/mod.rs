//! Shared setup for integration tests.

#![allow(dead_code)]

use pr_review_service::db::{self, pool::DbPool};
use pr_review_service::services::{AssignmentEngine, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::time::Instant;

/// A fresh database in a temporary directory.
pub struct TestDb {
    _dir: TempDir,
    pub pool: DbPool,
}

pub async fn test_db() -> TestDb {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db"), 4).await.unwrap();
    TestDb { _dir: dir, pool }
}

/// Insert a team with `(user_id, is_active)` members.
pub async fn seed_team(pool: &DbPool, team_name: &str, members: &[(&str, bool)]) {
    sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
        .bind(team_name)
        .execute(pool)
        .await
        .unwrap();

    for (user_id, is_active) in members {
        sqlx::query(
            "INSERT INTO users (user_id, username, team_name, is_active) VALUES (?, ?, ?, ?)",
        )
        .bind(*user_id)
        .bind(format!("user-{}", user_id))
        .bind(team_name)
        .bind(*is_active)
        .execute(pool)
        .await
        .unwrap();
    }
}

pub async fn set_active(pool: &DbPool, user_id: &str, is_active: bool) {
    sqlx::query("UPDATE users SET is_active = ? WHERE user_id = ?")
        .bind(is_active)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn count_pull_requests(pool: &DbPool, pr_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM pull_requests WHERE pull_request_id = ?")
        .bind(pr_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn engine(pool: &DbPool) -> AssignmentEngine {
    AssignmentEngine::new(Arc::new(SqliteStore::new(pool.clone())))
}

pub fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(10)
}
