//! Repository contracts consumed by the assignment engine.
//!
//! The engine never talks to SQLite directly. It asks a [`ReviewStore`] for
//! either a plain pooled [`Session`] or a [`UnitOfWork`] and drives the
//! membership and pull request capabilities through those handles. An
//! uncommitted unit of work rolls back when dropped.

use crate::db::pool::{self, DbPool};
use crate::db::{pull_requests, teams, DbError};
use crate::models::{NewPullRequest, PullRequest, ReviewerCount};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::ops::DerefMut;

pub use crate::db::teams::TeammateLookup;

/// Read access to team membership, used to pick reviewers.
#[async_trait]
pub trait TeamMembership: Send {
    /// Up to `limit` active teammates of `author_id`, author excluded.
    async fn active_teammates(
        &mut self,
        author_id: &str,
        limit: i64,
    ) -> Result<TeammateLookup, DbError> {
        self.active_teammates_excluding(author_id, &[], limit).await
    }

    /// Up to `limit` active teammates of `author_id` that are not in `excluded`.
    async fn active_teammates_excluding(
        &mut self,
        author_id: &str,
        excluded: &[String],
        limit: i64,
    ) -> Result<TeammateLookup, DbError>;
}

/// Pull request records and their reviewer assignment edges.
#[async_trait]
pub trait PullRequestStore: Send {
    async fn create_pull_request(&mut self, pr: &NewPullRequest) -> Result<(), DbError>;

    async fn pull_request(&mut self, pr_id: &str) -> Result<PullRequest, DbError>;

    async fn merge_pull_request(&mut self, pr_id: &str) -> Result<(), DbError>;

    async fn assign_reviewer(&mut self, pr_id: &str, reviewer_id: &str) -> Result<(), DbError>;

    async fn assign_reviewers(&mut self, pr_id: &str, reviewer_ids: &[String])
        -> Result<(), DbError>;

    /// Remove one reviewer from one pull request; `NotFound` if not assigned.
    async fn unassign_reviewer(&mut self, pr_id: &str, reviewer_id: &str)
        -> Result<(), DbError>;

    async fn reviewer_counts(&mut self) -> Result<Vec<ReviewerCount>, DbError>;
}

/// Both capabilities over a single connection.
pub trait Session: TeamMembership + PullRequestStore {}

impl<T: TeamMembership + PullRequestStore + ?Sized> Session for T {}

/// A session running inside a transaction.
#[async_trait]
pub trait UnitOfWork: Session {
    async fn commit(self: Box<Self>) -> Result<(), DbError>;
}

/// Hands out sessions and units of work.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// A non-transactional session on a pooled connection.
    async fn session(&self) -> Result<Box<dyn Session>, DbError>;

    /// Start a unit of work. Units of work are serialized against each other.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DbError>;
}

/// SQLite-backed session over any connection handle.
pub struct SqliteSession<C> {
    conn: C,
}

impl<C> SqliteSession<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> TeamMembership for SqliteSession<C>
where
    C: DerefMut<Target = SqliteConnection> + Send,
{
    async fn active_teammates_excluding(
        &mut self,
        author_id: &str,
        excluded: &[String],
        limit: i64,
    ) -> Result<TeammateLookup, DbError> {
        teams::active_teammates(&mut *self.conn, author_id, excluded, limit).await
    }
}

#[async_trait]
impl<C> PullRequestStore for SqliteSession<C>
where
    C: DerefMut<Target = SqliteConnection> + Send,
{
    async fn create_pull_request(&mut self, pr: &NewPullRequest) -> Result<(), DbError> {
        pull_requests::insert(&mut *self.conn, pr).await
    }

    async fn pull_request(&mut self, pr_id: &str) -> Result<PullRequest, DbError> {
        pull_requests::get_by_id(&mut *self.conn, pr_id).await
    }

    async fn merge_pull_request(&mut self, pr_id: &str) -> Result<(), DbError> {
        pull_requests::merge(&mut *self.conn, pr_id).await
    }

    async fn assign_reviewer(&mut self, pr_id: &str, reviewer_id: &str) -> Result<(), DbError> {
        pull_requests::assign_reviewer(&mut *self.conn, pr_id, reviewer_id).await
    }

    async fn assign_reviewers(
        &mut self,
        pr_id: &str,
        reviewer_ids: &[String],
    ) -> Result<(), DbError> {
        pull_requests::assign_reviewers(&mut *self.conn, pr_id, reviewer_ids).await
    }

    async fn unassign_reviewer(
        &mut self,
        pr_id: &str,
        reviewer_id: &str,
    ) -> Result<(), DbError> {
        pull_requests::unassign_reviewer(&mut *self.conn, pr_id, reviewer_id).await
    }

    async fn reviewer_counts(&mut self) -> Result<Vec<ReviewerCount>, DbError> {
        pull_requests::reviewer_counts(&mut *self.conn).await
    }
}

#[async_trait]
impl UnitOfWork for SqliteSession<Transaction<'static, Sqlite>> {
    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.conn.commit().await?;
        Ok(())
    }
}

/// [`ReviewStore`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for SqliteStore {
    async fn session(&self) -> Result<Box<dyn Session>, DbError> {
        let conn: PoolConnection<Sqlite> = self.pool.acquire().await?;
        Ok(Box::new(SqliteSession::new(conn)))
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DbError> {
        let tx = pool::begin_write(&self.pool).await?;
        Ok(Box::new(SqliteSession::new(tx)))
    }
}
