//! Reviewer assignment engine.
//!
//! Implements the pull request use cases:
//! - Create: insert a pull request and assign up to two active teammates
//! - Merge: move OPEN to MERGED, idempotently
//! - Reassign: swap one reviewer for an active teammate not yet assigned
//! - Statistics: reviewer count per pull request
//!
//! Membership reads that decide an assignment run in the same unit of work
//! as the writes that apply it. Units of work hold the write lock from their
//! first statement, so two reassigns on one pull request see each other's
//! result instead of a shared stale reviewer set.

use crate::db::DbError;
use crate::error::{AppError, ConflictCode};
use crate::models::{NewPullRequest, PullRequest, ReassignOutcome, ReviewerCount};
use crate::services::deadline::with_deadline;
use crate::services::store::{
    PullRequestStore, ReviewStore, TeamMembership, TeammateLookup, UnitOfWork,
};
use std::sync::Arc;
use tokio::time::Instant;

/// Reviewers picked when a pull request is created.
pub const INITIAL_REVIEWERS: i64 = 2;

/// Candidates considered when replacing one reviewer.
const REPLACEMENT_CANDIDATES: i64 = 1;

/// Orchestrates membership lookups and pull request writes.
#[derive(Clone)]
pub struct AssignmentEngine {
    store: Arc<dyn ReviewStore>,
}

impl AssignmentEngine {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Create a pull request and assign its initial reviewers.
    ///
    /// # Returns
    /// The stored pull request, re-read after commit.
    ///
    /// # Errors
    /// * `Conflict(PR_EXISTS)` if the id is taken
    /// * `NotFound` if the author has no team membership
    pub async fn create_pr(
        &self,
        input: NewPullRequest,
        deadline: Instant,
    ) -> Result<PullRequest, AppError> {
        with_deadline("CreatePR", deadline, self.create_pr_inner(input)).await
    }

    async fn create_pr_inner(&self, input: NewPullRequest) -> Result<PullRequest, AppError> {
        let mut session = self
            .store
            .session()
            .await
            .map_err(|e| AppError::from_db(e, "CreatePR: open session"))?;

        match session.pull_request(&input.id).await {
            Ok(_) => return Err(pr_exists(&input.id)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(AppError::from_db(e, "CreatePR: read pull request")),
        }
        drop(session);

        let mut uow = self
            .store
            .begin()
            .await
            .map_err(|e| AppError::from_db(e, "CreatePR: begin transaction"))?;

        let lookup = uow
            .active_teammates(&input.author_id, INITIAL_REVIEWERS)
            .await
            .map_err(|e| AppError::from_db(e, "CreatePR: find teammates"))?;

        let Some(reviewers) = lookup.into_ids() else {
            return Err(AppError::from_db(
                DbError::not_found("User", input.author_id.as_str()),
                "CreatePR: find teammates",
            ));
        };

        uow.create_pull_request(&input)
            .await
            .map_err(|e| match e {
                DbError::AlreadyExists { .. } => pr_exists(&input.id),
                other => AppError::from_db(other, "CreatePR: insert pull request"),
            })?;

        if !reviewers.is_empty() {
            uow.assign_reviewers(&input.id, &reviewers)
                .await
                .map_err(|e| AppError::from_db(e, "CreatePR: assign reviewers"))?;
        }

        uow.commit()
            .await
            .map_err(|e| AppError::from_db(e, "CreatePR: commit"))?;

        log::info!(
            "[assignment] Created {} by {} with reviewers {:?}",
            input.id,
            input.author_id,
            reviewers
        );

        self.reload("CreatePR: reload pull request", &input.id).await
    }

    /// Merge a pull request. Merging a merged pull request returns it unchanged.
    pub async fn merge_pr(&self, pr_id: &str, deadline: Instant) -> Result<PullRequest, AppError> {
        with_deadline("MergePR", deadline, self.merge_pr_inner(pr_id)).await
    }

    async fn merge_pr_inner(&self, pr_id: &str) -> Result<PullRequest, AppError> {
        let mut session = self
            .store
            .session()
            .await
            .map_err(|e| AppError::from_db(e, "MergePR: open session"))?;

        let pr = session
            .pull_request(pr_id)
            .await
            .map_err(|e| AppError::from_db(e, "MergePR: read pull request"))?;

        if pr.is_merged() {
            return Ok(pr);
        }

        session
            .merge_pull_request(pr_id)
            .await
            .map_err(|e| AppError::from_db(e, "MergePR: merge pull request"))?;

        let merged = session
            .pull_request(pr_id)
            .await
            .map_err(|e| AppError::from_db(e, "MergePR: reload pull request"))?;

        log::info!("[assignment] Merged {}", pr_id);

        Ok(merged)
    }

    /// Replace `old_reviewer_id` on a pull request with an active teammate of
    /// the author who is not already assigned.
    ///
    /// # Errors
    /// * `NotFound` if the pull request does not exist
    /// * `Conflict(PR_MERGED)` if it is merged
    /// * `Conflict(NOT_ASSIGNED)` if the reviewer is not assigned
    /// * `Conflict(NO_CANDIDATE)` if nobody can take the slot
    ///
    /// Every failure leaves the reviewer set untouched.
    pub async fn reassign_pr(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
        deadline: Instant,
    ) -> Result<ReassignOutcome, AppError> {
        with_deadline(
            "ReassignPR",
            deadline,
            self.reassign_pr_inner(pr_id, old_reviewer_id),
        )
        .await
    }

    async fn reassign_pr_inner(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<ReassignOutcome, AppError> {
        let mut uow = self
            .store
            .begin()
            .await
            .map_err(|e| AppError::from_db(e, "ReassignPR: begin transaction"))?;

        let pr = uow
            .pull_request(pr_id)
            .await
            .map_err(|e| AppError::from_db(e, "ReassignPR: read pull request"))?;

        if pr.is_merged() {
            return Err(AppError::conflict(
                ConflictCode::PrMerged,
                format!("cannot reassign on merged pull request {}", pr_id),
            ));
        }

        if !pr.has_reviewer(old_reviewer_id) {
            return Err(not_assigned(pr_id, old_reviewer_id));
        }

        let lookup = uow
            .active_teammates_excluding(
                &pr.author_id,
                &pr.assigned_reviewers,
                REPLACEMENT_CANDIDATES,
            )
            .await
            .map_err(|e| AppError::from_db(e, "ReassignPR: find candidate"))?;

        let candidate = match lookup {
            TeammateLookup::UnknownAuthor => {
                log::warn!(
                    "[assignment] Author {} of {} has no team membership",
                    pr.author_id,
                    pr_id
                );
                None
            }
            TeammateLookup::NoCandidate => None,
            TeammateLookup::Found(ids) => ids.into_iter().next(),
        };

        let Some(replacement) = candidate else {
            return Err(AppError::conflict(
                ConflictCode::NoCandidate,
                format!("no active replacement candidate in team for {}", pr_id),
            ));
        };

        uow.unassign_reviewer(pr_id, old_reviewer_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    not_assigned(pr_id, old_reviewer_id)
                } else {
                    AppError::from_db(e, "ReassignPR: unassign reviewer")
                }
            })?;

        uow.assign_reviewer(pr_id, &replacement)
            .await
            .map_err(|e| AppError::from_db(e, "ReassignPR: assign reviewer"))?;

        uow.commit()
            .await
            .map_err(|e| AppError::from_db(e, "ReassignPR: commit"))?;

        log::info!(
            "[assignment] Reassigned {} from {} to {}",
            pr_id,
            old_reviewer_id,
            replacement
        );

        let pull_request = self.reload("ReassignPR: reload pull request", pr_id).await?;

        Ok(ReassignOutcome {
            pull_request,
            replaced_by: replacement,
        })
    }

    /// Reviewer count for every pull request, ordered by pull request id.
    pub async fn statistics(&self, deadline: Instant) -> Result<Vec<ReviewerCount>, AppError> {
        with_deadline("Statistics", deadline, async {
            let mut session = self
                .store
                .session()
                .await
                .map_err(|e| AppError::from_db(e, "Statistics: open session"))?;

            session
                .reviewer_counts()
                .await
                .map_err(|e| AppError::from_db(e, "Statistics: count reviewers"))
        })
        .await
    }

    async fn reload(&self, operation: &'static str, pr_id: &str) -> Result<PullRequest, AppError> {
        let mut session = self
            .store
            .session()
            .await
            .map_err(|e| AppError::from_db(e, operation))?;

        session
            .pull_request(pr_id)
            .await
            .map_err(|e| AppError::from_db(e, operation))
    }
}

fn pr_exists(pr_id: &str) -> AppError {
    AppError::conflict(
        ConflictCode::PrExists,
        format!("pull request {} already exists", pr_id),
    )
}

fn not_assigned(pr_id: &str, reviewer_id: &str) -> AppError {
    AppError::conflict(
        ConflictCode::NotAssigned,
        format!("reviewer {} is not assigned to {}", reviewer_id, pr_id),
    )
}
