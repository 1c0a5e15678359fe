//! Data models for the application.
//!
//! These models represent the core entities stored in the SQLite database:
//! teams and their members, pull requests and their assigned reviewers.

pub mod pull_request;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{
    NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus, ReassignOutcome,
    ReviewerCount,
};
pub use team::{Team, TeamMember};
pub use user::{User, UserReviews};
