//! Pull request model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a pull request.
///
/// `Open` is the initial state and `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl From<&str> for PullRequestStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request together with its assigned reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Caller-supplied, globally unique id.
    pub id: String,

    pub name: String,

    pub author_id: String,

    pub status: PullRequestStatus,

    /// Reviewer user ids, ascending. Never contains the author.
    pub assigned_reviewers: Vec<String>,

    /// Creation timestamp (Unix), set by the database.
    pub created_at: i64,

    /// Merge timestamp (Unix), stamped once on OPEN -> MERGED.
    pub merged_at: Option<i64>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    /// Check whether `user_id` is currently assigned as a reviewer.
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }
}

/// Input for creating a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: String,

    #[serde(rename = "pull_request_name")]
    pub name: String,

    pub author_id: String,
}

/// Result of a successful reviewer reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignOutcome {
    pub pull_request: PullRequest,

    /// The teammate who took over the vacated reviewer slot.
    pub replaced_by: String,
}

/// Number of reviewers currently assigned to one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ReviewerCount {
    pub pull_request_id: String,

    #[serde(rename = "quantity_reviewers")]
    pub reviewer_count: i64,
}

/// Pull request summary used in per-user review listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(status: PullRequestStatus, reviewers: &[&str]) -> PullRequest {
        PullRequest {
            id: "pr-1".into(),
            name: "x".into(),
            author_id: "u1".into(),
            status,
            assigned_reviewers: reviewers.iter().map(|r| r.to_string()).collect(),
            created_at: 0,
            merged_at: None,
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(PullRequestStatus::from("OPEN"), PullRequestStatus::Open);
        assert_eq!(PullRequestStatus::from("merged"), PullRequestStatus::Merged);
        assert_eq!(PullRequestStatus::from("unknown"), PullRequestStatus::Open);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PullRequestStatus::Open.to_string(), "OPEN");
        assert_eq!(PullRequestStatus::Merged.to_string(), "MERGED");
    }

    #[test]
    fn test_has_reviewer() {
        let pr = pr(PullRequestStatus::Open, &["u2", "u3"]);
        assert!(pr.has_reviewer("u2"));
        assert!(!pr.has_reviewer("u1"));
        assert!(!pr.is_merged());
    }

    #[test]
    fn test_new_pull_request_uses_wire_names() {
        let input: NewPullRequest = serde_json::from_str(
            r#"{"pull_request_id":"pr-1","pull_request_name":"x","author_id":"u1"}"#,
        )
        .unwrap();
        assert_eq!(input.id, "pr-1");
        assert_eq!(input.name, "x");
        assert_eq!(input.author_id, "u1");
    }
}
