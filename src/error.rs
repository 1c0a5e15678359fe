//! Application error types.
//!
//! These errors are serializable and carry a stable machine-readable code so
//! the HTTP layer (or any other caller) can render a reason for every failure.

use crate::db::DbError;
use serde::Serialize;
use thiserror::Error;

/// Reason a valid entity refused an operation in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictCode {
    /// A pull request with the same id already exists.
    PrExists,
    /// The pull request is merged; its reviewer set is frozen.
    PrMerged,
    /// The reviewer being replaced is not assigned to the pull request.
    NotAssigned,
    /// No active teammate is available as a replacement.
    NoCandidate,
    /// A team with the same name already exists.
    TeamExists,
}

impl ConflictCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrExists => "PR_EXISTS",
            Self::PrMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::TeamExists => "TEAM_EXISTS",
        }
    }
}

impl std::fmt::Display for ConflictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level errors returned by the services.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Requested resource not found.
    #[error("Not found: {resource}{}", not_found_context(.id, .operation))]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// The entity exists but the operation is not allowed in its current state.
    #[error("Conflict ({code}): {message}")]
    Conflict { code: ConflictCode, message: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// The operation did not finish before its deadline.
    #[error("Timed out: {operation}")]
    Timeout { operation: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a database error without operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Translate a persistence error raised while running `operation`.
    ///
    /// Missing entities become [`AppError::NotFound`]; everything else is
    /// wrapped as a database error. Both name the failing operation.
    pub fn from_db(err: DbError, operation: impl Into<String>) -> Self {
        match err {
            DbError::NotFound { entity, id } => Self::NotFound {
                resource: entity.to_string(),
                id: Some(id),
                operation: Some(operation.into()),
            },
            other => Self::database_with_op(other.to_string(), operation),
        }
    }

    pub fn conflict(code: ConflictCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
            operation: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
            operation: None,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable reason code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { code, .. } => code.as_str(),
            Self::InvalidInput { .. } => "BAD_REQUEST",
            Self::Timeout { .. } => "REQUEST_TIMEOUT",
            Self::Database { .. } | Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// The conflict code, if this is a conflict.
    pub fn conflict_code(&self) -> Option<ConflictCode> {
        match self {
            Self::Conflict { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn not_found_context(id: &Option<String>, operation: &Option<String>) -> String {
    let mut context = String::new();
    if let Some(id) = id {
        context.push_str(&format!(" {id}"));
    }
    if let Some(operation) = operation {
        context.push_str(&format!(" (in {operation})"));
    }
    context
}

// Conversions from common error types

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => Self::not_found_with_id(entity, id),
            other => Self::database(other.to_string()),
        }
    }
}
