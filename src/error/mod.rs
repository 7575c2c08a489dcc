//! Error types and handling for `beads_rust`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for the CLI/ambient layers only; the core
//!   never constructs an `Other` variant itself
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for AI coding agents

mod context;
mod structured;

pub use context::{OptionExt, ResultExt};
pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `beads_rust` operations.
#[derive(Error, Debug)]
pub enum BeadsError {
    // === Issue Errors ===
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    #[error("Issue ID collision: {id}")]
    IdCollision { id: String },

    #[error("Ambiguous ID '{partial}': matches {matches:?}")]
    AmbiguousId {
        partial: String,
        matches: Vec<String>,
    },

    #[error("Invalid issue ID format: {id}")]
    InvalidId { id: String },

    /// The ID generator could not find a free hash after 256 retries.
    #[error("Could not generate a unique id for prefix '{prefix}' after 256 attempts")]
    CollisionLimitExceeded { prefix: String },

    // === Validation Errors ===
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    #[error("Invalid issue type: {issue_type}")]
    InvalidType { issue_type: String },

    #[error("Priority must be 0-4, got: {priority}")]
    InvalidPriority { priority: i32 },

    /// Optimistic concurrency check failed: the stored version moved on.
    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict { id: String, expected: u64, actual: u64 },

    // === JSONL / snapshot errors ===
    #[error("JSONL parse error at line {line}: {reason}")]
    JsonlParse { line: usize, reason: String },

    #[error("Prefix mismatch: expected '{expected}', found '{found}'")]
    PrefixMismatch { expected: String, found: String },

    #[error("Import collision: {count} issues have conflicting content")]
    ImportCollision { count: usize },

    /// The snapshot file could not be parsed at all (not just a bad line).
    #[error("Snapshot parse error: {reason}")]
    SnapshotParseError { reason: String },

    /// The write-ahead log is corrupted beyond the tolerable tail-truncation case.
    #[error("WAL corrupted at offset {offset}: {reason}")]
    WalCorrupted { offset: u64, reason: String },

    /// A pre-flight scan found VCS merge conflict markers in a workspace file.
    #[error("Merge conflict markers detected in {path}")]
    MergeConflictDetected { path: PathBuf },

    // === Dependency Errors ===
    #[error("Cycle detected in dependencies: {path}")]
    CycleDetected { path: String },

    #[error("Cannot delete: {id} has {count} dependents")]
    HasDependents { id: String, count: usize },

    #[error("Issue cannot depend on itself: {id}")]
    SelfDependency { id: String },

    #[error("Dependency target not found: {id}")]
    DependencyNotFound { id: String },

    #[error("Dependency already exists: {from} -> {to}")]
    DuplicateDependency { from: String, to: String },

    // === File lock errors ===
    /// Could not acquire the workspace lock within the configured timeout.
    #[error("Timed out after {timeout_ms}ms waiting for lock at {path}")]
    LockTimeout { path: PathBuf, timeout_ms: u64 },

    // === Configuration / workspace errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace not initialized: run 'br init' first")]
    WorkspaceNotInitialized,

    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    /// On-disk schema is newer than this binary supports.
    #[error("Workspace schema version {found} is newer than the {supported} this binary supports")]
    SchemaTooNew { found: u32, supported: u32 },

    /// A forward-only migration step failed.
    #[error("Schema migration failed: {reason}")]
    SchemaMigrationFailed { reason: String },

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors (ambient/CLI layers only) ===
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl BeadsError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::WorkspaceNotInitialized
                | Self::IssueNotFound { .. }
                | Self::Validation { .. }
                | Self::InvalidStatus { .. }
                | Self::InvalidType { .. }
                | Self::InvalidPriority { .. }
                | Self::PrefixMismatch { .. }
                | Self::AmbiguousId { .. }
                | Self::VersionConflict { .. }
                | Self::LockTimeout { .. }
        )
    }

    /// Should we suggest re-running with --force?
    #[must_use]
    pub const fn suggests_force(&self) -> bool {
        matches!(
            self,
            Self::HasDependents { .. }
                | Self::ImportCollision { .. }
                | Self::AlreadyInitialized { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::WorkspaceNotInitialized => Some("Run: br init"),
            Self::AmbiguousId { .. } => Some("Provide more characters of the ID"),
            Self::HasDependents { .. } => Some("Use --force or --cascade to delete anyway"),
            Self::ImportCollision { .. } => Some("Use --force to overwrite or resolve manually"),
            Self::CycleDetected { .. } => Some("Remove one dependency to break the cycle"),
            Self::SelfDependency { .. } => Some("An issue cannot depend on itself"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::VersionConflict { .. } => Some("Reload the issue and retry with its current version"),
            Self::LockTimeout { .. } => Some("Another process is holding the workspace lock; retry shortly"),
            Self::MergeConflictDetected { .. } => {
                Some("Resolve the merge conflict markers before syncing")
            }
            Self::InvalidPriority { .. } => {
                Some("Use a priority between 0 (critical) and 4 (backlog)")
            }
            Self::InvalidStatus { .. } => {
                Some("Valid statuses: open, in_progress, blocked, deferred, closed")
            }
            Self::InvalidType { .. } => Some("Valid types: task, bug, feature, epic, chore"),
            _ => None,
        }
    }

    /// Process exit code for this error, per the CLI collaborator's mapping
    /// (0 success, 1 generic user error, 2 not found, 3 version conflict,
    /// 4 lock timeout, 5 merge conflict detected, 6 workspace not
    /// initialized). The core returns tagged errors; only the CLI binary
    /// consults this.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::IssueNotFound { .. } | Self::DependencyNotFound { .. } => 2,
            Self::VersionConflict { .. } => 3,
            Self::LockTimeout { .. } => 4,
            Self::MergeConflictDetected { .. } => 5,
            Self::WorkspaceNotInitialized => 6,
            _ => 1,
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `BeadsError`.
pub type Result<T> = std::result::Result<T, BeadsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BeadsError::IssueNotFound {
            id: "bd-abc123".to_string(),
        };
        assert_eq!(err.to_string(), "Issue not found: bd-abc123");
    }

    #[test]
    fn test_validation_error() {
        let err = BeadsError::validation("title", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: title: cannot be empty");
    }

    #[test]
    fn test_user_recoverable() {
        assert!(BeadsError::WorkspaceNotInitialized.is_user_recoverable());
        assert!(!BeadsError::SchemaMigrationFailed {
            reason: "boom".to_string()
        }
        .is_user_recoverable());
    }

    #[test]
    fn test_suggestion() {
        let err = BeadsError::WorkspaceNotInitialized;
        assert_eq!(err.suggestion(), Some("Run: br init"));

        let err = BeadsError::AmbiguousId {
            partial: "bd-a".to_string(),
            matches: vec!["bd-abc".to_string(), "bd-abd".to_string()],
        };
        assert_eq!(err.suggestion(), Some("Provide more characters of the ID"));
    }

    #[test]
    fn test_validation_error_struct() {
        let err = ValidationError::new("priority", "must be 0-4");
        assert_eq!(err.to_string(), "priority: must be 0-4");
    }

    #[test]
    fn exit_codes_partition_by_category() {
        assert_eq!(BeadsError::WorkspaceNotInitialized.exit_code(), 6);
        assert_eq!(
            BeadsError::VersionConflict {
                id: "bd-1".to_string(),
                expected: 1,
                actual: 2
            }
            .exit_code(),
            3
        );
        assert_eq!(
            BeadsError::LockTimeout {
                path: "/tmp/.beads/beads.lock".into(),
                timeout_ms: 5000
            }
            .exit_code(),
            4
        );
        assert_eq!(
            BeadsError::MergeConflictDetected {
                path: "/tmp/.beads/issues.jsonl".into()
            }
            .exit_code(),
            5
        );
        assert_eq!(BeadsError::IssueNotFound { id: "bd-1".to_string() }.exit_code(), 2);
        assert_eq!(BeadsError::InvalidPriority { priority: 9 }.exit_code(), 1);
    }
}
