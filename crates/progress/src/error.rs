//! Error taxonomy for ledger operations.

use serde::{Deserialize, Serialize};
use studymate_core::ParseStatusError;
use studymate_storage::StorageError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledgers and the reminder registry.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Bad input shape or value; never worth retrying
    #[error("validation error: {0}")]
    Validation(String),

    /// Expected absence, e.g. a roadmap with no recorded milestones
    #[error("not found: {0}")]
    NotFound(String),

    /// Backing store failure; callers may retry
    #[error("store error: {0}")]
    Store(#[from] StorageError),

    /// Stored value does not match the expected record shape or version
    #[error("schema error for '{key}': {reason}")]
    Schema {
        /// Store key holding the bad value
        key: String,
        /// What was wrong
        reason: String,
    },
}

impl From<ParseStatusError> for LedgerError {
    fn from(e: ParseStatusError) -> Self {
        LedgerError::Validation(e.to_string())
    }
}

/// Kind tag of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failure
    Validation,
    /// Record absent
    NotFound,
    /// Store I/O failure
    Store,
    /// Stored record malformed
    Schema,
}

impl ErrorKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Store => "store",
            ErrorKind::Schema => "schema",
        }
    }
}

/// Error converted to a plain kind + message pair for callers across a
/// process or protocol boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedError {
    /// Error kind
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
}

impl LedgerError {
    /// Kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Store(_) => ErrorKind::Store,
            LedgerError::Schema { .. } => ErrorKind::Schema,
        }
    }

    /// Convert to the tagged form.
    pub fn to_tagged(&self) -> TaggedError {
        TaggedError {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Whether this is the expected-absence case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }

    pub(crate) fn schema(key: &str, reason: impl Into<String>) -> Self {
        LedgerError::Schema {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<LedgerError> for TaggedError {
    fn from(e: LedgerError) -> Self {
        e.to_tagged()
    }
}

/// Reject empty or whitespace-only identifiers.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let not_found = LedgerError::NotFound("progress:x".to_string());
        let store = LedgerError::Store(StorageError::Other("disk gone".to_string()));
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(store.kind(), ErrorKind::Store);
        assert!(not_found.is_not_found());
        assert!(!store.is_not_found());
    }

    #[test]
    fn test_tagged_form_serializes_kind() {
        let err: LedgerError = "finished".parse::<studymate_core::MilestoneStatus>().unwrap_err().into();
        let tagged = err.to_tagged();
        assert_eq!(tagged.kind, ErrorKind::Validation);
        assert!(tagged.message.contains("finished"));

        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["kind"], "validation");
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("roadmap_id", "py101").is_ok());
        assert!(matches!(
            require_non_empty("roadmap_id", "  "),
            Err(LedgerError::Validation(_))
        ));
    }
}
