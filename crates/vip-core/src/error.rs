//! # Error Module
//!
//! Error taxonomy shared by the store and the app layer.
//!
//! The resolver itself never fails; every variant here originates from
//! input validation, a missing user, or the storage backend.

use thiserror::Error;

/// Errors produced by VIP core operations.
#[derive(Debug, Error)]
pub enum VipError {
    /// A request field is missing, malformed, or out of range.
    #[error("{0}")]
    Validation(String),

    /// The referenced user does not exist.
    #[error("user not found: {0}")]
    NotFound(String),

    /// A tier table violates the ordering invariant.
    #[error("invalid tier table: {0}")]
    InvalidTierTable(String),

    /// The redb backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    /// A stored row could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    /// Filesystem error outside redb (e.g. removing a database file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// redb splits its errors per operation; all of them collapse into `Storage`.
macro_rules! impl_from_redb {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for VipError {
                fn from(err: $err) -> Self {
                    Self::Storage(err.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl VipError {
    /// Whether the failure was caused by the caller rather than the system.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// Result alias for VIP core operations.
pub type Result<T> = std::result::Result<T, VipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(VipError::Validation("points required".into()).is_client_error());
        assert!(VipError::NotFound("alice".into()).is_client_error());
        assert!(!VipError::InvalidTierTable("empty".into()).is_client_error());
    }

    #[test]
    fn not_found_message_names_user() {
        let err = VipError::NotFound("alice".into());
        assert_eq!(err.to_string(), "user not found: alice");
    }
}
