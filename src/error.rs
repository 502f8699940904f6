//! Error taxonomy for index operations.
//!
//! All failures are synchronous return values; nothing here is recovered
//! internally. Validation happens before any mutation, so an error from
//! [`Index::insert`](crate::Index::insert) leaves the graph untouched.

use thiserror::Error;

/// Errors surfaced by index construction, insertion, and search.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A configuration field failed validation.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The vector's dimension differs from the dimension established by the
    /// first insert.
    #[error("dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the first insert.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// Insert or query received a zero-length vector.
    #[error("vector must not be empty")]
    EmptyVector,

    /// The id is already present in the index.
    #[error("duplicate id {0}")]
    DuplicateId(u32),

    /// Ids must be assigned densely in insertion order (0, 1, 2, …).
    #[error("non-contiguous id {id}: the next insert must use id {expected}")]
    NonContiguousId {
        /// The offending id.
        id: u32,
        /// The id the index expected.
        expected: u32,
    },

    /// `k` must be at least 1.
    #[error("k must be at least 1")]
    InvalidK,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::ConfigInvalid("m must be positive".into()).to_string(),
            "invalid configuration: m must be positive"
        );
        assert_eq!(
            Error::DimensionMismatch {
                expected: 4,
                actual: 3
            }
            .to_string(),
            "dimension mismatch: index holds 4-dimensional vectors, got 3"
        );
        assert_eq!(Error::DuplicateId(7).to_string(), "duplicate id 7");
    }
}
