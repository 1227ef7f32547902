//! # Error Types
//!
//! All fallible operations in this crate return [`SszError`]. The variants
//! form the complete failure surface of the codec and the hasher:
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | `SizeMismatch` | fixed-size fields whose payload length disagrees with the schema |
//! | `UnexpectedEnd` | decoder reads past the end of the input buffer |
//! | `InvalidOffset` | malformed offset tables (non-monotonic, out of range, or too large to encode) |
//! | `LimitExceeded` | lists or bit-lists longer than their declared maximum |
//! | `InvalidBitlist` | missing or misplaced delimiter bits |
//! | `InvalidSchema` | shape violations in a schema definition |
//! | `CircularReference` | reference cycles detected via the resolution iteration cap |
//! | `UnsupportedType` | kinds the codec does not encode (unions, null values) |
//!
//! Errors are wrapped with field context as they propagate out of nested
//! containers, so a failure deep inside a decode reports the full field
//! path (`"body: deposits: unexpected end of buffer"`).

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = SszError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SszError {
    #[error("size mismatch: expected {expected} bytes, got {got} bytes")]
    SizeMismatch { expected: usize, got: usize },

    #[error("unexpected end of buffer")]
    UnexpectedEnd,

    #[error("invalid offset {offset} (bound {bound})")]
    InvalidOffset { offset: usize, bound: usize },

    #[error("length limit exceeded: limit {limit}, got {got}")]
    LimitExceeded { limit: usize, got: usize },

    #[error("invalid bitlist: {0}")]
    InvalidBitlist(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("possible circular reference at field '{0}'")]
    CircularReference(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("{path}: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<SszError>,
    },
}

impl SszError {
    /// Wraps the error with a field-path segment. Chained wrapping builds
    /// the full path from the outermost container down to the failing leaf.
    pub fn at(self, path: impl Into<String>) -> SszError {
        SszError::Context {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Unwraps any field context and returns the underlying error.
    pub fn root_cause(&self) -> &SszError {
        let mut err = self;
        while let SszError::Context { source, .. } = err {
            err = source;
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_reports_both_sizes() {
        let err = SszError::SizeMismatch {
            expected: 32,
            got: 16,
        };
        assert_eq!(
            err.to_string(),
            "size mismatch: expected 32 bytes, got 16 bytes"
        );
    }

    #[test]
    fn context_chains_field_paths() {
        let err = SszError::UnexpectedEnd.at("deposits").at("body");
        assert_eq!(err.to_string(), "body: deposits: unexpected end of buffer");
    }

    #[test]
    fn root_cause_strips_context() {
        let err = SszError::LimitExceeded { limit: 4, got: 9 }
            .at("validators")
            .at("state");
        assert!(matches!(
            err.root_cause(),
            SszError::LimitExceeded { limit: 4, got: 9 }
        ));
    }
}
