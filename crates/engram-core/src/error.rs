//! Internal error types shared by the bitemporal, schema, and validator
//! modules. None of these are ever surfaced to an HTTP client directly —
//! `engram-server` maps each variant to a `VALIDATION_ERROR` response with
//! code-specific `details`, per the error taxonomy.

/// Errors raised by `engram-core`.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A bitemporal interval was malformed (inverted bounds, or a start past
    /// [`crate::MAX_DATE`]).
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// A schema registry failed validation at construction time.
    #[error("schema error: {0}")]
    Schema(String),

    /// A user-submitted path expression used a write keyword.
    #[error("read-only violation: {0}")]
    ReadOnlyViolation(String),

    /// A user-submitted path expression referenced an unknown node label or
    /// edge type.
    #[error("unknown symbol: {name}")]
    UnknownSymbol {
        name: String,
        suggestions: Vec<String>,
    },
}

/// Result alias for `engram-core` operations.
pub type Result<T> = std::result::Result<T, Error>;
