//! Error types for the query compiler

use thiserror::Error;

/// Result type alias for compiler operations
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Errors that can occur while compiling an s-expression query.
///
/// `Ignored` from the reference design (a dispatch rule "didn't match, try
/// the next") never appears here: it is handled internally via control flow,
/// not surfaced as an error variant.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The query text violates the s-expression grammar or the translator's
    /// structural/semantic rules (nesting, arity, unknown prefix, ...).
    #[error("bad query syntax: {0}")]
    BadQuerySyntax(String),

    /// A backend collaborator (infix parser, regex/date-range helper, ...)
    /// raised a non-syntax failure.
    #[error("backend exception: {0}")]
    XapianException(String),

    /// The diagnostic sink or another I/O-backed collaborator failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error surfaced while round-tripping a saved squery or
    /// a compiled tree.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CompileError {
    /// Build a [`CompileError::BadQuerySyntax`]. Does not log: the
    /// diagnostic sink is the caller-supplied [`crate::backend::Backend`],
    /// not this crate's own `tracing` subscriber, so logging happens at the
    /// call site via `Backend::log` instead (see `translator::bad_syntax`).
    pub(crate) fn bad_syntax(message: impl Into<String>) -> Self {
        Self::BadQuerySyntax(message.into())
    }

    /// Returns a short machine-readable category, for callers building
    /// structured error responses.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::BadQuerySyntax(_) => "BAD_QUERY_SYNTAX",
            Self::XapianException(_) => "BACKEND_EXCEPTION",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
