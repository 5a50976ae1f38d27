//! Crate-wide error taxonomy.
//!
//! Four failure classes cover the whole pipeline: a locator that cannot be
//! opened, a document that trips the security hardening, a document that is
//! not well-formed, and a path expression that does not parse. Fail-soft
//! callers (`failOnError: false`) may swallow the first and third; security
//! and path errors always propagate.

use thiserror::Error;

/// Errors produced while resolving, parsing, or transforming a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The locator could not be opened: missing file, unreachable URL,
    /// or an archive entry that is not present.
    #[error("source unavailable: {locator}: {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// The document attempted something the hardened parser forbids,
    /// such as entity expansion beyond the configured bounds.
    /// Never suppressed by fail-soft mode.
    #[error("security violation: {0}")]
    SecurityViolation(String),

    /// The document is not well-formed XML. `position` is the byte offset
    /// of the offending construct in the decoded input.
    #[error("malformed document at byte {position}: {message}")]
    MalformedDocument { message: String, position: usize },

    /// The path expression does not conform to the restricted grammar.
    /// Reported before any document is read, independent of fail-soft mode.
    #[error("invalid path expression {expression:?}: {message}")]
    InvalidPathExpression { expression: String, message: String },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>, position: usize) -> Self {
        Error::MalformedDocument {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn unavailable(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SourceUnavailable {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that `failOnError: false` converts into an empty
    /// result instead of propagating.
    pub fn is_soft_failure(&self) -> bool {
        matches!(
            self,
            Error::MalformedDocument { .. } | Error::SourceUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
