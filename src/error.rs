//! Error types for pal-abtest
//!
//! "No treatment" outcomes (unknown experiment, experiment not running,
//! subject outside the traffic gate, no variants) are not errors. They come
//! back as `None`, `false` or empty results. The variants below cover what
//! remains: uniqueness conflicts at the storage boundary, bad administrative
//! input, and I/O against the durable journal.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// pal-abtest error types
#[derive(Error, Debug)]
pub enum Error {
    /// A uniqueness constraint rejected the write (the row already exists)
    #[error("Duplicate {entity}: {key} already exists")]
    Duplicate {
        /// Kind of row that collided (experiment, variant, assignment, conversion)
        entity: &'static str,
        /// Natural key of the existing row
        key: String,
    },

    /// Referenced row does not exist (administrative paths only)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid administrative input (weights, traffic percentage, identifiers)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Journal line could not be replayed
    #[error("Corrupt journal at line {line}: {reason}")]
    Corrupt {
        /// 1-based line number in the journal file
        line: usize,
        /// Parser message
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::Duplicate`] for the given entity and key.
    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    /// True when this error is a uniqueness conflict.
    ///
    /// The assignment and conversion paths treat conflicts as "already
    /// exists" rather than failures.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}
