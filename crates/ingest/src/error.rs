//! Error types produced by the ingest crate.
//!
//! All errors are typed, cloneable and comparable so tests can match on the
//! exact failure.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`Schema`](IngestError::Schema) | Validation | A required column is absent from the header |
//! | [`Timestamp`](IngestError::Timestamp) | Parsing | `created_at` does not match the tweet timestamp format |
//! | [`Io`](IngestError::Io) | I/O | The dataset file could not be opened or read |
//! | [`Csv`](IngestError::Csv) | Parsing | A record is malformed (bad quoting, wrong field count, invalid UTF-8) |
//!
//! ```rust
//! use ingest::IngestError;
//!
//! let err = IngestError::Schema("missing required column `id`".into());
//! assert_eq!(err.to_string(), "schema error: missing required column `id`");
//! ```
use std::path::Path;

use thiserror::Error;

/// Errors that can occur while loading a tweet dataset.
///
/// The enum is marked `#[non_exhaustive]`; callers should keep a catch-all arm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// A column needed by the loader or by an active filter is missing.
    #[error("schema error: {0}")]
    Schema(String),

    /// A `created_at` value could not be parsed.
    ///
    /// Carries the offending row id so the record can be found in the file.
    #[error("invalid timestamp {value:?} for tweet {id}")]
    Timestamp { id: String, value: String },

    /// Reading the dataset file failed.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The tab-separated content is malformed.
    #[error("malformed tsv: {0}")]
    Csv(String),
}

impl IngestError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        IngestError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn missing_column(column: &str) -> Self {
        IngestError::Schema(format!("missing required column `{column}`"))
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_message_names_row() {
        let err = IngestError::Timestamp {
            id: "42".into(),
            value: "yesterday".into(),
        };
        assert_eq!(err.to_string(), "invalid timestamp \"yesterday\" for tweet 42");
    }

    #[test]
    fn missing_column_is_schema_error() {
        assert_eq!(
            IngestError::missing_column("event"),
            IngestError::Schema("missing required column `event`".into())
        );
    }
}
