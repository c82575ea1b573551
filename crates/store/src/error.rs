use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use ndarray_npy::{ReadNpyError, ReadNpzError, WriteNpyError, WriteNpzError};
use thiserror::Error;

/// Error produced by the mask loader handed to [`MatrixStore::load`](crate::MatrixStore::load).
pub type MaskLoadError = Box<dyn StdError + Send + Sync>;

/// Errors raised while reading or writing cached matrices.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadNpy {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },
    #[error("failed to write {path}: {source}")]
    WriteNpy {
        path: PathBuf,
        #[source]
        source: WriteNpyError,
    },
    #[error("failed to read {path}: {source}")]
    ReadNpz {
        path: PathBuf,
        #[source]
        source: ReadNpzError,
    },
    #[error("failed to write {path}: {source}")]
    WriteNpz {
        path: PathBuf,
        #[source]
        source: WriteNpzError,
    },
    /// Sparse arrays that do not describe a valid matrix.
    #[error("corrupt matrix file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    /// A fallback row mask does not line up with the cached matrix.
    #[error("mask has {mask} entries but {path} has {rows} rows")]
    MaskMismatch {
        path: PathBuf,
        mask: usize,
        rows: usize,
    },
    #[error("failed to compute fallback mask: {0}")]
    Mask(#[source] MaskLoadError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_mismatch_message() {
        let err = StoreError::MaskMismatch {
            path: PathBuf::from("data/event2018/tfidf_dataset/examined.npz"),
            mask: 3,
            rows: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 entries"));
        assert!(msg.contains("4 rows"));
    }

    #[test]
    fn mask_error_keeps_source() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "event2018.tsv");
        let err = StoreError::Mask(Box::new(inner));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("event2018.tsv"));
    }
}
