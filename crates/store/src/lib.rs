//! Feature-matrix cache.
//!
//! Matrices are keyed by [`CacheKey`] and stored next to the datasets:
//! dense ones as `.npy`, sparse ones as a CSR `.npz` archive. When the exact
//! matrix is missing, a matrix computed on a superset of the rows can be
//! reused through a [`FallbackRule`]; the caller supplies the row mask because
//! only it knows how to load the source dataset.
//!
//! ```no_run
//! use embed::ModelKind;
//! use ingest::DatasetSource;
//! use store::{CacheKey, MatrixStore};
//!
//! let key = CacheKey::new("data", DatasetSource::Event2018, ModelKind::SbertSts);
//! let cached = MatrixStore::new()
//!     .load(&key, |_source, _field| Ok::<_, std::io::Error>(Vec::new()))
//!     .unwrap();
//! assert!(cached.is_none());
//! ```

mod error;
mod fallback;
mod io;
mod key;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use embed::Matrix;
use ingest::Field;
use tracing::{debug, info};

pub use crate::error::{MaskLoadError, StoreError};
pub use crate::fallback::FallbackRule;
pub use crate::key::CacheKey;

/// Extension of dense matrix files.
pub const DENSE_EXTENSION: &str = "npy";
/// Extension of sparse matrix files.
pub const SPARSE_EXTENSION: &str = "npz";

fn with_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Reads and writes cached matrices.
///
/// Sparse archives carry no scipy `format` member, so `scipy.sparse.load_npz`
/// rejects them; build `csr_matrix((data, indices, indptr), shape)` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixStore {
    compress: bool,
}

impl Default for MatrixStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStore {
    /// Store writing deflate-compressed `.npz` archives.
    pub fn new() -> Self {
        Self { compress: true }
    }

    /// Store writing uncompressed `.npz` archives.
    pub fn uncompressed() -> Self {
        Self { compress: false }
    }

    /// Existing cache file for `key`, `.npy` first.
    pub fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let base = key.path();
        [DENSE_EXTENSION, SPARSE_EXTENSION]
            .into_iter()
            .map(|ext| with_extension(&base, ext))
            .find(|path| path.is_file())
    }

    /// Writes `matrix` for `key`, replacing a cached matrix of the other
    /// storage kind. Returns the written path.
    pub fn save(&self, key: &CacheKey, matrix: &Matrix) -> Result<PathBuf, StoreError> {
        let base = key.path();
        if let Some(parent) = base.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let (path, stale) = match matrix {
            Matrix::Dense(dense) => {
                let path = with_extension(&base, DENSE_EXTENSION);
                io::write_dense(&path, dense)?;
                (path, with_extension(&base, SPARSE_EXTENSION))
            }
            Matrix::Sparse(sparse) => {
                let path = with_extension(&base, SPARSE_EXTENSION);
                io::write_sparse(&path, sparse, self.compress)?;
                (path, with_extension(&base, DENSE_EXTENSION))
            }
        };
        io::remove_stale(&stale)?;
        info!(
            path = %path.display(),
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            sparse = matrix.is_sparse(),
            "matrix_saved"
        );
        Ok(path)
    }

    /// Reads a matrix file, the storage kind taken from its extension.
    pub fn read(&self, path: &Path) -> Result<Matrix, StoreError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(DENSE_EXTENSION) => io::read_dense(path).map(Matrix::Dense),
            Some(SPARSE_EXTENSION) => io::read_sparse(path).map(Matrix::Sparse),
            _ => Err(StoreError::corrupt(path, "unknown matrix file extension")),
        }
    }

    /// Cached matrix for `key`, exact or derived through a [`FallbackRule`].
    ///
    /// `mask_loader` is called with the source key of the applied rule and
    /// the field whose presence selects rows. Returns `Ok(None)` when neither
    /// the matrix nor any fallback source is cached.
    pub fn load<F, E>(&self, key: &CacheKey, mut mask_loader: F) -> Result<Option<Matrix>, StoreError>
    where
        F: FnMut(&CacheKey, Field) -> Result<Vec<bool>, E>,
        E: Into<MaskLoadError>,
    {
        if let Some(path) = self.lookup(key) {
            let matrix = self.read(&path)?;
            info!(path = %path.display(), rows = matrix.nrows(), "matrix_cache_hit");
            return Ok(Some(matrix));
        }

        for rule in FallbackRule::ALL {
            let Some(source) = rule.source_key(key) else {
                continue;
            };
            let Some(path) = self.lookup(&source) else {
                debug!(rule = %rule, source = %source.path().display(), "fallback_source_missing");
                continue;
            };

            let matrix = self.read(&path)?;
            let mask = mask_loader(&source, rule.mask_field())
                .map_err(|e| StoreError::Mask(e.into()))?;
            if mask.len() != matrix.nrows() {
                return Err(StoreError::MaskMismatch {
                    path,
                    mask: mask.len(),
                    rows: matrix.nrows(),
                });
            }
            let selected = matrix
                .select_rows(&mask)
                .map_err(|e| StoreError::corrupt(&path, e.to_string()))?;
            info!(
                rule = %rule,
                source = %path.display(),
                rows = selected.nrows(),
                "matrix_fallback_hit"
            );
            return Ok(Some(selected));
        }

        debug!(path = %key.path().display(), "matrix_cache_miss");
        Ok(None)
    }
}
