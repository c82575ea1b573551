//! `.npy` and `.npz` encoding of feature matrices.
//!
//! Sparse matrices are stored as a CSR archive with `data`, `indices`,
//! `indptr` and `shape` members. Files written by numpy and scipy are read
//! as well: `float64` values are narrowed to `f32`, `int32` indices widened.
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use embed::SparseMatrix;
use ndarray::{arr1, Array1, Array2, Ix1, OwnedRepr};
use ndarray_npy::{read_npy, write_npy, NpzReader, NpzWriter, ReadNpyError, ReadNpzError};

use crate::StoreError;

pub(crate) fn write_dense(path: &Path, matrix: &Array2<f32>) -> Result<(), StoreError> {
    write_npy(path, matrix).map_err(|source| StoreError::WriteNpy {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_dense(path: &Path) -> Result<Array2<f32>, StoreError> {
    let read_err = |source| StoreError::ReadNpy {
        path: path.to_path_buf(),
        source,
    };
    match read_npy::<_, Array2<f32>>(path) {
        Ok(matrix) => Ok(matrix),
        Err(ReadNpyError::WrongDescriptor(_)) => read_npy::<_, Array2<f64>>(path)
            .map(|matrix| matrix.mapv(|v| v as f32))
            .map_err(read_err),
        Err(source) => Err(read_err(source)),
    }
}

fn to_i64(values: &[usize]) -> Array1<i64> {
    values.iter().map(|&v| v as i64).collect()
}

pub(crate) fn write_sparse(
    path: &Path,
    matrix: &SparseMatrix,
    compress: bool,
) -> Result<(), StoreError> {
    let write_err = |source| StoreError::WriteNpz {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let writer = BufWriter::new(file);
    let mut npz = if compress {
        NpzWriter::new_compressed(writer)
    } else {
        NpzWriter::new(writer)
    };
    let (nrows, ncols) = matrix.shape();
    npz.add_array("data", &Array1::from(matrix.data().to_vec()))
        .map_err(write_err)?;
    npz.add_array("indices", &to_i64(matrix.indices()))
        .map_err(write_err)?;
    npz.add_array("indptr", &to_i64(matrix.indptr()))
        .map_err(write_err)?;
    npz.add_array("shape", &arr1(&[nrows as i64, ncols as i64]))
        .map_err(write_err)?;
    npz.finish().map_err(write_err)?;
    Ok(())
}

struct SparseReader<'a> {
    path: &'a Path,
    npz: NpzReader<File>,
    names: Vec<String>,
}

impl<'a> SparseReader<'a> {
    fn open(path: &'a Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let mut npz = NpzReader::new(file).map_err(|source| StoreError::ReadNpz {
            path: path.to_path_buf(),
            source,
        })?;
        let names = npz.names().map_err(|source| StoreError::ReadNpz {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { path, npz, names })
    }

    /// Archive member for `name`, with or without the `.npy` suffix.
    fn member(&self, name: &str) -> Result<String, StoreError> {
        let suffixed = format!("{name}.npy");
        self.names
            .iter()
            .find(|n| **n == name || **n == suffixed)
            .cloned()
            .ok_or_else(|| StoreError::corrupt(self.path, format!("missing `{name}` array")))
    }

    fn read_err(&self, source: ReadNpzError) -> StoreError {
        StoreError::ReadNpz {
            path: self.path.to_path_buf(),
            source,
        }
    }

    fn floats(&mut self, name: &str) -> Result<Vec<f32>, StoreError> {
        let member = self.member(name)?;
        match self.npz.by_name::<OwnedRepr<f32>, Ix1>(&member) {
            Ok(values) => Ok(values.to_vec()),
            Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => self
                .npz
                .by_name::<OwnedRepr<f64>, Ix1>(&member)
                .map(|values| values.iter().map(|&v| v as f32).collect())
                .map_err(|e| self.read_err(e)),
            Err(source) => Err(self.read_err(source)),
        }
    }

    fn indices(&mut self, name: &str) -> Result<Vec<usize>, StoreError> {
        let member = self.member(name)?;
        let wide: Vec<i64> = match self.npz.by_name::<OwnedRepr<i64>, Ix1>(&member) {
            Ok(values) => values.to_vec(),
            Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => self
                .npz
                .by_name::<OwnedRepr<i32>, Ix1>(&member)
                .map(|values| values.iter().map(|&v| i64::from(v)).collect())
                .map_err(|e| self.read_err(e))?,
            Err(source) => return Err(self.read_err(source)),
        };
        wide.into_iter()
            .map(|v| {
                usize::try_from(v)
                    .map_err(|_| StoreError::corrupt(self.path, format!("negative value in `{name}`")))
            })
            .collect()
    }
}

pub(crate) fn read_sparse(path: &Path) -> Result<SparseMatrix, StoreError> {
    let mut reader = SparseReader::open(path)?;
    let shape = reader.indices("shape")?;
    let &[nrows, ncols] = shape.as_slice() else {
        return Err(StoreError::corrupt(path, format!("shape has {} entries", shape.len())));
    };
    let data = reader.floats("data")?;
    let indices = reader.indices("indices")?;
    let indptr = reader.indices("indptr")?;
    SparseMatrix::from_parts((nrows, ncols), indptr, indices, data)
        .map_err(|e| StoreError::corrupt(path, e.to_string()))
}

/// Removes `path` if it exists.
pub(crate) fn remove_stale(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn dense_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        let m = array![[1.0f32, 2.0], [3.0, 4.5]];
        write_dense(&path, &m).unwrap();
        assert_eq!(read_dense(&path).unwrap(), m);
    }

    #[test]
    fn float64_npy_is_narrowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        write_npy(&path, &array![[0.5f64, 1.5]]).unwrap();
        assert_eq!(read_dense(&path).unwrap(), array![[0.5f32, 1.5]]);
    }

    #[test]
    fn sparse_roundtrip_compressed_and_plain() {
        let dir = tempfile::tempdir().unwrap();
        let m = SparseMatrix::from_rows(4, vec![vec![(3, 1.0), (0, 0.5)], vec![], vec![(2, -2.0)]])
            .unwrap();
        for compress in [true, false] {
            let path = dir.path().join(format!("m_{compress}.npz"));
            write_sparse(&path, &m, compress).unwrap();
            assert_eq!(read_sparse(&path).unwrap(), m);
        }
    }

    #[test]
    fn archive_holds_only_csr_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npz");
        let m = SparseMatrix::from_rows(2, vec![vec![(1, 1.0)]]).unwrap();
        write_sparse(&path, &m, true).unwrap();

        let mut npz = NpzReader::new(File::open(&path).unwrap()).unwrap();
        let mut names: Vec<String> = npz
            .names()
            .unwrap()
            .into_iter()
            .map(|name| name.trim_end_matches(".npy").to_string())
            .collect();
        names.sort();
        // no scipy `format` member
        assert_eq!(names, vec!["data", "indices", "indptr", "shape"]);
    }

    #[test]
    fn scipy_style_dtypes_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scipy.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("data", &array![1.0f64, 2.0]).unwrap();
        npz.add_array("indices", &array![1i32, 0]).unwrap();
        npz.add_array("indptr", &array![0i32, 1, 2]).unwrap();
        npz.add_array("shape", &array![2i64, 2]).unwrap();
        npz.finish().unwrap();

        let m = read_sparse(&path).unwrap();
        assert_eq!(m.to_dense(), array![[0.0f32, 1.0], [2.0, 0.0]]);
    }

    #[test]
    fn missing_member_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("data", &array![1.0f32]).unwrap();
        npz.finish().unwrap();
        assert!(matches!(read_sparse(&path), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn inconsistent_arrays_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("data", &array![1.0f32]).unwrap();
        npz.add_array("indices", &array![7i64]).unwrap();
        npz.add_array("indptr", &array![0i64, 1]).unwrap();
        npz.add_array("shape", &array![1i64, 2]).unwrap();
        npz.finish().unwrap();
        assert!(matches!(read_sparse(&path), Err(StoreError::Corrupt { .. })));
    }
}
