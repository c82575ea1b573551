//! Feature matrices: one row per document.
//!
//! Dense matrices come from averaged word vectors, sentence encoders and
//! image networks. Lexical vectors are mostly zeros and stay in compressed
//! sparse row (CSR) form unless reduced with SVD.
use ndarray::{Array2, Axis};

use crate::EmbedError;

/// A feature matrix, rows = documents, columns = embedding dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    Dense(Array2<f32>),
    Sparse(SparseMatrix),
}

impl Matrix {
    pub fn nrows(&self) -> usize {
        match self {
            Matrix::Dense(a) => a.nrows(),
            Matrix::Sparse(s) => s.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Matrix::Dense(a) => a.ncols(),
            Matrix::Sparse(s) => s.ncols(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Matrix::Sparse(_))
    }

    /// Keeps the rows whose mask entry is `true`, preserving order.
    pub fn select_rows(&self, mask: &[bool]) -> Result<Matrix, EmbedError> {
        if mask.len() != self.nrows() {
            return Err(EmbedError::Shape(format!(
                "mask has {} entries for {} rows",
                mask.len(),
                self.nrows()
            )));
        }
        Ok(match self {
            Matrix::Dense(a) => {
                let keep: Vec<usize> = kept_indices(mask);
                Matrix::Dense(a.select(Axis(0), &keep))
            }
            Matrix::Sparse(s) => Matrix::Sparse(s.select_rows(mask)),
        })
    }

    pub fn to_dense(&self) -> Array2<f32> {
        match self {
            Matrix::Dense(a) => a.clone(),
            Matrix::Sparse(s) => s.to_dense(),
        }
    }
}

fn kept_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(idx, keep)| keep.then_some(idx))
        .collect()
}

/// Compressed sparse row matrix with `f32` values.
///
/// Row `i` owns `indices[indptr[i]..indptr[i + 1]]` and the matching slice of
/// `data`. Column indices are strictly increasing within a row.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl SparseMatrix {
    /// An all-zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            indptr: vec![0; nrows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Builds a matrix from raw CSR arrays, checking they are consistent.
    pub fn from_parts(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self, EmbedError> {
        let (nrows, ncols) = shape;
        if indptr.len() != nrows + 1 {
            return Err(EmbedError::Shape(format!(
                "indptr has {} entries for {nrows} rows",
                indptr.len()
            )));
        }
        if indices.len() != data.len() {
            return Err(EmbedError::Shape(format!(
                "{} indices for {} values",
                indices.len(),
                data.len()
            )));
        }
        if indptr[0] != 0 || indptr[nrows] != data.len() {
            return Err(EmbedError::Shape("indptr does not span the data".into()));
        }
        for (row, bounds) in indptr.windows(2).enumerate() {
            if bounds[0] > bounds[1] || bounds[1] > indices.len() {
                return Err(EmbedError::Shape(format!("indptr decreases at row {row}")));
            }
            let cols = &indices[bounds[0]..bounds[1]];
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(EmbedError::Shape(format!(
                    "column indices of row {row} are not strictly increasing"
                )));
            }
            if cols.last().is_some_and(|&c| c >= ncols) {
                return Err(EmbedError::Shape(format!(
                    "column index out of range in row {row}"
                )));
            }
        }
        Ok(Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        })
    }

    /// Builds a matrix from per-row `(column, value)` entries in any order.
    /// Explicit zeros are dropped.
    pub fn from_rows<I>(ncols: usize, rows: I) -> Result<Self, EmbedError>
    where
        I: IntoIterator<Item = Vec<(usize, f32)>>,
    {
        let mut indptr = vec![0];
        let mut indices = Vec::new();
        let mut data = Vec::new();
        for mut row in rows {
            row.retain(|&(_, v)| v != 0.0);
            row.sort_by_key(|&(col, _)| col);
            for (col, value) in row {
                indices.push(col);
                data.push(value);
            }
            indptr.push(indices.len());
        }
        let nrows = indptr.len() - 1;
        Self::from_parts((nrows, ncols), indptr, indices, data)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored values.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f32]) {
        let range = self.indptr[i]..self.indptr[i + 1];
        (&self.indices[range.clone()], &self.data[range])
    }

    /// Keeps the rows whose mask entry is `true`. The mask length is checked
    /// by [`Matrix::select_rows`].
    pub(crate) fn select_rows(&self, mask: &[bool]) -> SparseMatrix {
        let mut indptr = vec![0];
        let mut indices = Vec::new();
        let mut data = Vec::new();
        for row in kept_indices(mask) {
            let (cols, values) = self.row(row);
            indices.extend_from_slice(cols);
            data.extend_from_slice(values);
            indptr.push(indices.len());
        }
        SparseMatrix {
            nrows: indptr.len() - 1,
            ncols: self.ncols,
            indptr,
            indices,
            data,
        }
    }

    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.nrows, self.ncols));
        for row in 0..self.nrows {
            let (cols, values) = self.row(row);
            for (&col, &value) in cols.iter().zip(values) {
                dense[[row, col]] = value;
            }
        }
        dense
    }

    /// `A · v` in double precision.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.nrows)
            .map(|row| {
                let (cols, values) = self.row(row);
                cols.iter()
                    .zip(values)
                    .map(|(&col, &value)| value as f64 * v[col])
                    .sum()
            })
            .collect()
    }

    /// `Aᵀ · u` in double precision.
    pub fn t_mul_vec(&self, u: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.ncols];
        for (row, &weight) in u.iter().enumerate().take(self.nrows) {
            let (cols, values) = self.row(row);
            for (&col, &value) in cols.iter().zip(values) {
                out[col] += value as f64 * weight;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> SparseMatrix {
        // [[1, 0, 2],
        //  [0, 0, 0],
        //  [0, 3, 0]]
        SparseMatrix::from_rows(3, vec![vec![(2, 2.0), (0, 1.0)], vec![], vec![(1, 3.0)]]).unwrap()
    }

    #[test]
    fn from_rows_sorts_columns() {
        let m = sample();
        assert_eq!(m.indptr(), &[0, 2, 2, 3]);
        assert_eq!(m.indices(), &[0, 2, 1]);
        assert_eq!(m.data(), &[1.0, 2.0, 3.0]);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn dense_conversion() {
        assert_eq!(
            sample().to_dense(),
            array![[1.0, 0.0, 2.0], [0.0, 0.0, 0.0], [0.0, 3.0, 0.0]]
        );
    }

    #[test]
    fn products() {
        let m = sample();
        assert_eq!(m.mul_vec(&[1.0, 1.0, 1.0]), vec![3.0, 0.0, 3.0]);
        assert_eq!(m.t_mul_vec(&[1.0, 5.0, 2.0]), vec![1.0, 6.0, 2.0]);
    }

    #[test]
    fn from_parts_rejects_inconsistent_arrays() {
        assert!(SparseMatrix::from_parts((2, 2), vec![0, 1], vec![0], vec![1.0]).is_err());
        assert!(SparseMatrix::from_parts((1, 2), vec![0, 1], vec![2], vec![1.0]).is_err());
        assert!(SparseMatrix::from_parts((1, 3), vec![0, 2], vec![1, 1], vec![1.0, 1.0]).is_err());
        assert!(SparseMatrix::from_parts((1, 2), vec![0, 2], vec![0], vec![1.0]).is_err());
        assert!(SparseMatrix::from_parts((0, 4), vec![0], vec![], vec![]).is_ok());
    }

    #[test]
    fn select_rows_sparse_and_dense() {
        let sparse = Matrix::Sparse(sample());
        let picked = sparse.select_rows(&[true, false, true]).unwrap();
        assert_eq!(picked.nrows(), 2);
        assert_eq!(picked.to_dense(), array![[1.0, 0.0, 2.0], [0.0, 3.0, 0.0]]);

        let dense = Matrix::Dense(sample().to_dense());
        let picked = dense.select_rows(&[false, false, true]).unwrap();
        assert_eq!(picked, Matrix::Dense(array![[0.0, 3.0, 0.0]]));
    }

    #[test]
    fn select_rows_checks_mask_length() {
        let dense = Matrix::Dense(Array2::zeros((2, 2)));
        assert!(matches!(dense.select_rows(&[true]), Err(EmbedError::Shape(_))));
    }
}
