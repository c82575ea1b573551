//! Truncated SVD of a sparse matrix by power iteration.
//!
//! Used to reduce tf-idf vectors to a fixed number of dense components
//! without pulling in a LAPACK binding.
use ndarray::Array2;

use crate::matrix::SparseMatrix;
use crate::normalize::l2_normalize_f64;

/// Computes the document projections `U·Σ` of the top singular components.
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    n_components: usize,
    max_iter: usize,
    tol: f64,
}

impl TruncatedSvd {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            max_iter: 100,
            tol: 1e-9,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Returns a `nrows × n_components` matrix.
    ///
    /// Components beyond the rank of `a` are zero columns. Each column's
    /// largest-magnitude entry is positive so results are reproducible.
    pub fn fit_transform(&self, a: &SparseMatrix) -> Array2<f32> {
        let (m, n) = a.shape();
        let mut out = Array2::zeros((m, self.n_components));
        let k = self.n_components.min(m).min(n);
        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(k);

        for comp in 0..k {
            let mut v: Vec<f64> = (0..n).map(|j| ((j + comp + 1) as f64).sin()).collect();
            orthogonalize(&mut v, &basis);
            if l2_normalize_f64(&mut v) == 0.0 {
                break;
            }

            // Power iteration on AᵀA restricted to the complement of `basis`.
            for _ in 0..self.max_iter {
                let mut w = a.t_mul_vec(&a.mul_vec(&v));
                orthogonalize(&mut w, &basis);
                if l2_normalize_f64(&mut w) < 1e-12 {
                    break;
                }
                let delta = w
                    .iter()
                    .zip(&v)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f64>()
                    .sqrt();
                v = w;
                if delta < self.tol {
                    break;
                }
            }

            let mut scores = a.mul_vec(&v);
            let sigma = scores.iter().map(|x| x * x).sum::<f64>().sqrt();
            if sigma < 1e-12 {
                break;
            }
            let pivot = scores
                .iter()
                .copied()
                .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
            if pivot < 0.0 {
                scores.iter_mut().for_each(|x| *x = -*x);
                v.iter_mut().for_each(|x| *x = -*x);
            }
            for (row, score) in scores.into_iter().enumerate() {
                out[[row, comp]] = score as f32;
            }
            basis.push(v);
        }

        out
    }
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let dot: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
        for (x, y) in v.iter_mut().zip(b) {
            *x -= dot * y;
        }
    }
}
