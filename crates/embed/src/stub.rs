use fxhash::hash64;
use ndarray::Array2;

use crate::backend::{EmbedInput, Embedder};
use crate::images::image_files;
use crate::matrix::Matrix;
use crate::normalize::l2_normalize_in_place;
use crate::registry::ModelKind;
use crate::EmbedError;

/// Width of stub vectors.
pub const STUB_DIM: usize = 384;

/// Deterministic stand-in for any model, used for dry runs.
/// Generates sinusoid values derived from a hash of the input so the same
/// text (or image file name) always maps to the same unit vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    name: String,
    dim: usize,
}

impl StubEmbedder {
    pub fn new(name: impl Into<String>, dim: usize) -> Self {
        Self {
            name: name.into(),
            dim,
        }
    }

    pub fn for_model(model: ModelKind) -> Self {
        Self::new(model.name(), STUB_DIM)
    }

    fn vector(&self, key: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let h = hash64(key.as_bytes());
        for (idx, value) in v.iter_mut().enumerate() {
            *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
        }
        l2_normalize_in_place(&mut v);
        v
    }

    fn matrix<'k>(&self, keys: impl ExactSizeIterator<Item = &'k str>) -> Result<Matrix, EmbedError> {
        let rows = keys.len();
        let flat: Vec<f32> = keys.flat_map(|key| self.vector(key)).collect();
        let dense = Array2::from_shape_vec((rows, self.dim), flat)
            .map_err(|e| EmbedError::Shape(e.to_string()))?;
        Ok(Matrix::Dense(dense))
    }
}

impl Embedder for StubEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError> {
        match input {
            EmbedInput::Texts(texts) => self.matrix(texts.iter().map(String::as_str)),
            EmbedInput::Images(dir) => {
                let names: Vec<String> = image_files(dir)?
                    .iter()
                    .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
                    .collect();
                self.matrix(names.iter().map(String::as_str))
            }
        }
    }
}
