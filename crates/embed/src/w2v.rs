//! Static word vectors averaged per tweet.
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView1};
use tracing::info;

use crate::backend::{EmbedInput, Embedder};
use crate::matrix::Matrix;
use crate::registry::ModelKind;
use crate::tfidf::{tokenize, TfIdfHistory, TfIdfVectorizer};
use crate::EmbedError;

/// Pre-trained vectors in word2vec text format.
///
/// One `word v1 v2 ...` line per word, optionally preceded by a
/// `<count> <dim>` header line.
#[derive(Debug, Clone)]
pub struct WordVectors {
    index: HashMap<String, usize>,
    vectors: Array2<f32>,
}

impl WordVectors {
    /// `<model_root>/w2v/<model>.txt`
    pub fn path_for(model_root: &Path, model: ModelKind) -> PathBuf {
        model_root.join("w2v").join(format!("{}.txt", model.name()))
    }

    pub fn load_text(path: &Path) -> Result<Self, EmbedError> {
        if !path.exists() {
            return Err(EmbedError::ModelNotFound(path.display().to_string()));
        }
        let reader = BufReader::new(File::open(path)?);
        let vectors = Self::read_text(reader).map_err(|e| match e {
            EmbedError::ModelFormat { reason, .. } => EmbedError::ModelFormat {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        info!(path = %path.display(), words = vectors.len(), dim = vectors.dim(), "word_vectors_loaded");
        Ok(vectors)
    }

    pub fn read_text<R: BufRead>(reader: R) -> Result<Self, EmbedError> {
        let format_err = |reason: String| EmbedError::ModelFormat {
            path: "<reader>".into(),
            reason,
        };

        let mut index = HashMap::new();
        let mut flat = Vec::new();
        let mut dim: Option<usize> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let values: Vec<&str> = parts.collect();

            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                let declared = values[0]
                    .parse::<usize>()
                    .map_err(|_| format_err(format!("invalid header `{line}`")))?;
                dim = Some(declared);
                continue;
            }

            let expected = *dim.get_or_insert(values.len());
            if values.len() != expected {
                return Err(format_err(format!(
                    "line {} has {} values, expected {expected}",
                    line_no + 1,
                    values.len()
                )));
            }
            if index.contains_key(word) {
                continue;
            }
            for value in values {
                flat.push(value.parse::<f32>().map_err(|_| {
                    format_err(format!("line {}: `{value}` is not a number", line_no + 1))
                })?);
            }
            index.insert(word.to_string(), index.len());
        }

        let dim = dim.unwrap_or(0);
        let vectors = Array2::from_shape_vec((index.len(), dim), flat)
            .map_err(|e| EmbedError::Shape(e.to_string()))?;
        Ok(Self { index, vectors })
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<ArrayView1<'_, f32>> {
        self.index.get(word).map(|&row| self.vectors.row(row))
    }

    /// Mean of the known word vectors of each text, every occurrence
    /// counted. Texts without a known word get a zero row.
    pub fn mean_vectors<S: AsRef<str>>(&self, texts: &[S]) -> Array2<f32> {
        self.weighted_mean(texts, |_, count| count as f64)
    }

    /// Mean weighted by each word's tf-idf in its text, idf taken from
    /// `history`.
    pub fn weighted_vectors<S: AsRef<str>>(&self, texts: &[S], history: &TfIdfHistory) -> Array2<f32> {
        self.weighted_mean(texts, |word, count| count as f64 * history.idf(word))
    }

    fn weighted_mean<S, W>(&self, texts: &[S], weight: W) -> Array2<f32>
    where
        S: AsRef<str>,
        W: Fn(&str, usize) -> f64,
    {
        let mut out = Array2::zeros((texts.len(), self.dim()));
        for (row, text) in texts.iter().enumerate() {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for token in tokenize(text.as_ref()) {
                *counts.entry(token).or_insert(0) += 1;
            }

            let mut acc = vec![0.0f64; self.dim()];
            let mut total = 0.0f64;
            for (word, count) in counts {
                let Some(vector) = self.get(word) else { continue };
                let w = weight(word, count);
                for (a, &v) in acc.iter_mut().zip(vector.iter()) {
                    *a += w * v as f64;
                }
                total += w;
            }
            if total > 0.0 {
                for (col, a) in acc.into_iter().enumerate() {
                    out[[row, col]] = (a / total) as f32;
                }
            }
        }
        out
    }
}

/// [`Embedder`] for the `w2v_*` models.
#[derive(Debug, Clone)]
pub struct Word2VecEmbedder {
    model: ModelKind,
    vectors: WordVectors,
    /// Present when documents are tf-idf weighted.
    weights: Option<TfIdfVectorizer>,
}

impl Word2VecEmbedder {
    pub fn new(model: ModelKind, vectors: WordVectors) -> Self {
        Self {
            model,
            vectors,
            weights: None,
        }
    }

    /// Weight words by tf-idf, starting from the stored history.
    pub fn with_tfidf_weights(mut self, vectorizer: TfIdfVectorizer) -> Self {
        self.weights = Some(vectorizer);
        self
    }
}

impl Embedder for Word2VecEmbedder {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError> {
        let texts = input.texts(self.model.name())?;
        let dense = match self.weights.as_mut() {
            Some(vectorizer) => {
                vectorizer.add_new_samples(texts);
                self.vectors.weighted_vectors(texts, vectorizer.history())
            }
            None => self.vectors.mean_vectors(texts),
        };
        Ok(Matrix::Dense(dense))
    }
}
