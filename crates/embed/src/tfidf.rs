//! Tf-idf vectors with an accumulated document-frequency history.
//!
//! The history keeps, per language, how many tweets have been seen and in how
//! many of them each term occurs. `tfidf_dataset` starts from an empty history
//! so idf only reflects the dataset; `tfidf_all_tweets` first loads the stored
//! history so idf reflects every tweet ever collected.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{EmbedInput, Embedder};
use crate::matrix::{Matrix, SparseMatrix};
use crate::normalize::l2_normalize_in_place;
use crate::registry::Lang;
use crate::svd::TruncatedSvd;
use crate::EmbedError;

/// Terms seen in fewer documents are left out of the vocabulary.
pub const MIN_DF: usize = 10;
/// Output width when SVD reduction is requested.
pub const SVD_COMPONENTS: usize = 100;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

/// Runs of two or more word characters.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str())
}

/// Per-document term counts for a batch of texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMatrix {
    docs: Vec<BTreeMap<String, usize>>,
}

impl CountMatrix {
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        let docs = texts
            .iter()
            .map(|text| {
                let mut counts = BTreeMap::new();
                for token in tokenize(text.as_ref()) {
                    *counts.entry(token.to_string()).or_insert(0) += 1;
                }
                counts
            })
            .collect();
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Term counts of document `i`.
    pub fn doc(&self, i: usize) -> &BTreeMap<String, usize> {
        &self.docs[i]
    }
}

/// Accumulated document frequencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfIdfHistory {
    pub n_samples: usize,
    pub df: BTreeMap<String, usize>,
}

impl TfIdfHistory {
    /// `<model_root>/tfidf/history_<lang>.json`
    pub fn path_for(model_root: &Path, lang: Lang) -> PathBuf {
        model_root.join("tfidf").join(format!("history_{lang}.json"))
    }

    pub fn load(path: &Path) -> Result<Self, EmbedError> {
        if !path.exists() {
            return Err(EmbedError::ModelNotFound(path.display().to_string()));
        }
        let raw = fs::read_to_string(path)?;
        let history: TfIdfHistory = serde_json::from_str(&raw)
            .map_err(|e| EmbedError::History(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), n_samples = history.n_samples, terms = history.df.len(), "tfidf_history_loaded");
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> Result<(), EmbedError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(self).map_err(|e| EmbedError::History(e.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Adds every document of `counts` to the history.
    pub fn update(&mut self, counts: &CountMatrix) {
        self.n_samples += counts.len();
        for doc in &counts.docs {
            for term in doc.keys() {
                *self.df.entry(term.clone()).or_insert(0) += 1;
            }
        }
    }

    /// Smoothed inverse document frequency, `ln((1 + n) / (1 + df)) + 1`.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.df.get(term).copied().unwrap_or(0) as f64;
        ((1.0 + self.n_samples as f64) / (1.0 + df)).ln() + 1.0
    }

    /// Terms kept for vectorization, sorted, with their column index.
    pub fn vocabulary(&self, min_df: usize) -> BTreeMap<&str, usize> {
        self.df
            .iter()
            .filter(|(_, &df)| df >= min_df)
            .enumerate()
            .map(|(col, (term, _))| (term.as_str(), col))
            .collect()
    }
}

/// Tf-idf vectorizer backed by a [`TfIdfHistory`].
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    lang: Lang,
    binary: bool,
    history: TfIdfHistory,
}

impl TfIdfVectorizer {
    /// With `binary`, every non-zero term count is 1 before idf weighting.
    pub fn new(lang: Lang, binary: bool) -> Self {
        Self {
            lang,
            binary,
            history: TfIdfHistory::default(),
        }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn history(&self) -> &TfIdfHistory {
        &self.history
    }

    /// Replaces the history with the stored state of `path`.
    pub fn load_history(&mut self, path: &Path) -> Result<(), EmbedError> {
        self.history = TfIdfHistory::load(path)?;
        Ok(())
    }

    /// Counts the terms of `texts` and folds them into the history.
    pub fn add_new_samples<S: AsRef<str>>(&mut self, texts: &[S]) -> CountMatrix {
        let counts = CountMatrix::from_texts(texts);
        self.history.update(&counts);
        counts
    }

    /// One l2-normalized tf-idf row per document of `counts`.
    ///
    /// Columns are the history terms with at least `min_df` documents, in
    /// sorted order. With `svd` the sparse result is reduced to
    /// `n_components` dense columns.
    pub fn compute_vectors(
        &self,
        counts: &CountMatrix,
        min_df: usize,
        svd: bool,
        n_components: usize,
    ) -> Result<Matrix, EmbedError> {
        let vocabulary = self.history.vocabulary(min_df);
        let rows = counts.docs.iter().map(|doc| {
            let mut entries: Vec<(usize, f32)> = doc
                .iter()
                .filter_map(|(term, &count)| {
                    let col = *vocabulary.get(term.as_str())?;
                    let tf = if self.binary { 1.0 } else { count as f64 };
                    Some((col, (tf * self.history.idf(term)) as f32))
                })
                .collect();
            let mut values: Vec<f32> = entries.iter().map(|&(_, v)| v).collect();
            l2_normalize_in_place(&mut values);
            for (entry, value) in entries.iter_mut().zip(values) {
                entry.1 = value;
            }
            entries
        });
        let sparse = SparseMatrix::from_rows(vocabulary.len(), rows)?;
        info!(
            lang = %self.lang,
            docs = sparse.nrows(),
            vocabulary = sparse.ncols(),
            nnz = sparse.nnz(),
            svd,
            "tfidf_vectors"
        );

        if svd {
            Ok(Matrix::Dense(TruncatedSvd::new(n_components).fit_transform(&sparse)))
        } else {
            Ok(Matrix::Sparse(sparse))
        }
    }
}

/// [`Embedder`] for the `tfidf_*` models.
#[derive(Debug, Clone)]
pub struct TfIdfEmbedder {
    name: String,
    vectorizer: TfIdfVectorizer,
    svd: bool,
}

impl TfIdfEmbedder {
    pub fn new(name: impl Into<String>, vectorizer: TfIdfVectorizer, svd: bool) -> Self {
        Self {
            name: name.into(),
            vectorizer,
            svd,
        }
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }
}

impl Embedder for TfIdfEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError> {
        let texts = input.texts(&self.name)?;
        let counts = self.vectorizer.add_new_samples(texts);
        self.vectorizer
            .compute_vectors(&counts, MIN_DF, self.svd, SVD_COMPONENTS)
    }
}
