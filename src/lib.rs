//! Workspace umbrella crate for twembed.
//!
//! Builds the feature matrix of a tweet dataset for one embedding model:
//! load and filter the dataset, reuse a cached matrix when one exists (or can
//! be derived from a superset), otherwise normalize the texts, run the
//! model's backend and optionally cache the result.

pub mod config;

pub use canonical::{FormatOptions, camel_case_split, format_text, remove_repeated_characters};
pub use embed::{
    BackendMode, BackendProvider, BackendRequest, BackendSettings, DefaultBackends, EmbedError,
    EmbedInput, Embedder, Lang, Matrix, ModelKind, SparseMatrix,
};
pub use ingest::{
    AnnotationMode, Dataset, DatasetSource, Field, IngestError, LoadOptions, TweetRecord,
    load_dataset,
};
pub use store::{CacheKey, FallbackRule, MatrixStore, StoreError};

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Image directory used when none is configured, relative to the data root.
pub const DEFAULT_IMAGE_DIR: &str = "images/event2018_image";

/// Errors that can occur while building a feature matrix.
#[derive(Debug)]
pub enum PipelineError {
    Ingest(IngestError),
    Embed(EmbedError),
    Store(StoreError),
    /// A text backend returned a matrix whose rows do not match the dataset.
    RowMismatch {
        model: ModelKind,
        rows: usize,
        expected: usize,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "dataset loading failed: {err}"),
            PipelineError::Embed(err) => write!(f, "embedding failed: {err}"),
            PipelineError::Store(err) => write!(f, "matrix cache failure: {err}"),
            PipelineError::RowMismatch {
                model,
                rows,
                expected,
            } => write!(f, "{model} returned {rows} rows for {expected} tweets"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Embed(err) => Some(err),
            PipelineError::Store(err) => Some(err),
            PipelineError::RowMismatch { .. } => None,
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<EmbedError> for PipelineError {
    fn from(value: EmbedError) -> Self {
        PipelineError::Embed(value)
    }
}

impl From<StoreError> for PipelineError {
    fn from(value: StoreError) -> Self {
        PipelineError::Store(value)
    }
}

/// One matrix build: which rows, which model, which options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub dataset: DatasetSource,
    pub model: ModelKind,
    pub annotation: AnnotationMode,
    pub lang: Lang,
    /// Cache the computed matrix.
    pub save: bool,
    /// Binary term counts for tf-idf.
    pub binary: bool,
    pub svd: bool,
    pub hashtag_split: bool,
    pub tfidf_weights: bool,
    /// Use the `text+quote+reply` column as tweet text.
    pub extended_text: bool,
    /// Root of datasets and cached matrices.
    pub data_root: PathBuf,
    /// Images scanned by image models, `<data_root>/images/event2018_image` by default.
    pub image_dir: Option<PathBuf>,
}

impl BuildConfig {
    pub fn new(model: ModelKind) -> Self {
        Self {
            dataset: DatasetSource::default(),
            model,
            annotation: AnnotationMode::default(),
            lang: Lang::default(),
            save: false,
            binary: true,
            svd: false,
            hashtag_split: false,
            tfidf_weights: false,
            extended_text: false,
            data_root: PathBuf::from("data"),
            image_dir: None,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            data_root: self.data_root.clone(),
            dataset: self.dataset.clone(),
            model: self.model,
            annotation: self.annotation,
            extended_text: self.extended_text,
            hashtag_split: self.hashtag_split,
            svd: self.svd,
            tfidf_weights: self.tfidf_weights,
        }
    }

    pub fn backend_request(&self) -> BackendRequest {
        BackendRequest {
            model: self.model,
            lang: self.lang,
            binary: self.binary,
            svd: self.svd,
            tfidf_weights: self.tfidf_weights,
        }
    }

    pub fn image_dir(&self) -> PathBuf {
        self.image_dir
            .clone()
            .unwrap_or_else(|| self.data_root.join(DEFAULT_IMAGE_DIR))
    }
}

fn load_source(
    data_root: &Path,
    dataset: &DatasetSource,
    annotation: AnnotationMode,
    extended_text: bool,
) -> Result<Dataset, IngestError> {
    let options = LoadOptions::for_source(dataset, annotation, extended_text);
    load_dataset(&dataset.resolve(data_root), &options)
}

/// Builds (or reloads) the feature matrix for `cfg` with backends from `provider`.
///
/// Returns the matrix with the loaded dataset. On a cache miss the dataset
/// texts are the normalized texts the backend saw. Image models only scan
/// the image directory and return an empty dataset.
pub fn build_matrix(
    cfg: &BuildConfig,
    provider: &dyn BackendProvider,
) -> Result<(Matrix, Dataset), PipelineError> {
    let mut dataset = if cfg.model.is_text() {
        load_source(&cfg.data_root, &cfg.dataset, cfg.annotation, cfg.extended_text)?
    } else {
        Dataset::default()
    };
    let key = cfg.cache_key();
    let store = MatrixStore::new();

    let cached = store.load(&key, |source, field| {
        debug!(dataset = %source.dataset, annotation = %source.annotation, field = field.column(), "fallback_mask");
        load_source(&source.data_root, &source.dataset, source.annotation, source.extended_text)
            .map(|data| data.mask(field))
    })?;
    if let Some(matrix) = cached {
        info!(
            model = %cfg.model,
            dataset = %cfg.dataset,
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            "matrix_loaded"
        );
        return Ok((matrix, dataset));
    }

    let mut embedder = provider.backend(&cfg.backend_request())?;
    let matrix = if cfg.model.is_text() {
        if let Some(profile) = cfg.model.format_profile(cfg.lang, cfg.hashtag_split) {
            for record in dataset.records_mut() {
                record.text = format_text(&record.text, &profile);
            }
        }
        let texts = dataset.texts();
        let matrix = embedder.compute_vectors(EmbedInput::Texts(&texts))?;
        if matrix.nrows() != texts.len() {
            return Err(PipelineError::RowMismatch {
                model: cfg.model,
                rows: matrix.nrows(),
                expected: texts.len(),
            });
        }
        matrix
    } else {
        embedder.compute_vectors(EmbedInput::Images(&cfg.image_dir()))?
    };
    info!(
        model = %cfg.model,
        dataset = %cfg.dataset,
        rows = matrix.nrows(),
        cols = matrix.ncols(),
        sparse = matrix.is_sparse(),
        "matrix_computed"
    );

    if cfg.save {
        store.save(&key, &matrix)?;
    }
    Ok((matrix, dataset))
}

/// [`build_matrix`] with the backends shipped in `embed`.
pub fn build_matrix_default(
    cfg: &BuildConfig,
    settings: &BackendSettings,
) -> Result<(Matrix, Dataset), PipelineError> {
    build_matrix(cfg, &DefaultBackends::new(settings.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_mirrors_config() {
        let mut cfg = BuildConfig::new(ModelKind::W2vTwitterFr);
        cfg.tfidf_weights = true;
        cfg.extended_text = true;
        cfg.annotation = AnnotationMode::Examined;
        assert_eq!(
            cfg.cache_key().path(),
            PathBuf::from("data/event2018/w2v_twitter_fr/examined_text+_tfidf_weights")
        );
    }

    #[test]
    fn backend_request_carries_flags() {
        let mut cfg = BuildConfig::new(ModelKind::TfidfAllTweets);
        cfg.binary = false;
        cfg.svd = true;
        cfg.lang = Lang::En;
        let request = cfg.backend_request();
        assert!(!request.binary && request.svd);
        assert_eq!(request.lang, Lang::En);
        assert_eq!(request.model, ModelKind::TfidfAllTweets);
    }

    #[test]
    fn image_dir_defaults_under_data_root() {
        let mut cfg = BuildConfig::new(ModelKind::Resnet);
        cfg.data_root = PathBuf::from("/srv/data");
        assert_eq!(cfg.image_dir(), PathBuf::from("/srv/data/images/event2018_image"));
        cfg.image_dir = Some(PathBuf::from("pics"));
        assert_eq!(cfg.image_dir(), PathBuf::from("pics"));
    }

    #[test]
    fn pipeline_error_sources() {
        let err = PipelineError::from(EmbedError::UnknownModel("x".into()));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("unknown model"));
        let mismatch = PipelineError::RowMismatch {
            model: ModelKind::Bert,
            rows: 1,
            expected: 2,
        };
        assert!(mismatch.source().is_none());
        assert_eq!(mismatch.to_string(), "bert returned 1 rows for 2 tweets");
    }
}
