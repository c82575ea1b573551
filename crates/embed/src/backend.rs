//! Backend selection.
//!
//! Every model is served through the same [`Embedder`] contract. A
//! [`BackendProvider`] turns a [`BackendRequest`] into a ready embedder, which
//! lets callers substitute their own providers (for tests or alternative
//! runtimes) without touching dispatch.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::Matrix;
use crate::registry::{Family, Lang, ModelKind};
use crate::stub::StubEmbedder;
use crate::tfidf::{TfIdfEmbedder, TfIdfHistory, TfIdfVectorizer};
use crate::w2v::{Word2VecEmbedder, WordVectors};
use crate::EmbedError;

/// What a backend is asked to embed.
#[derive(Debug, Clone, Copy)]
pub enum EmbedInput<'a> {
    /// Normalized tweet texts, one matrix row each.
    Texts(&'a [String]),
    /// Directory scanned for image files.
    Images(&'a Path),
}

impl<'a> EmbedInput<'a> {
    /// The texts, or `InvalidInput` for an image directory.
    pub fn texts(&self, model: &str) -> Result<&'a [String], EmbedError> {
        match *self {
            EmbedInput::Texts(texts) => Ok(texts),
            EmbedInput::Images(_) => Err(EmbedError::InvalidInput(format!(
                "`{model}` embeds texts, got an image directory"
            ))),
        }
    }

    /// The image directory, or `InvalidInput` for texts.
    pub fn images(&self, model: &str) -> Result<&'a Path, EmbedError> {
        match *self {
            EmbedInput::Images(dir) => Ok(dir),
            EmbedInput::Texts(_) => Err(EmbedError::InvalidInput(format!(
                "`{model}` embeds images, got texts"
            ))),
        }
    }
}

/// A loaded embedding backend.
pub trait Embedder {
    fn name(&self) -> &str;

    /// One row per input item.
    fn compute_vectors(&mut self, input: EmbedInput<'_>) -> Result<Matrix, EmbedError>;
}

/// Options a backend needs besides the model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendRequest {
    pub model: ModelKind,
    pub lang: Lang,
    /// Tf-idf: binary term counts.
    pub binary: bool,
    /// Tf-idf: reduce to dense components.
    pub svd: bool,
    /// Word vectors: weight words by tf-idf.
    pub tfidf_weights: bool,
}

impl BackendRequest {
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            lang: Lang::default(),
            binary: true,
            svd: false,
            tfidf_weights: false,
        }
    }
}

/// Source of embedders.
pub trait BackendProvider {
    fn backend(&self, request: &BackendRequest) -> Result<Box<dyn Embedder>, EmbedError>;
}

/// How [`DefaultBackends`] serves requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Real models loaded from `model_root`.
    #[default]
    Native,
    /// Deterministic hash vectors for every model. Never chosen implicitly.
    Stub,
}

/// Where model assets live and which mode to run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub model_root: PathBuf,
    #[serde(default)]
    pub mode: BackendMode,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            model_root: PathBuf::from("models"),
            mode: BackendMode::Native,
        }
    }
}

/// The backends shipped with this crate.
///
/// | family | backend | assets |
/// |---|---|---|
/// | lexical | [`TfIdfEmbedder`] | `tfidf/history_<lang>.json` (`tfidf_all_tweets`) |
/// | word vectors | [`Word2VecEmbedder`] | `w2v/<model>.txt` |
/// | transformers | `OnnxTextEncoder` (`onnx` feature) | `<model>/model.onnx`, `<model>/tokenizer.json` |
/// | image | `OnnxImageEncoder` (`onnx` feature) | `<model>/model.onnx` |
#[derive(Debug, Clone, Default)]
pub struct DefaultBackends {
    settings: BackendSettings,
}

impl DefaultBackends {
    pub fn new(settings: BackendSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn history_path(&self, lang: Lang) -> PathBuf {
        TfIdfHistory::path_for(&self.settings.model_root, lang)
    }
}

impl BackendProvider for DefaultBackends {
    fn backend(&self, request: &BackendRequest) -> Result<Box<dyn Embedder>, EmbedError> {
        let model = request.model;
        debug!(model = %model, mode = ?self.settings.mode, "backend_select");
        if self.settings.mode == BackendMode::Stub {
            return Ok(Box::new(StubEmbedder::for_model(model)));
        }

        let root = &self.settings.model_root;
        match model.family() {
            Family::Lexical => {
                let mut vectorizer = TfIdfVectorizer::new(request.lang, request.binary);
                if model == ModelKind::TfidfAllTweets {
                    vectorizer.load_history(&self.history_path(request.lang))?;
                }
                Ok(Box::new(TfIdfEmbedder::new(model.name(), vectorizer, request.svd)))
            }
            Family::StaticWordVectors => {
                let vectors = WordVectors::load_text(&WordVectors::path_for(root, model))?;
                let mut embedder = Word2VecEmbedder::new(model, vectors);
                if request.tfidf_weights {
                    let mut vectorizer = TfIdfVectorizer::new(request.lang, false);
                    vectorizer.load_history(&self.history_path(request.lang))?;
                    embedder = embedder.with_tfidf_weights(vectorizer);
                }
                Ok(Box::new(embedder))
            }
            Family::Contextual | Family::Sentence | Family::UniversalSentence => {
                text_encoder(root, model)
            }
            Family::Image => image_encoder(root, model),
        }
    }
}

#[cfg(feature = "onnx")]
fn text_encoder(root: &Path, model: ModelKind) -> Result<Box<dyn Embedder>, EmbedError> {
    Ok(Box::new(crate::onnx::OnnxTextEncoder::load(root, model)?))
}

#[cfg(feature = "onnx")]
fn image_encoder(root: &Path, model: ModelKind) -> Result<Box<dyn Embedder>, EmbedError> {
    Ok(Box::new(crate::onnx::OnnxImageEncoder::load(root, model)?))
}

#[cfg(not(feature = "onnx"))]
const ONNX_DISABLED: &str = "built without the `onnx` feature";

#[cfg(not(feature = "onnx"))]
fn text_encoder(_root: &Path, model: ModelKind) -> Result<Box<dyn Embedder>, EmbedError> {
    Err(EmbedError::unavailable(model.name(), ONNX_DISABLED))
}

#[cfg(not(feature = "onnx"))]
fn image_encoder(_root: &Path, model: ModelKind) -> Result<Box<dyn Embedder>, EmbedError> {
    Err(EmbedError::unavailable(model.name(), ONNX_DISABLED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn settings(root: &Path, mode: BackendMode) -> DefaultBackends {
        DefaultBackends::new(BackendSettings {
            model_root: root.to_path_buf(),
            mode,
        })
    }

    #[test]
    fn stub_mode_serves_every_model() {
        let backends = settings(Path::new("/nonexistent"), BackendMode::Stub);
        for &model in ModelKind::ALL {
            let embedder = backends.backend(&BackendRequest::new(model)).unwrap();
            assert_eq!(embedder.name(), model.name());
        }
    }

    #[test]
    fn tfidf_dataset_needs_no_assets() {
        let backends = settings(Path::new("/nonexistent"), BackendMode::Native);
        let embedder = backends
            .backend(&BackendRequest::new(ModelKind::TfidfDataset))
            .unwrap();
        assert_eq!(embedder.name(), "tfidf_dataset");
    }

    #[test]
    fn tfidf_all_tweets_requires_history() {
        let dir = tempfile::tempdir().unwrap();
        let backends = settings(dir.path(), BackendMode::Native);
        let request = BackendRequest::new(ModelKind::TfidfAllTweets);
        assert!(matches!(
            backends.backend(&request),
            Err(EmbedError::ModelNotFound(_))
        ));

        TfIdfHistory::default()
            .save(&TfIdfHistory::path_for(dir.path(), Lang::Fr))
            .unwrap();
        assert!(backends.backend(&request).is_ok());
    }

    #[test]
    fn word_vectors_loaded_from_model_root() {
        let dir = tempfile::tempdir().unwrap();
        let backends = settings(dir.path(), BackendMode::Native);
        let request = BackendRequest::new(ModelKind::W2vAfpFr);
        assert!(matches!(
            backends.backend(&request),
            Err(EmbedError::ModelNotFound(_))
        ));

        let path = WordVectors::path_for(dir.path(), ModelKind::W2vAfpFr);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "feu 1 0\neau 0 1\n").unwrap();
        let mut embedder = backends.backend(&request).unwrap();
        let texts = vec!["feu eau".to_string()];
        let m = embedder.compute_vectors(EmbedInput::Texts(&texts)).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (1, 2));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn transformer_models_need_onnx_feature() {
        let backends = settings(Path::new("models"), BackendMode::Native);
        for model in [ModelKind::Bert, ModelKind::Use, ModelKind::Densenet] {
            match backends.backend(&BackendRequest::new(model)) {
                Err(EmbedError::BackendUnavailable { model: name, .. }) => {
                    assert_eq!(name, model.name())
                }
                Err(other) => panic!("unexpected error {other}"),
                Ok(_) => panic!("expected {model} to be unavailable"),
            }
        }
    }

    #[test]
    fn input_kind_mismatch() {
        let texts: Vec<String> = Vec::new();
        assert!(EmbedInput::Texts(&texts).images("resnet").is_err());
        assert!(EmbedInput::Images(Path::new("x")).texts("bert").is_err());
    }
}
