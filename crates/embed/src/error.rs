use std::io;
use thiserror::Error;

/// Errors surfaced while selecting or running an embedding backend.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The model name is not in the registry.
    #[error("unknown model `{0}`")]
    UnknownModel(String),
    /// The model exists but this build or configuration cannot serve it.
    #[error("backend for `{model}` unavailable: {reason}")]
    BackendUnavailable { model: String, reason: String },
    /// A model, vocabulary or history file is missing on disk.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The backend was handed the wrong kind of input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A model file exists but could not be parsed.
    #[error("malformed model file {path}: {reason}")]
    ModelFormat { path: String, reason: String },
    /// The tf-idf history state could not be read or written.
    #[error("tf-idf history error: {0}")]
    History(String),
    /// ONNX Runtime, tokenizer or image decoding errors.
    #[error("inference failure: {0}")]
    Inference(String),
    /// Inconsistent matrix dimensions.
    #[error("shape error: {0}")]
    Shape(String),
}

impl EmbedError {
    pub fn unavailable(model: impl Into<String>, reason: impl Into<String>) -> Self {
        EmbedError::BackendUnavailable {
            model: model.into(),
            reason: reason.into(),
        }
    }
}
