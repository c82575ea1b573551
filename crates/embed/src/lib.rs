//! Tweet embedding backends.
//!
//! Turns a batch of normalized tweet texts (or a directory of images) into a
//! feature matrix, one row per input. Which backend runs, and how texts are
//! normalized beforehand, is decided by the [`ModelKind`] registry.
//!
//! Backend families:
//!
//! - **Lexical** - tf-idf over an accumulated document-frequency history,
//!   sparse unless reduced with SVD.
//! - **Static word vectors** - mean (or tf-idf weighted mean) of word2vec
//!   vectors.
//! - **Transformers and CNNs** - ONNX Runtime sessions, behind the `onnx`
//!   feature. Builds without it report [`EmbedError::BackendUnavailable`].
//! - **Stub** - hash-derived vectors for dry runs. Only used when asked for.
//!
//! ## Quick example
//!
//! ```
//! use embed::{BackendProvider, BackendRequest, DefaultBackends, EmbedInput, ModelKind};
//!
//! let backends = DefaultBackends::default();
//! let mut tfidf = backends
//!     .backend(&BackendRequest::new(ModelKind::TfidfDataset))
//!     .unwrap();
//! let texts = vec!["incendie a paris".to_string(), "match a lyon".to_string()];
//! let matrix = tfidf.compute_vectors(EmbedInput::Texts(&texts)).unwrap();
//! assert_eq!(matrix.nrows(), 2);
//! assert!(matrix.is_sparse());
//! ```

mod backend;
mod error;
mod images;
mod matrix;
mod normalize;
mod registry;
mod stub;
mod svd;
mod tfidf;
mod w2v;

pub mod pool;

#[cfg(feature = "onnx")]
mod onnx;

pub use crate::backend::{
    BackendMode, BackendProvider, BackendRequest, BackendSettings, DefaultBackends, EmbedInput,
    Embedder,
};
pub use crate::error::EmbedError;
pub use crate::images::{image_files, IMAGE_EXTENSIONS};
pub use crate::matrix::{Matrix, SparseMatrix};
pub use crate::registry::{Family, Lang, ModelKind};
pub use crate::stub::{StubEmbedder, STUB_DIM};
pub use crate::svd::TruncatedSvd;
pub use crate::tfidf::{
    tokenize, CountMatrix, TfIdfEmbedder, TfIdfHistory, TfIdfVectorizer, MIN_DF, SVD_COMPONENTS,
};
pub use crate::w2v::{Word2VecEmbedder, WordVectors};

#[cfg(feature = "onnx")]
pub use crate::onnx::{OnnxImageEncoder, OnnxTextEncoder, BATCH_SIZE, IMAGE_SIZE, MAX_SEQUENCE_LENGTH};
