use std::path::PathBuf;

use embed::ModelKind;
use ingest::{AnnotationMode, DatasetSource};

/// Everything that decides where a feature matrix is cached.
///
/// The path is `<data_root>/<dataset>/<model>/<annotation>[_text+][_hashtag_split][_svd][_tfidf_weights]`,
/// without extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub data_root: PathBuf,
    pub dataset: DatasetSource,
    pub model: ModelKind,
    pub annotation: AnnotationMode,
    pub extended_text: bool,
    pub hashtag_split: bool,
    pub svd: bool,
    pub tfidf_weights: bool,
}

impl CacheKey {
    pub fn new(data_root: impl Into<PathBuf>, dataset: DatasetSource, model: ModelKind) -> Self {
        Self {
            data_root: data_root.into(),
            dataset,
            model,
            annotation: AnnotationMode::default(),
            extended_text: false,
            hashtag_split: false,
            svd: false,
            tfidf_weights: false,
        }
    }

    pub fn with_annotation(mut self, annotation: AnnotationMode) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn with_dataset(mut self, dataset: DatasetSource) -> Self {
        self.dataset = dataset;
        self
    }

    /// Annotation mode followed by one suffix per flag set, in fixed order.
    pub fn file_name(&self) -> String {
        let mut name = self.annotation.as_str().to_string();
        let flags = [
            (self.extended_text, "text+"),
            (self.hashtag_split, "hashtag_split"),
            (self.svd, "svd"),
            (self.tfidf_weights, "tfidf_weights"),
        ];
        for (set, suffix) in flags {
            if set {
                name.push('_');
                name.push_str(suffix);
            }
        }
        name
    }

    /// Cache location without extension. Pure, touches no file.
    pub fn path(&self) -> PathBuf {
        self.data_root
            .join(self.dataset.short_name())
            .join(self.model.name())
            .join(self.file_name())
    }
}
