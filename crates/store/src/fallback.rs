//! Reuse of cached matrices computed on a superset of the requested rows.
use std::fmt;

use ingest::{AnnotationMode, DatasetSource, Field};

use crate::CacheKey;

/// A way to derive a missing matrix from another cached one.
///
/// Rules are tried in [`FallbackRule::ALL`] order. A rule is used when its
/// precondition holds and its source matrix exists; the source rows are then
/// restricted to those where [`mask_field`](Self::mask_field) is present in
/// the source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackRule {
    /// `event2018` annotated rows from the `examined` matrix, by `label`.
    ExaminedSuperset,
    /// `event2018_image` rows from the base `event2018` matrix, by `image`.
    BaseDataset,
    /// `event2018_image` annotated rows from its `examined` matrix, by `label`.
    ExaminedImage,
}

impl FallbackRule {
    pub const ALL: [FallbackRule; 3] = [
        FallbackRule::ExaminedSuperset,
        FallbackRule::BaseDataset,
        FallbackRule::ExaminedImage,
    ];

    /// Key of the matrix this rule reads, or `None` when it does not apply.
    pub fn source_key(&self, key: &CacheKey) -> Option<CacheKey> {
        match self {
            FallbackRule::ExaminedSuperset => (key.dataset == DatasetSource::Event2018
                && key.annotation == AnnotationMode::Annotated)
                .then(|| key.clone().with_annotation(AnnotationMode::Examined)),
            FallbackRule::BaseDataset => (key.dataset == DatasetSource::Event2018Image)
                .then(|| key.clone().with_dataset(DatasetSource::Event2018)),
            FallbackRule::ExaminedImage => (key.dataset == DatasetSource::Event2018Image
                && key.annotation == AnnotationMode::Annotated)
                .then(|| key.clone().with_annotation(AnnotationMode::Examined)),
        }
    }

    /// Column whose presence selects the rows to keep.
    pub fn mask_field(&self) -> Field {
        match self {
            FallbackRule::ExaminedSuperset | FallbackRule::ExaminedImage => Field::Label,
            FallbackRule::BaseDataset => Field::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackRule::ExaminedSuperset => "examined_superset",
            FallbackRule::BaseDataset => "base_dataset",
            FallbackRule::ExaminedImage => "examined_image",
        }
    }
}

impl fmt::Display for FallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
