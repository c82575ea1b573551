//! Loader options and dataset identifiers.
//!
//! [`DatasetSource`] names what to load, [`LoadOptions`] controls which rows
//! survive. Both are cheap to clone and serde-serializable so they can be
//! read from YAML configuration.
//!
//! ```rust
//! use std::path::Path;
//! use ingest::{AnnotationMode, DatasetSource, LoadOptions};
//!
//! let source: DatasetSource = "event2018_image".parse().unwrap();
//! assert_eq!(source.resolve(Path::new("data")), Path::new("data/event2018_image.tsv"));
//!
//! let opts = LoadOptions::for_source(&source, AnnotationMode::Examined, false);
//! assert!(opts.require_image);
//! ```
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which annotation subset of the dataset to keep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    /// Tweets annotated as related to an event (`label` present).
    #[default]
    Annotated,
    /// Tweets annotated as related or unrelated (`event` present).
    Examined,
}

impl AnnotationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationMode::Annotated => "annotated",
            AnnotationMode::Examined => "examined",
        }
    }
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown annotation mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown annotation mode `{0}` (expected `annotated` or `examined`)")]
pub struct UnknownAnnotationMode(pub String);

impl FromStr for AnnotationMode {
    type Err = UnknownAnnotationMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annotated" => Ok(AnnotationMode::Annotated),
            "examined" => Ok(AnnotationMode::Examined),
            other => Err(UnknownAnnotationMode(other.to_string())),
        }
    }
}

/// Name of the base corpus.
pub const EVENT2018: &str = "event2018";
/// Name of the image-bearing subset of the base corpus.
pub const EVENT2018_IMAGE: &str = "event2018_image";

/// Dataset identifier: one of the built-in corpora or a path to a TSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatasetSource {
    #[default]
    Event2018,
    Event2018Image,
    File(PathBuf),
}

impl DatasetSource {
    /// Maps the built-in names, treats everything else as a path. Never fails.
    pub fn parse(value: &str) -> Self {
        match value {
            EVENT2018 => DatasetSource::Event2018,
            EVENT2018_IMAGE => DatasetSource::Event2018Image,
            other => DatasetSource::File(PathBuf::from(other)),
        }
    }

    /// Directory name used for cached matrices.
    ///
    /// Built-ins keep their name, files use their file name without `.tsv`.
    pub fn short_name(&self) -> String {
        match self {
            DatasetSource::Event2018 => EVENT2018.to_string(),
            DatasetSource::Event2018Image => EVENT2018_IMAGE.to_string(),
            DatasetSource::File(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match name.strip_suffix(".tsv") {
                    Some(stem) => stem.to_string(),
                    None => name,
                }
            }
        }
    }

    /// Location of the TSV file. Built-ins live at `<data_root>/<name>.tsv`,
    /// file paths are returned untouched.
    pub fn resolve(&self, data_root: &Path) -> PathBuf {
        match self {
            DatasetSource::Event2018 => data_root.join(format!("{EVENT2018}.tsv")),
            DatasetSource::Event2018Image => data_root.join(format!("{EVENT2018_IMAGE}.tsv")),
            DatasetSource::File(path) => path.clone(),
        }
    }

    /// Only the image subset filters out tweets without an image.
    pub fn requires_image(&self) -> bool {
        matches!(self, DatasetSource::Event2018Image)
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Event2018 => f.write_str(EVENT2018),
            DatasetSource::Event2018Image => f.write_str(EVENT2018_IMAGE),
            DatasetSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for DatasetSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DatasetSource::parse(s))
    }
}

impl From<String> for DatasetSource {
    fn from(value: String) -> Self {
        DatasetSource::parse(&value)
    }
}

impl From<DatasetSource> for String {
    fn from(value: DatasetSource) -> Self {
        value.to_string()
    }
}

/// Row filters applied by [`load_dataset`](crate::load_dataset).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadOptions {
    pub annotation: AnnotationMode,
    /// Swap in the `text+quote+reply` column as the tweet text when present.
    pub extended_text: bool,
    /// Drop rows without an `image` value.
    pub require_image: bool,
}

impl LoadOptions {
    /// Options for `source`, with the image filter derived from the source.
    pub fn for_source(source: &DatasetSource, annotation: AnnotationMode, extended_text: bool) -> Self {
        Self {
            annotation,
            extended_text,
            require_image: source.requires_image(),
        }
    }
}
