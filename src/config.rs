//! YAML configuration file support.
//!
//! Every field is optional; command-line flags override what the file sets.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! log_level: info
//!
//! paths:
//!   data_root: data
//!   model_root: models
//!   image_dir: data/images/event2018_image
//!
//! backend:
//!   mode: native        # or `stub` for hash vectors
//!
//! defaults:
//!   dataset: event2018
//!   annotation: annotated
//!   lang: fr
//!   save: true
//!   binary: true
//!   svd: false
//!   hashtag_split: true
//!   tfidf_weights: false
//!   text_plus: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AnnotationMode, BackendMode, BackendSettings, BuildConfig, DatasetSource, Lang, ModelKind};

/// Levels accepted for `log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TwembedConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub backend: BackendYamlConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl TwembedConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: TwembedConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }
        self.paths.validate()
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            model_root: self.paths.model_root.clone(),
            mode: self.backend.mode,
        }
    }

    /// Build options for `model` from the file defaults.
    pub fn build_config(&self, model: ModelKind) -> BuildConfig {
        let d = &self.defaults;
        BuildConfig {
            dataset: d.dataset.clone(),
            model,
            annotation: d.annotation,
            lang: d.lang,
            save: d.save,
            binary: d.binary,
            svd: d.svd,
            hashtag_split: d.hashtag_split,
            tfidf_weights: d.tfidf_weights,
            extended_text: d.text_plus,
            data_root: self.paths.data_root.clone(),
            image_dir: self.paths.image_dir.clone(),
        }
    }
}

impl Default for TwembedConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
            paths: PathsConfig::default(),
            backend: BackendYamlConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    #[serde(default = "default_model_root")]
    pub model_root: PathBuf,

    /// Images scanned by image models
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
}

impl PathsConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.data_root.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "paths.data_root must not be empty".to_string(),
            ));
        }
        if self.model_root.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "paths.model_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            model_root: default_model_root(),
            image_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendYamlConfig {
    #[serde(default)]
    pub mode: BackendMode,
}

/// Default build options, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub dataset: DatasetSource,

    #[serde(default)]
    pub annotation: AnnotationMode,

    #[serde(default)]
    pub lang: Lang,

    #[serde(default)]
    pub save: bool,

    #[serde(default = "true_value")]
    pub binary: bool,

    #[serde(default)]
    pub svd: bool,

    #[serde(default)]
    pub hashtag_split: bool,

    #[serde(default)]
    pub tfidf_weights: bool,

    /// Use the `text+quote+reply` column as tweet text
    #[serde(default)]
    pub text_plus: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetSource::default(),
            annotation: AnnotationMode::default(),
            lang: Lang::default(),
            save: false,
            binary: true,
            svd: false,
            hashtag_split: false,
            tfidf_weights: false,
            text_plus: false,
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_model_root() -> PathBuf {
    PathBuf::from("models")
}

fn true_value() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = TwembedConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg, TwembedConfig::default());
        assert!(cfg.defaults.binary);
        assert_eq!(cfg.backend.mode, BackendMode::Native);
    }

    #[test]
    fn full_document() {
        let yaml = r#"
version: "1.0"
log_level: debug
paths:
  data_root: /srv/tweets
  model_root: /srv/models
  image_dir: /srv/images
backend:
  mode: stub
defaults:
  dataset: corpus/extra.tsv
  annotation: examined
  lang: en
  save: true
  binary: false
  svd: true
  hashtag_split: true
  tfidf_weights: true
  text_plus: true
"#;
        let cfg = TwembedConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.backend_settings().mode, BackendMode::Stub);
        assert_eq!(cfg.backend_settings().model_root, PathBuf::from("/srv/models"));

        let build = cfg.build_config(ModelKind::TfidfDataset);
        assert_eq!(build.dataset, DatasetSource::File(PathBuf::from("corpus/extra.tsv")));
        assert_eq!(build.annotation, AnnotationMode::Examined);
        assert_eq!(build.lang, Lang::En);
        assert!(build.save && !build.binary && build.svd && build.hashtag_split);
        assert!(build.tfidf_weights && build.extended_text);
        assert_eq!(build.data_root, PathBuf::from("/srv/tweets"));
        assert_eq!(build.image_dir, Some(PathBuf::from("/srv/images")));
    }

    #[test]
    fn unsupported_version_rejected() {
        let err = TwembedConfig::from_yaml("version: \"2.0\"").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn bad_log_level_rejected() {
        let err = TwembedConfig::from_yaml("log_level: loud").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn unknown_enum_value_is_parse_error() {
        let err = TwembedConfig::from_yaml("defaults:\n  lang: de\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::YamlParse(_)));
    }

    #[test]
    fn empty_data_root_rejected() {
        let err = TwembedConfig::from_yaml("paths:\n  data_root: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twembed.yaml");
        fs::write(&path, "backend:\n  mode: stub\n").unwrap();
        let cfg = TwembedConfig::from_file(&path).unwrap();
        assert_eq!(cfg.backend.mode, BackendMode::Stub);
        assert!(matches!(
            TwembedConfig::from_file(dir.path().join("absent.yaml")),
            Err(ConfigLoadError::FileRead(_))
        ));
    }
}
