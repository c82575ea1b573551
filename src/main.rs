//! `twembed` command line.
//!
//! Builds (or reloads from cache) one feature matrix per requested model.
//! Models run one after the other; a failing model is logged and the next one
//! is attempted. The exit status is non-zero if any model failed.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use twembed::config::TwembedConfig;
use twembed::{
    AnnotationMode, BackendMode, BuildConfig, DatasetSource, DefaultBackends, Lang, ModelKind,
    build_matrix,
};

fn parse_model(value: &str) -> Result<ModelKind, String> {
    value.parse::<ModelKind>().map_err(|_| {
        format!(
            "unknown model `{value}`, expected one of: {}",
            ModelKind::NAMES.join(", ")
        )
    })
}

/// Build tweet embedding feature matrices
#[derive(Debug, Parser)]
#[command(name = "twembed")]
#[command(version)]
#[command(about = "Build and cache tweet embedding feature matrices")]
struct Cli {
    /// Dataset: `event2018`, `event2018_image` or a path to a TSV file
    #[arg(long)]
    dataset: Option<DatasetSource>,

    /// Embedding models to run, in order
    #[arg(long, required = true, num_args = 1.., value_parser = parse_model)]
    model: Vec<ModelKind>,

    /// Cache computed matrices
    #[arg(long)]
    save: bool,

    /// Reduce tf-idf vectors with truncated SVD
    #[arg(long)]
    svd: bool,

    /// Turn binary term counts off for tf-idf
    #[arg(long = "binary")]
    binary_off: bool,

    /// Split camel-case hashtags into words
    #[arg(long)]
    hashtag_split: bool,

    /// Weight word vectors by tf-idf
    #[arg(long)]
    tfidf_weights: bool,

    /// Use the `text+quote+reply` column as tweet text
    #[arg(long)]
    text_plus: bool,

    /// Annotation subset: `annotated` or `examined`
    #[arg(long)]
    annotation: Option<AnnotationMode>,

    /// Tweet language: `fr` or `en`
    #[arg(long)]
    lang: Option<Lang>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of datasets and cached matrices
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Root of model assets
    #[arg(long)]
    model_root: Option<PathBuf>,

    /// Use deterministic hash vectors instead of real models
    #[arg(long)]
    stub: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<TwembedConfig> {
        let mut config = match &self.config {
            Some(path) => TwembedConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TwembedConfig::default(),
        };
        if let Some(root) = &self.data_root {
            config.paths.data_root = root.clone();
        }
        if let Some(root) = &self.model_root {
            config.paths.model_root = root.clone();
        }
        if self.stub {
            config.backend.mode = BackendMode::Stub;
        }
        Ok(config)
    }

    /// File defaults with command-line flags applied on top.
    fn build_config(&self, config: &TwembedConfig, model: ModelKind) -> BuildConfig {
        let mut cfg = config.build_config(model);
        if let Some(dataset) = &self.dataset {
            cfg.dataset = dataset.clone();
        }
        if let Some(annotation) = self.annotation {
            cfg.annotation = annotation;
        }
        if let Some(lang) = self.lang {
            cfg.lang = lang;
        }
        cfg.save |= self.save;
        cfg.svd |= self.svd;
        cfg.hashtag_split |= self.hashtag_split;
        cfg.tfidf_weights |= self.tfidf_weights;
        cfg.extended_text |= self.text_plus;
        if self.binary_off {
            cfg.binary = false;
        }
        cfg
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_tracing(&config.log_level);

    let backends = DefaultBackends::new(config.backend_settings());
    let mut failed = Vec::new();
    for &model in &cli.model {
        let cfg = cli.build_config(&config, model);
        match build_matrix(&cfg, &backends) {
            Ok((matrix, dataset)) => info!(
                model = %model,
                tweets = dataset.len(),
                rows = matrix.nrows(),
                cols = matrix.ncols(),
                "model_done"
            ),
            Err(err) => {
                warn!(model = %model, error = %err, "model_failed");
                failed.push(model.name());
            }
        }
    }

    if failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = %failed.join(", "), "some models failed");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("twembed").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_flags() {
        let cli = parse(&["--model", "tfidf_dataset"]);
        let cfg = cli.build_config(&TwembedConfig::default(), ModelKind::TfidfDataset);
        assert_eq!(cfg, BuildConfig::new(ModelKind::TfidfDataset));
    }

    #[test]
    fn several_models_in_order() {
        let cli = parse(&["--model", "sbert_sts", "tfidf_all_tweets", "resnet"]);
        assert_eq!(
            cli.model,
            vec![ModelKind::SbertSts, ModelKind::TfidfAllTweets, ModelKind::Resnet]
        );
    }

    #[test]
    fn unknown_model_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["twembed", "--model", "gpt"]).unwrap_err();
        assert!(err.to_string().contains("unknown model `gpt`"));
    }

    #[test]
    fn binary_flag_turns_binary_off() {
        let cli = parse(&["--model", "tfidf_dataset", "--binary", "--svd", "--text-plus"]);
        let cfg = cli.build_config(&TwembedConfig::default(), ModelKind::TfidfDataset);
        assert!(!cfg.binary);
        assert!(cfg.svd && cfg.extended_text);
    }

    #[test]
    fn flags_override_file_values() {
        let file = TwembedConfig::from_yaml("defaults:\n  lang: en\n  annotation: examined\n").unwrap();
        let cli = parse(&[
            "--model",
            "w2v_twitter_fr",
            "--lang",
            "fr",
            "--dataset",
            "event2018_image",
            "--data-root",
            "/tmp/tw",
            "--stub",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.backend.mode, BackendMode::Stub);
        let cfg = cli.build_config(&file, ModelKind::W2vTwitterFr);
        assert_eq!(cfg.lang, Lang::Fr);
        assert_eq!(cfg.annotation, AnnotationMode::Examined);
        assert_eq!(cfg.dataset, DatasetSource::Event2018Image);
        assert_eq!(config.paths.data_root, PathBuf::from("/tmp/tw"));
    }
}
