use std::path::PathBuf;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{EmbeddingConfig, ModelConfig, RetryConfig};

/// Dissimilarity measure used to rank chunks against a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, fake::Dummy)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Distance {
    /// `1 - cos(a, b)`, clamped to be non-negative.
    #[default]
    Cosine,
    /// Euclidean distance.
    L2,
}

#[derive(Debug, Setters, Clone, PartialEq, Serialize, Deserialize, fake::Dummy)]
#[serde(rename_all = "snake_case")]
#[setters(strip_option, into)]
/// Runtime configuration for indexing, retrieval and the pipeline.
pub struct Environment {
    /// Directory holding the documents to index.
    pub data_dir: PathBuf,
    /// Root directory for application, run and evaluation logs.
    pub log_dir: PathBuf,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of chunks the researcher retrieves per query.
    pub top_k: usize,
    pub distance: Distance,
    /// File extensions, without the leading dot, picked up by the loader.
    pub extensions: Vec<String>,
    /// How many times the writer may revise a draft the verifier asked to
    /// revise. Zero keeps the pipeline strictly linear.
    pub max_revisions: usize,
    /// Use the multi-output writer instead of the single-draft writer.
    #[serde(default)]
    pub multi_output: bool,
    pub embedding: EmbeddingConfig,
    pub model: ModelConfig,
    /// Configuration for the retry mechanism
    pub retry_config: RetryConfig,
}

impl Environment {
    /// Creates an Environment from the embedded defaults and the process
    /// environment.
    ///
    /// Variables prefixed with `QUILL_` override the embedded `env.json`;
    /// nested keys are separated by a double underscore, e.g.
    /// - `QUILL_CHUNK_SIZE` -> `chunk_size`
    /// - `QUILL_MODEL__PROVIDER` -> `model.provider`
    /// - `QUILL_RETRY_CONFIG__MAX_RETRY_ATTEMPTS` ->
    ///   `retry_config.max_retry_attempts`
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(Self::env_source())
    }

    fn env_source() -> config::Environment {
        config::Environment::with_prefix("QUILL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        // Embed default configuration at compile time
        const DEFAULT_CONFIG: &str = include_str!("../env.json");

        let config = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Json,
            ))
            .add_source(source)
            .build()?;

        config.try_deserialize()
    }

    /// Directory receiving one JSON file per pipeline run.
    pub fn run_log_path(&self) -> PathBuf {
        self.log_dir.join("runs")
    }

    /// Directory receiving evaluation results.
    pub fn eval_path(&self) -> PathBuf {
        self.log_dir.join("eval")
    }

    /// Directory receiving the rolling application log.
    pub fn app_log_path(&self) -> PathBuf {
        self.log_dir.join("app")
    }
}
