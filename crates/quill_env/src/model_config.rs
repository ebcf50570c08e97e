use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use url::Url;

/// Which embedding function turns chunks and queries into vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, fake::Dummy)]
pub enum EmbeddingBackend {
    /// Offline feature-hashing embedder; deterministic and key-free.
    #[default]
    #[serde(rename = "hash")]
    #[strum(serialize = "hash")]
    Hash,
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Setters, Serialize, Deserialize, fake::Dummy)]
#[serde(rename_all = "snake_case")]
#[setters(into)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Remote embedding model name; ignored by the hash backend.
    pub model: String,
    /// Vector width produced by the hash backend.
    pub dimensions: usize,
    /// Maximum inputs per remote embedding request.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, fake::Dummy)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "anthropic")]
    #[strum(serialize = "anthropic")]
    Anthropic,
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com/v1/",
            Self::OpenAi => "https://api.openai.com/v1/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Setters, Serialize, Deserialize, fake::Dummy)]
#[serde(rename_all = "snake_case")]
#[setters(strip_option, into)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub max_tokens: u32,
    /// Whole-request timeout for a single model call.
    pub timeout_secs: u64,
    /// Overrides the provider's default base URL, e.g. for an
    /// OpenAI-compatible gateway.
    #[serde(default)]
    #[dummy(default)]
    pub url: Option<Url>,
}

impl ModelConfig {
    /// Base URL of the provider API, always ending with a slash so that
    /// endpoint paths can be joined onto it.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let raw = match &self.url {
            Some(url) => url.as_str().to_string(),
            None => self.provider.default_url().to_string(),
        };
        if raw.ends_with('/') {
            Url::parse(&raw)
        } else {
            Url::parse(&format!("{raw}/"))
        }
    }
}
