use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequest, EmbeddingInput};
use async_trait::async_trait;
use futures::future::try_join_all;
use quill_env::{EmbeddingBackend, EmbeddingConfig};
use tracing::debug;

use crate::traits::Embedder;

const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Deterministic bag-of-words embedder using the hashing trick.
///
/// Each lowercase alphanumeric token is hashed with blake3; the hash picks a
/// bucket and a sign. The resulting vector is L2-normalised, so texts sharing
/// vocabulary have a small cosine distance. Text without tokens embeds to the
/// zero vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&bytes[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, inputs: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|input| self.embed(input)).collect())
    }
}

/// Embedder backed by the OpenAI embeddings endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    model: String,
    client: Client<OpenAIConfig>,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(model: impl Into<String>, client: Client<OpenAIConfig>, batch_size: usize) -> Self {
        Self { model: model.into(), client, batch_size: batch_size.max(1) }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, inputs: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        // Kick off all embedding requests in parallel
        let requests = inputs.chunks(self.batch_size).map(|batch| {
            let client = self.client.clone();
            let model = self.model.clone();
            let batch = batch.to_vec();
            async move {
                let mut response = client
                    .embeddings()
                    .create(CreateEmbeddingRequest {
                        model,
                        input: EmbeddingInput::StringArray(batch),
                        ..Default::default()
                    })
                    .await?;
                response.data.sort_by_key(|embedding| embedding.index);

                anyhow::Ok(
                    response
                        .data
                        .into_iter()
                        .map(|e| e.embedding)
                        .collect::<Vec<_>>(),
                )
            }
        });

        let embeddings: Vec<Vec<f32>> = try_join_all(requests).await?.into_iter().flatten().collect();
        debug!(model = %self.model, inputs = inputs.len(), "Embedded batch");

        if embeddings.len() != inputs.len() {
            return Err(crate::Error::LengthMismatch {
                chunks: inputs.len(),
                vectors: embeddings.len(),
            }
            .into());
        }
        Ok(embeddings)
    }
}

/// The embedder selected by configuration.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Hash(HashEmbedder),
    OpenAi(OpenAiEmbedder),
}

impl AnyEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        match config.backend {
            EmbeddingBackend::Hash => Ok(Self::Hash(HashEmbedder::new(config.dimensions))),
            EmbeddingBackend::OpenAi => {
                let api_key = std::env::var(OPENAI_API_KEY).map_err(|_| {
                    quill_domain::Error::MissingApiKey {
                        provider: config.backend.to_string(),
                        env_var: OPENAI_API_KEY,
                    }
                })?;
                let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
                Ok(Self::OpenAi(OpenAiEmbedder::new(
                    config.model.clone(),
                    client,
                    config.batch_size,
                )))
            }
        }
    }
}

#[async_trait]
impl Embedder for AnyEmbedder {
    async fn embed_batch(&self, inputs: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        match self {
            Self::Hash(embedder) => embedder.embed_batch(inputs).await,
            Self::OpenAi(embedder) => embedder.embed_batch(inputs).await,
        }
    }
}
