use async_trait::async_trait;
use quill_domain::{Chunk, IndexStats, SearchResult};

/// Splits one document into ordered chunks.
pub trait Chunker: Send + Sync {
    fn chunk(&self, text: &str, source: &str) -> Vec<Chunk>;
}

/// Turns text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every input in one logical call, preserving order.
    async fn embed_batch(&self, inputs: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, query: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| crate::Error::EmptyEmbedding.into())
    }
}

/// Storage for chunk vectors with nearest-neighbour lookup.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Adds `chunks[i]` with `vectors[i]`; both must have the same length.
    async fn add(&self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> anyhow::Result<()>;

    /// At most `k` results in ascending distance order.
    async fn query(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<SearchResult>>;

    async fn stats(&self) -> IndexStats;
}
