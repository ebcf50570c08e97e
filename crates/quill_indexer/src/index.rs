use async_trait::async_trait;
use quill_domain::{Chunk, IndexStats, SearchResult};
use quill_env::Distance;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::VectorStore;

pub fn distance(metric: Distance, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Distance::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                return 1.0;
            }
            (1.0 - dot / (norm_a * norm_b)).max(0.0)
        }
        Distance::L2 => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

#[derive(Debug, Default)]
struct Entries {
    dimensions: Option<usize>,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

/// Exhaustive in-memory vector index.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    metric: Distance,
    entries: RwLock<Entries>,
}

impl MemoryIndex {
    pub fn new(metric: Distance) -> Self {
        Self { metric, entries: RwLock::default() }
    }
}

fn check_dimensions(expected: Option<usize>, actual: usize) -> Result<(), Error> {
    match expected {
        Some(expected) if expected != actual => Err(Error::DimensionMismatch { expected, actual }),
        _ => Ok(()),
    }
}

#[async_trait]
impl VectorStore for MemoryIndex {
    async fn add(&self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> anyhow::Result<()> {
        if chunks.len() != vectors.len() {
            return Err(Error::LengthMismatch { chunks: chunks.len(), vectors: vectors.len() }.into());
        }

        let mut entries = self.entries.write().await;
        let mut dimensions = entries.dimensions;
        for vector in &vectors {
            check_dimensions(dimensions, vector.len())?;
            dimensions = Some(vector.len());
        }

        entries.dimensions = dimensions;
        entries.chunks.extend(chunks);
        entries.vectors.extend(vectors);
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        check_dimensions(entries.dimensions, vector.len())?;

        let mut scored: Vec<(usize, f32)> = entries
            .vectors
            .iter()
            .enumerate()
            .map(|(position, candidate)| (position, distance(self.metric, vector, candidate)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchResult::new(&entries.chunks[position], distance))
            .collect())
    }

    async fn stats(&self) -> IndexStats {
        IndexStats::from_chunks(&self.entries.read().await.chunks)
    }
}
