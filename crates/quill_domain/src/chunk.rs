use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A bounded slice of a source document and the unit of indexing and
/// retrieval.
///
/// `chunk_id` is the 0-based position of the chunk inside its source and
/// `total_chunks` is the number of chunks the source produced, so
/// `chunk_id < total_chunks` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub chunk_id: usize,
    pub total_chunks: usize,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        chunk_id: usize,
        total_chunks: usize,
    ) -> Self {
        debug_assert!(chunk_id < total_chunks, "chunk_id must be below total_chunks");
        Self {
            text: text.into(),
            source: source.into(),
            chunk_id,
            total_chunks,
        }
    }
}

/// A chunk returned by a nearest-neighbour query.
///
/// `distance` is a non-negative dissimilarity score where `0.0` means
/// identical; results are ranked by ascending distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub source: String,
    pub chunk_id: usize,
    pub distance: f32,
}

impl SearchResult {
    pub fn new(chunk: &Chunk, distance: f32) -> Self {
        Self {
            text: chunk.text.clone(),
            source: chunk.source.clone(),
            chunk_id: chunk.chunk_id,
            distance,
        }
    }
}

/// Summary of what an index currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    /// Number of distinct sources.
    pub total_documents: usize,
    /// Distinct sources in lexical order.
    pub sources: Vec<String>,
}

impl IndexStats {
    pub fn from_chunks<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> Self {
        let mut total_chunks = 0;
        let mut sources = BTreeSet::new();
        for chunk in chunks {
            total_chunks += 1;
            sources.insert(chunk.source.as_str());
        }

        Self {
            total_chunks,
            total_documents: sources.len(),
            sources: sources.into_iter().map(str::to_string).collect(),
        }
    }
}
