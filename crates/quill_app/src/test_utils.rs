use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use quill_domain::{ChatModel, Chunk, DocumentSearch, IndexStats, Prompt, SearchResult};

/// A [`ChatModel`] that replays canned responses in order and records every
/// prompt it receives.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedModel {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::default(),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("model unavailable"))
    }
}

/// A [`DocumentSearch`] over fixed chunks that returns them in insertion
/// order with increasing distance.
#[derive(Default)]
pub struct StaticSearch {
    chunks: Vec<Chunk>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticSearch {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks, queries: Mutex::default() }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSearch for StaticSearch {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<SearchResult>> {
        self.queries.lock().unwrap().push((query.to_string(), top_k));
        Ok(self
            .chunks
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, chunk)| SearchResult::new(chunk, rank as f32 * 0.1))
            .collect())
    }

    async fn stats(&self) -> IndexStats {
        IndexStats::from_chunks(&self.chunks)
    }
}
