use crate::{IndexStats, SearchResult};

/// Read-side boundary of the document retriever.
#[async_trait::async_trait]
pub trait DocumentSearch: Send + Sync {
    /// Returns at most `top_k` results ordered by ascending distance.
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<SearchResult>>;

    async fn stats(&self) -> IndexStats;
}

#[async_trait::async_trait]
impl<T: DocumentSearch + ?Sized> DocumentSearch for std::sync::Arc<T> {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<SearchResult>> {
        self.as_ref().search(query, top_k).await
    }

    async fn stats(&self) -> IndexStats {
        self.as_ref().stats().await
    }
}
