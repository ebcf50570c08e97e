use std::path::Path;

use async_trait::async_trait;
use quill_domain::{DocumentSearch, IndexStats, SearchResult};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::loader::{FileLoader, SkippedFile};
use crate::traits::{Embedder, VectorStore};
use crate::transform::{Transform, TransformOps};
use crate::{Error, ParagraphChunker};

/// Outcome of [`Retriever::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    pub skipped: Vec<SkippedFile>,
    /// The index already held chunks, so nothing was ingested.
    pub already_loaded: bool,
}

/// Chunks, embeds and indexes a corpus, then answers similarity queries over
/// it.
pub struct Retriever<E, S> {
    loader: FileLoader,
    chunker: ParagraphChunker,
    embedder: E,
    index: S,
    init: Mutex<()>,
}

impl<E: Embedder, S: VectorStore> Retriever<E, S> {
    pub fn new(loader: FileLoader, chunker: ParagraphChunker, embedder: E, index: S) -> Self {
        Self { loader, chunker, embedder, index, init: Mutex::new(()) }
    }

    /// Ingests every matching file under `dir`.
    ///
    /// Loading is serialised and guarded by the index size: once the index
    /// holds any chunk, further calls return immediately with
    /// `already_loaded` set. All chunks are embedded in a single batch call.
    pub async fn load(&self, dir: impl AsRef<Path>) -> anyhow::Result<LoadReport> {
        let dir = dir.as_ref();
        let _guard = self.init.lock().await;

        let existing = self.index.stats().await;
        if existing.total_chunks > 0 {
            info!(chunks = existing.total_chunks, "Index already populated, skipping ingestion");
            return Ok(LoadReport { already_loaded: true, ..Default::default() });
        }

        info!(dir = %dir.display(), "Loading documents");
        let corpus = self
            .loader
            .clone()
            .pipe(self.chunker)
            .transform(dir.to_path_buf())
            .await?;

        let report = LoadReport {
            files_indexed: corpus.files_indexed,
            chunks_indexed: corpus.chunks.len(),
            skipped: corpus.skipped,
            already_loaded: false,
        };

        if corpus.chunks.is_empty() {
            warn!(dir = %dir.display(), "No documents found to index");
            return Ok(report);
        }

        let texts = corpus.chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != corpus.chunks.len() {
            return Err(Error::LengthMismatch {
                chunks: corpus.chunks.len(),
                vectors: vectors.len(),
            }
            .into());
        }
        self.index.add(corpus.chunks, vectors).await?;

        let stats = self.index.stats().await;
        info!(
            chunks = stats.total_chunks,
            documents = stats.total_documents,
            skipped = report.skipped.len(),
            "Indexed corpus"
        );
        Ok(report)
    }
}

#[async_trait]
impl<E: Embedder, S: VectorStore> DocumentSearch for Retriever<E, S> {
    async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<SearchResult>> {
        let vector = self.embedder.embed_query(query).await?;
        self.index.query(&vector, top_k).await
    }

    async fn stats(&self) -> IndexStats {
        self.index.stats().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use quill_env::Distance;

    use super::*;
    use crate::{HashEmbedder, MemoryIndex};

    /// Counts batch calls made to the wrapped embedder.
    #[derive(Clone)]
    struct Counting {
        inner: HashEmbedder,
        batches: Arc<AtomicUsize>,
    }

    impl Default for Counting {
        fn default() -> Self {
            Self { inner: HashEmbedder::new(256), batches: Arc::default() }
        }
    }

    #[async_trait]
    impl Embedder for Counting {
        async fn embed_batch(&self, inputs: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(inputs).await
        }
    }

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("q4_project_status.md"),
            "Q4 budget overrun reached $180K.\n\nThe database performance risk is owned by Lisa Patel.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("security_assessment.txt"),
            "Top risks: ransomware, phishing, unpatched servers.\n\nYear 1 security investment is $680K.",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.csv"), "ignored").unwrap();
        dir
    }

    fn retriever(embedder: Counting) -> Retriever<Counting, MemoryIndex> {
        Retriever::new(
            FileLoader::new(vec!["txt".to_string(), "md".to_string()]),
            ParagraphChunker::new(60),
            embedder,
            MemoryIndex::new(Distance::Cosine),
        )
    }

    #[tokio::test]
    async fn test_load_indexes_corpus_with_one_batch() {
        let fixture = corpus();
        let embedder = Counting::default();
        let retriever = retriever(embedder.clone());

        let actual = retriever.load(fixture.path()).await.unwrap();

        let expected = LoadReport {
            files_indexed: 2,
            chunks_indexed: 4,
            skipped: vec![],
            already_loaded: false,
        };
        assert_eq!(actual, expected);
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);
        let stats = retriever.stats().await;
        assert_eq!(stats.total_documents, 2);
        assert_eq!(
            stats.sources,
            vec!["q4_project_status.md".to_string(), "security_assessment.txt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_load_is_a_no_op() {
        let fixture = corpus();
        let embedder = Counting::default();
        let retriever = retriever(embedder.clone());
        retriever.load(fixture.path()).await.unwrap();

        let actual = retriever.load(fixture.path()).await.unwrap();

        assert!(actual.already_loaded);
        assert_eq!(retriever.stats().await.total_chunks, 4);
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_loads_ingest_once() {
        let fixture = corpus();
        let retriever = retriever(Counting::default());

        let (first, second) = tokio::join!(retriever.load(fixture.path()), retriever.load(fixture.path()));

        let reports = [first.unwrap(), second.unwrap()];
        assert_eq!(reports.iter().filter(|r| r.already_loaded).count(), 1);
        assert_eq!(retriever.stats().await.total_chunks, 4);
    }

    #[tokio::test]
    async fn test_search_ranks_relevant_chunk_first() {
        let fixture = corpus();
        let retriever = retriever(Counting::default());
        retriever.load(fixture.path()).await.unwrap();

        let actual = retriever.search("Who owns the database performance risk?", 3).await.unwrap();

        assert_eq!(actual.len(), 3);
        assert!(actual[0].text.contains("Lisa Patel"));
        assert!(actual.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_empty_corpus_reports_nothing_indexed() {
        let fixture = tempfile::tempdir().unwrap();
        let embedder = Counting::default();
        let retriever = retriever(embedder.clone());

        let actual = retriever.load(fixture.path()).await.unwrap();

        assert_eq!(actual, LoadReport::default());
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 0);
    }
}
