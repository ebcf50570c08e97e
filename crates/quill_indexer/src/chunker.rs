use quill_domain::Chunk;
use tracing::debug;

use crate::loader::{LoadedDocuments, SkippedFile};
use crate::traits::Chunker;
use crate::transform::Transform;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SEPARATOR_LEN: usize = PARAGRAPH_SEPARATOR.len();

/// Greedy paragraph packer.
///
/// Paragraphs are the trimmed, non-empty pieces between blank lines. They are
/// appended to the current chunk until the next one, together with its
/// separator, would push the chunk past `max_size` characters, at which point
/// the chunk is emitted and a new one starts. A single paragraph larger than
/// `max_size` becomes its own oversized chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphChunker {
    max_size: usize,
}

impl ParagraphChunker {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, text: &str, source: &str) -> Vec<Chunk> {
        let mut texts: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for paragraph in text
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            let paragraph_len = paragraph.chars().count();
            if !current.is_empty() && current_len + SEPARATOR_LEN + paragraph_len > self.max_size {
                texts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push_str(PARAGRAPH_SEPARATOR);
                current_len += SEPARATOR_LEN;
            }
            current.push_str(paragraph);
            current_len += paragraph_len;
        }

        if !current.is_empty() {
            texts.push(current);
        }

        if texts.is_empty() {
            texts.push(text.to_string());
        }

        let total_chunks = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| Chunk::new(text, source, chunk_id, total_chunks))
            .collect()
    }
}

/// Chunks produced from a directory load, plus what the loader skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedCorpus {
    pub chunks: Vec<Chunk>,
    pub files_indexed: usize,
    pub skipped: Vec<SkippedFile>,
}

impl Transform for ParagraphChunker {
    type In = LoadedDocuments;
    type Out = ChunkedCorpus;
    async fn transform(self, input: Self::In) -> anyhow::Result<Self::Out> {
        let files_indexed = input.documents.len();
        let chunks = input
            .documents
            .iter()
            .flat_map(|document| {
                let chunks = self.chunk(&document.content, &document.source);
                debug!(source = %document.source, chunks = chunks.len(), "Chunked document");
                chunks
            })
            .collect();

        Ok(ChunkedCorpus { chunks, files_indexed, skipped: input.skipped })
    }
}
