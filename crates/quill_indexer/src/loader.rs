use std::path::{Path, PathBuf};

use derive_setters::Setters;
use ignore::WalkBuilder;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::transform::Transform;

/// A text file read from the corpus directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    /// File name, used as the citation source of every chunk.
    pub source: String,
    pub content: String,
}

/// A file that matched the loader's filters but could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

/// Loader implementation for files
#[derive(Debug, Clone, Default, Setters)]
#[setters(into)]
pub struct FileLoader {
    /// Extensions without the leading dot. Empty accepts every file.
    extensions: Vec<String>,
}

impl FileLoader {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    fn should_include_file(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }

        if self.extensions.is_empty() {
            return true;
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    async fn load_file(&self, path: PathBuf) -> anyhow::Result<Document> {
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Document { path, source, content })
    }
}

impl Transform for FileLoader {
    type In = PathBuf;
    type Out = LoadedDocuments;
    async fn transform(self, input: Self::In) -> anyhow::Result<Self::Out> {
        let walk = WalkBuilder::new(&input)
            .standard_filters(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut loaded = LoadedDocuments::default();
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(dir = %input.display(), error = %error, "Failed to walk corpus");
                    continue;
                }
            };
            if !self.should_include_file(entry.path()) {
                continue;
            }

            let path = entry.into_path();
            match self.load_file(path.clone()).await {
                Ok(document) => {
                    debug!(path = %path.display(), bytes = document.content.len(), "Loaded document");
                    loaded.documents.push(document);
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Skipping unreadable file");
                    loaded
                        .skipped
                        .push(SkippedFile { path, reason: error.to_string() });
                }
            }
        }

        Ok(loaded)
    }
}
