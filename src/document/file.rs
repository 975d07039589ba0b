//! File system document source.
//!
//! Supports PDF (one document per page) and plain text files, either as a
//! single path or a directory of such files.

use super::{Document, DocumentSource, SourceMetadata};
use crate::error::{RagbookError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};

/// Extensions read as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Loads documents from a file or directory.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    fn is_pdf(path: &Path) -> bool {
        Self::extension(path).as_deref() == Some("pdf")
    }

    fn is_text(path: &Path) -> bool {
        Self::extension(path)
            .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    fn is_supported(path: &Path) -> bool {
        Self::is_pdf(path) || Self::is_text(path)
    }

    /// Supported files under a directory, sorted for a stable ingest order.
    fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && Self::is_supported(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load_file(path: &Path) -> Result<Vec<Document>> {
        if Self::is_pdf(path) {
            load_pdf(path)
        } else if Self::is_text(path) {
            let text = std::fs::read_to_string(path)?;
            Ok(vec![Document::new(
                normalize_text(&text),
                SourceMetadata::new(path.display().to_string(), None),
            )])
        } else {
            Err(RagbookError::InvalidParameter(format!(
                "Not a recognized document type: {}",
                path.display()
            )))
        }
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<Document>> {
        if !self.path.exists() {
            return Err(RagbookError::SourceNotFound(format!(
                "The file {} does not exist",
                self.path.display()
            )));
        }

        let files = if self.path.is_dir() {
            let files = Self::list_dir(&self.path)?;
            if files.is_empty() {
                return Err(RagbookError::SourceNotFound(format!(
                    "No supported documents in {}",
                    self.path.display()
                )));
            }
            files
        } else {
            vec![self.path.clone()]
        };

        // PDF parsing is CPU-bound; keep it off the async workers.
        let documents = tokio::task::spawn_blocking(move || -> Result<Vec<Document>> {
            let mut documents = Vec::new();
            for file in &files {
                debug!("Loading {}", file.display());
                documents.extend(Self::load_file(file)?);
            }
            Ok(documents)
        })
        .await
        .map_err(|e| RagbookError::Document(format!("Loader task failed: {}", e)))??;

        info!("Loaded {} documents", documents.len());
        Ok(documents)
    }
}

/// Extract text page by page.
fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let pdf = lopdf::Document::load(path)
        .map_err(|e| RagbookError::Document(format!("{}: {}", path.display(), e)))?;

    let source = path.display().to_string();
    let mut documents = Vec::new();

    for page_number in pdf.get_pages().keys().copied() {
        match pdf.extract_text(&[page_number]) {
            Ok(text) => documents.push(Document::new(
                normalize_text(&text),
                SourceMetadata::new(source.clone(), Some(page_number)),
            )),
            Err(e) => warn!("Skipping page {} of {}: {}", page_number, source, e),
        }
    }

    if documents.is_empty() {
        return Err(RagbookError::Document(format!(
            "No text could be extracted from {}",
            source
        )));
    }

    Ok(documents)
}

/// Strip NULs, collapse horizontal whitespace runs and drop blank lines.
pub(crate) fn normalize_text(text: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").expect("valid regex"));

    text.replace('\0', "")
        .lines()
        .map(|line| spaces.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
