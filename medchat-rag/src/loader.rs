//! Document loaders: turn a file on disk into a page-ordered [`Document`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

/// Reads a document from a path.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SourceNotFound`] if the file is missing or
    /// unreadable and [`RagError::EmptyDocument`] if it has no text.
    async fn load(&self, path: &Path) -> Result<Document>;
}

/// Extracts PDF text with poppler's `pdftotext`, one entry per page.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    program: PathBuf,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self { program: PathBuf::from("pdftotext") }
    }
}

impl PdfLoader {
    /// Use the `pdftotext` found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftotext` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

/// Split `pdftotext` output into pages. Pages end with a form feed.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\u{000C}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

async fn ensure_exists(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(RagError::SourceNotFound { path: path.display().to_string() }),
    }
}

fn non_blank(document: Document) -> Result<Document> {
    if document.is_blank() {
        warn!(source = %document.source, "document has no extractable text");
        return Err(RagError::EmptyDocument(format!(
            "no text could be extracted from '{}'",
            document.source
        )));
    }
    Ok(document)
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Document> {
        ensure_exists(path).await?;

        debug!(path = %path.display(), program = %self.program.display(), "extracting PDF text");
        let output = Command::new(&self.program)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .await
            .map_err(|e| RagError::SourceNotFound {
                path: format!(
                    "{} (failed to run {}: {e}; is poppler installed?)",
                    path.display(),
                    self.program.display()
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RagError::SourceNotFound {
                path: format!("{} ({})", path.display(), stderr.trim()),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let document = non_blank(Document::new(path.display().to_string(), split_pages(&text)))?;
        info!(path = %path.display(), pages = document.pages.len(), "loaded PDF");
        Ok(document)
    }
}

/// Loads a UTF-8 text file. Form feeds, if any, separate pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

#[async_trait]
impl DocumentLoader for TextLoader {
    async fn load(&self, path: &Path) -> Result<Document> {
        ensure_exists(path).await?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| RagError::SourceNotFound { path: path.display().to_string() })?;
        let document = non_blank(Document::new(path.display().to_string(), split_pages(&text)))?;
        info!(path = %path.display(), pages = document.pages.len(), "loaded text document");
        Ok(document)
    }
}

/// Pick a loader from the file extension: `.pdf` uses [`PdfLoader`],
/// everything else [`TextLoader`].
pub fn loader_for_path(path: &Path) -> Box<dyn DocumentLoader> {
    if is_pdf(path) { Box::new(PdfLoader::new()) } else { Box::new(TextLoader) }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_form_feeds() {
        assert_eq!(split_pages("one\u{c}two\u{c}"), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(split_pages("single"), vec!["single".to_string()]);
        assert_eq!(split_pages(""), vec![String::new()]);
    }

    #[tokio::test]
    async fn missing_file_is_source_not_found() {
        let err = TextLoader.load(Path::new("/definitely/not/here.txt")).await.unwrap_err();
        assert!(matches!(err, RagError::SourceNotFound { .. }));

        let err = PdfLoader::new().load(Path::new("/definitely/not/here.pdf")).await.unwrap_err();
        assert!(matches!(err, RagError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn text_file_round_trip() {
        let path =
            std::env::temp_dir().join(format!("medchat-loader-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "Page one\u{c}Page two").await.unwrap();
        let doc = TextLoader.load(&path).await.unwrap();
        assert_eq!(doc.pages, vec!["Page one".to_string(), "Page two".to_string()]);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn blank_text_file_is_empty_document() {
        let path =
            std::env::temp_dir().join(format!("medchat-loader-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "  \n ").await.unwrap();
        let err = TextLoader.load(&path).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyDocument(_)));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn detects_pdf_extension() {
        assert!(is_pdf(Path::new("diagnostic-report.pdf")));
        assert!(is_pdf(Path::new("REPORT.PDF")));
        assert!(!is_pdf(Path::new("report.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }
}
