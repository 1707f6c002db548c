//! Statement text sources
//!
//! A source turns a statement document into raw text lines in reading order.
//! The pipeline only sees lines; decryption and text layout are the source's
//! problem.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Whether the document had to be decrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decryption {
    NotEncrypted,
    Decrypted,
}

impl Decryption {
    pub fn decrypted(&self) -> bool {
        matches!(self, Self::Decrypted)
    }
}

/// Lines read from a statement
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Per-page lines in page order, blank lines kept
    pub lines: Vec<String>,
    pub decryption: Decryption,
}

/// Anything that can produce statement lines
///
/// Wrong password and missing password are reported as
/// [`Error::WrongPassword`] and [`Error::PasswordRequired`].
pub trait StatementSource {
    fn read_lines(&self, password: Option<&str>) -> Result<SourceText>;
}

/// Encrypted or plain PDF statement, read with lopdf
pub struct PdfSource {
    path: PathBuf,
}

impl PdfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatementSource for PdfSource {
    fn read_lines(&self, password: Option<&str>) -> Result<SourceText> {
        let mut doc = lopdf::Document::load(&self.path)
            .map_err(|e| Error::Pdf(format!("{}: {}", self.path.display(), e)))?;

        let decryption = if doc.is_encrypted() {
            let password = password.ok_or(Error::PasswordRequired)?;
            doc.decrypt(password).map_err(|e| {
                debug!("PDF decryption failed: {}", e);
                Error::WrongPassword
            })?;
            Decryption::Decrypted
        } else {
            Decryption::NotEncrypted
        };

        let mut lines = Vec::new();
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        for page in &pages {
            let text = doc
                .extract_text(&[*page])
                .map_err(|e| Error::Pdf(format!("page {}: {}", page, e)))?;
            lines.extend(text.lines().map(str::to_string));
        }

        info!(
            pages = pages.len(),
            lines = lines.len(),
            decrypted = decryption.decrypted(),
            "Read PDF statement"
        );
        Ok(SourceText { lines, decryption })
    }
}

/// Statement already converted to text (one line per line)
pub struct TextFileSource {
    path: PathBuf,
}

impl TextFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatementSource for TextFileSource {
    fn read_lines(&self, _password: Option<&str>) -> Result<SourceText> {
        let content = fs::read_to_string(&self.path)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        debug!(path = %self.path.display(), lines = lines.len(), "Read text statement");
        Ok(SourceText {
            lines,
            decryption: Decryption::NotEncrypted,
        })
    }
}

/// Pick a source by file extension (`.pdf` = PDF, anything else = text)
pub fn source_for_path(path: &Path) -> Box<dyn StatementSource> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfSource::new(path))
    } else {
        Box::new(TextFileSource::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_source_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.txt");
        std::fs::write(&path, "Date  Amount\n\n01-03-2024  100.00\r\n").unwrap();

        let text = TextFileSource::new(&path).read_lines(None).unwrap();
        assert_eq!(text.lines, vec!["Date  Amount", "", "01-03-2024  100.00"]);
        assert!(!text.decryption.decrypted());
    }

    #[test]
    fn test_text_source_missing_file() {
        let err = TextFileSource::new("/nonexistent/statement.txt")
            .read_lines(None)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_pdf_source_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");
        std::fs::write(&path, "this is not a pdf").unwrap();

        let err = PdfSource::new(&path).read_lines(Some("secret")).unwrap_err();
        assert!(matches!(err, Error::Pdf(_)));
    }

    #[test]
    fn test_source_for_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.TXT");
        std::fs::write(&path, "line").unwrap();
        let text = source_for_path(&path).read_lines(None).unwrap();
        assert_eq!(text.lines, vec!["line"]);
    }
}
