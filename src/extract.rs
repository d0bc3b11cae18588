//! Text extraction collaborator interface.
//!
//! Per-file-type extraction (PDF text layers, OCR, transcription) lives
//! outside this crate. The engine only consumes this trait; the bundled
//! implementation handles plain text so the pipeline works out of the box.

use std::{collections::BTreeMap, path::Path, time::UNIX_EPOCH};

use crate::{
    document::FileKind,
    error::{Error, Result},
};

/// Extracts textual content and a metadata mapping from a file locator.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, locator: &Path) -> Result<String>;

    fn extract_metadata(&self, locator: &Path) -> Result<BTreeMap<String, String>>;
}

/// Reads UTF-8 text files and reports basic file attributes. Declines every
/// other kind with [`Error::UnsupportedFileKind`], so no document is created
/// for them.
#[derive(Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn check_kind(locator: &Path) -> Result<()> {
        match FileKind::from_locator(locator) {
            FileKind::Text => Ok(()),
            kind => Err(Error::UnsupportedFileKind(format!(
                "{kind} ({})",
                locator.display()
            ))),
        }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, locator: &Path) -> Result<String> {
        Self::check_kind(locator)?;
        Ok(std::fs::read_to_string(locator)?)
    }

    fn extract_metadata(&self, locator: &Path) -> Result<BTreeMap<String, String>> {
        Self::check_kind(locator)?;

        let mut metadata = BTreeMap::new();
        if let Some(ext) = locator.extension().and_then(|e| e.to_str()) {
            metadata.insert("extension".to_string(), ext.to_lowercase());
        }

        let attrs = std::fs::metadata(locator)?;
        metadata.insert("size".to_string(), attrs.len().to_string());
        if let Ok(modified) = attrs.modified() {
            if let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) {
                metadata.insert("modified".to_string(), since_epoch.as_secs().to_string());
            }
        }

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("notes.md");
        std::fs::write(&file, "# Heading\n\nBody.").unwrap();

        let extractor = PlainTextExtractor::new();
        assert_eq!(extractor.extract_text(&file).unwrap(), "# Heading\n\nBody.");

        let metadata = extractor.extract_metadata(&file).unwrap();
        assert_eq!(metadata.get("extension").map(String::as_str), Some("md"));
        assert_eq!(metadata.get("size").map(String::as_str), Some("16"));
        assert!(metadata.contains_key("modified"));
    }

    #[test]
    fn declines_non_text_kinds() {
        let extractor = PlainTextExtractor::new();
        let err = extractor
            .extract_text(Path::new("/tmp/photo.jpg"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileKind(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let extractor = PlainTextExtractor::new();
        let err = extractor
            .extract_text(Path::new("/nonexistent/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
