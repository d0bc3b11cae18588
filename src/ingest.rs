//! Ingestion: turn a file locator into a stored, unembedded document.

use std::path::Path;

use tracing::debug;

use crate::{
    access::ResourceAccessManager,
    document::{Document, DocumentId, FileKind},
    error::Result,
    extract::TextExtractor,
    store::DocumentStore,
};

/// Extract a file and add it to the store.
///
/// Plain text files are readable by path alone; every other kind gets an
/// access token at creation so the engine can re-read the locator after a
/// process restart. Extraction failures (including
/// [`crate::Error::UnsupportedFileKind`]) mean the document is never created.
pub fn add_document(
    store: &DocumentStore,
    extractor: &dyn TextExtractor,
    access: &dyn ResourceAccessManager,
    locator: &Path,
) -> Result<DocumentId> {
    let file_kind = FileKind::from_locator(locator);

    let raw_text = extractor.extract_text(locator)?;
    let metadata = extractor.extract_metadata(locator)?;

    let access_token = match file_kind {
        FileKind::Text => None,
        _ => Some(access.grant_access(locator)?),
    };

    let name = display_name(locator);
    let document = Document::new(
        name,
        raw_text,
        metadata,
        file_kind,
        locator.to_string_lossy(),
        access_token,
    );

    let id = store.add(document)?;
    debug!("ingested {} as {id}", locator.display());
    Ok(id)
}

fn display_name(locator: &Path) -> String {
    locator
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("untitled")
        .to_string()
}
