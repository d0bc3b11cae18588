//! Load-at-start / save-on-mutate persistence for the document store.
//!
//! The engine itself never touches disk; the CLI calls these around store
//! mutations. Documents serialize as an ordered JSON array, with `embedding`,
//! `summary`, and `accessToken` omitted when absent so the layout round-trips
//! byte-for-byte.

use std::path::Path;

use crate::{document::Document, error::Result, store::DocumentStore};

/// Read persisted documents. A missing file is an empty store, not an error.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write the store's current snapshot. The write goes through a sibling
/// temp file and a rename so an interrupted save never truncates the old data.
pub fn save_store(path: &Path, store: &DocumentStore) -> Result<()> {
    let documents = store.snapshot();
    let json = serde_json::to_vec_pretty(&documents)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
