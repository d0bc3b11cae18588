//! The authoritative, insertion-ordered document collection.
//!
//! All mutations are serialized behind one lock; readers take snapshots, so a
//! scheduler or ranker pass never observes a half-mutated collection.

use std::sync::RwLock;

use tokio::sync::watch;

use crate::{
    document::{Document, DocumentId},
    error::{Error, Result},
};

/// Mutation applied through [`DocumentStore::update`]. Only `embedding` and
/// `summary` are ever writable after creation.
#[derive(Debug, Default, Clone)]
pub struct DocumentPatch {
    pub embedding: Option<Vec<f32>>,
    pub summary: Option<String>,
}

pub struct DocumentStore {
    documents: RwLock<Vec<Document>>,
    revision: watch::Sender<u64>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    /// Seed the store from previously persisted documents.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            documents: RwLock::new(documents),
            revision,
        }
    }

    /// Append a document. Fails with [`Error::DuplicateLocator`] when a
    /// document for the same source locator already exists.
    pub fn add(&self, document: Document) -> Result<DocumentId> {
        let mut docs = self.documents.write().expect("store lock poisoned");
        if docs
            .iter()
            .any(|d| d.source_locator == document.source_locator)
        {
            return Err(Error::DuplicateLocator(document.source_locator));
        }
        let id = document.id;
        docs.push(document);
        drop(docs);
        self.bump();
        Ok(id)
    }

    /// Remove matching documents. Unknown ids are ignored.
    pub fn remove(&self, ids: &[DocumentId]) {
        let mut docs = self.documents.write().expect("store lock poisoned");
        docs.retain(|d| !ids.contains(&d.id));
        drop(docs);
        self.bump();
    }

    pub fn clear(&self) {
        self.documents.write().expect("store lock poisoned").clear();
        self.bump();
    }

    /// Apply a patch to exactly one document.
    ///
    /// This is the only path by which workers mutate a document. Racing
    /// updates on the same id apply last-write-wins; an embedding whose
    /// dimension differs from the rest of the store is rejected, because
    /// mixing model dimensions would invalidate every comparison.
    /// A summary, once set, is kept.
    pub fn update(&self, id: DocumentId, patch: DocumentPatch) -> Result<()> {
        let mut docs = self.documents.write().expect("store lock poisoned");

        if let Some(ref embedding) = patch.embedding {
            if let Some(expected) = docs
                .iter()
                .filter(|d| d.id != id)
                .find_map(|d| d.embedding.as_ref().map(Vec::len))
            {
                if embedding.len() != expected {
                    return Err(Error::DimensionMismatch {
                        expected,
                        got: embedding.len(),
                    });
                }
            }
        }

        let doc = docs.iter_mut().find(|d| d.id == id).ok_or(Error::NotFound {
            kind: "document",
            name: id.to_string(),
        })?;

        if let Some(embedding) = patch.embedding {
            doc.embedding = Some(embedding);
        }
        if let Some(summary) = patch.summary {
            if doc.summary.is_none() {
                doc.summary = Some(summary);
            }
        }
        drop(docs);
        self.bump();
        Ok(())
    }

    /// An immutable, insertion-ordered copy for iteration.
    pub fn snapshot(&self) -> Vec<Document> {
        self.documents.read().expect("store lock poisoned").clone()
    }

    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.documents
            .read()
            .expect("store lock poisoned")
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension shared by every embedded document, if any is embedded yet.
    pub fn embedding_dimension(&self) -> Option<usize> {
        self.documents
            .read()
            .expect("store lock poisoned")
            .iter()
            .find_map(|d| d.embedding.as_ref().map(Vec::len))
    }

    /// Subscribe to mutation notifications. The value is a revision counter;
    /// consumers re-read via [`DocumentStore::snapshot`].
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::document::FileKind;

    fn make_doc(locator: &str) -> Document {
        Document::new(
            locator.trim_start_matches('/'),
            format!("content of {locator}"),
            BTreeMap::new(),
            FileKind::Text,
            locator,
            None,
        )
    }

    #[test]
    fn add_preserves_insertion_order() {
        let store = DocumentStore::new();
        store.add(make_doc("/a")).unwrap();
        store.add(make_doc("/b")).unwrap();
        store.add(make_doc("/c")).unwrap();

        let locators: Vec<_> = store
            .snapshot()
            .into_iter()
            .map(|d| d.source_locator)
            .collect();
        assert_eq!(locators, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn duplicate_locator_rejected() {
        let store = DocumentStore::new();
        store.add(make_doc("/a")).unwrap();
        let err = store.add(make_doc("/a")).unwrap_err();
        assert!(matches!(err, Error::DuplicateLocator(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let store = DocumentStore::new();
        let id = store.add(make_doc("/a")).unwrap();
        store.remove(&[DocumentId::new()]);
        assert_eq!(store.len(), 1);
        store.remove(&[id]);
        assert!(store.is_empty());
    }

    #[test]
    fn update_unknown_id_fails() {
        let store = DocumentStore::new();
        let err = store
            .update(DocumentId::new(), DocumentPatch::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn update_sets_embedding_and_summary() {
        let store = DocumentStore::new();
        let id = store.add(make_doc("/a")).unwrap();
        store
            .update(
                id,
                DocumentPatch {
                    embedding: Some(vec![1.0, 2.0]),
                    summary: Some("short".to_string()),
                },
            )
            .unwrap();

        let doc = store.get(id).unwrap();
        assert_eq!(doc.embedding, Some(vec![1.0, 2.0]));
        assert_eq!(doc.summary.as_deref(), Some("short"));
    }

    #[test]
    fn summary_set_at_most_once() {
        let store = DocumentStore::new();
        let id = store.add(make_doc("/a")).unwrap();
        let patch = |s: &str| DocumentPatch {
            embedding: None,
            summary: Some(s.to_string()),
        };
        store.update(id, patch("first")).unwrap();
        store.update(id, patch("second")).unwrap();
        assert_eq!(store.get(id).unwrap().summary.as_deref(), Some("first"));
    }

    #[test]
    fn mismatched_dimension_rejected() {
        let store = DocumentStore::new();
        let a = store.add(make_doc("/a")).unwrap();
        let b = store.add(make_doc("/b")).unwrap();

        let embed = |v: Vec<f32>| DocumentPatch {
            embedding: Some(v),
            summary: None,
        };
        store.update(a, embed(vec![1.0, 0.0, 0.0])).unwrap();
        let err = store.update(b, embed(vec![1.0, 0.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                got: 2
            }
        ));
        assert!(store.get(b).unwrap().embedding.is_none());
        assert_eq!(store.embedding_dimension(), Some(3));
    }

    #[test]
    fn re_embedding_same_document_may_change_dimension() {
        // A full re-embedding pass with a new model rewrites the only
        // embedded document; its own old dimension must not block it.
        let store = DocumentStore::new();
        let a = store.add(make_doc("/a")).unwrap();
        let embed = |v: Vec<f32>| DocumentPatch {
            embedding: Some(v),
            summary: None,
        };
        store.update(a, embed(vec![1.0, 0.0, 0.0])).unwrap();
        store.update(a, embed(vec![1.0, 0.0])).unwrap();
        assert_eq!(store.embedding_dimension(), Some(2));
    }

    #[test]
    fn snapshot_is_decoupled_from_later_mutation() {
        let store = DocumentStore::new();
        store.add(make_doc("/a")).unwrap();
        let snapshot = store.snapshot();
        store.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn mutations_bump_revision() {
        let store = DocumentStore::new();
        let rx = store.subscribe();
        let before = *rx.borrow();
        let id = store.add(make_doc("/a")).unwrap();
        store
            .update(
                id,
                DocumentPatch {
                    embedding: Some(vec![1.0]),
                    summary: None,
                },
            )
            .unwrap();
        store.clear();
        assert_eq!(*rx.borrow(), before + 3);
    }
}
