use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, globally unique document identifier assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Broad classification of the source file backing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Pdf,
    Image,
    Video,
    Audio,
    Unknown,
}

impl FileKind {
    /// Classify a locator by its file extension.
    pub fn from_locator(locator: &Path) -> Self {
        let ext = locator
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("txt" | "md" | "markdown" | "rst" | "org" | "csv" | "log") => FileKind::Text,
            Some("pdf") => FileKind::Pdf,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "heic" | "tiff") => FileKind::Image,
            Some("mp4" | "mov" | "mkv" | "avi" | "webm") => FileKind::Video,
            Some("mp3" | "wav" | "m4a" | "flac" | "ogg") => FileKind::Audio,
            _ => FileKind::Unknown,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Text => "text",
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The unit of storage and search.
///
/// `raw_text` is immutable once set; re-extraction creates a new document.
/// `embedding` and `summary` are filled in later by the batch scheduler, and
/// that is the only mutation a stored document ever sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "text")]
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(rename = "url")]
    pub source_locator: String,
    #[serde(rename = "fileKind")]
    pub file_kind: FileKind,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<crate::access::AccessToken>,
}

impl Document {
    /// Create an unembedded document. The id is assigned here and never changes.
    pub fn new(
        name: impl Into<String>,
        raw_text: impl Into<String>,
        metadata: BTreeMap<String, String>,
        file_kind: FileKind,
        source_locator: impl Into<String>,
        access_token: Option<crate::access::AccessToken>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            raw_text: raw_text.into(),
            embedding: None,
            source_locator: source_locator.into(),
            file_kind,
            metadata,
            summary: None,
            access_token,
        }
    }

    /// The exact string submitted to the embedding provider: the metadata
    /// serialized key-sorted, one `key: value` line each, followed by the raw
    /// text. Recomputed on every call, never cached.
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.metadata {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.raw_text);
        out
    }

    /// Whether any of the given fields contains `needle` case-insensitively.
    pub fn matches_substring(&self, needle: &str, include_summary: bool) -> bool {
        let needle = needle.to_lowercase();
        if self.name.to_lowercase().contains(&needle)
            || self.raw_text.to_lowercase().contains(&needle)
        {
            return true;
        }
        include_summary
            && self
                .summary
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
    }
}
