//! Resource access tokens for files outside the default access scope.
//!
//! Externally supplied files must stay readable across process restarts. The
//! manager issues an opaque, persistable token at ingestion time and later
//! resolves it back into a scoped read authorization. Platforms with real
//! sandboxing implement issuance differently; the interface is the same.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque credential authorizing future reads of a source locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and resolves access tokens.
///
/// `with_access` is the only sanctioned way to read through a token: it
/// acquires, runs the operation, and releases on every exit path. Concurrent
/// access to the same locator is treated as serialized at the call site.
pub trait ResourceAccessManager: Send + Sync {
    /// Authorize future reads of `locator`. Fails with
    /// [`Error::ResourceAccessDenied`] when the locator cannot be authorized.
    fn grant_access(&self, locator: &Path) -> Result<AccessToken>;

    /// Begin a scoped acquisition. The returned guard releases on drop.
    fn begin_access<'a>(
        &'a self,
        token: &AccessToken,
        locator: &Path,
    ) -> Result<AccessGuard<'a>>;

    /// Release a previously begun acquisition. Called by the guard.
    fn end_access(&self, token: &AccessToken);

    /// Run `op` with access to `locator`, releasing on success, error, or
    /// panic unwind alike. A stale token yields [`Error::ResourceAccessDenied`]
    /// and the caller must treat the document as currently unreadable.
    fn with_access<T>(
        &self,
        token: &AccessToken,
        locator: &Path,
        op: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<T>
    where
        Self: Sized,
    {
        let guard = self.begin_access(token, locator)?;
        op(guard.path())
    }
}

/// RAII handle for an active acquisition.
pub struct AccessGuard<'a> {
    manager: &'a dyn ResourceAccessManager,
    token: AccessToken,
    path: PathBuf,
}

impl AccessGuard<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        self.manager.end_access(&self.token);
    }
}

/// Filesystem-backed manager.
///
/// Tokens encode the canonical path, so they survive restarts as long as the
/// file does. Acquisitions are counted per token; the counter exists so that
/// reentrant acquisition of the same locator stays balanced.
#[derive(Default)]
pub struct FsAccessManager {
    active: Mutex<HashMap<String, usize>>,
}

const TOKEN_PREFIX: &str = "fs1:";

impl FsAccessManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode(token: &AccessToken) -> Result<PathBuf> {
        let hex = token.as_str().strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
            Error::ResourceAccessDenied(format!("unrecognized token format: {token}"))
        })?;
        let bytes = hex_decode(hex).ok_or_else(|| {
            Error::ResourceAccessDenied(format!("corrupt token: {token}"))
        })?;
        let s = String::from_utf8(bytes).map_err(|_| {
            Error::ResourceAccessDenied(format!("corrupt token: {token}"))
        })?;
        Ok(PathBuf::from(s))
    }

    #[cfg(test)]
    fn active_count(&self, token: &AccessToken) -> usize {
        self.active
            .lock()
            .unwrap()
            .get(token.as_str())
            .copied()
            .unwrap_or(0)
    }
}

impl ResourceAccessManager for FsAccessManager {
    fn grant_access(&self, locator: &Path) -> Result<AccessToken> {
        let canonical = locator.canonicalize().map_err(|e| {
            Error::ResourceAccessDenied(format!(
                "cannot authorize {}: {e}",
                locator.display()
            ))
        })?;
        let encoded = hex_encode(canonical.to_string_lossy().as_bytes());
        Ok(AccessToken::from_raw(format!("{TOKEN_PREFIX}{encoded}")))
    }

    fn begin_access<'a>(
        &'a self,
        token: &AccessToken,
        locator: &Path,
    ) -> Result<AccessGuard<'a>> {
        let path = Self::decode(token)?;
        if !path.exists() {
            return Err(Error::ResourceAccessDenied(format!(
                "token no longer resolves: {}",
                path.display()
            )));
        }
        // The token must still refer to the locator it was issued for.
        if let Ok(canonical) = locator.canonicalize() {
            if canonical != path {
                return Err(Error::ResourceAccessDenied(format!(
                    "token does not match locator {}",
                    locator.display()
                )));
            }
        }

        let mut active = self.active.lock().expect("access table poisoned");
        *active.entry(token.as_str().to_string()).or_insert(0) += 1;

        Ok(AccessGuard {
            manager: self,
            token: token.clone(),
            path,
        })
    }

    fn end_access(&self, token: &AccessToken) {
        let mut active = self.active.lock().expect("access table poisoned");
        if let Some(count) = active.get_mut(token.as_str()) {
            *count -= 1;
            if *count == 0 {
                active.remove(token.as_str());
            }
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

// Operates on raw bytes: token payloads come from persisted state and may
// hold arbitrary data, so string slicing is off limits.
fn hex_decode(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    if bytes.len() % 2 != 0 {
        return None;
    }
    bytes
        .chunks(2)
        .map(|pair| Some(hex_val(pair[0])? << 4 | hex_val(pair[1])?))
        .collect()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
