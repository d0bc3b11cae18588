//! Where the persisted document store lives on disk.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A resolved, existing data directory.
///
/// Precedence: the `--data-dir` flag, then `SEMDEX_DATA_DIR`, then the XDG
/// data home (`~/.local/share/semdex/`). The directory is created on resolve
/// so callers can write into it unconditionally.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::default_root()?,
        };
        std::fs::create_dir_all(&root).map_err(|_| Error::DataDir(root.clone()))?;
        Ok(Self { root })
    }

    fn default_root() -> Result<PathBuf> {
        if let Ok(val) = std::env::var("SEMDEX_DATA_DIR") {
            return Ok(PathBuf::from(val));
        }
        xdg::BaseDirectories::with_prefix("semdex")
            .get_data_home()
            .ok_or_else(|| Error::Config("could not determine XDG data home directory".into()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The JSON file holding the persisted document array.
    pub fn documents_file(&self) -> PathBuf {
        self.root.join("documents.json")
    }
}
