//! JSON snapshot file adapter.
//!
//! The whole image is rewritten on every save.  The new document goes to
//! a sibling `*.tmp` file first and is renamed over the old one, so a
//! crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::StatePort;
use crate::error::StoreError;
use crate::io::state::Snapshot;

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StatePort for FileStateStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let bytes = fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound,
            _ => {
                warn!("FileStateStore: read {}: {}", self.path.display(), e);
                StoreError::Io
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("FileStateStore: parse {}: {}", self.path.display(), e);
            StoreError::Corrupted
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec(snapshot).map_err(|_| StoreError::Corrupted)?;
        let tmp = self.temp_path();
        fs::write(&tmp, &json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                warn!("FileStateStore: write {}: {}", self.path.display(), e);
                StoreError::Io
            })?;
        debug!("FileStateStore: saved {} bytes", json.len());
        Ok(())
    }
}
