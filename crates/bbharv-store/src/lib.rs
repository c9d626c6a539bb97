//! Idempotent, resumable JSON-file persistence for harvested posts.
//!
//! One file per post, named by its platform-scoped id, under a per-site
//! directory. Writes go through a temp file plus rename so a reader never
//! observes a partially written record; re-saving the same id overwrites
//! deterministically (last write wins). There is no index beyond the id
//! lookup and directory enumeration.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bbharv_core::{HarvestRecord, PostId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record {id} does not deserialize: {source}")]
    Corrupt {
        id: PostId,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {id} does not serialize: {source}")]
    Serialize {
        id: PostId,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {id} not found")]
    NotFound { id: PostId },
}

/// File-per-record store rooted at one directory.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open (and create if absent) a store directory. Creation is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn exists(&self, id: PostId) -> bool {
        self.path_for(id).is_file()
    }

    /// Write the full record for `record.id`, atomically with respect to that
    /// key: the bytes land in a temp file first and are renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the record does not encode, or
    /// [`StoreError::Io`] on any filesystem failure.
    pub fn save(&self, record: &HarvestRecord) -> Result<(), StoreError> {
        let id = record.id;
        let json = serde_json::to_vec_pretty(record)
            .map_err(|source| StoreError::Serialize { id, source })?;

        let tmp = self.dir.join(format!(".{id}.json.tmp"));
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        {
            let mut file = fs::File::create(&tmp).map_err(io_err(&tmp))?;
            file.write_all(&json).map_err(io_err(&tmp))?;
            file.sync_all().map_err(io_err(&tmp))?;
        }

        let path = self.path_for(id);
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        tracing::debug!(id, path = %path.display(), "record saved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an absent id, [`StoreError::Corrupt`]
    /// if the file no longer parses, or [`StoreError::Io`] on read failure.
    pub fn load(&self, id: PostId) -> Result<HarvestRecord, StoreError> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StoreError::NotFound { id });
        }
        let bytes = fs::read(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { id, source })
    }

    /// Enumerate stored ids, sorted ascending. Non-record files are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be read.
    pub fn ids(&self) -> Result<Vec<PostId>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(id) = stem.parse::<PostId>() {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn path_for(&self, id: PostId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
