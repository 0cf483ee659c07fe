//! Named recording files on disk
//!
//! One recording per `<name>.json` file under a root directory. The store
//! keeps an in-memory cache of everything it has saved or loaded and
//! enforces a retention cap by deleting the oldest files.

use crate::error::StoreError;
use crate::frame::{Recording, RecordingFile};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

const EXTENSION: &str = "json";

pub struct RecordingStore {
    root: PathBuf,
    max_files: usize,
    cache: HashMap<String, Arc<Recording>>,
}

impl RecordingStore {
    /// Create the root directory if needed and apply the retention cap.
    pub fn open(root: impl Into<PathBuf>, max_files: usize) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        debug!(root = %root.display(), max_files, "recording store opened");

        let mut store = Self {
            root,
            max_files: max_files.max(1),
            cache: HashMap::new(),
        };
        store.sweep()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn set_max_files(&mut self, max_files: usize) {
        self.max_files = max_files.max(1);
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(format!("{name}.{EXTENSION}")))
    }

    /// Save and report success. Failures are logged.
    pub fn save(&mut self, recording: Arc<Recording>, name: &str) -> bool {
        match self.try_save(recording, name) {
            Ok(path) => {
                info!(path = %path.display(), "recording saved");
                true
            }
            Err(e) => {
                error!(name, error = %e, "failed to save recording");
                false
            }
        }
    }

    /// Write through a temporary file and rename, then sweep. A failed
    /// sweep is logged; the recording is already on disk.
    pub fn try_save(&mut self, recording: Arc<Recording>, name: &str) -> Result<PathBuf, StoreError> {
        let path = self.path_for(name)?;
        let json = serde_json::to_string_pretty(&RecordingFile::from(recording.as_ref()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;

        self.cache.insert(name.to_string(), recording);
        self.sweep_after_save();
        Ok(path)
    }

    fn sweep_after_save(&mut self) -> usize {
        self.sweep().unwrap_or_else(|e| {
            warn!(error = %e, "retention sweep failed after save");
            0
        })
    }

    /// Load from cache or disk. Missing and corrupt files yield `None`.
    pub fn load(&mut self, name: &str) -> Option<Arc<Recording>> {
        match self.try_load(name) {
            Ok(recording) => Some(recording),
            Err(e) => {
                error!(name, error = %e, "failed to load recording");
                None
            }
        }
    }

    pub fn try_load(&mut self, name: &str) -> Result<Arc<Recording>, StoreError> {
        if let Some(recording) = self.cache.get(name) {
            return Ok(recording.clone());
        }
        let path = self.path_for(name)?;
        let recording = Arc::new(read_recording(&path, name)?);
        self.cache.insert(name.to_string(), recording.clone());
        debug!(name, "recording loaded from disk");
        Ok(recording)
    }

    /// Stored names, sorted.
    pub fn list(&self) -> Vec<String> {
        match self.entries() {
            Ok(entries) => {
                let mut names: Vec<String> = entries.into_iter().map(|e| e.name).collect();
                names.sort();
                names
            }
            Err(e) => {
                error!(error = %e, "failed to list recordings");
                Vec::new()
            }
        }
    }

    /// Remove a stored recording. Returns `false` if it did not exist.
    pub fn delete(&mut self, name: &str) -> bool {
        match self.try_delete(name) {
            Ok(()) => {
                info!(name, "recording deleted");
                true
            }
            Err(StoreError::NotFound(_)) => false,
            Err(e) => {
                error!(name, error = %e, "failed to delete recording");
                false
            }
        }
    }

    pub fn try_delete(&mut self, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        self.cache.remove(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Delete the oldest files beyond the retention cap. Returns how many
    /// were removed.
    pub fn sweep(&mut self) -> Result<usize, StoreError> {
        let mut entries = self.entries()?;
        if entries.len() <= self.max_files {
            return Ok(0);
        }
        entries.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));

        let excess = entries.len() - self.max_files;
        let mut removed = 0;
        for entry in entries.into_iter().take(excess) {
            match fs::remove_file(&entry.path) {
                Ok(()) => {
                    self.cache.remove(&entry.name);
                    removed += 1;
                    info!(name = %entry.name, "retention sweep removed recording");
                }
                Err(e) => warn!(name = %entry.name, error = %e, "retention sweep could not remove file"),
            }
        }
        Ok(removed)
    }

    fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        let dir = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut entries = Vec::new();
        for item in dir.flatten() {
            let path = item.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let created = item
                .metadata()
                .ok()
                .and_then(|m| m.created().or_else(|_| m.modified()).ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push(Entry { name, path, created });
        }
        Ok(entries)
    }
}

struct Entry {
    name: String,
    path: PathBuf,
    created: SystemTime,
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Read and validate one recording file.
pub fn read_recording(path: &Path, name: &str) -> Result<Recording, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(name.to_string()))
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let file: RecordingFile = serde_json::from_str(&text)?;
    Recording::try_from(file).map_err(|source| StoreError::Corrupt {
        name: name.to_string(),
        source,
    })
}
