// Persistent place-name -> coordinate store
use crate::domain::error::BookmapError;
use crate::domain::model::{CacheEntry, CacheKey};
use crate::migration::legacy::LegacyEntry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The one piece of state that survives between builds.
///
/// A single JSON document, keys sorted and pretty-printed so the file stays
/// hand-editable: a user can paste a corrected coordinate or delete an entry
/// to force re-resolution. Loaded whole at build start, flushed once at build
/// end.
pub struct GeocodeStore {
    path: PathBuf,
    entries: BTreeMap<CacheKey, CacheEntry>,
    dirty: bool,
}

// Accepted on-disk value shapes: the current form, plus the shape earlier
// generations of the tool wrote.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Current(CacheEntry),
    Legacy(LegacyEntry),
}

impl GeocodeStore {
    /// Total-file read at startup. A missing file is an empty store; a
    /// corrupt file or entry is skipped with a warning rather than failing
    /// the build. The upstream service remains the source of truth.
    pub fn load(path: &Path) -> Self {
        let mut entries = BTreeMap::new();

        match fs::read_to_string(path) {
            Ok(content) => {
                match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&content) {
                    Ok(raw) => {
                        for (key, value) in raw {
                            match serde_json::from_value::<StoredEntry>(value) {
                                Ok(StoredEntry::Current(entry)) => {
                                    // Keys re-normalize on load so hand-added
                                    // entries join the same identity space.
                                    entries.insert(CacheKey::from_name(&key), entry);
                                }
                                Ok(StoredEntry::Legacy(legacy)) => {
                                    entries.insert(CacheKey::from_name(&key), legacy.into());
                                }
                                Err(e) => {
                                    warn!("Skipping unreadable cache entry {:?}: {}", key, e);
                                }
                            }
                        }
                        debug!(
                            "Loaded {} cached locations from {}",
                            entries.len(),
                            path.display()
                        );
                    }
                    Err(e) => {
                        warn!(
                            "Cache store {} is corrupt ({}); starting empty",
                            path.display(),
                            e
                        );
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache store at {}; starting empty", path.display());
            }
            Err(e) => {
                warn!(
                    "Cache store {} unreadable ({}); starting empty",
                    path.display(),
                    e
                );
            }
        }

        Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        }
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite; a re-resolution replaces the old entry whole.
    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Durably persist all entries, write-new-then-replace: the new document
    /// is written to a temp file in the same directory and renamed over the
    /// old one, so an interrupted flush never corrupts prior state. Skipped
    /// when no entry was added or changed this run.
    pub fn flush(&mut self) -> Result<(), BookmapError> {
        if !self.dirty {
            debug!("Cache store unchanged; skipping flush");
            return Ok(());
        }

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .map_err(|e| BookmapError::CacheIo(format!("create {}: {}", parent.display(), e)))?;

        let json = serde_json::to_string_pretty(&self.entries)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| BookmapError::CacheIo(format!("temp file in {}: {}", parent.display(), e)))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|e| BookmapError::CacheIo(format!("write cache: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            BookmapError::CacheIo(format!("replace {}: {}", self.path.display(), e))
        })?;

        self.dirty = false;
        debug!(
            "Flushed {} entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
