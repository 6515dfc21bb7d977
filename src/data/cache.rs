//! Content-addressed cache of unified datasets.
//!
//! Uploads are keyed by the SHA-256 of their bytes, files by canonical path
//! plus modification time, so two different uploads never share an entry
//! and an edited file is reloaded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::error::{DashboardError, Result};

use super::loader::{load_with, SheetNames, Source};
use super::model::SalesDataset;

/// Identity of a loaded source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    /// Hex SHA-256 of the workbook bytes.
    Content(String),
    File { path: PathBuf, modified: SystemTime },
}

impl SourceKey {
    pub fn for_source(source: &Source) -> Result<SourceKey> {
        match source {
            Source::Uploaded { bytes, .. } => Ok(SourceKey::Content(content_hash(bytes))),
            Source::Path(path) => {
                let unavailable = |e: std::io::Error| {
                    DashboardError::source_unavailable(format!("{}: {e}", path.display()))
                };
                let modified = std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .map_err(unavailable)?;
                let path = std::fs::canonicalize(path).map_err(unavailable)?;
                Ok(SourceKey::File { path, modified })
            }
        }
    }
}

/// Hex-encoded SHA-256 digest.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Maps source identity → immutable dataset.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<SourceKey, Arc<SalesDataset>>,
    sheets: SheetNames,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet_names(sheets: SheetNames) -> Self {
        DatasetCache {
            entries: HashMap::new(),
            sheets,
        }
    }

    /// Return the cached dataset for `source`, loading it on a miss.
    pub fn get_or_load(&mut self, source: &Source) -> Result<Arc<SalesDataset>> {
        let key = SourceKey::for_source(source)?;
        if let Some(dataset) = self.entries.get(&key) {
            log::debug!("dataset cache hit for {}", source.describe());
            return Ok(Arc::clone(dataset));
        }
        log::debug!("dataset cache miss for {}", source.describe());

        // A new mtime for a known path makes the old entry stale.
        if let SourceKey::File { path, .. } = &key {
            self.entries
                .retain(|k, _| !matches!(k, SourceKey::File { path: p, .. } if p == path));
        }

        let dataset = Arc::new(load_with(source, &self.sheets)?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn get(&self, key: &SourceKey) -> Option<Arc<SalesDataset>> {
        self.entries.get(key).cloned()
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::sample::{sample_workbook, SampleOptions};

    fn upload(seed: u64) -> Source {
        let opts = SampleOptions {
            seed,
            years: 1,
            ..Default::default()
        };
        Source::Uploaded {
            name: format!("upload-{seed}.xlsx"),
            bytes: sample_workbook(&opts).unwrap(),
        }
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = content_hash(b"abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn same_upload_is_served_from_cache() {
        let mut cache = DatasetCache::new();
        let source = upload(1);
        let a = cache.get_or_load(&source).unwrap();
        let b = cache.get_or_load(&source).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_uploads_get_separate_entries() {
        let mut cache = DatasetCache::new();
        let a = cache.get_or_load(&upload(1)).unwrap();
        let b = cache.get_or_load(&upload(2)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);

        let key = SourceKey::for_source(&upload(1)).unwrap();
        assert!(cache.get(&key).is_some());
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn file_reloads_after_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.xlsx");
        let Source::Uploaded { bytes, .. } = upload(1) else {
            unreachable!()
        };
        std::fs::write(&path, &bytes).unwrap();

        let mut cache = DatasetCache::new();
        let source = Source::Path(path.clone());
        let first = cache.get_or_load(&source).unwrap();
        assert!(Arc::ptr_eq(&first, &cache.get_or_load(&source).unwrap()));

        let Source::Uploaded { bytes, .. } = upload(2) else {
            unreachable!()
        };
        std::fs::write(&path, &bytes).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        drop(file);

        let second = cache.get_or_load(&source).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(*first, *second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let mut cache = DatasetCache::new();
        let err = cache
            .get_or_load(&Source::Path(PathBuf::from("/definitely/not/here.xlsx")))
            .unwrap_err();
        assert!(matches!(err, DashboardError::SourceUnavailable(_)));
    }
}
