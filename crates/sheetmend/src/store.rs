//! The workbook load/save seam.
//!
//! File formats are external collaborators: whatever parses and writes
//! XLSX, CSV, or anything else sits behind [`WorkbookStore`], and the
//! pipeline only ever asks it to load a snapshot or commit a saved one.
//! Backups go through the same seam, so a store's medium (disk, memory,
//! object storage) carries them too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sheetmend_core::Workbook;

use crate::error::{Error, Result};

/// Loads and saves workbooks by path.
///
/// `load` failures are the pipeline's one hard error: a workbook that
/// cannot be opened or parsed at all propagates to the caller.
pub trait WorkbookStore {
    /// Load a read snapshot of the workbook at `path`
    fn load(&self, path: &Path) -> Result<Workbook>;

    /// Persist `workbook` at `path`, replacing whatever was there
    fn save(&self, workbook: &Workbook, path: &Path) -> Result<()>;
}

/// An in-memory store, for tests and embedders that manage their own
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    workbooks: Mutex<HashMap<PathBuf, Workbook>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a workbook at a path
    pub fn insert(&self, path: impl Into<PathBuf>, workbook: Workbook) {
        self.lock().insert(path.into(), workbook);
    }

    /// Fetch a copy of the workbook at a path, if present
    pub fn get(&self, path: &Path) -> Option<Workbook> {
        self.lock().get(path).cloned()
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Workbook>> {
        self.workbooks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WorkbookStore for MemoryStore {
    fn load(&self, path: &Path) -> Result<Workbook> {
        self.get(path)
            .ok_or_else(|| Error::Load(format!("no workbook at {}", path.display())))
    }

    fn save(&self, workbook: &Workbook, path: &Path) -> Result<()> {
        self.insert(path.to_path_buf(), workbook.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_is_error() {
        let store = MemoryStore::new();
        assert!(store.load(Path::new("/nope.xlsx")).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut wb = Workbook::new();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_value("A1", 1.0)
            .unwrap();

        store.save(&wb, Path::new("/model.xlsx")).unwrap();
        let loaded = store.load(Path::new("/model.xlsx")).unwrap();
        assert_eq!(loaded.sheet_count(), 1);
    }

    #[test]
    fn test_load_returns_snapshot() {
        let store = MemoryStore::new();
        store.insert("/model.xlsx", Workbook::new());

        let mut loaded = store.load(Path::new("/model.xlsx")).unwrap();
        loaded.add_worksheet("Scratch").unwrap();

        // The store is unchanged until a save
        assert_eq!(store.load(Path::new("/model.xlsx")).unwrap().sheet_count(), 1);
    }
}
