//! Advisory, path-scoped save lock.
//!
//! Two overlapping invocations that want to save the same workbook path
//! serialize here instead of interleaving writes. The lock is cooperative:
//! it binds only participants in this pipeline, exactly what the save step
//! needs and nothing more. Read-only validation never takes it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

/// One lock per path, created on first use and kept for the process
/// lifetime. The set of distinct workbook paths a process touches is small.
static REGISTRY: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Run `f` while holding the advisory lock for `path`.
///
/// The lock is released on every exit path, including a panic inside `f`.
/// A poisoned lock is reacquired rather than propagated: the lock guards
/// ordering, not data.
pub fn with_path_lock<T>(path: &Path, f: impl FnOnce() -> T) -> T {
    let slot = {
        let mut registry = REGISTRY
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    };

    let _guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}
