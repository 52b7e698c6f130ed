#[cfg(test)]
mod tests;

use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use crate::catalog::Catalog;
use crate::storage::{BufferPool, DEFAULT_POOL_PAGES};

/// Process-wide default context handed to code that does not build its own
static DEFAULT: LazyLock<Mutex<Database>> = LazyLock::new(|| Mutex::new(Database::new()));

/// The engine context: one catalog plus one buffer pool.
///
/// Cloning is cheap and yields a handle to the same catalog and pool, so a
/// context can be passed by value to operators. Tests usually build their
/// own context; `Database::global()` serves callers that want the shared
/// process-wide one.
#[derive(Clone)]
pub struct Database {
    catalog: Arc<Mutex<Catalog>>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new() -> Self {
        Self::with_pool_capacity(DEFAULT_POOL_PAGES)
    }

    /// Build a context whose buffer pool caches up to `capacity` pages
    pub fn with_pool_capacity(capacity: usize) -> Self {
        let catalog = Arc::new(Mutex::new(Catalog::new()));
        let buffer_pool = Arc::new(BufferPool::with_capacity(catalog.clone(), capacity));
        Self {
            catalog,
            buffer_pool,
        }
    }

    /// Lock and return the catalog
    pub fn catalog(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap()
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// The process-wide default context
    pub fn global() -> Database {
        DEFAULT.lock().unwrap().clone()
    }

    /// Replace the process-wide default with a fresh catalog and pool.
    /// Contexts handed out earlier keep using the old ones.
    pub fn reset() {
        *DEFAULT.lock().unwrap() = Database::new();
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
