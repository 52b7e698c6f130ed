use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::{debug, trace, warn};

use super::error::{StorageError, StorageResult};
use super::{DEFAULT_POOL_PAGES, PageId, PageRef};
use crate::catalog::Catalog;
use crate::transaction::{Permissions, TransactionId};
use crate::tuple::Tuple;

/// Cache of heap pages keyed by page id with approximate-LRU eviction.
///
/// A single `LruCache` holds both the resident map and the recency order, so
/// the key set of the map always equals the membership of the recency order.
/// All map and recency mutations happen under one pool-wide mutex; mutating
/// operations that re-enter `get_page` through a heap file (`insert_tuple`,
/// `delete_tuple`) take the mutex only for their own map updates, since the
/// mutex is not reentrant.
pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Mutex<Catalog>>,
    frames: Mutex<LruCache<PageId, PageRef>>,
}

impl BufferPool {
    /// Create a buffer pool with the default capacity
    pub fn new(catalog: Arc<Mutex<Catalog>>) -> Self {
        Self::with_capacity(catalog, DEFAULT_POOL_PAGES)
    }

    /// Create a buffer pool that caches up to `capacity` pages
    pub fn with_capacity(catalog: Arc<Mutex<Catalog>>, capacity: usize) -> Self {
        Self {
            capacity,
            catalog,
            frames: Mutex::new(LruCache::new(NonZeroUsize::new(capacity).unwrap())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently resident
    pub fn len(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check residency without touching the recency order
    pub fn is_page_cached(&self, pid: PageId) -> bool {
        self.frames.lock().unwrap().contains(&pid)
    }

    /// Number of resident dirty pages
    pub fn dirty_page_count(&self) -> usize {
        let frames = self.frames.lock().unwrap();
        frames
            .iter()
            .filter(|(_, page)| page.lock().unwrap().dirty_owner().is_some())
            .count()
    }

    /// Retrieve a page, loading it through the owning file on a miss.
    ///
    /// A hit promotes the page to most-recently used. The load path runs
    /// under the pool mutex; when the pool is at capacity the least-recently
    /// used page is evicted first (dirty victims are flushed).
    ///
    /// `perm` records the caller's intent for the (out-of-scope) lock
    /// manager; the core does not enforce it.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> StorageResult<PageRef> {
        let mut frames = self.frames.lock().unwrap();
        if let Some(page) = frames.get(&pid) {
            return Ok(page.clone());
        }

        trace!(tid = tid.value(), %pid, ?perm, "page miss, loading from file");
        let file = self.catalog.lock().unwrap().file(pid.table_id)?;
        let page = Arc::new(Mutex::new(file.read_page(pid)?));
        self.add_page(&mut frames, pid, page.clone())?;
        Ok(page)
    }

    /// Insert a tuple into a table on behalf of `tid`. Every page the file
    /// reports as modified is marked dirty and (re)installed in the pool so
    /// future requests see the up-to-date version.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: i32,
        tuple: Tuple,
    ) -> StorageResult<()> {
        let file = self.catalog.lock().unwrap().file(table_id)?;
        let pages = file.insert_tuple(self, tid, tuple)?;
        self.install_dirty(tid, pages)
    }

    /// Delete a tuple on behalf of `tid`; the owning table comes from the
    /// tuple's record id.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> StorageResult<()> {
        let rid = tuple.record_id().ok_or(StorageError::MissingRecordId)?;
        let file = self.catalog.lock().unwrap().file(rid.page_id.table_id)?;
        let pages = file.delete_tuple(self, tid, tuple)?;
        self.install_dirty(tid, pages)
    }

    fn install_dirty(&self, tid: TransactionId, pages: Vec<PageRef>) -> StorageResult<()> {
        let mut frames = self.frames.lock().unwrap();
        for page in pages {
            let pid = {
                let mut guard = page.lock().unwrap();
                guard.mark_dirty(true, tid);
                guard.id()
            };
            if frames.contains(&pid) {
                // Replace the resident version and promote
                frames.put(pid, page);
            } else {
                self.add_page(&mut frames, pid, page)?;
            }
        }
        Ok(())
    }

    /// Write a resident dirty page through its owning file; no-op when the
    /// page is absent or clean.
    pub fn flush_page(&self, pid: PageId) -> StorageResult<()> {
        let frames = self.frames.lock().unwrap();
        let Some(page) = frames.peek(&pid) else {
            return Ok(());
        };
        let guard = page.lock().unwrap();
        if guard.dirty_owner().is_none() {
            return Ok(());
        }
        let file = self.catalog.lock().unwrap().file(pid.table_id)?;
        file.write_page(&guard)
    }

    /// Flush every resident page dirtied by `tid`
    pub fn flush_pages(&self, tid: TransactionId) -> StorageResult<()> {
        let frames = self.frames.lock().unwrap();
        for (pid, page) in frames.iter() {
            let guard = page.lock().unwrap();
            if guard.dirty_owner() != Some(tid) {
                continue;
            }
            let file = self.catalog.lock().unwrap().file(pid.table_id)?;
            file.write_page(&guard)?;
        }
        Ok(())
    }

    /// Flush every resident dirty page
    pub fn flush_all_pages(&self) -> StorageResult<()> {
        let frames = self.frames.lock().unwrap();
        for (pid, page) in frames.iter() {
            let guard = page.lock().unwrap();
            if guard.dirty_owner().is_none() {
                continue;
            }
            let file = self.catalog.lock().unwrap().file(pid.table_id)?;
            file.write_page(&guard)?;
        }
        Ok(())
    }

    /// Drop a page from the pool without flushing it. Used by the recovery
    /// hooks to forget rolled-back pages.
    pub fn discard_page(&self, pid: PageId) {
        self.frames.lock().unwrap().pop(&pid);
    }

    /// Transaction end hook: a commit flushes every page the transaction
    /// dirtied; an abort discards them so the pool never serves rolled-back
    /// data.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> StorageResult<()> {
        if commit {
            return self.flush_pages(tid);
        }
        let mut frames = self.frames.lock().unwrap();
        let victims: Vec<PageId> = frames
            .iter()
            .filter(|(_, page)| page.lock().unwrap().dirty_owner() == Some(tid))
            .map(|(pid, _)| *pid)
            .collect();
        for pid in victims {
            frames.pop(&pid);
        }
        Ok(())
    }

    /// Install a page that is not yet resident, evicting while at capacity
    fn add_page(
        &self,
        frames: &mut LruCache<PageId, PageRef>,
        pid: PageId,
        page: PageRef,
    ) -> StorageResult<()> {
        while frames.len() >= self.capacity {
            self.evict_page(frames)?;
        }
        frames.put(pid, page);
        Ok(())
    }

    /// Evict the least-recently-used page, flushing it first when dirty.
    ///
    /// Flushing a dirty victim is a steal: a strict no-steal policy would
    /// pick the oldest clean page instead and fail when none exists.
    fn evict_page(&self, frames: &mut LruCache<PageId, PageRef>) -> StorageResult<()> {
        let Some((pid, page)) = frames.pop_lru() else {
            return Ok(());
        };
        let guard = page.lock().unwrap();
        if guard.dirty_owner().is_some() {
            warn!(%pid, "evicting dirty page, flushing first");
            let file = self.catalog.lock().unwrap().file(pid.table_id)?;
            file.write_page(&guard)?;
        } else {
            debug!(%pid, "evicting clean page");
        }
        Ok(())
    }
}
