use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::buffer_pool::BufferPool;
use super::error::{StorageError, StorageResult};
use super::heap_page::HeapPage;
use super::{PAGE_SIZE, PageId, PageRef};
use crate::transaction::{Permissions, TransactionId};
use crate::tuple::{Tuple, TupleDesc};

/// An unordered collection of tuples stored as a sequence of fixed-size
/// pages in one backing file.
///
/// Reads and writes of resident pages go through the buffer pool; the file
/// itself only performs raw page I/O.
pub struct HeapFile {
    file: Mutex<File>,
    path: PathBuf,
    id: i32,
    td: Arc<TupleDesc>,
}

impl HeapFile {
    /// Open (creating if absent) a heap file at `path` holding tuples of
    /// descriptor `td`.
    pub fn open(path: impl AsRef<Path>, td: Arc<TupleDesc>) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        let path = path.as_ref().canonicalize()?;
        let id = Self::table_id_for(&path);
        Ok(Self {
            file: Mutex::new(file),
            path,
            id,
            td,
        })
    }

    /// Table id for a file path: a stable fold over the absolute path so the
    /// same file always yields the same id.
    fn table_id_for(path: &Path) -> i32 {
        path.to_string_lossy()
            .bytes()
            .fold(0i32, |h, b| h.wrapping_mul(31).wrapping_add(b as i32))
    }

    /// The id uniquely identifying this table
    pub fn id(&self) -> i32 {
        self.id
    }

    /// The absolute path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The descriptor of the tuples stored in this file
    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.td
    }

    /// Number of whole pages currently in the file
    pub fn num_pages(&self) -> StorageResult<usize> {
        let len = self.file.lock().unwrap().metadata()?.len();
        Ok(len as usize / PAGE_SIZE)
    }

    /// Read one page from disk. A short read is fatal.
    pub fn read_page(&self, pid: PageId) -> StorageResult<HeapPage> {
        let mut data = vec![0u8; PAGE_SIZE];
        {
            let mut file = self.file.lock().unwrap();
            file.seek(SeekFrom::Start((pid.page_no * PAGE_SIZE) as u64))?;
            file.read_exact(&mut data)?;
        }
        HeapPage::new(pid, self.td.clone(), &data)
    }

    /// Write one page at its offset, extending the file if needed
    pub fn write_page(&self, page: &HeapPage) -> StorageResult<()> {
        let data = page.page_data()?;
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((page.id().page_no * PAGE_SIZE) as u64))?;
        file.write_all(&data)?;
        Ok(())
    }

    /// Insert a tuple into the first page with a free slot, growing the file
    /// by one page when every existing page is full. Existing pages are
    /// obtained through the buffer pool with write intent; returns the page
    /// that was modified so the pool can mark it dirty.
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: Tuple,
    ) -> StorageResult<Vec<PageRef>> {
        let num_pages = self.num_pages()?;
        let mut target = None;
        for page_no in 0..num_pages {
            let pid = PageId::new(self.id, page_no);
            let page = pool.get_page(tid, pid, Permissions::ReadWrite)?;
            let has_room = page.lock().unwrap().num_empty_slots() > 0;
            if has_room {
                target = Some(page);
                break;
            }
        }

        if let Some(page) = target {
            page.lock().unwrap().insert_tuple(tuple)?;
            return Ok(vec![page]);
        }

        // Every page is full: append a fresh page and write it out so
        // subsequent reads observe the new file length.
        let pid = PageId::new(self.id, num_pages);
        debug!(table_id = self.id, page_no = pid.page_no, "allocating heap page");
        let mut page = HeapPage::empty(pid, self.td.clone())?;
        page.insert_tuple(tuple)?;
        self.write_page(&page)?;
        Ok(vec![Arc::new(Mutex::new(page))])
    }

    /// Delete a tuple from the page its record id names
    pub fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> StorageResult<Vec<PageRef>> {
        let rid = tuple.record_id().ok_or(StorageError::MissingRecordId)?;
        let page = pool.get_page(tid, rid.page_id, Permissions::ReadWrite)?;
        page.lock().unwrap().delete_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Iterate over every tuple in the file under the given transaction.
    /// Pages are fetched through the buffer pool one at a time.
    pub fn iter(self: Arc<Self>, pool: Arc<BufferPool>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(self, pool, tid)
    }
}

/// Lazy tuple iterator over a heap file: walks pages in order and yields one
/// tuple at a time from each page's iterator.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    opened: bool,
    /// Next page number to fetch through the pool
    next_page: usize,
    /// Tuples of the current page not yet handed out
    current: VecDeque<Tuple>,
}

impl HeapFileIterator {
    fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, tid: TransactionId) -> Self {
        Self {
            file,
            pool,
            tid,
            opened: false,
            next_page: 0,
            current: VecDeque::new(),
        }
    }

    pub fn open(&mut self) -> StorageResult<()> {
        self.opened = true;
        self.next_page = 0;
        self.current.clear();
        self.load_next_page()
    }

    fn load_next_page(&mut self) -> StorageResult<()> {
        self.current.clear();
        if self.next_page >= self.file.num_pages()? {
            return Ok(());
        }
        let pid = PageId::new(self.file.id(), self.next_page);
        self.next_page += 1;
        let page = self.pool.get_page(self.tid, pid, Permissions::ReadOnly)?;
        let page = page.lock().unwrap();
        self.current.extend(page.iter().cloned());
        Ok(())
    }

    pub fn has_next(&mut self) -> StorageResult<bool> {
        if !self.opened {
            return Ok(false);
        }
        while self.current.is_empty() {
            if self.next_page >= self.file.num_pages()? {
                return Ok(false);
            }
            self.load_next_page()?;
        }
        Ok(true)
    }

    /// The next tuple, or None when the file is exhausted or the iterator
    /// is closed
    pub fn next(&mut self) -> StorageResult<Option<Tuple>> {
        if !self.has_next()? {
            return Ok(None);
        }
        Ok(self.current.pop_front())
    }

    /// Restart iteration from page 0
    pub fn rewind(&mut self) -> StorageResult<()> {
        self.open()
    }

    pub fn close(&mut self) {
        self.opened = false;
        self.current.clear();
    }
}
