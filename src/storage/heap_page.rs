use std::sync::Arc;

use super::error::{StorageError, StorageResult};
use super::{PAGE_SIZE, PageId};
use crate::transaction::TransactionId;
use crate::tuple::{RecordId, Tuple, TupleDesc};

/// Find-first-set: 0-based index of the lowest set bit of `b`, or -1 if zero
pub fn ffs(b: u8) -> i32 {
    if b == 0 {
        return -1;
    }
    b.trailing_zeros() as i32
}

/// One page of a heap file: a slot-occupancy bitmap followed by fixed-size
/// tuple slots.
///
/// Layout of a page of `PAGE_SIZE` bytes holding tuples of size `S`:
/// - `ceil(num_slots / 8)` header bytes; bit `i` of byte `i / 8` is set iff
///   slot `i` is occupied (LSB-first within a byte)
/// - `num_slots` slots of `S` bytes each, where
///   `num_slots = (PAGE_SIZE * 8) / (S * 8 + 1)`
/// - trailing zero padding up to `PAGE_SIZE`
pub struct HeapPage {
    pid: PageId,
    td: Arc<TupleDesc>,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    num_slots: usize,
    /// Byte image of the page at construction / last checkpoint, for the
    /// recovery hooks
    before_image: Vec<u8>,
    dirty_owner: Option<TransactionId>,
}

impl HeapPage {
    /// Number of tuple slots a page can hold for the given descriptor.
    /// The extra bit per slot accounts for the header bitmap.
    pub fn slots_per_page(td: &TupleDesc) -> usize {
        (PAGE_SIZE * 8) / (td.size() * 8 + 1)
    }

    fn header_size(num_slots: usize) -> usize {
        num_slots.div_ceil(8)
    }

    /// Decode a page from its on-disk bytes.
    ///
    /// A decoding failure in any occupied slot is fatal: the page is treated
    /// as corrupt and no partial page is produced.
    pub fn new(pid: PageId, td: Arc<TupleDesc>, data: &[u8]) -> StorageResult<Self> {
        if data.len() != PAGE_SIZE {
            return Err(StorageError::InvalidPageSize {
                expected: PAGE_SIZE,
                actual: data.len(),
            });
        }

        let num_slots = Self::slots_per_page(&td);
        let header_size = Self::header_size(num_slots);
        let header = data[..header_size].to_vec();
        let tuple_size = td.size();

        let mut tuples = Vec::with_capacity(num_slots);
        let mut offset = header_size;
        for slot in 0..num_slots {
            let used = (header[slot / 8] & (1 << (slot % 8))) != 0;
            if used {
                let mut fields = Vec::with_capacity(td.num_fields());
                let mut field_offset = offset;
                for item in td.iter() {
                    let len = item.field_type.size();
                    let field = item.field_type.parse(&data[field_offset..field_offset + len])?;
                    fields.push(field);
                    field_offset += len;
                }
                let mut tuple = Tuple::new(td.clone(), fields)?;
                tuple.set_record_id(Some(RecordId::new(pid, slot)));
                tuples.push(Some(tuple));
            } else {
                tuples.push(None);
            }
            offset += tuple_size;
        }

        Ok(Self {
            pid,
            td,
            header,
            tuples,
            num_slots,
            before_image: data.to_vec(),
            dirty_owner: None,
        })
    }

    /// Create an all-empty page, as used when a heap file grows
    pub fn empty(pid: PageId, td: Arc<TupleDesc>) -> StorageResult<Self> {
        Self::new(pid, td, &[0u8; PAGE_SIZE])
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.td
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Serialize this page to its on-disk representation.
    ///
    /// Inverse of [`HeapPage::new`]: parsing the returned bytes yields an
    /// identical page.
    pub fn page_data(&self) -> StorageResult<Vec<u8>> {
        let mut data = Vec::with_capacity(PAGE_SIZE);
        data.extend_from_slice(&self.header);
        let tuple_size = self.td.size();
        for tuple in &self.tuples {
            match tuple {
                Some(tuple) => {
                    for field in tuple.fields() {
                        data.extend_from_slice(&field.to_bytes()?);
                    }
                }
                None => data.resize(data.len() + tuple_size, 0),
            }
        }
        data.resize(PAGE_SIZE, 0);
        Ok(data)
    }

    /// Check if a slot holds a tuple
    pub fn is_slot_used(&self, slot: usize) -> bool {
        if slot >= self.num_slots {
            return false;
        }
        (self.header[slot / 8] & (1 << (slot % 8))) != 0
    }

    fn mark_slot(&mut self, slot: usize, used: bool) {
        let byte = slot / 8;
        let mask = 1u8 << (slot % 8);
        if used {
            self.header[byte] |= mask;
        } else {
            self.header[byte] &= !mask;
        }
    }

    /// Number of free slots, by popcount of the header bitmap.
    /// The popcount must agree with a slot-by-slot scan.
    pub fn num_empty_slots(&self) -> usize {
        let used: usize = self.header.iter().map(|b| b.count_ones() as usize).sum();
        debug_assert_eq!(
            used,
            (0..self.num_slots).filter(|&i| self.is_slot_used(i)).count()
        );
        self.num_slots - used
    }

    /// Place a tuple in the lowest free slot and assign its record id.
    ///
    /// Scans the header a byte at a time with [`ffs`] on the complement, so a
    /// full prefix costs one comparison per 8 slots.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> StorageResult<()> {
        if *tuple.desc().as_ref() != *self.td {
            return Err(StorageError::DescriptorMismatch);
        }

        for (byte, &h) in self.header.iter().enumerate() {
            let offset = ffs(!h);
            if offset >= 0 {
                let slot = byte * 8 + offset as usize;
                // The free bit may be bitmap padding past the last real slot
                if slot >= self.num_slots {
                    break;
                }
                tuple.set_record_id(Some(RecordId::new(self.pid, slot)));
                self.tuples[slot] = Some(tuple);
                self.mark_slot(slot, true);
                return Ok(());
            }
        }

        Err(StorageError::PageFull(self.pid))
    }

    /// Remove the tuple named by `tuple.record_id()` from this page
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> StorageResult<()> {
        let rid = tuple.record_id().ok_or(StorageError::MissingRecordId)?;
        if rid.page_id != self.pid || !self.is_slot_used(rid.slot_id) {
            return Err(StorageError::TupleNotOnPage(self.pid));
        }
        self.mark_slot(rid.slot_id, false);
        self.tuples[rid.slot_id] = None;
        Ok(())
    }

    /// Mark this page dirty or clean, recording the dirtying transaction
    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirty_owner = if dirty { Some(tid) } else { None };
    }

    /// The transaction that last dirtied this page, or None if clean
    pub fn dirty_owner(&self) -> Option<TransactionId> {
        self.dirty_owner
    }

    /// Re-snapshot the current page bytes as the before-image
    pub fn set_before_image(&mut self) -> StorageResult<()> {
        self.before_image = self.page_data()?;
        Ok(())
    }

    /// Reconstruct the page as of the last before-image snapshot
    pub fn before_image(&self) -> StorageResult<HeapPage> {
        Self::new(self.pid, self.td.clone(), &self.before_image)
    }

    /// Iterate over occupied slots in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().flatten()
    }
}
