use std::sync::Arc;

use super::desc::TupleDesc;
use super::error::{TupleError, TupleResult};
use super::field::Field;
use crate::storage::PageId;

/// Slot identifier within a page
pub type SlotId = usize;

/// Physical identifier for a tuple (page + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

/// A single row: an ordered vector of field values tied to a descriptor.
///
/// A freshly constructed tuple has no record id; one is assigned when the
/// tuple is placed in a page slot.
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create a tuple with the given values, which must match the descriptor
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> TupleResult<Self> {
        if fields.len() != desc.num_fields() {
            return Err(TupleError::Deserialization(format!(
                "Expected {} fields, got {}",
                desc.num_fields(),
                fields.len()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            let expected = desc.field_type(i).ok_or(TupleError::InvalidFieldIndex(i))?;
            if field.field_type() != expected {
                return Err(TupleError::TypeMismatch {
                    expected: format!("{:?}", expected),
                    actual: format!("{:?}", field.field_type()),
                });
            }
        }
        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }

    /// Get the descriptor of this tuple
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Get a field by index
    pub fn field(&self, i: usize) -> Option<&Field> {
        self.fields.get(i)
    }

    /// Get all fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Replace field `i`; the new value's type must match the descriptor
    pub fn set_field(&mut self, i: usize, field: Field) -> TupleResult<()> {
        let expected = self
            .desc
            .field_type(i)
            .ok_or(TupleError::InvalidFieldIndex(i))?;
        if field.field_type() != expected {
            return Err(TupleError::TypeMismatch {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", field.field_type()),
            });
        }
        self.fields[i] = field;
        Ok(())
    }

    /// Get the record id naming where this tuple lives on disk, if any
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }
}

/// Equality compares descriptor shape and field values; the record id is
/// location, not content, and is ignored.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields
    }
}

impl Eq for Tuple {}
