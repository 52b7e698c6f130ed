use super::error::{TupleError, TupleResult};
use super::field::FieldType;

/// One entry of a tuple descriptor: a field type and an optional name
#[derive(Debug, Clone)]
pub struct TdItem {
    pub field_type: FieldType,
    pub name: Option<String>,
}

/// TupleDesc describes the schema of a tuple: an ordered sequence of field
/// types with optional names.
///
/// Equality ignores names; two descriptors are equal iff they have the same
/// length and element-wise equal types.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    items: Vec<TdItem>,
}

impl TupleDesc {
    /// Create a new descriptor from types and matching names.
    /// Both slices must have the same, non-zero length.
    pub fn new(types: Vec<FieldType>, names: Vec<Option<String>>) -> Self {
        assert_eq!(types.len(), names.len());
        assert!(!types.is_empty());
        let items = types
            .into_iter()
            .zip(names)
            .map(|(field_type, name)| TdItem { field_type, name })
            .collect();
        Self { items }
    }

    /// Create a new descriptor with anonymous fields
    pub fn unnamed(types: Vec<FieldType>) -> Self {
        let names = vec![None; types.len()];
        Self::new(types, names)
    }

    /// Get the number of fields
    pub fn num_fields(&self) -> usize {
        self.items.len()
    }

    /// Get the type of the ith field
    pub fn field_type(&self, i: usize) -> Option<FieldType> {
        self.items.get(i).map(|item| item.field_type)
    }

    /// Get the (possibly absent) name of the ith field
    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.items.get(i).and_then(|item| item.name.as_deref())
    }

    /// Find the index of the first field with the given name
    pub fn field_index(&self, name: &str) -> TupleResult<usize> {
        self.items
            .iter()
            .position(|item| item.name.as_deref() == Some(name))
            .ok_or_else(|| TupleError::FieldNotFound(name.to_string()))
    }

    /// The size in bytes of tuples corresponding to this descriptor
    pub fn size(&self) -> usize {
        self.items.iter().map(|item| item.field_type.size()).sum()
    }

    /// Concatenate two descriptors; names come from `a` then `b`
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let items = a.items.iter().chain(b.items.iter()).cloned().collect();
        TupleDesc { items }
    }

    /// Iterate over the descriptor entries
    pub fn iter(&self) -> impl Iterator<Item = &TdItem> {
        self.items.iter()
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}
