mod desc;
mod error;
mod field;
mod tuple;

pub use desc::{TdItem, TupleDesc};
pub use error::{TupleError, TupleResult};
pub use field::{Field, FieldType, MAX_STRING_BYTES, STRING_LEN};
pub use tuple::{RecordId, SlotId, Tuple};
