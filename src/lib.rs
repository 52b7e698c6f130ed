pub mod catalog;
pub mod database;
pub mod execution;
pub mod optimizer;
pub mod storage;
pub mod transaction;
pub mod tuple;

pub use catalog::Catalog;
pub use database::Database;
pub use execution::OpIterator;
pub use storage::{BufferPool, DEFAULT_POOL_PAGES, HeapFile, HeapPage, PAGE_SIZE, PageId};
pub use transaction::{Permissions, TransactionId};
pub use tuple::{Field, FieldType, RecordId, Tuple, TupleDesc};
