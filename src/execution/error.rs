use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;
use crate::tuple::TupleError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Tuple error: {0}")]
    Tuple(#[from] TupleError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// End of stream: `next()` was called with no tuple pending. Distinct
    /// from cancellation, which surfaces as
    /// [`StorageError::TransactionAborted`].
    #[error("No more tuples")]
    NoSuchElement,

    #[error("Invalid argument: {0}")]
    IllegalArgument(String),
}

pub type ExecResult<T> = Result<T, ExecError>;
