use std::io;
use thiserror::Error;

use super::PageId;
use crate::catalog::CatalogError;
use crate::tuple::TupleError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Tuple error: {0}")]
    Tuple(#[from] TupleError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid page data: expected {expected} bytes, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Page is full: {0}")]
    PageFull(PageId),

    #[error("Tuple not found on page {0}")]
    TupleNotOnPage(PageId),

    #[error("Tuple descriptor does not match page descriptor")]
    DescriptorMismatch,

    #[error("Tuple has no record id")]
    MissingRecordId,

    #[error("Transaction aborted")]
    TransactionAborted,
}

pub type StorageResult<T> = Result<T, StorageError>;
