use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::OpIterator;
use crate::database::Database;
use crate::storage::HeapFileIterator;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

/// Sequential scan over one table under a transaction
pub struct SeqScan {
    it: HeapFileIterator,
    desc: Arc<TupleDesc>,
    lookahead: Option<Tuple>,
}

impl SeqScan {
    pub fn new(db: &Database, tid: TransactionId, table_id: i32) -> ExecResult<Self> {
        let file = db.catalog().file(table_id)?;
        let desc = file.tuple_desc().clone();
        let it = file.iter(db.buffer_pool().clone(), tid);
        Ok(Self {
            it,
            desc,
            lookahead: None,
        })
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> ExecResult<()> {
        self.lookahead = None;
        self.it.open()?;
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if self.lookahead.is_none() {
            self.lookahead = self.it.next()?;
        }
        Ok(self.lookahead.is_some())
    }

    fn next(&mut self) -> ExecResult<Tuple> {
        if !self.has_next()? {
            return Err(ExecError::NoSuchElement);
        }
        self.lookahead.take().ok_or(ExecError::NoSuchElement)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.lookahead = None;
        self.it.rewind()?;
        Ok(())
    }

    fn close(&mut self) {
        self.lookahead = None;
        self.it.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        if children.is_empty() {
            Ok(())
        } else {
            Err(ExecError::IllegalArgument(
                "sequential scan has no children".to_string(),
            ))
        }
    }
}
