use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::OpIterator;
use crate::database::Database;
use crate::transaction::TransactionId;
use crate::tuple::{Field, FieldType, Tuple, TupleDesc};

/// Deletes the child's tuples through the buffer pool, routing each to its
/// owning table via the tuple's record id.
///
/// The first pull drains the child and yields a single one-field INT tuple
/// holding the number of deleted rows; later pulls yield nothing.
pub struct Delete {
    db: Database,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    done: bool,
    lookahead: Option<Tuple>,
}

impl Delete {
    pub fn new(db: &Database, tid: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Self {
            db: db.clone(),
            tid,
            child,
            desc: Arc::new(TupleDesc::unnamed(vec![FieldType::Int])),
            done: false,
            lookahead: None,
        }
    }

    fn fetch_next(&mut self) -> ExecResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut affected = 0i32;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.db.buffer_pool().delete_tuple(self.tid, &tuple)?;
            affected += 1;
        }

        Ok(Some(Tuple::new(
            self.desc.clone(),
            vec![Field::Int(affected)],
        )?))
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> ExecResult<()> {
        self.done = false;
        self.lookahead = None;
        self.child.open()
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if self.lookahead.is_none() {
            self.lookahead = self.fetch_next()?;
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
        self.done = false;
        self.lookahead = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.done = true;
        self.lookahead = None;
        self.child.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        let [child]: [Box<dyn OpIterator>; 1] = children
            .try_into()
            .map_err(|_| ExecError::IllegalArgument("delete takes one child".to_string()))?;
        self.child = child;
        Ok(())
    }
}
