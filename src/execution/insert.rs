use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::OpIterator;
use crate::database::Database;
use crate::transaction::TransactionId;
use crate::tuple::{Field, FieldType, Tuple, TupleDesc};

/// Inserts the child's tuples into a table through the buffer pool.
///
/// The first pull drains the child and yields a single one-field INT tuple
/// holding the number of inserted rows; later pulls yield nothing.
pub struct Insert {
    db: Database,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    table_id: i32,
    desc: Arc<TupleDesc>,
    done: bool,
    lookahead: Option<Tuple>,
}

impl Insert {
    /// Fails when the child's descriptor differs from the table's
    pub fn new(
        db: &Database,
        tid: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: i32,
    ) -> ExecResult<Self> {
        let table_desc = db.catalog().tuple_desc(table_id)?;
        if *table_desc != *child.tuple_desc() {
            return Err(ExecError::IllegalArgument(
                "child descriptor does not match table".to_string(),
            ));
        }
        Ok(Self {
            db: db.clone(),
            tid,
            child,
            table_id,
            desc: Arc::new(TupleDesc::unnamed(vec![FieldType::Int])),
            done: false,
            lookahead: None,
        })
    }

    fn fetch_next(&mut self) -> ExecResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut affected = 0i32;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.db
                .buffer_pool()
                .insert_tuple(self.tid, self.table_id, tuple)?;
            affected += 1;
        }

        Ok(Some(Tuple::new(
            self.desc.clone(),
            vec![Field::Int(affected)],
        )?))
    }
}

impl OpIterator for Insert {
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
            .map_err(|_| ExecError::IllegalArgument("insert takes one child".to_string()))?;
        self.child = child;
        Ok(())
    }
}
