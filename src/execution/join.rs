use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::predicate::JoinPredicate;
use super::OpIterator;
use crate::tuple::{Tuple, TupleDesc};

/// Nested-loops join.
///
/// Output tuples are the concatenation of the matching left and right
/// tuples; duplicate join columns are not removed. The output schema is the
/// merge of the children's schemas, left names first.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    left_tuple: Option<Tuple>,
    lookahead: Option<Tuple>,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator>,
        right: Box<dyn OpIterator>,
    ) -> Self {
        let desc = Arc::new(TupleDesc::merge(&left.tuple_desc(), &right.tuple_desc()));
        Self {
            predicate,
            left,
            right,
            desc,
            left_tuple: None,
            lookahead: None,
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    /// Advance the nested loops: hold one left tuple while scanning the full
    /// right relation, rewinding the right and advancing the left when it
    /// runs out. An empty right relation ends iteration, since no pair can
    /// ever match.
    fn fetch_next(&mut self) -> ExecResult<Option<Tuple>> {
        loop {
            if self.left_tuple.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.left_tuple = Some(self.left.next()?);
            }

            if !self.right.has_next()? {
                self.right.rewind()?;
                if !self.right.has_next()? {
                    return Ok(None);
                }
                self.left_tuple = None;
                continue;
            }

            let right = self.right.next()?;
            if let Some(left) = &self.left_tuple
                && self.predicate.filter(left, &right)?
            {
                let fields = left
                    .fields()
                    .iter()
                    .chain(right.fields())
                    .cloned()
                    .collect();
                return Ok(Some(Tuple::new(self.desc.clone(), fields)?));
            }
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> ExecResult<()> {
        self.left_tuple = None;
        self.lookahead = None;
        self.left.open()?;
        self.right.open()
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
        self.left_tuple = None;
        self.lookahead = None;
        self.left.rewind()?;
        self.right.rewind()
    }

    fn close(&mut self) {
        self.left_tuple = None;
        self.lookahead = None;
        self.left.close();
        self.right.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        let [left, right]: [Box<dyn OpIterator>; 2] = children
            .try_into()
            .map_err(|_| ExecError::IllegalArgument("join takes two children".to_string()))?;
        self.left = left;
        self.right = right;
        Ok(())
    }
}
