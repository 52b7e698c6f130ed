use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::predicate::Predicate;
use super::OpIterator;
use crate::tuple::{Tuple, TupleDesc};

/// Relational select: passes through the child tuples that satisfy a
/// predicate. Output schema equals the child's.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    lookahead: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Self {
            predicate,
            child,
            lookahead: None,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    fn fetch_next(&mut self) -> ExecResult<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> ExecResult<()> {
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
        self.lookahead = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.lookahead = None;
        self.child.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.child.tuple_desc()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        let [child]: [Box<dyn OpIterator>; 1] = children
            .try_into()
            .map_err(|_| ExecError::IllegalArgument("filter takes one child".to_string()))?;
        self.child = child;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::testing::{collect, VecIterator};
    use crate::execution::Op;
    use crate::tuple::{Field, FieldType};

    fn int_str_rows(rows: &[(i32, &str)]) -> (Arc<TupleDesc>, Vec<Tuple>) {
        let desc = Arc::new(TupleDesc::unnamed(vec![FieldType::Int, FieldType::Str]));
        let tuples = rows
            .iter()
            .map(|(v, s)| {
                Tuple::new(desc.clone(), vec![Field::Int(*v), Field::Str(s.to_string())])
                    .unwrap()
            })
            .collect();
        (desc, tuples)
    }

    #[test]
    fn test_filter_passes_matching_tuples() {
        let (desc, tuples) = int_str_rows(&[(1, "x"), (2, "y"), (3, "x")]);
        let child = VecIterator::new(desc, tuples);
        let mut filter = Filter::new(
            Predicate::new(0, Op::GreaterThan, Field::Int(1)),
            Box::new(child),
        );

        filter.open().unwrap();
        let out = collect(&mut filter).unwrap();
        filter.close();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].field(0), Some(&Field::Int(2)));
        assert_eq!(out[1].field(0), Some(&Field::Int(3)));
    }

    #[test]
    fn test_filter_empty_result() {
        let (desc, tuples) = int_str_rows(&[(1, "x")]);
        let mut filter = Filter::new(
            Predicate::new(0, Op::GreaterThan, Field::Int(10)),
            Box::new(VecIterator::new(desc, tuples)),
        );

        filter.open().unwrap();
        assert!(!filter.has_next().unwrap());
        assert!(matches!(filter.next(), Err(ExecError::NoSuchElement)));
    }

    #[test]
    fn test_filter_rewind() {
        let (desc, tuples) = int_str_rows(&[(1, "x"), (2, "y")]);
        let mut filter = Filter::new(
            Predicate::new(0, Op::GreaterThanOrEq, Field::Int(1)),
            Box::new(VecIterator::new(desc, tuples)),
        );

        filter.open().unwrap();
        let first = collect(&mut filter).unwrap();
        filter.rewind().unwrap();
        let second = collect(&mut filter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_desc_matches_child() {
        let (desc, tuples) = int_str_rows(&[(1, "x")]);
        let filter = Filter::new(
            Predicate::new(0, Op::Equals, Field::Int(1)),
            Box::new(VecIterator::new(desc.clone(), tuples)),
        );
        assert_eq!(*filter.tuple_desc(), *desc);
    }

    #[test]
    fn test_set_children_arity() {
        let (desc, tuples) = int_str_rows(&[(1, "x")]);
        let mut filter = Filter::new(
            Predicate::new(0, Op::Equals, Field::Int(1)),
            Box::new(VecIterator::new(desc, tuples)),
        );
        assert!(filter.set_children(Vec::new()).is_err());
        assert_eq!(filter.children().len(), 1);
    }
}
