mod aggregate;
mod delete;
mod error;
mod filter;
mod insert;
mod join;
mod predicate;
mod seq_scan;

use std::sync::Arc;

pub use aggregate::{Aggregate, AggregateOp, Aggregator, IntegerAggregator, StringAggregator};
pub use delete::Delete;
pub use error::{ExecError, ExecResult};
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use predicate::{JoinPredicate, Op, Predicate};
pub use seq_scan::SeqScan;

use crate::tuple::{Tuple, TupleDesc};

/// Pull iterator over tuples: the contract every query operator implements.
///
/// Call order: `open`, then any number of `has_next`/`next`/`rewind`, then
/// `close`. `has_next` and `next` stay consistent because implementations
/// cache one tuple of lookahead. `close` is idempotent and closes children.
pub trait OpIterator {
    /// Open this operator and its children, resetting internal state
    fn open(&mut self) -> ExecResult<()>;

    /// True iff `next()` will return a tuple
    fn has_next(&mut self) -> ExecResult<bool>;

    /// The next tuple; [`ExecError::NoSuchElement`] when exhausted
    fn next(&mut self) -> ExecResult<Tuple>;

    /// Restart iteration from the beginning
    fn rewind(&mut self) -> ExecResult<()>;

    /// Close this operator and its children
    fn close(&mut self);

    /// The schema of the tuples this operator produces
    fn tuple_desc(&self) -> Arc<TupleDesc>;

    /// Child operators, for plan inspection
    fn children(&self) -> Vec<&dyn OpIterator>;

    /// Replace the child operators, for plan rewrites. Fails with
    /// [`ExecError::IllegalArgument`] on an arity mismatch.
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()>;
}
