use std::collections::HashMap;
use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::OpIterator;
use crate::tuple::{Field, FieldType, Tuple, TupleDesc, TupleError};

/// Aggregation operator applied over one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

/// Accumulates tuples into per-group aggregate state.
///
/// Two flavors exist: [`IntegerAggregator`] over INT fields and
/// [`StringAggregator`] over STRING fields (COUNT only).
pub trait Aggregator {
    /// Merge one tuple into the aggregate, grouping as configured
    fn merge(&mut self, tuple: &Tuple) -> ExecResult<()>;

    /// One output tuple per group, or a single total when ungrouped
    fn results(&self) -> ExecResult<Vec<Tuple>>;

    /// `[group_type, INT]` when grouped, `[INT]` otherwise
    fn output_desc(&self) -> Arc<TupleDesc>;
}

fn aggregate_desc(grouping: Option<(usize, FieldType)>) -> Arc<TupleDesc> {
    let types = match grouping {
        Some((_, group_type)) => vec![group_type, FieldType::Int],
        None => vec![FieldType::Int],
    };
    Arc::new(TupleDesc::unnamed(types))
}

/// Running state of one group
#[derive(Clone, Copy)]
struct GroupState {
    sum: i64,
    count: i64,
    min: i32,
    max: i32,
}

impl GroupState {
    fn new() -> Self {
        Self {
            sum: 0,
            count: 0,
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn merge(&mut self, v: i32) {
        self.sum += v as i64;
        self.count += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn output(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
            AggregateOp::Sum => self.sum as i32,
            AggregateOp::Count => self.count as i32,
            // Floor division, not truncation: -7 / 2 aggregates to -4
            AggregateOp::Avg => {
                if self.count == 0 {
                    0
                } else {
                    self.sum.div_euclid(self.count) as i32
                }
            }
        }
    }
}

/// Computes MIN / MAX / SUM / COUNT / AVG over an INT field
pub struct IntegerAggregator {
    grouping: Option<(usize, FieldType)>,
    afield: usize,
    op: AggregateOp,
    groups: HashMap<Field, GroupState>,
    total: GroupState,
    desc: Arc<TupleDesc>,
}

impl IntegerAggregator {
    pub fn new(grouping: Option<(usize, FieldType)>, afield: usize, op: AggregateOp) -> Self {
        let desc = aggregate_desc(grouping);
        Self {
            grouping,
            afield,
            op,
            groups: HashMap::new(),
            total: GroupState::new(),
            desc,
        }
    }

    fn aggregated_value(&self, tuple: &Tuple) -> ExecResult<i32> {
        match tuple.field(self.afield) {
            Some(Field::Int(v)) => Ok(*v),
            Some(other) => Err(TupleError::TypeMismatch {
                expected: format!("{:?}", FieldType::Int),
                actual: format!("{:?}", other.field_type()),
            }
            .into()),
            None => Err(ExecError::IllegalArgument(format!(
                "no field {}",
                self.afield
            ))),
        }
    }
}

impl Aggregator for IntegerAggregator {
    fn merge(&mut self, tuple: &Tuple) -> ExecResult<()> {
        let value = self.aggregated_value(tuple)?;
        match self.grouping {
            None => self.total.merge(value),
            Some((gfield, _)) => {
                let key = tuple
                    .field(gfield)
                    .ok_or_else(|| ExecError::IllegalArgument(format!("no field {}", gfield)))?
                    .clone();
                self.groups.entry(key).or_insert_with(GroupState::new).merge(value);
            }
        }
        Ok(())
    }

    fn results(&self) -> ExecResult<Vec<Tuple>> {
        match self.grouping {
            None => {
                let fields = vec![Field::Int(self.total.output(self.op))];
                Ok(vec![Tuple::new(self.desc.clone(), fields)?])
            }
            Some(_) => self
                .groups
                .iter()
                .map(|(key, state)| {
                    let fields = vec![key.clone(), Field::Int(state.output(self.op))];
                    Ok(Tuple::new(self.desc.clone(), fields)?)
                })
                .collect(),
        }
    }

    fn output_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}

/// Computes COUNT over a STRING field; no other operator is meaningful
pub struct StringAggregator {
    grouping: Option<(usize, FieldType)>,
    afield: usize,
    groups: HashMap<Field, i64>,
    total: i64,
    desc: Arc<TupleDesc>,
}

impl StringAggregator {
    /// Rejects any operator other than COUNT
    pub fn new(
        grouping: Option<(usize, FieldType)>,
        afield: usize,
        op: AggregateOp,
    ) -> ExecResult<Self> {
        if op != AggregateOp::Count {
            return Err(ExecError::IllegalArgument(format!(
                "string aggregator supports COUNT only, got {:?}",
                op
            )));
        }
        let desc = aggregate_desc(grouping);
        Ok(Self {
            grouping,
            afield,
            groups: HashMap::new(),
            total: 0,
            desc,
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> ExecResult<()> {
        match tuple.field(self.afield) {
            Some(Field::Str(_)) => {}
            Some(other) => {
                return Err(TupleError::TypeMismatch {
                    expected: format!("{:?}", FieldType::Str),
                    actual: format!("{:?}", other.field_type()),
                }
                .into());
            }
            None => {
                return Err(ExecError::IllegalArgument(format!(
                    "no field {}",
                    self.afield
                )));
            }
        }

        match self.grouping {
            None => self.total += 1,
            Some((gfield, _)) => {
                let key = tuple
                    .field(gfield)
                    .ok_or_else(|| ExecError::IllegalArgument(format!("no field {}", gfield)))?
                    .clone();
                *self.groups.entry(key).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    fn results(&self) -> ExecResult<Vec<Tuple>> {
        match self.grouping {
            None => {
                let fields = vec![Field::Int(self.total as i32)];
                Ok(vec![Tuple::new(self.desc.clone(), fields)?])
            }
            Some(_) => self
                .groups
                .iter()
                .map(|(key, count)| {
                    let fields = vec![key.clone(), Field::Int(*count as i32)];
                    Ok(Tuple::new(self.desc.clone(), fields)?)
                })
                .collect(),
        }
    }

    fn output_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}

/// Aggregation operator: drains its child into the aggregator flavor chosen
/// by the aggregated field's type, then yields the per-group results.
///
/// The child is drained on the first pull; `rewind` restarts the result
/// cursor without re-draining. Group iteration order is unspecified.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    afield: usize,
    grouping: Option<(usize, FieldType)>,
    op: AggregateOp,
    desc: Arc<TupleDesc>,
    results: Option<Vec<Tuple>>,
    cursor: usize,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        afield: usize,
        grouping: Option<(usize, FieldType)>,
        op: AggregateOp,
    ) -> Self {
        let desc = aggregate_desc(grouping);
        Self {
            child,
            afield,
            grouping,
            op,
            desc,
            results: None,
            cursor: 0,
        }
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }

    fn ensure_results(&mut self) -> ExecResult<()> {
        if self.results.is_some() {
            return Ok(());
        }

        let mut aggregator: Box<dyn Aggregator> =
            match self.child.tuple_desc().field_type(self.afield) {
                Some(FieldType::Int) => Box::new(IntegerAggregator::new(
                    self.grouping,
                    self.afield,
                    self.op,
                )),
                Some(FieldType::Str) => Box::new(StringAggregator::new(
                    self.grouping,
                    self.afield,
                    self.op,
                )?),
                None => {
                    return Err(ExecError::IllegalArgument(format!(
                        "no field {}",
                        self.afield
                    )));
                }
            };

        while self.child.has_next()? {
            aggregator.merge(&self.child.next()?)?;
        }
        self.results = Some(aggregator.results()?);
        Ok(())
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> ExecResult<()> {
        self.results = None;
        self.cursor = 0;
        self.child.open()
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        self.ensure_results()?;
        match &self.results {
            Some(results) => Ok(self.cursor < results.len()),
            None => Ok(false),
        }
    }

    fn next(&mut self) -> ExecResult<Tuple> {
        if !self.has_next()? {
            return Err(ExecError::NoSuchElement);
        }
        let Some(results) = &self.results else {
            return Err(ExecError::NoSuchElement);
        };
        let tuple = results[self.cursor].clone();
        self.cursor += 1;
        Ok(tuple)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.results = None;
        self.cursor = 0;
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
            .map_err(|_| ExecError::IllegalArgument("aggregate takes one child".to_string()))?;
        self.child = child;
        Ok(())
    }
}
