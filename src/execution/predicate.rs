use crate::tuple::{Field, Tuple, TupleError, TupleResult};

use super::error::{ExecError, ExecResult};

/// Comparison operator applied between two field values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    /// Substring containment on strings, equality on ints
    Like,
    NotEquals,
}

impl Op {
    /// Apply this operator to two fields of the same type
    pub fn apply(self, lhs: &Field, rhs: &Field) -> TupleResult<bool> {
        match (lhs, rhs) {
            (Field::Int(a), Field::Int(b)) => Ok(match self {
                Op::Equals => a == b,
                Op::GreaterThan => a > b,
                Op::LessThan => a < b,
                Op::LessThanOrEq => a <= b,
                Op::GreaterThanOrEq => a >= b,
                Op::Like => a == b,
                Op::NotEquals => a != b,
            }),
            (Field::Str(a), Field::Str(b)) => Ok(match self {
                Op::Equals => a == b,
                Op::GreaterThan => a > b,
                Op::LessThan => a < b,
                Op::LessThanOrEq => a <= b,
                Op::GreaterThanOrEq => a >= b,
                Op::Like => a.contains(b.as_str()),
                Op::NotEquals => a != b,
            }),
            _ => Err(TupleError::TypeMismatch {
                expected: format!("{:?}", lhs.field_type()),
                actual: format!("{:?}", rhs.field_type()),
            }),
        }
    }
}

/// Compares one field of a tuple to a constant
#[derive(Debug, Clone)]
pub struct Predicate {
    field: usize,
    op: Op,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: Op, operand: Field) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// True iff the tuple's field satisfies the comparison
    pub fn filter(&self, tuple: &Tuple) -> ExecResult<bool> {
        let field = tuple
            .field(self.field)
            .ok_or_else(|| ExecError::IllegalArgument(format!("no field {}", self.field)))?;
        Ok(self.op.apply(field, &self.operand)?)
    }
}

/// Compares a field of one tuple to a field of another, as used by joins
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    field1: usize,
    op: Op,
    field2: usize,
}

impl JoinPredicate {
    pub fn new(field1: usize, op: Op, field2: usize) -> Self {
        Self { field1, op, field2 }
    }

    pub fn field1(&self) -> usize {
        self.field1
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn field2(&self) -> usize {
        self.field2
    }

    /// True iff `left.field1 op right.field2` holds
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> ExecResult<bool> {
        let a = left
            .field(self.field1)
            .ok_or_else(|| ExecError::IllegalArgument(format!("no field {}", self.field1)))?;
        let b = right
            .field(self.field2)
            .ok_or_else(|| ExecError::IllegalArgument(format!("no field {}", self.field2)))?;
        Ok(self.op.apply(a, b)?)
    }
}
