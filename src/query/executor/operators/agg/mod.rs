// Aggregation Operators Module
//
// This module contains the single-column aggregation engine and the
// blocking operator that feeds it from an upstream operator.

mod aggregate;
mod hash;

// Re-export public components
pub use aggregate::AggregateOperator;
pub use hash::{AggregationEngine, GroupKey};

use std::fmt;
use std::str::FromStr;

use crate::catalog::Type;
use crate::query::executor::result::{QueryError, QueryResult};

// Types of supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateOp {
    /// Name used in output column headers, e.g. `sum price`
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }

    /// Reject operations the aggregated field's type cannot support
    pub fn check_applicable(&self, field_type: Type) -> QueryResult<()> {
        match self {
            AggregateOp::Count => Ok(()),
            _ if field_type.is_numeric() => Ok(()),
            _ => Err(QueryError::InvalidAggregate(format!(
                "{} is not defined over {} fields",
                self, field_type
            ))),
        }
    }

    /// Type of the aggregate column in output records
    pub fn output_type(&self, field_type: Type) -> Type {
        match self {
            AggregateOp::Count => Type::Int,
            AggregateOp::Avg => Type::Double,
            AggregateOp::Sum | AggregateOp::Min | AggregateOp::Max => field_type,
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AggregateOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(AggregateOp::Count),
            "sum" => Ok(AggregateOp::Sum),
            "avg" | "average" => Ok(AggregateOp::Avg),
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            other => Err(QueryError::InvalidAggregate(format!("unknown aggregate '{}'", other))),
        }
    }
}

/// Grouping of an aggregation: by one input field, or all records as one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupBy {
    NoGrouping,
    Field(usize),
}

impl GroupBy {
    pub fn field(&self) -> Option<usize> {
        match self {
            GroupBy::NoGrouping => None,
            GroupBy::Field(index) => Some(*index),
        }
    }
}
