//! Typed operation chains for embedded dataset expressions.

use serde::{Deserialize, Serialize};

/// A parsed dataset-access chain.
///
/// Every variant except `Frame` wraps its input, so a chain like
/// `df.groupby("Type")["Amount"].sum().values.tolist()` becomes a nested
/// tree with `Frame` at the bottom and the terminal conversion on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataExpr {
    /// The dataset handle `df`.
    Frame,

    /// `pd.to_datetime(...)`: permissive date parsing.
    ParseDates { input: Box<DataExpr>, strict: bool },

    /// `pd.to_numeric(...)`: permissive numeric parsing.
    ParseNumbers { input: Box<DataExpr>, strict: bool },

    /// `input["column"]`
    Select { input: Box<DataExpr>, column: String },

    /// `input[predicate]`
    Filter {
        input: Box<DataExpr>,
        predicate: Predicate,
    },

    /// `input.groupby("key")` or `input.groupby(["a", "b"])`
    GroupBy {
        input: Box<DataExpr>,
        keys: Vec<String>,
    },

    /// `input.sum()`, `input.mean()`, ...
    Aggregate {
        input: Box<DataExpr>,
        function: AggregateFn,
    },

    /// `input.sort_values("column")` / `input.sort_values()`
    SortValues {
        input: Box<DataExpr>,
        by: Option<String>,
        ascending: bool,
    },

    /// `input.values`
    Values { input: Box<DataExpr> },

    /// `input.index`
    Index { input: Box<DataExpr> },

    /// `input.tolist()`
    ToList { input: Box<DataExpr> },

    /// `input.to_dict()`
    ToDict { input: Box<DataExpr> },
}

/// Row-filter predicate: a comparison or a membership test on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: Literal,
    },
    IsIn {
        column: String,
        values: Vec<Literal>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFn {
    Sum,
    Count,
    Mean,
    Median,
    Max,
    Min,
}

/// Literal operand inside a predicate or keyword argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl DataExpr {
    pub fn select(input: DataExpr, column: impl Into<String>) -> Self {
        DataExpr::Select {
            input: Box::new(input),
            column: column.into(),
        }
    }

    pub fn filter(input: DataExpr, predicate: Predicate) -> Self {
        DataExpr::Filter {
            input: Box::new(input),
            predicate,
        }
    }

    pub fn group_by(input: DataExpr, keys: Vec<String>) -> Self {
        DataExpr::GroupBy {
            input: Box::new(input),
            keys,
        }
    }

    pub fn aggregate(input: DataExpr, function: AggregateFn) -> Self {
        DataExpr::Aggregate {
            input: Box::new(input),
            function,
        }
    }

    pub fn sort_values(input: DataExpr, by: Option<String>, ascending: bool) -> Self {
        DataExpr::SortValues {
            input: Box::new(input),
            by,
            ascending,
        }
    }

    pub fn values(input: DataExpr) -> Self {
        DataExpr::Values {
            input: Box::new(input),
        }
    }

    pub fn index(input: DataExpr) -> Self {
        DataExpr::Index {
            input: Box::new(input),
        }
    }

    pub fn to_list(input: DataExpr) -> Self {
        DataExpr::ToList {
            input: Box::new(input),
        }
    }

    pub fn to_dict(input: DataExpr) -> Self {
        DataExpr::ToDict {
            input: Box::new(input),
        }
    }
}

impl AggregateFn {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFn::Sum => "sum",
            AggregateFn::Count => "count",
            AggregateFn::Mean => "mean",
            AggregateFn::Median => "median",
            AggregateFn::Max => "max",
            AggregateFn::Min => "min",
        }
    }
}

impl std::fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}
