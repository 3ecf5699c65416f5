//! Chain evaluation against the dataset.
//!
//! The evaluator walks a parsed [`DataExpr`] through typed intermediate
//! states. Every transition is checked; a chain that applies an operation
//! to an incompatible state fails instead of producing garbage.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::dsl::ast::{AggregateFn, CompareOp, DataExpr, Literal, Predicate};
use crate::dsl::error::EvalError;
use crate::dsl::value::{ResultValue, ScalarValue};

/// Intermediate shape of a partially evaluated chain.
enum State {
    Frame(DataFrame),
    Column(Series),
    Grouped {
        frame: DataFrame,
        keys: Vec<String>,
    },
    GroupedColumn {
        frame: DataFrame,
        keys: Vec<String>,
        column: String,
    },
    /// Aggregated groups: key columns plus one value column, sorted by key.
    Reduced {
        frame: DataFrame,
        keys: Vec<String>,
        value: String,
    },
    /// Two-key group labels extracted by `.index`.
    KeyPairs(Vec<(ScalarValue, ScalarValue)>),
    Scalar(ScalarValue),
    /// A terminal conversion already happened.
    Value(ResultValue),
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            State::Frame(_) => "a dataframe",
            State::Column(_) => "a column",
            State::Grouped { .. } => "a grouping",
            State::GroupedColumn { .. } => "a grouped column",
            State::Reduced { .. } => "a grouped aggregate",
            State::KeyPairs(_) => "group labels",
            State::Scalar(_) => "a scalar",
            State::Value(_) => "a finished value",
        }
    }
}

/// Evaluate a parsed chain against the dataset.
pub fn evaluate(expr: &DataExpr, dataset: &DataFrame) -> Result<ResultValue, EvalError> {
    match run(expr, dataset)? {
        State::Value(value) => Ok(value),
        State::Scalar(scalar) => Ok(ResultValue::Scalar(scalar)),
        _ => Err(EvalError::IncompleteChain),
    }
}

fn run(expr: &DataExpr, dataset: &DataFrame) -> Result<State, EvalError> {
    match expr {
        DataExpr::Frame => Ok(State::Frame(dataset.clone())),
        DataExpr::Select { input, column } => select(run(input, dataset)?, column),
        DataExpr::Filter { input, predicate } => filter(run(input, dataset)?, predicate),
        DataExpr::GroupBy { input, keys } => group_by(run(input, dataset)?, keys),
        DataExpr::Aggregate { input, function } => aggregate(run(input, dataset)?, *function),
        DataExpr::SortValues {
            input,
            by,
            ascending,
        } => sort_values(run(input, dataset)?, by.as_deref(), *ascending),
        DataExpr::ParseDates { input, strict } => parse_dates(run(input, dataset)?, *strict),
        DataExpr::ParseNumbers { input, strict } => parse_numbers(run(input, dataset)?, *strict),
        DataExpr::Values { input } => values(run(input, dataset)?),
        DataExpr::Index { input } => index(run(input, dataset)?),
        DataExpr::ToList { input } => to_list(run(input, dataset)?),
        DataExpr::ToDict { input } => to_dict(run(input, dataset)?),
    }
}

fn column_series(frame: &DataFrame, column: &str) -> Result<Series, EvalError> {
    frame
        .column(column)
        .map(|c| c.as_materialized_series().clone())
        .map_err(|_| EvalError::UnknownColumn {
            column: column.to_string(),
        })
}

fn ensure_column(frame: &DataFrame, column: &str) -> Result<(), EvalError> {
    if frame.schema().get(column).is_some() {
        Ok(())
    } else {
        Err(EvalError::UnknownColumn {
            column: column.to_string(),
        })
    }
}

fn select(state: State, column: &str) -> Result<State, EvalError> {
    match state {
        State::Frame(frame) => Ok(State::Column(column_series(&frame, column)?)),
        State::Grouped { frame, keys } => {
            ensure_column(&frame, column)?;
            Ok(State::GroupedColumn {
                frame,
                keys,
                column: column.to_string(),
            })
        }
        other => Err(EvalError::incompatible("column selection", other.describe())),
    }
}

fn filter(state: State, predicate: &Predicate) -> Result<State, EvalError> {
    let frame = match state {
        State::Frame(frame) => frame,
        other => return Err(EvalError::incompatible("row filtering", other.describe())),
    };
    let column = match predicate {
        Predicate::Compare { column, .. } | Predicate::IsIn { column, .. } => column,
    };
    ensure_column(&frame, column)?;

    let mask = predicate_expr(predicate)?;
    let filtered = frame
        .lazy()
        .filter(mask)
        .collect()
        .map_err(EvalError::frame)?;
    Ok(State::Frame(filtered))
}

fn predicate_expr(predicate: &Predicate) -> Result<Expr, EvalError> {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let lhs = col(column.as_str());
            match (op, value) {
                (CompareOp::Eq, Literal::Null) => Ok(lhs.is_null()),
                (CompareOp::NotEq, Literal::Null) => Ok(lhs.is_not_null()),
                (_, Literal::Null) => Err(EvalError::incompatible(
                    "ordering comparison",
                    "a null literal",
                )),
                (op, value) => {
                    let rhs = literal_expr(value);
                    Ok(match op {
                        CompareOp::Eq => lhs.eq(rhs),
                        CompareOp::NotEq => lhs.neq(rhs),
                        CompareOp::Lt => lhs.lt(rhs),
                        CompareOp::Le => lhs.lt_eq(rhs),
                        CompareOp::Gt => lhs.gt(rhs),
                        CompareOp::Ge => lhs.gt_eq(rhs),
                    })
                }
            }
        }
        // The dataset feature set has no dedicated membership kernel, so a
        // membership test compiles to a chain of equality checks.
        Predicate::IsIn { column, values } => {
            let mut expr: Option<Expr> = None;
            for value in values {
                let term = match value {
                    Literal::Null => col(column.as_str()).is_null(),
                    other => col(column.as_str()).eq(literal_expr(other)),
                };
                expr = Some(match expr {
                    Some(acc) => acc.or(term),
                    None => term,
                });
            }
            Ok(expr.unwrap_or_else(|| lit(false)))
        }
    }
}

fn literal_expr(literal: &Literal) -> Expr {
    match literal {
        Literal::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => lit(*n as i64),
        Literal::Number(n) => lit(*n),
        Literal::String(s) => lit(s.as_str()),
        Literal::Boolean(b) => lit(*b),
        Literal::Null => lit(NULL),
    }
}

fn group_by(state: State, keys: &[String]) -> Result<State, EvalError> {
    let frame = match state {
        State::Frame(frame) => frame,
        other => return Err(EvalError::incompatible("grouping", other.describe())),
    };
    for key in keys {
        ensure_column(&frame, key)?;
    }
    Ok(State::Grouped {
        frame,
        keys: keys.to_vec(),
    })
}

fn agg_expr(function: AggregateFn, column: &str) -> Expr {
    match function {
        AggregateFn::Sum => col(column).sum(),
        AggregateFn::Count => col(column).count().cast(DataType::Int64),
        AggregateFn::Mean => col(column).mean(),
        AggregateFn::Median => col(column).median(),
        AggregateFn::Max => col(column).max(),
        AggregateFn::Min => col(column).min(),
    }
}

fn aggregate(state: State, function: AggregateFn) -> Result<State, EvalError> {
    match state {
        State::Column(series) => {
            let name = series.name().clone();
            let frame = DataFrame::new(vec![series.into()]).map_err(EvalError::frame)?;
            let reduced = frame
                .lazy()
                .select([agg_expr(function, name.as_str())])
                .collect()
                .map_err(EvalError::frame)?;
            let value = reduced
                .column(name.as_str())
                .map_err(EvalError::frame)?
                .as_materialized_series()
                .get(0)
                .map_err(EvalError::frame)?;
            Ok(State::Scalar(scalar_from_any(value)?))
        }
        State::GroupedColumn {
            frame,
            keys,
            column,
        } => {
            let group_exprs: Vec<Expr> = keys.iter().map(col).collect();
            let sort_exprs: Vec<Expr> = keys.iter().map(col).collect();
            let reduced = frame
                .lazy()
                .group_by(group_exprs)
                .agg([agg_expr(function, &column)])
                .sort_by_exprs(sort_exprs, SortMultipleOptions::default())
                .collect()
                .map_err(EvalError::frame)?;
            Ok(State::Reduced {
                frame: reduced,
                keys,
                value: column,
            })
        }
        other => Err(EvalError::incompatible(function.name(), other.describe())),
    }
}

fn sort_values(state: State, by: Option<&str>, ascending: bool) -> Result<State, EvalError> {
    let options = SortMultipleOptions::default().with_order_descending(!ascending);
    match state {
        State::Frame(frame) => {
            let Some(by) = by else {
                return Err(EvalError::incompatible(
                    "sort_values without a column",
                    "a dataframe",
                ));
            };
            ensure_column(&frame, by)?;
            let sorted = frame
                .lazy()
                .sort_by_exprs(vec![col(by)], options)
                .collect()
                .map_err(EvalError::frame)?;
            Ok(State::Frame(sorted))
        }
        State::Column(series) => {
            if by.is_some() {
                return Err(EvalError::incompatible(
                    "sort_values with a column argument",
                    "a column",
                ));
            }
            let name = series.name().clone();
            let frame = DataFrame::new(vec![series.into()]).map_err(EvalError::frame)?;
            let sorted = frame
                .lazy()
                .sort_by_exprs(vec![col(name.as_str())], options)
                .collect()
                .map_err(EvalError::frame)?;
            Ok(State::Column(column_series(&sorted, name.as_str())?))
        }
        State::Reduced { frame, keys, value } => {
            if by.is_some() {
                return Err(EvalError::incompatible(
                    "sort_values with a column argument",
                    "a grouped aggregate",
                ));
            }
            let sorted = frame
                .lazy()
                .sort_by_exprs(vec![col(value.as_str())], options)
                .collect()
                .map_err(EvalError::frame)?;
            Ok(State::Reduced {
                frame: sorted,
                keys,
                value,
            })
        }
        other => Err(EvalError::incompatible("sort_values", other.describe())),
    }
}

fn parse_dates(state: State, strict: bool) -> Result<State, EvalError> {
    let series = match state {
        State::Column(series) => series,
        other => return Err(EvalError::incompatible("to_datetime", other.describe())),
    };
    let dtype = series.dtype().clone();
    match dtype {
        DataType::Date | DataType::Datetime(_, _) => Ok(State::Column(series)),
        DataType::String => {
            let ca = series.str().map_err(EvalError::frame)?;
            let mut days: Vec<Option<i32>> = Vec::with_capacity(series.len());
            for value in ca.into_iter() {
                match value {
                    None => days.push(None),
                    Some(raw) => match parse_date_value(raw) {
                        Some(date) => days.push(Some(days_since_epoch(date))),
                        None if strict => {
                            return Err(EvalError::MalformedValue {
                                operation: "to_datetime".to_string(),
                                value: raw.to_string(),
                            })
                        }
                        None => days.push(None),
                    },
                }
            }
            let parsed = Series::new(series.name().clone(), days)
                .cast(&DataType::Date)
                .map_err(EvalError::frame)?;
            Ok(State::Column(parsed))
        }
        _ => Err(EvalError::incompatible(
            "to_datetime",
            "a non-text, non-temporal column",
        )),
    }
}

fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y/%m/%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Some(date);
    }
    None
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    // chrono's default NaiveDate is the Unix epoch.
    (date - NaiveDate::default()).num_days() as i32
}

fn parse_numbers(state: State, strict: bool) -> Result<State, EvalError> {
    let series = match state {
        State::Column(series) => series,
        other => return Err(EvalError::incompatible("to_numeric", other.describe())),
    };
    let dtype = series.dtype().clone();
    match dtype {
        dtype if is_numeric_dtype(&dtype) => Ok(State::Column(series)),
        DataType::String => {
            let ca = series.str().map_err(EvalError::frame)?;
            let mut parsed: Vec<Option<f64>> = Vec::with_capacity(series.len());
            for value in ca.into_iter() {
                match value {
                    None => parsed.push(None),
                    Some(raw) => match raw.trim().parse::<f64>() {
                        Ok(number) => parsed.push(Some(number)),
                        Err(_) if strict => {
                            return Err(EvalError::MalformedValue {
                                operation: "to_numeric".to_string(),
                                value: raw.to_string(),
                            })
                        }
                        Err(_) => parsed.push(None),
                    },
                }
            }
            Ok(State::Column(Series::new(series.name().clone(), parsed)))
        }
        _ => Err(EvalError::incompatible(
            "to_numeric",
            "a non-text, non-numeric column",
        )),
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn values(state: State) -> Result<State, EvalError> {
    match state {
        State::Column(series) => Ok(State::Column(series)),
        State::Reduced { frame, value, .. } => Ok(State::Column(column_series(&frame, &value)?)),
        other => Err(EvalError::incompatible(".values", other.describe())),
    }
}

fn index(state: State) -> Result<State, EvalError> {
    match state {
        State::Column(series) => {
            let indices: Vec<i64> = (0..series.len() as i64).collect();
            Ok(State::Column(Series::new(series.name().clone(), indices)))
        }
        State::Reduced { frame, keys, .. } => match keys.len() {
            1 => Ok(State::Column(column_series(&frame, &keys[0])?)),
            2 => {
                let first = column_to_scalars(&column_series(&frame, &keys[0])?)?;
                let second = column_to_scalars(&column_series(&frame, &keys[1])?)?;
                Ok(State::KeyPairs(first.into_iter().zip(second).collect()))
            }
            _ => Err(EvalError::UnsupportedShape {
                reason: "more than two grouping keys".to_string(),
            }),
        },
        other => Err(EvalError::incompatible(".index", other.describe())),
    }
}

fn to_list(state: State) -> Result<State, EvalError> {
    match state {
        State::Column(series) => Ok(State::Value(ResultValue::Sequence(column_to_scalars(
            &series,
        )?))),
        State::Reduced { frame, value, .. } => {
            let series = column_series(&frame, &value)?;
            Ok(State::Value(ResultValue::Sequence(column_to_scalars(
                &series,
            )?)))
        }
        State::KeyPairs(pairs) => Ok(State::Value(ResultValue::Pairs(pairs))),
        other => Err(EvalError::incompatible(".tolist()", other.describe())),
    }
}

fn to_dict(state: State) -> Result<State, EvalError> {
    let (frame, keys, value) = match state {
        State::Reduced { frame, keys, value } => (frame, keys, value),
        other => return Err(EvalError::incompatible(".to_dict()", other.describe())),
    };
    if keys.len() != 1 {
        return Err(EvalError::UnsupportedShape {
            reason: "to_dict requires a single grouping key".to_string(),
        });
    }
    let key_scalars = column_to_scalars(&column_series(&frame, &keys[0])?)?;
    let value_scalars = column_to_scalars(&column_series(&frame, &value)?)?;
    let entries = key_scalars
        .into_iter()
        .map(|key| key.key_string())
        .zip(value_scalars)
        .collect();
    Ok(State::Value(ResultValue::Mapping(entries)))
}

fn column_to_scalars(series: &Series) -> Result<Vec<ScalarValue>, EvalError> {
    series.iter().map(scalar_from_any).collect()
}

fn scalar_from_any(value: AnyValue) -> Result<ScalarValue, EvalError> {
    match value {
        AnyValue::Null => Ok(ScalarValue::Null),
        AnyValue::Boolean(b) => Ok(ScalarValue::Boolean(b)),
        AnyValue::Int8(v) => Ok(ScalarValue::Integer(v as i64)),
        AnyValue::Int16(v) => Ok(ScalarValue::Integer(v as i64)),
        AnyValue::Int32(v) => Ok(ScalarValue::Integer(v as i64)),
        AnyValue::Int64(v) => Ok(ScalarValue::Integer(v)),
        AnyValue::UInt8(v) => Ok(ScalarValue::Integer(v as i64)),
        AnyValue::UInt16(v) => Ok(ScalarValue::Integer(v as i64)),
        AnyValue::UInt32(v) => Ok(ScalarValue::Integer(v as i64)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(signed) => Ok(ScalarValue::Integer(signed)),
            Err(_) => Ok(ScalarValue::float(v as f64)),
        },
        AnyValue::Float32(v) => Ok(ScalarValue::float(v as f64)),
        AnyValue::Float64(v) => Ok(ScalarValue::float(v)),
        AnyValue::String(s) => Ok(ScalarValue::String(s.to_string())),
        AnyValue::StringOwned(s) => Ok(ScalarValue::String(s.to_string())),
        AnyValue::Date(days) => Ok(ScalarValue::String(format_date(days))),
        AnyValue::Datetime(ts, unit, _) => Ok(ScalarValue::String(format_datetime(ts, unit))),
        AnyValue::DatetimeOwned(ts, unit, _) => Ok(ScalarValue::String(format_datetime(ts, unit))),
        other => Err(EvalError::UnsupportedShape {
            reason: format!("value type {:?} has no JSON form", other.dtype()),
        }),
    }
}

fn format_date(days: i32) -> String {
    NaiveDate::default()
        .checked_add_signed(chrono::Duration::days(days as i64))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| days.to_string())
}

fn format_datetime(ts: i64, unit: TimeUnit) -> String {
    let datetime = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ts),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ts),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(ts)),
    };
    datetime
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
