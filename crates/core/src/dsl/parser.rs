//! Expression parser implementation using pest

use crate::dsl::ast::*;
use crate::dsl::error::ParseError;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "dsl/grammar.pest"]
struct ChainParser;

/// Parse one resolved span into a typed operation chain.
pub fn parse_chain(input: &str) -> Result<DataExpr, ParseError> {
    let pairs = ChainParser::parse(Rule::chain, input).map_err(|e| {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos((line, col)) => (line, col),
            pest::error::LineColLocation::Span((line, col), _) => (line, col),
        };
        ParseError::SyntaxError {
            line,
            column,
            message: format!("{}", e.variant),
        }
    })?;

    let expr_pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "No chain parsed".to_string(),
        })?
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty chain".to_string(),
        })?;

    parse_expr(expr_pair)
}

fn parse_expr(pair: Pair<Rule>) -> Result<DataExpr, ParseError> {
    let mut inner = pair.into_inner();
    let root_pair = inner.next().ok_or_else(|| ParseError::InternalError {
        message: "Expression without a root".to_string(),
    })?;
    let mut expr = parse_root(root_pair)?;
    for step in inner {
        expr = apply_step(expr, step)?;
    }
    Ok(expr)
}

fn parse_root(pair: Pair<Rule>) -> Result<DataExpr, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty root".to_string(),
        })?;
    match inner.as_rule() {
        Rule::frame => Ok(DataExpr::Frame),
        Rule::helper_call => parse_helper_call(inner),
        _ => Err(ParseError::InternalError {
            message: format!("Unexpected root rule: {:?}", inner.as_rule()),
        }),
    }
}

fn parse_helper_call(pair: Pair<Rule>) -> Result<DataExpr, ParseError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Missing helper name".to_string(),
        })?
        .as_str()
        .to_string();
    let argument = parse_expr(inner.next().ok_or_else(|| ParseError::InternalError {
        message: "Missing helper argument".to_string(),
    })?)?;

    // Permissive by default; `errors="raise"` opts into strict parsing.
    let mut strict = false;
    for kwarg in inner {
        let (key, value) = parse_kwarg(kwarg)?;
        if key != "errors" {
            return Err(ParseError::InvalidArguments {
                method: name,
                reason: format!("unsupported keyword '{key}'"),
            });
        }
        match value {
            Literal::String(mode) if mode == "coerce" => strict = false,
            Literal::String(mode) if mode == "raise" => strict = true,
            _ => {
                return Err(ParseError::InvalidArguments {
                    method: name,
                    reason: "errors must be \"coerce\" or \"raise\"".to_string(),
                })
            }
        }
    }

    match name.as_str() {
        "to_datetime" => Ok(DataExpr::ParseDates {
            input: Box::new(argument),
            strict,
        }),
        "to_numeric" => Ok(DataExpr::ParseNumbers {
            input: Box::new(argument),
            strict,
        }),
        other => Err(ParseError::InternalError {
            message: format!("Unknown helper: {other}"),
        }),
    }
}

fn apply_step(input: DataExpr, pair: Pair<Rule>) -> Result<DataExpr, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty step".to_string(),
        })?;
    match inner.as_rule() {
        Rule::subscript => apply_subscript(input, inner),
        Rule::method_call => apply_method(input, inner),
        Rule::attribute => {
            let name = inner
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::InternalError {
                    message: "Empty attribute".to_string(),
                })?;
            match name.as_str() {
                "values" => Ok(DataExpr::values(input)),
                "index" => Ok(DataExpr::index(input)),
                other => Err(ParseError::InternalError {
                    message: format!("Unknown attribute: {other}"),
                }),
            }
        }
        _ => Err(ParseError::InternalError {
            message: format!("Unexpected step rule: {:?}", inner.as_rule()),
        }),
    }
}

fn apply_subscript(input: DataExpr, pair: Pair<Rule>) -> Result<DataExpr, ParseError> {
    let body = pair
        .into_inner()
        .next()
        .and_then(|body| body.into_inner().next())
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty subscript".to_string(),
        })?;
    match body.as_rule() {
        Rule::string_literal => Ok(DataExpr::select(input, unquote_string(body.as_str())?)),
        Rule::predicate => Ok(DataExpr::filter(input, parse_predicate(body)?)),
        _ => Err(ParseError::InternalError {
            message: format!("Unexpected subscript rule: {:?}", body.as_rule()),
        }),
    }
}

fn apply_method(input: DataExpr, pair: Pair<Rule>) -> Result<DataExpr, ParseError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Missing method name".to_string(),
        })?
        .as_str()
        .to_string();
    let args: Vec<Pair<Rule>> = inner
        .next()
        .map(|list| list.into_inner().collect())
        .unwrap_or_default();

    match name.as_str() {
        "groupby" => parse_groupby(input, &name, args),
        "sort_values" => parse_sort_values(input, &name, args),
        "tolist" => {
            require_no_args(&name, &args)?;
            Ok(DataExpr::to_list(input))
        }
        "to_dict" => {
            require_no_args(&name, &args)?;
            Ok(DataExpr::to_dict(input))
        }
        "sum" | "count" | "mean" | "median" | "max" | "min" => {
            require_no_args(&name, &args)?;
            let function = match name.as_str() {
                "sum" => AggregateFn::Sum,
                "count" => AggregateFn::Count,
                "mean" => AggregateFn::Mean,
                "median" => AggregateFn::Median,
                "max" => AggregateFn::Max,
                _ => AggregateFn::Min,
            };
            Ok(DataExpr::aggregate(input, function))
        }
        other => Err(ParseError::InternalError {
            message: format!("Unknown method: {other}"),
        }),
    }
}

fn require_no_args(method: &str, args: &[Pair<Rule>]) -> Result<(), ParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ParseError::InvalidArguments {
            method: method.to_string(),
            reason: "takes no arguments".to_string(),
        })
    }
}

fn parse_groupby(
    input: DataExpr,
    method: &str,
    args: Vec<Pair<Rule>>,
) -> Result<DataExpr, ParseError> {
    if args.len() != 1 {
        return Err(ParseError::InvalidArguments {
            method: method.to_string(),
            reason: "expects exactly one key or key list".to_string(),
        });
    }
    let arg = args
        .into_iter()
        .next()
        .and_then(|arg| arg.into_inner().next())
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty groupby argument".to_string(),
        })?;
    let keys = match arg.as_rule() {
        Rule::string_literal => vec![unquote_string(arg.as_str())?],
        Rule::string_list => arg
            .into_inner()
            .map(|key| unquote_string(key.as_str()))
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(ParseError::InvalidArguments {
                method: method.to_string(),
                reason: "keys must be a string or list of strings".to_string(),
            })
        }
    };
    Ok(DataExpr::group_by(input, keys))
}

fn parse_sort_values(
    input: DataExpr,
    method: &str,
    args: Vec<Pair<Rule>>,
) -> Result<DataExpr, ParseError> {
    let mut by: Option<String> = None;
    let mut ascending = true;
    for arg in args {
        let arg = arg
            .into_inner()
            .next()
            .ok_or_else(|| ParseError::InternalError {
                message: "Empty sort_values argument".to_string(),
            })?;
        match arg.as_rule() {
            Rule::string_literal => {
                if by.is_some() {
                    return Err(ParseError::InvalidArguments {
                        method: method.to_string(),
                        reason: "takes at most one sort column".to_string(),
                    });
                }
                by = Some(unquote_string(arg.as_str())?);
            }
            Rule::kwarg => {
                let (key, value) = parse_kwarg(arg)?;
                match (key.as_str(), value) {
                    ("ascending", Literal::Boolean(flag)) => ascending = flag,
                    ("by", Literal::String(column)) if by.is_none() => by = Some(column),
                    (other, _) => {
                        return Err(ParseError::InvalidArguments {
                            method: method.to_string(),
                            reason: format!("unsupported keyword '{other}'"),
                        })
                    }
                }
            }
            _ => {
                return Err(ParseError::InvalidArguments {
                    method: method.to_string(),
                    reason: "arguments must be a column name or ascending flag".to_string(),
                })
            }
        }
    }
    Ok(DataExpr::sort_values(input, by, ascending))
}

fn parse_predicate(pair: Pair<Rule>) -> Result<Predicate, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty predicate".to_string(),
        })?;
    match inner.as_rule() {
        Rule::comparison => {
            let mut parts = inner.into_inner();
            let column = parse_column_ref(parts.next().ok_or_else(|| {
                ParseError::InternalError {
                    message: "Comparison without a column".to_string(),
                }
            })?)?;
            let op = match parts
                .next()
                .ok_or_else(|| ParseError::InternalError {
                    message: "Comparison without an operator".to_string(),
                })?
                .as_str()
            {
                "==" => CompareOp::Eq,
                "!=" => CompareOp::NotEq,
                ">=" => CompareOp::Ge,
                "<=" => CompareOp::Le,
                ">" => CompareOp::Gt,
                _ => CompareOp::Lt,
            };
            let value = parse_literal(parts.next().ok_or_else(|| ParseError::InternalError {
                message: "Comparison without a value".to_string(),
            })?)?;
            Ok(Predicate::Compare { column, op, value })
        }
        Rule::membership => {
            let mut parts = inner.into_inner();
            let column = parse_column_ref(parts.next().ok_or_else(|| {
                ParseError::InternalError {
                    message: "Membership without a column".to_string(),
                }
            })?)?;
            let values = parts
                .next()
                .ok_or_else(|| ParseError::InternalError {
                    message: "Membership without values".to_string(),
                })?
                .into_inner()
                .map(parse_literal)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::IsIn { column, values })
        }
        _ => Err(ParseError::InternalError {
            message: format!("Unexpected predicate rule: {:?}", inner.as_rule()),
        }),
    }
}

fn parse_column_ref(pair: Pair<Rule>) -> Result<String, ParseError> {
    let name = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Column reference without a name".to_string(),
        })?;
    unquote_string(name.as_str())
}

fn parse_kwarg(pair: Pair<Rule>) -> Result<(String, Literal), ParseError> {
    let mut inner = pair.into_inner();
    let key = inner
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Keyword argument without a name".to_string(),
        })?
        .as_str()
        .to_string();
    let value = parse_literal(inner.next().ok_or_else(|| ParseError::InternalError {
        message: "Keyword argument without a value".to_string(),
    })?)?;
    Ok((key, value))
}

fn parse_literal(pair: Pair<Rule>) -> Result<Literal, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::InternalError {
            message: "Empty literal".to_string(),
        })?;
    match inner.as_rule() {
        Rule::string_literal => Ok(Literal::String(unquote_string(inner.as_str())?)),
        Rule::number_literal => {
            inner
                .as_str()
                .parse::<f64>()
                .map(Literal::Number)
                .map_err(|_| ParseError::InvalidNumber {
                    value: inner.as_str().to_string(),
                })
        }
        Rule::boolean_literal => Ok(Literal::Boolean(matches!(inner.as_str(), "True" | "true"))),
        Rule::null_literal => Ok(Literal::Null),
        _ => Err(ParseError::InternalError {
            message: format!("Unknown literal type: {:?}", inner.as_rule()),
        }),
    }
}

fn unquote_string(raw: &str) -> Result<String, ParseError> {
    if raw.len() < 2 {
        return Err(ParseError::InternalError {
            message: format!("Malformed string literal: {raw}"),
        });
    }
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_selection() {
        let expr = parse_chain(r#"df["Sales"].tolist()"#).unwrap();
        assert_eq!(
            expr,
            DataExpr::to_list(DataExpr::select(DataExpr::Frame, "Sales"))
        );
    }

    #[test]
    fn parses_grouped_aggregation() {
        let expr = parse_chain(r#"df.groupby("Type")["Amount"].sum().values.tolist()"#).unwrap();
        let grouped = DataExpr::group_by(DataExpr::Frame, vec!["Type".to_string()]);
        let selected = DataExpr::select(grouped, "Amount");
        let summed = DataExpr::aggregate(selected, AggregateFn::Sum);
        assert_eq!(expr, DataExpr::to_list(DataExpr::values(summed)));
    }

    #[test]
    fn parses_multi_key_groupby() {
        let expr = parse_chain(r#"df.groupby(["Region", "Type"])["Amount"].mean().index.tolist()"#)
            .unwrap();
        match expr {
            DataExpr::ToList { input } => match *input {
                DataExpr::Index { input } => match *input {
                    DataExpr::Aggregate { input, function } => {
                        assert_eq!(function, AggregateFn::Mean);
                        match *input {
                            DataExpr::Select { input, .. } => match *input {
                                DataExpr::GroupBy { keys, .. } => {
                                    assert_eq!(keys, vec!["Region", "Type"]);
                                }
                                _ => panic!("Expected GroupBy"),
                            },
                            _ => panic!("Expected Select"),
                        }
                    }
                    _ => panic!("Expected Aggregate"),
                },
                _ => panic!("Expected Index"),
            },
            _ => panic!("Expected ToList"),
        }
    }

    #[test]
    fn parses_comparison_filter() {
        let expr = parse_chain(r#"df[df["Sales"] > 100]["Region"].tolist()"#).unwrap();
        match expr {
            DataExpr::ToList { input } => match *input {
                DataExpr::Select { input, column } => {
                    assert_eq!(column, "Region");
                    match *input {
                        DataExpr::Filter { predicate, .. } => {
                            assert_eq!(
                                predicate,
                                Predicate::Compare {
                                    column: "Sales".to_string(),
                                    op: CompareOp::Gt,
                                    value: Literal::Number(100.0),
                                }
                            );
                        }
                        _ => panic!("Expected Filter"),
                    }
                }
                _ => panic!("Expected Select"),
            },
            _ => panic!("Expected ToList"),
        }
    }

    #[test]
    fn parses_membership_filter() {
        let expr = parse_chain(r#"df[df["Type"].isin(["A", "B"])]["Amount"].tolist()"#).unwrap();
        match expr {
            DataExpr::ToList { input } => match *input {
                DataExpr::Select { input, .. } => match *input {
                    DataExpr::Filter { predicate, .. } => match predicate {
                        Predicate::IsIn { column, values } => {
                            assert_eq!(column, "Type");
                            assert_eq!(values.len(), 2);
                        }
                        _ => panic!("Expected IsIn"),
                    },
                    _ => panic!("Expected Filter"),
                },
                _ => panic!("Expected Select"),
            },
            _ => panic!("Expected ToList"),
        }
    }

    #[test]
    fn parses_helper_with_coerce() {
        let expr =
            parse_chain(r#"pd.to_datetime(df["Order Date"], errors="coerce").tolist()"#).unwrap();
        match expr {
            DataExpr::ToList { input } => match *input {
                DataExpr::ParseDates { strict, .. } => assert!(!strict),
                _ => panic!("Expected ParseDates"),
            },
            _ => panic!("Expected ToList"),
        }
    }

    #[test]
    fn parses_sort_values_descending() {
        let expr = parse_chain(r#"df.sort_values("Sales", ascending=False)["Region"].tolist()"#)
            .unwrap();
        match expr {
            DataExpr::ToList { input } => match *input {
                DataExpr::Select { input, .. } => match *input {
                    DataExpr::SortValues { by, ascending, .. } => {
                        assert_eq!(by.as_deref(), Some("Sales"));
                        assert!(!ascending);
                    }
                    _ => panic!("Expected SortValues"),
                },
                _ => panic!("Expected Select"),
            },
            _ => panic!("Expected ToList"),
        }
    }

    #[test]
    fn string_literal_may_contain_brackets() {
        let expr = parse_chain(r#"df[df["Type"] == "B]"]["Amount"].tolist()"#).unwrap();
        match expr {
            DataExpr::ToList { input } => match *input {
                DataExpr::Select { input, .. } => match *input {
                    DataExpr::Filter { predicate, .. } => match predicate {
                        Predicate::Compare { value, .. } => {
                            assert_eq!(value, Literal::String("B]".to_string()));
                        }
                        _ => panic!("Expected Compare"),
                    },
                    _ => panic!("Expected Filter"),
                },
                _ => panic!("Expected Select"),
            },
            _ => panic!("Expected ToList"),
        }
    }

    #[test]
    fn rejects_unknown_methods() {
        assert!(parse_chain(r#"df["x"].explode().tolist()"#).is_err());
        assert!(parse_chain("df.pipe(print)").is_err());
        assert!(parse_chain("open('/etc/passwd')").is_err());
    }

    #[test]
    fn rejects_unknown_bindings() {
        assert!(parse_chain(r#"os["x"].tolist()"#).is_err());
        assert!(parse_chain(r#"frame["x"].tolist()"#).is_err());
    }

    #[test]
    fn rejects_arguments_on_aggregates() {
        let err = parse_chain(r#"df["x"].sum("y").tolist()"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidArguments { .. }));
    }

    #[test]
    fn single_quoted_strings_are_accepted() {
        let expr = parse_chain(r#"df['Sales'].tolist()"#).unwrap();
        assert_eq!(
            expr,
            DataExpr::to_list(DataExpr::select(DataExpr::Frame, "Sales"))
        );
    }
}
