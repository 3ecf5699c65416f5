//! Boundary resolution: where exactly does a candidate expression end?

/// Terminal accessor suffixes, longest match first. A chain is complete
/// once one of these appears at the expression's top level and nothing
/// chains on after it.
pub const TERMINAL_SUFFIXES: [&str; 4] = [
    ".values.tolist()",
    ".index.tolist()",
    ".tolist()",
    ".to_dict()",
];

/// Tokens that continue a chain after a would-be terminal suffix.
const CHAIN_TOKENS: [u8; 3] = [b'[', b'(', b'.'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The expression spans `[start, end)`.
    Resolved { end: usize },
    /// No terminal suffix was found; leave the candidate untouched.
    Unresolved,
}

/// Determine the end of the expression starting at `start`.
///
/// Scans forward tracking parenthesis depth, bracket depth, and quoted
/// literals (quote character remembered, backslash escapes honored; depth
/// counters only change outside quotes). A terminal suffix is accepted
/// only with both depths back at the level of the expression start and no
/// chaining token following. A close token that would drop a depth below
/// that level means the surrounding document resumed without a terminal
/// suffix, and the candidate stays unresolved.
pub fn resolve_boundary(input: &str, start: usize) -> Resolution {
    let bytes = input.as_bytes();
    let mut paren: u32 = 0;
    let mut bracket: u32 = 0;
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let byte = bytes[i];

        if let Some(open) = quote {
            if byte == b'\\' {
                i += 2;
                continue;
            }
            if byte == open {
                quote = None;
            }
            i += 1;
            continue;
        }

        if paren == 0 && bracket == 0 {
            if let Some(end) = match_terminal(bytes, i) {
                return Resolution::Resolved { end };
            }
        }

        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'(' => paren += 1,
            b')' => {
                if paren == 0 {
                    return Resolution::Unresolved;
                }
                paren -= 1;
            }
            b'[' => bracket += 1,
            b']' => {
                if bracket == 0 {
                    return Resolution::Unresolved;
                }
                bracket -= 1;
            }
            _ => {}
        }
        i += 1;
    }

    Resolution::Unresolved
}

/// Match a terminal suffix at `at`, unless the chain keeps going.
fn match_terminal(bytes: &[u8], at: usize) -> Option<usize> {
    for suffix in TERMINAL_SUFFIXES {
        if !bytes[at..].starts_with(suffix.as_bytes()) {
            continue;
        }
        let end = at + suffix.len();
        match bytes.get(end) {
            Some(next) if CHAIN_TOKENS.contains(next) => return None,
            _ => return Some(end),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved_end(input: &str, start: usize) -> usize {
        match resolve_boundary(input, start) {
            Resolution::Resolved { end } => end,
            Resolution::Unresolved => panic!("Expected resolution for {input:?}"),
        }
    }

    #[test]
    fn resolves_simple_chain() {
        let input = r#"df["Sales"].tolist()"#;
        assert_eq!(resolved_end(input, 0), input.len());
    }

    #[test]
    fn resolves_up_to_span_end_only() {
        let input = r#"df["Sales"].tolist(), "next": 1"#;
        assert_eq!(resolved_end(input, 0), r#"df["Sales"].tolist()"#.len());
    }

    #[test]
    fn resolves_grouped_chain_with_nested_calls() {
        let input = r#"df.groupby("Type")["Amount"].sum().values.tolist()"#;
        assert_eq!(resolved_end(input, 0), input.len());
    }

    #[test]
    fn bracket_inside_string_literal_does_not_close() {
        let input = r#"df[df["Type"] == "B]"]["Amount"].tolist()"#;
        assert_eq!(resolved_end(input, 0), input.len());
    }

    #[test]
    fn escaped_quote_does_not_close_literal() {
        let input = r#"df[df["Type"] == "a\"]b"]["Amount"].tolist()"#;
        assert_eq!(resolved_end(input, 0), input.len());
    }

    #[test]
    fn suffix_inside_nested_call_is_not_terminal() {
        // The suffix inside the parentheses is at depth 1; only the outer
        // one closes the expression.
        let input = r#"pd.to_datetime(df["When"].tolist()).tolist()"#;
        assert_eq!(resolved_end(input, 0), input.len());
    }

    #[test]
    fn chaining_token_after_suffix_keeps_scanning() {
        let input = r#"df["Sales"].tolist()[0].tolist()"#;
        assert_eq!(resolved_end(input, 0), input.len());
    }

    #[test]
    fn missing_terminal_suffix_is_unresolved() {
        assert_eq!(resolve_boundary("df.shape", 0), Resolution::Unresolved);
        assert_eq!(
            resolve_boundary(r#"df["Sales"].sum()"#, 0),
            Resolution::Unresolved
        );
    }

    #[test]
    fn close_below_start_level_is_unresolved() {
        // The candidate sits inside a JSON array that closes before any
        // terminal suffix shows up.
        let input = r#"df.shape], "x": 1"#;
        assert_eq!(resolve_boundary(input, 0), Resolution::Unresolved);
    }

    #[test]
    fn candidate_mid_document_resolves_relative_to_its_own_start() {
        let input = r#"{"data": df["Sales"].tolist()}"#;
        let start = 9;
        assert_eq!(resolved_end(input, start), input.len() - 1);
    }
}
