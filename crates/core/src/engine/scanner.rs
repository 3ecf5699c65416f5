//! Candidate discovery: positions where an embedded expression may start.

use lazy_static::lazy_static;
use regex::Regex;

/// A position proposed as a possible expression start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Byte offset of the reference identifier.
    pub start: usize,
    /// Length of the matched identifier token (`df` or `pd`).
    pub token_len: usize,
}

lazy_static! {
    // A recognized binding on a word boundary, immediately followed by an
    // indexing, call, or member-access token. Word characters before the
    // identifier (e.g. `pdf[`) fail the boundary and are not matched.
    static ref REFERENCE: Regex =
        Regex::new(r"\b(df|pd)[\[(.]").expect("reference pattern must compile");
}

/// Scan the input for candidate expression starts, in ascending order.
///
/// Balance is not checked here, and candidates inside surrounding quoted
/// JSON strings are matched on purpose; the boundary resolver and the
/// closed grammar decide what they really are.
pub fn scan(input: &str) -> Vec<Candidate> {
    REFERENCE
        .captures_iter(input)
        .filter_map(|caps| caps.get(1))
        .map(|m| Candidate {
            start: m.start(),
            token_len: m.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_each_reference_start() {
        let input = r#"{"x": df["a"].tolist(), "y": pd.to_datetime(df["b"]).tolist()}"#;
        let candidates = scan(input);
        let starts: Vec<usize> = candidates.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![6, 29, 44]);
    }

    #[test]
    fn requires_word_boundary() {
        assert!(scan(r#"pdf["a"]"#).is_empty());
        assert!(scan(r#"my_df["a"]"#).is_empty());
        assert!(scan("dfx[1]").is_empty());
    }

    #[test]
    fn requires_access_token_after_identifier() {
        assert!(scan("df").is_empty());
        assert!(scan("the df is ready").is_empty());
        assert_eq!(scan("df.head").len(), 1);
    }

    #[test]
    fn matches_inside_quoted_text() {
        // Intentional: the resolver sorts out quoting, not the scanner.
        assert_eq!(scan(r#""df["a"].tolist()""#).len(), 1);
    }

    #[test]
    fn no_candidates_in_plain_json() {
        assert!(scan(r#"{"title": "Sales by region", "data": [1, 2]}"#).is_empty());
    }
}
