//! Recover spec text from raw assistant output.
//!
//! Models are instructed to return pure JSON, but in practice responses
//! arrive wrapped in markdown fences or surrounded by prose. These helpers
//! strip that packaging before the substitution pass runs.

/// Strip markdown code fences from an assistant response.
///
/// Prefers the content of the last ```json fence; falls back to the last
/// fenced block of any kind, then to the trimmed response itself.
pub fn extract_spec_text(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }

    if let Some(after) = trimmed.rsplit_once("```json").map(|(_, after)| after) {
        let body = after.split("```").next().unwrap_or("").trim();
        if !body.is_empty() {
            return body.to_string();
        }
    }

    // ```...``` pairs: the second-to-last segment is the last fenced body.
    let segments: Vec<&str> = trimmed.split("```").collect();
    if segments.len() >= 3 {
        let body = segments[segments.len() - 2].trim();
        if !body.is_empty() {
            return body.to_string();
        }
    }
    trimmed.to_string()
}

/// Extract the first balanced `{...}` object from free-form text.
///
/// Brace depth is tracked with the same quote and escape rules the
/// boundary resolver uses, so braces inside string values do not
/// terminate the object early. Returns `None` when no balanced object
/// exists.
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth: u32 = 0;
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
        match byte {
            b'"' => quote = Some(byte),
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_bare_json() {
        let text = r#"  {"a": 1}  "#;
        assert_eq!(extract_spec_text(text), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_json_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy!";
        assert_eq!(extract_spec_text(text), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_plain_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_spec_text(text), r#"{"a": 1}"#);
    }

    #[test]
    fn prefers_last_json_fence() {
        let text = "```json\n{\"old\": 1}\n```\ntake two:\n```json\n{\"new\": 2}\n```";
        assert_eq!(extract_spec_text(text), r#"{"new": 2}"#);
    }

    #[test]
    fn finds_balanced_object_in_prose() {
        let text = r#"Sure! {"mark": "bar", "x": {"field": "Sales"}} should work."#;
        assert_eq!(
            extract_balanced_object(text),
            Some(r#"{"mark": "bar", "x": {"field": "Sales"}}"#)
        );
    }

    #[test]
    fn brace_inside_string_does_not_close_object() {
        let text = r#"{"title": "curly } brace", "n": 1}"#;
        assert_eq!(extract_balanced_object(text), Some(text));
    }

    #[test]
    fn unbalanced_object_yields_none() {
        assert_eq!(extract_balanced_object(r#"{"a": 1"#), None);
        assert_eq!(extract_balanced_object("no braces here"), None);
    }
}
