//! Escaped-JSON cleanup for tools known to double-escape their own output
//! when it passes through an intermediate shell/log layer (spec §4.5:
//! "Escaped-JSON sanitization for tools known to double-escape backslashes
//! and quotes").

/// Undo one level of `\\` -> `\` and `\"` -> `"` escaping. Idempotent on
/// already-clean input: a lone backslash not followed by `\` or `"` is left
/// untouched, so running this twice on clean JSON is a no-op.
pub fn unescape_one_level(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                Some('"') => {
                    out.push('"');
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_double_escaped_quotes_and_backslashes() {
        let raw = r#"{\"file\": \"a\\\\b.go\"}"#;
        let cleaned = unescape_one_level(raw);
        assert_eq!(cleaned, r#"{"file": "a\b.go"}"#);
    }

    #[test]
    fn leaves_already_clean_json_untouched() {
        let raw = r#"{"file": "a.go"}"#;
        assert_eq!(unescape_one_level(raw), raw);
    }

    #[test]
    fn is_idempotent_on_clean_input() {
        let raw = r#"{"file": "a.go"}"#;
        let once = unescape_one_level(raw);
        let twice = unescape_one_level(&once);
        assert_eq!(once, twice);
    }
}
