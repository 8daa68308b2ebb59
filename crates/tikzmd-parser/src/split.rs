//! Statement splitting on top-level semicolons.

/// One statement sliced out of an environment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    /// Statement text, including the terminating `;` when present.
    pub text: &'a str,
    /// Byte offset of `text` within the body.
    pub start: usize,
}

/// Split `body` into statements on `;` at brace depth zero.
///
/// `{` increases depth and `}` decreases it (never below zero). A non-blank
/// trailing fragment without a terminating `;` is emitted as a final statement.
#[must_use]
pub fn split_statements(body: &str) -> Vec<Statement<'_>> {
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, byte) in body.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => {
                statements.push(Statement {
                    text: &body[start..=i],
                    start,
                });
                start = i + 1;
            }
            _ => {}
        }
    }

    let tail = &body[start..];
    if !tail.trim().is_empty() {
        statements.push(Statement { text: tail, start });
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(body: &str) -> Vec<&str> {
        split_statements(body).iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_splits_on_semicolons() {
        assert_eq!(texts("a;b;"), vec!["a;", "b;"]);
    }

    #[test]
    fn test_semicolon_inside_braces_is_not_a_boundary() {
        assert_eq!(
            texts("\\node at (0,0) {a;b}; \\draw (0) to (1);"),
            vec!["\\node at (0,0) {a;b};", " \\draw (0) to (1);"]
        );
    }

    #[test]
    fn test_trailing_fragment_without_semicolon() {
        assert_eq!(texts("a; b"), vec!["a;", " b"]);
    }

    #[test]
    fn test_blank_trailing_fragment_dropped() {
        assert_eq!(texts("a;\n  \n"), vec!["a;"]);
    }

    #[test]
    fn test_unbalanced_closing_brace_floors_at_zero() {
        assert_eq!(texts("}a;b;"), vec!["}a;", "b;"]);
    }

    #[test]
    fn test_unclosed_brace_swallows_rest() {
        assert_eq!(texts("{a;b;"), vec!["{a;b;"]);
    }

    #[test]
    fn test_start_offsets() {
        let stmts = split_statements("ab; cd;");
        assert_eq!(stmts[0].start, 0);
        assert_eq!(stmts[1].start, 3);
    }

    #[test]
    fn test_empty_body() {
        assert!(split_statements("").is_empty());
    }
}
