//! Parse error type.

/// Malformed or unterminated input found while scanning a document.
///
/// Parse errors never abort a document parse: the affected region is kept
/// as raw text and the error is reported alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    /// Human-readable description.
    pub message: String,
    /// Byte offset into the source where the problem starts.
    pub offset: usize,
}

impl ParseError {
    /// Create a new parse error at `offset`.
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset() {
        let err = ParseError::new("unterminated \\begin{tikzpicture}", 42);
        assert_eq!(
            err.to_string(),
            "unterminated \\begin{tikzpicture} at offset 42"
        );
    }
}
