//! Environment locator.
//!
//! Finds balanced `\begin{env}...\end{env}` regions, counting nested
//! occurrences of the same environment so an inner `\end` never closes
//! the outer region.

/// Environments recognized by the document parser.
pub const SUPPORTED_ENVIRONMENTS: &[&str] = &["tikzpicture", "circuitikz"];

/// `\begin{env}` marker text.
pub(crate) fn begin_marker(env: &str) -> String {
    format!("\\begin{{{env}}}")
}

/// `\end{env}` marker text.
pub(crate) fn end_marker(env: &str) -> String {
    format!("\\end{{{env}}}")
}

/// Locate the next balanced `env` region starting at or after `from`.
///
/// Returns the `(start, end)` byte span, where `end` is the offset just past
/// the matching `\end{env}`. Returns `None` if there is no `\begin{env}` at or
/// after `from`, or if the region is never closed.
#[must_use]
pub fn find_environment_bounds(source: &str, env: &str, from: usize) -> Option<(usize, usize)> {
    let begin = begin_marker(env);
    let end = end_marker(env);

    let start = from + source.get(from..)?.find(&begin)?;
    let mut depth = 1usize;
    let mut cursor = start + begin.len();

    loop {
        let rest = &source[cursor..];
        let next_end = rest.find(&end)?;
        match rest.find(&begin) {
            Some(next_begin) if next_begin < next_end => {
                depth += 1;
                cursor += next_begin + begin.len();
            }
            _ => {
                depth -= 1;
                cursor += next_end + end.len();
                if depth == 0 {
                    return Some((start, cursor));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_simple_environment() {
        let src = "x \\begin{tikzpicture}a\\end{tikzpicture} y";
        let (start, end) = find_environment_bounds(src, "tikzpicture", 0).unwrap();
        assert_eq!(start, 2);
        assert_eq!(&src[start..end], "\\begin{tikzpicture}a\\end{tikzpicture}");
    }

    #[test]
    fn test_nested_same_environment() {
        let src = "\\begin{tikzpicture}\\begin{tikzpicture}in\\end{tikzpicture}out\\end{tikzpicture}!";
        let (start, end) = find_environment_bounds(src, "tikzpicture", 0).unwrap();
        assert_eq!(start, 0);
        assert_eq!(end, src.len() - 1);
    }

    #[test]
    fn test_from_offset_skips_earlier_regions() {
        let src = "\\begin{circuitikz}\\end{circuitikz}\\begin{circuitikz}x\\end{circuitikz}";
        let (first_start, first_end) = find_environment_bounds(src, "circuitikz", 0).unwrap();
        assert_eq!(first_start, 0);
        let (second_start, second_end) =
            find_environment_bounds(src, "circuitikz", first_end).unwrap();
        assert_eq!(second_start, first_end);
        assert_eq!(second_end, src.len());
    }

    #[test]
    fn test_unterminated_returns_none() {
        let src = "\\begin{tikzpicture} \\node at (0,0) {A};";
        assert_eq!(find_environment_bounds(src, "tikzpicture", 0), None);
    }

    #[test]
    fn test_unterminated_nested_returns_none() {
        let src = "\\begin{tikzpicture}\\begin{tikzpicture}\\end{tikzpicture}";
        assert_eq!(find_environment_bounds(src, "tikzpicture", 0), None);
    }

    #[test]
    fn test_missing_environment() {
        assert_eq!(find_environment_bounds("plain text", "tikzpicture", 0), None);
    }

    #[test]
    fn test_offset_past_end() {
        assert_eq!(find_environment_bounds("abc", "tikzpicture", 10), None);
    }

    #[test]
    fn test_does_not_match_longer_env_name() {
        let src = "\\begin{tikzpicturex}\\end{tikzpicturex}";
        assert_eq!(find_environment_bounds(src, "tikzpicture", 0), None);
    }
}
