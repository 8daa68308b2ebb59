//! Low-level scanning helpers shared by the picture and circuit parsers.
//!
//! Parsing is prefix driven: a [`Cursor`] walks a single statement, and each
//! helper either consumes a construct and advances, or leaves the position
//! untouched and returns `None`.

use serde::Serialize;

/// Raw `[...]` option list, brackets included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionList {
    pub raw: String,
}

impl OptionList {
    /// Text between the brackets.
    #[must_use]
    pub fn inner(&self) -> &str {
        &self.raw[1..self.raw.len() - 1]
    }

    /// Top-level comma separated items, trimmed, empty items skipped.
    ///
    /// Commas nested inside `{}` or `()` do not split.
    #[must_use]
    pub fn items(&self) -> Vec<&str> {
        let inner = self.inner();
        let mut items = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, byte) in inner.bytes().enumerate() {
            match byte {
                b'{' | b'(' => depth += 1,
                b'}' | b')' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    items.push(&inner[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        items.push(&inner[start..]);
        items
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Numeric `(x, y)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

/// Reference to a named node or a coordinate: `(name)`, `(name.anchor)`,
/// `(1,2)` or the anonymous `()` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub is_empty: bool,
    /// Original text, parentheses included.
    pub raw: String,
}

impl PathRef {
    /// Build a reference from the text between the parentheses.
    ///
    /// A `.` splits off an anchor only for node references; coordinates
    /// (anything containing a comma) keep their decimal points.
    fn from_inner(inner: &str, raw: String) -> Self {
        let inner = inner.trim();
        if inner.is_empty() {
            return Self {
                name: None,
                anchor: None,
                is_empty: true,
                raw,
            };
        }
        let (name, anchor) = match inner.split_once('.') {
            Some((name, anchor)) if !inner.contains(',') => (name, Some(anchor.to_owned())),
            _ => (inner, None),
        };
        Self {
            name: Some(name.to_owned()),
            anchor,
            is_empty: false,
            raw,
        }
    }

    /// Interpret the reference as a numeric `(x, y)` coordinate.
    #[must_use]
    pub fn coord(&self) -> Option<Coord> {
        let inner = self.raw.get(1..self.raw.len().checked_sub(1)?)?;
        let (x, y) = inner.split_once(',')?;
        Some(Coord {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Single-pass cursor over one statement.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub(crate) fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume `literal` after optional whitespace.
    pub(crate) fn eat(&mut self, literal: &str) -> bool {
        let save = self.pos;
        self.skip_ws();
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// Consume `word` after optional whitespace when it is not followed by
    /// another word character.
    pub(crate) fn eat_keyword(&mut self, word: &str) -> bool {
        let save = self.pos;
        self.skip_ws();
        let rest = self.rest();
        let boundary = rest
            .as_bytes()
            .get(word.len())
            .is_none_or(|&b| !is_word_byte(b));
        if rest.starts_with(word) && boundary {
            self.pos += word.len();
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// Consume a control sequence such as `\draw` at the statement start.
    pub(crate) fn eat_command(&mut self, name: &str) -> bool {
        let save = self.pos;
        if self.eat("\\") && self.eat_keyword_here(name) {
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// Like [`eat_keyword`](Self::eat_keyword) without skipping whitespace.
    fn eat_keyword_here(&mut self, word: &str) -> bool {
        let rest = self.rest();
        let boundary = rest
            .as_bytes()
            .get(word.len())
            .is_none_or(|&b| !is_word_byte(b));
        if rest.starts_with(word) && boundary {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    /// Consume a balanced `open ... close` group after optional whitespace,
    /// returning it with delimiters.
    fn delimited(&mut self, open: u8, close: u8) -> Option<&'a str> {
        let save = self.pos;
        self.skip_ws();
        let rest = self.rest();
        if rest.as_bytes().first() != Some(&open) {
            self.pos = save;
            return None;
        }

        let mut depth = 0usize;
        for (i, byte) in rest.bytes().enumerate() {
            if byte == open {
                depth += 1;
            } else if byte == close {
                depth -= 1;
                if depth == 0 {
                    self.pos += i + 1;
                    return Some(&rest[..=i]);
                }
            }
        }

        self.pos = save;
        None
    }

    pub(crate) fn options(&mut self) -> Option<OptionList> {
        self.delimited(b'[', b']').map(|raw| OptionList {
            raw: raw.to_owned(),
        })
    }

    pub(crate) fn path_ref(&mut self) -> Option<PathRef> {
        let raw = self.delimited(b'(', b')')?;
        Some(PathRef::from_inner(&raw[1..raw.len() - 1], raw.to_owned()))
    }

    /// Brace group such as a node label, braces included.
    pub(crate) fn group(&mut self) -> Option<String> {
        self.delimited(b'{', b'}').map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_ref_named() {
        let mut c = Cursor::new("  (a)");
        let r = c.path_ref().unwrap();
        assert_eq!(r.name.as_deref(), Some("a"));
        assert_eq!(r.anchor, None);
        assert!(!r.is_empty);
        assert_eq!(r.raw, "(a)");
        assert!(c.is_at_end());
    }

    #[test]
    fn test_path_ref_anchor() {
        let r = Cursor::new("(n1.north east)").path_ref().unwrap();
        assert_eq!(r.name.as_deref(), Some("n1"));
        assert_eq!(r.anchor.as_deref(), Some("north east"));
    }

    #[test]
    fn test_path_ref_empty() {
        let r = Cursor::new("()").path_ref().unwrap();
        assert!(r.is_empty);
        assert_eq!(r.name, None);
    }

    #[test]
    fn test_path_ref_decimal_coordinate_keeps_point() {
        let r = Cursor::new("(1.5, -2)").path_ref().unwrap();
        assert_eq!(r.name.as_deref(), Some("1.5, -2"));
        assert_eq!(r.anchor, None);
        assert_eq!(r.coord(), Some(Coord { x: 1.5, y: -2.0 }));
    }

    #[test]
    fn test_path_ref_nested_parens() {
        let mut c = Cursor::new("($(a)!0.5!(b)$) rest");
        let r = c.path_ref().unwrap();
        assert_eq!(r.raw, "($(a)!0.5!(b)$)");
    }

    #[test]
    fn test_coord_rejects_names() {
        let r = Cursor::new("(a)").path_ref().unwrap();
        assert_eq!(r.coord(), None);
    }

    #[test]
    fn test_missing_delimiter_leaves_position() {
        let mut c = Cursor::new("  x");
        assert!(c.path_ref().is_none());
        assert!(c.options().is_none());
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_unclosed_group_fails() {
        let mut c = Cursor::new("{abc");
        assert!(c.group().is_none());
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_keyword_boundary() {
        let mut c = Cursor::new(" tour");
        assert!(!c.eat_keyword("to"));
        let mut c = Cursor::new(" to[R]");
        assert!(c.eat_keyword("to"));
        assert_eq!(c.options().unwrap().raw, "[R]");
    }

    #[test]
    fn test_command_boundary() {
        assert!(Cursor::new("  \\draw (a)").eat_command("draw"));
        assert!(!Cursor::new("\\drawing").eat_command("draw"));
        assert!(!Cursor::new("draw").eat_command("draw"));
    }

    #[test]
    fn test_option_items() {
        let opts = Cursor::new("[V, l_=$V_s$, color={a,b}]").options().unwrap();
        assert_eq!(opts.inner(), "V, l_=$V_s$, color={a,b}");
        assert_eq!(opts.items(), vec!["V", "l_=$V_s$", "color={a,b}"]);
    }

    #[test]
    fn test_nested_brackets() {
        let opts = Cursor::new("[label={[red]above:x}]").options().unwrap();
        assert_eq!(opts.raw, "[label={[red]above:x}]");
    }
}
