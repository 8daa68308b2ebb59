//! Document-level syntax tree.
//!
//! A [`TikzDocument`] is a flat, ordered list of [`Segment`]s whose texts
//! concatenate back to the original source exactly.

use serde::Serialize;

/// Half-open byte range `[start, end)` into the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the range in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Shift the range by `offset` bytes.
    #[must_use]
    pub fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// A recognized `\begin{env}...\end{env}` region.
///
/// `header + body + footer` reproduces the original span byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentBlock {
    /// Environment name (e.g., `tikzpicture`, `circuitikz`).
    pub env: String,
    /// `\begin{env}` plus an immediately following `[...]` option list.
    pub header: String,
    /// Raw text between header and footer.
    pub body: String,
    /// `\end{env}`.
    pub footer: String,
    pub range: Range,
}

impl EnvironmentBlock {
    /// Option list carried in the header (`[scale=1]`), if any.
    #[must_use]
    pub fn options_raw(&self) -> Option<&str> {
        let begin_len = "\\begin{}".len() + self.env.len();
        let rest = self.header.get(begin_len..)?;
        (!rest.is_empty()).then_some(rest)
    }

    /// Byte offset of the body in the source document.
    #[must_use]
    pub fn body_offset(&self) -> usize {
        self.range.start + self.header.len()
    }
}

/// One contiguous piece of a [`TikzDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Segment {
    /// Untouched source text.
    RawText { text: String, range: Range },
    /// Generic `\command[...]{...}` statement kept verbatim.
    Command {
        name: String,
        raw: String,
        range: Range,
    },
    /// A supported environment.
    Environment(EnvironmentBlock),
}

impl Segment {
    /// Source range covered by this segment.
    #[must_use]
    pub fn range(&self) -> Range {
        match self {
            Self::RawText { range, .. } | Self::Command { range, .. } => *range,
            Self::Environment(block) => block.range,
        }
    }

    /// Append the exact source text of this segment to `out`.
    pub fn write_to(&self, out: &mut String) {
        match self {
            Self::RawText { text, .. } => out.push_str(text),
            Self::Command { raw, .. } => out.push_str(raw),
            Self::Environment(block) => {
                out.push_str(&block.header);
                out.push_str(&block.body);
                out.push_str(&block.footer);
            }
        }
    }
}

/// Parsed document: ordered, contiguous, non-overlapping segments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TikzDocument {
    pub segments: Vec<Segment>,
    /// Length of the source the document was parsed from.
    pub source_len: usize,
}

impl TikzDocument {
    /// Iterate over the environment blocks in document order.
    pub fn environments(&self) -> impl Iterator<Item = &EnvironmentBlock> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Environment(block) => Some(block),
            _ => None,
        })
    }
}
