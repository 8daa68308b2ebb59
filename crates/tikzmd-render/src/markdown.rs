//! `tikz` fenced code blocks in Markdown.
//!
//! [`extract_tikz_fences`] locates the fences; [`render_fence_markup`] turns
//! a fence's compile state into the HTML shown in its place.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::manager::CompileState;

/// Fence info string that marks TikZ content.
const TIKZ_LANGUAGE: &str = "tikz";

/// A ```` ```tikz ```` fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TikzFence {
    /// Fence body without the fence lines.
    pub content: String,
    /// Byte range of the whole fence in the source.
    pub range: Range<usize>,
}

fn is_tikz_info(info: &str) -> bool {
    info.split_whitespace()
        .next()
        .is_some_and(|lang| lang.eq_ignore_ascii_case(TIKZ_LANGUAGE))
}

/// Find every `tikz` fence in document order.
#[must_use]
pub fn extract_tikz_fences(markdown: &str) -> Vec<TikzFence> {
    let mut fences = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for (event, range) in Parser::new_ext(markdown, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if is_tikz_info(&info) => {
                current = Some((String::new(), range.start));
            }
            Event::Text(text) => {
                if let Some((content, _)) = current.as_mut() {
                    content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((content, start)) = current.take() {
                    fences.push(TikzFence {
                        content,
                        range: start..range.end,
                    });
                }
            }
            _ => {}
        }
    }

    tracing::debug!(count = fences.len(), "Extracted tikz fences");
    fences
}

/// Escape text for HTML content and attribute values.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// HTML for one fence.
///
/// Resolved keys render an image, failed keys the escaped error message, and
/// anything else a pending placeholder. Every variant carries the key in a
/// `data-tikz-key` attribute.
#[must_use]
pub fn render_fence_markup(key: &str, state: &CompileState) -> String {
    let key = escape_html(key);
    match state {
        CompileState::Resolved(path) => format!(
            r#"<div class="tikzmd-block" data-tikz-key="{key}"><img src="{}" alt="TikZ diagram" /></div>"#,
            escape_html(&path.display().to_string())
        ),
        CompileState::Failed(message) => format!(
            r#"<div class="tikzmd-block tikzmd-error" data-tikz-key="{key}">{}</div>"#,
            escape_html(message)
        ),
        CompileState::Absent | CompileState::Pending => format!(
            r#"<div class="tikzmd-block tikzmd-pending" data-tikz-key="{key}">Compiling TikZ…</div>"#
        ),
    }
}
