//! Document parser and serializer.
//!
//! [`parse_document`] splits arbitrary LaTeX text into raw-text and
//! environment segments; [`serialize_document`] is its exact inverse.

use serde::Serialize;

use crate::ast::{EnvironmentBlock, Range, Segment, TikzDocument};
use crate::circuit::{CircuitikzPicture, parse_circuitikz};
use crate::error::ParseError;
use crate::picture::{TikzPicture, parse_tikz_picture};
use crate::scanner::{SUPPORTED_ENVIRONMENTS, begin_marker, end_marker, find_environment_bounds};

/// Result of parsing a document.
///
/// Errors describe regions that could not be recognized; those regions are
/// still present in `document` as raw text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedDocument {
    pub document: TikzDocument,
    pub errors: Vec<ParseError>,
}

/// Deep parse of one environment block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "env", content = "picture")]
pub enum ParsedEnvironment {
    #[serde(rename = "tikzpicture")]
    Tikz(TikzPicture),
    #[serde(rename = "circuitikz")]
    Circuit(CircuitikzPicture),
}

/// Parse `source` into an ordered list of segments.
///
/// Always succeeds: `serialize_document(&parse_document(s).document) == s`
/// for every input.
#[must_use]
pub fn parse_document(source: &str) -> ParsedDocument {
    let mut segments = Vec::new();
    let mut index = 0;

    while index < source.len() {
        let next = SUPPORTED_ENVIRONMENTS
            .iter()
            .filter_map(|env| {
                find_environment_bounds(source, env, index).map(|(start, end)| (*env, start, end))
            })
            .min_by_key(|&(_, start, _)| start);

        let Some((env, start, end)) = next else {
            segments.push(raw_segment(source, index, source.len()));
            break;
        };

        if start > index {
            segments.push(raw_segment(source, index, start));
        }
        segments.push(Segment::Environment(environment_block(
            &source[start..end],
            env,
            start,
        )));
        index = end;
    }

    let errors = unterminated_environments(&segments);
    for error in &errors {
        tracing::debug!(offset = error.offset, "{}", error.message);
    }

    ParsedDocument {
        document: TikzDocument {
            segments,
            source_len: source.len(),
        },
        errors,
    }
}

/// Concatenate segment texts in order.
#[must_use]
pub fn serialize_document(document: &TikzDocument) -> String {
    let mut out = String::with_capacity(document.source_len);
    for segment in &document.segments {
        segment.write_to(&mut out);
    }
    out
}

impl TikzDocument {
    /// Deep-parse every supported environment block in document order.
    #[must_use]
    pub fn pictures(&self) -> Vec<ParsedEnvironment> {
        self.environments()
            .filter_map(|block| match block.env.as_str() {
                "tikzpicture" => Some(ParsedEnvironment::Tikz(parse_tikz_picture(
                    &block.body,
                    block.options_raw(),
                ))),
                "circuitikz" => Some(ParsedEnvironment::Circuit(parse_circuitikz(&block.body))),
                _ => None,
            })
            .collect()
    }
}

fn raw_segment(source: &str, start: usize, end: usize) -> Segment {
    Segment::RawText {
        text: source[start..end].to_owned(),
        range: Range::new(start, end),
    }
}

/// Split a located environment span into header, body and footer.
fn environment_block(text: &str, env: &str, offset: usize) -> EnvironmentBlock {
    let begin = begin_marker(env);
    let end = end_marker(env);

    let footer_start = text.len() - end.len();
    let mut header_len = begin.len();
    if let Some(options_len) = option_list_len(&text[header_len..footer_start]) {
        header_len += options_len;
    }

    EnvironmentBlock {
        env: env.to_owned(),
        header: text[..header_len].to_owned(),
        body: text[header_len..footer_start].to_owned(),
        footer: text[footer_start..].to_owned(),
        range: Range::new(offset, offset + text.len()),
    }
}

/// Length of a balanced `[...]` list at the very start of `text`.
fn option_list_len(text: &str) -> Option<usize> {
    if !text.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Report `\begin{env}` markers left inside raw text: those regions were
/// never closed and degraded to raw text.
///
/// Only the first marker of each environment per raw segment is reported.
/// Later markers of the same environment were swallowed by it, even if they
/// are closed themselves.
fn unterminated_environments(segments: &[Segment]) -> Vec<ParseError> {
    let mut errors = Vec::new();
    for segment in segments {
        let Segment::RawText { text, range } = segment else {
            continue;
        };
        for env in SUPPORTED_ENVIRONMENTS {
            let marker = begin_marker(env);
            let mut positions = text.match_indices(&marker).map(|(pos, _)| pos);
            let Some(first) = positions.next() else {
                continue;
            };
            let message = match positions.count() {
                0 => format!("unterminated {marker}"),
                swallowed => {
                    format!("unterminated {marker}; {swallowed} later {marker} swallowed as raw text")
                }
            };
            errors.push(ParseError::new(message, range.start + first));
        }
    }
    errors.sort_by_key(|e| e.offset);
    errors
}
