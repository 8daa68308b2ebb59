//! `tikzpicture` statement parser.
//!
//! Extracts `\node`, `\coordinate`, `\draw` and `\path` statements from a
//! picture body, optionally grouped into `pgfonlayer` layers. Statements that
//! match none of these forms are skipped: this is a best-effort extractor, not
//! a validating parser.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::ast::Range;
use crate::cursor::{Coord, Cursor, OptionList, PathRef};
use crate::split::split_statements;

static LAYER_BEGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\begin\{pgfonlayer\}\{([^}]+)\}").unwrap());

static LAYER_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n?\s*\\end\{pgfonlayer\}").unwrap());

/// `\node[opts] (name) at (x, y) {label};`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStmt {
    pub options: Option<OptionList>,
    pub name: Option<String>,
    pub coord: Option<Coord>,
    /// Label including its braces.
    pub label_raw: Option<String>,
    pub range: Range,
}

/// `\coordinate[opts] (name) at (x, y);`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateStmt {
    pub options: Option<OptionList>,
    pub name: Option<String>,
    pub coord: Option<Coord>,
    pub range: Range,
}

/// Inline `node[opts]{label}` on a `to` segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeNode {
    pub options: Option<OptionList>,
    pub label_raw: Option<String>,
}

/// One step of a draw chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum DrawSegment {
    /// `to[opts] node[...]{...} (target)`
    To {
        options: Option<OptionList>,
        edge_node: Option<EdgeNode>,
        target: PathRef,
    },
    /// `.. controls (c1) and (c2) .. (target)`
    Bezier {
        options: Option<OptionList>,
        control1: PathRef,
        control2: Option<PathRef>,
        target: PathRef,
    },
}

impl DrawSegment {
    #[must_use]
    pub fn target(&self) -> &PathRef {
        match self {
            Self::To { target, .. } | Self::Bezier { target, .. } => target,
        }
    }
}

/// Source reference followed by an ordered list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathChain {
    pub options: Option<OptionList>,
    pub source: PathRef,
    pub segments: Vec<DrawSegment>,
    pub range: Range,
}

/// A recognized picture statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "stmt")]
pub enum TikzStmt {
    Node(NodeStmt),
    Coordinate(CoordinateStmt),
    Draw(PathChain),
    Path(PathChain),
}

impl TikzStmt {
    #[must_use]
    pub fn range(&self) -> Range {
        match self {
            Self::Node(stmt) => stmt.range,
            Self::Coordinate(stmt) => stmt.range,
            Self::Draw(chain) | Self::Path(chain) => chain.range,
        }
    }
}

/// `\begin{pgfonlayer}{name}...\end{pgfonlayer}` contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TikzLayer {
    pub name: String,
    pub stmts: Vec<TikzStmt>,
    /// Original text inside the layer.
    pub raw: String,
}

/// Parsed `tikzpicture` body.
///
/// Either `layers` or `stmts` is populated, never both.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TikzPicture {
    pub options_raw: Option<String>,
    pub layers: Vec<TikzLayer>,
    pub stmts: Vec<TikzStmt>,
}

impl TikzPicture {
    /// All statements in layer order, or the flat top level.
    pub fn all_stmts(&self) -> impl Iterator<Item = &TikzStmt> {
        self.layers
            .iter()
            .flat_map(|layer| layer.stmts.iter())
            .chain(self.stmts.iter())
    }
}

/// Parse a `tikzpicture` body.
///
/// Statement ranges are byte offsets relative to `body`.
#[must_use]
pub fn parse_tikz_picture(body: &str, options_raw: Option<&str>) -> TikzPicture {
    let layers = parse_layers(body);
    let stmts = if layers.is_empty() {
        parse_stmts(body, 0)
    } else {
        Vec::new()
    };
    TikzPicture {
        options_raw: options_raw.map(str::to_owned),
        layers,
        stmts,
    }
}

fn parse_layers(body: &str) -> Vec<TikzLayer> {
    let mut layers = Vec::new();
    let mut search_from = 0;

    while let Some(caps) = LAYER_BEGIN.captures_at(body, search_from) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let inner_start = whole.end();
        let Some(end) = LAYER_END.find_at(body, inner_start) else {
            tracing::trace!(layer = name.as_str(), "Unterminated pgfonlayer, stopping");
            break;
        };

        let inner = &body[inner_start..end.start()];
        layers.push(TikzLayer {
            name: name.as_str().to_owned(),
            stmts: parse_stmts(inner, inner_start),
            raw: inner.to_owned(),
        });
        search_from = end.end();
    }

    layers
}

fn parse_stmts(text: &str, base: usize) -> Vec<TikzStmt> {
    split_statements(text)
        .into_iter()
        .filter_map(|stmt| {
            let range = Range::new(stmt.start, stmt.start + stmt.text.len()).shifted(base);
            let parsed = parse_stmt(stmt.text, range);
            if parsed.is_none() {
                tracing::trace!(offset = range.start, "Skipping unrecognized statement");
            }
            parsed
        })
        .collect()
}

fn parse_stmt(text: &str, range: Range) -> Option<TikzStmt> {
    parse_node(text, range)
        .map(TikzStmt::Node)
        .or_else(|| parse_coordinate(text, range).map(TikzStmt::Coordinate))
        .or_else(|| parse_chain(text, "draw", range).map(TikzStmt::Draw))
        .or_else(|| parse_chain(text, "path", range).map(TikzStmt::Path))
}

/// Consume an optional `at (x, y)` clause.
fn parse_at(cursor: &mut Cursor<'_>) -> Option<Coord> {
    if cursor.eat_keyword("at") {
        cursor.path_ref().and_then(|r| r.coord())
    } else {
        None
    }
}

fn parse_node(text: &str, range: Range) -> Option<NodeStmt> {
    let mut cursor = Cursor::new(text);
    if !cursor.eat_command("node") {
        return None;
    }
    let options = cursor.options();
    let name = cursor.path_ref().and_then(|r| r.name);
    let coord = parse_at(&mut cursor);
    let label_raw = cursor.group();

    Some(NodeStmt {
        options,
        name,
        coord,
        label_raw,
        range,
    })
}

fn parse_coordinate(text: &str, range: Range) -> Option<CoordinateStmt> {
    let mut cursor = Cursor::new(text);
    if !cursor.eat_command("coordinate") {
        return None;
    }
    let options = cursor.options();
    let name = cursor.path_ref().and_then(|r| r.name);
    let coord = parse_at(&mut cursor);

    Some(CoordinateStmt {
        options,
        name,
        coord,
        range,
    })
}

fn parse_chain(text: &str, command: &str, range: Range) -> Option<PathChain> {
    let mut cursor = Cursor::new(text);
    if !cursor.eat_command(command) {
        return None;
    }
    let options = cursor.options();
    let source = cursor.path_ref()?;

    let mut segments = Vec::new();
    loop {
        let segment = if cursor.eat_keyword("to") {
            parse_to_segment(&mut cursor)
        } else if cursor.eat("..") {
            parse_bezier_segment(&mut cursor)
        } else {
            None
        };
        match segment {
            Some(segment) => segments.push(segment),
            None => break,
        }
    }

    Some(PathChain {
        options,
        source,
        segments,
        range,
    })
}

fn parse_to_segment(cursor: &mut Cursor<'_>) -> Option<DrawSegment> {
    let options = cursor.options();
    let edge_node = cursor.eat_keyword("node").then(|| EdgeNode {
        options: cursor.options(),
        label_raw: cursor.group(),
    });
    let target = cursor.path_ref()?;
    Some(DrawSegment::To {
        options,
        edge_node,
        target,
    })
}

fn parse_bezier_segment(cursor: &mut Cursor<'_>) -> Option<DrawSegment> {
    if !cursor.eat_keyword("controls") {
        return None;
    }
    let control1 = cursor.path_ref()?;
    let control2 = if cursor.eat_keyword("and") {
        Some(cursor.path_ref()?)
    } else {
        None
    };
    if !cursor.eat("..") {
        return None;
    }
    let target = cursor.path_ref()?;
    Some(DrawSegment::Bezier {
        options: None,
        control1,
        control2,
        target,
    })
}
