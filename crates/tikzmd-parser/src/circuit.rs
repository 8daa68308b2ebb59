//! `circuitikz` statement parser.
//!
//! Parses `\draw[...] (src) <segments>;` chains where each segment is either
//! a plain wire (`-- (target)`) or a component (`to[R=1k] (target)`).

use serde::Serialize;

use crate::ast::Range;
use crate::cursor::{Cursor, OptionList, PathRef};
use crate::split::split_statements;

/// Component used when a `to` segment names none.
pub const DEFAULT_COMPONENT: &str = "short";

/// One step of a circuit draw chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum CircuitSegment {
    /// `-- (target)`
    Wire { target: PathRef, range: Range },
    /// `to[comp, ...] (target)`
    Component {
        /// First option item as written, e.g. `R`, `C=1u`, `D*`, `short`.
        comp: String,
        options: Option<OptionList>,
        target: PathRef,
        range: Range,
    },
}

impl CircuitSegment {
    #[must_use]
    pub fn target(&self) -> &PathRef {
        match self {
            Self::Wire { target, .. } | Self::Component { target, .. } => target,
        }
    }

    /// Component type without an inline `=label` (`R=R` gives `R`).
    ///
    /// `None` for wires.
    #[must_use]
    pub fn component_kind(&self) -> Option<&str> {
        match self {
            Self::Wire { .. } => None,
            Self::Component { comp, .. } => {
                Some(comp.split_once('=').map_or(comp.as_str(), |(kind, _)| kind.trim()))
            }
        }
    }
}

/// `\draw` chain inside a `circuitikz` environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawChain {
    pub options: Option<OptionList>,
    pub source: PathRef,
    pub segments: Vec<CircuitSegment>,
    pub range: Range,
}

/// Parsed `circuitikz` body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CircuitikzPicture {
    pub stmts: Vec<DrawChain>,
}

/// Parse a `circuitikz` body. Ranges are relative to `body`.
#[must_use]
pub fn parse_circuitikz(body: &str) -> CircuitikzPicture {
    let stmts = split_statements(body)
        .into_iter()
        .filter_map(|stmt| parse_draw_chain(stmt.text, stmt.start))
        .collect();
    CircuitikzPicture { stmts }
}

/// First item of a `to[...]` option list, kept verbatim.
fn component_name(options: Option<&OptionList>) -> String {
    options
        .and_then(|opts| opts.items().first().copied())
        .filter(|comp| !comp.is_empty())
        .unwrap_or(DEFAULT_COMPONENT)
        .to_owned()
}

fn parse_draw_chain(text: &str, base: usize) -> Option<DrawChain> {
    let mut cursor = Cursor::new(text);
    if !cursor.eat_command("draw") {
        return None;
    }
    let options = cursor.options();
    let source = cursor.path_ref()?;

    let mut segments = Vec::new();
    while !cursor.is_at_end() {
        cursor.skip_ws();
        let seg_start = base + cursor.pos();

        if cursor.eat("--") {
            cursor.eat("++");
            let Some(target) = cursor.path_ref() else {
                break;
            };
            segments.push(CircuitSegment::Wire {
                target,
                range: Range::new(seg_start, base + cursor.pos()),
            });
            continue;
        }

        if !cursor.eat_keyword("to") {
            break;
        }
        let seg_options = cursor.options();
        let comp = component_name(seg_options.as_ref());
        cursor.eat("++");
        let Some(target) = cursor.path_ref() else {
            break;
        };
        segments.push(CircuitSegment::Component {
            comp,
            options: seg_options,
            target,
            range: Range::new(seg_start, base + cursor.pos()),
        });
    }

    Some(DrawChain {
        options,
        source,
        segments,
        range: Range::new(base, base + text.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_components_and_wires() {
        let body = r"
            \draw (0,3) to[V, l_=$V_s$] (0,0);
            \draw (0,3) -- (1,3);
            \draw (1,3) to[R=R] (3,3);
        ";
        let pic = parse_circuitikz(body);
        assert_eq!(pic.stmts.len(), 3);

        let CircuitSegment::Component { comp, options, .. } = &pic.stmts[0].segments[0] else {
            panic!("expected component");
        };
        assert_eq!(comp, "V");
        assert_eq!(options.as_ref().unwrap().raw, "[V, l_=$V_s$]");

        assert!(matches!(
            pic.stmts[1].segments[0],
            CircuitSegment::Wire { .. }
        ));

        let CircuitSegment::Component { comp, .. } = &pic.stmts[2].segments[0] else {
            panic!("expected component");
        };
        assert_eq!(comp, "R=R");
        assert_eq!(pic.stmts[2].segments[0].component_kind(), Some("R"));
        assert_eq!(pic.stmts[1].segments[0].component_kind(), None);
    }

    #[test]
    fn test_default_component_is_short() {
        let pic = parse_circuitikz(r"\draw (0,0) to (1,0) to[] (2,0);");
        let comps: Vec<&str> = pic.stmts[0]
            .segments
            .iter()
            .map(|s| match s {
                CircuitSegment::Component { comp, .. } => comp.as_str(),
                CircuitSegment::Wire { .. } => "wire",
            })
            .collect();
        assert_eq!(comps, vec!["short", "short"]);
    }

    #[test]
    fn test_mixed_chain_with_relative_targets() {
        let pic = parse_circuitikz(r"\draw[thick] (0,0) to[C] ++(2,0) -- ++(0,-2) to[L, *-*] (0,-2) -- (0,0);");
        let chain = &pic.stmts[0];
        assert_eq!(chain.options.as_ref().unwrap().raw, "[thick]");
        assert_eq!(chain.segments.len(), 4);
        assert_eq!(chain.segments[1].target().raw, "(0,-2)");
        assert!(matches!(&chain.segments[2], CircuitSegment::Component { comp, .. } if comp == "L"));
        assert!(matches!(chain.segments[3], CircuitSegment::Wire { .. }));
    }

    #[test]
    fn test_segment_ranges() {
        let body = r"\draw (a) -- (b);";
        let pic = parse_circuitikz(body);
        let CircuitSegment::Wire { range, .. } = &pic.stmts[0].segments[0] else {
            panic!("expected wire");
        };
        assert_eq!(&body[range.start..range.end], "-- (b)");
        assert_eq!(pic.stmts[0].range, Range::new(0, body.len()));
    }

    #[test]
    fn test_non_draw_statements_ignored() {
        let pic = parse_circuitikz(r"\node at (0,0) {x}; \draw (a) to[R] (b);");
        assert_eq!(pic.stmts.len(), 1);
    }

    #[test]
    fn test_draw_without_source_ignored() {
        let pic = parse_circuitikz(r"\draw to[R] (b);");
        assert!(pic.stmts.is_empty());
    }

    #[test]
    fn test_chain_stops_on_unknown_token() {
        let pic = parse_circuitikz(r"\draw (a) to[R] (b) node[ground] {};");
        assert_eq!(pic.stmts[0].segments.len(), 1);
    }
}
