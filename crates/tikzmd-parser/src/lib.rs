//! Permissive, round-trip preserving parser for TikZ documents.
//!
//! This crate extracts structured diagram data from free-form LaTeX:
//! - [`parse_document`] splits text into raw-text and environment segments
//!   (`tikzpicture`, `circuitikz`); [`serialize_document`] reproduces the
//!   input exactly
//! - [`parse_tikz_picture`] extracts `\node`, `\coordinate`, `\draw` and
//!   `\path` statements, including `pgfonlayer` layers
//! - [`parse_circuitikz`] extracts circuit draw chains of wires and components
//!
//! Unrecognized text is preserved verbatim, never validated.
//!
//! # Example
//!
//! ```
//! use tikzmd_parser::{parse_document, serialize_document};
//!
//! let source = "Intro\n\\begin{tikzpicture}\\node (a) at (0,0) {A};\\end{tikzpicture}";
//! let parsed = parse_document(source);
//! assert_eq!(serialize_document(&parsed.document), source);
//! assert_eq!(parsed.document.pictures().len(), 1);
//! ```

mod ast;
mod circuit;
mod cursor;
mod document;
mod error;
mod picture;
mod scanner;
mod split;

pub use ast::{EnvironmentBlock, Range, Segment, TikzDocument};
pub use circuit::{
    CircuitSegment, CircuitikzPicture, DEFAULT_COMPONENT, DrawChain, parse_circuitikz,
};
pub use cursor::{Coord, OptionList, PathRef};
pub use document::{ParsedDocument, ParsedEnvironment, parse_document, serialize_document};
pub use error::ParseError;
pub use picture::{
    CoordinateStmt, DrawSegment, EdgeNode, NodeStmt, PathChain, TikzLayer, TikzPicture, TikzStmt,
    parse_tikz_picture,
};
pub use scanner::{SUPPORTED_ENVIRONMENTS, find_environment_bounds};
pub use split::{Statement, split_statements};
