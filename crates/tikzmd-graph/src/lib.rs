//! Graph model for TikZ diagrams.
//!
//! [`Graph`] is an immutable, copy-on-write value holding nodes, edges and
//! paths. [`picture_to_graph`] builds one from a parsed `tikzpicture`.
//!
//! # Example
//!
//! ```
//! use tikzmd_graph::picture_to_graph;
//! use tikzmd_parser::parse_tikz_picture;
//!
//! let picture = parse_tikz_picture(r"\node (0) at (0,0) {A}; \draw (0) to (1);", None);
//! let graph = picture_to_graph(&picture);
//! assert_eq!(graph.num_nodes(), 2);
//! assert_eq!(graph.num_edges(), 1);
//! ```

mod adapter;
mod graph;
mod validation;

pub use adapter::picture_to_graph;
pub use graph::{EdgeData, Graph, NodeData, PathData};
pub use validation::{DEFAULT_STYLE_NAME, is_valid_style_name, suggest_style_name};
