//! Conversion of a parsed [`TikzPicture`] into a [`Graph`].
//!
//! Only `\node` statements and `\draw ... to ...` chains contribute; every
//! other statement is ignored.

use std::collections::{HashMap, HashSet};

use tikzmd_parser::{DrawSegment, NodeStmt, PathChain, PathRef, TikzPicture, TikzStmt};

use crate::graph::{EdgeData, Graph, NodeData, PathData};

/// Explicit integer names are used as node ids verbatim.
fn numeric_id(name: &str) -> Option<usize> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Strip the outer braces from a raw label.
fn label_text(label_raw: Option<&str>) -> &str {
    label_raw
        .and_then(|raw| raw.strip_prefix('{'))
        .and_then(|raw| raw.strip_suffix('}'))
        .unwrap_or("")
}

/// Literal ids named anywhere in the adapted statements.
fn reserved_ids<'a>(stmts: impl Iterator<Item = &'a TikzStmt>) -> HashSet<usize> {
    let mut reserved = HashSet::new();
    for stmt in stmts {
        let names: Vec<&str> = match stmt {
            TikzStmt::Node(node) => node.name.as_deref().into_iter().collect(),
            TikzStmt::Draw(chain) => std::iter::once(&chain.source)
                .chain(chain.segments.iter().map(DrawSegment::target))
                .filter_map(|reference| reference.name.as_deref())
                .collect(),
            TikzStmt::Coordinate(_) | TikzStmt::Path(_) => Vec::new(),
        };
        reserved.extend(names.into_iter().filter_map(numeric_id));
    }
    reserved
}

/// Accumulates graph snapshots while walking statements.
struct GraphBuilder {
    graph: Graph,
    ids: HashMap<String, usize>,
    reserved: HashSet<usize>,
}

impl GraphBuilder {
    fn new(reserved: HashSet<usize>) -> Self {
        Self {
            graph: Graph::new(),
            ids: HashMap::new(),
            reserved,
        }
    }

    /// Next unused id that no literal name claims.
    fn fresh_id(&self) -> usize {
        let mut id = self.graph.fresh_node_id();
        while self.reserved.contains(&id) {
            id += 1;
        }
        id
    }

    fn id_for_name(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = numeric_id(name).unwrap_or_else(|| self.fresh_id());
        self.ids.insert(name.to_owned(), id);
        id
    }

    fn add_node(&mut self, stmt: &NodeStmt) {
        let id = match stmt.name.as_deref() {
            Some(name) => self.id_for_name(name),
            None => self.fresh_id(),
        };
        let data = NodeData::new(id)
            .with_coord(stmt.coord.unwrap_or_default())
            .with_label(label_text(stmt.label_raw.as_deref()))
            .with_name(stmt.name.clone());
        self.graph = self.graph.with_node(data);
    }

    /// Resolve a chain endpoint, creating a default node on first reference.
    fn resolve(&mut self, reference: &PathRef) -> usize {
        let id = match reference.name.as_deref() {
            Some(name) => self.id_for_name(name),
            None => self.fresh_id(),
        };
        if !self.graph.contains_node(id) {
            let data = NodeData::new(id)
                .with_coord(reference.coord().unwrap_or_default())
                .with_name(reference.name.clone());
            self.graph = self.graph.with_node(data);
        }
        id
    }

    fn add_chain(&mut self, chain: &PathChain) {
        if chain.segments.is_empty() {
            self.resolve(&chain.source);
            return;
        }

        let path_id = self.graph.fresh_path_id();
        let mut path = PathData::new(path_id);
        let mut source = self.resolve(&chain.source);

        for segment in &chain.segments {
            let target = self.resolve(segment.target());
            let edge = EdgeData {
                id: self.graph.fresh_edge_id(),
                source,
                target,
                path: path_id,
            };
            self.graph = self.graph.with_edge(edge);
            path = path.with_edge(edge.id);
            source = target;
        }

        self.graph = self.graph.with_path(path);
    }

    fn add_stmts<'a>(&mut self, stmts: impl Iterator<Item = &'a TikzStmt>) {
        for stmt in stmts {
            match stmt {
                TikzStmt::Node(node) => self.add_node(node),
                TikzStmt::Draw(chain) => self.add_chain(chain),
                TikzStmt::Coordinate(_) | TikzStmt::Path(_) => {}
            }
        }
    }
}

/// Build a graph from a parsed picture.
///
/// Layers are processed in order when present, otherwise the flat statement
/// list. A chain `a to b to c` yields edges `a -> b` and `b -> c`, grouped
/// under one path.
#[must_use]
pub fn picture_to_graph(picture: &TikzPicture) -> Graph {
    let mut builder = GraphBuilder::new(reserved_ids(picture.all_stmts()));
    builder.add_stmts(picture.all_stmts());
    tracing::debug!(
        nodes = builder.graph.num_nodes(),
        edges = builder.graph.num_edges(),
        paths = builder.graph.num_paths(),
        "Built graph from picture"
    );
    builder.graph
}
