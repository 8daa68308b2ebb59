//! Copy-on-write graph of nodes, edges and paths.
//!
//! # Architecture
//!
//! Nodes, edges and paths live in three id-keyed arenas behind [`Arc`].
//! Cloning a [`Graph`] is cheap; every `with_*` update returns a new graph
//! and copies only the arena it touches, so earlier snapshots are never
//! observed partially mutated.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tikzmd_parser::Coord;

/// Node payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NodeData {
    pub id: usize,
    pub coord: Coord,
    /// Label text without the surrounding braces.
    pub label: String,
    /// Source name (`(a)` in `\node (a) ...`), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NodeData {
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_coord(mut self, coord: Coord) -> Self {
        self.coord = coord;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

/// Directed edge between two node ids, belonging to one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeData {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    pub path: usize,
}

/// Ordered edges drawn by one draw chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PathData {
    pub id: usize,
    pub edges: Vec<usize>,
}

impl PathData {
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            edges: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_edge(mut self, edge: usize) -> Self {
        self.edges.push(edge);
        self
    }
}

/// Immutable graph value.
///
/// Every edge's `source` and `target` refer to a node present in the graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Graph {
    nodes: Arc<BTreeMap<usize, NodeData>>,
    edges: Arc<BTreeMap<usize, EdgeData>>,
    paths: Arc<BTreeMap<usize, PathData>>,
}

fn next_id<T>(map: &BTreeMap<usize, T>) -> usize {
    map.keys().next_back().map_or(0, |id| id + 1)
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn node(&self, id: usize) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: usize) -> Option<&EdgeData> {
        self.edges.get(&id)
    }

    pub fn path(&self, id: usize) -> Option<&PathData> {
        self.paths.get(&id)
    }

    pub fn contains_node(&self, id: usize) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.nodes.values()
    }

    /// Edges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeData> {
        self.edges.values()
    }

    /// Paths in ascending id order.
    pub fn paths(&self) -> impl Iterator<Item = &PathData> {
        self.paths.values()
    }

    /// Smallest id greater than every node id in use.
    pub fn fresh_node_id(&self) -> usize {
        next_id(&self.nodes)
    }

    pub fn fresh_edge_id(&self) -> usize {
        next_id(&self.edges)
    }

    pub fn fresh_path_id(&self) -> usize {
        next_id(&self.paths)
    }

    /// New graph with `data` inserted, replacing any node with the same id.
    #[must_use]
    pub fn with_node(&self, data: NodeData) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.nodes).insert(data.id, data);
        next
    }

    /// New graph with `data` inserted.
    ///
    /// Endpoints that are not yet in the graph are added with default data.
    #[must_use]
    pub fn with_edge(&self, data: EdgeData) -> Self {
        let mut next = self.clone();
        for endpoint in [data.source, data.target] {
            if !next.contains_node(endpoint) {
                Arc::make_mut(&mut next.nodes).insert(endpoint, NodeData::new(endpoint));
            }
        }
        Arc::make_mut(&mut next.edges).insert(data.id, data);
        next
    }

    /// New graph with `data` inserted, replacing any path with the same id.
    #[must_use]
    pub fn with_path(&self, data: PathData) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.paths).insert(data.id, data);
        next
    }
}
