// THEORY:
// The `grid_graph` module lifts the boolean walkability grid into the shared
// graph container: one node per walkable cell, one weight-1.0 edge per pair
// of 4-adjacent walkable cells. Blocked cells get no node and therefore can
// never appear on a path.
//
// A grid node's id is derived from its coordinates (`id = y * grid_width +
// x`), and the id is the sole identity — there is no separate
// coordinate-based equality that could disagree with the container's
// id-keyed storage.

use crate::core_modules::graph::{Graph, GraphEdge, GraphNode, NodeId};
use crate::core_modules::grid::WalkabilityGrid;
use tracing::debug;

/// A walkable cell in the grid graph. The id encodes the coordinates, so two
/// nodes are equal exactly when their cells coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridNode {
    id: NodeId,
    pub x: u32,
    pub y: u32,
}

impl GridNode {
    /// Canonical id for a cell: row-major index in the grid.
    pub fn cell_id(x: u32, y: u32, grid_width: u32) -> NodeId {
        y * grid_width + x
    }

    pub fn new(x: u32, y: u32, grid_width: u32) -> Self {
        Self {
            id: Self::cell_id(x, y, grid_width),
            x,
            y,
        }
    }
}

impl GraphNode for GridNode {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// A uniform-cost grid move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridEdge {
    pub weight: f64,
}

impl GridEdge {
    pub fn unit() -> Self {
        Self { weight: 1.0 }
    }
}

impl GraphEdge for GridEdge {
    fn weight(&self) -> f64 {
        self.weight
    }
}

pub type GridGraph = Graph<GridNode, GridEdge>;

// Right, down, left, up.
pub const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Builds the 4-connected graph over all walkable cells.
pub fn build_grid_graph(grid: &WalkabilityGrid) -> GridGraph {
    let mut graph = GridGraph::new();
    let width = grid.width();

    for y in 0..grid.height() {
        for x in 0..width {
            if grid.is_walkable(x as i64, y as i64) {
                graph.add_node(GridNode::new(x, y, width));
            }
        }
    }

    for y in 0..grid.height() {
        for x in 0..width {
            if !grid.is_walkable(x as i64, y as i64) {
                continue;
            }
            let id = GridNode::cell_id(x, y, width);
            for (dx, dy) in DIRECTIONS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if grid.is_walkable(nx, ny) {
                    let neighbor_id = GridNode::cell_id(nx as u32, ny as u32, width);
                    graph.add_edge(id, neighbor_id, GridEdge::unit());
                }
            }
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built grid graph"
    );
    graph
}
