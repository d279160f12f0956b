// THEORY:
// The `pathfinder` runs A* over the grid graph. A* is best-first search
// guided by `f = g + h`: `g` is the accumulated edge cost from the start
// and `h` is the Euclidean distance to the goal in grid units. On a
// uniform-cost 4-connected grid the Euclidean heuristic is admissible and
// consistent, so the first time the goal is popped the path is optimal.
//
// Key architectural principles & algorithm steps:
// 1.  **Endpoint snapping**: callers pass pixel coordinates. Each endpoint
//     is converted to its grid cell; a blocked cell snaps to the nearest
//     walkable one found on expanding square perimeters. If no walkable
//     cell exists at all, the result is the empty path.
// 2.  **Open set with stale entries**: the open set is a binary heap. When
//     a strictly better `g` is found for a queued cell the new entry is
//     pushed alongside the old one; the stale entry is recognized and
//     skipped when popped because its cell is already closed. This keeps
//     every heap operation O(log n) instead of scanning for duplicates.
// 3.  **Explicit emptiness**: an unreachable goal is not an error. The
//     search exhausts the open set and returns an empty path, which callers
//     can distinguish from "no search attempted."
//
// Neighbor expansion reads the walkability grid directly and confirms the
// move against the graph's edge store, so only edges the grid-graph builder
// created are ever traversed.

use crate::core_modules::grid::WalkabilityGrid;
use crate::core_modules::grid_graph::{DIRECTIONS, GridGraph, GridNode};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tunables for the search.
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Maximum radius, in cells, of the nearest-walkable-cell search around
    /// a blocked endpoint. `None` means the larger grid dimension.
    pub search_bound: Option<u32>,
}

/// An ordered sequence of grid-space cell coordinates from start to end,
/// plus the cell size used to build the grid. Empty when no path exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    /// Cells from start to end; empty if the goal is unreachable.
    pub cells: Vec<(u32, u32)>,
    /// Grid cell side length in pixels, for rendering back onto the image.
    pub node_size: u32,
}

impl PathResult {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of edges along the path (0 for a single-cell or empty path).
    pub fn edge_count(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

/// Heap entry; ordered so the binary max-heap pops the smallest f first.
/// Ties break on cell id to keep expansion order deterministic.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    id: u32,
    x: u32,
    y: u32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.id == other.id
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Finds the shortest path between two pixel-space points.
///
/// Endpoints snap to the nearest walkable cell; the returned sequence runs
/// start to end and is empty when the two cells are disconnected or no
/// walkable cell exists near an endpoint.
pub fn find_path(
    grid: &WalkabilityGrid,
    graph: &GridGraph,
    start_px: (u32, u32),
    end_px: (u32, u32),
    config: &PathConfig,
) -> PathResult {
    let node_size = grid.node_size();
    let empty = PathResult {
        cells: Vec::new(),
        node_size,
    };

    let start_cell = grid.pixel_to_cell(start_px.0, start_px.1);
    let end_cell = grid.pixel_to_cell(end_px.0, end_px.1);

    let bound = config
        .search_bound
        .unwrap_or_else(|| grid.width().max(grid.height()));

    let (Some(start), Some(goal)) = (
        nearest_walkable_cell(grid, start_cell, bound),
        nearest_walkable_cell(grid, end_cell, bound),
    ) else {
        debug!(?start_cell, ?end_cell, "no walkable cell near an endpoint");
        return empty;
    };

    let width = grid.width();
    let start_id = GridNode::cell_id(start.0, start.1, width);
    let goal_id = GridNode::cell_id(goal.0, goal.1, width);

    let mut open = std::collections::BinaryHeap::new();
    let mut closed: HashSet<u32> = HashSet::new();
    let mut g_score: HashMap<u32, f64> = HashMap::new();
    let mut came_from: HashMap<u32, u32> = HashMap::new();

    g_score.insert(start_id, 0.0);
    open.push(OpenEntry {
        f: heuristic(start, goal),
        id: start_id,
        x: start.0,
        y: start.1,
    });

    while let Some(current) = open.pop() {
        if closed.contains(&current.id) {
            continue; // stale duplicate entry
        }

        if current.id == goal_id {
            let cells = reconstruct_path(&came_from, current.id, width);
            debug!(cells = cells.len(), "path found");
            return PathResult { cells, node_size };
        }

        closed.insert(current.id);
        let current_g = g_score.get(&current.id).copied().unwrap_or(f64::MAX);

        for (dx, dy) in DIRECTIONS {
            let nx = current.x as i64 + dx;
            let ny = current.y as i64 + dy;
            if !grid.is_walkable(nx, ny) {
                continue;
            }
            let neighbor = (nx as u32, ny as u32);
            let neighbor_id = GridNode::cell_id(neighbor.0, neighbor.1, width);
            if closed.contains(&neighbor_id) {
                continue;
            }

            let Some(edge) = graph.get_edge(current.id, neighbor_id) else {
                continue;
            };
            let tentative_g = current_g + edge.weight;

            let better = match g_score.get(&neighbor_id) {
                Some(&known) => tentative_g < known,
                None => true,
            };
            if better {
                came_from.insert(neighbor_id, current.id);
                g_score.insert(neighbor_id, tentative_g);
                open.push(OpenEntry {
                    f: tentative_g + heuristic(neighbor, goal),
                    id: neighbor_id,
                    x: neighbor.0,
                    y: neighbor.1,
                });
            }
        }
    }

    debug!(?start, ?goal, "open set exhausted, goal unreachable");
    empty
}

/// Euclidean distance between two cells, in grid units.
fn heuristic(from: (u32, u32), to: (u32, u32)) -> f64 {
    let dx = from.0 as f64 - to.0 as f64;
    let dy = from.1 as f64 - to.1 as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Returns `cell` when it is walkable; otherwise searches expanding square
/// perimeters (radius 1, 2, ... `bound`) for the nearest walkable cell.
fn nearest_walkable_cell(
    grid: &WalkabilityGrid,
    cell: (u32, u32),
    bound: u32,
) -> Option<(u32, u32)> {
    let (cx, cy) = (cell.0 as i64, cell.1 as i64);
    if grid.is_walkable(cx, cy) {
        return Some(cell);
    }

    for radius in 1..=bound as i64 {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                // Only the perimeter of the square; the interior was covered
                // by smaller radii.
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                let (nx, ny) = (cx + dx, cy + dy);
                if grid.is_walkable(nx, ny) {
                    return Some((nx as u32, ny as u32));
                }
            }
        }
    }
    None
}

/// Follows predecessor links from the goal back to the start and reverses
/// the result into a start-to-end cell sequence.
fn reconstruct_path(came_from: &HashMap<u32, u32>, goal_id: u32, grid_width: u32) -> Vec<(u32, u32)> {
    let mut cells = vec![(goal_id % grid_width, goal_id / grid_width)];
    let mut current = goal_id;
    while let Some(&previous) = came_from.get(&current) {
        cells.push((previous % grid_width, previous / grid_width));
        current = previous;
    }
    cells.reverse();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::grid::GridConfig;
    use crate::core_modules::grid_graph::build_grid_graph;
    use crate::core_modules::pixel::Rgb;
    use crate::core_modules::raster::FlatRaster;

    const WHITE: Rgb = Rgb::new(255, 255, 255);
    const BLACK: Rgb = Rgb::new(0, 0, 0);

    fn setup(raster: &FlatRaster) -> (WalkabilityGrid, GridGraph) {
        let grid = WalkabilityGrid::from_raster(raster, &GridConfig::default()).unwrap();
        let graph = build_grid_graph(&grid);
        (grid, graph)
    }

    #[test]
    fn open_grid_path_is_manhattan_optimal() {
        let raster = FlatRaster::filled(40, 40, WHITE);
        let (grid, graph) = setup(&raster);

        let path = find_path(&grid, &graph, (5, 5), (35, 35), &PathConfig::default());
        assert_eq!(path.cells.first(), Some(&(0, 0)));
        assert_eq!(path.cells.last(), Some(&(3, 3)));
        // Minimal 4-connected step count between (0,0) and (3,3) is 6.
        assert_eq!(path.edge_count(), 6);
        assert_eq!(path.cells.len(), 7);
        assert_eq!(path.node_size, 10);

        // Every hop is a unit 4-adjacent move.
        for pair in path.cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let step = a.0.abs_diff(b.0) + a.1.abs_diff(b.1);
            assert_eq!(step, 1);
        }
    }

    #[test]
    fn path_routes_around_obstacles() {
        // A wall across the middle with a single gap at the right edge.
        let mut raster = FlatRaster::filled(50, 50, WHITE);
        raster.fill_rect(0, 20, 39, 29, BLACK); // blocks cells (0..4, 2)

        let (grid, graph) = setup(&raster);
        let path = find_path(&grid, &graph, (5, 5), (5, 45), &PathConfig::default());

        assert!(!path.is_empty());
        assert_eq!(path.cells.first(), Some(&(0, 0)));
        assert_eq!(path.cells.last(), Some(&(0, 4)));
        // Detour through the gap at x=4: down the right edge and back.
        assert!(path.cells.contains(&(4, 2)));
        assert_eq!(path.edge_count(), 12);
    }

    #[test]
    fn disconnected_components_yield_empty_path() {
        // Wall spanning the full width: two sealed rooms.
        let mut raster = FlatRaster::filled(50, 50, WHITE);
        raster.fill_rect(0, 20, 49, 29, BLACK);

        let (grid, graph) = setup(&raster);
        let path = find_path(&grid, &graph, (5, 5), (5, 45), &PathConfig::default());
        assert!(path.is_empty());
        assert_eq!(path.edge_count(), 0);
    }

    #[test]
    fn blocked_endpoint_snaps_to_nearest_walkable_cell() {
        let mut raster = FlatRaster::filled(40, 40, WHITE);
        raster.fill_rect(0, 0, 9, 9, BLACK); // cell (0,0) blocked

        let (grid, graph) = setup(&raster);
        let path = find_path(&grid, &graph, (5, 5), (35, 5), &PathConfig::default());

        assert!(!path.is_empty());
        // Snapped start is one of (0,0)'s perimeter neighbors.
        let first = path.cells[0];
        assert!(first == (1, 0) || first == (0, 1) || first == (1, 1));
        assert_eq!(path.cells.last(), Some(&(3, 0)));
    }

    #[test]
    fn fully_blocked_grid_has_no_path() {
        let raster = FlatRaster::filled(40, 40, BLACK);
        let (grid, graph) = setup(&raster);
        let path = find_path(&grid, &graph, (5, 5), (35, 35), &PathConfig::default());
        assert!(path.is_empty());
    }

    #[test]
    fn start_equals_goal_is_a_single_cell_path() {
        let raster = FlatRaster::filled(40, 40, WHITE);
        let (grid, graph) = setup(&raster);
        let path = find_path(&grid, &graph, (5, 5), (8, 3), &PathConfig::default());
        assert_eq!(path.cells, vec![(0, 0)]);
        assert_eq!(path.edge_count(), 0);
    }

    #[test]
    fn search_bound_limits_endpoint_snapping() {
        let mut raster = FlatRaster::filled(60, 10, WHITE);
        // Only the rightmost cell is walkable.
        raster.fill_rect(0, 0, 39, 9, BLACK);

        let (grid, graph) = setup(&raster);
        let tight = PathConfig {
            search_bound: Some(1),
        };
        let path = find_path(&grid, &graph, (5, 5), (55, 5), &tight);
        // Start cell (0,0) has no walkable cell within radius 1.
        assert!(path.is_empty());

        let wide = PathConfig::default();
        let path = find_path(&grid, &graph, (5, 5), (55, 5), &wide);
        assert!(!path.is_empty());
    }
}
