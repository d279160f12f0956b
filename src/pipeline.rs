// THEORY:
// The `pipeline` module is the final, top-level API for the engine. It wires
// the core modules into the two analysis flows and exposes them as free
// functions over an opaque raster:
//
//   classify_scene:    raster -> segmenter -> RAG -> classifier -> report
//   find_optimal_path: raster -> walkability grid -> grid graph -> A* -> path
//
// Every invocation builds its working state (regions, graphs, grids) from
// scratch and returns it to the caller; the pipeline holds no fields, so
// concurrent invocations can never alias each other's state. Callers that
// want to serialize work against one logical engine use the `worker` module.

use crate::core_modules::classifier::{self, ClassifierConfig, RegionReport};
use crate::core_modules::grid::{GridConfig, WalkabilityGrid};
use crate::core_modules::grid_graph::build_grid_graph;
use crate::core_modules::pathfinder::{self, PathConfig};
use crate::core_modules::rag::{RegionGraph, build_rag};
use crate::core_modules::raster::Raster;
use crate::core_modules::segmenter::{self, SegmenterConfig};
use crate::error::Result;
use tracing::info;

// Re-export the data structures callers consume.
pub use crate::core_modules::classifier::RegionReport as Evidence;
pub use crate::core_modules::pathfinder::PathResult;
pub use crate::core_modules::superpixel::{BoundingBox, RegionClass};

/// Configuration for both analysis flows, with the engine's reference
/// defaults. Every field is a documented tunable; everything else about the
/// algorithms is fixed.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target superpixel count for segmentation.
    pub target_superpixels: u32,
    /// Bounding-box expansion, in pixels, for the RAG adjacency test.
    pub adjacency_tolerance: u32,
    /// Neighbors retrieved per region during classification.
    pub k_neighbors: usize,
    /// Grid cell size, in pixels, for the walkability grid.
    pub node_size: u32,
    /// Walkability brightness threshold.
    pub brightness_threshold: f64,
    /// Bound on the nearest-walkable-cell search; `None` means the larger
    /// grid dimension.
    pub search_bound: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_superpixels: 100,
            adjacency_tolerance: 5,
            k_neighbors: 5,
            node_size: 10,
            brightness_threshold: 200.0,
            search_bound: None,
        }
    }
}

/// The primary output of the classification flow: the overlay jobs for each
/// detected piece of evidence, plus the labeled region graph for callers
/// that want to inspect it.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    /// One entry per non-background region: bounding box, class label and
    /// suggested box color, in reading order.
    pub evidence: Vec<RegionReport>,
    /// Number of superpixels the image segmented into.
    pub region_count: usize,
    /// The full labeled region adjacency graph.
    pub graph: RegionGraph,
}

/// Segments the image, builds the region adjacency graph and labels every
/// region against the evidence taxonomy.
pub fn classify_scene(
    raster: &dyn Raster,
    config: &PipelineConfig,
) -> Result<ClassificationReport> {
    let superpixels = segmenter::segment(
        raster,
        &SegmenterConfig {
            target_count: config.target_superpixels,
            ..SegmenterConfig::default()
        },
    )?;
    let region_count = superpixels.len();

    let mut graph = build_rag(superpixels, config.adjacency_tolerance);
    classifier::classify(
        &mut graph,
        &ClassifierConfig {
            k_neighbors: config.k_neighbors,
        },
    );

    let evidence = classifier::region_reports(&graph);
    info!(
        width = raster.width(),
        height = raster.height(),
        region_count,
        evidence = evidence.len(),
        "scene classified"
    );

    Ok(ClassificationReport {
        evidence,
        region_count,
        graph,
    })
}

/// Converts the floor plan to a walkability grid and finds the shortest
/// path between two pixel-space points. An unreachable goal produces an
/// empty (but valid) path, not an error.
pub fn find_optimal_path(
    raster: &dyn Raster,
    start_px: (u32, u32),
    end_px: (u32, u32),
    config: &PipelineConfig,
) -> Result<PathResult> {
    let grid = WalkabilityGrid::from_raster(
        raster,
        &GridConfig {
            node_size: config.node_size,
            brightness_threshold: config.brightness_threshold,
        },
    )?;
    let graph = build_grid_graph(&grid);

    let path = pathfinder::find_path(
        &grid,
        &graph,
        start_px,
        end_px,
        &PathConfig {
            search_bound: config.search_bound,
        },
    );
    info!(
        grid_width = grid.width(),
        grid_height = grid.height(),
        cells = path.cells.len(),
        "pathfinding complete"
    );
    Ok(path)
}
