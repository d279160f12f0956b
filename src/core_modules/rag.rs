// THEORY:
// The `rag` module turns a flat list of superpixels into a Region Adjacency
// Graph: one node per region, one edge per pair of regions that sit close
// enough to be considered neighbors. The classifier's k-nearest-neighbor
// retrieval runs over this graph.
//
// Adjacency here is an approximation: instead of checking shared pixel
// borders, two regions are adjacent when their bounding boxes — each grown
// by a fixed tolerance — intersect. With the target of ~100 regions the
// O(n^2) pair scan is bounded and cheap.
//
// Edge weight is a color similarity score `1 / (1 + color_distance / 255)`:
// 1.0 for identical mean colors, falling monotonically toward 0 as the
// colors diverge, never reaching it.

use crate::core_modules::graph::Graph;
use crate::core_modules::superpixel::{SimilarityEdge, SuperPixel, SuperPixelNode};
use tracing::debug;

pub type RegionGraph = Graph<SuperPixelNode, SimilarityEdge>;

/// Color similarity between two regions, in (0, 1].
pub fn color_similarity(a: &SuperPixel, b: &SuperPixel) -> f64 {
    1.0 / (1.0 + a.color.color_distance(&b.color) / 255.0)
}

/// Builds the region adjacency graph. Node ids are the indices of the input
/// list; edges connect every unordered pair whose tolerance-expanded
/// bounding boxes intersect.
pub fn build_rag(superpixels: Vec<SuperPixel>, tolerance: u32) -> RegionGraph {
    let mut graph = RegionGraph::new();

    let boxes: Vec<_> = superpixels.iter().map(|sp| sp.bounding_box).collect();
    let sizes: Vec<_> = superpixels.iter().map(|sp| sp.size()).collect();

    for (index, superpixel) in superpixels.into_iter().enumerate() {
        graph.add_node(SuperPixelNode::new(index as u32, superpixel));
    }

    let n = boxes.len();
    for i in 0..n {
        // Regions that never won any pixels have an empty (default) box;
        // they are not meaningful neighbors of anything.
        if sizes[i] == 0 {
            continue;
        }
        for j in (i + 1)..n {
            if sizes[j] == 0 {
                continue;
            }
            if boxes[i].intersects_expanded(&boxes[j], tolerance) {
                let a = graph.get_node(i as u32).map(|n| &n.superpixel);
                let b = graph.get_node(j as u32).map(|n| &n.superpixel);
                if let (Some(a), Some(b)) = (a, b) {
                    let similarity = color_similarity(a, b);
                    let mut edge = SimilarityEdge::new(similarity);
                    edge.color_similarity = similarity;
                    graph.add_edge(i as u32, j as u32, edge);
                }
            }
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built region adjacency graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::Rgb;
    use crate::core_modules::superpixel::BoundingBox;

    fn region(min_x: u32, min_y: u32, max_x: u32, max_y: u32, color: Rgb) -> SuperPixel {
        SuperPixel {
            color,
            center_x: (min_x + max_x) / 2,
            center_y: (min_y + max_y) / 2,
            pixels: vec![(min_x, min_y)],
            bounding_box: BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            },
            texture_variance: [0.0; 3],
        }
    }

    #[test]
    fn regions_within_tolerance_are_connected() {
        let gray = Rgb::new(128, 128, 128);
        let graph = build_rag(
            vec![
                region(0, 0, 10, 10, gray),
                region(12, 0, 20, 10, gray), // 2px gap < 5px tolerance
                region(40, 0, 50, 10, gray), // 20px gap, no edge
            ],
            5,
        );

        assert!(graph.get_edge(0, 1).is_some());
        assert!(graph.get_edge(1, 0).is_some());
        assert!(graph.get_edge(0, 2).is_none());
        assert!(graph.get_edge(1, 2).is_none());
    }

    #[test]
    fn identical_colors_score_full_similarity() {
        let gray = Rgb::new(128, 128, 128);
        let graph = build_rag(vec![region(0, 0, 5, 5, gray), region(6, 0, 12, 5, gray)], 5);
        let edge = graph.get_edge(0, 1).unwrap();
        assert_eq!(edge.similarity, 1.0);
        assert_eq!(edge.color_similarity, 1.0);
    }

    #[test]
    fn similarity_decreases_with_color_distance() {
        let near = color_similarity(
            &region(0, 0, 1, 1, Rgb::new(100, 100, 100)),
            &region(0, 0, 1, 1, Rgb::new(110, 100, 100)),
        );
        let far = color_similarity(
            &region(0, 0, 1, 1, Rgb::new(100, 100, 100)),
            &region(0, 0, 1, 1, Rgb::new(250, 100, 100)),
        );
        assert!(near > far);
        assert!(near < 1.0 && far > 0.0);
    }

    #[test]
    fn empty_regions_get_no_edges() {
        let gray = Rgb::new(128, 128, 128);
        let mut empty = region(0, 0, 0, 0, gray);
        empty.pixels.clear();
        let graph = build_rag(vec![empty, region(0, 0, 5, 5, gray)], 5);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }
}
