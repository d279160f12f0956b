// THEORY:
// The `classifier` assigns every region in the RAG one label from a fixed
// evidence taxonomy: Blood, Weapon, Tool or Background. It is a heuristic,
// rule-based classifier — a handful of color/shape/size predicates with
// literal thresholds, evaluated in a fixed priority order where the first
// match wins. Determinism follows directly from the fixed thresholds and
// the evaluation order.
//
// Key architectural principles:
// 1.  **Priority rules**: Blood is the most distinctive signature and is
//     tested first, then Weapon, then Tool; everything else is Background.
//     A region matching several predicates gets the highest-priority label.
// 2.  **Graph-aware retrieval**: before a region is labeled, its k nearest
//     neighbors in the RAG are retrieved by ascending dissimilarity
//     (1 - similarity). Only nodes connected by an edge are candidates. In
//     this revision the rules are evaluated on the region's own features —
//     the neighbor list is produced for the retrieval pathway but does not
//     yet vote on the label.
// 3.  **Literal thresholds**: the constants below are the classifier. They
//     are not tunable at runtime; changing them changes the taxonomy.

use crate::core_modules::graph::NodeId;
use crate::core_modules::pixel::Rgb;
use crate::core_modules::rag::RegionGraph;
use crate::core_modules::superpixel::{BoundingBox, RegionClass, SuperPixel};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

// Blood: strongly red, low green/blue, and big enough to not be noise.
const BLOOD_MIN_RED: u8 = 120;
const BLOOD_MAX_GREEN: u8 = 90;
const BLOOD_MAX_BLUE: u8 = 90;
const BLOOD_MIN_RED_DOMINANCE: f64 = 1.5;
const BLOOD_MIN_SIZE: usize = 50;

// Metallic color: near-equal channels at moderate brightness.
const METALLIC_MAX_CHANNEL_DIFF: u8 = 40;
const METALLIC_MIN_BRIGHTNESS: f64 = 80.0;
const METALLIC_MAX_BRIGHTNESS: f64 = 220.0;

// Weapon shape: elongated bounding box or low compactness.
const WEAPON_MAX_ASPECT: f64 = 3.0;
const WEAPON_MIN_ASPECT: f64 = 1.0 / 3.0;
const WEAPON_MAX_COMPACTNESS: f64 = 0.6;
const WEAPON_MIN_SIZE: usize = 200;

// Tool shape and wooden color.
const TOOL_MAX_ASPECT: f64 = 2.5;
const TOOL_MIN_ASPECT: f64 = 0.4;
const TOOL_MIN_LENGTH_WIDTH_RATIO: f64 = 2.0;
const TOOL_MIN_SIZE: usize = 150;
const WOOD_MAX_BLUE: u8 = 100;
const WOOD_MIN_RED: u8 = 100;
const WOOD_MIN_RED_BLUE_GAP: i32 = 50;

/// Tunables for classification that are genuinely caller-facing; the rule
/// thresholds above are not among them.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Number of graph neighbors retrieved per region.
    pub k_neighbors: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { k_neighbors: 5 }
    }
}

/// A drawable overlay job for one piece of detected evidence: where it is,
/// what it is, and what color a renderer should box it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionReport {
    pub bounding_box: BoundingBox,
    pub class: RegionClass,
    pub box_color: Rgb,
}

/// Retrieves the k nearest neighbors of `id` in the RAG, ordered by
/// ascending dissimilarity (1 - edge similarity). Nodes without an edge to
/// `id` are never candidates.
pub fn k_nearest_neighbors(graph: &RegionGraph, id: NodeId, k: usize) -> Vec<NodeId> {
    // Min-heap over (dissimilarity, neighbor id); the id tiebreak keeps the
    // ordering total and the retrieval deterministic.
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();

    for other in graph.node_ids() {
        if other == id {
            continue;
        }
        if let Some(edge) = graph.get_edge(id, other) {
            let dissimilarity = 1.0 - edge.similarity;
            heap.push(Reverse((dissimilarity.to_bits(), other)));
        }
    }

    let mut neighbors = Vec::with_capacity(k);
    while neighbors.len() < k {
        match heap.pop() {
            Some(Reverse((_, other))) => neighbors.push(other),
            None => break,
        }
    }
    neighbors
}

/// Labels every region in the graph. First match wins: Blood, then Weapon,
/// then Tool, then Background.
pub fn classify(graph: &mut RegionGraph, config: &ClassifierConfig) {
    let ids: Vec<NodeId> = graph.node_ids().collect();

    for id in ids {
        let neighbors = k_nearest_neighbors(graph, id, config.k_neighbors);

        let class = match graph.get_node(id) {
            Some(node) => classify_features(&node.superpixel, &neighbors),
            None => continue,
        };
        if let Some(node) = graph.get_node_mut(id) {
            node.class = class;
        }
    }

    let evidence = graph.nodes().filter(|n| n.class.is_evidence()).count();
    debug!(
        regions = graph.node_count(),
        evidence, "classified region graph"
    );
}

/// Collects the overlay jobs for every labeled evidence region.
pub fn region_reports(graph: &RegionGraph) -> Vec<RegionReport> {
    let mut reports: Vec<RegionReport> = graph
        .nodes()
        .filter(|node| node.class.is_evidence())
        .map(|node| RegionReport {
            bounding_box: node.superpixel.bounding_box,
            class: node.class,
            box_color: node.class.suggested_color(),
        })
        .collect();
    // HashMap iteration order is arbitrary; sort for a stable report.
    reports.sort_by_key(|r| (r.bounding_box.min_y, r.bounding_box.min_x));
    reports
}

/// The rule cascade. `_neighbors` is the retrieval result; the current
/// revision decides on the region's own features alone.
fn classify_features(sp: &SuperPixel, _neighbors: &[NodeId]) -> RegionClass {
    if is_blood(sp) {
        RegionClass::Blood
    } else if is_weapon(sp) {
        RegionClass::Weapon
    } else if is_tool(sp) {
        RegionClass::Tool
    } else {
        RegionClass::Background
    }
}

fn is_blood(sp: &SuperPixel) -> bool {
    let color = sp.color;
    let reddish =
        color.red > BLOOD_MIN_RED && color.green < BLOOD_MAX_GREEN && color.blue < BLOOD_MAX_BLUE;
    reddish && color.red_dominance() > BLOOD_MIN_RED_DOMINANCE && sp.size() > BLOOD_MIN_SIZE
}

fn is_weapon(sp: &SuperPixel) -> bool {
    is_metallic(&sp.color) && has_weapon_shape(sp) && sp.size() > WEAPON_MIN_SIZE
}

fn is_metallic(color: &Rgb) -> bool {
    let brightness = color.brightness();
    color.max_channel_difference() < METALLIC_MAX_CHANNEL_DIFF
        && brightness > METALLIC_MIN_BRIGHTNESS
        && brightness < METALLIC_MAX_BRIGHTNESS
}

fn has_weapon_shape(sp: &SuperPixel) -> bool {
    let aspect = sp.aspect_ratio();
    let elongated = aspect > WEAPON_MAX_ASPECT || aspect < WEAPON_MIN_ASPECT;
    elongated || sp.compactness() < WEAPON_MAX_COMPACTNESS
}

fn is_tool(sp: &SuperPixel) -> bool {
    has_tool_shape(sp) && has_tool_color(&sp.color) && sp.size() > TOOL_MIN_SIZE
}

fn has_tool_shape(sp: &SuperPixel) -> bool {
    let aspect = sp.aspect_ratio();
    let elongated = aspect > TOOL_MAX_ASPECT || aspect < TOOL_MIN_ASPECT;

    let width = sp.bounding_box.width() as f64;
    let height = sp.bounding_box.height() as f64;
    let length_to_width = width.max(height) / f64::max(1.0, width.min(height));

    elongated || length_to_width > TOOL_MIN_LENGTH_WIDTH_RATIO
}

fn has_tool_color(color: &Rgb) -> bool {
    is_wooden(color) || is_metallic(color)
}

fn is_wooden(color: &Rgb) -> bool {
    let brownish = color.red > color.green
        && color.green > color.blue
        && color.blue < WOOD_MAX_BLUE
        && color.red > WOOD_MIN_RED;
    brownish && (color.red as i32 - color.blue as i32) > WOOD_MIN_RED_BLUE_GAP
}
