// THEORY:
// The `superpixel` module holds the data containers for the classification
// half of the engine. A `SuperPixel` represents a single, perceptually
// coherent region produced by the segmenter: its mean color, centroid,
// member pixels, bounding box and a small texture signature. Like the other
// containers in this crate it is "dumb" — it summarizes its own data and
// knows nothing about other regions.
//
// `SuperPixelNode` and `SimilarityEdge` are the graph-facing wrappers: the
// node owns a region plus its mutable class label, the edge carries the
// similarity scores that connect two adjacent regions in the RAG.

use crate::core_modules::graph::{GraphEdge, GraphNode, NodeId};
use crate::core_modules::pixel::Rgb;

/// Axis-aligned bounding box in pixel coordinates, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True when the boxes, each expanded by `tolerance` pixels on every
    /// side, overlap. This is the adjacency test for the RAG.
    pub fn intersects_expanded(&self, other: &BoundingBox, tolerance: u32) -> bool {
        let t = tolerance as i64;
        !(self.max_x as i64 + t < other.min_x as i64 - t
            || other.max_x as i64 + t < self.min_x as i64 - t
            || self.max_y as i64 + t < other.min_y as i64 - t
            || other.max_y as i64 + t < self.min_y as i64 - t)
    }
}

/// A cluster of spatially and chromatically similar pixels treated as one
/// region. Produced by the segmenter, consumed by the RAG builder and the
/// classifier.
#[derive(Debug, Clone, Default)]
pub struct SuperPixel {
    /// Mean color over all member pixels.
    pub color: Rgb,
    /// Cluster centroid in pixel coordinates.
    pub center_x: u32,
    /// Cluster centroid in pixel coordinates.
    pub center_y: u32,
    /// Every pixel assigned to this region, in (x, y) pixel coordinates.
    pub pixels: Vec<(u32, u32)>,
    /// The box enclosing all member pixels.
    pub bounding_box: BoundingBox,
    /// Per-channel (R, G, B) color variance over the member pixels. A rough
    /// texture signature: flat regions score near zero, busy regions high.
    pub texture_variance: [f64; 3],
}

impl SuperPixel {
    /// Number of member pixels, the region's area.
    pub fn size(&self) -> usize {
        self.pixels.len()
    }

    /// Bounding-box width over height. The denominator is clamped to 1 so a
    /// single-row region reads as strongly elongated rather than dividing by
    /// zero.
    pub fn aspect_ratio(&self) -> f64 {
        self.bounding_box.width() as f64 / f64::max(1.0, self.bounding_box.height() as f64)
    }

    pub fn bounding_box_area(&self) -> u64 {
        self.bounding_box.area()
    }

    /// How much of the bounding box the region actually fills.
    pub fn fill_ratio(&self) -> f64 {
        let area = self.bounding_box_area();
        if area > 0 {
            self.size() as f64 / area as f64
        } else {
            0.0
        }
    }

    /// Texture variance averaged across the three channels.
    pub fn average_texture_variance(&self) -> f64 {
        self.texture_variance.iter().sum::<f64>() / 3.0
    }

    /// Isoperimetric compactness `4*pi*area / perimeter^2`, approximated with
    /// the bounding-box perimeter. A disc scores near 1, a sliver near 0.
    pub fn compactness(&self) -> f64 {
        let perimeter =
            2.0 * (self.bounding_box.width() as f64 + self.bounding_box.height() as f64);
        if perimeter <= 0.0 {
            return 0.0;
        }
        (4.0 * std::f64::consts::PI * self.size() as f64) / (perimeter * perimeter)
    }
}

/// The label a region ends up with after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionClass {
    /// Not yet classified.
    #[default]
    Unknown,
    /// Classified, but matched no evidence rule.
    Background,
    Weapon,
    Tool,
    Blood,
}

impl RegionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionClass::Unknown => "Unknown",
            RegionClass::Background => "Background",
            RegionClass::Weapon => "Weapon",
            RegionClass::Tool => "Tool",
            RegionClass::Blood => "Blood",
        }
    }

    /// The box color a renderer should use for this class.
    pub fn suggested_color(&self) -> Rgb {
        match self {
            RegionClass::Weapon => Rgb::new(255, 0, 0),
            RegionClass::Tool => Rgb::new(0, 0, 255),
            RegionClass::Blood => Rgb::new(255, 0, 255),
            RegionClass::Unknown | RegionClass::Background => Rgb::new(128, 128, 128),
        }
    }

    /// True for labels a renderer should draw a box for.
    pub fn is_evidence(&self) -> bool {
        matches!(
            self,
            RegionClass::Weapon | RegionClass::Tool | RegionClass::Blood
        )
    }
}

impl std::fmt::Display for RegionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A RAG node: one superpixel plus its mutable class label.
#[derive(Debug, Clone)]
pub struct SuperPixelNode {
    id: NodeId,
    pub superpixel: SuperPixel,
    pub class: RegionClass,
}

impl SuperPixelNode {
    pub fn new(id: NodeId, superpixel: SuperPixel) -> Self {
        Self {
            id,
            superpixel,
            class: RegionClass::Unknown,
        }
    }
}

impl GraphNode for SuperPixelNode {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// A RAG edge: the overall similarity between two adjacent regions plus its
/// three named components. The `visited` flag and `label` are scratch state
/// for graph algorithms; the builders leave them at their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityEdge {
    /// Overall similarity in (0, 1]; 1 means identical mean colors.
    pub similarity: f64,
    pub color_similarity: f64,
    pub texture_similarity: f64,
    pub shape_similarity: f64,
    /// Algorithm-scratch state, reset between traversals.
    pub visited: bool,
    /// Free-text annotation for debugging and display.
    pub label: String,
}

impl SimilarityEdge {
    pub fn new(similarity: f64) -> Self {
        Self {
            similarity,
            color_similarity: 0.0,
            texture_similarity: 0.0,
            shape_similarity: 0.0,
            visited: false,
            label: String::new(),
        }
    }

    /// Re-derives the overall similarity as the weighted combination of the
    /// three components, with the weights re-normalized to sum to 1. Weights
    /// summing to zero leave the edge untouched.
    pub fn recalculate_similarity(&mut self, color_w: f64, texture_w: f64, shape_w: f64) {
        let sum = color_w + texture_w + shape_w;
        if sum > 0.0 {
            self.similarity = (color_w * self.color_similarity
                + texture_w * self.texture_similarity
                + shape_w * self.shape_similarity)
                / sum;
        }
    }

    pub fn reset(&mut self) {
        self.visited = false;
    }
}

impl GraphEdge for SimilarityEdge {
    fn weight(&self) -> f64 {
        self.similarity
    }

    fn is_similar(&self, other: &Self, threshold: f64) -> bool {
        (self.similarity - other.similarity).abs() <= threshold
    }
}
