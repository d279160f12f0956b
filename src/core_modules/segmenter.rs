// THEORY:
// The `segmenter` is the engine of the classification pipeline's first stage.
// It implements a simplified iterative clustering in the spirit of SLIC:
// clusters are seeded on a regular grid, then a fixed number of
// assign/update rounds pulls every pixel toward the cluster that is closest
// in a combined color + spatial metric.
//
// Key architectural principles & algorithm steps:
// 1.  **Grid seeding**: one cluster per grid cell center, stride
//     `floor(sqrt(W*H / target_count))`, initialized with that pixel's color.
//     The grid spacing doubles as the normalizer for spatial distance.
// 2.  **Assignment**: every pixel joins the cluster minimizing
//     `color_distance + (compactness / grid_size) * spatial_distance`.
//     Color distance is Euclidean in RGB; spatial distance is Euclidean in
//     pixels; compactness is a fixed constant trading color fidelity against
//     spatial tightness.
// 3.  **Update**: each cluster recomputes its centroid, mean color, member
//     list and bounding box from its assigned pixels. Clusters that end a
//     round with zero members keep their previous center so they can win
//     pixels back later.
// 4.  **Fixed iteration count**: the loop runs a constant number of rounds
//     (10 by default) rather than testing convergence. Determinism and a
//     bounded runtime matter more here than segmentation quality.
//
// Conservation invariant: after every round each pixel belongs to exactly
// one cluster, so the union of all member lists is the full image.

use crate::core_modules::pixel::Rgb;
use crate::core_modules::raster::Raster;
use crate::core_modules::superpixel::{BoundingBox, SuperPixel};
use crate::error::{EngineError, Result};
use tracing::debug;

/// Tunables for the segmenter. The defaults match the engine's reference
/// behavior; they are compiled-in trade-offs, not runtime-adaptive values.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Target number of superpixels. The actual count depends on how the
    /// seed grid divides the image.
    pub target_count: u32,
    /// Number of assign/update rounds.
    pub iterations: u32,
    /// Compactness factor: higher pulls clusters into tighter discs, lower
    /// lets them follow color boundaries.
    pub compactness: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            target_count: 100,
            iterations: 10,
            compactness: 10.0,
        }
    }
}

/// Internal cluster state during the iterations. The accumulator fields are
/// rebuilt from scratch every round.
#[derive(Debug, Clone, Default)]
struct Cluster {
    center_x: u32,
    center_y: u32,
    color: Rgb,
    sum_x: u64,
    sum_y: u64,
    sum_r: u64,
    sum_g: u64,
    sum_b: u64,
    count: u64,
    pixels: Vec<(u32, u32)>,
    bounding_box: BoundingBox,
}

impl Cluster {
    fn seeded_at(x: u32, y: u32, color: Rgb) -> Self {
        Self {
            center_x: x,
            center_y: y,
            color,
            ..Cluster::default()
        }
    }

    fn clear_accumulators(&mut self) {
        self.sum_x = 0;
        self.sum_y = 0;
        self.sum_r = 0;
        self.sum_g = 0;
        self.sum_b = 0;
        self.count = 0;
        self.pixels.clear();
    }

    fn accumulate(&mut self, x: u32, y: u32, color: Rgb) {
        self.pixels.push((x, y));
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.sum_r += color.red as u64;
        self.sum_g += color.green as u64;
        self.sum_b += color.blue as u64;
        self.count += 1;
    }

    /// Folds the accumulators into a new centroid, mean color and bounding
    /// box. A cluster with no members keeps its previous center.
    fn finish_round(&mut self) {
        if self.count == 0 {
            return;
        }
        self.center_x = (self.sum_x / self.count) as u32;
        self.center_y = (self.sum_y / self.count) as u32;
        self.color = Rgb::new(
            (self.sum_r / self.count) as u8,
            (self.sum_g / self.count) as u8,
            (self.sum_b / self.count) as u8,
        );

        let mut bbox = BoundingBox {
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
        };
        for &(x, y) in &self.pixels {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        self.bounding_box = bbox;
    }
}

/// Segments the raster into superpixels.
///
/// Zero-area input is rejected; any other raster produces a complete
/// segmentation in which every pixel belongs to exactly one region.
pub fn segment(raster: &dyn Raster, config: &SegmenterConfig) -> Result<Vec<SuperPixel>> {
    let (width, height) = (raster.width(), raster.height());
    if width == 0 || height == 0 {
        return Err(EngineError::EmptyImage { width, height });
    }

    // Seed stride. Clamped to 1 so images smaller than the target count
    // still seed a dense grid instead of looping with stride 0.
    let grid_size =
        (((width as u64 * height as u64) as f64 / config.target_count as f64).sqrt() as u32).max(1);

    let mut clusters = seed_clusters(raster, grid_size);
    debug!(
        width,
        height,
        grid_size,
        seeds = clusters.len(),
        "seeded superpixel clusters"
    );

    let spatial_scale = config.compactness / grid_size as f64;
    let mut labels = vec![0usize; (width as usize) * (height as usize)];

    for round in 0..config.iterations {
        // Assignment: every pixel to the nearest cluster in combined space.
        for y in 0..height {
            for x in 0..width {
                let color = raster.pixel(x, y);
                let mut best = 0usize;
                let mut best_distance = f64::MAX;
                for (index, cluster) in clusters.iter().enumerate() {
                    let color_distance = cluster.color.color_distance(&color);
                    let dx = cluster.center_x as f64 - x as f64;
                    let dy = cluster.center_y as f64 - y as f64;
                    let spatial_distance = (dx * dx + dy * dy).sqrt();
                    let distance = color_distance + spatial_scale * spatial_distance;
                    if distance < best_distance {
                        best_distance = distance;
                        best = index;
                    }
                }
                labels[(y * width + x) as usize] = best;
            }
        }

        // Update: recompute every cluster from its assigned pixels.
        for cluster in &mut clusters {
            cluster.clear_accumulators();
        }
        for y in 0..height {
            for x in 0..width {
                let label = labels[(y * width + x) as usize];
                clusters[label].accumulate(x, y, raster.pixel(x, y));
            }
        }
        for cluster in &mut clusters {
            cluster.finish_round();
        }

        debug!(round, "segmentation round complete");
    }

    Ok(clusters
        .into_iter()
        .map(|cluster| finalize_superpixel(raster, cluster))
        .collect())
}

/// Seeds one cluster per grid cell center. Images too narrow for the regular
/// grid get a single seed at the image center so segmentation stays total.
fn seed_clusters(raster: &dyn Raster, grid_size: u32) -> Vec<Cluster> {
    let (width, height) = (raster.width(), raster.height());
    let mut clusters = Vec::new();

    let mut y = grid_size / 2;
    while y < height {
        let mut x = grid_size / 2;
        while x < width {
            clusters.push(Cluster::seeded_at(x, y, raster.pixel(x, y)));
            x += grid_size;
        }
        y += grid_size;
    }

    if clusters.is_empty() {
        let (cx, cy) = (width / 2, height / 2);
        clusters.push(Cluster::seeded_at(cx, cy, raster.pixel(cx, cy)));
    }

    clusters
}

/// Converts a finished cluster into its public `SuperPixel` form, computing
/// the per-channel color variance as the texture signature.
fn finalize_superpixel(raster: &dyn Raster, cluster: Cluster) -> SuperPixel {
    let mut texture_variance = [0.0f64; 3];
    if !cluster.pixels.is_empty() {
        let n = cluster.pixels.len() as f64;
        let mean = [
            cluster.color.red as f64,
            cluster.color.green as f64,
            cluster.color.blue as f64,
        ];
        for &(x, y) in &cluster.pixels {
            let color = raster.pixel(x, y);
            texture_variance[0] += (color.red as f64 - mean[0]).powi(2);
            texture_variance[1] += (color.green as f64 - mean[1]).powi(2);
            texture_variance[2] += (color.blue as f64 - mean[2]).powi(2);
        }
        for channel in &mut texture_variance {
            *channel /= n;
        }
    }

    SuperPixel {
        color: cluster.color,
        center_x: cluster.center_x,
        center_y: cluster.center_y,
        pixels: cluster.pixels,
        bounding_box: cluster.bounding_box,
        texture_variance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::raster::FlatRaster;

    #[test]
    fn zero_area_image_is_rejected() {
        let raster = FlatRaster::new(0, 0, Vec::new());
        let result = segment(&raster, &SegmenterConfig::default());
        assert!(matches!(result, Err(EngineError::EmptyImage { .. })));
    }

    #[test]
    fn every_pixel_belongs_to_exactly_one_region() {
        let mut raster = FlatRaster::filled(40, 40, Rgb::new(220, 220, 220));
        raster.fill_rect(0, 0, 19, 39, Rgb::new(30, 30, 30));

        let regions = segment(&raster, &SegmenterConfig::default()).unwrap();
        let total: usize = regions.iter().map(|r| r.size()).sum();
        assert_eq!(total, 40 * 40);

        let mut seen = vec![false; 40 * 40];
        for region in &regions {
            for &(x, y) in &region.pixels {
                let index = (y * 40 + x) as usize;
                assert!(!seen[index], "pixel ({x},{y}) assigned twice");
                seen[index] = true;
            }
        }
        assert!(seen.into_iter().all(|v| v));
    }

    #[test]
    fn uniform_image_produces_uniform_regions() {
        let raster = FlatRaster::filled(30, 30, Rgb::new(100, 150, 200));
        let regions = segment(&raster, &SegmenterConfig::default()).unwrap();

        for region in regions.iter().filter(|r| r.size() > 0) {
            assert_eq!(region.color, Rgb::new(100, 150, 200));
            assert_eq!(region.texture_variance, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn distinct_color_halves_stay_separated() {
        let mut raster = FlatRaster::filled(40, 40, Rgb::new(240, 240, 240));
        raster.fill_rect(0, 0, 19, 39, Rgb::new(10, 10, 10));

        let regions = segment(&raster, &SegmenterConfig::default()).unwrap();
        // No region should straddle the color boundary: mean colors stay
        // near one of the two poles.
        for region in regions.iter().filter(|r| r.size() > 0) {
            let b = region.color.brightness();
            assert!(
                b < 60.0 || b > 190.0,
                "region mean brightness {b} sits on the boundary"
            );
        }
    }

    #[test]
    fn tiny_image_still_segments() {
        let raster = FlatRaster::filled(3, 2, Rgb::new(50, 60, 70));
        let regions = segment(&raster, &SegmenterConfig::default()).unwrap();
        let total: usize = regions.iter().map(|r| r.size()).sum();
        assert_eq!(total, 6);
    }
}
