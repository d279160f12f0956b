// THEORY:
// The `grid` module performs the crucial first step of the pathfinding
// pipeline: transforming a raw floor-plan raster into a spatially organized
// boolean grid. The image is divided into square cells of `node_size`
// pixels; a cell is walkable when the pixel at its center is bright (light
// floor), and blocked otherwise (dark walls and furniture).
//
// Sampling one pixel per cell instead of averaging the block is a deliberate
// simplification — floor plans are high-contrast line drawings, and the
// center sample is both cheap and faithful for cells that are mostly one
// thing. Cells whose center falls outside the image are blocked.

use crate::core_modules::raster::Raster;
use crate::error::{EngineError, Result};
use tracing::debug;

/// Tunables for grid sampling.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Side length of a grid cell in pixels.
    pub node_size: u32,
    /// A cell is walkable when its center brightness (mean of R, G, B)
    /// exceeds this value.
    pub brightness_threshold: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            node_size: 10,
            brightness_threshold: 200.0,
        }
    }
}

/// A boolean raster-derived grid marking which cells are traversable.
#[derive(Debug, Clone)]
pub struct WalkabilityGrid {
    width: u32,
    height: u32,
    node_size: u32,
    cells: Vec<bool>,
}

impl WalkabilityGrid {
    /// Samples the raster into a walkability grid.
    ///
    /// Rejects zero-area images and images smaller than a single cell; any
    /// other raster yields a complete grid.
    pub fn from_raster(raster: &dyn Raster, config: &GridConfig) -> Result<Self> {
        let (image_width, image_height) = (raster.width(), raster.height());
        if image_width == 0 || image_height == 0 {
            return Err(EngineError::EmptyImage {
                width: image_width,
                height: image_height,
            });
        }

        let width = image_width / config.node_size;
        let height = image_height / config.node_size;
        if width == 0 || height == 0 {
            return Err(EngineError::ImageSmallerThanCell {
                width: image_width,
                height: image_height,
                node_size: config.node_size,
            });
        }

        let mut cells = vec![false; (width as usize) * (height as usize)];
        for y in 0..height {
            for x in 0..width {
                let center_x = x * config.node_size + config.node_size / 2;
                let center_y = y * config.node_size + config.node_size / 2;
                if center_x < image_width && center_y < image_height {
                    let brightness = raster.pixel(center_x, center_y).brightness();
                    cells[(y * width + x) as usize] = brightness > config.brightness_threshold;
                }
            }
        }

        let walkable = cells.iter().filter(|c| **c).count();
        debug!(width, height, walkable, "sampled walkability grid");

        Ok(Self {
            width,
            height,
            node_size: config.node_size,
            cells,
        })
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cell side length in pixels.
    pub fn node_size(&self) -> u32 {
        self.node_size
    }

    /// True when (x, y) lies inside the grid and is traversable.
    /// Out-of-bounds coordinates are simply not walkable.
    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.cells[(y as u32 * self.width + x as u32) as usize]
    }

    /// Converts a pixel coordinate to the grid cell containing it.
    pub fn pixel_to_cell(&self, px: u32, py: u32) -> (u32, u32) {
        (px / self.node_size, py / self.node_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::Rgb;
    use crate::core_modules::raster::FlatRaster;

    #[test]
    fn light_image_is_fully_walkable() {
        let raster = FlatRaster::filled(40, 40, Rgb::new(255, 255, 255));
        let grid = WalkabilityGrid::from_raster(&raster, &GridConfig::default()).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 4));
        for y in 0..4 {
            for x in 0..4 {
                assert!(grid.is_walkable(x, y));
            }
        }
    }

    #[test]
    fn dark_cells_are_blocked() {
        let mut raster = FlatRaster::filled(40, 40, Rgb::new(255, 255, 255));
        // Blacken the cell whose center is (15, 15).
        raster.fill_rect(10, 10, 19, 19, Rgb::new(0, 0, 0));

        let grid = WalkabilityGrid::from_raster(&raster, &GridConfig::default()).unwrap();
        assert!(!grid.is_walkable(1, 1));
        assert!(grid.is_walkable(0, 0));
        assert!(grid.is_walkable(2, 1));
    }

    #[test]
    fn threshold_is_strict() {
        // Brightness exactly at the threshold is not walkable.
        let at = FlatRaster::filled(10, 10, Rgb::new(200, 200, 200));
        let above = FlatRaster::filled(10, 10, Rgb::new(201, 201, 201));
        let config = GridConfig::default();
        assert!(
            !WalkabilityGrid::from_raster(&at, &config)
                .unwrap()
                .is_walkable(0, 0)
        );
        assert!(
            WalkabilityGrid::from_raster(&above, &config)
                .unwrap()
                .is_walkable(0, 0)
        );
    }

    #[test]
    fn out_of_bounds_is_not_walkable() {
        let raster = FlatRaster::filled(20, 20, Rgb::new(255, 255, 255));
        let grid = WalkabilityGrid::from_raster(&raster, &GridConfig::default()).unwrap();
        assert!(!grid.is_walkable(-1, 0));
        assert!(!grid.is_walkable(0, 2));
        assert!(!grid.is_walkable(5, 5));
    }

    #[test]
    fn degenerate_images_are_rejected() {
        let empty = FlatRaster::new(0, 5, Vec::new());
        assert!(matches!(
            WalkabilityGrid::from_raster(&empty, &GridConfig::default()),
            Err(EngineError::EmptyImage { .. })
        ));

        let sliver = FlatRaster::filled(5, 40, Rgb::new(255, 255, 255));
        assert!(matches!(
            WalkabilityGrid::from_raster(&sliver, &GridConfig::default()),
            Err(EngineError::ImageSmallerThanCell { .. })
        ));
    }

    #[test]
    fn pixel_to_cell_uses_integer_division() {
        let raster = FlatRaster::filled(40, 40, Rgb::new(255, 255, 255));
        let grid = WalkabilityGrid::from_raster(&raster, &GridConfig::default()).unwrap();
        assert_eq!(grid.pixel_to_cell(5, 5), (0, 0));
        assert_eq!(grid.pixel_to_cell(35, 35), (3, 3));
        assert_eq!(grid.pixel_to_cell(10, 9), (1, 0));
    }
}
