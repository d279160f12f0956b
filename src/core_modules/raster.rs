// THEORY:
// The engine treats its input image as an opaque raster: something with a
// width, a height, and a way to read the RGB triple at a coordinate. The
// algorithms never write to the input — all outputs are fresh values — so the
// trait surface is read-only by construction.
//
// The `image` crate's `RgbImage` is the expected concrete input in real use;
// tests use the in-memory `FlatRaster` to build exact pixel patterns without
// touching the encoder stack.

use crate::core_modules::pixel::Rgb;

/// Read-only view of a 24-bit RGB raster.
///
/// Coordinates are in pixel space with the origin at the top-left corner.
/// Callers must only pass coordinates inside `width() x height()`.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> Rgb;

    /// Total pixel count, used for degenerate-input checks and grid sizing.
    fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

impl Raster for image::RgbImage {
    fn width(&self) -> u32 {
        image::RgbImage::width(self)
    }

    fn height(&self) -> u32 {
        image::RgbImage::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb {
        (*self.get_pixel(x, y)).into()
    }
}

/// An owned, flat pixel buffer. Handy for synthetic scenes in tests and for
/// callers that already hold decoded pixel data.
#[derive(Debug, Clone)]
pub struct FlatRaster {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl FlatRaster {
    /// Builds a raster from row-major pixel data. The buffer length must be
    /// exactly `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Self {
        assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize),
            "pixel buffer length must match raster dimensions"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Builds a raster filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)],
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        let index = (y * self.width + x) as usize;
        self.pixels[index] = color;
    }

    /// Fills an axis-aligned rectangle, clamped to the raster bounds.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb) {
        for y in y0..=y1.min(self.height.saturating_sub(1)) {
            for x in x0..=x1.min(self.width.saturating_sub(1)) {
                self.set_pixel(x, y, color);
            }
        }
    }
}

impl Raster for FlatRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb {
        self.pixels[(y * self.width + x) as usize]
    }
}
