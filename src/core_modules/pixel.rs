// THEORY:
// The `Rgb` module is the most fundamental unit of the vision system. It is a
// "dumb" data container for a single 24-bit RGB sample plus a set of
// single-pixel heuristics — metrics that can be computed from this pixel alone,
// with no knowledge of neighbors in space. Anything that needs another pixel
// (color distance, similarity) is expressed as a pairwise method taking the
// other sample explicitly.
//
// Key principles:
// 1) Single-pixel scope: heuristics never read neighbors or image state.
// 2) The classifier and grid builder consume these heuristics directly, so
//    their definitions are the single source of truth for "brightness",
//    "metallic-ness" and friends across the whole engine.

pub type Channel = u8;
pub type Brightness = f64;
pub type ColorDistance = f64;

/// A "dumb" data container representing a single 24-bit RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    /// The red channel value (0-255).
    pub red: Channel,
    /// The green channel value (0-255).
    pub green: Channel,
    /// The blue channel value (0-255).
    pub blue: Channel,
}

impl Rgb {
    pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
        Self { red, green, blue }
    }

    /// Mean of the three channels. This is the brightness definition used by
    /// the walkability grid ("light floor is walkable") and the classifier's
    /// metallic test.
    pub fn brightness(&self) -> Brightness {
        (self.red as f64 + self.green as f64 + self.blue as f64) / 3.0
    }

    /// Largest pairwise difference between channels. Near-equal channels read
    /// as gray/metallic; a large spread reads as a saturated color.
    pub fn max_channel_difference(&self) -> u8 {
        let rg = self.red.abs_diff(self.green);
        let gb = self.green.abs_diff(self.blue);
        let rb = self.red.abs_diff(self.blue);
        rg.max(gb).max(rb)
    }

    /// Ratio of red to the other two channels, the primary blood indicator.
    /// The +1 in the denominator guards against division by zero on pure red.
    pub fn red_dominance(&self) -> f64 {
        self.red as f64 / (self.green as f64 + self.blue as f64 + 1.0)
    }

    /// Euclidean distance between two colors in RGB space.
    pub fn color_distance(&self, other: &Rgb) -> ColorDistance {
        let dr = self.red as f64 - other.red as f64;
        let dg = self.green as f64 - other.green as f64;
        let db = self.blue as f64 - other.blue as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(p: image::Rgb<u8>) -> Self {
        Rgb::new(p.0[0], p.0[1], p.0[2])
    }
}
