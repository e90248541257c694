use palette::{Mix, Srgb};

use crate::data::model::Dataset;

/// An 8-bit RGB triple as handed to the renderer.
pub type Rgb8 = [u8; 3];

// ---------------------------------------------------------------------------
// Continuous colour scale: concentration → colour
// ---------------------------------------------------------------------------

/// Blue (lowest concentration) to red (highest), interpolated in sRGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
    low: Srgb,
    high: Srgb,
}

impl ColorScale {
    /// Scale spanning `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        ColorScale {
            min,
            max,
            low: Srgb::new(0.0f32, 0.0, 1.0),
            high: Srgb::new(1.0f32, 0.0, 0.0),
        }
    }

    /// Scale spanning the concentrations of `dataset`.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let (min, max) = dataset.concentration_range().unwrap_or((0.0, 1.0));
        Self::new(min, max)
    }

    /// Position of `value` on the scale, clamped to `[0, 1]`.
    pub fn position(&self, value: f64) -> f32 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / range).clamp(0.0, 1.0) as f32
    }

    /// Colour for a concentration value.
    pub fn color_for(&self, value: f64) -> Rgb8 {
        let mixed = self.low.mix(self.high, self.position(value));
        let rgb: Srgb<u8> = mixed.into_format();
        [rgb.red, rgb.green, rgb.blue]
    }

    /// Colours of every record, in dataset order.
    pub fn colors(&self, dataset: &Dataset) -> Vec<Rgb8> {
        dataset
            .records()
            .iter()
            .map(|r| self.color_for(r.concentration))
            .collect()
    }
}
