//! Pure chart-spec builders.
//!
//! Each builder turns a (possibly filtered) frame plus column names into
//! a renderable description; no egui types, no drawing. All three charts
//! in one interaction share a single emissions colour range so colours
//! stay comparable across views.

pub mod bar;
pub mod scatter;
pub mod treemap;

pub use bar::{BarChartSpec, bar_chart};
pub use scatter::{ScatterSpec, scatter_chart};
pub use treemap::{TreemapSpec, treemap};

/// Shared `[min, max]` colour bounds for the current interaction, derived
/// once from the filtered frame's emissions column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    pub min: f64,
    pub max: f64,
}

impl ColorRange {
    pub fn from_frame(frame: &crate::data::frame::DataFrame, column: &str) -> Option<Self> {
        frame
            .numeric_bounds(column)
            .map(|(min, max)| ColorRange { min, max })
    }

    /// Position of `v` within the range, clamped to `[0, 1]`.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return 0.5;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }
}
