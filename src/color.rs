use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::charts::ColorRange;

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Continuous emissions scale: green (low) → yellow → red (high)
// ---------------------------------------------------------------------------

/// Maps an emissions value onto a green-to-red ramp over a shared
/// `[min, max]` range, so the table gradient, the bar charts, and the
/// treemap agree on what a given colour means within one interaction.
pub fn emission_color(value: f64, range: ColorRange) -> Color32 {
    let t = range.normalize(value) as f32;
    // Hue 120° (green) down to 0° (red).
    let hsl = Hsl::new(120.0 * (1.0 - t), 0.72, 0.5);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Same ramp at reduced alpha, for table-cell backgrounds.
pub fn emission_background(value: f64, range: ColorRange) -> Color32 {
    let c = emission_color(value, range);
    Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 90)
}
