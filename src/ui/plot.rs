use eframe::egui::{self, Color32, Rect, RichText, Sense, Stroke, StrokeKind, Ui, pos2, vec2};
use egui_plot::{Bar, BarChart, HLine, LineStyle, Plot, PlotPoint, Points, Text};

use crate::charts::{BarChartSpec, ScatterSpec, TreemapSpec};
use crate::charts::treemap::{TreemapTile, layout};
use crate::color::{emission_color, generate_palette};

const CHART_HEIGHT: f32 = 260.0;
const TREEMAP_HEIGHT: f32 = 380.0;

// ---------------------------------------------------------------------------
// Bar chart with mean reference line
// ---------------------------------------------------------------------------

pub fn render_bar(ui: &mut Ui, spec: &BarChartSpec) {
    ui.label(RichText::new(&spec.title).strong());

    let bars: Vec<Bar> = spec
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Bar::new(i as f64, b.mean)
                .name(&b.label)
                .width(0.7)
                .fill(emission_color(b.mean, spec.color_range))
        })
        .collect();

    let labels: Vec<String> = spec.bars.iter().map(|b| b.label.clone()).collect();
    let annotation_x = (spec.bars.len() as f64 - 1.0).max(0.0) * 0.95;

    Plot::new(&spec.title)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
            plot_ui.hline(
                HLine::new(spec.mean_line)
                    .color(Color32::BLUE)
                    .style(LineStyle::dashed_dense()),
            );
            plot_ui.text(
                Text::new(
                    PlotPoint::new(annotation_x, spec.mean_line),
                    RichText::new(&spec.mean_label).color(Color32::BLUE),
                )
                .anchor(egui::Align2::RIGHT_BOTTOM),
            );
        });
}

// ---------------------------------------------------------------------------
// Grouped scatter plot
// ---------------------------------------------------------------------------

pub fn render_scatter(ui: &mut Ui, spec: &ScatterSpec) {
    ui.label(RichText::new(&spec.title).strong());

    let palette = generate_palette(spec.groups.len());
    let alpha = (spec.opacity * 255.0) as u8;

    Plot::new(&spec.title)
        .height(CHART_HEIGHT)
        .x_axis_label(&spec.x_label)
        .y_axis_label(&spec.y_label)
        .show(ui, |plot_ui| {
            for (group, base_color) in spec.groups.iter().zip(&palette) {
                let color = Color32::from_rgba_unmultiplied(
                    base_color.r(),
                    base_color.g(),
                    base_color.b(),
                    alpha,
                );
                plot_ui.points(
                    Points::new(group.points.clone())
                        .name(&group.label)
                        .color(color)
                        .radius(2.5),
                );
            }
        });

    // Legend below the plot area, horizontally centered.
    ui.vertical_centered(|ui: &mut Ui| {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            for (group, color) in spec.groups.iter().zip(&palette) {
                ui.label(RichText::new("●").color(*color));
                ui.label(&group.label);
                ui.add_space(8.0);
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Treemap
// ---------------------------------------------------------------------------

pub fn render_treemap(ui: &mut Ui, spec: &TreemapSpec) {
    let width = ui.available_width().max(200.0);
    let (response, painter) = ui.allocate_painter(vec2(width, TREEMAP_HEIGHT), Sense::hover());
    let area = response.rect;

    let tiles = layout(
        spec,
        area.left() as f64,
        area.top() as f64,
        area.width() as f64,
        area.height() as f64,
    );

    // Leaves first (fills), then shallow outlines and labels on top.
    for tile in tiles.iter().filter(|t| t.is_leaf) {
        painter.rect_filled(
            tile_rect(tile).shrink(0.5),
            0.0,
            emission_color(tile.mean_emission, spec.color_range),
        );
    }
    for tile in tiles.iter().filter(|t| !t.is_leaf && t.depth > 0) {
        painter.rect_stroke(
            tile_rect(tile),
            0.0,
            Stroke::new(if tile.depth == 1 { 1.5 } else { 0.5 }, Color32::WHITE),
            StrokeKind::Inside,
        );
    }
    for tile in tiles.iter().filter(|t| t.depth == 1) {
        let rect = tile_rect(tile);
        if rect.width() > 60.0 && rect.height() > 18.0 {
            painter.text(
                rect.left_top() + vec2(4.0, 2.0),
                egui::Align2::LEFT_TOP,
                &tile.label,
                egui::FontId::proportional(12.0),
                Color32::WHITE,
            );
        }
    }
}

fn tile_rect(tile: &TreemapTile) -> Rect {
    Rect::from_min_size(
        pos2(tile.x as f32, tile.y as f32),
        vec2(tile.w as f32, tile.h as f32),
    )
}
