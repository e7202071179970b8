//! The overlay control panel.

use crate::color;
use crate::config::{ColorMode, LiveSettings};
use crate::staging::DimensionLabels;

pub const LEGEND_STEPS: usize = 40;
const LEGEND_SIZE: egui::Vec2 = egui::vec2(200.0, 20.0);

/// What the panel knows about the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionInfo {
    pub id: i32,
    pub ticker: Option<String>,
    pub value: Option<f32>,
}

/// Requests from the panel that the viewer acts on after the frame is built.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelResponse {
    pub reset_camera: bool,
}

/// Colors of the legend bar, sampled evenly over [0, 1] inclusive.
pub fn legend_colors(mode: ColorMode) -> Vec<egui::Color32> {
    (0..LEGEND_STEPS)
        .map(|i| {
            let t = i as f32 / (LEGEND_STEPS - 1) as f32;
            let [r, g, b] = color::to_rgb8(color::map(mode, t));
            egui::Color32::from_rgb(r, g, b)
        })
        .collect()
}

pub fn draw_controls(
    ctx: &egui::Context,
    live: &mut LiveSettings,
    labels: &DimensionLabels,
    selection: Option<&SelectionInfo>,
) -> PanelResponse {
    let mut response = PanelResponse::default();

    egui::Window::new("Global Controls")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            let dt = ctx.input(|i| i.stable_dt).max(f32::EPSILON);
            ui.label(format!("FPS: {:.1}", 1.0 / dt));
            ui.separator();

            ui.label("Appearance");
            ui.add(egui::Slider::new(&mut live.point_scale, 0.01..=0.2).text("Point Size"));
            ui.add(egui::Slider::new(&mut live.global_alpha, 0.0..=1.0).text("Alpha"));
            egui::ComboBox::from_label("Color Mode")
                .selected_text(live.color_mode.label())
                .show_ui(ui, |ui| {
                    for mode in ColorMode::ALL {
                        ui.selectable_value(&mut live.color_mode, mode, mode.label());
                    }
                });
            if ui.button("Reset Camera").clicked() {
                response.reset_camera = true;
            }

            ui.separator();
            ui.label("Time Series");
            ui.add(egui::Slider::new(&mut live.morph_time, 0.0..=1.0).text("Time Morph"));

            ui.separator();
            ui.label("Dimensions");
            ui.label(format!("• Color: {}", labels.color));
            axis_label(ui, "X:", egui::Color32::from_rgb(255, 77, 77), &labels.x);
            axis_label(ui, "Y:", egui::Color32::from_rgb(77, 255, 77), &labels.y);
            axis_label(ui, "Z:", egui::Color32::from_rgb(77, 77, 255), &labels.z);

            ui.separator();
            ui.label("Selection");
            match selection {
                Some(sel) => {
                    ui.label(format!("Selected ID: {}", sel.id));
                    if let Some(ticker) = sel.ticker.as_deref().filter(|t| !t.is_empty()) {
                        ui.label(format!("Ticker: {ticker}"));
                    }
                    if let Some(value) = sel.value {
                        ui.label(format!("Value: {value:.4}"));
                    }
                }
                None => {
                    ui.label("None");
                }
            }

            ui.separator();
            ui.label("Color Legend");
            draw_legend(ui, live);
            ui.checkbox(&mut live.filter.enabled, "Color Filter");
            if live.filter.enabled {
                ui.add(egui::Slider::new(&mut live.filter.value, 0.0..=1.0).text("Filter Value"));
                ui.add(
                    egui::Slider::new(&mut live.filter.tolerance, 0.01..=0.2)
                        .text("Tolerance")
                        .prefix("±"),
                );
            }
        });

    response
}

fn axis_label(ui: &mut egui::Ui, axis: &str, color: egui::Color32, text: &str) {
    ui.horizontal(|ui| {
        ui.colored_label(color, axis);
        ui.label(text);
    });
}

fn draw_legend(ui: &mut egui::Ui, live: &LiveSettings) {
    let (rect, _) = ui.allocate_exact_size(LEGEND_SIZE, egui::Sense::hover());
    let painter = ui.painter();
    let step = rect.width() / LEGEND_STEPS as f32;

    for (i, col) in legend_colors(live.color_mode).into_iter().enumerate() {
        let x0 = rect.left() + i as f32 * step;
        let cell = egui::Rect::from_min_max(
            egui::pos2(x0, rect.top()),
            egui::pos2(x0 + step, rect.bottom()),
        );
        painter.rect_filled(cell, 0.0, col);
    }

    if live.filter.enabled {
        let x = rect.left() + live.filter.value * rect.width();
        painter.line_segment(
            [egui::pos2(x, rect.top() - 5.0), egui::pos2(x, rect.bottom() + 5.0)],
            egui::Stroke::new(3.0, egui::Color32::WHITE),
        );
    }

    ui.horizontal(|ui| {
        ui.label("0.0");
        ui.add_space(LEGEND_SIZE.x - 50.0);
        ui.label("1.0");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_spans_the_full_map() {
        let colors = legend_colors(ColorMode::Heatmap);
        assert_eq!(colors.len(), LEGEND_STEPS);
        assert_eq!(colors[0], egui::Color32::from_rgb(0, 0, 255));
        assert_eq!(colors[LEGEND_STEPS - 1], egui::Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn grayscale_legend_is_monotonic() {
        let colors = legend_colors(ColorMode::Grayscale);
        assert!(colors.windows(2).all(|w| w[0].r() <= w[1].r()));
        assert_eq!(colors[0], egui::Color32::from_rgb(0, 0, 0));
    }

    #[test]
    fn panel_runs_headless_and_keeps_settings_in_range() {
        let ctx = egui::Context::default();
        let mut live = LiveSettings::from_config(&crate::config::RendererConfig::default());
        let labels = DimensionLabels::default();
        let selection = SelectionInfo {
            id: 3,
            ticker: Some("AAPL".into()),
            value: Some(0.25),
        };

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            let response = draw_controls(ctx, &mut live, &labels, Some(&selection));
            assert!(!response.reset_camera);
        });

        assert_eq!(live.point_scale, 0.05);
        assert_eq!(live.morph_time, 0.0);
    }
}
