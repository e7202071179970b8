//! Renderer configuration.
//!
//! Window geometry, title and vsync are read once when the render thread
//! opens its window. The visual fields seed the live overlay controls.

/// Scalar-to-color mapping applied to point values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ColorMode {
    /// Blue → cyan → red.
    #[default]
    Heatmap = 0,
    /// Diverging blue → light gray → red.
    CoolWarm = 1,
    Grayscale = 2,
}

impl ColorMode {
    pub const ALL: [ColorMode; 3] = [ColorMode::Heatmap, ColorMode::CoolWarm, ColorMode::Grayscale];

    /// Value written to the scene uniform; the shader treats anything past
    /// `CoolWarm` as grayscale.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::Heatmap => "Heatmap (Blue-Red)",
            ColorMode::CoolWarm => "CoolWarm (Div)",
            ColorMode::Grayscale => "Grayscale",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    // --- Window (applied at construction only) ---
    pub window_width: u32,
    pub window_height: u32,
    pub window_title: String,
    pub vsync: bool,

    // --- Visuals (live-editable from the overlay) ---
    pub point_scale: f32,
    pub global_alpha: f32,
    pub color_mode: ColorMode,
    pub background_color: [f32; 3],

    /// Initial orbit distance of the camera from the origin.
    pub camera_distance: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            window_title: "QsPlot".to_string(),
            vsync: true,
            point_scale: 0.05,
            global_alpha: 1.0,
            color_mode: ColorMode::Heatmap,
            background_color: [0.05, 0.05, 0.05],
            camera_distance: 25.0,
        }
    }
}

/// Value-range filter: fragments whose value deviates from `value` by more
/// than `tolerance` are discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFilter {
    pub enabled: bool,
    pub value: f32,
    pub tolerance: f32,
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            value: 0.5,
            tolerance: 0.05,
        }
    }
}

/// The subset of configuration that changes while the render thread runs.
/// Owned by the render thread and mutated by the overlay panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub point_scale: f32,
    pub global_alpha: f32,
    pub color_mode: ColorMode,
    pub background_color: [f32; 3],
    pub filter: ColorFilter,
    /// Morph interpolation parameter in [0, 1].
    pub morph_time: f32,
}

impl LiveSettings {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            point_scale: config.point_scale,
            global_alpha: config.global_alpha,
            color_mode: config.color_mode,
            background_color: config.background_color,
            filter: ColorFilter::default(),
            morph_time: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RendererConfig::default();
        assert_eq!((cfg.window_width, cfg.window_height), (1280, 720));
        assert_eq!(cfg.window_title, "QsPlot");
        assert!(cfg.vsync);
        assert_eq!(cfg.point_scale, 0.05);
        assert_eq!(cfg.color_mode, ColorMode::Heatmap);
        assert_eq!(cfg.camera_distance, 25.0);
    }

    #[test]
    fn color_mode_indices_follow_shader_branches() {
        let indices: Vec<u32> = ColorMode::ALL.iter().map(|m| m.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn live_settings_start_at_morph_zero_with_filter_off() {
        let live = LiveSettings::from_config(&RendererConfig::default());
        assert_eq!(live.morph_time, 0.0);
        assert!(!live.filter.enabled);
        assert_eq!(live.filter.tolerance, 0.05);
    }
}
