//! Host-side color maps. These mirror `color_map` in `shaders/points.wgsl`
//! exactly; the selected point's color is computed here and handed to the
//! shader, so any drift between the two shows up as broken highlighting.

use crate::config::ColorMode;
use glam::Vec3;

const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const CYAN: Vec3 = Vec3::new(0.0, 1.0, 1.0);
const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);

const COOL: Vec3 = Vec3::new(0.2, 0.4, 1.0);
const NEUTRAL: Vec3 = Vec3::new(0.9, 0.9, 0.9);
const WARM: Vec3 = Vec3::new(1.0, 0.2, 0.2);

/// `mix` as GLSL/WGSL define it, exact at both ends.
#[inline]
fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

#[inline]
fn two_segment(t: f32, lo: Vec3, mid: Vec3, hi: Vec3) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        mix(lo, mid, t * 2.0)
    } else {
        mix(mid, hi, (t - 0.5) * 2.0)
    }
}

pub fn heatmap(t: f32) -> Vec3 {
    two_segment(t, BLUE, CYAN, RED)
}

pub fn cool_warm(t: f32) -> Vec3 {
    two_segment(t, COOL, NEUTRAL, WARM)
}

pub fn grayscale(t: f32) -> Vec3 {
    Vec3::splat(t.clamp(0.0, 1.0))
}

/// Maps a scalar through the active color function.
pub fn map(mode: ColorMode, t: f32) -> Vec3 {
    match mode {
        ColorMode::Heatmap => heatmap(t),
        ColorMode::CoolWarm => cool_warm(t),
        ColorMode::Grayscale => grayscale(t),
    }
}

/// Linear interpolation between the current and target value at `time`,
/// in the same form as the shader's `mix`.
#[inline]
pub fn morph(current: f32, next: f32, time: f32) -> f32 {
    current * (1.0 - time) + next * time
}

/// Color of the selected instance at `time`, or black when the selection is
/// out of range for the current values. A missing target value falls back to
/// the current one.
pub fn selection_color(
    mode: ColorMode,
    values: &[f32],
    next_values: &[f32],
    selected: i32,
    time: f32,
) -> Vec3 {
    let Ok(index) = usize::try_from(selected) else {
        return Vec3::ZERO;
    };
    let Some(&current) = values.get(index) else {
        return Vec3::ZERO;
    };
    let next = next_values.get(index).copied().unwrap_or(current);
    map(mode, morph(current, next, time))
}

/// Converts a normalized color to 8-bit RGB for legends.
pub fn to_rgb8(c: Vec3) -> [u8; 3] {
    [
        (c.x.clamp(0.0, 1.0) * 255.0) as u8,
        (c.y.clamp(0.0, 1.0) * 255.0) as u8,
        (c.z.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}
