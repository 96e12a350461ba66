// src/engine/geom.rs
use super::IntRect;
use crate::config::SimulationConfig;

/// Depth of every z-slice: `z_scaling * (i - n / 2)` for `i` in `0..n`.
/// Symmetric about zero for odd `n`; even counts lean one slice negative.
pub fn z_slice_depths(config: &SimulationConfig) -> Vec<f64> {
    let n = config.z_slices as i64;
    (0..n).map(|i| config.z_scaling * (i - n / 2) as f64).collect()
}

/// Pixel bbox of a disc clamped to the canvas, padded by one pixel for the
/// anti-aliased rim. Empty when the disc lies fully outside.
pub(crate) fn disc_bbox_px(cx: f64, cy: f64, radius: f64, canvas_w: usize, canvas_h: usize) -> IntRect {
    if canvas_w == 0 || canvas_h == 0 || radius.is_nan() || radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
        return IntRect::empty();
    }
    let reach = radius + 1.0;
    let min_x = (cx - reach).floor();
    let min_y = (cy - reach).floor();
    let max_x = (cx + reach).ceil();
    let max_y = (cy + reach).ceil();
    if max_x < 0.0 || max_y < 0.0 || min_x > (canvas_w - 1) as f64 || min_y > (canvas_h - 1) as f64 {
        return IntRect::empty();
    }
    let x0 = min_x.max(0.0) as usize;
    let y0 = min_y.max(0.0) as usize;
    let x1 = (max_x as usize).min(canvas_w - 1);
    let y1 = (max_y as usize).min(canvas_h - 1);
    IntRect {
        x: x0,
        y: y0,
        w: x1 - x0 + 1,
        h: y1 - y0 + 1,
    }
}
