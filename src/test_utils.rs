//! Shared fixtures for unit tests.

use rand::Rng;

use crate::cell::{Cell, CellParam, ParamDeltas};
use crate::config::SimulationConfig;
use crate::engine::{blend_over, render_stack, z_slice_depths, ImageStack, Plane, RgbPlane};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BarParam {
    X,
}

impl CellParam for BarParam {
    const ALL: &'static [Self] = &[BarParam::X];

    fn index(self) -> usize {
        0
    }

    fn label(self) -> &'static str {
        "x"
    }
}

/// Full-height vertical bar centred on column `x`, identical on every slice.
/// Only `x` is tunable, which keeps gradient signs easy to reason about.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BarCell {
    pub x: f64,
    pub width: f64,
    pub intensity: f32,
}

impl BarCell {
    pub(crate) fn new(x: f64, width: f64, intensity: f32) -> Self {
        Self { x, width, intensity }
    }

    fn coverage(&self, col: f64) -> f32 {
        (self.width / 2.0 + 0.5 - (col - self.x).abs()).clamp(0.0, 1.0) as f32
    }
}

impl Cell for BarCell {
    type Param = BarParam;

    fn name(&self) -> &str {
        "bar"
    }

    fn param(&self, _param: BarParam) -> f64 {
        self.x
    }

    fn render(&self, canvas: &mut Plane, config: &SimulationConfig, _z: f64) {
        let pad = config.padding as f64;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                let cov = self.coverage(x as f64 - pad);
                let mut v = canvas.get(x, y);
                blend_over(&mut v, self.intensity, cov);
                canvas.set(x, y, v);
            }
        }
    }

    fn render_outline(&self, canvas: &mut RgbPlane, config: &SimulationConfig, color: [f32; 3], _z: f64) {
        let pad = config.padding as f64;
        let left = (self.x - self.width / 2.0 + pad).round();
        if left >= 0.0 && (left as usize) < canvas.width() {
            for y in 0..canvas.height() {
                canvas.set(left as usize, y, color);
            }
        }
    }

    fn perturbed<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self { x: self.x + rng.gen_range(-1.0..1.0), ..self.clone() }
    }

    fn shifted(&self, deltas: &ParamDeltas<BarParam>) -> Self {
        Self { x: self.x + deltas.get(BarParam::X), ..self.clone() }
    }
}

pub(crate) fn sphere_config(z_slices: usize, padding: usize) -> SimulationConfig {
    SimulationConfig { z_slices, padding, ..Default::default() }
}

/// Unpadded real stack that `cells` reproduce exactly when `config.padding == 0`.
/// With padding the border pixels differ wherever a cell reaches the edge.
pub(crate) fn real_stack_for<C: Cell>(
    cells: &[C],
    config: &SimulationConfig,
    width: usize,
    height: usize,
) -> ImageStack {
    let unpadded = SimulationConfig { padding: 0, ..config.clone() };
    render_stack(cells, &unpadded, &z_slice_depths(config), width, height).unwrap()
}
