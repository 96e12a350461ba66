// -----------------------------------------------------------------------------
// Synthetic stack rendering
// -----------------------------------------------------------------------------
use crate::cell::Cell;
use crate::config::SimulationConfig;
use crate::error::{FitError, FitResult};

use super::{ImageStack, Plane, RgbPlane};

/// Renders `cells` into a fresh stack of `width`×`height` slices, one per depth
/// in `z_slices`. Every slice starts at the background value and cells are drawn
/// in sequence order, so later cells blend over earlier ones.
pub fn render_stack<C: Cell>(
    cells: &[C],
    config: &SimulationConfig,
    z_slices: &[f64],
    width: usize,
    height: usize,
) -> FitResult<ImageStack> {
    render_stack_with(cells, None, config, z_slices, width, height)
}

/// Same as [`render_stack`], except `replaced = Some((i, cell))` draws `cell`
/// in place of `cells[i]`. Nothing is mutated, so candidates can be scored
/// without touching committed state.
pub(crate) fn render_stack_with<C: Cell>(
    cells: &[C],
    replaced: Option<(usize, &C)>,
    config: &SimulationConfig,
    z_slices: &[f64],
    width: usize,
    height: usize,
) -> FitResult<ImageStack> {
    if cells.is_empty() {
        return Err(FitError::NoCells);
    }
    if let Some((index, _)) = replaced {
        if index >= cells.len() {
            return Err(FitError::CellIndexOutOfRange { index, len: cells.len() });
        }
    }

    let planes = z_slices
        .iter()
        .map(|&z| {
            let mut canvas = Plane::filled(width, height, config.background_color);
            for (i, cell) in cells.iter().enumerate() {
                let cell = match replaced {
                    Some((ri, candidate)) if ri == i => candidate,
                    _ => cell,
                };
                cell.render(&mut canvas, config, z);
            }
            canvas
        })
        .collect();
    Ok(ImageStack::from_planes_unchecked(width, height, planes))
}

/// Every slice of `real` in RGB with each cell's outline at that slice's depth.
pub fn render_outlines<C: Cell>(
    real: &ImageStack,
    cells: &[C],
    config: &SimulationConfig,
    z_slices: &[f64],
) -> Vec<RgbPlane> {
    real.planes()
        .iter()
        .zip(z_slices)
        .map(|(plane, &z)| {
            let mut frame = RgbPlane::from_gray(plane);
            for cell in cells {
                cell.render_outline(&mut frame, config, config.outline_color, z);
            }
            frame
        })
        .collect()
}
