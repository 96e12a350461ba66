// -----------------------------------------------------------------------------
// Finite-difference gradient descent
// -----------------------------------------------------------------------------

use super::Frame;
use crate::cell::{Cell, CellParam, ParamDeltas};
use crate::error::FitResult;

/// Outcome of one full gradient pass.
#[derive(Clone, Debug)]
pub struct GradientPass<P: CellParam> {
    pub cost_before: f64,
    pub cost_after: f64,
    /// Applied shift per cell, in cell order.
    pub directions: Vec<ParamDeltas<P>>,
}

impl<P: CellParam> GradientPass<P> {
    pub fn improvement(&self) -> f64 {
        self.cost_before - self.cost_after
    }
}

impl<C: Cell> Frame<C> {
    /// One coordinate-wise finite-difference step over every tunable parameter
    /// of every cell.
    ///
    /// Each parameter is probed by re-rendering the whole stack with that cell
    /// shifted by `moving_delta`; the gradient estimate is
    /// `(probe_cost - cost) / epsilon` and the step is `-learning_rate * gradient`.
    /// All steps are computed against the same baseline and applied together,
    /// then committed unconditionally, even when the cost goes up.
    ///
    /// A Frame whose cost is already zero reproduces the real stack exactly; the
    /// pass is a no-op there.
    pub fn gradient_descent(&mut self) -> FitResult<GradientPass<C::Param>> {
        let orig_cost = self.cost;
        let settings = self.gradient;

        if orig_cost <= 0.0 {
            tracing::debug!(image = %self.image_name(), "gradient pass skipped at zero cost");
            return Ok(GradientPass {
                cost_before: orig_cost,
                cost_after: orig_cost,
                directions: vec![ParamDeltas::zero(); self.cells.len()],
            });
        }

        let mut directions = Vec::with_capacity(self.cells.len());
        for (index, cell) in self.cells.iter().enumerate() {
            let mut direction = ParamDeltas::zero();
            for &param in <C::Param as CellParam>::ALL {
                let probe = cell.shifted(&ParamDeltas::single(param, settings.moving_delta));
                let probe_stack = self.render_candidate(Some((index, &probe)))?;
                let probe_cost = self.cost_of(&probe_stack)?;
                let gradient = (probe_cost - orig_cost) / settings.epsilon;
                direction.set(param, -settings.learning_rate * gradient);
            }
            directions.push(direction);
        }

        let cells: Vec<C> = self
            .cells
            .iter()
            .zip(&directions)
            .map(|(cell, direction)| cell.shifted(direction))
            .collect();
        let synth_stack = super::render::render_stack(
            &cells,
            &self.config,
            &self.z_slices,
            self.real_stack.width(),
            self.real_stack.height(),
        )?;
        let new_cost = self.cost_of(&synth_stack)?;
        self.install(cells, synth_stack, new_cost);

        if new_cost > orig_cost {
            tracing::warn!(
                image = %self.image_name(),
                cost_before = orig_cost,
                cost_after = new_cost,
                "gradient pass increased cost"
            );
        } else {
            tracing::debug!(
                image = %self.image_name(),
                cost_before = orig_cost,
                cost_after = new_cost,
                "gradient pass"
            );
        }

        Ok(GradientPass { cost_before: orig_cost, cost_after: new_cost, directions })
    }
}
