// -----------------------------------------------------------------------------
// Fit statistics reported by the optimizer
// -----------------------------------------------------------------------------

use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
pub struct FitStats {
    pub iterations: u64,

    pub total_proposals: u64,
    pub total_accepts: u64,
    pub gradient_passes: u64,

    pub initial_cost: Option<f64>,
    pub current_cost: Option<f64>,
    pub best_cost: Option<f64>,
    pub last_accept_improvement: Option<f64>,

    pub cost_history: Vec<f64>,

    pub anneal_temp: Option<f64>,

    // Uphill acceptance (totals)
    pub total_uphill_attempts: u64,
    pub total_uphill_accepts: u64,

    /// Acceptance rate per step kind, by label.
    pub step_acceptance: Vec<(String, f32)>,
}

impl FitStats {
    pub const HISTORY_LEN: usize = 512;

    pub fn push_cost_history(&mut self, v: f64) {
        self.cost_history.push(v);
        if self.cost_history.len() > Self::HISTORY_LEN {
            let extra = self.cost_history.len() - Self::HISTORY_LEN;
            self.cost_history.drain(0..extra);
        }
    }

    /// Records the committed cost after one iteration.
    pub(crate) fn observe_cost(&mut self, cost: f64) {
        self.current_cost = Some(cost);
        if self.best_cost.map_or(true, |b| cost < b) {
            self.best_cost = Some(cost);
        }
        self.push_cost_history(cost);
    }

    pub fn acceptance_percent(&self) -> f32 {
        if self.total_proposals == 0 {
            return 0.0;
        }
        100.0 * self.total_accepts as f32 / self.total_proposals as f32
    }
}
