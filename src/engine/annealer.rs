// -----------------------------------------------------------------------------
// Trial acceptance policy (greedy / threshold / simulated annealing)
// -----------------------------------------------------------------------------

use rand::Rng;

use super::TrialDecision;
use crate::config::AcceptanceConfig;

pub struct AcceptancePolicy {
    kind: AcceptanceConfig,
    temp: f64,
    decay: f64,
    end_temp: f64,

    // acceptance tracking (UPHILL ONLY)
    tried_uphill: u64,
    accepted_uphill: u64,
}

impl AcceptancePolicy {
    /// `total_steps` sets the cooling rate: an annealing schedule reaches
    /// `end_temp` on its last step.
    pub fn new(kind: AcceptanceConfig, total_steps: usize) -> Self {
        let (temp, end_temp, decay) = match kind {
            AcceptanceConfig::Anneal { start_temp, end_temp } => {
                let decay = if total_steps > 1 {
                    (end_temp / start_temp).powf(1.0 / (total_steps - 1) as f64)
                } else {
                    1.0
                };
                (start_temp, end_temp, decay)
            }
            _ => (0.0, 0.0, 1.0),
        };
        Self {
            kind,
            temp,
            decay,
            end_temp,
            tried_uphill: 0,
            accepted_uphill: 0,
        }
    }

    /// Decides a trial from its improvement (`old_cost - new_cost`).
    pub fn decide<R: Rng + ?Sized>(&mut self, rng: &mut R, improvement: f64) -> TrialDecision {
        if self.should_accept(rng, improvement) {
            TrialDecision::Accept
        } else {
            TrialDecision::Reject
        }
    }

    pub fn should_accept<R: Rng + ?Sized>(&mut self, rng: &mut R, improvement: f64) -> bool {
        match self.kind {
            AcceptanceConfig::Greedy => improvement > 0.0,
            AcceptanceConfig::Threshold { min_improvement } => {
                if improvement <= 0.0 {
                    self.tried_uphill += 1;
                }
                let ok = improvement > min_improvement;
                if ok && improvement <= 0.0 {
                    self.accepted_uphill += 1;
                }
                ok
            }
            AcceptanceConfig::Anneal { .. } => {
                // Always accept downhill (not counted as uphill)
                if improvement > 0.0 {
                    return true;
                }
                self.tried_uphill += 1;

                // Metropolis on the raw cost increase
                let p = (improvement / self.temp).exp();
                if rng.gen::<f64>() < p {
                    self.accepted_uphill += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Call once per iteration, whether or not it was a trial.
    pub fn tick(&mut self) {
        if matches!(self.kind, AcceptanceConfig::Anneal { .. }) {
            self.temp = (self.temp * self.decay).max(self.end_temp);
        }
    }

    /// Current temperature, `None` unless annealing.
    pub fn temp(&self) -> Option<f64> {
        matches!(self.kind, AcceptanceConfig::Anneal { .. }).then_some(self.temp)
    }

    pub fn uphill_attempts(&self) -> u64 { self.tried_uphill }
    pub fn uphill_accepts(&self) -> u64 { self.accepted_uphill }
}
