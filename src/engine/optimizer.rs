//! Optimizer: drives a Frame with perturbation trials and gradient passes.
//!
//! Responsibilities:
//! - Owns the seeded RNG, so a run is reproducible from its config.
//! - Asks the step scheduler which step to take and the acceptance policy
//!   whether to keep a trial.
//! - Keeps running statistics; the Frame's cached cost is the only source of
//!   truth for the current cost.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg as PcgRng;

use super::{AcceptancePolicy, FitStats, Frame, StepKind, StepScheduler, TrialDecision};
use crate::cell::Cell;
use crate::config::OptimizerConfig;
use crate::error::FitResult;

pub struct Optimizer {
    config: OptimizerConfig,
    rng: PcgRng,
    scheduler: StepScheduler,
    stats: FitStats,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> FitResult<Self> {
        config.validate()?;
        Ok(Self {
            rng: PcgRng::seed_from_u64(config.seed),
            scheduler: StepScheduler::new(config.gradient_interval),
            stats: FitStats::default(),
            config,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn stats(&self) -> &FitStats {
        &self.stats
    }

    /// Runs `iterations_per_cell * frame.len()` iterations and returns the
    /// statistics of this run.
    pub fn run<C: Cell>(&mut self, frame: &mut Frame<C>) -> FitResult<FitStats> {
        let total = self.config.iterations_per_cell.saturating_mul(frame.len());
        let mut policy = AcceptancePolicy::new(self.config.acceptance, total);

        self.stats = FitStats {
            initial_cost: Some(frame.cost()),
            ..Default::default()
        };
        self.stats.observe_cost(frame.cost());

        tracing::info!(
            image = %frame.image_name(),
            cells = frame.len(),
            iterations = total,
            cost = frame.cost(),
            "fit started"
        );

        for iteration in 0..total as u64 {
            self.step(frame, &mut policy, iteration)?;
            policy.tick();

            if self.config.log_interval > 0 && (iteration + 1) % self.config.log_interval as u64 == 0 {
                tracing::info!(
                    image = %frame.image_name(),
                    iteration = iteration + 1,
                    cost = frame.cost(),
                    best = self.stats.best_cost.unwrap_or(frame.cost()),
                    accept_pct = self.stats.acceptance_percent(),
                    "fit progress"
                );
            }
        }

        self.stats.anneal_temp = policy.temp();
        self.stats.total_uphill_attempts = policy.uphill_attempts();
        self.stats.total_uphill_accepts = policy.uphill_accepts();
        let rates = self.scheduler.acceptance_rates();
        self.stats.step_acceptance = [StepKind::Perturb, StepKind::GradientDescent]
            .iter()
            .map(|k| (k.label().to_string(), rates[k.index()]))
            .collect();

        tracing::info!(
            image = %frame.image_name(),
            initial = self.stats.initial_cost.unwrap_or_default(),
            cost = frame.cost(),
            accepts = self.stats.total_accepts,
            proposals = self.stats.total_proposals,
            gradient_passes = self.stats.gradient_passes,
            "fit finished"
        );
        Ok(self.stats.clone())
    }

    fn step<C: Cell>(
        &mut self,
        frame: &mut Frame<C>,
        policy: &mut AcceptancePolicy,
        iteration: u64,
    ) -> FitResult<()> {
        let kind = self.scheduler.next_step(iteration);
        match kind {
            StepKind::Perturb => {
                let trial = frame.begin_trial(&mut self.rng)?;
                let improvement = trial.improvement();
                let decision = policy.decide(&mut self.rng, improvement);
                frame.resolve(trial, decision)?;

                let accepted = decision == TrialDecision::Accept;
                self.stats.total_proposals = self.stats.total_proposals.saturating_add(1);
                if accepted {
                    self.stats.total_accepts = self.stats.total_accepts.saturating_add(1);
                    self.stats.last_accept_improvement = Some(improvement);
                }
                self.scheduler.record_outcome(kind, accepted);
            }
            StepKind::GradientDescent => {
                frame.gradient_descent()?;
                self.stats.gradient_passes = self.stats.gradient_passes.saturating_add(1);
                self.scheduler.record_outcome(kind, true);
            }
        }
        self.stats.iterations = iteration + 1;
        self.stats.observe_cost(frame.cost());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SphereCell;
    use crate::config::{AcceptanceConfig, GradientSettings, SimulationConfig};
    use crate::test_utils::{real_stack_for, sphere_config, BarCell};

    fn sphere_frame() -> Frame<SphereCell> {
        let cfg = sphere_config(3, 2);
        let target = vec![
            SphereCell::new("a", 8.0, 9.0, 0.0, 4.0),
            SphereCell::new("b", 21.0, 12.0, 0.0, 3.5),
        ];
        let real = real_stack_for(&target, &cfg, 30, 22);
        let start = vec![
            SphereCell::new("a", 10.0, 8.0, 0.5, 3.0),
            SphereCell::new("b", 19.0, 13.0, -0.5, 3.0),
        ];
        Frame::new(&real, cfg, start, "out", "opt").unwrap()
    }

    #[test]
    fn greedy_run_never_increases_cost() {
        let mut frame = sphere_frame();
        let initial = frame.cost();
        let mut opt = Optimizer::new(OptimizerConfig { iterations_per_cell: 60, ..Default::default() }).unwrap();
        let stats = opt.run(&mut frame).unwrap();

        assert_eq!(stats.iterations, 120);
        assert_eq!(stats.total_proposals, 120);
        assert!(frame.cost() <= initial);
        assert!(stats.cost_history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(stats.current_cost, Some(frame.cost()));
        assert_eq!(stats.initial_cost, Some(initial));
        assert_eq!(frame.revision(), stats.total_accepts);
        assert_eq!(frame.render().unwrap(), *frame.synth_stack());
    }

    #[test]
    fn same_seed_same_result() {
        let cfg = OptimizerConfig { iterations_per_cell: 20, seed: 77, ..Default::default() };
        let mut a = sphere_frame();
        let mut b = sphere_frame();
        Optimizer::new(cfg.clone()).unwrap().run(&mut a).unwrap();
        Optimizer::new(cfg).unwrap().run(&mut b).unwrap();
        assert_eq!(a.cells(), b.cells());
        assert_eq!(a.cost(), b.cost());
    }

    #[test]
    fn gradient_interval_interleaves_passes() {
        let cfg = SimulationConfig::default();
        let real = real_stack_for(&[BarCell::new(12.0, 4.0, 1.0)], &cfg, 32, 2);
        let mut frame = Frame::new(&real, cfg, vec![BarCell::new(10.0, 4.0, 1.0)], "out", "bar")
            .unwrap()
            .with_gradient_settings(GradientSettings { moving_delta: 0.25, epsilon: 1.0, learning_rate: 0.01 })
            .unwrap();

        let opt_cfg = OptimizerConfig { iterations_per_cell: 9, gradient_interval: 3, ..Default::default() };
        let stats = Optimizer::new(opt_cfg).unwrap().run(&mut frame).unwrap();
        assert_eq!(stats.gradient_passes, 3);
        assert_eq!(stats.total_proposals, 6);
        assert_eq!(stats.step_acceptance[1], ("gradient".to_string(), 1.0));
    }

    #[test]
    fn anneal_reports_final_temperature() {
        let mut frame = sphere_frame();
        let cfg = OptimizerConfig {
            iterations_per_cell: 10,
            acceptance: AcceptanceConfig::Anneal { start_temp: 1.0, end_temp: 0.1 },
            ..Default::default()
        };
        let stats = Optimizer::new(cfg).unwrap().run(&mut frame).unwrap();
        let t = stats.anneal_temp.unwrap();
        assert!((t - 0.1).abs() < 1e-6);
        assert!(stats.best_cost.unwrap() <= stats.initial_cost.unwrap());
    }

    #[test]
    fn invalid_acceptance_config_is_rejected() {
        let cfg = OptimizerConfig {
            acceptance: AcceptanceConfig::Anneal { start_temp: -1.0, end_temp: 0.1 },
            ..Default::default()
        };
        assert!(Optimizer::new(cfg).is_err());
    }

}
