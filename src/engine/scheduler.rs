// -----------------------------------------------------------------------------
// Step scheduler:
// - Every `gradient_interval`-th iteration: one full gradient pass
// - Otherwise: one perturbation trial
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Perturb,
    GradientDescent,
}

impl StepKind {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        match self {
            StepKind::Perturb => 0,
            StepKind::GradientDescent => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepKind::Perturb => "perturb",
            StepKind::GradientDescent => "gradient",
        }
    }
}

pub(crate) struct StepScheduler {
    gradient_interval: usize,
    proposals: [u64; StepKind::COUNT],
    accepts: [u64; StepKind::COUNT],
}

impl StepScheduler {
    /// `gradient_interval == 0` never schedules a gradient pass.
    pub(crate) fn new(gradient_interval: usize) -> Self {
        Self {
            gradient_interval,
            proposals: [0; StepKind::COUNT],
            accepts: [0; StepKind::COUNT],
        }
    }

    /// Step for the zero-based `iteration`.
    pub(crate) fn next_step(&self, iteration: u64) -> StepKind {
        let n = self.gradient_interval as u64;
        if n > 0 && (iteration + 1) % n == 0 {
            StepKind::GradientDescent
        } else {
            StepKind::Perturb
        }
    }

    /// Gradient passes always commit, so they are always recorded as accepted.
    pub(crate) fn record_outcome(&mut self, step: StepKind, accepted: bool) {
        let i = step.index();
        self.proposals[i] = self.proposals[i].saturating_add(1);
        if accepted {
            self.accepts[i] = self.accepts[i].saturating_add(1);
        }
    }

    pub(crate) fn acceptance_rates(&self) -> [f32; StepKind::COUNT] {
        let mut rates = [0.0; StepKind::COUNT];
        for (i, r) in rates.iter_mut().enumerate() {
            if self.proposals[i] > 0 {
                *r = (self.accepts[i] as f32) / (self.proposals[i] as f32);
            }
        }
        rates
    }
}
