// -----------------------------------------------------------------------------
// Perturbation trials
// -----------------------------------------------------------------------------
//
// A trial swaps one cell for a candidate, renders the candidate sequence and
// scores it. Nothing on the Frame changes until the trial is committed; a
// rollback simply drops it. Commits are checked against the Frame id and
// revision, so a trial from another Frame, or one proposed before another
// commit (or a gradient pass), cannot clobber it.

use rand::Rng;

use super::{Frame, ImageStack};
use crate::cell::Cell;
use crate::error::{FitError, FitResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialDecision {
    Accept,
    Reject,
}

/// A proposed single-cell change with its rendering and costs.
#[derive(Clone, Debug)]
pub struct Trial<C: Cell> {
    index: usize,
    previous: C,
    candidate: C,
    candidate_stack: ImageStack,
    old_cost: f64,
    new_cost: f64,
    frame_id: u64,
    revision: u64,
}

impl<C: Cell> Trial<C> {
    pub fn index(&self) -> usize { self.index }
    /// Cell the trial would replace.
    pub fn previous(&self) -> &C { &self.previous }
    pub fn candidate(&self) -> &C { &self.candidate }
    pub fn candidate_stack(&self) -> &ImageStack { &self.candidate_stack }
    pub fn old_cost(&self) -> f64 { self.old_cost }
    pub fn new_cost(&self) -> f64 { self.new_cost }
    pub fn revision(&self) -> u64 { self.revision }
    /// Id of the Frame that proposed this trial.
    pub fn frame_id(&self) -> u64 { self.frame_id }

    /// `old_cost - new_cost`; positive means the candidate fits better.
    pub fn improvement(&self) -> f64 {
        self.old_cost - self.new_cost
    }
}

impl<C: Cell> Frame<C> {
    /// Perturbs a uniformly chosen cell and scores the result.
    pub fn begin_trial<R: Rng + ?Sized>(&self, rng: &mut R) -> FitResult<Trial<C>> {
        if self.cells.is_empty() {
            return Err(FitError::NoCells);
        }
        let index = rng.gen_range(0..self.cells.len());
        self.begin_trial_at(index, rng)
    }

    /// Perturbs the cell at `index` and scores the result.
    pub fn begin_trial_at<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> FitResult<Trial<C>> {
        let current = self.cells.get(index).ok_or(FitError::CellIndexOutOfRange {
            index,
            len: self.cells.len(),
        })?;
        let candidate = current.perturbed(rng);
        self.propose(index, candidate)
    }

    /// Scores an explicit replacement for the cell at `index`.
    pub fn propose(&self, index: usize, candidate: C) -> FitResult<Trial<C>> {
        if self.cells.is_empty() {
            return Err(FitError::NoCells);
        }
        let previous = self
            .cells
            .get(index)
            .ok_or(FitError::CellIndexOutOfRange { index, len: self.cells.len() })?
            .clone();

        let candidate_stack = self.render_candidate(Some((index, &candidate)))?;
        let new_cost = self.cost_of(&candidate_stack)?;
        let old_cost = self.cost;

        tracing::trace!(index, old_cost, new_cost, "trial proposed");
        Ok(Trial {
            index,
            previous,
            candidate,
            candidate_stack,
            old_cost,
            new_cost,
            frame_id: self.id,
            revision: self.revision,
        })
    }

    /// Installs the trial's candidate cell and its rendering.
    pub fn commit(&mut self, trial: Trial<C>) -> FitResult<()> {
        if trial.frame_id != self.id {
            return Err(FitError::ForeignTrial { trial_frame: trial.frame_id, frame: self.id });
        }
        if trial.revision != self.revision {
            return Err(FitError::StaleTrial { trial: trial.revision, frame: self.revision });
        }
        if trial.index >= self.cells.len() {
            return Err(FitError::CellIndexOutOfRange { index: trial.index, len: self.cells.len() });
        }
        let Trial { index, candidate, candidate_stack, new_cost, .. } = trial;
        let mut cells = std::mem::take(&mut self.cells);
        cells[index] = candidate;
        self.install(cells, candidate_stack, new_cost);
        tracing::trace!(index, cost = new_cost, revision = self.revision, "trial committed");
        Ok(())
    }

    /// Discards the trial. Cells and the cached stack are exactly as before it.
    pub fn rollback(&self, trial: Trial<C>) {
        tracing::trace!(index = trial.index, "trial rolled back");
    }

    /// Accept commits, reject rolls back.
    pub fn resolve(&mut self, trial: Trial<C>, decision: TrialDecision) -> FitResult<()> {
        match decision {
            TrialDecision::Accept => self.commit(trial),
            TrialDecision::Reject => {
                self.rollback(trial);
                Ok(())
            }
        }
    }
}
