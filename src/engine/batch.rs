// -----------------------------------------------------------------------------
// Parallel fitting of independent frames
// -----------------------------------------------------------------------------
//
// Frames share nothing, so each one gets its own optimizer and RNG. Only the
// summary list is shared between workers.

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;

use super::{FitStats, Frame, Optimizer};
use crate::cell::Cell;
use crate::config::OptimizerConfig;
use crate::error::FitResult;

#[derive(Clone, Debug, Serialize)]
pub struct FrameSummary {
    pub index: usize,
    pub image_name: String,
    pub cells: usize,
    pub stats: FitStats,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    /// One entry per frame, ordered by frame index.
    pub frames: Vec<FrameSummary>,
}

impl BatchReport {
    pub fn total_initial_cost(&self) -> f64 {
        self.frames.iter().filter_map(|f| f.stats.initial_cost).sum()
    }

    pub fn total_final_cost(&self) -> f64 {
        self.frames.iter().filter_map(|f| f.stats.current_cost).sum()
    }
}

/// Fits every frame in parallel. Frame `i` is driven with seed `config.seed + i`,
/// so the outcome does not depend on thread scheduling.
pub fn fit_frames<C>(frames: &mut [Frame<C>], config: &OptimizerConfig) -> FitResult<BatchReport>
where
    C: Cell + Send,
{
    config.validate()?;
    let summaries = Mutex::new(Vec::with_capacity(frames.len()));

    frames
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(index, frame)| -> FitResult<()> {
            let frame_config = OptimizerConfig {
                seed: config.seed.wrapping_add(index as u64),
                ..config.clone()
            };
            let stats = Optimizer::new(frame_config)?.run(frame)?;
            summaries.lock().push(FrameSummary {
                index,
                image_name: frame.image_name().to_string(),
                cells: frame.len(),
                stats,
            });
            Ok(())
        })?;

    let mut frames = summaries.into_inner();
    frames.sort_by_key(|s| s.index);
    tracing::info!(frames = frames.len(), "batch finished");
    Ok(BatchReport { frames })
}
