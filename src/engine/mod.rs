// engine/mod.rs
mod types;
mod geom;
mod raster;
mod render;
mod cost;
mod frame;
mod trial;
mod gradient;
mod annealer;
mod scheduler;
mod stats;
mod optimizer;
mod batch;

pub use types::{ImageStack, Plane, RgbPlane, StackShape};
pub use geom::z_slice_depths;
pub use render::{render_outlines, render_stack};
pub use cost::l2_distance;
pub use frame::Frame;
pub use trial::{Trial, TrialDecision};
pub use gradient::GradientPass;
pub use annealer::AcceptancePolicy;
pub use scheduler::StepKind;
pub use stats::FitStats;
pub use optimizer::Optimizer;
pub use batch::{fit_frames, BatchReport, FrameSummary};

// Shared with the cell variants and submodules
pub(crate) use types::IntRect;
pub(crate) use raster::{fill_disc_over, stroke_circle};
#[cfg(test)]
pub(crate) use raster::blend_over;
pub(crate) use scheduler::StepScheduler;
