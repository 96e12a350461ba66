//! Fits parametric 3D cell shapes to microscope z-stacks.
//!
//! A [`Frame`] holds one padded real stack, the cells describing it and the
//! cached rendering of those cells. Fitting alternates perturbation
//! [`Trial`]s, resolved by an acceptance policy, with finite-difference
//! gradient passes; [`Optimizer`] drives one Frame and [`fit_frames`] many.

pub mod cell;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod io;

#[cfg(test)]
mod test_utils;

pub use cell::{Cell, CellParam, CellParams, ParamDeltas, SphereCell, SphereParam, SpherePerturbation};
pub use config::{AcceptanceConfig, GradientSettings, OptimizerConfig, RunConfig, SimulationConfig};
pub use engine::{
    fit_frames, l2_distance, render_outlines, render_stack, z_slice_depths, BatchReport, FitStats, Frame,
    GradientPass, ImageStack, Optimizer, Plane, RgbPlane, StackShape, Trial, TrialDecision,
};
pub use error::{FitError, FitResult};
pub use export::{CellRecord, CellRecordSet};
