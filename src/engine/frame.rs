//! Frame: one real z-stack, the cells fitted to it, and the cached synthetic
//! rendering of the last committed cell sequence.
//!
//! Invariants:
//! - `real_stack` is a private padded copy; its shape never changes.
//! - `synth_stack` is always the rendering of `cells`, and `cost` is always the
//!   L2 distance between the two. Every committed change updates all three and
//!   bumps `revision`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::{GrayImage, RgbImage};

use super::cost::l2_distance;
use super::geom::z_slice_depths;
use super::raster::pad_stack;
use super::render::{render_outlines, render_stack, render_stack_with};
use super::ImageStack;
use crate::cell::Cell;
use crate::config::{GradientSettings, SimulationConfig};
use crate::error::{FitError, FitResult};
use crate::export::CellRecordSet;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

pub struct Frame<C: Cell> {
    pub(super) id: u64,
    pub(super) cells: Vec<C>,
    pub(super) config: SimulationConfig,
    pub(super) gradient: GradientSettings,
    pub(super) z_slices: Vec<f64>,
    pub(super) real_stack: ImageStack,
    pub(super) synth_stack: ImageStack,
    pub(super) cost: f64,
    pub(super) revision: u64,
    output_path: PathBuf,
    image_name: String,
}

impl<C: Cell> Frame<C> {
    /// Copies and pads `real_stack`, then renders the initial synthetic stack.
    pub fn new(
        real_stack: &ImageStack,
        config: SimulationConfig,
        cells: Vec<C>,
        output_path: impl Into<PathBuf>,
        image_name: impl Into<String>,
    ) -> FitResult<Self> {
        config.validate()?;
        if cells.is_empty() {
            return Err(FitError::NoCells);
        }
        if real_stack.width() == 0 || real_stack.height() == 0 {
            return Err(FitError::EmptyStack);
        }
        if real_stack.depth() != config.z_slices {
            return Err(FitError::SliceCountMismatch {
                expected: config.z_slices,
                actual: real_stack.depth(),
            });
        }

        let z_slices = z_slice_depths(&config);
        let real_stack = pad_stack(real_stack, config.padding, config.background_color);
        let synth_stack = render_stack(&cells, &config, &z_slices, real_stack.width(), real_stack.height())?;
        let cost = l2_distance(&real_stack, &synth_stack)?;

        let image_name = image_name.into();
        tracing::debug!(
            image = %image_name,
            cells = cells.len(),
            shape = %real_stack.shape(),
            cost,
            "frame initialized"
        );

        Ok(Self {
            id: NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed),
            cells,
            config,
            gradient: GradientSettings::default(),
            z_slices,
            real_stack,
            synth_stack,
            cost,
            revision: 0,
            output_path: output_path.into(),
            image_name,
        })
    }

    /// Replaces the default finite-difference settings. Only meant for use right
    /// after construction; the settings stay fixed afterwards.
    pub fn with_gradient_settings(mut self, gradient: GradientSettings) -> FitResult<Self> {
        gradient.validate()?;
        self.gradient = gradient;
        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a Frame cannot be built without cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<C> {
        self.cells
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn gradient_settings(&self) -> &GradientSettings {
        &self.gradient
    }

    pub fn z_slices(&self) -> &[f64] {
        &self.z_slices
    }

    /// Padded real stack.
    pub fn real_stack(&self) -> &ImageStack {
        &self.real_stack
    }

    /// Rendering of the last committed cells.
    pub fn synth_stack(&self) -> &ImageStack {
        &self.synth_stack
    }

    /// L2 distance between the real and the cached synthetic stack.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Process-unique identity; trials only commit on the Frame that proposed them.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Counts committed changes; trials proposed at an older revision are stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Cost of `stack` against the real stack.
    pub fn cost_of(&self, stack: &ImageStack) -> FitResult<f64> {
        l2_distance(&self.real_stack, stack)
    }

    /// Fresh rendering of the committed cells (does not touch the cache).
    pub fn render(&self) -> FitResult<ImageStack> {
        self.render_candidate(None)
    }

    pub(super) fn render_candidate(&self, replaced: Option<(usize, &C)>) -> FitResult<ImageStack> {
        render_stack_with(
            &self.cells,
            replaced,
            &self.config,
            &self.z_slices,
            self.real_stack.width(),
            self.real_stack.height(),
        )
    }

    /// Installs a new committed state.
    pub(super) fn install(&mut self, cells: Vec<C>, synth_stack: ImageStack, cost: f64) {
        debug_assert_eq!(synth_stack.shape(), self.real_stack.shape());
        self.cells = cells;
        self.synth_stack = synth_stack;
        self.cost = cost;
        self.revision = self.revision.wrapping_add(1);
    }

    // ---------------------------------------------------------------------
    // Output / export
    // ---------------------------------------------------------------------

    /// Real slices with every cell's outline drawn at the slice's depth.
    pub fn outline_images(&self) -> Vec<RgbImage> {
        render_outlines(&self.real_stack, &self.cells, &self.config, &self.z_slices)
            .iter()
            .map(|p| p.to_rgb_image())
            .collect()
    }

    /// Cached synthetic slices as 8-bit greyscale.
    pub fn synth_images(&self) -> Vec<GrayImage> {
        self.synth_stack.planes().iter().map(|p| p.to_gray_image()).collect()
    }

    /// One row per cell, tagged with this frame's image name.
    pub fn cells_as_records(&self) -> CellRecordSet {
        CellRecordSet::from_cells(&self.cells, &self.image_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SphereCell;
    use crate::test_utils::{real_stack_for, sphere_config};

    #[test]
    fn construction_requires_cells() {
        let cfg = SimulationConfig::default();
        let real = ImageStack::filled(1, 8, 8, 0.0);
        let cells: Vec<SphereCell> = vec![];
        assert!(matches!(Frame::new(&real, cfg, cells, "out", "img"), Err(FitError::NoCells)));
    }

    #[test]
    fn construction_checks_slice_count() {
        let cfg = SimulationConfig { z_slices: 3, ..Default::default() };
        let real = ImageStack::filled(2, 8, 8, 0.0);
        let cells = vec![SphereCell::new("a", 4.0, 4.0, 0.0, 2.0)];
        assert!(matches!(
            Frame::new(&real, cfg, cells, "out", "img"),
            Err(FitError::SliceCountMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn construction_rejects_zero_sized_slices() {
        let cells = vec![SphereCell::new("a", 4.0, 4.0, 0.0, 2.0)];
        let narrow = ImageStack::filled(1, 0, 8, 0.0);
        assert!(matches!(
            Frame::new(&narrow, SimulationConfig::default(), cells.clone(), "out", "img"),
            Err(FitError::EmptyStack)
        ));
        let flat = ImageStack::filled(1, 8, 0, 0.0);
        assert!(matches!(
            Frame::new(&flat, SimulationConfig::default(), cells, "out", "img"),
            Err(FitError::EmptyStack)
        ));
    }

    #[test]
    fn frames_get_distinct_ids() {
        let real = ImageStack::filled(1, 8, 8, 0.0);
        let cells = vec![SphereCell::new("a", 4.0, 4.0, 0.0, 2.0)];
        let a = Frame::new(&real, SimulationConfig::default(), cells.clone(), "out", "a").unwrap();
        let b = Frame::new(&real, SimulationConfig::default(), cells, "out", "b").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn real_stack_is_padded_with_background() {
        let cfg = SimulationConfig { z_slices: 2, padding: 4, background_color: 0.2, ..Default::default() };
        let real = ImageStack::filled(2, 10, 6, 0.9);
        let cells = vec![SphereCell::new("a", 5.0, 3.0, 0.0, 2.0)];
        let frame = Frame::new(&real, cfg, cells, "out", "img").unwrap();

        let padded = frame.real_stack();
        assert_eq!(padded.width(), 18);
        assert_eq!(padded.height(), 14);
        assert_eq!(padded.depth(), 2);
        assert_eq!(frame.synth_stack().shape(), padded.shape());
        for plane in padded.planes() {
            for x in 0..18 {
                for y in (0..4).chain(10..14) {
                    assert_eq!(plane.get(x, y), 0.2);
                }
            }
            assert_eq!(plane.get(4, 4), 0.9);
        }
    }

    #[test]
    fn frame_owns_a_private_copy_of_the_real_stack() {
        let cfg = SimulationConfig::default();
        let mut real = ImageStack::filled(1, 8, 8, 0.0);
        let cells = vec![SphereCell::new("a", 4.0, 4.0, 0.0, 2.0)];
        let frame = Frame::new(&real, cfg, cells, "out", "img").unwrap();
        real.plane_mut(0).fill(1.0);
        assert!(frame.real_stack().plane(0).data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn exact_fit_has_zero_cost() {
        let cfg = sphere_config(1, 0);
        let cells = vec![SphereCell::new("a", 8.0, 8.0, 0.0, 4.0)];
        let real = real_stack_for(&cells, &cfg, 16, 16);
        let frame = Frame::new(&real, cfg, cells, "out", "img").unwrap();
        assert_eq!(frame.cost(), 0.0);
        assert_eq!(frame.revision(), 0);
        assert_eq!(frame.synth_stack(), &real);
    }

    #[test]
    fn output_views_have_one_image_per_slice() {
        let cfg = sphere_config(3, 2);
        let cells = vec![SphereCell::new("a", 6.0, 6.0, 0.0, 3.0)];
        let real = ImageStack::filled(3, 12, 12, 0.0);
        let frame = Frame::new(&real, cfg, cells, "out", "img-01").unwrap();

        let outlines = frame.outline_images();
        let synth = frame.synth_images();
        assert_eq!(outlines.len(), 3);
        assert_eq!(synth.len(), 3);
        assert_eq!(outlines[0].dimensions(), (16, 16));
        // centre of the cell lands at (6 + pad, 6 + pad)
        assert_eq!(synth[1].get_pixel(8, 8).0, [255]);
        assert_eq!(outlines[1].get_pixel(11, 8).0, [255, 0, 0]);

        let records = frame.cells_as_records();
        assert_eq!(records.rows().len(), 1);
        assert_eq!(records.rows()[0].file, "img-01");
    }

    #[test]
    fn invalid_gradient_settings_are_rejected() {
        let cfg = SimulationConfig::default();
        let real = ImageStack::filled(1, 8, 8, 0.0);
        let cells = vec![SphereCell::new("a", 4.0, 4.0, 0.0, 2.0)];
        let frame = Frame::new(&real, cfg, cells, "out", "img").unwrap();
        let bad = GradientSettings { epsilon: -1.0, ..Default::default() };
        assert!(frame.with_gradient_settings(bad).is_err());
    }
}
