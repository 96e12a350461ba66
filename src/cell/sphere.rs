// -----------------------------------------------------------------------------
// Sphere cell
// -----------------------------------------------------------------------------

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::{Cell, CellParam, ParamDeltas};
use crate::config::SimulationConfig;
use crate::engine::{fill_disc_over, stroke_circle, Plane, RgbPlane};
use crate::error::{FitError, FitResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SphereParam {
    X,
    Y,
    Z,
    Radius,
}

impl CellParam for SphereParam {
    const ALL: &'static [Self] = &[SphereParam::X, SphereParam::Y, SphereParam::Z, SphereParam::Radius];

    fn index(self) -> usize {
        match self {
            SphereParam::X => 0,
            SphereParam::Y => 1,
            SphereParam::Z => 2,
            SphereParam::Radius => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SphereParam::X => "x",
            SphereParam::Y => "y",
            SphereParam::Z => "z",
            SphereParam::Radius => "radius",
        }
    }
}

/// Per-parameter random nudge: with `probability`, add a sample of N(`mu`, `sigma`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamJitter {
    pub probability: f64,
    pub mu: f64,
    pub sigma: f64,
}

impl ParamJitter {
    pub const fn new(probability: f64, mu: f64, sigma: f64) -> Self {
        Self { probability, mu, sigma }
    }

    fn validate(&self, label: &str) -> FitResult<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(FitError::InvalidConfig(format!(
                "{label} jitter probability must lie in [0, 1], got {}",
                self.probability
            )));
        }
        if !self.mu.is_finite() || !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(FitError::InvalidConfig(format!(
                "{label} jitter needs finite mu and non-negative sigma"
            )));
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.probability <= 0.0 || rng.gen::<f64>() >= self.probability {
            return 0.0;
        }
        match Normal::new(self.mu, self.sigma) {
            Ok(normal) => normal.sample(rng),
            Err(_) => 0.0,
        }
    }
}

/// How [`SphereCell::perturbed`] moves each parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpherePerturbation {
    pub x: ParamJitter,
    pub y: ParamJitter,
    pub z: ParamJitter,
    pub radius: ParamJitter,
    /// Radius never drops below this, for perturbation and shifts alike.
    pub min_radius: f64,
}

impl Default for SpherePerturbation {
    fn default() -> Self {
        Self {
            x: ParamJitter::new(0.5, 0.0, 1.0),
            y: ParamJitter::new(0.5, 0.0, 1.0),
            z: ParamJitter::new(0.25, 0.0, 0.5),
            radius: ParamJitter::new(0.25, 0.0, 0.5),
            min_radius: 0.5,
        }
    }
}

impl SpherePerturbation {
    pub fn validate(&self) -> FitResult<()> {
        self.x.validate("x")?;
        self.y.validate("y")?;
        self.z.validate("z")?;
        self.radius.validate("radius")?;
        if !self.min_radius.is_finite() || self.min_radius < 0.0 {
            return Err(FitError::InvalidConfig(format!(
                "min_radius must be finite and non-negative, got {}",
                self.min_radius
            )));
        }
        Ok(())
    }
}

/// A sphere centred at (`x`, `y`, `z`) in unpadded image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereCell {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    #[serde(skip)]
    perturbation: SpherePerturbation,
}

impl SphereCell {
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
            radius,
            perturbation: SpherePerturbation::default(),
        }
    }

    pub fn with_perturbation(mut self, perturbation: SpherePerturbation) -> Self {
        self.radius = self.radius.max(perturbation.min_radius);
        self.perturbation = perturbation;
        self
    }

    pub fn perturbation(&self) -> &SpherePerturbation {
        &self.perturbation
    }

    /// Radius of the slice through this sphere at depth `z`, if it intersects.
    pub fn cross_section_radius(&self, z: f64) -> Option<f64> {
        let dz = z - self.z;
        let r2 = self.radius * self.radius - dz * dz;
        (r2 > 0.0).then(|| r2.sqrt())
    }

    fn with_offsets(&self, dx: f64, dy: f64, dz: f64, dr: f64) -> Self {
        Self {
            name: self.name.clone(),
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            radius: (self.radius + dr).max(self.perturbation.min_radius),
            perturbation: self.perturbation,
        }
    }
}

impl Cell for SphereCell {
    type Param = SphereParam;

    fn name(&self) -> &str {
        &self.name
    }

    fn param(&self, param: SphereParam) -> f64 {
        match param {
            SphereParam::X => self.x,
            SphereParam::Y => self.y,
            SphereParam::Z => self.z,
            SphereParam::Radius => self.radius,
        }
    }

    fn render(&self, canvas: &mut Plane, config: &SimulationConfig, z: f64) {
        let Some(r) = self.cross_section_radius(z) else { return };
        let pad = config.padding as f64;
        fill_disc_over(canvas, self.x + pad, self.y + pad, r, config.cell_color);
    }

    fn render_outline(&self, canvas: &mut RgbPlane, config: &SimulationConfig, color: [f32; 3], z: f64) {
        let Some(r) = self.cross_section_radius(z) else { return };
        let pad = config.padding as f64;
        stroke_circle(canvas, self.x + pad, self.y + pad, r, color);
    }

    fn perturbed<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let p = self.perturbation;
        let dx = p.x.sample(rng);
        let dy = p.y.sample(rng);
        let dz = p.z.sample(rng);
        let dr = p.radius.sample(rng);
        self.with_offsets(dx, dy, dz, dr)
    }

    fn shifted(&self, deltas: &ParamDeltas<SphereParam>) -> Self {
        self.with_offsets(
            deltas.get(SphereParam::X),
            deltas.get(SphereParam::Y),
            deltas.get(SphereParam::Z),
            deltas.get(SphereParam::Radius),
        )
    }
}
