//! The cell capability consumed by the engine.
//!
//! A cell is an immutable value: perturbation and parameter shifts return new
//! cells. Each cell variant names its tunable parameters through a closed
//! [`CellParam`] enumeration; the identifying name is never one of them.

mod sphere;

use std::fmt::Debug;
use std::marker::PhantomData;

use rand::Rng;

use crate::config::SimulationConfig;
use crate::engine::{Plane, RgbPlane};

pub use sphere::{ParamJitter, SphereCell, SphereParam, SpherePerturbation};

/// Closed set of tunable parameters of one cell variant.
pub trait CellParam: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every tunable parameter, ordered by [`CellParam::index`].
    const ALL: &'static [Self];

    fn index(self) -> usize;
    fn label(self) -> &'static str;

    #[inline]
    fn count() -> usize {
        Self::ALL.len()
    }
}

/// One shift per tunable parameter of `P`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDeltas<P: CellParam> {
    values: Vec<f64>,
    _param: PhantomData<P>,
}

impl<P: CellParam> ParamDeltas<P> {
    pub fn zero() -> Self {
        Self { values: vec![0.0; P::count()], _param: PhantomData }
    }

    /// Shift `param` by `delta`, leave everything else alone.
    pub fn single(param: P, delta: f64) -> Self {
        let mut d = Self::zero();
        d.set(param, delta);
        d
    }

    #[inline]
    pub fn get(&self, param: P) -> f64 {
        self.values[param.index()]
    }

    #[inline]
    pub fn set(&mut self, param: P, delta: f64) {
        self.values[param.index()] = delta;
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (P, f64)> + '_ {
        P::ALL.iter().map(move |&p| (p, self.get(p)))
    }
}

/// Flattened parameters of one cell: its name plus every labeled value.
#[derive(Clone, Debug, PartialEq)]
pub struct CellParams {
    pub name: String,
    pub values: Vec<(&'static str, f64)>,
}

pub trait Cell: Clone + Debug {
    type Param: CellParam;

    fn name(&self) -> &str;

    fn param(&self, param: Self::Param) -> f64;

    /// Draw this cell's cross-section at depth `z` onto `canvas`.
    fn render(&self, canvas: &mut Plane, config: &SimulationConfig, z: f64);

    /// Draw this cell's cross-section boundary at depth `z` in `color`.
    fn render_outline(&self, canvas: &mut RgbPlane, config: &SimulationConfig, color: [f32; 3], z: f64);

    /// A new cell with randomly nudged parameters.
    fn perturbed<R: Rng + ?Sized>(&self, rng: &mut R) -> Self;

    /// A new cell with every parameter moved by its entry in `deltas`.
    fn shifted(&self, deltas: &ParamDeltas<Self::Param>) -> Self;

    fn params(&self) -> CellParams {
        CellParams {
            name: self.name().to_string(),
            values: Self::Param::ALL.iter().map(|&p| (p.label(), self.param(p))).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_deltas_index_by_param() {
        let mut d = ParamDeltas::<SphereParam>::zero();
        assert!(d.is_zero());
        d.set(SphereParam::Radius, 2.5);
        assert_eq!(d.get(SphereParam::Radius), 2.5);
        assert_eq!(d.get(SphereParam::X), 0.0);
        assert!(!d.is_zero());

        let single = ParamDeltas::single(SphereParam::Z, -1.0);
        let collected: Vec<_> = single.iter().collect();
        assert_eq!(collected.len(), SphereParam::count());
        assert!(collected.contains(&(SphereParam::Z, -1.0)));
        assert!(collected.contains(&(SphereParam::X, 0.0)));
    }
}
