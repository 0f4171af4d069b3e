use std::fmt::Debug;

use crate::particle::TypeId;
use crate::position::{Orientation, PosDifference, Vec3};
use crate::shape::TypeShape;
use crate::typepair::{TypePairKey, Unresolved};

pub mod dipole;
pub mod gay_berne;

pub use dipole::Dipole;
pub use gay_berne::GayBerne;

/// Everything a kernel sees about one pair. Built and dropped inside a single evaluation.
#[derive(Debug, Clone)]
pub struct PairContext {
    pub i: usize,
    pub j: usize,
    /// r_i - r_j, minimum image
    pub dr: PosDifference,
    pub q_i: Orientation,
    pub q_j: Orientation,
    pub key: TypePairKey,
}

/// Contribution of one pair. `force` acts on i, j receives `-force`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairOutput {
    pub energy: f64,
    pub force: Vec3,
    pub torque_i: Vec3,
    pub torque_j: Vec3,
}

/// One anisotropic pair potential.
///
/// A kernel owns its parameter tables. The evaluator asks it to resolve the
/// parameters of every ordered type pair once per pass, then calls
/// [`AnisoKernel::evaluate`] with the resolved record for each neighbor pair.
pub trait AnisoKernel: Sync {
    type Params: Clone + Debug + Send + Sync;

    fn name(&self) -> &'static str;

    /// Parameters for a particle of `type_i` interacting with one of `type_j`.
    fn pair_params(&self, type_i: TypeId, type_j: TypeId) -> Result<Self::Params, Unresolved>;

    /// Raw contribution of the pair, `None` when it lies beyond the effective cutoff.
    fn evaluate(&self, ctx: &PairContext, params: &Self::Params, r_cut: f64) -> Option<PairOutput>;

    /// Energy of the same pair placed exactly on its effective cutoff.
    fn energy_at_cutoff(&self, ctx: &PairContext, params: &Self::Params, r_cut: f64) -> f64;

    fn type_shape(&self, type_id: TypeId) -> Result<TypeShape, Unresolved>;

    /// Hook for legal but suspicious parameter/cutoff combinations.
    fn lint_pair(&self, _label: &str, _params: &Self::Params, _r_cut: f64) {}
}
