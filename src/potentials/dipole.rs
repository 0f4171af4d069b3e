use crate::consts::{local_dipole_axis, DEFAULT_DIPOLE_A};
use crate::error::{AnisoError, AnisoResult};
use crate::particle::TypeId;
use crate::position::{to_world, PosDifference, Vec3};
use crate::shape::TypeShape;
use crate::typepair::{pick, ParamRecord, TypePairKey, TypePairTable, TypeTable, Unresolved};

use super::{AnisoKernel, PairContext, PairOutput};

// Screened dipole-dipole interaction:
//   U = A e^{-kappa r} (mu_i.mu_j / r^3 - 3 (mu_i.r)(mu_j.r) / r^5)
// r -> 0 is singular; keeping particles apart is the caller's job.

/// Per type pair part of the dipole parameters (`mu` lives in a per-type table).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleParams {
    pub a: f64,
    pub kappa: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum DipoleField {
    A,
    Kappa,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DipolePartial {
    pub a: Option<f64>,
    pub kappa: Option<f64>,
}

impl ParamRecord for DipoleParams {
    type Field = DipoleField;
    type Partial = DipolePartial;

    fn set_field(partial: &mut DipolePartial, field: DipoleField, value: f64) {
        match field {
            DipoleField::A => partial.a = Some(value),
            DipoleField::Kappa => partial.kappa = Some(value),
        }
    }

    fn resolve(explicit: &DipolePartial, defaults: &DipolePartial) -> Result<Self, &'static str> {
        Ok(Self {
            a: pick(explicit.a, defaults.a, "A")?,
            kappa: pick(explicit.kappa, defaults.kappa, "kappa")?,
        })
    }

    fn check(partial: &DipolePartial) -> Result<(), String> {
        if let Some(a) = partial.a {
            if !(a >= 0.0 && a.is_finite()) {
                return Err(format!("dipole A must be finite and >= 0, got {a}"));
            }
        }
        if let Some(kappa) = partial.kappa {
            if !(kappa >= 0.0 && kappa.is_finite()) {
                return Err(format!("dipole kappa must be finite and >= 0, got {kappa}"));
            }
        }
        Ok(())
    }
}

/// Resolved parameters of an ordered pair, local-frame moments included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipolePairParams {
    pub a: f64,
    pub kappa: f64,
    pub mu_i: Vec3,
    pub mu_j: Vec3,
}

/// Energy split by term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleTerms {
    pub dd: f64,
    pub de: f64,
    pub ee: f64,
}

impl DipoleTerms {
    pub fn total(&self) -> f64 {
        self.dd + self.de + self.ee
    }
}

#[derive(Debug, Clone)]
pub struct Dipole {
    params: TypePairTable<DipoleParams>,
    mu: TypeTable<Vec3>,
}

impl Default for Dipole {
    fn default() -> Self {
        Self::new()
    }
}

impl Dipole {
    pub fn new() -> Self {
        let defaults = DipolePartial {
            a: Some(DEFAULT_DIPOLE_A),
            kappa: None,
        };
        Self {
            params: TypePairTable::with_defaults(defaults),
            mu: TypeTable::new("mu"),
        }
    }

    pub fn params(&self) -> &TypePairTable<DipoleParams> {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut TypePairTable<DipoleParams> {
        &mut self.params
    }

    pub fn set_params(&mut self, key: TypePairKey, record: DipolePartial) -> AnisoResult<()> {
        self.params.set(key, record)
    }

    pub fn mu(&self) -> &TypeTable<Vec3> {
        &self.mu
    }

    /// Local-frame dipole moment of every particle of `type_id`.
    pub fn set_mu(&mut self, type_id: TypeId, mu: Vec3) -> AnisoResult<()> {
        if !mu.iter().all(|c| c.is_finite()) {
            return Err(AnisoError::InvalidConfiguration(format!(
                "dipole moment of type {type_id} is not finite: {mu:?}"
            )));
        }
        self.mu.set(type_id, mu);
        Ok(())
    }

    /// Moment used by every type without an explicit one.
    pub fn set_default_mu(&mut self, mu: Vec3) -> AnisoResult<()> {
        if !mu.iter().all(|c| c.is_finite()) {
            return Err(AnisoError::InvalidConfiguration(format!(
                "default dipole moment is not finite: {mu:?}"
            )));
        }
        self.mu.set_default(mu);
        Ok(())
    }

    /// Moment of magnitude `mu` along the local x axis. The sign of a moment is
    /// carried by the orientation, so a negative magnitude is rejected.
    pub fn set_mu_magnitude(&mut self, type_id: TypeId, mu: f64) -> AnisoResult<()> {
        if !(mu >= 0.0 && mu.is_finite()) {
            return Err(AnisoError::InvalidConfiguration(format!(
                "dipole magnitude of type {type_id} must be finite and >= 0, got {mu}"
            )));
        }
        self.set_mu(type_id, local_dipole_axis() * mu)
    }
}

/// Energy terms for world-frame moments `mu_i`, `mu_j` separated by `dr`.
// TODO: fill in `de` and `ee` once the state store exposes per-particle charges
pub fn dipole_terms(dr: &PosDifference, mu_i: &Vec3, mu_j: &Vec3, a: f64, kappa: f64) -> DipoleTerms {
    let rsq = dr.norm_squared();
    let r = rsq.sqrt();
    let r3inv = 1.0 / (rsq * r);
    let r5inv = r3inv / rsq;
    let pre = a * (-kappa * r).exp();

    let dd = pre * (mu_i.dot(mu_j) * r3inv - 3.0 * mu_i.dot(dr) * mu_j.dot(dr) * r5inv);
    DipoleTerms {
        dd,
        de: 0.0,
        ee: 0.0,
    }
}

fn dipole_pair(dr: &PosDifference, mu_i: &Vec3, mu_j: &Vec3, a: f64, kappa: f64) -> PairOutput {
    let rsq = dr.norm_squared();
    let r = rsq.sqrt();
    let r2inv = 1.0 / rsq;
    let r3inv = r2inv / r;
    let r5inv = r3inv * r2inv;
    let pre = a * (-kappa * r).exp();

    let pidotpj = mu_i.dot(mu_j);
    let pidotr = mu_i.dot(dr);
    let pjdotr = mu_j.dot(dr);

    let angular = pidotpj * r3inv - 3.0 * pidotr * pjdotr * r5inv;
    let energy = pre * angular;

    // gradient of the angular part
    let grad = dr * (-3.0 * pidotpj * r5inv + 15.0 * pidotr * pjdotr * r5inv * r2inv)
        - (mu_i * pjdotr + mu_j * pidotr) * (3.0 * r5inv);
    // d/dr of the screening factor is -kappa * pre
    let force = dr * (kappa * pre * angular / r) - grad * pre;

    // effective fields -dU/dmu
    let field_i = (dr * (3.0 * pjdotr * r5inv) - mu_j * r3inv) * pre;
    let field_j = (dr * (3.0 * pidotr * r5inv) - mu_i * r3inv) * pre;

    PairOutput {
        energy,
        force,
        torque_i: mu_i.cross(&field_i),
        torque_j: mu_j.cross(&field_j),
    }
}

impl AnisoKernel for Dipole {
    type Params = DipolePairParams;

    fn name(&self) -> &'static str {
        "dipole"
    }

    fn pair_params(&self, type_i: TypeId, type_j: TypeId) -> Result<DipolePairParams, Unresolved> {
        let p = self.params.get(TypePairKey::new(type_i, type_j))?;
        Ok(DipolePairParams {
            a: p.a,
            kappa: p.kappa,
            mu_i: self.mu.get(type_i)?,
            mu_j: self.mu.get(type_j)?,
        })
    }

    fn evaluate(&self, ctx: &PairContext, params: &DipolePairParams, r_cut: f64) -> Option<PairOutput> {
        if ctx.dr.norm_squared() >= r_cut * r_cut {
            return None;
        }
        let mu_i = to_world(&ctx.q_i, &params.mu_i);
        let mu_j = to_world(&ctx.q_j, &params.mu_j);
        Some(dipole_pair(&ctx.dr, &mu_i, &mu_j, params.a, params.kappa))
    }

    fn energy_at_cutoff(&self, ctx: &PairContext, params: &DipolePairParams, r_cut: f64) -> f64 {
        if !r_cut.is_finite() {
            return 0.0;
        }
        let dr_cut = ctx.dr.normalize() * r_cut;
        let mu_i = to_world(&ctx.q_i, &params.mu_i);
        let mu_j = to_world(&ctx.q_j, &params.mu_j);
        dipole_terms(&dr_cut, &mu_i, &mu_j, params.a, params.kappa).total()
    }

    // point dipoles have no extent to draw
    fn type_shape(&self, _type_id: TypeId) -> Result<TypeShape, Unresolved> {
        Ok(TypeShape::None)
    }
}
