use crate::consts::local_long_axis;
use crate::error::AnisoResult;
use crate::particle::TypeId;
use crate::position::{to_world, Orientation, PosDifference, Vec3};
use crate::shape::TypeShape;
use crate::typepair::{pick, ParamRecord, TypePairKey, TypePairTable, Unresolved};

use super::{AnisoKernel, PairContext, PairOutput};

// Gay-Berne for identical uniaxial ellipsoids with orientation-independent well depth
// (Allen et al. 2006):
//   U = 4 eps (zeta^-12 - zeta^-6),  zeta = (r - sigma + sigma_min) / sigma_min
//   sigma^-2 = 1/2 rhat . H^-1 . rhat
//   H = 2 lperp^2 I + (lpar^2 - lperp^2)(e_i e_i + e_j e_j)
// r_cut is measured for parallel long axes, so zeta_cut uses sigma_max.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GayBerneParams {
    pub epsilon: f64,
    pub lperp: f64,
    pub lpar: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum GayBerneField {
    Epsilon,
    Lperp,
    Lpar,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GayBernePartial {
    pub epsilon: Option<f64>,
    pub lperp: Option<f64>,
    pub lpar: Option<f64>,
}

impl ParamRecord for GayBerneParams {
    type Field = GayBerneField;
    type Partial = GayBernePartial;

    fn set_field(partial: &mut GayBernePartial, field: GayBerneField, value: f64) {
        match field {
            GayBerneField::Epsilon => partial.epsilon = Some(value),
            GayBerneField::Lperp => partial.lperp = Some(value),
            GayBerneField::Lpar => partial.lpar = Some(value),
        }
    }

    fn resolve(explicit: &GayBernePartial, defaults: &GayBernePartial) -> Result<Self, &'static str> {
        Ok(Self {
            epsilon: pick(explicit.epsilon, defaults.epsilon, "epsilon")?,
            lperp: pick(explicit.lperp, defaults.lperp, "lperp")?,
            lpar: pick(explicit.lpar, defaults.lpar, "lpar")?,
        })
    }

    fn check(partial: &GayBernePartial) -> Result<(), String> {
        if let Some(epsilon) = partial.epsilon {
            if !epsilon.is_finite() {
                return Err(format!("gay-berne epsilon must be finite, got {epsilon}"));
            }
        }
        for (name, value) in [("lperp", partial.lperp), ("lpar", partial.lpar)] {
            if let Some(l) = value {
                if !(l > 0.0 && l.is_finite()) {
                    return Err(format!("gay-berne {name} must be a positive real, got {l}"));
                }
            }
        }
        Ok(())
    }
}

impl GayBerneParams {
    pub fn sigma_min(&self) -> f64 {
        2.0 * self.lperp.min(self.lpar)
    }

    pub fn sigma_max(&self) -> f64 {
        2.0 * self.lperp.max(self.lpar)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GayBerne {
    params: TypePairTable<GayBerneParams>,
}

impl GayBerne {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &TypePairTable<GayBerneParams> {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut TypePairTable<GayBerneParams> {
        &mut self.params
    }

    pub fn set_params(&mut self, key: TypePairKey, record: GayBernePartial) -> AnisoResult<()> {
        self.params.set(key, record)
    }
}

/// World-frame long axis of a particle.
pub fn long_axis(or: &Orientation) -> Vec3 {
    to_world(or, &local_long_axis())
}

// H^-1 dr and sigma^-2.
// H^-1 is written through chi = (lpar^2 - lperp^2)/(lpar^2 + lperp^2), so the
// isotropic case is just chi = 0 and nothing divides by lpar^2 - lperp^2.
fn shape_terms(dr: &PosDifference, e_i: &Vec3, e_j: &Vec3, p: &GayBerneParams) -> (Vec3, f64) {
    let lperpsq = p.lperp * p.lperp;
    let lparsq = p.lpar * p.lpar;
    let chi = (lparsq - lperpsq) / (lparsq + lperpsq);

    let ca = e_i.dot(dr);
    let cb = e_j.dot(dr);
    let cab = e_i.dot(e_j);
    let chic = chi * cab;
    // |chi| < 1 for lperp > 0, so this never vanishes
    let chi_fact = chi / (1.0 - chic * chic);

    let kappa = (dr - (e_i * (ca - chic * cb) + e_j * (cb - chic * ca)) * chi_fact) * (0.5 / lperpsq);
    let phi = 0.5 * dr.dot(&kappa) / dr.norm_squared();
    (kappa, phi)
}

/// Orientation-dependent contact distance.
pub fn gb_sigma(dr: &PosDifference, or_i: &Orientation, or_j: &Orientation, p: &GayBerneParams) -> f64 {
    let (_, phi) = shape_terms(dr, &long_axis(or_i), &long_axis(or_j), p);
    1.0 / phi.sqrt()
}

pub fn gb_zeta(dr: &PosDifference, or_i: &Orientation, or_j: &Orientation, p: &GayBerneParams) -> f64 {
    let sigma_min = p.sigma_min();
    (dr.norm() - gb_sigma(dr, or_i, or_j, p) + sigma_min) / sigma_min
}

pub fn gb_zeta_cut(p: &GayBerneParams, r_cut: f64) -> f64 {
    let sigma_min = p.sigma_min();
    (r_cut - p.sigma_max() + sigma_min) / sigma_min
}

fn lj_zeta(epsilon: f64, zeta: f64) -> f64 {
    let zeta6inv = zeta.powi(-6);
    4.0 * epsilon * zeta6inv * (zeta6inv - 1.0)
}

impl AnisoKernel for GayBerne {
    type Params = GayBerneParams;

    fn name(&self) -> &'static str {
        "gay_berne"
    }

    fn pair_params(&self, type_i: TypeId, type_j: TypeId) -> Result<GayBerneParams, Unresolved> {
        self.params.get(TypePairKey::new(type_i, type_j))
    }

    fn evaluate(&self, ctx: &PairContext, p: &GayBerneParams, r_cut: f64) -> Option<PairOutput> {
        let dr = &ctx.dr;
        let rsq = dr.norm_squared();
        let r = rsq.sqrt();
        let e_i = long_axis(&ctx.q_i);
        let e_j = long_axis(&ctx.q_j);

        let (kappa, phi) = shape_terms(dr, &e_i, &e_j, p);
        let sigma = 1.0 / phi.sqrt();
        let sigma_min = p.sigma_min();
        let zeta = (r - sigma + sigma_min) / sigma_min;

        if zeta >= gb_zeta_cut(p, r_cut) {
            return None;
        }

        let energy = lj_zeta(p.epsilon, zeta);
        let zeta6inv = zeta.powi(-6);
        let du_dzeta = -24.0 * p.epsilon * zeta6inv / zeta * (2.0 * zeta6inv - 1.0);

        // grad zeta = (rhat - grad sigma) / sigma_min, grad sigma = -sigma^3/2 grad phi
        let sigma3 = sigma * sigma * sigma;
        let grad_zeta = (dr / r + (kappa - dr * (2.0 * phi)) * (0.5 * sigma3 / rsq)) / sigma_min;
        let force = grad_zeta * -du_dzeta;

        // dphi/de = -(lpar^2 - lperp^2)(e.kappa) kappa / r^2, torque = -e x dU/de
        let aniso = p.lpar * p.lpar - p.lperp * p.lperp;
        let pre = du_dzeta * sigma3 * aniso / (2.0 * sigma_min * rsq);
        let torque_i = e_i.cross(&kappa) * (pre * e_i.dot(&kappa));
        let torque_j = e_j.cross(&kappa) * (pre * e_j.dot(&kappa));

        Some(PairOutput {
            energy,
            force,
            torque_i,
            torque_j,
        })
    }

    fn energy_at_cutoff(&self, _ctx: &PairContext, p: &GayBerneParams, r_cut: f64) -> f64 {
        if !r_cut.is_finite() {
            return 0.0;
        }
        lj_zeta(p.epsilon, gb_zeta_cut(p, r_cut))
    }

    fn type_shape(&self, type_id: TypeId) -> Result<TypeShape, Unresolved> {
        let p = self.params.get(TypePairKey::new(type_id, type_id))?;
        Ok(TypeShape::Ellipsoid {
            a: p.lperp,
            b: p.lperp,
            c: p.lpar,
        })
    }

    fn lint_pair(&self, label: &str, p: &GayBerneParams, r_cut: f64) {
        if r_cut < p.sigma_max() {
            log::warn!(
                "gay_berne r_cut = {r_cut} for {label} is below sigma_max = {}; parallel particles never interact",
                p.sigma_max()
            );
        }
    }
}
