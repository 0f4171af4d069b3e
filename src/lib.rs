use num_traits::Zero;
use particle::{IsParticle, Particle, ParticleId, TypeId};
use position::{random_orientation, Vec3};
use potentials::dipole::DipolePartial;
use potentials::gay_berne::GayBernePartial;
use potentials::{Dipole, GayBerne};
use quickcheck::{Arbitrary, Gen};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use simbox::SimBox;

use crate::error::{AnisoError, AnisoResult};
use crate::pair::{AnisoPair, AnisoPotential};
use crate::shift::ShiftMode;

pub mod cli;
pub mod consts;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod neighbors;
pub mod pair;
pub mod particle;
pub mod position;
pub mod potentials;
pub mod shape;
pub mod shift;
pub mod simbox;
pub mod stats;
pub mod typepair;

pub type Prng = rand_xoshiro::Xoshiro256PlusPlus;

// attempts per particle before random placement gives up
const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RCutEntry {
    pub types: [String; 2],
    pub r_cut: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DipoleEntry {
    pub types: [String; 2],
    #[serde(rename = "A", default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kappa: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MuEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    pub mu: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GayBerneEntry {
    pub types: [String; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lperp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lpar: Option<f64>,
}

/// Potential kind and its parameter entries. Fields are optional on purpose:
/// a missing required field is reported when a pass needs it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PotentialParams {
    Dipole {
        #[serde(default)]
        params: Vec<DipoleEntry>,
        #[serde(default)]
        mu: Vec<MuEntry>,
    },
    GayBerne {
        #[serde(default)]
        params: Vec<GayBerneEntry>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputParams {
    pub seed: u64,
    pub num_particles: usize,
    pub box_dimensions: [f64; 3],
    /// closest two randomly placed particles may get
    pub min_separation: f64,

    pub types: Vec<String>,
    pub mode: String,
    pub r_cut: Option<f64>,
    pub check_cutoff: bool,
    pub r_cuts: Vec<RCutEntry>,
    pub potential: PotentialParams,
}

impl Default for InputParams {
    fn default() -> Self {
        let seed = 1337;
        let num_particles = 64;
        let box_dimensions = [8.0, 8.0, 8.0];
        let min_separation = 1.0;

        let types = vec!["A".to_string()];
        let mode = "shift".to_string();
        let r_cut = Some(2.5);

        let potential = PotentialParams::GayBerne {
            params: vec![GayBerneEntry {
                types: ["A".to_string(), "A".to_string()],
                epsilon: Some(1.0),
                lperp: Some(0.45),
                lpar: Some(0.5),
            }],
        };

        Self {
            seed,
            num_particles,
            box_dimensions,
            min_separation,

            types,
            mode,
            r_cut,
            check_cutoff: true,
            r_cuts: Vec::new(),
            potential,
        }
    }
}

fn invalid(msg: String) -> AnisoError {
    AnisoError::InvalidConfiguration(msg)
}

impl InputParams {
    /// Well-formedness of everything that can be judged without running a pass.
    /// Missing potential parameters are deliberately not checked here.
    pub fn check(&self) -> AnisoResult<()> {
        if self.types.is_empty() {
            return Err(invalid("no particle types declared".to_string()));
        }
        for (idx, t) in self.types.iter().enumerate() {
            if self.types[..idx].contains(t) {
                return Err(invalid(format!("particle type {t:?} declared twice")));
            }
        }
        for d in self.box_dimensions {
            if !(d > 0.0 && d.is_normal()) {
                return Err(invalid(format!("box dimensions must be positive, got {:?}", self.box_dimensions)));
            }
        }
        if !(self.min_separation > 0.0 || self.min_separation.is_zero()) {
            return Err(invalid(format!("min_separation must be >= 0, got {}", self.min_separation)));
        }
        let half_box = self.box_dimensions.iter().fold(f64::INFINITY, |a, &b| a.min(b)) / 2.0;
        let r_cuts = self.r_cut.iter().chain(self.r_cuts.iter().map(|e| &e.r_cut));
        for &r_cut in r_cuts {
            if self.check_cutoff && r_cut >= half_box {
                return Err(invalid(format!(
                    "r_cut = {r_cut} does not fit the minimum image convention of a box {:?}",
                    self.box_dimensions
                )));
            }
        }
        self.mode.parse::<ShiftMode>()?;
        Ok(())
    }

    pub fn simbox(&self) -> SimBox {
        let [x, y, z] = self.box_dimensions;
        SimBox::new(Vec3::new(x, y, z))
    }
}

fn type_key<K: potentials::AnisoKernel>(
    pair: &AnisoPair<K>,
    types: &[String; 2],
) -> AnisoResult<typepair::TypePairKey> {
    pair.key(&types[0], &types[1])
}

fn configure_pair<K: potentials::AnisoKernel>(ip: &InputParams, kernel: K) -> AnisoResult<AnisoPair<K>> {
    let mode = ip.mode.parse()?;
    let mut pair = AnisoPair::new(ip.types.clone(), kernel, ip.r_cut, mode)?;
    pair.set_check_cutoff(ip.check_cutoff);
    for entry in &ip.r_cuts {
        let key = type_key(&pair, &entry.types)?;
        pair.set_r_cut(key, entry.r_cut)?;
    }
    Ok(pair)
}

/// Builds the configured potential. Parameters are stored as given; whether they
/// are complete is only known once a pass runs.
pub fn potential_from_config(ip: &InputParams) -> AnisoResult<AnisoPotential> {
    ip.check()?;
    match &ip.potential {
        PotentialParams::Dipole { params, mu } => {
            let mut pair = configure_pair(ip, Dipole::new())?;
            for entry in params {
                let key = type_key(&pair, &entry.types)?;
                let record = DipolePartial {
                    a: entry.a,
                    kappa: entry.kappa,
                };
                pair.kernel_mut().set_params(key, record)?;
            }
            for entry in mu {
                let t = pair.type_id(&entry.type_name)?;
                let [x, y, z] = entry.mu;
                pair.kernel_mut().set_mu(t, Vec3::new(x, y, z))?;
            }
            Ok(AnisoPotential::Dipole(pair))
        }
        PotentialParams::GayBerne { params } => {
            let mut pair = configure_pair(ip, GayBerne::new())?;
            for entry in params {
                let key = type_key(&pair, &entry.types)?;
                let record = GayBernePartial {
                    epsilon: entry.epsilon,
                    lperp: entry.lperp,
                    lpar: entry.lpar,
                };
                pair.kernel_mut().set_params(key, record)?;
            }
            Ok(AnisoPotential::GayBerne(pair))
        }
    }
}

/// Random, non-overlapping configuration; types are handed out round robin.
pub fn particles_from_config(ip: &InputParams, simbox: &SimBox, rng: &mut Prng) -> AnisoResult<Vec<Particle>> {
    ip.check()?;
    let min_sep_sqd = ip.min_separation * ip.min_separation;
    let mut particles: Vec<Particle> = Vec::with_capacity(ip.num_particles);
    for idx in 0..ip.num_particles {
        let type_id = (idx % ip.types.len()) as TypeId;
        let mut placed = false;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let pos = simbox.random_pos(rng);
            let overlaps = particles
                .iter()
                .any(|p| simbox.sep_in_box(pos, p.pos()).norm_squared() < min_sep_sqd);
            if !overlaps {
                let or = random_orientation(rng);
                particles.push(Particle::new(idx as ParticleId, pos, or, type_id));
                placed = true;
                break;
            }
        }
        if !placed {
            return Err(invalid(format!(
                "could not place particle {idx} at min_separation = {} in box {:?}",
                ip.min_separation, ip.box_dimensions
            )));
        }
    }
    log::info!("Placed {} particles at random", particles.len());
    Ok(particles)
}

pub fn rng_from_config(ip: &InputParams) -> Prng {
    Prng::seed_from_u64(ip.seed)
}

// for arbitrary trait
fn usize_in_range(g: &mut Gen, min: usize, max: usize) -> usize {
    if min == max {
        return max;
    }
    let x = usize::arbitrary(g);
    let r = x % (max - min) + min;
    assert!(r >= min && r < max);
    r
}

pub(crate) fn f64_in_range(g: &mut Gen, min: f64, max: f64) -> f64 {
    let mut r = f64::INFINITY;
    while !(r.is_normal() || r.is_zero()) {
        let x = f64::arbitrary(g).abs();
        r = x % (max - min) + min;
    }

    assert!(r.is_normal() || r.is_zero());
    assert!(r >= min && r < max);
    r
}

// Fully specified configurations: every type pair gets every required field.
// Shapes stay below unit length so particles at min_separation never overlap.
impl Arbitrary for InputParams {
    fn arbitrary(g: &mut Gen) -> Self {
        let seed = u64::arbitrary(g);
        let num_types = usize_in_range(g, 1, 4);
        let types: Vec<String> = (0..num_types).map(|t| format!("T{t}")).collect();
        let num_particles = usize_in_range(g, 2, 40);
        let side = f64_in_range(g, 8.0, 12.0);
        let mode = if bool::arbitrary(g) { "shift" } else { "none" }.to_string();
        let r_cut = f64_in_range(g, 2.0, 3.5);

        let mut pairs = Vec::new();
        for a in 0..num_types {
            for b in a..num_types {
                pairs.push([types[a].clone(), types[b].clone()]);
            }
        }

        let potential = if bool::arbitrary(g) {
            let params = pairs
                .into_iter()
                .map(|types| DipoleEntry {
                    types,
                    a: Some(f64_in_range(g, 0.0, 2.0)),
                    kappa: Some(f64_in_range(g, 0.0, 2.0)),
                })
                .collect();
            let mu = types
                .iter()
                .map(|t| MuEntry {
                    type_name: t.clone(),
                    mu: [f64_in_range(g, 0.0, 2.0), 0.0, 0.0],
                })
                .collect();
            PotentialParams::Dipole { params, mu }
        } else {
            let params = pairs
                .into_iter()
                .map(|types| GayBerneEntry {
                    types,
                    epsilon: Some(f64_in_range(g, 0.1, 2.0)),
                    lperp: Some(f64_in_range(g, 0.3, 0.5)),
                    lpar: Some(f64_in_range(g, 0.3, 0.5)),
                })
                .collect();
            PotentialParams::GayBerne { params }
        };

        Self {
            seed,
            num_particles,
            box_dimensions: [side, side, side],
            min_separation: 1.0,

            types,
            mode,
            r_cut: Some(r_cut),
            check_cutoff: true,
            r_cuts: Vec::new(),
            potential,
        }
    }
}
