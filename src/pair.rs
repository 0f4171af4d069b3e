use crate::error::{AnisoError, AnisoResult};
use crate::evaluator::{AccumulatedOutputs, PairEvaluator};
use crate::neighbors::NeighborPair;
use crate::particle::{orientations, IsParticle, Particle, TypeId};
use crate::potentials::{AnisoKernel, Dipole, GayBerne};
use crate::shape::{report_type_shapes, TypeShape};
use crate::shift::ShiftMode;
use crate::stats::PassStats;
use crate::typepair::{Cutoff, CutoffField, CutoffPartial, ParamKey, TypePairKey, TypePairTable, Unresolved};

/// Configuration of one anisotropic pair potential instance: the declared
/// types, the `r_cut` table, the shift mode and the kernel with its parameters.
///
/// Mutated only between passes; a pass borrows it immutably.
#[derive(Debug, Clone)]
pub struct AnisoPair<K: AnisoKernel> {
    types: Vec<String>,
    r_cut: TypePairTable<Cutoff>,
    check_cutoff: bool,
    mode: ShiftMode,
    kernel: K,
}

impl<K: AnisoKernel> AnisoPair<K> {
    /// `r_cut` is the default cutoff for every pair, `None` leaves pairs without one
    /// until they are set explicitly.
    pub fn new(types: Vec<String>, kernel: K, r_cut: Option<f64>, mode: ShiftMode) -> AnisoResult<Self> {
        if types.len() > TypeId::MAX as usize {
            return Err(AnisoError::InvalidConfiguration(format!(
                "{} types declared, at most {} supported",
                types.len(),
                TypeId::MAX
            )));
        }
        let mut r_cut_table = TypePairTable::new();
        if let Some(r_cut) = r_cut {
            r_cut_table.set_default(CutoffField::RCut, r_cut)?;
        }
        Ok(Self {
            types,
            r_cut: r_cut_table,
            check_cutoff: true,
            mode,
            kernel,
        })
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    pub fn type_id(&self, name: &str) -> AnisoResult<TypeId> {
        self.types
            .iter()
            .position(|t| t == name)
            .map(|idx| idx as TypeId)
            .ok_or_else(|| AnisoError::InvalidConfiguration(format!("unknown particle type {name:?}")))
    }

    pub fn key(&self, a: &str, b: &str) -> AnisoResult<TypePairKey> {
        Ok(TypePairKey::new(self.type_id(a)?, self.type_id(b)?))
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    pub fn mode(&self) -> ShiftMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ShiftMode) {
        self.mode = mode;
    }

    /// Accepts "none" or "shift".
    pub fn set_mode_str(&mut self, mode: &str) -> AnisoResult<()> {
        self.mode = mode.parse()?;
        Ok(())
    }

    pub fn r_cut_table(&self) -> &TypePairTable<Cutoff> {
        &self.r_cut
    }

    pub fn set_r_cut(&mut self, key: TypePairKey, r_cut: f64) -> AnisoResult<()> {
        self.r_cut.set(key, CutoffPartial::new(r_cut))
    }

    pub fn set_default_r_cut(&mut self, r_cut: f64) -> AnisoResult<()> {
        self.r_cut.set_default(CutoffField::RCut, r_cut)
    }

    /// With checking off every pair interacts at any distance the neighbor list hands over.
    pub fn set_check_cutoff(&mut self, check_cutoff: bool) {
        self.check_cutoff = check_cutoff;
    }

    pub fn check_cutoff(&self) -> bool {
        self.check_cutoff
    }

    fn type_name(&self, t: TypeId) -> &str {
        self.types.get(t as usize).map(String::as_str).unwrap_or("?")
    }

    pub fn label(&self, key: ParamKey) -> String {
        match key {
            ParamKey::Single(t) => format!("({})", self.type_name(t)),
            ParamKey::Pair(key) => {
                let (a, b) = key.types();
                format!("({}, {})", self.type_name(a), self.type_name(b))
            }
        }
    }

    fn missing_parameter(&self, unresolved: Unresolved) -> AnisoError {
        AnisoError::MissingParameter {
            field: unresolved.field.to_string(),
            pair: self.label(unresolved.key),
        }
    }

    pub fn r_cut(&self, key: TypePairKey) -> AnisoResult<f64> {
        if !self.check_cutoff {
            return Ok(f64::INFINITY);
        }
        self.r_cut
            .get(key)
            .map(|c| c.r_cut)
            .map_err(|u| AnisoError::MissingCutoff { pair: self.label(u.key) })
    }

    fn present_types(&self, particles: &[Particle]) -> AnisoResult<Vec<bool>> {
        let mut present = vec![false; self.num_types()];
        for p in particles {
            match present.get_mut(p.type_id() as usize) {
                Some(flag) => *flag = true,
                None => {
                    return Err(AnisoError::InvalidConfiguration(format!(
                        "particle {} has type {}, only {} types declared",
                        p.id(),
                        p.type_id(),
                        self.num_types()
                    )))
                }
            }
        }
        Ok(present)
    }

    /// Largest cutoff over the type pairs present among `particles`: the radius a
    /// neighbor list must at least search so that no interacting pair is dropped.
    pub fn max_r_cut(&self, particles: &[Particle]) -> AnisoResult<f64> {
        let present = self.present_types(particles)?;
        let mut max = 0.0_f64;
        for ti in 0..self.num_types() {
            for tj in ti..self.num_types() {
                if present[ti] && present[tj] {
                    max = max.max(self.r_cut(TypePairKey::new(ti as TypeId, tj as TypeId))?);
                }
            }
        }
        Ok(max)
    }

    /// Resolves every cutoff and parameter record needed for `particles`. This is
    /// where missing required fields surface.
    pub fn evaluator(&self, particles: &[Particle]) -> AnisoResult<PairEvaluator<'_, K>> {
        let n = self.num_types();
        let present = self.present_types(particles)?;
        let mut table = vec![None; n * n];
        for ti in 0..n {
            for tj in 0..n {
                if !(present[ti] && present[tj]) {
                    continue;
                }
                let key = TypePairKey::new(ti as TypeId, tj as TypeId);
                let r_cut = self.r_cut(key)?;
                let params = self
                    .kernel
                    .pair_params(ti as TypeId, tj as TypeId)
                    .map_err(|u| self.missing_parameter(u))?;
                if ti <= tj {
                    let label = self.label(ParamKey::Pair(key));
                    log::debug!("{} {label}: r_cut = {r_cut}, {params:?}", self.kernel.name());
                    self.kernel.lint_pair(&label, &params, r_cut);
                }
                table[ti * n + tj] = Some((r_cut, params));
            }
        }
        Ok(PairEvaluator::new(&self.kernel, self.mode, n, table))
    }

    /// One full force-compute pass over `pairs`.
    pub fn compute(&self, pairs: &[NeighborPair], particles: &[Particle]) -> AnisoResult<(AccumulatedOutputs, PassStats)> {
        self.evaluator(particles)?.evaluate(pairs, &orientations(particles))
    }

    pub fn compute_parallel(
        &self,
        pairs: &[NeighborPair],
        particles: &[Particle],
    ) -> AnisoResult<(AccumulatedOutputs, PassStats)> {
        self.evaluator(particles)?
            .evaluate_parallel(pairs, &orientations(particles))
    }

    pub fn type_shapes(&self) -> AnisoResult<Vec<TypeShape>> {
        report_type_shapes(&self.kernel, self.num_types()).map_err(|u| self.missing_parameter(u))
    }
}

/// The potential kinds a run can be configured with.
#[derive(Debug, Clone)]
pub enum AnisoPotential {
    Dipole(AnisoPair<Dipole>),
    GayBerne(AnisoPair<GayBerne>),
}

impl AnisoPotential {
    pub fn name(&self) -> &'static str {
        match self {
            AnisoPotential::Dipole(pair) => pair.kernel().name(),
            AnisoPotential::GayBerne(pair) => pair.kernel().name(),
        }
    }

    pub fn types(&self) -> &[String] {
        match self {
            AnisoPotential::Dipole(pair) => pair.types(),
            AnisoPotential::GayBerne(pair) => pair.types(),
        }
    }

    pub fn mode(&self) -> ShiftMode {
        match self {
            AnisoPotential::Dipole(pair) => pair.mode(),
            AnisoPotential::GayBerne(pair) => pair.mode(),
        }
    }

    pub fn max_r_cut(&self, particles: &[Particle]) -> AnisoResult<f64> {
        match self {
            AnisoPotential::Dipole(pair) => pair.max_r_cut(particles),
            AnisoPotential::GayBerne(pair) => pair.max_r_cut(particles),
        }
    }

    pub fn compute(
        &self,
        pairs: &[NeighborPair],
        particles: &[Particle],
        parallel: bool,
    ) -> AnisoResult<(AccumulatedOutputs, PassStats)> {
        match (self, parallel) {
            (AnisoPotential::Dipole(pair), false) => pair.compute(pairs, particles),
            (AnisoPotential::Dipole(pair), true) => pair.compute_parallel(pairs, particles),
            (AnisoPotential::GayBerne(pair), false) => pair.compute(pairs, particles),
            (AnisoPotential::GayBerne(pair), true) => pair.compute_parallel(pairs, particles),
        }
    }

    pub fn type_shapes(&self) -> AnisoResult<Vec<TypeShape>> {
        match self {
            AnisoPotential::Dipole(pair) => pair.type_shapes(),
            AnisoPotential::GayBerne(pair) => pair.type_shapes(),
        }
    }
}
