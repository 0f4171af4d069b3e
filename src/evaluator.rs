use rayon::prelude::*;
use serde::Serialize;

use crate::consts::PAR_CHUNK_PAIRS;
use crate::error::{AnisoError, AnisoResult};
use crate::neighbors::NeighborPair;
use crate::particle::TypeId;
use crate::position::{Mat3, Orientation, Vec3};
use crate::potentials::{AnisoKernel, PairContext, PairOutput};
use crate::shift::ShiftMode;
use crate::stats::PassStats;
use crate::typepair::TypePairKey;

/// Per-particle results of one pass, plus the pass-wide virial.
///
/// Everything here is an additive contribution; the integrator adds it to the
/// output of whatever other forces act on the system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccumulatedOutputs {
    pub energy: Vec<f64>,
    pub force: Vec<Vec3>,
    pub torque: Vec<Vec3>,
    /// sum over pairs of dr (x) F_i
    pub virial: Mat3,
}

impl AccumulatedOutputs {
    pub fn new(num_particles: usize) -> Self {
        Self {
            energy: vec![0.0; num_particles],
            force: vec![Vec3::zeros(); num_particles],
            torque: vec![Vec3::zeros(); num_particles],
            virial: Mat3::zeros(),
        }
    }

    pub fn num_particles(&self) -> usize {
        self.energy.len()
    }

    pub fn total_energy(&self) -> f64 {
        self.energy.iter().sum()
    }

    pub fn total_force(&self) -> Vec3 {
        self.force.iter().sum()
    }

    // half the pair energy goes to each particle
    fn add_pair(&mut self, ctx: &PairContext, out: &PairOutput) {
        let half = 0.5 * out.energy;
        self.energy[ctx.i] += half;
        self.energy[ctx.j] += half;
        self.force[ctx.i] += out.force;
        self.force[ctx.j] -= out.force;
        self.torque[ctx.i] += out.torque_i;
        self.torque[ctx.j] += out.torque_j;
        self.virial += ctx.dr * out.force.transpose();
    }

    fn merge(&mut self, other: &AccumulatedOutputs) {
        for (a, b) in self.energy.iter_mut().zip(&other.energy) {
            *a += b;
        }
        for (a, b) in self.force.iter_mut().zip(&other.force) {
            *a += b;
        }
        for (a, b) in self.torque.iter_mut().zip(&other.torque) {
            *a += b;
        }
        self.virial += other.virial;
    }
}

/// A pass-ready view of one potential: cutoffs and parameters resolved into a
/// dense `num_types x num_types` table, shift mode fixed.
///
/// Entries are `None` for type pairs that don't occur among the particles the
/// evaluator was built for.
pub struct PairEvaluator<'a, K: AnisoKernel> {
    kernel: &'a K,
    mode: ShiftMode,
    num_types: usize,
    table: Vec<Option<(f64, K::Params)>>,
}

impl<'a, K: AnisoKernel> PairEvaluator<'a, K> {
    pub(crate) fn new(kernel: &'a K, mode: ShiftMode, num_types: usize, table: Vec<Option<(f64, K::Params)>>) -> Self {
        assert_eq!(table.len(), num_types * num_types);
        Self {
            kernel,
            mode,
            num_types,
            table,
        }
    }

    pub fn mode(&self) -> ShiftMode {
        self.mode
    }

    fn lookup(&self, type_i: TypeId, type_j: TypeId) -> AnisoResult<&(f64, K::Params)> {
        let (ti, tj) = (type_i as usize, type_j as usize);
        if ti >= self.num_types || tj >= self.num_types {
            return Err(AnisoError::InvalidConfiguration(format!(
                "type pair ({type_i}, {type_j}) out of range, {} types declared",
                self.num_types
            )));
        }
        self.table[ti * self.num_types + tj].as_ref().ok_or_else(|| {
            AnisoError::InvalidConfiguration(format!(
                "type pair ({type_i}, {type_j}) was not resolved for this pass"
            ))
        })
    }

    /// Contribution of one pair after shifting, `None` when it is out of range.
    pub fn evaluate_pair(&self, pair: &NeighborPair, orientations: &[Orientation]) -> AnisoResult<Option<(PairContext, PairOutput)>> {
        if pair.i == pair.j || pair.i >= orientations.len() || pair.j >= orientations.len() {
            return Err(AnisoError::InvalidConfiguration(format!(
                "bad neighbor pair ({}, {}) for {} particles",
                pair.i,
                pair.j,
                orientations.len()
            )));
        }
        let (r_cut, params) = self.lookup(pair.type_i, pair.type_j)?;

        // the neighbor list may be built with a looser radius than this pair's cutoff
        if pair.dr.norm_squared() >= r_cut * r_cut {
            return Ok(None);
        }

        let ctx = PairContext {
            i: pair.i,
            j: pair.j,
            dr: pair.dr,
            q_i: orientations[pair.i],
            q_j: orientations[pair.j],
            key: TypePairKey::new(pair.type_i, pair.type_j),
        };
        Ok(self
            .kernel
            .evaluate(&ctx, params, *r_cut)
            .map(|raw| {
                let out = self.mode.apply(raw, self.kernel, &ctx, params, *r_cut);
                (ctx, out)
            }))
    }

    fn accumulate(
        &self,
        pairs: &[NeighborPair],
        orientations: &[Orientation],
    ) -> AnisoResult<(AccumulatedOutputs, PassStats)> {
        let mut out = AccumulatedOutputs::new(orientations.len());
        let mut stats = PassStats::new();
        for pair in pairs {
            stats.record_pair();
            if let Some((ctx, contribution)) = self.evaluate_pair(pair, orientations)? {
                out.add_pair(&ctx, &contribution);
                stats.record_in_range();
            }
        }
        Ok((out, stats))
    }

    fn merge_chunks(
        &self,
        num_particles: usize,
        partials: Vec<(AccumulatedOutputs, PassStats)>,
    ) -> (AccumulatedOutputs, PassStats) {
        let mut total = AccumulatedOutputs::new(num_particles);
        let mut stats = PassStats::new();
        for (partial, chunk_stats) in partials.iter() {
            total.merge(partial);
            stats = stats + *chunk_stats;
        }
        log::debug!(
            "{} pass: {} pairs, {} in range, {} outside cutoff",
            self.kernel.name(),
            stats.num_pairs(),
            stats.num_in_range(),
            stats.num_out_of_range()
        );
        (total, stats)
    }

    /// Serial pass over `pairs`. Each unordered pair must appear once; the reaction
    /// on j is applied here.
    ///
    /// Pairs are summed in fixed-size chunks and the chunks merged in order, the
    /// same grouping [`PairEvaluator::evaluate_parallel`] uses, so both agree bit
    /// for bit.
    pub fn evaluate(
        &self,
        pairs: &[NeighborPair],
        orientations: &[Orientation],
    ) -> AnisoResult<(AccumulatedOutputs, PassStats)> {
        let partials = pairs
            .chunks(PAR_CHUNK_PAIRS)
            .map(|chunk| self.accumulate(chunk, orientations))
            .collect::<AnisoResult<Vec<_>>>()?;
        Ok(self.merge_chunks(orientations.len(), partials))
    }

    /// Data-parallel pass: one partial buffer per chunk, merged in chunk order
    /// afterwards. The result does not depend on the number of threads.
    pub fn evaluate_parallel(
        &self,
        pairs: &[NeighborPair],
        orientations: &[Orientation],
    ) -> AnisoResult<(AccumulatedOutputs, PassStats)> {
        let partials = pairs
            .par_chunks(PAR_CHUNK_PAIRS)
            .map(|chunk| self.accumulate(chunk, orientations))
            .collect::<AnisoResult<Vec<_>>>()?;
        Ok(self.merge_chunks(orientations.len(), partials))
    }
}
