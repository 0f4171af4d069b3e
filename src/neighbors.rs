use crate::particle::{IsParticle, Particle, TypeId};
use crate::position::PosDifference;
use crate::simbox::SimBox;

/// One entry of a neighbor list: i and j interact, `dr = r_i - r_j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborPair {
    pub i: usize,
    pub j: usize,
    pub dr: PosDifference,
    pub type_i: TypeId,
    pub type_j: TypeId,
}

impl NeighborPair {
    pub fn new(i: usize, j: usize, dr: PosDifference, type_i: TypeId, type_j: TypeId) -> Self {
        Self {
            i,
            j,
            dr,
            type_i,
            type_j,
        }
    }
}

/// Half neighbor list (each unordered pair once) filtered to a single radius.
///
/// Brute force over all pairs; good enough to drive a pass from the command line,
/// real simulations bring their own cell or tree list.
#[derive(Debug, Clone)]
pub struct NeighborList {
    pairs: Vec<NeighborPair>,
}

impl NeighborList {
    pub fn all_pairs(simbox: &SimBox, particles: &[Particle], r_list: f64) -> Self {
        let r_list_sqd = r_list * r_list;
        let mut pairs = Vec::new();
        for (i, p0) in particles.iter().enumerate() {
            for (j, p1) in particles.iter().enumerate().skip(i + 1) {
                let dr = simbox.sep_in_box(p0.pos(), p1.pos());
                if dr.norm_squared() < r_list_sqd {
                    pairs.push(NeighborPair::new(i, j, dr, p0.type_id(), p1.type_id()));
                }
            }
        }
        log::debug!("Built neighbor list with {} pairs (r_list = {r_list})", pairs.len());
        Self { pairs }
    }

    pub fn pairs(&self) -> &[NeighborPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
