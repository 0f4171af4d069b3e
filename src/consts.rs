/// Changing consts in this file changes the conventions every kernel is written against
use crate::position::Vec3;

/// Default electrostatic scale `A` of the dipole potential.
pub const DEFAULT_DIPOLE_A: f64 = 1.0;

/// Pairs handed to each rayon task in a parallel pass.
/// Fixed so that the merge order (and therefore the rounding) does not depend on the thread count.
pub const PAR_CHUNK_PAIRS: usize = 4096;

/// Local-frame direction of a dipole given only by its magnitude.
pub fn local_dipole_axis() -> Vec3 {
    Vec3::x()
}

/// Local-frame long (parallel) axis of a Gay-Berne ellipsoid.
pub fn local_long_axis() -> Vec3 {
    Vec3::z()
}
