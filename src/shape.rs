use serde::{Deserialize, Serialize};

use crate::particle::TypeId;
use crate::potentials::AnisoKernel;
use crate::typepair::Unresolved;

/// Geometric stand-in for a particle type, for visualization only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypeShape {
    /// Semi-axes along local x, y, z.
    Ellipsoid { a: f64, b: f64, c: f64 },
    None,
}

/// One descriptor per declared type, in type order.
pub fn report_type_shapes<K: AnisoKernel>(kernel: &K, num_types: usize) -> Result<Vec<TypeShape>, Unresolved> {
    (0..num_types)
        .map(|t| kernel.type_shape(t as TypeId))
        .collect()
}

pub fn type_shapes_json(shapes: &[TypeShape]) -> serde_json::Result<Vec<String>> {
    shapes.iter().map(serde_json::to_string).collect()
}
