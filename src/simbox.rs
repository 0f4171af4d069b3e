use crate::position::{random_pos, PosDifference, Position, Vec3};
use crate::Prng;

fn map_into_range(p: f64, lower: f64, upper: f64) -> f64 {
    if p < lower {
        p + (upper - lower)
    } else if p >= upper {
        p - (upper - lower)
    } else {
        p
    }
}

/// Orthorhombic box centred on the origin, periodic in every dimension.
#[derive(Debug, Clone)]
pub struct SimBox {
    dimensions: Vec3,
}

impl SimBox {
    pub fn new(dimensions: Vec3) -> Self {
        Self { dimensions }
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    pub fn min_x(&self) -> f64 {
        -0.5 * self.dimensions.x
    }
    pub fn max_x(&self) -> f64 {
        0.5 * self.dimensions.x
    }
    pub fn min_y(&self) -> f64 {
        -0.5 * self.dimensions.y
    }
    pub fn max_y(&self) -> f64 {
        0.5 * self.dimensions.y
    }
    pub fn min_z(&self) -> f64 {
        -0.5 * self.dimensions.z
    }
    pub fn max_z(&self) -> f64 {
        0.5 * self.dimensions.z
    }

    pub fn pos_in_box(&self, pos: Position) -> bool {
        pos.x >= self.min_x()
            && pos.x < self.max_x()
            && pos.y >= self.min_y()
            && pos.y < self.max_y()
            && pos.z >= self.min_z()
            && pos.z < self.max_z()
    }

    pub fn map_pos_into_box(&self, pos: Position) -> Position {
        let x = map_into_range(pos.x, self.min_x(), self.max_x());
        let y = map_into_range(pos.y, self.min_y(), self.max_y());
        let z = map_into_range(pos.z, self.min_z(), self.max_z());
        Position::new(x, y, z)
    }

    /// Minimum-image separation p0 - p1. Both positions must already be in the box.
    pub fn sep_in_box(&self, p0: Position, p1: Position) -> PosDifference {
        self.map_pos_into_box(p0 - p1)
    }

    pub fn random_pos(&self, rng: &mut Prng) -> Position {
        random_pos(rng, &self.dimensions)
    }
}
