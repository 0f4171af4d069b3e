use quickcheck::{Arbitrary, Gen};
use serde::{Deserialize, Serialize};

use crate::f64_in_range;
use crate::position::{quat_from_wxyz, Orientation, Position};

pub type ParticleId = u32;
pub type TypeId = u16;

pub trait IsParticle {
    fn pos(&self) -> Position;
    fn or(&self) -> Orientation;
    fn type_id(&self) -> TypeId;
}

// Clone is implemented to enable quickcheck
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    id: ParticleId,
    type_id: TypeId,
    pos: Position,
    or: Orientation,
}

impl IsParticle for Particle {
    fn pos(&self) -> Position {
        self.pos
    }

    fn or(&self) -> Orientation {
        self.or
    }

    fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl Particle {
    pub fn new(id: ParticleId, pos: Position, or: Orientation, type_id: TypeId) -> Self {
        Self {
            id,
            type_id,
            pos,
            or,
        }
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }
}

// type 0, somewhere in a 10 x 10 x 10 box centred on the origin
impl Arbitrary for Particle {
    fn arbitrary(g: &mut Gen) -> Self {
        let id = u32::arbitrary(g);
        let x = f64_in_range(g, -5.0, 5.0);
        let y = f64_in_range(g, -5.0, 5.0);
        let z = f64_in_range(g, -5.0, 5.0);
        let wxyz = [
            f64_in_range(g, -1.0, 1.0),
            f64_in_range(g, -1.0, 1.0),
            f64_in_range(g, -1.0, 1.0),
            f64_in_range(g, -1.0, 1.0),
        ];
        let norm_sqd: f64 = wxyz.iter().map(|c| c * c).sum();
        let or = if norm_sqd < 1e-6 {
            Orientation::identity()
        } else {
            quat_from_wxyz(wxyz)
        };
        Particle::new(id, Position::new(x, y, z), or, 0)
    }
}

/// Read-only view of the orientation store for one pass.
pub fn orientations(particles: &[Particle]) -> Vec<Orientation> {
    particles.iter().map(|p| p.or()).collect()
}
