use crate::Prng;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use std::f64::consts::PI;

pub type Vec3 = Vector3<f64>;
pub type Quat = UnitQuaternion<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Position = Vec3;
pub type Orientation = Quat;
pub type PosDifference = Vec3;

/// Builds an orientation from (w, x, y, z) components, normalizing on the way in.
pub fn quat_from_wxyz(q: [f64; 4]) -> Quat {
    Quat::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

pub fn quat_to_wxyz(q: &Quat) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}

/// Rotates a body-frame vector into the world frame.
pub fn to_world(or: &Orientation, body: &Vec3) -> Vec3 {
    or.transform_vector(body)
}

pub fn random_pos(rng: &mut Prng, dimensions: &Vec3) -> Position {
    let x: f64 = rng.random_range(-0.5..0.5);
    let y: f64 = rng.random_range(-0.5..0.5);
    let z: f64 = rng.random_range(-0.5..0.5);
    Position::new(x * dimensions.x, y * dimensions.y, z * dimensions.z)
}

// uniform over SO(3), Shoemake's subgroup algorithm
pub fn random_orientation(rng: &mut Prng) -> Orientation {
    let u1: f64 = rng.random();
    let u2: f64 = rng.random();
    let u3: f64 = rng.random();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_quaternion(Quaternion::new(
        b * (2.0 * PI * u3).cos(),
        a * (2.0 * PI * u2).sin(),
        a * (2.0 * PI * u2).cos(),
        b * (2.0 * PI * u3).sin(),
    ))
}
