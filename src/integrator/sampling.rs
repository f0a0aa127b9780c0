use std::f32::consts::PI;

use crate::geometry::{FloatType, WorldVector};

/// Two unit vectors that together with the unit vector `v` form an orthonormal basis.
/// The first one always lies in the y = 0 or the x = 0 plane, whichever keeps it
/// further from degenerate.
pub fn orthonormal_system(v: &WorldVector) -> (WorldVector, WorldVector) {
    let v2 = if v.x.abs() > v.y.abs() {
        let inverse_length = 1.0 / (v.x * v.x + v.z * v.z).sqrt();
        WorldVector::new(-v.z * inverse_length, 0.0, v.x * inverse_length)
    } else {
        let inverse_length = 1.0 / (v.y * v.y + v.z * v.z).sqrt();
        WorldVector::new(0.0, v.z * inverse_length, -v.y * inverse_length)
    };
    (v2, v.cross(&v2))
}

/// Direction on the unit hemisphere around +Z.
/// `u1` is the cosine of the angle from the pole, `u2` the fraction of a full turn around it.
pub fn hemisphere(u1: FloatType, u2: FloatType) -> WorldVector {
    let r = (1.0 - u1 * u1).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    WorldVector::new(phi.cos() * r, phi.sin() * r, u1)
}

/// Mirror direction of `incident` around `normal`; `normal` must have unit length.
pub fn reflect(incident: &WorldVector, normal: &WorldVector) -> WorldVector {
    incident - normal * (2.0 * incident.dot(normal))
}
