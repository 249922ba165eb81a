#![warn(missing_docs)]

//! Math types for the stlstep converter.
//!
//! Thin wrappers around nalgebra providing the point, vector and direction
//! types used by the STEP body builder, plus the linear tolerance and the
//! integer quantization key that turns tolerant coordinate equality into
//! exact hash-map equality.

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Integer lattice coordinates of a triple quantized by a tolerance.
///
/// Two triples compare equal iff every component rounds to the same multiple
/// of the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantKey {
    /// Quantized x.
    pub x: i64,
    /// Quantized y.
    pub y: i64,
    /// Quantized z.
    pub z: i64,
}

/// Linear tolerance used for degenerate checks and quantization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
}

impl Tolerance {
    /// Default CAD tolerance (1e-6 model units).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Create a tolerance, rejecting zero, negative and non-finite values.
    pub fn new(linear: f64) -> Option<Self> {
        if linear.is_finite() && linear > 0.0 {
            Some(Self { linear })
        } else {
            None
        }
    }

    /// Quantize a coordinate triple onto the tolerance lattice.
    pub fn quantize(&self, x: f64, y: f64, z: f64) -> QuantKey {
        QuantKey {
            x: (x / self.linear).round() as i64,
            y: (y / self.linear).round() as i64,
            z: (z / self.linear).round() as i64,
        }
    }

    /// Quantize a point.
    pub fn quantize_point(&self, p: &Point3) -> QuantKey {
        self.quantize(p.x, p.y, p.z)
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Unit direction and distance from `from` to `to`.
///
/// Returns `None` when the two points are closer than `tol` or either has a
/// non-finite coordinate.
pub fn direction_between(from: &Point3, to: &Point3, tol: &Tolerance) -> Option<(Dir3, f64)> {
    let v = to - from;
    let len = v.norm();
    if !len.is_finite() || tol.is_zero(len) {
        return None;
    }
    Some((Dir3::new_unchecked(v / len), len))
}

/// Normalized cross product `a × b`, or `None` if its magnitude is below `tol`
/// or not finite.
pub fn unit_cross(a: &Vec3, b: &Vec3, tol: &Tolerance) -> Option<Dir3> {
    let c = a.cross(b);
    let len = c.norm();
    if !len.is_finite() || tol.is_zero(len) {
        return None;
    }
    Some(Dir3::new_unchecked(c / len))
}
