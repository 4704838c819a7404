//! This module implements some domain-specific momentum and position handling
//! logic.

use crate::numeric::Float;
use nalgebra::SVector;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Position in detector coordinates (cm)
pub type Position = SVector<Float, 3>;

/// Unit direction in detector coordinates
pub type Direction = SVector<Float, 3>;

/// Convenience const for accessing the X coordinate of a vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a vector
pub const Y: usize = 1;

/// Convenience const for accessing the Z coordinate of a vector
pub const Z: usize = 2;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Extract the spatial part of a 4-momentum
pub fn xyz(p: &Momentum) -> Direction {
    Direction::new(p[X], p[Y], p[Z])
}
