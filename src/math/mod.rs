//! Integer math foundation: fixed-point trig and world-space vectors.

pub mod fixed;

pub use fixed::{
    fixed_cos, fixed_sin, project_x, project_z, quadrant, ANGLE_EAST, ANGLE_NORTH, ANGLE_SOUTH,
    ANGLE_WEST, TRIG_SCALE, TRIG_SHIFT,
};

use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// World-space position/offset in integer units.
///
/// Y increases DOWNWARD, matching the level format: a floor is at a larger
/// Y than the ceiling above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3i {
    pub const ZERO: Vec3i = Vec3i { x: 0, y: 0, z: 0 };

    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3i {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3i {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vec3i {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}
