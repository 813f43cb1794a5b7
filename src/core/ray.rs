use crate::core::vector;

use std::fmt;
use std::fmt::Display;

/// A directed line segment with an origin and a direction. The direction is
/// not necessarily unit-length.
#[derive(Clone, Copy)]
pub struct Ray {
    pub origin: vector::Vec,
    pub direction: vector::Vec,
}

impl Ray {
    pub fn new(origin: vector::Vec, direction: vector::Vec) -> Ray {
        Ray {origin, direction}
    }

    pub fn zero() -> Ray {
        Ray {origin: vector::Vec::zero(), direction: vector::Vec::zero()}
    }

    /// Returns an interpolated point along the ray. Where k = 0 the origin
    /// is returned, and where k = 1, (origin + direction) is returned; the
    /// interpolation also extrapolates for k outside [0, 1].
    pub fn at(&self, k: f32) -> vector::Vec {
        self.origin + k * self.direction
    }

    pub fn unit(&self) -> Ray {
        Ray {origin: self.origin, direction: self.direction.normalized()}
    }

    pub fn is_zero_length(&self) -> bool {
        self.direction.is_nearly_zero()
    }
}

impl Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ray {{origin: {}, direction: {}}}", self.origin, self.direction)
    }
}

/// A ray of light: a ray plus the path throughput accumulated so far.
#[derive(Clone, Copy)]
pub struct LightRay {
    pub ray: Ray,
    pub color: vector::Vec,
}

impl LightRay {
    pub fn new(origin: vector::Vec, direction: vector::Vec) -> LightRay {
        LightRay {ray: Ray::new(origin, direction), color: vector::Vec::one()}
    }

    pub fn with_color(origin: vector::Vec, direction: vector::Vec, color: vector::Vec)
        -> LightRay
    {
        LightRay {ray: Ray::new(origin, direction), color}
    }

    /// Determines whether the ray's throughput is black, within a small
    /// epsilon.
    pub fn is_black(&self) -> bool {
        self.color.is_nearly_zero()
    }

    pub fn luminance(&self) -> f32 {
        self.color.luminance()
    }
}
