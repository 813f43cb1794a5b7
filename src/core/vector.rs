use crate::core::math;

use std::fmt;
use std::fmt::Display;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub};

/// A three-component vector of f32's, also used to store RGB radiance and
/// reflectance values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec {
    pub fn new(x: f32, y: f32, z: f32) -> Vec {
        Vec {x, y, z}
    }

    pub fn zero() -> Vec { Self::new(0.0, 0.0, 0.0) }
    pub fn one() -> Vec { Self::new(1.0, 1.0, 1.0) }

    pub fn x_axis() -> Vec { Self::new(1.0, 0.0, 0.0) }
    pub fn y_axis() -> Vec { Self::new(0.0, 1.0, 0.0) }
    pub fn z_axis() -> Vec { Self::new(0.0, 0.0, 1.0) }

    pub fn comp_mult(&self, other: &Vec) -> Vec {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    pub fn comp_div(&self, other: &Vec) -> Vec {
        Self::new(self.x / other.x, self.y / other.y, self.z / other.z)
    }

    pub fn cross(&self, other: &Vec) -> Vec {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x)
    }

    pub fn dot(&self, other: &Vec) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn is_exactly_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Determines whether the vector's magnitude is zero, within a small
    /// epsilon.
    pub fn is_nearly_zero(&self) -> bool {
        math::is_nearly_zero(self.dot(self))
    }

    pub fn squared_magnitude(&self) -> f32 {
        self.dot(self)
    }

    pub fn magnitude(&self) -> f32 {
        f32::sqrt(self.dot(self))
    }

    pub fn normalized(&self) -> Vec {
        let length = self.magnitude();
        Self::new(self.x / length, self.y / length, self.z / length)
    }

    pub fn max_component(&self) -> f32 {
        f32::max(self.x, f32::max(self.y, self.z))
    }

    /// Perceived luminance of an RGB color stored in the vector.
    pub fn luminance(&self) -> f32 {
        0.21 * self.x + 0.71 * self.y + 0.08 * self.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Generates an orthonormal coordinate basis. The first vector must be
    /// given; the two other orthogonal vectors are generated from it.
    /// Taken from page 63 of Pharr & Humphreys' Physically-Based Rendering.
    pub fn coord_system(&self) -> (Vec, Vec) {
        if f32::abs(self.x) > f32::abs(self.y) {
            let inv_len = 1.0 / f32::sqrt(self.x * self.x + self.z * self.z);
            let v2 = Self::new(-self.z * inv_len, 0.0, self.x * inv_len);
            let v3 = self.cross(&v2);
            (v2, v3)
        }
        else {
            let inv_len = 1.0 / f32::sqrt(self.y * self.y + self.z * self.z);
            let v2 = Self::new(0.0, self.z * inv_len, -self.y * inv_len);
            let v3 = self.cross(&v2);
            (v2, v3)
        }
    }

    /// Converts a world-space vector to the local coordinate system defined
    /// by the given basis. The resulting coordinates are (x, y, z), where x
    /// is the weight of the tangent, y the weight of the binormal, and z the
    /// weight of the normal.
    pub fn world_to_local(&self, tangent: &Vec, binormal: &Vec, normal: &Vec)
        -> Vec
    {
        Self::new(self.dot(tangent), self.dot(binormal), self.dot(normal))
    }

    /// Converts a local-space vector back to world-space; the inverse of
    /// Vec::world_to_local for the same basis.
    pub fn local_to_world(&self, tangent: &Vec, binormal: &Vec, normal: &Vec)
        -> Vec
    {
        Self::new(
            tangent.x * self.x + binormal.x * self.y + normal.x * self.z,
            tangent.y * self.x + binormal.y * self.y + normal.y * self.z,
            tangent.z * self.x + binormal.z * self.y + normal.z * self.z
        )
    }

    /// Returns Cos[Theta] of a vector where Theta is the polar angle of the
    /// vector in spherical coordinates, i.e. the angle off the +z axis of the
    /// local shading frame.
    pub fn cos_theta(&self) -> f32 { self.z }

    pub fn abs_cos_theta(&self) -> f32 { f32::abs(self.z) }

    /// Determines if two vectors in the same local coordinate space are in
    /// the same hemisphere.
    pub fn is_local_same_hemisphere(&self, v: &Vec) -> bool {
        self.z * v.z > 0.0
    }

    /// Reflects a vector over a surface normal. The original and reflected
    /// vectors both point away from the surface.
    pub fn reflect(&self, n: &Vec) -> Vec {
        let k = 2.0 * n.dot(self);
        Self::new(n.x * k - self.x, n.y * k - self.y, n.z * k - self.z)
    }

    /// Refracts a vector over a surface with the given relative eta (IOR
    /// ratio). The original and refracted vectors both point away from the
    /// surface. Returns the zero vector on total internal reflection.
    pub fn refract(&self, n: &Vec, eta: f32) -> Vec {
        let cos_theta_in = n.dot(self);
        let sin2_theta_in = f32::max(0.0, 1.0 - cos_theta_in * cos_theta_in);
        let sin2_theta_trans = eta * eta * sin2_theta_in;
        if sin2_theta_trans >= 1.0 {
            Self::zero()
        }
        else {
            let cos_theta_trans = f32::sqrt(1.0 - sin2_theta_trans);
            -eta * *self + (eta * cos_theta_in - cos_theta_trans) * *n
        }
    }
}

impl Display for Vec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Vec {
    type Output = Vec;
    fn add(self, rhs: Vec) -> Vec {
        Vec::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec {
    fn add_assign(&mut self, rhs: Vec) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec {
    type Output = Vec;
    fn sub(self, rhs: Vec) -> Vec {
        Vec::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec {
    type Output = Vec;
    fn mul(self, rhs: f32) -> Vec {
        Vec::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec> for f32 {
    type Output = Vec;
    fn mul(self, rhs: Vec) -> Vec { rhs * self }
}

impl Div<f32> for Vec {
    type Output = Vec;
    fn div(self, rhs: f32) -> Vec {
        Vec::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec {
    type Output = Vec;
    fn neg(self) -> Vec {
        Vec::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vec {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec index out of bounds")
        }
    }
}

impl IndexMut<usize> for Vec {
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec index out of bounds")
        }
    }
}
