use crate::core::vector;

/// A quaternion, used to express the camera's rotation without suffering
/// gimbal lock while composing.
#[derive(Clone, Copy)]
pub struct Quat {
    pub real: f32,
    pub imaginary: vector::Vec,
}

impl Quat {
    pub fn identity() -> Quat {
        Quat {real: 1.0, imaginary: vector::Vec::zero()}
    }

    /// Constructs the unit quaternion rotating by the given angle (radians,
    /// right-handed) about the given axis. The axis need not be normalized.
    pub fn from_axis_angle(axis: &vector::Vec, angle: f32) -> Quat {
        let half = 0.5 * angle;
        Quat {
            real: f32::cos(half),
            imaginary: axis.normalized() * f32::sin(half),
        }
    }

    pub fn length_squared(&self) -> f32 {
        self.real * self.real + self.imaginary.dot(&self.imaginary)
    }
}
