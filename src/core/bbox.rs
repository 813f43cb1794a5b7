use crate::core::math;
use crate::core::ray;
use crate::core::vector;

use std::f32;
use std::fmt;
use std::fmt::Display;

/// An axis-aligned bounding box, stored as its lower and upper corners.
/// After any expansion the invariant lower <= upper holds componentwise.
#[derive(Clone, Copy)]
pub struct BBox {
    pub lower: vector::Vec,
    pub upper: vector::Vec,
}

impl BBox {
    pub fn empty() -> BBox {
        BBox {
            lower: vector::Vec::new(f32::MAX, f32::MAX, f32::MAX),
            upper: vector::Vec::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Constructs a bbox containing the two given points.
    pub fn new(a: vector::Vec, b: vector::Vec) -> BBox {
        BBox {
            lower: vector::Vec::new(
                f32::min(a.x, b.x), f32::min(a.y, b.y), f32::min(a.z, b.z)),
            upper: vector::Vec::new(
                f32::max(a.x, b.x), f32::max(a.y, b.y), f32::max(a.z, b.z)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x
            || self.lower.y > self.upper.y
            || self.lower.z > self.upper.z
    }

    /// Expands the bbox to also contain the given point.
    pub fn expand_point(&self, k: &vector::Vec) -> BBox {
        BBox {
            lower: vector::Vec::new(
                f32::min(self.lower.x, k.x),
                f32::min(self.lower.y, k.y),
                f32::min(self.lower.z, k.z)),
            upper: vector::Vec::new(
                f32::max(self.upper.x, k.x),
                f32::max(self.upper.y, k.y),
                f32::max(self.upper.z, k.z)),
        }
    }

    /// Expands the bbox to also contain another given bbox.
    pub fn expand_bbox(&self, b: &BBox) -> BBox {
        BBox {
            lower: vector::Vec::new(
                f32::min(self.lower.x, b.lower.x),
                f32::min(self.lower.y, b.lower.y),
                f32::min(self.lower.z, b.lower.z)),
            upper: vector::Vec::new(
                f32::max(self.upper.x, b.upper.x),
                f32::max(self.upper.y, b.upper.y),
                f32::max(self.upper.z, b.upper.z)),
        }
    }

    /// Expands the dimensions of the bbox by the given amount along all six
    /// faces. Keeps degenerate "flat" boxes (e.g. an axis-aligned disc or
    /// triangle) from producing zero-thickness slabs.
    pub fn expand_margin(&self, f: f32) -> BBox {
        BBox {
            lower: vector::Vec::new(
                self.lower.x - f, self.lower.y - f, self.lower.z - f),
            upper: vector::Vec::new(
                self.upper.x + f, self.upper.y + f, self.upper.z + f),
        }
    }

    pub fn diagonal(&self) -> vector::Vec {
        self.upper - self.lower
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Returns the axis (0 = x, 1 = y, 2 = z) along which the bbox is
    /// longest.
    pub fn maximum_extent(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        }
        else if d.y > d.z {
            1
        }
        else {
            2
        }
    }

    /// Calculates the intersection of a ray with the bbox. If the ray hits,
    /// returns the parametric interval (t0, t1) during which the ray is
    /// inside the box; t0 is clamped below at zero for rays starting inside.
    /// This is the slab test from Pharr & Humphreys.
    pub fn intersect(&self, r: &ray::Ray) -> Option<(f32, f32)> {
        let mut t0 = 0.0f32;
        let mut t1 = f32::MAX;
        for i in 0..3 {
            // Update the interval for the ith bounding box slab.
            let inv_ray_dir = 1.0 / r.direction[i];
            let mut t_near = (self.lower[i] - r.origin[i]) * inv_ray_dir;
            let mut t_far = (self.upper[i] - r.origin[i]) * inv_ray_dir;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t0 = f32::max(t0, t_near);
            t1 = f32::min(t1, t_far);
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

impl Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BBox {{lower: {}, upper: {}}}", self.lower, self.upper)
    }
}

/// A bounding sphere, used by the light sampler to bound emitters with a
/// solid-angle cone.
#[derive(Clone, Copy)]
pub struct BSphere {
    pub origin: vector::Vec,
    pub radius: f32,
}

impl BSphere {
    pub fn new(origin: vector::Vec, radius: f32) -> BSphere {
        BSphere {origin, radius}
    }

    pub fn from_bbox(b: &BBox) -> BSphere {
        let origin = (b.lower + b.upper) * 0.5;
        let radius = (b.upper - origin).magnitude();
        BSphere {origin, radius}
    }

    pub fn contains(&self, v: &vector::Vec) -> bool {
        (*v - self.origin).squared_magnitude() <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ray::Ray;

    fn unit_box() -> BBox {
        BBox::new(vector::Vec::new(-1.0, -1.0, -1.0), vector::Vec::one())
    }

    #[test]
    fn interval_brackets_the_box() {
        let b = unit_box();
        let r = Ray::new(vector::Vec::new(0.0, 0.0, -5.0), vector::Vec::z_axis());
        let (t0, t1) = b.intersect(&r).expect("axis ray must hit");
        assert!(math::is_close(t0, 4.0, 1.0e-5));
        assert!(math::is_close(t1, 6.0, 1.0e-5));

        // Every parameter within [t0, t1] lies inside the (closed) box and
        // parameters outside it do not.
        for i in 0..=10 {
            let t = math::lerp(t0, t1, i as f32 / 10.0);
            let p = r.at(t);
            assert!(p.x.abs() <= 1.0 + 1.0e-4);
            assert!(p.y.abs() <= 1.0 + 1.0e-4);
            assert!(p.z.abs() <= 1.0 + 1.0e-4);
        }
        assert!(r.at(t0 - 0.01).z < -1.0);
        assert!(r.at(t1 + 0.01).z > 1.0);
    }

    #[test]
    fn miss_returns_none() {
        let b = unit_box();
        let r = Ray::new(
            vector::Vec::new(0.0, 5.0, -5.0), vector::Vec::z_axis());
        assert!(b.intersect(&r).is_none());
    }

    #[test]
    fn origin_inside_clamps_t0() {
        let b = unit_box();
        let r = Ray::new(vector::Vec::zero(), vector::Vec::x_axis());
        let (t0, t1) = b.intersect(&r).unwrap();
        assert_eq!(t0, 0.0);
        assert!(math::is_close(t1, 1.0, 1.0e-5));
    }

    #[test]
    fn expansion_keeps_ordering_invariant() {
        let b = BBox::empty()
            .expand_point(&vector::Vec::new(2.0, -3.0, 0.5))
            .expand_point(&vector::Vec::new(-1.0, 4.0, 0.5))
            .expand_margin(math::VERY_SMALL);
        assert!(!b.is_empty());
        assert!(b.lower.x <= b.upper.x);
        assert!(b.lower.y <= b.upper.y);
        assert!(b.lower.z < b.upper.z); // Flat in z until the margin.
    }

    #[test]
    fn bsphere_encloses_box_corners() {
        let b = unit_box();
        let s = BSphere::from_bbox(&b);
        assert!(s.contains(&b.lower));
        assert!(s.contains(&b.upper));
        assert!(!s.contains(&vector::Vec::new(2.0, 2.0, 2.0)));
    }
}
