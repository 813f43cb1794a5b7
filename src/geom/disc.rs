use crate::core;
use crate::geom::geom;
use crate::light::AreaLight;
use crate::material::Bsdf;

use std::sync::Arc;
use rand::rngs::StdRng;
use rand::distributions::Distribution;

/// A flat one-sided disc. The stored normal faces the "front" of the disc;
/// intersections report that normal regardless of which side was struck.
pub struct Disc {
    mat: Option<Arc<dyn Bsdf>>,
    light: Option<Arc<AreaLight>>,
    pub origin: core::Vec,
    pub normal: core::Vec,
    radius: f32,
    radius_squared: f32,
    tangent: core::Vec,
    cotangent: core::Vec,
}

impl Disc {
    pub fn new(
        mat: Option<Arc<dyn Bsdf>>,
        light: Option<Arc<AreaLight>>,
        origin: core::Vec,
        normal: core::Vec,
        radius: f32) -> Disc
    {
        let normal = normal.normalized();
        let (tangent, cotangent) = normal.coord_system();
        Disc {
            mat,
            light,
            origin,
            normal,
            radius,
            radius_squared: radius * radius,
            tangent: tangent * radius,
            cotangent: cotangent * radius,
        }
    }
}

impl geom::Geom for Disc {
    fn intersect(&self, ray: &core::Ray) -> Option<geom::Intersection> {
        // Plane intersection first, then a radial containment test. See
        // Wikipedia: <http://en.wikipedia.org/wiki/Line%E2%80%93plane_intersection>
        let denom = ray.direction.dot(&self.normal);
        if denom == 0.0 {
            return None;
        }

        let d = (self.origin - ray.origin).dot(&self.normal) / denom;
        if !core::is_positive(d) {
            return None;
        }

        // In the plane, but are we in the disc?
        let isect_point = ray.at(d);
        if (isect_point - self.origin).squared_magnitude() < self.radius_squared {
            Some(geom::Intersection::new(isect_point, self.normal, d))
        } else {
            None
        }
    }

    fn bounds(&self) -> core::BBox {
        core::BBox::new(
                self.origin + self.tangent + self.cotangent,
                self.origin - self.tangent - self.cotangent)
            .expand_point(&(self.origin + self.tangent - self.cotangent))
            .expand_point(&(self.origin - self.tangent + self.cotangent))
    }

    fn sample_point(&self, rng: &mut StdRng) -> core::Vec {
        let (x, y) = core::AreaSampleDisk {}.sample(rng);
        self.origin + self.tangent * x + self.cotangent * y
    }

    fn area(&self) -> f32 {
        core::PI * self.radius * self.radius
    }

    fn material(&self) -> Option<&dyn Bsdf> {
        self.mat.as_deref()
    }

    fn light(&self) -> Option<&AreaLight> {
        self.light.as_deref()
    }
}
