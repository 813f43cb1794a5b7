use crate::core;
use crate::geom::geom;
use crate::light::AreaLight;
use crate::material::Bsdf;

use std::sync::Arc;
use rand::rngs::StdRng;
use rand::distributions::Distribution;

pub struct Sphere {
    mat: Option<Arc<dyn Bsdf>>,
    light: Option<Arc<AreaLight>>,
    pub origin: core::Vec,
    pub radius: f32,
}

impl Sphere {
    pub fn new(
        mat: Option<Arc<dyn Bsdf>>,
        light: Option<Arc<AreaLight>>,
        origin: core::Vec,
        radius: f32) -> Sphere
    {
        Sphere {mat, light, origin, radius}
    }
}

impl geom::Geom for Sphere {
    fn intersect(&self, ray: &core::Ray) -> Option<geom::Intersection> {
        let unit = ray.unit();
        let diff = unit.origin - self.origin;
        let l = unit.direction;

        // See Wikipedia:
        // <http://en.wikipedia.org/wiki/Line%E2%80%93sphere_intersection>
        let a = l.dot(&l);
        let b = l.dot(&diff);
        let c = diff.dot(&diff) - self.radius * self.radius;

        let discriminant = b * b - a * c;
        if discriminant > 0.0 {
            let sqrt_discriminant = f32::sqrt(discriminant);
            // The quadratic has at most 2 roots; consider the nearer one
            // first because we want the closest intersection.
            let res_neg = -b - sqrt_discriminant;
            let res_pos = -b + sqrt_discriminant;

            for &res in [res_neg, res_pos].iter() {
                if core::is_positive(res) {
                    let pt = unit.at(res);
                    let normal = (pt - self.origin) / self.radius;
                    return Some(geom::Intersection::new(pt, normal, res));
                }
            }
        }

        // Either no intersection was found or it was behind us.
        None
    }

    fn bounds(&self) -> core::BBox {
        let r = core::Vec::new(self.radius, self.radius, self.radius);
        core::BBox::new(self.origin - r, self.origin + r)
    }

    fn bound_sphere(&self) -> core::BSphere {
        core::BSphere::new(self.origin, self.radius)
    }

    fn sample_point(&self, rng: &mut StdRng) -> core::Vec {
        let dir = core::UniformSampleSphere {}.sample(rng);
        self.origin + dir * self.radius
    }

    fn area(&self) -> f32 {
        4.0 * core::PI * self.radius * self.radius
    }

    fn material(&self) -> Option<&dyn Bsdf> {
        self.mat.as_deref()
    }

    fn light(&self) -> Option<&AreaLight> {
        self.light.as_deref()
    }
}
