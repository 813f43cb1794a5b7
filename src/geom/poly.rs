use crate::core;
use crate::geom::geom;
use crate::light::AreaLight;
use crate::material::Bsdf;

use std::sync::Arc;
use rand::rngs::StdRng;
use rand::distributions::Distribution;

/// A vertex of a triangle: its position and its shading normal.
#[derive(Clone, Copy)]
pub struct PolyPoint {
    pub position: core::Vec,
    pub normal: core::Vec,
}

/// A single triangle. Triangles index into a point table shared with the
/// mesh they were refined from, so that vertices common to several faces are
/// stored once.
pub struct Poly {
    mat: Option<Arc<dyn Bsdf>>,
    light: Option<Arc<AreaLight>>,
    pt0: usize,
    pt1: usize,
    pt2: usize,
    points: Arc<Vec<PolyPoint>>,
}

impl Poly {
    pub fn new(
        mat: Option<Arc<dyn Bsdf>>,
        light: Option<Arc<AreaLight>>,
        pt0: usize,
        pt1: usize,
        pt2: usize,
        points: Arc<Vec<PolyPoint>>) -> Poly
    {
        Poly {mat, light, pt0, pt1, pt2, points}
    }

    fn get(&self, i: usize) -> &PolyPoint {
        &self.points[i]
    }
}

impl geom::Geom for Poly {
    fn intersect(&self, ray: &core::Ray) -> Option<geom::Intersection> {
        // The Moller-Trumbore intersection algorithm. See Wikipedia:
        // <http://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm>
        let pt0 = self.get(self.pt0);
        let pt1 = self.get(self.pt1);
        let pt2 = self.get(self.pt2);

        let edge1 = pt1.position - pt0.position;
        let edge2 = pt2.position - pt0.position;

        let p = ray.direction.cross(&edge2);
        let det = edge1.dot(&p);
        if core::is_nearly_zero(det) {
            return None; // No hit on the plane.
        }

        let inv_det = 1.0 / det;
        let t = ray.origin - pt0.position;
        let u = t.dot(&p) * inv_det;
        if u < 0.0 || u > 1.0 {
            return None; // In the plane but outside the triangle.
        }

        let q = t.cross(&edge1);
        let v = ray.direction.dot(&q) * inv_det;
        if v < 0.0 || (u + v) > 1.0 {
            return None; // In the plane but outside the triangle.
        }

        let dist = edge2.dot(&q) * inv_det;
        if !core::is_positive(dist) {
            return None; // In the triangle but behind us.
        }

        // Interpolate the shading normal with barycentric weights. The
        // interpolation does not preserve unit length, so renormalize; see
        // Pharr & Humphreys pp. 147-148.
        let w = 1.0 - u - v;
        let normal = (pt0.normal * w + pt1.normal * u + pt2.normal * v)
            .normalized();

        Some(geom::Intersection::new(ray.at(dist), normal, dist))
    }

    fn bounds(&self) -> core::BBox {
        core::BBox::new(self.get(self.pt0).position, self.get(self.pt1).position)
            .expand_point(&self.get(self.pt2).position)
    }

    fn sample_point(&self, rng: &mut StdRng) -> core::Vec {
        let (b1, b2) = core::UniformSampleBarycentric {}.sample(rng);
        let b0 = 1.0 - b1 - b2;
        self.get(self.pt0).position * b0
            + self.get(self.pt1).position * b1
            + self.get(self.pt2).position * b2
    }

    fn area(&self) -> f32 {
        // Half the length of the cross product of two sides.
        let edge1 = self.get(self.pt1).position - self.get(self.pt0).position;
        let edge2 = self.get(self.pt2).position - self.get(self.pt0).position;
        0.5 * edge1.cross(&edge2).magnitude()
    }

    fn material(&self) -> Option<&dyn Bsdf> {
        self.mat.as_deref()
    }

    fn light(&self) -> Option<&AreaLight> {
        self.light.as_deref()
    }
}
