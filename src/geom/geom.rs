use crate::core;
use crate::light::AreaLight;
use crate::material::Bsdf;

use std::sync::Arc;
use rand::rngs::StdRng;

/// The information for a ray-object intersection: the hit point, the
/// unit-length surface normal there, and the parametric distance along the
/// ray.
#[derive(Clone, Copy)]
pub struct Intersection {
    pub position: core::Vec,
    pub normal: core::Vec,
    pub distance: f32,
}

impl Intersection {
    pub fn new(position: core::Vec, normal: core::Vec, distance: f32)
        -> Intersection
    {
        Intersection {position, normal, distance}
    }
}

/// A piece of scene geometry. Geometry can carry an optional material (how
/// light scatters off it) and an optional area light (how light is emitted
/// from it); the scene owns both and the geometry holds shared references.
pub trait Geom: Send + Sync {
    /// Returns the closest intersection of the ray with the surface, if any.
    /// Callers are expected to pass unit-length ray directions so that
    /// distances are comparable across geometries.
    fn intersect(&self, ray: &core::Ray) -> Option<Intersection>;

    /// Determines whether the ray hits the surface at any distance inside
    /// (epsilon, max_dist). Cheaper than a full intersection for occlusion
    /// queries.
    fn intersect_shadow(&self, ray: &core::Ray, max_dist: f32) -> bool {
        match self.intersect(ray) {
            Some(isect) => {
                isect.distance > core::VERY_SMALL && isect.distance < max_dist
            }
            None => false,
        }
    }

    /// The world-space bounds of the surface.
    fn bounds(&self) -> core::BBox;

    /// A sphere enclosing the world-space bounds; the light sampler uses it
    /// to bound emitters with a solid-angle cone.
    fn bound_sphere(&self) -> core::BSphere {
        core::BSphere::from_bbox(&self.bounds())
    }

    /// Samples a point uniformly over the surface.
    fn sample_point(&self, rng: &mut StdRng) -> core::Vec;

    /// The total surface area.
    fn area(&self) -> f32;

    fn material(&self) -> Option<&dyn Bsdf>;

    fn light(&self) -> Option<&AreaLight>;

    /// Breaks composite geometry into the leaf geometries that actually
    /// enter the acceleration structure. An empty result means the geometry
    /// is already a leaf and should be inserted as-is.
    fn refine(&self) -> Vec<Arc<dyn Geom>> {
        Vec::new()
    }
}
