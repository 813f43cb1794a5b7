use crate::core;
use crate::geom::geom;
use crate::light::AreaLight;
use crate::material::Bsdf;

use std::sync::Arc;
use rand::rngs::StdRng;

/// Wraps another geometry and negates its surface normal, turning it inside
/// out. Useful for emissive shells that should shine inward, e.g. a large
/// sphere standing in for an environment light around the scene.
pub struct Inverted {
    original: Arc<dyn geom::Geom>,
}

impl Inverted {
    pub fn new(original: Arc<dyn geom::Geom>) -> Inverted {
        Inverted {original}
    }
}

impl geom::Geom for Inverted {
    fn intersect(&self, ray: &core::Ray) -> Option<geom::Intersection> {
        self.original.intersect(ray).map(|isect| {
            geom::Intersection::new(isect.position, -isect.normal, isect.distance)
        })
    }

    fn intersect_shadow(&self, ray: &core::Ray, max_dist: f32) -> bool {
        self.original.intersect_shadow(ray, max_dist)
    }

    fn bounds(&self) -> core::BBox {
        self.original.bounds()
    }

    fn bound_sphere(&self) -> core::BSphere {
        self.original.bound_sphere()
    }

    fn sample_point(&self, rng: &mut StdRng) -> core::Vec {
        self.original.sample_point(rng)
    }

    fn area(&self) -> f32 {
        self.original.area()
    }

    fn material(&self) -> Option<&dyn Bsdf> {
        self.original.material()
    }

    fn light(&self) -> Option<&AreaLight> {
        self.original.light()
    }

    /// Refining a wrapped composite re-wraps each leaf, so the flipped
    /// normal survives into the acceleration structure. An already-leaf
    /// inner geometry refines to nothing, keeping the wrapper itself as
    /// the leaf.
    fn refine(&self) -> Vec<Arc<dyn geom::Geom>> {
        self.original.refine()
            .into_iter()
            .map(|g| Arc::new(Inverted::new(g)) as Arc<dyn geom::Geom>)
            .collect()
    }
}
