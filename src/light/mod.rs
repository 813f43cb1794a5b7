use crate::core;
use crate::geom::{Geom, Intersection, KdTree};
use crate::material::Bsdf;

use rand::rngs::StdRng;
use rand::distributions::Distribution;

/// A diffuse area light that causes radiance to be emitted from a piece of
/// solid geometry. The light holds only the emitted color; the emitting
/// geometry is passed in by the caller, so one light definition can be
/// shared by several emitters.
pub struct AreaLight {
    pub color: core::Vec,
}

impl AreaLight {
    pub fn new(color: core::Vec) -> AreaLight {
        AreaLight {color}
    }

    /// Calculates the emittance of the light via a given ray intersection on
    /// the emitter, assuming no occlusion. Emission is one-sided: a surface
    /// only glows toward rays arriving against its normal, e.g. from the
    /// outside of a sphere or the front of a disc.
    pub fn emit(&self, incoming: &core::Ray, isect: &Intersection) -> core::Vec {
        if incoming.direction.dot(&isect.normal) > 0.0 {
            core::Vec::zero()
        } else {
            self.color
        }
    }

    /// Calculates the emittance of the light via a given ray intersection,
    /// taking into account occlusion by other scene objects.
    pub fn emit_visible(
        &self,
        incoming: &core::Ray,
        isect: &Intersection,
        kdt: &KdTree) -> core::Vec
    {
        if incoming.direction.dot(&isect.normal) > 0.0 {
            return core::Vec::zero();
        }

        // The emitter might be occluded behind another object. Pull the
        // occlusion range in slightly so the emitter itself doesn't count.
        let dist = isect.distance - 2.0 * core::VERY_SMALL;
        if kdt.intersect_shadow(incoming, dist) {
            return core::Vec::zero();
        }

        self.color
    }

    /// Evaluates the emittance from the emitter onto the given point via a
    /// specified direction, along with the probability that
    /// AreaLight::sample_light would have chosen that direction. Required
    /// for weighing BSDF samples against light samples under multiple
    /// importance sampling.
    pub fn eval_light(
        &self,
        kdt: &KdTree,
        emitter: &dyn Geom,
        point: &core::Vec,
        dir_to_light: &core::Vec) -> (core::Vec, f32)
    {
        let emitter_bounds = emitter.bound_sphere();
        let pdf = if emitter_bounds.contains(point) {
            // Inside the bounding sphere the sampler falls back to the whole
            // sphere of directions.
            core::UniformSampleSphere::pdf()
        } else {
            let dir_to_center = emitter_bounds.origin - *point;
            let theta = f32::asin(
                emitter_bounds.radius / dir_to_center.magnitude());

            let normal = dir_to_center.normalized();
            let (tangent, binormal) = normal.coord_system();
            let dir_local =
                dir_to_light.world_to_local(&tangent, &binormal, &normal);
            core::UniformSampleCone::pdf(theta, &dir_local)
        };

        (self.emitted_toward(kdt, emitter, point, dir_to_light), pdf)
    }

    /// Samples the emittance from the emitter onto the given point via a
    /// randomly-chosen direction. Returns the direction toward the light,
    /// the emitted color along it (zero if the direction misses the emitter
    /// or is occluded), and the probability of the direction.
    pub fn sample_light(
        &self,
        rng: &mut StdRng,
        kdt: &KdTree,
        emitter: &dyn Geom,
        point: &core::Vec) -> (core::Vec, core::Vec, f32)
    {
        let emitter_bounds = emitter.bound_sphere();
        let (dir_to_light, pdf) = if emitter_bounds.contains(point) {
            // Inside the bounding sphere, sample the sphere uniformly.
            let dir = core::UniformSampleSphere {}.sample(rng);
            (dir, core::UniformSampleSphere::pdf())
        } else {
            // Outside, sample only the cone of directions subtending the
            // bounding sphere.
            let dir_to_center = emitter_bounds.origin - *point;
            let theta = f32::asin(
                emitter_bounds.radius / dir_to_center.magnitude());

            let normal = dir_to_center.normalized();
            let (tangent, binormal) = normal.coord_system();
            let dir = core::UniformSampleCone {half_angle: theta}
                .sample(rng)
                .local_to_world(&tangent, &binormal, &normal);
            (dir, core::UniformSampleCone::pdf_internal(theta))
        };

        let color = self.emitted_toward(kdt, emitter, point, &dir_to_light);
        (dir_to_light, color, pdf)
    }

    /// Computes the direct illumination from the emitter onto the geometry
    /// hit at isect, combining one sample from the light's distribution with
    /// one sample from the material's distribution via the power heuristic.
    pub fn direct_illuminate(
        &self,
        rng: &mut StdRng,
        kdt: &KdTree,
        incoming: &core::Ray,
        isect: &Intersection,
        mat: &dyn Bsdf,
        emitter: &dyn Geom) -> core::Vec
    {
        self.direct_illuminate_by_light_pdf(rng, kdt, incoming, isect, mat, emitter)
            + self.direct_illuminate_by_mat_pdf(rng, kdt, incoming, isect, mat, emitter)
    }

    /// The component of direct illumination sampled from the light's
    /// distribution and weighted by the power heuristic.
    fn direct_illuminate_by_light_pdf(
        &self,
        rng: &mut StdRng,
        kdt: &KdTree,
        incoming: &core::Ray,
        isect: &Intersection,
        mat: &dyn Bsdf,
        emitter: &dyn Geom) -> core::Vec
    {
        let (outgoing, light_color, light_pdf) =
            self.sample_light(rng, kdt, emitter, &isect.position);

        if light_pdf > 0.0 && !light_color.is_exactly_zero() {
            // Evaluate the material's BSDF and pdf for the same direction.
            let viewer = -incoming.direction;
            let (bsdf, bsdf_pdf) = mat.eval_world(isect, &viewer, &outgoing);

            if bsdf_pdf > 0.0 && !bsdf.is_exactly_zero() {
                let light_weight =
                    core::power_heuristic(1, light_pdf, 1, bsdf_pdf);
                return bsdf.comp_mult(&light_color)
                    * f32::abs(isect.normal.dot(&outgoing))
                    * light_weight / light_pdf;
            }
        }

        core::Vec::zero()
    }

    /// The component of direct illumination sampled from the material's
    /// distribution and weighted by the power heuristic.
    fn direct_illuminate_by_mat_pdf(
        &self,
        rng: &mut StdRng,
        kdt: &KdTree,
        incoming: &core::Ray,
        isect: &Intersection,
        mat: &dyn Bsdf,
        emitter: &dyn Geom) -> core::Vec
    {
        let viewer = -incoming.direction;
        let sample = mat.sample_world(isect, &viewer, rng);

        if sample.pdf > 0.0 && !sample.bsdf.is_exactly_zero() {
            // Evaluate the light's emission and pdf for the same direction.
            let (light_color, light_pdf) = self.eval_light(
                kdt, emitter, &isect.position, &sample.outgoing);

            if light_pdf > 0.0 && !light_color.is_exactly_zero() {
                let bsdf_weight =
                    core::power_heuristic(1, sample.pdf, 1, light_pdf);
                return sample.bsdf.comp_mult(&light_color)
                    * f32::abs(isect.normal.dot(&sample.outgoing))
                    * bsdf_weight / sample.pdf;
            }
        }

        core::Vec::zero()
    }

    /// The color arriving at the point from the emitter along the given
    /// direction: the light's color if the ray actually strikes the emitter
    /// on its glowing side unoccluded, and black otherwise (e.g. when cone
    /// sampling grazes past the emitter's bounding sphere).
    fn emitted_toward(
        &self,
        kdt: &KdTree,
        emitter: &dyn Geom,
        point: &core::Vec,
        dir_to_light: &core::Vec) -> core::Vec
    {
        let point_to_light = core::Ray::new(
            *point + core::VERY_SMALL * *dir_to_light, *dir_to_light);
        match emitter.intersect(&point_to_light) {
            Some(light_isect) => {
                self.emit_visible(&point_to_light, &light_isect, kdt)
            }
            None => core::Vec::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Sphere;

    use std::sync::Arc;
    use rand::SeedableRng;

    fn emitter_scene() -> (KdTree, AreaLight) {
        let light = AreaLight::new(core::Vec::new(4.0, 4.0, 4.0));
        let emitter = Arc::new(Sphere::new(
            None,
            Some(Arc::new(AreaLight::new(core::Vec::new(4.0, 4.0, 4.0)))),
            core::Vec::new(0.0, 0.0, -10.0),
            2.0)) as Arc<dyn Geom>;
        (KdTree::build(vec![emitter]), light)
    }

    #[test]
    fn emission_is_one_sided() {
        let light = AreaLight::new(core::Vec::one());
        let isect = Intersection::new(
            core::Vec::zero(), core::Vec::z_axis(), 1.0);

        // A ray arriving against the normal sees the light.
        let front = core::Ray::new(
            core::Vec::new(0.0, 0.0, 5.0), -core::Vec::z_axis());
        assert!(!light.emit(&front, &isect).is_exactly_zero());

        // A ray arriving along the normal (from behind) sees nothing.
        let back = core::Ray::new(
            core::Vec::new(0.0, 0.0, -5.0), core::Vec::z_axis());
        assert!(light.emit(&back, &isect).is_exactly_zero());
    }

    #[test]
    fn sample_and_eval_pdfs_agree() {
        let (kdt, light) = emitter_scene();
        let emitter = kdt.objects()[0].as_ref();
        let point = core::Vec::zero();
        let mut rng = StdRng::seed_from_u64(50);

        let mut in_cone = 0;
        let n = 1000;
        for _ in 0..n {
            let (dir, color, pdf) =
                light.sample_light(&mut rng, &kdt, emitter, &point);
            assert!(pdf > 0.0);

            let (eval_color, eval_pdf) =
                light.eval_light(&kdt, emitter, &point, &dir);
            // The local/world round trip can push a direction sampled right
            // on the cone boundary outside of it; everywhere else the
            // densities and colors must agree exactly.
            if eval_pdf > 0.0 {
                in_cone += 1;
                assert!(core::is_close(pdf, eval_pdf, 1.0e-6));
                assert_eq!(color, eval_color);
            }
        }
        assert!(in_cone > n * 9 / 10);
    }

    #[test]
    fn cone_pdf_matches_subtended_solid_angle() {
        let (kdt, light) = emitter_scene();
        let emitter = kdt.objects()[0].as_ref();
        let point = core::Vec::zero();
        let mut rng = StdRng::seed_from_u64(51);

        // The emitter subtends a cone with sin(theta) = 2/10 from the
        // origin; uniform cone sampling has constant density over exactly
        // that solid angle.
        let theta = f32::asin(2.0 / 10.0);
        let expected = 1.0 / (core::TWO_PI * (1.0 - theta.cos()));
        let (_, _, pdf) = light.sample_light(&mut rng, &kdt, emitter, &point);
        assert!(core::is_close(pdf, expected, 1.0e-4));
    }

    #[test]
    fn inside_bounding_sphere_samples_whole_sphere() {
        let (kdt, light) = emitter_scene();
        let emitter = kdt.objects()[0].as_ref();
        // A point inside the emitter's bounding sphere.
        let point = core::Vec::new(0.0, 0.0, -9.0);
        let mut rng = StdRng::seed_from_u64(52);

        let (_, _, pdf) = light.sample_light(&mut rng, &kdt, emitter, &point);
        assert!(core::is_close(
            pdf, 1.0 / (4.0 * core::PI), 1.0e-6));
    }
}
