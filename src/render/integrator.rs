use crate::core;
use crate::geom::KdTree;

use rand::Rng;
use rand::rngs::StdRng;

/// The number of bounces after which a path is subject to Russian roulette
/// termination, stage 1 (less aggressive).
const RUSSIAN_ROULETTE_DEPTH_1: usize = 5;
/// The number of bounces after which a path is subject to Russian roulette
/// termination, stage 2 (more aggressive).
const RUSSIAN_ROULETTE_DEPTH_2: usize = 50;
/// The floor on stage-1 survival probability, keeping young-ish paths from
/// being starved before stage 2 takes over.
const RUSSIAN_ROULETTE_MIN_PROB: f32 = 0.1;
/// The hard cap on path length; must sit above the stage-2 roulette depth.
const MAX_DEPTH: usize = 100;
/// Limits any single sample to this much radiance per channel, suppressing
/// "fireflies" at the price of a small bias. Raise toward infinity for
/// unbiased output.
const BIASED_RADIANCE_CLAMPING: f32 = 50.0;

/// Sums the light reaching the eye by way of a given ray. Implementations
/// are free to return the same result for every call or to produce
/// stochastic estimates that converge over many iterations.
pub trait Integrator: Send + Sync {
    fn integrate(&self, initial_ray: &core::Ray, kdt: &KdTree, rng: &mut StdRng)
        -> core::Vec;
}

/// The path-tracing integrator: unidirectional path tracing with next-event
/// estimation at every diffuse or glossy vertex, multiple importance
/// sampling of the direct illumination, and two-stage Russian roulette.
pub struct PathTracerIntegrator;

impl Integrator for PathTracerIntegrator {
    fn integrate(&self, initial_ray: &core::Ray, kdt: &KdTree, rng: &mut StdRng)
        -> core::Vec
    {
        let mut radiance = core::Vec::zero();
        // The light ray carries the path throughput: the running product of
        // bsdf * |cos| / pdf along the bounces so far.
        let mut r = core::LightRay::new(initial_ray.origin, initial_ray.direction);
        // Emission found by following a BSDF sample is normally accounted
        // for by the previous vertex's direct illumination; it only counts
        // here when no such estimate existed, i.e. on the first hit and
        // after delta bounces.
        let mut specular_bounce = true;

        let mut depth = 1;
        loop {
            let (isect, obj) = match kdt.intersect(&r.ray) {
                Some(hit) => hit,
                None => break,
            };

            let mat_is_delta = obj.material()
                .map_or(false, |m| !m.should_direct_illuminate());

            if let Some(light) = obj.light() {
                if specular_bounce || mat_is_delta || depth == 1 {
                    radiance += r.color.comp_mult(&light.emit(&r.ray, &isect));
                }
            }

            let mat = match obj.material() {
                Some(m) => m,
                None => break,
            };

            // Next-event estimation against one uniformly-chosen light,
            // weighted by the number of lights. Pointless for delta
            // materials, whose eval is identically zero.
            if mat.should_direct_illuminate() && !kdt.lights().is_empty() {
                let num_lights = kdt.lights().len();
                let picked = kdt.lights()[rng.gen_range(0, num_lights)];
                let emitter = kdt.objects()[picked].as_ref();
                if let Some(area_light) = emitter.light() {
                    let direct = area_light.direct_illuminate(
                        rng, kdt, &r.ray, &isect, mat, emitter);
                    radiance += r.color.comp_mult(&direct) * num_lights as f32;
                }
            }

            // Sample the BSDF for the next bounce.
            let viewer = -r.ray.direction;
            let sample = mat.sample_world(&isect, &viewer, rng);
            if sample.pdf == 0.0 || sample.bsdf.is_exactly_zero() {
                break;
            }

            let scale = sample.bsdf
                * (f32::abs(sample.outgoing.dot(&isect.normal)) / sample.pdf);
            r = core::LightRay::with_color(
                isect.position + sample.outgoing * core::VERY_SMALL,
                sample.outgoing,
                r.color.comp_mult(&scale));
            specular_bounce = mat_is_delta;

            // Russian roulette: unbiased early termination for paths whose
            // throughput no longer matters much. Stage 2 switches to a
            // harsher survival estimate for very old paths.
            if depth > RUSSIAN_ROULETTE_DEPTH_1 {
                let q = if depth > RUSSIAN_ROULETTE_DEPTH_2 {
                    core::clamp(r.luminance(), 0.0, 1.0)
                } else {
                    core::clamp(
                        r.color.max_component(), RUSSIAN_ROULETTE_MIN_PROB, 1.0)
                };
                if rng.gen::<f32>() > q {
                    break;
                }
                r.color = r.color / q;
            }

            if depth > MAX_DEPTH {
                break;
            }
            depth += 1;
        }

        clamp_radiance(&radiance)
    }
}

/// Truncates non-finite and negative channels to zero and clamps the rest,
/// so one unlucky sample cannot poison its pixel.
fn clamp_radiance(radiance: &core::Vec) -> core::Vec {
    let clamp_channel = |x: f32| {
        if !x.is_finite() || x < 0.0 {
            0.0
        } else {
            f32::min(x, BIASED_RADIANCE_CLAMPING)
        }
    };
    core::Vec::new(
        clamp_channel(radiance.x),
        clamp_channel(radiance.y),
        clamp_channel(radiance.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Disc, Geom, Inverted, Sphere};
    use crate::light::AreaLight;
    use crate::material::{Bsdf, Dielectric, Lambert, Phong};

    use std::sync::Arc;
    use rand::SeedableRng;

    #[test]
    fn empty_scene_yields_black() {
        let kdt = KdTree::build(Vec::new());
        let mut rng = StdRng::seed_from_u64(60);
        let ray = core::Ray::new(core::Vec::zero(), -core::Vec::z_axis());
        let color = PathTracerIntegrator {}.integrate(&ray, &kdt, &mut rng);
        assert!(color.is_exactly_zero());
    }

    #[test]
    fn furnace_sphere_converges_to_albedo() {
        // A Lambert sphere of albedo 0.5 inside a uniformly glowing shell of
        // radiance 1 reflects exactly its albedo toward the camera.
        let albedo: Arc<dyn Bsdf> =
            Arc::new(Lambert::new(core::Vec::new(0.5, 0.5, 0.5)));
        let subject = Arc::new(Sphere::new(
            Some(albedo), None, core::Vec::zero(), 1.0)) as Arc<dyn Geom>;

        let shell_light = Arc::new(AreaLight::new(core::Vec::one()));
        let shell = Arc::new(Sphere::new(
            None, Some(shell_light), core::Vec::zero(), 100.0));
        let inverted_shell =
            Arc::new(Inverted::new(shell)) as Arc<dyn Geom>;

        let kdt = KdTree::build(vec![subject, inverted_shell]);
        let integrator = PathTracerIntegrator {};
        let mut rng = StdRng::seed_from_u64(61);

        let ray = core::Ray::new(
            core::Vec::new(0.0, 0.0, 5.0), -core::Vec::z_axis());
        let n = 20000;
        let mut total = 0.0f64;
        for _ in 0..n {
            total += integrator.integrate(&ray, &kdt, &mut rng).x as f64;
        }
        let mean = total / n as f64;
        assert!((mean - 0.5).abs() < 0.025, "mean radiance = {}", mean);
    }

    #[test]
    fn glass_passes_only_the_wall_emission_color() {
        // A red emissive wall seen through a glass sphere: paths that pass
        // through the sphere (or miss it) carry only red radiance.
        let glass: Arc<dyn Bsdf> =
            Arc::new(Dielectric::new(1.5, core::Vec::one()));
        let sphere = Arc::new(Sphere::new(
            Some(glass), None, core::Vec::new(0.0, 0.0, -5.0), 1.0))
            as Arc<dyn Geom>;

        let red = Arc::new(AreaLight::new(core::Vec::new(1.0, 0.0, 0.0)));
        let wall = Arc::new(Disc::new(
            None,
            Some(red),
            core::Vec::new(0.0, 0.0, -20.0),
            core::Vec::z_axis(),
            50.0)) as Arc<dyn Geom>;

        let kdt = KdTree::build(vec![sphere, wall]);
        let integrator = PathTracerIntegrator {};
        let mut rng = StdRng::seed_from_u64(62);

        // Straight through the middle of the sphere.
        let ray = core::Ray::new(core::Vec::zero(), -core::Vec::z_axis());
        let n = 5000;
        let mut mean = core::Vec::zero();
        for _ in 0..n {
            mean += integrator.integrate(&ray, &kdt, &mut rng) / n as f32;
        }
        assert!(mean.x > 0.2, "red = {}", mean.x);
        assert_eq!(mean.y, 0.0);
        assert_eq!(mean.z, 0.0);
    }

    #[test]
    fn cornell_style_scene_stays_finite_and_clamped() {
        let white: Arc<dyn Bsdf> =
            Arc::new(Lambert::new(core::Vec::new(1.0, 1.0, 1.0)));
        let blue: Arc<dyn Bsdf> =
            Arc::new(Lambert::new(core::Vec::new(0.5, 0.6, 1.0)));
        let green: Arc<dyn Bsdf> =
            Arc::new(Lambert::new(core::Vec::new(0.5, 0.9, 0.4)));
        let shiny: Arc<dyn Bsdf> =
            Arc::new(Phong::new(100.0, core::Vec::one()));

        let mut geoms: Vec<Arc<dyn Geom>> = Vec::new();
        let walls: [(core::Vec, core::Vec, &Arc<dyn Bsdf>); 5] = [
            (core::Vec::new(0.0, -18.0, -25.0), core::Vec::y_axis(), &white),
            (core::Vec::new(0.0, 18.0, -25.0), -core::Vec::y_axis(), &white),
            (core::Vec::new(0.0, 0.0, -50.0), core::Vec::z_axis(), &white),
            (core::Vec::new(-20.0, 0.0, -25.0), core::Vec::x_axis(), &blue),
            (core::Vec::new(20.0, 0.0, -25.0), -core::Vec::x_axis(), &green),
        ];
        for &(origin, normal, mat) in walls.iter() {
            geoms.push(Arc::new(Disc::new(
                Some(mat.clone()), None, origin, normal, 100.0)));
        }
        geoms.push(Arc::new(Sphere::new(
            Some(shiny), None, core::Vec::new(0.0, -10.0, -25.0), 8.0)));
        geoms.push(Arc::new(Sphere::new(
            None,
            Some(Arc::new(AreaLight::new(core::Vec::new(4.0, 4.0, 4.0)))),
            core::Vec::new(0.0, 46.0, -25.0),
            30.0)));

        let kdt = KdTree::build(geoms);
        let integrator = PathTracerIntegrator {};
        let mut rng = StdRng::seed_from_u64(63);

        for i in 0..400 {
            let s = (i % 20) as f32 / 19.0 * 1.6 - 0.8;
            let t = (i / 20) as f32 / 19.0 * 1.6 - 0.8;
            let dir = core::Vec::new(s, t, -2.0).normalized();
            let color = integrator.integrate(
                &core::Ray::new(core::Vec::new(0.0, 0.0, 10.0), dir),
                &kdt, &mut rng);

            assert!(color.is_finite());
            for axis in 0..3 {
                assert!(color[axis] >= 0.0);
                assert!(color[axis] <= BIASED_RADIANCE_CLAMPING);
            }
        }
    }
}
