use crate::core;
use crate::material::bsdf;

/// A perfectly-ideal diffuse reflector using Lambertian reflectance.
pub struct Lambert {
    pub albedo: core::Vec,
}

impl Lambert {
    pub fn new(albedo: core::Vec) -> Lambert {
        Lambert {albedo}
    }
}

impl bsdf::Bsdf for Lambert {
    fn kind(&self) -> bsdf::Kind {
        bsdf::Kind::DIFFUSE | bsdf::Kind::REFLECTION
    }

    fn eval_local(&self, incoming: &core::Vec, outgoing: &core::Vec)
        -> core::Vec
    {
        if incoming.is_local_same_hemisphere(outgoing) {
            self.albedo * core::INV_PI
        } else {
            core::Vec::zero()
        }
    }

    fn pdf_local(&self, incoming: &core::Vec, outgoing: &core::Vec) -> f32 {
        if incoming.is_local_same_hemisphere(outgoing) {
            core::CosineSampleHemisphere::pdf(outgoing)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::bsdf::Bsdf;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn eval_is_zero_across_hemispheres() {
        let mat = Lambert::new(core::Vec::new(0.5, 0.5, 0.5));
        let up = core::Vec::new(0.1, 0.1, 1.0).normalized();
        let down = core::Vec::new(0.1, 0.1, -1.0).normalized();
        assert!(mat.eval_local(&up, &down).is_exactly_zero());
        assert_eq!(mat.pdf_local(&up, &down), 0.0);
    }

    #[test]
    fn energy_is_conserved() {
        // The hemispherical reflectance E[f * cos / pdf] must not exceed the
        // albedo (it equals it exactly for Lambert).
        let albedo = 0.5f32;
        let mat = Lambert::new(core::Vec::new(albedo, albedo, albedo));
        let incoming = core::Vec::new(0.4, -0.2, 0.7).normalized();
        let mut rng = StdRng::seed_from_u64(20);

        let n = 100000;
        let mut total = 0.0f64;
        for _ in 0..n {
            let sample = mat.sample_local(&incoming, &mut rng);
            if sample.pdf > 0.0 {
                total += (sample.bsdf.x * sample.outgoing.abs_cos_theta()
                    / sample.pdf) as f64;
            }
        }
        let reflectance = total / n as f64;
        assert!((reflectance - albedo as f64).abs() < 0.02 * albedo as f64,
            "reflectance = {}", reflectance);
    }

    #[test]
    fn sampled_pdf_matches_queried_pdf() {
        let mat = Lambert::new(core::Vec::one());
        let incoming = core::Vec::new(-0.3, 0.6, 0.5).normalized();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..1000 {
            let sample = mat.sample_local(&incoming, &mut rng);
            let queried = mat.pdf_local(&incoming, &sample.outgoing);
            assert!(core::is_close(sample.pdf, queried, 1.0e-5));
        }
    }
}
