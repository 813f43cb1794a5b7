use crate::core;
use crate::material::bsdf;

use rand::Rng;
use rand::rngs::StdRng;

/// A glossy reflector using the modified Phong lobe of Lafortune & Willems,
/// <http://www.graphics.cornell.edu/~eric/Phong.html>. Exponents near 1 are
/// almost diffuse; exponents in the hundreds are nearly mirror-like.
pub struct Phong {
    pub exponent: f32,
    pub color: core::Vec,
    scale_bsdf: core::Vec,
    scale_prob: f32,
    inv_exponent: f32,
}

impl Phong {
    pub fn new(exponent: f32, color: core::Vec) -> Phong {
        Phong {
            exponent,
            color,
            scale_bsdf: color * ((exponent + 2.0) / core::TWO_PI),
            scale_prob: (exponent + 1.0) / core::TWO_PI,
            inv_exponent: 1.0 / (exponent + 1.0),
        }
    }

    fn eval_internal(&self, perfect_reflect: &core::Vec, outgoing: &core::Vec)
        -> core::Vec
    {
        let cos_alpha = f32::max(0.0, outgoing.dot(perfect_reflect));
        self.scale_bsdf * f32::powf(cos_alpha, self.exponent)
    }

    fn pdf_internal(&self, perfect_reflect: &core::Vec, outgoing: &core::Vec)
        -> f32
    {
        let cos_alpha = f32::max(0.0, outgoing.dot(perfect_reflect));
        self.scale_prob * f32::powf(cos_alpha, self.exponent)
    }

    fn perfect_reflect(incoming: &core::Vec) -> core::Vec {
        core::Vec::new(-incoming.x, -incoming.y, incoming.z)
    }
}

impl bsdf::Bsdf for Phong {
    fn kind(&self) -> bsdf::Kind {
        bsdf::Kind::GLOSSY | bsdf::Kind::REFLECTION
    }

    fn eval_local(&self, incoming: &core::Vec, outgoing: &core::Vec)
        -> core::Vec
    {
        if !incoming.is_local_same_hemisphere(outgoing) {
            return core::Vec::zero();
        }
        self.eval_internal(&Self::perfect_reflect(incoming), outgoing)
    }

    fn pdf_local(&self, incoming: &core::Vec, outgoing: &core::Vec) -> f32 {
        if !incoming.is_local_same_hemisphere(outgoing) {
            return 0.0;
        }
        self.pdf_internal(&Self::perfect_reflect(incoming), outgoing)
    }

    fn sample_local(&self, incoming: &core::Vec, rng: &mut StdRng)
        -> bsdf::BsdfSample
    {
        // Sample the lobe around the perfect mirror direction:
        // Cos[alpha] = u^(1/(n+1)), phi uniform. See Lafortune & Willems for
        // the derivation of the density (n+1)/(2*Pi) * Cos[alpha]^n.
        let perfect_reflect = Self::perfect_reflect(incoming);
        let (reflect_tangent, reflect_binormal) =
            perfect_reflect.coord_system();

        let cos_alpha = f32::powf(rng.gen::<f32>(), self.inv_exponent);
        let sin_alpha = f32::sqrt(f32::max(0.0, 1.0 - cos_alpha * cos_alpha));
        let phi = core::TWO_PI * rng.gen::<f32>();
        let local = core::Vec::new(
            f32::cos(phi) * sin_alpha,
            f32::sin(phi) * sin_alpha,
            cos_alpha);

        // Here "local" is the space of the perfect reflection vector, not of
        // the normal.
        let outgoing = local.local_to_world(
            &reflect_tangent, &reflect_binormal, &perfect_reflect);

        bsdf::BsdfSample {
            bsdf: self.eval_internal(&perfect_reflect, &outgoing),
            pdf: self.pdf_internal(&perfect_reflect, &outgoing),
            outgoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::bsdf::Bsdf;
    use rand::SeedableRng;

    #[test]
    fn sampled_lobe_surrounds_mirror_direction() {
        let mat = Phong::new(100.0, core::Vec::one());
        let incoming = core::Vec::new(0.5, 0.0, 0.5).normalized();
        let mirror = Phong::perfect_reflect(&incoming);
        let mut rng = StdRng::seed_from_u64(30);

        for _ in 0..1000 {
            let sample = mat.sample_local(&incoming, &mut rng);
            assert!(core::is_close(sample.outgoing.magnitude(), 1.0, 1.0e-3));
            // Exponent 100 keeps samples within ~30 degrees of the mirror.
            assert!(sample.outgoing.dot(&mirror) > 0.85);
            assert!(sample.pdf > 0.0);
        }
    }

    #[test]
    fn energy_is_conserved() {
        // E[f * cos / pdf] restricted to the upper hemisphere bounds the
        // hemispherical reflectance; it cannot exceed 1 for color 1.
        let mat = Phong::new(100.0, core::Vec::one());
        let mut rng = StdRng::seed_from_u64(31);

        for &tilt in [0.0f32, 0.4, 0.8].iter() {
            let incoming =
                core::Vec::new(tilt, 0.0, 1.0 - tilt * 0.5).normalized();
            let n = 100000;
            let mut total = 0.0f64;
            for _ in 0..n {
                let sample = mat.sample_local(&incoming, &mut rng);
                if sample.pdf > 0.0
                    && incoming.is_local_same_hemisphere(&sample.outgoing)
                {
                    total += (sample.bsdf.x
                        * sample.outgoing.abs_cos_theta()
                        / sample.pdf) as f64;
                }
            }
            let reflectance = total / n as f64;
            assert!(reflectance <= 1.02, "reflectance = {}", reflectance);
        }
    }

    #[test]
    fn eval_and_pdf_vanish_across_hemispheres() {
        let mat = Phong::new(25.0, core::Vec::one());
        let up = core::Vec::new(0.2, 0.1, 0.9).normalized();
        let down = core::Vec::new(-0.2, -0.1, -0.9).normalized();
        assert!(mat.eval_local(&up, &down).is_exactly_zero());
        assert_eq!(mat.pdf_local(&up, &down), 0.0);
    }
}
