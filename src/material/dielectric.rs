use crate::core;
use crate::material::bsdf;

use rand::Rng;
use rand::rngs::StdRng;

/// The refractive index for a vacuum (approximately air).
const IOR_VACUUM: f32 = 1.0;

/// A dielectric (nonconductive) material such as glass or water, providing
/// both mirror reflection and refraction. Sampling is a delta distribution:
/// the probability of evaluating an exactly matching direction pair is zero,
/// so eval and pdf are identically zero and next-event estimation is
/// skipped for this material.
pub struct Dielectric {
    pub color: core::Vec,
    /// Cached R(0) for Schlick's approximation.
    r0: f32,
    /// The refraction ratio nVacuum / nMaterial.
    eta_entering: f32,
    /// Inverse of eta_entering (nMaterial / nVacuum).
    eta_exiting: f32,
}

pub const IOR_GLASS: f32 = 1.5;

impl Dielectric {
    pub fn new(ior: f32, color: core::Vec) -> Dielectric {
        let r0_temp = (IOR_VACUUM - ior) / (IOR_VACUUM + ior);
        Dielectric {
            color,
            r0: r0_temp * r0_temp,
            eta_entering: IOR_VACUUM / ior,
            eta_exiting: ior / IOR_VACUUM,
        }
    }
}

impl bsdf::Bsdf for Dielectric {
    fn kind(&self) -> bsdf::Kind {
        bsdf::Kind::SPECULAR | bsdf::Kind::REFLECTION | bsdf::Kind::TRANSMISSION
    }

    fn eval_local(&self, _: &core::Vec, _: &core::Vec) -> core::Vec {
        core::Vec::zero()
    }

    fn pdf_local(&self, _: &core::Vec, _: &core::Vec) -> f32 {
        0.0
    }

    fn sample_local(&self, incoming: &core::Vec, rng: &mut StdRng)
        -> bsdf::BsdfSample
    {
        // Entering = are the normal and the incoming direction on the same
        // side? Geometry reports outward normals, so when exiting a
        // single-shelled object the working normal must be flipped.
        let entering = incoming.z > 0.0;
        let (aligned_normal, eta) = if entering {
            (core::Vec::z_axis(), self.eta_entering)
        } else {
            (-core::Vec::z_axis(), self.eta_exiting)
        };

        let reflect_vector = incoming.reflect(&aligned_normal);
        let refract_vector = incoming.refract(&aligned_normal, eta);

        if refract_vector.is_nearly_zero() {
            // Total internal reflection; the only choice is to reflect.
            return bsdf::BsdfSample {
                bsdf: self.color / reflect_vector.abs_cos_theta(),
                pdf: 1.0,
                outgoing: reflect_vector,
            };
        }

        // Fresnel reflectance via Schlick's approximation; see
        // <http://graphics.stanford.edu/courses/cs148-10-summer/docs/
        // 2006--degreve--reflection_refraction.pdf>. The angle is the angle
        // of incidence when entering the denser medium and the angle of
        // refraction when leaving it.
        let cos_temp = if eta < 1.0 {
            1.0 - incoming.dot(&aligned_normal)
        } else {
            1.0 - refract_vector.dot(&-aligned_normal)
        };
        let cos_temp5 = cos_temp * cos_temp * cos_temp * cos_temp * cos_temp;
        let refl = self.r0 + (1.0 - self.r0) * cos_temp5;
        let refr = 1.0 - refl;

        // Importance sampling: Pr[cast the reflected ray] lands in
        // [0.25, 0.75] based on the reflectance, so neither branch starves.
        let prob_refl = 0.25 + 0.5 * refl;
        let prob_refr = 1.0 - prob_refl;

        if rng.gen::<f32>() < prob_refl {
            bsdf::BsdfSample {
                bsdf: self.color * refl / reflect_vector.abs_cos_theta(),
                pdf: prob_refl,
                outgoing: reflect_vector,
            }
        } else {
            bsdf::BsdfSample {
                bsdf: self.color * refr / refract_vector.abs_cos_theta(),
                pdf: prob_refr,
                outgoing: refract_vector,
            }
        }
    }
}
