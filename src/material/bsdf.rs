use crate::core;
use crate::geom::Intersection;

use bitflags::bitflags;
use rand::rngs::StdRng;
use rand::distributions::Distribution;

bitflags! {
    /// What a BSDF's distribution looks like. The scattering flags describe
    /// which side of the surface the BSDF can send light to; the shape flags
    /// describe how concentrated the distribution is, SPECULAR meaning a
    /// delta distribution that cannot be evaluated for arbitrary direction
    /// pairs.
    pub struct Kind: u32 {
        const DIFFUSE      = 0b00001;
        const GLOSSY       = 0b00010;
        const SPECULAR     = 0b00100;
        const REFLECTION   = 0b01000;
        const TRANSMISSION = 0b10000;
    }
}

/// The result of sampling a BSDF in the local shading frame.
pub struct BsdfSample {
    /// The sampled direction toward the next bounce, in local space.
    pub outgoing: core::Vec,
    /// The value of the BSDF at (incoming, outgoing).
    pub bsdf: core::Vec,
    /// The probability per unit solid angle of having sampled outgoing.
    /// Zero signals a failed sample that should contribute nothing.
    pub pdf: f32,
}

/// The result of sampling a BSDF through the world-space wrappers.
pub struct WorldBsdfSample {
    pub outgoing: core::Vec,
    pub bsdf: core::Vec,
    pub pdf: f32,
}

/// A bidirectional scattering distribution function. All local-space methods
/// work in a coordinate system where the surface normal is +z; incoming
/// points toward the viewer and outgoing toward the next bounce, both
/// directed away from the surface.
pub trait Bsdf: Send + Sync {
    fn kind(&self) -> Kind;

    /// Evaluates the BSDF for a pair of directions. Must return zero for a
    /// delta distribution, since the probability of an exactly matching
    /// direction pair is zero.
    fn eval_local(&self, incoming: &core::Vec, outgoing: &core::Vec)
        -> core::Vec;

    /// The probability per unit solid angle that Bsdf::sample_local would
    /// choose the given outgoing direction. Must return zero for a delta
    /// distribution.
    fn pdf_local(&self, incoming: &core::Vec, outgoing: &core::Vec) -> f32;

    /// Samples an outgoing direction from the BSDF's distribution and
    /// returns the BSDF value and pdf at that direction. The default
    /// samples the cosine-weighted hemisphere on the incoming vector's side
    /// of the surface, which matches any BSDF whose eval/pdf pair follows
    /// the same-hemisphere convention.
    fn sample_local(&self, incoming: &core::Vec, rng: &mut StdRng)
        -> BsdfSample
    {
        let dist = core::CosineSampleHemisphere {flipped: incoming.z < 0.0};
        let outgoing = dist.sample(rng);
        BsdfSample {
            bsdf: self.eval_local(incoming, &outgoing),
            pdf: core::CosineSampleHemisphere::pdf(&outgoing),
            outgoing,
        }
    }

    /// Whether the integrator should bother with next-event estimation for
    /// this BSDF. False exactly when sampling is a delta distribution, in
    /// which case a light sample can never line up with the BSDF.
    fn should_direct_illuminate(&self) -> bool {
        !self.kind().contains(Kind::SPECULAR)
    }

    /// Evaluates the BSDF and its pdf for world-space directions by building
    /// the shading frame at the intersection.
    fn eval_world(
        &self,
        isect: &Intersection,
        incoming: &core::Vec,
        outgoing: &core::Vec) -> (core::Vec, f32)
    {
        let (tangent, binormal) = isect.normal.coord_system();
        let incoming_local =
            incoming.world_to_local(&tangent, &binormal, &isect.normal);
        let outgoing_local =
            outgoing.world_to_local(&tangent, &binormal, &isect.normal);

        (self.eval_local(&incoming_local, &outgoing_local),
         self.pdf_local(&incoming_local, &outgoing_local))
    }

    /// Samples the BSDF for a world-space incoming direction, returning a
    /// world-space outgoing direction.
    fn sample_world(
        &self,
        isect: &Intersection,
        incoming: &core::Vec,
        rng: &mut StdRng) -> WorldBsdfSample
    {
        let (tangent, binormal) = isect.normal.coord_system();
        let incoming_local =
            incoming.world_to_local(&tangent, &binormal, &isect.normal);
        let sample = self.sample_local(&incoming_local, rng);

        WorldBsdfSample {
            outgoing: sample.outgoing
                .local_to_world(&tangent, &binormal, &isect.normal),
            bsdf: sample.bsdf,
            pdf: sample.pdf,
        }
    }
}
