use crate::core::math;
use crate::core::vector;

use rand::Rng;
use rand::distributions::Distribution;

/// The number of steradians in a sphere (4 * Pi).
pub const STERADIANS_PER_SPHERE: f32 = 4.0 * math::PI;

/// Samples a unit disk, ensuring that the samples are uniformly distributed
/// throughout the area of the disk.
///
/// Taken from Pharr & Humphreys' concentric disk warp, p. 667.
pub struct AreaSampleDisk;

impl Distribution<(f32, f32)> for AreaSampleDisk {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f32, f32) {
        let sx: f32 = rng.gen_range(-1.0, 1.0);
        let sy: f32 = rng.gen_range(-1.0, 1.0);

        // Handle degeneracy at the origin.
        if sx == 0.0 && sy == 0.0 {
            return (0.0, 0.0);
        }

        let (r, theta) = if sx >= -sy {
            if sx > sy {
                // Region 1.
                (sx, if sy > 0.0 { sy / sx } else { 8.0 + sy / sx })
            } else {
                // Region 2.
                (sy, 2.0 - sx / sy)
            }
        } else {
            if sx <= sy {
                // Region 3.
                (-sx, 4.0 - sy / -sx)
            } else {
                // Region 4.
                (-sy, 6.0 + sx / -sy)
            }
        };
        let theta_pi4 = theta * math::PI_4;
        (r * theta_pi4.cos(), r * theta_pi4.sin())
    }
}

/// Samples a unit hemisphere with a cosine-weighted distribution. Directions
/// with a higher cosine value (more parallel to the normal) are more likely
/// to be chosen than those nearly perpendicular to it.
///
/// Taken from Pharr & Humphreys p. 669.
pub struct CosineSampleHemisphere {
    /// Whether to sample from the hemisphere on the negative z-axis instead
    /// of the positive one.
    pub flipped: bool,
}

impl CosineSampleHemisphere {
    /// The probability that the given direction was sampled from a unit
    /// hemisphere using a cosine-weighted distribution. (It does not matter
    /// whether the hemisphere is on the positive or negative z-axis.)
    pub fn pdf(direction: &vector::Vec) -> f32 {
        direction.abs_cos_theta() * math::INV_PI
    }
}

impl Distribution<vector::Vec> for CosineSampleHemisphere {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> vector::Vec {
        let (x, y) = AreaSampleDisk {}.sample(rng);
        let z = f32::sqrt(f32::max(0.0, 1.0 - x * x - y * y));

        if self.flipped {
            vector::Vec::new(x, y, -z)
        }
        else {
            vector::Vec::new(x, y, z)
        }
    }
}

/// Uniformly samples directions from a unit sphere, with respect to the
/// sphere's surface area.
pub struct UniformSampleSphere;

impl UniformSampleSphere {
    /// The probability that any given solid angle was sampled uniformly
    /// from a unit sphere.
    pub fn pdf() -> f32 {
        1.0 / STERADIANS_PER_SPHERE
    }
}

impl Distribution<vector::Vec> for UniformSampleSphere {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> vector::Vec {
        // See Pharr & Humphreys p. 664.
        let z: f32 = rng.gen_range(-1.0, 1.0);
        let r = f32::sqrt(f32::max(0.0, 1.0 - z * z));
        let phi = math::TWO_PI * rng.gen::<f32>();

        vector::Vec::new(r * f32::cos(phi), r * f32::sin(phi), z)
    }
}

/// Generates a random direction in the cone around the positive z-axis with
/// the given half-angle, uniformly with respect to solid angle.
pub struct UniformSampleCone {
    pub half_angle: f32,
}

impl UniformSampleCone {
    /// The probability that any solid angle already known to be inside the
    /// cone with the given half-angle was sampled uniformly from that cone.
    pub fn pdf_internal(half_angle: f32) -> f32 {
        let solid_angle = math::TWO_PI * (1.0 - half_angle.cos());
        1.0 / solid_angle
    }

    /// The probability that the given direction was sampled uniformly from
    /// the cone with the given half-angle. The probability is uniform inside
    /// the cone and zero outside it.
    pub fn pdf(half_angle: f32, direction: &vector::Vec) -> f32 {
        let cos_half_angle = half_angle.cos();
        if direction.cos_theta() > cos_half_angle {
            let solid_angle = math::TWO_PI * (1.0 - cos_half_angle);
            1.0 / solid_angle
        } else {
            0.0
        }
    }
}

impl Distribution<vector::Vec> for UniformSampleCone {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> vector::Vec {
        let h = self.half_angle.cos();
        let z: f32 = rng.gen_range(h, 1.0);
        let t: f32 = math::TWO_PI * rng.gen::<f32>();
        let r = f32::sqrt(f32::max(0.0, 1.0 - z * z));

        vector::Vec::new(r * t.cos(), r * t.sin(), z)
    }
}

/// Uniformly samples barycentric coordinates over a triangle's area; returns
/// the weights for the second and third vertices (the first vertex takes the
/// remainder).
pub struct UniformSampleBarycentric;

impl Distribution<(f32, f32)> for UniformSampleBarycentric {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f32, f32) {
        let sqrt_x1 = f32::sqrt(rng.gen::<f32>());
        let x2: f32 = rng.gen();
        (sqrt_x1 * (1.0 - x2), sqrt_x1 * x2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn disk_samples_stay_inside_unit_disk() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10000 {
            let (x, y) = AreaSampleDisk {}.sample(&mut rng);
            assert!(x * x + y * y <= 1.0 + 1.0e-6);
        }
    }

    #[test]
    fn hemisphere_samples_are_unit_and_upward() {
        let mut rng = StdRng::seed_from_u64(2);
        let dist = CosineSampleHemisphere {flipped: false};
        for _ in 0..10000 {
            let v = dist.sample(&mut rng);
            assert!(v.z >= 0.0);
            assert!(math::is_close(v.magnitude(), 1.0, 1.0e-3));
        }
    }

    #[test]
    fn hemisphere_inverse_pdf_integrates_to_solid_angle() {
        // E[1/pdf] under the sampling distribution is the measure of the
        // support; for the hemisphere that is 2*Pi steradians.
        let mut rng = StdRng::seed_from_u64(3);
        let dist = CosineSampleHemisphere {flipped: false};
        let n = 200000;
        let mut total = 0.0f64;
        for _ in 0..n {
            let v = dist.sample(&mut rng);
            total += 1.0 / CosineSampleHemisphere::pdf(&v) as f64;
        }
        let mean = total / n as f64;
        assert!(
            (mean - 2.0 * std::f64::consts::PI).abs()
                < 0.05 * 2.0 * std::f64::consts::PI,
            "mean 1/pdf = {}", mean);
    }

    #[test]
    fn cone_samples_stay_inside_cone() {
        let mut rng = StdRng::seed_from_u64(4);
        let half_angle = 0.3f32;
        let dist = UniformSampleCone {half_angle};
        for _ in 0..10000 {
            let v = dist.sample(&mut rng);
            assert!(math::is_close(v.magnitude(), 1.0, 1.0e-3));
            assert!(v.cos_theta() >= half_angle.cos() - 1.0e-5);
            // The in-cone pdf agrees with the checked pdf.
            assert!(math::is_close(
                UniformSampleCone::pdf(half_angle, &v),
                UniformSampleCone::pdf_internal(half_angle),
                1.0e-6));
        }
        // A direction outside the cone has zero probability.
        assert_eq!(
            UniformSampleCone::pdf(half_angle, &vector::Vec::x_axis()), 0.0);
    }

    #[test]
    fn sphere_samples_cover_both_hemispheres() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut above = 0;
        let n = 10000;
        for _ in 0..n {
            let v = UniformSampleSphere {}.sample(&mut rng);
            assert!(math::is_close(v.magnitude(), 1.0, 1.0e-3));
            if v.z > 0.0 {
                above += 1;
            }
        }
        assert!(above > n * 45 / 100 && above < n * 55 / 100);
    }

    #[test]
    fn barycentric_weights_are_a_partition() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..10000 {
            let (u, v) = UniformSampleBarycentric {}.sample(&mut rng);
            assert!(u >= 0.0 && v >= 0.0);
            assert!(u + v <= 1.0 + 1.0e-6);
        }
    }
}
