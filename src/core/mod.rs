mod bbox;
pub use self::bbox::{BBox, BSphere};

mod math;
pub use self::math::*;

mod matrix;
pub use self::matrix::Mat;

mod quat;
pub use self::quat::Quat;

mod random;
pub use self::random::AreaSampleDisk;
pub use self::random::CosineSampleHemisphere;
pub use self::random::UniformSampleBarycentric;
pub use self::random::UniformSampleCone;
pub use self::random::UniformSampleSphere;

mod ray;
pub use self::ray::{LightRay, Ray};

mod vector;
pub use self::vector::Vec;
