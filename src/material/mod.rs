mod bsdf;
pub use self::bsdf::{Bsdf, BsdfSample, Kind, WorldBsdfSample};

mod dielectric;
pub use self::dielectric::Dielectric;

mod lambert;
pub use self::lambert::Lambert;

mod phong;
pub use self::phong::Phong;
