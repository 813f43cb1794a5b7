mod camera;
pub use self::camera::Camera;

mod exr;
pub use self::exr::write_exr;

mod film;
pub use self::film::{Film, FilmPixel, FilmSample};

mod integrator;
pub use self::integrator::{Integrator, PathTracerIntegrator};
