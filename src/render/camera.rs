use crate::core;
use crate::geom::KdTree;
use crate::render::exr;
use crate::render::film;
use crate::render::integrator;

use std::io;
use std::path::Path;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;

/// Manages rendering by simulating the action of a physical pinhole camera.
/// The camera owns the image buffer and the master RNG; every iteration it
/// deals one seed per image row so that worker threads get reproducible,
/// independent random streams.
pub struct Camera {
    focal_length: f32,
    lens_radius: f32,
    xform: core::Mat,
    focal_plane_origin: core::Vec,
    focal_plane_right: f32,
    focal_plane_up: f32,
    master_rng: StdRng,
    row_seeds: Vec<u64>,
    img: film::Film,
    iters: i32,
}

impl Camera {
    /// Constructs a camera from its camera-to-world transform, the output
    /// image size in pixels, the field of view in radians (applied to the
    /// smaller image dimension), the focal length, and the f-stop.
    pub fn new(
        xform: core::Mat,
        width: usize,
        height: usize,
        fov: f32,
        focal_length: f32,
        f_stop: f32) -> Camera
    {
        // Size of the focal plane in world units, projected from the field
        // of view at the focal distance. The fov spans the smaller image
        // dimension; the other dimension follows from the aspect ratio.
        let half_extent = focal_length * f32::tan(0.5 * fov);
        let aspect = width as f32 / height as f32;
        let (half_right, half_up) = if width >= height {
            (half_extent * aspect, half_extent)
        } else {
            (half_extent, half_extent / aspect)
        };

        Camera {
            focal_length,
            lens_radius: 0.5 * focal_length / f_stop,
            xform,
            // Image row 0 is the top of the frame, so the plane's y extent
            // runs downward; the camera looks along -z as usual.
            focal_plane_origin: core::Vec::new(-half_right, half_up, -focal_length),
            focal_plane_right: 2.0 * half_right,
            focal_plane_up: -2.0 * half_up,
            master_rng: StdRng::from_entropy(),
            row_seeds: vec![0; height],
            img: film::Film::new(
                width,
                height,
                film::DEFAULT_SAMPLES_PER_PIXEL,
                film::DEFAULT_FILTER_WIDTH),
            iters: 0,
        }
    }

    /// Reseeds the master RNG, making the whole render deterministic.
    pub fn seed(&mut self, seed: u64) {
        self.master_rng = StdRng::seed_from_u64(seed);
    }

    pub fn width(&self) -> usize {
        self.img.width
    }

    pub fn height(&self) -> usize {
        self.img.height
    }

    pub fn iterations(&self) -> i32 {
        self.iters
    }

    pub fn film(&self) -> &film::Film {
        &self.img
    }

    /// Renders one additional iteration of the image and folds it into the
    /// running average.
    pub fn render_once(
        &mut self,
        kdt: &KdTree,
        integrator: &dyn integrator::Integrator)
    {
        self.iters += 1;

        // Deal this iteration's per-row seeds from the master RNG.
        for seed in self.row_seeds.iter_mut() {
            *seed = self.master_rng.gen();
        }

        let width = self.img.width;
        let spp = self.img.samples_per_pixel;
        let row_len = self.img.row_len();
        let (widthf, heightf) =
            (self.img.width as f32, self.img.height as f32);

        let xform = self.xform;
        let focal_plane_origin = self.focal_plane_origin;
        let focal_plane_right = self.focal_plane_right;
        let focal_plane_up = self.focal_plane_up;
        let eye = xform.transform(&core::Vec::zero());
        let row_seeds = &self.row_seeds;

        // Each worker owns exactly one row of the sample array at a time,
        // with its own RNG; nothing is shared mutably across rows.
        self.img.samples_mut()
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let mut rng = StdRng::seed_from_u64(row_seeds[y]);
                for x in 0..width {
                    for idx in 0..spp {
                        let pt_x = x as f32 + rng.gen::<f32>() - 0.5;
                        let pt_y = y as f32 + rng.gen::<f32>() - 0.5;

                        let dir_camera = (focal_plane_origin + core::Vec::new(
                            focal_plane_right * ((pt_x + 0.5) / widthf),
                            focal_plane_up * ((pt_y + 0.5) / heightf),
                            0.0)).normalized();
                        let ray = core::Ray::new(
                            eye, xform.transform_dir(&dir_camera));

                        let color = integrator.integrate(&ray, kdt, &mut rng);
                        row[x * spp + idx] =
                            film::FilmSample {x: pt_x, y: pt_y, color};
                    }
                }
            });

        self.img.commit_samples();
    }

    /// Renders the given number of path-tracing iterations, rewriting the
    /// output file after each one so partial renders are inspectable. A
    /// negative iteration count renders until the process is killed.
    pub fn render_multiple<P: AsRef<Path>>(
        &mut self,
        kdt: &KdTree,
        path: P,
        iterations: i32) -> io::Result<()>
    {
        let tracer = integrator::PathTracerIntegrator {};
        while iterations < 0 || self.iters < iterations {
            self.render_once(kdt, &tracer);
            exr::write_exr(&self.img, &path)?;
            println!("Iteration {}", self.iters);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Geom, Sphere};
    use crate::light::AreaLight;

    use std::sync::Arc;

    #[test]
    fn rays_cover_the_focal_plane_symmetrically() {
        let cam = Camera::new(
            core::Mat::identity(), 64, 64, core::PI_4, 50.0, 16.0);

        // The corners are symmetric about the view axis.
        let center = (cam.focal_plane_origin + core::Vec::new(
            cam.focal_plane_right * 0.5,
            cam.focal_plane_up * 0.5,
            0.0)).normalized();
        assert!((center - -core::Vec::z_axis()).magnitude() < 1.0e-5);
        assert!(cam.lens_radius > 0.0);
    }

    #[test]
    fn render_accumulates_emission_deterministically() {
        // A tiny film pointed at a glowing sphere: every pixel that sees the
        // sphere converges on its emission color, and reseeding reproduces
        // the image bit for bit.
        let emitter = Arc::new(Sphere::new(
            None,
            Some(Arc::new(AreaLight::new(core::Vec::new(2.0, 1.0, 0.5)))),
            core::Vec::new(0.0, 0.0, -30.0),
            25.0)) as Arc<dyn Geom>;
        let kdt = KdTree::build(vec![emitter]);

        let render = |seed: u64| {
            let mut cam = Camera::new(
                core::Mat::identity(), 8, 8, core::PI_4, 50.0, 16.0);
            cam.seed(seed);
            cam.render_once(&kdt, &integrator::PathTracerIntegrator {});
            let center = &cam.film().pixels()[core::index(4, 4, 8)];
            center.accum / center.weight
        };

        let value = render(123);
        assert!(core::is_close(value.x, 2.0, 1.0e-3));
        assert!(core::is_close(value.y, 1.0, 1.0e-3));
        assert!(core::is_close(value.z, 0.5, 1.0e-3));

        let again = render(123);
        assert_eq!(value, again);
    }
}
