use clap::{App, Arg};
use std::error::Error;
use std::process;

use deltaray::scene::Scene;

fn main() {
    let matches = App::new("deltaray")
        .about("A physically-based Monte Carlo path tracer")
        .arg(
            Arg::with_name("scene")
                .long("scene")
                .value_name("PATH")
                .help("The JSON scene description to render")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .value_name("PATH")
                .help("The EXR file to write; refreshed after every iteration")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("iterations")
                .long("iterations")
                .value_name("N")
                .help("Number of iterations to render; -1 renders until killed")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("camera")
                .long("camera")
                .value_name("NAME")
                .help("The name of the camera to render from")
                .takes_value(true),
        )
        .get_matches();

    let scene_path = matches.value_of("scene").unwrap();
    let output_path = matches.value_of("output").unwrap();
    let camera_name = matches.value_of("camera").unwrap_or("default");
    let iterations = match matches.value_of("iterations").unwrap_or("-1").parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("error: --iterations requires an integer");
            process::exit(1);
        }
    };

    if let Err(err) = run(scene_path, output_path, camera_name, iterations) {
        eprintln!("error: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(
    scene_path: &str,
    output_path: &str,
    camera_name: &str,
    iterations: i32) -> Result<(), Box<dyn Error>>
{
    let mut scene = Scene::from_path(scene_path)?;
    let kdt = scene.build_kdtree();
    let mut camera = scene.take_camera(camera_name)?;

    println!(
        "Rendering {}x{} from camera '{}' ({} objects, {} lights)",
        camera.width(),
        camera.height(),
        camera_name,
        kdt.objects().len(),
        kdt.lights().len());
    camera.render_multiple(&kdt, output_path, iterations)?;
    Ok(())
}
