use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use photon_trace::camera::Camera;
use photon_trace::dispatcher::dispatch;
use photon_trace::error::RenderError;
use photon_trace::framebuffer::Framebuffer;
use photon_trace::integrator::{quantize, tonemap, trace_ray, Scene};
use photon_trace::io;
use photon_trace::math::Color;
use photon_trace::presets::ScenePreset;

/// photon-trace — an offline Monte Carlo path tracer
#[derive(Parser, Debug)]
#[command(
    name = "photon-trace",
    version,
    about = "An offline, physically based Monte Carlo path tracer",
    after_help = "EXAMPLES:\n  \
                  photon-trace --scene random-spheres --spp 200\n  \
                  photon-trace --scene cornell-smoke --width 600 --height 600 --spp 500\n  \
                  photon-trace --scene simple-light --threads 4 --output light.png"
)]
struct Cli {
    /// Scene preset to render
    #[arg(short, long, value_enum, default_value_t = ScenePreset::RandomSpheres)]
    scene: ScenePreset,

    /// Image width in pixels
    #[arg(short = 'W', long, default_value_t = 400)]
    width: u32,

    /// Image height in pixels
    #[arg(short = 'H', long, default_value_t = 225)]
    height: u32,

    /// Samples per pixel — higher values reduce noise at the cost of render time
    #[arg(long, default_value_t = 64)]
    spp: u32,

    /// Maximum ray bounce depth
    #[arg(long, default_value_t = 16)]
    bounces: u32,

    /// Worker thread count; defaults to the physical core count
    #[arg(long)]
    threads: Option<usize>,

    /// Pixel span handed to a worker per job
    #[arg(long, default_value_t = 256)]
    span: u32,

    /// Override the scene preset's lens aperture (depth of field)
    #[arg(long)]
    aperture: Option<f64>,

    /// Output PNG path
    #[arg(short, long, default_value = "output.png")]
    output: String,
}

fn render(cli: &Cli) -> Result<(), RenderError> {
    let description = cli.scene.build();
    eprintln!("Scene:      {}", description.name);
    eprintln!("Resolution: {}x{} @ {} spp, {} bounces", cli.width, cli.height, cli.spp, cli.bounces);

    let mut camera_config = description.camera_config;
    camera_config.aspect_ratio = cli.width as f64 / cli.height as f64;
    if let Some(aperture) = cli.aperture {
        camera_config.aperture = aperture;
    }
    let camera = Camera::new(&camera_config);

    let mut build_rng = SmallRng::from_entropy();
    let scene = Arc::new(Scene::build(description.objects, description.background, &mut build_rng));
    let camera = Arc::new(camera);

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    eprintln!("Threads:    {threads}");

    let accum = Arc::new(Mutex::new(Framebuffer::new(cli.width, cli.height, Color::zero())));
    let spp = cli.spp;
    let bounces = cli.bounces;
    let width = cli.width;
    let height = cli.height;

    let t0 = Instant::now();

    let worker_accum = accum.clone();
    dispatch(width, height, cli.span, threads, move |job| {
        let scene = scene.clone();
        let camera = camera.clone();
        let accum = worker_accum.clone();
        let mut rng = SmallRng::from_entropy();

        let mut local = Vec::with_capacity((job.end - job.start) as usize);
        for index in job.start..job.end {
            let x = index % width;
            let y = index / width;

            let mut pixel_color = Color::zero();
            for _ in 0..spp {
                let u = (x as f64 + rng.gen::<f64>()) / (width - 1).max(1) as f64;
                let v = (y as f64 + rng.gen::<f64>()) / (height - 1).max(1) as f64;
                let ray = camera.get_ray(u, v, &mut rng);
                pixel_color += trace_ray(&scene, &ray, 0, bounces, &mut rng);
            }
            pixel_color = (pixel_color / spp as f64).sanitized();

            local.push((x, height - 1 - y, pixel_color));
        }

        let mut fb = accum.lock().unwrap();
        for (x, y, color) in local {
            fb.set(x, y, color);
        }
    });

    let elapsed = t0.elapsed();
    let total_rays = width as u64 * height as u64 * spp as u64;
    eprintln!(
        "Finished in {:.2}s ({:.2} Mrays/s)",
        elapsed.as_secs_f64(),
        total_rays as f64 / elapsed.as_secs_f64() / 1e6
    );

    let accum = Arc::try_unwrap(accum)
        .expect("dispatch() joins every worker before returning, dropping all other Arc clones")
        .into_inner()
        .unwrap();

    let mut output = Framebuffer::new(width, height, [0u8; 3]);
    for y in 0..height {
        for x in 0..width {
            output.set(x, y, quantize(tonemap(accum.get(x, y))));
        }
    }

    io::image_io::write_png(&cli.output, &output)?;
    eprintln!("Wrote {}", cli.output);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = render(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
