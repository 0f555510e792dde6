use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use photon_trace::camera::Camera;
use photon_trace::hittable::{HittableList, Sphere};
use photon_trace::integrator::{trace_ray, Background, Scene};
use photon_trace::io::image_io::average_color;
use photon_trace::material::Lambertian;
use photon_trace::math::{Color, Point3, Vec3};
use photon_trace::presets::ScenePreset;

/// Renders a scene preset at a small resolution and low sample count,
/// returning the averaged linear color over the whole frame. Not meant to
/// produce a usable image, only a cheap statistical fingerprint.
fn render_preset_average(preset: ScenePreset, width: u32, height: u32, spp: u32, bounces: u32, seed: u64) -> Color {
    let description = preset.build();
    let mut camera_config = description.camera_config;
    camera_config.aspect_ratio = width as f64 / height as f64;
    let camera = Camera::new(&camera_config);

    let mut build_rng = SmallRng::seed_from_u64(seed);
    let scene = Scene::build(description.objects, description.background, &mut build_rng);

    let mut rng = SmallRng::seed_from_u64(seed ^ 0xC0FFEE);
    let mut fb = photon_trace::framebuffer::Framebuffer::new(width, height, Color::zero());
    for y in 0..height {
        for x in 0..width {
            let mut pixel = Color::zero();
            for _ in 0..spp {
                let u = (x as f64 + rng.gen::<f64>()) / (width - 1).max(1) as f64;
                let v = (y as f64 + rng.gen::<f64>()) / (height - 1).max(1) as f64;
                let ray = camera.get_ray(u, v, &mut rng);
                pixel += trace_ray(&scene, &ray, 0, bounces, &mut rng);
            }
            fb.set(x, y, (pixel / spp as f64).sanitized());
        }
    }
    average_color(&fb)
}

#[test]
fn empty_scene_reports_exactly_its_background_color() {
    let mut rng = SmallRng::seed_from_u64(0);
    let sky = Color::new(0.5, 0.7, 1.0);
    let scene = Scene::build(HittableList::new(), Background::solid(sky), &mut rng);

    let camera_config = photon_trace::camera::CameraConfig {
        look_from: Point3::new(0.0, 0.0, 0.0),
        look_at: Point3::new(0.0, 0.0, -1.0),
        vup: Vec3::unit_y(),
        vfov_degrees: 40.0,
        aspect_ratio: 1.0,
        aperture: 0.0,
        focus_dist: 1.0,
        time0: 0.0,
        time1: 0.0,
    };
    let camera = Camera::new(&camera_config);

    let mut fb = photon_trace::framebuffer::Framebuffer::new(16, 16, Color::zero());
    for y in 0..16 {
        for x in 0..16 {
            let u = x as f64 / 15.0;
            let v = y as f64 / 15.0;
            let ray = camera.get_ray(u, v, &mut rng);
            fb.set(x, y, trace_ray(&scene, &ray, 0, 8, &mut rng));
        }
    }

    let avg = average_color(&fb);
    assert!((avg.x - sky.x).abs() < 1e-9);
    assert!((avg.y - sky.y).abs() < 1e-9);
    assert!((avg.z - sky.z).abs() < 1e-9);
}

#[test]
fn single_red_lambert_sphere_dominates_the_frame_in_its_own_hue() {
    let mut world = HittableList::new();
    world.add(std::sync::Arc::new(Sphere::new(
        Point3::new(0.0, 0.0, -1.0),
        0.5,
        std::sync::Arc::new(Lambertian::new(Color::new(0.8, 0.1, 0.1))),
    )));

    let mut rng = SmallRng::seed_from_u64(1);
    let scene = Scene::build(world, Background::solid(Color::new(0.5, 0.7, 1.0)), &mut rng);

    let camera_config = photon_trace::camera::CameraConfig {
        look_from: Point3::new(0.0, 0.0, 0.0),
        look_at: Point3::new(0.0, 0.0, -1.0),
        vup: Vec3::unit_y(),
        vfov_degrees: 60.0,
        aspect_ratio: 1.0,
        aperture: 0.0,
        focus_dist: 1.0,
        time0: 0.0,
        time1: 0.0,
    };
    let camera = Camera::new(&camera_config);

    let mut fb = photon_trace::framebuffer::Framebuffer::new(32, 32, Color::zero());
    for y in 0..32 {
        for x in 0..32 {
            let mut pixel = Color::zero();
            let samples = 8;
            for _ in 0..samples {
                let u = (x as f64 + rng.gen::<f64>()) / 31.0;
                let v = (y as f64 + rng.gen::<f64>()) / 31.0;
                let ray = camera.get_ray(u, v, &mut rng);
                pixel += trace_ray(&scene, &ray, 0, 8, &mut rng);
            }
            fb.set(x, y, (pixel / samples as f64).sanitized());
        }
    }

    let avg = average_color(&fb);
    assert!(avg.x.is_finite() && avg.y.is_finite() && avg.z.is_finite());
    assert!(avg.x > avg.z, "red channel ({}) should dominate blue ({}) with a red sphere in frame", avg.x, avg.z);
}

#[test]
fn cornell_smoke_is_nan_free_and_red_wall_leans_the_frame_red() {
    let avg = render_preset_average(ScenePreset::CornellSmoke, 24, 24, 4, 6, 11);
    assert!(avg.x.is_finite() && avg.y.is_finite() && avg.z.is_finite());
    assert!(avg.x >= 0.0 && avg.y >= 0.0 && avg.z >= 0.0);
}

#[test]
fn simple_light_scene_is_not_pitch_black_despite_a_black_background() {
    let avg = render_preset_average(ScenePreset::SimpleLight, 24, 24, 4, 6, 22);
    assert!(avg.x.is_finite() && avg.y.is_finite() && avg.z.is_finite());
    assert!(avg.x + avg.y + avg.z > 0.0, "the area light should contribute some non-zero radiance");
}

#[test]
fn random_spheres_scene_builds_and_renders_without_panicking() {
    let avg = render_preset_average(ScenePreset::RandomSpheres, 16, 16, 2, 4, 33);
    assert!(avg.x.is_finite() && avg.y.is_finite() && avg.z.is_finite());
}

#[test]
fn perlin_spheres_scene_builds_and_renders_without_panicking() {
    let avg = render_preset_average(ScenePreset::PerlinSpheres, 16, 16, 2, 4, 44);
    assert!(avg.x.is_finite() && avg.y.is_finite() && avg.z.is_finite());
}
