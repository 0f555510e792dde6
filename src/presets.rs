use std::sync::Arc;

use rand::Rng;

use crate::camera::CameraConfig;
use crate::hittable::{BoxPrim, ConstantMedium, FlipFace, Hittable, HittableList, MovingSphere, Sphere, XyRect, XzRect, YzRect};
// XyRect fixes z (perpendicular to Z), XzRect fixes y (perpendicular to Y,
// floor/ceiling), YzRect fixes x (perpendicular to X, left/right walls) —
// see the axis indices threaded through `impl_aarect!` in hittable.rs.
use crate::integrator::Background;
use crate::material::{Dielectric, DiffuseLight, Isotropic, Lambertian, Metal};
use crate::math::{Color, Point3, Quaternion, Vec3};
use crate::texture::Noise;

/// A world plus the camera and background it was designed to be viewed
/// with — what a scene preset hands the dispatcher before BVH
/// construction.
pub struct SceneDescription {
    pub name: &'static str,
    pub objects: HittableList,
    pub camera_config: CameraConfig,
    pub background: Background,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ScenePreset {
    /// Ray Tracing in One Weekend's closing shot — random diffuse, metal,
    /// and glass spheres with motion-blurred diffuse ones, over a matte
    /// ground plane.
    RandomSpheres,
    /// Two Perlin-noise marble spheres under a quad area light, otherwise
    /// pitch black — exercises direct light sampling.
    SimpleLight,
    /// The Cornell box with two rotated smoke-filled blocks.
    CornellSmoke,
    /// A single Perlin-noise marble sphere over a matching ground sphere.
    PerlinSpheres,
}

impl ScenePreset {
    pub fn build(self) -> SceneDescription {
        match self {
            ScenePreset::RandomSpheres => random_spheres(),
            ScenePreset::SimpleLight => simple_light(),
            ScenePreset::CornellSmoke => cornell_smoke(),
            ScenePreset::PerlinSpheres => perlin_spheres(),
        }
    }
}

fn random_spheres() -> SceneDescription {
    let mut world = HittableList::new();
    let mut rng = rand::thread_rng();

    world.add(Arc::new(Sphere::new(Point3::new(0.0, -1000.0, 0.0), 1000.0, Arc::new(Lambertian::new(Color::splat(0.5))))));

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat: f64 = rng.gen();
            let center = Point3::new(a as f64 + 0.9 * rng.gen::<f64>(), 0.2, b as f64 + 0.9 * rng.gen::<f64>());

            if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let object: Arc<dyn Hittable> = if choose_mat < 0.8 {
                let albedo = Color::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>())
                    .hadamard(Color::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()));
                let material = Arc::new(Lambertian::new(albedo));
                let center2 = center + Vec3::new(0.0, rng.gen_range(0.0..0.5), 0.0);
                Arc::new(MovingSphere::new(center, center2, 0.0, 1.0, 0.2, material))
            } else if choose_mat < 0.95 {
                let albedo = Vec3::random_range(&mut rng, 0.5, 1.0);
                let fuzz = rng.gen_range(0.0..0.5);
                Arc::new(Sphere::new(center, 0.2, Arc::new(Metal::new(albedo, fuzz))))
            } else {
                Arc::new(Sphere::new(center, 0.2, Arc::new(Dielectric::new(1.5))))
            };
            world.add(object);
        }
    }

    world.add(Arc::new(Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, Arc::new(Dielectric::new(1.5)))));
    world.add(Arc::new(Sphere::new(Point3::new(-4.0, 1.0, 0.0), 1.0, Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1))))));
    world.add(Arc::new(Sphere::new(Point3::new(4.0, 1.0, 0.0), 1.0, Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)))));

    SceneDescription {
        name: "Random Spheres",
        objects: world,
        camera_config: CameraConfig {
            look_from: Point3::new(13.0, 2.0, 3.0),
            look_at: Point3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 20.0,
            aspect_ratio: 16.0 / 9.0,
            aperture: 0.1,
            focus_dist: 10.0,
            time0: 0.0,
            time1: 1.0,
        },
        background: Background::solid(Color::new(0.70, 0.80, 1.00)),
    }
}

fn simple_light() -> SceneDescription {
    let mut world = HittableList::new();
    let noise = Arc::new(Noise::new(4.0, 0));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, -1000.0, 0.0), 1000.0, Arc::new(Lambertian::textured(noise.clone())))));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, 2.0, 0.0), 2.0, Arc::new(Lambertian::textured(noise)))));

    let light = Arc::new(DiffuseLight::new(Color::splat(4.0)));
    world.add(Arc::new(Sphere::light(Point3::new(0.0, 7.0, 0.0), 2.0, light.clone())));
    world.add(Arc::new(XyRect::light(3.0, 5.0, 1.0, 3.0, -2.0, light)));

    SceneDescription {
        name: "Simple Light",
        objects: world,
        camera_config: CameraConfig {
            look_from: Point3::new(26.0, 3.0, 6.0),
            look_at: Point3::new(0.0, 2.0, 0.0),
            vup: Vec3::unit_y(),
            vfov_degrees: 20.0,
            aspect_ratio: 16.0 / 9.0,
            aperture: 0.0,
            focus_dist: 10.0,
            time0: 0.0,
            time1: 0.0,
        },
        background: Background::solid(Color::zero()),
    }
}

fn cornell_smoke() -> SceneDescription {
    let mut world = HittableList::new();

    let red = Arc::new(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let white: Arc<Lambertian> = Arc::new(Lambertian::new(Color::splat(0.73)));
    let green = Arc::new(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let light = Arc::new(DiffuseLight::new(Color::splat(7.0)));

    world.add(Arc::new(YzRect::new(0.0, 555.0, 0.0, 555.0, 0.0, green, false)));
    world.add(Arc::new(YzRect::new(0.0, 555.0, 0.0, 555.0, 555.0, red, false)));
    world.add(Arc::new(FlipFace::new(Box::new(XzRect::light(113.0, 443.0, 127.0, 432.0, 554.0, light)))));
    world.add(Arc::new(XzRect::new(0.0, 555.0, 0.0, 555.0, 555.0, white.clone(), false)));
    world.add(Arc::new(XzRect::new(0.0, 555.0, 0.0, 555.0, 0.0, white.clone(), false)));
    world.add(Arc::new(XyRect::new(0.0, 555.0, 0.0, 555.0, 555.0, white.clone(), false)));

    let box1 = Box::new(BoxPrim::new(
        Point3::new(192.0, 165.0, 295.0 + 82.5),
        Quaternion::angle_axis(-15.0, Vec3::unit_y()),
        Vec3::new(82.5, 165.0, 82.5),
        white.clone(),
    ));
    let box2 = Box::new(BoxPrim::new(
        Point3::new(367.0, 82.5, 65.0 + 82.5),
        Quaternion::angle_axis(18.0, Vec3::unit_y()),
        Vec3::new(82.5, 82.5, 82.5),
        white,
    ));

    world.add(Arc::new(ConstantMedium::new(box1, 0.01, Arc::new(Isotropic::new(Color::zero())))));
    world.add(Arc::new(ConstantMedium::new(box2, 0.01, Arc::new(Isotropic::new(Color::ones())))));

    SceneDescription {
        name: "Cornell Smoke",
        objects: world,
        camera_config: CameraConfig {
            look_from: Point3::new(278.0, 278.0, -800.0),
            look_at: Point3::new(278.0, 278.0, 0.0),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 10.0,
            time0: 0.0,
            time1: 0.0,
        },
        background: Background::solid(Color::zero()),
    }
}

fn perlin_spheres() -> SceneDescription {
    let mut world = HittableList::new();
    let noise = Arc::new(Noise::new(4.0, 1));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, -1000.0, 0.0), 1000.0, Arc::new(Lambertian::textured(noise.clone())))));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, 2.0, 0.0), 2.0, Arc::new(Lambertian::textured(noise)))));

    SceneDescription {
        name: "Perlin Spheres",
        objects: world,
        camera_config: CameraConfig {
            look_from: Point3::new(13.0, 2.0, 3.0),
            look_at: Point3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 20.0,
            aspect_ratio: 16.0 / 9.0,
            aperture: 0.0,
            focus_dist: 10.0,
            time0: 0.0,
            time1: 0.0,
        },
        background: Background::solid(Color::new(0.70, 0.80, 1.00)),
    }
}
