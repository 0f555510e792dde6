use crate::hittable::{BvhNode, Hittable, HittableList};
use crate::material::ScatterRecord;
use crate::math::{Color, Ray};
use crate::pdf::{HittablePdf, MixturePdf, Pdf};
use std::sync::Arc;

/// Background radiance returned when a ray escapes the scene entirely.
/// Solid color covers the Cornell-box-style scenes this crate targets; a
/// sky gradient is left to the caller to bake into a large enclosing
/// emissive surface instead, since the source renderer treats background
/// as a flat constant (`Renderer::background_color_`).
#[derive(Debug, Clone, Copy)]
pub struct Background {
    pub color: Color,
}

impl Background {
    pub fn solid(color: Color) -> Self {
        Self { color }
    }
}

/// Bundles the frozen scene the dispatcher's worker threads trace against:
/// the BVH root plus the subset of primitives eligible for direct light
/// sampling. Built once before rendering starts and shared read-only
/// across threads.
pub struct Scene {
    pub root: BvhNode,
    pub lights: Arc<HittableList>,
    pub background: Background,
}

impl Scene {
    pub fn build(objects: HittableList, background: Background, rng: &mut dyn rand::RngCore) -> Self {
        let lights = HittableList { objects: objects.lights() };
        let root = BvhNode::build(objects.objects, rng);
        Self { root, lights: Arc::new(lights), background }
    }
}

/// Recursively traces a ray through the scene, combining BSDF importance
/// sampling with light sampling via a 50/50 multiple-importance-sampling
/// mixture. Mirrors `Renderer::Trace`: specular materials (mirror, glass)
/// recurse on their fixed outgoing ray with no PDF division; everything
/// else samples a mixture PDF and divides by its density.
pub fn trace_ray(scene: &Scene, ray: &Ray, depth: u32, max_depth: u32, rng: &mut dyn rand::RngCore) -> Color {
    if depth >= max_depth {
        return Color::zero();
    }

    // t_min = 0.001 avoids shadow acne from floating-point self-intersection.
    let hit = match scene.root.hit(ray, 0.001, f64::INFINITY) {
        Some(hit) => hit,
        None => return scene.background.color,
    };

    let emitted = hit.material.emitted(ray, &hit, hit.u, hit.v, hit.point);

    let srec = match hit.material.scatter(ray, &hit, rng) {
        Some(srec) => srec,
        None => return emitted,
    };

    match srec {
        ScatterRecord::Specular { specular_ray, attenuation } => {
            emitted + attenuation.hadamard(trace_ray(scene, &specular_ray, depth + 1, max_depth, rng))
        }
        ScatterRecord::Scatter { attenuation, pdf } => {
            let (scattered, pdf_val) = if scene.lights.is_empty() {
                let direction = pdf.generate(rng);
                (Ray::new(hit.point, direction, ray.time), pdf.value(direction))
            } else {
                let light_pdf = HittablePdf::new(hit.point, scene.lights.clone());
                let mixture = MixturePdf::new(&light_pdf, pdf.as_ref());
                let direction = mixture.generate(rng);
                (Ray::new(hit.point, direction, ray.time), mixture.value(direction))
            };

            if pdf_val <= 0.0 {
                return emitted;
            }

            let scattering_pdf = hit.material.scattering_pdf(ray, &hit, &scattered);
            let incoming = trace_ray(scene, &scattered, depth + 1, max_depth, rng);
            emitted + attenuation.hadamard(incoming) * scattering_pdf / pdf_val
        }
    }
}

/// sRGB-ish tonemap curve applied after averaging a pixel's samples:
/// `1.055 * x^(1/2.4) - 0.055`, clamped to non-negative before the power to
/// avoid NaN from a stray negative sample.
pub fn tonemap(color: Color) -> Color {
    let gamma = |c: f64| {
        let c = c.max(0.0);
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    Color::new(gamma(color.x), gamma(color.y), gamma(color.z))
}

/// Quantizes a tonemapped, NaN-sanitized linear-[0,1] color to 8-bit sRGB,
/// matching `SdrColor`'s `256 * clamp(c, 0, 0.999)` bucketing rather than a
/// naive round so that `1.0` never overflows into `256`.
pub fn quantize(color: Color) -> [u8; 3] {
    let bucket = |c: f64| (256.0 * c.clamp(0.0, 0.999)) as u8;
    [bucket(color.x), bucket(color.y), bucket(color.z)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::Sphere;
    use crate::material::Lambertian;
    use crate::math::Point3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn empty_scene_returns_background_color() {
        let mut rng = SmallRng::seed_from_u64(0);
        let scene = Scene::build(HittableList::new(), Background::solid(Color::new(0.5, 0.7, 1.0)), &mut rng);
        let ray = Ray::new(Point3::zero(), crate::math::Vec3::unit_z(), 0.0);
        let color = trace_ray(&scene, &ray, 0, 8, &mut rng);
        assert_eq!(color, Color::new(0.5, 0.7, 1.0));
    }

    #[test]
    fn depth_cutoff_returns_black_without_tracing_further() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut objects = HittableList::new();
        objects.add(std::sync::Arc::new(Sphere::new(
            Point3::zero(),
            1.0,
            std::sync::Arc::new(Lambertian::new(Color::splat(0.9))),
        )));
        let scene = Scene::build(objects, Background::solid(Color::zero()), &mut rng);
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), crate::math::Vec3::unit_z(), 0.0);
        assert_eq!(trace_ray(&scene, &ray, 8, 8, &mut rng), Color::zero());
    }

    #[test]
    fn tonemap_clamps_negative_input_before_the_power_curve() {
        let out = tonemap(Color::new(-1.0, 0.0, 1.0));
        assert_eq!(out.x, -0.055);
        assert_eq!(out.y, -0.055);
        assert_eq!(out.z, 1.0);
    }

    #[test]
    fn quantize_never_overflows_at_full_intensity() {
        let rgb = quantize(Color::ones());
        assert_eq!(rgb, [255, 255, 255]);
    }
}
