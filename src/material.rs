use std::f64::consts::PI;
use std::sync::Arc;

use rand::Rng;

use crate::hittable::HitRecord;
use crate::math::{Color, Ray, Vec3};
use crate::pdf::{CosinePdf, Pdf, SpherePdf};
use crate::texture::{SolidColor, Texture, TextureRef};

/// What a material hands back to the integrator after a scatter event.
/// Specular materials (mirror, glass) skip the PDF machinery entirely and
/// hand back a concrete outgoing ray; everything else hands back a PDF the
/// integrator mixes with light sampling.
pub enum ScatterRecord {
    Specular { specular_ray: Ray, attenuation: Color },
    Scatter { attenuation: Color, pdf: Box<dyn Pdf> },
}

impl ScatterRecord {
    pub fn is_specular(&self) -> bool {
        matches!(self, ScatterRecord::Specular { .. })
    }
}

/// BSDF + emission contract. `scattering_pdf` is the material's own PDF
/// evaluated at a chosen outgoing direction, used as the MIS numerator; it
/// is independent of whatever PDF `scatter` handed back for *sampling*.
pub trait Material: Send + Sync {
    fn scatter(&self, ray_in: &Ray, hit: &HitRecord, rng: &mut dyn rand::RngCore) -> Option<ScatterRecord>;

    fn scattering_pdf(&self, _ray_in: &Ray, _hit: &HitRecord, _scattered: &Ray) -> f64 {
        0.0
    }

    fn emitted(&self, _ray_in: &Ray, _hit: &HitRecord, _u: f64, _v: f64, _p: crate::math::Point3) -> Color {
        Color::zero()
    }
}

pub type MaterialRef = Arc<dyn Material>;

pub struct Lambertian {
    albedo: TextureRef,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self { albedo: Arc::new(SolidColor::new(albedo)) }
    }

    pub fn textured(albedo: TextureRef) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, hit: &HitRecord, _rng: &mut dyn rand::RngCore) -> Option<ScatterRecord> {
        Some(ScatterRecord::Scatter {
            attenuation: self.albedo.value(hit.u, hit.v, hit.point),
            pdf: Box::new(CosinePdf::new(hit.normal)),
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, hit: &HitRecord, scattered: &Ray) -> f64 {
        let cosine = hit.normal.dot(scattered.direction.normalized());
        if cosine < 0.0 {
            0.0
        } else {
            cosine / PI
        }
    }
}

pub struct Metal {
    albedo: Color,
    fuzz: f64,
}

impl Metal {
    pub fn new(albedo: Color, fuzz: f64) -> Self {
        Self { albedo, fuzz: fuzz.min(1.0) }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, hit: &HitRecord, rng: &mut dyn rand::RngCore) -> Option<ScatterRecord> {
        let reflected = ray_in.direction.normalized().reflect(hit.normal);
        let specular_ray = Ray::new(
            hit.point,
            reflected + Vec3::random_in_unit_sphere(rng) * self.fuzz,
            ray_in.time,
        );
        Some(ScatterRecord::Specular { specular_ray, attenuation: self.albedo })
    }
}

pub struct Dielectric {
    ior: f64,
}

impl Dielectric {
    pub fn new(ior: f64) -> Self {
        Self { ior }
    }

    fn reflectance(cosine: f64, ref_idx: f64) -> f64 {
        let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, hit: &HitRecord, rng: &mut dyn rand::RngCore) -> Option<ScatterRecord> {
        let refraction_ratio = if hit.front_face { 1.0 / self.ior } else { self.ior };
        let unit_direction = ray_in.direction.normalized();
        let cos_theta = (-unit_direction).dot(hit.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        let cannot_refract = refraction_ratio * sin_theta > 1.0;
        let direction = if cannot_refract || Self::reflectance(cos_theta, refraction_ratio) > rng.gen::<f64>() {
            unit_direction.reflect(hit.normal)
        } else {
            unit_direction
                .refract(hit.normal, refraction_ratio)
                .unwrap_or_else(|| unit_direction.reflect(hit.normal))
        };

        Some(ScatterRecord::Specular {
            specular_ray: Ray::new(hit.point, direction, ray_in.time),
            attenuation: Color::ones(),
        })
    }
}

pub struct DiffuseLight {
    emit: TextureRef,
}

impl DiffuseLight {
    pub fn new(color: Color) -> Self {
        Self { emit: Arc::new(SolidColor::new(color)) }
    }

    pub fn textured(emit: TextureRef) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _hit: &HitRecord, _rng: &mut dyn rand::RngCore) -> Option<ScatterRecord> {
        None
    }

    fn emitted(&self, _ray_in: &Ray, hit: &HitRecord, u: f64, v: f64, p: crate::math::Point3) -> Color {
        if !hit.front_face {
            return Color::zero();
        }
        self.emit.value(u, v, p)
    }
}

/// Scattering for participating media — isotropic phase function, used
/// exclusively as `ConstantMedium`'s material.
pub struct Isotropic {
    albedo: TextureRef,
}

impl Isotropic {
    pub fn new(color: Color) -> Self {
        Self { albedo: Arc::new(SolidColor::new(color)) }
    }

    pub fn textured(albedo: TextureRef) -> Self {
        Self { albedo }
    }
}

impl Material for Isotropic {
    fn scatter(&self, _ray_in: &Ray, hit: &HitRecord, _rng: &mut dyn rand::RngCore) -> Option<ScatterRecord> {
        Some(ScatterRecord::Scatter {
            attenuation: self.albedo.value(hit.u, hit.v, hit.point),
            pdf: Box::new(SpherePdf),
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, _hit: &HitRecord, _scattered: &Ray) -> f64 {
        1.0 / (4.0 * PI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::HitRecord;
    use crate::math::Point3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn dummy_hit(material: &dyn Material) -> HitRecord<'_> {
        HitRecord {
            point: Point3::zero(),
            normal: Vec3::unit_z(),
            t: 1.0,
            u: 0.0,
            v: 0.0,
            front_face: true,
            material,
        }
    }

    #[test]
    fn metal_with_zero_fuzz_reflects_exactly() {
        let metal = Metal::new(Color::ones(), 0.0);
        let hit = dummy_hit(&metal);
        let ray_in = Ray::new(Point3::new(0.0, 0.0, -1.0), Vec3::unit_z(), 0.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let rec = metal.scatter(&ray_in, &hit, &mut rng).unwrap();
        match rec {
            ScatterRecord::Specular { specular_ray, .. } => {
                assert!((specular_ray.direction - -Vec3::unit_z()).length() < 1e-9);
            }
            _ => panic!("metal must be specular"),
        }
    }

    #[test]
    fn diffuse_light_emits_only_on_front_face() {
        let light = DiffuseLight::new(Color::ones());
        let front = dummy_hit(&light);
        let mut back = dummy_hit(&light);
        back.front_face = false;
        let ray_in = Ray::new(Point3::zero(), Vec3::unit_z(), 0.0);
        assert_eq!(light.emitted(&ray_in, &front, 0.0, 0.0, Point3::zero()), Color::ones());
        assert_eq!(light.emitted(&ray_in, &back, 0.0, 0.0, Point3::zero()), Color::zero());
    }

    #[test]
    fn lambertian_scattering_pdf_matches_cosine_law() {
        let lambertian = Lambertian::new(Color::splat(0.5));
        let hit = dummy_hit(&lambertian);
        let ray_in = Ray::new(Point3::zero(), Vec3::unit_z(), 0.0);
        let scattered = Ray::new(Point3::zero(), Vec3::unit_z(), 0.0);
        let pdf = lambertian.scattering_pdf(&ray_in, &hit, &scattered);
        assert!((pdf - 1.0 / PI).abs() < 1e-9);
    }
}
