use std::cmp::Ordering;
use std::sync::Arc;

use rand::Rng;

use crate::material::{Material, MaterialRef};
use crate::math::{Aabb, Point3, Quaternion, Ray, Vec3};
use crate::onb::Onb;

/// Surface-intersection payload. Borrows its material for the lifetime of
/// the traversal call rather than cloning an `Arc`, since every primitive's
/// material outlives the frozen scene tree the render threads share.
pub struct HitRecord<'a> {
    pub point: Point3,
    pub normal: Vec3,
    pub t: f64,
    pub u: f64,
    pub v: f64,
    pub front_face: bool,
    pub material: &'a dyn Material,
}

impl<'a> HitRecord<'a> {
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face { outward_normal } else { -outward_normal };
    }
}

/// The intersection + light-sampling contract every scene primitive
/// implements. `pdf_value`/`random_direction` default to the "not a light"
/// answer so only emissive primitives need to override them.
pub trait Hittable: Send + Sync {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>>;
    fn bounding_box(&self) -> Aabb;

    fn pdf_value(&self, _origin: Point3, _direction: Vec3) -> f64 {
        0.0
    }

    fn random_direction(&self, _origin: Point3, _rng: &mut dyn rand::RngCore) -> Vec3 {
        Vec3::unit_x()
    }

    /// Marks a primitive as eligible for direct light sampling. Scene
    /// construction filters the top-level object list on this flag to build
    /// the light list handed to `HittablePdf`.
    fn is_light(&self) -> bool {
        false
    }
}

// ─── Sphere ─────────────────────────────────────────────────────────────────

pub struct Sphere {
    pub center: Point3,
    pub radius: f64,
    pub material: MaterialRef,
    pub is_light: bool,
}

impl Sphere {
    pub fn new(center: Point3, radius: f64, material: MaterialRef) -> Self {
        Self { center, radius, material, is_light: false }
    }

    pub fn light(center: Point3, radius: f64, material: MaterialRef) -> Self {
        Self { center, radius, material, is_light: true }
    }

    fn get_uv(p: Vec3) -> (f64, f64) {
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + std::f64::consts::PI;
        (phi / (2.0 * std::f64::consts::PI), theta / std::f64::consts::PI)
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();
        let mut root = (-half_b - sqrtd) / a;
        if root < t_min || root > t_max {
            root = (-half_b + sqrtd) / a;
            if root < t_min || root > t_max {
                return None;
            }
        }

        let point = ray.at(root);
        let outward_normal = (point - self.center) / self.radius;
        let (u, v) = Self::get_uv(outward_normal);
        let mut rec = HitRecord {
            point,
            normal: outward_normal,
            t: root,
            u,
            v,
            front_face: true,
            material: self.material.as_ref(),
        };
        rec.set_face_normal(ray, outward_normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::new(self.center - r, self.center + r)
    }

    fn pdf_value(&self, origin: Point3, direction: Vec3) -> f64 {
        if !self.is_light {
            return 0.0;
        }
        if self.hit(&Ray::new(origin, direction, 0.0), 0.001, f64::INFINITY).is_none() {
            return 0.0;
        }
        let dist_sq = (self.center - origin).length_squared();
        let cos_theta_max = (1.0 - self.radius * self.radius / dist_sq).sqrt();
        let solid_angle = 2.0 * std::f64::consts::PI * (1.0 - cos_theta_max);
        1.0 / solid_angle
    }

    fn random_direction(&self, origin: Point3, rng: &mut dyn rand::RngCore) -> Vec3 {
        let direction = self.center - origin;
        let distance_sq = direction.length_squared();
        let uvw = Onb::from_w(direction);
        uvw.local(random_to_sphere(self.radius, distance_sq, rng))
    }

    fn is_light(&self) -> bool {
        self.is_light
    }
}

/// Uniform sample over the cone subtended by a sphere of `radius` seen from
/// `distance_squared` away — used for solid-angle light sampling.
fn random_to_sphere(radius: f64, distance_squared: f64, rng: &mut dyn rand::RngCore) -> Vec3 {
    let r1: f64 = rng.gen();
    let r2: f64 = rng.gen();
    let z = 1.0 + r2 * ((1.0 - radius * radius / distance_squared).sqrt() - 1.0);
    let phi = 2.0 * std::f64::consts::PI * r1;
    let x = phi.cos() * (1.0 - z * z).sqrt();
    let y = phi.sin() * (1.0 - z * z).sqrt();
    Vec3::new(x, y, z)
}

// ─── Moving Sphere ──────────────────────────────────────────────────────────

/// A sphere whose center interpolates linearly between `center0` at
/// `time0` and `center1` at `time1`, sampled per-ray at `ray.time`.
pub struct MovingSphere {
    pub center0: Point3,
    pub center1: Point3,
    pub time0: f64,
    pub time1: f64,
    pub radius: f64,
    pub material: MaterialRef,
}

impl MovingSphere {
    pub fn new(center0: Point3, center1: Point3, time0: f64, time1: f64, radius: f64, material: MaterialRef) -> Self {
        Self { center0, center1, time0, time1, radius, material }
    }

    pub fn center(&self, time: f64) -> Point3 {
        self.center0 + (self.center1 - self.center0) * ((time - self.time0) / (self.time1 - self.time0))
    }
}

impl Hittable for MovingSphere {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let center = self.center(ray.time);
        let oc = ray.origin - center;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();
        let mut root = (-half_b - sqrtd) / a;
        if root < t_min || root > t_max {
            root = (-half_b + sqrtd) / a;
            if root < t_min || root > t_max {
                return None;
            }
        }

        let point = ray.at(root);
        let outward_normal = (point - center) / self.radius;
        let (u, v) = Sphere::get_uv(outward_normal);
        let mut rec = HitRecord {
            point,
            normal: outward_normal,
            t: root,
            u,
            v,
            front_face: true,
            material: self.material.as_ref(),
        };
        rec.set_face_normal(ray, outward_normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        let box0 = Aabb::new(self.center0 - r, self.center0 + r);
        let box1 = Aabb::new(self.center1 - r, self.center1 + r);
        Aabb::union(box0, box1)
    }
}

// ─── Axis-aligned rectangles ────────────────────────────────────────────────
//
// Monomorphized per axis rather than made const-generic over `math::Axis`:
// only the permutation of which coordinate is fixed changes, and a runtime
// `negate` flag covers the source's `face_positive` template parameter since
// it only flips a normal's sign, never the intersection arithmetic.

pub struct XyRect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub k: f64,
    pub material: MaterialRef,
    pub negate: bool,
    pub is_light: bool,
}

pub struct XzRect {
    pub x0: f64,
    pub x1: f64,
    pub z0: f64,
    pub z1: f64,
    pub k: f64,
    pub material: MaterialRef,
    pub negate: bool,
    pub is_light: bool,
}

pub struct YzRect {
    pub y0: f64,
    pub y1: f64,
    pub z0: f64,
    pub z1: f64,
    pub k: f64,
    pub material: MaterialRef,
    pub negate: bool,
    pub is_light: bool,
}

macro_rules! impl_aarect {
    ($name:ident, $a0:ident, $a1:ident, $b0:ident, $b1:ident, $ik:expr, $ia:expr, $ib:expr) => {
        impl $name {
            pub fn new(a0: f64, a1: f64, b0: f64, b1: f64, k: f64, material: MaterialRef, negate: bool) -> Self {
                Self { $a0: a0, $a1: a1, $b0: b0, $b1: b1, k, material, negate, is_light: false }
            }

            pub fn light(a0: f64, a1: f64, b0: f64, b1: f64, k: f64, material: MaterialRef) -> Self {
                Self { $a0: a0, $a1: a1, $b0: b0, $b1: b1, k, material, negate: false, is_light: true }
            }

            fn normal_sign(&self) -> f64 {
                if self.negate { -1.0 } else { 1.0 }
            }
        }

        impl Hittable for $name {
            fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
                let t = (self.k - ray.origin[$ik]) / ray.direction[$ik];
                if t < t_min || t > t_max {
                    return None;
                }
                let a = ray.origin[$ia] + t * ray.direction[$ia];
                let b = ray.origin[$ib] + t * ray.direction[$ib];
                if a < self.$a0 || a > self.$a1 || b < self.$b0 || b > self.$b1 {
                    return None;
                }

                let mut outward_normal = Vec3::zero();
                outward_normal[$ik] = self.normal_sign();

                let mut rec = HitRecord {
                    point: ray.at(t),
                    normal: outward_normal,
                    t,
                    u: (a - self.$a0) / (self.$a1 - self.$a0),
                    v: (b - self.$b0) / (self.$b1 - self.$b0),
                    front_face: true,
                    material: self.material.as_ref(),
                };
                rec.set_face_normal(ray, outward_normal);
                Some(rec)
            }

            fn bounding_box(&self) -> Aabb {
                let mut min = Vec3::zero();
                let mut max = Vec3::zero();
                min[$ik] = self.k - 0.0001;
                max[$ik] = self.k + 0.0001;
                min[$ia] = self.$a0;
                max[$ia] = self.$a1;
                min[$ib] = self.$b0;
                max[$ib] = self.$b1;
                Aabb::new(min, max)
            }

            fn pdf_value(&self, origin: Point3, direction: Vec3) -> f64 {
                if !self.is_light {
                    return 0.0;
                }
                match self.hit(&Ray::new(origin, direction, 0.0), 0.001, f64::INFINITY) {
                    None => 0.0,
                    Some(rec) => {
                        let area = (self.$a1 - self.$a0) * (self.$b1 - self.$b0);
                        let distance_squared = rec.t * rec.t * direction.length_squared();
                        let cosine = direction.normalized().dot(rec.normal).abs();
                        distance_squared / (cosine * area)
                    }
                }
            }

            fn random_direction(&self, origin: Point3, rng: &mut dyn rand::RngCore) -> Vec3 {
                let a = rng.gen_range(self.$a0..self.$a1);
                let b = rng.gen_range(self.$b0..self.$b1);
                let mut point = Vec3::splat(self.k);
                point[$ia] = a;
                point[$ib] = b;
                (point - origin).normalized()
            }

            fn is_light(&self) -> bool {
                self.is_light
            }
        }
    };
}

impl_aarect!(XyRect, x0, x1, y0, y1, 2, 0, 1);
impl_aarect!(XzRect, x0, x1, z0, z1, 1, 0, 2);
impl_aarect!(YzRect, y0, y1, z0, z1, 0, 1, 2);

// ─── Box ────────────────────────────────────────────────────────────────────

/// A rigid-transformed box: the hit test is done in the box's local space
/// (axis-aligned, centered, extents from origin) by inverse-transforming the
/// ray, then the hit point and normal are transformed back to world space.
pub struct BoxPrim {
    position: Point3,
    rotation: Quaternion,
    extent: Vec3,
    material: MaterialRef,
}

impl BoxPrim {
    pub fn new(position: Point3, rotation: Quaternion, extent: Vec3, material: MaterialRef) -> Self {
        Self { position, rotation, extent, material }
    }

    fn to_local(&self, p: Point3) -> Point3 {
        self.rotation.inverse().rotate(p - self.position)
    }

    fn to_local_dir(&self, d: Vec3) -> Vec3 {
        self.rotation.inverse().rotate(d)
    }

    fn to_world_dir(&self, d: Vec3) -> Vec3 {
        self.rotation.rotate(d)
    }
}

impl Hittable for BoxPrim {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let local_aabb = Aabb::new(-self.extent, self.extent);
        let local_ray = Ray::new(self.to_local(ray.origin), self.to_local_dir(ray.direction), ray.time);

        let mut t = 0.0;
        if !local_aabb.hit(&local_ray, t_min, t_max, Some(&mut t)) {
            return None;
        }

        let mut p = local_ray.at(t) + self.extent;
        let ext2 = self.extent * 2.0;
        const EPS: f64 = 1e-6;

        let mut normal;
        let (u, v);
        if (p.x).abs() < EPS {
            normal = Vec3::new(-1.0, 0.0, 0.0);
            u = p.z / ext2.z;
            v = p.y / ext2.y;
        } else if (p.x - ext2.x).abs() < EPS {
            normal = Vec3::new(1.0, 0.0, 0.0);
            u = p.z / ext2.z;
            v = p.y / ext2.y;
        } else if (p.y).abs() < EPS {
            normal = Vec3::new(0.0, -1.0, 0.0);
            u = p.x / ext2.x;
            v = p.z / ext2.z;
        } else if (p.y - ext2.y).abs() < EPS {
            normal = Vec3::new(0.0, 1.0, 0.0);
            u = p.x / ext2.x;
            v = p.z / ext2.z;
        } else if (p.z).abs() < EPS {
            normal = Vec3::new(0.0, 0.0, -1.0);
            u = p.x / ext2.x;
            v = p.y / ext2.y;
        } else {
            normal = Vec3::new(0.0, 0.0, 1.0);
            u = p.x / ext2.x;
            v = p.y / ext2.y;
        }

        if local_aabb.contains(local_ray.origin) {
            normal = -normal;
        }
        let world_normal = self.to_world_dir(normal);

        p = ray.at(t);
        let mut rec = HitRecord {
            point: p,
            normal: world_normal,
            t,
            u,
            v,
            front_face: true,
            material: self.material.as_ref(),
        };
        rec.set_face_normal(ray, world_normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        let axis = self.rotation.inverse();
        let r0 = axis.rotate(Vec3::unit_x()).abs();
        let r1 = axis.rotate(Vec3::unit_y()).abs();
        let r2 = axis.rotate(Vec3::unit_z()).abs();
        let ext = r0 * self.extent.x + r1 * self.extent.y + r2 * self.extent.z;
        Aabb::new(self.position - ext, self.position + ext)
    }
}

// ─── Triangle / Mesh ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3,
    pub normal: Vec3,
    pub uv: (f64, f64),
}

impl Vertex {
    pub fn new(position: Point3, normal: Vec3, uv: (f64, f64)) -> Self {
        Self { position, normal, uv }
    }
}

fn barycentric(p: Point3, a: Point3, b: Point3, c: Point3) -> (f64, f64, f64) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let inv_denom = 1.0 / (d00 * d11 - d01 * d01);
    let v = (d11 * d20 - d01 * d21) * inv_denom;
    let w = (d00 * d21 - d01 * d20) * inv_denom;
    let u = 1.0 - v - w;
    (u, v, w)
}

pub struct Triangle {
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
    pub normal: Vec3,
    pub area: f64,
    pub interpolate_normal: bool,
    pub material: MaterialRef,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, material: MaterialRef, interpolate_normal: bool) -> Self {
        let e1 = v1.position - v0.position;
        let e2 = v2.position - v0.position;
        let raw_normal = e1.cross(e2);
        let area = raw_normal.length() * 0.5;
        let normal = raw_normal.normalized();
        Self { v0, v1, v2, normal, area, interpolate_normal, material }
    }

    /// Möller–Trumbore ray-triangle intersection.
    fn intersect(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<f64> {
        const EPS: f64 = 1e-8;
        let e1 = self.v1.position - self.v0.position;
        let e2 = self.v2.position - self.v0.position;
        let pvec = ray.direction.cross(e2);
        let det = e1.dot(pvec);
        if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = ray.origin - self.v0.position;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(e1);
        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(qvec) * inv_det;
        if t < t_min || t > t_max {
            return None;
        }
        Some(t)
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let t = self.intersect(ray, t_min, t_max)?;
        let point = ray.at(t);
        let (w0, w1, w2) = barycentric(point, self.v0.position, self.v1.position, self.v2.position);
        let outward_normal = if self.interpolate_normal {
            (self.v0.normal * w0 + self.v1.normal * w1 + self.v2.normal * w2).normalized()
        } else {
            self.normal
        };
        let (u0, v0) = self.v0.uv;
        let (u1, v1) = self.v1.uv;
        let (u2, v2) = self.v2.uv;

        let mut rec = HitRecord {
            point,
            normal: outward_normal,
            t,
            u: u0 * w0 + u1 * w1 + u2 * w2,
            v: v0 * w0 + v1 * w1 + v2 * w2,
            front_face: true,
            material: self.material.as_ref(),
        };
        rec.set_face_normal(ray, outward_normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        let min = self.v0.position.min(self.v1.position).min(self.v2.position);
        let max = self.v0.position.max(self.v1.position).max(self.v2.position);
        Aabb::new(min, max).inflated(1e-4)
    }

    fn pdf_value(&self, origin: Point3, direction: Vec3) -> f64 {
        match self.hit(&Ray::new(origin, direction, 0.0), 0.0, f64::INFINITY) {
            None => 0.0,
            Some(rec) => {
                let dist_sq = (rec.point - origin).length_squared();
                let cosine = direction.dot(self.normal).abs();
                dist_sq / (cosine * self.area)
            }
        }
    }

    /// Uniform triangle-area sampling (Osada et al., shape distributions).
    fn random_direction(&self, origin: Point3, rng: &mut dyn rand::RngCore) -> Vec3 {
        let x: f64 = rng.gen::<f64>().sqrt();
        let y: f64 = rng.gen();
        let point = self.v0.position * (1.0 - x) + self.v1.position * (x * (1.0 - y)) + self.v2.position * (x * y);
        (point - origin).normalized()
    }
}

/// A collection of triangles with its own internal BVH, eagerly built at
/// construction time (no lazy-build path).
pub struct Mesh {
    root: BvhNode,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let objects: Vec<Arc<dyn Hittable>> = triangles.into_iter().map(|t| Arc::new(t) as Arc<dyn Hittable>).collect();
        Self { root: BvhNode::build(objects, &mut rand::thread_rng()) }
    }
}

impl Hittable for Mesh {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        self.root.hit(ray, t_min, t_max)
    }

    fn bounding_box(&self) -> Aabb {
        self.root.bounding_box()
    }
}

// ─── Constant-density medium (volumetric fog/smoke) ────────────────────────

/// Free-flight sampling over a boundary hittable's interior. The boundary is
/// probed twice — once for the entry hit, once for the exit past entry+eps —
/// because the renderer has no notion of "inside" beyond paired hit events.
pub struct ConstantMedium {
    boundary: Box<dyn Hittable>,
    neg_inv_density: f64,
    phase_function: MaterialRef,
}

impl ConstantMedium {
    pub fn new(boundary: Box<dyn Hittable>, density: f64, phase_function: MaterialRef) -> Self {
        Self { boundary, neg_inv_density: -1.0 / density, phase_function }
    }
}

impl Hittable for ConstantMedium {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let rec1 = self.boundary.hit(ray, -f64::INFINITY, f64::INFINITY)?;
        let rec2 = self.boundary.hit(ray, rec1.t + 0.0001, f64::INFINITY)?;

        let mut t_enter = rec1.t.max(t_min);
        let t_exit = rec2.t.min(t_max);
        if t_enter >= t_exit {
            return None;
        }
        if t_enter < 0.0 {
            t_enter = 0.0;
        }

        let ray_length = ray.direction.length();
        let distance_inside_boundary = (t_exit - t_enter) * ray_length;
        let rd: f64 = rand::thread_rng().gen();
        let hit_distance = self.neg_inv_density * rd.ln();

        if hit_distance > distance_inside_boundary {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        Some(HitRecord {
            point: ray.at(t),
            normal: Vec3::unit_x(),
            t,
            u: 0.0,
            v: 0.0,
            front_face: true,
            material: self.phase_function.as_ref(),
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.boundary.bounding_box()
    }
}

// ─── FlipFace ───────────────────────────────────────────────────────────────

/// Inverts a child primitive's front-face sign without touching its
/// geometry — used to aim a light-emitting rectangle into the scene when the
/// surface's natural winding points the other way.
pub struct FlipFace {
    inner: Box<dyn Hittable>,
}

impl FlipFace {
    pub fn new(inner: Box<dyn Hittable>) -> Self {
        Self { inner }
    }
}

impl Hittable for FlipFace {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        self.inner.hit(ray, t_min, t_max).map(|mut rec| {
            rec.front_face = !rec.front_face;
            rec
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.inner.bounding_box()
    }

    fn pdf_value(&self, origin: Point3, direction: Vec3) -> f64 {
        self.inner.pdf_value(origin, direction)
    }

    fn random_direction(&self, origin: Point3, rng: &mut dyn rand::RngCore) -> Vec3 {
        self.inner.random_direction(origin, rng)
    }

    fn is_light(&self) -> bool {
        self.inner.is_light()
    }
}

// ─── HittableList ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct HittableList {
    pub objects: Vec<Arc<dyn Hittable>>,
}

impl HittableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        self.objects.push(object);
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let mut closest = t_max;
        let mut result = None;
        for object in &self.objects {
            if let Some(rec) = object.hit(ray, t_min, closest) {
                closest = rec.t;
                result = Some(rec);
            }
        }
        result
    }

    fn bounding_box(&self) -> Aabb {
        self.objects
            .iter()
            .map(|o| o.bounding_box())
            .reduce(Aabb::union)
            .unwrap_or_else(Aabb::empty)
    }

    fn pdf_value(&self, origin: Point3, direction: Vec3) -> f64 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f64;
        self.objects.iter().map(|o| o.pdf_value(origin, direction)).sum::<f64>() * weight
    }

    fn random_direction(&self, origin: Point3, rng: &mut dyn rand::RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::unit_x();
        }
        let idx = rng.gen_range(0..self.objects.len());
        self.objects[idx].random_direction(origin, rng)
    }

}

impl HittableList {
    /// Collects the top-level objects flagged as light sources. Scenes are
    /// built flat (no nested `HittableList`s), so this does not need to
    /// recurse through composite children beyond `FlipFace`'s delegation.
    pub fn lights(&self) -> Vec<Arc<dyn Hittable>> {
        self.objects.iter().filter(|o| o.is_light()).cloned().collect()
    }
}

// ─── BVH ────────────────────────────────────────────────────────────────────

/// Binary bounding-volume hierarchy. The split axis is chosen uniformly at
/// random per node rather than via a longest-axis heuristic — see DESIGN.md.
pub enum BvhNode {
    Empty,
    Leaf(Arc<dyn Hittable>),
    Interior { left: Box<BvhNode>, right: Box<BvhNode>, bbox: Aabb },
}

impl BvhNode {
    pub fn build(mut objects: Vec<Arc<dyn Hittable>>, rng: &mut dyn rand::RngCore) -> Self {
        let axis = rng.gen_range(0..3usize);
        let len = objects.len();

        if len == 0 {
            return BvhNode::Empty;
        }

        if len == 1 {
            return BvhNode::Leaf(objects.pop().unwrap());
        }

        if len == 2 {
            let a_min = objects[0].bounding_box().min[axis];
            let b_min = objects[1].bounding_box().min[axis];
            if a_min > b_min {
                objects.swap(0, 1);
            }
            let right = objects.pop().unwrap();
            let left = objects.pop().unwrap();
            let bbox = Aabb::union(left.bounding_box(), right.bounding_box());
            return BvhNode::Interior {
                left: Box::new(BvhNode::Leaf(left)),
                right: Box::new(BvhNode::Leaf(right)),
                bbox,
            };
        }

        objects.sort_by(|a, b| {
            a.bounding_box().min[axis]
                .partial_cmp(&b.bounding_box().min[axis])
                .unwrap_or(Ordering::Equal)
        });

        let mid = len / 2;
        let right_objs = objects.split_off(mid);
        let left = Box::new(BvhNode::build(objects, rng));
        let right = Box::new(BvhNode::build(right_objs, rng));
        let bbox = Aabb::union(left.bounding_box(), right.bounding_box());
        BvhNode::Interior { left, right, bbox }
    }
}

impl Hittable for BvhNode {
    fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        match self {
            BvhNode::Empty => None,
            BvhNode::Leaf(object) => object.hit(ray, t_min, t_max),
            BvhNode::Interior { left, right, bbox } => {
                if !bbox.hit(ray, t_min, t_max, None) {
                    return None;
                }
                let hit_left = left.hit(ray, t_min, t_max);
                let far = hit_left.as_ref().map_or(t_max, |h| h.t);
                let hit_right = right.hit(ray, t_min, far);
                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::empty(),
            BvhNode::Leaf(object) => object.bounding_box(),
            BvhNode::Interior { bbox, .. } => *bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use crate::math::Color;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn lambertian() -> MaterialRef {
        Arc::new(Lambertian::new(Color::splat(0.5)))
    }

    #[test]
    fn sphere_hit_normal_is_unit_length_and_outward() {
        let sphere = Sphere::new(Point3::zero(), 1.0, lambertian());
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0);
        let rec = sphere.hit(&ray, 0.001, f64::INFINITY).unwrap();
        assert!((rec.normal.length() - 1.0).abs() < 1e-9);
        assert!(rec.front_face);
        assert!(rec.t > 0.0 && rec.t < f64::INFINITY);
    }

    #[test]
    fn moving_sphere_bounding_box_covers_both_endpoints() {
        let sphere = MovingSphere::new(
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            0.0,
            1.0,
            0.5,
            lambertian(),
        );
        let bbox = sphere.bounding_box();
        assert!(bbox.min.x <= -1.5 + 1e-9);
        assert!(bbox.max.x >= 1.5 - 1e-9);
    }

    #[test]
    fn bvh_matches_linear_scan_over_random_spheres_and_rays() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut linear = HittableList::new();
        let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();
        for _ in 0..100 {
            let center = Vec3::random_range(&mut rng, -10.0, 10.0);
            let radius = rng.gen_range(0.1..1.0);
            let sphere = Arc::new(Sphere::new(center, radius, lambertian()));
            linear.add(sphere.clone());
            objects.push(Arc::new(Sphere::new(center, radius, lambertian())));
        }
        let bvh = BvhNode::build(objects, &mut rng);

        for _ in 0..1000 {
            let origin = Vec3::random_range(&mut rng, -20.0, 20.0);
            let direction = Vec3::random_unit_vector(&mut rng);
            let ray = Ray::new(origin, direction, 0.0);

            let linear_hit = linear.hit(&ray, 0.001, f64::INFINITY).map(|r| r.t);
            let bvh_hit = bvh.hit(&ray, 0.001, f64::INFINITY).map(|r| r.t);

            match (linear_hit, bvh_hit) {
                (None, None) => {}
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-6),
                _ => panic!("BVH and linear scan disagree on hit/miss"),
            }
        }
    }

    #[test]
    fn bvh_built_from_an_empty_object_list_never_hits() {
        let mut rng = SmallRng::seed_from_u64(7);
        let bvh = BvhNode::build(Vec::new(), &mut rng);
        let ray = Ray::new(Point3::zero(), Vec3::unit_z(), 0.0);
        assert!(bvh.hit(&ray, 0.001, f64::INFINITY).is_none());
    }
}
