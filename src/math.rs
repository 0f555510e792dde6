use rand::Rng;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub};

/// A 3-component vector used for positions, directions, and colors throughout
/// the renderer. Implements the arithmetic and geometric operations needed
/// for physically based light transport: dot/cross products, reflection,
/// refraction, and the random-direction samplers the integrator draws on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub type Point3 = Vec3;
pub type Color = Vec3;

impl Vec3 {
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    #[inline(always)]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn ones() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline(always)]
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[inline(always)]
    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    #[inline(always)]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline(always)]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector. Debug-asserts against zero-length input.
    #[inline(always)]
    pub fn normalized(self) -> Self {
        let len = self.length();
        debug_assert!(len > 1e-12, "normalize of a zero-length vector");
        self / len
    }

    #[inline(always)]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline(always)]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Specular reflection of `self` about surface normal `n`.
    #[inline(always)]
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * 2.0 * self.dot(normal)
    }

    /// Snell's law refraction; `None` on total internal reflection.
    #[inline]
    pub fn refract(self, normal: Self, eta_ratio: f64) -> Option<Self> {
        let cos_theta = (-self).dot(normal).min(1.0);
        let r_perp = (self + normal * cos_theta) * eta_ratio;
        let discriminant = 1.0 - r_perp.length_squared();
        if discriminant < 0.0 {
            return None;
        }
        let r_parallel = normal * -(discriminant.sqrt());
        Some(r_perp + r_parallel)
    }

    /// Component-wise (Hadamard) product — attenuates radiance per channel.
    #[inline(always)]
    pub fn hadamard(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    #[inline(always)]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self * (1.0 - t) + other * t
    }

    #[inline(always)]
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[inline(always)]
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    #[inline(always)]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    #[inline(always)]
    pub fn saturate(self) -> Self {
        Self::new(
            self.x.clamp(0.0, 1.0),
            self.y.clamp(0.0, 1.0),
            self.z.clamp(0.0, 1.0),
        )
    }

    /// Replaces NaN components with zero before accumulation.
    #[inline(always)]
    pub fn sanitized(self) -> Self {
        Self::new(
            if self.x.is_nan() { 0.0 } else { self.x },
            if self.y.is_nan() { 0.0 } else { self.y },
            if self.z.is_nan() { 0.0 } else { self.z },
        )
    }

    #[inline(always)]
    pub fn near_zero(self) -> bool {
        const EPS: f64 = 1e-8;
        self.x.abs() < EPS && self.y.abs() < EPS && self.z.abs() < EPS
    }

    /// Uniform point inside the unit sphere via rejection sampling.
    pub fn random_in_unit_sphere(rng: &mut dyn rand::RngCore) -> Self {
        loop {
            let v = Self::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if v.length_squared() < 1.0 {
                return v;
            }
        }
    }

    pub fn random_range(rng: &mut dyn rand::RngCore, lo: f64, hi: f64) -> Self {
        Self::new(
            rng.gen_range(lo..hi),
            rng.gen_range(lo..hi),
            rng.gen_range(lo..hi),
        )
    }

    pub fn random_unit_vector(rng: &mut dyn rand::RngCore) -> Self {
        Self::random_in_unit_sphere(rng).normalized()
    }

    /// Random point on the unit disk, for thin-lens depth of field jitter.
    pub fn random_in_unit_disk(rng: &mut dyn rand::RngCore) -> Self {
        loop {
            let v = Self::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0);
            if v.length_squared() < 1.0 {
                return v;
            }
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, t: f64) -> Self {
        Self::new(self.x * t, self.y * t, self.z * t)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    #[inline(always)]
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl MulAssign<f64> for Vec3 {
    #[inline(always)]
    fn mul_assign(&mut self, t: f64) {
        self.x *= t;
        self.y *= t;
        self.z *= t;
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn div(self, t: f64) -> Self {
        let inv = 1.0 / t;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl DivAssign<f64> for Vec3 {
    #[inline(always)]
    fn div_assign(&mut self, t: f64) {
        let inv = 1.0 / t;
        self.x *= inv;
        self.y *= inv;
        self.z *= inv;
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of bounds: {i}"),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 index out of bounds: {i}"),
        }
    }
}

/// A 2-component vector used for UV surface parameterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub u: f64,
    pub v: f64,
}

impl Vec2 {
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.u + rhs.u, self.v + rhs.v)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.u - rhs.u, self.v - rhs.v)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, t: f64) -> Self {
        Self::new(self.u * t, self.v * t)
    }
}

/// A unit quaternion used for rigid-body rotations (`Box`, OBJ mesh
/// placement). Composition is via `mul_quat`; `rotate` applies the sandwich
/// product to a vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `degrees` about `axis` (need not be normalized).
    pub fn angle_axis(degrees: f64, axis: Vec3) -> Self {
        let axis = axis.normalized();
        let half = degrees.to_radians() * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Unit quaternions are their own inverse up to conjugation.
    pub fn inverse(self) -> Self {
        self.conjugate()
    }

    pub fn mul_quat(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    /// Rotates `v`, preserving its length.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * self.w + uuv) * 2.0
    }
}

/// A parametric ray R(t) = origin + t * direction, carrying a shutter-time
/// stamp for motion blur (moving spheres, moving camera apertures).
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
    pub time: f64,
}

impl Ray {
    #[inline(always)]
    pub const fn new(origin: Point3, direction: Vec3, time: f64) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    #[inline(always)]
    pub fn at(self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box, the bounding volume used throughout the BVH.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self::new(Point3::splat(f64::INFINITY), Point3::splat(f64::NEG_INFINITY))
    }

    /// Slab-method ray-AABB test. When `entry_t` is `Some`, writes back the
    /// entry parameter if it falls within `[t_min, t_max]`, else the exit
    /// parameter — `Box` uses this to recover the local-space hit distance
    /// in one pass instead of two, including the ray-origin-inside-the-box
    /// case where the true entry point lies behind `t_min`.
    pub fn hit(&self, ray: &Ray, t_min: f64, t_max: f64, entry_t: Option<&mut f64>) -> bool {
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;
        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_enter {
                t_enter = t0;
            }
            if t1 < t_exit {
                t_exit = t1;
            }
            if t_exit <= t_enter || t_enter > t_max || t_exit < t_min {
                return false;
            }
        }
        if let Some(t) = entry_t {
            *t = if t_enter >= t_min && t_enter <= t_max { t_enter } else { t_exit };
        }
        true
    }

    /// Smallest box enclosing both `a` and `b`. Commutative and associative.
    pub fn union(a: Aabb, b: Aabb) -> Aabb {
        Aabb::new(a.min.min(b.min), a.max.max(b.max))
    }

    pub fn contains(&self, p: Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Inflates degenerate flat axes by `eps` so zero-volume boxes (a single
    /// axis-aligned rect) still have positive volume for BVH purposes.
    pub fn inflated(mut self, eps: f64) -> Self {
        for i in 0..3 {
            if (self.max[i] - self.min[i]).abs() < eps {
                self.min[i] -= eps;
                self.max[i] += eps;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_union_is_commutative_and_associative() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(-1.0, 2.0, 0.5), Point3::new(3.0, 3.0, 3.0));
        let c = Aabb::new(Point3::new(5.0, -5.0, 0.0), Point3::new(6.0, -4.0, 1.0));

        let ab = Aabb::union(a, b);
        let ba = Aabb::union(b, a);
        assert_eq!(ab.min, ba.min);
        assert_eq!(ab.max, ba.max);

        let left = Aabb::union(Aabb::union(a, b), c);
        let right = Aabb::union(a, Aabb::union(b, c));
        assert_eq!(left.min, right.min);
        assert_eq!(left.max, right.max);
    }

    #[test]
    fn ray_aabb_hit_is_boundary_inclusive() {
        let b = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let r = Ray::new(Point3::new(1.0, -2.0, 0.0), Vec3::unit_y(), 0.0);
        assert!(b.hit(&r, 0.0, f64::INFINITY, None));
    }

    #[test]
    fn ray_aabb_misses_disjoint_box() {
        let b = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let r = Ray::new(Point3::new(5.0, 5.0, 5.0), Vec3::unit_x(), 0.0);
        assert!(!b.hit(&r, 0.0, f64::INFINITY, None));
    }

    #[test]
    fn quaternion_round_trip_preserves_length_and_identity() {
        let q = Quaternion::angle_axis(37.0, Vec3::new(0.3, 1.0, -0.2));
        let v = Vec3::new(1.5, -2.0, 0.25);

        let rotated = q.rotate(v);
        assert!((rotated.length() - v.length()).abs() < 1e-9);

        let back = q.inverse().rotate(rotated);
        assert!((back - v).length() < 1e-9);

        let id = q.mul_quat(q.inverse());
        assert!((id.w.abs() - 1.0).abs() < 1e-9 || (id.w + 1.0).abs() < 1e-9);
    }
}
