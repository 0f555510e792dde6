use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::math::{Color, Point3, Vec3};

/// Maps a surface point (and its UV parameterization) to a color. Textures
/// are shared by `Arc` across the frozen scene tree once construction is
/// done, since rendering fans out across worker threads.
pub trait Texture: Send + Sync {
    fn value(&self, u: f64, v: f64, p: Point3) -> Color;
}

pub type TextureRef = Arc<dyn Texture>;

#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    color: Color,
}

impl SolidColor {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(Color::new(r, g, b))
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f64, _v: f64, _p: Point3) -> Color {
        self.color
    }
}

/// 3D checker pattern from the sign of a product of sines — cheap, seamless,
/// and resolution independent (no UV unwrap needed).
pub struct Checker {
    odd: TextureRef,
    even: TextureRef,
}

impl Checker {
    pub fn new(even: TextureRef, odd: TextureRef) -> Self {
        Self { even, odd }
    }

    pub fn from_colors(even: Color, odd: Color) -> Self {
        Self::new(Arc::new(SolidColor::new(even)), Arc::new(SolidColor::new(odd)))
    }
}

impl Texture for Checker {
    fn value(&self, u: f64, v: f64, p: Point3) -> Color {
        let sines = (10.0 * p.x).sin() * (10.0 * p.y).sin() * (10.0 * p.z).sin();
        if sines < 0.0 {
            self.odd.value(u, v, p)
        } else {
            self.even.value(u, v, p)
        }
    }
}

const PERLIN_POINTS: usize = 256;

/// Gradient noise with a fractal-Brownian-motion ("turbulence") octave sum,
/// used as the marble-like procedural texture.
pub struct Perlin {
    random_vectors: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    /// Seeded so repeated scene construction (and tests) are deterministic.
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let random_vectors = (0..PERLIN_POINTS)
            .map(|_| Vec3::random_range(&mut rng, -1.0, 1.0).normalized())
            .collect();
        Self {
            random_vectors,
            perm_x: Self::generate_perm(&mut rng),
            perm_y: Self::generate_perm(&mut rng),
            perm_z: Self::generate_perm(&mut rng),
        }
    }

    fn generate_perm(rng: &mut SmallRng) -> Vec<usize> {
        let mut p: Vec<usize> = (0..PERLIN_POINTS).collect();
        for i in (1..PERLIN_POINTS).rev() {
            let target = rng.gen_range(0..=i);
            p.swap(i, target);
        }
        p
    }

    pub fn noise(&self, p: Point3) -> f64 {
        let ix = p.x.floor();
        let iy = p.y.floor();
        let iz = p.z.floor();
        let i = ix as i64;
        let j = iy as i64;
        let k = iz as i64;

        let mut c = [[[Vec3::zero(); 2]; 2]; 2];
        for di in 0..2i64 {
            for dj in 0..2i64 {
                for dk in 0..2i64 {
                    let idx = self.perm_x[((i + di) & 255) as usize]
                        ^ self.perm_y[((j + dj) & 255) as usize]
                        ^ self.perm_z[((k + dk) & 255) as usize];
                    c[di as usize][dj as usize][dk as usize] = self.random_vectors[idx];
                }
            }
        }

        Self::interp(&c, Vec3::new(p.x - ix, p.y - iy, p.z - iz))
    }

    /// Sum of progressively higher-frequency, lower-amplitude noise octaves.
    pub fn turbulence(&self, p: Point3, depth: u32) -> f64 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;
        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p = temp_p * 2.0;
        }
        accum.abs()
    }

    fn interp(c: &[[[Vec3; 2]; 2]; 2], p: Vec3) -> f64 {
        let w = Vec3::new(
            p.x * p.x * (3.0 - 2.0 * p.x),
            p.y * p.y * (3.0 - 2.0 * p.y),
            p.z * p.z * (3.0 - 2.0 * p.z),
        );
        let mut accum = 0.0;
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let weight_v = Vec3::new(p.x - i as f64, p.y - j as f64, p.z - k as f64);
                    let fi = i as f64;
                    let fj = j as f64;
                    let fk = k as f64;
                    accum += (fi * w.x + (1.0 - fi) * (1.0 - w.x))
                        * (fj * w.y + (1.0 - fj) * (1.0 - w.y))
                        * (fk * w.z + (1.0 - fk) * (1.0 - w.z))
                        * c[i][j][k].dot(weight_v);
                }
            }
        }
        accum
    }
}

pub struct Noise {
    perlin: Perlin,
    scale: f64,
}

impl Noise {
    pub fn new(scale: f64, seed: u64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            scale,
        }
    }
}

impl Texture for Noise {
    fn value(&self, _u: f64, _v: f64, p: Point3) -> Color {
        let turb = self.perlin.turbulence(p, 7);
        Color::ones() * 0.5 * (1.0 + (self.scale * p.z + 10.0 * turb).sin())
    }
}

/// Bitmap texture backed by decoded RGB8 pixels. A failed decode (missing
/// file, unsupported format) degrades to debug cyan rather than aborting
/// scene construction — the caller already logged the underlying error.
pub struct Image {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

const BYTES_PER_PIXEL: usize = 3;

impl Image {
    pub fn from_rgb8(pixels: Vec<u8>, width: usize, height: usize) -> Self {
        Self { pixels, width, height }
    }

    pub fn missing() -> Self {
        Self { pixels: Vec::new(), width: 0, height: 0 }
    }
}

impl Texture for Image {
    fn value(&self, u: f64, v: f64, _p: Point3) -> Color {
        if self.height == 0 || self.width == 0 {
            return Color::new(0.0, 1.0, 1.0);
        }
        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let mut i = (u * self.width as f64) as usize;
        let mut j = (v * self.height as f64) as usize;
        if i >= self.width {
            i = self.width - 1;
        }
        if j >= self.height {
            j = self.height - 1;
        }

        const COLOR_SCALE: f64 = 1.0 / 255.0;
        let offset = j * self.width * BYTES_PER_PIXEL + i * BYTES_PER_PIXEL;
        let pixel = &self.pixels[offset..offset + BYTES_PER_PIXEL];
        Color::new(
            COLOR_SCALE * pixel[0] as f64,
            COLOR_SCALE * pixel[1] as f64,
            COLOR_SCALE * pixel[2] as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_texture_renders_debug_cyan() {
        let img = Image::missing();
        assert_eq!(img.value(0.5, 0.5, Point3::zero()), Color::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn checker_alternates_sign() {
        let checker = Checker::from_colors(Color::ones(), Color::zero());
        // Centers of adjacent unit-ish cells along x should alternate.
        let a = checker.value(0.0, 0.0, Point3::new(0.05, 0.05, 0.05));
        let b = checker.value(0.0, 0.0, Point3::new(0.05 + std::f64::consts::PI / 10.0, 0.05, 0.05));
        assert_ne!(a, b);
    }

    #[test]
    fn perlin_noise_is_bounded_and_deterministic() {
        let p = Perlin::new(7);
        let q = Perlin::new(7);
        let point = Point3::new(1.3, -2.7, 0.4);
        assert_eq!(p.noise(point), q.noise(point));
        assert!(p.turbulence(point, 7) >= 0.0);
    }
}
