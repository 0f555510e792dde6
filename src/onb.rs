use crate::math::Vec3;

/// Orthonormal basis built from a single axis `w`, used to map samples drawn
/// in a canonical local frame (cosine-weighted hemisphere, uniform sphere)
/// into world space around a surface normal or light direction.
#[derive(Debug, Clone, Copy)]
pub struct Onb {
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Onb {
    /// Builds a right-handed basis with `w` as its third axis.
    pub fn from_w(n: Vec3) -> Self {
        let w = n.normalized();
        let a = if w.x.abs() > 0.9 { Vec3::unit_y() } else { Vec3::unit_x() };
        let v = w.cross(a).normalized();
        let u = w.cross(v);
        Self { u, v, w }
    }

    pub fn u(&self) -> Vec3 {
        self.u
    }

    pub fn v(&self) -> Vec3 {
        self.v
    }

    pub fn w(&self) -> Vec3 {
        self.w
    }

    /// Transforms a vector from local basis coordinates into world space.
    pub fn local(&self, a: Vec3) -> Vec3 {
        self.u * a.x + self.v * a.y + self.w * a.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_vectors_are_orthonormal() {
        let basis = Onb::from_w(Vec3::new(0.3, -1.2, 0.7));
        assert!((basis.u().length() - 1.0).abs() < 1e-9);
        assert!((basis.v().length() - 1.0).abs() < 1e-9);
        assert!((basis.w().length() - 1.0).abs() < 1e-9);
        assert!(basis.u().dot(basis.v()).abs() < 1e-9);
        assert!(basis.v().dot(basis.w()).abs() < 1e-9);
        assert!(basis.u().dot(basis.w()).abs() < 1e-9);
    }

    #[test]
    fn local_z_maps_back_to_w() {
        let n = Vec3::new(1.0, 2.0, -3.0).normalized();
        let basis = Onb::from_w(n);
        let mapped = basis.local(Vec3::unit_z());
        assert!((mapped - n).length() < 1e-9);
    }
}
