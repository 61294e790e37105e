//! Quasi-random sampling for the image based lighting precomputation.

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

use crate::brdf::{EPSILON, d_ggx, roughness_to_alpha};

/// 2^-24
const INV_2_POW_24: f32 = 1.0 / 16_777_216.0;

/// Van der Corput radical inverse in base 2, truncated to 24 bits so the
/// result is exactly representable and always below 1.
#[inline]
pub fn radical_inverse(i: u32) -> f32 {
    (i.reverse_bits() >> 8) as f32 * INV_2_POW_24
}

/// Point `i` of an `n` point Hammersley set.
#[inline]
pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n.max(1) as f32, radical_inverse(i))
}

/// Orthonormal tangent and bitangent for a unit normal.
pub fn tangent_basis(n: Vec3) -> (Vec3, Vec3) {
    let up = if n.y.abs() < 0.999 { Vec3::Y } else { Vec3::X };
    let tangent = up.cross(n).try_normalize().unwrap_or(Vec3::X);
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

/// Importance sample the GGX NDF, returning a half vector in tangent space
/// (normal along +Z).
pub fn importance_sample_ggx_tangent(xi: Vec2, roughness: f32) -> Vec3 {
    let a = roughness_to_alpha(roughness);
    let a2 = a * a;
    let (xi_x, xi_y) = (xi.x.clamp(0.0, 1.0), xi.y.clamp(0.0, 1.0));

    let phi = 2.0 * PI * xi_x;
    let cos_theta = ((1.0 - xi_y) / (1.0 + (a2 - 1.0) * xi_y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Importance sample the GGX NDF around `n`, returning a world space half
/// vector.
pub fn importance_sample_ggx(xi: Vec2, n: Vec3, roughness: f32) -> Vec3 {
    let n = n.try_normalize().unwrap_or(Vec3::Z);
    let h = importance_sample_ggx_tangent(xi, roughness);
    let (tangent, bitangent) = tangent_basis(n);
    (tangent * h.x + bitangent * h.y + n * h.z)
        .try_normalize()
        .unwrap_or(n)
}

/// Density of a reflected direction generated by [`importance_sample_ggx`].
#[inline]
pub fn ggx_pdf(roughness: f32, n_dot_h: f32, v_dot_h: f32) -> f32 {
    d_ggx(roughness, n_dot_h) * n_dot_h.max(0.0) / (4.0 * v_dot_h.max(EPSILON))
}

/// One light direction drawn for a surface, with its density.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnvironmentSample {
    pub direction: Vec3,
    pub half_vector: Vec3,
    pub n_dot_l: f32,
    pub n_dot_h: f32,
    pub v_dot_h: f32,
    pub pdf: f32,
}

/// Reflect `v` about an importance sampled half vector.
pub fn sample_environment(xi: Vec2, n: Vec3, v: Vec3, roughness: f32) -> EnvironmentSample {
    let n = n.try_normalize().unwrap_or(Vec3::Z);
    let v = v.try_normalize().unwrap_or(n);
    let h = importance_sample_ggx(xi, n, roughness);
    let v_dot_h = v.dot(h).max(0.0);
    let l = 2.0 * v_dot_h * h - v;
    let n_dot_h = n.dot(h).max(0.0);

    EnvironmentSample {
        direction: l,
        half_vector: h,
        n_dot_l: n.dot(l).max(0.0),
        n_dot_h,
        v_dot_h,
        pdf: ggx_pdf(roughness, n_dot_h, v_dot_h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn hammersley_eight() {
        let points: Vec<Vec2> = (0..8).map(|i| hammersley(i, 8)).collect();
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.x, i as f32 / 8.0);
            assert!((0.0..1.0).contains(&p.y));
        }
        let ys: Vec<f32> = points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.5, 0.25, 0.75, 0.125, 0.625, 0.375, 0.875]);
    }

    #[test]
    fn hammersley_is_reproducible() {
        for i in 0..1024 {
            assert_eq!(hammersley(i, 1024), hammersley(i, 1024));
        }
    }

    #[test]
    fn radical_inverse_stays_below_one() {
        assert!(radical_inverse(u32::MAX) < 1.0);
        assert!(radical_inverse((1 << 30) - 1) < 1.0);
    }

    #[test]
    fn zero_count_does_not_divide_by_zero() {
        assert_eq!(hammersley(0, 0), Vec2::ZERO);
    }

    #[test]
    fn tangent_basis_is_orthonormal() {
        for n in [
            Vec3::Z,
            Vec3::Y,
            -Vec3::Y,
            Vec3::new(0.0, 0.9999, 0.01).normalize(),
            Vec3::new(1.0, 2.0, 3.0).normalize(),
        ] {
            let (t, b) = tangent_basis(n);
            assert_abs_diff_eq!(t.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(b.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(t.dot(n), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(b.dot(n), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(t.dot(b), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn smooth_samples_hug_the_normal() {
        let n = Vec3::new(0.3, -0.2, 0.9).normalize();
        for i in 0..64 {
            let h = importance_sample_ggx(hammersley(i, 64), n, 0.0);
            assert!(h.dot(n) > 0.99);
        }
    }

    #[test]
    fn samples_stay_in_upper_hemisphere() {
        for roughness in [0.1, 0.5, 1.0] {
            for n in [Vec3::Y, -Vec3::Y, Vec3::X] {
                for i in 0..128 {
                    let h = importance_sample_ggx(hammersley(i, 128), n, roughness);
                    assert_abs_diff_eq!(h.length(), 1.0, epsilon = 1e-4);
                    assert!(h.dot(n) >= -1e-6);
                }
            }
        }
    }

    #[test]
    fn environment_sample_reflects_view() {
        let s = sample_environment(Vec2::new(0.25, 0.5), Vec3::Z, Vec3::Z, 0.5);
        assert_abs_diff_eq!(s.direction.length(), 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(
            s.direction.dot(s.half_vector),
            Vec3::Z.dot(s.half_vector),
            epsilon = 1e-5
        );
        assert!(s.pdf > 0.0);
    }
}
