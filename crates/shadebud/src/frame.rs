use glam::Vec3;

use crate::sampling::tangent_basis;

/// Dot products describing one light/view configuration at a surface point.
///
/// All `n_dot_*` values are clamped into [0, 1]. Tangent-space products keep
/// their sign since the anisotropic terms depend on it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingFrame {
    pub n_dot_v: f32,
    pub n_dot_l: f32,
    pub n_dot_h: f32,
    pub l_dot_h: f32,
    pub v_dot_h: f32,

    pub t_dot_v: f32,
    pub t_dot_l: f32,
    pub t_dot_h: f32,
    pub b_dot_v: f32,
    pub b_dot_l: f32,
    pub b_dot_h: f32,
}

fn unit_or(v: Vec3, fallback: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(fallback)
}

impl ShadingFrame {
    /// Build a frame from normal, view and light directions. A tangent basis
    /// is derived from the normal.
    pub fn new(n: Vec3, v: Vec3, l: Vec3) -> Self {
        let n = unit_or(n, Vec3::Z);
        let (t, b) = tangent_basis(n);
        Self::with_tangents(n, t, b, v, l)
    }

    /// Build a frame with an explicit tangent and bitangent.
    pub fn with_tangents(n: Vec3, t: Vec3, b: Vec3, v: Vec3, l: Vec3) -> Self {
        let n = unit_or(n, Vec3::Z);
        let v = unit_or(v, n);
        let l = unit_or(l, n);
        let t = unit_or(t, Vec3::X);
        let b = unit_or(b, Vec3::Y);
        // v + l vanishes when light and view are opposite
        let h = unit_or(v + l, n);

        Self {
            n_dot_v: n.dot(v).clamp(0.0, 1.0),
            n_dot_l: n.dot(l).clamp(0.0, 1.0),
            n_dot_h: n.dot(h).clamp(0.0, 1.0),
            l_dot_h: l.dot(h).clamp(0.0, 1.0),
            v_dot_h: v.dot(h).clamp(0.0, 1.0),
            t_dot_v: t.dot(v),
            t_dot_l: t.dot(l),
            t_dot_h: t.dot(h),
            b_dot_v: b.dot(v),
            b_dot_l: b.dot(l),
            b_dot_h: b.dot(h),
        }
    }

    /// Whether light reaches the surface from the viewer's side.
    pub fn is_lit(&self) -> bool {
        self.n_dot_l > 0.0 && self.n_dot_v > 0.0
    }
}
