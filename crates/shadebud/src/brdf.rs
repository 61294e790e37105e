//! Analytic BRDF terms.
//!
//! Every function here is total: out of range inputs are clamped, dot
//! products at or below zero produce a zero distribution/visibility term,
//! and denominators are floored with [`EPSILON`] so grazing angles never
//! produce NaN or infinity.
//!
//! Roughness parameters are always *perceptual* roughness. They are turned
//! into GGX alpha with [`roughness_to_alpha`] before use.

use glam::Vec3;
use std::f32::consts::PI;

/// Floor applied to denominators.
pub const EPSILON: f32 = 1e-4;

/// Smallest perceptual roughness used by the distribution and visibility
/// terms. Below this alpha^2 stops being representable once squared again.
pub const MIN_PERCEPTUAL_ROUGHNESS: f32 = 0.045;

/// Smallest GGX alpha, `MIN_PERCEPTUAL_ROUGHNESS^2`.
pub const MIN_ALPHA: f32 = MIN_PERCEPTUAL_ROUGHNESS * MIN_PERCEPTUAL_ROUGHNESS;

/// Sine squared floor for the sheen distributions (2^-7, keeps sin^4 > 0 in fp16).
const MIN_SIN2: f32 = 0.0078125;

/// Convert perceptual roughness into GGX alpha.
#[inline]
pub fn roughness_to_alpha(perceptual_roughness: f32) -> f32 {
    let r = clamp_roughness(perceptual_roughness);
    r * r
}

#[inline]
pub(crate) fn clamp_roughness(perceptual_roughness: f32) -> f32 {
    if perceptual_roughness.is_nan() {
        return 1.0;
    }
    perceptual_roughness.clamp(MIN_PERCEPTUAL_ROUGHNESS, 1.0)
}

#[inline]
fn saturate(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

#[inline]
fn pow5(x: f32) -> f32 {
    let x2 = x * x;
    x2 * x2 * x
}

// ---------------------------------------------------------------------------
// Fresnel
// ---------------------------------------------------------------------------

/// Schlick's approximation for a scalar F0.
#[inline]
pub fn f_schlick(f0: f32, f90: f32, v_dot_h: f32) -> f32 {
    f0 + (f90 - f0) * pow5(1.0 - saturate(v_dot_h))
}

/// Schlick's approximation for an RGB F0.
#[inline]
pub fn f_schlick3(f0: Vec3, f90: f32, v_dot_h: f32) -> Vec3 {
    f0 + (Vec3::splat(f90) - f0) * pow5(1.0 - saturate(v_dot_h))
}

/// Fresnel reflectance with `f90 = 1`.
#[inline]
pub fn fresnel(f0: Vec3, l_dot_h: f32) -> Vec3 {
    f_schlick3(f0, 1.0, l_dot_h)
}

// ---------------------------------------------------------------------------
// Normal distribution functions
// ---------------------------------------------------------------------------

/// GGX / Trowbridge-Reitz normal distribution.
pub fn d_ggx(roughness: f32, n_dot_h: f32) -> f32 {
    if !(n_dot_h > 0.0) {
        return 0.0;
    }
    let n_dot_h = n_dot_h.min(1.0);
    let a = roughness_to_alpha(roughness);
    let a2 = a * a;
    // d >= a2 > 0 because alpha is clamped
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * d * d)
}

/// Anisotropic GGX (GTR2 anisotropic). `at` and `ab` are alphas along the
/// tangent and bitangent.
pub fn d_ggx_anisotropic(at: f32, ab: f32, t_dot_h: f32, b_dot_h: f32, n_dot_h: f32) -> f32 {
    if !(n_dot_h > 0.0) {
        return 0.0;
    }
    let at = at.clamp(MIN_ALPHA, 1.0);
    let ab = ab.clamp(MIN_ALPHA, 1.0);
    let a2 = at * ab;
    let d = Vec3::new(ab * t_dot_h, at * b_dot_h, a2 * n_dot_h.min(1.0));
    let d2 = d.length_squared().max(f32::MIN_POSITIVE);
    let b2 = a2 / d2;
    a2 * b2 * b2 / PI
}

/// Tangent and bitangent alphas for a perceptual roughness and an
/// anisotropy amount in [0, 1].
pub fn anisotropic_alphas(roughness: f32, anisotropy: f32) -> (f32, f32) {
    let a = roughness_to_alpha(roughness);
    let aspect = (1.0 - 0.9 * saturate(anisotropy)).sqrt();
    let at = (a / aspect).clamp(MIN_ALPHA, 1.0);
    let ab = (a * aspect).clamp(MIN_ALPHA, 1.0);
    (at, ab)
}

/// Ashikhmin's inverted Gaussian velvet distribution.
pub fn d_ashikhmin(roughness: f32, n_dot_h: f32) -> f32 {
    if !(n_dot_h > 0.0) {
        return 0.0;
    }
    let a = roughness_to_alpha(roughness);
    let a2 = a * a;
    let cos2h = n_dot_h.min(1.0) * n_dot_h.min(1.0);
    let sin2h = (1.0 - cos2h).max(MIN_SIN2);
    let sin4h = sin2h * sin2h;
    let cot2 = -cos2h / (a2 * sin2h);
    (4.0 * cot2.exp() + sin4h) / (PI * (4.0 * a2 + 1.0) * sin4h)
}

/// Estevez and Kulla "Charlie" sheen distribution.
pub fn d_charlie(roughness: f32, n_dot_h: f32) -> f32 {
    if !(n_dot_h > 0.0) {
        return 0.0;
    }
    let inv_alpha = 1.0 / roughness_to_alpha(roughness);
    let cos2h = n_dot_h.min(1.0) * n_dot_h.min(1.0);
    let sin2h = (1.0 - cos2h).max(MIN_SIN2);
    (2.0 + inv_alpha) * sin2h.powf(inv_alpha * 0.5) / (2.0 * PI)
}

// ---------------------------------------------------------------------------
// Visibility (G / (4 n.v n.l))
// ---------------------------------------------------------------------------

#[inline]
fn clamp_dot(x: f32) -> f32 {
    x.clamp(EPSILON, 1.0)
}

/// Height-correlated Smith GGX visibility. Includes the `1 / (4 n.v n.l)`
/// microfacet denominator.
pub fn v_smith_ggx_correlated(roughness: f32, n_dot_v: f32, n_dot_l: f32) -> f32 {
    if !(n_dot_v > 0.0 && n_dot_l > 0.0) {
        return 0.0;
    }
    let (nv, nl) = (clamp_dot(n_dot_v), clamp_dot(n_dot_l));
    let a = roughness_to_alpha(roughness);
    let a2 = a * a;
    let ggx_v = nl * (nv * nv * (1.0 - a2) + a2).sqrt();
    let ggx_l = nv * (nl * nl * (1.0 - a2) + a2).sqrt();
    0.5 / (ggx_v + ggx_l).max(EPSILON)
}

/// `sqrt(x^2 (1 - a^2) + a^2)` without a square root.
///
/// The seed `lerp(x, 1, a)` never undershoots the root, and two Heron steps
/// from it land within 0.2% of the exact value for every `x, a` in [0, 1].
#[inline]
fn lambda_rational(x: f32, a: f32) -> f32 {
    let y = x * x * (1.0 - a * a) + a * a;
    let mut s = x * (1.0 - a) + a;
    s = 0.5 * (s + y / s);
    0.5 * (s + y / s)
}

/// Rational approximation of [`v_smith_ggx_correlated`].
pub fn v_smith_ggx_correlated_fast(roughness: f32, n_dot_v: f32, n_dot_l: f32) -> f32 {
    if !(n_dot_v > 0.0 && n_dot_l > 0.0) {
        return 0.0;
    }
    let (nv, nl) = (clamp_dot(n_dot_v), clamp_dot(n_dot_l));
    let a = roughness_to_alpha(roughness);
    let ggx_v = nl * lambda_rational(nv, a);
    let ggx_l = nv * lambda_rational(nl, a);
    0.5 / (ggx_v + ggx_l).max(EPSILON)
}

/// Separable (uncorrelated) Smith GGX visibility.
pub fn v_smith_ggx(roughness: f32, n_dot_v: f32, n_dot_l: f32) -> f32 {
    if !(n_dot_v > 0.0 && n_dot_l > 0.0) {
        return 0.0;
    }
    let a = roughness_to_alpha(roughness);
    let a2 = a * a;
    let g1 = |n: f32| {
        let n = clamp_dot(n);
        1.0 / (n + (a2 + n * n - a2 * n * n).sqrt())
    };
    g1(n_dot_v) * g1(n_dot_l)
}

/// Height-correlated anisotropic Smith GGX visibility.
#[allow(clippy::too_many_arguments)]
pub fn v_smith_ggx_correlated_anisotropic(
    at: f32,
    ab: f32,
    t_dot_v: f32,
    b_dot_v: f32,
    t_dot_l: f32,
    b_dot_l: f32,
    n_dot_v: f32,
    n_dot_l: f32,
) -> f32 {
    if !(n_dot_v > 0.0 && n_dot_l > 0.0) {
        return 0.0;
    }
    let at = at.clamp(MIN_ALPHA, 1.0);
    let ab = ab.clamp(MIN_ALPHA, 1.0);
    let (nv, nl) = (clamp_dot(n_dot_v), clamp_dot(n_dot_l));
    let lambda_v = nl * Vec3::new(at * t_dot_v, ab * b_dot_v, nv).length();
    let lambda_l = nv * Vec3::new(at * t_dot_l, ab * b_dot_l, nl).length();
    0.5 / (lambda_v + lambda_l).max(EPSILON)
}

/// Kelemen visibility, used by the clear coat layer.
#[inline]
pub fn v_kelemen(l_dot_h: f32) -> f32 {
    0.25 / (l_dot_h * l_dot_h).max(EPSILON)
}

/// Neubelt visibility, used by the cloth lobe.
pub fn v_neubelt(n_dot_v: f32, n_dot_l: f32) -> f32 {
    if !(n_dot_v > 0.0 && n_dot_l > 0.0) {
        return 0.0;
    }
    let (nv, nl) = (clamp_dot(n_dot_v), clamp_dot(n_dot_l));
    saturate(1.0 / (4.0 * (nl + nv - nl * nv)).max(EPSILON))
}

// ---------------------------------------------------------------------------
// Diffuse
// ---------------------------------------------------------------------------

#[inline]
pub fn fd_lambert() -> f32 {
    1.0 / PI
}

/// Disney/Burley diffuse with retro-reflection at grazing angles.
pub fn fd_burley(roughness: f32, n_dot_v: f32, n_dot_l: f32, l_dot_h: f32) -> f32 {
    let l_dot_h = saturate(l_dot_h);
    let f90 = 0.5 + 2.0 * saturate(roughness) * l_dot_h * l_dot_h;
    let light_scatter = f_schlick(1.0, f90, n_dot_l);
    let view_scatter = f_schlick(1.0, f90, n_dot_v);
    light_scatter * view_scatter / PI
}

/// Energy conserving wrap diffuse factor (includes `n.l`).
#[inline]
pub fn fd_wrap(n_dot_l: f32, w: f32) -> f32 {
    let w = w.max(0.0);
    saturate((n_dot_l + w) / ((1.0 + w) * (1.0 + w)))
}

/// Hanrahan-Krueger inspired subsurface approximation from the Disney BRDF.
pub fn fd_subsurface(roughness: f32, n_dot_v: f32, n_dot_l: f32, l_dot_h: f32) -> f32 {
    let l_dot_h = saturate(l_dot_h);
    let (nv, nl) = (clamp_dot(n_dot_v), clamp_dot(n_dot_l));
    let fl = pow5(1.0 - nl);
    let fv = pow5(1.0 - nv);
    let fss90 = l_dot_h * l_dot_h * saturate(roughness);
    let fss = (1.0 + (fss90 - 1.0) * fl) * (1.0 + (fss90 - 1.0) * fv);
    let ss = 1.25 * (fss * (1.0 / (nl + nv) - 0.5) + 0.5);
    ss.max(0.0) / PI
}

// ---------------------------------------------------------------------------
// Index of refraction
// ---------------------------------------------------------------------------

/// Reflectance at normal incidence for an interface between two media.
pub fn ior_to_f0(transmitted_ior: f32, incident_ior: f32) -> f32 {
    let t = transmitted_ior.max(0.0);
    let i = incident_ior.max(0.0);
    let r = (t - i) / (t + i).max(EPSILON);
    r * r
}

/// Index of refraction of a material seen from air, inverse of
/// `ior_to_f0(ior, 1.0)`.
pub fn f0_to_ior(f0: f32) -> f32 {
    let r = saturate(f0).min(1.0 - EPSILON).sqrt();
    (1.0 + r) / (1.0 - r)
}

/// F0 of a base layer once it sits under a clear coat of IOR 1.5.
pub fn f0_clear_coat_to_surface(f0: Vec3) -> Vec3 {
    let convert = |c: f32| ior_to_f0(f0_to_ior(c), 1.5);
    Vec3::new(convert(f0.x), convert(f0.y), convert(f0.z))
}

// ---------------------------------------------------------------------------
// Schlick-GGX geometry (IBL remapping)
// ---------------------------------------------------------------------------

/// Schlick-GGX single direction geometry term with `k = alpha / 2`.
pub fn geometry_schlick_ggx(roughness: f32, n_dot_v: f32) -> f32 {
    if !(n_dot_v > 0.0) {
        return 0.0;
    }
    let k = roughness_to_alpha(roughness) * 0.5;
    let nv = n_dot_v.min(1.0);
    nv / (nv * (1.0 - k) + k).max(EPSILON)
}

/// Separable Smith geometry built from [`geometry_schlick_ggx`]. Unlike the
/// visibility terms this does not include the microfacet denominator.
pub fn geometry_smith(roughness: f32, n_dot_v: f32, n_dot_l: f32) -> f32 {
    geometry_schlick_ggx(roughness, n_dot_v) * geometry_schlick_ggx(roughness, n_dot_l)
}
