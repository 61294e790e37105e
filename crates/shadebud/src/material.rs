use glam::Vec3;

use crate::brdf::{anisotropic_alphas, ior_to_f0};
use crate::color::luminance;
use crate::lobe::{DiffuseModel, SpecularLobe};

/// Number of blendable material properties.
pub const PROPERTY_COUNT: usize = 14;

/// Per-property blend weights, in [`Material`] field order.
pub type PropertyWeights = [f32; PROPERTY_COUNT];

/// Dielectric F0 at `specular = 1`.
const MAX_DIELECTRIC_F0: f32 = 0.08;

/// Clear coat perceptual roughness at zero and full gloss.
const CLEARCOAT_ROUGHNESS_MATTE: f32 = 0.6;
const CLEARCOAT_ROUGHNESS_GLOSS: f32 = 0.089;

/// Principled material parameters. Scalars live in [0, 1]; roughness is
/// perceptual.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub base_color: Vec3,
    pub emission_color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub ambient_occlusion: f32,
    pub opacity: f32,
    pub subsurface: f32,
    /// Dielectric specular amount, 0.5 is an F0 of 4%.
    pub specular: f32,
    pub specular_tint: f32,
    pub anisotropy: f32,
    pub sheen: f32,
    pub sheen_tint: f32,
    pub clearcoat: f32,
    pub clearcoat_gloss: f32,

    /// Use Lambert instead of Burley diffuse.
    pub fast_diffuse: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::splat(0.8),
            emission_color: Vec3::ZERO,
            roughness: 0.5,
            metalness: 0.0,
            ambient_occlusion: 1.0,
            opacity: 1.0,
            subsurface: 0.0,
            specular: 0.5,
            specular_tint: 0.0,
            anisotropy: 0.0,
            sheen: 0.0,
            sheen_tint: 0.5,
            clearcoat: 0.0,
            clearcoat_gloss: 1.0,
            fast_diffuse: false,
        }
    }
}

fn unit(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

fn non_negative(c: Vec3) -> Vec3 {
    let fix = |x: f32| if x.is_nan() { 0.0 } else { x.max(0.0) };
    Vec3::new(fix(c.x), fix(c.y), fix(c.z))
}

impl Material {
    /// Copy with every scalar clamped to [0, 1] and colours to >= 0.
    pub fn sanitized(&self) -> Self {
        Self {
            base_color: non_negative(self.base_color),
            emission_color: non_negative(self.emission_color),
            roughness: unit(self.roughness),
            metalness: unit(self.metalness),
            ambient_occlusion: unit(self.ambient_occlusion),
            opacity: unit(self.opacity),
            subsurface: unit(self.subsurface),
            specular: unit(self.specular),
            specular_tint: unit(self.specular_tint),
            anisotropy: unit(self.anisotropy),
            sheen: unit(self.sheen),
            sheen_tint: unit(self.sheen_tint),
            clearcoat: unit(self.clearcoat),
            clearcoat_gloss: unit(self.clearcoat_gloss),
            fast_diffuse: self.fast_diffuse,
        }
    }

    /// Set the dielectric specular amount from an index of refraction.
    pub fn with_ior(mut self, ior: f32) -> Self {
        self.specular = unit(ior_to_f0(ior, 1.0) / MAX_DIELECTRIC_F0);
        self
    }

    /// Base colour normalised to unit luminance (hue and saturation only).
    pub fn tint_color(&self) -> Vec3 {
        let lum = luminance(self.base_color);
        if lum > 0.0 {
            self.base_color / lum
        } else {
            Vec3::ONE
        }
    }

    /// Albedo of the diffuse lobe. Metals have none.
    pub fn diffuse_color(&self) -> Vec3 {
        self.base_color * (1.0 - self.metalness)
    }

    /// Reflectance at normal incidence.
    pub fn f0(&self) -> Vec3 {
        let tint = Vec3::ONE.lerp(self.tint_color(), self.specular_tint);
        let dielectric = tint * (self.specular * MAX_DIELECTRIC_F0);
        dielectric.lerp(self.base_color, self.metalness)
    }

    pub fn sheen_color(&self) -> Vec3 {
        Vec3::ONE.lerp(self.tint_color(), self.sheen_tint) * self.sheen
    }

    pub fn clearcoat_perceptual_roughness(&self) -> f32 {
        CLEARCOAT_ROUGHNESS_MATTE
            + (CLEARCOAT_ROUGHNESS_GLOSS - CLEARCOAT_ROUGHNESS_MATTE) * self.clearcoat_gloss
    }

    pub fn diffuse_model(&self) -> DiffuseModel {
        if self.fast_diffuse {
            DiffuseModel::Lambert
        } else {
            DiffuseModel::Burley
        }
    }

    /// Primary specular lobe: anisotropic GGX when the material asks for
    /// anisotropy, isotropic GGX otherwise.
    pub fn specular_lobe(&self) -> SpecularLobe {
        if self.anisotropy > 0.0 {
            let (at, ab) = anisotropic_alphas(self.roughness, self.anisotropy);
            SpecularLobe::Anisotropic { at, ab }
        } else {
            SpecularLobe::Standard
        }
    }

    /// Blend towards `other`, one weight per property (0 keeps `self`,
    /// 1 takes `other`). Used to fade between levels of detail.
    pub fn lod_blend(&self, other: &Material, weights: &PropertyWeights) -> Material {
        let w = weights.map(unit);
        let mix = |a: f32, b: f32, t: f32| a + (b - a) * t;
        Material {
            base_color: self.base_color.lerp(other.base_color, w[0]),
            emission_color: self.emission_color.lerp(other.emission_color, w[1]),
            roughness: mix(self.roughness, other.roughness, w[2]),
            metalness: mix(self.metalness, other.metalness, w[3]),
            ambient_occlusion: mix(self.ambient_occlusion, other.ambient_occlusion, w[4]),
            opacity: mix(self.opacity, other.opacity, w[5]),
            subsurface: mix(self.subsurface, other.subsurface, w[6]),
            specular: mix(self.specular, other.specular, w[7]),
            specular_tint: mix(self.specular_tint, other.specular_tint, w[8]),
            anisotropy: mix(self.anisotropy, other.anisotropy, w[9]),
            sheen: mix(self.sheen, other.sheen, w[10]),
            sheen_tint: mix(self.sheen_tint, other.sheen_tint, w[11]),
            clearcoat: mix(self.clearcoat, other.clearcoat, w[12]),
            clearcoat_gloss: mix(self.clearcoat_gloss, other.clearcoat_gloss, w[13]),
            fast_diffuse: self.fast_diffuse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_dielectric_is_four_percent() {
        let m = Material::default();
        assert_abs_diff_eq!(m.f0().x, 0.04, epsilon = 1e-6);
        assert_eq!(m.diffuse_color(), m.base_color);
    }

    #[test]
    fn metals_reflect_their_base_color() {
        let m = Material {
            base_color: Vec3::new(1.0, 0.7, 0.3),
            metalness: 1.0,
            ..Default::default()
        };
        assert_eq!(m.f0(), m.base_color);
        assert_eq!(m.diffuse_color(), Vec3::ZERO);
    }

    #[test]
    fn glass_ior_gives_default_specular() {
        let m = Material::default().with_ior(1.5);
        assert_abs_diff_eq!(m.specular, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn sanitize_clamps_everything() {
        let m = Material {
            base_color: Vec3::new(-1.0, f32::NAN, 2.0),
            roughness: 3.0,
            metalness: -2.0,
            opacity: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(m.base_color, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(m.roughness, 1.0);
        assert_eq!(m.metalness, 0.0);
        assert_eq!(m.opacity, 0.0);
    }

    #[test]
    fn black_base_color_tints_white() {
        let m = Material {
            base_color: Vec3::ZERO,
            ..Default::default()
        };
        assert_eq!(m.tint_color(), Vec3::ONE);
    }

    #[test]
    fn anisotropy_selects_anisotropic_lobe() {
        assert_eq!(Material::default().specular_lobe(), SpecularLobe::Standard);
        let m = Material {
            anisotropy: 0.8,
            ..Default::default()
        };
        assert!(matches!(m.specular_lobe(), SpecularLobe::Anisotropic { at, ab } if at > ab));
    }

    #[test]
    fn clearcoat_gloss_lowers_roughness() {
        let glossy = Material::default();
        let matte = Material {
            clearcoat_gloss: 0.0,
            ..Default::default()
        };
        assert!(glossy.clearcoat_perceptual_roughness() < matte.clearcoat_perceptual_roughness());
    }

    #[test]
    fn lod_blend_weights_each_property() {
        let near = Material::default();
        let far = Material {
            roughness: 1.0,
            metalness: 1.0,
            ..Default::default()
        };
        let mut weights = [0.0; PROPERTY_COUNT];
        weights[2] = 1.0;
        weights[3] = 0.5;
        let blended = near.lod_blend(&far, &weights);
        assert_eq!(blended.roughness, 1.0);
        assert_eq!(blended.metalness, 0.5);
        assert_eq!(blended.base_color, near.base_color);

        assert_eq!(near.lod_blend(&far, &[0.0; PROPERTY_COUNT]), near);
        assert_eq!(near.lod_blend(&far, &[1.0; PROPERTY_COUNT]), far);
    }
}
