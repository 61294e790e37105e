//! Composition of the individual terms into reflected radiance.

use glam::Vec3;

use crate::brdf::{f_schlick, fd_subsurface, fresnel};
use crate::frame::ShadingFrame;
use crate::lobe::{DiffuseModel, SpecularLobe, VisibilityMode};
use crate::lut::BrdfLut;
use crate::material::Material;

/// Normal incidence reflectance of the clear coat layer (IOR 1.5).
const CLEARCOAT_F0: f32 = 0.04;

/// Final colour and coverage of a shaded point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadedColor {
    pub rgb: Vec3,
    pub alpha: f32,
}

/// Image based lighting inputs for one point: the irradiance and prefiltered
/// radiance fetched by the caller, and the split-sum table.
#[derive(Debug, Copy, Clone)]
pub struct AmbientLight<'a> {
    pub irradiance: Vec3,
    pub prefiltered: Vec3,
    pub lut: &'a BrdfLut,
}

/// Full BRDF value for one light, not yet multiplied by N.L.
pub fn evaluate_brdf(material: &Material, frame: &ShadingFrame) -> Vec3 {
    evaluate_brdf_with(material, frame, VisibilityMode::Correlated)
}

pub fn evaluate_brdf_with(material: &Material, frame: &ShadingFrame, mode: VisibilityMode) -> Vec3 {
    if !frame.is_lit() {
        return Vec3::ZERO;
    }
    let m = material.sanitized();

    let diffuse_model = m.diffuse_model();
    let mut fd = diffuse_model.evaluate(m.roughness, frame);
    if diffuse_model == DiffuseModel::Burley && m.subsurface > 0.0 {
        let ss = fd_subsurface(m.roughness, frame.n_dot_v, frame.n_dot_l, frame.l_dot_h);
        fd += (ss - fd) * m.subsurface;
    }
    let diffuse = m.diffuse_color() * fd;

    let specular = fresnel(m.f0(), frame.l_dot_h) * m.specular_lobe().evaluate(m.roughness, frame, mode);

    let sheen = if m.sheen > 0.0 {
        m.sheen_color()
            * (1.0 - m.metalness)
            * SpecularLobe::Cloth.evaluate(m.roughness, frame, mode)
    } else {
        Vec3::ZERO
    };

    let base = diffuse + specular + sheen;
    if m.clearcoat <= 0.0 {
        return base;
    }

    let fc = f_schlick(CLEARCOAT_F0, 1.0, frame.l_dot_h) * m.clearcoat;
    let coat = SpecularLobe::ClearCoat.evaluate(m.clearcoat_perceptual_roughness(), frame, mode);
    base * (1.0 - fc) + Vec3::splat(coat * fc)
}

/// Radiance reflected from a single light of the given colour.
pub fn shade_direct(material: &Material, frame: &ShadingFrame, light_color: Vec3) -> Vec3 {
    evaluate_brdf(material, frame) * frame.n_dot_l * light_color
}

/// Split-sum image based lighting. `irradiance` is expected pre-divided by
/// pi, the way [`crate::cubemap::convolve_irradiance`] produces it.
pub fn shade_ambient(
    material: &Material,
    n_dot_v: f32,
    irradiance: Vec3,
    prefiltered: Vec3,
    lut: &BrdfLut,
) -> Vec3 {
    let m = material.sanitized();
    let entry = lut.sample_bilinear(m.roughness, n_dot_v);
    let specular = prefiltered * entry.apply(m.f0());
    let diffuse = irradiance * m.diffuse_color();
    (diffuse + specular) * m.ambient_occlusion
}

/// Direct light, optional image based lighting and emission together.
pub fn shade(
    material: &Material,
    frame: &ShadingFrame,
    light_color: Vec3,
    ambient: Option<&AmbientLight<'_>>,
) -> ShadedColor {
    let m = material.sanitized();
    let mut rgb = shade_direct(&m, frame, light_color) + m.emission_color;
    if let Some(ambient) = ambient {
        rgb += shade_ambient(
            &m,
            frame.n_dot_v,
            ambient.irradiance,
            ambient.prefiltered,
            ambient.lut,
        );
    }
    ShadedColor {
        rgb,
        alpha: m.opacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::LutConfig;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn lut() -> BrdfLut {
        BrdfLut::generate(&LutConfig {
            angle_bins: 16,
            roughness_bins: 16,
            sample_count: 256,
        })
    }

    /// Directional albedo for a light sweep, integrated numerically.
    fn albedo(material: &Material, n_dot_v: f32) -> Vec3 {
        let v = Vec3::new((1.0 - n_dot_v * n_dot_v).sqrt(), 0.0, n_dot_v);
        let (phi_steps, theta_steps) = (128, 128);
        let mut sum = Vec3::ZERO;
        for p in 0..phi_steps {
            let phi = (p as f32 + 0.5) / phi_steps as f32 * 2.0 * PI;
            for t in 0..theta_steps {
                let theta = (t as f32 + 0.5) / theta_steps as f32 * 0.5 * PI;
                let l = Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
                let frame = ShadingFrame::new(Vec3::Z, v, l);
                sum += shade_direct(material, &frame, Vec3::ONE) * theta.sin();
            }
        }
        sum * (2.0 * PI / phi_steps as f32) * (0.5 * PI / theta_steps as f32)
    }

    #[test]
    fn rough_white_dielectric_conserves_energy() {
        let m = Material {
            roughness: 0.8,
            fast_diffuse: true,
            ..Default::default()
        };
        let a = albedo(&m, 0.7);
        assert!(a.x <= 1.0, "{a}");
        assert!(a.x > 0.75, "{a}");
    }

    #[test]
    fn black_metal_is_black_head_on() {
        let m = Material {
            base_color: Vec3::ZERO,
            metalness: 1.0,
            ..Default::default()
        };
        let frame = ShadingFrame::new(Vec3::Z, Vec3::Z, Vec3::Z);
        assert_eq!(evaluate_brdf(&m, &frame), Vec3::ZERO);
    }

    #[test]
    fn light_behind_surface_is_black() {
        let frame = ShadingFrame::new(Vec3::Z, Vec3::Z, -Vec3::Z);
        assert_eq!(shade_direct(&Material::default(), &frame, Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn clearcoat_adds_a_highlight() {
        let frame = ShadingFrame::new(Vec3::Z, Vec3::new(0.1, 0.0, 1.0), Vec3::new(-0.1, 0.0, 1.0));
        let plain = Material {
            roughness: 0.9,
            ..Default::default()
        };
        let coated = Material {
            clearcoat: 1.0,
            ..plain
        };
        assert!(evaluate_brdf(&coated, &frame).x > evaluate_brdf(&plain, &frame).x);
    }

    #[test]
    fn sheen_brightens_grazing_views() {
        let frame = ShadingFrame::new(Vec3::Z, Vec3::new(1.0, 0.0, 0.1), Vec3::new(-1.0, 0.0, 0.3));
        let plain = Material::default();
        let velvet = Material {
            sheen: 1.0,
            ..plain
        };
        assert!(evaluate_brdf(&velvet, &frame).x > evaluate_brdf(&plain, &frame).x);
    }

    #[test]
    fn subsurface_flattens_diffuse() {
        let frame = ShadingFrame::new(Vec3::Z, Vec3::Z, Vec3::new(1.0, 0.0, 0.2));
        let m = Material {
            subsurface: 1.0,
            ..Default::default()
        };
        let out = evaluate_brdf(&m, &frame);
        assert!(out.is_finite() && out.min_element() >= 0.0);
    }

    #[test]
    fn ambient_for_white_furnace() {
        let lut = lut();
        // smooth chrome head on reflects the prefiltered colour unchanged
        let chrome = Material {
            base_color: Vec3::ONE,
            metalness: 1.0,
            roughness: 0.0,
            ..Default::default()
        };
        let out = shade_ambient(&chrome, 1.0, Vec3::ONE, Vec3::splat(2.0), &lut);
        assert_abs_diff_eq!(out.x, 2.0, epsilon = 0.05);

        let occluded = Material {
            ambient_occlusion: 0.0,
            ..chrome
        };
        assert_eq!(shade_ambient(&occluded, 1.0, Vec3::ONE, Vec3::ONE, &lut), Vec3::ZERO);
    }

    #[test]
    fn shade_carries_opacity_and_emission() {
        let lut = lut();
        let m = Material {
            opacity: 0.25,
            emission_color: Vec3::new(3.0, 0.0, 0.0),
            ..Default::default()
        };
        let frame = ShadingFrame::new(Vec3::Z, Vec3::Z, -Vec3::Z);
        let ambient = AmbientLight {
            irradiance: Vec3::ZERO,
            prefiltered: Vec3::ZERO,
            lut: &lut,
        };
        let out = shade(&m, &frame, Vec3::ONE, Some(&ambient));
        assert_eq!(out.alpha, 0.25);
        assert_eq!(out.rgb, Vec3::new(3.0, 0.0, 0.0));
    }
}
