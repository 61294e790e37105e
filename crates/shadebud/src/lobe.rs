//! Named shading strategies. Materials pick a variant, callers dispatch on it.

use crate::brdf::{
    d_charlie, d_ggx, d_ggx_anisotropic, fd_burley, fd_lambert, v_kelemen, v_neubelt,
    v_smith_ggx_correlated, v_smith_ggx_correlated_anisotropic, v_smith_ggx_correlated_fast,
};
use crate::frame::ShadingFrame;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum DiffuseModel {
    /// Constant `1 / pi`.
    Lambert,
    /// Disney retro-reflective diffuse.
    #[default]
    Burley,
}

impl DiffuseModel {
    pub fn evaluate(self, roughness: f32, frame: &ShadingFrame) -> f32 {
        match self {
            DiffuseModel::Lambert => fd_lambert(),
            DiffuseModel::Burley => {
                fd_burley(roughness, frame.n_dot_v, frame.n_dot_l, frame.l_dot_h)
            }
        }
    }
}

/// Which height-correlated Smith form the GGX lobes use.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum VisibilityMode {
    #[default]
    Correlated,
    Fast,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SpecularLobe {
    /// Isotropic GGX with height-correlated Smith visibility.
    Standard,
    /// Anisotropic GGX. `at` and `ab` are alphas, not perceptual roughness.
    Anisotropic { at: f32, ab: f32 },
    /// Charlie sheen distribution with Neubelt visibility.
    Cloth,
    /// GGX with Kelemen visibility, for the clear coat layer.
    ClearCoat,
}

impl SpecularLobe {
    pub fn distribution(&self, roughness: f32, frame: &ShadingFrame) -> f32 {
        match *self {
            SpecularLobe::Standard | SpecularLobe::ClearCoat => d_ggx(roughness, frame.n_dot_h),
            SpecularLobe::Anisotropic { at, ab } => {
                d_ggx_anisotropic(at, ab, frame.t_dot_h, frame.b_dot_h, frame.n_dot_h)
            }
            SpecularLobe::Cloth => d_charlie(roughness, frame.n_dot_h),
        }
    }

    pub fn visibility(&self, roughness: f32, frame: &ShadingFrame, mode: VisibilityMode) -> f32 {
        match (*self, mode) {
            (SpecularLobe::Standard, VisibilityMode::Correlated) => {
                v_smith_ggx_correlated(roughness, frame.n_dot_v, frame.n_dot_l)
            }
            (SpecularLobe::Standard, VisibilityMode::Fast) => {
                v_smith_ggx_correlated_fast(roughness, frame.n_dot_v, frame.n_dot_l)
            }
            (SpecularLobe::Anisotropic { at, ab }, _) => v_smith_ggx_correlated_anisotropic(
                at,
                ab,
                frame.t_dot_v,
                frame.b_dot_v,
                frame.t_dot_l,
                frame.b_dot_l,
                frame.n_dot_v,
                frame.n_dot_l,
            ),
            (SpecularLobe::Cloth, _) => v_neubelt(frame.n_dot_v, frame.n_dot_l),
            (SpecularLobe::ClearCoat, _) => v_kelemen(frame.l_dot_h),
        }
    }

    /// `D * V`, the lobe without its Fresnel factor.
    pub fn evaluate(&self, roughness: f32, frame: &ShadingFrame, mode: VisibilityMode) -> f32 {
        if !frame.is_lit() {
            return 0.0;
        }
        self.distribution(roughness, frame) * self.visibility(roughness, frame, mode)
    }
}
