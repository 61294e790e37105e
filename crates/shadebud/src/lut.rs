//! Split-sum BRDF integration and the 2D lookup table built from it.

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::brdf::{EPSILON, v_smith_ggx_correlated};
use crate::sampling::{hammersley, importance_sample_ggx_tangent};

/// Importance samples per table entry when no count is given.
pub const DEFAULT_SAMPLE_COUNT: u32 = 1024;

/// Smallest N.V used for integration. Below this the view vector lies in
/// the tangent plane and every reflected sample goes under the horizon.
const MIN_N_DOT_V: f32 = 1e-3;

/// Largest bin count along either table axis.
pub const MAX_LUT_BINS: u32 = 4096;

/// One table entry: specular reflectance is reconstructed as
/// `f0 * scale + bias`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LutEntry {
    pub scale: f32,
    pub bias: f32,
}

impl LutEntry {
    /// Specular response for an RGB F0.
    #[inline]
    pub fn apply(&self, f0: Vec3) -> Vec3 {
        f0 * self.scale + Vec3::splat(self.bias)
    }
}

/// Integrate the specular BRDF over the hemisphere with
/// [`DEFAULT_SAMPLE_COUNT`] samples.
pub fn integrate_brdf(roughness: f32, n_dot_v: f32) -> LutEntry {
    integrate_brdf_with_samples(roughness, n_dot_v, DEFAULT_SAMPLE_COUNT)
}

/// Integrate the specular BRDF over the hemisphere.
///
/// Samples are accumulated in index order, so the result is bit exact for a
/// given input no matter which thread runs it.
pub fn integrate_brdf_with_samples(roughness: f32, n_dot_v: f32, sample_count: u32) -> LutEntry {
    let sample_count = sample_count.max(1);
    let n_dot_v = if n_dot_v.is_nan() {
        1.0
    } else {
        n_dot_v.clamp(MIN_N_DOT_V, 1.0)
    };

    // tangent space, N = +Z
    let v = Vec3::new((1.0 - n_dot_v * n_dot_v).sqrt(), 0.0, n_dot_v);

    let mut a = 0.0f32;
    let mut b = 0.0f32;

    for i in 0..sample_count {
        let h = importance_sample_ggx_tangent(hammersley(i, sample_count), roughness);

        let v_dot_h = v.dot(h).max(0.0);
        let l = 2.0 * v_dot_h * h - v;

        let n_dot_l = l.z;
        let n_dot_h = h.z.max(0.0);

        if n_dot_l > 0.0 {
            // visibility * n.l / pdf, with the D terms cancelled
            let vis = v_smith_ggx_correlated(roughness, n_dot_v, n_dot_l);
            let g_vis = 4.0 * vis * n_dot_l * v_dot_h / n_dot_h.max(EPSILON);
            let fc = (1.0 - v_dot_h).powi(5);

            a += (1.0 - fc) * g_vis;
            b += fc * g_vis;
        }
    }

    let inv_samples = 1.0 / sample_count as f32;
    LutEntry {
        scale: a * inv_samples,
        bias: b * inv_samples,
    }
}

/// Table resolution and sample count.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LutConfig {
    /// Bins along N.V (the X axis).
    pub angle_bins: u32,
    /// Bins along perceptual roughness (the Y axis).
    pub roughness_bins: u32,
    pub sample_count: u32,
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            angle_bins: 128,
            roughness_bins: 128,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

impl LutConfig {
    pub fn sanitized(self) -> Self {
        Self {
            angle_bins: self.angle_bins.clamp(1, MAX_LUT_BINS),
            roughness_bins: self.roughness_bins.clamp(1, MAX_LUT_BINS),
            sample_count: self.sample_count.max(1),
        }
    }
}

/// Precomputed split-sum table. X is N.V, Y is roughness, row major.
#[derive(Debug, Clone, PartialEq)]
pub struct BrdfLut {
    angle_bins: u32,
    roughness_bins: u32,
    entries: Vec<LutEntry>,
}

#[inline]
fn bin_center(i: u32, bins: u32) -> f32 {
    (i as f32 + 0.5) / bins as f32
}

impl BrdfLut {
    /// Integrate every entry of the table. Entries are computed in parallel
    /// and stored in index order.
    pub fn generate(config: &LutConfig) -> Self {
        let config = config.sanitized();
        let (w, h) = (config.angle_bins, config.roughness_bins);
        let start = Instant::now();

        let entries: Vec<LutEntry> = (0..w * h)
            .into_par_iter()
            .map(|idx| {
                let x = idx % w;
                let y = idx / w;
                integrate_brdf_with_samples(
                    bin_center(y, h),
                    bin_center(x, w),
                    config.sample_count,
                )
            })
            .collect();

        debug!(
            "generated {}x{} brdf lut ({} samples) in {:?}",
            w,
            h,
            config.sample_count,
            start.elapsed()
        );

        Self {
            angle_bins: w,
            roughness_bins: h,
            entries,
        }
    }

    pub fn angle_bins(&self) -> u32 {
        self.angle_bins
    }

    pub fn roughness_bins(&self) -> u32 {
        self.roughness_bins
    }

    pub fn entries(&self) -> &[LutEntry] {
        &self.entries
    }

    /// Entry at a bin, clamped to the table edge.
    pub fn get(&self, x: u32, y: u32) -> LutEntry {
        let x = x.min(self.angle_bins - 1);
        let y = y.min(self.roughness_bins - 1);
        self.entries[y as usize * self.angle_bins as usize + x as usize]
    }

    /// Nearest bin lookup.
    pub fn lookup_nearest(&self, roughness: f32, n_dot_v: f32) -> LutEntry {
        let to_bin = |t: f32, bins: u32| {
            let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
            ((t * bins as f32) as u32).min(bins - 1)
        };
        self.get(
            to_bin(n_dot_v, self.angle_bins),
            to_bin(roughness, self.roughness_bins),
        )
    }

    /// Bilinear lookup between bin centres, clamped at the edges.
    pub fn sample_bilinear(&self, roughness: f32, n_dot_v: f32) -> LutEntry {
        // continuous texel coordinate, centres at integer positions
        let coord = |t: f32, bins: u32| {
            let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
            let c = (t * bins as f32 - 0.5).clamp(0.0, (bins - 1) as f32);
            let i0 = c.floor() as u32;
            let i1 = (i0 + 1).min(bins - 1);
            (i0, i1, c - i0 as f32)
        };

        let (x0, x1, fx) = coord(n_dot_v, self.angle_bins);
        let (y0, y1, fy) = coord(roughness, self.roughness_bins);

        let lerp = |p: LutEntry, q: LutEntry, t: f32| LutEntry {
            scale: p.scale + (q.scale - p.scale) * t,
            bias: p.bias + (q.bias - p.bias) * t,
        };

        let top = lerp(self.get(x0, y0), self.get(x1, y0), fx);
        let bottom = lerp(self.get(x0, y1), self.get(x1, y1), fx);
        lerp(top, bottom, fy)
    }

    /// Raw RG32F texel data.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }

    /// RG16F texel data, little endian, tightly packed.
    pub fn to_rg16f_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.entries.len() * 4);
        for entry in &self.entries {
            data.extend_from_slice(&half::f16::from_f32(entry.scale).to_le_bytes());
            data.extend_from_slice(&half::f16::from_f32(entry.bias).to_le_bytes());
        }
        data
    }
}
