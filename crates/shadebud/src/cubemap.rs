//! Cube face addressing and environment prefiltering.

use glam::{Vec2, Vec3};
use image::Rgb32FImage;
use rayon::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use crate::Result;
use crate::sampling::{hammersley, sample_environment, tangent_basis};

/// Angular step of the irradiance sweep, in radians.
pub const IRRADIANCE_SAMPLE_DELTA: f32 = 0.05;

/// Largest cube face edge, in texels.
pub const MAX_FACE_SIZE: u32 = 16_384;

/// Cube faces in the usual +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Face for an index. Indices past the last face clamp to -Z.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index as usize).min(5)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CubeFace::PosX => "px",
            CubeFace::NegX => "nx",
            CubeFace::PosY => "py",
            CubeFace::NegY => "ny",
            CubeFace::PosZ => "pz",
            CubeFace::NegZ => "nz",
        }
    }
}

/// Unit direction through a point of a cube face.
///
/// `uv` spans [-1, 1] on each axis with `(0, 0)` at the face centre; `u`
/// runs right and `v` runs down the face as it is stored in memory.
pub fn cube_direction_from_uv_and_face(uv: Vec2, face: CubeFace) -> Vec3 {
    let u = uv.x.clamp(-1.0, 1.0);
    let v = uv.y.clamp(-1.0, 1.0);
    let dir = match face {
        CubeFace::PosX => Vec3::new(1.0, -v, -u),
        CubeFace::NegX => Vec3::new(-1.0, -v, u),
        CubeFace::PosY => Vec3::new(u, 1.0, v),
        CubeFace::NegY => Vec3::new(u, -1.0, -v),
        CubeFace::PosZ => Vec3::new(u, -v, 1.0),
        CubeFace::NegZ => Vec3::new(-u, -v, -1.0),
    };
    // the major axis component is always 1
    dir.normalize()
}

/// Direction through the centre of texel `(x, y)` of a `size` x `size` face.
pub fn texel_direction(face: CubeFace, x: u32, y: u32, size: u32) -> Vec3 {
    let size = size.max(1) as f32;
    let u = (x as f32 + 0.5) / size * 2.0 - 1.0;
    let v = (y as f32 + 0.5) / size * 2.0 - 1.0;
    cube_direction_from_uv_and_face(Vec2::new(u, v), face)
}

/// Something that can be asked for incoming radiance along a direction.
pub trait Environment: Sync {
    fn radiance(&self, dir: Vec3) -> Vec3;
}

impl<F> Environment for F
where
    F: Fn(Vec3) -> Vec3 + Sync,
{
    fn radiance(&self, dir: Vec3) -> Vec3 {
        self(dir)
    }
}

/// The same radiance from every direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UniformEnvironment(pub Vec3);

impl Environment for UniformEnvironment {
    fn radiance(&self, _dir: Vec3) -> Vec3 {
        self.0
    }
}

/// An equirectangular (latitude/longitude) HDR panorama.
pub struct EquirectEnvironment {
    image: Rgb32FImage,
}

impl EquirectEnvironment {
    pub fn new(image: Rgb32FImage) -> Self {
        Self { image }
    }

    /// Load any format the `image` crate understands (HDR included).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path.as_ref())?.into_rgb32f();
        debug!(
            "loaded {}x{} environment from {}",
            image.width(),
            image.height(),
            path.as_ref().display()
        );
        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl Environment for EquirectEnvironment {
    fn radiance(&self, dir: Vec3) -> Vec3 {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Vec3::ZERO;
        }
        let Some(d) = dir.try_normalize() else {
            return Vec3::ZERO;
        };

        // theta is azimuth, phi is elevation
        let theta = d.z.atan2(d.x);
        let phi = d.y.clamp(-1.0, 1.0).asin();

        let u = (theta / PI + 1.0) * 0.5;
        let v = (-phi / FRAC_PI_2 + 1.0) * 0.5;

        let px = ((u * width as f32) as u32).min(width - 1);
        let py = ((v * height as f32) as u32).min(height - 1);

        let p = self.image.get_pixel(px, py);
        Vec3::new(p.0[0], p.0[1], p.0[2])
    }
}

/// GGX prefiltered radiance around `n` for one roughness, assuming
/// `N = V = R`.
pub fn prefilter_environment(
    env: &impl Environment,
    n: Vec3,
    roughness: f32,
    sample_count: u32,
) -> Vec3 {
    let n = n.try_normalize().unwrap_or(Vec3::Z);
    if roughness < 0.001 {
        return env.radiance(n);
    }

    let sample_count = sample_count.max(1);
    let mut prefiltered = Vec3::ZERO;
    let mut total_weight = 0.0f32;

    for i in 0..sample_count {
        let sample = sample_environment(hammersley(i, sample_count), n, n, roughness);
        if sample.n_dot_l > 0.0 {
            prefiltered += env.radiance(sample.direction) * sample.n_dot_l;
            total_weight += sample.n_dot_l;
        }
    }

    if total_weight > 0.0 {
        prefiltered / total_weight
    } else {
        Vec3::ZERO
    }
}

/// Cosine weighted hemisphere integral of the environment around `n`,
/// divided by pi. A constant environment convolves to itself.
pub fn convolve_irradiance(env: &impl Environment, n: Vec3) -> Vec3 {
    let n = n.try_normalize().unwrap_or(Vec3::Z);
    let (tangent, bitangent) = tangent_basis(n);

    let phi_steps = (2.0 * PI / IRRADIANCE_SAMPLE_DELTA).ceil() as u32;
    let theta_steps = (FRAC_PI_2 / IRRADIANCE_SAMPLE_DELTA).ceil() as u32;
    let d_phi = 2.0 * PI / phi_steps as f32;
    let d_theta = FRAC_PI_2 / theta_steps as f32;

    let mut irradiance = Vec3::ZERO;
    for p in 0..phi_steps {
        let phi = (p as f32 + 0.5) * d_phi;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for t in 0..theta_steps {
            let theta = (t as f32 + 0.5) * d_theta;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let dir = tangent * (sin_theta * cos_phi)
                + bitangent * (sin_theta * sin_phi)
                + n * cos_theta;

            irradiance += env.radiance(dir) * (cos_theta * sin_theta);
        }
    }

    irradiance * (PI / (phi_steps * theta_steps) as f32)
}

/// Six square faces of linear RGB texels, row major.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMap {
    pub face_size: u32,
    pub faces: [Vec<Vec3>; 6],
}

impl CubeMap {
    /// Fill every texel from its direction. Texels of a face are computed in
    /// parallel.
    pub fn from_fn<F>(face_size: u32, f: F) -> Self
    where
        F: Fn(Vec3) -> Vec3 + Sync,
    {
        let face_size = face_size.clamp(1, MAX_FACE_SIZE);
        let faces = CubeFace::ALL.map(|face| {
            (0..face_size * face_size)
                .into_par_iter()
                .map(|idx| f(texel_direction(face, idx % face_size, idx / face_size, face_size)))
                .collect()
        });
        Self { face_size, faces }
    }

    pub fn face(&self, face: CubeFace) -> &[Vec3] {
        &self.faces[face.index()]
    }

    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> Vec3 {
        let x = x.min(self.face_size - 1);
        let y = y.min(self.face_size - 1);
        self.faces[face.index()][y as usize * self.face_size as usize + x as usize]
    }
}

/// Diffuse irradiance cube map.
pub fn bake_irradiance_cubemap(env: &impl Environment, face_size: u32) -> CubeMap {
    let start = Instant::now();
    let cube = CubeMap::from_fn(face_size, |n| convolve_irradiance(env, n));
    debug!(
        "baked {}px irradiance cubemap in {:?}",
        cube.face_size,
        start.elapsed()
    );
    cube
}

/// Specular prefiltered cube map chain. Mip `m` of `mip_count` holds
/// roughness `m / (mip_count - 1)` at half the size of the previous level.
pub fn bake_prefiltered_cubemap(
    env: &impl Environment,
    face_size: u32,
    mip_count: u32,
    sample_count: u32,
) -> Vec<CubeMap> {
    let mip_count = mip_count.max(1);
    let start = Instant::now();

    let levels = (0..mip_count)
        .map(|mip| {
            let roughness = mip_roughness(mip, mip_count);
            let size = (face_size >> mip).max(1);
            CubeMap::from_fn(size, |n| prefilter_environment(env, n, roughness, sample_count))
        })
        .collect();

    debug!(
        "baked {}px prefiltered cubemap ({} mips, {} samples) in {:?}",
        face_size,
        mip_count,
        sample_count,
        start.elapsed()
    );
    levels
}

/// Perceptual roughness stored in a prefiltered mip level.
pub fn mip_roughness(mip: u32, mip_count: u32) -> f32 {
    if mip_count <= 1 {
        0.0
    } else {
        (mip.min(mip_count - 1)) as f32 / (mip_count - 1) as f32
    }
}
