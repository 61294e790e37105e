//! Physically based shading terms and image based lighting precomputation.
//!
//! The analytic BRDF lives in [`brdf`] and is composed per material in
//! [`shading`]. The precompute side ([`sampling`], [`lut`], [`cubemap`])
//! bakes the split-sum lookup table and prefiltered environment maps the
//! ambient term reads from.

pub mod brdf;
pub mod color;
pub mod config;
pub mod cubemap;
mod error;
pub mod frame;
pub mod lobe;
pub mod lut;
pub mod material;
pub mod sampling;
pub mod shading;

pub use config::{IblConfig, PrefilterConfig};
pub use cubemap::{CubeFace, CubeMap, Environment, EquirectEnvironment, UniformEnvironment};
pub use error::{Error, Result};
pub use frame::ShadingFrame;
pub use lobe::{DiffuseModel, SpecularLobe, VisibilityMode};
pub use lut::{BrdfLut, LutConfig, LutEntry};
pub use material::Material;
pub use shading::{AmbientLight, ShadedColor, evaluate_brdf, shade, shade_ambient, shade_direct};
