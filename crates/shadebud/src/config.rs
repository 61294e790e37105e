//! Bake settings. Every field has a default so partial JSON files work.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cubemap::MAX_FACE_SIZE;
use crate::lut::LutConfig;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefilterConfig {
    /// Edge length of mip 0, in texels.
    pub face_size: u32,
    pub mip_count: u32,
    pub sample_count: u32,
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            face_size: 128,
            mip_count: 6,
            sample_count: 512,
        }
    }
}

impl PrefilterConfig {
    /// Sizes are clamped into [1, `MAX_FACE_SIZE`], and the mip chain never
    /// goes below a 1x1 face.
    pub fn sanitized(&self) -> Self {
        let face_size = self.face_size.clamp(1, MAX_FACE_SIZE);
        let max_mips = u32::BITS - face_size.leading_zeros();
        Self {
            face_size,
            mip_count: self.mip_count.clamp(1, max_mips),
            sample_count: self.sample_count.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IblConfig {
    pub lut: LutConfig,
    pub prefilter: PrefilterConfig,
    pub irradiance_face_size: u32,
}

impl Default for IblConfig {
    fn default() -> Self {
        Self {
            lut: LutConfig::default(),
            prefilter: PrefilterConfig::default(),
            irradiance_face_size: 32,
        }
    }
}

impl IblConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: IblConfig = serde_json::from_str(&data)?;
        debug!("loaded ibl config from {}: {:?}", path.display(), config);
        Ok(config.sanitized())
    }

    pub fn sanitized(&self) -> Self {
        Self {
            lut: self.lut.sanitized(),
            prefilter: self.prefilter.sanitized(),
            irradiance_face_size: self.irradiance_face_size.clamp(1, MAX_FACE_SIZE),
        }
    }
}
