//! Material codec (metadata only)

use crate::asset::{check_tag, AssetCodec, AssetKind};
use crate::{AssetFile, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a material is blended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransparencyMode {
    #[default]
    Opaque,
    Transparent,
}

/// Material asset: a base effect plus named texture slots and properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialAsset {
    pub base_effect: String,
    /// Texture slot name to texture asset path
    #[serde(default)]
    pub textures: HashMap<String, String>,
    #[serde(default)]
    pub custom_properties: HashMap<String, String>,
    #[serde(default)]
    pub transparency: TransparencyMode,
}

impl MaterialAsset {
    /// Builds the container; materials carry no payload
    pub fn pack(&self) -> Result<AssetFile> {
        let metadata = serde_json::to_string(self)?;
        Ok(AssetFile::new(Self::KIND.type_tag(), metadata, Vec::new()))
    }
}

impl AssetCodec for MaterialAsset {
    const KIND: AssetKind = AssetKind::Material;

    fn read(file: &AssetFile) -> Result<Self> {
        check_tag(file, Self::KIND)?;
        Ok(serde_json::from_str(&file.metadata)?)
    }
}
