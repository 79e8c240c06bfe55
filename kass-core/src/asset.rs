//! Asset kinds and dispatch on the container type tag

use crate::{AssetFile, Error, MaterialAsset, MeshAsset, PrefabAsset, Result, TextureAsset};

/// The asset types a container can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Mesh,
    Material,
    Prefab,
}

impl AssetKind {
    /// All known kinds
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Texture,
        AssetKind::Mesh,
        AssetKind::Material,
        AssetKind::Prefab,
    ];

    /// Four character code written at the start of the container
    pub const fn type_tag(self) -> [u8; 4] {
        match self {
            AssetKind::Texture => *b"TEXI",
            AssetKind::Mesh => *b"MESH",
            AssetKind::Material => *b"MATX",
            AssetKind::Prefab => *b"PRFB",
        }
    }

    /// Looks up the kind for a type tag
    pub fn from_tag(tag: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_tag() == tag)
    }
}

/// Decoding capability shared by every asset record
pub trait AssetCodec: Sized {
    /// Kind whose type tag this codec reads and writes
    const KIND: AssetKind;

    /// Decodes the record from a loaded container
    fn read(file: &AssetFile) -> Result<Self>;
}

pub(crate) fn check_tag(file: &AssetFile, expected: AssetKind) -> Result<()> {
    if file.type_tag != expected.type_tag() {
        return Err(Error::UnexpectedAssetType {
            expected,
            found: file.type_tag,
        });
    }
    Ok(())
}

/// Any decoded asset record, selected by the container type tag
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Texture(TextureAsset),
    Mesh(MeshAsset),
    Material(MaterialAsset),
    Prefab(PrefabAsset),
}

impl Asset {
    /// Decodes the record matching the container's type tag
    pub fn read(file: &AssetFile) -> Result<Self> {
        let kind = file.kind().ok_or(Error::UnknownAssetType(file.type_tag))?;

        Ok(match kind {
            AssetKind::Texture => Asset::Texture(TextureAsset::read(file)?),
            AssetKind::Mesh => Asset::Mesh(MeshAsset::read(file)?),
            AssetKind::Material => Asset::Material(MaterialAsset::read(file)?),
            AssetKind::Prefab => Asset::Prefab(PrefabAsset::read(file)?),
        })
    }

    /// Returns the kind of the record
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Texture(_) => AssetKind::Texture,
            Asset::Mesh(_) => AssetKind::Mesh,
            Asset::Material(_) => AssetKind::Material,
            Asset::Prefab(_) => AssetKind::Prefab,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::from_tag(kind.type_tag()), Some(kind));
        }
        assert_eq!(AssetKind::from_tag(*b"texi"), None);
    }

    #[test]
    fn test_dispatch_by_tag() {
        let material = MaterialAsset {
            base_effect: "pbr".to_string(),
            ..Default::default()
        };
        let file = material.pack().unwrap();

        let asset = Asset::read(&file).unwrap();
        assert_eq!(asset.kind(), AssetKind::Material);
        assert_eq!(asset, Asset::Material(material));
    }

    #[test]
    fn test_unknown_tag() {
        let file = AssetFile::new(*b"SNDX", "{}".to_string(), Vec::new());
        assert!(matches!(
            Asset::read(&file),
            Err(Error::UnknownAssetType(tag)) if &tag == b"SNDX"
        ));
    }
}
