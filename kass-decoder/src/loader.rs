//! Loading containers from disk into decoded asset records

use crate::{Error, Result};
use kass_core::{
    Asset, AssetCodec, AssetFile, AssetKind, MaterialAsset, MeshAsset, PrefabAsset, TextureAsset,
    Vertex,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Texture record with its full mip chain decompressed
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub asset: TextureAsset,
    /// Every page back to back, largest first
    pub pixels: Vec<u8>,
}

impl DecodedTexture {
    /// Pixel bytes of one page
    pub fn page(&self, index: usize) -> Option<&[u8]> {
        let page = self.asset.pages.get(index)?;
        let offset: usize = self.asset.pages[..index]
            .iter()
            .map(|p| p.original_size as usize)
            .sum();
        self.pixels.get(offset..offset + page.original_size as usize)
    }
}

/// Mesh record with its vertex and index buffers split apart
#[derive(Debug, Clone)]
pub struct DecodedMesh {
    pub asset: MeshAsset,
    pub vertex_bytes: Vec<u8>,
    pub index_bytes: Vec<u8>,
}

impl DecodedMesh {
    /// Copies the vertex buffer out as typed vertices
    pub fn vertices(&self) -> Vec<Vertex> {
        bytemuck::pod_collect_to_vec(&self.vertex_bytes)
    }

    /// Reads the index buffer according to the recorded index width
    pub fn indices(&self) -> Vec<u32> {
        match self.asset.index_size {
            1 => self.index_bytes.iter().map(|&i| i as u32).collect(),
            2 => bytemuck::pod_collect_to_vec::<u8, u16>(&self.index_bytes)
                .into_iter()
                .map(u32::from)
                .collect(),
            _ => bytemuck::pod_collect_to_vec(&self.index_bytes),
        }
    }
}

/// A fully decoded asset, ready for a viewer
#[derive(Debug, Clone)]
pub enum DecodedAsset {
    Texture(DecodedTexture),
    Mesh(DecodedMesh),
    Material(MaterialAsset),
    Prefab(PrefabAsset),
}

impl DecodedAsset {
    pub fn kind(&self) -> AssetKind {
        match self {
            DecodedAsset::Texture(_) => AssetKind::Texture,
            DecodedAsset::Mesh(_) => AssetKind::Mesh,
            DecodedAsset::Material(_) => AssetKind::Material,
            DecodedAsset::Prefab(_) => AssetKind::Prefab,
        }
    }
}

/// Reads the raw container from a file
pub fn load_asset_file(path: &Path) -> Result<AssetFile> {
    let mut reader = BufReader::new(File::open(path)?);
    Ok(AssetFile::load(&mut reader)?)
}

/// Decodes a container, unpacking texture and mesh payloads
pub fn decode(file: &AssetFile) -> Result<DecodedAsset> {
    Ok(match Asset::read(file)? {
        Asset::Texture(asset) => {
            let pixels = asset.unpack(&file.payload)?;
            DecodedAsset::Texture(DecodedTexture { asset, pixels })
        }
        Asset::Mesh(asset) => {
            let (vertex_bytes, index_bytes) = asset.unpack(&file.payload)?;
            DecodedAsset::Mesh(DecodedMesh {
                asset,
                vertex_bytes,
                index_bytes,
            })
        }
        Asset::Material(material) => DecodedAsset::Material(material),
        Asset::Prefab(prefab) => DecodedAsset::Prefab(prefab),
    })
}

/// Loads and decodes an asset file
pub fn load(path: &Path) -> Result<DecodedAsset> {
    let file = load_asset_file(path)?;
    let asset = decode(&file)?;
    log::debug!("loaded {:?} asset from {}", asset.kind(), path.display());
    Ok(asset)
}

/// Loads a single mip level of a texture file without unpacking the others
pub fn load_texture_page(path: &Path, page_index: usize) -> Result<(TextureAsset, Vec<u8>)> {
    let file = load_asset_file(path)?;
    if let Some(found) = file.kind().filter(|kind| *kind != AssetKind::Texture) {
        return Err(Error::UnexpectedAsset {
            expected: AssetKind::Texture,
            found,
        });
    }

    let texture = TextureAsset::read(&file)?;
    let pixels = texture.unpack_page(page_index, &file.payload)?;
    Ok((texture, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kass_core::{CompressionMode, Page, TextureFormat, TransparencyMode};
    use std::io::BufWriter;

    fn save(file: &AssetFile, path: &Path) {
        let mut writer = BufWriter::new(File::create(path).unwrap());
        file.save(&mut writer).unwrap();
    }

    fn sample_texture() -> (TextureAsset, AssetFile, Vec<u8>) {
        let pixels: Vec<u8> = (0..(4 * 4 + 2 * 2 + 1) * 4).map(|i| (i % 13) as u8).collect();
        let mut texture = TextureAsset {
            texture_format: TextureFormat::RgbaUint8,
            compression_mode: CompressionMode::Lz4,
            texture_size: pixels.len() as u64,
            original_file: "grid.png".to_string(),
            pages: vec![Page::new(4, 4, 64), Page::new(2, 2, 16), Page::new(1, 1, 4)],
        };
        let file = texture.pack(&pixels).unwrap();
        (texture, file, pixels)
    }

    #[test]
    fn test_load_texture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.kass");
        let (texture, file, pixels) = sample_texture();
        save(&file, &path);

        let DecodedAsset::Texture(decoded) = load(&path).unwrap() else {
            panic!("expected a texture");
        };
        assert_eq!(decoded.asset, texture);
        assert_eq!(decoded.pixels, pixels);
        assert_eq!(decoded.page(1).unwrap(), &pixels[64..80]);
        assert_eq!(decoded.page(3), None);

        let (_, page) = load_texture_page(&path, 2).unwrap();
        assert_eq!(page, &pixels[80..]);
    }

    #[test]
    fn test_decode_mesh() {
        let vertices = vec![
            Vertex::at([0.0, 0.0, 0.0]),
            Vertex::at([1.0, 0.0, 0.0]),
            Vertex::at([0.0, 1.0, 0.0]),
        ];
        let indices = vec![0u32, 1, 2];
        let (mesh, vertex_data, index_data) = MeshAsset::from_geometry(&vertices, &indices, "tri");
        let file = mesh.pack(&vertex_data, &index_data).unwrap();

        let DecodedAsset::Mesh(decoded) = decode(&file).unwrap() else {
            panic!("expected a mesh");
        };
        assert_eq!(decoded.vertices(), vertices);
        assert_eq!(decoded.indices(), indices);
        assert_eq!(decoded.asset.bounds, mesh.bounds);
    }

    #[test]
    fn test_decode_material() {
        let material = MaterialAsset {
            base_effect: "glass".to_string(),
            transparency: TransparencyMode::Transparent,
            ..Default::default()
        };
        let decoded = decode(&material.pack().unwrap()).unwrap();
        assert_eq!(decoded.kind(), AssetKind::Material);
    }

    #[test]
    fn test_page_load_rejects_other_assets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("material.kass");
        save(&MaterialAsset::default().pack().unwrap(), &path);

        assert!(matches!(
            load_texture_page(&path, 0),
            Err(Error::UnexpectedAsset {
                expected: AssetKind::Texture,
                found: AssetKind::Material
            })
        ));
    }

    #[test]
    fn test_version_gate_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.kass");
        let (_, mut file, _) = sample_texture();
        file.version = 0;
        save(&file, &path);

        assert!(matches!(
            load(&path),
            Err(Error::Core(kass_core::Error::VersionMismatch { found: 0, .. }))
        ));
    }
}
