//! KASS Core Library
//!
//! This library provides the versioned binary container format and the asset
//! codecs (texture, mesh, material, prefab) for KASS asset files.

pub mod asset;
pub mod compression;
pub mod container;
pub mod material;
pub mod mesh;
pub mod prefab;
pub mod texture;
pub mod types;

pub use asset::{Asset, AssetCodec, AssetKind};
pub use compression::CompressionMode;
pub use container::{AssetFile, CURRENT_VERSION};
pub use material::{MaterialAsset, TransparencyMode};
pub use mesh::{Bounds, MeshAsset, Vertex, VertexFormat};
pub use prefab::{NodeMesh, PrefabAsset};
pub use texture::{Page, TextureAsset, TextureFormat};

/// Result type for kass-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kass-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Incompatible version found, expected version {expected} but got version {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Metadata is not valid UTF-8")]
    InvalidMetadataText(#[from] std::string::FromUtf8Error),

    #[error("Failed to parse metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Expected a {expected:?} asset, found type tag {found:?}")]
    UnexpectedAssetType { expected: AssetKind, found: [u8; 4] },

    #[error("Unknown asset type tag {0:?}")]
    UnknownAssetType([u8; 4]),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Page {index} out of range, texture has {count} pages")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Payload truncated: needed {needed} bytes, found {available}")]
    TruncatedPayload { needed: usize, available: usize },

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Declared size of {declared} bytes cannot come from a {available} byte payload")]
    ImpossibleSize { declared: u64, available: usize },
}
