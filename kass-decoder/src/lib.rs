//! KASS Decoder Library
//!
//! This library loads KASS asset files and hands back fully decoded records:
//! texture pixels, mesh buffers, materials and prefab graphs.

pub mod loader;
pub mod page_image;

pub use loader::{
    decode, load, load_asset_file, load_texture_page, DecodedAsset, DecodedMesh, DecodedTexture,
};
pub use page_image::page_to_image;

use kass_core::AssetKind;

/// Result type for kass-decoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kass-decoder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("KASS core error: {0}")]
    Core(#[from] kass_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Expected a {expected:?} asset, found {found:?}")]
    UnexpectedAsset { expected: AssetKind, found: AssetKind },

    #[error("Invalid page: {0}")]
    InvalidPage(String),
}
