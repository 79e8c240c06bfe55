//! Image to texture conversion

use crate::mipmap::build_mip_chain;
use crate::{Error, Result};
use image::{DynamicImage, ImageReader};
use kass_core::{AssetFile, CompressionMode, TextureAsset};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Decodes an image file and packs its mip chain into a texture container
pub fn compress_image(path: &Path, compression: CompressionMode) -> Result<AssetFile> {
    let image = open_image(path)?;
    let (_, file) = compress_decoded(&image, &path.to_string_lossy(), compression)?;
    Ok(file)
}

/// Packs an already decoded image, returning the texture record and container
pub fn compress_decoded(
    image: &DynamicImage,
    original_file: &str,
    compression: CompressionMode,
) -> Result<(TextureAsset, AssetFile)> {
    let chain = build_mip_chain(image);
    log::debug!(
        "{}: {}x{} {:?}, {} mip levels",
        original_file,
        image.width(),
        image.height(),
        chain.format(),
        chain.len()
    );

    let mut texture = TextureAsset {
        texture_format: chain.format(),
        compression_mode: compression,
        texture_size: 0,
        original_file: original_file.to_string(),
        pages: chain.pages()?,
    };

    let pixels = chain.into_bytes();
    texture.texture_size = pixels.len() as u64;

    let file = texture.pack(&pixels)?;
    Ok((texture, file))
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    let unreadable = |message: String| Error::SourceUnreadable {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|e| unreadable(e.to_string()))?
        .decode()
        .map_err(|e| unreadable(e.to_string()))
}
