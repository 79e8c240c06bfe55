//! Mip chain generation

use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel, Rgba32FImage, RgbaImage};
use kass_core::{Page, TextureFormat};

/// Every mip level of an image, full resolution first
#[derive(Debug, Clone)]
pub enum MipChain {
    /// 8-bit RGBA levels
    Ldr(Vec<RgbaImage>),
    /// 32-bit float RGBA levels, for HDR sources
    Hdr(Vec<Rgba32FImage>),
}

impl MipChain {
    /// Texture format matching the level pixel type
    pub fn format(&self) -> TextureFormat {
        match self {
            MipChain::Ldr(_) => TextureFormat::RgbaUint8,
            MipChain::Hdr(_) => TextureFormat::RgbaFloat32,
        }
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        match self {
            MipChain::Ldr(levels) => levels.len(),
            MipChain::Hdr(levels) => levels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width and height of each level
    pub fn dimensions(&self) -> Vec<(u32, u32)> {
        match self {
            MipChain::Ldr(levels) => levels.iter().map(|l| l.dimensions()).collect(),
            MipChain::Hdr(levels) => levels.iter().map(|l| l.dimensions()).collect(),
        }
    }

    /// Page descriptors for the chain, compressed sizes not yet known
    pub fn pages(&self) -> Result<Vec<Page>> {
        let bytes_per_pixel = self.format().bytes_per_pixel() as u64;

        self.dimensions()
            .into_iter()
            .map(|(width, height)| {
                let size = width as u64 * height as u64 * bytes_per_pixel;
                let original_size =
                    u32::try_from(size).map_err(|_| Error::ImageTooLarge { width, height })?;
                Ok(Page::new(width, height, original_size))
            })
            .collect()
    }

    /// Concatenates the raw pixel bytes of every level
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            MipChain::Ldr(levels) => levels.into_iter().flat_map(|l| l.into_raw()).collect(),
            MipChain::Hdr(levels) => levels
                .iter()
                .flat_map(|l| bytemuck::cast_slice::<f32, u8>(l.as_raw()).iter().copied())
                .collect(),
        }
    }
}

/// Sizes of every mip level: halve both sides (floor, minimum 1) until 1x1
pub fn mip_dimensions(width: u32, height: u32) -> Vec<(u32, u32)> {
    let mut dimensions = vec![(width, height)];

    let (mut mip_w, mut mip_h) = (width, height);
    while mip_w > 1 || mip_h > 1 {
        mip_w = (mip_w / 2).max(1);
        mip_h = (mip_h / 2).max(1);
        dimensions.push((mip_w, mip_h));
    }

    dimensions
}

/// Builds the mip chain of an image; float images keep 32-bit channels
pub fn build_mip_chain(image: &DynamicImage) -> MipChain {
    if is_hdr(image) {
        MipChain::Hdr(build_levels(image.to_rgba32f()))
    } else {
        MipChain::Ldr(build_levels(image.to_rgba8()))
    }
}

/// Returns true for images decoded with floating point channels
pub fn is_hdr(image: &DynamicImage) -> bool {
    matches!(
        image,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    )
}

fn build_levels<P>(base: ImageBuffer<P, Vec<P::Subpixel>>) -> Vec<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let dimensions = mip_dimensions(base.width(), base.height());

    let mut levels = Vec::with_capacity(dimensions.len());
    levels.push(base);
    for &(width, height) in &dimensions[1..] {
        // Each level is resampled from the one above it
        let previous = &levels[levels.len() - 1];
        let next = imageops::resize(previous, width, height, FilterType::Triangle);
        levels.push(next);
    }

    levels
}
