//! Conversion of texture pages back into images

use crate::{Error, Result};
use image::{DynamicImage, Rgba32FImage, RgbaImage};
use kass_core::TextureFormat;

/// Wraps the raw bytes of one page in an image of the matching pixel type
pub fn page_to_image(
    format: TextureFormat,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
) -> Result<DynamicImage> {
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if bytes.len() != expected {
        return Err(Error::InvalidPage(format!(
            "{}x{} {:?} page needs {} bytes, got {}",
            width,
            height,
            format,
            expected,
            bytes.len()
        )));
    }

    let image = match format {
        TextureFormat::RgbaUint8 => RgbaImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8),
        TextureFormat::RgbaFloat32 => {
            let channels: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
            Rgba32FImage::from_raw(width, height, channels).map(DynamicImage::ImageRgba32F)
        }
        TextureFormat::Unknown => None,
    };

    image.ok_or_else(|| Error::InvalidPage(format!("unsupported texture format {:?}", format)))
}
