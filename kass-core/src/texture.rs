//! Texture codec: mip pages compressed independently for random access

use crate::asset::{check_tag, AssetCodec, AssetKind};
use crate::compression::{self, CompressionMode};
use crate::{AssetFile, Error, Result};
use serde::{Deserialize, Serialize};

/// Pixel layout of a texture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    #[default]
    Unknown,
    /// RGBA, one unsigned byte per channel
    RgbaUint8,
    /// RGBA, one 32-bit float per channel
    RgbaFloat32,
}

impl TextureFormat {
    /// Returns the size of one pixel in bytes
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Unknown => 0,
            TextureFormat::RgbaUint8 => 4,
            TextureFormat::RgbaFloat32 => 16,
        }
    }
}

/// One mip level of a texture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub width: u32,
    pub height: u32,
    /// Bytes occupied in the payload; equal to `original_size` when stored raw
    pub compressed_size: u32,
    pub original_size: u32,
}

impl Page {
    /// Creates a page descriptor for a mip level that has not been packed yet
    pub fn new(width: u32, height: u32, original_size: u32) -> Self {
        Self {
            width,
            height,
            compressed_size: 0,
            original_size,
        }
    }

    /// Returns true if the page bytes were kept uncompressed
    pub fn is_stored_raw(&self) -> bool {
        self.compressed_size == self.original_size
    }
}

/// Texture asset made of an ordered mip chain, largest page first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureAsset {
    #[serde(rename = "format")]
    pub texture_format: TextureFormat,
    #[serde(rename = "compression")]
    pub compression_mode: CompressionMode,
    /// Total uncompressed size of all pages
    #[serde(rename = "buffer_size")]
    pub texture_size: u64,
    pub original_file: String,
    pub pages: Vec<Page>,
}

impl TextureAsset {
    /// Sum of the uncompressed sizes of every page
    pub fn total_original_size(&self) -> usize {
        self.pages.iter().map(|p| p.original_size as usize).sum()
    }

    /// Byte offset of a page inside the packed payload
    pub fn page_offset(&self, page_index: usize) -> Result<usize> {
        if page_index >= self.pages.len() {
            return Err(Error::PageOutOfRange {
                index: page_index,
                count: self.pages.len(),
            });
        }

        Ok(self.pages[..page_index]
            .iter()
            .map(|p| p.compressed_size as usize)
            .sum())
    }

    /// Compresses every page of `pixel_data` and builds the container.
    ///
    /// Pages must already carry their dimensions and original sizes; their
    /// compressed sizes are filled in here.
    pub fn pack(&mut self, pixel_data: &[u8]) -> Result<AssetFile> {
        let expected = self.total_original_size();
        if pixel_data.len() < expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: pixel_data.len(),
            });
        }

        let mut payload = Vec::with_capacity(expected);
        let mut cursor = 0usize;
        for page in &mut self.pages {
            let original_size = page.original_size as usize;
            let pixels = &pixel_data[cursor..cursor + original_size];

            let page_buffer = match self.compression_mode {
                CompressionMode::Lz4 => compression::compress_page(pixels, self.texture_size)?,
                CompressionMode::None => pixels.to_vec(),
            };

            page.compressed_size = page_buffer.len() as u32;
            payload.extend_from_slice(&page_buffer);

            cursor += original_size;
        }

        let metadata = serde_json::to_string(&*self)?;
        Ok(AssetFile::new(Self::KIND.type_tag(), metadata, payload))
    }

    /// Decompresses the whole mip chain into one contiguous buffer
    pub fn unpack(&self, source_buffer: &[u8]) -> Result<Vec<u8>> {
        let total = self.pages.iter().map(|p| p.original_size as u64).sum::<u64>();
        let total = compression::check_decompressed_size(total, source_buffer.len())?;
        let mut destination = vec![0u8; total];

        let mut source = 0usize;
        let mut dest = 0usize;
        for page in &self.pages {
            let compressed_size = page.compressed_size as usize;
            let original_size = page.original_size as usize;

            let input = payload_slice(source_buffer, source, compressed_size)?;
            self.decode_page(page, input, &mut destination[dest..dest + original_size])?;

            source += compressed_size;
            dest += original_size;
        }

        Ok(destination)
    }

    /// Decompresses a single page without touching the rest of the chain
    pub fn unpack_page(&self, page_index: usize, source_buffer: &[u8]) -> Result<Vec<u8>> {
        let offset = self.page_offset(page_index)?;
        let page = &self.pages[page_index];

        let input = payload_slice(source_buffer, offset, page.compressed_size as usize)?;
        let size = compression::check_decompressed_size(page.original_size as u64, input.len())?;
        let mut destination = vec![0u8; size];
        self.decode_page(page, input, &mut destination)?;

        Ok(destination)
    }

    fn decode_page(&self, page: &Page, input: &[u8], output: &mut [u8]) -> Result<()> {
        if self.compression_mode == CompressionMode::Lz4 && !page.is_stored_raw() {
            compression::decompress_into(input, output)
        } else if input.len() == output.len() {
            output.copy_from_slice(input);
            Ok(())
        } else {
            Err(Error::BufferSizeMismatch {
                expected: output.len(),
                actual: input.len(),
            })
        }
    }
}

impl AssetCodec for TextureAsset {
    const KIND: AssetKind = AssetKind::Texture;

    fn read(file: &AssetFile) -> Result<Self> {
        check_tag(file, Self::KIND)?;
        Ok(serde_json::from_str(&file.metadata)?)
    }
}

fn payload_slice(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(Error::TruncatedPayload {
            needed: offset.saturating_add(len),
            available: buffer.len(),
        })
}
