//! LZ4 block compression and the page storage heuristic

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Compressed page size over total texture size above which a page is stored raw
pub const COMPRESSION_THRESHOLD: f32 = 0.8;

/// Largest output one byte of an LZ4 block can expand to
const MAX_EXPANSION: usize = 255;

/// Compression applied to an asset payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    /// Payload stored as-is
    None,
    /// LZ4 block compression, no size prefix
    #[default]
    Lz4,
}

/// Compresses a buffer into a raw LZ4 block
pub fn compress(source: &[u8]) -> Result<Vec<u8>> {
    let mut destination = vec![0u8; lz4_flex::block::get_maximum_output_size(source.len())];

    let written = lz4_flex::block::compress_into(source, &mut destination)
        .map_err(|e| Error::CompressionFailed(e.to_string()))?;
    if written == 0 && !source.is_empty() {
        return Err(Error::CompressionFailed(format!(
            "compressor produced no output for {} bytes",
            source.len()
        )));
    }

    destination.truncate(written);
    Ok(destination)
}

/// Decompresses a raw LZ4 block into a buffer of exactly the original length
pub fn decompress_into(source: &[u8], destination: &mut [u8]) -> Result<()> {
    let written = lz4_flex::block::decompress_into(source, destination)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;
    if written != destination.len() {
        return Err(Error::DecompressionFailed(format!(
            "expected {} bytes, decompressed {}",
            destination.len(),
            written
        )));
    }
    Ok(())
}

/// Upper bound on what an LZ4 block of `compressed_len` bytes can decode to
pub fn max_decompressed_size(compressed_len: usize) -> usize {
    compressed_len.saturating_mul(MAX_EXPANSION)
}

/// Rejects a declared size that `available` payload bytes cannot produce
pub fn check_decompressed_size(declared: u64, available: usize) -> Result<usize> {
    match usize::try_from(declared) {
        Ok(size) if size <= max_decompressed_size(available) => Ok(size),
        _ => Err(Error::ImpossibleSize {
            declared,
            available,
        }),
    }
}

/// Decompresses a raw LZ4 block whose original length is known to the caller
pub fn decompress(source: &[u8], original_len: usize) -> Result<Vec<u8>> {
    check_decompressed_size(original_len as u64, source.len())?;
    let mut destination = vec![0u8; original_len];
    decompress_into(source, &mut destination)?;
    Ok(destination)
}

/// Compresses one texture page, falling back to the raw bytes when the
/// compressed form is not small enough.
///
/// The ratio is taken against `texture_size`, the size of the whole texture,
/// not against the page itself. Small pages therefore almost always stay
/// compressed. Callers detect a raw page by `compressed_size == original_size`,
/// so an LZ4 block exactly as long as its page is replaced by the page itself.
// TODO: re-derive the threshold against the page's own size once existing
// asset files can be regenerated.
pub fn compress_page(page: &[u8], texture_size: u64) -> Result<Vec<u8>> {
    let compressed = compress(page)?;

    let compression_rate = compressed.len() as f32 / texture_size as f32;
    if compression_rate > COMPRESSION_THRESHOLD {
        log::debug!(
            "page of {} bytes compressed to {} ({:.2} of texture), storing raw",
            page.len(),
            compressed.len(),
            compression_rate
        );
        return Ok(page.to_vec());
    }
    if compressed.len() == page.len() {
        return Ok(page.to_vec());
    }

    Ok(compressed)
}

#[cfg(test)]
pub(crate) fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

/// Searches for a page that LZ4 encodes to exactly its own length: eight
/// literals, one 4-byte match, twelve trailing literals.
#[cfg(test)]
pub(crate) fn equal_length_page() -> Vec<u8> {
    for seed in 0..1000 {
        let mut page = noise(24, seed);
        page.copy_within(0..4, 8);
        if compress(&page).unwrap().len() == page.len() {
            return page;
        }
    }
    panic!("no 24-byte page encodes to 24 bytes");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        let data: Vec<u8> = (0..4096).map(|i| (i % 7) as u8).collect();

        let compressed = compress(&data).unwrap();
        assert!(compressed.len() < data.len());

        let decompressed = decompress(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn test_decompress_wrong_length_fails() {
        let data = vec![9u8; 256];
        let compressed = compress(&data).unwrap();

        assert!(matches!(
            decompress(&compressed, 128),
            Err(Error::DecompressionFailed(_))
        ));
        assert!(matches!(
            decompress(&compressed, 512),
            Err(Error::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_decompress_garbage_fails() {
        let garbage = [0xffu8; 16];
        assert!(decompress(&garbage, 64).is_err());
    }

    #[test]
    fn test_incompressible_page_is_stored_raw() {
        let page = noise(1024, 7);

        let stored = compress_page(&page, page.len() as u64).unwrap();
        assert_eq!(stored, page);
    }

    #[test]
    fn test_ratio_uses_texture_size() {
        // Incompressible on its own, but small relative to the whole texture
        let page = noise(64, 3);

        let stored = compress_page(&page, 64 * 1024).unwrap();
        assert_ne!(stored, page);
        assert_eq!(decompress(&stored, page.len()).unwrap(), page);
    }

    #[test]
    fn test_equal_length_block_is_stored_raw() {
        let page = equal_length_page();
        assert_eq!(compress(&page).unwrap().len(), page.len());

        let stored = compress_page(&page, 1 << 20).unwrap();
        assert_eq!(stored, page);
    }

    #[test]
    fn test_impossible_sizes_are_rejected() {
        let compressed = compress(&[0u8; 64]).unwrap();

        assert!(matches!(
            decompress(&compressed, 1 << 40),
            Err(Error::ImpossibleSize { .. })
        ));
        assert!(matches!(
            check_decompressed_size(u64::MAX, 16),
            Err(Error::ImpossibleSize { declared: u64::MAX, available: 16 })
        ));
        assert_eq!(check_decompressed_size(64, compressed.len()).unwrap(), 64);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(serde_json::to_string(&CompressionMode::Lz4).unwrap(), "\"lz4\"");
        assert_eq!(serde_json::to_string(&CompressionMode::None).unwrap(), "\"none\"");
        assert!(serde_json::from_str::<CompressionMode>("\"zstd\"").is_err());
    }
}
