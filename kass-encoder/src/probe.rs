//! Source file detection

use image::ImageReader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What kind of source a file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Nothing the converter knows how to handle
    Unrecognized,
    /// Raster image understood by the image decoder
    Image,
    /// GLTF scene; recognised but not converted
    Gltf,
}

/// Determines the kind of a source file.
///
/// Images are recognised from their content, not their extension; GLTF
/// scenes are recognised by the `.gltf` extension.
pub fn detect(path: &Path) -> SourceKind {
    let is_gltf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gltf"));
    if is_gltf {
        return SourceKind::Gltf;
    }

    if is_valid_image(path) {
        SourceKind::Image
    } else {
        SourceKind::Unrecognized
    }
}

/// Returns true if the file content starts with a known image signature
pub fn is_valid_image(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };

    ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map(|reader| reader.format().is_some())
        .unwrap_or(false)
}
