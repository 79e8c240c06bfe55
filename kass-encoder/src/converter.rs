//! Per-file conversion and parallel batch driver

use crate::image_converter::compress_image;
use crate::probe::{self, SourceKind};
use crate::progress_tracker::ProgressTracker;
use crate::{ConverterConfig, Result, OUTPUT_EXTENSION};
use kass_core::AssetFile;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Result of converting one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// A container was written to the given path
    Written(PathBuf),
    /// The source was left alone
    Skipped(SourceKind),
}

/// Summary of a batch conversion
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    /// Sources that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

/// Converts source files into KASS asset files
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Creates a new converter with the given configuration
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Where the container for `source` is written
    pub fn output_path_for(&self, source: &Path) -> PathBuf {
        let directory = match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        // Only the last extension is replaced: "brick.albedo.png" -> "brick.albedo.kass"
        let mut file_name = source.file_stem().unwrap_or(source.as_os_str()).to_os_string();
        file_name.push(".");
        file_name.push(OUTPUT_EXTENSION);
        directory.join(file_name)
    }

    /// Converts one source file according to its detected kind
    pub fn convert_file(&self, path: &Path) -> Result<ConversionOutcome> {
        match probe::detect(path) {
            SourceKind::Image => {
                let file = compress_image(path, self.config.compression)?;
                let output = self.output_path_for(path);
                self.write_asset(&file, &output)?;

                log::info!("{} -> {}", path.display(), output.display());
                Ok(ConversionOutcome::Written(output))
            }
            SourceKind::Gltf => {
                log::warn!("{}: GLTF conversion is not supported, skipping", path.display());
                Ok(ConversionOutcome::Skipped(SourceKind::Gltf))
            }
            SourceKind::Unrecognized => {
                log::debug!("{}: unrecognized source, skipping", path.display());
                Ok(ConversionOutcome::Skipped(SourceKind::Unrecognized))
            }
        }
    }

    /// Converts many files in parallel. A failing file is logged and recorded
    /// in the report; the rest of the batch still runs.
    pub fn convert_batch(&self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        if paths.is_empty() {
            return report;
        }

        let workers = self.config.jobs.clamp(1, paths.len());
        let tracker = ProgressTracker::new(paths.len() as u64, "Converted");
        let next = AtomicUsize::new(0);
        let (sender, receiver) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let (next, tracker) = (&next, &tracker);
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = paths.get(index) else {
                        break;
                    };

                    let result = self.convert_file(path);
                    tracker.record(result.is_ok(), 10);
                    if sender.send((path.clone(), result)).is_err() {
                        break;
                    }
                });
            }
        });
        drop(sender);

        for (path, result) in receiver {
            match result {
                Ok(ConversionOutcome::Written(output)) => report.written.push(output),
                Ok(ConversionOutcome::Skipped(_)) => report.skipped.push(path),
                Err(e) => {
                    log::error!("{}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        report
    }

    fn write_asset(&self, asset: &AssetFile, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::with_capacity(asset.size() + 16, File::create(output)?);
        asset.save(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use kass_core::{AssetCodec, CompressionMode, TextureAsset};

    fn config(output_dir: Option<PathBuf>) -> ConverterConfig {
        ConverterConfig {
            compression: CompressionMode::Lz4,
            output_dir,
            jobs: 2,
        }
    }

    fn write_png(path: &Path, size: u32) {
        RgbaImage::from_pixel(size, size, Rgba([200, 100, 50, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_output_path() {
        let converter = Converter::new(config(None));
        assert_eq!(
            converter.output_path_for(Path::new("art/brick.png")),
            PathBuf::from("art/brick.kass")
        );

        let converter = Converter::new(config(Some(PathBuf::from("out"))));
        assert_eq!(
            converter.output_path_for(Path::new("art/brick.albedo.png")),
            PathBuf::from("out/brick.albedo.kass")
        );
    }

    #[test]
    fn test_convert_image_next_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("stone.png");
        write_png(&source, 8);

        let converter = Converter::new(config(None));
        let outcome = converter.convert_file(&source).unwrap();
        let output = dir.path().join("stone.kass");
        assert_eq!(outcome, ConversionOutcome::Written(output.clone()));

        let mut reader = File::open(&output).unwrap();
        let file = AssetFile::load(&mut reader).unwrap();
        let texture = TextureAsset::read(&file).unwrap();
        assert_eq!(texture.pages.len(), 4);
        assert_eq!(texture.unpack_page(3, &file.payload).unwrap(), vec![200, 100, 50, 255]);
    }

    #[test]
    fn test_skips_gltf_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let gltf = dir.path().join("scene.gltf");
        let text = dir.path().join("readme.txt");
        std::fs::write(&gltf, "{}").unwrap();
        std::fs::write(&text, "hello").unwrap();

        let converter = Converter::new(config(None));
        assert_eq!(
            converter.convert_file(&gltf).unwrap(),
            ConversionOutcome::Skipped(SourceKind::Gltf)
        );
        assert_eq!(
            converter.convert_file(&text).unwrap(),
            ConversionOutcome::Skipped(SourceKind::Unrecognized)
        );
        assert!(!dir.path().join("scene.kass").exists());
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("converted");

        let good_a = dir.path().join("a.png");
        let good_b = dir.path().join("b.png");
        let broken = dir.path().join("broken.png");
        let text = dir.path().join("notes.txt");
        write_png(&good_a, 4);
        write_png(&good_b, 16);
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[7u8; 40]);
        std::fs::write(&broken, bytes).unwrap();
        std::fs::write(&text, "plain text").unwrap();

        let converter = Converter::new(config(Some(out.clone())));
        let report = converter.convert_batch(&[broken.clone(), good_a, text.clone(), good_b]);

        let mut written = report.written.clone();
        written.sort();
        assert_eq!(written, vec![out.join("a.kass"), out.join("b.kass")]);
        assert_eq!(report.skipped, vec![text]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, broken);
    }

    #[test]
    fn test_empty_batch() {
        let converter = Converter::new(config(None));
        let report = converter.convert_batch(&[]);
        assert!(report.written.is_empty() && report.failed.is_empty());
    }
}
