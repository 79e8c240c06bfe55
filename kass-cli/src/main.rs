//! KASS CLI Tool
//!
//! Command-line interface for converting source art into KASS asset files
//! and inspecting the results.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kass_core::{Asset, AssetFile, CompressionMode};
use kass_decoder::{load_asset_file, load_texture_page, page_to_image};
use kass_encoder::{Converter, ConverterConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kass")]
#[command(about = "KASS - a travelling konverter for asset files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert files or folders of source assets into KASS files
    Convert {
        /// Files or folders containing assets; folders are scanned recursively
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory (default: next to each source file)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Compression applied to texture pages
        #[arg(long, value_enum, default_value = "lz4")]
        compression: Compression,

        /// Number of files converted in parallel (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show information about a KASS file
    Info {
        /// Input KASS file path
        input: PathBuf,
    },

    /// Extract one mip level of a texture as an image
    Extract {
        /// Input KASS texture file
        input: PathBuf,

        /// Output image path; the format follows the extension
        #[arg(short, long)]
        output: PathBuf,

        /// Mip level to extract (0 = full resolution)
        #[arg(long, default_value = "0")]
        page: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lz4,
}

impl From<Compression> for CompressionMode {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => CompressionMode::None,
            Compression::Lz4 => CompressionMode::Lz4,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            files,
            out,
            compression,
            jobs,
        } => convert(files, out, compression.into(), jobs)?,

        Commands::Info { input } => info(&input)?,

        Commands::Extract {
            input,
            output,
            page,
        } => extract(&input, &output, page)?,
    }

    Ok(())
}

fn convert(
    files: Vec<PathBuf>,
    out: Option<PathBuf>,
    compression: CompressionMode,
    jobs: Option<usize>,
) -> Result<()> {
    let mut inputs = Vec::new();
    for path in &files {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
        collect_files(path, &mut inputs)
            .with_context(|| format!("Failed to scan {}", path.display()))?;
    }

    let mut config = ConverterConfig {
        compression,
        output_dir: out,
        ..Default::default()
    };
    if let Some(jobs) = jobs {
        config.jobs = jobs;
    }

    println!("Converting {} files with {} workers", inputs.len(), config.jobs.max(1));
    let converter = Converter::new(config);
    let report = converter.convert_batch(&inputs);

    println!(
        "Written: {}, skipped: {}, failed: {}",
        report.written.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (path, error) in &report.failed {
        println!("  error: {}: {}", path.display(), error);
    }

    Ok(())
}

/// Appends `path` if it is a file, or every file below it if it is a directory
fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !path.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    for entry in entries {
        collect_files(&entry, files)?;
    }
    Ok(())
}

fn info(input: &Path) -> Result<()> {
    let file = load_asset_file(input).context("Failed to read KASS file")?;
    print_info(&file).context("Failed to decode asset metadata")
}

fn print_info(file: &AssetFile) -> Result<()> {
    println!("\n=== KASS File Information ===");
    println!("Type: {}", String::from_utf8_lossy(&file.type_tag));
    println!("Version: {}", file.version);
    println!("Metadata: {} bytes", file.metadata.len());
    println!(
        "Payload: {} bytes ({:.2} KB)",
        file.payload.len(),
        file.payload.len() as f64 / 1024.0
    );

    match Asset::read(file)? {
        Asset::Texture(texture) => {
            println!("\n=== Texture ===");
            println!("Source: {}", texture.original_file);
            println!("Format: {:?}", texture.texture_format);
            println!("Compression: {:?}", texture.compression_mode);
            println!("Original size: {} bytes", texture.texture_size);
            for (i, page) in texture.pages.iter().enumerate() {
                println!(
                    "  Page {}: {}x{}, {} -> {} bytes{}",
                    i,
                    page.width,
                    page.height,
                    page.original_size,
                    page.compressed_size,
                    if page.is_stored_raw() { " (raw)" } else { "" }
                );
            }
        }
        Asset::Mesh(mesh) => {
            println!("\n=== Mesh ===");
            println!("Source: {}", mesh.original_file);
            println!("Vertex format: {:?}", mesh.vertex_format);
            println!("Vertex buffer: {} bytes", mesh.vertex_buffer_size);
            println!(
                "Index buffer: {} bytes ({}-byte indices)",
                mesh.index_buffer_size, mesh.index_size
            );
            println!("Compression: {:?}", mesh.compression_mode);
            println!(
                "Bounds: origin {:?}, radius {}, extents {:?}",
                mesh.bounds.origin, mesh.bounds.radius, mesh.bounds.extents
            );
        }
        Asset::Material(material) => {
            println!("\n=== Material ===");
            println!("Base effect: {}", material.base_effect);
            println!("Transparency: {:?}", material.transparency);
            let mut textures: Vec<_> = material.textures.iter().collect();
            textures.sort();
            for (slot, path) in textures {
                println!("  Texture {}: {}", slot, path);
            }
            let mut properties: Vec<_> = material.custom_properties.iter().collect();
            properties.sort();
            for (name, value) in properties {
                println!("  Property {} = {}", name, value);
            }
        }
        Asset::Prefab(prefab) => {
            println!("\n=== Prefab ===");
            println!("Nodes: {}", prefab.node_names.len());
            println!("Matrices: {}", prefab.matrices.len());
            for root in prefab.roots() {
                print_node(&prefab, root, 1);
            }
        }
    }

    Ok(())
}

fn print_node(prefab: &kass_core::PrefabAsset, id: u64, depth: usize) {
    let name = prefab.node_names.get(&id).map(String::as_str).unwrap_or("<unnamed>");
    let mesh = prefab
        .node_meshes
        .get(&id)
        .map(|m| format!(" mesh={} material={}", m.mesh_path, m.material_path))
        .unwrap_or_default();
    println!("{}[{}] {}{}", "  ".repeat(depth), id, name, mesh);

    for child in prefab.children(id) {
        print_node(prefab, child, depth + 1);
    }
}

fn extract(input: &Path, output: &Path, page_index: usize) -> Result<()> {
    let (texture, pixels) =
        load_texture_page(input, page_index).context("Failed to load texture page")?;
    let page = texture.pages[page_index];

    let image = page_to_image(texture.texture_format, page.width, page.height, pixels)?;
    let image = match output.extension().and_then(|e| e.to_str()) {
        // Float formats keep their channels, everything else is saved as 8-bit
        Some(ext) if ext.eq_ignore_ascii_case("exr") => image,
        _ => image::DynamicImage::ImageRgba8(image.to_rgba8()),
    };

    image.save(output).context("Failed to save image")?;
    println!(
        "Saved page {} ({}x{}) to {}",
        page_index,
        page.width,
        page.height,
        output.display()
    );

    Ok(())
}
