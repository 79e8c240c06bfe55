//! Mesh codec: vertex and index buffers compressed as one unit

use crate::asset::{check_tag, AssetCodec, AssetKind};
use crate::compression::{self, CompressionMode};
use crate::types::{Vec2, Vec3};
use crate::{AssetFile, Error, Result};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Layout of the vertex buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexFormat {
    #[default]
    Unknown,
    /// Position, normal, colour, uv, tangent, bitangent as 32-bit floats
    F32Pncvtb,
}

/// Vertex layout for `VertexFormat::F32Pncvtb`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub colour: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    /// Creates a vertex at `position` with every other attribute zeroed
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Axis aligned box and bounding sphere sharing one origin
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub origin: Vec3,
    pub radius: f32,
    /// Half widths of the box along each axis
    pub extents: Vec3,
}

impl Bounds {
    fn to_array(self) -> [f32; 7] {
        let [ox, oy, oz] = self.origin;
        let [ex, ey, ez] = self.extents;
        [ox, oy, oz, self.radius, ex, ey, ez]
    }

    fn from_array(data: [f32; 7]) -> Self {
        Self {
            origin: [data[0], data[1], data[2]],
            radius: data[3],
            extents: [data[4], data[5], data[6]],
        }
    }
}

/// Mesh asset metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshAsset {
    pub vertex_buffer_size: u64,
    pub index_buffer_size: u64,
    pub bounds: Bounds,
    pub vertex_format: VertexFormat,
    /// Size of one index in bytes
    pub index_size: u8,
    pub compression_mode: CompressionMode,
    pub original_file: String,
}

#[derive(Serialize, Deserialize)]
struct MeshMetadata {
    vertex_format: VertexFormat,
    vertex_buffer_size: u64,
    index_buffer_size: u64,
    index_size: u8,
    original_file: String,
    compression: CompressionMode,
    /// origin xyz, radius, extents xyz
    bounds: [f32; 7],
}

impl MeshAsset {
    /// Builds a mesh record and its raw buffers from typed geometry
    pub fn from_geometry(
        vertices: &[Vertex],
        indices: &[u32],
        original_file: impl Into<String>,
    ) -> (Self, Vec<u8>, Vec<u8>) {
        let vertex_data = bytemuck::cast_slice::<Vertex, u8>(vertices).to_vec();
        let index_data = bytemuck::cast_slice::<u32, u8>(indices).to_vec();

        let mesh = Self {
            vertex_buffer_size: vertex_data.len() as u64,
            index_buffer_size: index_data.len() as u64,
            bounds: Self::calculate_bounds(vertices),
            vertex_format: VertexFormat::F32Pncvtb,
            index_size: std::mem::size_of::<u32>() as u8,
            compression_mode: CompressionMode::Lz4,
            original_file: original_file.into(),
        };

        (mesh, vertex_data, index_data)
    }

    /// Merges vertex and index bytes and compresses them into a container
    pub fn pack(&self, vertex_data: &[u8], index_data: &[u8]) -> Result<AssetFile> {
        check_len(vertex_data, self.vertex_buffer_size)?;
        check_len(index_data, self.index_buffer_size)?;

        let mut merged_buffer = Vec::with_capacity(vertex_data.len() + index_data.len());
        merged_buffer.extend_from_slice(vertex_data);
        merged_buffer.extend_from_slice(index_data);

        let payload = match self.compression_mode {
            CompressionMode::Lz4 => compression::compress(&merged_buffer)?,
            CompressionMode::None => merged_buffer,
        };

        let metadata = MeshMetadata {
            vertex_format: self.vertex_format,
            vertex_buffer_size: self.vertex_buffer_size,
            index_buffer_size: self.index_buffer_size,
            index_size: self.index_size,
            original_file: self.original_file.clone(),
            compression: self.compression_mode,
            bounds: self.bounds.to_array(),
        };

        Ok(AssetFile::new(
            Self::KIND.type_tag(),
            serde_json::to_string(&metadata)?,
            payload,
        ))
    }

    /// Decompresses the payload and splits it into vertex and index bytes
    pub fn unpack(&self, source_buffer: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let impossible = || Error::ImpossibleSize {
            declared: self.vertex_buffer_size.saturating_add(self.index_buffer_size),
            available: source_buffer.len(),
        };
        let full_size = self
            .vertex_buffer_size
            .checked_add(self.index_buffer_size)
            .ok_or_else(impossible)?;

        let mut merged_buffer = match self.compression_mode {
            CompressionMode::Lz4 => {
                let full_size = compression::check_decompressed_size(full_size, source_buffer.len())?;
                compression::decompress(source_buffer, full_size)?
            }
            CompressionMode::None => {
                check_len(source_buffer, full_size)?;
                source_buffer.to_vec()
            }
        };

        let vertex_size = usize::try_from(self.vertex_buffer_size).map_err(|_| impossible())?;
        let index_buffer = merged_buffer.split_off(vertex_size);
        Ok((merged_buffer, index_buffer))
    }

    /// Computes an axis aligned box over the vertex positions and a sphere
    /// around its centre that contains every vertex.
    pub fn calculate_bounds(vertices: &[Vertex]) -> Bounds {
        if vertices.is_empty() {
            return Bounds::default();
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v.position[axis]);
                max[axis] = max[axis].max(v.position[axis]);
            }
        }

        let mut bounds = Bounds::default();
        for axis in 0..3 {
            bounds.extents[axis] = (max[axis] - min[axis]) / 2.0;
            bounds.origin[axis] = bounds.extents[axis] + min[axis];
        }

        let r2 = vertices
            .iter()
            .map(|v| {
                (0..3)
                    .map(|axis| {
                        let offset = v.position[axis] - bounds.origin[axis];
                        offset * offset
                    })
                    .sum::<f32>()
            })
            .fold(0.0f32, f32::max);
        bounds.radius = r2.sqrt();

        bounds
    }
}

impl AssetCodec for MeshAsset {
    const KIND: AssetKind = AssetKind::Mesh;

    fn read(file: &AssetFile) -> Result<Self> {
        check_tag(file, Self::KIND)?;
        let metadata: MeshMetadata = serde_json::from_str(&file.metadata)?;

        Ok(Self {
            vertex_buffer_size: metadata.vertex_buffer_size,
            index_buffer_size: metadata.index_buffer_size,
            bounds: Bounds::from_array(metadata.bounds),
            vertex_format: metadata.vertex_format,
            index_size: metadata.index_size,
            compression_mode: metadata.compression,
            original_file: metadata.original_file,
        })
    }
}

fn check_len(buffer: &[u8], expected: u64) -> Result<()> {
    if buffer.len() as u64 != expected {
        return Err(Error::BufferSizeMismatch {
            expected: usize::try_from(expected).unwrap_or(usize::MAX),
            actual: buffer.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Vertex>, Vec<u32>) {
        let vertices = vec![
            Vertex::at([-1.0, -1.0, 0.0]),
            Vertex::at([1.0, -1.0, 0.0]),
            Vertex::at([1.0, 1.0, 0.0]),
            Vertex::at([-1.0, 1.0, 0.0]),
        ];
        (vertices, vec![0, 1, 2, 2, 3, 0])
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 17 * 4);
    }

    #[test]
    fn test_mesh_roundtrip() {
        let (vertices, indices) = quad();
        let (mesh, vertex_data, index_data) =
            MeshAsset::from_geometry(&vertices, &indices, "models/quad.obj");

        let file = mesh.pack(&vertex_data, &index_data).unwrap();
        assert_eq!(&file.type_tag, b"MESH");

        let bytes = file.to_bytes().unwrap();
        let loaded = AssetFile::from_bytes(&bytes).unwrap();
        let read_mesh = MeshAsset::read(&loaded).unwrap();
        assert_eq!(mesh, read_mesh);

        let (read_vertices, read_indices) = read_mesh.unpack(&loaded.payload).unwrap();
        assert_eq!(read_vertices, vertex_data);
        assert_eq!(read_indices, index_data);
        assert_eq!(bytemuck::pod_collect_to_vec::<u8, u32>(&read_indices), indices);
    }

    #[test]
    fn test_split_arbitrary_buffers() {
        let cases: [(Vec<u8>, Vec<u8>); 3] = [
            (vec![1], vec![2]),
            (vec![7; 300], (0..=255).collect()),
            (b"vertex bytes".to_vec(), vec![0, 0, 0, 1, 0, 0, 0, 2]),
        ];

        for mode in [CompressionMode::Lz4, CompressionMode::None] {
            for (v, i) in &cases {
                let mesh = MeshAsset {
                    vertex_buffer_size: v.len() as u64,
                    index_buffer_size: i.len() as u64,
                    compression_mode: mode,
                    ..Default::default()
                };

                let file = mesh.pack(v, i).unwrap();
                let (vertex_bytes, index_bytes) = mesh.unpack(&file.payload).unwrap();
                assert_eq!(&vertex_bytes, v);
                assert_eq!(&index_bytes, i);
            }
        }
    }

    #[test]
    fn test_pack_rejects_wrong_sizes() {
        let mesh = MeshAsset {
            vertex_buffer_size: 8,
            index_buffer_size: 4,
            ..Default::default()
        };
        assert!(matches!(
            mesh.pack(&[0; 6], &[0; 4]),
            Err(Error::BufferSizeMismatch { expected: 8, actual: 6 })
        ));
    }

    #[test]
    fn test_hostile_sizes_are_rejected() {
        let (vertices, indices) = quad();
        let (mesh, vertex_data, index_data) = MeshAsset::from_geometry(&vertices, &indices, "q");
        let file = mesh.pack(&vertex_data, &index_data).unwrap();

        for (vertex_buffer_size, index_buffer_size) in [(u64::MAX, 1), (1 << 40, 0), (0, 1 << 40)] {
            for compression_mode in [CompressionMode::Lz4, CompressionMode::None] {
                let hostile = MeshAsset {
                    vertex_buffer_size,
                    index_buffer_size,
                    compression_mode,
                    ..mesh.clone()
                };
                assert!(hostile.unpack(&file.payload).is_err());
            }
        }

        let overflow = MeshAsset {
            vertex_buffer_size: u64::MAX,
            index_buffer_size: 1,
            ..mesh.clone()
        };
        assert!(matches!(
            overflow.unpack(&file.payload),
            Err(Error::ImpossibleSize { declared: u64::MAX, .. })
        ));

        let huge = MeshAsset {
            vertex_buffer_size: 1 << 40,
            ..mesh
        };
        assert!(matches!(
            huge.unpack(&file.payload),
            Err(Error::ImpossibleSize { .. })
        ));
    }

    #[test]
    fn test_bounds_single_vertex_at_origin() {
        let bounds = MeshAsset::calculate_bounds(&[Vertex::at([0.0, 0.0, 0.0])]);
        assert_eq!(bounds.origin, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.radius, 0.0);
        assert_eq!(bounds.extents, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bounds_two_vertices() {
        let bounds = MeshAsset::calculate_bounds(&[
            Vertex::at([-1.0, 0.0, 0.0]),
            Vertex::at([1.0, 0.0, 0.0]),
        ]);
        assert_eq!(bounds.origin, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.radius, 1.0);
        assert_eq!(bounds.extents, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bounds_negative_only_positions() {
        let bounds = MeshAsset::calculate_bounds(&[
            Vertex::at([-4.0, -2.0, -6.0]),
            Vertex::at([-2.0, -2.0, -2.0]),
        ]);
        assert_eq!(bounds.origin, [-3.0, -2.0, -4.0]);
        assert_eq!(bounds.extents, [1.0, 0.0, 2.0]);
        assert!((bounds.radius - 5.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_contains_every_vertex() {
        let (vertices, _) = quad();
        let bounds = MeshAsset::calculate_bounds(&vertices);

        for v in &vertices {
            let d: f32 = (0..3)
                .map(|a| (v.position[a] - bounds.origin[a]).powi(2))
                .sum::<f32>()
                .sqrt();
            assert!(d <= bounds.radius + 1e-6);
        }
        assert!((bounds.radius - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_metadata_layout() {
        let (vertices, indices) = quad();
        let (mesh, vertex_data, index_data) = MeshAsset::from_geometry(&vertices, &indices, "q");
        let file = mesh.pack(&vertex_data, &index_data).unwrap();

        let json: serde_json::Value = serde_json::from_str(&file.metadata).unwrap();
        assert_eq!(json["bounds"].as_array().unwrap().len(), 7);
        assert_eq!(json["vertex_format"], "f32_pncvtb");
        assert_eq!(json["compression"], "lz4");
        assert_eq!(json["index_size"], 4);
    }
}
