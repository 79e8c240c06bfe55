//! Prefab codec: an id-keyed scene graph plus a flat transform table

use crate::asset::{check_tag, AssetCodec, AssetKind};
use crate::types::Mat4;
use crate::{AssetFile, Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Size of one serialized transform in bytes
pub const MATRIX_STRIDE: usize = std::mem::size_of::<Mat4>();

/// Mesh and material referenced by a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMesh {
    pub mesh_path: String,
    pub material_path: String,
}

/// Scene graph of named, parented nodes.
///
/// Nodes are referenced by id only; parents are assumed to form a forest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefabAsset {
    /// Node id to index into `matrices`
    pub node_matrices: HashMap<u64, u32>,
    pub node_names: HashMap<u64, String>,
    /// Node id to parent id; root nodes have no entry
    pub node_parents: HashMap<u64, u64>,
    pub node_meshes: HashMap<u64, NodeMesh>,
    pub matrices: Vec<Mat4>,
}

#[derive(Serialize, Deserialize)]
struct PrefabMetadata {
    node_matrices: Vec<(u64, u32)>,
    node_names: Vec<(u64, String)>,
    node_parents: Vec<(u64, u64)>,
    node_meshes: Vec<(u64, NodeMesh)>,
}

impl PrefabAsset {
    /// Builds the container; transforms go uncompressed into the payload
    pub fn pack(&self) -> Result<AssetFile> {
        let metadata = PrefabMetadata {
            node_matrices: sorted_pairs(&self.node_matrices),
            node_names: sorted_pairs(&self.node_names),
            node_parents: sorted_pairs(&self.node_parents),
            node_meshes: sorted_pairs(&self.node_meshes),
        };

        let mut payload = Vec::with_capacity(self.matrices.len() * MATRIX_STRIDE);
        for matrix in &self.matrices {
            for value in matrix {
                payload.write_f32::<LittleEndian>(*value)?;
            }
        }

        Ok(AssetFile::new(
            Self::KIND.type_tag(),
            serde_json::to_string(&metadata)?,
            payload,
        ))
    }

    /// Ids of nodes without a parent, in ascending order
    pub fn roots(&self) -> Vec<u64> {
        let mut roots: Vec<u64> = self
            .node_ids()
            .into_iter()
            .filter(|id| !self.node_parents.contains_key(id))
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Ids of the direct children of `parent`, in ascending order
    pub fn children(&self, parent: u64) -> Vec<u64> {
        let mut children: Vec<u64> = self
            .node_parents
            .iter()
            .filter(|(_, p)| **p == parent)
            .map(|(id, _)| *id)
            .collect();
        children.sort_unstable();
        children
    }

    /// Local transform of a node, if it has a valid matrix index
    pub fn node_transform(&self, id: u64) -> Option<&Mat4> {
        let index = *self.node_matrices.get(&id)?;
        self.matrices.get(index as usize)
    }

    fn node_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .node_matrices
            .keys()
            .chain(self.node_names.keys())
            .chain(self.node_parents.keys())
            .chain(self.node_meshes.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl AssetCodec for PrefabAsset {
    const KIND: AssetKind = AssetKind::Prefab;

    fn read(file: &AssetFile) -> Result<Self> {
        check_tag(file, Self::KIND)?;
        let metadata: PrefabMetadata = serde_json::from_str(&file.metadata)?;

        if file.payload.len() % MATRIX_STRIDE != 0 {
            return Err(Error::BufferSizeMismatch {
                expected: file.payload.len() / MATRIX_STRIDE * MATRIX_STRIDE,
                actual: file.payload.len(),
            });
        }

        let num_matrices = file.payload.len() / MATRIX_STRIDE;
        let mut matrices = vec![[0.0f32; 16]; num_matrices];
        let mut reader = file.payload.as_slice();
        for matrix in &mut matrices {
            reader.read_f32_into::<LittleEndian>(matrix)?;
        }

        Ok(Self {
            node_matrices: metadata.node_matrices.into_iter().collect(),
            node_names: metadata.node_names.into_iter().collect(),
            node_parents: metadata.node_parents.into_iter().collect(),
            node_meshes: metadata.node_meshes.into_iter().collect(),
            matrices,
        })
    }
}

fn sorted_pairs<V: Clone>(map: &HashMap<u64, V>) -> Vec<(u64, V)> {
    let mut pairs: Vec<(u64, V)> = map.iter().map(|(k, v)| (*k, v.clone())).collect();
    pairs.sort_unstable_by_key(|(k, _)| *k);
    pairs
}
