//! KASS container format serialization and deserialization

use crate::{AssetKind, Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

/// Current KASS container version
pub const CURRENT_VERSION: u32 = 1;

/// Generic asset container shared by every asset type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Four character code naming the codec ("TEXI", "MESH", ...)
    pub type_tag: [u8; 4],
    /// Format version
    pub version: u32,
    /// JSON metadata document
    pub metadata: String,
    /// Codec specific binary payload
    pub payload: Vec<u8>,
}

impl AssetFile {
    /// Creates a new container stamped with the current version
    pub fn new(type_tag: [u8; 4], metadata: String, payload: Vec<u8>) -> Self {
        Self {
            type_tag,
            version: CURRENT_VERSION,
            metadata,
            payload,
        }
    }

    /// Size of the tag, version, metadata and payload in bytes
    pub fn size(&self) -> usize {
        let mut size = 0;
        size += self.type_tag.len();
        size += std::mem::size_of::<u32>();
        size += self.metadata.len();
        size += self.payload.len();
        size
    }

    /// Returns the asset kind named by the type tag, if it is a known one
    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_tag(self.type_tag)
    }

    /// Writes the container to a writer
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.type_tag)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        write_buffer(writer, self.metadata.as_bytes())?;
        write_buffer(writer, &self.payload)?;
        Ok(())
    }

    /// Reads a container from a reader
    pub fn load<R: Read>(reader: &mut R) -> Result<Self> {
        let mut type_tag = [0u8; 4];
        reader.read_exact(&mut type_tag)?;

        let version = reader.read_u32::<LittleEndian>()?;
        if version != CURRENT_VERSION {
            return Err(Error::VersionMismatch {
                expected: CURRENT_VERSION,
                found: version,
            });
        }

        let metadata = String::from_utf8(read_buffer(reader)?)?;
        let payload = read_buffer(reader)?;

        Ok(Self {
            type_tag,
            version,
            metadata,
            payload,
        })
    }

    /// Serializes the container into a freshly allocated buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        // Two u64 length prefixes on top of size()
        let mut buffer = Vec::with_capacity(self.size() + 16);
        self.save(&mut buffer)?;
        Ok(buffer)
    }

    /// Parses a container from an in-memory buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(&mut Cursor::new(bytes))
    }
}

fn write_buffer<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_u64::<LittleEndian>(bytes.len() as u64)?;
    writer.write_all(bytes)?;
    Ok(())
}

fn read_buffer<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = reader.read_u64::<LittleEndian>()?;

    // Read through `take` so a corrupt length cannot force a huge allocation
    let mut buffer = Vec::new();
    reader.take(len).read_to_end(&mut buffer)?;
    if buffer.len() as u64 != len {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream ended after {}", len, buffer.len()),
        )));
    }

    Ok(buffer)
}
