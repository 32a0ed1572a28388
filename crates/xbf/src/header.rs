//! XBF file header.

use tracing::debug;
use xbf_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::tables::TableKind;
use crate::{Error, Result};

/// XBF file header.
///
/// The header sits at the very start of the file and is followed by the six
/// metadata tables and then the node stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct XbfHeader {
    /// Magic bytes, `XBF\0`.
    pub magic: [u8; 4],
    /// Byte length of the six metadata tables.
    pub metadata_size: u32,
    /// Byte length of the node stream.
    pub node_size: u32,
    /// Major file version.
    pub major_version: u32,
    /// Minor file version.
    pub minor_version: u32,
    /// Offset of the string table, relative to the end of the header.
    pub string_table_offset: u64,
    /// Offset of the assembly table, relative to the end of the header.
    pub assembly_table_offset: u64,
    /// Offset of the type namespace table, relative to the end of the header.
    pub type_namespace_table_offset: u64,
    /// Offset of the type table, relative to the end of the header.
    pub type_table_offset: u64,
    /// Offset of the property table, relative to the end of the header.
    pub property_table_offset: u64,
    /// Offset of the XML namespace table, relative to the end of the header.
    pub xml_namespace_table_offset: u64,
    /// Content hash of the source markup.
    pub hash: [u8; 32],
}

/// Table and node layout selected by the major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatLayout {
    /// Tables followed by a tagged line-info node stream.
    V1,
}

impl XbfHeader {
    /// The magic bytes at the start of an XBF file.
    pub const MAGIC: &'static [u8; 4] = b"XBF\0";

    /// Size of the serialized header.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Check if data starts with the XBF magic.
    ///
    /// All four bytes must match, including the trailing NUL.
    pub fn is_xbf(data: &[u8]) -> bool {
        data.len() >= Self::MAGIC.len() && &data[..Self::MAGIC.len()] == Self::MAGIC
    }

    /// Read and validate the header at the reader's position.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let header: Self = reader.read_struct()?;
        if header.magic != *Self::MAGIC {
            return Err(Error::InvalidHeader {
                actual: header.magic,
            });
        }

        let (major, minor) = header.version();
        let (metadata_size, node_size) = (header.metadata_size, header.node_size);
        debug!(major, minor, metadata_size, node_size, "read XBF header");

        Ok(header)
    }

    /// Major and minor file version.
    pub fn version(&self) -> (u32, u32) {
        (self.major_version, self.minor_version)
    }

    /// Layout used by the rest of the file.
    ///
    /// Major version 2 and above use a different table and node encoding that
    /// this reader does not implement.
    pub fn layout(&self) -> Result<FormatLayout> {
        let (major, minor) = self.version();
        match major {
            0 | 1 => Ok(FormatLayout::V1),
            _ => Err(Error::UnsupportedVersion { major, minor }),
        }
    }

    /// Declared table offsets, in file order.
    pub fn table_offsets(&self) -> [(TableKind, u64); 6] {
        [
            (TableKind::String, self.string_table_offset),
            (TableKind::Assembly, self.assembly_table_offset),
            (TableKind::TypeNamespace, self.type_namespace_table_offset),
            (TableKind::Type, self.type_table_offset),
            (TableKind::Property, self.property_table_offset),
            (TableKind::XmlNamespace, self.xml_namespace_table_offset),
        ]
    }

    /// Hash as a lowercase hex string.
    pub fn hash_hex(&self) -> String {
        let hash = self.hash;
        hash.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Re-encode the header to its on-disk bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}
