//! Fully parsed XBF document.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;
use xbf_common::BinaryReader;

use crate::header::FormatLayout;
use crate::stream::NodeStream;
use crate::tree::{NamespaceDeclaration, XamlObject};
use crate::{Result, XbfHeader, XbfTables};

/// Parsed XBF document.
///
/// Holds the header, the six metadata tables and the reconstructed object
/// tree. The document is immutable once parsed; the dumper only borrows it.
#[derive(Debug, Clone)]
pub struct XbfDocument {
    header: XbfHeader,
    tables: XbfTables,
    root: XamlObject,
    namespaces: Vec<NamespaceDeclaration>,
}

impl XbfDocument {
    /// Check if data is an XBF file by checking the magic bytes.
    pub fn is_xbf(data: &[u8]) -> bool {
        XbfHeader::is_xbf(data)
    }

    /// Parse an XBF file from disk.
    ///
    /// The file is memory-mapped for the duration of the parse only; the
    /// returned document owns all of its data.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file)? };

        debug!(path = %path.display(), size = mmap.len(), "opened XBF file");
        Self::parse(&mmap)
    }

    /// Parse an XBF file from bytes.
    ///
    /// Any failure aborts the whole parse; no partial document is returned.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header = XbfHeader::read(&mut reader)?;

        match header.layout()? {
            FormatLayout::V1 => Self::parse_v1(reader, header),
        }
    }

    fn parse_v1(mut reader: BinaryReader<'_>, header: XbfHeader) -> Result<Self> {
        let tables = XbfTables::read(&mut reader, &header)?;

        let node_size = header.node_size as usize;
        reader.limit(node_size);
        let NodeStream { root, namespaces } = NodeStream::read(&mut reader)?;

        Ok(Self {
            header,
            tables,
            root,
            namespaces,
        })
    }

    /// The file header.
    pub fn header(&self) -> &XbfHeader {
        &self.header
    }

    /// The metadata tables.
    pub fn tables(&self) -> &XbfTables {
        &self.tables
    }

    /// The root object of the tree.
    pub fn root(&self) -> &XamlObject {
        &self.root
    }

    /// Namespace declarations in stream order.
    pub fn namespaces(&self) -> &[NamespaceDeclaration] {
        &self.namespaces
    }
}
