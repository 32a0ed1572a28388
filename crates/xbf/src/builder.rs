//! Builder for constructing XBF documents.
//!
//! This module writes version 1 XBF files: the header, the six metadata
//! tables and a node stream. It computes table offsets and section sizes so
//! the output reads back through [`crate::XbfDocument::parse`].

use std::collections::HashMap;

use xbf_common::WriteExt;

use crate::ids::{AssemblyId, PropertyId, StringId, TypeId, TypeNamespaceId, XmlNamespaceId};
use crate::node::Node;
use crate::tables::{
    AssemblyKind, AssemblyRecord, PropertyRecord, TypeNamespaceRecord, TypeRecord,
    XmlNamespaceRecord,
};
use crate::value::Value;
use crate::{Error, Result, XbfHeader};

/// A piece of the node stream being built.
#[derive(Debug, Clone)]
enum StreamChunk {
    Node(Node),
    /// Bytes written verbatim, for streams no valid node sequence can express.
    Raw(Vec<u8>),
}

/// Builder for constructing XBF documents.
///
/// # Example
///
/// ```
/// use xbf::builder::XbfBuilder;
/// use xbf::{AssemblyKind, Value, XbfDocument};
///
/// let mut builder = XbfBuilder::new();
/// let assembly = builder.add_assembly(AssemblyKind::Native, "Windows.UI.Xaml");
/// let namespace = builder.add_type_namespace(assembly, "Windows.UI.Xaml.Controls");
/// let grid = builder.add_type(namespace, "Grid");
/// let margin = builder.add_property(grid, "Margin");
///
/// builder
///     .start_object(grid)
///     .start_property(margin)
///     .value(Value::Signed(4))
///     .end_property()
///     .end_object();
///
/// let bytes = builder.build().unwrap();
/// let document = XbfDocument::parse(&bytes).unwrap();
/// assert_eq!(document.tables().type_name(document.root().type_id).unwrap(), "Grid");
/// ```
#[derive(Debug, Clone)]
pub struct XbfBuilder {
    major_version: u32,
    minor_version: u32,
    hash: [u8; 32],
    strings: Vec<String>,
    string_ids: HashMap<String, StringId>,
    assemblies: Vec<AssemblyRecord>,
    type_namespaces: Vec<TypeNamespaceRecord>,
    types: Vec<TypeRecord>,
    properties: Vec<PropertyRecord>,
    xml_namespaces: Vec<XmlNamespaceRecord>,
    stream: Vec<StreamChunk>,
}

impl Default for XbfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XbfBuilder {
    /// Create an empty version 1.0 builder.
    pub fn new() -> Self {
        Self {
            major_version: 1,
            minor_version: 0,
            hash: [0; 32],
            strings: Vec::new(),
            string_ids: HashMap::new(),
            assemblies: Vec::new(),
            type_namespaces: Vec::new(),
            types: Vec::new(),
            properties: Vec::new(),
            xml_namespaces: Vec::new(),
            stream: Vec::new(),
        }
    }

    /// Set the file version written to the header.
    pub fn version(&mut self, major: u32, minor: u32) -> &mut Self {
        self.major_version = major;
        self.minor_version = minor;
        self
    }

    /// Set the content hash written to the header.
    pub fn hash(&mut self, hash: [u8; 32]) -> &mut Self {
        self.hash = hash;
        self
    }

    /// Add a string to the table if not already present.
    pub fn add_string(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.string_ids.get(s) {
            return id;
        }
        let id = StringId::new(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.string_ids.insert(s.to_string(), id);
        id
    }

    /// Add an assembly by name.
    pub fn add_assembly(&mut self, kind: AssemblyKind, name: &str) -> AssemblyId {
        let string_id = self.add_string(name);
        let id = AssemblyId::new(self.assemblies.len() as u32);
        self.assemblies.push(AssemblyRecord {
            kind: kind.to_u32(),
            string_id,
        });
        id
    }

    /// Add a type namespace by name.
    pub fn add_type_namespace(&mut self, assembly: AssemblyId, name: &str) -> TypeNamespaceId {
        let string_id = self.add_string(name);
        self.add_type_namespace_record(assembly, string_id)
    }

    /// Add a type namespace record with raw references.
    pub fn add_type_namespace_record(
        &mut self,
        assembly_id: AssemblyId,
        string_id: StringId,
    ) -> TypeNamespaceId {
        let id = TypeNamespaceId::new(self.type_namespaces.len() as u32);
        self.type_namespaces.push(TypeNamespaceRecord {
            assembly_id,
            string_id,
        });
        id
    }

    /// Add a type by name.
    pub fn add_type(&mut self, namespace: TypeNamespaceId, name: &str) -> TypeId {
        let string_id = self.add_string(name);
        self.add_type_record(0, namespace, string_id)
    }

    /// Add a type record with raw references.
    pub fn add_type_record(
        &mut self,
        flags: u32,
        type_namespace_id: TypeNamespaceId,
        string_id: StringId,
    ) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(TypeRecord {
            flags,
            type_namespace_id,
            string_id,
        });
        id
    }

    /// Add a property declared on `owner`.
    pub fn add_property(&mut self, owner: TypeId, name: &str) -> PropertyId {
        let string_id = self.add_string(name);
        self.add_property_record(0, owner, string_id)
    }

    /// Add a property record with raw references.
    pub fn add_property_record(&mut self, flags: u32, type_id: TypeId, string_id: StringId) -> PropertyId {
        let id = PropertyId::new(self.properties.len() as u32);
        self.properties.push(PropertyRecord {
            flags,
            type_id,
            string_id,
        });
        id
    }

    /// Add an XML namespace by URI.
    pub fn add_xml_namespace(&mut self, uri: &str) -> XmlNamespaceId {
        let string_id = self.add_string(uri);
        let id = XmlNamespaceId::new(self.xml_namespaces.len() as u32);
        self.xml_namespaces.push(XmlNamespaceRecord { string_id });
        id
    }

    /// Append a node to the stream.
    pub fn node(&mut self, node: Node) -> &mut Self {
        self.stream.push(StreamChunk::Node(node));
        self
    }

    /// Append raw bytes to the stream.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.stream.push(StreamChunk::Raw(bytes.to_vec()));
        self
    }

    pub fn start_object(&mut self, type_id: TypeId) -> &mut Self {
        self.node(Node::StartObject { type_id, flags: 0 })
    }

    pub fn end_object(&mut self) -> &mut Self {
        self.node(Node::EndObject)
    }

    pub fn start_property(&mut self, property_id: PropertyId) -> &mut Self {
        self.node(Node::StartProperty {
            property_id,
            flags: 0,
        })
    }

    pub fn end_property(&mut self) -> &mut Self {
        self.node(Node::EndProperty)
    }

    pub fn value(&mut self, value: Value) -> &mut Self {
        self.node(Node::Value(value))
    }

    /// Append a text node, interning `text` into the string table.
    pub fn text(&mut self, text: &str) -> &mut Self {
        let string_id = self.add_string(text);
        self.node(Node::Text {
            string_id,
            flags: 0,
        })
    }

    /// Append a namespace declaration for a namespace added with [`Self::add_xml_namespace`].
    pub fn namespace(&mut self, namespace_id: XmlNamespaceId, uri: &str) -> &mut Self {
        self.node(Node::Namespace {
            namespace_id,
            flags: 0,
            uri: uri.to_string(),
        })
    }

    pub fn line_info(&mut self, line_delta: i16, position_delta: i16) -> &mut Self {
        self.node(Node::LineInfo {
            line_delta,
            position_delta,
        })
    }

    pub fn line_info_absolute(&mut self, line: u32, position: u32) -> &mut Self {
        self.node(Node::LineInfoAbsolute { line, position })
    }

    pub fn end_of_stream(&mut self) -> &mut Self {
        self.node(Node::EndOfStream)
    }

    /// Build the XBF binary representation.
    ///
    /// Fails with [`Error::TooLarge`] when a table count or section size does
    /// not fit in 32 bits, which also covers IDs handed out past that range.
    pub fn build(&self) -> Result<Vec<u8>> {
        // Step 1: Write the six tables, remembering where each one starts
        let mut metadata = Vec::new();
        let mut offsets = [0u64; 6];

        offsets[0] = metadata.len() as u64;
        metadata.write_u32_le(encoded_len(self.strings.len(), "string table")?)?;
        for s in &self.strings {
            metadata.write_prefixed_utf16(s)?;
        }

        offsets[1] = metadata.len() as u64;
        write_records(&mut metadata, &self.assemblies, "assembly table")?;
        offsets[2] = metadata.len() as u64;
        write_records(&mut metadata, &self.type_namespaces, "type namespace table")?;
        offsets[3] = metadata.len() as u64;
        write_records(&mut metadata, &self.types, "type table")?;
        offsets[4] = metadata.len() as u64;
        write_records(&mut metadata, &self.properties, "property table")?;
        offsets[5] = metadata.len() as u64;
        write_records(&mut metadata, &self.xml_namespaces, "XML namespace table")?;

        // Step 2: Encode the node stream
        let mut nodes = Vec::new();
        for chunk in &self.stream {
            match chunk {
                StreamChunk::Node(node) => node.write_to(&mut nodes)?,
                StreamChunk::Raw(bytes) => nodes.extend_from_slice(bytes),
            }
        }

        // Step 3: Build header
        let header = XbfHeader {
            magic: *XbfHeader::MAGIC,
            metadata_size: encoded_len(metadata.len(), "metadata")?,
            node_size: encoded_len(nodes.len(), "node stream")?,
            major_version: self.major_version,
            minor_version: self.minor_version,
            string_table_offset: offsets[0],
            assembly_table_offset: offsets[1],
            type_namespace_table_offset: offsets[2],
            type_table_offset: offsets[3],
            property_table_offset: offsets[4],
            xml_namespace_table_offset: offsets[5],
            hash: self.hash,
        };

        // Step 4: Write everything
        let mut output = Vec::with_capacity(XbfHeader::SIZE + metadata.len() + nodes.len());
        output.write_struct(&header)?;
        output.extend_from_slice(&metadata);
        output.extend_from_slice(&nodes);

        Ok(output)
    }
}

/// Convert a count or size to the `u32` the format stores.
fn encoded_len(len: usize, section: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooLarge { section, len })
}

/// Write a `u32` count followed by each record's raw bytes.
fn write_records<T>(out: &mut Vec<u8>, records: &[T], section: &'static str) -> Result<()>
where
    T: zerocopy::IntoBytes + zerocopy::Immutable,
{
    out.write_u32_le(encoded_len(records.len(), section)?)?;
    for record in records {
        out.write_struct(record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XbfDocument;

    #[test]
    fn test_strings_are_interned() {
        let mut builder = XbfBuilder::new();
        let a = builder.add_string("Grid");
        let b = builder.add_string("Button");
        let c = builder.add_string("Grid");

        assert_eq!(a, StringId::new(0));
        assert_eq!(b, StringId::new(1));
        assert_eq!(a, c);
    }

    #[test]
    fn test_empty_builder_layout() {
        let bytes = XbfBuilder::new().build().unwrap();
        // Header plus six zero counts.
        assert_eq!(bytes.len(), XbfHeader::SIZE + 6 * 4);
        assert!(XbfHeader::is_xbf(&bytes));
    }

    #[test]
    fn test_header_offsets_match_layout() {
        let mut builder = XbfBuilder::new();
        let assembly = builder.add_assembly(AssemblyKind::System, "mscorlib");
        let namespace = builder.add_type_namespace(assembly, "System");
        let ty = builder.add_type(namespace, "String");
        builder.add_property(ty, "Length");
        builder.add_xml_namespace("using:System");
        builder.hash([7; 32]);
        let bytes = builder.build().unwrap();

        let header = XbfHeader::read(&mut xbf_common::BinaryReader::new(&bytes)).unwrap();
        let strings_len = 4 + (4 + 16) + (4 + 12) + (4 + 12) + (4 + 12) + (4 + 24);
        let (string_offset, assembly_offset, xml_offset) = (
            header.string_table_offset,
            header.assembly_table_offset,
            header.xml_namespace_table_offset,
        );
        assert_eq!(string_offset, 0);
        assert_eq!(assembly_offset, strings_len as u64);
        assert_eq!(xml_offset, (strings_len + 12 + 12 + 16 + 16) as u64);
        assert_eq!(header.hash, [7; 32]);
    }

    #[test]
    fn test_raw_bytes_are_written_verbatim() {
        let mut builder = XbfBuilder::new();
        builder.raw(&[0xAA, 0xBB]);
        let bytes = builder.build().unwrap();

        assert_eq!(&bytes[bytes.len() - 2..], &[0xAA, 0xBB]);
        assert!(matches!(
            XbfDocument::parse(&bytes),
            Err(crate::Error::MalformedNodeStream {
                fault: crate::NodeStreamFault::UnknownNodeTag(0xAA),
                ..
            })
        ));
    }

    #[test]
    fn test_text_nodes_intern_strings() {
        let mut builder = XbfBuilder::new();
        let assembly = builder.add_assembly(AssemblyKind::Native, "Ui");
        let namespace = builder.add_type_namespace(assembly, "Ui");
        let block = builder.add_type(namespace, "TextBlock");
        let text = builder.add_property(block, "Text");
        builder
            .start_object(block)
            .start_property(text)
            .text("Ui")
            .end_property()
            .end_object();
        let document = XbfDocument::parse(&builder.build().unwrap()).unwrap();

        // "Ui" was already interned by the assembly.
        assert_eq!(document.tables().strings.len(), 3);
    }

    #[test]
    fn test_lengths_within_u32_are_kept() {
        assert_eq!(encoded_len(7, "type table").unwrap(), 7);
        assert_eq!(encoded_len(u32::MAX as usize, "metadata").unwrap(), u32::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_length_overflow_names_the_section() {
        assert!(matches!(
            encoded_len(u32::MAX as usize + 1, "node stream"),
            Err(Error::TooLarge {
                section: "node stream",
                len,
            }) if len == u32::MAX as usize + 1
        ));
    }
}
