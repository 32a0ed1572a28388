//! XBF metadata tables.
//!
//! Six tables follow the header, always in the same order. Records in later
//! tables point back into earlier ones by index, so the tables are read
//! sequentially and names are resolved lazily through [`XbfTables`].

use std::fmt;

use tracing::{debug, warn};
use xbf_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::ids::{AssemblyId, PropertyId, StringId, TypeId, TypeNamespaceId, XmlNamespaceId};
use crate::{Error, Result, XbfHeader};

/// Identifies one of the six metadata tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    String,
    Assembly,
    TypeNamespace,
    Type,
    Property,
    XmlNamespace,
}

impl TableKind {
    /// Human-readable table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Assembly => "assembly",
            Self::TypeNamespace => "type namespace",
            Self::Type => "type",
            Self::Property => "property",
            Self::XmlNamespace => "XML namespace",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an assembly's types are provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyKind {
    Unknown,
    Native,
    Managed,
    System,
    Parser,
    Alternate,
    /// A value outside the known range, kept as-is.
    Other(u32),
}

impl AssemblyKind {
    /// Parse from the raw record value.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Unknown,
            1 => Self::Native,
            2 => Self::Managed,
            3 => Self::System,
            4 => Self::Parser,
            5 => Self::Alternate,
            other => Self::Other(other),
        }
    }

    /// Raw record value.
    pub fn to_u32(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Native => 1,
            Self::Managed => 2,
            Self::System => 3,
            Self::Parser => 4,
            Self::Alternate => 5,
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for AssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(value) => write!(f, "Unknown({value})"),
            known => fmt::Debug::fmt(known, f),
        }
    }
}

/// An entry in the assembly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct AssemblyRecord {
    /// Raw [`AssemblyKind`] value.
    pub kind: u32,
    /// Assembly name.
    pub string_id: StringId,
}

impl AssemblyRecord {
    /// Decoded provider kind.
    pub fn kind(&self) -> AssemblyKind {
        AssemblyKind::from_u32(self.kind)
    }
}

/// An entry in the type namespace table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct TypeNamespaceRecord {
    pub assembly_id: AssemblyId,
    pub string_id: StringId,
}

/// An entry in the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct TypeRecord {
    pub flags: u32,
    pub type_namespace_id: TypeNamespaceId,
    pub string_id: StringId,
}

/// An entry in the property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct PropertyRecord {
    pub flags: u32,
    /// Declaring type.
    pub type_id: TypeId,
    pub string_id: StringId,
}

/// An entry in the XML namespace table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct XmlNamespaceRecord {
    pub string_id: StringId,
}

/// A count-prefixed sequence of records, indexed by read order.
#[derive(Debug, Clone)]
pub struct Table<T> {
    kind: TableKind,
    records: Vec<T>,
}

impl<T> Table<T> {
    /// Read a `u32` count followed by `count` records.
    ///
    /// Any short read fails the whole table with [`Error::TableRead`].
    pub fn read<F>(reader: &mut BinaryReader<'_>, kind: TableKind, mut read_record: F) -> Result<Self>
    where
        F: FnMut(&mut BinaryReader<'_>) -> xbf_common::Result<T>,
    {
        let table_error = |source| Error::TableRead {
            table: kind,
            source,
        };

        let count = reader.read_u32().map_err(table_error)? as usize;
        // Every record is at least four bytes, which bounds a bogus count.
        let mut records = Vec::with_capacity(count.min(reader.remaining() / 4));
        for _ in 0..count {
            records.push(read_record(reader).map_err(table_error)?);
        }

        debug!(table = %kind, count, "read table");
        Ok(Self { kind, records })
    }

    /// Look up a record, failing if the index is past the end of the table.
    pub fn get(&self, index: u32) -> Result<&T> {
        self.records
            .get(index as usize)
            .ok_or(Error::IndexOutOfRange {
                table: self.kind,
                index,
                count: self.records.len(),
            })
    }

    /// Which table this is.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in index order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Iterate over records in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

/// The six metadata tables of an XBF file.
#[derive(Debug, Clone)]
pub struct XbfTables {
    pub strings: Table<String>,
    pub assemblies: Table<AssemblyRecord>,
    pub type_namespaces: Table<TypeNamespaceRecord>,
    pub types: Table<TypeRecord>,
    pub properties: Table<PropertyRecord>,
    pub xml_namespaces: Table<XmlNamespaceRecord>,
}

impl XbfTables {
    /// Read all six tables, starting right after the header.
    ///
    /// Tables are read back to back. The header's declared offsets are only
    /// checked, and a mismatch is logged rather than followed.
    pub fn read(reader: &mut BinaryReader<'_>, header: &XbfHeader) -> Result<Self> {
        let base = reader.position();
        let offsets = header.table_offsets();
        let check_offset = |reader: &BinaryReader<'_>, index: usize| {
            let (table, declared) = offsets[index];
            let actual = (reader.position() - base) as u64;
            if actual != declared {
                warn!(%table, declared, actual, "table offset does not match header");
            }
        };

        check_offset(reader, 0);
        let strings = Table::read(reader, TableKind::String, |r| r.read_prefixed_utf16())?;
        check_offset(reader, 1);
        let assemblies = Table::read(reader, TableKind::Assembly, |r| r.read_struct())?;
        check_offset(reader, 2);
        let type_namespaces = Table::read(reader, TableKind::TypeNamespace, |r| r.read_struct())?;
        check_offset(reader, 3);
        let types = Table::read(reader, TableKind::Type, |r| r.read_struct())?;
        check_offset(reader, 4);
        let properties = Table::read(reader, TableKind::Property, |r| r.read_struct())?;
        check_offset(reader, 5);
        let xml_namespaces = Table::read(reader, TableKind::XmlNamespace, |r| r.read_struct())?;

        let metadata_size = (reader.position() - base) as u64;
        let declared = u64::from(header.metadata_size);
        if metadata_size != declared {
            warn!(declared, actual = metadata_size, "metadata size does not match header");
        }

        Ok(Self {
            strings,
            assemblies,
            type_namespaces,
            types,
            properties,
            xml_namespaces,
        })
    }

    /// Resolve a string reference.
    pub fn string(&self, id: StringId) -> Result<&str> {
        self.strings.get(id.get()).map(String::as_str)
    }

    /// Resolve an assembly reference to the assembly's name.
    pub fn assembly_name(&self, id: AssemblyId) -> Result<&str> {
        let record = self.assemblies.get(id.get())?;
        self.string(record.string_id)
    }

    /// Resolve a type namespace reference to the namespace's name.
    pub fn type_namespace_name(&self, id: TypeNamespaceId) -> Result<&str> {
        let record = self.type_namespaces.get(id.get())?;
        self.string(record.string_id)
    }

    /// Resolve a type reference to the type's short name.
    pub fn type_name(&self, id: TypeId) -> Result<&str> {
        let record = self.types.get(id.get())?;
        self.string(record.string_id)
    }

    /// Resolve a type reference to `Namespace.Name`.
    pub fn qualified_type_name(&self, id: TypeId) -> Result<String> {
        let record = self.types.get(id.get())?;
        let namespace = self.type_namespace_name(record.type_namespace_id)?;
        let name = self.string(record.string_id)?;
        if namespace.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{namespace}.{name}"))
        }
    }

    /// Resolve a property reference to the property's name.
    pub fn property_name(&self, id: PropertyId) -> Result<&str> {
        let record = self.properties.get(id.get())?;
        self.string(record.string_id)
    }

    /// Resolve a property reference to the name of its declaring type.
    pub fn property_owner_name(&self, id: PropertyId) -> Result<&str> {
        let record = self.properties.get(id.get())?;
        self.type_name(record.type_id)
    }

    /// Resolve an XML namespace reference to its URI.
    pub fn xml_namespace_uri(&self, id: XmlNamespaceId) -> Result<&str> {
        let record = self.xml_namespaces.get(id.get())?;
        self.string(record.string_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::XbfBuilder;

    fn read_tables(bytes: &[u8]) -> Result<XbfTables> {
        let mut reader = BinaryReader::new(bytes);
        let header = XbfHeader::read(&mut reader)?;
        XbfTables::read(&mut reader, &header)
    }

    #[test]
    fn test_type_name_resolves_through_string_table() {
        let mut builder = XbfBuilder::new();
        builder.add_string("Grid");
        let button = builder.add_string("Button");
        let ty = builder.add_type_record(0, TypeNamespaceId::new(0), button);
        let bytes = builder.build().unwrap();

        let tables = read_tables(&bytes).unwrap();
        assert_eq!(tables.strings.len(), 2);
        assert_eq!(ty, TypeId::new(0));
        assert_eq!(tables.types.get(0).unwrap().string_id, StringId::new(1));
        assert_eq!(tables.type_name(ty).unwrap(), "Button");
    }

    #[test]
    fn test_cross_references_resolve() {
        let mut builder = XbfBuilder::new();
        let assembly = builder.add_assembly(AssemblyKind::Managed, "App.dll");
        let namespace = builder.add_type_namespace(assembly, "App.Views");
        let page = builder.add_type(namespace, "MainPage");
        let title = builder.add_property(page, "Title");
        let xmlns = builder.add_xml_namespace("http://schemas.microsoft.com/winfx/2006/xaml");
        let bytes = builder.build().unwrap();

        let tables = read_tables(&bytes).unwrap();
        assert_eq!(tables.assembly_name(assembly).unwrap(), "App.dll");
        assert_eq!(tables.assemblies.get(0).unwrap().kind(), AssemblyKind::Managed);
        assert_eq!(tables.type_namespace_name(namespace).unwrap(), "App.Views");
        assert_eq!(tables.qualified_type_name(page).unwrap(), "App.Views.MainPage");
        assert_eq!(tables.property_name(title).unwrap(), "Title");
        assert_eq!(tables.property_owner_name(title).unwrap(), "MainPage");
        assert_eq!(
            tables.xml_namespace_uri(xmlns).unwrap(),
            "http://schemas.microsoft.com/winfx/2006/xaml"
        );
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let mut builder = XbfBuilder::new();
        let assembly = builder.add_assembly(AssemblyKind::Native, "Core");
        // Type namespace whose name points past the string table.
        let namespace = builder.add_type_namespace_record(assembly, StringId::new(99));
        let bytes = builder.build().unwrap();

        let tables = read_tables(&bytes).unwrap();
        assert!(matches!(
            tables.type_namespace_name(namespace),
            Err(Error::IndexOutOfRange {
                table: TableKind::String,
                index: 99,
                count: 1,
            })
        ));
        assert!(matches!(
            tables.type_name(TypeId::new(0)),
            Err(Error::IndexOutOfRange {
                table: TableKind::Type,
                index: 0,
                count: 0,
            })
        ));
    }

    #[test]
    fn test_truncated_table_names_the_table() {
        let mut builder = XbfBuilder::new();
        let assembly = builder.add_assembly(AssemblyKind::Native, "Core");
        let namespace = builder.add_type_namespace(assembly, "Ui");
        builder.add_type(namespace, "Grid");
        let bytes = builder.build().unwrap();

        // Cut into the middle of the type table: header, strings (3 entries),
        // assemblies (1), type namespaces (1), then the type count plus 4 bytes.
        let strings_len = 4 + (4 + 8) + (4 + 4) + (4 + 8);
        let cut = XbfHeader::SIZE + strings_len + (4 + 8) + (4 + 8) + 4 + 4;
        let err = read_tables(&bytes[..cut]).unwrap_err();

        assert!(matches!(
            err,
            Error::TableRead {
                table: TableKind::Type,
                ..
            }
        ));
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        let mut builder = XbfBuilder::new();
        builder.add_string("x");
        let mut bytes = builder.build().unwrap();
        // Overwrite the string count with u32::MAX.
        bytes[XbfHeader::SIZE..XbfHeader::SIZE + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        assert!(matches!(
            read_tables(&bytes),
            Err(Error::TableRead {
                table: TableKind::String,
                ..
            })
        ));
    }

    #[test]
    fn test_assembly_kind_display() {
        assert_eq!(AssemblyKind::from_u32(1).to_string(), "Native");
        assert_eq!(AssemblyKind::from_u32(42).to_string(), "Unknown(42)");
    }
}
