//! Text rendering of a parsed document.
//!
//! The tree is written as indented XML through `quick-xml`. Properties with a
//! single scalar value become attributes; everything else becomes a nested
//! `<Owner.Property>` element. Verbose mode prefixes the tree with a plain-text
//! listing of the header and every table.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::tree::{XamlObject, XamlProperty, XamlValue};
use crate::{Error, Result, TypeId, XbfDocument, XbfTables};

/// One indentation level; matches the writer's indent settings.
const INDENT: &str = "  ";

/// Options controlling the dump output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// List the header and all tables before the tree.
    pub verbose: bool,
    /// Render booleans by their tag's meaning instead of the legacy inverted text.
    pub canonical_booleans: bool,
}

/// Renders an [`XbfDocument`] as text.
#[derive(Debug, Clone, Copy)]
pub struct Dumper<'a> {
    document: &'a XbfDocument,
    options: DumpOptions,
}

impl XbfDocument {
    /// Dump the document to a string.
    pub fn dump(&self, options: DumpOptions) -> Result<String> {
        Dumper::new(self, options).dump_to_string()
    }
}

impl<'a> Dumper<'a> {
    /// Create a dumper over a parsed document.
    pub fn new(document: &'a XbfDocument, options: DumpOptions) -> Self {
        Self { document, options }
    }

    fn tables(&self) -> &'a XbfTables {
        self.document.tables()
    }

    /// Dump to a string.
    pub fn dump_to_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write(&mut output)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write the full dump: tables first when verbose, then the tree.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.options.verbose {
            self.write_tables(writer)?;
            writeln!(writer)?;
        }
        self.write_tree(writer)
    }

    /// Write the object tree as indented XML.
    pub fn write_tree<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml_writer = Writer::new_with_indent(&mut *writer, b' ', INDENT.len());
        self.write_object(&mut xml_writer, self.document.root(), 0)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write one object element and, recursively, its complex properties.
    ///
    /// `depth` is the element's indentation level.
    fn write_object<W: Write>(
        &self,
        writer: &mut Writer<W>,
        object: &XamlObject,
        depth: usize,
    ) -> Result<()> {
        let tables = self.tables();
        let type_name = tables.type_name(object.type_id)?;
        let mut element = BytesStart::new(type_name);
        let mut complex = Vec::new();

        for property in &object.properties {
            match property.simple_value() {
                Some(value) => {
                    let name = tables.property_name(property.property_id)?;
                    let text = self.scalar_text(value)?;
                    element.push_attribute((name, text.as_str()));
                }
                None => complex.push(property),
            }
        }

        if complex.is_empty() {
            return writer
                .write_event(Event::Empty(element))
                .map_err(|e| Error::Xml(e.to_string()));
        }

        writer
            .write_event(Event::Start(element))
            .map_err(|e| Error::Xml(e.to_string()))?;
        for property in complex {
            self.write_property(writer, property, depth + 1)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(type_name)))
            .map_err(|e| Error::Xml(e.to_string()))?;

        Ok(())
    }

    /// Write a property element holding nested objects or several scalars.
    ///
    /// Each scalar goes on its own line so adjacent values stay distinct.
    fn write_property<W: Write>(
        &self,
        writer: &mut Writer<W>,
        property: &XamlProperty,
        depth: usize,
    ) -> Result<()> {
        let tables = self.tables();
        let element_name = format!(
            "{}.{}",
            tables.property_owner_name(property.property_id)?,
            tables.property_name(property.property_id)?
        );

        if property.values.is_empty() {
            return writer
                .write_event(Event::Empty(BytesStart::new(element_name.as_str())))
                .map_err(|e| Error::Xml(e.to_string()));
        }

        writer
            .write_event(Event::Start(BytesStart::new(element_name.as_str())))
            .map_err(|e| Error::Xml(e.to_string()))?;

        // quick-xml does not break lines after text, so text carries its own.
        let inner_indent = format!("\n{}", INDENT.repeat(depth + 1));
        let mut after_text = false;
        for value in &property.values {
            match value {
                XamlValue::Object(object) => {
                    if after_text {
                        write_text(writer, &inner_indent)?;
                    }
                    self.write_object(writer, object, depth + 1)?;
                    after_text = false;
                }
                scalar => {
                    let text = self.scalar_text(scalar)?;
                    write_text(writer, &format!("{inner_indent}{text}"))?;
                    after_text = true;
                }
            }
        }
        if after_text {
            write_text(writer, &format!("\n{}", INDENT.repeat(depth)))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(element_name.as_str())))
            .map_err(|e| Error::Xml(e.to_string()))?;

        Ok(())
    }

    fn scalar_text(&self, value: &XamlValue) -> Result<String> {
        match value {
            XamlValue::Text(text) => Ok(self.tables().string(text.string_id)?.to_string()),
            XamlValue::Value(value) => Ok(value.render(self.options.canonical_booleans)),
            XamlValue::Object(object) => Ok(self.tables().type_name(object.type_id)?.to_string()),
        }
    }

    /// Write the header, every table, and the namespace declarations.
    ///
    /// Cross-references are shown resolved; an unresolvable index fails the dump.
    pub fn write_tables<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header = self.document.header();
        let tables = self.tables();
        let (major, minor) = header.version();
        let (metadata_size, node_size) = (header.metadata_size, header.node_size);

        writeln!(writer, "Header")?;
        writeln!(writer, "  Version:       {major}.{minor}")?;
        writeln!(writer, "  Metadata size: {metadata_size}")?;
        writeln!(writer, "  Node size:     {node_size}")?;
        for (table, offset) in header.table_offsets() {
            writeln!(writer, "  {:<14} {offset:#x}", format!("{table} table:"))?;
        }
        writeln!(writer, "  Hash:          {}", header.hash_hex())?;

        writeln!(writer)?;
        writeln!(writer, "String table ({} entries)", tables.strings.len())?;
        for (index, s) in tables.strings.iter().enumerate() {
            writeln!(writer, "  [{index}] {s}")?;
        }

        writeln!(writer)?;
        writeln!(writer, "Assembly table ({} entries)", tables.assemblies.len())?;
        for (index, record) in tables.assemblies.iter().enumerate() {
            let name = tables.string(record.string_id)?;
            writeln!(writer, "  [{index}] {name} ({})", record.kind())?;
        }

        writeln!(writer)?;
        writeln!(writer, "Type namespace table ({} entries)", tables.type_namespaces.len())?;
        for (index, record) in tables.type_namespaces.iter().enumerate() {
            let name = tables.string(record.string_id)?;
            let assembly = tables.assembly_name(record.assembly_id)?;
            writeln!(writer, "  [{index}] {name} (assembly: {assembly})")?;
        }

        writeln!(writer)?;
        writeln!(writer, "Type table ({} entries)", tables.types.len())?;
        for (index, record) in tables.types.iter().enumerate() {
            let name = tables.qualified_type_name(TypeId::new(index as u32))?;
            writeln!(writer, "  [{index}] {name} (flags: {:#x})", record.flags)?;
        }

        writeln!(writer)?;
        writeln!(writer, "Property table ({} entries)", tables.properties.len())?;
        for (index, record) in tables.properties.iter().enumerate() {
            let owner = tables.type_name(record.type_id)?;
            let name = tables.string(record.string_id)?;
            writeln!(writer, "  [{index}] {owner}.{name} (flags: {:#x})", record.flags)?;
        }

        writeln!(writer)?;
        writeln!(writer, "XML namespace table ({} entries)", tables.xml_namespaces.len())?;
        for (index, record) in tables.xml_namespaces.iter().enumerate() {
            writeln!(writer, "  [{index}] {}", tables.string(record.string_id)?)?;
        }

        writeln!(writer)?;
        writeln!(writer, "Namespace declarations ({} entries)", self.document.namespaces().len())?;
        for declaration in self.document.namespaces() {
            let registered = tables.xml_namespace_uri(declaration.namespace_id)?;
            writeln!(
                writer,
                "  line {}:{} {} -> {registered}",
                declaration.line_info.line, declaration.line_info.position, declaration.uri
            )?;
        }

        Ok(())
    }
}

fn write_text<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<()> {
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| Error::Xml(e.to_string()))
}
