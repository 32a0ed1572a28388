//! Binary XAML (XBF) reader.
//!
//! XBF is the compiled form of XAML markup shipped inside Windows app
//! packages. A file is a fixed header, six metadata tables (strings,
//! assemblies, type namespaces, types, properties and XML namespaces) and a
//! node stream that encodes the object tree as start/end events.
//!
//! This crate parses version 1 files into an [`XbfDocument`] and, with the
//! `xml-output` feature, renders the tree back to readable markup.
//!
//! # Example
//!
//! ```no_run
//! use xbf::{DumpOptions, XbfDocument};
//!
//! let data = std::fs::read("MainPage.xbf")?;
//!
//! if XbfDocument::is_xbf(&data) {
//!     let document = XbfDocument::parse(&data)?;
//!     println!("{}", document.dump(DumpOptions::default())?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod document;
mod error;
mod header;
mod ids;
mod node;
mod stream;
mod tables;
mod tree;
mod value;

pub mod builder;

#[cfg(feature = "xml-output")]
mod dump;

pub use document::XbfDocument;
pub use error::{Error, NodeStreamFault, Result};
pub use header::{FormatLayout, XbfHeader};
pub use ids::{AssemblyId, PropertyId, StringId, TypeId, TypeNamespaceId, XmlNamespaceId};
pub use node::{Node, NodeTag};
pub use stream::{NodeStream, MAX_OBJECT_DEPTH};
pub use tables::{
    AssemblyKind, AssemblyRecord, PropertyRecord, Table, TableKind, TypeNamespaceRecord,
    TypeRecord, XbfTables, XmlNamespaceRecord,
};
pub use tree::{LineInfo, NamespaceDeclaration, TextValue, XamlObject, XamlProperty, XamlValue};
pub use value::{GridUnit, Thickness, Value, ValueTag};

#[cfg(feature = "xml-output")]
pub use dump::{DumpOptions, Dumper};
