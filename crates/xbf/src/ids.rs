//! Index types for cross-table references.
//!
//! Every reference in an XBF file is a 0-based index into one of the metadata
//! tables. Each table gets its own newtype so a type index can never be used
//! to look up a string. Resolution happens through [`crate::XbfTables`], which
//! checks bounds.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

macro_rules! table_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
            FromBytes, IntoBytes, Immutable, KnownLayout,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw table index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Raw table index.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Table index as a `usize` for slice access.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

table_id!(
    /// Reference into the string table.
    StringId
);
table_id!(
    /// Reference into the assembly table.
    AssemblyId
);
table_id!(
    /// Reference into the type namespace table.
    TypeNamespaceId
);
table_id!(
    /// Reference into the type table.
    TypeId
);
table_id!(
    /// Reference into the property table.
    PropertyId
);
table_id!(
    /// Reference into the XML namespace table.
    XmlNamespaceId
);
