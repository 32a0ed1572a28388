//! Common utilities for xbfdump.
//!
//! This crate provides the low-level building blocks shared by the XBF crates:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices
//! - [`WriteExt`] - Little-endian writing helpers, including UTF-16 strings
//! - [`utf16`] - UTF-16 string decoding and encoding

mod error;
mod reader;
mod writer;

pub mod utf16;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::WriteExt;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
