//! Inline primitive values carried by `Value` nodes.
//!
//! Each value starts with a one-byte tag that selects its encoding. Values are
//! decoded into typed form here and rendered to text by the dumper.

use std::fmt;
use std::io::Write;

use xbf_common::{BinaryReader, WriteExt};

use crate::error::NodeStreamFault;

/// Encoding tag of an inline value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueTag {
    BoolFalse = 1,
    BoolTrue = 2,
    Float = 3,
    Signed = 4,
    CString = 5,
    KeyTime = 6,
    Thickness = 7,
    LengthConverter = 8,
    GridLength = 9,
    Color = 10,
    Duration = 11,
}

impl ValueTag {
    /// Parse from a tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::BoolFalse),
            2 => Some(Self::BoolTrue),
            3 => Some(Self::Float),
            4 => Some(Self::Signed),
            5 => Some(Self::CString),
            6 => Some(Self::KeyTime),
            7 => Some(Self::Thickness),
            8 => Some(Self::LengthConverter),
            9 => Some(Self::GridLength),
            10 => Some(Self::Color),
            11 => Some(Self::Duration),
            _ => None,
        }
    }
}

/// Unit of a [`Value::GridLength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridUnit {
    Auto,
    Pixel,
    Star,
}

impl GridUnit {
    /// Parse from the stored discriminant.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Auto),
            1 => Some(Self::Pixel),
            2 => Some(Self::Star),
            _ => None,
        }
    }

    /// Stored discriminant.
    pub fn to_u32(self) -> u32 {
        match self {
            Self::Auto => 0,
            Self::Pixel => 1,
            Self::Star => 2,
        }
    }
}

/// Four edge lengths, in left, top, right, bottom order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thickness {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// A decoded inline value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Float(f32),
    Signed(i32),
    String(String),
    KeyTime(f32),
    Thickness(Thickness),
    LengthConverter(f32),
    GridLength { unit: GridUnit, value: f32 },
    /// Packed `0xAARRGGBB`.
    Color(u32),
    Duration(f32),
}

impl Value {
    /// Decode a tag byte and its payload.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self, NodeStreamFault> {
        let tag = reader.read_u8()?;
        let tag = ValueTag::from_u8(tag).ok_or(NodeStreamFault::UnknownValueTag(tag))?;

        let value = match tag {
            ValueTag::BoolFalse => Self::Bool(false),
            ValueTag::BoolTrue => Self::Bool(true),
            ValueTag::Float => Self::Float(reader.read_f32()?),
            ValueTag::Signed => Self::Signed(reader.read_i32()?),
            ValueTag::CString => Self::String(reader.read_prefixed_utf16()?),
            ValueTag::KeyTime => Self::KeyTime(reader.read_f32()?),
            ValueTag::Thickness => Self::Thickness(Thickness {
                left: reader.read_f32()?,
                top: reader.read_f32()?,
                right: reader.read_f32()?,
                bottom: reader.read_f32()?,
            }),
            ValueTag::LengthConverter => Self::LengthConverter(reader.read_f32()?),
            ValueTag::GridLength => {
                let raw = reader.read_u32()?;
                let unit =
                    GridUnit::from_u32(raw).ok_or(NodeStreamFault::UnknownGridLengthKind(raw))?;
                Self::GridLength {
                    unit,
                    value: reader.read_f32()?,
                }
            }
            ValueTag::Color => Self::Color(reader.read_u32()?),
            ValueTag::Duration => Self::Duration(reader.read_f32()?),
        };

        Ok(value)
    }

    /// Tag this value is encoded with.
    pub fn tag(&self) -> ValueTag {
        match self {
            Self::Bool(false) => ValueTag::BoolFalse,
            Self::Bool(true) => ValueTag::BoolTrue,
            Self::Float(_) => ValueTag::Float,
            Self::Signed(_) => ValueTag::Signed,
            Self::String(_) => ValueTag::CString,
            Self::KeyTime(_) => ValueTag::KeyTime,
            Self::Thickness(_) => ValueTag::Thickness,
            Self::LengthConverter(_) => ValueTag::LengthConverter,
            Self::GridLength { .. } => ValueTag::GridLength,
            Self::Color(_) => ValueTag::Color,
            Self::Duration(_) => ValueTag::Duration,
        }
    }

    /// Encode the tag byte and payload.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> xbf_common::Result<()> {
        writer.write_all(&[self.tag() as u8])?;
        match self {
            Self::Bool(_) => {}
            Self::Float(v)
            | Self::KeyTime(v)
            | Self::LengthConverter(v)
            | Self::Duration(v) => writer.write_f32_le(*v)?,
            Self::Signed(v) => writer.write_i32_le(*v)?,
            Self::String(s) => writer.write_prefixed_utf16(s)?,
            Self::Thickness(t) => {
                for edge in [t.left, t.top, t.right, t.bottom] {
                    writer.write_f32_le(edge)?;
                }
            }
            Self::GridLength { unit, value } => {
                writer.write_u32_le(unit.to_u32())?;
                writer.write_f32_le(*value)?;
            }
            Self::Color(argb) => writer.write_u32_le(*argb)?,
        }
        Ok(())
    }

    /// Render as markup text.
    ///
    /// With `canonical_booleans` off, booleans keep the legacy dump text where
    /// a `BoolFalse` tag prints `True` and a `BoolTrue` tag prints `False`.
    pub fn render(&self, canonical_booleans: bool) -> String {
        match self {
            Self::Bool(b) => {
                let shown = if canonical_booleans { *b } else { !*b };
                let text = if shown { "True" } else { "False" };
                text.to_string()
            }
            Self::Float(v)
            | Self::KeyTime(v)
            | Self::LengthConverter(v)
            | Self::Duration(v) => v.to_string(),
            Self::Signed(v) => v.to_string(),
            Self::String(s) => s.clone(),
            Self::Thickness(t) => t.to_string(),
            Self::GridLength { unit, value } => match unit {
                GridUnit::Auto => "Auto".to_string(),
                GridUnit::Pixel => value.to_string(),
                GridUnit::Star => format!("{value}*"),
            },
            Self::Color(argb) => format!("#{argb:08X}"),
        }
    }
}
