//! Tagged nodes of the XBF node stream.

use std::io::Write;

use xbf_common::{BinaryReader, WriteExt};

use crate::error::NodeStreamFault;
use crate::ids::{PropertyId, StringId, TypeId, XmlNamespaceId};
use crate::value::Value;

/// Tag byte at the start of every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeTag {
    StartObject = 1,
    EndObject = 2,
    StartProperty = 3,
    EndProperty = 4,
    Text = 5,
    Value = 6,
    Namespace = 7,
    EndOfAttributes = 8,
    EndOfStream = 9,
    LineInfo = 10,
    LineInfoAbsolute = 11,
}

impl NodeTag {
    /// Parse from a tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::StartObject),
            2 => Some(Self::EndObject),
            3 => Some(Self::StartProperty),
            4 => Some(Self::EndProperty),
            5 => Some(Self::Text),
            6 => Some(Self::Value),
            7 => Some(Self::Namespace),
            8 => Some(Self::EndOfAttributes),
            9 => Some(Self::EndOfStream),
            10 => Some(Self::LineInfo),
            11 => Some(Self::LineInfoAbsolute),
            _ => None,
        }
    }
}

/// A single decoded node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    StartObject { type_id: TypeId, flags: u8 },
    EndObject,
    StartProperty { property_id: PropertyId, flags: u8 },
    EndProperty,
    Text { string_id: StringId, flags: u8 },
    Value(Value),
    Namespace {
        namespace_id: XmlNamespaceId,
        flags: u8,
        uri: String,
    },
    EndOfAttributes,
    EndOfStream,
    /// Line and position deltas against the last known location.
    LineInfo { line_delta: i16, position_delta: i16 },
    LineInfoAbsolute { line: u32, position: u32 },
}

impl Node {
    /// Decode the node at the reader's position.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self, NodeStreamFault> {
        let tag = reader.read_u8()?;
        let tag = NodeTag::from_u8(tag).ok_or(NodeStreamFault::UnknownNodeTag(tag))?;

        let node = match tag {
            NodeTag::StartObject => Self::StartObject {
                type_id: TypeId::new(reader.read_u32()?),
                flags: reader.read_u8()?,
            },
            NodeTag::EndObject => Self::EndObject,
            NodeTag::StartProperty => Self::StartProperty {
                property_id: PropertyId::new(reader.read_u32()?),
                flags: reader.read_u8()?,
            },
            NodeTag::EndProperty => Self::EndProperty,
            NodeTag::Text => Self::Text {
                string_id: StringId::new(reader.read_u32()?),
                flags: reader.read_u8()?,
            },
            NodeTag::Value => Self::Value(Value::read(reader)?),
            NodeTag::Namespace => Self::Namespace {
                namespace_id: XmlNamespaceId::new(reader.read_u32()?),
                flags: reader.read_u8()?,
                uri: reader.read_prefixed_utf16()?,
            },
            NodeTag::EndOfAttributes => Self::EndOfAttributes,
            NodeTag::EndOfStream => Self::EndOfStream,
            NodeTag::LineInfo => Self::LineInfo {
                line_delta: reader.read_i16()?,
                position_delta: reader.read_i16()?,
            },
            NodeTag::LineInfoAbsolute => Self::LineInfoAbsolute {
                line: reader.read_u32()?,
                position: reader.read_u32()?,
            },
        };

        Ok(node)
    }

    /// Tag this node is encoded with.
    pub fn tag(&self) -> NodeTag {
        match self {
            Self::StartObject { .. } => NodeTag::StartObject,
            Self::EndObject => NodeTag::EndObject,
            Self::StartProperty { .. } => NodeTag::StartProperty,
            Self::EndProperty => NodeTag::EndProperty,
            Self::Text { .. } => NodeTag::Text,
            Self::Value(_) => NodeTag::Value,
            Self::Namespace { .. } => NodeTag::Namespace,
            Self::EndOfAttributes => NodeTag::EndOfAttributes,
            Self::EndOfStream => NodeTag::EndOfStream,
            Self::LineInfo { .. } => NodeTag::LineInfo,
            Self::LineInfoAbsolute { .. } => NodeTag::LineInfoAbsolute,
        }
    }

    /// Encode the node, tag byte first.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> xbf_common::Result<()> {
        // Values carry their own tag after the node tag.
        writer.write_all(&[self.tag() as u8])?;
        match self {
            Self::StartObject { type_id, flags } => {
                writer.write_u32_le(type_id.get())?;
                writer.write_all(&[*flags])?;
            }
            Self::StartProperty { property_id, flags } => {
                writer.write_u32_le(property_id.get())?;
                writer.write_all(&[*flags])?;
            }
            Self::Text { string_id, flags } => {
                writer.write_u32_le(string_id.get())?;
                writer.write_all(&[*flags])?;
            }
            Self::Value(value) => value.write_to(writer)?,
            Self::Namespace {
                namespace_id,
                flags,
                uri,
            } => {
                writer.write_u32_le(namespace_id.get())?;
                writer.write_all(&[*flags])?;
                writer.write_prefixed_utf16(uri)?;
            }
            Self::LineInfo {
                line_delta,
                position_delta,
            } => {
                writer.write_i16_le(*line_delta)?;
                writer.write_i16_le(*position_delta)?;
            }
            Self::LineInfoAbsolute { line, position } => {
                writer.write_u32_le(*line)?;
                writer.write_u32_le(*position)?;
            }
            Self::EndObject | Self::EndProperty | Self::EndOfAttributes | Self::EndOfStream => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_object_layout() {
        let bytes = [NodeTag::StartObject as u8, 0x05, 0x00, 0x00, 0x00, 0x02];
        let node = Node::read(&mut BinaryReader::new(&bytes)).unwrap();

        assert_eq!(
            node,
            Node::StartObject {
                type_id: TypeId::new(5),
                flags: 2,
            }
        );
    }

    #[test]
    fn test_line_info_deltas_are_signed() {
        let mut bytes = vec![NodeTag::LineInfo as u8];
        bytes.extend_from_slice(&(-3i16).to_le_bytes());
        bytes.extend_from_slice(&12i16.to_le_bytes());

        let node = Node::read(&mut BinaryReader::new(&bytes)).unwrap();
        assert_eq!(
            node,
            Node::LineInfo {
                line_delta: -3,
                position_delta: 12,
            }
        );
    }

    #[test]
    fn test_namespace_node_carries_uri() {
        let node = Node::Namespace {
            namespace_id: XmlNamespaceId::new(1),
            flags: 0,
            uri: "using:App".to_string(),
        };
        let mut bytes = Vec::new();
        node.write_to(&mut bytes).unwrap();

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(Node::read(&mut reader).unwrap(), node);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_unknown_tag() {
        let result = Node::read(&mut BinaryReader::new(&[0x00]));
        assert_eq!(result, Err(NodeStreamFault::UnknownNodeTag(0)));

        let result = Node::read(&mut BinaryReader::new(&[0x7F]));
        assert_eq!(result, Err(NodeStreamFault::UnknownNodeTag(0x7F)));
    }

    #[test]
    fn test_truncated_node() {
        let bytes = [NodeTag::StartProperty as u8, 0x01, 0x00];
        assert!(matches!(
            Node::read(&mut BinaryReader::new(&bytes)),
            Err(NodeStreamFault::Truncated { needed: 4, available: 2 })
        ));
    }
}
