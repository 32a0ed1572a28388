//! Node stream reader.
//!
//! The node stream is a flat, self-delimiting sequence of tagged nodes. The
//! tree is rebuilt with two explicit stacks, one of open objects and one of
//! open properties, so nesting depth never turns into call-stack depth.

use tracing::{debug, trace, warn};
use xbf_common::BinaryReader;

use crate::error::NodeStreamFault;
use crate::node::Node;
use crate::tree::{LineInfo, NamespaceDeclaration, TextValue, XamlObject, XamlProperty, XamlValue};
use crate::{Error, Result};

/// Deepest object nesting accepted from a node stream.
///
/// The reconstructed tree is dropped and dumped recursively, so its depth
/// must stay bounded.
pub const MAX_OBJECT_DEPTH: usize = 256;

/// The tree and side-channel data recovered from a node stream.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStream {
    pub root: XamlObject,
    pub namespaces: Vec<NamespaceDeclaration>,
}

impl NodeStream {
    /// Read nodes until the end of the reader or an `EndOfStream` node.
    ///
    /// Every fault is reported as [`Error::MalformedNodeStream`] with the
    /// absolute offset of the node that caused it.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let mut builder = TreeBuilder::default();
        let mut node_count = 0usize;

        while !reader.is_empty() {
            let offset = reader.position();
            let malformed = |fault| Error::MalformedNodeStream { offset, fault };

            let node = Node::read(reader).map_err(malformed)?;
            trace!(offset, ?node, "node");
            node_count += 1;

            if node == Node::EndOfStream {
                break;
            }
            builder.apply(node).map_err(malformed)?;
        }

        let offset = reader.position();
        let stream = builder
            .finish()
            .map_err(|fault| Error::MalformedNodeStream { offset, fault })?;

        debug!(
            nodes = node_count,
            objects = stream.root.object_count(),
            namespaces = stream.namespaces.len(),
            "read node stream"
        );
        Ok(stream)
    }
}

/// Stack machine state for one pass over the node stream.
#[derive(Debug, Default)]
struct TreeBuilder {
    /// Open objects, each with the property-stack depth at its start.
    objects: Vec<(XamlObject, usize)>,
    /// Open properties, each with the object-stack depth at its start.
    properties: Vec<(XamlProperty, usize)>,
    root: Option<XamlObject>,
    line_info: LineInfo,
    namespaces: Vec<NamespaceDeclaration>,
}

impl TreeBuilder {
    fn apply(&mut self, node: Node) -> std::result::Result<(), NodeStreamFault> {
        match node {
            Node::LineInfo {
                line_delta,
                position_delta,
            } => {
                self.line_info.line = self.line_info.line.saturating_add_signed(line_delta.into());
                self.line_info.position = self
                    .line_info
                    .position
                    .saturating_add_signed(position_delta.into());
            }
            Node::LineInfoAbsolute { line, position } => {
                self.line_info = LineInfo { line, position };
            }
            Node::Namespace {
                namespace_id,
                flags,
                uri,
            } => {
                self.namespaces.push(NamespaceDeclaration {
                    namespace_id,
                    flags,
                    uri,
                    line_info: self.line_info,
                });
            }
            Node::StartObject { type_id, flags } => {
                if self.root.is_some() {
                    return Err(NodeStreamFault::MultipleRoots);
                }
                if self.objects.len() >= MAX_OBJECT_DEPTH {
                    return Err(NodeStreamFault::NestingTooDeep(MAX_OBJECT_DEPTH));
                }
                let object = XamlObject::new(type_id, flags, self.line_info);
                self.objects.push((object, self.properties.len()));
            }
            Node::EndObject => {
                let (object, property_depth) =
                    self.objects.pop().ok_or(NodeStreamFault::UnmatchedEndObject)?;
                if self.properties.len() != property_depth {
                    return Err(NodeStreamFault::MisnestedEndObject);
                }

                if let Some((property, _)) = self.properties.last_mut() {
                    property.values.push(XamlValue::Object(object));
                } else if self.objects.is_empty() {
                    self.root = Some(object);
                } else {
                    warn!(type_id = %object.type_id, "dropping object with no owning property");
                }
            }
            Node::StartProperty { property_id, flags } => {
                let property = XamlProperty::new(property_id, flags, self.line_info);
                self.properties.push((property, self.objects.len()));
            }
            Node::EndProperty => {
                let (property, object_depth) = self
                    .properties
                    .pop()
                    .ok_or(NodeStreamFault::UnmatchedEndProperty)?;
                if self.objects.len() != object_depth {
                    return Err(NodeStreamFault::MisnestedEndProperty);
                }

                let (owner, _) = self
                    .objects
                    .last_mut()
                    .ok_or(NodeStreamFault::PropertyWithoutObject)?;
                owner.properties.push(property);
            }
            Node::Value(value) => self.push_value(XamlValue::Value(value)),
            Node::Text { string_id, flags } => {
                self.push_value(XamlValue::Text(TextValue { string_id, flags }))
            }
            Node::EndOfAttributes | Node::EndOfStream => {}
        }
        Ok(())
    }

    fn push_value(&mut self, value: XamlValue) {
        match self.properties.last_mut() {
            Some((property, _)) => property.values.push(value),
            None => warn!(?value, "dropping value with no owning property"),
        }
    }

    fn finish(self) -> std::result::Result<NodeStream, NodeStreamFault> {
        if !self.objects.is_empty() {
            return Err(NodeStreamFault::UnclosedObjects(self.objects.len()));
        }
        if !self.properties.is_empty() {
            return Err(NodeStreamFault::UnclosedProperties(self.properties.len()));
        }
        let root = self.root.ok_or(NodeStreamFault::MissingRoot)?;

        Ok(NodeStream {
            root,
            namespaces: self.namespaces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{PropertyId, StringId, TypeId, XmlNamespaceId};
    use crate::value::Value;

    fn encode(nodes: &[Node]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for node in nodes {
            node.write_to(&mut bytes).unwrap();
        }
        bytes
    }

    fn read(nodes: &[Node]) -> Result<NodeStream> {
        let bytes = encode(nodes);
        NodeStream::read(&mut BinaryReader::new(&bytes))
    }

    fn start_object(id: u32) -> Node {
        Node::StartObject {
            type_id: TypeId::new(id),
            flags: 0,
        }
    }

    fn start_property(id: u32) -> Node {
        Node::StartProperty {
            property_id: PropertyId::new(id),
            flags: 0,
        }
    }

    fn fault(result: Result<NodeStream>) -> NodeStreamFault {
        match result {
            Err(Error::MalformedNodeStream { fault, .. }) => fault,
            other => panic!("expected malformed node stream, got {other:?}"),
        }
    }

    #[test]
    fn test_single_simple_property() {
        let stream = read(&[
            start_object(7),
            start_property(3),
            Node::Value(Value::Signed(42)),
            Node::EndProperty,
            Node::EndObject,
        ])
        .unwrap();

        let root = &stream.root;
        assert_eq!(root.type_id, TypeId::new(7));
        assert_eq!(root.properties.len(), 1);

        let property = &root.properties[0];
        assert_eq!(property.property_id, PropertyId::new(3));
        assert_eq!(
            property.simple_value(),
            Some(&XamlValue::Value(Value::Signed(42)))
        );
    }

    #[test]
    fn test_nested_objects_attach_to_enclosing_property() {
        let stream = read(&[
            start_object(0),
            start_property(0),
            start_object(1),
            start_property(1),
            Node::Text {
                string_id: StringId::new(4),
                flags: 0,
            },
            Node::EndProperty,
            Node::EndObject,
            start_object(2),
            Node::EndObject,
            Node::EndProperty,
            Node::EndObject,
        ])
        .unwrap();

        let children: Vec<_> = stream.root.properties[0].objects().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].type_id, TypeId::new(1));
        assert_eq!(children[0].properties[0].values.len(), 1);
        assert_eq!(children[1].type_id, TypeId::new(2));
        assert_eq!(stream.root.object_count(), 3);
    }

    #[test]
    fn test_line_info_tags_objects_and_properties() {
        let stream = read(&[
            Node::LineInfoAbsolute {
                line: 10,
                position: 4,
            },
            start_object(0),
            Node::LineInfo {
                line_delta: 2,
                position_delta: -2,
            },
            start_property(0),
            Node::Value(Value::Bool(true)),
            Node::EndProperty,
            Node::EndObject,
        ])
        .unwrap();

        assert_eq!(
            stream.root.line_info,
            LineInfo {
                line: 10,
                position: 4,
            }
        );
        assert_eq!(
            stream.root.properties[0].line_info,
            LineInfo {
                line: 12,
                position: 2,
            }
        );
    }

    #[test]
    fn test_line_delta_saturates() {
        let stream = read(&[
            Node::LineInfo {
                line_delta: -5,
                position_delta: 1,
            },
            start_object(0),
            Node::EndObject,
        ])
        .unwrap();

        assert_eq!(
            stream.root.line_info,
            LineInfo {
                line: 0,
                position: 1,
            }
        );
    }

    #[test]
    fn test_namespaces_are_kept_beside_the_tree() {
        let stream = read(&[
            Node::Namespace {
                namespace_id: XmlNamespaceId::new(0),
                flags: 0,
                uri: "http://schemas.microsoft.com/winfx/2006/xaml/presentation".to_string(),
            },
            start_object(0),
            Node::EndOfAttributes,
            Node::EndObject,
        ])
        .unwrap();

        assert_eq!(stream.namespaces.len(), 1);
        assert!(stream.root.properties.is_empty());
    }

    #[test]
    fn test_end_of_stream_stops_reading() {
        let mut bytes = encode(&[start_object(0), Node::EndObject, Node::EndOfStream]);
        // Garbage after the terminator is never looked at.
        bytes.extend_from_slice(&[0xFF, 0xFF]);

        assert!(NodeStream::read(&mut BinaryReader::new(&bytes)).is_ok());
    }

    #[test]
    fn test_unmatched_end_object() {
        let result = read(&[Node::EndObject]);
        assert!(matches!(
            result,
            Err(Error::MalformedNodeStream {
                offset: 0,
                fault: NodeStreamFault::UnmatchedEndObject,
            })
        ));
    }

    #[test]
    fn test_unmatched_end_property_reports_offset() {
        // StartObject is 6 bytes, so the stray EndProperty sits at offset 6.
        let result = read(&[start_object(0), Node::EndProperty]);
        assert!(matches!(
            result,
            Err(Error::MalformedNodeStream {
                offset: 6,
                fault: NodeStreamFault::UnmatchedEndProperty,
            })
        ));
    }

    #[test]
    fn test_misnested_end_object() {
        let result = read(&[start_object(0), start_property(0), Node::EndObject]);
        assert_eq!(fault(result), NodeStreamFault::MisnestedEndObject);
    }

    #[test]
    fn test_misnested_end_property() {
        let result = read(&[
            start_object(0),
            start_property(0),
            start_object(1),
            Node::EndProperty,
        ]);
        assert_eq!(fault(result), NodeStreamFault::MisnestedEndProperty);
    }

    #[test]
    fn test_property_without_object() {
        let result = read(&[start_property(0), Node::EndProperty]);
        assert_eq!(fault(result), NodeStreamFault::PropertyWithoutObject);
    }

    #[test]
    fn test_unclosed_nodes() {
        let result = read(&[start_object(0), start_property(0)]);
        assert_eq!(fault(result), NodeStreamFault::UnclosedObjects(1));

        let result = read(&[start_property(0)]);
        assert_eq!(fault(result), NodeStreamFault::UnclosedProperties(1));
    }

    #[test]
    fn test_missing_and_multiple_roots() {
        assert_eq!(fault(read(&[])), NodeStreamFault::MissingRoot);

        let result = read(&[start_object(0), Node::EndObject, start_object(1), Node::EndObject]);
        assert_eq!(fault(result), NodeStreamFault::MultipleRoots);
    }

    #[test]
    fn test_orphans_are_dropped() {
        let stream = read(&[
            Node::Value(Value::Signed(1)),
            start_object(0),
            start_object(1),
            Node::EndObject,
            Node::EndObject,
        ])
        .unwrap();

        assert_eq!(stream.root.type_id, TypeId::new(0));
        assert_eq!(stream.root.object_count(), 1);
    }

    #[test]
    fn test_unknown_tag_reports_offset() {
        let mut bytes = encode(&[start_object(0)]);
        bytes.push(0x42);

        let result = NodeStream::read(&mut BinaryReader::new(&bytes));
        assert!(matches!(
            result,
            Err(Error::MalformedNodeStream {
                offset: 6,
                fault: NodeStreamFault::UnknownNodeTag(0x42),
            })
        ));
    }

    #[test]
    fn test_start_and_end_counts_match() {
        let nodes = [
            start_object(0),
            start_property(0),
            start_object(1),
            Node::EndObject,
            start_object(1),
            Node::EndObject,
            Node::EndProperty,
            Node::EndObject,
        ];
        let starts = nodes
            .iter()
            .filter(|n| matches!(n, Node::StartObject { .. }))
            .count();
        let ends = nodes.iter().filter(|n| **n == Node::EndObject).count();
        assert_eq!(starts, ends);

        let stream = read(&nodes).unwrap();
        assert_eq!(stream.root.object_count(), starts);
    }

    /// Objects nested `depth` levels deep through property 0.
    fn nested(depth: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        for level in 0..depth {
            nodes.push(start_object(0));
            if level + 1 < depth {
                nodes.push(start_property(0));
            }
        }
        for level in 0..depth {
            if level > 0 {
                nodes.push(Node::EndProperty);
            }
            nodes.push(Node::EndObject);
        }
        nodes
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let stream = read(&nested(MAX_OBJECT_DEPTH)).unwrap();
        assert_eq!(stream.root.object_count(), MAX_OBJECT_DEPTH);
    }

    #[test]
    fn test_nesting_past_limit_is_rejected() {
        // Each level is a 6-byte StartObject plus a 6-byte StartProperty.
        let result = read(&nested(MAX_OBJECT_DEPTH + 1));
        match result {
            Err(Error::MalformedNodeStream { offset, fault }) => {
                assert_eq!(offset, MAX_OBJECT_DEPTH * 12);
                assert_eq!(fault, NodeStreamFault::NestingTooDeep(MAX_OBJECT_DEPTH));
            }
            other => panic!("expected nesting fault, got {other:?}"),
        }
    }
}
