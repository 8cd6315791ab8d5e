//! Version 1: single-pass prefix-order codec.
//!
//! Each node is one tag byte, optional child count, optional name, the
//! inline value payload, then its attributes and its children. The reader
//! consumes the stream strictly left to right; nothing seeks.

use alloc::string::String;

use crate::codec::read_count;
use crate::error::FluxionError;
use crate::header::TextEncoding;
use crate::io::{ByteSink, ByteSource};
use crate::text;
use crate::tree::{Attribute, NodeId, Tree};
use crate::value::{read_v1_payload, write_v1_payload};
use crate::varint::write_varint;

/// Tag flags shared by node and attribute records. The low nibble is the
/// value type id.
const HAS_NAME: u8 = 1 << 4;
const NO_CHILDREN: u8 = 1 << 5;
const NO_ATTRS: u8 = 1 << 6;

pub(crate) fn write(tree: &Tree, root: NodeId, encoding: TextEncoding, sink: &mut ByteSink) {
    write_node(tree, root, encoding, sink);
}

fn write_node(tree: &Tree, id: NodeId, encoding: TextEncoding, sink: &mut ByteSink) {
    let name = tree.name(id);
    let children = tree.children(id);
    let attributes = tree.attributes(id);

    let mut tag = tree.value(id).wire_type();
    if name.is_some() {
        tag |= HAS_NAME;
    }
    if children.is_empty() {
        tag |= NO_CHILDREN;
    }
    if attributes.is_empty() {
        tag |= NO_ATTRS;
    }
    sink.write_u8(tag);

    if !children.is_empty() {
        write_varint(sink, children.len() as u64);
    }
    if let Some(name) = name {
        write_name(name, encoding, sink);
    }
    write_v1_payload(tree.value(id), sink, encoding);

    if !attributes.is_empty() {
        write_varint(sink, attributes.len() as u64);
        for attribute in attributes {
            write_attribute(attribute, encoding, sink);
        }
    }
    for &child in children {
        write_node(tree, child, encoding, sink);
    }
}

fn write_attribute(attribute: &Attribute, encoding: TextEncoding, sink: &mut ByteSink) {
    let mut tag = attribute.value.wire_type();
    if attribute.name().is_some() {
        tag |= HAS_NAME;
    }
    sink.write_u8(tag);
    if let Some(name) = attribute.name() {
        write_name(name, encoding, sink);
    }
    write_v1_payload(&attribute.value, sink, encoding);
}

fn write_name(name: &str, encoding: TextEncoding, sink: &mut ByteSink) {
    let bytes = text::encode_str(name, encoding);
    write_varint(sink, bytes.len() as u64);
    sink.write_all(&bytes);
}

pub(crate) fn read(
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<(Tree, NodeId), FluxionError> {
    let mut tree = Tree::new();
    let root = read_node(&mut tree, source, encoding)?;
    Ok((tree, root))
}

fn read_node(
    tree: &mut Tree,
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<NodeId, FluxionError> {
    let tag = source.read_u8()?;
    let type_id = tag & 0x0f;

    let child_count = if tag & NO_CHILDREN == 0 {
        read_count(source)?
    } else {
        0
    };
    let name = if tag & HAS_NAME != 0 {
        Some(read_name(source, encoding)?)
    } else {
        None
    };
    let value = read_v1_payload(type_id, source, encoding)?;
    let id = tree.add_node(name.as_deref(), value);

    if tag & NO_ATTRS == 0 {
        let attr_count = read_count(source)?;
        for _ in 0..attr_count {
            let attribute = read_attribute(source, encoding)?;
            tree.push_attribute(id, attribute);
        }
    }
    for _ in 0..child_count {
        let child = read_node(tree, source, encoding)?;
        tree.add_child(id, child)?;
    }
    Ok(id)
}

fn read_attribute(
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<Attribute, FluxionError> {
    let tag = source.read_u8()?;
    let name = if tag & HAS_NAME != 0 {
        Some(read_name(source, encoding)?)
    } else {
        None
    };
    let value = read_v1_payload(tag & 0x0f, source, encoding)?;
    Ok(Attribute::new(name.as_deref(), value))
}

fn read_name(
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<String, FluxionError> {
    let len = read_count(source)?;
    text::decode_str(source.read_exact(len)?, encoding)
}
