//! Version 2: pooled values with a seek-based reader.
//!
//! The writer runs two passes. Analysis walks the tree and interns every
//! name and every payload-bearing value into a shared pool (strings by
//! content, byte arrays by SHA-256 digest, scalars by type and canonical
//! bits). Estimation then fixes the absolute byte offset of every entry
//! before anything is emitted: the body starts with `varint(treeStart)`,
//! whose own length participates in the fixed point. The tree records that
//! follow carry pool offsets instead of payloads.
//!
//! Signed i16/i32/i64 are sign-magnitude: the magnitude is always pooled
//! (so +n and -n share one entry) and the tag's unique flag carries the
//! sign. For every other type the unique flag stands for the canonical
//! empty/zero value and suppresses the offset entirely.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use sha2::{Digest, Sha256};

use crate::codec::read_count;
use crate::error::FluxionError;
use crate::header::TextEncoding;
use crate::io::{ByteSink, ByteSource};
use crate::text;
use crate::tree::{Attribute, NodeId, Tree};
use crate::value::{
    pooled_payload, read_pooled_payload, Value, TYPE_FALSE, TYPE_I16, TYPE_I32, TYPE_I64,
    TYPE_NULL, TYPE_TRUE,
};
use crate::varint::{read_varint, varint_len, write_varint};

const HAS_NAME: u8 = 1 << 4;
const NO_CHILDREN: u8 = 1 << 5;
const NO_ATTRS: u8 = 1 << 6;
const UNIQUE: u8 = 1 << 7;

// -----------------------------------------------------------------------------
// Analysis
// -----------------------------------------------------------------------------

/// Identity of a pool entry. Scalars carry their canonical bits (magnitude
/// for the sign-magnitude types, raw bits for floats), so +n and -n of the
/// same type collapse into one entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PoolKey {
    Str(String),
    Digest([u8; 32]),
    Scalar(u8, u64),
}

struct PoolEntry {
    payload: Vec<u8>,
    offset: u64,
}

#[derive(Default)]
struct Analysis {
    entries: Vec<PoolEntry>,
    index: BTreeMap<PoolKey, usize>,
}

/// True when the wire form carries a pool offset: always for the
/// sign-magnitude types, otherwise for non-default values.
fn stores_pool_data(value: &Value) -> bool {
    value.is_signed_varint() || !value.is_canonical_default()
}

fn unique_flag(value: &Value) -> bool {
    if value.is_signed_varint() {
        value.is_negative()
    } else {
        value.is_canonical_default()
    }
}

fn pool_key(value: &Value) -> Option<PoolKey> {
    if !stores_pool_data(value) {
        return None;
    }
    Some(match value {
        Value::Str(s) => PoolKey::Str(s.clone()),
        Value::Bytes(b) => PoolKey::Digest(Sha256::digest(b).into()),
        Value::U8(v) => PoolKey::Scalar(value.wire_type(), *v as u64),
        Value::I8(v) => PoolKey::Scalar(value.wire_type(), *v as u8 as u64),
        Value::Char(v) | Value::U16(v) => PoolKey::Scalar(value.wire_type(), *v as u64),
        Value::U32(v) => PoolKey::Scalar(value.wire_type(), *v as u64),
        Value::U64(v) => PoolKey::Scalar(value.wire_type(), *v),
        Value::I16(v) => PoolKey::Scalar(value.wire_type(), v.unsigned_abs() as u64),
        Value::I32(v) => PoolKey::Scalar(value.wire_type(), v.unsigned_abs() as u64),
        Value::I64(v) => PoolKey::Scalar(value.wire_type(), v.unsigned_abs()),
        Value::F32(v) => PoolKey::Scalar(value.wire_type(), v.to_bits() as u64),
        Value::F64(v) => PoolKey::Scalar(value.wire_type(), v.to_bits()),
        Value::Null | Value::Bool(_) => return None,
    })
}

impl Analysis {
    fn collect_node(&mut self, tree: &Tree, id: NodeId, encoding: TextEncoding) {
        if let Some(name) = tree.name(id) {
            self.intern_str(name, encoding);
        }
        self.intern_value(tree.value(id), encoding);
        for attribute in tree.attributes(id) {
            if let Some(name) = attribute.name() {
                self.intern_str(name, encoding);
            }
            self.intern_value(&attribute.value, encoding);
        }
        for &child in tree.children(id) {
            self.collect_node(tree, child, encoding);
        }
    }

    fn intern_str(&mut self, name: &str, encoding: TextEncoding) {
        let key = PoolKey::Str(String::from(name));
        if self.index.contains_key(&key) {
            return;
        }
        let bytes = text::encode_str(name, encoding);
        let mut sink = ByteSink::new();
        write_varint(&mut sink, bytes.len() as u64);
        sink.write_all(&bytes);
        self.push_entry(key, sink.into_bytes());
    }

    fn intern_value(&mut self, value: &Value, encoding: TextEncoding) {
        let Some(key) = pool_key(value) else {
            return;
        };
        if self.index.contains_key(&key) {
            return;
        }
        self.push_entry(key, pooled_payload(value, encoding));
    }

    fn push_entry(&mut self, key: PoolKey, payload: Vec<u8>) {
        self.index.insert(key, self.entries.len());
        self.entries.push(PoolEntry { payload, offset: 0 });
    }

    fn str_offset(&self, name: &str) -> Result<u64, FluxionError> {
        let key = PoolKey::Str(String::from(name));
        self.offset_of(&key)
    }

    fn value_offset(&self, value: &Value) -> Result<u64, FluxionError> {
        let key = pool_key(value).ok_or(FluxionError::AnalyzedDataMissing)?;
        self.offset_of(&key)
    }

    fn offset_of(&self, key: &PoolKey) -> Result<u64, FluxionError> {
        let index = *self
            .index
            .get(key)
            .ok_or(FluxionError::AnalyzedDataMissing)?;
        Ok(self.entries[index].offset)
    }
}

// -----------------------------------------------------------------------------
// Writer
// -----------------------------------------------------------------------------

pub(crate) fn write(
    tree: &Tree,
    root: NodeId,
    encoding: TextEncoding,
    sink: &mut ByteSink,
) -> Result<(), FluxionError> {
    let mut analysis = Analysis::default();
    analysis.collect_node(tree, root, encoding);

    // Estimation: the tree starts right after the pool, and the varint
    // holding that position is itself part of the layout. Fixed point over
    // the prefix length.
    let pool_size: u64 = analysis.entries.iter().map(|e| e.payload.len() as u64).sum();
    let base = sink.position();
    let mut prefix_len = 1u64;
    loop {
        let next = varint_len(base + prefix_len + pool_size);
        if next == prefix_len {
            break;
        }
        prefix_len = next;
    }
    let tree_start = base + prefix_len + pool_size;

    write_varint(sink, tree_start);
    for entry in &mut analysis.entries {
        entry.offset = sink.position();
        sink.write_all(&entry.payload);
    }
    if sink.position() != tree_start {
        return Err(FluxionError::EstimationMismatch {
            expected: tree_start,
            actual: sink.position(),
        });
    }

    write_node(tree, root, &analysis, sink)
}

fn write_node(
    tree: &Tree,
    id: NodeId,
    analysis: &Analysis,
    sink: &mut ByteSink,
) -> Result<(), FluxionError> {
    let value = tree.value(id);
    let name = tree.name(id);
    let children = tree.children(id);
    let attributes = tree.attributes(id);

    let mut tag = value.wire_type();
    if name.is_some() {
        tag |= HAS_NAME;
    }
    if children.is_empty() {
        tag |= NO_CHILDREN;
    }
    if attributes.is_empty() {
        tag |= NO_ATTRS;
    }
    if unique_flag(value) {
        tag |= UNIQUE;
    }
    sink.write_u8(tag);

    if !children.is_empty() {
        write_varint(sink, children.len() as u64);
    }
    if let Some(name) = name {
        write_varint(sink, analysis.str_offset(name)?);
    }
    if stores_pool_data(value) {
        write_varint(sink, analysis.value_offset(value)?);
    }
    if !attributes.is_empty() {
        write_varint(sink, attributes.len() as u64);
        for attribute in attributes {
            write_attribute(attribute, analysis, sink)?;
        }
    }
    for &child in children {
        write_node(tree, child, analysis, sink)?;
    }
    Ok(())
}

fn write_attribute(
    attribute: &Attribute,
    analysis: &Analysis,
    sink: &mut ByteSink,
) -> Result<(), FluxionError> {
    // The flag applies to the attribute's own value type, never the
    // enclosing node's.
    let mut tag = attribute.value.wire_type();
    if attribute.name().is_some() {
        tag |= HAS_NAME;
    }
    if unique_flag(&attribute.value) {
        tag |= UNIQUE;
    }
    sink.write_u8(tag);

    if let Some(name) = attribute.name() {
        write_varint(sink, analysis.str_offset(name)?);
    }
    if stores_pool_data(&attribute.value) {
        write_varint(sink, analysis.value_offset(&attribute.value)?);
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Reader
// -----------------------------------------------------------------------------

pub(crate) fn read(
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<(Tree, NodeId), FluxionError> {
    let tree_start = read_varint(source)?;
    source.seek(tree_start)?;
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
    let unique = tag & UNIQUE != 0;

    let child_count = if tag & NO_CHILDREN == 0 {
        read_count(source)?
    } else {
        0
    };
    let name = if tag & HAS_NAME != 0 {
        Some(read_pooled_name(source, encoding)?)
    } else {
        None
    };
    let value = read_value(type_id, unique, source, encoding)?;
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
        Some(read_pooled_name(source, encoding)?)
    } else {
        None
    };
    let value = read_value(tag & 0x0f, tag & UNIQUE != 0, source, encoding)?;
    Ok(Attribute::new(name.as_deref(), value))
}

/// Resolves the value for a tag. Sign-magnitude types always follow their
/// offset (the unique flag is their sign); everything else short-circuits
/// to the canonical form when the flag is set.
fn read_value(
    type_id: u8,
    unique: bool,
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<Value, FluxionError> {
    match type_id {
        TYPE_NULL | TYPE_TRUE | TYPE_FALSE => Value::canonical_default(type_id),
        TYPE_I16 | TYPE_I32 | TYPE_I64 => {
            let offset = read_varint(source)?;
            read_at(source, offset, |s| {
                read_pooled_payload(type_id, unique, s, encoding)
            })
        }
        _ if unique => Value::canonical_default(type_id),
        _ => {
            let offset = read_varint(source)?;
            read_at(source, offset, |s| {
                read_pooled_payload(type_id, false, s, encoding)
            })
        }
    }
}

fn read_pooled_name(
    source: &mut ByteSource<'_>,
    encoding: TextEncoding,
) -> Result<String, FluxionError> {
    let offset = read_varint(source)?;
    read_at(source, offset, |s| {
        let len = read_count(s)?;
        text::decode_str(s.read_exact(len)?, encoding)
    })
}

/// Saves the cursor, decodes at `offset`, restores the cursor.
fn read_at<T>(
    source: &mut ByteSource<'_>,
    offset: u64,
    decode: impl FnOnce(&mut ByteSource<'_>) -> Result<T, FluxionError>,
) -> Result<T, FluxionError> {
    let saved = source.position();
    source.seek(offset)?;
    let result = decode(source)?;
    source.seek(saved)?;
    Ok(result)
}
