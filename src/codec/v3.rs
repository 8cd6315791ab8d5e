//! Version 3: flat item table with reference compression.
//!
//! Every node and attribute becomes one entry of a single item array,
//! written in post-order so children and attributes always precede their
//! owner. Values and names live in a data pool at the front of the body;
//! items refer to pool entries and to earlier items by index. The optimize
//! pass replaces an item that deep-equals an earlier one with a reference
//! record, and collapses consecutive equivalent references into a single
//! record with a repeat count that fills several slots at once.
//!
//! Signed integers are sign-magnitude here too; the sign rides on the high
//! bit of the pool entry's type byte. Text is always UTF-8.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::{read_count, WriteOptions};
use crate::error::{FluxionError, ItemKind};
use crate::header::TextEncoding;
use crate::io::{ByteSink, ByteSource};
use crate::tree::{Attribute, CloneSpec, NodeId, Tree};
use crate::value::{
    pooled_payload, read_pooled_payload, Tolerance, Value, TYPE_FALSE, TYPE_I16, TYPE_I32,
    TYPE_I64, TYPE_STR,
};
use crate::varint::{read_varint_u32, write_varint};

const REFERENCE: u8 = 1 << 0;
const ATTRIBUTE: u8 = 1 << 1;
const HAS_NAME: u8 = 1 << 2;
const HAS_VALUE: u8 = 1 << 3;
// Node-only flags; attributes keep their value type in the high nibble.
const HAS_CHILDREN: u8 = 1 << 4;
const COPY_CHILDREN: u8 = 1 << 5;
const HAS_ATTRIBUTES: u8 = 1 << 6;
const COPY_ATTRIBUTES: u8 = 1 << 7;

/// Pool type byte: high bit marks a negative sign-magnitude integer.
const NEGATIVE: u8 = 0x80;

const SET_EXPLICIT: u8 = 0;
const SET_RANGE: u8 = 1;

// -----------------------------------------------------------------------------
// Data pool
// -----------------------------------------------------------------------------

/// Exact identity of a pool entry; floats are absent on purpose, they are
/// matched linearly within the write tolerance instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DataKey {
    Str(String),
    Bytes(Vec<u8>),
    Scalar(u8, u64),
}

#[derive(Default)]
struct DataPool {
    values: Vec<Value>,
    exact: BTreeMap<DataKey, usize>,
}

fn exact_key(value: &Value) -> Option<DataKey> {
    Some(match value {
        Value::Str(s) => DataKey::Str(s.clone()),
        Value::Bytes(b) => DataKey::Bytes(b.clone()),
        Value::Null | Value::Bool(_) => DataKey::Scalar(value.wire_type(), 0),
        Value::U8(v) => DataKey::Scalar(value.wire_type(), *v as u64),
        Value::I8(v) => DataKey::Scalar(value.wire_type(), *v as u8 as u64),
        Value::Char(v) | Value::U16(v) => DataKey::Scalar(value.wire_type(), *v as u64),
        Value::U32(v) => DataKey::Scalar(value.wire_type(), *v as u64),
        Value::U64(v) => DataKey::Scalar(value.wire_type(), *v),
        Value::I16(v) => DataKey::Scalar(type_byte_for(value), v.unsigned_abs() as u64),
        Value::I32(v) => DataKey::Scalar(type_byte_for(value), v.unsigned_abs() as u64),
        Value::I64(v) => DataKey::Scalar(type_byte_for(value), v.unsigned_abs()),
        Value::F32(_) | Value::F64(_) => return None,
    })
}

/// Wire type with the sign bit applied for negative signed integers.
fn type_byte_for(value: &Value) -> u8 {
    let mut byte = value.wire_type();
    if value.is_negative() {
        byte |= NEGATIVE;
    }
    byte
}

impl DataPool {
    /// Interns a value, reusing an entry that is structurally equal within
    /// the tolerance. Returns the pool index.
    fn intern(&mut self, value: &Value, tolerance: &Tolerance) -> usize {
        if let Some(key) = exact_key(value) {
            if let Some(&index) = self.exact.get(&key) {
                return index;
            }
            let index = self.values.len();
            self.exact.insert(key, index);
            self.values.push(value.clone());
            return index;
        }
        // Floats: first entry of the same type within the epsilon wins.
        if let Some(index) = self
            .values
            .iter()
            .position(|existing| existing.approx_eq(value, tolerance))
        {
            return index;
        }
        let index = self.values.len();
        self.values.push(value.clone());
        index
    }

    fn intern_name(&mut self, name: &str, tolerance: &Tolerance) -> usize {
        self.intern(&Value::Str(String::from(name)), tolerance)
    }
}

// -----------------------------------------------------------------------------
// Flatten
// -----------------------------------------------------------------------------

struct Item {
    is_attribute: bool,
    name: Option<usize>,
    value_type: u8,
    value: Option<usize>,
    children: Vec<usize>,
    attributes: Vec<usize>,
}

struct Flattener<'t> {
    tree: &'t Tree,
    tolerance: Tolerance,
    pool: DataPool,
    items: Vec<Item>,
}

/// Attributes carry their payload in the pool only for payload-bearing
/// types; null/true/false decode from the tag's type nibble alone.
fn attr_has_payload(type_id: u8) -> bool {
    type_id > TYPE_FALSE
}

impl<'t> Flattener<'t> {
    fn flatten_attribute(&mut self, attribute: &Attribute) -> usize {
        let name = attribute
            .name()
            .map(|n| self.pool.intern_name(n, &self.tolerance));
        let value_type = attribute.value.wire_type();
        let value = attr_has_payload(value_type)
            .then(|| self.pool.intern(&attribute.value, &self.tolerance));
        self.push_item(Item {
            is_attribute: true,
            name,
            value_type,
            value,
            children: Vec::new(),
            attributes: Vec::new(),
        })
    }

    fn flatten_node(&mut self, id: NodeId) -> usize {
        let tree = self.tree;
        let attributes = tree
            .attributes(id)
            .iter()
            .map(|attribute| self.flatten_attribute(attribute))
            .collect();
        let children = tree
            .children(id)
            .iter()
            .map(|&child| self.flatten_node(child))
            .collect();
        let name = tree.name(id).map(|n| self.pool.intern_name(n, &self.tolerance));
        let value = tree.value(id);
        let value_type = value.wire_type();
        let value = (!value.is_null()).then(|| self.pool.intern(value, &self.tolerance));
        self.push_item(Item {
            is_attribute: false,
            name,
            value_type,
            value,
            children,
            attributes,
        })
    }

    fn push_item(&mut self, item: Item) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }
}

fn count_items(tree: &Tree, id: NodeId) -> usize {
    1 + tree.attribute_count(id)
        + tree
            .children(id)
            .iter()
            .map(|&child| count_items(tree, child))
            .sum::<usize>()
}

// -----------------------------------------------------------------------------
// Optimize
// -----------------------------------------------------------------------------

/// Structural identity of an item, with child and attribute sets rewritten
/// to equivalence-class representatives so items equal through reference
/// chains still compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ItemClassKey {
    is_attribute: bool,
    name: Option<usize>,
    value_type: u8,
    value: Option<usize>,
    children: Vec<usize>,
    attributes: Vec<usize>,
}

struct Optimized {
    /// Reference target per item: the last earlier deep-equal item.
    reference: Vec<Option<usize>>,
    /// Equivalence class representative per item.
    class: Vec<usize>,
}

fn optimize(items: &[Item]) -> Optimized {
    let mut reference = Vec::with_capacity(items.len());
    let mut class = Vec::with_capacity(items.len());
    let mut seen: BTreeMap<ItemClassKey, (usize, usize)> = BTreeMap::new();

    for (index, item) in items.iter().enumerate() {
        let key = ItemClassKey {
            is_attribute: item.is_attribute,
            name: item.name,
            value_type: item.value_type,
            value: item.value,
            children: item.children.iter().map(|&c| class[c]).collect(),
            attributes: item.attributes.iter().map(|&a| class[a]).collect(),
        };
        match seen.get_mut(&key) {
            Some((representative, last)) => {
                reference.push(Some(*last));
                class.push(*representative);
                *last = index;
            }
            None => {
                reference.push(None);
                class.push(index);
                seen.insert(key, (index, index));
            }
        }
    }

    Optimized { reference, class }
}

// -----------------------------------------------------------------------------
// Writer
// -----------------------------------------------------------------------------

pub(crate) fn write(
    tree: &Tree,
    root: NodeId,
    options: &WriteOptions,
    sink: &mut ByteSink,
) -> Result<(), FluxionError> {
    let expected = count_items(tree, root);
    let mut flattener = Flattener {
        tree,
        tolerance: options.tolerance,
        pool: DataPool::default(),
        items: Vec::with_capacity(expected),
    };
    let root_index = flattener.flatten_node(root);
    let Flattener { pool, items, .. } = flattener;

    let optimized = if options.optimize {
        optimize(&items)
    } else {
        Optimized {
            reference: alloc::vec![None; items.len()],
            class: (0..items.len()).collect(),
        }
    };

    write_varint(sink, items.len() as u64);
    write_varint(sink, pool.values.len() as u64);
    for value in &pool.values {
        sink.write_u8(type_byte_for(value));
        sink.write_all(&pooled_payload(value, TextEncoding::Utf8));
    }

    let mut index = 0;
    while index < items.len() {
        match optimized.reference[index] {
            Some(target) => {
                // Extend the run over consecutive items of the same class.
                let mut repeat = 1;
                while index + repeat < items.len()
                    && optimized.reference[index + repeat].is_some()
                    && optimized.class[index + repeat] == optimized.class[index]
                {
                    repeat += 1;
                }
                write_reference(&items[index], target, repeat, sink);
                index += repeat;
            }
            None => {
                write_item(&items[index], sink);
                index += 1;
            }
        }
    }

    write_varint(sink, root_index as u64);
    Ok(())
}

/// A full reference copies name, value, children and attributes from its
/// target; the cleared hasName/hasValue bits are the copy selectors.
fn write_reference(item: &Item, target: usize, repeat: usize, sink: &mut ByteSink) {
    let mut tag = REFERENCE;
    if item.is_attribute {
        tag |= ATTRIBUTE | (item.value_type << 4);
    } else {
        if !item.children.is_empty() {
            tag |= COPY_CHILDREN;
        }
        if !item.attributes.is_empty() {
            tag |= COPY_ATTRIBUTES;
        }
    }
    sink.write_u8(tag);
    write_varint(sink, target as u64);
    write_varint(sink, repeat as u64);
}

fn write_item(item: &Item, sink: &mut ByteSink) {
    let mut tag = 0u8;
    if item.is_attribute {
        tag |= ATTRIBUTE | (item.value_type << 4);
    } else {
        if !item.children.is_empty() {
            tag |= HAS_CHILDREN;
        }
        if !item.attributes.is_empty() {
            tag |= HAS_ATTRIBUTES;
        }
    }
    if item.name.is_some() {
        tag |= HAS_NAME;
    }
    if item.value.is_some() {
        tag |= HAS_VALUE;
    }
    sink.write_u8(tag);

    if let Some(name) = item.name {
        write_varint(sink, name as u64);
    }
    if let Some(value) = item.value {
        if !item.is_attribute {
            sink.write_u8(item.value_type);
        }
        write_varint(sink, value as u64);
    }
    if !item.is_attribute {
        if !item.children.is_empty() {
            write_set(&item.children, sink);
        }
        if !item.attributes.is_empty() {
            write_set(&item.attributes, sink);
        }
    }
}

/// Strictly consecutive step-1 runs of length two or more compress to a
/// min/max range; every other set is written out explicitly.
fn write_set(ids: &[usize], sink: &mut ByteSink) {
    let consecutive = ids.len() >= 2 && ids.windows(2).all(|pair| pair[1] == pair[0] + 1);
    if consecutive {
        sink.write_u8(SET_RANGE);
        write_varint(sink, ids[0] as u64);
        write_varint(sink, ids[ids.len() - 1] as u64);
    } else {
        sink.write_u8(SET_EXPLICIT);
        write_varint(sink, ids.len() as u64);
        for &id in ids {
            write_varint(sink, id as u64);
        }
    }
}

// -----------------------------------------------------------------------------
// Reader
// -----------------------------------------------------------------------------

enum Slot {
    Node(NodeId),
    Attr(Attribute),
}

pub(crate) fn read(source: &mut ByteSource<'_>) -> Result<(Tree, NodeId), FluxionError> {
    let item_count = read_varint_u32(source)? as usize;
    let data_count = read_count(source)?;

    let mut pool = Vec::with_capacity(data_count);
    for _ in 0..data_count {
        let type_byte = source.read_u8()?;
        let negative = type_byte & NEGATIVE != 0;
        let type_id = type_byte & !NEGATIVE;
        if type_id > 15 {
            return Err(FluxionError::UnknownValueType(type_byte));
        }
        if negative && !matches!(type_id, TYPE_I16 | TYPE_I32 | TYPE_I64) {
            return Err(FluxionError::UnknownValueType(type_byte));
        }
        pool.push(read_pooled_payload(
            type_id,
            negative,
            source,
            TextEncoding::Utf8,
        )?);
    }

    let mut tree = Tree::new();
    // A reference run can legitimately fill more slots than there are bytes
    // left, so only the initial capacity is clamped to the input size.
    let mut slots: Vec<Slot> = Vec::with_capacity(item_count.min(source.remaining()));
    while slots.len() < item_count {
        read_record(&mut tree, &mut slots, &pool, item_count, source)?;
    }

    let root_index = read_varint_u32(source)? as usize;
    let root = node_at(&slots, root_index)?;
    let root = if tree.is_root(root) {
        root
    } else {
        tree.clone_node(root, &CloneSpec::default())
    };
    Ok((tree, root))
}

fn read_record(
    tree: &mut Tree,
    slots: &mut Vec<Slot>,
    pool: &[Value],
    item_count: usize,
    source: &mut ByteSource<'_>,
) -> Result<(), FluxionError> {
    let tag = source.read_u8()?;
    let is_attribute = tag & ATTRIBUTE != 0;
    let has_name = tag & HAS_NAME != 0;
    let has_value = tag & HAS_VALUE != 0;

    let reference = if tag & REFERENCE != 0 {
        let target = read_varint_u32(source)? as usize;
        let repeat = read_varint_u32(source)? as usize;
        let overruns = slots
            .len()
            .checked_add(repeat)
            .map_or(true, |end| end > item_count);
        if repeat == 0 || overruns {
            return Err(FluxionError::DisorientedRead(tag));
        }
        Some((target, repeat))
    } else {
        None
    };

    let name = if has_name {
        let id = read_varint_u32(source)? as usize;
        Some(pool_name(pool, id)?)
    } else {
        None
    };

    let value = if has_value {
        let declared = if is_attribute {
            tag >> 4
        } else {
            source.read_u8()?
        };
        let id = read_varint_u32(source)? as usize;
        Some(pool_value(pool, declared, id)?)
    } else {
        None
    };

    if is_attribute {
        let attribute = match reference {
            Some((target, _)) => {
                let mut attribute = attr_at(slots, target)?.clone();
                if let Some(name) = &name {
                    attribute.set_name(Some(name));
                }
                if let Some(value) = &value {
                    attribute.value = value.clone();
                }
                attribute
            }
            None => {
                let value = match value {
                    Some(value) => value,
                    // Zero-payload and omitted values decode from the type
                    // nibble alone.
                    None => Value::canonical_default(tag >> 4)?,
                };
                Attribute::new(name.as_deref(), value)
            }
        };
        let repeat = reference.map_or(1, |(_, repeat)| repeat);
        for _ in 0..repeat {
            slots.push(Slot::Attr(attribute.clone()));
        }
        return Ok(());
    }

    // Node records: the own-set fields follow the value.
    let children = if tag & HAS_CHILDREN != 0 {
        Some(read_set(source, slots.len(), ItemKind::Node)?)
    } else {
        None
    };
    let attributes = if tag & HAS_ATTRIBUTES != 0 {
        Some(read_set(source, slots.len(), ItemKind::Attribute)?)
    } else {
        None
    };

    let repeat = reference.map_or(1, |(_, repeat)| repeat);
    for _ in 0..repeat {
        let id = match reference {
            Some((target, _)) => {
                let base = node_at(slots, target)?;
                let spec = CloneSpec {
                    name: !has_name,
                    value: !has_value,
                    children: tag & COPY_CHILDREN != 0,
                    attributes: tag & COPY_ATTRIBUTES != 0,
                };
                tree.clone_node(base, &spec)
            }
            None => tree.add_node(None, Value::Null),
        };
        if let Some(name) = &name {
            tree.set_name(id, Some(name));
        }
        if let Some(value) = &value {
            tree.set_value(id, value.clone());
        }
        if let Some(children) = &children {
            for &child_index in children {
                let child = claim_node(tree, slots, child_index)?;
                tree.add_child(id, child)?;
            }
        }
        if let Some(attributes) = &attributes {
            for &attr_index in attributes {
                let attribute = attr_at(slots, attr_index)?.clone();
                tree.push_attribute(id, attribute);
            }
        }
        slots.push(Slot::Node(id));
    }
    Ok(())
}

/// Reads a child or attribute set. Every id must name an already
/// materialized item.
fn read_set(
    source: &mut ByteSource<'_>,
    limit: usize,
    wanted: ItemKind,
) -> Result<Vec<usize>, FluxionError> {
    let kind = source.read_u8()?;
    match kind {
        SET_EXPLICIT => {
            let count = read_count(source)?;
            let mut ids = Vec::with_capacity(count);
            for _ in 0..count {
                let id = read_varint_u32(source)? as usize;
                if id >= limit {
                    return Err(FluxionError::UnexpectedItemType { index: id, wanted });
                }
                ids.push(id);
            }
            Ok(ids)
        }
        SET_RANGE => {
            let min = read_varint_u32(source)? as usize;
            let max = read_varint_u32(source)? as usize;
            if max < min {
                return Err(FluxionError::DisorientedRead(kind));
            }
            if max >= limit {
                return Err(FluxionError::UnexpectedItemType { index: max, wanted });
            }
            Ok((min..=max).collect())
        }
        other => Err(FluxionError::DisorientedRead(other)),
    }
}

fn node_at(slots: &[Slot], index: usize) -> Result<NodeId, FluxionError> {
    match slots.get(index) {
        Some(Slot::Node(id)) => Ok(*id),
        _ => Err(FluxionError::UnexpectedItemType {
            index,
            wanted: ItemKind::Node,
        }),
    }
}

fn attr_at(slots: &[Slot], index: usize) -> Result<&Attribute, FluxionError> {
    match slots.get(index) {
        Some(Slot::Attr(attribute)) => Ok(attribute),
        _ => Err(FluxionError::UnexpectedItemType {
            index,
            wanted: ItemKind::Attribute,
        }),
    }
}

/// Hands out the materialized node the first time its slot is claimed as a
/// child; later claims receive an independent deep copy.
fn claim_node(
    tree: &mut Tree,
    slots: &[Slot],
    index: usize,
) -> Result<NodeId, FluxionError> {
    let id = node_at(slots, index)?;
    if tree.is_root(id) {
        Ok(id)
    } else {
        Ok(tree.clone_node(id, &CloneSpec::default()))
    }
}

fn pool_value(pool: &[Value], declared: u8, index: usize) -> Result<Value, FluxionError> {
    let entry = pool.get(index).ok_or(FluxionError::AnalyzedDataMissing)?;
    if entry.wire_type() != declared {
        return Err(FluxionError::ValueTypeMismatch {
            expected: declared,
            actual: entry.wire_type(),
        });
    }
    Ok(entry.clone())
}

fn pool_name(pool: &[Value], index: usize) -> Result<String, FluxionError> {
    match pool.get(index).ok_or(FluxionError::AnalyzedDataMissing)? {
        Value::Str(s) => Ok(s.clone()),
        other => Err(FluxionError::ValueTypeMismatch {
            expected: TYPE_STR,
            actual: other.wire_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::{read_tree, write_tree};
    use crate::value::Tolerance;

    use super::*;

    fn options(optimize: bool) -> WriteOptions {
        WriteOptions {
            version: 3,
            optimize,
            ..WriteOptions::default()
        }
    }

    fn repeated_users() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.add_node(Some("Users"), Value::Null);
        for _ in 0..100 {
            let child = tree.add_node(Some("User"), Value::from("mike"));
            tree.add_child(root, child).unwrap();
        }
        (tree, root)
    }

    #[test]
    fn repeated_subtrees_collapse_into_a_run() {
        let (tree, root) = repeated_users();
        let optimized_bytes = write_tree(&tree, root, &options(true)).unwrap();
        let plain_bytes = write_tree(&tree, root, &options(false)).unwrap();
        // 99 of the 100 identical children fold into one reference record.
        assert!(optimized_bytes.len() < plain_bytes.len() / 4);

        for bytes in [optimized_bytes, plain_bytes] {
            let (decoded, decoded_root) = read_tree(&bytes).unwrap();
            assert!(tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()));
            assert_eq!(decoded.child_count(decoded_root), 100);
        }
    }

    #[test]
    fn consecutive_children_use_a_range_set() {
        let (tree, root) = repeated_users();
        let bytes = write_tree(&tree, root, &options(true)).unwrap();
        // Children are items 0..=99: the root's set must be kind 1 over the
        // full run, so the explicit-list kind byte followed by 100 ids never
        // appears and the whole file stays tiny.
        assert!(bytes.len() < 64, "got {} bytes", bytes.len());
    }

    #[test]
    fn optimizer_respects_the_float_tolerance() {
        let mut tree = Tree::new();
        let root = tree.add_node(None, Value::Null);
        let a = tree.add_node(Some("t"), Value::F64(1.0));
        let b = tree.add_node(Some("t"), Value::F64(1.0004));
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        let bytes = write_tree(&tree, root, &options(true)).unwrap();
        let (decoded, decoded_root) = read_tree(&bytes).unwrap();
        // Both children resolved to the first pooled float.
        assert_eq!(
            decoded.value(decoded.children(decoded_root)[0]),
            &Value::F64(1.0)
        );
        assert_eq!(
            decoded.value(decoded.children(decoded_root)[1]),
            &Value::F64(1.0)
        );
        assert!(tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()));
    }

    #[test]
    fn negative_integers_ride_the_pool_type_byte() {
        let mut tree = Tree::new();
        let root = tree.add_node(None, Value::Null);
        for v in [42i64, -42, 0] {
            let child = tree.add_node(None, Value::I64(v));
            tree.add_child(root, child).unwrap();
        }
        let bytes = write_tree(&tree, root, &options(true)).unwrap();
        let (decoded, decoded_root) = read_tree(&bytes).unwrap();
        let children = decoded.children(decoded_root);
        assert_eq!(decoded.value(children[0]), &Value::I64(42));
        assert_eq!(decoded.value(children[1]), &Value::I64(-42));
        assert_eq!(decoded.value(children[2]), &Value::I64(0));
    }

    #[test]
    fn attribute_types_live_in_the_tag_nibble() {
        let mut tree = Tree::new();
        let root = tree.add_node(Some("n"), Value::Null);
        tree.push_attribute(root, Attribute::new(Some("ok"), Value::Bool(true)));
        tree.push_attribute(root, Attribute::new(Some("off"), Value::Bool(false)));
        tree.push_attribute(root, Attribute::new(None, Value::Null));
        tree.push_attribute(root, Attribute::new(Some("Age"), Value::I32(35)));

        let bytes = write_tree(&tree, root, &options(true)).unwrap();
        let (decoded, decoded_root) = read_tree(&bytes).unwrap();
        assert!(tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()));
    }

    #[test]
    fn wrong_kind_root_index_is_rejected() {
        // One attribute on one node: item 0 is the attribute. Point the root
        // index at it.
        let mut tree = Tree::new();
        let root = tree.add_node(Some("n"), Value::Null);
        tree.push_attribute(root, Attribute::new(Some("a"), Value::Bool(true)));
        let mut bytes = write_tree(&tree, root, &options(false)).unwrap();
        let last = bytes.len() - 1;
        assert_eq!(bytes[last], 1, "root index should be item 1");
        bytes[last] = 0;
        assert_eq!(
            read_tree(&bytes).unwrap_err(),
            FluxionError::UnexpectedItemType {
                index: 0,
                wanted: ItemKind::Node,
            }
        );
    }

    #[test]
    fn undefined_set_kind_is_a_disoriented_read() {
        let (tree, root) = repeated_users();
        let bytes = write_tree(&tree, root, &options(false)).unwrap();
        // The file ends with the root record's range set followed by the
        // root index: ... kind, min, max, rootIndex.
        let mut corrupted = bytes.clone();
        let kind_pos = bytes.len() - 4;
        corrupted[kind_pos] = 7;
        assert_eq!(
            read_tree(&corrupted).unwrap_err(),
            FluxionError::DisorientedRead(7)
        );
    }
}
