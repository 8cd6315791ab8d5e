//! Property tests: randomized trees and varints through every codec.
//!
//! The v2 estimation property is implicit in every successful write: the
//! writer fails with `EstimationMismatch` whenever the emitted pool misses
//! the predicted tree start.

mod common;

use fluxion::{Attribute, NodeId, Tolerance, Tree, Value, WriteOptions};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct NodeSpec {
    name: Option<String>,
    value: Value,
    attributes: Vec<(Option<String>, Value)>,
    children: Vec<NodeSpec>,
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let integers = prop_oneof![
        any::<u8>().prop_map(Value::U8),
        any::<i8>().prop_map(Value::I8),
        any::<u16>().prop_map(Value::Char),
        any::<i16>().prop_map(Value::I16),
        any::<u16>().prop_map(Value::U16),
        any::<i32>().prop_map(Value::I32),
        any::<u32>().prop_map(Value::U32),
        any::<i64>().prop_map(Value::I64),
        any::<u64>().prop_map(Value::U64),
    ];
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        integers,
        (-1.0e6f32..1.0e6f32).prop_map(Value::F32),
        (-1.0e12f64..1.0e12f64).prop_map(Value::F64),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::Str),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

fn name_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-zA-Z][a-zA-Z0-9]{0,8}")
}

fn attributes_strategy() -> impl Strategy<Value = Vec<(Option<String>, Value)>> {
    proptest::collection::vec((name_strategy(), value_strategy()), 0..3)
}

fn node_spec_strategy() -> impl Strategy<Value = NodeSpec> {
    let leaf = (name_strategy(), value_strategy(), attributes_strategy()).prop_map(
        |(name, value, attributes)| NodeSpec {
            name,
            value,
            attributes,
            children: Vec::new(),
        },
    );
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            name_strategy(),
            value_strategy(),
            attributes_strategy(),
            proptest::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, value, attributes, children)| NodeSpec {
                name,
                value,
                attributes,
                children,
            })
    })
}

fn build(tree: &mut Tree, spec: &NodeSpec) -> NodeId {
    let id = tree.add_node(spec.name.as_deref(), spec.value.clone());
    for (name, value) in &spec.attributes {
        tree.push_attribute(id, Attribute::new(name.as_deref(), value.clone()));
    }
    for child_spec in &spec.children {
        let child = build(tree, child_spec);
        tree.add_child(id, child).expect("fresh nodes cannot cycle");
    }
    id
}

proptest! {
    #[test]
    fn varint_round_trips(n in any::<u64>()) {
        let mut sink = fluxion::io::ByteSink::new();
        fluxion::varint::write_varint(&mut sink, n);
        let bytes = sink.into_bytes();
        prop_assert_eq!(bytes.len() as u64, fluxion::varint::varint_len(n));
        let mut source = fluxion::io::ByteSource::new(&bytes);
        prop_assert_eq!(fluxion::varint::read_varint(&mut source).unwrap(), n);
    }

    #[test]
    fn every_version_round_trips(spec in node_spec_strategy(), version in 1u8..=3) {
        let mut tree = Tree::new();
        let root = build(&mut tree, &spec);
        let options = WriteOptions { version, ..WriteOptions::default() };
        let bytes = fluxion::write(&tree, root, &options).unwrap();
        prop_assert_eq!(&bytes[..4], &[0x46, 0x4c, 0x58, version]);

        let (decoded, decoded_root) = fluxion::read(&bytes).unwrap();
        prop_assert_eq!(decoded.version(), version);
        prop_assert!(
            tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()),
            "structure lost at v{}", version
        );
    }

    #[test]
    fn v3_reference_compression_is_sound(spec in node_spec_strategy()) {
        let mut tree = Tree::new();
        let root = build(&mut tree, &spec);
        let optimized = fluxion::write(
            &tree,
            root,
            &WriteOptions { version: 3, ..WriteOptions::default() },
        )
        .unwrap();
        let plain = fluxion::write(
            &tree,
            root,
            &WriteOptions { version: 3, optimize: false, ..WriteOptions::default() },
        )
        .unwrap();
        prop_assert!(optimized.len() <= plain.len());

        let (decoded, decoded_root) = fluxion::read(&optimized).unwrap();
        prop_assert!(tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()));
    }

    #[test]
    fn truncated_files_never_panic(spec in node_spec_strategy(), version in 1u8..=3, cut in 0usize..64) {
        let mut tree = Tree::new();
        let root = build(&mut tree, &spec);
        let options = WriteOptions { version, ..WriteOptions::default() };
        let bytes = fluxion::write(&tree, root, &options).unwrap();
        let cut = cut.min(bytes.len());
        // Any prefix either decodes cleanly or fails with a codec error.
        let _ = fluxion::read(&bytes[..bytes.len() - cut]);
    }
}
