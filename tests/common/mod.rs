//! Shared test helpers: tree builders and round-trip assertions used by the
//! scenario and property suites.
#![allow(dead_code)]

use fluxion::{Attribute, NodeId, Tolerance, Tree, Value, WriteOptions};

/// Encodes at a fixed version with default options otherwise.
pub fn write_at(tree: &Tree, root: NodeId, version: u8) -> Vec<u8> {
    fluxion::write(
        tree,
        root,
        &WriteOptions {
            version,
            ..WriteOptions::default()
        },
    )
    .expect("write")
}

/// Encodes, checks the magic and version bytes, decodes, and asserts deep
/// equality with the original. Returns the encoded bytes for size checks.
pub fn assert_round_trip(tree: &Tree, root: NodeId, version: u8) -> Vec<u8> {
    let bytes = write_at(tree, root, version);
    assert_eq!(&bytes[..3], b"FLX", "magic at v{}", version);
    assert_eq!(bytes[3], version, "version byte");

    let (decoded, decoded_root) = fluxion::read(&bytes).expect("read");
    assert_eq!(decoded.version(), version);
    assert!(
        tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()),
        "round-trip at v{} lost structure",
        version
    );
    bytes
}

/// A small nested directory: a named root, a `User` child with a string
/// value and an `Age` attribute, and a nested `User` below it.
pub fn user_directory() -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.add_node(Some("MyRootNode"), Value::Null);

    let mike = tree.add_node(Some("User"), Value::from("mike"));
    tree.push_attribute(mike, Attribute::new(Some("Age"), Value::I32(35)));
    tree.add_child(root, mike).expect("attach mike");

    let jeremy = tree.add_node(Some("User"), Value::from("jeremy"));
    tree.push_attribute(jeremy, Attribute::new(Some("Age"), Value::I32(10)));
    tree.add_child(mike, jeremy).expect("attach jeremy");

    (tree, root)
}

/// `count` identical siblings, the dedup stress shape.
pub fn repeated_users(count: usize) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.add_node(None, Value::Null);
    for _ in 0..count {
        let child = tree.add_node(Some("User"), Value::from("mike"));
        tree.add_child(root, child).expect("attach");
    }
    (tree, root)
}

/// One tree touching every value variant, plus zero/empty forms, nested
/// children and attribute mixes.
pub fn kitchen_sink() -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.add_node(Some("sink"), Value::Null);

    let values = [
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::U8(0),
        Value::U8(200),
        Value::I8(-100),
        Value::Char(0x2603),
        Value::Char(0),
        Value::I16(-12345),
        Value::I16(0),
        Value::U16(54321),
        Value::I32(i32::MIN),
        Value::U32(u32::MAX),
        Value::I64(i64::MIN),
        Value::I64(77),
        Value::U64(u64::MAX),
        Value::F32(0.0),
        Value::F32(3.5),
        Value::F64(-2.25),
        Value::Str(String::new()),
        Value::Str(String::from("Ünïcodé 🌳")),
        Value::Bytes(Vec::new()),
        Value::Bytes(vec![0, 1, 2, 255]),
    ];
    for (i, value) in values.iter().enumerate() {
        let name = (i % 3 != 0).then(|| format!("v{}", i));
        let child = tree.add_node(name.as_deref(), value.clone());
        tree.push_attribute(child, Attribute::new(Some("idx"), Value::U32(i as u32)));
        if i % 4 == 0 {
            tree.push_attribute(child, Attribute::new(None, value.clone()));
        }
        tree.add_child(root, child).expect("attach");
    }

    // A nested branch so prefix order and child counts matter.
    let branch = tree.add_node(Some("branch"), Value::from("inner"));
    let leaf_a = tree.add_node(Some("leaf"), Value::from(1i32));
    let leaf_b = tree.add_node(Some("leaf"), Value::from(1i32));
    tree.add_child(branch, leaf_a).expect("attach");
    tree.add_child(branch, leaf_b).expect("attach");
    tree.add_child(root, branch).expect("attach");

    (tree, root)
}
