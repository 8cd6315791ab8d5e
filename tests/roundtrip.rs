//! End-to-end scenarios: byte layout, nested round-trips, dedup sizing,
//! cycle rejection, and the encoding and version-gating behaviors that cut
//! across codecs.

mod common;

use fluxion::{
    Attribute, FluxionError, TextEncoding, Tolerance, Tree, Value, WriteOptions, CURRENT_VERSION,
};

use common::{assert_round_trip, kitchen_sink, repeated_users, user_directory, write_at};

/// An empty root is a six-byte v1 file and survives decoding.
#[test]
fn empty_root_v1_layout() {
    let mut tree = Tree::new();
    let root = tree.add_node(None, Value::Null);
    let bytes = assert_round_trip(&tree, root, 1);
    assert_eq!(bytes, hex::decode("464c58010060").unwrap());
}

/// The nested user directory survives every version.
#[test]
fn user_directory_round_trips_at_every_version() {
    let (tree, root) = user_directory();
    for version in 1..=CURRENT_VERSION {
        assert_round_trip(&tree, root, version);
    }
}

/// 100 duplicate siblings: the pooled and item-table encodings must beat
/// the streaming one, and v3 must not lose to v2.
#[test]
fn duplicate_strings_shrink_with_newer_versions() {
    let (tree, root) = repeated_users(100);
    let v1 = assert_round_trip(&tree, root, 1);
    let v2 = assert_round_trip(&tree, root, 2);
    let v3 = assert_round_trip(&tree, root, 3);
    assert!(v2.len() < v1.len(), "v2 {} vs v1 {}", v2.len(), v1.len());
    assert!(v3.len() <= v2.len(), "v3 {} vs v2 {}", v3.len(), v2.len());
}

/// Mutual attachment closes a cycle and must be refused.
#[test]
fn cycle_attachment_is_rejected() {
    let mut tree = Tree::new();
    let a = tree.add_node(Some("A"), Value::Null);
    let b = tree.add_node(Some("B"), Value::Null);
    tree.add_child(a, b).expect("first attach");
    assert_eq!(tree.add_child(b, a), Err(FluxionError::InvalidParent));
}

/// A header cut off inside the magic.
#[test]
fn short_header_is_rejected() {
    assert_eq!(
        fluxion::read(&[0x46, 0x4c]).unwrap_err(),
        FluxionError::EndOfStream
    );
}

/// Magic plus a version byte from the future.
#[test]
fn future_version_is_rejected() {
    assert_eq!(
        fluxion::read(&[0x46, 0x4c, 0x58, 0x04]).unwrap_err(),
        FluxionError::UnsupportedVersion(4)
    );
}

#[test]
fn kitchen_sink_round_trips_at_every_version() {
    let (tree, root) = kitchen_sink();
    for version in 1..=CURRENT_VERSION {
        assert_round_trip(&tree, root, version);
    }
}

#[test]
fn default_options_write_the_current_version() {
    let (tree, root) = user_directory();
    let bytes = fluxion::write(&tree, root, &WriteOptions::default()).unwrap();
    assert_eq!(bytes[3], CURRENT_VERSION);
    let (decoded, decoded_root) = fluxion::read(&bytes).unwrap();
    assert!(tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()));
}

#[test]
fn wide_encodings_round_trip() {
    let mut tree = Tree::new();
    let root = tree.add_node(Some("Üser"), Value::from("树 🌳"));
    tree.push_attribute(root, Attribute::new(Some("désc"), Value::from("héllo")));

    for version in [1, 2] {
        for encoding in [TextEncoding::Utf16Le, TextEncoding::Utf32Le] {
            let options = WriteOptions {
                version,
                encoding,
                ..WriteOptions::default()
            };
            let bytes = fluxion::write(&tree, root, &options).unwrap();
            assert_eq!(bytes[4], encoding.as_u8());
            let (decoded, decoded_root) = fluxion::read(&bytes).unwrap();
            assert!(
                tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()),
                "v{} {:?}",
                version,
                encoding
            );
        }
    }
}

/// UTF-16 length prefixes count bytes, not characters; a surrogate-pair
/// heavy name exercises that.
#[test]
fn surrogate_pairs_survive_utf16() {
    let mut tree = Tree::new();
    let root = tree.add_node(Some("🌳🌳🌳"), Value::from("🌲"));
    let options = WriteOptions {
        version: 2,
        encoding: TextEncoding::Utf16Le,
        ..WriteOptions::default()
    };
    let bytes = fluxion::write(&tree, root, &options).unwrap();
    let (decoded, decoded_root) = fluxion::read(&bytes).unwrap();
    assert_eq!(decoded.name(decoded_root), Some("🌳🌳🌳"));
    assert_eq!(decoded.value(decoded_root), &Value::from("🌲"));
}

/// Empty and zero values ride the unique flag in v2 and still decode to
/// their canonical forms everywhere.
#[test]
fn canonical_defaults_round_trip() {
    let mut tree = Tree::new();
    let root = tree.add_node(None, Value::Null);
    let defaults = [
        Value::Str(String::new()),
        Value::Bytes(Vec::new()),
        Value::U8(0),
        Value::U64(0),
        Value::I32(0),
        Value::F64(0.0),
        Value::Bool(false),
    ];
    for value in defaults {
        let child = tree.add_node(Some("d"), value.clone());
        tree.push_attribute(child, Attribute::new(Some("a"), value));
        tree.add_child(root, child).expect("attach");
    }
    for version in 1..=CURRENT_VERSION {
        assert_round_trip(&tree, root, version);
    }
}

/// Negative magnitudes share pool entries with their positive twins in v2
/// and carry the sign on the pool type byte in v3.
#[test]
fn signed_integers_round_trip_at_every_version() {
    let mut tree = Tree::new();
    let root = tree.add_node(None, Value::Null);
    for value in [
        Value::I16(i16::MIN),
        Value::I16(i16::MAX),
        Value::I32(-35),
        Value::I32(35),
        Value::I64(i64::MIN),
        Value::I64(-1),
    ] {
        let child = tree.add_node(None, value);
        tree.add_child(root, child).expect("attach");
    }
    for version in 1..=CURRENT_VERSION {
        assert_round_trip(&tree, root, version);
    }
}

#[test]
fn v3_optimize_off_still_round_trips() {
    let (tree, root) = repeated_users(20);
    let options = WriteOptions {
        version: 3,
        optimize: false,
        ..WriteOptions::default()
    };
    let plain = fluxion::write(&tree, root, &options).unwrap();
    let optimized = write_at(&tree, root, 3);
    assert!(optimized.len() < plain.len());

    let (decoded, decoded_root) = fluxion::read(&plain).unwrap();
    assert!(tree.deep_equal(root, &decoded, decoded_root, &Tolerance::default()));
}

/// Re-encoding a decoded tree at the same version reproduces the bytes.
#[test]
fn re_encoding_is_byte_stable() {
    let (tree, root) = kitchen_sink();
    for version in 1..=CURRENT_VERSION {
        let first = write_at(&tree, root, version);
        let (decoded, decoded_root) = fluxion::read(&first).unwrap();
        let second = write_at(&decoded, decoded_root, version);
        assert_eq!(first, second, "v{}", version);
    }
}

/// Attribute and child order are preserved exactly.
#[test]
fn ordering_is_preserved() {
    let mut tree = Tree::new();
    let root = tree.add_node(None, Value::Null);
    for i in 0..5u32 {
        let child = tree.add_node(Some("c"), Value::U32(i));
        tree.add_child(root, child).expect("attach");
        tree.push_attribute(root, Attribute::new(Some("a"), Value::U32(i)));
    }
    for version in 1..=CURRENT_VERSION {
        let bytes = write_at(&tree, root, version);
        let (decoded, decoded_root) = fluxion::read(&bytes).unwrap();
        for (i, &child) in decoded.children(decoded_root).iter().enumerate() {
            assert_eq!(decoded.value(child), &Value::U32(i as u32));
        }
        for (i, attr) in decoded.attributes(decoded_root).iter().enumerate() {
            assert_eq!(attr.value, Value::U32(i as u32));
        }
    }
}
