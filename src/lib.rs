#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

// Needed for Vec
extern crate alloc;

pub mod codec;
pub mod error;
pub mod header;
pub mod io;
pub mod text;
pub mod tree;
pub mod value;
pub mod varint;

pub use codec::WriteOptions;
pub use error::{FluxionError, ItemKind};
pub use header::{TextEncoding, CURRENT_VERSION, MAGIC_BYTES};
pub use tree::{Attribute, CloneSpec, NodeId, Tree};
pub use value::{Tolerance, Value};

use alloc::vec::Vec;

/// Encodes `root` and its subtree at the version selected in `options`
/// (0 = current).
///
/// # Arguments
/// * `tree` - The arena owning `root`.
/// * `root` - Node to serialize; its parent, if any, is not part of the output.
/// * `options` - Version, text encoding (v1/v2), tolerances and the v3
///   optimize flag.
///
/// # Returns
/// * `Ok(Vec<u8>)` - The complete file, starting with the `FLX` magic.
/// * `Err(FluxionError)` - A writer invariant failed (pool estimation or
///   analysis lookup).
pub fn write(
    tree: &Tree,
    root: NodeId,
    options: &WriteOptions,
) -> Result<Vec<u8>, FluxionError> {
    codec::write_tree(tree, root, options)
}

/// Decodes a complete Fluxion file.
///
/// Accepts versions 1 through [`CURRENT_VERSION`] and rejects anything
/// newer with `UnsupportedVersion`. Returns the materialized tree and the
/// id of its root; the tree's `version()` reports the file's version byte.
/// No partial tree is returned on failure.
pub fn read(bytes: &[u8]) -> Result<(Tree, NodeId), FluxionError> {
    codec::read_tree(bytes)
}
