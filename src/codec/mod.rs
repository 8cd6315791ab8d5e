//! Version-specific codecs and the write-side configuration.
//!
//! The header names the codec; everything after it is version-private.
//! V1 streams the tree in prefix order, v2 pools values behind a seekable
//! offset table, v3 flattens the tree into an item table with reference
//! compression.

pub mod v1;
pub mod v2;
pub mod v3;

use alloc::vec::Vec;

use crate::error::FluxionError;
use crate::header::{Header, TextEncoding, CURRENT_VERSION};
use crate::io::{ByteSink, ByteSource};
use crate::tree::{NodeId, Tree};
use crate::value::Tolerance;
use crate::varint::read_varint_u32;

/// Write-side configuration.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Format version to emit; 0 selects the current version.
    pub version: u8,
    /// Text encoding for v1/v2 names and string values. V3 is always UTF-8.
    pub encoding: TextEncoding,
    /// Float tolerances for the v3 dedup pass.
    pub tolerance: Tolerance,
    /// Gates the v3 reference/dedup pass.
    pub optimize: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: 0,
            encoding: TextEncoding::Utf8,
            tolerance: Tolerance::default(),
            optimize: true,
        }
    }
}

impl WriteOptions {
    fn resolved_version(&self) -> Result<u8, FluxionError> {
        match self.version {
            0 => Ok(CURRENT_VERSION),
            v if v <= CURRENT_VERSION => Ok(v),
            v => Err(FluxionError::UnsupportedVersion(v)),
        }
    }
}

/// Encodes `root` and its subtree into a fresh byte buffer.
pub(crate) fn write_tree(
    tree: &Tree,
    root: NodeId,
    options: &WriteOptions,
) -> Result<Vec<u8>, FluxionError> {
    let version = options.resolved_version()?;
    let encoding = if version < 3 {
        options.encoding
    } else {
        TextEncoding::Utf8
    };

    let mut sink = ByteSink::new();
    Header { version, encoding }.write(&mut sink);
    match version {
        1 => v1::write(tree, root, encoding, &mut sink),
        2 => v2::write(tree, root, encoding, &mut sink)?,
        3 => v3::write(tree, root, options, &mut sink)?,
        v => return Err(FluxionError::UnsupportedVersion(v)),
    }
    Ok(sink.into_bytes())
}

/// Decodes a complete file into a tree and its root id.
pub(crate) fn read_tree(bytes: &[u8]) -> Result<(Tree, NodeId), FluxionError> {
    let mut source = ByteSource::new(bytes);
    let header = Header::read(&mut source)?;
    let (mut tree, root) = match header.version {
        1 => v1::read(&mut source, header.encoding)?,
        2 => v2::read(&mut source, header.encoding)?,
        3 => v3::read(&mut source)?,
        v => return Err(FluxionError::UnsupportedVersion(v)),
    };
    tree.set_version(header.version);
    Ok((tree, root))
}

/// Count prefix: narrowed to 32 bits, then validated against the remaining
/// input before any allocation: every counted record is at least one byte.
pub(crate) fn read_count(source: &mut ByteSource<'_>) -> Result<usize, FluxionError> {
    let count = read_varint_u32(source)? as usize;
    if count > source.remaining() {
        return Err(FluxionError::EndOfStream);
    }
    Ok(count)
}
