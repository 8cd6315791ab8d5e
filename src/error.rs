// src/error.rs

/// Kind of item a v3 record may materialize into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Node,
    Attribute,
}

impl core::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Attribute => write!(f, "attribute"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FluxionError {
    /// The Magic Bytes were not 'FLX'.
    InvalidHeader,

    /// The stream ended before an expected field could be fully read.
    EndOfStream,

    /// The version byte is not supported by this library (1, 2 or 3).
    UnsupportedVersion(u8),

    /// The text encoding byte was not 0 (UTF-8), 1 (UTF-16LE) or 2 (UTF-32LE).
    UnknownEncoding(u8),

    /// A value type id outside the defined range 0..=15.
    UnknownValueType(u8),

    /// V3: the declared value type disagrees with the pool entry's stored type.
    ValueTypeMismatch { expected: u8, actual: u8 },

    /// Attaching a node to itself or to one of its descendants.
    InvalidParent,

    /// Writer invariant violation: a referenced pool entry was not produced
    /// by the v2/v3 analysis pass.
    AnalyzedDataMissing,

    /// V2: the emitted pool did not end at the estimated tree start.
    EstimationMismatch { expected: u64, actual: u64 },

    /// V3: an item control byte (set kind, repeat count) outside the defined set.
    DisorientedRead(u8),

    /// V3: a reference, set member or root index named an item of the wrong kind.
    UnexpectedItemType { index: usize, wanted: ItemKind },

    /// A varint encoding would overflow the target integer width.
    VarintOverflow,

    /// String bytes that are not valid in the selected text encoding.
    MalformedText,
}

// Manual implementation of Display for no_std environments.
impl core::fmt::Display for FluxionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidHeader => write!(f, "Invalid Magic Bytes"),
            Self::EndOfStream => write!(f, "Unexpected end of stream"),
            Self::UnsupportedVersion(v) => write!(f, "Unsupported format version: {}", v),
            Self::UnknownEncoding(e) => write!(f, "Unknown text encoding id: {}", e),
            Self::UnknownValueType(t) => write!(f, "Unknown value type id: {}", t),
            Self::ValueTypeMismatch { expected, actual } => write!(
                f,
                "Value type mismatch: declared {}, pool entry holds {}",
                expected, actual
            ),
            Self::InvalidParent => write!(f, "Invalid parent: node cannot be its own ancestor"),
            Self::AnalyzedDataMissing => {
                write!(f, "Analyzed data missing: pool entry not found during write")
            }
            Self::EstimationMismatch { expected, actual } => write!(
                f,
                "Pool size estimation mismatch: expected end {}, emitted end {}",
                expected, actual
            ),
            Self::DisorientedRead(b) => write!(f, "Disoriented read: control byte 0x{:02x}", b),
            Self::UnexpectedItemType { index, wanted } => {
                write!(f, "Item {} is not a {}", index, wanted)
            }
            Self::VarintOverflow => write!(f, "Varint overflows the target width"),
            Self::MalformedText => write!(f, "Malformed text for the selected encoding"),
        }
    }
}

// Enable standard Error trait if the "std" feature is on.
#[cfg(feature = "std")]
impl std::error::Error for FluxionError {}
