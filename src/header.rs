// src/header.rs
use crate::error::FluxionError;
use crate::io::{ByteSink, ByteSource};

/// The standard Fluxion Magic Bytes ("FLX")
pub const MAGIC_BYTES: [u8; 3] = [0x46, 0x4C, 0x58];

/// Highest format version this library reads and writes.
pub const CURRENT_VERSION: u8 = 3;

/// Text encoding id (header byte 4 in v1/v2; v3 is always UTF-8).
/// Wire format is u8; internal logic uses this enum for exhaustive matching.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8 = 0,
    Utf16Le = 1,
    Utf32Le = 2,
}

impl TextEncoding {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl core::convert::TryFrom<u8> for TextEncoding {
    type Error = FluxionError;
    fn try_from(byte: u8) -> Result<Self, FluxionError> {
        match byte {
            0 => Ok(TextEncoding::Utf8),
            1 => Ok(TextEncoding::Utf16Le),
            2 => Ok(TextEncoding::Utf32Le),
            other => Err(FluxionError::UnknownEncoding(other)),
        }
    }
}

/// The decoded file preamble: magic, version byte and (v1/v2) text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub encoding: TextEncoding,
}

impl Header {
    /// Reads and validates the preamble. Four bytes for v3, five for v1/v2.
    pub fn read(source: &mut ByteSource<'_>) -> Result<Self, FluxionError> {
        let magic = source.read_exact(3)?;
        if magic != MAGIC_BYTES {
            return Err(FluxionError::InvalidHeader);
        }

        let version = source.read_u8()?;
        if version == 0 || version > CURRENT_VERSION {
            return Err(FluxionError::UnsupportedVersion(version));
        }

        // V3 locks the encoding to UTF-8 and drops the byte.
        let encoding = if version < 3 {
            TextEncoding::try_from(source.read_u8()?)?
        } else {
            TextEncoding::Utf8
        };

        Ok(Self { version, encoding })
    }

    /// Writes the preamble in wire order.
    pub fn write(&self, sink: &mut ByteSink) {
        sink.write_all(&MAGIC_BYTES);
        sink.write_u8(self.version);
        if self.version < 3 {
            sink.write_u8(self.encoding.as_u8());
        }
    }
}
