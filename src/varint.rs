//! Unsigned LEB128 (VarInt) encoding for lengths, counts, offsets and indices.
//! Used by every codec version; the v2 estimator also needs `varint_len`.

use crate::error::FluxionError;
use crate::io::{ByteSink, ByteSource};

/// Encodes `n` as unsigned LEB128 and appends it to `sink`.
/// 7 data bits per byte, high bit set on every byte but the last.
/// Zero is the single byte 0x00.
#[inline]
pub fn write_varint(sink: &mut ByteSink, mut n: u64) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            sink.write_u8(byte);
            return;
        }
        sink.write_u8(byte | 0x80);
    }
}

/// Decodes an unsigned LEB128 value from `source`.
/// Fails with `EndOfStream` mid-varint and with `VarintOverflow` on
/// encodings that cannot fit 64 bits.
#[inline]
pub fn read_varint(source: &mut ByteSource<'_>) -> Result<u64, FluxionError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = source.read_u8()?;
        if shift >= 64 || (shift == 63 && (byte & 0x7f) > 1) {
            return Err(FluxionError::VarintOverflow);
        }
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Decodes an unsigned LEB128 value that must fit 32 bits.
#[inline]
pub fn read_varint_u32(source: &mut ByteSource<'_>) -> Result<u32, FluxionError> {
    let n = read_varint(source)?;
    u32::try_from(n).map_err(|_| FluxionError::VarintOverflow)
}

/// Number of bytes `write_varint` emits for `n`.
#[inline]
pub fn varint_len(n: u64) -> u64 {
    let bits = 64 - n.leading_zeros() as u64;
    if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}
