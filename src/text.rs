//! Text payload codec for the three header encodings.
//!
//! String and name payloads are length-prefixed by the BYTE length of the
//! encoded form, so the v2 estimator can size pool entries without a second
//! encoding pass. V3 files are always UTF-8.

use alloc::string::String;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FluxionError;
use crate::header::TextEncoding;

/// Encodes `s` into the wire byte form for `encoding`.
pub fn encode_str(s: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 => s.as_bytes().to_vec(),
        TextEncoding::Utf16Le => {
            let mut out = Vec::with_capacity(s.len() * 2);
            for unit in s.encode_utf16() {
                let mut b = [0u8; 2];
                LittleEndian::write_u16(&mut b, unit);
                out.extend_from_slice(&b);
            }
            out
        }
        TextEncoding::Utf32Le => {
            let mut out = Vec::with_capacity(s.len() * 4);
            for ch in s.chars() {
                let mut b = [0u8; 4];
                LittleEndian::write_u32(&mut b, ch as u32);
                out.extend_from_slice(&b);
            }
            out
        }
    }
}

/// Decodes wire bytes back into a string. Any byte sequence that is not
/// valid in `encoding` (truncated code unit, unpaired surrogate, invalid
/// scalar) fails with `MalformedText`.
pub fn decode_str(bytes: &[u8], encoding: TextEncoding) -> Result<String, FluxionError> {
    match encoding {
        TextEncoding::Utf8 => core::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| FluxionError::MalformedText),
        TextEncoding::Utf16Le => {
            if bytes.len() % 2 != 0 {
                return Err(FluxionError::MalformedText);
            }
            let units: Vec<u16> = bytes.chunks_exact(2).map(LittleEndian::read_u16).collect();
            String::from_utf16(&units).map_err(|_| FluxionError::MalformedText)
        }
        TextEncoding::Utf32Le => {
            if bytes.len() % 4 != 0 {
                return Err(FluxionError::MalformedText);
            }
            let mut out = String::with_capacity(bytes.len() / 4);
            for chunk in bytes.chunks_exact(4) {
                let scalar = LittleEndian::read_u32(chunk);
                out.push(char::from_u32(scalar).ok_or(FluxionError::MalformedText)?);
            }
            Ok(out)
        }
    }
}
