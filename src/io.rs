//! Byte source and sink for the codecs.
//!
//! Readers work over a borrowed slice with an explicit cursor; only the v2
//! decoder seeks, v1 and v3 read strictly forward. Writers append to a
//! growable buffer and expose the current position for offset bookkeeping.

use alloc::vec::Vec;

use crate::error::FluxionError;

/// Forward reader with absolute seek over a borrowed byte slice.
#[derive(Debug)]
pub struct ByteSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Bytes left before the end of the slice.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Moves the cursor to an absolute position. Positions up to and
    /// including the end of the slice are valid.
    pub fn seek(&mut self, pos: u64) -> Result<(), FluxionError> {
        let pos = usize::try_from(pos).map_err(|_| FluxionError::EndOfStream)?;
        if pos > self.data.len() {
            return Err(FluxionError::EndOfStream);
        }
        self.pos = pos;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, FluxionError> {
        let byte = *self.data.get(self.pos).ok_or(FluxionError::EndOfStream)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly `n` bytes, advancing the cursor.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], FluxionError> {
        if self.remaining() < n {
            return Err(FluxionError::EndOfStream);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

/// Growing byte buffer with position tracking.
#[derive(Debug, Default)]
pub struct ByteSink {
    buf: Vec<u8>,
}

impl ByteSink {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub fn write_all(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_and_seeks() {
        let data = [1u8, 2, 3, 4];
        let mut source = ByteSource::new(&data);
        assert_eq!(source.read_u8().unwrap(), 1);
        assert_eq!(source.read_exact(2).unwrap(), &[2, 3]);
        assert_eq!(source.position(), 3);
        source.seek(0).unwrap();
        assert_eq!(source.read_u8().unwrap(), 1);
        source.seek(4).unwrap();
        assert_eq!(source.read_u8(), Err(FluxionError::EndOfStream));
        assert_eq!(source.seek(5), Err(FluxionError::EndOfStream));
    }

    #[test]
    fn short_read_is_end_of_stream() {
        let mut source = ByteSource::new(&[0u8; 3]);
        assert_eq!(source.read_exact(4), Err(FluxionError::EndOfStream));
        // A failed read must not consume anything.
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn sink_tracks_position() {
        let mut sink = ByteSink::new();
        sink.write_u8(0xab);
        sink.write_all(&[1, 2, 3]);
        assert_eq!(sink.position(), 4);
        assert_eq!(sink.into_bytes(), [0xab, 1, 2, 3]);
    }
}
