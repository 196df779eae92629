//! XDR output sink (RFC 4506)
//!
//! The [`Serializer`] is generic over any `W: std::io::Write`, enabling both
//! in-memory rendering (`Message::render`) and streaming rendering
//! (`Message::render_to`). It tracks how many bytes it has written so the
//! renderer can record the byte span of every node.
//!
//! ## Wire format summary
//! - Integers: declared width and byte order (XDR itself is big-endian)
//! - Raw bytes: written verbatim
//! - Opaque/strings: 4-byte length prefix + data + 0–3 zero-padding bytes

use crate::error::{Error, Result};
use crate::primitive::{Endian, Width, encode_uint};
use std::io::Write;

/// Zero bytes needed after `len` data bytes to reach a 4-byte boundary.
///
/// Always computed from the encoded byte length, never from a character count.
#[inline]
pub fn xdr_pad_length(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// `bytes` followed by its XDR padding.
pub fn xdr_padded_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 3);
    out.extend_from_slice(bytes);
    out.resize(bytes.len() + xdr_pad_length(bytes.len()), 0);
    out
}

/// The XDR writer. Generic over any `W: Write`.
///
/// ```rust
/// use xdr_blocks::ser::Serializer;
///
/// let mut ser = Serializer::new(Vec::new());
/// ser.put_u32(42).unwrap();
/// ser.put_opaque(b"abc", 3).unwrap();
/// assert_eq!(ser.into_writer(), [0, 0, 0, 42, 0, 0, 0, 3, b'a', b'b', b'c', 0]);
/// ```
pub struct Serializer<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> Serializer<W> {
    /// Create a new serializer that writes into `writer`.
    pub fn new(writer: W) -> Self {
        Serializer { writer, written: 0 }
    }

    /// Consume the serializer and return the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.written
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| Error::Io(e.to_string()))?;
        self.written += bytes.len();
        Ok(())
    }

    /// Integer at an explicit width and byte order. `value` must fit `width`.
    pub fn put_uint(&mut self, value: u64, width: Width, endian: Endian) -> Result<()> {
        self.write_all(&encode_uint(value, width, endian))
    }

    /// XDR unsigned integer: 4 bytes, big-endian
    pub fn put_u32(&mut self, v: u32) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// XDR unsigned hyper integer: 8 bytes, big-endian
    pub fn put_u64(&mut self, v: u64) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// Bytes with no prefix and no padding.
    pub fn put_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)
    }

    /// Write `bytes` followed by enough zero bytes to reach a 4-byte boundary.
    pub fn put_padded(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        let pad = xdr_pad_length(bytes.len());
        if pad != 0 {
            self.write_all(&[0u8; 3][..pad])?;
        }
        Ok(())
    }

    /// XDR variable-length opaque with an explicit length prefix.
    ///
    /// `declared_len` normally equals `bytes.len()`; padding always follows
    /// the real data length.
    pub fn put_opaque(&mut self, bytes: &[u8], declared_len: u32) -> Result<()> {
        self.put_u32(declared_len)?;
        self.put_padded(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_length_cycles_through_four() {
        assert_eq!(xdr_pad_length(0), 0);
        assert_eq!(xdr_pad_length(1), 3);
        assert_eq!(xdr_pad_length(2), 2);
        assert_eq!(xdr_pad_length(3), 1);
        assert_eq!(xdr_pad_length(4), 0);
        assert_eq!(xdr_pad_length(5), 3);
    }

    #[test]
    fn little_endian_u16() {
        let mut ser = Serializer::new(Vec::new());
        ser.put_uint(0x1234, Width::U16, Endian::Little).unwrap();
        assert_eq!(ser.position(), 2);
        assert_eq!(ser.into_writer(), [0x34, 0x12]);
    }

    #[test]
    fn opaque_declared_length_does_not_move_padding() {
        let mut ser = Serializer::new(Vec::new());
        ser.put_opaque(&[1, 2, 3, 4, 5], 10).unwrap();
        assert_eq!(ser.into_writer(), [0, 0, 0, 10, 1, 2, 3, 4, 5, 0, 0, 0]);
    }
}
