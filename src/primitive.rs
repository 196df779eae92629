//! Primitive leaf values (Primitive Field Layer).
//!
//! Every leaf owns a *default* value fixed at construction and a *current*
//! value that an external mutator may replace between renders. The
//! `fuzzable` flag is metadata only: it never changes the encoded bytes.
//!
//! | Leaf          | Wire encoding |
//! |---------------|---------------|
//! | [`IntField`]  | `width` bytes in the declared byte order |
//! | [`RawField`]  | the bytes as given, no prefix, no padding |
//! | [`OpaqueValue`] | 4-byte big-endian length + data + 0–3 zero bytes |

use crate::error::{Error, Result};
use crate::ser::xdr_pad_length;
use serde::{Deserialize, Serialize};

/// Byte order of an integer field. ONC RPC uses [`Endian::Big`] throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Big,
    Little,
}

/// Declared width of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Width {
    U8,
    U16,
    U32,
    U64,
}

impl Width {
    /// Number of bytes on the wire.
    pub fn bytes(self) -> usize {
        match self {
            Width::U8 => 1,
            Width::U16 => 2,
            Width::U32 => 4,
            Width::U64 => 8,
        }
    }

    /// Largest value representable at this width.
    pub fn max_value(self) -> u64 {
        match self {
            Width::U8 => u8::MAX as u64,
            Width::U16 => u16::MAX as u64,
            Width::U32 => u32::MAX as u64,
            Width::U64 => u64::MAX,
        }
    }

    /// Reject `value` if it cannot be represented without truncation.
    pub(crate) fn check(self, field: &str, value: u64) -> Result<u64> {
        if value > self.max_value() {
            return Err(Error::ValueOutOfRange {
                field: field.to_string(),
                value,
                width: self.bytes(),
            });
        }
        Ok(value)
    }
}

/// Encode `value` at `width` in `endian` order.
///
/// The caller guarantees `value` fits; higher bytes are dropped otherwise.
pub(crate) fn encode_uint(value: u64, width: Width, endian: Endian) -> Vec<u8> {
    let n = width.bytes();
    match endian {
        Endian::Big => value.to_be_bytes()[8 - n..].to_vec(),
        Endian::Little => value.to_le_bytes()[..n].to_vec(),
    }
}

/// Fixed-width unsigned integer leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntField {
    name: String,
    width: Width,
    endian: Endian,
    default: u64,
    value: u64,
    fuzzable: bool,
}

impl IntField {
    /// Create an integer field, rejecting values wider than `width`.
    pub fn new(name: impl Into<String>, width: Width, endian: Endian, value: u64) -> Result<Self> {
        let name = name.into();
        width.check(&name, value)?;
        Ok(IntField {
            name,
            width,
            endian,
            default: value,
            value,
            fuzzable: false,
        })
    }

    /// Big-endian XDR `unsigned int`.
    pub fn u32(name: impl Into<String>, value: u32) -> Self {
        let value = value as u64;
        IntField {
            name: name.into(),
            width: Width::U32,
            endian: Endian::Big,
            default: value,
            value,
            fuzzable: false,
        }
    }

    /// Big-endian XDR `unsigned hyper`.
    pub fn u64(name: impl Into<String>, value: u64) -> Self {
        IntField {
            name: name.into(),
            width: Width::U64,
            endian: Endian::Big,
            default: value,
            value,
            fuzzable: false,
        }
    }

    pub fn fuzzable(mut self, fuzzable: bool) -> Self {
        self.fuzzable = fuzzable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn is_fuzzable(&self) -> bool {
        self.fuzzable
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn default_value(&self) -> u64 {
        self.default
    }

    /// Replace the current value. Out-of-width values are rejected, never truncated.
    pub fn set(&mut self, value: u64) -> Result<()> {
        self.value = self.width.check(&self.name, value)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }

    /// Canonical bytes of the default value.
    pub fn default_bytes(&self) -> Vec<u8> {
        encode_uint(self.default, self.width, self.endian)
    }
}

/// Fixed raw bytes written verbatim (e.g. an 8-byte cookie verifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    name: String,
    default: Vec<u8>,
    value: Vec<u8>,
    fuzzable: bool,
}

impl RawField {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        RawField {
            name: name.into(),
            default: bytes.clone(),
            value: bytes,
            fuzzable: false,
        }
    }

    pub fn fuzzable(mut self, fuzzable: bool) -> Self {
        self.fuzzable = fuzzable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fuzzable(&self) -> bool {
        self.fuzzable
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn default_bytes(&self) -> &[u8] {
        &self.default
    }

    pub fn set(&mut self, bytes: Vec<u8>) {
        self.value = bytes;
    }

    pub fn reset(&mut self) {
        self.value.clone_from(&self.default);
    }
}

/// XDR variable-length opaque or string (RFC 4506 §4.10, §4.11).
///
/// The length prefix normally tracks the data length. A mutator may pin a
/// different declared length with [`OpaqueValue::set_declared_length`]; the
/// padding always follows the real data length so later fields stay aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueValue {
    name: String,
    default: Vec<u8>,
    value: Vec<u8>,
    declared_len: Option<u32>,
    fuzzable: bool,
}

impl OpaqueValue {
    /// Variable-length opaque with no upper bound beyond the 32-bit prefix.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::bounded(name, data, u32::MAX as usize)
    }

    /// Variable-length opaque capped at `max` bytes (`opaque data<max>`).
    pub fn bounded(name: impl Into<String>, data: impl Into<Vec<u8>>, max: usize) -> Result<Self> {
        let name = name.into();
        let data = data.into();
        let max = max.min(u32::MAX as usize);
        if data.len() > max {
            return Err(Error::LengthOverflow {
                field: name,
                max,
                got: data.len(),
            });
        }
        Ok(OpaqueValue {
            name,
            default: data.clone(),
            value: data,
            declared_len: None,
            fuzzable: false,
        })
    }

    /// XDR `string`: the UTF-8 encoding of `text`, length-prefixed and padded.
    pub fn string(name: impl Into<String>, text: &str) -> Result<Self> {
        Self::new(name, text.as_bytes())
    }

    /// XDR `string` from bytes that must already be UTF-8.
    pub fn from_utf8(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        match String::from_utf8(bytes) {
            Ok(text) => Self::new(name, text.into_bytes()),
            Err(e) => Err(Error::EncodingError {
                field: name,
                reason: e.utf8_error().to_string(),
            }),
        }
    }

    pub fn fuzzable(mut self, fuzzable: bool) -> Self {
        self.fuzzable = fuzzable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fuzzable(&self) -> bool {
        self.fuzzable
    }

    pub fn data(&self) -> &[u8] {
        &self.value
    }

    /// Value written in the length prefix.
    pub fn declared_len(&self) -> u32 {
        self.declared_len.unwrap_or(self.value.len() as u32)
    }

    /// Zero bytes following the data.
    pub fn pad_len(&self) -> usize {
        xdr_pad_length(self.value.len())
    }

    /// Total bytes on the wire: prefix + data + padding.
    pub fn encoded_len(&self) -> usize {
        4 + self.value.len() + self.pad_len()
    }

    /// Replace the data. The builder-time cap is not re-applied.
    pub fn set(&mut self, data: Vec<u8>) -> Result<()> {
        if data.len() > u32::MAX as usize {
            return Err(Error::LengthOverflow {
                field: self.name.clone(),
                max: u32::MAX as usize,
                got: data.len(),
            });
        }
        self.value = data;
        Ok(())
    }

    /// Pin the length prefix to `len`, or follow the data again with `None`.
    pub fn set_declared_length(&mut self, len: Option<u32>) {
        self.declared_len = len;
    }

    pub fn reset(&mut self) {
        self.value.clone_from(&self.default);
        self.declared_len = None;
    }

    /// Canonical encoding of the default value.
    pub fn default_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.default.len() + 3);
        out.extend_from_slice(&(self.default.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.default);
        out.resize(out.len() + xdr_pad_length(self.default.len()), 0);
        out
    }
}
