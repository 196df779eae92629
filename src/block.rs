//! Containers and size references (Container & Size-Reference Layer).
//!
//! A [`Block`] renders as the concatenation of its children in declaration
//! order. Receivers decode positionally, so that order is the wire order and
//! nothing downstream may reorder it.
//!
//! A [`SizeReference`] is a fixed-width integer leaf whose value is
//! `transform(byte_length(target))`, where `target` names a [`Block`]
//! elsewhere in the same tree. Because its own width is fixed, it may appear
//! before its target in document order (the TCP record mark precedes the RPC
//! body it measures).

use crate::error::{Error, Result};
use crate::primitive::{Endian, IntField, OpaqueValue, RawField, Width, encode_uint};

/// TCP record marking "last fragment" bit (RFC 5531 §11).
pub const LAST_FRAGMENT: u64 = 0x8000_0000;

/// Mapping from a measured byte length to the value written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    Identity,
    /// Bitwise OR with a fixed flag, e.g. [`LAST_FRAGMENT`].
    Or(u64),
}

impl Transform {
    pub fn apply(self, len: u64) -> u64 {
        match self {
            Transform::Identity => len,
            Transform::Or(flag) => len | flag,
        }
    }

    /// True when `len` already uses bits the transform sets, so the
    /// transformed value would no longer announce `len`.
    pub fn collides(self, len: u64) -> bool {
        match self {
            Transform::Identity => false,
            Transform::Or(flag) => len & flag != 0,
        }
    }
}

/// Integer leaf computed at render time from the length of a named container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReference {
    name: String,
    target: String,
    width: Width,
    endian: Endian,
    transform: Transform,
    override_value: Option<u64>,
    fuzzable: bool,
}

impl SizeReference {
    /// Big-endian 32-bit length of `target`.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        SizeReference {
            name: name.into(),
            target: target.into(),
            width: Width::U32,
            endian: Endian::Big,
            transform: Transform::Identity,
            override_value: None,
            fuzzable: false,
        }
    }

    pub fn width(mut self, width: Width, endian: Endian) -> Self {
        self.width = width;
        self.endian = endian;
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn fuzzable(mut self, fuzzable: bool) -> Self {
        self.fuzzable = fuzzable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn field_width(&self) -> Width {
        self.width
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn transform_kind(&self) -> Transform {
        self.transform
    }

    pub fn is_fuzzable(&self) -> bool {
        self.fuzzable
    }

    pub fn override_value(&self) -> Option<u64> {
        self.override_value
    }

    /// Replace the computed value with a fixed one until cleared or reset.
    pub fn set_override(&mut self, value: u64) -> Result<()> {
        self.override_value = Some(self.width.check(&self.name, value)?);
        Ok(())
    }

    pub fn clear_override(&mut self) {
        self.override_value = None;
    }

    /// Value to write for a target of `target_len` bytes.
    ///
    /// A computed length that overlaps the transform's flag bits is
    /// rejected; overrides are written as given.
    pub fn resolve(&self, target_len: usize) -> Result<u64> {
        if let Some(v) = self.override_value {
            return Ok(v);
        }
        let len = target_len as u64;
        if self.transform.collides(len) {
            return Err(Error::ValueOutOfRange {
                field: self.name.clone(),
                value: len,
                width: self.width.bytes(),
            });
        }
        self.width.check(&self.name, self.transform.apply(len))
    }

    /// Encoding of a zero-length target, used as the advertised default.
    pub(crate) fn placeholder_bytes(&self) -> Vec<u8> {
        encode_uint(self.transform.apply(0), self.width, self.endian)
    }
}

/// One node of a message tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Int(IntField),
    Raw(RawField),
    Opaque(OpaqueValue),
    Size(SizeReference),
    Block(Block),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Int(f) => f.name(),
            Node::Raw(f) => f.name(),
            Node::Opaque(f) => f.name(),
            Node::Size(f) => f.name(),
            Node::Block(b) => b.name(),
        }
    }

    pub fn is_fuzzable(&self) -> bool {
        match self {
            Node::Int(f) => f.is_fuzzable(),
            Node::Raw(f) => f.is_fuzzable(),
            Node::Opaque(f) => f.is_fuzzable(),
            Node::Size(f) => f.is_fuzzable(),
            Node::Block(_) => false,
        }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            Node::Int(f) => f.reset(),
            Node::Raw(f) => f.reset(),
            Node::Opaque(f) => f.reset(),
            Node::Size(f) => f.clear_override(),
            Node::Block(b) => b.children.iter_mut().for_each(Node::reset),
        }
    }
}

impl From<IntField> for Node {
    fn from(f: IntField) -> Self {
        Node::Int(f)
    }
}

impl From<RawField> for Node {
    fn from(f: RawField) -> Self {
        Node::Raw(f)
    }
}

impl From<OpaqueValue> for Node {
    fn from(f: OpaqueValue) -> Self {
        Node::Opaque(f)
    }
}

impl From<SizeReference> for Node {
    fn from(f: SizeReference) -> Self {
        Node::Size(f)
    }
}

impl From<Block> for Node {
    fn from(b: Block) -> Self {
        Node::Block(b)
    }
}

/// Named, ordered container of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    name: String,
    children: Vec<Node>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Block {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Block holding `children` in the given order.
    pub fn with_children(name: impl Into<String>, children: Vec<Node>) -> Self {
        Block {
            name: name.into(),
            children,
        }
    }

    /// Append a child (builder style).
    pub fn push(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children in order.
    pub fn extend(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }
}
