//! The validated root of a message tree and its renderer.
//!
//! ## Rendering
//!
//! Rendering is two-phase and keeps all state local to one call:
//!
//! 1. **Measure.** Every container is sized bottom-up (post-order) into a
//!    `name → byte length` map. Leaf widths never depend on size values, so
//!    this pass needs no size resolution.
//! 2. **Emit.** Nodes are written in document order; each [`SizeReference`]
//!    is resolved against the completed map, so a size field may precede the
//!    container it measures.
//!
//! The map is rebuilt on every render, so a mutation that changes a
//! container's length is always reflected.
//!
//! ## Validation
//!
//! [`Message::new`] rejects duplicate names, size fields whose target is not a
//! container in the tree, and size fields that measure one of their own
//! ancestors. A validated tree cannot change shape afterwards; only leaf
//! values move.

use crate::block::{Block, Node, SizeReference};
use crate::error::{Error, Result};
use crate::primitive::Endian;
use crate::ser::Serializer;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::ops::Range;
use tracing::{debug, trace};

/// A complete, validated tree ready for rendering and mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    root: Block,
}

impl Message {
    /// Assemble and validate a tree named `name` holding `children`.
    pub fn new(name: impl Into<String>, children: Vec<Node>) -> Result<Self> {
        Self::from_block(Block::with_children(name, children))
    }

    /// Validate an already assembled root block.
    pub fn from_block(root: Block) -> Result<Self> {
        let message = Message { root };
        message.validate()?;
        debug!(tree = %message.name(), "assembled message tree");
        Ok(message)
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut blocks = HashSet::new();
        collect_names(&self.root, self.name(), &mut names, &mut blocks)?;

        let mut ancestors = Vec::new();
        check_sizes(&self.root, self.name(), &blocks, &mut ancestors)
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    /// Render the tree to a fresh buffer.
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut pass = RenderPass::measure(self);
        let mut ser = Serializer::new(Vec::new());
        pass.emit_block(&self.root, &mut ser)?;
        let out = ser.into_writer();
        debug!(tree = %self.name(), len = out.len(), "rendered message");
        Ok(out)
    }

    /// Render directly into `writer`.
    pub fn render_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut pass = RenderPass::measure(self);
        let mut ser = Serializer::new(writer);
        pass.emit_block(&self.root, &mut ser)?;
        debug!(tree = %self.name(), len = ser.position(), "rendered message");
        Ok(())
    }

    /// Render and record the byte range of every named node.
    pub fn render_with_layout(&self) -> Result<Rendering> {
        let mut pass = RenderPass::measure(self);
        pass.spans = Some(Vec::new());
        let mut ser = Serializer::new(Vec::new());
        pass.emit_block(&self.root, &mut ser)?;
        Ok(Rendering {
            bytes: ser.into_writer(),
            spans: pass.spans.unwrap_or_default(),
        })
    }

    /// Rendered length of the container `name`, if it exists.
    pub fn block_len(&self, name: &str) -> Option<usize> {
        RenderPass::measure(self).lengths.get(name).copied()
    }

    // ── Mutation surface ───────────────────────────────────────────────────

    /// Look up any node by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        if self.root.name() == name {
            return None;
        }
        find(self.root.children(), name)
    }

    fn leaf_mut(&mut self, name: &str) -> Result<&mut Node> {
        let tree = self.root.name().to_string();
        match find_mut(self.root.children_mut(), name) {
            Some(Node::Block(_)) | None => Err(Error::UnknownField {
                tree,
                name: name.to_string(),
            }),
            Some(node) => Ok(node),
        }
    }

    /// Set an integer leaf. On a size field this pins an override that
    /// replaces the computed value.
    pub fn set_int(&mut self, name: &str, value: u64) -> Result<()> {
        match self.leaf_mut(name)? {
            Node::Int(f) => f.set(value),
            Node::Size(f) => f.set_override(value),
            _ => Err(Error::KindMismatch {
                field: name.to_string(),
                expected: "integer or size field",
            }),
        }
    }

    /// Drop a size-field override so the value is computed again.
    pub fn clear_override(&mut self, name: &str) -> Result<()> {
        match self.leaf_mut(name)? {
            Node::Size(f) => {
                f.clear_override();
                Ok(())
            }
            _ => Err(Error::KindMismatch {
                field: name.to_string(),
                expected: "size field",
            }),
        }
    }

    /// Replace the bytes of a raw or opaque leaf.
    pub fn set_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        match self.leaf_mut(name)? {
            Node::Raw(f) => {
                f.set(bytes);
                Ok(())
            }
            Node::Opaque(f) => f.set(bytes),
            _ => Err(Error::KindMismatch {
                field: name.to_string(),
                expected: "raw or opaque field",
            }),
        }
    }

    /// Decouple an opaque leaf's length prefix from its data.
    pub fn set_declared_length(&mut self, name: &str, len: Option<u32>) -> Result<()> {
        match self.leaf_mut(name)? {
            Node::Opaque(f) => {
                f.set_declared_length(len);
                Ok(())
            }
            _ => Err(Error::KindMismatch {
                field: name.to_string(),
                expected: "opaque field",
            }),
        }
    }

    /// Restore every leaf to its default and drop all overrides.
    pub fn reset(&mut self) {
        self.root.children_mut().iter_mut().for_each(Node::reset);
    }

    /// Names of all fuzzable leaves, in document order.
    pub fn fuzzable_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        walk_leaves(self.root.children(), &mut |node| {
            if node.is_fuzzable() {
                out.push(node.name());
            }
        });
        out
    }

    // ── Metadata ───────────────────────────────────────────────────────────

    /// Per-leaf metadata for an external mutator, in document order.
    pub fn describe(&self) -> Vec<FieldInfo> {
        let mut out = Vec::new();
        let mut path = vec![self.root.name()];
        describe_nodes(self.root.children(), &mut path, &mut out);
        out
    }

    /// [`Message::describe`] as a JSON array.
    pub fn describe_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.describe()).map_err(|e| Error::Message(e.to_string()))
    }
}

fn collect_names<'a>(
    block: &'a Block,
    tree: &str,
    names: &mut HashSet<&'a str>,
    blocks: &mut HashSet<&'a str>,
) -> Result<()> {
    if !names.insert(block.name()) {
        return Err(Error::DuplicateName {
            tree: tree.to_string(),
            name: block.name().to_string(),
        });
    }
    blocks.insert(block.name());
    for child in block.children() {
        match child {
            Node::Block(b) => collect_names(b, tree, names, blocks)?,
            leaf => {
                if !names.insert(leaf.name()) {
                    return Err(Error::DuplicateName {
                        tree: tree.to_string(),
                        name: leaf.name().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn check_sizes<'a>(
    block: &'a Block,
    tree: &str,
    blocks: &HashSet<&str>,
    ancestors: &mut Vec<&'a str>,
) -> Result<()> {
    ancestors.push(block.name());
    for child in block.children() {
        match child {
            Node::Block(b) => check_sizes(b, tree, blocks, ancestors)?,
            Node::Size(size) => check_size(size, tree, blocks, ancestors)?,
            _ => {}
        }
    }
    ancestors.pop();
    Ok(())
}

fn check_size(
    size: &SizeReference,
    tree: &str,
    blocks: &HashSet<&str>,
    ancestors: &[&str],
) -> Result<()> {
    if !blocks.contains(size.target()) {
        return Err(Error::UnknownSizeTarget {
            tree: tree.to_string(),
            field: size.name().to_string(),
            target: size.target().to_string(),
        });
    }
    if ancestors.contains(&size.target()) {
        return Err(Error::SizeCycle {
            tree: tree.to_string(),
            field: size.name().to_string(),
            target: size.target().to_string(),
        });
    }
    Ok(())
}

fn find<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.name() == name {
            return Some(node);
        }
        if let Node::Block(b) = node {
            if let Some(found) = find(b.children(), name) {
                return Some(found);
            }
        }
    }
    None
}

fn find_mut<'a>(nodes: &'a mut [Node], name: &str) -> Option<&'a mut Node> {
    for node in nodes.iter_mut() {
        if node.name() == name {
            return Some(node);
        }
        if let Node::Block(b) = node {
            if let Some(found) = find_mut(b.children_mut(), name) {
                return Some(found);
            }
        }
    }
    None
}

fn walk_leaves<'a>(nodes: &'a [Node], visit: &mut impl FnMut(&'a Node)) {
    for node in nodes {
        match node {
            Node::Block(b) => walk_leaves(b.children(), visit),
            leaf => visit(leaf),
        }
    }
}

// ── Render pass ────────────────────────────────────────────────────────────

/// State for one render invocation. Never reused across renders.
struct RenderPass<'a> {
    tree: &'a str,
    lengths: HashMap<&'a str, usize>,
    spans: Option<Vec<Span>>,
}

impl<'a> RenderPass<'a> {
    /// Phase 1: size every container bottom-up.
    fn measure(message: &'a Message) -> Self {
        let mut lengths = HashMap::new();
        measure_block(&message.root, &mut lengths);
        RenderPass {
            tree: message.name(),
            lengths,
            spans: None,
        }
    }

    /// Phase 2: write nodes in document order.
    fn emit_block<W: Write>(&mut self, block: &Block, ser: &mut Serializer<W>) -> Result<()> {
        let start = ser.position();
        for child in block.children() {
            self.emit_node(child, ser)?;
        }
        self.record(block.name(), start, ser.position());
        Ok(())
    }

    fn emit_node<W: Write>(&mut self, node: &Node, ser: &mut Serializer<W>) -> Result<()> {
        let start = ser.position();
        match node {
            Node::Block(b) => return self.emit_block(b, ser),
            Node::Int(f) => ser.put_uint(f.value(), f.width(), f.endian())?,
            Node::Raw(f) => ser.put_raw(f.value())?,
            Node::Opaque(f) => ser.put_opaque(f.data(), f.declared_len())?,
            Node::Size(size) => {
                let target_len = self.lengths.get(size.target()).copied().ok_or_else(|| {
                    Error::UnresolvedSizeReference {
                        tree: self.tree.to_string(),
                        field: size.name().to_string(),
                        target: size.target().to_string(),
                    }
                })?;
                let value = size.resolve(target_len)?;
                trace!(
                    tree = %self.tree,
                    field = %size.name(),
                    target = %size.target(),
                    target_len,
                    value,
                    "resolved size field"
                );
                ser.put_uint(value, size.field_width(), size.endian())?;
            }
        }
        self.record(node.name(), start, ser.position());
        Ok(())
    }

    fn record(&mut self, name: &str, start: usize, end: usize) {
        if let Some(spans) = self.spans.as_mut() {
            spans.push(Span {
                name: name.to_string(),
                range: start..end,
            });
        }
    }
}

fn measure_block<'a>(block: &'a Block, lengths: &mut HashMap<&'a str, usize>) -> usize {
    let len = block
        .children()
        .iter()
        .map(|child| measure_node(child, lengths))
        .sum();
    lengths.insert(block.name(), len);
    len
}

fn measure_node<'a>(node: &'a Node, lengths: &mut HashMap<&'a str, usize>) -> usize {
    match node {
        Node::Block(b) => measure_block(b, lengths),
        Node::Int(f) => f.width().bytes(),
        Node::Raw(f) => f.value().len(),
        Node::Opaque(f) => f.encoded_len(),
        Node::Size(f) => f.field_width().bytes(),
    }
}

/// Byte range covered by one named node in a rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub name: String,
    pub range: Range<usize>,
}

/// Rendered bytes plus the layout of every named node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    pub bytes: Vec<u8>,
    pub spans: Vec<Span>,
}

impl Rendering {
    /// Byte range of the node `name`.
    pub fn span(&self, name: &str) -> Option<Range<usize>> {
        self.spans
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.range.clone())
    }

    /// Bytes of the node `name`.
    pub fn slice(&self, name: &str) -> Option<&[u8]> {
        self.span(name).map(|r| &self.bytes[r])
    }
}

// ── Metadata ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    Int,
    Raw,
    Opaque,
    Size,
}

/// What an external mutator needs to know about one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    /// Enclosing container names from the root, joined by `/`.
    pub path: String,
    pub kind: LeafKind,
    /// Fixed wire width; `None` for variable-length opaque data.
    pub width: Option<usize>,
    pub endian: Option<Endian>,
    pub default_hex: String,
    pub fuzzable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_target: Option<String>,
}

fn describe_nodes<'a>(nodes: &'a [Node], path: &mut Vec<&'a str>, out: &mut Vec<FieldInfo>) {
    for node in nodes {
        let (kind, width, endian, default, size_target) = match node {
            Node::Block(b) => {
                path.push(b.name());
                describe_nodes(b.children(), path, out);
                path.pop();
                continue;
            }
            Node::Int(f) => (
                LeafKind::Int,
                Some(f.width().bytes()),
                Some(f.endian()),
                f.default_bytes(),
                None,
            ),
            Node::Raw(f) => (
                LeafKind::Raw,
                Some(f.default_bytes().len()),
                None,
                f.default_bytes().to_vec(),
                None,
            ),
            Node::Opaque(f) => (LeafKind::Opaque, None, None, f.default_bytes(), None),
            Node::Size(f) => (
                LeafKind::Size,
                Some(f.field_width().bytes()),
                Some(f.endian()),
                f.placeholder_bytes(),
                Some(f.target().to_string()),
            ),
        };
        out.push(FieldInfo {
            name: node.name().to_string(),
            path: path.join("/"),
            kind,
            width,
            endian,
            default_hex: hex::encode(default),
            fuzzable: node.is_fuzzable(),
            size_target,
        });
    }
}
