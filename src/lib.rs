//! # xdr-blocks
//!
//! Declarative composition and rendering of XDR-encoded ONC RPC messages
//! (RFC 4506, RFC 5531), with builders for every NFSv3 procedure (RFC 1813).
//!
//! ## Overview
//!
//! A message is a tree of named leaves and containers. Some leaves are not
//! fixed values but *size references*: their value is computed at render
//! time from the byte length of another container, optionally transformed
//! (the TCP record mark ORs in the last-fragment bit). Rendering is
//! two-phase (measure every container, then emit in document order) so a
//! size field may precede what it measures.
//!
//! The crate builds *valid baseline* calls. Each leaf advertises its type,
//! width, byte order, default encoding and whether it is a mutation
//! candidate; an external fuzzing driver perturbs leaves through
//! [`Message::set_int`] / [`Message::set_bytes`] and re-renders. Transport,
//! sessions and crash detection belong to that driver.
//!
//! ## Layers
//!
//! | Module | Role |
//! |--------|------|
//! | [`primitive`] | integers, raw bytes, XDR opaque/strings |
//! | [`block`], [`message`] | containers, size references, validation, render |
//! | [`rpc`], [`nfs3`], [`catalog`] | call envelope, NFSv3 arguments, procedure table |
//! | [`inspect`] | decode a rendered call back into its parts |
//!
//! ## Example
//!
//! ```rust
//! use xdr_blocks::nfs3;
//!
//! let call = nfs3::null().unwrap();
//! let bytes = call.render().unwrap();
//!
//! // 4-byte record mark + 24-byte header + 16-byte AUTH_NONE
//! assert_eq!(bytes.len(), 44);
//! assert_eq!(&bytes[..4], [0x80, 0x00, 0x00, 0x28]);
//! ```

pub mod block;
pub mod catalog;
pub mod de;
pub mod error;
pub mod inspect;
pub mod message;
pub mod nfs3;
pub mod primitive;
pub mod rpc;
pub mod ser;

pub use block::{Block, LAST_FRAGMENT, Node, SizeReference, Transform};
pub use catalog::{Catalog, Nfs3Args, Procedure};
pub use error::{Error, Result};
pub use message::{FieldInfo, LeafKind, Message, Rendering, Span};
pub use primitive::{Endian, IntField, OpaqueValue, RawField, Width};
pub use rpc::{Auth, AuthSys, CallSpec};
pub use ser::{xdr_pad_length, xdr_padded_bytes};
