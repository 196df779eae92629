//! Sun RPC (ONC RPC) call framing, RFC 5531.
//!
//! Wire layout of one call over TCP:
//!
//! ```text
//! record_mark (4) = LAST_FRAGMENT | len(rpc_message)
//! rpc_message:
//!     xid (4) || msg_type=CALL (4) || rpcvers=2 (4)
//!     || prog (4) || vers (4) || proc (4)
//!     || cred: flavor (4) || length (4) || body
//!     || verf: flavor (4) || length (4) || body
//!     || procedure arguments
//! ```

use crate::block::{Block, LAST_FRAGMENT, Node, SizeReference, Transform};
use crate::error::Result;
use crate::message::Message;
use crate::primitive::{IntField, OpaqueValue};
use serde::Deserialize;

/// RPC message types
pub mod msg_type {
    pub const CALL: u32 = 0;
    pub const REPLY: u32 = 1;
}

/// RPC version (always 2 for current RPC)
pub const RPC_VERSION: u32 = 2;

/// RPC program numbers
pub mod program {
    pub const PORTMAP: u32 = 100000;
    pub const NFS: u32 = 100003;
    pub const MOUNT: u32 = 100005;
}

/// Well-known TCP ports
pub mod port {
    pub const PORTMAP: u16 = 111;
    pub const NFS: u16 = 2049;
}

/// Authentication flavours
pub mod auth_flavor {
    pub const AUTH_NONE: u32 = 0;
    pub const AUTH_SYS: u32 = 1;
    pub const AUTH_SHORT: u32 = 2;
    pub const AUTH_DES: u32 = 3;
    pub const RPCSEC_GSS: u32 = 6;
}

/// `string machinename<255>` in `authsys_parms`.
pub const MAX_MACHINE_NAME: usize = 255;

/// Credential carried by a call. The verifier is always AUTH_NONE.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "flavor", rename_all = "lowercase")]
pub enum Auth {
    #[default]
    None,
    Sys(AuthSys),
}

/// `authsys_parms` with an empty auxiliary gid list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSys {
    pub stamp: u32,
    pub machine_name: String,
    pub uid: u32,
    pub gid: u32,
}

impl Default for AuthSys {
    fn default() -> Self {
        AuthSys {
            stamp: 0,
            machine_name: "fuzzer".to_string(),
            uid: 0,
            gid: 0,
        }
    }
}

/// TCP record mark over the container `target`.
pub fn record_mark(name: impl Into<String>, target: impl Into<String>) -> SizeReference {
    SizeReference::new(name, target)
        .transform(Transform::Or(LAST_FRAGMENT))
        .fuzzable(true)
}

/// Credential + verifier container named `name`.
pub fn auth_block(name: &str, auth: &Auth) -> Result<Block> {
    match auth {
        Auth::None => Ok(auth_none(name)),
        Auth::Sys(parms) => auth_sys(name, parms),
    }
}

/// AUTH_NONE credential and verifier: four words, both bodies empty.
pub fn auth_none(name: &str) -> Block {
    Block::new(name)
        .push(IntField::u32(format!("{name}_cred_flavor"), auth_flavor::AUTH_NONE))
        .push(IntField::u32(format!("{name}_cred_length"), 0))
        .push(IntField::u32(format!("{name}_verf_flavor"), auth_flavor::AUTH_NONE))
        .push(IntField::u32(format!("{name}_verf_length"), 0))
}

/// AUTH_SYS credential with an AUTH_NONE verifier.
///
/// The credential length is a size field over the credential body, so it
/// tracks a mutated machine name.
pub fn auth_sys(name: &str, parms: &AuthSys) -> Result<Block> {
    let body_name = format!("{name}_cred_body");
    let body = Block::new(body_name.as_str())
        .push(IntField::u32(format!("{name}_stamp"), parms.stamp))
        .push(
            OpaqueValue::bounded(
                format!("{name}_machine"),
                parms.machine_name.as_bytes(),
                MAX_MACHINE_NAME,
            )?,
        )
        .push(IntField::u32(format!("{name}_uid"), parms.uid).fuzzable(true))
        .push(IntField::u32(format!("{name}_gid"), parms.gid).fuzzable(true))
        .push(IntField::u32(format!("{name}_aux_gid_count"), 0));

    Ok(Block::new(name)
        .push(IntField::u32(format!("{name}_cred_flavor"), auth_flavor::AUTH_SYS))
        .push(SizeReference::new(format!("{name}_cred_length"), body_name))
        .push(body)
        .push(IntField::u32(format!("{name}_verf_flavor"), auth_flavor::AUTH_NONE))
        .push(IntField::u32(format!("{name}_verf_length"), 0)))
}

/// Header parameters of one RPC call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpec {
    /// Tree name; every node in the call is prefixed with it.
    pub name: String,
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
    pub xid: u32,
    pub auth: Auth,
}

impl CallSpec {
    /// Call with transaction id 1 and AUTH_NONE.
    pub fn new(name: impl Into<String>, program: u32, version: u32, procedure: u32) -> Self {
        CallSpec {
            name: name.into(),
            program,
            version,
            procedure,
            xid: 1,
            auth: Auth::None,
        }
    }

    pub fn xid(mut self, xid: u32) -> Self {
        self.xid = xid;
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn body_name(&self) -> String {
        format!("{}_rpc_message", self.name)
    }

    pub fn auth_name(&self) -> String {
        format!("{}_auth", self.name)
    }

    pub fn args_name(&self) -> String {
        format!("{}_args", self.name)
    }
}

/// Wrap procedure arguments in a complete record-marked RPC call.
pub fn call(spec: &CallSpec, args: Vec<Node>) -> Result<Message> {
    Message::new(spec.name.as_str(), call_nodes(spec, args)?)
}

/// Record mark and RPC body of one call, unvalidated, for embedding in a
/// larger tree. Several calls can share a tree when their `CallSpec` names
/// differ.
pub fn call_nodes(spec: &CallSpec, args: Vec<Node>) -> Result<Vec<Node>> {
    let name = spec.name.as_str();
    let header =
        |field: &str, value: u32| IntField::u32(format!("{name}_{field}"), value).fuzzable(true);

    let body = Block::new(spec.body_name())
        .push(header("xid", spec.xid))
        .push(header("msg_type", msg_type::CALL))
        .push(header("rpc_version", RPC_VERSION))
        .push(header("program", spec.program))
        .push(header("version", spec.version))
        .push(header("procedure", spec.procedure))
        .push(auth_block(&spec.auth_name(), &spec.auth)?)
        .push(Block::with_children(spec.args_name(), args));

    Ok(vec![
        record_mark(format!("{name}_record_mark"), spec.body_name()).into(),
        body.into(),
    ])
}
