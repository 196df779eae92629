//! Reading rendered calls back.
//!
//! A harness uses these to log what it is about to send (transaction id,
//! procedure) and tests use them to check the wire layout. Replies are not
//! parsed here.

use crate::block::LAST_FRAGMENT;
use crate::de::{from_bytes, from_bytes_partial};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_bytes::ByteBuf;

/// Fixed part of `call_body` up to (not including) the credential.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallHeader {
    pub xid: u32,
    pub msg_type: u32,
    pub rpc_version: u32,
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
}

/// `opaque_auth`: flavor + opaque body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpaqueAuth {
    pub flavor: u32,
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
}

/// `authsys_parms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSysParms {
    pub stamp: u32,
    pub machine_name: String,
    pub uid: u32,
    pub gid: u32,
    pub gids: Vec<u32>,
}

impl OpaqueAuth {
    /// Decode the body as AUTH_SYS parameters.
    pub fn sys_parms(&self) -> Result<AuthSysParms> {
        from_bytes(&self.body)
    }
}

/// A rendered, record-marked call split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall<'a> {
    pub record_mark: u32,
    pub header: CallHeader,
    pub credential: OpaqueAuth,
    pub verifier: OpaqueAuth,
    /// Procedure argument bytes, undecoded.
    pub args: &'a [u8],
}

impl DecodedCall<'_> {
    pub fn last_fragment(&self) -> bool {
        self.record_mark as u64 & LAST_FRAGMENT != 0
    }

    pub fn fragment_len(&self) -> u32 {
        (self.record_mark as u64 & !LAST_FRAGMENT) as u32
    }
}

/// Split a single-fragment call into record mark, header, auth and arguments.
///
/// The fragment length must match the bytes that follow it.
pub fn decode_call(bytes: &[u8]) -> Result<DecodedCall<'_>> {
    let (record_mark, body): (u32, &[u8]) = from_bytes_partial(bytes)?;
    let fragment_len = record_mark & !(LAST_FRAGMENT as u32);
    if fragment_len as usize != body.len() {
        return Err(Error::Message(format!(
            "record mark announces {} bytes but {} follow",
            fragment_len,
            body.len()
        )));
    }
    let ((header, credential, verifier), args): ((CallHeader, OpaqueAuth, OpaqueAuth), &[u8]) =
        from_bytes_partial(body)?;
    Ok(DecodedCall {
        record_mark,
        header,
        credential,
        verifier,
        args,
    })
}

/// Read one XDR opaque from the front of `bytes`, returning the data and the rest.
pub fn decode_opaque(bytes: &[u8]) -> Result<(Vec<u8>, &[u8])> {
    let (data, rest): (ByteBuf, &[u8]) = from_bytes_partial(bytes)?;
    Ok((data.into_vec(), rest))
}
