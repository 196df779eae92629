//! NFS Version 3 call builders (RFC 1813).
//!
//! Every NFSv3 argument list is composed from a handful of shared sub-trees:
//! [`fhandle3`], [`filename3`], [`dirop3`], [`nfstime3`], [`sattr3_unset`] and
//! [`write3_payload`]. The per-procedure functions at the bottom of this
//! module fill an [`Nfs3Args`] and hand it to the procedure table in
//! [`crate::catalog`].

use crate::block::{Block, Node};
use crate::catalog::{Nfs3Args, Procedure};
use crate::error::Result;
use crate::message::Message;
use crate::primitive::{IntField, OpaqueValue, RawField};

pub const NFS_V3: u32 = 3;

/// NFSv3 procedure numbers
pub mod proc3 {
    pub const NULL: u32 = 0;
    pub const GETATTR: u32 = 1;
    pub const SETATTR: u32 = 2;
    pub const LOOKUP: u32 = 3;
    pub const ACCESS: u32 = 4;
    pub const READLINK: u32 = 5;
    pub const READ: u32 = 6;
    pub const WRITE: u32 = 7;
    pub const CREATE: u32 = 8;
    pub const MKDIR: u32 = 9;
    pub const SYMLINK: u32 = 10;
    pub const MKNOD: u32 = 11;
    pub const REMOVE: u32 = 12;
    pub const RMDIR: u32 = 13;
    pub const RENAME: u32 = 14;
    pub const LINK: u32 = 15;
    pub const READDIR: u32 = 16;
    pub const READDIRPLUS: u32 = 17;
    pub const FSSTAT: u32 = 18;
    pub const FSINFO: u32 = 19;
    pub const PATHCONF: u32 = 20;
    pub const COMMIT: u32 = 21;
}

/// Access bits for ACCESS
pub mod access3 {
    pub const READ: u32 = 0x0001;
    pub const LOOKUP: u32 = 0x0002;
    pub const MODIFY: u32 = 0x0004;
    pub const EXTEND: u32 = 0x0008;
    pub const DELETE: u32 = 0x0010;
    pub const EXECUTE: u32 = 0x0020;
    pub const ALL: u32 = 0x003F;
}

/// `stable_how` for WRITE
pub mod stable_how {
    pub const UNSTABLE: u32 = 0;
    pub const DATA_SYNC: u32 = 1;
    pub const FILE_SYNC: u32 = 2;
}

/// `createmode3` for CREATE
pub mod createmode3 {
    pub const UNCHECKED: u32 = 0;
    pub const GUARDED: u32 = 1;
    pub const EXCLUSIVE: u32 = 2;
}

/// `ftype3`
pub mod ftype3 {
    pub const NF3REG: u32 = 1;
    pub const NF3DIR: u32 = 2;
    pub const NF3BLK: u32 = 3;
    pub const NF3CHR: u32 = 4;
    pub const NF3LNK: u32 = 5;
    pub const NF3SOCK: u32 = 6;
    pub const NF3FIFO: u32 = 7;
}

/// Maximum file handle size in bytes.
pub const NFS3_FHSIZE: usize = 64;

/// Size of `cookieverf3` and `writeverf3`.
pub const NFS3_COOKIEVERFSIZE: usize = 8;

/// Recognizable non-random handle used when the caller supplies none.
pub const DEFAULT_HANDLE: [u8; 32] = [
    0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF,
    0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF,
];

// ── Shared sub-trees ───────────────────────────────────────────────────────

/// `nfs_fh3`: opaque handle of at most 64 bytes.
pub fn fhandle3(name: impl Into<String>, handle: &[u8]) -> Result<Node> {
    Ok(OpaqueValue::bounded(name, handle, NFS3_FHSIZE)?
        .fuzzable(true)
        .into())
}

/// `filename3`: XDR string.
pub fn filename3(name: impl Into<String>, filename: &str) -> Result<Node> {
    Ok(OpaqueValue::string(name, filename)?.fuzzable(true).into())
}

/// `diropargs3`: directory handle followed by an entry name.
pub fn dirop3(name: &str, dir_handle: &[u8], filename: &str) -> Result<Block> {
    Ok(Block::new(name)
        .push(fhandle3(format!("{name}_dir_handle"), dir_handle)?)
        .push(filename3(format!("{name}_name"), filename)?))
}

/// `nfstime3`: seconds and nanoseconds.
pub fn nfstime3(name: &str, seconds: u32, nseconds: u32) -> Block {
    Block::new(name)
        .push(IntField::u32(format!("{name}_seconds"), seconds).fuzzable(true))
        .push(IntField::u32(format!("{name}_nseconds"), nseconds).fuzzable(true))
}

/// `sattr3` with every discriminant set to "don't set".
pub fn sattr3_unset(prefix: &str) -> Vec<Node> {
    ["set_mode", "set_uid", "set_gid", "set_size", "set_atime", "set_mtime"]
        .iter()
        .map(|field| IntField::u32(format!("{prefix}_{field}"), 0).into())
        .collect()
}

/// `cookieverf3`: eight raw bytes, no length prefix.
pub fn cookieverf3(name: impl Into<String>, verf: [u8; NFS3_COOKIEVERFSIZE]) -> Node {
    RawField::new(name, verf).fuzzable(true).into()
}

/// WRITE3args body.
///
/// `count` is written as given and never checked against `data.len()`:
/// the mismatch is a deliberate fuzz target.
pub fn write3_payload(
    prefix: &str,
    handle: &[u8],
    offset: u64,
    count: u32,
    stable: u32,
    data: &[u8],
) -> Result<Vec<Node>> {
    Ok(vec![
        fhandle3(format!("{prefix}_fhandle"), handle)?,
        IntField::u64(format!("{prefix}_offset"), offset)
            .fuzzable(true)
            .into(),
        IntField::u32(format!("{prefix}_count"), count)
            .fuzzable(true)
            .into(),
        IntField::u32(format!("{prefix}_stable"), stable)
            .fuzzable(true)
            .into(),
        OpaqueValue::new(format!("{prefix}_data"), data)?
            .fuzzable(true)
            .into(),
    ])
}

// ── One builder per procedure ──────────────────────────────────────────────

fn build(procedure: Procedure, args: Nfs3Args) -> Result<Message> {
    procedure.entry().build(&args)
}

/// NULL (0): no arguments; connectivity probe.
pub fn null() -> Result<Message> {
    build(Procedure::Null, Nfs3Args::default())
}

/// GETATTR (1)
pub fn getattr(handle: &[u8]) -> Result<Message> {
    build(Procedure::Getattr, Nfs3Args::with_handle(handle))
}

/// LOOKUP (3): directory handle + name to look up.
pub fn lookup(dir_handle: &[u8], filename: &str) -> Result<Message> {
    build(
        Procedure::Lookup,
        Nfs3Args {
            name: Some(filename.to_string()),
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// ACCESS (4)
pub fn access(handle: &[u8], access_bits: u32) -> Result<Message> {
    build(
        Procedure::Access,
        Nfs3Args {
            access: access_bits,
            ..Nfs3Args::with_handle(handle)
        },
    )
}

/// READLINK (5)
pub fn readlink(handle: &[u8]) -> Result<Message> {
    build(Procedure::Readlink, Nfs3Args::with_handle(handle))
}

/// READ (6)
pub fn read(handle: &[u8], offset: u64, count: u32) -> Result<Message> {
    build(
        Procedure::Read,
        Nfs3Args {
            offset,
            count: Some(count),
            ..Nfs3Args::with_handle(handle)
        },
    )
}

/// WRITE (7): `count` is independent of `data.len()`.
pub fn write(handle: &[u8], offset: u64, count: u32, stable: u32, data: &[u8]) -> Result<Message> {
    build(
        Procedure::Write,
        Nfs3Args {
            offset,
            count: Some(count),
            stable,
            data: data.to_vec(),
            ..Nfs3Args::with_handle(handle)
        },
    )
}

/// CREATE (8)
pub fn create(dir_handle: &[u8], filename: &str, create_mode: u32) -> Result<Message> {
    build(
        Procedure::Create,
        Nfs3Args {
            name: Some(filename.to_string()),
            create_mode,
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// MKDIR (9)
pub fn mkdir(dir_handle: &[u8], dirname: &str) -> Result<Message> {
    build(
        Procedure::Mkdir,
        Nfs3Args {
            name: Some(dirname.to_string()),
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// REMOVE (12)
pub fn remove(dir_handle: &[u8], filename: &str) -> Result<Message> {
    build(
        Procedure::Remove,
        Nfs3Args {
            name: Some(filename.to_string()),
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// RMDIR (13)
pub fn rmdir(dir_handle: &[u8], dirname: &str) -> Result<Message> {
    build(
        Procedure::Rmdir,
        Nfs3Args {
            name: Some(dirname.to_string()),
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// RENAME (14): two directory operations, from and to.
pub fn rename(
    from_dir_handle: &[u8],
    from_name: &str,
    to_dir_handle: &[u8],
    to_name: &str,
) -> Result<Message> {
    build(
        Procedure::Rename,
        Nfs3Args {
            name: Some(from_name.to_string()),
            to_handle: to_dir_handle.to_vec(),
            to_name: Some(to_name.to_string()),
            ..Nfs3Args::with_handle(from_dir_handle)
        },
    )
}

/// READDIR (16)
pub fn readdir(
    dir_handle: &[u8],
    cookie: u64,
    cookieverf: [u8; NFS3_COOKIEVERFSIZE],
    count: u32,
) -> Result<Message> {
    build(
        Procedure::Readdir,
        Nfs3Args {
            cookie,
            cookieverf,
            count: Some(count),
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// READDIRPLUS (17)
pub fn readdirplus(
    dir_handle: &[u8],
    cookie: u64,
    cookieverf: [u8; NFS3_COOKIEVERFSIZE],
    dircount: u32,
    maxcount: u32,
) -> Result<Message> {
    build(
        Procedure::Readdirplus,
        Nfs3Args {
            cookie,
            cookieverf,
            dircount,
            maxcount,
            ..Nfs3Args::with_handle(dir_handle)
        },
    )
}

/// FSSTAT (18)
pub fn fsstat(fsroot: &[u8]) -> Result<Message> {
    build(Procedure::Fsstat, Nfs3Args::with_handle(fsroot))
}

/// FSINFO (19)
pub fn fsinfo(fsroot: &[u8]) -> Result<Message> {
    build(Procedure::Fsinfo, Nfs3Args::with_handle(fsroot))
}

/// PATHCONF (20)
pub fn pathconf(handle: &[u8]) -> Result<Message> {
    build(Procedure::Pathconf, Nfs3Args::with_handle(handle))
}

/// COMMIT (21): `count` 0 commits everything from `offset`.
pub fn commit(handle: &[u8], offset: u64, count: u32) -> Result<Message> {
    build(
        Procedure::Commit,
        Nfs3Args {
            offset,
            count: Some(count),
            ..Nfs3Args::with_handle(handle)
        },
    )
}
