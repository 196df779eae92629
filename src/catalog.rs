//! NFSv3 procedure table.
//!
//! Each procedure is one [`ProcedureEntry`]: its token, RPC coordinates, the
//! shape of its argument list and its per-procedure baseline defaults. A
//! [`Catalog`] is built once and passed by reference to whatever needs
//! lookup by token; there is no process-wide registry.

use crate::block::Node;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::nfs3::{
    self, DEFAULT_HANDLE, NFS_V3, NFS3_COOKIEVERFSIZE, access3, createmode3, proc3, stable_how,
};
use crate::primitive::IntField;
use crate::rpc::{self, Auth, CallSpec};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The NFSv3 procedures the catalog can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    Null,
    Getattr,
    Lookup,
    Access,
    Readlink,
    Read,
    Write,
    Create,
    Mkdir,
    Remove,
    Rmdir,
    Rename,
    Readdir,
    Readdirplus,
    Fsstat,
    Fsinfo,
    Pathconf,
    Commit,
}

impl Procedure {
    pub const ALL: [Procedure; 18] = [
        Procedure::Null,
        Procedure::Getattr,
        Procedure::Lookup,
        Procedure::Access,
        Procedure::Readlink,
        Procedure::Read,
        Procedure::Write,
        Procedure::Create,
        Procedure::Mkdir,
        Procedure::Remove,
        Procedure::Rmdir,
        Procedure::Rename,
        Procedure::Readdir,
        Procedure::Readdirplus,
        Procedure::Fsstat,
        Procedure::Fsinfo,
        Procedure::Pathconf,
        Procedure::Commit,
    ];

    /// Table row for this procedure.
    pub fn entry(self) -> &'static ProcedureEntry {
        // NFS3_PROCEDURES is declared in `Procedure::ALL` order.
        &NFS3_PROCEDURES[self as usize]
    }

    pub fn token(self) -> &'static str {
        self.entry().token
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Procedure {
    type Err = Error;

    /// Tokens match case-insensitively (`LOOKUP`, `lookup`).
    fn from_str(s: &str) -> Result<Self> {
        Procedure::ALL
            .into_iter()
            .find(|p| p.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownProcedure(s.to_string()))
    }
}

/// Structural pattern of an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// No arguments.
    Void,
    /// A single file handle, stored under `{call}_{field}`.
    Object { field: &'static str },
    /// Handle + access bits.
    Access,
    /// Handle + offset + count (READ, COMMIT).
    Range,
    /// Handle + offset + count + stable + data.
    Write,
    /// A single `diropargs3` under `{call}_{field}`.
    DirOp { field: &'static str },
    /// `where` dirop + createhow3 mode + unset sattr3.
    Create,
    /// `where` dirop + unset sattr3.
    Mkdir,
    /// `from` dirop + `to` dirop.
    Rename,
    /// Dir handle + cookie + cookieverf + count.
    Readdir,
    /// Dir handle + cookie + cookieverf + dircount + maxcount.
    Readdirplus,
}

/// One row of the procedure table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureEntry {
    pub procedure: Procedure,
    pub token: &'static str,
    pub program: u32,
    pub version: u32,
    pub number: u32,
    pub shape: ArgShape,
    /// Baseline entry name when [`Nfs3Args::name`] is unset.
    pub default_name: &'static str,
    /// Baseline destination name for RENAME.
    pub default_to_name: &'static str,
    /// Baseline count when [`Nfs3Args::count`] is unset.
    pub default_count: u32,
}

const fn entry(
    procedure: Procedure,
    token: &'static str,
    number: u32,
    shape: ArgShape,
) -> ProcedureEntry {
    ProcedureEntry {
        procedure,
        token,
        program: rpc::program::NFS,
        version: NFS_V3,
        number,
        shape,
        default_name: "testfile",
        default_to_name: "",
        default_count: 0,
    }
}

const fn named(mut e: ProcedureEntry, name: &'static str) -> ProcedureEntry {
    e.default_name = name;
    e
}

const fn counted(mut e: ProcedureEntry, count: u32) -> ProcedureEntry {
    e.default_count = count;
    e
}

static NFS3_PROCEDURES: [ProcedureEntry; 18] = {
    use ArgShape::*;
    use Procedure as P;
    [
        entry(P::Null, "NULL", proc3::NULL, Void),
        entry(P::Getattr, "GETATTR", proc3::GETATTR, Object { field: "fhandle" }),
        entry(P::Lookup, "LOOKUP", proc3::LOOKUP, DirOp { field: "what" }),
        entry(P::Access, "ACCESS", proc3::ACCESS, Access),
        entry(P::Readlink, "READLINK", proc3::READLINK, Object { field: "symlink" }),
        counted(entry(P::Read, "READ", proc3::READ, Range), 4096),
        entry(P::Write, "WRITE", proc3::WRITE, Write),
        named(entry(P::Create, "CREATE", proc3::CREATE, Create), "newfile"),
        named(entry(P::Mkdir, "MKDIR", proc3::MKDIR, Mkdir), "newdir"),
        entry(P::Remove, "REMOVE", proc3::REMOVE, DirOp { field: "object" }),
        named(
            entry(P::Rmdir, "RMDIR", proc3::RMDIR, DirOp { field: "object" }),
            "testdir",
        ),
        {
            let mut e = named(entry(P::Rename, "RENAME", proc3::RENAME, Rename), "oldname");
            e.default_to_name = "newname";
            e
        },
        counted(entry(P::Readdir, "READDIR", proc3::READDIR, Readdir), 4096),
        entry(P::Readdirplus, "READDIRPLUS", proc3::READDIRPLUS, Readdirplus),
        entry(P::Fsstat, "FSSTAT", proc3::FSSTAT, Object { field: "fsroot" }),
        entry(P::Fsinfo, "FSINFO", proc3::FSINFO, Object { field: "fsroot" }),
        entry(P::Pathconf, "PATHCONF", proc3::PATHCONF, Object { field: "object" }),
        entry(P::Commit, "COMMIT", proc3::COMMIT, Range),
    ]
};

/// Procedures that are safe to run without a valid handle.
pub const DEFAULT_SET: [Procedure; 7] = [
    Procedure::Null,
    Procedure::Getattr,
    Procedure::Lookup,
    Procedure::Access,
    Procedure::Fsstat,
    Procedure::Fsinfo,
    Procedure::Pathconf,
];

/// Semantic parameters for one call, with baseline defaults.
///
/// Fields a procedure does not use are ignored. Deserializes from an
/// override document in which every key is optional:
///
/// ```rust
/// use xdr_blocks::catalog::Nfs3Args;
///
/// let args = Nfs3Args::from_json(r#"{"xid": 7, "name": "etc", "auth": {"flavor": "sys", "uid": 1000}}"#).unwrap();
/// assert_eq!(args.xid, 7);
/// assert_eq!(args.offset, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Nfs3Args {
    pub xid: u32,
    pub auth: Auth,
    /// Object, directory, or RENAME source-directory handle.
    pub handle: Vec<u8>,
    /// RENAME destination-directory handle.
    pub to_handle: Vec<u8>,
    /// Entry name; `None` takes the procedure's default.
    pub name: Option<String>,
    /// RENAME destination name; `None` takes the procedure's default.
    pub to_name: Option<String>,
    pub offset: u64,
    /// `None` takes the procedure's default count.
    pub count: Option<u32>,
    pub access: u32,
    pub stable: u32,
    pub data: Vec<u8>,
    pub cookie: u64,
    pub cookieverf: [u8; NFS3_COOKIEVERFSIZE],
    pub dircount: u32,
    pub maxcount: u32,
    pub create_mode: u32,
}

impl Default for Nfs3Args {
    fn default() -> Self {
        Nfs3Args {
            xid: 1,
            auth: Auth::None,
            handle: DEFAULT_HANDLE.to_vec(),
            to_handle: DEFAULT_HANDLE.to_vec(),
            name: None,
            to_name: None,
            offset: 0,
            count: None,
            access: access3::ALL,
            stable: stable_how::FILE_SYNC,
            data: Vec::new(),
            cookie: 0,
            cookieverf: [0; NFS3_COOKIEVERFSIZE],
            dircount: 4096,
            maxcount: 8192,
            create_mode: createmode3::UNCHECKED,
        }
    }
}

impl Nfs3Args {
    /// Defaults with `handle` as the primary handle.
    pub fn with_handle(handle: &[u8]) -> Self {
        Nfs3Args {
            handle: handle.to_vec(),
            ..Nfs3Args::default()
        }
    }

    /// Parse an override document. Negative or oversize numbers, unknown
    /// keys and malformed JSON are rejected as [`Error::InvalidParameters`].
    pub fn from_json(doc: &str) -> Result<Self> {
        Ok(serde_json::from_str(doc)?)
    }
}

impl ProcedureEntry {
    /// Tree name for this procedure's calls.
    pub fn call_name(&self) -> String {
        format!("NFS3-{}", self.token)
    }

    /// Build a validated call message from `args`.
    pub fn build(&self, args: &Nfs3Args) -> Result<Message> {
        let spec = CallSpec::new(self.call_name(), self.program, self.version, self.number)
            .xid(args.xid)
            .auth(args.auth.clone());
        let nodes = self.arguments(&spec.name, args)?;
        let message = rpc::call(&spec, nodes)?;
        debug!(procedure = self.token, xid = args.xid, "built procedure call");
        Ok(message)
    }

    fn arguments(&self, call: &str, args: &Nfs3Args) -> Result<Vec<Node>> {
        let name = args.name.as_deref().unwrap_or(self.default_name);
        let count = args.count.unwrap_or(self.default_count);
        let u32_field = |field: &str, value: u32| -> Node {
            IntField::u32(format!("{call}_{field}"), value)
                .fuzzable(true)
                .into()
        };
        let u64_field = |field: &str, value: u64| -> Node {
            IntField::u64(format!("{call}_{field}"), value)
                .fuzzable(true)
                .into()
        };

        let nodes = match self.shape {
            ArgShape::Void => Vec::new(),
            ArgShape::Object { field } => {
                vec![nfs3::fhandle3(format!("{call}_{field}"), &args.handle)?]
            }
            ArgShape::Access => vec![
                nfs3::fhandle3(format!("{call}_fhandle"), &args.handle)?,
                u32_field("access", args.access),
            ],
            ArgShape::Range => vec![
                nfs3::fhandle3(format!("{call}_fhandle"), &args.handle)?,
                u64_field("offset", args.offset),
                u32_field("count", count),
            ],
            ArgShape::Write => nfs3::write3_payload(
                call,
                &args.handle,
                args.offset,
                count,
                args.stable,
                &args.data,
            )?,
            ArgShape::DirOp { field } => {
                vec![nfs3::dirop3(&format!("{call}_{field}"), &args.handle, name)?.into()]
            }
            ArgShape::Create => {
                let mut nodes = vec![
                    nfs3::dirop3(&format!("{call}_where"), &args.handle, name)?.into(),
                    u32_field("mode", args.create_mode),
                ];
                nodes.extend(nfs3::sattr3_unset(call));
                nodes
            }
            ArgShape::Mkdir => {
                let mut nodes = vec![nfs3::dirop3(&format!("{call}_where"), &args.handle, name)?.into()];
                nodes.extend(nfs3::sattr3_unset(call));
                nodes
            }
            ArgShape::Rename => {
                let to_name = args.to_name.as_deref().unwrap_or(self.default_to_name);
                vec![
                    nfs3::dirop3(&format!("{call}_from"), &args.handle, name)?.into(),
                    nfs3::dirop3(&format!("{call}_to"), &args.to_handle, to_name)?.into(),
                ]
            }
            ArgShape::Readdir => vec![
                nfs3::fhandle3(format!("{call}_dir"), &args.handle)?,
                u64_field("cookie", args.cookie),
                nfs3::cookieverf3(format!("{call}_cookieverf"), args.cookieverf),
                u32_field("count", count),
            ],
            ArgShape::Readdirplus => vec![
                nfs3::fhandle3(format!("{call}_dir"), &args.handle)?,
                u64_field("cookie", args.cookie),
                nfs3::cookieverf3(format!("{call}_cookieverf"), args.cookieverf),
                u32_field("dircount", args.dircount),
                u32_field("maxcount", args.maxcount),
            ],
        };
        Ok(nodes)
    }
}

/// Token → procedure lookup over an explicit table.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<&'static ProcedureEntry>,
}

impl Catalog {
    /// All 18 NFSv3 procedures.
    pub fn nfs3() -> Self {
        Catalog {
            entries: NFS3_PROCEDURES.iter().collect(),
        }
    }

    /// A catalog restricted to `procedures`, in the given order.
    pub fn only(procedures: &[Procedure]) -> Self {
        Catalog {
            entries: procedures.iter().map(|p| p.entry()).collect(),
        }
    }

    /// The stateless [`DEFAULT_SET`].
    pub fn default_set() -> Self {
        Self::only(&DEFAULT_SET)
    }

    /// Restrict to a comma-separated token list such as `"NULL,GETATTR"`.
    pub fn from_tokens(list: &str) -> Result<Self> {
        let procedures = list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Procedure::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::only(&procedures))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.token)
    }

    pub fn entries(&self) -> &[&'static ProcedureEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row for `token`, rejecting tokens outside this catalog.
    pub fn entry(&self, token: &str) -> Result<&'static ProcedureEntry> {
        self.entries
            .iter()
            .copied()
            .find(|e| e.token.eq_ignore_ascii_case(token))
            .ok_or_else(|| Error::UnknownProcedure(token.to_string()))
    }

    /// Build the call for `token`.
    pub fn build(&self, token: &str, args: &Nfs3Args) -> Result<Message> {
        self.entry(token)?.build(args)
    }

    /// Baseline call for every procedure in the catalog, in table order.
    pub fn build_all(&self, args: &Nfs3Args) -> Result<Vec<Message>> {
        self.entries.iter().map(|e| e.build(args)).collect()
    }
}
