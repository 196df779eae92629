use xdr_blocks::catalog::{ArgShape, DEFAULT_SET};
use xdr_blocks::inspect::{decode_call, decode_opaque};
use xdr_blocks::nfs3::{self, DEFAULT_HANDLE, NFS_V3, proc3, stable_how};
use xdr_blocks::rpc::{self, Auth, AuthSys, CallSpec, auth_flavor, program};
use xdr_blocks::{Catalog, Error, IntField, Message, Nfs3Args, Procedure};

fn handle() -> Vec<u8> {
    [0xDE, 0xAD, 0xBE, 0xEF].repeat(8)
}

#[test]
fn test_nfs3_null_scenario() {
    let bytes = nfs3::null().unwrap().render().unwrap();
    // 4 (record mark) + 24 (header) + 8 (cred) + 8 (verf) = 44 bytes
    assert_eq!(bytes.len(), 44);
    assert_eq!(&bytes[0..4], [0x80, 0x00, 0x00, 0x28]);
    assert_eq!(&bytes[4..8], [0, 0, 0, 1]); // xid
    assert_eq!(&bytes[8..12], [0, 0, 0, 0]); // CALL
    assert_eq!(&bytes[12..16], [0, 0, 0, 2]); // RPC version
    assert_eq!(&bytes[16..20], [0x00, 0x01, 0x86, 0xA3]); // 100003
    assert_eq!(&bytes[20..24], [0, 0, 0, 3]);
    assert_eq!(&bytes[24..28], [0, 0, 0, 0]);
    assert_eq!(&bytes[28..], [0u8; 16]);
}

#[test]
fn test_auth_none_is_sixteen_bytes() {
    let r = nfs3::null().unwrap().render_with_layout().unwrap();
    assert_eq!(r.span("NFS3-NULL_auth").unwrap().len(), 16);
    assert_eq!(r.span("NFS3-NULL_rpc_message").unwrap().len(), 40);
    assert_eq!(r.span("NFS3-NULL_args").unwrap().len(), 0);
}

#[test]
fn test_lookup_dirop_scenario() {
    let m = nfs3::lookup(&handle(), "testfile").unwrap();
    assert_eq!(m.block_len("NFS3-LOOKUP_what"), Some(4 + 32 + 4 + 8));

    let r = m.render_with_layout().unwrap();
    let dirop = r.slice("NFS3-LOOKUP_what").unwrap();
    assert_eq!(&dirop[..4], [0, 0, 0, 32]);
    assert_eq!(&dirop[4..36], &handle()[..]);
    assert_eq!(&dirop[36..40], [0, 0, 0, 8]);
    assert_eq!(&dirop[40..], b"testfile");
    // body = 40 + 48
    assert_eq!(&r.bytes[..4], [0x80, 0, 0, 88]);
}

#[test]
fn test_lookup_multibyte_filename_padding() {
    let m = nfs3::lookup(&handle(), "ééé").unwrap();
    // 6 encoded bytes need 2 bytes of padding
    assert_eq!(m.block_len("NFS3-LOOKUP_what"), Some(36 + 4 + 6 + 2));
}

#[test]
fn test_write_count_mismatch_is_not_rejected() {
    let data = b"1234567";
    let m = nfs3::write(&handle(), 0, 10, stable_how::FILE_SYNC, data).unwrap();
    let r = m.render_with_layout().unwrap();
    assert_eq!(r.slice("NFS3-WRITE_count").unwrap(), [0, 0, 0, 10]);
    assert_eq!(
        r.slice("NFS3-WRITE_data").unwrap(),
        [0, 0, 0, 7, b'1', b'2', b'3', b'4', b'5', b'6', b'7', 0]
    );
    assert_eq!(r.slice("NFS3-WRITE_stable").unwrap(), [0, 0, 0, 2]);
    // fh 36 + offset 8 + count 4 + stable 4 + data 12
    assert_eq!(r.span("NFS3-WRITE_args").unwrap().len(), 64);
}

#[test]
fn test_oversize_file_handle_rejected() {
    let err = nfs3::getattr(&[0u8; 65]).unwrap_err();
    assert_eq!(
        err,
        Error::LengthOverflow {
            field: "NFS3-GETATTR_fhandle".into(),
            max: 64,
            got: 65
        }
    );
    assert!(nfs3::getattr(&[0u8; 64]).is_ok());
    assert!(nfs3::getattr(&[]).is_ok());
}

#[test]
fn test_rename_has_two_dirops() {
    let other = vec![0x11; 8];
    let m = nfs3::rename(&handle(), "oldname", &other, "newname").unwrap();
    assert_eq!(m.block_len("NFS3-RENAME_from"), Some(36 + 4 + 7 + 1));
    assert_eq!(m.block_len("NFS3-RENAME_to"), Some(12 + 4 + 7 + 1));
    let r = m.render_with_layout().unwrap();
    assert_eq!(&r.slice("NFS3-RENAME_to_dir_handle").unwrap()[4..], &other[..]);
}

#[test]
fn test_argument_sizes_per_procedure() {
    let cases = [
        (Procedure::Getattr, 36),
        (Procedure::Access, 40),
        (Procedure::Readlink, 36),
        (Procedure::Read, 48),
        (Procedure::Create, 48 + 4 + 24),
        (Procedure::Mkdir, 48 + 24),
        (Procedure::Remove, 48),
        (Procedure::Rmdir, 36 + 4 + 7 + 1),
        (Procedure::Readdir, 56),
        (Procedure::Readdirplus, 60),
        (Procedure::Fsstat, 36),
        (Procedure::Fsinfo, 36),
        (Procedure::Pathconf, 36),
        (Procedure::Commit, 48),
    ];
    for (procedure, args_len) in cases {
        let m = procedure.entry().build(&Nfs3Args::default()).unwrap();
        let name = format!("NFS3-{}_args", procedure.token());
        assert_eq!(m.block_len(&name), Some(args_len), "{procedure}");
    }
}

#[test]
fn test_procedure_defaults_follow_baseline() {
    let r = nfs3::read(&handle(), 0, 4096).unwrap();
    let via_table = Procedure::Read.entry().build(&Nfs3Args::default()).unwrap();
    assert_eq!(r.render().unwrap(), via_table.render().unwrap());

    let access = Procedure::Access.entry().build(&Nfs3Args::default()).unwrap();
    let r = access.render_with_layout().unwrap();
    assert_eq!(r.slice("NFS3-ACCESS_access").unwrap(), [0, 0, 0, 0x3F]);

    let create = Procedure::Create.entry().build(&Nfs3Args::default()).unwrap();
    let r = create.render_with_layout().unwrap();
    assert_eq!(&r.slice("NFS3-CREATE_where_name").unwrap()[4..11], b"newfile");
}

#[test]
fn test_auth_sys_call() {
    let args = Nfs3Args {
        auth: Auth::Sys(AuthSys {
            uid: 1000,
            gid: 100,
            ..AuthSys::default()
        }),
        ..Nfs3Args::default()
    };
    let m = Procedure::Null.entry().build(&args).unwrap();
    let r = m.render_with_layout().unwrap();
    // flavor 4 + length 4 + body 28 + verifier 8
    assert_eq!(r.span("NFS3-NULL_auth").unwrap().len(), 44);
    assert_eq!(r.slice("NFS3-NULL_auth_cred_length").unwrap(), [0, 0, 0, 28]);

    let call = decode_call(&r.bytes).unwrap();
    assert_eq!(call.credential.flavor, auth_flavor::AUTH_SYS);
    let parms = call.credential.sys_parms().unwrap();
    assert_eq!(parms.machine_name, "fuzzer");
    assert_eq!((parms.uid, parms.gid), (1000, 100));
    assert!(parms.gids.is_empty());
    assert_eq!(call.verifier.flavor, auth_flavor::AUTH_NONE);
    assert!(call.verifier.body.is_empty());
    assert!(call.args.is_empty());
}

#[test]
fn test_auth_sys_length_tracks_machine_name() {
    let args = Nfs3Args {
        auth: Auth::Sys(AuthSys::default()),
        ..Nfs3Args::default()
    };
    let mut m = Procedure::Null.entry().build(&args).unwrap();
    m.set_bytes("NFS3-NULL_auth_machine", b"a-much-longer-host".to_vec())
        .unwrap();
    let call_bytes = m.render().unwrap();
    let call = decode_call(&call_bytes).unwrap();
    assert_eq!(call.credential.body.len(), 4 + (4 + 18 + 2) + 12);
    assert_eq!(call.credential.sys_parms().unwrap().machine_name, "a-much-longer-host");
}

#[test]
fn test_machine_name_limit() {
    let parms = AuthSys {
        machine_name: "x".repeat(256),
        ..AuthSys::default()
    };
    let err = rpc::auth_sys("a", &parms).unwrap_err();
    assert!(matches!(err, Error::LengthOverflow { max: 255, got: 256, .. }));
}

#[test]
fn test_generic_call_wrapper() {
    let spec = CallSpec::new("MOUNT-NULL", program::MOUNT, 3, 0).xid(0x1234);
    let bytes = rpc::call(&spec, Vec::new()).unwrap().render().unwrap();
    let call = decode_call(&bytes).unwrap();
    assert_eq!(call.header.xid, 0x1234);
    assert_eq!(call.header.program, 100005);
    assert_eq!(call.header.rpc_version, rpc::RPC_VERSION);
    assert_eq!(call.header.msg_type, rpc::msg_type::CALL);
    assert!(call.last_fragment());
    assert_eq!(call.fragment_len(), 40);
}

#[test]
fn test_every_procedure_renders_and_decodes() {
    let catalog = Catalog::nfs3();
    assert_eq!(catalog.len(), 18);
    for (entry, message) in catalog
        .entries()
        .iter()
        .zip(catalog.build_all(&Nfs3Args::default()).unwrap())
    {
        let bytes = message.render().unwrap();
        assert_eq!(bytes.len() % 4, 0, "{}", entry.token);
        let call = decode_call(&bytes).unwrap();
        assert_eq!(call.header.program, program::NFS);
        assert_eq!(call.header.version, NFS_V3);
        assert_eq!(call.header.procedure, entry.number);
        assert_eq!(call.fragment_len() as usize, bytes.len() - 4);
        if let ArgShape::Object { .. } = entry.shape {
            let (fh, rest) = decode_opaque(call.args).unwrap();
            assert_eq!(fh, DEFAULT_HANDLE);
            assert!(rest.is_empty());
        }
    }
}

#[test]
fn test_procedure_numbers() {
    assert_eq!(Procedure::Null.entry().number, proc3::NULL);
    assert_eq!(Procedure::Lookup.entry().number, 3);
    assert_eq!(Procedure::Write.entry().number, 7);
    assert_eq!(Procedure::Rename.entry().number, 14);
    assert_eq!(Procedure::Commit.entry().number, 21);
    for p in Procedure::ALL {
        assert_eq!(p.entry().procedure, p);
    }
}

#[test]
fn test_catalog_lookup() {
    let catalog = Catalog::nfs3();
    assert!(catalog.build("LOOKUP", &Nfs3Args::default()).is_ok());
    assert!(catalog.build("lookup", &Nfs3Args::default()).is_ok());
    assert_eq!(
        catalog.build("FROBNICATE", &Nfs3Args::default()).unwrap_err(),
        Error::UnknownProcedure("FROBNICATE".into())
    );
    assert_eq!("readdirplus".parse::<Procedure>().unwrap(), Procedure::Readdirplus);
    assert!("SETATTR".parse::<Procedure>().is_err());
}

#[test]
fn test_catalog_subsets() {
    let defaults = Catalog::default_set();
    assert_eq!(
        defaults.tokens().collect::<Vec<_>>(),
        ["NULL", "GETATTR", "LOOKUP", "ACCESS", "FSSTAT", "FSINFO", "PATHCONF"]
    );
    assert_eq!(defaults.len(), DEFAULT_SET.len());
    assert!(defaults.entry("WRITE").is_err());

    let picked = Catalog::from_tokens("NULL, getattr ,LOOKUP,").unwrap();
    assert_eq!(picked.tokens().collect::<Vec<_>>(), ["NULL", "GETATTR", "LOOKUP"]);
    assert_eq!(
        Catalog::from_tokens("NULL,BOGUS").unwrap_err(),
        Error::UnknownProcedure("BOGUS".into())
    );
}

#[test]
fn test_parameter_overrides_from_json() {
    let args = Nfs3Args::from_json(
        r#"{"xid": 42, "name": "etc", "handle": [1, 2, 3], "auth": {"flavor": "sys", "uid": 7}}"#,
    )
    .unwrap();
    assert_eq!(args.xid, 42);
    assert_eq!(args.handle, [1, 2, 3]);
    assert_eq!(args.maxcount, 8192);
    match &args.auth {
        Auth::Sys(sys) => {
            assert_eq!(sys.uid, 7);
            assert_eq!(sys.machine_name, "fuzzer");
        }
        other => panic!("unexpected auth {other:?}"),
    }

    let m = Catalog::nfs3().build("LOOKUP", &args).unwrap();
    let bytes = m.render().unwrap();
    assert_eq!(decode_call(&bytes).unwrap().header.xid, 42);
    assert_eq!(m.block_len("NFS3-LOOKUP_what"), Some(4 + 3 + 1 + 4 + 3 + 1));
}

#[test]
fn test_malformed_overrides_rejected() {
    for doc in [
        r#"{"count": -1}"#,
        r#"{"xid": 4294967296}"#,
        r#"{"colour": "blue"}"#,
        r#"{"cookieverf": [1, 2]}"#,
        "not json",
    ] {
        assert!(
            matches!(Nfs3Args::from_json(doc), Err(Error::InvalidParameters(_))),
            "{doc}"
        );
    }
}

#[test]
fn test_header_fields_are_fuzzable_auth_none_is_not() {
    let m = nfs3::null().unwrap();
    let fuzzable = m.fuzzable_fields();
    for field in [
        "NFS3-NULL_record_mark",
        "NFS3-NULL_xid",
        "NFS3-NULL_msg_type",
        "NFS3-NULL_procedure",
    ] {
        assert!(fuzzable.contains(&field), "{field}");
    }
    assert!(!fuzzable.contains(&"NFS3-NULL_auth_cred_flavor"));
}

#[test]
fn test_mutated_xid_keeps_record_mark() {
    let mut m = nfs3::getattr(&handle()).unwrap();
    let before = m.render().unwrap();
    m.set_int("NFS3-GETATTR_xid", 0xCAFEBABE).unwrap();
    let after = m.render().unwrap();
    assert_eq!(before[..4], after[..4]);
    assert_eq!(&after[4..8], [0xCA, 0xFE, 0xBA, 0xBE]);
}

#[test]
fn test_two_framed_calls_share_one_tree() {
    let first = CallSpec::new("CALL-A", program::NFS, NFS_V3, proc3::NULL).xid(1);
    let second = CallSpec::new("CALL-B", program::NFS, NFS_V3, proc3::GETATTR).xid(2);

    let mut nodes = rpc::call_nodes(&first, Vec::new()).unwrap();
    nodes.extend(rpc::call_nodes(&second, vec![IntField::u32("CALL-B_word", 7).into()]).unwrap());
    let m = Message::new("compound", nodes).unwrap();
    let bytes = m.render().unwrap();
    assert_eq!(bytes.len(), 44 + 48);

    assert_eq!(&bytes[..4], [0x80, 0, 0, 40]);
    assert_eq!(&bytes[44..48], [0x80, 0, 0, 44]);

    let a = decode_call(&bytes[..44]).unwrap();
    let b = decode_call(&bytes[44..]).unwrap();
    assert_eq!((a.header.xid, a.header.procedure), (1, proc3::NULL));
    assert_eq!((b.header.xid, b.header.procedure), (2, proc3::GETATTR));
    assert_eq!(b.args, [0, 0, 0, 7]);
}

#[test]
fn test_call_nodes_with_clashing_names_rejected() {
    let spec = CallSpec::new("CALL", program::NFS, NFS_V3, proc3::NULL);
    let mut nodes = rpc::call_nodes(&spec, Vec::new()).unwrap();
    nodes.extend(rpc::call_nodes(&spec, Vec::new()).unwrap());
    assert!(matches!(
        Message::new("compound", nodes).unwrap_err(),
        Error::DuplicateName { .. }
    ));
}

#[test]
fn test_nfstime3_layout() {
    let m = Message::new("t", vec![nfs3::nfstime3("mtime", 0x01020304, 999_999_999).into()])
        .unwrap();
    let bytes = m.render().unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[..4], [1, 2, 3, 4]);
    assert_eq!(&bytes[4..], 999_999_999u32.to_be_bytes());
    assert_eq!(m.fuzzable_fields(), ["mtime_seconds", "mtime_nseconds"]);
}
