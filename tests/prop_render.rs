use proptest::prelude::*;
use xdr_blocks::inspect::{decode_call, decode_opaque};
use xdr_blocks::{
    Block, LAST_FRAGMENT, Message, OpaqueValue, RawField, SizeReference, Transform, nfs3,
    xdr_pad_length,
};

fn marked(payload: Vec<u8>) -> Message {
    Message::new(
        "m",
        vec![
            SizeReference::new("mark", "body")
                .transform(Transform::Or(LAST_FRAGMENT))
                .into(),
            Block::new("body").push(RawField::new("raw", payload)).into(),
        ],
    )
    .unwrap()
}

proptest! {
    #[test]
    fn opaque_encoding_is_word_aligned(data in proptest::collection::vec(any::<u8>(), 0..300)) {
        let v = OpaqueValue::new("o", data.clone()).unwrap();
        let pad = xdr_pad_length(data.len());
        prop_assert!(pad < 4);
        prop_assert_eq!((data.len() + pad) % 4, 0);
        prop_assert_eq!(v.encoded_len(), 4 + data.len() + pad);

        let bytes = v.default_bytes();
        prop_assert_eq!(&bytes[..4], &(data.len() as u32).to_be_bytes()[..]);
        prop_assert_eq!(&bytes[4..4 + data.len()], &data[..]);
        prop_assert!(bytes[4 + data.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn record_mark_carries_body_length(len in 0usize..4096) {
        let bytes = marked(vec![0xA5; len]).render().unwrap();
        prop_assert_eq!(bytes.len(), 4 + len);
        let mark = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        prop_assert_eq!(mark, 0x8000_0000 | len as u32);
    }

    #[test]
    fn last_fragment_transform(len in 0u64..(1 << 31)) {
        prop_assert_eq!(Transform::Or(LAST_FRAGMENT).apply(len), 0x8000_0000 | len);
        prop_assert_eq!(Transform::Identity.apply(len), len);
    }

    #[test]
    fn file_handle_survives_encoding(handle in proptest::collection::vec(any::<u8>(), 0..=64)) {
        let m = nfs3::getattr(&handle).unwrap();
        let r = m.render_with_layout().unwrap();
        let (data, rest) = decode_opaque(r.slice("NFS3-GETATTR_fhandle").unwrap()).unwrap();
        prop_assert_eq!(&data, &handle);
        prop_assert!(rest.is_empty());

        let call = decode_call(&r.bytes).unwrap();
        let (data, rest) = decode_opaque(call.args).unwrap();
        prop_assert_eq!(data, handle);
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn rendering_is_a_pure_function(name in "[a-zA-Z0-9._-]{0,40}") {
        let m = nfs3::lookup(&nfs3::DEFAULT_HANDLE, &name).unwrap();
        prop_assert_eq!(m.render().unwrap(), m.render().unwrap());
    }

    #[test]
    fn same_length_mutation_keeps_sizes(
        original in "[a-z]{1,32}",
        seed in any::<u8>(),
        xid in any::<u32>(),
    ) {
        let mut m = nfs3::lookup(&nfs3::DEFAULT_HANDLE, &original).unwrap();
        let before = m.render_with_layout().unwrap();

        let replacement = vec![seed; original.len()];
        m.set_bytes("NFS3-LOOKUP_what_name", replacement).unwrap();
        m.set_int("NFS3-LOOKUP_xid", xid as u64).unwrap();
        let after = m.render_with_layout().unwrap();

        prop_assert_eq!(before.bytes.len(), after.bytes.len());
        prop_assert_eq!(&before.bytes[..4], &after.bytes[..4]);
        prop_assert_eq!(after.span("NFS3-LOOKUP_auth").map(|r| r.len()), Some(16));
    }
}
