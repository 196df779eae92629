use serde::Deserialize;
use xdr_blocks::de::{from_bytes, from_bytes_partial};
use xdr_blocks::{
    Endian, Error, IntField, Message, Node, OpaqueValue, RawField, Width, xdr_pad_length,
    xdr_padded_bytes,
};

fn render(nodes: Vec<Node>) -> Vec<u8> {
    Message::new("t", nodes).unwrap().render().unwrap()
}

#[test]
fn test_u32_big_endian() {
    let bytes = render(vec![IntField::u32("v", 0xDEADBEEF).into()]);
    assert_eq!(bytes, [0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn test_u64_unsigned_hyper() {
    let bytes = render(vec![IntField::u64("v", 0x0102030405060708).into()]);
    assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_explicit_width_and_byte_order() {
    let bytes = render(vec![
        IntField::new("a", Width::U8, Endian::Big, 0xAB).unwrap().into(),
        IntField::new("b", Width::U16, Endian::Big, 0x1234).unwrap().into(),
        IntField::new("c", Width::U32, Endian::Little, 0x01020304).unwrap().into(),
    ]);
    assert_eq!(bytes, [0xAB, 0x12, 0x34, 4, 3, 2, 1]);
}

#[test]
fn test_value_out_of_range_is_rejected() {
    let err = IntField::new("small", Width::U8, Endian::Big, 256).unwrap_err();
    assert_eq!(
        err,
        Error::ValueOutOfRange {
            field: "small".into(),
            value: 256,
            width: 1
        }
    );
    assert!(IntField::new("max", Width::U16, Endian::Big, 0xFFFF).is_ok());
    assert!(IntField::new("over", Width::U32, Endian::Big, 1 << 32).is_err());
}

#[test]
fn test_set_rejects_instead_of_truncating() {
    let mut f = IntField::u32("x", 5);
    assert!(f.set(u32::MAX as u64 + 1).is_err());
    assert_eq!(f.value(), 5);
    f.set(9).unwrap();
    assert_eq!(f.value(), 9);
    f.reset();
    assert_eq!(f.value(), 5);
}

#[test]
fn test_string_padding() {
    for (s, total) in [("", 4usize), ("A", 8), ("AB", 8), ("ABC", 8), ("ABCD", 8), ("ABCDE", 12)] {
        let bytes = render(vec![OpaqueValue::string("s", s).unwrap().into()]);
        assert_eq!(bytes.len(), total, "string {:?}", s);
        assert_eq!(&bytes[..4], (s.len() as u32).to_be_bytes());
        for &b in &bytes[4 + s.len()..] {
            assert_eq!(b, 0, "non-zero pad for {:?}", s);
        }
    }
}

#[test]
fn test_padding_follows_utf8_bytes_not_chars() {
    // 3 characters, 6 bytes: 2 padding bytes, not 1
    let v = OpaqueValue::string("s", "ééé").unwrap();
    assert_eq!(v.declared_len(), 6);
    assert_eq!(v.pad_len(), 2);
    assert_eq!(v.encoded_len(), 12);
}

#[test]
fn test_invalid_utf8_is_an_encoding_error() {
    let err = OpaqueValue::from_utf8("name", vec![b'a', 0xFF, b'b']).unwrap_err();
    assert!(matches!(err, Error::EncodingError { ref field, .. } if field == "name"));
    assert!(OpaqueValue::from_utf8("name", "ok".as_bytes().to_vec()).is_ok());
}

#[test]
fn test_bounded_opaque() {
    assert!(OpaqueValue::bounded("fh", vec![0u8; 64], 64).is_ok());
    let err = OpaqueValue::bounded("fh", vec![0u8; 65], 64).unwrap_err();
    assert_eq!(
        err,
        Error::LengthOverflow {
            field: "fh".into(),
            max: 64,
            got: 65
        }
    );
}

#[test]
fn test_raw_field_has_no_prefix_or_padding() {
    let bytes = render(vec![RawField::new("r", vec![1, 2, 3]).into()]);
    assert_eq!(bytes, [1, 2, 3]);
}

#[test]
fn test_fuzzable_flag_does_not_change_bytes() {
    let plain = render(vec![OpaqueValue::string("s", "abc").unwrap().into()]);
    let flagged = render(vec![OpaqueValue::string("s", "abc").unwrap().fuzzable(true).into()]);
    assert_eq!(plain, flagged);
}

#[test]
fn test_pad_helpers() {
    assert_eq!(xdr_pad_length(7), 1);
    assert_eq!(xdr_padded_bytes(&[9, 9, 9, 9, 9]), [9, 9, 9, 9, 9, 0, 0, 0]);
    assert_eq!(xdr_padded_bytes(&[]), Vec::<u8>::new());
}

#[test]
fn test_default_bytes() {
    assert_eq!(IntField::u32("x", 3).default_bytes(), [0, 0, 0, 3]);
    assert_eq!(
        OpaqueValue::string("s", "hi").unwrap().default_bytes(),
        [0, 0, 0, 2, b'h', b'i', 0, 0]
    );
}

// ── Decoder ────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Deserialize)]
struct Record {
    id: u32,
    name: String,
    #[serde(with = "serde_bytes")]
    blob: Vec<u8>,
    flag: bool,
    extra: Option<u64>,
    list: Vec<u32>,
}

#[test]
fn test_decode_struct() {
    let bytes = render(vec![
        IntField::u32("id", 7).into(),
        OpaqueValue::string("name", "nfs").unwrap().into(),
        OpaqueValue::new("blob", vec![1, 2, 3, 4, 5]).unwrap().into(),
        IntField::u32("flag", 1).into(),
        IntField::u32("extra_present", 1).into(),
        IntField::u64("extra", 99).into(),
        IntField::u32("list_count", 2).into(),
        IntField::u32("l0", 10).into(),
        IntField::u32("l1", 20).into(),
    ]);
    let decoded: Record = from_bytes(&bytes).unwrap();
    assert_eq!(
        decoded,
        Record {
            id: 7,
            name: "nfs".into(),
            blob: vec![1, 2, 3, 4, 5],
            flag: true,
            extra: Some(99),
            list: vec![10, 20],
        }
    );
}

#[test]
fn test_decode_errors() {
    assert_eq!(from_bytes::<u32>(&[0, 0, 0]).unwrap_err(), Error::UnexpectedEof);
    assert_eq!(from_bytes::<bool>(&[0, 0, 0, 2]).unwrap_err(), Error::InvalidBool(2));
    assert_eq!(
        from_bytes::<Option<u32>>(&[0, 0, 0, 5]).unwrap_err(),
        Error::InvalidOption(5)
    );
    assert_eq!(
        from_bytes::<u32>(&[0, 0, 0, 1, 0xFF]).unwrap_err(),
        Error::TrailingBytes(1)
    );
    assert_eq!(
        from_bytes::<String>(&[0, 0, 0, 1, b'a', 0, 1, 0]).unwrap_err(),
        Error::InvalidPadding
    );
    assert!(matches!(
        from_bytes::<f32>(&[0, 0, 0, 0]).unwrap_err(),
        Error::Unsupported(_)
    ));
}

#[test]
fn test_partial_decode() {
    let buf = [0, 0, 0, 42, 0, 0, 0, 99, 0xFF, 0xFF];
    let (first, rest) = from_bytes_partial::<u32>(&buf).unwrap();
    assert_eq!(first, 42);
    let (second, remaining) = from_bytes_partial::<u32>(rest).unwrap();
    assert_eq!(second, 99);
    assert_eq!(remaining, [0xFF, 0xFF]);
}
