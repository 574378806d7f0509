use super::*;

fn hex_cbor(data: &PlutusData) -> String {
    hex::encode(data.to_cbor().unwrap())
}

#[test]
fn empty_constructor_encodes_to_tag_121_and_empty_list() {
    let data = PlutusData::empty_constr(0);

    assert_eq!(hex_cbor(&data), "d87980");
}

#[test]
fn constructor_fields_use_indefinite_list() {
    let data = PlutusData::Constr(Constr {
        constr: 1,
        fields: vec![PlutusData::from(5_u64)],
    });

    assert_eq!(hex_cbor(&data), "d87a9f05ff");
}

#[test]
fn high_constructor_indices_use_extended_tags() {
    let seven = PlutusData::empty_constr(7);
    let huge = PlutusData::empty_constr(200);

    assert_eq!(hex_cbor(&seven), "d9050080");
    assert_eq!(hex_cbor(&huge), "d8668218c880");
    assert_eq!(PlutusData::from_cbor(&seven.to_cbor().unwrap()).unwrap(), seven);
    assert_eq!(PlutusData::from_cbor(&huge.to_cbor().unwrap()).unwrap(), huge);
}

#[test]
fn negative_integers_are_native_cbor() {
    let data = PlutusData::from(-3_i64);

    assert_eq!(hex_cbor(&data), "22");
    let decoded = PlutusData::from_cbor(&[0x22]).unwrap();
    assert_eq!(i64::try_from(decoded.as_big_int().unwrap()).unwrap(), -3);
}

#[test]
fn full_range_negative_integer_survives() {
    let data = PlutusData::BigInt(BigInt::Int {
        neg: true,
        val: u64::MAX,
    });

    let bytes = data.to_cbor().unwrap();

    assert_eq!(hex::encode(&bytes), "3bfffffffffffffffe");
    assert_eq!(PlutusData::from_cbor(&bytes).unwrap(), data);
}

#[test]
fn long_bytes_are_chunked() {
    let bytes: Vec<u8> = (0..100).collect();
    let data = PlutusData::BoundedBytes(bytes.clone());

    let encoded = data.to_cbor().unwrap();

    assert_eq!(encoded[0], 0x5f);
    assert_eq!(encoded[1], 0x58);
    assert_eq!(encoded[2], 64);
    assert_eq!(*encoded.last().unwrap(), 0xff);
    assert_eq!(PlutusData::from_cbor(&encoded).unwrap(), data);
}

#[test]
fn bignums_keep_their_bytes() {
    let encoded = hex::decode("c249010000000000000000").unwrap();

    let decoded = PlutusData::from_cbor(&encoded).unwrap();

    let expected = PlutusData::BigInt(BigInt::BigUInt(vec![1, 0, 0, 0, 0, 0, 0, 0, 0]));
    assert_eq!(decoded, expected);
    assert_eq!(decoded.to_cbor().unwrap(), encoded);
    assert_eq!(
        i128::try_from(decoded.as_big_int().unwrap()).unwrap(),
        1_i128 << 64
    );
}

#[test]
fn maps_and_arrays_decode() {
    let mut map = BTreeMap::new();
    map.insert(PlutusData::from(1_u64), PlutusData::BoundedBytes(vec![0xab]));
    let data = PlutusData::Array(vec![PlutusData::Map(map), PlutusData::Array(vec![])]);

    let encoded = data.to_cbor().unwrap();

    assert_eq!(hex::encode(&encoded), "9fa10141ab80ff");
    assert_eq!(PlutusData::from_cbor(&encoded).unwrap(), data);
}

#[test]
fn unknown_tags_are_rejected() {
    // tag 24 wrapping an int
    let err = PlutusData::from_cbor(&[0xd8, 0x18, 0x01]).unwrap_err();

    assert!(matches!(err, PlutusDataError::Decode(_)));
}

#[test]
fn out_of_range_conversion_fails() {
    let data = PlutusData::from(-1_i64);

    let err = u64::try_from(data.as_big_int().unwrap()).unwrap_err();

    assert_eq!(err, PlutusDataError::IntOutOfRange);
}
