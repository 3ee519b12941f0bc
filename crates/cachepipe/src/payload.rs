// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The envelope wrapped around every payload stored by an item.
//!
//! A stored payload is one tag byte followed by a body: `0x01` and the codec's
//! bytes for a value, or a lone `0x00` for a key the backing store reported
//! absent. Anything else is a [`DecodeError`] and is read as a miss.

use bytes::{BufMut, Bytes, BytesMut};
use cachepipe_tier::{Codec, DecodeError, Error};

const ABSENT_TAG: u8 = 0x00;
const VALUE_TAG: u8 = 0x01;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Payload<V> {
    Value(V),
    Absent,
}

/// Encodes `value` the way an item stores it.
///
/// Use this to pre-populate a cache tier with entries an item will read as hits.
///
/// # Errors
///
/// Returns an error if the codec cannot encode the value.
///
/// # Examples
///
/// ```
/// use cachepipe::{PostcardCodec, encode_value};
///
/// let bytes = encode_value(&PostcardCodec::<u32>::new(), &7).unwrap();
/// assert_eq!(bytes[0], 0x01);
/// ```
pub fn encode_value<V, C>(codec: &C, value: &V) -> Result<Bytes, Error>
where
    C: Codec<V> + ?Sized,
{
    let body = codec.encode(value)?;
    let mut buf = BytesMut::with_capacity(body.len() + 1);
    buf.put_u8(VALUE_TAG);
    buf.extend_from_slice(&body);
    Ok(buf.freeze())
}

pub(crate) fn absent_marker() -> Bytes {
    Bytes::from_static(&[ABSENT_TAG])
}

pub(crate) fn decode<V, C>(codec: &C, bytes: &[u8]) -> Result<Payload<V>, DecodeError>
where
    C: Codec<V> + ?Sized,
{
    match bytes.split_first() {
        Some((&VALUE_TAG, body)) => codec.decode(body).map(Payload::Value),
        Some((&ABSENT_TAG, [])) => Ok(Payload::Absent),
        Some((&ABSENT_TAG, _)) => Err(DecodeError::new("absent marker carries a body")),
        Some((tag, _)) => Err(DecodeError::new(format!("unknown payload tag {tag:#04x}"))),
        None => Err(DecodeError::new("empty payload")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Utf8;

    impl Codec<String> for Utf8 {
        fn encode(&self, value: &String) -> Result<Bytes, Error> {
            Ok(Bytes::copy_from_slice(value.as_bytes()))
        }

        fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
            String::from_utf8(bytes.to_vec()).map_err(DecodeError::new)
        }
    }

    #[test]
    fn value_payload_is_tagged() {
        let bytes = encode_value(&Utf8, &"hi".to_string()).expect("encoding should succeed");
        assert_eq!(&bytes[..], b"\x01hi");
        assert_eq!(decode(&Utf8, &bytes).expect("decoding should succeed"), Payload::Value("hi".to_string()));
    }

    #[test]
    fn absent_marker_decodes_as_absent() {
        assert_eq!(decode(&Utf8, &absent_marker()).expect("decoding should succeed"), Payload::Absent);
    }

    #[test]
    fn malformed_payloads_are_decode_errors() {
        assert!(decode(&Utf8, b"").is_err());
        assert!(decode(&Utf8, b"\x00junk").is_err());
        assert!(decode(&Utf8, b"\x7fhi").is_err());
        assert!(decode(&Utf8, b"\x01\xff\xfe").is_err());
    }
}
