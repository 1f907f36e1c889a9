// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Wire Codec for User Records
//!
//! Converts between wire payloads (bytes plus content-type metadata) and
//! [`User`] records. The wire format is JSON under the
//! `application/json` content type; the codec is symmetric, so whatever it
//! encodes it decodes back to an equal record.

use crate::{domain::User, errors::CodecError};

/// Content type stamped on every encoded record
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encodes a record into its wire form.
///
/// # Returns
/// The payload bytes together with the content type to stamp on the
/// message properties.
pub fn encode(user: &User) -> Result<(Vec<u8>, &'static str), CodecError> {
    let data =
        serde_json::to_vec(user).map_err(|err| CodecError::MalformedPayload(err.to_string()))?;

    Ok((data, JSON_CONTENT_TYPE))
}

/// Decodes wire bytes back into a record.
///
/// A delivery without a content type is assumed to carry JSON; one with an
/// explicit non-JSON content type is refused outright. Payloads that parse
/// but carry an empty identity field are refused as well, since the store
/// cannot upsert without one.
///
/// # Parameters
/// * `data` - The payload bytes from the delivery
/// * `content_type` - The content type from the message properties, if any
pub fn decode(data: &[u8], content_type: Option<&str>) -> Result<User, CodecError> {
    match content_type {
        None => {}
        Some(JSON_CONTENT_TYPE) => {}
        Some(other) => return Err(CodecError::UnsupportedContentType(other.to_owned())),
    }

    let user: User =
        serde_json::from_slice(data).map_err(|err| CodecError::MalformedPayload(err.to_string()))?;

    if user.id.is_empty() {
        return Err(CodecError::MissingIdentity);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_records_round_trip_to_an_equal_value() {
        let user = User::new("u1", "Alice");

        let (data, content_type) = encode(&user).unwrap();
        let decoded = decode(&data, Some(content_type)).unwrap();

        assert_eq!(decoded, user);
    }

    #[test]
    fn round_trip_preserves_non_ascii_fields() {
        let user = User::new("u2", "Зоя 名前");

        let (data, content_type) = encode(&user).unwrap();

        assert_eq!(content_type, JSON_CONTENT_TYPE);
        assert_eq!(decode(&data, Some(content_type)).unwrap(), user);
    }

    #[test]
    fn missing_content_type_is_treated_as_json() {
        let (data, _) = encode(&User::new("u3", "Bob")).unwrap();

        assert_eq!(decode(&data, None).unwrap(), User::new("u3", "Bob"));
    }

    #[test]
    fn foreign_content_type_is_refused() {
        let err = decode(b"id,name\nu1,Alice", Some("text/csv")).unwrap_err();

        assert_eq!(err, CodecError::UnsupportedContentType("text/csv".to_owned()));
    }

    #[test]
    fn unparseable_bytes_are_a_malformed_payload() {
        let err = decode(b"not json at all", Some(JSON_CONTENT_TYPE)).unwrap_err();

        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn absent_identity_field_is_a_malformed_payload() {
        let err = decode(br#"{"name":"Alice"}"#, Some(JSON_CONTENT_TYPE)).unwrap_err();

        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn empty_identity_field_is_refused() {
        let err = decode(br#"{"id":"","name":"Alice"}"#, Some(JSON_CONTENT_TYPE)).unwrap_err();

        assert_eq!(err, CodecError::MissingIdentity);
    }

    #[test]
    fn unknown_fields_are_ignored_for_forward_compatibility() {
        let data = br#"{"id":"u1","name":"Alice","team":"growth"}"#;

        assert_eq!(
            decode(data, Some(JSON_CONTENT_TYPE)).unwrap(),
            User::new("u1", "Alice"),
        );
    }
}
