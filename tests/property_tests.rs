//! Property-based tests using proptest
//!
//! These tests validate codec invariants across randomly generated messages:
//! round-trip, truncation rejection and fingerprint determinism.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use xclog_message::core::codec::{encoded_len, MIN_ENCODED_LEN};
use xclog_message::{fingerprint, CodecError, Message};

fn any_bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max)
}

fn any_message() -> impl Strategy<Value = Message> {
    (
        (any_bytes(16), any_bytes(16), any_bytes(32), any_bytes(16)),
        (any::<usize>(), any::<usize>(), any::<usize>()),
        (any::<i32>(), any::<i32>()),
        prop::collection::vec(any_bytes(24), 0..12),
    )
        .prop_map(
            |((role, label, file, function), (time, process_id, thread_id), (line, level), messages)| {
                Message {
                    role,
                    label,
                    file,
                    function,
                    time,
                    process_id,
                    thread_id,
                    line,
                    level,
                    messages,
                }
            },
        )
}

// Property: Any message decodes back to itself
proptest! {
    #[test]
    fn prop_message_roundtrip(msg in any_message()) {
        let bytes = msg.encode();
        let decoded = Message::decode(&bytes).expect("Decoding should not fail");
        prop_assert_eq!(decoded, msg);
    }
}

// Property: Encoded size is exactly predicted
proptest! {
    #[test]
    fn prop_encoded_len_accurate(msg in any_message()) {
        let bytes = msg.encode();
        prop_assert_eq!(bytes.len(), encoded_len(&msg));
        prop_assert!(bytes.len() >= MIN_ENCODED_LEN);
    }
}

// Property: Encoding is deterministic
proptest! {
    #[test]
    fn prop_encoding_deterministic(msg in any_message()) {
        prop_assert_eq!(msg.encode(), msg.clone().encode());
    }
}

// Property: Dropping the last byte never decodes to a wrong value
proptest! {
    #[test]
    fn prop_truncation_rejected(msg in any_message()) {
        let bytes = msg.encode();
        let result = Message::decode(&bytes[..bytes.len() - 1]);
        prop_assert!(
            matches!(
                result,
                Err(CodecError::BufferTooShort { .. }) | Err(CodecError::TruncatedMessage { .. })
            ),
            "unexpected result: {:?}",
            result
        );
    }
}

// Property: Any cut inside the fixed header is a short-buffer error
proptest! {
    #[test]
    fn prop_header_cut_is_buffer_too_short(msg in any_message(), frac in 0.0f64..1.0) {
        let mut header_only = msg.clone();
        header_only.messages.clear();
        let header_len = encoded_len(&header_only);

        let cut = ((header_len as f64) * frac) as usize;
        let bytes = msg.encode();
        let is_short = matches!(
            Message::decode(&bytes[..cut]),
            Err(CodecError::BufferTooShort { .. })
        );
        prop_assert!(is_short);
    }
}

// Property: Decoding arbitrary bytes never panics
proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = Message::decode(&data);
    }
}

// Property: Fingerprint is stable for identical bytes
proptest! {
    #[test]
    fn prop_fingerprint_deterministic(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(fingerprint(&data), fingerprint(&data.clone()));
    }
}

// Property: Messages that differ in their fragments fingerprint differently
proptest! {
    #[test]
    fn prop_fingerprint_distinguishes_fragments(msg in any_message(), extra in prop::collection::vec(any::<u8>(), 0..16)) {
        let longer = msg.clone().push(extra);
        prop_assert_ne!(msg.fingerprint(), longer.fingerprint());
    }
}
