//! Integration tests for the message codec
//!
//! Concrete scenarios: the reference record, empty payloads, large fragment
//! lists, and the error kinds reported for short or truncated input.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use xclog_message::core::codec::{INT_WIDTH, USIZE_WIDTH};
use xclog_message::{decode, encode, encoded_len, CodecError, Message};

fn reference() -> Message {
    Message {
        role: b"info".to_vec(),
        label: b"test".to_vec(),
        file: b"a.cc".to_vec(),
        function: b"f".to_vec(),
        time: 1000,
        process_id: 1,
        thread_id: 2,
        line: 10,
        level: 0,
        messages: vec![b"hello".to_vec(), b"world".to_vec()],
    }
}

#[test]
fn test_reference_record_roundtrip() {
    let msg = reference();
    let decoded = decode(&encode(&msg)).expect("Failed to decode");

    assert_eq!(decoded.role, b"info");
    assert_eq!(decoded.label, b"test");
    assert_eq!(decoded.file, b"a.cc");
    assert_eq!(decoded.function, b"f");
    assert_eq!(decoded.time, 1000);
    assert_eq!(decoded.process_id, 1);
    assert_eq!(decoded.thread_id, 2);
    assert_eq!(decoded.line, 10);
    assert_eq!(decoded.level, 0);
    assert_eq!(decoded.messages, vec![b"hello".to_vec(), b"world".to_vec()]);
    assert_eq!(decoded, msg);
}

#[test]
fn test_reference_record_size() {
    let bytes = encode(&reference());
    let expected = 4 * USIZE_WIDTH
        + "infotesta.ccf".len()
        + 3 * USIZE_WIDTH
        + 2 * INT_WIDTH
        + 2 * USIZE_WIDTH
        + "helloworld".len();
    assert_eq!(bytes.len(), expected);
}

#[test]
fn test_empty_payload_truncated_header_fails() {
    let mut msg = reference();
    msg.messages.clear();
    let bytes = encode(&msg);

    match decode(&bytes[..bytes.len() - 1]) {
        Err(CodecError::BufferTooShort { field, .. }) => assert_eq!(field, "level"),
        other => panic!("Expected short buffer error, got {other:?}"),
    }
}

#[test]
fn test_empty_payload_roundtrips_to_empty_list() {
    let mut msg = reference();
    msg.messages.clear();

    let decoded = decode(&encode(&msg)).expect("Failed to decode");
    assert!(decoded.messages.is_empty());
    assert_eq!(decoded, msg);
}

#[test]
fn test_empty_strings_roundtrip() {
    let msg = Message::default().push("").push("").push("x");
    let decoded = decode(&encode(&msg)).expect("Failed to decode");
    assert_eq!(decoded.messages, vec![Vec::new(), Vec::new(), b"x".to_vec()]);
    assert!(decoded.role.is_empty());
}

#[test]
fn test_large_fragment_list() {
    let mut msg = reference();
    msg.messages = (0..10_000).map(|i| format!("fragment-{i}").into_bytes()).collect();

    let decoded = decode(&encode(&msg)).expect("Failed to decode");
    assert_eq!(decoded.messages.len(), 10_000);
    assert_eq!(decoded.messages[9_999], b"fragment-9999");
    assert_eq!(decoded, msg);
}

#[test]
fn test_extreme_integer_values() {
    let msg = Message {
        time: usize::MAX,
        process_id: usize::MAX - 1,
        thread_id: 0,
        line: i32::MIN,
        level: i32::MAX,
        ..reference()
    };
    assert_eq!(decode(&encode(&msg)).expect("Failed to decode"), msg);
}

#[test]
fn test_multibyte_strings() {
    let msg = Message::new("로그", "étiquette", "src/日本.rs", "fn_ß").push("🚀 launched");
    assert_eq!(decode(&encode(&msg)).expect("Failed to decode"), msg);
}

#[test]
fn test_arbitrary_bytes_roundtrip() {
    let every_byte: Vec<u8> = (0..=255).collect();
    let msg = Message::new(&b"caf\xe9"[..], vec![0xC3u8, 0x28], "", "")
        .push(every_byte.clone())
        .push(vec![0x80u8]);

    let decoded = decode(&encode(&msg)).expect("Failed to decode");
    assert_eq!(decoded.messages[0], every_byte);
    assert_eq!(decoded, msg);
    assert_eq!(Message::lossy(&decoded.label), "\u{FFFD}(");
}

#[test]
fn test_prefixes_fail_or_stop_at_fragment_boundary() {
    let msg = reference();
    let bytes = encode(&msg);

    // With no stored count, a cut exactly between fragments is indistinguishable
    // from a shorter record. Every other cut must fail.
    for cut in 0..bytes.len() {
        if let Ok(partial) = decode(&bytes[..cut]) {
            assert!(partial.messages.len() < msg.messages.len());
            assert_eq!(
                partial.messages[..],
                msg.messages[..partial.messages.len()]
            );
            assert_eq!(cut, encoded_len(&partial));
        }
    }
}

#[test]
fn test_trailing_garbage_is_truncated_message() {
    let mut bytes = encode(&reference());
    bytes.extend_from_slice(&[0xFF, 0xFF]);

    match decode(&bytes) {
        Err(CodecError::TruncatedMessage { index: 2, .. }) => {}
        other => panic!("Expected truncated fragment, got {other:?}"),
    }
}

#[test]
fn test_decoded_message_is_independent() {
    let bytes = encode(&reference());
    let mut decoded = decode(&bytes).expect("Failed to decode");
    decoded.messages.push(b"later".to_vec());
    decoded.role.push(b'!');

    // the buffer is untouched and still decodes to the original
    assert_eq!(decode(&bytes).expect("Failed to decode"), reference());
}
