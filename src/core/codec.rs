//! # Message Codec
//!
//! Deterministic binary encoding of a [`Message`] and its bounds-checked inverse.
//!
//! ## Wire Format
//! ```text
//! [len][role] [len][label] [len][file] [len][function]
//! [time] [process_id] [thread_id]
//! [line] [level]
//! [len][message 0] [len][message 1] ... until end of buffer
//! ```
//! `len`, `time`, `process_id` and `thread_id` are `usize`; `line` and `level`
//! are `i32`. All integers use the platform's native width and byte order, so
//! a buffer only decodes correctly on an architecture with the same `usize`
//! width and endianness as its producer. There is no padding, no terminator and
//! no fragment count: the fragment list ends where the buffer ends.
//!
//! ## Validation
//! Every read is checked against the bytes remaining. A shortfall inside the
//! fixed header is [`CodecError::BufferTooShort`]; a shortfall inside the
//! trailing fragment list is [`CodecError::TruncatedMessage`]. String bytes
//! are copied as they are; no encoding is assumed.

use bytes::BufMut;

use crate::error::CodecError;
use crate::protocol::message::Message;

/// Width of length prefixes and of the `time`/`process_id`/`thread_id` fields.
pub const USIZE_WIDTH: usize = std::mem::size_of::<usize>();

/// Width of the `line` and `level` fields.
pub const INT_WIDTH: usize = std::mem::size_of::<i32>();

/// Size of the fixed header for a record whose four header strings are empty.
pub const MIN_ENCODED_LEN: usize = 4 * USIZE_WIDTH + 3 * USIZE_WIDTH + 2 * INT_WIDTH;

/// Exact number of bytes [`encode`] will produce for `msg`.
pub fn encoded_len(msg: &Message) -> usize {
    let header_strings: usize = [&msg.role, &msg.label, &msg.file, &msg.function]
        .iter()
        .map(|s| s.len())
        .sum();
    let fragments: usize = msg.messages.iter().map(|m| USIZE_WIDTH + m.len()).sum();
    MIN_ENCODED_LEN + header_strings + fragments
}

/// Encode `msg` into a freshly allocated buffer of exactly [`encoded_len`] bytes.
pub fn encode(msg: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(msg));
    encode_into(msg, &mut buf);
    buf
}

/// Append the encoding of `msg` to any byte sink.
pub fn encode_into<B: BufMut>(msg: &Message, buf: &mut B) {
    for s in [&msg.role, &msg.label, &msg.file, &msg.function] {
        put_bytes(buf, s);
    }
    for n in [msg.time, msg.process_id, msg.thread_id] {
        buf.put_slice(&n.to_ne_bytes());
    }
    for n in [msg.line, msg.level] {
        buf.put_slice(&n.to_ne_bytes());
    }
    for fragment in &msg.messages {
        put_bytes(buf, fragment);
    }
}

#[inline]
fn put_bytes<B: BufMut>(buf: &mut B, s: &[u8]) {
    buf.put_slice(&s.len().to_ne_bytes());
    buf.put_slice(s);
}

/// Decode a buffer produced by [`encode`].
///
/// The result owns all of its data; nothing borrows from `data`.
pub fn decode(data: &[u8]) -> Result<Message, CodecError> {
    let mut reader = Reader::new(data);

    let role = reader.bytes("role")?;
    let label = reader.bytes("label")?;
    let file = reader.bytes("file")?;
    let function = reader.bytes("function")?;
    let time = reader.usize("time")?;
    let process_id = reader.usize("process_id")?;
    let thread_id = reader.usize("thread_id")?;
    let line = reader.i32("line")?;
    let level = reader.i32("level")?;

    let mut messages = Vec::new();
    while reader.remaining() > 0 {
        messages.push(reader.fragment(messages.len())?);
    }

    Ok(Message {
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
    })
}

/// Forward-only cursor over an input buffer.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Consume `n` bytes, or nothing if fewer remain.
    #[inline]
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Some(slice)
    }

    fn take_field(&mut self, field: &'static str, needed: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        self.take(needed).ok_or(CodecError::BufferTooShort {
            field,
            needed,
            remaining,
        })
    }

    fn usize(&mut self, field: &'static str) -> Result<usize, CodecError> {
        self.take_field(field, USIZE_WIDTH).map(read_usize)
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, CodecError> {
        let bytes = self.take_field(field, INT_WIDTH)?;
        let mut raw = [0u8; INT_WIDTH];
        raw.copy_from_slice(bytes);
        Ok(i32::from_ne_bytes(raw))
    }

    fn bytes(&mut self, field: &'static str) -> Result<Vec<u8>, CodecError> {
        let len = self.usize(field)?;
        self.take_field(field, len).map(<[u8]>::to_vec)
    }

    /// Read fragment `index` of the trailing list.
    fn fragment(&mut self, index: usize) -> Result<Vec<u8>, CodecError> {
        let remaining = self.remaining();
        let prefix = self.take(USIZE_WIDTH).ok_or(CodecError::TruncatedMessage {
            index,
            needed: USIZE_WIDTH,
            remaining,
        })?;
        let len = read_usize(prefix);

        let remaining = self.remaining();
        let bytes = self.take(len).ok_or(CodecError::TruncatedMessage {
            index,
            needed: len,
            remaining,
        })?;
        Ok(bytes.to_vec())
    }
}

#[inline]
fn read_usize(bytes: &[u8]) -> usize {
    let mut raw = [0u8; USIZE_WIDTH];
    raw.copy_from_slice(bytes);
    usize::from_ne_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            role: "info".into(),
            label: "test".into(),
            file: "a.cc".into(),
            function: "f".into(),
            time: 1000,
            process_id: 1,
            thread_id: 2,
            line: 10,
            level: 0,
            messages: vec![b"hello".to_vec(), b"world".to_vec()],
        }
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_sample_roundtrip() {
        let msg = sample();
        let bytes = encode(&msg);
        assert_eq!(bytes.len(), encoded_len(&msg));
        assert_eq!(decode(&bytes).expect("decode"), msg);
    }

    #[test]
    fn test_field_layout() {
        let bytes = encode(&sample());

        // role
        assert_eq!(&bytes[..USIZE_WIDTH], &4usize.to_ne_bytes());
        assert_eq!(&bytes[USIZE_WIDTH..USIZE_WIDTH + 4], b"info");

        // time follows the four header strings
        let strings_end = 4 * USIZE_WIDTH + "info".len() + "test".len() + "a.cc".len() + 1;
        assert_eq!(
            &bytes[strings_end..strings_end + USIZE_WIDTH],
            &1000usize.to_ne_bytes()
        );

        // line then level
        let ints = strings_end + 3 * USIZE_WIDTH;
        assert_eq!(&bytes[ints..ints + INT_WIDTH], &10i32.to_ne_bytes());
        assert_eq!(
            &bytes[ints + INT_WIDTH..ints + 2 * INT_WIDTH],
            &0i32.to_ne_bytes()
        );

        // first fragment comes straight after, with no count prefix
        let frag = ints + 2 * INT_WIDTH;
        assert_eq!(&bytes[frag..frag + USIZE_WIDTH], &5usize.to_ne_bytes());
        assert_eq!(&bytes[frag + USIZE_WIDTH..frag + USIZE_WIDTH + 5], b"hello");
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_empty_record() {
        let msg = Message::default();
        let bytes = encode(&msg);
        assert_eq!(bytes.len(), MIN_ENCODED_LEN);

        let decoded = decode(&bytes).expect("decode");
        assert!(decoded.messages.is_empty());
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_header_truncation_is_buffer_too_short() {
        let mut msg = sample();
        msg.messages.clear();
        let bytes = encode(&msg);

        match decode(&bytes[..bytes.len() - 1]) {
            Err(CodecError::BufferTooShort {
                field: "level",
                needed: INT_WIDTH,
                remaining,
            }) => assert_eq!(remaining, INT_WIDTH - 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            decode(&[]),
            Err(CodecError::BufferTooShort {
                field: "role",
                needed: USIZE_WIDTH,
                remaining: 0,
            })
        );
    }

    #[test]
    fn test_declared_length_past_end() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&usize::MAX.to_ne_bytes());
        bytes.extend_from_slice(b"abc");

        assert_eq!(
            decode(&bytes),
            Err(CodecError::BufferTooShort {
                field: "role",
                needed: usize::MAX,
                remaining: 3,
            })
        );
    }

    #[test]
    fn test_fragment_truncation() {
        let bytes = encode(&sample());

        // last byte of "world" missing
        match decode(&bytes[..bytes.len() - 1]) {
            Err(CodecError::TruncatedMessage {
                index: 1,
                needed: 5,
                remaining: 4,
            }) => {}
            other => panic!("unexpected: {other:?}"),
        }

        // partial length prefix of the second fragment
        let cut = bytes.len() - "world".len() - 3;
        match decode(&bytes[..cut]) {
            Err(CodecError::TruncatedMessage {
                index: 1,
                needed: USIZE_WIDTH,
                remaining,
            }) => assert_eq!(remaining, USIZE_WIDTH - 3),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_fragments_recovered_by_exhaustion() {
        let mut bytes = encode(&sample());
        put_bytes(&mut bytes, b"appended");

        let decoded = decode(&bytes).expect("decode");
        assert_eq!(
            decoded.messages,
            vec![b"hello".to_vec(), b"world".to_vec(), b"appended".to_vec()]
        );
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_non_utf8_bytes_decode_verbatim() {
        // role = "\xff", three empty strings, zeroed integers
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1usize.to_ne_bytes());
        bytes.push(0xFF);
        bytes.resize(MIN_ENCODED_LEN + 1, 0);

        let decoded = decode(&bytes).expect("decode");
        assert_eq!(decoded.role, b"\xff");
        assert_eq!(decoded, Message::new(&b"\xff"[..], "", "", ""));
        assert_eq!(encode(&decoded), bytes);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_non_utf8_roundtrip() {
        let mut msg = sample();
        msg.label = b"caf\xe9".to_vec();
        msg.messages.push(vec![0xC3, 0x28, 0x80]);

        let bytes = encode(&msg);
        assert_eq!(bytes.len(), encoded_len(&msg));
        assert_eq!(decode(&bytes).expect("decode"), msg);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_encode_into_appends() {
        let msg = sample();
        let mut buf = vec![0xAA];
        encode_into(&msg, &mut buf);
        assert_eq!(buf[0], 0xAA);
        assert_eq!(decode(&buf[1..]).expect("decode"), msg);
    }
}
