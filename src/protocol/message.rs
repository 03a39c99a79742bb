//! # Log Message Model
//!
//! [`Message`] is one structured log record as it exists in memory on either
//! side of the wire. It is plain owned data: encoding borrows it, decoding
//! produces a fresh value that shares nothing with the buffer it came from.
//!
//! Strings are raw byte sequences. Producers may hand over any encoding, so
//! nothing here assumes UTF-8; [`Message::to_json`] and [`Message::lossy`] are
//! the only places that turn bytes into text, and both replace invalid
//! sequences rather than fail.
//!
//! Integer fields that the producer fills from platform-sized values (`time`,
//! `process_id`, `thread_id`) are `usize`, and they travel at that native
//! width. See [`crate::core::codec`] for the consequences.

use std::borrow::Cow;

use serde::Serialize;

use crate::core::{codec, fingerprint};
use crate::error::{CodecError, Result};

/// One structured log record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Semantic category of the emitting subsystem
    pub role: Vec<u8>,
    /// Free-form tag
    pub label: Vec<u8>,
    /// Source file of the call site
    pub file: Vec<u8>,
    /// Source function of the call site
    pub function: Vec<u8>,
    /// Timestamp in microseconds; the origin is chosen by the producer
    pub time: usize,
    pub process_id: usize,
    pub thread_id: usize,
    pub line: i32,
    /// Severity, 0 when unset
    pub level: i32,
    /// Payload fragments in the order they were logged
    pub messages: Vec<Vec<u8>>,
}

impl Message {
    /// Start a record with the four call-site strings; numeric fields default to 0.
    pub fn new(
        role: impl Into<Vec<u8>>,
        label: impl Into<Vec<u8>>,
        file: impl Into<Vec<u8>>,
        function: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            role: role.into(),
            label: label.into(),
            file: file.into(),
            function: function.into(),
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time: usize) -> Self {
        self.time = time;
        self
    }

    pub fn with_ids(mut self, process_id: usize, thread_id: usize) -> Self {
        self.process_id = process_id;
        self.thread_id = thread_id;
        self
    }

    pub fn with_line(mut self, line: i32) -> Self {
        self.line = line;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Append one payload fragment.
    pub fn push(mut self, fragment: impl Into<Vec<u8>>) -> Self {
        self.messages.push(fragment.into());
        self
    }

    /// Encode to the native wire format. Never fails.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Decode a buffer produced by [`Message::encode`] on the same architecture.
    pub fn decode(data: &[u8]) -> std::result::Result<Self, CodecError> {
        codec::decode(data)
    }

    /// Fingerprint of this record's encoding.
    pub fn fingerprint(&self) -> u64 {
        fingerprint::hash(&self.encode())
    }

    /// Text view of one field, with invalid UTF-8 replaced by U+FFFD.
    pub fn lossy(field: &[u8]) -> Cow<'_, str> {
        String::from_utf8_lossy(field)
    }

    /// Structured JSON view of the record. Strings are rendered lossily.
    pub fn to_json(&self) -> Result<String> {
        let view = JsonView {
            role: Self::lossy(&self.role),
            label: Self::lossy(&self.label),
            file: Self::lossy(&self.file),
            function: Self::lossy(&self.function),
            time: self.time,
            process_id: self.process_id,
            thread_id: self.thread_id,
            line: self.line,
            level: self.level,
            messages: self.messages.iter().map(|m| Self::lossy(m)).collect(),
        };
        Ok(serde_json::to_string(&view)?)
    }
}

#[derive(Serialize)]
struct JsonView<'a> {
    role: Cow<'a, str>,
    label: Cow<'a, str>,
    file: Cow<'a, str>,
    function: Cow<'a, str>,
    time: usize,
    process_id: usize,
    thread_id: usize,
    line: i32,
    level: i32,
    messages: Vec<Cow<'a, str>>,
}
