//! Safe Rust handles over the C boundary.
//!
//! These drive the exported functions exactly as a foreign caller would, and
//! tie each allocation to a single `Drop`.

use std::ffi::{CString, NulError};
use std::os::raw::c_char;
use std::ptr::{self, NonNull};

use super::record::{self, XclogMessage};
use super::{
    xclog_message_decode, xclog_message_encode, xclog_message_free, xclog_message_free_encoded,
    xclog_message_hash, XclogStatus,
};
use crate::protocol::message::Message;

/// A caller-owned flat record built from copies of a [`Message`]'s strings.
///
/// The pointers inside [`FlatRecord::as_raw`] reference heap storage owned by
/// this value, so they stay valid while it lives even if it is moved.
pub struct FlatRecord {
    _strings: [CString; 4],
    _fragments: Vec<CString>,
    _fragment_ptrs: Vec<*const c_char>,
    raw: XclogMessage,
}

impl FlatRecord {
    /// Fails if any string contains a NUL byte.
    pub fn new(msg: &Message) -> Result<Self, NulError> {
        let strings = [
            CString::new(msg.role.as_slice())?,
            CString::new(msg.label.as_slice())?,
            CString::new(msg.file.as_slice())?,
            CString::new(msg.function.as_slice())?,
        ];
        let fragments = msg
            .messages
            .iter()
            .map(|m| CString::new(m.as_slice()))
            .collect::<Result<Vec<_>, _>>()?;
        let fragment_ptrs: Vec<*const c_char> = fragments.iter().map(|s| s.as_ptr()).collect();

        let raw = XclogMessage {
            role: strings[0].as_ptr(),
            label: strings[1].as_ptr(),
            file: strings[2].as_ptr(),
            function: strings[3].as_ptr(),
            time: msg.time,
            process_id: msg.process_id,
            thread_id: msg.thread_id,
            line: msg.line,
            level: msg.level,
            messages: if fragment_ptrs.is_empty() {
                ptr::null()
            } else {
                fragment_ptrs.as_ptr()
            },
            messages_size: fragment_ptrs.len(),
        };

        Ok(Self {
            _strings: strings,
            _fragments: fragments,
            _fragment_ptrs: fragment_ptrs,
            raw,
        })
    }

    pub fn as_raw(&self) -> &XclogMessage {
        &self.raw
    }

    /// Encode through [`xclog_message_encode`].
    pub fn encode(&self) -> Option<EncodedBuffer> {
        let mut len = 0usize;
        // SAFETY: `raw` points into storage owned by `self`, and `len` is a live local.
        let data = unsafe { xclog_message_encode(&self.raw, &mut len) };
        NonNull::new(data).map(|data| EncodedBuffer { data, len })
    }
}

/// A buffer from [`xclog_message_encode`], released on drop.
#[derive(Debug)]
pub struct EncodedBuffer {
    data: NonNull<c_char>,
    len: usize,
}

impl EncodedBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the encoder wrote exactly `len` bytes at `data`, and we own them.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr().cast::<u8>(), self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fingerprint through [`xclog_message_hash`].
    pub fn hash(&self) -> u64 {
        // SAFETY: `data` is valid for `len` bytes.
        unsafe { xclog_message_hash(self.data.as_ptr(), self.len) }
    }
}

impl Drop for EncodedBuffer {
    fn drop(&mut self) {
        // SAFETY: `data` came from `xclog_message_encode` and is released only here.
        unsafe { xclog_message_free_encoded(self.data.as_ptr()) }
    }
}

/// A record from [`xclog_message_decode`], released on drop.
#[derive(Debug)]
pub struct OwnedRecord {
    raw: NonNull<XclogMessage>,
}

impl OwnedRecord {
    /// Decode through [`xclog_message_decode`].
    pub fn decode(data: &[u8]) -> Result<Self, XclogStatus> {
        let mut status = XclogStatus::Ok;
        // SAFETY: `data` is a live slice and `status` a live local.
        let raw = unsafe { xclog_message_decode(data.as_ptr().cast(), data.len(), &mut status) };
        NonNull::new(raw).map(|raw| Self { raw }).ok_or(status)
    }

    pub fn as_raw(&self) -> &XclogMessage {
        // SAFETY: the record stays allocated until drop.
        unsafe { self.raw.as_ref() }
    }

    /// Copy the record back into an owned [`Message`].
    pub fn to_message(&self) -> Message {
        // SAFETY: every pointer in a decoded record is a NUL-terminated copy we own.
        unsafe { record::read_record(self.as_raw()) }
    }
}

impl Drop for OwnedRecord {
    fn drop(&mut self) {
        // SAFETY: `raw` came from `xclog_message_decode` and is released only here.
        unsafe { xclog_message_free(self.raw.as_ptr()) }
    }
}
