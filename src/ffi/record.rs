//! C layout of a log message and the conversions between it and [`Message`].
//!
//! Two ownership regimes meet here:
//! - records passed *in* to `xclog_message_encode` belong to the caller and are
//!   only read;
//! - records handed *out* by `xclog_message_decode` are allocated by this crate
//!   with the Rust allocator and must come back through `xclog_message_free`.

use libc::size_t;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use super::XclogStatus;
use crate::protocol::message::Message;

/// Flat, C-compatible log record.
///
/// String fields are NUL-terminated. `messages` points to `messages_size`
/// string pointers; it is null when the list is empty.
#[derive(Debug)]
#[repr(C)]
pub struct XclogMessage {
    pub role: *const c_char,
    pub label: *const c_char,
    pub file: *const c_char,
    pub function: *const c_char,
    pub time: size_t,
    pub process_id: size_t,
    pub thread_id: size_t,
    pub line: c_int,
    pub level: c_int,
    pub messages: *const *const c_char,
    pub messages_size: size_t,
}

/// Copy the bytes of a caller-owned string field, without its NUL; null reads
/// as empty.
///
/// # Safety
/// A non-null `ptr` must point to a NUL-terminated string valid for the call.
unsafe fn read_field(ptr: *const c_char) -> Vec<u8> {
    if ptr.is_null() {
        return Vec::new();
    }
    CStr::from_ptr(ptr).to_bytes().to_vec()
}

/// Copy a caller-owned record into a [`Message`].
///
/// Null string pointers and null `messages` entries become empty strings; a
/// null `messages` array is an empty list regardless of `messages_size`.
///
/// # Safety
/// Every non-null string pointer must reference a NUL-terminated string, and a
/// non-null `messages` must point to `messages_size` readable pointers, all
/// valid for the duration of the call.
pub(crate) unsafe fn read_record(record: &XclogMessage) -> Message {
    let fragments: &[*const c_char] = if record.messages.is_null() || record.messages_size == 0
    {
        &[]
    } else {
        std::slice::from_raw_parts(record.messages, record.messages_size)
    };

    Message {
        role: read_field(record.role),
        label: read_field(record.label),
        file: read_field(record.file),
        function: read_field(record.function),
        time: record.time,
        process_id: record.process_id,
        thread_id: record.thread_id,
        line: record.line,
        level: record.level,
        messages: fragments.iter().map(|&ptr| read_field(ptr)).collect(),
    }
}

/// Move a [`Message`] into a heap-allocated record owned by the caller.
///
/// Every string is copied into its own NUL-terminated allocation. Fails with
/// [`XclogStatus::InteriorNul`] before allocating anything if a string holds a
/// NUL byte.
pub(crate) fn into_raw_record(msg: Message) -> Result<*mut XclogMessage, XclogStatus> {
    let nul = |_| XclogStatus::InteriorNul;
    let role = CString::new(msg.role).map_err(nul)?;
    let label = CString::new(msg.label).map_err(nul)?;
    let file = CString::new(msg.file).map_err(nul)?;
    let function = CString::new(msg.function).map_err(nul)?;
    let fragments = msg
        .messages
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(nul)?;

    let messages_size = fragments.len();
    let messages = if fragments.is_empty() {
        ptr::null()
    } else {
        let ptrs: Box<[*const c_char]> = fragments
            .into_iter()
            .map(|s| s.into_raw().cast_const())
            .collect();
        Box::into_raw(ptrs).cast::<*const c_char>().cast_const()
    };

    let record = XclogMessage {
        role: role.into_raw(),
        label: label.into_raw(),
        file: file.into_raw(),
        function: function.into_raw(),
        time: msg.time,
        process_id: msg.process_id,
        thread_id: msg.thread_id,
        line: msg.line,
        level: msg.level,
        messages,
        messages_size,
    };

    Ok(Box::into_raw(Box::new(record)))
}

/// Release a record built by [`into_raw_record`].
///
/// # Safety
/// `record` must come from [`into_raw_record`], be unmodified, and not have been
/// released before.
pub(crate) unsafe fn free_raw_record(record: *mut XclogMessage) {
    let record = Box::from_raw(record);

    for field in [record.role, record.label, record.file, record.function] {
        if !field.is_null() {
            drop(CString::from_raw(field.cast_mut()));
        }
    }

    if !record.messages.is_null() {
        let ptrs = Box::from_raw(ptr::slice_from_raw_parts_mut(
            record.messages.cast_mut(),
            record.messages_size,
        ));
        for &fragment in ptrs.iter() {
            if !fragment.is_null() {
                drop(CString::from_raw(fragment.cast_mut()));
            }
        }
    }
}
