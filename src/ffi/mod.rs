//! # Foreign Boundary
//!
//! C ABI for building, encoding, decoding and fingerprinting log messages from
//! another runtime.
//!
//! ## Ownership Contract
//! | allocated by | released by | notes |
//! |---|---|---|
//! | [`xclog_message_encode`] | [`xclog_message_free_encoded`] | C allocator, exactly once |
//! | [`xclog_message_decode`] | [`xclog_message_free`] | record, every string, pointer array |
//!
//! Input records and input buffers stay owned by the caller and are never
//! retained. Releasing twice, releasing with the wrong function, or never
//! releasing are caller errors this crate cannot detect.
//!
//! Allocation failure aborts the process through
//! [`std::alloc::handle_alloc_error`]; it is never reported as a status.
//!
//! ## Null Handling
//! Strings are copied byte for byte up to their terminating NUL; any encoding
//! goes through unchanged. A null string pointer in an input record reads as an
//! empty string and is never dereferenced. Null entries inside `messages` read as empty strings, and
//! a null `messages` array reads as an empty list.
//!
//! ## C Declarations
//! ```c
//! typedef enum XclogStatus {
//!     XCLOG_OK = 0,
//!     XCLOG_NULL_ARGUMENT = 1,
//!     XCLOG_BUFFER_TOO_SHORT = 2,
//!     XCLOG_TRUNCATED_MESSAGE = 3,
//!     XCLOG_INTERIOR_NUL = 4,
//! } XclogStatus;
//!
//! typedef struct XclogMessage {
//!     const char *role, *label, *file, *function;
//!     size_t time, process_id, thread_id;
//!     int line, level;
//!     const char **messages;
//!     size_t messages_size;
//! } XclogMessage;
//!
//! char *xclog_message_encode(const XclogMessage *msg, size_t *out_size);
//! void xclog_message_free_encoded(char *data);
//! XclogMessage *xclog_message_decode(const char *data, size_t size, XclogStatus *status);
//! void xclog_message_free(XclogMessage *msg);
//! uint64_t xclog_message_hash(const char *data, size_t size);
//! ```

#![allow(unsafe_code)]

pub mod owned;
pub mod record;

use libc::size_t;
use std::alloc::{handle_alloc_error, Layout};
use std::os::raw::{c_char, c_void};
use std::{fmt, ptr};
use tracing::debug;

use crate::core::{codec, fingerprint};
use crate::error::CodecError;

pub use owned::{EncodedBuffer, FlatRecord, OwnedRecord};
pub use record::XclogMessage;

/// Outcome of a boundary call, written through the optional `status` pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum XclogStatus {
    Ok = 0,
    NullArgument = 1,
    BufferTooShort = 2,
    TruncatedMessage = 3,
    /// A decoded string holds a NUL byte and cannot become a C string
    InteriorNul = 4,
}

impl XclogStatus {
    pub fn is_ok(self) -> bool {
        self == XclogStatus::Ok
    }
}

impl fmt::Display for XclogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            XclogStatus::Ok => "ok",
            XclogStatus::NullArgument => "required pointer argument was null",
            XclogStatus::BufferTooShort => "buffer too short for a header field",
            XclogStatus::TruncatedMessage => "trailing message fragment is truncated",
            XclogStatus::InteriorNul => "string contains a NUL byte",
        })
    }
}

impl From<&CodecError> for XclogStatus {
    fn from(err: &CodecError) -> Self {
        match err {
            CodecError::BufferTooShort { .. } => XclogStatus::BufferTooShort,
            CodecError::TruncatedMessage { .. } => XclogStatus::TruncatedMessage,
        }
    }
}

#[inline]
unsafe fn set_status(status: *mut XclogStatus, value: XclogStatus) {
    if !status.is_null() {
        status.write(value);
    }
}

/// View a caller buffer as a slice; a null pointer is only valid with size 0.
#[inline]
unsafe fn input_bytes<'a>(data: *const c_char, size: size_t) -> Option<&'a [u8]> {
    if data.is_null() {
        return (size == 0).then_some(&[][..]);
    }
    Some(std::slice::from_raw_parts(data.cast::<u8>(), size))
}

/// Encode a caller-populated record.
///
/// Returns a buffer of `*out_size` bytes owned by the caller, who must release
/// it with exactly one call to [`xclog_message_free_encoded`]. Returns null and
/// sets `*out_size` to 0 if `msg` is null; returns null without writing if
/// `out_size` is null.
///
/// # Safety
/// `msg` must satisfy the field contract documented on [`XclogMessage`], and
/// `out_size` must be valid for a write.
#[no_mangle]
pub unsafe extern "C" fn xclog_message_encode(
    msg: *const XclogMessage,
    out_size: *mut size_t,
) -> *mut c_char {
    if out_size.is_null() {
        debug!("encode called without out_size");
        return ptr::null_mut();
    }
    out_size.write(0);

    let Some(record) = msg.as_ref() else {
        debug!("encode called with null record");
        return ptr::null_mut();
    };

    let message = record::read_record(record);
    let encoded = codec::encode(&message);
    let len = encoded.len();

    // malloc(0) may legally return null, so always ask for at least one byte
    let buf = libc::malloc(len.max(1)).cast::<u8>();
    if buf.is_null() {
        handle_alloc_error(Layout::array::<u8>(len.max(1)).unwrap_or(Layout::new::<u8>()));
    }
    ptr::copy_nonoverlapping(encoded.as_ptr(), buf, len);

    out_size.write(len);
    buf.cast::<c_char>()
}

/// Release a buffer returned by [`xclog_message_encode`]. Null is a no-op.
///
/// # Safety
/// `data` must be null or a pointer from [`xclog_message_encode`] that has not
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn xclog_message_free_encoded(data: *mut c_char) {
    if !data.is_null() {
        libc::free(data.cast::<c_void>());
    }
}

/// Decode `size` bytes into a newly allocated record.
///
/// On success the record, each of its strings, and its `messages` array are
/// owned by the caller and must be released together with exactly one call to
/// [`xclog_message_free`]. On failure returns null. In both cases a non-null
/// `status` receives the outcome.
///
/// # Safety
/// `data` must be null with `size == 0`, or valid for reads of `size` bytes.
/// `status` must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn xclog_message_decode(
    data: *const c_char,
    size: size_t,
    status: *mut XclogStatus,
) -> *mut XclogMessage {
    let Some(bytes) = input_bytes(data, size) else {
        set_status(status, XclogStatus::NullArgument);
        return ptr::null_mut();
    };

    let message = match codec::decode(bytes) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, size, "decode failed at boundary");
            set_status(status, XclogStatus::from(&e));
            return ptr::null_mut();
        }
    };

    match record::into_raw_record(message) {
        Ok(raw) => {
            set_status(status, XclogStatus::Ok);
            raw
        }
        Err(code) => {
            debug!(status = %code, "decoded message cannot cross the boundary");
            set_status(status, code);
            ptr::null_mut()
        }
    }
}

/// Release a record returned by [`xclog_message_decode`], including every
/// string copy and the `messages` array. Null is a no-op.
///
/// # Safety
/// `msg` must be null or a record from [`xclog_message_decode`] whose pointer
/// and size fields are unmodified and which has not been released yet.
#[no_mangle]
pub unsafe extern "C" fn xclog_message_free(msg: *mut XclogMessage) {
    if !msg.is_null() {
        record::free_raw_record(msg);
    }
}

/// Fingerprint of `size` encoded bytes. Null with size 0 hashes the empty
/// buffer; null with a non-zero size hashes as empty too.
///
/// # Safety
/// `data` must be null or valid for reads of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn xclog_message_hash(data: *const c_char, size: size_t) -> u64 {
    fingerprint::hash(input_bytes(data, size).unwrap_or_default())
}
