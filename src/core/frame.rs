//! # Frame Codec
//!
//! Encoded messages are self-delimiting only by total buffer length, so a byte
//! stream needs an outer frame to split them apart again.
//!
//! ## Frame Format
//! ```text
//! [Magic "XCLG"(4)] [Length u32 BE (4)] [Encoded message (N)]
//! ```
//! The payload is an encoded message exactly as [`crate::core::codec::encode`]
//! produces it. The decoder never allocates for a frame whose declared length
//! exceeds the configured limit.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::MAX_FRAME_SIZE;
use crate::core::codec;
use crate::error::{Result, XclogError};
use crate::protocol::message::Message;

/// Magic bytes opening every frame
pub const FRAME_MAGIC: [u8; 4] = *b"XCLG";

/// Magic plus length
pub const FRAME_HEADER_LEN: usize = 8;

/// Length-delimited framing for encoded messages.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_SIZE)
    }
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    fn check_len(&self, len: usize) -> Result<u32> {
        if len > self.max_frame_size {
            return Err(XclogError::OversizedFrame(len));
        }
        u32::try_from(len).map_err(|_| XclogError::OversizedFrame(len))
    }

    fn put_header(dst: &mut BytesMut, len: u32) {
        dst.put_slice(&FRAME_MAGIC);
        dst.put_u32(len);
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = XclogError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        if src[..4] != FRAME_MAGIC {
            return Err(XclogError::InvalidHeader);
        }

        let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;
        if len > self.max_frame_size {
            return Err(XclogError::OversizedFrame(len));
        }

        let total = FRAME_HEADER_LEN + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_LEN);
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = XclogError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        let len = self.check_len(item.len())?;
        dst.reserve(FRAME_HEADER_LEN + item.len());
        Self::put_header(dst, len);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl<'a> Encoder<&'a Message> for FrameCodec {
    type Error = XclogError;

    fn encode(&mut self, item: &'a Message, dst: &mut BytesMut) -> Result<()> {
        let body = codec::encoded_len(item);
        let len = self.check_len(body)?;
        dst.reserve(FRAME_HEADER_LEN + body);
        Self::put_header(dst, len);
        codec::encode_into(item, dst);
        Ok(())
    }
}
