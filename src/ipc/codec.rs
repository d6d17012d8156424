//! Frame codecs for the daemon socket.
//!
//! A frame is a big-endian `u32` payload length followed by that many
//! bytes of MessagePack. Payloads above [`MAX_PAYLOAD_SIZE`] are refused
//! in both directions.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{MAX_PAYLOAD_SIZE, Message, RawEnvelope};

const HEADER_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("frame of {0} bytes exceeds the {MAX_PAYLOAD_SIZE} byte limit")]
    Oversized(usize),
    #[error("socket I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("decoding message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Splits the byte stream into raw payloads and writes [`Message`]s as
/// frames.
///
/// Decoding stops at the frame boundary so the server can tell unknown
/// message types apart from garbage (see [`decode_frame`]).
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Payload length of a frame whose header was already consumed.
    expected: Option<usize>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, CodecError> {
        let len = match self.expected {
            Some(len) => len,
            None if src.len() < HEADER_LEN => return Ok(None),
            None => {
                let len = src.get_u32() as usize;
                if len > MAX_PAYLOAD_SIZE {
                    return Err(CodecError::Oversized(len));
                }
                self.expected = Some(len);
                len
            }
        };

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }
        self.expected = None;
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let payload = rmp_serde::to_vec_named(&msg)?;
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(CodecError::Oversized(payload.len()));
        }
        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.put_slice(&payload);
        Ok(())
    }
}

/// [`FrameCodec`] that also deserializes payloads into [`Message`].
///
/// Used by the CLI client, which only ever expects known messages.
#[derive(Debug, Default)]
pub struct LengthPrefixedCodec {
    frames: FrameCodec,
}

impl LengthPrefixedCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LengthPrefixedCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        let Some(payload) = self.frames.decode(src)? else {
            return Ok(None);
        };
        Ok(Some(rmp_serde::from_slice(&payload)?))
    }
}

impl Encoder<Message> for LengthPrefixedCodec {
    type Error = CodecError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        self.frames.encode(msg, dst)
    }
}

/// Outcome of interpreting one raw frame.
#[derive(Debug)]
pub enum DecodeResult {
    Ok(Message),
    /// Well-formed `{type, id}` map of a type this server does not know.
    UnknownType(RawEnvelope),
    Malformed(rmp_serde::decode::Error),
}

/// Decode a payload as [`Message`], falling back to [`RawEnvelope`] so
/// the caller can still echo the request id.
pub fn decode_frame(payload: &[u8]) -> DecodeResult {
    if let Ok(msg) = rmp_serde::from_slice(payload) {
        return DecodeResult::Ok(msg);
    }
    rmp_serde::from_slice(payload).map_or_else(DecodeResult::Malformed, DecodeResult::UnknownType)
}
