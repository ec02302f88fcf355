// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UAVTalk frame encoding and decoding.
//!
//! # Wire Format
//!
//! ```text
//! +--------+--------+------------+-------------+-------------+----------+-------+
//! | sync   | type   | length     | object_id   | instance_id | data     | crc8  |
//! | (0x3C) | (u8)   | (u16 LE)   | (u32 LE)    | (u16 LE)    | (...)    | (u8)  |
//! +--------+--------+------------+-------------+-------------+----------+-------+
//! ```
//!
//! - `length` covers the whole frame, header and checksum included
//! - CRC-8 covers every byte before it

use thiserror::Error;

use crate::crc::crc8;

/// Frame sync byte.
pub const SYNC: u8 = 0x3C;

/// Header size: sync + type + length + object id + instance id.
pub const HEADER_LENGTH: usize = 10;

pub const CHECKSUM_LENGTH: usize = 1;

/// Smallest frame that can carry a header and a checksum.
pub const MIN_FRAME_LENGTH: usize = HEADER_LENGTH + CHECKSUM_LENGTH;

/// Largest frame the protocol allows.
pub const MAX_FRAME_LENGTH: usize = 255;

/// Largest data payload that fits in one frame.
pub const MAX_PAYLOAD_LENGTH: usize = MAX_FRAME_LENGTH - MIN_FRAME_LENGTH;

/// Version bits shared by every message type byte.
pub const TYPE_VERSION: u8 = 0x20;

/// Why a datagram was not accepted as a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RejectReason {
    #[error("truncated header")]
    TruncatedHeader,
    #[error("invalid sync byte")]
    InvalidSync,
    #[error("frame length out of range")]
    LengthOutOfRange,
    #[error("truncated frame")]
    Truncated,
    #[error("checksum mismatch")]
    ChecksumMismatch,
}

impl RejectReason {
    pub const ALL: [RejectReason; 5] = [
        RejectReason::TruncatedHeader,
        RejectReason::InvalidSync,
        RejectReason::LengthOutOfRange,
        RejectReason::Truncated,
        RejectReason::ChecksumMismatch,
    ];

    /// Dense index, for per-reason counters.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// UAVTalk message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Object update, no acknowledgement wanted.
    Object = TYPE_VERSION,
    /// Request for an object's current value.
    ObjectRequest = TYPE_VERSION | 0x01,
    /// Object update that must be acknowledged.
    ObjectAck = TYPE_VERSION | 0x02,
    Ack = TYPE_VERSION | 0x03,
    Nack = TYPE_VERSION | 0x04,
}

impl TryFrom<u8> for FrameType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x20 => Ok(FrameType::Object),
            0x21 => Ok(FrameType::ObjectRequest),
            0x22 => Ok(FrameType::ObjectAck),
            0x23 => Ok(FrameType::Ack),
            0x24 => Ok(FrameType::Nack),
            other => Err(other),
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw message type byte (see [`FrameType`]).
    pub frame_type: u8,
    /// Total length as declared on the wire.
    pub length: u16,
    pub object_id: u32,
    pub instance_id: u16,
    pub data: Vec<u8>,
}

impl Frame {
    /// Build a frame; `length` is derived from `data`.
    pub fn new(frame_type: FrameType, object_id: u32, instance_id: u16, data: Vec<u8>) -> Self {
        let length = (MIN_FRAME_LENGTH + data.len()).min(u16::MAX as usize) as u16;
        Self {
            frame_type: frame_type as u8,
            length,
            object_id,
            instance_id,
            data,
        }
    }

    /// Decoded message type, if the type byte is a known one.
    pub fn message_type(&self) -> Option<FrameType> {
        FrameType::try_from(self.frame_type).ok()
    }

    /// Length this frame occupies once encoded.
    #[inline]
    pub fn wire_length(&self) -> usize {
        MIN_FRAME_LENGTH + self.data.len()
    }

    pub fn encode(&self) -> Result<Vec<u8>, RejectReason> {
        encode_frame(self)
    }
}

/// Decode one frame from the start of `buf`.
///
/// Bytes past the declared length are ignored.
pub fn decode_frame(buf: &[u8]) -> Result<Frame, RejectReason> {
    if buf.len() < HEADER_LENGTH {
        return Err(RejectReason::TruncatedHeader);
    }

    if buf[0] != SYNC {
        return Err(RejectReason::InvalidSync);
    }

    let length = u16::from_le_bytes([buf[2], buf[3]]);
    let len = length as usize;
    if !(MIN_FRAME_LENGTH..=MAX_FRAME_LENGTH).contains(&len) {
        return Err(RejectReason::LengthOutOfRange);
    }

    if buf.len() < len {
        return Err(RejectReason::Truncated);
    }

    if crc8(&buf[..len - CHECKSUM_LENGTH]) != buf[len - CHECKSUM_LENGTH] {
        return Err(RejectReason::ChecksumMismatch);
    }

    Ok(Frame {
        frame_type: buf[1],
        length,
        object_id: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        instance_id: u16::from_le_bytes([buf[8], buf[9]]),
        data: buf[HEADER_LENGTH..len - CHECKSUM_LENGTH].to_vec(),
    })
}

/// Encode `frame`, recomputing its length and checksum.
///
/// The `length` field of `frame` is ignored.
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>, RejectReason> {
    if frame.data.len() > MAX_PAYLOAD_LENGTH {
        return Err(RejectReason::LengthOutOfRange);
    }

    let total = frame.wire_length();
    let mut buf = Vec::with_capacity(total);
    buf.push(SYNC);
    buf.push(frame.frame_type);
    buf.extend_from_slice(&(total as u16).to_le_bytes());
    buf.extend_from_slice(&frame.object_id.to_le_bytes());
    buf.extend_from_slice(&frame.instance_id.to_le_bytes());
    buf.extend_from_slice(&frame.data);
    buf.push(crc8(&buf));

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(FrameType::Object, 0x1234_5678, 0, vec![0xAA])
    }

    #[test]
    fn test_encode_layout() {
        let bytes = sample().encode().unwrap();
        assert_eq!(
            bytes,
            vec![0x3C, 0x20, 12, 0, 0x78, 0x56, 0x34, 0x12, 0, 0, 0xAA, 0x95]
        );
    }

    #[test]
    fn test_decode_encode_roundtrip() {
        let frame = Frame::new(FrameType::ObjectAck, 0xDEAD_BEEE, 7, vec![1, 2, 3, 4, 5]);
        let bytes = encode_frame(&frame).unwrap();
        let decoded = decode_frame(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.message_type(), Some(FrameType::ObjectAck));
        assert_eq!(encode_frame(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_encode_ignores_forged_length() {
        let mut frame = sample();
        frame.length = 200;
        let decoded = decode_frame(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded.length, 12);
        assert_eq!(decoded.data, frame.data);
    }

    #[test]
    fn test_empty_payload() {
        let frame = Frame::new(FrameType::ObjectRequest, 42, 0, Vec::new());
        let bytes = frame.encode().unwrap();
        assert_eq!(bytes.len(), MIN_FRAME_LENGTH);
        assert_eq!(decode_frame(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_max_payload() {
        let frame = Frame::new(FrameType::Object, 2, 1, vec![0x55; MAX_PAYLOAD_LENGTH]);
        let bytes = frame.encode().unwrap();
        assert_eq!(bytes.len(), MAX_FRAME_LENGTH);
        assert_eq!(decode_frame(&bytes).unwrap(), frame);

        let too_big = Frame::new(FrameType::Object, 2, 1, vec![0x55; MAX_PAYLOAD_LENGTH + 1]);
        assert_eq!(too_big.encode(), Err(RejectReason::LengthOutOfRange));
    }

    #[test]
    fn test_reject_truncated_header() {
        assert_eq!(decode_frame(&[SYNC, 0x20, 12]), Err(RejectReason::TruncatedHeader));
        assert_eq!(decode_frame(&[]), Err(RejectReason::TruncatedHeader));
    }

    #[test]
    fn test_reject_invalid_sync() {
        assert_eq!(decode_frame(&[0u8; 10]), Err(RejectReason::InvalidSync));
    }

    #[test]
    fn test_reject_length_out_of_range() {
        let mut bytes = vec![0u8; 300];
        bytes[0] = SYNC;
        bytes[2..4].copy_from_slice(&300u16.to_le_bytes());
        assert_eq!(decode_frame(&bytes), Err(RejectReason::LengthOutOfRange));

        let mut short = sample().encode().unwrap();
        short[2] = 10;
        assert_eq!(decode_frame(&short), Err(RejectReason::LengthOutOfRange));
    }

    #[test]
    fn test_reject_truncated() {
        let bytes = Frame::new(FrameType::Object, 2, 0, vec![9; 20]).encode().unwrap();
        assert_eq!(decode_frame(&bytes[..25]), Err(RejectReason::Truncated));
    }

    #[test]
    fn test_reject_checksum_mismatch() {
        let mut bytes = sample().encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_eq!(decode_frame(&bytes), Err(RejectReason::ChecksumMismatch));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = sample().encode().unwrap();
        bytes.extend_from_slice(&[0xFF, 0xFF]);
        assert_eq!(decode_frame(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_unknown_type_byte_decodes() {
        let mut frame = sample();
        frame.frame_type = 0x7F;
        let decoded = decode_frame(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded.frame_type, 0x7F);
        assert_eq!(decoded.message_type(), None);
    }

    #[test]
    fn test_reject_reason_index() {
        for (i, reason) in RejectReason::ALL.iter().enumerate() {
            assert_eq!(reason.index(), i);
        }
    }
}
