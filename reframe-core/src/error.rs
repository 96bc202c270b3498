//! Error types for Reframe protocol operations

use thiserror::Error;

/// Errors that can occur while decoding packets or reassembling frames
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet too short to hold the fixed header
    #[error("truncated header: expected {expected} bytes, got {actual}")]
    TruncatedHeader {
        /// The number of bytes the header requires.
        expected: usize,
        /// The number of bytes actually present.
        actual: usize,
    },

    /// Wire type field did not match any known packet type
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u32),

    /// Wire type field named a known but unexpected packet type
    #[error("unexpected packet type: expected {expected:?}, got {actual:?}")]
    UnexpectedPacketType {
        /// The packet type this decoder handles.
        expected: crate::packet::PacketType,
        /// The packet type found on the wire.
        actual: crate::packet::PacketType,
    },

    /// Unknown lost-frame discriminant in an error report
    #[error("unknown lost frame type: {0}")]
    UnknownLostFrameType(u32),

    /// Datagram exceeds the transport budget
    #[error("packet size {0} exceeds maximum {1}")]
    PacketTooLarge(usize, usize),

    /// Header claims a frame larger than the protocol allows
    #[error("frame size {0} exceeds maximum {1}")]
    FrameTooLarge(u32, u32),

    /// Shard index falls outside the active frame's shard table
    #[error("shard index {index} out of bounds for frame with {count} shards")]
    ShardOutOfBounds {
        /// The shard index claimed by the packet header.
        index: u32,
        /// The number of shards the active frame has.
        count: u32,
    },

    /// Shard payload would overrun its slot in the frame buffer
    #[error("write of {len} bytes at offset {offset} overruns frame of {frame_len} bytes")]
    ShardOverrun {
        /// Byte offset of the write.
        offset: usize,
        /// Length of the write.
        len: usize,
        /// Total size of the frame being assembled.
        frame_len: usize,
    },

    /// Erasure decoding failed or is unavailable
    #[error("erasure decode failed: {0}")]
    ErasureDecode(String),
}
