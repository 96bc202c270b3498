//! Wire format for the shard transport
//!
//! Every datagram starts with a little-endian `u32` packet type. Video
//! packets carry a fixed 40-byte header followed by one shard of the frame
//! payload; error reports are header-only. Decoding is explicit and
//! bounds-checked: a truncated or mistyped datagram is a decode error, never
//! a silent reinterpretation.

use crate::constants::{ERROR_REPORT_SIZE, MAX_PACKET_SIZE, MAX_SHARD_PAYLOAD, VIDEO_HEADER_SIZE};
use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Packet type discriminant carried in the first four bytes of a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum PacketType {
    /// One shard of a video frame
    VideoFrame = 9,
    /// Transport-level report of a lost packet-counter range
    PacketErrorReport = 12,
}

impl PacketType {
    /// Decode a wire discriminant
    pub fn from_wire(raw: u32) -> Result<Self, ProtocolError> {
        match raw {
            9 => Ok(PacketType::VideoFrame),
            12 => Ok(PacketType::PacketErrorReport),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }
}

/// Which stream a loss report refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum LostFrameType {
    /// Video shard loss; triggers the FEC-failure path
    Video = 0,
    /// Audio loss, recovered by concealment upstream
    Audio = 1,
    /// Tracking loss, superseded by the next tracking packet
    Tracking = 2,
}

impl LostFrameType {
    fn from_wire(raw: u32) -> Result<Self, ProtocolError> {
        match raw {
            0 => Ok(LostFrameType::Video),
            1 => Ok(LostFrameType::Audio),
            2 => Ok(LostFrameType::Tracking),
            other => Err(ProtocolError::UnknownLostFrameType(other)),
        }
    }
}

/// Fixed-layout header of a video shard packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPacketHeader {
    /// Frame identity correlated with the pose used to render it
    pub tracking_frame_index: u64,

    /// Monotonic frame sequence number, distinct from the tracking index
    pub video_frame_index: u64,

    /// Sender timestamp in microseconds
    pub sent_time: u64,

    /// Total decoded payload size of the whole frame in bytes
    pub frame_byte_size: u32,

    /// 0-based shard position within the frame
    pub fec_index: u32,

    /// Global send-order counter across all video packets
    pub packet_counter: u32,
}

impl VideoPacketHeader {
    /// Decode a header from the front of a datagram
    pub fn decode(mut data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < VIDEO_HEADER_SIZE {
            return Err(ProtocolError::TruncatedHeader {
                expected: VIDEO_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let packet_type = PacketType::from_wire(data.get_u32_le())?;
        if packet_type != PacketType::VideoFrame {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: PacketType::VideoFrame,
                actual: packet_type,
            });
        }

        Ok(Self {
            tracking_frame_index: data.get_u64_le(),
            video_frame_index: data.get_u64_le(),
            sent_time: data.get_u64_le(),
            frame_byte_size: data.get_u32_le(),
            fec_index: data.get_u32_le(),
            packet_counter: data.get_u32_le(),
        })
    }

    /// Append the encoded header to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u32_le(PacketType::VideoFrame as u32);
        buf.put_u64_le(self.tracking_frame_index);
        buf.put_u64_le(self.video_frame_index);
        buf.put_u64_le(self.sent_time);
        buf.put_u32_le(self.frame_byte_size);
        buf.put_u32_le(self.fec_index);
        buf.put_u32_le(self.packet_counter);
    }

    /// Number of shards the frame is split into
    ///
    /// Integer division plus one trailing shard for the remainder; the
    /// sender always emits at least one shard even for an empty frame.
    pub fn shard_count(&self) -> u32 {
        self.frame_byte_size / MAX_SHARD_PAYLOAD as u32 + 1
    }
}

/// A decoded video packet: header plus the shard payload it carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPacket {
    /// Decoded header
    pub header: VideoPacketHeader,
    /// Shard payload bytes (everything after the header)
    pub payload: Bytes,
}

impl VideoPacket {
    /// Decode a complete datagram
    pub fn decode(datagram: &[u8]) -> Result<Self, ProtocolError> {
        if datagram.len() > MAX_PACKET_SIZE {
            return Err(ProtocolError::PacketTooLarge(datagram.len(), MAX_PACKET_SIZE));
        }
        let header = VideoPacketHeader::decode(datagram)?;
        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(&datagram[VIDEO_HEADER_SIZE..]),
        })
    }

    /// Encode into a single datagram
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(VIDEO_HEADER_SIZE + self.payload.len());
        self.header.encode_into(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

/// Transport-level report of a lost packet-counter range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketErrorReport {
    /// Which stream lost packets
    pub lost_frame_type: LostFrameType,
    /// First packet counter in the lost range
    pub from_packet_counter: u32,
    /// Last packet counter in the lost range
    pub to_packet_counter: u32,
}

impl PacketErrorReport {
    /// Decode a report datagram
    pub fn decode(mut data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < ERROR_REPORT_SIZE {
            return Err(ProtocolError::TruncatedHeader {
                expected: ERROR_REPORT_SIZE,
                actual: data.len(),
            });
        }

        let packet_type = PacketType::from_wire(data.get_u32_le())?;
        if packet_type != PacketType::PacketErrorReport {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: PacketType::PacketErrorReport,
                actual: packet_type,
            });
        }

        Ok(Self {
            lost_frame_type: LostFrameType::from_wire(data.get_u32_le())?,
            from_packet_counter: data.get_u32_le(),
            to_packet_counter: data.get_u32_le(),
        })
    }

    /// Encode into a datagram
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ERROR_REPORT_SIZE);
        buf.put_u32_le(PacketType::PacketErrorReport as u32);
        buf.put_u32_le(self.lost_frame_type as u32);
        buf.put_u32_le(self.from_packet_counter);
        buf.put_u32_le(self.to_packet_counter);
        buf.freeze()
    }
}

/// Splits rendered frames into shard datagrams for the transport
///
/// Stamps every shard of a frame with the same header fields, incrementing
/// only `fec_index` within the frame and the global `packet_counter` across
/// all shards. Emits exactly `shard_count` shards per frame so the receiver
/// side can count completeness: the trailing shard carries the remainder and
/// may be empty.
#[derive(Debug, Default)]
pub struct ShardSender {
    video_frame_index: u64,
    packet_counter: u32,
}

impl ShardSender {
    /// Create a sender starting at frame index 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Shard one frame and hand each encoded datagram to `transmit`
    pub fn send_frame<F>(
        &mut self,
        frame: &[u8],
        tracking_frame_index: u64,
        sent_time: u64,
        mut transmit: F,
    ) where
        F: FnMut(&[u8]),
    {
        let mut header = VideoPacketHeader {
            tracking_frame_index,
            video_frame_index: self.video_frame_index,
            sent_time,
            frame_byte_size: frame.len() as u32,
            fec_index: 0,
            packet_counter: 0,
        };
        let shard_count = header.shard_count();

        let mut buf = BytesMut::with_capacity(MAX_PACKET_SIZE);
        for fec_index in 0..shard_count {
            let offset = (fec_index as usize * MAX_SHARD_PAYLOAD).min(frame.len());
            let end = (offset + MAX_SHARD_PAYLOAD).min(frame.len());

            header.fec_index = fec_index;
            header.packet_counter = self.packet_counter;
            self.packet_counter = self.packet_counter.wrapping_add(1);

            buf.clear();
            header.encode_into(&mut buf);
            buf.put_slice(&frame[offset..end]);
            transmit(&buf);
        }

        self.video_frame_index += 1;
    }

    /// Frame index the next call to [`send_frame`](Self::send_frame) will use
    pub fn next_frame_index(&self) -> u64 {
        self.video_frame_index
    }
}
