//! Constants and limits for the Reframe shard protocol

/// Largest datagram the transport is expected to deliver (UDP-safe budget)
pub const MAX_PACKET_SIZE: usize = 1400;

/// Size of the fixed video packet header in bytes
/// 4 (type) + 8 (tracking index) + 8 (video index) + 8 (sent time)
/// + 4 (frame size) + 4 (fec index) + 4 (packet counter) = 40 bytes
pub const VIDEO_HEADER_SIZE: usize = 40;

/// Largest shard payload a single video packet can carry
pub const MAX_SHARD_PAYLOAD: usize = MAX_PACKET_SIZE - VIDEO_HEADER_SIZE;

/// Maximum byte size of one video frame (16 MB)
///
/// An inbound header claiming more is rejected before any allocation.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Size of a packet error report in bytes
/// 4 (type) + 4 (lost frame type) + 4 (from counter) + 4 (to counter) = 16 bytes
pub const ERROR_REPORT_SIZE: usize = 16;

/// Number of frames the reprojection engine must observe before it has a
/// valid motion-estimation reference
pub const WARMUP_FRAMES: u32 = 2;

/// Admission window before the display deadline in which an extrapolated
/// frame is submitted, in microseconds
pub const REPROJECT_LOOKAHEAD_US: u64 = 2000;

/// Microseconds per second, for refresh-rate to frame-interval conversion
pub const MICROS_PER_SEC: u64 = 1_000_000;
