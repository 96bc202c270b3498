//! # Reframe Core
//!
//! Client-side resilience layer for a real-time video streaming pipeline:
//! reassembles video frames from lossy, unordered shard delivery and
//! reprojects stale frames to the display's predicted deadline.
//!
//! ## Modules
//!
//! - `constants`: Protocol limits and timing constants
//! - `packet`: Wire format (video shards, loss reports, sender-side sharding)
//! - `buffer`: Growth-only frame buffer
//! - `fec`: Shard reassembly queue and erasure-decoder extension point
//! - `pose`: Quaternion and pose extrapolation math
//! - `render`: Opaque GPU capability consumed by reprojection
//! - `reproject`: Motion-compensated reprojection state machine
//! - `connection`: Loss-report dispatch and shared tracking state

#![warn(missing_docs)]

pub mod buffer;
pub mod connection;
pub mod constants;
pub mod error;
pub mod fec;
pub mod packet;
pub mod pose;
pub mod render;
pub mod reproject;

// Re-export commonly used types
pub use error::ProtocolError;
pub use fec::{FecQueue, PushOutcome, RecoveredFrame};
pub use packet::{PacketErrorReport, ShardSender, VideoPacket, VideoPacketHeader};
pub use pose::{Pose, Quaternion};
pub use reproject::{Reprojector, ReprojectorConfig};

/// Result type alias for Reframe operations
pub type Result<T> = core::result::Result<T, ProtocolError>;
