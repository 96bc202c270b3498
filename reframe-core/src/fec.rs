//! FEC reassembly queue
//!
//! Accumulates the shards of one video frame at a time into a growth-only
//! buffer and declares the frame recovered once every shard has arrived.
//! A shard for a newer frame abandons the one in flight; the queue never
//! signals abandonment to its caller, it only counts it. True erasure
//! recovery from a subset of shards is delegated to an [`ErasureDecoder`],
//! which the all-shards-required fast path never invokes.

use crate::buffer::FrameBuffer;
use crate::constants::{MAX_FRAME_SIZE, MAX_PACKET_SIZE, MAX_SHARD_PAYLOAD, VIDEO_HEADER_SIZE};
use crate::error::ProtocolError;
use crate::packet::VideoPacketHeader;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Outcome of feeding one datagram to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Shard accepted and copied into the frame buffer
    Accepted,
    /// Shard for an index already received; ignored
    Duplicate,
    /// Late shard of a frame that already recovered; ignored
    Stale,
}

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FecQueueStats {
    /// Frames fully reassembled
    pub frames_recovered: u64,
    /// Frames discarded because a newer frame's shard arrived first
    pub frames_abandoned: u64,
    /// Shards dropped as duplicates of an already-received index
    pub duplicate_shards: u64,
    /// Shards dropped as late arrivals for an already-recovered frame
    pub stale_shards: u64,
}

/// Reassembles video frames from out-of-order, lossy shard delivery
///
/// Single-writer, single-reader: shards arrive on the network-receive
/// thread, reconstruction and readout happen on the decode thread, with the
/// handoff synchronized externally. No operation blocks; steady-state work
/// is header decode, bookkeeping, and one payload copy.
#[derive(Debug)]
pub struct FecQueue {
    current: VideoPacketHeader,
    shard_count: u32,
    received_count: u32,
    missing: Vec<bool>,
    buffer: FrameBuffer,
    recovered: bool,
    stats: FecQueueStats,
}

/// Borrowed view of a recovered frame, valid until the next push
#[derive(Debug, Clone, Copy)]
pub struct RecoveredFrame<'a> {
    /// The reassembled frame payload, exactly `frame_byte_size` bytes
    pub bytes: &'a [u8],
    /// Frame identity correlated with the pose used to render it
    pub tracking_frame_index: u64,
    /// Monotonic frame sequence number
    pub video_frame_index: u64,
}

impl FecQueue {
    /// Create an empty queue
    ///
    /// The sentinel frame index guarantees the first real packet opens a
    /// new session.
    pub fn new() -> Self {
        Self {
            current: VideoPacketHeader {
                tracking_frame_index: 0,
                video_frame_index: u64::MAX,
                sent_time: 0,
                frame_byte_size: 0,
                fec_index: 0,
                packet_counter: 0,
            },
            shard_count: 0,
            received_count: 0,
            missing: Vec::new(),
            buffer: FrameBuffer::new(),
            recovered: true,
            stats: FecQueueStats::default(),
        }
    }

    /// Feed one datagram into the queue
    ///
    /// Decodes the header, opens a new session when the frame index changes
    /// (abandoning any unfinished frame), and copies the shard payload into
    /// its slot. Malformed input is rejected before any buffer write.
    pub fn push_packet(&mut self, datagram: &[u8]) -> Result<PushOutcome, ProtocolError> {
        if datagram.len() > MAX_PACKET_SIZE {
            return Err(ProtocolError::PacketTooLarge(datagram.len(), MAX_PACKET_SIZE));
        }
        let header = VideoPacketHeader::decode(datagram)?;
        if header.frame_byte_size > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge(
                header.frame_byte_size,
                MAX_FRAME_SIZE,
            ));
        }
        let payload = &datagram[VIDEO_HEADER_SIZE..];

        if self.recovered && self.current.video_frame_index == header.video_frame_index {
            self.stats.stale_shards += 1;
            return Ok(PushOutcome::Stale);
        }

        if self.current.video_frame_index != header.video_frame_index {
            if !self.recovered {
                self.stats.frames_abandoned += 1;
                #[cfg(feature = "logging")]
                debug!(
                    video_frame_index = self.current.video_frame_index,
                    received = self.received_count,
                    expected = self.shard_count,
                    "abandoning incomplete frame"
                );
            }

            self.current = header;
            self.recovered = false;
            self.shard_count = header.shard_count();
            self.received_count = 0;
            self.missing.clear();
            self.missing.resize(self.shard_count as usize, true);
            self.buffer.prepare(header.frame_byte_size as usize);
        }

        if header.fec_index >= self.shard_count {
            return Err(ProtocolError::ShardOutOfBounds {
                index: header.fec_index,
                count: self.shard_count,
            });
        }

        if !self.missing[header.fec_index as usize] {
            self.stats.duplicate_shards += 1;
            #[cfg(feature = "logging")]
            debug!(
                packet_counter = header.packet_counter,
                fec_index = header.fec_index,
                "duplicate shard"
            );
            return Ok(PushOutcome::Duplicate);
        }

        self.buffer
            .write_at(header.fec_index as usize * MAX_SHARD_PAYLOAD, payload)?;
        self.missing[header.fec_index as usize] = false;
        self.received_count += 1;

        Ok(PushOutcome::Accepted)
    }

    /// Attempt to declare the active frame recovered
    ///
    /// Returns `false` if the frame already recovered (so callers do not
    /// repeat recovery work) or if shards are still missing. All shards are
    /// required; a failed attempt leaves state untouched so later shards can
    /// still complete the frame.
    pub fn try_reconstruct(&mut self) -> bool {
        if self.recovered {
            return false;
        }
        if self.received_count < self.shard_count {
            return false;
        }

        self.recovered = true;
        self.stats.frames_recovered += 1;
        #[cfg(feature = "logging")]
        trace!(
            tracking_frame_index = self.current.tracking_frame_index,
            "frame recovered"
        );
        true
    }

    /// The recovered frame, if the active frame has been reassembled
    ///
    /// The view borrows the queue's buffer: consume it before pushing the
    /// next frame's shards.
    pub fn frame(&self) -> Option<RecoveredFrame<'_>> {
        if !self.recovered || self.current.video_frame_index == u64::MAX {
            return None;
        }
        Some(RecoveredFrame {
            bytes: self.buffer.valid(),
            tracking_frame_index: self.current.tracking_frame_index,
            video_frame_index: self.current.video_frame_index,
        })
    }

    /// Total byte size of the active frame
    pub fn frame_byte_size(&self) -> u32 {
        self.current.frame_byte_size
    }

    /// Diagnostics counters
    pub fn stats(&self) -> FecQueueStats {
        self.stats
    }
}

impl Default for FecQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for reconstructing missing data shards from parity shards
///
/// `shards` holds `data_count` data shards followed by parity shards, all of
/// equal length; `None` entries are missing. Implementations fill in the
/// missing data shards in place.
pub trait ErasureDecoder {
    /// Reconstruct missing data shards in place
    fn reconstruct(
        &self,
        shards: &mut [Option<Vec<u8>>],
        data_count: usize,
    ) -> Result<(), ProtocolError>;

    /// Check whether `present` shards are enough to reconstruct `data_count`
    /// data shards
    fn can_reconstruct(&self, present: usize, data_count: usize) -> bool;
}

/// Default decoder for builds without an erasure backend
#[derive(Debug, Clone)]
pub struct NoopErasureDecoder;

impl ErasureDecoder for NoopErasureDecoder {
    fn reconstruct(
        &self,
        _shards: &mut [Option<Vec<u8>>],
        _data_count: usize,
    ) -> Result<(), ProtocolError> {
        Err(ProtocolError::ErasureDecode(
            "no erasure backend compiled in".to_string(),
        ))
    }

    fn can_reconstruct(&self, _present: usize, _data_count: usize) -> bool {
        false
    }
}

/// Systematic Reed-Solomon decoder over byte shards
#[cfg(feature = "fec-rs")]
#[derive(Debug, Clone)]
pub struct ReedSolomonDecoder {
    parity_count: usize,
}

#[cfg(feature = "fec-rs")]
impl ReedSolomonDecoder {
    /// Create a decoder expecting `parity_count` parity shards per frame
    pub fn new(parity_count: usize) -> Self {
        Self { parity_count }
    }
}

#[cfg(feature = "fec-rs")]
impl ErasureDecoder for ReedSolomonDecoder {
    fn reconstruct(
        &self,
        shards: &mut [Option<Vec<u8>>],
        data_count: usize,
    ) -> Result<(), ProtocolError> {
        use reed_solomon_erasure::galois_8::ReedSolomon;

        let rs = ReedSolomon::new(data_count, self.parity_count)
            .map_err(|e| ProtocolError::ErasureDecode(format!("{e:?}")))?;
        rs.reconstruct_data(shards)
            .map_err(|e| ProtocolError::ErasureDecode(format!("{e:?}")))
    }

    fn can_reconstruct(&self, present: usize, data_count: usize) -> bool {
        present >= data_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::ShardSender;

    fn shards_for(frame: &[u8], tracking_index: u64) -> Vec<Vec<u8>> {
        let mut sender = ShardSender::new();
        let mut shards = Vec::new();
        sender.send_frame(frame, tracking_index, 0, |d| shards.push(d.to_vec()));
        shards
    }

    #[test]
    fn single_shard_frame_recovers() {
        let frame = vec![7u8; 100];
        let shards = shards_for(&frame, 5);
        assert_eq!(shards.len(), 1);

        let mut queue = FecQueue::new();
        assert_eq!(queue.push_packet(&shards[0]).unwrap(), PushOutcome::Accepted);
        assert!(queue.try_reconstruct());

        let recovered = queue.frame().unwrap();
        assert_eq!(recovered.bytes, &frame[..]);
        assert_eq!(recovered.tracking_frame_index, 5);
        assert_eq!(recovered.video_frame_index, 0);
    }

    #[test]
    fn out_of_order_delivery_recovers() {
        let frame: Vec<u8> = (0..MAX_SHARD_PAYLOAD * 3 + 17).map(|i| i as u8).collect();
        let shards = shards_for(&frame, 1);
        assert_eq!(shards.len(), 4);

        let mut queue = FecQueue::new();
        for idx in [2usize, 0, 3, 1] {
            assert_eq!(queue.push_packet(&shards[idx]).unwrap(), PushOutcome::Accepted);
        }
        assert!(queue.try_reconstruct());
        assert_eq!(queue.frame().unwrap().bytes, &frame[..]);
    }

    #[test]
    fn duplicate_shard_leaves_count_unchanged() {
        let frame = vec![1u8; MAX_SHARD_PAYLOAD * 2];
        let shards = shards_for(&frame, 1);

        let mut queue = FecQueue::new();
        queue.push_packet(&shards[0]).unwrap();
        assert_eq!(queue.push_packet(&shards[0]).unwrap(), PushOutcome::Duplicate);
        assert_eq!(queue.stats().duplicate_shards, 1);

        // Still incomplete: shards 1 and 2 missing.
        assert!(!queue.try_reconstruct());
    }

    #[test]
    fn incomplete_frame_never_reconstructs() {
        let frame = vec![2u8; MAX_SHARD_PAYLOAD * 3];
        let shards = shards_for(&frame, 1);
        assert_eq!(shards.len(), 4);

        let mut queue = FecQueue::new();
        for shard in &shards[..3] {
            queue.push_packet(shard).unwrap();
        }
        assert!(!queue.try_reconstruct());
        assert!(!queue.try_reconstruct());
        assert!(queue.frame().is_none());
    }

    #[test]
    fn new_frame_abandons_incomplete_one() {
        let frame_a = vec![3u8; MAX_SHARD_PAYLOAD * 2];
        let frame_b = vec![4u8; 50];

        let mut sender = ShardSender::new();
        let mut shards_a = Vec::new();
        sender.send_frame(&frame_a, 1, 0, |d| shards_a.push(d.to_vec()));
        let mut shards_b = Vec::new();
        sender.send_frame(&frame_b, 2, 0, |d| shards_b.push(d.to_vec()));

        let mut queue = FecQueue::new();
        queue.push_packet(&shards_a[0]).unwrap();
        queue.push_packet(&shards_b[0]).unwrap();
        assert_eq!(queue.stats().frames_abandoned, 1);

        // Session now belongs to frame B with a fresh shard table.
        assert!(queue.try_reconstruct());
        let recovered = queue.frame().unwrap();
        assert_eq!(recovered.video_frame_index, 1);
        assert_eq!(recovered.bytes, &frame_b[..]);
    }

    #[test]
    fn late_shard_of_recovered_frame_is_stale() {
        let frame = vec![5u8; 100];
        let shards = shards_for(&frame, 1);

        let mut queue = FecQueue::new();
        queue.push_packet(&shards[0]).unwrap();
        assert!(queue.try_reconstruct());
        assert!(!queue.try_reconstruct());

        assert_eq!(queue.push_packet(&shards[0]).unwrap(), PushOutcome::Stale);
        assert_eq!(queue.stats().stale_shards, 1);
    }

    #[test]
    fn out_of_bounds_shard_index_rejected() {
        let frame = vec![6u8; 100];
        let shards = shards_for(&frame, 1);

        let mut header = VideoPacketHeader::decode(&shards[0]).unwrap();
        header.fec_index = 9;
        let mut forged = bytes::BytesMut::new();
        header.encode_into(&mut forged);
        forged.extend_from_slice(&shards[0][VIDEO_HEADER_SIZE..]);

        let mut queue = FecQueue::new();
        let err = queue.push_packet(&forged).unwrap_err();
        assert_eq!(err, ProtocolError::ShardOutOfBounds { index: 9, count: 1 });

        // The valid shard still completes the frame.
        queue.push_packet(&shards[0]).unwrap();
        assert!(queue.try_reconstruct());
    }

    #[test]
    fn oversized_frame_claim_rejected_before_allocation() {
        let mut header = VideoPacketHeader {
            tracking_frame_index: 0,
            video_frame_index: 1,
            sent_time: 0,
            frame_byte_size: u32::MAX,
            fec_index: 0,
            packet_counter: 0,
        };
        let mut forged = bytes::BytesMut::new();
        header.encode_into(&mut forged);

        let mut queue = FecQueue::new();
        let err = queue.push_packet(&forged).unwrap_err();
        assert_eq!(err, ProtocolError::FrameTooLarge(u32::MAX, MAX_FRAME_SIZE));

        // The queue holds no session for the rejected frame.
        header.frame_byte_size = 10;
        let mut valid = bytes::BytesMut::new();
        header.encode_into(&mut valid);
        valid.extend_from_slice(&[0u8; 10]);
        queue.push_packet(&valid).unwrap();
        assert!(queue.try_reconstruct());
    }

    #[test]
    fn empty_frame_recovers() {
        let shards = shards_for(&[], 1);
        assert_eq!(shards.len(), 1);

        let mut queue = FecQueue::new();
        queue.push_packet(&shards[0]).unwrap();
        assert!(queue.try_reconstruct());
        assert!(queue.frame().unwrap().bytes.is_empty());
    }

    #[test]
    fn noop_decoder_declines() {
        let decoder = NoopErasureDecoder;
        assert!(!decoder.can_reconstruct(10, 4));
        let mut shards = vec![Some(vec![0u8; 8]), None];
        assert!(decoder.reconstruct(&mut shards, 2).is_err());
    }

    #[cfg(feature = "fec-rs")]
    #[test]
    fn reed_solomon_decoder_recovers_missing_shard() {
        use reed_solomon_erasure::galois_8::ReedSolomon;

        let rs = ReedSolomon::new(3, 2).unwrap();
        let mut shards: Vec<Vec<u8>> = vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![9, 10, 11, 12],
            vec![0; 4],
            vec![0; 4],
        ];
        rs.encode(&mut shards).unwrap();

        let mut received: Vec<Option<Vec<u8>>> = shards.iter().cloned().map(Some).collect();
        received[1] = None;

        let decoder = ReedSolomonDecoder::new(2);
        assert!(decoder.can_reconstruct(4, 3));
        decoder.reconstruct(&mut received, 3).unwrap();
        assert_eq!(received[1].as_deref(), Some(&[5u8, 6, 7, 8][..]));
    }
}
