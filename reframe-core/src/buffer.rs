//! Growth-only frame buffer
//!
//! The reassembly queue receives a new frame every few milliseconds on a hot
//! network-receive path, so the buffer backing the active frame only ever
//! reallocates on growth. Shrinking never happens; the valid length tracks
//! the active frame's byte size independently of capacity.

use crate::error::ProtocolError;

/// Byte buffer that only reallocates when a frame larger than any seen
/// before arrives
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
    valid_len: usize,
}

impl FrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new frame of `len` bytes: grow if needed, zero the valid
    /// region, and set the valid length
    ///
    /// Zeroing guarantees unreceived shard regions read as zero if the frame
    /// is handed off without full data.
    pub fn prepare(&mut self, len: usize) {
        if self.data.len() < len {
            self.data.resize(len, 0);
        }
        self.data[..len].fill(0);
        self.valid_len = len;
    }

    /// Copy `bytes` into the valid region at `offset`, rejecting writes that
    /// would land outside the active frame
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), ProtocolError> {
        let end = offset.checked_add(bytes.len()).ok_or(ProtocolError::ShardOverrun {
            offset,
            len: bytes.len(),
            frame_len: self.valid_len,
        })?;
        if end > self.valid_len {
            return Err(ProtocolError::ShardOverrun {
                offset,
                len: bytes.len(),
                frame_len: self.valid_len,
            });
        }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// View of the active frame's bytes
    pub fn valid(&self) -> &[u8] {
        &self.data[..self.valid_len]
    }

    /// Bytes currently allocated (never decreases)
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_zeroes_valid_region() {
        let mut buf = FrameBuffer::new();
        buf.prepare(8);
        buf.write_at(0, &[0xAA; 8]).unwrap();
        buf.prepare(4);
        assert_eq!(buf.valid(), &[0, 0, 0, 0]);
    }

    #[test]
    fn capacity_only_grows() {
        let mut buf = FrameBuffer::new();
        buf.prepare(1024);
        assert_eq!(buf.capacity(), 1024);
        buf.prepare(16);
        assert_eq!(buf.capacity(), 1024);
        assert_eq!(buf.valid().len(), 16);
        buf.prepare(4096);
        assert_eq!(buf.capacity(), 4096);
    }

    #[test]
    fn write_past_valid_region_rejected() {
        let mut buf = FrameBuffer::new();
        buf.prepare(10);
        assert!(buf.write_at(8, &[1, 2]).is_ok());
        let err = buf.write_at(9, &[1, 2]).unwrap_err();
        assert!(matches!(err, ProtocolError::ShardOverrun { frame_len: 10, .. }));
    }

    #[test]
    fn zero_length_write_at_end_is_ok() {
        let mut buf = FrameBuffer::new();
        buf.prepare(10);
        assert!(buf.write_at(10, &[]).is_ok());
    }
}
