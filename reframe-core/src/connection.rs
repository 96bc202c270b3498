//! Connection-level loss handling and shared tracking state
//!
//! The transport reports lost packet-counter ranges out of band. A lost
//! video range means the reassembly queue will never complete the affected
//! frame, so the application is told to request a key-frame refresh; the
//! queue itself stays silent about abandonment. The latest predicted head
//! pose is the one piece of cross-thread state the connection shares
//! between the tracking and render threads.

use crate::error::ProtocolError;
use crate::packet::{LostFrameType, PacketErrorReport};
use crate::pose::Pose;
use std::sync::Mutex;

#[cfg(feature = "logging")]
use tracing::debug;

/// Latest predicted head pose, shared between threads
#[derive(Debug, Default)]
pub struct SharedPose {
    inner: Mutex<Option<Pose>>,
}

impl SharedPose {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored pose
    pub fn set(&self, pose: Pose) {
        *self.inner.lock().expect("pose lock poisoned") = Some(pose);
    }

    /// Copy of the most recently stored pose
    pub fn latest(&self) -> Option<Pose> {
        *self.inner.lock().expect("pose lock poisoned")
    }
}

/// Dispatches transport loss reports to the FEC-failure callback
pub struct LossReporter {
    on_fec_failure: Box<dyn FnMut() + Send>,
}

impl LossReporter {
    /// Create a reporter; `on_fec_failure` fires once per lost video range
    /// so the application can request a key frame
    pub fn new(on_fec_failure: Box<dyn FnMut() + Send>) -> Self {
        Self { on_fec_failure }
    }

    /// Decode and dispatch one loss-report datagram
    pub fn handle_report(&mut self, datagram: &[u8]) -> Result<PacketErrorReport, ProtocolError> {
        let report = PacketErrorReport::decode(datagram)?;

        #[cfg(feature = "logging")]
        debug!(
            lost_frame_type = ?report.lost_frame_type,
            from = report.from_packet_counter,
            to = report.to_packet_counter,
            "packet loss reported"
        );

        if report.lost_frame_type == LostFrameType::Video {
            (self.on_fec_failure)();
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn report_datagram(lost: LostFrameType) -> Vec<u8> {
        PacketErrorReport {
            lost_frame_type: lost,
            from_packet_counter: 10,
            to_packet_counter: 12,
        }
        .encode()
        .to_vec()
    }

    #[test]
    fn video_loss_fires_callback() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let mut reporter = LossReporter::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        reporter.handle_report(&report_datagram(LostFrameType::Video)).unwrap();
        reporter.handle_report(&report_datagram(LostFrameType::Video)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn non_video_loss_does_not_fire() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let mut reporter = LossReporter::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        reporter.handle_report(&report_datagram(LostFrameType::Audio)).unwrap();
        reporter.handle_report(&report_datagram(LostFrameType::Tracking)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_report_is_an_error() {
        let mut reporter = LossReporter::new(Box::new(|| {}));
        assert!(reporter.handle_report(&[0u8; 3]).is_err());
    }

    #[test]
    fn shared_pose_returns_latest() {
        let shared = SharedPose::new();
        assert!(shared.latest().is_none());

        let mut pose = Pose::default();
        pose.position = [1.0, 2.0, 3.0];
        shared.set(pose);
        assert_eq!(shared.latest(), Some(pose));
    }
}
