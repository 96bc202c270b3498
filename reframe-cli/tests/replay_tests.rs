//! Integration tests for the replay and inspect commands

use reframe_cli::commands::{inspect, replay, write_dump};
use reframe_core::packet::{LostFrameType, PacketErrorReport, ShardSender};

fn capture_dump(frames: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut sender = ShardSender::new();
    let mut datagrams = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        sender.send_frame(frame, i as u64, 0, |d| datagrams.push(d.to_vec()));
    }
    datagrams
}

#[test]
fn replay_clean_dump_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clean.dump");
    let path = path.to_str().unwrap();

    let datagrams = capture_dump(&[vec![1u8; 5000], vec![2u8; 70_000], vec![3u8; 100]]);
    write_dump(path, &datagrams).unwrap();

    replay::execute(path, false).unwrap();
    replay::execute(path, true).unwrap();
}

#[test]
fn replay_tolerates_foreign_and_damaged_packets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.dump");
    let path = path.to_str().unwrap();

    let mut datagrams = capture_dump(&[vec![1u8; 5000]]);
    datagrams.push(
        PacketErrorReport {
            lost_frame_type: LostFrameType::Video,
            from_packet_counter: 1,
            to_packet_counter: 2,
        }
        .encode()
        .to_vec(),
    );
    datagrams.push(vec![0xFF; 10]);
    write_dump(path, &datagrams).unwrap();

    // Non-video datagrams count as decode errors, not failures.
    replay::execute(path, true).unwrap();
}

#[test]
fn inspect_reports_every_packet_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kinds.dump");
    let path = path.to_str().unwrap();

    let mut datagrams = capture_dump(&[vec![7u8; 3000]]);
    datagrams.push(
        PacketErrorReport {
            lost_frame_type: LostFrameType::Audio,
            from_packet_counter: 5,
            to_packet_counter: 6,
        }
        .encode()
        .to_vec(),
    );
    datagrams.push(vec![1, 2, 3]);
    write_dump(path, &datagrams).unwrap();

    inspect::execute(path, false).unwrap();
    inspect::execute(path, true).unwrap();
}

#[test]
fn replay_missing_file_fails() {
    assert!(replay::execute("/nonexistent/never.dump", false).is_err());
}
