//! Fuzzing entry points for reframe-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_header_decode

pub fn fuzz_header_decode(data: &[u8]) {
    use reframe_core::packet::{PacketErrorReport, VideoPacketHeader};

    // Try to decode - should never panic
    let _ = VideoPacketHeader::decode(data);
    let _ = PacketErrorReport::decode(data);
}

pub fn fuzz_queue_push(data: &[u8]) {
    use reframe_core::fec::FecQueue;

    // Split the input into pseudo-datagrams and feed them all - should
    // never panic, whatever the bytes say
    let mut queue = FecQueue::new();
    for chunk in data.chunks(97) {
        let _ = queue.push_packet(chunk);
        queue.try_reconstruct();
    }
    let _ = queue.frame();
}
