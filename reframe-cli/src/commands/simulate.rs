use anyhow::{ensure, Context, Result};
use colored::Colorize;
use rand::{Rng, SeedableRng};
use reframe_core::connection::LossReporter;
use reframe_core::fec::FecQueue;
use reframe_core::packet::{LostFrameType, PacketErrorReport, ShardSender, VideoPacketHeader};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct SimulationSummary {
    frames_sent: usize,
    shards_sent: usize,
    shards_dropped: usize,
    shards_reordered: usize,
    frames_recovered: u64,
    frames_lost: usize,
    keyframe_requests: u64,
    recovery_rate: f64,
}

/// Generate a synthetic shard stream, damage it, and measure how the
/// reassembly queue holds up.
pub fn execute(
    frames: usize,
    frame_size: usize,
    loss_pct: f64,
    reorder_pct: f64,
    seed: u64,
    json: bool,
) -> Result<()> {
    ensure!(frames > 0, "need at least one frame to simulate");
    ensure!(
        (0.0..=100.0).contains(&loss_pct) && (0.0..=100.0).contains(&reorder_pct),
        "loss and reorder are percentages in 0..=100"
    );

    info!(
        "Simulating {} frames of {} bytes (loss {}%, reorder {}%, seed {})",
        frames, frame_size, loss_pct, reorder_pct, seed
    );

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    // Shard every frame; payload bytes are per-frame random noise.
    let mut sender = ShardSender::new();
    let mut stream: Vec<Vec<u8>> = Vec::new();
    for tracking_index in 0..frames as u64 {
        let mut frame = vec![0u8; frame_size];
        rng.fill(&mut frame[..]);
        sender.send_frame(&frame, tracking_index, tracking_index * 16_000, |d| {
            stream.push(d.to_vec())
        });
    }
    let shards_sent = stream.len();

    // Damage the stream: drop shards, then locally reorder survivors.
    let mut delivered: Vec<Vec<u8>> = Vec::with_capacity(stream.len());
    let mut shards_dropped = 0usize;
    for shard in stream {
        if rng.gen_range(0.0..100.0) < loss_pct {
            shards_dropped += 1;
        } else {
            delivered.push(shard);
        }
    }
    // Window-2 swaps model link jitter without tearing whole frames apart.
    let mut shards_reordered = 0usize;
    let mut i = 0;
    while i + 1 < delivered.len() {
        if rng.gen_range(0.0..100.0) < reorder_pct {
            delivered.swap(i, i + 1);
            shards_reordered += 1;
            i += 2;
        } else {
            i += 1;
        }
    }

    // Receive side: queue plus the loss-report path a real client runs.
    let keyframe_requests = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&keyframe_requests);
    let mut reporter = LossReporter::new(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut queue = FecQueue::new();
    let mut recovered_indices = Vec::new();
    let mut last_counter: Option<u32> = None;
    for datagram in &delivered {
        let header = VideoPacketHeader::decode(datagram)
            .context("simulated datagram failed to decode")?;

        // Transport-level gap detection feeds the loss reporter.
        if let Some(prev) = last_counter {
            if header.packet_counter > prev + 1 {
                let report = PacketErrorReport {
                    lost_frame_type: LostFrameType::Video,
                    from_packet_counter: prev + 1,
                    to_packet_counter: header.packet_counter - 1,
                };
                reporter
                    .handle_report(&report.encode())
                    .context("loss report failed to decode")?;
            }
        }
        last_counter = Some(header.packet_counter.max(last_counter.unwrap_or(0)));

        queue.push_packet(datagram)?;
        if queue.try_reconstruct() {
            recovered_indices.push(queue.frame().expect("recovered").video_frame_index);
        }
    }

    let stats = queue.stats();
    let summary = SimulationSummary {
        frames_sent: frames,
        shards_sent,
        shards_dropped,
        shards_reordered,
        frames_recovered: stats.frames_recovered,
        frames_lost: frames - stats.frames_recovered as usize,
        keyframe_requests: keyframe_requests.load(Ordering::SeqCst),
        recovery_rate: stats.frames_recovered as f64 / frames as f64 * 100.0,
    };

    if json {
        let out = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize simulation summary")?;
        println!("{}", out);
        return Ok(());
    }

    println!("\n=== Simulation Results ===");
    println!("Frames sent:        {}", summary.frames_sent);
    println!("Shards sent:        {}", summary.shards_sent);
    println!("Shards dropped:     {}", summary.shards_dropped);
    println!("Shards reordered:   {}", summary.shards_reordered);
    println!(
        "Frames recovered:   {}",
        summary.frames_recovered.to_string().green()
    );
    println!(
        "Frames lost:        {}",
        summary.frames_lost.to_string().red()
    );
    println!("Key-frame requests: {}", summary.keyframe_requests);
    println!("Recovery rate:      {:.2}%", summary.recovery_rate);

    Ok(())
}
