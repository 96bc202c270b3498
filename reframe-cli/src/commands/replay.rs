use anyhow::{Context, Result};
use colored::Colorize;
use reframe_core::fec::FecQueue;
use serde::Serialize;
use tracing::info;

use crate::commands::read_dump;

#[derive(Serialize)]
struct RecoveredFrameSummary {
    video_frame_index: u64,
    tracking_frame_index: u64,
    byte_size: usize,
}

#[derive(Serialize)]
struct ReplaySummary {
    datagrams: usize,
    decode_errors: usize,
    frames_recovered: u64,
    frames_abandoned: u64,
    duplicate_shards: u64,
    stale_shards: u64,
    frames: Vec<RecoveredFrameSummary>,
}

/// Feed a captured packet dump through a fresh reassembly queue and report
/// what a client would have decoded.
pub fn execute(input: &str, json: bool) -> Result<()> {
    info!("Replaying packet dump: {}", input);

    let datagrams = read_dump(input)?;

    let mut queue = FecQueue::new();
    let mut decode_errors = 0usize;
    let mut frames = Vec::new();

    for datagram in &datagrams {
        if queue.push_packet(datagram).is_err() {
            decode_errors += 1;
            continue;
        }
        if queue.try_reconstruct() {
            let frame = queue.frame().expect("reconstructed frame must be readable");
            frames.push(RecoveredFrameSummary {
                video_frame_index: frame.video_frame_index,
                tracking_frame_index: frame.tracking_frame_index,
                byte_size: frame.bytes.len(),
            });
        }
    }

    let stats = queue.stats();
    let summary = ReplaySummary {
        datagrams: datagrams.len(),
        decode_errors,
        frames_recovered: stats.frames_recovered,
        frames_abandoned: stats.frames_abandoned,
        duplicate_shards: stats.duplicate_shards,
        stale_shards: stats.stale_shards,
        frames,
    };

    if json {
        let out =
            serde_json::to_string_pretty(&summary).context("Failed to serialize replay summary")?;
        println!("{}", out);
        return Ok(());
    }

    println!("\n=== Replay Results ===");
    println!("Datagrams:         {}", summary.datagrams);
    println!("Decode errors:     {}", summary.decode_errors);
    println!(
        "Frames recovered:  {}",
        summary.frames_recovered.to_string().green()
    );
    println!(
        "Frames abandoned:  {}",
        summary.frames_abandoned.to_string().red()
    );
    println!("Duplicate shards:  {}", summary.duplicate_shards);
    println!("Stale shards:      {}", summary.stale_shards);
    println!();

    for frame in &summary.frames {
        println!(
            "frame {} (tracking {}): {} bytes",
            frame.video_frame_index, frame.tracking_frame_index, frame.byte_size
        );
    }

    Ok(())
}
