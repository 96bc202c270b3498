use anyhow::{Context, Result};
use colored::Colorize;
use reframe_core::constants::VIDEO_HEADER_SIZE;
use reframe_core::packet::{PacketErrorReport, VideoPacketHeader};
use serde::Serialize;
use tracing::info;

use crate::commands::read_dump;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InspectedPacket {
    Video {
        video_frame_index: u64,
        tracking_frame_index: u64,
        frame_byte_size: u32,
        fec_index: u32,
        packet_counter: u32,
        payload_len: usize,
        payload_prefix: String,
    },
    ErrorReport {
        lost_frame_type: String,
        from_packet_counter: u32,
        to_packet_counter: u32,
    },
    Undecodable {
        len: usize,
        error: String,
    },
}

fn inspect_datagram(datagram: &[u8]) -> InspectedPacket {
    match VideoPacketHeader::decode(datagram) {
        Ok(header) => {
            let payload = &datagram[VIDEO_HEADER_SIZE..];
            InspectedPacket::Video {
                video_frame_index: header.video_frame_index,
                tracking_frame_index: header.tracking_frame_index,
                frame_byte_size: header.frame_byte_size,
                fec_index: header.fec_index,
                packet_counter: header.packet_counter,
                payload_len: payload.len(),
                payload_prefix: hex::encode(&payload[..payload.len().min(16)]),
            }
        }
        Err(video_err) => match PacketErrorReport::decode(datagram) {
            Ok(report) => InspectedPacket::ErrorReport {
                lost_frame_type: format!("{:?}", report.lost_frame_type),
                from_packet_counter: report.from_packet_counter,
                to_packet_counter: report.to_packet_counter,
            },
            Err(_) => InspectedPacket::Undecodable {
                len: datagram.len(),
                error: video_err.to_string(),
            },
        },
    }
}

pub fn execute(input: &str, json: bool) -> Result<()> {
    info!("Inspecting packet dump: {}", input);

    let datagrams = read_dump(input)?;
    let inspected: Vec<InspectedPacket> = datagrams.iter().map(|d| inspect_datagram(d)).collect();

    if json {
        let out = serde_json::to_string_pretty(&inspected)
            .context("Failed to serialize inspected packets")?;
        println!("{}", out);
        return Ok(());
    }

    println!("\n=== Packet Dump ({} datagrams) ===", datagrams.len());
    for (i, packet) in inspected.iter().enumerate() {
        match packet {
            InspectedPacket::Video {
                video_frame_index,
                fec_index,
                frame_byte_size,
                packet_counter,
                payload_len,
                ..
            } => {
                println!(
                    "#{:<5} video frame={} shard={} counter={} frame_bytes={} payload={}",
                    i, video_frame_index, fec_index, packet_counter, frame_byte_size, payload_len
                );
            }
            InspectedPacket::ErrorReport {
                lost_frame_type,
                from_packet_counter,
                to_packet_counter,
            } => {
                println!(
                    "#{:<5} {} type={} counters={}..{}",
                    i,
                    "loss report".yellow(),
                    lost_frame_type,
                    from_packet_counter,
                    to_packet_counter
                );
            }
            InspectedPacket::Undecodable { len, error } => {
                println!("#{:<5} {} len={} ({})", i, "undecodable".red(), len, error);
            }
        }
    }

    Ok(())
}
