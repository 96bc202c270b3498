//! CLI subcommand implementations

pub mod inspect;
pub mod replay;
pub mod simulate;

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Read;

/// Read a packet dump: repeated little-endian `u32` length prefix followed
/// by that many datagram bytes. `-` reads stdin.
pub fn read_dump(input: &str) -> Result<Vec<Vec<u8>>> {
    let data = if input == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?
    };

    let mut datagrams = Vec::new();
    let mut pos = 0usize;
    while pos < data.len() {
        if pos + 4 > data.len() {
            bail!("truncated length prefix at offset {}", pos);
        }
        let len = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        pos += 4;
        if pos + len > data.len() {
            bail!(
                "truncated datagram at offset {}: prefix says {} bytes, {} remain",
                pos,
                len,
                data.len() - pos
            );
        }
        datagrams.push(data[pos..pos + len].to_vec());
        pos += len;
    }
    Ok(datagrams)
}

/// Write a packet dump in the format [`read_dump`] consumes
pub fn write_dump(output: &str, datagrams: &[Vec<u8>]) -> Result<()> {
    let mut data = Vec::new();
    for datagram in datagrams {
        data.extend_from_slice(&(datagram.len() as u32).to_le_bytes());
        data.extend_from_slice(datagram);
    }
    fs::write(output, data).with_context(|| format!("Failed to write output file: {}", output))
}
