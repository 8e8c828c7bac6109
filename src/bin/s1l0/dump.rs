use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use s1l0::{assemble_ancillary, read_packets};
use tracing::warn;

pub fn headers(fpath: &Path, limit: Option<usize>) -> Result<()> {
    let reader = File::open(fpath).context("opening input")?;
    let mut out = BufWriter::new(stdout().lock());

    let packets = read_packets(reader).filter_map(|zult| match zult {
        Ok(packet) => Some(packet),
        Err(err) => {
            warn!("{err}");
            None
        }
    });
    for packet in packets.take(limit.unwrap_or(usize::MAX)) {
        serde_json::to_writer(&mut out, &packet).context("serializing to json")?;
        writeln!(out).context("writing to stdout")?;
    }
    out.flush().context("writing to stdout")
}

pub fn ancillary(fpath: &Path) -> Result<()> {
    let reader = File::open(fpath).context("opening input")?;

    let headers = read_packets(reader)
        .filter_map(|zult| zult.map_err(|err| warn!("{err}")).ok())
        .map(|packet| packet.secondary);
    let sets: Vec<_> = assemble_ancillary(headers)
        .filter_map(|zult| zult.map_err(|err| warn!("{err}")).ok())
        .collect();

    serde_json::to_writer_pretty(stdout(), &sets).context("serializing to json")
}
