use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use s1l0::header::SignalType;
use s1l0::{AncillaryAssembler, DataFormat, Decoder, Payload};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    io::{stdout, Write},
    path::Path,
};
use tracing::warn;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Default, Debug, Clone, Serialize)]
struct Summary {
    total_packets: usize,
    header_errors: usize,
    payload_failures: usize,
    formats: BTreeMap<DataFormat, usize>,
    signal_types: BTreeMap<SignalType, usize>,
    first_packet_time: Option<DateTime<Utc>>,
    last_packet_time: Option<DateTime<Utc>>,
    ancillary_sets: usize,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    summary: Summary,
}

fn summarize(fpath: &Path) -> Result<Info> {
    let reader = std::fs::File::open(fpath).context("opening input")?;
    let mut summary = Summary::default();
    let mut assembler = AncillaryAssembler::new();

    for zult in Decoder::builder().build().decode(reader) {
        let decoded = match zult {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!("{err}");
                summary.header_errors += 1;
                continue;
            }
        };
        let packet = &decoded.packet;
        summary.total_packets += 1;
        *summary.formats.entry(packet.format).or_default() += 1;
        *summary
            .signal_types
            .entry(packet.secondary.signal_type)
            .or_default() += 1;
        if let Payload::Failed(_) = decoded.payload {
            summary.payload_failures += 1;
        }

        if let Some(time) = packet.secondary.time() {
            summary.first_packet_time =
                Some(summary.first_packet_time.map_or(time, |t| t.min(time)));
            summary.last_packet_time =
                Some(summary.last_packet_time.map_or(time, |t| t.max(time)));
        }

        match assembler.push(&packet.secondary) {
            Ok(Some(_)) => summary.ancillary_sets += 1,
            Ok(None) => {}
            Err(err) => warn!(offset = packet.offset, "{err}"),
        }
    }
    if assembler.finish().is_some() {
        summary.ancillary_sets += 1;
    }

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        summary,
    })
}

pub fn info(fpath: &Path, format: &Format) -> Result<()> {
    let info = summarize(fpath)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info);
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> String {
    let s = &info.summary;
    let time = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_default();
    let mut out = format!(
        "{}
===============================================================================
First:            {}
Last:             {}
Packets:          {}
Header errors:    {}
Payload failures: {}
Ancillary sets:   {}
-------------------------------------------------------------------------------
",
        info.filename,
        time(s.first_packet_time),
        time(s.last_packet_time),
        s.total_packets,
        s.header_errors,
        s.payload_failures,
        s.ancillary_sets,
    );
    for (format, count) in &s.formats {
        out.push_str(&format!("Format {format:?}:  {count:>10}\n"));
    }
    for (signal_type, count) in &s.signal_types {
        out.push_str(&format!("{:<16}  {count:>10}\n", format!("{signal_type:?}")));
    }
    out
}
