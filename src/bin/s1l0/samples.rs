use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use s1l0::echo::{geolocate, stack, Echo};
use s1l0::Decoder;
use tracing::{info, warn};

pub fn samples(input: &Path, output: &Path, limit: Option<usize>) -> Result<()> {
    let reader = File::open(input).context("opening input")?;
    let decoder = match limit {
        Some(limit) => Decoder::builder().max_packets(limit).build(),
        None => Decoder::builder().build(),
    };

    let decoded = decoder.decode(reader).filter_map(|zult| match zult {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!("{err}");
            None
        }
    });
    let echoes: Vec<Echo> = geolocate(decoded).collect();
    let matrix = stack(&echoes);

    let dest = File::create(output)
        .with_context(|| format!("failed to create output {output:?}"))?;
    let mut out = BufWriter::new(dest);
    for value in &matrix {
        out.write_all(&value.re.to_le_bytes())
            .context("writing samples")?;
        out.write_all(&value.im.to_le_bytes())
            .context("writing samples")?;
    }
    out.flush().context("writing samples")?;

    let (rows, cols) = matrix.dim();
    info!("wrote {rows}x{cols} samples to {output:?}");
    Ok(())
}
