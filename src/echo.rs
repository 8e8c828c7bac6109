//! Echo lines paired with the sensor position, for image formation.
use ndarray::Array2;
use num_complex::Complex64;
use tracing::{debug, warn};

use crate::ancillary::AncillaryAssembler;
use crate::packet::{DecodedPacket, Payload};

/// Decoded samples of one packet and the sensor position at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    /// ECEF position in metres
    pub position: [f64; 3],
    pub samples: Vec<Complex64>,
}

/// Pair decoded packets with the position of the most recently completed ancillary
/// set. Packets must be in stream order.
///
/// Packets received before the first ancillary set completes, and packets whose
/// samples did not decode, are skipped.
pub fn geolocate<I>(packets: I) -> impl Iterator<Item = Echo>
where
    I: IntoIterator<Item = DecodedPacket>,
{
    let mut assembler = AncillaryAssembler::new();
    let mut current: Option<[f64; 3]> = None;

    packets.into_iter().filter_map(move |decoded| {
        match assembler.push(&decoded.packet.secondary) {
            Ok(Some(set)) => current = Some(set.position()),
            Ok(None) => {}
            Err(err) => warn!(offset = decoded.packet.offset, "ancillary word dropped: {err}"),
        }
        let Some(position) = current else {
            debug!(
                offset = decoded.packet.offset,
                "no sensor position yet, skipping echo"
            );
            return None;
        };
        match decoded.payload {
            Payload::Samples(samples) => Some(Echo { position, samples }),
            _ => None,
        }
    })
}

/// Stack echo samples into a matrix with one row per echo. Rows shorter than the
/// longest echo are zero padded.
#[must_use]
pub fn stack(echoes: &[Echo]) -> Array2<Complex64> {
    let cols = echoes.iter().map(|e| e.samples.len()).max().unwrap_or(0);
    let mut matrix = Array2::<Complex64>::zeros((echoes.len(), cols));
    for (mut row, echo) in matrix.rows_mut().into_iter().zip(echoes) {
        for (dst, src) in row.iter_mut().zip(&echo.samples) {
            *dst = *src;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack() {
        let echoes = vec![
            Echo {
                position: [0.0; 3],
                samples: vec![Complex64::new(1.0, 1.0)],
            },
            Echo {
                position: [0.0; 3],
                samples: vec![Complex64::new(2.0, 0.0), Complex64::new(0.0, 2.0)],
            },
        ];
        let matrix = stack(&echoes);

        assert_eq!(matrix.dim(), (2, 2));
        assert_eq!(matrix[[0, 0]], Complex64::new(1.0, 1.0));
        assert_eq!(matrix[[0, 1]], Complex64::new(0.0, 0.0));
        assert_eq!(matrix[[1, 1]], Complex64::new(0.0, 2.0));
    }

    #[test]
    fn stack_empty() {
        assert_eq!(stack(&[]).dim(), (0, 0));
    }
}
