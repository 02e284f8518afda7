//! Radial volume parser for the Archive II-style container.
//!
//! This crate decodes a single-sweep radial volume: a fixed big-endian
//! header followed by length-prefixed radial records carrying packed gate
//! data. Structural failures before any radial decodes (bad magic, short
//! header) are errors; a truncated radial record degrades to a partial
//! result that keeps every radial decoded before the cut.

pub mod format;
pub mod header;
pub mod radial;
pub mod unpacking;

use radar_common::{RadialSet, RawMessage};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that end a decode with nothing usable.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Magic bytes missing, or a version/encoding this parser does not speak.
    #[error("Unrecognized volume format: {0}")]
    UnrecognizedFormat(String),

    /// The buffer ends before the declared header length.
    #[error("Truncated header: need {expected} bytes, have {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    /// A header field decodes but carries an impossible value.
    #[error("Invalid header field: {0}")]
    InvalidHeader(String),
}

/// Outcome qualifier attached to every successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeQuality {
    /// Every declared radial decoded.
    Complete,
    /// The radial stream was cut short; radials before the cut are intact.
    Partial {
        decoded: usize,
        declared: usize,
        reason: String,
    },
}

impl DecodeQuality {
    pub fn is_partial(&self) -> bool {
        matches!(self, DecodeQuality::Partial { .. })
    }
}

/// A decoded sweep plus its quality qualifier.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub radial_set: RadialSet,
    pub quality: DecodeQuality,
}

/// Decode a fetched volume into a radial set.
///
/// Consumes the raw message; the payload has no further use once parsed.
pub fn decode(message: RawMessage) -> Result<Decoded, DecodeError> {
    decode_with_encoding(message, None)
}

/// Decode with the gate encoding forced instead of trusting the header
/// flag. For feeds whose headers declare the wrong packing.
pub fn decode_with_encoding(
    message: RawMessage,
    encoding_override: Option<format::GateEncoding>,
) -> Result<Decoded, DecodeError> {
    let data = message.payload.as_ref();

    let mut volume = header::parse_volume_header(data)?;
    if let Some(encoding) = encoding_override {
        volume.encoding = encoding;
    }
    debug!(
        station = %volume.radar.station,
        moment = %volume.radar.moment,
        radials = volume.radial_count,
        gates = volume.radar.gate_count,
        source = %message.source,
        "Parsed volume header"
    );

    let outcome = radial::parse_radials(data, &volume);

    let quality = match outcome.truncation {
        Some(reason) => {
            warn!(
                decoded = outcome.radials.len(),
                declared = volume.radial_count,
                reason = %reason,
                "Radial stream truncated, keeping decoded prefix"
            );
            DecodeQuality::Partial {
                decoded: outcome.radials.len(),
                declared: volume.radial_count,
                reason,
            }
        }
        None => DecodeQuality::Complete,
    };

    Ok(Decoded {
        radial_set: RadialSet::new(volume.radar, outcome.radials),
        quality,
    })
}
