//! Volume header parsing.

use crate::format::{self, GateEncoding};
use crate::DecodeError;
use chrono::{TimeZone, Utc};
use radar_common::{Moment, RadarHeader};

/// Everything the fixed header declares: scan metadata plus the framing
/// parameters needed to walk the radial records.
#[derive(Debug, Clone)]
pub struct VolumeHeader {
    pub radar: RadarHeader,
    pub encoding: GateEncoding,
    pub radial_count: usize,
}

/// Parse the fixed volume header from the start of a message.
pub fn parse_volume_header(data: &[u8]) -> Result<VolumeHeader, DecodeError> {
    // Magic and version sit at fixed offsets; everything after them is only
    // trusted once both check out.
    if data.len() < 8 || &data[0..4] != format::MAGIC {
        return Err(DecodeError::UnrecognizedFormat(
            "missing AR2V magic bytes".to_string(),
        ));
    }

    let version = u16::from_be_bytes([data[4], data[5]]);
    if version != format::FORMAT_VERSION {
        return Err(DecodeError::UnrecognizedFormat(format!(
            "unsupported format version {}",
            version
        )));
    }

    let declared_len = u16::from_be_bytes([data[6], data[7]]) as usize;
    if declared_len < format::HEADER_LEN {
        return Err(DecodeError::InvalidHeader(format!(
            "declared header length {} is shorter than the fixed layout",
            declared_len
        )));
    }
    if data.len() < declared_len {
        return Err(DecodeError::TruncatedHeader {
            expected: declared_len,
            actual: data.len(),
        });
    }

    let station_bytes = &data[8..12];
    if !station_bytes.iter().all(|b| b.is_ascii_alphanumeric()) {
        return Err(DecodeError::InvalidHeader(
            "station identifier is not ASCII alphanumeric".to_string(),
        ));
    }
    let station = String::from_utf8_lossy(station_bytes).to_string();

    let vcp = u16::from_be_bytes([data[12], data[13]]);

    let millis = i64::from_be_bytes([
        data[14], data[15], data[16], data[17], data[18], data[19], data[20], data[21],
    ]);
    let scan_time = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DecodeError::InvalidHeader(format!("scan time {} out of range", millis)))?;

    let elevation_deg = u16::from_be_bytes([data[22], data[23]]) as f32 / 100.0;

    let moment = Moment::from_code(data[24])
        .ok_or_else(|| DecodeError::InvalidHeader(format!("unknown moment code {}", data[24])))?;

    // The encoding flag fixes the bit layout of every gate in the message.
    // An unknown flag means the payload cannot be safely reinterpreted.
    let encoding = GateEncoding::from_flag(data[25]).ok_or_else(|| {
        DecodeError::UnrecognizedFormat(format!("unknown gate encoding flag {}", data[25]))
    })?;

    let gain = f32::from_be_bytes([data[26], data[27], data[28], data[29]]);
    let offset = f32::from_be_bytes([data[30], data[31], data[32], data[33]]);
    if !gain.is_finite() || !offset.is_finite() {
        return Err(DecodeError::InvalidHeader(
            "gain/offset is not a finite number".to_string(),
        ));
    }

    let range_to_first_gate_m =
        u32::from_be_bytes([data[34], data[35], data[36], data[37]]) as f64;
    let gate_spacing_m = u32::from_be_bytes([data[38], data[39], data[40], data[41]]) as f64;
    if gate_spacing_m <= 0.0 {
        return Err(DecodeError::InvalidHeader(
            "gate spacing must be positive".to_string(),
        ));
    }

    let gate_count = u16::from_be_bytes([data[42], data[43]]) as usize;
    let radial_count = u16::from_be_bytes([data[44], data[45]]) as usize;

    Ok(VolumeHeader {
        radar: RadarHeader {
            station,
            vcp,
            scan_time,
            elevation_deg,
            moment,
            gain,
            offset,
            range_to_first_gate_m,
            gate_spacing_m,
            gate_count,
        },
        encoding,
        radial_count,
    })
}
