//! Radial record parsing with the partial-success policy.

use crate::format::RADIAL_BODY_PREFIX;
use crate::header::VolumeHeader;
use crate::unpacking::unpack_gates;
use radar_common::Radial;

/// Result of walking the radial stream: the radials that decoded, and the
/// reason the walk stopped early if it did.
#[derive(Debug)]
pub struct RadialOutcome {
    pub radials: Vec<Radial>,
    pub truncation: Option<String>,
}

/// Walk the radial records that follow the volume header.
///
/// Each record declares its own body length. A record whose declared length
/// runs past the end of the buffer, or disagrees with the packed gate size
/// the header implies, stops the walk: that radial and everything after it
/// are dropped, while every earlier radial is kept intact.
pub fn parse_radials(data: &[u8], volume: &VolumeHeader) -> RadialOutcome {
    let expected_body = RADIAL_BODY_PREFIX + volume.encoding.packed_len(volume.radar.gate_count);
    let mut radials = Vec::with_capacity(volume.radial_count);
    let mut cursor = u16::from_be_bytes([data[6], data[7]]) as usize;

    for index in 0..volume.radial_count {
        if cursor + 2 > data.len() {
            return RadialOutcome {
                radials,
                truncation: Some(format!(
                    "buffer ends before the length field of radial {}",
                    index
                )),
            };
        }

        let body_len = u16::from_be_bytes([data[cursor], data[cursor + 1]]) as usize;
        let body_start = cursor + 2;

        if body_start + body_len > data.len() {
            return RadialOutcome {
                radials,
                truncation: Some(format!(
                    "radial {} declares {} bytes but only {} remain",
                    index,
                    body_len,
                    data.len() - body_start
                )),
            };
        }

        if body_len != expected_body {
            return RadialOutcome {
                radials,
                truncation: Some(format!(
                    "radial {} declares {} bytes, header implies {}",
                    index, body_len, expected_body
                )),
            };
        }

        let body = &data[body_start..body_start + body_len];
        let azimuth_deg = u16::from_be_bytes([body[0], body[1]]) as f32 / 100.0;
        let elevation_deg = u16::from_be_bytes([body[2], body[3]]) as f32 / 100.0;
        let gates = unpack_gates(
            &body[RADIAL_BODY_PREFIX..],
            volume.radar.gate_count,
            volume.encoding,
            volume.radar.gain,
            volume.radar.offset,
        );

        radials.push(Radial {
            azimuth_deg: azimuth_deg.rem_euclid(360.0),
            elevation_deg,
            gates,
        });

        cursor = body_start + body_len;
    }

    RadialOutcome {
        radials,
        truncation: None,
    }
}
