//! Encoder for the radial volume wire format.
//!
//! Produces byte streams the `archive2-parser` crate decodes. Field order
//! and widths follow the layout documented in `archive2_parser::format`.

use archive2_parser::format::{GateEncoding, FORMAT_VERSION, HEADER_LEN, MAGIC};
use chrono::{DateTime, TimeZone, Utc};
use radar_common::Moment;

/// One radial's worth of raw (pre-gain/offset) gate codes.
#[derive(Debug, Clone)]
pub struct RawRadial {
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    /// Raw gate codes; 0 is the no-data sentinel.
    pub raw_gates: Vec<u16>,
}

impl RawRadial {
    /// Build from physical values, inverting `value = raw * gain + offset`.
    /// `None` becomes the no-data sentinel.
    pub fn from_physical(
        azimuth_deg: f32,
        elevation_deg: f32,
        values: &[Option<f32>],
        gain: f32,
        offset: f32,
    ) -> Self {
        let raw_gates = values
            .iter()
            .map(|v| match v {
                Some(value) => ((value - offset) / gain).round().max(1.0) as u16,
                None => 0,
            })
            .collect();
        Self {
            azimuth_deg,
            elevation_deg,
            raw_gates,
        }
    }
}

/// Builds encoded radial volumes for tests.
#[derive(Debug, Clone)]
pub struct VolumeBuilder {
    pub station: String,
    pub vcp: u16,
    pub scan_time: DateTime<Utc>,
    pub elevation_deg: f32,
    pub moment: Moment,
    pub encoding: GateEncoding,
    pub gain: f32,
    pub offset: f32,
    pub range_to_first_gate_m: u32,
    pub gate_spacing_m: u32,
    pub gate_count: u16,
    pub radials: Vec<RawRadial>,
}

impl Default for VolumeBuilder {
    fn default() -> Self {
        Self {
            station: "KTLX".to_string(),
            vcp: 212,
            scan_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            elevation_deg: 0.5,
            moment: Moment::Reflectivity,
            encoding: GateEncoding::EightBit,
            gain: 1.0,
            offset: 0.0,
            range_to_first_gate_m: 0,
            gate_spacing_m: 1_000,
            gate_count: 0,
            radials: Vec::new(),
        }
    }
}

impl VolumeBuilder {
    pub fn with_radial(mut self, radial: RawRadial) -> Self {
        self.gate_count = self.gate_count.max(radial.raw_gates.len() as u16);
        self.radials.push(radial);
        self
    }

    /// Encode the volume header plus every radial record.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_LEN + self.radials.len() * 64);

        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        data.extend_from_slice(&(HEADER_LEN as u16).to_be_bytes());

        let mut station = self.station.as_bytes().to_vec();
        station.resize(4, b'X');
        data.extend_from_slice(&station);

        data.extend_from_slice(&self.vcp.to_be_bytes());
        data.extend_from_slice(&self.scan_time.timestamp_millis().to_be_bytes());
        data.extend_from_slice(&((self.elevation_deg * 100.0).round() as u16).to_be_bytes());
        data.push(self.moment.code());
        data.push(self.encoding.flag());
        data.extend_from_slice(&self.gain.to_be_bytes());
        data.extend_from_slice(&self.offset.to_be_bytes());
        data.extend_from_slice(&self.range_to_first_gate_m.to_be_bytes());
        data.extend_from_slice(&self.gate_spacing_m.to_be_bytes());
        data.extend_from_slice(&self.gate_count.to_be_bytes());
        data.extend_from_slice(&(self.radials.len() as u16).to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());

        for radial in &self.radials {
            let packed = pack_gates(&radial.raw_gates, self.encoding);
            let body_len = (4 + packed.len()) as u16;
            data.extend_from_slice(&body_len.to_be_bytes());
            data.extend_from_slice(
                &((radial.azimuth_deg.rem_euclid(360.0) * 100.0).round() as u16).to_be_bytes(),
            );
            data.extend_from_slice(
                &((radial.elevation_deg * 100.0).round() as u16).to_be_bytes(),
            );
            data.extend_from_slice(&packed);
        }

        data
    }
}

/// Pack raw gate codes at the given encoding width.
pub fn pack_gates(raw_gates: &[u16], encoding: GateEncoding) -> Vec<u8> {
    match encoding {
        GateEncoding::EightBit => raw_gates.iter().map(|&g| g as u8).collect(),
        GateEncoding::SixteenBit => raw_gates
            .iter()
            .flat_map(|&g| g.to_be_bytes())
            .collect(),
        GateEncoding::FourBit => {
            let mut packed = Vec::with_capacity(raw_gates.len().div_ceil(2));
            for pair in raw_gates.chunks(2) {
                let high = (pair[0] & 0x0F) as u8;
                let low = pair.get(1).map(|&g| (g & 0x0F) as u8).unwrap_or(0);
                packed.push((high << 4) | low);
            }
            packed
        }
    }
}
