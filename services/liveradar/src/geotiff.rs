//! Single-strip float32 GeoTIFF emission.
//!
//! Writes uncompressed little-endian TIFF with the GeoTIFF pixel-scale and
//! tiepoint tags plus a GDAL no-data marker, which is all a downstream GIS
//! needs to place and mask the grid. File layout: 8-byte header, the pixel
//! strip, the out-of-line tag payloads, then the IFD.

use std::path::PathBuf;

use async_trait::async_trait;
use pipeline::{RasterProduct, RasterWriter, WriterError};
use radar_common::GridProjection;
use tracing::info;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_SAMPLE_FORMAT: u16 = 339;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

/// Writes each raster product as a GeoTIFF file under the output directory.
#[derive(Debug, Clone)]
pub struct GeoTiffWriter {
    output_dir: PathBuf,
}

impl GeoTiffWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn file_name(product: &RasterProduct<'_>) -> String {
        format!(
            "{}_{}_{}.tif",
            product.header.station,
            product.header.scan_time.format("%Y%m%d_%H%M%S"),
            product.header.moment
        )
    }
}

#[async_trait]
impl RasterWriter for GeoTiffWriter {
    async fn write(&mut self, product: RasterProduct<'_>) -> Result<(), WriterError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self.output_dir.join(Self::file_name(&product));
        let encoded = encode_geotiff(&product);
        tokio::fs::write(&path, encoded).await?;

        info!(
            path = %path.display(),
            cells = product.grid.nx() * product.grid.ny(),
            units = product.units(),
            "Wrote GeoTIFF"
        );
        Ok(())
    }
}

/// Encode one raster product as an in-memory GeoTIFF.
pub fn encode_geotiff(product: &RasterProduct<'_>) -> Vec<u8> {
    let grid = product.grid;
    let spec = product.spec;
    let nx = grid.nx() as u32;
    let ny = grid.ny() as u32;

    // Pixel strip: row-major float32, little-endian.
    let mut strip = Vec::with_capacity(grid.values().len() * 4);
    for value in grid.values() {
        strip.extend_from_slice(&value.to_le_bytes());
    }

    let strip_offset = 8u32;
    let mut after_strip = strip_offset + strip.len() as u32;
    if after_strip % 2 != 0 {
        after_strip += 1;
    }

    // Out-of-line payloads.
    let pixel_scale_offset = after_strip;
    let tiepoint_offset = pixel_scale_offset + 24;
    let geokeys_offset = tiepoint_offset + 48;
    let ifd_offset = geokeys_offset + 32;

    let mut pixel_scale = Vec::with_capacity(24);
    for v in [spec.resolution, spec.resolution, 0.0] {
        pixel_scale.extend_from_slice(&v.to_le_bytes());
    }

    // Raster origin (0,0) pins to the model-space top-left corner.
    let mut tiepoint = Vec::with_capacity(48);
    for v in [0.0, 0.0, 0.0, spec.bbox.min_x, spec.bbox.max_y, 0.0] {
        tiepoint.extend_from_slice(&v.to_le_bytes());
    }

    // Geographic grids carry EPSG:4326; station-local grids are a
    // user-defined projection.
    let geokey_values: [u16; 16] = match spec.projection {
        GridProjection::Geographic { .. } => [
            1, 1, 0, 3, // directory version header, 3 keys
            1024, 0, 1, 2, // GTModelType: geographic
            1025, 0, 1, 1, // GTRasterType: pixel-is-area
            2048, 0, 1, 4326, // GeographicType: WGS 84
        ],
        GridProjection::LocalCartesian => [
            1, 1, 0, 3, //
            1024, 0, 1, 1, // GTModelType: projected
            1025, 0, 1, 1, //
            3072, 0, 1, 32767, // ProjectedCSType: user-defined
        ],
    };
    let mut geokeys = Vec::with_capacity(32);
    for v in geokey_values {
        geokeys.extend_from_slice(&v.to_le_bytes());
    }

    let entries: Vec<[u8; 12]> = vec![
        entry(TAG_IMAGE_WIDTH, TYPE_LONG, 1, nx),
        entry(TAG_IMAGE_LENGTH, TYPE_LONG, 1, ny),
        entry_short(TAG_BITS_PER_SAMPLE, 32),
        entry_short(TAG_COMPRESSION, 1),
        entry_short(TAG_PHOTOMETRIC, 1),
        entry(TAG_STRIP_OFFSETS, TYPE_LONG, 1, strip_offset),
        entry_short(TAG_SAMPLES_PER_PIXEL, 1),
        entry(TAG_ROWS_PER_STRIP, TYPE_LONG, 1, ny),
        entry(TAG_STRIP_BYTE_COUNTS, TYPE_LONG, 1, strip.len() as u32),
        entry_short(TAG_SAMPLE_FORMAT, 3),
        entry(TAG_MODEL_PIXEL_SCALE, TYPE_DOUBLE, 3, pixel_scale_offset),
        entry(TAG_MODEL_TIEPOINT, TYPE_DOUBLE, 6, tiepoint_offset),
        entry(TAG_GEO_KEY_DIRECTORY, TYPE_SHORT, 16, geokeys_offset),
        entry_ascii_inline(TAG_GDAL_NODATA, b"nan\0"),
    ];

    let mut out = Vec::with_capacity(ifd_offset as usize + 2 + entries.len() * 12 + 4);
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&ifd_offset.to_le_bytes());
    out.extend_from_slice(&strip);
    while out.len() < pixel_scale_offset as usize {
        out.push(0);
    }
    out.extend_from_slice(&pixel_scale);
    out.extend_from_slice(&tiepoint);
    out.extend_from_slice(&geokeys);

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for e in &entries {
        out.extend_from_slice(e);
    }
    out.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

    out
}

fn entry(tag: u16, field_type: u16, count: u32, value: u32) -> [u8; 12] {
    let mut e = [0u8; 12];
    e[0..2].copy_from_slice(&tag.to_le_bytes());
    e[2..4].copy_from_slice(&field_type.to_le_bytes());
    e[4..8].copy_from_slice(&count.to_le_bytes());
    e[8..12].copy_from_slice(&value.to_le_bytes());
    e
}

fn entry_short(tag: u16, value: u16) -> [u8; 12] {
    let mut e = [0u8; 12];
    e[0..2].copy_from_slice(&tag.to_le_bytes());
    e[2..4].copy_from_slice(&TYPE_SHORT.to_le_bytes());
    e[4..8].copy_from_slice(&1u32.to_le_bytes());
    e[8..10].copy_from_slice(&value.to_le_bytes());
    e
}

fn entry_ascii_inline(tag: u16, value: &[u8; 4]) -> [u8; 12] {
    let mut e = [0u8; 12];
    e[0..2].copy_from_slice(&tag.to_le_bytes());
    e[2..4].copy_from_slice(&TYPE_ASCII.to_le_bytes());
    e[4..8].copy_from_slice(&4u32.to_le_bytes());
    e[8..12].copy_from_slice(value);
    e
}
