//! Raster writer adapter interface.
//!
//! The pipeline's obligation ends at handing over grid values, the no-data
//! mask, and the geometry/units metadata; container serialization
//! (GeoTIFF, NetCDF) is the adapter's concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radar_common::{GridSpec, RadarHeader, RasterGrid};
use thiserror::Error;

/// Everything an adapter needs to serialize one raster.
#[derive(Debug, Clone, Copy)]
pub struct RasterProduct<'a> {
    pub grid: &'a RasterGrid,
    pub spec: &'a GridSpec,
    pub header: &'a RadarHeader,
    /// URL the source volume was fetched from.
    pub source: &'a str,
    pub fetched_at: DateTime<Utc>,
}

impl RasterProduct<'_> {
    /// Physical units of the grid values.
    pub fn units(&self) -> &'static str {
        self.header.units()
    }
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write raster: {0}")]
    Other(String),
}

/// Sink for finished rasters.
#[async_trait]
pub trait RasterWriter: Send {
    async fn write(&mut self, product: RasterProduct<'_>) -> Result<(), WriterError>;
}

/// A captured raster, for tests and dry runs.
#[derive(Debug, Clone)]
pub struct CapturedRaster {
    pub station: String,
    pub units: String,
    pub nx: usize,
    pub ny: usize,
    pub values: Vec<f32>,
    pub mask: Vec<bool>,
    pub source: String,
}

/// Writer that keeps every product in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub rasters: Vec<CapturedRaster>,
}

#[async_trait]
impl RasterWriter for MemoryWriter {
    async fn write(&mut self, product: RasterProduct<'_>) -> Result<(), WriterError> {
        self.rasters.push(CapturedRaster {
            station: product.header.station.clone(),
            units: product.units().to_string(),
            nx: product.grid.nx(),
            ny: product.grid.ny(),
            values: product.grid.values().to_vec(),
            mask: product.grid.no_data_mask(),
            source: product.source.to_string(),
        });
        Ok(())
    }
}
