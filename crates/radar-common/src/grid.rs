//! Target raster geometry and the produced grid.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for the equirectangular approximation
/// when the target grid is geographic.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Projection of the target raster grid.
///
/// The radar station is always the polar origin; the projection determines
/// how grid coordinates relate to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridProjection {
    /// Grid coordinates are meters east (+x) and north (+y) of the station.
    LocalCartesian,
    /// Grid coordinates are degrees longitude (x) and latitude (y); the
    /// station sits at the given origin.
    Geographic { origin_lat: f64, origin_lon: f64 },
}

impl GridProjection {
    /// Convert a grid coordinate to (range meters, azimuth degrees) relative
    /// to the radar station. Azimuth is compass-style: 0° north, 90° east.
    pub fn to_polar(&self, x: f64, y: f64) -> (f64, f64) {
        let (east_m, north_m) = match *self {
            GridProjection::LocalCartesian => (x, y),
            GridProjection::Geographic {
                origin_lat,
                origin_lon,
            } => {
                let east = (x - origin_lon).to_radians()
                    * EARTH_RADIUS_M
                    * origin_lat.to_radians().cos();
                let north = (y - origin_lat).to_radians() * EARTH_RADIUS_M;
                (east, north)
            }
        };

        let range = (east_m * east_m + north_m * north_m).sqrt();
        let mut azimuth = east_m.atan2(north_m).to_degrees();
        if azimuth < 0.0 {
            azimuth += 360.0;
        }
        (range, azimuth)
    }
}

/// Caller-supplied specification of the target raster grid.
///
/// Cell size comes entirely from `resolution`; nothing is inferred from the
/// density of the input radials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub projection: GridProjection,
    pub bbox: BoundingBox,
    /// Cell size in projection units (meters or degrees).
    pub resolution: f64,
}

impl GridSpec {
    pub fn new(projection: GridProjection, bbox: BoundingBox, resolution: f64) -> Self {
        Self {
            projection,
            bbox,
            resolution,
        }
    }

    /// Number of columns.
    pub fn nx(&self) -> usize {
        (self.bbox.width() / self.resolution).round().max(1.0) as usize
    }

    /// Number of rows.
    pub fn ny(&self) -> usize {
        (self.bbox.height() / self.resolution).round().max(1.0) as usize
    }

    /// Center coordinate of cell (col, row). Row 0 is the northern/top edge.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.bbox.min_x + (col as f64 + 0.5) * self.resolution;
        let y = self.bbox.max_y - (row as f64 + 0.5) * self.resolution;
        (x, y)
    }
}

/// A 2D raster of physical-unit values aligned to a [`GridSpec`].
///
/// No-data cells carry `f32::NAN`, which is never confusable with a measured
/// zero. Row-major, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    nx: usize,
    ny: usize,
    values: Vec<f32>,
}

impl RasterGrid {
    /// Create a grid filled with no-data.
    pub fn filled_no_data(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            values: vec![f32::NAN; nx * ny],
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.values[row * self.nx + col]
    }

    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        self.values[row * self.nx + col] = value;
    }

    /// Raw row-major values, no-data cells as NaN.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Per-cell mask, `true` where the cell holds no-data.
    pub fn no_data_mask(&self) -> Vec<bool> {
        self.values.iter().map(|v| v.is_nan()).collect()
    }

    /// Number of cells holding no-data.
    pub fn no_data_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}
