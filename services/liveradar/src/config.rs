//! Service configuration loaded from a YAML file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use grid_resampler::ResampleOptions;
use pipeline::GateEncoding;
use radar_common::{BoundingBox, GridProjection, GridSpec, Station};
use serde::Deserialize;
use tracing::debug;
use transport::ServerEndpoint;

/// Root configuration for the liveradar service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Radar site to poll, e.g. "KTLX".
    pub station: String,
    /// Data servers in failover order.
    pub endpoints: Vec<ServerEndpoint>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    pub grid: GridConfig,
    #[serde(default)]
    pub resample: ResampleOptions,
    /// Force gate decoding width ("8bit", "4bit", "16bit") for feeds whose
    /// headers declare the wrong packing. Normally unset.
    #[serde(default)]
    pub gate_encoding: Option<String>,
    pub listing: ListingConfig,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    300
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

/// Where volume files live on each server.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Directory path below the endpoint base; `{station}` is substituted.
    pub path_template: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_suffix() -> String {
    ".ar2v".to_string()
}

impl ListingConfig {
    pub fn path_for(&self, station: &str) -> String {
        self.path_template.replace("{station}", station)
    }
}

/// Target raster geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// "local_cartesian" or "geographic".
    #[serde(default = "default_projection")]
    pub projection: String,
    /// Cell size in projection units (meters or degrees).
    pub resolution: f64,
    /// Explicit bounds; when omitted the grid is a square centered on the
    /// station, `half_width` out in each direction.
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub half_width: Option<f64>,
}

fn default_projection() -> String {
    "local_cartesian".to_string()
}

impl GridConfig {
    /// Resolve into a grid specification around the given station.
    pub fn to_spec(&self, station: &Station) -> Result<GridSpec> {
        let spec = match self.projection.as_str() {
            "local_cartesian" => {
                let half = self.half_width.unwrap_or(150_000.0);
                GridSpec::new(
                    GridProjection::LocalCartesian,
                    self.bbox
                        .unwrap_or_else(|| BoundingBox::centered_on(0.0, 0.0, half)),
                    self.resolution,
                )
            }
            "geographic" => {
                let half = self.half_width.unwrap_or(1.5);
                GridSpec::new(
                    GridProjection::Geographic {
                        origin_lat: station.lat,
                        origin_lon: station.lon,
                    },
                    self.bbox
                        .unwrap_or_else(|| BoundingBox::centered_on(station.lon, station.lat, half)),
                    self.resolution,
                )
            }
            other => bail!("unknown grid projection: {}", other),
        };
        Ok(spec)
    }
}

impl ServiceConfig {
    /// Resolve the optional gate-encoding override.
    pub fn gate_encoding_override(&self) -> Result<Option<GateEncoding>> {
        match self.gate_encoding.as_deref() {
            None => Ok(None),
            Some("8bit") => Ok(Some(GateEncoding::EightBit)),
            Some("4bit") => Ok(Some(GateEncoding::FourBit)),
            Some("16bit") => Ok(Some(GateEncoding::SixteenBit)),
            Some(other) => bail!("unknown gate encoding: {}", other),
        }
    }

    /// Load the service configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ServiceConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.endpoints.is_empty() {
            bail!("config declares no endpoints");
        }

        debug!(station = %config.station, endpoints = config.endpoints.len(), "Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
station: KTLX

endpoints:
  - url: https://radar-a.example/data
    protocol: http
    priority: 0
  - url: ftp://radar-b.example/pub
    protocol: ftp
    priority: 1

fetch_timeout_secs: 30

grid:
  projection: geographic
  resolution: 0.01

resample:
  azimuth_method: linear
  range_method: linear
  azimuth_gap_tolerance_deg: 2.5

listing:
  path_template: "level2/{station}"

poll_interval_secs: 120
"#;

    fn station() -> Station {
        Station {
            id: "KTLX".to_string(),
            name: "Oklahoma City, OK".to_string(),
            lat: 35.333,
            lon: -97.278,
        }
    }

    #[test]
    fn test_parse_sample_config() {
        let config: ServiceConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.station, "KTLX");
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].priority, 1);
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.listing.suffix, ".ar2v");
        assert_eq!(config.listing.path_for("KTLX"), "level2/KTLX");
    }

    #[test]
    fn test_geographic_grid_centers_on_station() {
        let config: ServiceConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let spec = config.grid.to_spec(&station()).unwrap();

        assert!(matches!(
            spec.projection,
            GridProjection::Geographic { .. }
        ));
        assert!((spec.bbox.min_x - (-97.278 - 1.5)).abs() < 1e-9);
        assert!((spec.bbox.max_y - (35.333 + 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_projection_rejected() {
        let mut config: ServiceConfig = serde_yaml::from_str(SAMPLE).unwrap();
        config.grid.projection = "mercator".to_string();
        assert!(config.grid.to_spec(&station()).is_err());
    }

    #[test]
    fn test_gate_encoding_override() {
        let mut config: ServiceConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.gate_encoding_override().unwrap(), None);

        config.gate_encoding = Some("4bit".to_string());
        assert_eq!(
            config.gate_encoding_override().unwrap(),
            Some(GateEncoding::FourBit)
        );

        config.gate_encoding = Some("12bit".to_string());
        assert!(config.gate_encoding_override().is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let minimal = r#"
station: KTLX
endpoints:
  - url: https://radar.example/data
    protocol: http
grid:
  resolution: 1000.0
listing:
  path_template: "level2/{station}"
"#;
        let config: ServiceConfig = serde_yaml::from_str(minimal).unwrap();
        assert_eq!(config.fetch_timeout_secs, 60);
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.grid.projection, "local_cartesian");
        assert_eq!(config.endpoints[0].priority, 0);

        let spec = config.grid.to_spec(&station()).unwrap();
        assert_eq!(spec.nx(), 300);
    }
}
