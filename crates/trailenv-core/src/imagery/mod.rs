//! Multi-temporal satellite imagery.
//!
//! A `Scene` is one acquisition: a timestamp, a cloud-cover percentage, the
//! reflectance bands (each a `Grid` on a shared footprint), and optionally a
//! bit-encoded quality band. The processing chain mirrors the extraction
//! workflow: mask clouds → rename bands → append the vegetation index →
//! composite to one scene per day → reduce to a median grid.

pub mod cloudmask;
pub mod composite;
pub mod indices;
pub mod mosaic;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailEnvError};
use crate::grid::Grid;

pub use cloudmask::mask_clouds;
pub use composite::median_composite;
pub use indices::with_ndvi;
pub use mosaic::daily_mosaics;

/// Bit-encoded per-pixel quality flags, aligned with the scene's bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityBand {
    pub data: Vec<u16>,
    pub width: usize,
    pub height: usize,
}

impl QualityBand {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.width + col]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub time: DateTime<Utc>,
    /// Scene-level cloud cover percentage from acquisition metadata, 0–100.
    pub cloud_cover: f32,
    pub bands: Vec<Grid>,
    pub qa: Option<QualityBand>,
}

impl Scene {
    pub fn band(&self, name: &str) -> Result<&Grid> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| TrailEnvError::MissingBand(name.to_string()))
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    /// Keep the named bands, renamed in order. Bands not listed are dropped;
    /// the quality band is kept as-is.
    pub fn select(&self, from: &[&str], to: &[&str]) -> Result<Scene> {
        debug_assert_eq!(from.len(), to.len());
        let mut bands = Vec::with_capacity(from.len());
        for (src, dst) in from.iter().zip(to) {
            bands.push(self.band(src)?.renamed(dst));
        }
        Ok(Scene { bands, ..self.clone() })
    }

}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::grid::Bounds;
    use chrono::NaiveDateTime;

    /// Build a scene with uniform-valued named bands on a small grid.
    pub fn scene(time_str: &str, cloud: f32, bands: &[(&str, f32)]) -> Scene {
        let bounds = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let time = NaiveDateTime::parse_from_str(time_str, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        Scene {
            time,
            cloud_cover: cloud,
            bands: bands
                .iter()
                .map(|(name, v)| Grid::filled(name, 4, 4, bounds, *v))
                .collect(),
            qa: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::scene;

    #[test]
    fn select_renames_and_drops_bands() {
        let s = scene("2019-06-01 10:30:00", 5.0, &[("B4", 0.2), ("B8", 0.6), ("QA60", 0.0)]);
        let renamed = s.select(&["B4", "B8"], &["red", "nir"]).unwrap();
        assert!(renamed.has_band("red"));
        assert!(renamed.has_band("nir"));
        assert!(!renamed.has_band("QA60"));
        assert_eq!(renamed.bands.len(), 2);
    }

    #[test]
    fn select_missing_band_is_an_error() {
        let s = scene("2019-06-01 10:30:00", 5.0, &[("B4", 0.2)]);
        assert!(s.select(&["B4", "B8"], &["red", "nir"]).is_err());
    }
}
