//! Asset catalogue: where the pipeline's inputs come from.
//!
//! Three query surfaces, one per input kind: vector features by asset id,
//! rasters by asset id, and the imagery archive filtered by bounds, date
//! range, and scene-level cloud cover. `FileCatalog` backs all three with
//! JSON files under a root directory (asset id = relative path without the
//! `.json` extension); `MemoryCatalog` serves tests and embedding callers.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Result, TrailEnvError};
use crate::feature::FeatureCollection;
use crate::grid::{Bounds, Grid};
use crate::imagery::Scene;

pub trait FeatureStore {
    fn load_features(&self, asset_id: &str) -> Result<FeatureCollection>;
}

pub trait RasterStore {
    fn load_raster(&self, asset_id: &str) -> Result<Grid>;
}

pub trait ImageryArchive {
    /// Scenes from the named archive whose footprint intersects `bounds`,
    /// acquired in `[start, end)`, with cloud cover strictly below
    /// `max_cloud_pct`.
    fn query_scenes(
        &self,
        asset_id: &str,
        bounds: &Bounds,
        start: NaiveDate,
        end: NaiveDate,
        max_cloud_pct: f32,
    ) -> Result<Vec<Scene>>;
}

fn scene_matches(
    scene: &Scene,
    bounds: &Bounds,
    start: NaiveDate,
    end: NaiveDate,
    max_cloud_pct: f32,
) -> bool {
    let day = scene.time.date_naive();
    day >= start
        && day < end
        && scene.cloud_cover < max_cloud_pct
        && scene
            .bands
            .first()
            .is_some_and(|b| b.bounds.intersects(bounds))
}

// ── File-backed catalogue ─────────────────────────────────────────────────────

/// JSON assets on disk, the same interchange format the rasters are
/// serialised in everywhere else in this workspace.
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn asset_path(&self, asset_id: &str) -> PathBuf {
        self.root.join(format!("{asset_id}.json"))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, asset_id: &str) -> Result<T> {
        let path = self.asset_path(asset_id);
        let file = File::open(&path).map_err(|_| TrailEnvError::AssetNotFound {
            id: asset_id.to_string(),
            path: path.clone(),
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FeatureStore for FileCatalog {
    fn load_features(&self, asset_id: &str) -> Result<FeatureCollection> {
        self.read_json(asset_id)
    }
}

impl RasterStore for FileCatalog {
    fn load_raster(&self, asset_id: &str) -> Result<Grid> {
        self.read_json(asset_id)
    }
}

impl ImageryArchive for FileCatalog {
    fn query_scenes(
        &self,
        asset_id: &str,
        bounds: &Bounds,
        start: NaiveDate,
        end: NaiveDate,
        max_cloud_pct: f32,
    ) -> Result<Vec<Scene>> {
        let scenes: Vec<Scene> = self.read_json(asset_id)?;
        Ok(scenes
            .into_iter()
            .filter(|s| scene_matches(s, bounds, start, end, max_cloud_pct))
            .collect())
    }
}

// ── In-memory catalogue ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCatalog {
    features: HashMap<String, FeatureCollection>,
    rasters: HashMap<String, Grid>,
    scenes: HashMap<String, Vec<Scene>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(mut self, asset_id: &str, fc: FeatureCollection) -> Self {
        self.features.insert(asset_id.to_string(), fc);
        self
    }

    pub fn with_raster(mut self, asset_id: &str, grid: Grid) -> Self {
        self.rasters.insert(asset_id.to_string(), grid);
        self
    }

    pub fn with_scenes(mut self, asset_id: &str, scenes: Vec<Scene>) -> Self {
        self.scenes.insert(asset_id.to_string(), scenes);
        self
    }

    fn missing(&self, asset_id: &str) -> TrailEnvError {
        TrailEnvError::AssetNotFound { id: asset_id.to_string(), path: PathBuf::from("<memory>") }
    }
}

impl FeatureStore for MemoryCatalog {
    fn load_features(&self, asset_id: &str) -> Result<FeatureCollection> {
        self.features.get(asset_id).cloned().ok_or_else(|| self.missing(asset_id))
    }
}

impl RasterStore for MemoryCatalog {
    fn load_raster(&self, asset_id: &str) -> Result<Grid> {
        self.rasters.get(asset_id).cloned().ok_or_else(|| self.missing(asset_id))
    }
}

impl ImageryArchive for MemoryCatalog {
    fn query_scenes(
        &self,
        asset_id: &str,
        bounds: &Bounds,
        start: NaiveDate,
        end: NaiveDate,
        max_cloud_pct: f32,
    ) -> Result<Vec<Scene>> {
        let scenes = self.scenes.get(asset_id).ok_or_else(|| self.missing(asset_id))?;
        Ok(scenes
            .iter()
            .filter(|s| scene_matches(s, bounds, start, end, max_cloud_pct))
            .cloned()
            .collect())
    }
}
