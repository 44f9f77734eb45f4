//! Pipeline orchestrator: runs the extraction stages in order.
//!
//! One linear pass: load and clip the trail segments, prepare the three
//! covariate rasters (ecosystem types, vegetation-index median, elevation),
//! derive the trail-density surface, reduce everything per segment, and hand
//! back the two flat tables. All knobs live in `PipelineConfig`, passed in
//! explicitly; there is no ambient session state.

use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;

use crate::catalog::{FeatureStore, ImageryArchive, RasterStore};
use crate::density::trail_density;
use crate::error::{Result, TrailEnvError};
use crate::export::{self, ExportSpec, JobHandle};
use crate::geometry::Polygon;
use crate::grid::Grid;
use crate::imagery::{daily_mosaics, mask_clouds, median_composite, with_ndvi};
use crate::reclass::{ReclassTable, UnmatchedPolicy};
use crate::table::ResultTable;
use crate::zonal::{reduce_regions, Reducer, ZonalParams};

/// Source reflectance band ids and the working names they are given.
pub const SOURCE_BANDS: [&str; 6] = ["B2", "B3", "B4", "B8", "B11", "B12"];
pub const WORKING_BANDS: [&str; 6] = ["blue", "green", "red", "nir", "swir1", "swir2"];

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Area of interest; every raster and vector is clipped to it.
    pub aoi: Polygon,

    /// Asset id of the trail-segment feature collection.
    pub trails_asset: String,
    /// Asset id of the raw ecosystem-type raster.
    pub ecosystem_asset: String,
    /// Asset id of the terrain elevation raster.
    pub elevation_asset: String,
    /// Asset id of the reflectance imagery archive.
    pub imagery_asset: String,

    /// Observation window: one calendar year.
    pub year: i32,
    /// Scene-level cloud-cover threshold, percent.
    #[serde(default = "default_cloud_cover_max")]
    pub cloud_cover_max: f32,

    /// Resolution of the rasterized trail presence grid, metres.
    #[serde(default = "default_density_resolution")]
    pub density_resolution_m: f64,
    /// Radius of the density neighbourhood, metres.
    #[serde(default = "default_density_radius")]
    pub density_radius_m: f64,

    /// Sampling scale for the continuous-stack reduction, metres.
    #[serde(default = "default_continuous_scale")]
    pub continuous_scale_m: f64,
    /// Parallelism hint for the continuous reduction.
    #[serde(default = "default_tile_scale")]
    pub tile_scale: usize,
    /// Sampling scale for the categorical reduction, metres.
    #[serde(default = "default_categorical_scale")]
    pub categorical_scale_m: f64,

    #[serde(default)]
    pub reclass_policy: UnmatchedPolicy,

    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub output_dir: std::path::PathBuf,
    #[serde(default = "default_continuous_description")]
    pub continuous_description: String,
    #[serde(default = "default_categorical_description")]
    pub categorical_description: String,
}

fn default_cloud_cover_max() -> f32 {
    30.0
}
fn default_density_resolution() -> f64 {
    10.0
}
fn default_density_radius() -> f64 {
    250.0
}
fn default_continuous_scale() -> f64 {
    30.0
}
fn default_tile_scale() -> usize {
    4
}
fn default_categorical_scale() -> f64 {
    20.0
}
fn default_continuous_description() -> String {
    "explan_vars_continuous".to_string()
}
fn default_categorical_description() -> String {
    "explan_vars_categorical".to_string()
}

// ── Output ────────────────────────────────────────────────────────────────────

pub struct PipelineOutput {
    /// Per-segment means of ndvi, elevation, and trail density.
    pub continuous: ResultTable,
    /// Per-segment mode of the ecosystem-type classes.
    pub categorical: ResultTable,
    /// Conditions worth surfacing that did not stop the run.
    pub warnings: Vec<String>,
}

// ── Stages ────────────────────────────────────────────────────────────────────

/// Build the vegetation-index median for one calendar year: filter by date,
/// bounds, and cloud cover, mask clouds, rename bands, append NDVI, composite
/// to one scene per day, then take the per-pixel median.
fn ndvi_median<C: ImageryArchive>(
    config: &PipelineConfig,
    catalog: &C,
    warnings: &mut Vec<String>,
) -> Result<Grid> {
    let aoi_bounds = config
        .aoi
        .bounds()
        .ok_or_else(|| TrailEnvError::InvalidGeometry("area of interest has no extent".into()))?;
    let window = |year: i32| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| TrailEnvError::InvalidGeometry(format!("invalid year {year}")))
    };
    let start = window(config.year)?;
    let end = window(config.year + 1)?;

    let scenes = catalog.query_scenes(
        &config.imagery_asset,
        &aoi_bounds,
        start,
        end,
        config.cloud_cover_max,
    )?;
    info!(
        "imagery: {} scene(s) pass the {}% cloud filter for {}",
        scenes.len(),
        config.cloud_cover_max,
        config.year
    );

    if scenes.is_empty() {
        let msg = format!(
            "no scenes below {}% cloud cover in {}; vegetation-index layer is entirely no-data",
            config.cloud_cover_max, config.year
        );
        warn!("{msg}");
        warnings.push(msg);
        return Ok(Grid::nodata("ndvi", aoi_bounds, config.continuous_scale_m));
    }

    let mut prepared = Vec::with_capacity(scenes.len());
    for scene in &scenes {
        let masked = mask_clouds(scene);
        let renamed = masked.select(&SOURCE_BANDS, &WORKING_BANDS)?;
        prepared.push(with_ndvi(&renamed)?);
    }

    let daily = daily_mosaics(&prepared);
    info!("imagery: {} daily mosaic(s)", daily.len());
    let median = median_composite(&daily, "ndvi")?;

    if median.is_all_nodata() {
        let msg = "vegetation-index median is entirely no-data after cloud masking".to_string();
        warn!("{msg}");
        warnings.push(msg);
    }
    Ok(median)
}

/// Run the whole extraction. Returns the two result tables; export submission
/// is a separate step (`submit_exports`) so embedding callers can inspect the
/// tables first.
pub fn run<C>(config: &PipelineConfig, catalog: &C) -> Result<PipelineOutput>
where
    C: FeatureStore + RasterStore + ImageryArchive,
{
    let mut warnings = Vec::new();

    // 1. Trail segments, clipped to the area of interest.
    let trails = catalog.load_features(&config.trails_asset)?;
    info!("loaded {} trail segment(s) from {:?}", trails.len(), config.trails_asset);
    let clipped = trails.clip_to(&config.aoi);
    if clipped.all_empty() {
        return Err(TrailEnvError::EmptyAfterClip);
    }
    let total_km: f64 = clipped.features.iter().map(|ft| ft.length_m()).sum::<f64>() / 1000.0;
    if let Some(extent) = clipped.bounds() {
        info!(
            "clipped trails: {total_km:.1} km over ({:.0}, {:.0})..({:.0}, {:.0})",
            extent.min_x, extent.min_y, extent.max_x, extent.max_y
        );
    }

    // 2. Categorical layer: reclassified ecosystem types.
    let eco_raw = catalog.load_raster(&config.ecosystem_asset)?;
    let table = ReclassTable::ecosystem_types(config.reclass_policy);
    let eco_types = table.apply(&eco_raw)?.renamed("eco_types").clip(&config.aoi);

    // 3. Continuous layers: elevation and the NDVI median.
    let dem = catalog.load_raster(&config.elevation_asset)?;
    let elevation = dem.fill_nodata(0.0).renamed("elevation").clip(&config.aoi);
    let ndvi = ndvi_median(config, catalog, &mut warnings)?.clip(&config.aoi);

    // 4. Trail density on the elevation grid.
    let density = trail_density(
        &clipped,
        &elevation,
        config.density_resolution_m,
        config.density_radius_m,
    )
    .clip(&config.aoi);

    // 5. Zonal reductions: mean over the continuous stack, mode over the
    //    ecosystem classes.
    let continuous = reduce_regions(
        &[&ndvi, &elevation, &density],
        &clipped,
        Reducer::Mean,
        &ZonalParams { scale_m: config.continuous_scale_m, tile_scale: config.tile_scale },
    );
    let categorical = reduce_regions(
        &[&eco_types],
        &clipped,
        Reducer::Mode,
        &ZonalParams { scale_m: config.categorical_scale_m, tile_scale: 1 },
    );
    info!(
        "reduced {} feature(s) into {} continuous and {} categorical row(s)",
        clipped.len(),
        continuous.len(),
        categorical.len()
    );

    Ok(PipelineOutput { continuous, categorical, warnings })
}

/// Submit both tables as asynchronous CSV export jobs. The jobs are
/// independent; callers may wait on the returned handles or drop them.
pub fn submit_exports(output: PipelineOutput, config: &ExportConfig) -> Result<[JobHandle; 2]> {
    let continuous = export::submit(
        output.continuous,
        ExportSpec::new(&config.continuous_description, &config.output_dir),
    )?;
    let categorical = export::submit(
        output.categorical,
        ExportSpec::new(&config.categorical_description, &config.output_dir),
    )?;
    Ok([continuous, categorical])
}
