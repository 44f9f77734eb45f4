//! Trail-segment environmental covariate extraction.
//!
//! One-shot geospatial ETL: load trail-segment line features, clip them to an
//! area of interest, build three covariate rasters (reclassified ecosystem
//! types, a cloud-masked annual NDVI median, terrain elevation), derive a
//! smoothed trail-density surface, reduce everything per segment (means for
//! the continuous stack, mode for the classes), and export the two flat
//! tables as CSV through asynchronous jobs.
//!
//! The stages are pure functions over in-memory `Grid` / `FeatureCollection`
//! values; `pipeline::run` wires them together from an explicit
//! `PipelineConfig`.

pub mod catalog;
pub mod density;
pub mod error;
pub mod export;
pub mod feature;
pub mod geometry;
pub mod grid;
pub mod imagery;
pub mod pipeline;
pub mod reclass;
pub mod table;
pub mod zonal;

pub use catalog::{FeatureStore, FileCatalog, ImageryArchive, MemoryCatalog, RasterStore};
pub use error::{Result, TrailEnvError};
pub use feature::{Feature, FeatureCollection};
pub use geometry::{LineString, Point, Polygon};
pub use grid::{Bounds, Grid};
pub use pipeline::{PipelineConfig, PipelineOutput};
pub use table::ResultTable;
