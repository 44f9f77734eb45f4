//! Zonal statistics: reduce raster bands over vector geometries.
//!
//! For each feature, every band is sampled at the cells of a virtual lattice
//! with pitch `scale_m` that the feature's geometry passes through, and the
//! samples are reduced to one statistic per band. One output row per input
//! feature, always — a feature with no valid samples gets null statistics,
//! not a dropped row.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde_json::Value;

use crate::feature::{Feature, FeatureCollection};
use crate::grid::Grid;
use crate::table::ResultTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean of valid samples.
    Mean,
    /// Most frequent integral code; ties break to the smaller code.
    Mode,
}

impl Reducer {
    pub fn suffix(&self) -> &'static str {
        match self {
            Reducer::Mean => "mean",
            Reducer::Mode => "mode",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZonalParams {
    /// Sampling resolution in metres.
    pub scale_m: f64,
    /// Parallelism hint: minimum number of features per work unit.
    pub tile_scale: usize,
}

/// Lattice cells (pitch `scale_m`, anchored at the CRS origin) that the
/// feature's line geometry passes through.
fn covered_cells(feature: &Feature, scale_m: f64) -> HashSet<(i64, i64)> {
    let mut cells = HashSet::new();
    let step = scale_m / 2.0;
    for line in &feature.geometry {
        for w in line.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let len = a.distance(&b);
            let n = (len / step).ceil().max(1.0) as usize;
            for i in 0..=n {
                let t = i as f64 / n as f64;
                let x = a.x + (b.x - a.x) * t;
                let y = a.y + (b.y - a.y) * t;
                cells.insert(((x / scale_m).floor() as i64, (y / scale_m).floor() as i64));
            }
        }
    }
    cells
}

fn reduce_band(band: &Grid, cells: &HashSet<(i64, i64)>, reducer: Reducer, scale_m: f64) -> Value {
    let samples = cells.iter().filter_map(|&(ix, iy)| {
        let x = (ix as f64 + 0.5) * scale_m;
        let y = (iy as f64 + 0.5) * scale_m;
        band.sample(x, y).filter(|v| !v.is_nan())
    });

    match reducer {
        Reducer::Mean => {
            let mut sum = 0.0f64;
            let mut count = 0usize;
            for v in samples {
                sum += v as f64;
                count += 1;
            }
            if count == 0 {
                Value::Null
            } else {
                number(sum / count as f64)
            }
        }
        Reducer::Mode => {
            // Codes are integral; count occurrences keyed by rounded value.
            let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
            for v in samples {
                *counts.entry(v.round() as i64).or_default() += 1;
            }
            counts
                .iter()
                // max_by_key returns the last maximum; iterating in reverse
                // key order makes ties resolve to the smallest code.
                .rev()
                .max_by_key(|entry| *entry.1)
                .map(|(&code, _)| number(code as f64))
                .unwrap_or(Value::Null)
        }
    }
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Reduce `bands` over every feature. Output columns: `id`, the union of the
/// features' attribute fields (sorted), then `<band>_<reducer>` per band.
/// Geometry never enters the table.
pub fn reduce_regions(
    bands: &[&Grid],
    features: &FeatureCollection,
    reducer: Reducer,
    params: &ZonalParams,
) -> ResultTable {
    let mut property_keys: Vec<String> = features
        .features
        .iter()
        .flat_map(|ft| ft.properties.keys().cloned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    property_keys.sort();

    let mut columns = vec!["id".to_string()];
    columns.extend(property_keys.iter().cloned());
    columns.extend(bands.iter().map(|b| format!("{}_{}", b.name, reducer.suffix())));

    let rows: Vec<Vec<Value>> = features
        .features
        .par_iter()
        .with_min_len(params.tile_scale.max(1))
        .map(|ft| {
            let cells = covered_cells(ft, params.scale_m);
            let mut row: Vec<Value> = Vec::with_capacity(columns.len());
            row.push(Value::String(ft.id.clone()));
            for key in &property_keys {
                row.push(ft.properties.get(key).cloned().unwrap_or(Value::Null));
            }
            for band in bands {
                row.push(reduce_band(band, &cells, reducer, params.scale_m));
            }
            row
        })
        .collect();

    ResultTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::geometry::{LineString, Point};
    use crate::grid::Bounds;
    use serde_json::json;

    fn params() -> ZonalParams {
        ZonalParams { scale_m: 10.0, tile_scale: 1 }
    }

    fn line_feature(id: &str, points: &[(f64, f64)]) -> Feature {
        Feature::new(
            id,
            vec![LineString::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())],
        )
    }

    #[test]
    fn row_count_equals_feature_count() {
        let g = Grid::filled("ndvi", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), 0.5);
        let fc = FeatureCollection::new(vec![
            line_feature("a", &[(5.0, 5.0), (95.0, 5.0)]),
            line_feature("b", &[(5.0, 55.0), (95.0, 55.0)]),
            Feature::new("empty", vec![]),
        ]);
        let table = reduce_regions(&[&g], &fc, Reducer::Mean, &params());
        assert_eq!(table.len(), fc.len());
    }

    #[test]
    fn mean_of_uniform_band_is_the_value() {
        let g = Grid::filled("ndvi", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), 0.5);
        let fc = FeatureCollection::new(vec![line_feature("a", &[(5.0, 5.0), (95.0, 5.0)])]);
        let table = reduce_regions(&[&g], &fc, Reducer::Mean, &params());
        let v = table.cell(0, "ndvi_mean").unwrap().as_f64().unwrap();
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn feature_over_nodata_gets_null_statistics_not_a_missing_row() {
        let g = Grid::filled("ndvi", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), f32::NAN);
        let fc = FeatureCollection::new(vec![line_feature("a", &[(5.0, 5.0), (95.0, 5.0)])]);
        let table = reduce_regions(&[&g], &fc, Reducer::Mean, &params());
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "ndvi_mean"), Some(&Value::Null));
    }

    #[test]
    fn mode_picks_most_frequent_code() {
        let mut g = Grid::filled("eco_types", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), 1.0);
        // Columns 0–2 hold code 7, the rest code 1; a line across row 0
        // samples more 1s than 7s.
        for row in 0..10 {
            for col in 0..3 {
                g.set(row, col, 7.0);
            }
        }
        let fc = FeatureCollection::new(vec![line_feature("a", &[(5.0, 95.0), (95.0, 95.0)])]);
        let table = reduce_regions(&[&g], &fc, Reducer::Mode, &params());
        assert_eq!(table.cell(0, "eco_types_mode").unwrap().as_f64(), Some(1.0));
    }

    #[test]
    fn mode_tie_breaks_to_smaller_code() {
        let mut g = Grid::filled("eco_types", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), 9.0);
        // Left half code 2, right half code 9: a full-width line ties 5–5.
        for row in 0..10 {
            for col in 0..5 {
                g.set(row, col, 2.0);
            }
        }
        let fc = FeatureCollection::new(vec![line_feature("a", &[(5.0, 95.0), (95.0, 95.0)])]);
        let table = reduce_regions(&[&g], &fc, Reducer::Mode, &params());
        assert_eq!(table.cell(0, "eco_types_mode").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn attribute_fields_are_carried_into_the_table() {
        let g = Grid::filled("ndvi", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), 0.5);
        let mut ft = line_feature("a", &[(5.0, 5.0), (95.0, 5.0)]);
        ft.properties.insert("highway".into(), json!("path"));
        let table = reduce_regions(&[&g], &FeatureCollection::new(vec![ft]), Reducer::Mean, &params());
        assert_eq!(table.columns, vec!["id", "highway", "ndvi_mean"]);
        assert_eq!(table.cell(0, "highway"), Some(&json!("path")));
    }
}
