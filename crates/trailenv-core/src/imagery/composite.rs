//! Temporal reduction of a scene collection to a single grid.

use rayon::prelude::*;

use crate::error::{Result, TrailEnvError};
use crate::grid::Grid;
use crate::imagery::Scene;

/// Per-pixel median of one band across a scene collection.
///
/// No-data observations are skipped; a pixel with zero valid observations
/// stays no-data. An even observation count takes the midpoint of the two
/// middle values. All scenes must share the band's footprint; an empty
/// collection is an error the caller turns into an all-no-data layer plus a
/// warning.
pub fn median_composite(scenes: &[Scene], band: &str) -> Result<Grid> {
    let first = scenes
        .first()
        .ok_or_else(|| TrailEnvError::EmptyCollection(band.to_string()))?;
    let template = first.band(band)?;

    let mut grids: Vec<&Grid> = Vec::with_capacity(scenes.len());
    for scene in scenes {
        let g = scene.band(band)?;
        if !g.same_shape(template) {
            return Err(TrailEnvError::DimensionMismatch {
                expected: template.shape_string(),
                actual: g.shape_string(),
            });
        }
        grids.push(g);
    }

    let width = template.width;
    let data: Vec<f32> = (0..template.height)
        .into_par_iter()
        .flat_map_iter(|row| {
            let grids = &grids;
            (0..width).map(move |col| {
                let mut obs: Vec<f32> = grids
                    .iter()
                    .map(|g| g.get(row, col))
                    .filter(|v| !v.is_nan())
                    .collect();
                if obs.is_empty() {
                    return f32::NAN;
                }
                obs.sort_by(f32::total_cmp);
                let n = obs.len();
                if n % 2 == 1 {
                    obs[n / 2]
                } else {
                    (obs[n / 2 - 1] + obs[n / 2]) / 2.0
                }
            })
        })
        .collect();

    Ok(Grid { name: band.to_string(), data, ..template.clone() })
}
