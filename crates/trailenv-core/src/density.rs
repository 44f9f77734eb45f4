//! Trail-density surface.
//!
//! Lines are burnt into a binary presence raster aligned to a reference grid
//! at a target resolution, then smoothed with a circular-neighbourhood mean.
//! The radius is a config value; on the managed platform the source came from
//! it was capped around 250 m before intermediate rasters had to be
//! materialised, which is worth keeping in mind when raising it here.

use rayon::prelude::*;

use crate::feature::FeatureCollection;
use crate::grid::Grid;

/// Rasterize line features onto the footprint of `reference` at
/// `resolution_m`: cells touched by any line become 1, everything else 0.
pub fn rasterize_presence(features: &FeatureCollection, reference: &Grid, resolution_m: f64) -> Grid {
    let mut out = Grid::nodata("presence", reference.bounds, resolution_m);
    out.data.fill(0.0);

    // Walk each segment at half-cell steps; marks every cell the segment
    // passes through at this resolution.
    let step = (out.cell_width_m().min(out.cell_height_m())) / 2.0;
    for ft in &features.features {
        for line in &ft.geometry {
            for w in line.points.windows(2) {
                let (a, b) = (w[0], w[1]);
                let len = a.distance(&b);
                let n = (len / step).ceil().max(1.0) as usize;
                for i in 0..=n {
                    let t = i as f64 / n as f64;
                    let x = a.x + (b.x - a.x) * t;
                    let y = a.y + (b.y - a.y) * t;
                    if let Some((row, col)) = out.cell_at(x, y) {
                        out.set(row, col, 1.0);
                    }
                }
            }
        }
    }
    out
}

/// Mean of `grid` over a circular neighbourhood of `radius_m` centred on each
/// cell. No-data neighbours are skipped; a cell whose whole neighbourhood is
/// no-data stays no-data. Neighbourhoods are truncated at the grid edge.
pub fn neighborhood_mean(grid: &Grid, radius_m: f64) -> Grid {
    let cw = grid.cell_width_m();
    let ch = grid.cell_height_m();
    let r_cols = (radius_m / cw).floor() as i64;
    let r_rows = (radius_m / ch).floor() as i64;
    let r2 = radius_m * radius_m;

    // Kernel offsets whose cell-centre distance is within the radius.
    let mut offsets: Vec<(i64, i64)> = Vec::new();
    for dr in -r_rows..=r_rows {
        for dc in -r_cols..=r_cols {
            let dx = dc as f64 * cw;
            let dy = dr as f64 * ch;
            if dx * dx + dy * dy <= r2 {
                offsets.push((dr, dc));
            }
        }
    }

    let width = grid.width as i64;
    let height = grid.height as i64;
    let data: Vec<f32> = (0..grid.height as i64)
        .into_par_iter()
        .flat_map_iter(|row| {
            let offsets = &offsets;
            (0..width).map(move |col| {
                let mut sum = 0.0f64;
                let mut count = 0usize;
                for &(dr, dc) in offsets {
                    let r = row + dr;
                    let c = col + dc;
                    if r < 0 || r >= height || c < 0 || c >= width {
                        continue;
                    }
                    let v = grid.get(r as usize, c as usize);
                    if !v.is_nan() {
                        sum += v as f64;
                        count += 1;
                    }
                }
                if count == 0 {
                    f32::NAN
                } else {
                    (sum / count as f64) as f32
                }
            })
        })
        .collect();

    Grid { data, ..grid.clone() }
}

/// Rasterized presence smoothed to a local density surface.
pub fn trail_density(
    features: &FeatureCollection,
    reference: &Grid,
    resolution_m: f64,
    radius_m: f64,
) -> Grid {
    let presence = rasterize_presence(features, reference, resolution_m);
    neighborhood_mean(&presence, radius_m).renamed("trail_density")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::geometry::{LineString, Point};
    use crate::grid::Bounds;

    fn reference() -> Grid {
        Grid::filled("dem", 10, 10, Bounds::new(0.0, 0.0, 100.0, 100.0), 0.0)
    }

    fn one_line(points: &[(f64, f64)]) -> FeatureCollection {
        FeatureCollection::new(vec![Feature::new(
            "t1",
            vec![LineString::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())],
        )])
    }

    #[test]
    fn rasterize_marks_cells_along_the_line() {
        let fc = one_line(&[(5.0, 50.0), (95.0, 50.0)]);
        let presence = rasterize_presence(&fc, &reference(), 10.0);
        assert_eq!(presence.width, 10);
        // The horizontal line crosses every column of row 5 (y = 50 maps to
        // the row spanning [40, 50)).
        let marked: usize = presence.data.iter().map(|&v| v as usize).sum();
        assert_eq!(marked, 10);
        for col in 0..10 {
            assert_eq!(presence.get(5, col), 1.0);
        }
    }

    #[test]
    fn rasterize_without_geometry_is_all_zero() {
        let fc = FeatureCollection::new(vec![Feature::new("empty", vec![])]);
        let presence = rasterize_presence(&fc, &reference(), 10.0);
        assert!(presence.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn neighborhood_mean_of_uniform_grid_is_uniform() {
        let g = Grid::filled("p", 8, 8, Bounds::new(0.0, 0.0, 80.0, 80.0), 0.25);
        let smoothed = neighborhood_mean(&g, 25.0);
        assert!(smoothed.data.iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn density_peaks_on_the_trail_and_decays_away() {
        let fc = one_line(&[(5.0, 50.0), (95.0, 50.0)]);
        let dens = trail_density(&fc, &reference(), 10.0, 25.0);
        assert_eq!(dens.name, "trail_density");
        let on_trail = dens.get(5, 5);
        let far_away = dens.get(9, 5);
        assert!(on_trail > far_away);
        assert_eq!(far_away, 0.0);
        // Density is a mean of a 0/1 raster.
        assert!(dens.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn single_cell_kernel_is_identity() {
        let mut g = Grid::filled("p", 4, 4, Bounds::new(0.0, 0.0, 40.0, 40.0), 0.0);
        g.set(1, 2, 1.0);
        // Radius below the cell size keeps only the centre offset.
        let smoothed = neighborhood_mean(&g, 5.0);
        assert_eq!(smoothed.get(1, 2), 1.0);
        assert_eq!(smoothed.get(1, 1), 0.0);
    }
}
