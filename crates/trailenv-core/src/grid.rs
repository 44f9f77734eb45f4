//! Named, georeferenced single-band raster.
//!
//! `Grid` stores row-major f32 cell values over an axis-aligned bounding box
//! in a projected CRS (metres). `f32::NAN` is the no-data value. Transforms
//! never mutate a grid in place; each one returns a new `Grid`.
//! Row 0 is the northern edge, matching image conventions.

use serde::{Deserialize, Serialize};

use crate::geometry::Polygon;

/// Axis-aligned extent in projected metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width_m(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height_m(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// A named raster layer. One band; multi-band stacks are `&[Grid]` slices
/// sharing a footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub name: String,
    /// Row-major cell values; NAN = no-data.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub bounds: Bounds,
}

impl Grid {
    /// Create a grid filled with the given value.
    pub fn filled(name: &str, width: usize, height: usize, bounds: Bounds, fill: f32) -> Self {
        Self {
            name: name.to_string(),
            data: vec![fill; width * height],
            width,
            height,
            bounds,
        }
    }

    /// Create an all-no-data grid covering `bounds` at `resolution_m` metres
    /// per cell. Dimensions are rounded up so the bounds are fully covered.
    pub fn nodata(name: &str, bounds: Bounds, resolution_m: f64) -> Self {
        let width = (bounds.width_m() / resolution_m).ceil().max(1.0) as usize;
        let height = (bounds.height_m() / resolution_m).ceil().max(1.0) as usize;
        Self::filled(name, width, height, bounds, f32::NAN)
    }

    /// Create an all-no-data grid with the same footprint and dimensions as
    /// `template`.
    pub fn nodata_like(name: &str, template: &Grid) -> Self {
        Self::filled(name, template.width, template.height, template.bounds, f32::NAN)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    pub fn cell_width_m(&self) -> f64 {
        self.bounds.width_m() / self.width as f64
    }

    pub fn cell_height_m(&self) -> f64 {
        self.bounds.height_m() / self.height as f64
    }

    /// Centre of cell `(row, col)` in projected metres.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.bounds.min_x + (col as f64 + 0.5) * self.cell_width_m();
        let y = self.bounds.max_y - (row as f64 + 0.5) * self.cell_height_m();
        (x, y)
    }

    /// Cell containing the point `(x, y)`, or None outside the bounds.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let col = ((x - self.bounds.min_x) / self.cell_width_m()) as usize;
        let row = ((self.bounds.max_y - y) / self.cell_height_m()) as usize;
        Some((row.min(self.height - 1), col.min(self.width - 1)))
    }

    /// Nearest-neighbour sample at `(x, y)`. None outside the bounds; NAN
    /// cells sample as NAN.
    pub fn sample(&self, x: f64, y: f64) -> Option<f32> {
        self.cell_at(x, y).map(|(r, c)| self.get(r, c))
    }

    /// Same data under a new layer name.
    pub fn renamed(&self, name: &str) -> Grid {
        Grid { name: name.to_string(), ..self.clone() }
    }

    /// Replace every no-data cell with `value` (the source's `unmask`).
    pub fn fill_nodata(&self, value: f32) -> Grid {
        let data = self.data.iter().map(|&v| if v.is_nan() { value } else { v }).collect();
        Grid { data, ..self.clone() }
    }

    /// Mask every cell whose centre falls outside `polygon` to no-data.
    pub fn clip(&self, polygon: &Polygon) -> Grid {
        let mut out = self.clone();
        for row in 0..self.height {
            for col in 0..self.width {
                let (x, y) = self.cell_center(row, col);
                if !polygon.contains(x, y) {
                    out.set(row, col, f32::NAN);
                }
            }
        }
        out
    }

    /// Resample onto the footprint of `template` at `resolution_m` metres per
    /// cell, nearest-neighbour. Used to align rasters before stacking.
    pub fn resample_to(&self, template_bounds: Bounds, resolution_m: f64) -> Grid {
        let mut out = Grid::nodata(&self.name, template_bounds, resolution_m);
        for row in 0..out.height {
            for col in 0..out.width {
                let (x, y) = out.cell_center(row, col);
                if let Some(v) = self.sample(x, y) {
                    out.set(row, col, v);
                }
            }
        }
        out
    }

    /// Fraction of cells holding a valid (non-NAN) value.
    pub fn valid_fraction(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let valid = self.data.iter().filter(|v| !v.is_nan()).count();
        valid as f64 / self.data.len() as f64
    }

    pub fn is_all_nodata(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// True if `other` shares dimensions and footprint with `self`.
    pub fn same_shape(&self, other: &Grid) -> bool {
        self.width == other.width && self.height == other.height && self.bounds == other.bounds
    }

    pub fn shape_string(&self) -> String {
        format!(
            "{}x{} over ({:.1}, {:.1})..({:.1}, {:.1})",
            self.width, self.height,
            self.bounds.min_x, self.bounds.min_y, self.bounds.max_x, self.bounds.max_y,
        )
    }
}
