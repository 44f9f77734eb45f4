//! Spectral indices.

use crate::error::Result;
use crate::grid::Grid;
use crate::imagery::Scene;

/// Per-pixel normalized difference (a − b) / (a + b).
///
/// The result is no-data where either input is no-data, and also where the
/// denominator is zero — the zero/zero case is decided here explicitly rather
/// than left to IEEE-754 (which would yield NaN for 0/0 but ±inf for the
/// mixed-sign cases).
pub fn normalized_difference(a: &Grid, b: &Grid, name: &str) -> Grid {
    debug_assert!(a.same_shape(b));
    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&va, &vb)| {
            let denom = va + vb;
            if va.is_nan() || vb.is_nan() || denom == 0.0 {
                f32::NAN
            } else {
                (va - vb) / denom
            }
        })
        .collect();
    Grid { name: name.to_string(), data, ..a.clone() }
}

/// Append the vegetation index band `"ndvi"` = (nir − red) / (nir + red).
/// Existing bands are untouched.
pub fn with_ndvi(scene: &Scene) -> Result<Scene> {
    let nir = scene.band("nir")?;
    let red = scene.band("red")?;
    let ndvi = normalized_difference(nir, red, "ndvi");
    let mut out = scene.clone();
    out.bands.push(ndvi);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imagery::testutil::scene;

    #[test]
    fn ndvi_is_bounded_for_valid_reflectance() {
        let mut s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.0), ("nir", 0.0)]);
        let pairs = [
            (0.05, 0.60),
            (0.30, 0.30),
            (0.90, 0.01),
            (0.0, 0.5),
            (0.5, 0.0),
        ];
        for (i, (red, nir)) in pairs.iter().enumerate() {
            s.bands[0].data[i] = *red;
            s.bands[1].data[i] = *nir;
        }
        let ndvi_scene = with_ndvi(&s).unwrap();
        let ndvi = ndvi_scene.band("ndvi").unwrap();
        for i in 0..pairs.len() {
            let v = ndvi.data[i];
            assert!((-1.0..=1.0).contains(&v), "ndvi[{i}] = {v} out of range");
        }
        assert!((ndvi.data[1] - 0.0).abs() < 1e-6); // equal bands
        assert!((ndvi.data[3] - 1.0).abs() < 1e-6); // red = 0
    }

    #[test]
    fn zero_denominator_is_nodata() {
        let s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.0), ("nir", 0.0)]);
        let ndvi_scene = with_ndvi(&s).unwrap();
        assert!(ndvi_scene.band("ndvi").unwrap().data.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn masked_input_pixels_stay_masked() {
        let mut s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.2), ("nir", 0.6)]);
        s.bands[1].data[3] = f32::NAN;
        let ndvi_scene = with_ndvi(&s).unwrap();
        let ndvi = ndvi_scene.band("ndvi").unwrap();
        assert!(ndvi.data[3].is_nan());
        assert!(!ndvi.data[4].is_nan());
    }

    #[test]
    fn other_bands_are_untouched() {
        let s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.2), ("nir", 0.6), ("swir1", 0.4)]);
        let out = with_ndvi(&s).unwrap();
        assert_eq!(out.bands.len(), 4);
        assert_eq!(out.band("swir1").unwrap().data[0], 0.4);
    }
}
