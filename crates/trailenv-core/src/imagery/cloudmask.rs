//! Quality-band cloud masking.
//!
//! The quality band encodes per-pixel flags; bit 10 marks opaque cloud and
//! bit 11 cirrus. Masking sets every band to no-data wherever either bit is
//! set. Nothing is deleted: grid dimensions are unchanged.

use crate::imagery::Scene;

pub const OPAQUE_CLOUD_BIT: u16 = 1 << 10;
pub const CIRRUS_BIT: u16 = 1 << 11;

#[inline]
pub fn is_cloudy(qa: u16) -> bool {
    qa & (OPAQUE_CLOUD_BIT | CIRRUS_BIT) != 0
}

/// Apply the cloud mask to every band of the scene. Scenes without a quality
/// band pass through unchanged.
pub fn mask_clouds(scene: &Scene) -> Scene {
    let Some(qa) = &scene.qa else {
        return scene.clone();
    };
    let mut out = scene.clone();
    for band in &mut out.bands {
        debug_assert_eq!(band.width, qa.width);
        debug_assert_eq!(band.height, qa.height);
        for (v, &flags) in band.data.iter_mut().zip(&qa.data) {
            if is_cloudy(flags) {
                *v = f32::NAN;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imagery::testutil::scene;
    use crate::imagery::QualityBand;

    #[test]
    fn cloudy_and_cirrus_pixels_become_nodata() {
        let mut s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.3), ("nir", 0.5)]);
        let mut qa = vec![0u16; 16];
        qa[0] = OPAQUE_CLOUD_BIT;
        qa[5] = CIRRUS_BIT;
        qa[6] = OPAQUE_CLOUD_BIT | CIRRUS_BIT;
        qa[7] = 0b11; // unrelated low bits must not mask
        s.qa = Some(QualityBand { data: qa, width: 4, height: 4 });

        let masked = mask_clouds(&s);
        for band in &masked.bands {
            assert!(band.data[0].is_nan());
            assert!(band.data[5].is_nan());
            assert!(band.data[6].is_nan());
            assert!(!band.data[7].is_nan());
            assert!(!band.data[1].is_nan());
        }
    }

    #[test]
    fn surviving_pixels_have_cloud_bits_clear() {
        let mut s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.3)]);
        let qa: Vec<u16> = (0..16).map(|i| (i as u16) << 9).collect();
        s.qa = Some(QualityBand { data: qa.clone(), width: 4, height: 4 });

        let masked = mask_clouds(&s);
        let band = masked.band("red").unwrap();
        for (i, v) in band.data.iter().enumerate() {
            if !v.is_nan() {
                assert_eq!(qa[i] & OPAQUE_CLOUD_BIT, 0);
                assert_eq!(qa[i] & CIRRUS_BIT, 0);
            } else {
                assert!(is_cloudy(qa[i]));
            }
        }
    }

    #[test]
    fn scene_without_qa_passes_through() {
        let s = scene("2019-06-01 10:30:00", 5.0, &[("red", 0.3)]);
        let masked = mask_clouds(&s);
        assert!(masked.band("red").unwrap().data.iter().all(|v| !v.is_nan()));
    }
}
