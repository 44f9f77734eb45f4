//! Daily mosaicking.
//!
//! Overlapping same-day acquisitions would bias a temporal median, so the
//! collection is reduced to at most one composite scene per calendar day
//! before any temporal statistic is computed. Compositing is
//! last-valid-pixel-wins in acquisition order, the timestamp becomes that
//! day's midnight (UTC), and scene metadata is carried from the day's first
//! acquisition.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::imagery::Scene;

/// Calendar day of a scene, ignoring time of day.
pub fn scene_day(scene: &Scene) -> NaiveDate {
    scene.time.date_naive()
}

/// Composite a collection down to one scene per distinct calendar day,
/// ordered by day. Single-scene days are passed through (with the timestamp
/// still normalised to midnight). Band sets are taken from the day's first
/// scene; later scenes overwrite wherever they hold a valid pixel.
pub fn daily_mosaics(scenes: &[Scene]) -> Vec<Scene> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Scene>> = BTreeMap::new();
    for scene in scenes {
        by_day.entry(scene_day(scene)).or_default().push(scene);
    }

    by_day
        .into_iter()
        .map(|(day, mut group)| {
            group.sort_by_key(|s| s.time);
            let first = group[0];
            let mut out = first.clone();
            for later in &group[1..] {
                for band in &mut out.bands {
                    if let Ok(src) = later.band(&band.name) {
                        for (dst, &v) in band.data.iter_mut().zip(&src.data) {
                            if !v.is_nan() {
                                *dst = v;
                            }
                        }
                    }
                }
            }
            // Masking happens upstream of mosaicking, so the per-acquisition
            // quality band is no longer meaningful on a composite.
            out.qa = None;
            out.time = day.and_time(chrono::NaiveTime::MIN).and_utc();
            out
        })
        .collect()
}
