//! Trail-segment features: line geometry plus free-form attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{clip_line, LineString, Polygon};
use crate::grid::Bounds;

/// One trail segment. `geometry` holds zero or more line pieces; clipping can
/// split a segment or empty it entirely, and an empty geometry is kept so the
/// feature still produces an output row downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub geometry: Vec<LineString>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(id: &str, geometry: Vec<LineString>) -> Self {
        Self { id: id.to_string(), geometry, properties: Map::new() }
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.iter().any(|l| l.points.len() >= 2)
    }

    pub fn length_m(&self) -> f64 {
        self.geometry.iter().map(LineString::length_m).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Clip every feature to the polygon. Feature count is preserved:
    /// a segment falling entirely outside keeps its row with empty geometry.
    pub fn clip_to(&self, aoi: &Polygon) -> FeatureCollection {
        let features = self
            .features
            .iter()
            .map(|ft| {
                let geometry = ft
                    .geometry
                    .iter()
                    .flat_map(|line| clip_line(line, aoi))
                    .collect();
                Feature { geometry, ..ft.clone() }
            })
            .collect();
        FeatureCollection { features }
    }

    /// True if no feature retains any usable geometry.
    pub fn all_empty(&self) -> bool {
        self.features.iter().all(|ft| !ft.has_geometry())
    }

    /// Combined extent of all geometry, or None if nothing has geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut acc: Option<Bounds> = None;
        for ft in &self.features {
            for line in &ft.geometry {
                if let Some(b) = line.bounds() {
                    acc = Some(match acc {
                        None => b,
                        Some(a) => Bounds::new(
                            a.min_x.min(b.min_x),
                            a.min_y.min(b.min_y),
                            a.max_x.max(b.max_x),
                            a.max_y.max(b.max_y),
                        ),
                    });
                }
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ])
    }

    fn line(points: &[(f64, f64)]) -> LineString {
        LineString::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn clip_preserves_feature_count() {
        let fc = FeatureCollection::new(vec![
            Feature::new("in", vec![line(&[(1.0, 1.0), (5.0, 5.0)])]),
            Feature::new("out", vec![line(&[(50.0, 50.0), (60.0, 60.0)])]),
        ]);
        let clipped = fc.clip_to(&square(10.0));
        assert_eq!(clipped.len(), 2);
        assert!(clipped.features[0].has_geometry());
        assert!(!clipped.features[1].has_geometry());
        assert!(!clipped.all_empty());
    }

    #[test]
    fn all_empty_when_nothing_intersects() {
        let fc = FeatureCollection::new(vec![Feature::new(
            "out",
            vec![line(&[(50.0, 50.0), (60.0, 60.0)])],
        )]);
        assert!(fc.clip_to(&square(10.0)).all_empty());
    }

    #[test]
    fn bounds_spans_all_features() {
        let fc = FeatureCollection::new(vec![
            Feature::new("a", vec![line(&[(0.0, 0.0), (10.0, 5.0)])]),
            Feature::new("b", vec![line(&[(20.0, -5.0), (30.0, 2.0)])]),
        ]);
        let b = fc.bounds().unwrap();
        assert_eq!(b.min_x, 0.0);
        assert_eq!(b.max_x, 30.0);
        assert_eq!(b.min_y, -5.0);
        assert_eq!(b.max_y, 5.0);
    }
}
