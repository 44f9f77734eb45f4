//! Vector geometry in a projected CRS (metres).
//!
//! Just enough geometry for the pipeline: line strings for trail segments, a
//! polygon ring for the area of interest, point-in-polygon tests, and clipping
//! of lines to the polygon. No reprojection; all inputs share one CRS.

use serde::{Deserialize, Serialize};

use crate::grid::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An open polyline with at least two vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    pub points: Vec<Point>,
}

impl LineString {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn length_m(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        bounds_of(&self.points)
    }
}

/// A simple polygon given as one exterior ring. The ring closes implicitly;
/// the last vertex need not repeat the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub ring: Vec<Point>,
}

impl Polygon {
    pub fn new(ring: Vec<Point>) -> Self {
        Self { ring }
    }

    /// Even-odd point-in-polygon (ray cast towards +x). Points exactly on an
    /// edge may land on either side; the pipeline works at cell-centre
    /// resolution where this does not matter.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.ring.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.ring[i];
            let pj = self.ring[j];
            if (pi.y > y) != (pj.y > y) {
                let x_cross = pj.x + (y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
                if x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn bounds(&self) -> Option<Bounds> {
        bounds_of(&self.ring)
    }

    /// Ring edges as (start, end) pairs, including the closing edge.
    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.ring.len();
        (0..n).map(move |i| (self.ring[i], self.ring[(i + 1) % n]))
    }
}

fn bounds_of(points: &[Point]) -> Option<Bounds> {
    let first = points.first()?;
    let mut b = Bounds::new(first.x, first.y, first.x, first.y);
    for p in points {
        b.min_x = b.min_x.min(p.x);
        b.min_y = b.min_y.min(p.y);
        b.max_x = b.max_x.max(p.x);
        b.max_y = b.max_y.max(p.y);
    }
    Some(b)
}

// ── Line clipping ─────────────────────────────────────────────────────────────

/// Parameter t along a→b where the segment crosses edge c→d, if it does.
fn segment_crossing(a: Point, b: Point, c: Point, d: Point) -> Option<f64> {
    let r = (b.x - a.x, b.y - a.y);
    let s = (d.x - c.x, d.y - c.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < 1e-12 {
        return None; // parallel or degenerate
    }
    let qp = (c.x - a.x, c.y - a.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Clip a polyline to a polygon. Returns the pieces that lie inside, in
/// traversal order; a line fully outside yields an empty vector.
///
/// Each segment is split at every crossing with the polygon boundary and the
/// sub-segments are kept or dropped by testing their midpoints. Consecutive
/// kept sub-segments are stitched back into single line strings.
pub fn clip_line(line: &LineString, polygon: &Polygon) -> Vec<LineString> {
    let mut pieces: Vec<LineString> = Vec::new();
    let mut open: Vec<Point> = Vec::new();
    const EPS: f64 = 1e-9;

    for w in line.points.windows(2) {
        let (a, b) = (w[0], w[1]);
        if a.distance(&b) < EPS {
            continue;
        }

        let mut ts = vec![0.0, 1.0];
        for (c, d) in polygon.edges() {
            if let Some(t) = segment_crossing(a, b, c, d) {
                ts.push(t);
            }
        }
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|x, y| (*x - *y).abs() < EPS);

        for pair in ts.windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            let mid = lerp(a, b, (t0 + t1) / 2.0);
            if !polygon.contains(mid.x, mid.y) {
                if open.len() >= 2 {
                    pieces.push(LineString::new(std::mem::take(&mut open)));
                } else {
                    open.clear();
                }
                continue;
            }
            let start = lerp(a, b, t0);
            let end = lerp(a, b, t1);
            let continues = open.last().is_some_and(|last| last.distance(&start) < 1e-6);
            if continues {
                open.push(end);
            } else {
                if open.len() >= 2 {
                    pieces.push(LineString::new(std::mem::take(&mut open)));
                }
                open.clear();
                open.push(start);
                open.push(end);
            }
        }
    }

    if open.len() >= 2 {
        pieces.push(LineString::new(open));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ])
    }

    #[test]
    fn contains_inside_and_outside() {
        let p = square(10.0);
        assert!(p.contains(5.0, 5.0));
        assert!(!p.contains(15.0, 5.0));
        assert!(!p.contains(5.0, -1.0));
    }

    #[test]
    fn clip_line_fully_inside_is_unchanged() {
        let p = square(10.0);
        let line = LineString::new(vec![Point::new(1.0, 1.0), Point::new(9.0, 9.0)]);
        let clipped = clip_line(&line, &p);
        assert_eq!(clipped.len(), 1);
        assert!((clipped[0].length_m() - line.length_m()).abs() < 1e-9);
    }

    #[test]
    fn clip_line_fully_outside_is_empty() {
        let p = square(10.0);
        let line = LineString::new(vec![Point::new(20.0, 0.0), Point::new(30.0, 10.0)]);
        assert!(clip_line(&line, &p).is_empty());
    }

    #[test]
    fn clip_line_crossing_boundary_is_trimmed() {
        let p = square(10.0);
        // Horizontal line entering at x = 0, leaving at x = 10.
        let line = LineString::new(vec![Point::new(-5.0, 5.0), Point::new(15.0, 5.0)]);
        let clipped = clip_line(&line, &p);
        assert_eq!(clipped.len(), 1);
        assert!((clipped[0].length_m() - 10.0).abs() < 1e-6);
        assert!((clipped[0].points.first().unwrap().x - 0.0).abs() < 1e-6);
        assert!((clipped[0].points.last().unwrap().x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn clip_line_exiting_and_reentering_yields_two_pieces() {
        // U-shaped polygon: two 10-wide prongs joined at the bottom.
        let u = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 20.0),
            Point::new(20.0, 20.0),
            Point::new(20.0, 5.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, 20.0),
            Point::new(0.0, 20.0),
        ]);
        // Crosses both prongs at y = 10, outside the middle notch.
        let line = LineString::new(vec![Point::new(-5.0, 10.0), Point::new(35.0, 10.0)]);
        let clipped = clip_line(&line, &u);
        assert_eq!(clipped.len(), 2);
        for piece in &clipped {
            assert!((piece.length_m() - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn multi_vertex_line_stays_one_piece() {
        let p = square(10.0);
        let line = LineString::new(vec![
            Point::new(1.0, 1.0),
            Point::new(5.0, 2.0),
            Point::new(9.0, 8.0),
        ]);
        let clipped = clip_line(&line, &p);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].points.len(), 3);
    }
}
