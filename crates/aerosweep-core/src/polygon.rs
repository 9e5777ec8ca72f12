//! Surveyed-area polygon: one fly-zone ring plus no-fly-zone holes.

use crate::errors::PlanError;
use crate::geometry::{segments_intersect, Point, Segment};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;

/// A fly-zone ring with zero or more no-fly-zone rings.
///
/// Rings are implicitly closed (no repeated last point). Callers must
/// normalize orientation with [`MapPolygon::make_clockwise`] before any
/// decomposition or sweep operation; the canonical orientation is clockwise
/// for every ring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPolygon {
    pub fly_zone: Vec<Point>,
    #[serde(default)]
    pub no_fly_zones: Vec<Vec<Point>>,
}

/// Shoelace signed area of a ring; positive for counter-clockwise winding.
pub fn signed_ring_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

fn ring_edges(ring: &[Point]) -> impl Iterator<Item = Segment> + '_ {
    (0..ring.len()).map(move |i| Segment::new(ring[i], ring[(i + 1) % ring.len()]))
}

impl MapPolygon {
    pub fn new(fly_zone: Vec<Point>, no_fly_zones: Vec<Vec<Point>>) -> Self {
        Self {
            fly_zone,
            no_fly_zones,
        }
    }

    /// All ring points, fly-zone first, then each hole in order.
    pub fn all_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.fly_zone
            .iter()
            .chain(self.no_fly_zones.iter().flatten())
            .copied()
    }

    /// All ring edges, fly-zone first, then each hole in order.
    pub fn all_segments(&self) -> impl Iterator<Item = Segment> + '_ {
        ring_edges(&self.fly_zone).chain(self.no_fly_zones.iter().flat_map(|h| ring_edges(h)))
    }

    /// Unsigned area of the fly-zone ring. Holes are not subtracted.
    pub fn area(&self) -> f64 {
        signed_ring_area(&self.fly_zone).abs()
    }

    /// Force every ring into the canonical clockwise orientation.
    pub fn make_clockwise(&mut self) {
        if signed_ring_area(&self.fly_zone) > 0.0 {
            self.fly_zone.reverse();
        }
        for hole in &mut self.no_fly_zones {
            if signed_ring_area(hole) > 0.0 {
                hole.reverse();
            }
        }
    }

    /// Every point rotated about the origin by `angle` radians (CCW positive).
    pub fn rotated(&self, angle: f64) -> MapPolygon {
        MapPolygon {
            fly_zone: self.fly_zone.iter().map(|p| p.rotated(angle)).collect(),
            no_fly_zones: self
                .no_fly_zones
                .iter()
                .map(|h| h.iter().map(|p| p.rotated(angle)).collect())
                .collect(),
        }
    }

    /// The two ring-adjacent points of `point` in whichever ring contains it.
    ///
    /// Lookup is by exact coordinate equality, matching how decomposition
    /// re-emits ring vertices.
    pub fn point_neighbors(&self, point: Point) -> Result<(Point, Point), PlanError> {
        let rings = std::iter::once(&self.fly_zone).chain(self.no_fly_zones.iter());
        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            if let Some(i) = ring.iter().position(|p| *p == point) {
                let prev = ring[(i + ring.len() - 1) % ring.len()];
                let next = ring[(i + 1) % ring.len()];
                return Ok((prev, next));
            }
        }
        Err(PlanError::PointNotFound {
            x: point.x,
            y: point.y,
        })
    }

    /// Replace the fly-zone ring with its convex hull. Holes are untouched.
    pub fn make_pure_convex(&self) -> MapPolygon {
        let mut hull = MapPolygon {
            fly_zone: convex_hull(&self.fly_zone),
            no_fly_zones: self.no_fly_zones.clone(),
        };
        hull.make_clockwise();
        hull
    }

    /// The edge leaving the fly-zone vertex with maximum x.
    ///
    /// Ties are broken by the first such vertex in ring order; this gives a
    /// natural sweep reference direction for the cell.
    pub fn rightmost_edge(&self) -> Result<Segment, PlanError> {
        if self.fly_zone.len() < 2 {
            return Err(PlanError::InvalidPolygon(
                "fly zone has no edges".to_string(),
            ));
        }
        let mut best = 0;
        for (i, p) in self.fly_zone.iter().enumerate() {
            if p.x > self.fly_zone[best].x {
                best = i;
            }
        }
        let next = self.fly_zone[(best + 1) % self.fly_zone.len()];
        Ok(Segment::new(self.fly_zone[best], next))
    }

    /// Rotation angles that align each of the `n` longest fly-zone edges with
    /// the x axis. Returns one angle per edge when the ring has fewer than
    /// `n` edges.
    pub fn n_longest_edges_rotation_angles(&self, n: usize) -> Vec<f64> {
        let mut edges: Vec<Segment> = ring_edges(&self.fly_zone)
            .filter(|e| e.length() > EPS)
            .collect();
        edges.sort_by(|a, b| b.length().total_cmp(&a.length()));
        edges
            .iter()
            .take(n)
            .map(|e| -((e.end.y - e.start.y).atan2(e.end.x - e.start.x)))
            .collect()
    }

    /// Axis-aligned bounds of the fly-zone ring as (min, max) corners.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.fly_zone {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Whether the fly-zone ring is simple (no two non-adjacent edges cross).
    pub fn is_simple(&self) -> bool {
        let n = self.fly_zone.len();
        if n < 3 {
            return false;
        }
        let edges: Vec<Segment> = ring_edges(&self.fly_zone).collect();
        for i in 0..n {
            for j in (i + 1)..n {
                // Ring-adjacent edges share a vertex by construction.
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                if segments_intersect(edges[i], edges[j]) {
                    return false;
                }
            }
        }
        true
    }

    /// Cut the fly-zone ring with the vertical line at `x` into (left, right)
    /// sub-polygons. Holes are dropped from each half, not re-derived.
    pub fn split_by_vertical_line(&self, x: f64) -> (MapPolygon, MapPolygon) {
        let mut left: Vec<Point> = Vec::new();
        let mut right: Vec<Point> = Vec::new();
        let push = |ring: &mut Vec<Point>, p: Point| {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        };
        let n = self.fly_zone.len();
        for i in 0..n {
            let a = self.fly_zone[i];
            let b = self.fly_zone[(i + 1) % n];
            if a.x <= x {
                push(&mut left, a);
            }
            if a.x >= x {
                push(&mut right, a);
            }
            // Edge crossing the cut contributes the crossing point to both.
            if (a.x < x && b.x > x) || (a.x > x && b.x < x) {
                let t = (x - a.x) / (b.x - a.x);
                let p = Point::new(x, a.y + t * (b.y - a.y));
                push(&mut left, p);
                push(&mut right, p);
            }
        }
        for ring in [&mut left, &mut right] {
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
        }
        (
            MapPolygon::new(left, Vec::new()),
            MapPolygon::new(right, Vec::new()),
        )
    }

    /// Cut a convex, hole-free polygon into the minimum number of
    /// near-equal-area convex pieces, each with area at most `max_area`.
    ///
    /// Cuts are vertical lines positioned by bisection on the left-piece
    /// area, which is monotone in x for convex input. Behavior on non-convex
    /// input is undefined.
    pub fn split_into_pieces(&self, max_area: f64) -> Vec<MapPolygon> {
        let total = self.area();
        if !(max_area > 0.0) || max_area.is_nan() || total <= max_area + EPS {
            return vec![self.clone()];
        }
        let pieces = (total / max_area).ceil() as usize;
        let target = total / pieces as f64;

        let mut out = Vec::with_capacity(pieces);
        let mut rest = self.clone();
        for _ in 0..pieces.saturating_sub(1) {
            let (min, max) = rest.bounds();
            let mut lo = min.x;
            let mut hi = max.x;
            for _ in 0..64 {
                let mid = (lo + hi) / 2.0;
                let (l, _) = rest.split_by_vertical_line(mid);
                if l.area() < target {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            let (l, r) = rest.split_by_vertical_line((lo + hi) / 2.0);
            out.push(l);
            rest = r;
        }
        out.push(rest);
        out
    }
}

/// Andrew monotone-chain convex hull. Output ring is counter-clockwise with
/// no repeated last point.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let cross = |o: Point, a: Point, b: Point| (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
