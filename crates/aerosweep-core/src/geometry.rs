//! Planar geometry primitives: points, segments and intersection math.
//!
//! Line/segment intersections use the homogeneous-coordinates construction:
//! a point (x, y) lifts to (x, y, 1), the line through two lifted points is
//! their cross product, and two lines meet at the cross product of their
//! line vectors scaled by the third component. Parallel lines make that
//! component zero, so the division yields a non-finite point which callers
//! must treat as "no intersection".

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tolerance for bounding-box containment checks, in meters.
const EPS: f64 = 1e-9;

/// A point in the local planar meters frame.
///
/// Equality is exact-value based; do not compare points across frames
/// without transforming first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Rigid rotation about the coordinate origin, counter-clockwise positive.
    pub fn rotated(&self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A directed segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    /// Whether `p` falls within this segment's axis-aligned bounding box.
    pub fn bbox_contains(&self, p: Point) -> bool {
        p.x >= self.start.x.min(self.end.x) - EPS
            && p.x <= self.start.x.max(self.end.x) + EPS
            && p.y >= self.start.y.min(self.end.y) - EPS
            && p.y <= self.start.y.max(self.end.y) + EPS
    }
}

type Hom = [f64; 3];

fn cross_product(a: Hom, b: Hom) -> Hom {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Homogeneous line vector through two points.
pub fn line_through(a: Point, b: Point) -> Hom {
    cross_product([a.x, a.y, 1.0], [b.x, b.y, 1.0])
}

/// Intersection of the infinite lines carrying two segments.
///
/// Parallel or collinear input yields a non-finite point.
pub fn segment_segment_intersection(s1: Segment, s2: Segment) -> Point {
    let l1 = line_through(s1.start, s1.end);
    let l2 = line_through(s2.start, s2.end);
    let p = cross_product(l1, l2);
    Point::new(p[0] / p[2], p[1] / p[2])
}

/// Strict segment intersection test: the line intersection point must be
/// finite and lie within both segments' bounding boxes on both axes.
pub fn segments_intersect(s1: Segment, s2: Segment) -> bool {
    let p = segment_segment_intersection(s1, s2);
    p.is_finite() && s1.bbox_contains(p) && s2.bbox_contains(p)
}

/// Clockwise angle between vectors (p2 -> p1) and (p2 -> p3), in [0, 2*pi).
pub fn angle_between_vectors(p1: Point, p2: Point, p3: Point) -> f64 {
    let (x1, y1) = (p1.x - p2.x, p1.y - p2.y);
    let (x2, y2) = (p3.x - p2.x, p3.y - p2.y);
    let dot = x1 * x2 + y1 * y2;
    let det = x1 * y2 - y1 * x2;
    let angle = det.atan2(dot);
    if angle < 0.0 {
        angle + 2.0 * PI
    } else {
        angle
    }
}
