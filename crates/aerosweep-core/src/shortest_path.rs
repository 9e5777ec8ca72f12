//! Obstacle-aware shortest paths over a visibility graph.
//!
//! Built once per polygon: graph nodes are the two query points plus every
//! no-fly-zone vertex, an edge connects two nodes when the straight segment
//! between them crosses no hole boundary, and Dijkstra over Euclidean
//! weights yields the path. Immutable after construction; reusable across
//! many point-pair queries within one request.

use crate::errors::PlanError;
use crate::geometry::{segment_segment_intersection, Point, Segment};
use crate::polygon::MapPolygon;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

const EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Shortest collision-free paths with respect to a polygon's no-fly zones.
#[derive(Debug, Clone)]
pub struct ShortestPathCalculator {
    holes: Vec<Vec<Point>>,
    vertices: Vec<Point>,
}

impl ShortestPathCalculator {
    /// Capture the no-fly-zone rings of `polygon`. The fly-zone ring does
    /// not constrain connections; only holes block them.
    pub fn new(polygon: &MapPolygon) -> Self {
        let holes: Vec<Vec<Point>> = polygon
            .no_fly_zones
            .iter()
            .filter(|h| h.len() >= 3)
            .cloned()
            .collect();
        let vertices = holes.iter().flatten().copied().collect();
        Self { holes, vertices }
    }

    /// Shortest hole-avoiding polyline from `start` to `goal`, both
    /// endpoints included.
    pub fn shortest_path(&self, start: Point, goal: Point) -> Result<Vec<Point>, PlanError> {
        let unreachable = || PlanError::Unreachable {
            from_x: start.x,
            from_y: start.y,
            to_x: goal.x,
            to_y: goal.y,
        };
        if !start.is_finite() || !goal.is_finite() {
            return Err(unreachable());
        }
        if self.inside_any_hole(start) || self.inside_any_hole(goal) {
            return Err(unreachable());
        }
        if self.visible(start, goal) {
            return Ok(vec![start, goal]);
        }

        // Node 0 is the start, node 1 the goal, the rest hole vertices.
        let mut nodes = Vec::with_capacity(self.vertices.len() + 2);
        nodes.push(start);
        nodes.push(goal);
        nodes.extend(self.vertices.iter().copied());

        let n = nodes.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev = vec![usize::MAX; n];
        let mut done = vec![false; n];
        dist[0] = 0.0;

        let mut heap: BinaryHeap<Reverse<(FloatOrd, usize)>> = BinaryHeap::new();
        heap.push(Reverse((FloatOrd(0.0), 0)));
        while let Some(Reverse((FloatOrd(d), u))) = heap.pop() {
            if done[u] || d > dist[u] + EPS {
                continue;
            }
            done[u] = true;
            if u == 1 {
                break;
            }
            for v in 0..n {
                if done[v] || !self.visible(nodes[u], nodes[v]) {
                    continue;
                }
                let next = dist[u] + nodes[u].distance_to(nodes[v]);
                if next < dist[v] {
                    dist[v] = next;
                    prev[v] = u;
                    heap.push(Reverse((FloatOrd(next), v)));
                }
            }
        }

        if !dist[1].is_finite() {
            return Err(unreachable());
        }
        let mut path = Vec::new();
        let mut node = 1usize;
        loop {
            path.push(nodes[node]);
            if node == 0 {
                break;
            }
            node = prev[node];
            if node == usize::MAX {
                return Err(unreachable());
            }
        }
        path.reverse();
        Ok(path)
    }

    /// Length of the shortest hole-avoiding path between two points.
    pub fn path_length(&self, start: Point, goal: Point) -> Result<f64, PlanError> {
        let path = self.shortest_path(start, goal)?;
        Ok(path.windows(2).map(|w| w[0].distance_to(w[1])).sum())
    }

    /// Whether the straight segment between two points crosses no hole
    /// boundary and stays out of hole interiors.
    fn visible(&self, a: Point, b: Point) -> bool {
        if a == b {
            return true;
        }
        let segment = Segment::new(a, b);
        for hole in &self.holes {
            let n = hole.len();
            for i in 0..n {
                let edge = Segment::new(hole[i], hole[(i + 1) % n]);
                if crosses(segment, edge) {
                    return false;
                }
            }
        }
        // Crossing tests let a segment graze through vertices; interior
        // samples catch it cutting through the hole itself.
        for t in [0.25, 0.5, 0.75] {
            let sample = Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
            if self.inside_any_hole(sample) {
                return false;
            }
        }
        true
    }

    /// Strict interior test: cell corners sit exactly on hole boundaries,
    /// so boundary points must count as outside.
    fn inside_any_hole(&self, p: Point) -> bool {
        self.holes
            .iter()
            .any(|hole| point_in_ring(hole, p) && !on_ring_boundary(hole, p))
    }
}

/// Whether `segment` properly crosses `edge`. Touching an endpoint of
/// `segment` (a shared hole vertex) does not count; running parallel along
/// the boundary does not count either.
fn crosses(segment: Segment, edge: Segment) -> bool {
    let p = segment_segment_intersection(segment, edge);
    if !p.is_finite() {
        return false;
    }
    if !segment.bbox_contains(p) || !edge.bbox_contains(p) {
        return false;
    }
    p.distance_to(segment.start) > EPS && p.distance_to(segment.end) > EPS
}

/// Distance from `p` to the closest point of `segment`.
fn distance_to_segment(p: Point, segment: Segment) -> f64 {
    let (sx, sy) = (
        segment.end.x - segment.start.x,
        segment.end.y - segment.start.y,
    );
    let len_sq = sx * sx + sy * sy;
    if len_sq < EPS * EPS {
        return p.distance_to(segment.start);
    }
    let t = (((p.x - segment.start.x) * sx + (p.y - segment.start.y) * sy) / len_sq)
        .clamp(0.0, 1.0);
    p.distance_to(Point::new(segment.start.x + t * sx, segment.start.y + t * sy))
}

fn on_ring_boundary(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    (0..n).any(|i| distance_to_segment(p, Segment::new(ring[i], ring[(i + 1) % n])) < EPS)
}

/// Ray-casting point-in-polygon test.
fn point_in_ring(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y)
            && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
