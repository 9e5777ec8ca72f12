//! Boustrophedon coverage path generation for convex cells.

use crate::errors::PlanError;
use crate::geometry::Point;
use crate::models::PathPoint;
use crate::polygon::MapPolygon;

const EPS: f64 = 1e-9;

/// Generate a back-and-forth sweep over `polygon`.
///
/// The polygon is rotated by `angle` so scan lines become vertical, scan
/// lines spaced `step` apart cover the full x span (both borders included),
/// each line's coverage interval comes from boundary intersections, and
/// consecutive intervals are linked into a boustrophedon. `first_line_up`
/// selects whether the first line is traversed bottom-to-top; this decides
/// which corner the path enters and leaves at, which matters when stitching
/// cells together. The result is rotated back to the original frame.
pub fn sweeping(
    polygon: &MapPolygon,
    angle: f64,
    step: f64,
    first_line_up: bool,
) -> Result<Vec<PathPoint>, PlanError> {
    if !(step > 0.0) {
        return Err(PlanError::InvalidConfig(
            "sweeping step must be positive".to_string(),
        ));
    }
    let rotated = polygon.rotated(angle);
    let (min, max) = rotated.bounds();
    if !min.is_finite() || !max.is_finite() {
        return Err(PlanError::Decomposition(
            "cannot sweep an empty polygon".to_string(),
        ));
    }

    let span = max.x - min.x;
    let lines = (span / step).ceil() as usize;
    let mut points: Vec<Point> = Vec::with_capacity((lines + 1) * 2);
    let mut up = first_line_up;
    for i in 0..=lines {
        let x = (min.x + i as f64 * step).min(max.x);
        let Some((y_low, y_high)) = cross_section(&rotated, x) else {
            // A single degenerate scan line is skipped, not fatal.
            continue;
        };
        if up {
            points.push(Point::new(x, y_low));
            points.push(Point::new(x, y_high));
        } else {
            points.push(Point::new(x, y_high));
            points.push(Point::new(x, y_low));
        }
        up = !up;
    }
    if points.len() < 2 {
        return Err(PlanError::Decomposition(
            "sweep produced no coverage interval".to_string(),
        ));
    }

    let restored: Vec<Point> = points.iter().map(|p| p.rotated(-angle)).collect();
    Ok(with_headings(&restored))
}

/// Single-line coverage for polygons thinner than the sweep step.
///
/// Returns the two centerline endpoints when the polygon's minor-axis extent
/// (minimized over edge-aligned rotations) is at most `step`, and `None`
/// otherwise so the caller falls back to full sweeping.
pub fn thin_polygon_coverage(polygon: &MapPolygon, step: f64) -> Option<Vec<PathPoint>> {
    if polygon.fly_zone.len() < 3 || !(step > 0.0) {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    for angle in polygon.n_longest_edges_rotation_angles(polygon.fly_zone.len()) {
        let (min, max) = polygon.rotated(angle).bounds();
        let extent = max.y - min.y;
        if best.map_or(true, |(e, _)| extent < e) {
            best = Some((extent, angle));
        }
    }
    let (extent, angle) = best?;
    if extent > step + EPS {
        return None;
    }

    let rotated = polygon.rotated(angle);
    let (min, max) = rotated.bounds();
    let y_center = (min.y + max.y) / 2.0;
    let line = [
        Point::new(min.x, y_center).rotated(-angle),
        Point::new(max.x, y_center).rotated(-angle),
    ];
    Some(with_headings(&line))
}

/// Coverage interval of the vertical line at `x`, from intersections with
/// every ring edge. `None` when the line misses the polygon.
fn cross_section(polygon: &MapPolygon, x: f64) -> Option<(f64, f64)> {
    let mut y_low = f64::INFINITY;
    let mut y_high = f64::NEG_INFINITY;
    let mut hit = false;
    for edge in polygon.all_segments() {
        let (a, b) = (edge.start, edge.end);
        if (a.x - b.x).abs() < EPS {
            if (a.x - x).abs() < EPS {
                y_low = y_low.min(a.y.min(b.y));
                y_high = y_high.max(a.y.max(b.y));
                hit = true;
            }
            continue;
        }
        if x < a.x.min(b.x) - EPS || x > a.x.max(b.x) + EPS {
            continue;
        }
        let t = ((x - a.x) / (b.x - a.x)).clamp(0.0, 1.0);
        let y = a.y + t * (b.y - a.y);
        y_low = y_low.min(y);
        y_high = y_high.max(y);
        hit = true;
    }
    hit.then_some((y_low, y_high))
}

/// Attach per-segment headings: each point carries the direction of the
/// segment leaving it, the last point repeats the incoming direction.
fn with_headings(points: &[Point]) -> Vec<PathPoint> {
    let mut out = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let heading = if i + 1 < points.len() {
            let next = points[i + 1];
            (next.y - p.y).atan2(next.x - p.x)
        } else {
            out.last().map_or(0.0, |prev: &PathPoint| prev.heading)
        };
        out.push(PathPoint {
            x: p.x,
            y: p.y,
            heading,
        });
    }
    out
}
