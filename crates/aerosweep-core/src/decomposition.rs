//! Convex cell decomposition by vertical trapezoidal sweep.
//!
//! The polygon (already rotated so the sweep direction is vertical) is cut
//! at every vertex x-coordinate of every ring. Between two consecutive cut
//! lines each edge either spans the whole slab or lies outside it, so the
//! in-polygon cross-section is an even-odd pairing of the slab-spanning
//! edges sorted by height. Every pair bounds one trapezoid cell; hole edges
//! participate in the pairing, which is what truncates cells around no-fly
//! zones.

use crate::errors::PlanError;
use crate::geometry::Point;
use crate::models::DecompositionType;
use crate::polygon::MapPolygon;

const EPS: f64 = 1e-9;

/// An edge oriented left-to-right, restricted to non-vertical edges.
#[derive(Debug, Clone, Copy)]
struct SweepEdge {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl SweepEdge {
    fn y_at(&self, x: f64) -> f64 {
        let t = (x - self.x1) / (self.x2 - self.x1);
        self.y1 + t.clamp(0.0, 1.0) * (self.y2 - self.y1)
    }
}

/// A maximal run of merged slab cross-sections: the boundary columns
/// (x, y_low, y_high) of one output cell from left to right.
#[derive(Debug, Clone)]
struct Band {
    columns: Vec<(f64, f64, f64)>,
}

impl Band {
    fn right_column(&self) -> (f64, f64, f64) {
        *self.columns.last().expect("band has at least one column")
    }

    /// Whether appending the column keeps the band's region convex: the
    /// lower chain must keep non-decreasing slopes and the upper chain
    /// non-increasing ones.
    fn stays_convex_with(&self, x: f64, y_low: f64, y_high: f64) -> bool {
        if self.columns.len() < 2 {
            return true;
        }
        let (px, pl, ph) = self.columns[self.columns.len() - 1];
        let (qx, ql, qh) = self.columns[self.columns.len() - 2];
        let prev_low_slope = (pl - ql) / (px - qx);
        let prev_high_slope = (ph - qh) / (px - qx);
        let low_slope = (y_low - pl) / (x - px);
        let high_slope = (y_high - ph) / (x - px);
        low_slope >= prev_low_slope - EPS && high_slope <= prev_high_slope + EPS
    }

    fn into_polygon(self) -> MapPolygon {
        let mut ring: Vec<Point> = Vec::with_capacity(self.columns.len() * 2);
        let mut push = |ring: &mut Vec<Point>, p: Point| {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        };
        for &(x, y_low, _) in &self.columns {
            push(&mut ring, Point::new(x, y_low));
        }
        for &(x, _, y_high) in self.columns.iter().rev() {
            push(&mut ring, Point::new(x, y_high));
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        let mut polygon = MapPolygon::new(ring, Vec::new());
        polygon.make_clockwise();
        polygon
    }
}

/// Decompose `polygon` into convex cells suitable for straight-line sweeps.
///
/// Fails with [`PlanError::Decomposition`] on degenerate input (zero-width
/// geometry, cross-sections with an odd number of boundary edges).
pub fn decompose(
    polygon: &MapPolygon,
    mode: DecompositionType,
) -> Result<Vec<MapPolygon>, PlanError> {
    if polygon.fly_zone.len() < 3 {
        return Err(PlanError::Decomposition(
            "fly zone has fewer than 3 points".to_string(),
        ));
    }

    let edges: Vec<SweepEdge> = polygon
        .all_segments()
        .filter(|s| (s.start.x - s.end.x).abs() > EPS)
        .map(|s| {
            if s.start.x < s.end.x {
                SweepEdge {
                    x1: s.start.x,
                    y1: s.start.y,
                    x2: s.end.x,
                    y2: s.end.y,
                }
            } else {
                SweepEdge {
                    x1: s.end.x,
                    y1: s.end.y,
                    x2: s.start.x,
                    y2: s.start.y,
                }
            }
        })
        .collect();
    if edges.is_empty() {
        return Err(PlanError::Decomposition(
            "polygon has no non-vertical edges".to_string(),
        ));
    }

    let mut xs: Vec<f64> = polygon.all_points().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup_by(|a, b| (*a - *b).abs() < EPS);
    if xs.len() < 2 {
        return Err(PlanError::Decomposition(
            "polygon collapses to a single sweep line".to_string(),
        ));
    }

    let mut open: Vec<Band> = Vec::new();
    let mut closed: Vec<Band> = Vec::new();

    for slab in xs.windows(2) {
        let (xl, xr) = (slab[0], slab[1]);

        let mut spanning: Vec<&SweepEdge> = edges
            .iter()
            .filter(|e| e.x1 <= xl + EPS && e.x2 >= xr - EPS)
            .collect();
        let xm = (xl + xr) / 2.0;
        spanning.sort_by(|a, b| a.y_at(xm).total_cmp(&b.y_at(xm)));
        if spanning.len() % 2 != 0 {
            return Err(PlanError::Decomposition(format!(
                "open cross-section between x = {xl} and x = {xr}; inconsistent ring winding"
            )));
        }

        let mut next_open: Vec<Band> = Vec::new();
        for pair in spanning.chunks(2) {
            let (low, high) = (pair[0], pair[1]);
            let (ll, lr) = (low.y_at(xl), low.y_at(xr));
            let (hl, hr) = (high.y_at(xl), high.y_at(xr));
            if hl - ll < EPS && hr - lr < EPS {
                // Zero-area slice.
                continue;
            }

            let mergeable = mode == DecompositionType::MergedConvex;
            let adopted = if mergeable {
                open.iter().position(|band| {
                    let (bx, bl, bh) = band.right_column();
                    (bx - xl).abs() < EPS
                        && (bl - ll).abs() < EPS
                        && (bh - hl).abs() < EPS
                        && band.stays_convex_with(xr, lr, hr)
                })
            } else {
                None
            };

            match adopted {
                Some(i) => {
                    let mut band = open.remove(i);
                    band.columns.push((xr, lr, hr));
                    next_open.push(band);
                }
                None => next_open.push(Band {
                    columns: vec![(xl, ll, hl), (xr, lr, hr)],
                }),
            }
        }

        // Bands nothing adopted are finished cells.
        closed.append(&mut open);
        open = next_open;
    }
    closed.append(&mut open);

    let cells: Vec<MapPolygon> = closed
        .into_iter()
        .map(Band::into_polygon)
        .filter(|c| c.fly_zone.len() >= 3 && c.area() > EPS)
        .collect();
    if cells.is_empty() {
        return Err(PlanError::Decomposition(
            "decomposition produced no usable cells".to_string(),
        ));
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn clockwise(mut polygon: MapPolygon) -> MapPolygon {
        polygon.make_clockwise();
        polygon
    }

    fn square(side: f64) -> MapPolygon {
        clockwise(MapPolygon::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(side, 0.0),
                Point::new(side, side),
                Point::new(0.0, side),
            ],
            Vec::new(),
        ))
    }

    #[test]
    fn square_decomposes_into_itself() {
        let cells = decompose(&square(100.0), DecompositionType::MergedConvex).unwrap();
        assert_eq!(cells.len(), 1);
        assert!((cells[0].area() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn l_shape_yields_two_merged_cells() {
        let l_shape = clockwise(MapPolygon::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(20.0, 0.0),
                Point::new(20.0, 10.0),
                Point::new(10.0, 10.0),
                Point::new(10.0, 20.0),
                Point::new(0.0, 20.0),
            ],
            Vec::new(),
        ));
        let cells = decompose(&l_shape, DecompositionType::MergedConvex).unwrap();
        assert_eq!(cells.len(), 2);
        let total: f64 = cells.iter().map(|c| c.area()).sum();
        assert!((total - 300.0).abs() < 1e-6);
    }

    #[test]
    fn hole_truncates_cells() {
        let holed = clockwise(MapPolygon::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(30.0, 0.0),
                Point::new(30.0, 30.0),
                Point::new(0.0, 30.0),
            ],
            vec![vec![
                Point::new(10.0, 10.0),
                Point::new(20.0, 10.0),
                Point::new(20.0, 20.0),
                Point::new(10.0, 20.0),
            ]],
        ));
        let cells = decompose(&holed, DecompositionType::MergedConvex).unwrap();
        let total: f64 = cells.iter().map(|c| c.area()).sum();
        // Fly zone minus the hole.
        assert!((total - 800.0).abs() < 1e-6);
        assert!(cells.len() >= 3);
    }

    #[test]
    fn trapezoidal_mode_emits_one_cell_per_slab_section() {
        let triangle = clockwise(MapPolygon::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(5.0, 10.0),
            ],
            Vec::new(),
        ));
        let cells = decompose(&triangle, DecompositionType::Trapezoidal).unwrap();
        assert_eq!(cells.len(), 2);
        let total: f64 = cells.iter().map(|c| c.area()).sum();
        assert!((total - 50.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_input_is_reported() {
        let sliver = MapPolygon::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 5.0),
                Point::new(0.0, 10.0),
            ],
            Vec::new(),
        );
        assert!(matches!(
            decompose(&sliver, DecompositionType::MergedConvex),
            Err(PlanError::Decomposition(_))
        ));
    }
}
