//! End-to-end planning pipeline.

use crate::decomposition::decompose;
use crate::energy::EnergyCalculator;
use crate::errors::PlanError;
use crate::models::{PlanRequest, PlanResult};
use crate::polygon::MapPolygon;
use crate::shortest_path::ShortestPathCalculator;
use crate::solver::RouteSolver;
use crate::targets::TargetSet;

/// Plan coverage routes for every drone in the request.
///
/// Pipeline: validate and normalize the polygon, build the hole-aware path
/// calculator on the original frame, decompose into convex cells under the
/// requested rotation, subdivide oversized cells, generate sweep candidates
/// per cell, and hand everything to the route solver.
pub fn plan_coverage_routes(request: &PlanRequest) -> Result<PlanResult, PlanError> {
    if request.polygon.fly_zone.len() < 3 {
        return Err(PlanError::InvalidPolygon(
            "fly zone needs at least 3 points".to_string(),
        ));
    }
    let mut polygon = request.polygon.clone();
    polygon.make_clockwise();
    if !polygon.is_simple() {
        return Err(PlanError::InvalidPolygon(
            "fly zone boundary intersects itself".to_string(),
        ));
    }

    // Transfer legs are planned in the original frame, not the rotated one.
    let path_calculator = ShortestPathCalculator::new(&polygon);
    let energy_calculator = EnergyCalculator::new(request.energy)?;

    let rotation = request.decomposition_rotation;
    let cells: Vec<MapPolygon> = decompose(&polygon.rotated(rotation), request.decomposition)?
        .iter()
        .map(|cell| cell.rotated(-rotation))
        .collect();

    let max_cell_area = if request.max_cell_area > 0.0 {
        request.max_cell_area
    } else {
        f64::MAX
    };
    let mut pieces: Vec<MapPolygon> = Vec::with_capacity(cells.len());
    for cell in cells {
        pieces.extend(cell.split_into_pieces(max_cell_area));
    }

    let rotations = request.solver.rotations_per_cell.max(1);
    let target_sets: Vec<TargetSet> = pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            TargetSet::with_edge_rotations(
                index,
                piece,
                request.solver.sweeping_step,
                &energy_calculator,
                rotations,
            )
        })
        .collect::<Result<_, _>>()?;

    let cell_count = target_sets.len();
    let optimal_speed = energy_calculator.optimal_speed();
    let solver = RouteSolver::new(
        request.solver,
        target_sets,
        energy_calculator,
        path_calculator,
    )?;
    let routes = solver.solve()?;

    Ok(PlanResult {
        routes,
        cell_count,
        optimal_speed,
    })
}
