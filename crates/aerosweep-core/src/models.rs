//! Data model shared across the planning pipeline.

use crate::geometry::Point;
use crate::polygon::MapPolygon;
use serde::{Deserialize, Serialize};

/// A 2-D path sample with the heading of the segment leaving it, radians in
/// the plane (0 = +x, CCW positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl PathPoint {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A waypoint emitted to one drone: position, cruise altitude and heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub altitude_m: f64,
    pub heading: f64,
}

/// The ordered waypoint sequence assigned to one drone, never mutated after
/// the solver emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneRoute {
    pub waypoints: Vec<Waypoint>,
    /// Estimated energy for the whole route, in the cost model's units.
    pub energy_consumption: f64,
}

/// Which cell shapes the decomposition emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionType {
    /// Raw trapezoids between consecutive sweep lines.
    Trapezoidal,
    /// Adjacent compatible trapezoids merged into larger convex cells;
    /// fewer cells and turns at the cost of cell complexity.
    #[default]
    MergedConvex,
}

/// One planning request at the core boundary. Coordinates are already in a
/// local planar meters frame; GPS conversion and file parsing happen before
/// this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub polygon: MapPolygon,
    pub solver: crate::solver::SolverConfig,
    pub energy: crate::energy::EnergyConfig,
    /// Maximum decomposed cell area; 0 (or omitted) disables subdivision.
    #[serde(default)]
    pub max_cell_area: f64,
    /// Rotation applied to the polygon before decomposition, radians.
    #[serde(default)]
    pub decomposition_rotation: f64,
    #[serde(default)]
    pub decomposition: DecompositionType,
}

/// Planner output: one route per drone, in the request's meters frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub routes: Vec<DroneRoute>,
    /// Number of convex cells after decomposition and area subdivision.
    pub cell_count: usize,
    /// Cruise speed the energy model considers optimal, m/s.
    pub optimal_speed: f64,
}
