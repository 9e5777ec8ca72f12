pub mod decomposition;
pub mod energy;
pub mod errors;
pub mod geometry;
pub mod models;
pub mod planner;
pub mod polygon;
pub mod shortest_path;
pub mod solver;
pub mod sweep;
pub mod targets;

pub use decomposition::decompose;
pub use energy::{BatteryModel, BestSpeedModel, EnergyCalculator, EnergyConfig};
pub use errors::PlanError;
pub use geometry::{Point, Segment};
pub use models::{
    DecompositionType, DroneRoute, PathPoint, PlanRequest, PlanResult, Waypoint,
};
pub use planner::plan_coverage_routes;
pub use polygon::MapPolygon;
pub use shortest_path::ShortestPathCalculator;
pub use solver::{RouteSolver, SolutionCost, SolverConfig};
pub use sweep::{sweeping, thin_polygon_coverage};
pub use targets::{Target, TargetSet};
