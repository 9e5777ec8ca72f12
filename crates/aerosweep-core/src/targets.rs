//! Candidate sweep alternatives ("targets") for decomposed cells.

use crate::energy::EnergyCalculator;
use crate::errors::PlanError;
use crate::geometry::Point;
use crate::models::PathPoint;
use crate::polygon::MapPolygon;
use crate::sweep::{sweeping, thin_polygon_coverage};

/// One candidate coverage sweep over one cell. Immutable once built; the
/// generated path is kept so route assembly never regenerates geometry.
#[derive(Debug, Clone)]
pub struct Target {
    /// Whether the first scan line is traversed upward.
    pub first_line_up: bool,
    /// Rotation angle the sweep was generated with, radians.
    pub rotation_angle: f64,
    /// Estimated energy to fly the sweep, from the shared cost model.
    pub energy_consumption: f64,
    pub starting_point: Point,
    pub end_point: Point,
    /// Index of the owning target set (= decomposed cell).
    pub target_set_index: usize,
    /// Index of this target within its set.
    pub index: usize,
    pub path: Vec<PathPoint>,
}

/// All candidate sweeps for one decomposed cell. Exactly one target from
/// each set appears in a final solution.
#[derive(Debug, Clone)]
pub struct TargetSet {
    pub index: usize,
    pub polygon: MapPolygon,
    pub sweeping_step: f64,
    pub targets: Vec<Target>,
}

impl TargetSet {
    /// Build two targets (both sweep directions) per explicit rotation angle.
    pub fn from_angles(
        index: usize,
        polygon: MapPolygon,
        sweeping_step: f64,
        energy_calculator: &EnergyCalculator,
        rotation_angles: &[f64],
    ) -> Result<Self, PlanError> {
        let mut set = Self {
            index,
            polygon,
            sweeping_step,
            targets: Vec::new(),
        };
        set.add_rotation_angles(energy_calculator, rotation_angles)?;
        Ok(set)
    }

    /// Build targets from the cell's own shape: a single thin-coverage
    /// target when one scan line suffices, otherwise two targets per each of
    /// the `rotations` longest-edge angles.
    pub fn with_edge_rotations(
        index: usize,
        polygon: MapPolygon,
        sweeping_step: f64,
        energy_calculator: &EnergyCalculator,
        rotations: usize,
    ) -> Result<Self, PlanError> {
        let mut set = Self {
            index,
            polygon,
            sweeping_step,
            targets: Vec::new(),
        };
        if let Some(path) = thin_polygon_coverage(&set.polygon, sweeping_step) {
            set.push_target(energy_calculator, true, 0.0, path);
        } else {
            let angles = set.polygon.n_longest_edges_rotation_angles(rotations);
            set.add_rotation_angles(energy_calculator, &angles)?;
        }
        Ok(set)
    }

    fn add_rotation_angles(
        &mut self,
        energy_calculator: &EnergyCalculator,
        rotation_angles: &[f64],
    ) -> Result<(), PlanError> {
        for &angle in rotation_angles {
            for first_line_up in [true, false] {
                let path = sweeping(&self.polygon, angle, self.sweeping_step, first_line_up)?;
                self.push_target(energy_calculator, first_line_up, angle, path);
            }
        }
        Ok(())
    }

    fn push_target(
        &mut self,
        energy_calculator: &EnergyCalculator,
        first_line_up: bool,
        rotation_angle: f64,
        path: Vec<PathPoint>,
    ) {
        let positions: Vec<Point> = path.iter().map(PathPoint::position).collect();
        let energy_consumption = energy_calculator.calculate_path_energy_consumption(&positions);
        self.targets.push(Target {
            first_line_up,
            rotation_angle,
            energy_consumption,
            starting_point: path[0].position(),
            end_point: path[path.len() - 1].position(),
            target_set_index: self.index,
            index: self.targets.len(),
            path,
        });
    }
}
