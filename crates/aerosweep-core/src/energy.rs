//! Physically grounded energy cost model for candidate paths.
//!
//! Cruise power is a fitted quadratic `P(v) = c0 + c1*v + c2*v^2` plus the
//! parasite drag term from the drone's frontal area, floored at the
//! momentum-theory hover power over the propeller disk. The optimal cruise
//! speed minimizes energy per meter, `P(v) / v`. Path energy integrates a
//! trapezoidal speed profile per segment: corners bound the pass-through
//! speed via the allowed path deviation, accelerations spend kinetic energy
//! that braking does not recover, and the battery discharge polynomial maps
//! drawn power to battery power.

use crate::errors::PlanError;
use crate::geometry::{angle_between_vectors, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const AIR_DENSITY: f64 = 1.225;
const GRAVITY: f64 = 9.81;
const NOMINAL_CELL_VOLTAGE: f64 = 3.7;
/// Search range for the optimal cruise speed, m/s.
const SPEED_SEARCH_MAX: f64 = 40.0;

/// Battery discharge model: cell pack size plus the polynomial `d0..d3`
/// mapping drawn power to battery-side power (identity is d1 = 1, rest 0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatteryModel {
    /// Single cell capacity, Ah.
    pub cell_capacity: f64,
    pub number_of_cells: u32,
    pub d0: f64,
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
}

/// Quadratic cruise power fit, W as a function of speed in m/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BestSpeedModel {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Drone and battery physical parameters for one planning request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Takeoff mass, kg.
    pub drone_mass: f64,
    /// Frontal area with drag coefficient folded in, m^2.
    pub drone_area: f64,
    /// Average horizontal acceleration, m/s^2.
    pub average_acceleration: f64,
    /// Propeller radius, m.
    pub propeller_radius: f64,
    pub number_of_propellers: u32,
    /// How far the drone may cut a corner, m. Larger values keep more speed
    /// through turns.
    pub allowed_path_deviation: f64,
    pub battery_model: BatteryModel,
    pub best_speed_model: BestSpeedModel,
}

/// Shared, read-only energy estimator. Safe to use concurrently from
/// multiple cells; all state is fixed at construction.
#[derive(Debug, Clone)]
pub struct EnergyCalculator {
    config: EnergyConfig,
    optimal_speed: f64,
    hover_power: f64,
}

impl EnergyCalculator {
    pub fn new(config: EnergyConfig) -> Result<Self, PlanError> {
        if !(config.drone_mass > 0.0) {
            return Err(PlanError::InvalidConfig(
                "drone mass must be positive".to_string(),
            ));
        }
        if !(config.average_acceleration > 0.0) {
            return Err(PlanError::InvalidConfig(
                "average acceleration must be positive".to_string(),
            ));
        }
        if !(config.propeller_radius > 0.0) || config.number_of_propellers == 0 {
            return Err(PlanError::InvalidConfig(
                "propeller geometry must be positive".to_string(),
            ));
        }
        if config.drone_area < 0.0 || config.allowed_path_deviation < 0.0 {
            return Err(PlanError::InvalidConfig(
                "drone area and path deviation must be non-negative".to_string(),
            ));
        }
        let speed = config.best_speed_model;
        if !(speed.c0 > 0.0) || !(speed.c2 > 0.0) {
            return Err(PlanError::InvalidConfig(
                "best speed model needs positive c0 and c2".to_string(),
            ));
        }
        let battery = config.battery_model;
        if !(battery.cell_capacity > 0.0) || battery.number_of_cells == 0 {
            return Err(PlanError::InvalidConfig(
                "battery pack must have positive capacity".to_string(),
            ));
        }

        let disk_area =
            config.number_of_propellers as f64 * PI * config.propeller_radius.powi(2);
        let weight = config.drone_mass * GRAVITY;
        let hover_power = weight.powf(1.5) / (2.0 * AIR_DENSITY * disk_area).sqrt();

        let mut calculator = Self {
            config,
            optimal_speed: 0.0,
            hover_power,
        };
        calculator.optimal_speed = calculator.find_optimal_speed();
        Ok(calculator)
    }

    /// Cruise speed minimizing energy per unit distance; independent of any
    /// specific path.
    pub fn optimal_speed(&self) -> f64 {
        self.optimal_speed
    }

    /// Total energy stored in the battery pack, J.
    pub fn battery_energy(&self) -> f64 {
        let battery = self.config.battery_model;
        battery.cell_capacity * battery.number_of_cells as f64 * NOMINAL_CELL_VOLTAGE * 3600.0
    }

    /// Power draw at steady cruise speed `v`, W.
    fn power_at(&self, v: f64) -> f64 {
        let speed = self.config.best_speed_model;
        let fitted = speed.c0 + speed.c1 * v + speed.c2 * v * v;
        let drag = 0.5 * AIR_DENSITY * self.config.drone_area * v.powi(3);
        (fitted + drag).max(self.hover_power)
    }

    /// Power drawn from the battery when the motors draw `p`, W.
    fn battery_power(&self, p: f64) -> f64 {
        let b = self.config.battery_model;
        if b.d0 == 0.0 && b.d1 == 0.0 && b.d2 == 0.0 && b.d3 == 0.0 {
            return p;
        }
        b.d0 + b.d1 * p + b.d2 * p * p + b.d3 * p * p * p
    }

    /// Ternary search for the minimizer of P(v)/v. The cost is unimodal for
    /// positive c0 and c2.
    fn find_optimal_speed(&self) -> f64 {
        let per_meter = |v: f64| self.power_at(v) / v;
        let mut lo = 0.1;
        let mut hi = SPEED_SEARCH_MAX;
        for _ in 0..200 {
            let m1 = lo + (hi - lo) / 3.0;
            let m2 = hi - (hi - lo) / 3.0;
            if per_meter(m1) < per_meter(m2) {
                hi = m2;
            } else {
                lo = m1;
            }
        }
        (lo + hi) / 2.0
    }

    /// Maximum speed the drone can carry through a corner with interior
    /// angle `phi` without leaving the allowed deviation corridor.
    fn turn_speed(&self, phi: f64) -> f64 {
        if phi >= PI - 1e-3 {
            return self.optimal_speed;
        }
        let sin_half = (phi / 2.0).sin();
        if sin_half >= 1.0 - 1e-9 {
            return self.optimal_speed;
        }
        // Turning arc tangent to both legs, displaced at most the allowed
        // deviation from the corner.
        let radius = self.config.allowed_path_deviation * sin_half / (1.0 - sin_half);
        (self.config.average_acceleration * radius)
            .sqrt()
            .min(self.optimal_speed)
    }

    /// Energy to traverse `distance` entering at `v_in` and leaving at
    /// `v_out`, using a trapezoidal speed profile capped at the optimal
    /// cruise speed.
    fn segment_energy(&self, distance: f64, v_in: f64, v_out: f64) -> f64 {
        if distance <= 0.0 {
            return 0.0;
        }
        let a = self.config.average_acceleration;
        let cruise = self.optimal_speed;
        let v_in = v_in.min(cruise);
        let v_out = v_out.min(cruise);

        let d_acc = (cruise * cruise - v_in * v_in) / (2.0 * a);
        let d_dec = (cruise * cruise - v_out * v_out) / (2.0 * a);

        let (peak, t_acc, t_cruise, t_dec) = if d_acc + d_dec <= distance {
            (
                cruise,
                (cruise - v_in) / a,
                (distance - d_acc - d_dec) / cruise,
                (cruise - v_out) / a,
            )
        } else {
            // Too short to reach cruise speed; triangular profile.
            let peak = ((2.0 * a * distance + v_in * v_in + v_out * v_out) / 2.0)
                .sqrt()
                .max(v_in.max(v_out));
            (peak, (peak - v_in) / a, 0.0, (peak - v_out) / a)
        };

        let mut energy = self.battery_power(self.power_at((v_in + peak) / 2.0)) * t_acc
            + self.battery_power(self.power_at(peak)) * t_cruise
            + self.battery_power(self.power_at((peak + v_out) / 2.0)) * t_dec;
        // Kinetic energy invested in the acceleration is not recovered when
        // braking back down.
        energy += 0.5 * self.config.drone_mass * (peak * peak - v_in * v_in);
        energy
    }

    /// Estimated energy to fly `path`, J. The drone starts and ends at rest;
    /// interior corners are passed at the deviation-limited turn speed.
    pub fn calculate_path_energy_consumption(&self, path: &[Point]) -> f64 {
        if path.len() < 2 {
            return 0.0;
        }
        let n = path.len();
        let mut speeds = vec![0.0; n];
        for i in 1..n - 1 {
            let swept = angle_between_vectors(path[i - 1], path[i], path[i + 1]);
            // Fold the clockwise angle onto the interior angle in [0, pi].
            let interior = if swept > PI { 2.0 * PI - swept } else { swept };
            speeds[i] = self.turn_speed(interior);
        }

        let mut energy = 0.0;
        for i in 0..n - 1 {
            let distance = path[i].distance_to(path[i + 1]);
            energy += self.segment_energy(distance, speeds[i], speeds[i + 1]);
        }
        energy
    }
}
