//! End-to-end planning pipeline tests.

use aerosweep_core::{
    plan_coverage_routes, BatteryModel, BestSpeedModel, DecompositionType, EnergyConfig,
    MapPolygon, PlanError, PlanRequest, Point, SolverConfig,
};

fn energy_config() -> EnergyConfig {
    EnergyConfig {
        drone_mass: 3.5,
        // No frontal area keeps the optimal speed at the quadratic
        // minimum sqrt(c0/c2) = 10 m/s.
        drone_area: 0.0,
        average_acceleration: 2.0,
        propeller_radius: 0.12,
        number_of_propellers: 4,
        allowed_path_deviation: 1.0,
        battery_model: BatteryModel {
            cell_capacity: 5.2,
            number_of_cells: 6,
            d0: 0.0,
            d1: 1.0,
            d2: 0.0,
            d3: 0.0,
        },
        best_speed_model: BestSpeedModel {
            c0: 200.0,
            c1: 1.5,
            c2: 2.0,
        },
    }
}

fn request(polygon: MapPolygon, drones: usize) -> PlanRequest {
    PlanRequest {
        polygon,
        solver: SolverConfig {
            rotations_per_cell: 1,
            sweeping_step: 5.0,
            starting_point: Point::new(-10.0, -10.0),
            number_of_drones: drones,
            drones_altitude: 30.0,
            unique_altitude_step: 4.0,
            rng_seed: 42,
        },
        energy: energy_config(),
        max_cell_area: 0.0,
        decomposition_rotation: 0.0,
        decomposition: DecompositionType::MergedConvex,
    }
}

fn square(side: f64) -> MapPolygon {
    MapPolygon::new(
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ],
        Vec::new(),
    )
}

#[test]
fn square_single_drone_full_coverage() {
    let result = plan_coverage_routes(&request(square(100.0), 1)).unwrap();
    assert_eq!(result.cell_count, 1);
    assert!((result.optimal_speed - 10.0).abs() < 0.1);
    assert_eq!(result.routes.len(), 1);

    let route = &result.routes[0];
    // Takeoff point plus a direct leg to the first corner plus 21 scan
    // lines with two turn points each.
    assert_eq!(route.waypoints.len(), 43);
    let first = &route.waypoints[0];
    assert_eq!((first.x, first.y), (-10.0, -10.0));
    assert!(route.waypoints.iter().all(|w| w.altitude_m == 30.0));
    assert!(route.energy_consumption > 0.0);

    // Every waypoint after takeoff stays in the fly zone.
    for w in &route.waypoints[1..] {
        assert!(w.x >= -1e-6 && w.x <= 100.0 + 1e-6, "x out of bounds: {w:?}");
        assert!(w.y >= -1e-6 && w.y <= 100.0 + 1e-6, "y out of bounds: {w:?}");
    }
}

#[test]
fn hole_is_respected_by_both_drones() {
    let polygon = MapPolygon::new(
        square(100.0).fly_zone,
        vec![vec![
            Point::new(40.0, 40.0),
            Point::new(60.0, 40.0),
            Point::new(60.0, 60.0),
            Point::new(40.0, 60.0),
        ]],
    );
    let result = plan_coverage_routes(&request(polygon, 2)).unwrap();
    assert_eq!(result.routes.len(), 2);
    assert!(result.cell_count >= 3);

    let margin = 1e-6;
    for route in &result.routes {
        // The staggered landing offset may shift the very last waypoint,
        // so only flight waypoints are held to the no-fly zone.
        let flight = &route.waypoints[..route.waypoints.len() - 1];
        for w in flight {
            let strictly_inside = w.x > 40.0 + margin
                && w.x < 60.0 - margin
                && w.y > 40.0 + margin
                && w.y < 60.0 - margin;
            assert!(!strictly_inside, "waypoint inside the no-fly zone: {w:?}");
        }
    }
    assert!(result.routes[0]
        .waypoints
        .iter()
        .all(|w| w.altitude_m == 30.0));
    assert!(result.routes[1]
        .waypoints
        .iter()
        .all(|w| w.altitude_m == 34.0));
}

#[test]
fn two_drones_share_a_zone_split_by_a_hole() {
    // A tall central hole leaves two big halves linked only by narrow
    // corridors at the top and bottom.
    let polygon = MapPolygon::new(
        square(100.0).fly_zone,
        vec![vec![
            Point::new(45.0, 10.0),
            Point::new(55.0, 10.0),
            Point::new(55.0, 90.0),
            Point::new(45.0, 90.0),
        ]],
    );
    let result = plan_coverage_routes(&request(polygon, 2)).unwrap();
    assert_eq!(result.routes.len(), 2);
    // Both drones get real work assigned, in near-equal shares.
    let (e0, e1) = (
        result.routes[0].energy_consumption,
        result.routes[1].energy_consumption,
    );
    assert!(e0 > 0.0);
    assert!(e1 > 0.0);
    assert!(e0.max(e1) / e0.min(e1) < 1.5, "unbalanced routes: {e0} vs {e1}");
    for route in &result.routes {
        assert!(route.waypoints.len() > 1);
        let flight = &route.waypoints[..route.waypoints.len() - 1];
        for w in flight {
            let strictly_inside =
                w.x > 45.0 + 1e-6 && w.x < 55.0 - 1e-6 && w.y > 10.0 + 1e-6 && w.y < 90.0 - 1e-6;
            assert!(!strictly_inside, "waypoint inside the no-fly zone: {w:?}");
        }
    }
}

#[test]
fn max_cell_area_subdivides_cells() {
    let mut req = request(square(100.0), 1);
    req.max_cell_area = 3000.0;
    let result = plan_coverage_routes(&req).unwrap();
    assert_eq!(result.cell_count, 4);
}

#[test]
fn decomposition_rotation_still_covers_the_polygon() {
    let mut req = request(square(100.0), 1);
    req.decomposition_rotation = 0.5;
    let result = plan_coverage_routes(&req).unwrap();
    let route = &result.routes[0];
    for w in &route.waypoints[1..] {
        assert!(w.x >= -1e-5 && w.x <= 100.0 + 1e-5);
        assert!(w.y >= -1e-5 && w.y <= 100.0 + 1e-5);
    }
}

#[test]
fn self_intersecting_fly_zone_is_rejected() {
    let bow_tie = MapPolygon::new(
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ],
        Vec::new(),
    );
    assert!(matches!(
        plan_coverage_routes(&request(bow_tie, 1)),
        Err(PlanError::InvalidPolygon(_))
    ));
}

#[test]
fn request_round_trips_through_json_with_defaults() {
    let json = r#"{
        "polygon": {
            "fly_zone": [
                {"x": 0.0, "y": 0.0},
                {"x": 50.0, "y": 0.0},
                {"x": 50.0, "y": 50.0},
                {"x": 0.0, "y": 50.0}
            ],
            "no_fly_zones": []
        },
        "solver": {
            "rotations_per_cell": 1,
            "sweeping_step": 5.0,
            "starting_point": {"x": -5.0, "y": -5.0},
            "number_of_drones": 1,
            "drones_altitude": 25.0,
            "unique_altitude_step": 2.0
        },
        "energy": {
            "drone_mass": 3.5,
            "drone_area": 0.1,
            "average_acceleration": 2.0,
            "propeller_radius": 0.12,
            "number_of_propellers": 4,
            "allowed_path_deviation": 1.0,
            "battery_model": {
                "cell_capacity": 5.2,
                "number_of_cells": 6,
                "d0": 0.0, "d1": 1.0, "d2": 0.0, "d3": 0.0
            },
            "best_speed_model": {"c0": 200.0, "c1": 1.5, "c2": 2.0}
        }
    }"#;
    let req: PlanRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.decomposition, DecompositionType::MergedConvex);
    assert_eq!(req.max_cell_area, 0.0);
    assert_eq!(req.solver.rng_seed, 0);

    let result = plan_coverage_routes(&req).unwrap();
    let serialized = serde_json::to_string(&result).unwrap();
    assert!(serialized.contains("\"routes\""));
    assert!(serialized.contains("\"optimal_speed\""));
}
