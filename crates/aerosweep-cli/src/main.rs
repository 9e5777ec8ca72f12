//! Coverage route planner CLI: read a JSON plan request, run the planner,
//! write the routes as JSON.

use aerosweep_core::{plan_coverage_routes, EnergyCalculator, PlanRequest};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the plan request JSON file
    request: PathBuf,

    /// Output file for the resulting routes; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aerosweep_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.request)
        .with_context(|| format!("reading request file {}", args.request.display()))?;
    let request: PlanRequest =
        serde_json::from_str(&raw).context("parsing plan request JSON")?;

    tracing::info!(
        drones = request.solver.number_of_drones,
        fly_zone_points = request.polygon.fly_zone.len(),
        no_fly_zones = request.polygon.no_fly_zones.len(),
        "planning coverage routes"
    );

    let result = plan_coverage_routes(&request)?;

    tracing::info!(
        cells = result.cell_count,
        optimal_speed_mps = format!("{:.2}", result.optimal_speed).as_str(),
        "plan complete"
    );
    let battery_energy = EnergyCalculator::new(request.energy)?.battery_energy();
    for (i, route) in result.routes.iter().enumerate() {
        tracing::info!(
            drone = i,
            waypoints = route.waypoints.len(),
            energy_j = format!("{:.0}", route.energy_consumption).as_str(),
            "route assembled"
        );
        if route.energy_consumption > battery_energy {
            tracing::warn!(
                drone = i,
                "estimated route energy exceeds the battery capacity"
            );
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing routes to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
