//! Error taxonomy for the planning pipeline.
//!
//! Every failure the core can produce is one of these variants; nothing in
//! the pipeline panics on malformed input. The boundary layer reports each
//! variant as a distinct, recoverable failure of the whole planning request.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PlanError {
    /// Malformed input polygon (too few points, self-intersecting ring).
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    /// Physically meaningless drone/battery/solver parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Neighbor lookup on a point that belongs to no ring.
    #[error("point ({x}, {y}) does not belong to any polygon ring")]
    PointNotFound { x: f64, y: f64 },

    /// Degenerate geometry encountered during cell decomposition.
    #[error("polygon decomposition failed: {0}")]
    Decomposition(String),

    /// The visibility graph admits no collision-free path between two points.
    #[error("no collision-free path from ({from_x}, {from_y}) to ({to_x}, {to_y})")]
    Unreachable {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
    },

    /// No assignment covers all cells with the available drones.
    #[error("planning infeasible: {0}")]
    Infeasible(String),
}
