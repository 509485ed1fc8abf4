//! Error types produced while solving cable shapes, equilibria and scans.

use thiserror::Error;

/// Error returned when a single cable's shape or tension cannot be solved.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum CableError {
    /// Returned when the horizontal tension component is zero or negative.
    ///
    /// A cable that would need `Th <= 0` is slack or in compression and has
    /// no catenary shape.
    #[error("horizontal tension must be positive (received {0})")]
    NonPositiveTension(f64),
    /// Returned when the weight per unit length is zero or negative.
    #[error("unit weight must be positive (received {0})")]
    NonPositiveUnitWeight(f64),
    /// Returned when the endpoints coincide in plan view.
    #[error("cable span must be positive (received {span})")]
    DegenerateGeometry {
        /// Rejected horizontal span in metres.
        span: f64,
    },
    /// Returned when no real catenary passes through the requested endpoints.
    ///
    /// This happens for ill-conditioned span-to-scale ratios where the
    /// intermediate terms of the closed-form solution are not representable.
    #[error("no real catenary solution for span {span} at scale {scale}")]
    UnsolvableGeometry {
        /// Horizontal span in metres.
        span: f64,
        /// Catenary scale `a = Th / u` in metres.
        scale: f64,
    },
    /// Returned when the iterative tension fit exceeds its iteration budget.
    #[error("tension fit did not converge after {iterations} iterations (residual {residual})")]
    ConvergenceFailure {
        /// Number of iterations performed before giving up.
        iterations: usize,
        /// Remaining tension residual in newtons.
        residual: f64,
    },
}

/// Error returned when a three-cable rig cannot be constructed.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum RigError {
    /// Returned when the cable weight per unit length is zero or negative.
    #[error("unit weight must be positive (received {0})")]
    NonPositiveUnitWeight(f64),
    /// Returned when the anchor plan positions do not form a triangle.
    #[error("anchor plan positions are collinear or coincident")]
    CollinearAnchors,
    /// Returned when terrain elevation is unknown at a requested mast base.
    #[error("ground elevation is unknown at plan point ({x}, {y})")]
    UnknownGround {
        /// Plan X coordinate of the mast base.
        x: f64,
        /// Plan Y coordinate of the mast base.
        y: f64,
    },
}

/// Error returned when a load cannot be balanced by the three cables.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum EquilibriumError {
    /// Returned when the load weight is zero or negative.
    #[error("load weight must be positive (received {0})")]
    NonPositiveWeight(f64),
    /// Returned when the anchor directions cannot span the gravity vector,
    /// typically because the load point coincides with an anchor.
    #[error("anchor directions are degenerate for this load position")]
    SingularGeometry,
    /// Returned when supporting the load would require pushing on a cable.
    ///
    /// Even with massless cables the geometry demands a negative line
    /// tension, so the position is unreachable.
    #[error("cable {cable} would carry negative tension ({tension}); load is unsupportable")]
    InfeasibleLoad {
        /// Index of the cable requiring negative tension.
        cable: usize,
        /// Solved straight-line tension in newtons.
        tension: f64,
    },
    /// Returned when the vertical balance refinement exceeds its budget.
    #[error("vertical balance did not converge after {iterations} iterations (residual {residual})")]
    NotConverged {
        /// Number of iterations performed before giving up.
        iterations: usize,
        /// Remaining vertical force residual in newtons.
        residual: f64,
    },
    /// Returned when one of the cables has no valid shape for the trial
    /// tensions.
    #[error(transparent)]
    Cable(#[from] CableError),
}

/// Error returned when building terrain from raster data.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TerrainError {
    /// Returned when the ground and canopy rasters have different shapes.
    #[error("ground raster is {ground:?} but canopy raster is {canopy:?}")]
    ShapeMismatch {
        /// Shape of the ground raster as (rows, columns).
        ground: (usize, usize),
        /// Shape of the canopy raster as (rows, columns).
        canopy: (usize, usize),
    },
    /// Returned when the raster cell size is zero or negative.
    #[error("raster cell size must be positive (received {0})")]
    NonPositiveCellSize(f64),
}

/// Error returned when a scan configuration parameter is rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("{parameter} must be positive (received {value})")]
pub struct ConfigError {
    /// Name of the offending parameter.
    pub parameter: &'static str,
    /// Rejected value.
    pub value: f64,
}

/// Error returned when an envelope scan fails outright.
///
/// Solver failures at individual trial heights are recoverable and simply
/// narrow the search; this type covers the fatal cases only.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ScanError {
    /// Returned when the scan configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Returned when a cell's floor converges above its ceiling.
    ///
    /// This indicates a solver bug rather than physical infeasibility and is
    /// never recovered locally.
    #[error("floor {floor} converged above ceiling {ceiling} at plan point ({x}, {y})")]
    InvariantViolation {
        /// Plan X coordinate of the offending cell.
        x: f64,
        /// Plan Y coordinate of the offending cell.
        y: f64,
        /// Converged floor elevation.
        floor: f64,
        /// Converged ceiling elevation.
        ceiling: f64,
    },
}
