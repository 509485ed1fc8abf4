//! Operating-envelope scan over a horizontal grid.
//!
//! For one installed rig, the scanner answers: at each plan position, how
//! high can the load be held before a cable exceeds its rated tension, and
//! how low before a cable dips within the minimum clearance of the canopy?
//! Both boundaries come from bisection over elevation; cells are mutually
//! independent and evaluated in parallel.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use ndarray::{Array2, Array3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ScanError};
use crate::geometry::{PlanePoint, Point};
use crate::rig::{Equilibrium, TriCableRig};
use crate::terrain::TerrainQuery;

/// Cap on bisection steps per elevation search, on top of the resolution
/// based termination, so pathological geometry cannot loop forever.
const MAX_BISECTION_STEPS: usize = 64;

/// Numeric parameters of an envelope scan, all strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Weight of the suspended load in newtons.
    pub load_weight: f64,
    /// Spacing of the horizontal sample grid in metres.
    pub grid_resolution: f64,
    /// Plan spacing of clearance samples along each cable in metres.
    pub cable_resolution: f64,
    /// Termination width for the elevation bisections in metres.
    pub height_resolution: f64,
    /// Largest permitted anchor tension in newtons.
    pub max_tension: f64,
    /// Smallest permitted cable-to-canopy gap in metres.
    pub min_clearance: f64,
}

impl ScanConfig {
    /// Check that every parameter is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("load_weight", self.load_weight),
            ("grid_resolution", self.grid_resolution),
            ("cable_resolution", self.cable_resolution),
            ("height_resolution", self.height_resolution),
            ("max_tension", self.max_tension),
            ("min_clearance", self.min_clearance),
        ];
        for (parameter, value) in checks {
            if !(value > 0.0) {
                return Err(ConfigError { parameter, value });
            }
        }
        Ok(())
    }
}

/// Progress and cancellation hooks for a running scan.
///
/// Consulted between cells, never mid-bisection, so cancellation is prompt
/// without risking a torn cell. Implementations are called from worker
/// threads and must be cheap.
pub trait ScanObserver: Sync {
    /// Whether the scan should stop before evaluating further cells.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Called after each cell with its plan position and whether the cell
    /// produced a defined envelope.
    fn cell_completed(&self, x: f64, y: f64, defined: bool) {
        let _ = (x, y, defined);
    }
}

/// Observer that never cancels and ignores progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// Result grids of an envelope scan.
///
/// Arrays are indexed `[row, column]` matching `y` and `x`; NaN marks an
/// undefined cell. Every defined cell satisfies `floor <= ceiling`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvelopeMap {
    /// Grid X coordinates, one per column.
    pub x: Vec<f64>,
    /// Grid Y coordinates, one per row.
    pub y: Vec<f64>,
    /// Tension-bounded ceiling elevation per cell.
    pub ceiling: Array2<f64>,
    /// Clearance-bounded floor elevation per cell.
    pub floor: Array2<f64>,
    /// Ground elevation per cell.
    pub ground: Array2<f64>,
    /// Anchor tension of each cable with the load at the floor, indexed
    /// `[row, column, cable]`.
    pub floor_tension: Array3<f64>,
    /// Anchor tension of each cable with the load at the ceiling, indexed
    /// `[row, column, cable]`.
    pub ceiling_tension: Array3<f64>,
    /// False when the scan was cancelled before covering every cell.
    pub complete: bool,
}

impl EnvelopeMap {
    /// Whether the cell at `[row, column]` holds a defined envelope.
    #[must_use]
    pub fn is_defined(&self, row: usize, column: usize) -> bool {
        !self.ceiling[[row, column]].is_nan()
    }
}

/// Envelope of one defined grid cell, prior to aggregation.
#[derive(Clone, Copy, Debug)]
struct CellEnvelope {
    /// Tension-bounded ceiling elevation.
    ceiling: f64,
    /// Clearance-bounded floor elevation.
    floor: f64,
    /// Ground elevation at the cell.
    ground: f64,
    /// Per-cable anchor tensions with the load at the floor.
    floor_tension: [f64; 3],
    /// Per-cable anchor tensions with the load at the ceiling.
    ceiling_tension: [f64; 3],
}

/// Grid scan of the achievable elevation envelope for one rig.
#[derive(Clone, Copy, Debug)]
pub struct EnvelopeScanner {
    /// The installed rig under analysis.
    rig: TriCableRig,
    /// Scan parameters.
    config: ScanConfig,
}

impl EnvelopeScanner {
    /// Create a scanner for a rig with validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any parameter is not strictly positive.
    pub fn new(rig: TriCableRig, config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { rig, config })
    }

    /// Scan the anchor bounding box and compute each cell's envelope.
    ///
    /// Cells are independent and evaluated in parallel; the observer is
    /// checked between cells, and a cancelled scan returns the cells
    /// finished so far with [`EnvelopeMap::complete`] set to false.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvariantViolation`] when a cell's floor
    /// converges above its ceiling, which indicates a solver bug.
    pub fn scan<T: TerrainQuery, O: ScanObserver>(
        &self,
        terrain: &T,
        observer: &O,
    ) -> Result<EnvelopeMap, ScanError> {
        let anchors = self.rig.anchors();
        let xs = grid_axis(
            anchors.iter().map(|a| a.x),
            self.config.grid_resolution,
        );
        let ys = grid_axis(
            anchors.iter().map(|a| a.y),
            self.config.grid_resolution,
        );
        let (rows, columns) = (ys.len(), xs.len());
        debug!("scanning {columns}x{rows} cells at {} m spacing", self.config.grid_resolution);

        let cancelled = AtomicBool::new(false);
        let mut indices = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                indices.push((row, column));
            }
        }

        let cells: Vec<(usize, usize, Option<CellEnvelope>)> = indices
            .into_par_iter()
            .map(|(row, column)| {
                if cancelled.load(Ordering::Relaxed) || observer.is_cancelled() {
                    cancelled.store(true, Ordering::Relaxed);
                    return Ok((row, column, None));
                }
                let (x, y) = (xs[column], ys[row]);
                let outcome = self.evaluate_cell(terrain, x, y)?;
                observer.cell_completed(x, y, outcome.is_some());
                Ok((row, column, outcome))
            })
            .collect::<Result<_, ScanError>>()?;

        let mut map = EnvelopeMap {
            x: xs,
            y: ys,
            ceiling: Array2::from_elem((rows, columns), f64::NAN),
            floor: Array2::from_elem((rows, columns), f64::NAN),
            ground: Array2::from_elem((rows, columns), f64::NAN),
            floor_tension: Array3::from_elem((rows, columns, 3), f64::NAN),
            ceiling_tension: Array3::from_elem((rows, columns, 3), f64::NAN),
            complete: !cancelled.load(Ordering::Relaxed),
        };
        let mut defined = 0_usize;
        for (row, column, outcome) in cells {
            if let Some(cell) = outcome {
                defined += 1;
                map.ceiling[[row, column]] = cell.ceiling;
                map.floor[[row, column]] = cell.floor;
                map.ground[[row, column]] = cell.ground;
                for cable in 0..3 {
                    map.floor_tension[[row, column, cable]] = cell.floor_tension[cable];
                    map.ceiling_tension[[row, column, cable]] = cell.ceiling_tension[cable];
                }
            }
        }
        debug!("scan finished: {defined} defined cells, complete = {}", map.complete);
        Ok(map)
    }

    /// Compute the envelope for one plan position, or `None` when the cell
    /// is undefined.
    ///
    /// Solver failures at a trial height are recoverable by construction:
    /// they mark that height infeasible and narrow the bisection bracket.
    fn evaluate_cell<T: TerrainQuery>(
        &self,
        terrain: &T,
        x: f64,
        y: f64,
    ) -> Result<Option<CellEnvelope>, ScanError> {
        let plan = PlanePoint::new(x, y);
        if !self.rig.contains_plan(plan) {
            return Ok(None);
        }
        // A span of zero has no cable shape, so cells under an anchor stay
        // undefined rather than producing a numeric result.
        if self
            .rig
            .anchors()
            .iter()
            .any(|anchor| anchor.x == x && anchor.y == y)
        {
            return Ok(None);
        }

        let ceiling_bound = self.rig.ceiling(plan);
        let floor_bound = terrain.canopy_elevation(plan);
        if ceiling_bound.is_nan() || floor_bound.is_nan() || ceiling_bound < floor_bound {
            return Ok(None);
        }

        let Some((ceiling, at_ceiling)) = self.find_ceiling(plan, floor_bound, ceiling_bound)
        else {
            return Ok(None);
        };

        // The whole cell fails when even the highest feasible position sits
        // too close to the canopy.
        let ceiling_clearance = at_ceiling.min_clearance(terrain, self.config.cable_resolution);
        if !(ceiling_clearance >= self.config.min_clearance) {
            return Ok(None);
        }

        let (floor, at_floor) =
            self.find_floor(terrain, &at_ceiling, floor_bound, ceiling);

        if floor > ceiling {
            return Err(ScanError::InvariantViolation {
                x,
                y,
                floor,
                ceiling,
            });
        }

        Ok(Some(CellEnvelope {
            ceiling,
            floor,
            ground: terrain.ground_elevation(plan),
            floor_tension: at_floor.anchor_tensions(),
            ceiling_tension: at_ceiling.anchor_tensions(),
        }))
    }

    /// Bisect for the highest elevation whose equilibrium stays within the
    /// tension limit. Favors higher feasible elevations.
    fn find_ceiling(
        &self,
        plan: PlanePoint,
        floor_bound: f64,
        ceiling_bound: f64,
    ) -> Option<(f64, Equilibrium)> {
        let mut low = floor_bound;
        let mut high = ceiling_bound;
        let mut best: Option<(f64, Equilibrium)> = None;
        let mut steps = 0;
        while high - low > self.config.height_resolution && steps < MAX_BISECTION_STEPS {
            steps += 1;
            let z = 0.5 * (low + high);
            let solved = match &best {
                Some((_, previous)) => previous.adjust_elevation(&self.rig, z),
                None => self
                    .rig
                    .solve(Point::new(plan.x, plan.y, z), self.config.load_weight),
            };
            match solved {
                Ok(equilibrium)
                    if equilibrium.max_anchor_tension() <= self.config.max_tension =>
                {
                    best = Some((z, equilibrium));
                    low = z;
                }
                _ => high = z,
            }
        }
        best
    }

    /// Bisect for the lowest elevation that keeps every cable clear of the
    /// canopy. Favors lower feasible elevations; the ceiling itself is a
    /// known-feasible starting point.
    fn find_floor<T: TerrainQuery>(
        &self,
        terrain: &T,
        at_ceiling: &Equilibrium,
        floor_bound: f64,
        ceiling: f64,
    ) -> (f64, Equilibrium) {
        let mut low = floor_bound;
        let mut high = ceiling;
        let mut best = (ceiling, *at_ceiling);
        let mut steps = 0;
        while high - low > self.config.height_resolution && steps < MAX_BISECTION_STEPS {
            steps += 1;
            let z = 0.5 * (low + high);
            let feasible = match best.1.adjust_elevation(&self.rig, z) {
                Ok(equilibrium) => {
                    let clearance =
                        equilibrium.min_clearance(terrain, self.config.cable_resolution);
                    if clearance >= self.config.min_clearance {
                        best = (z, equilibrium);
                        true
                    } else {
                        false
                    }
                }
                Err(_) => false,
            };
            if feasible {
                high = z;
            } else {
                low = z;
            }
        }
        best
    }
}

/// Grid coordinates covering `values`, rounded outward to multiples of
/// `resolution`.
fn grid_axis(values: impl Iterator<Item = f64>, resolution: f64) -> Vec<f64> {
    let mut minimum = f64::INFINITY;
    let mut maximum = f64::NEG_INFINITY;
    for value in values {
        minimum = minimum.min(value);
        maximum = maximum.max(value);
    }
    let start = (minimum / resolution).floor() * resolution;
    let end = (maximum / resolution).ceil() * resolution;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = ((end - start) / resolution).round() as usize + 1;
    (0..count).map(|i| start + i as f64 * resolution).collect()
}
