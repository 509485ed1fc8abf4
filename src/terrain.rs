//! Terrain elevation queries consumed by the envelope scanner.
//!
//! The solver core never reads elevation data itself; it asks a
//! [`TerrainQuery`] implementation for ground and canopy heights at plan
//! points. Points outside the implementation's coverage return NaN, which
//! callers treat as "clearance unknown".

use ndarray::Array2;

use crate::errors::TerrainError;
use crate::geometry::PlanePoint;

/// Source of ground and obstacle elevations over the horizontal plane.
///
/// Implementations must be cheap, synchronous and side-effect free; the
/// scanner calls them from multiple worker threads.
pub trait TerrainQuery: Sync {
    /// Ground surface elevation at a plan point, or NaN outside coverage.
    fn ground_elevation(&self, point: PlanePoint) -> f64;

    /// Canopy (obstacle) surface elevation at a plan point, or NaN outside
    /// coverage. Never below the ground surface for sane data.
    fn canopy_elevation(&self, point: PlanePoint) -> f64;

    /// Ground elevations for a batch of plan points.
    fn ground_elevations(&self, points: &[PlanePoint]) -> Vec<f64> {
        points.iter().map(|&p| self.ground_elevation(p)).collect()
    }

    /// Canopy elevations for a batch of plan points.
    fn canopy_elevations(&self, points: &[PlanePoint]) -> Vec<f64> {
        points.iter().map(|&p| self.canopy_elevation(p)).collect()
    }
}

/// Terrain with constant ground elevation and canopy height everywhere.
///
/// Useful for tests and for flat sites where no survey data exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatTerrain {
    /// Ground elevation across the whole plane.
    ground: f64,
    /// Height of the canopy above the ground.
    canopy_height: f64,
}

impl FlatTerrain {
    /// Create flat terrain with the given ground elevation and canopy height.
    #[must_use]
    pub const fn new(ground: f64, canopy_height: f64) -> Self {
        Self {
            ground,
            canopy_height,
        }
    }
}

impl TerrainQuery for FlatTerrain {
    fn ground_elevation(&self, _point: PlanePoint) -> f64 {
        self.ground
    }

    fn canopy_elevation(&self, _point: PlanePoint) -> f64 {
        self.ground + self.canopy_height
    }
}

/// Terrain backed by in-memory elevation rasters.
///
/// Rasters are indexed `[row, column]` where rows advance along Y and
/// columns along X from `origin` in steps of `cell_size`. Queries use
/// bilinear interpolation between the four surrounding cells; NaN cells and
/// points outside the raster extent yield NaN.
#[derive(Clone, Debug)]
pub struct RasterTerrain {
    /// Plan position of the raster's `[0, 0]` cell centre.
    origin: PlanePoint,
    /// Edge length of one raster cell.
    cell_size: f64,
    /// Ground surface elevations.
    ground: Array2<f64>,
    /// Canopy surface elevations, same shape as `ground`.
    canopy: Array2<f64>,
}

impl RasterTerrain {
    /// Build terrain from matching ground and canopy rasters.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ShapeMismatch`] when the rasters differ in
    /// shape and [`TerrainError::NonPositiveCellSize`] for a bad cell size.
    pub fn new(
        origin: PlanePoint,
        cell_size: f64,
        ground: Array2<f64>,
        canopy: Array2<f64>,
    ) -> Result<Self, TerrainError> {
        if !(cell_size > 0.0) {
            return Err(TerrainError::NonPositiveCellSize(cell_size));
        }
        if ground.dim() != canopy.dim() {
            return Err(TerrainError::ShapeMismatch {
                ground: ground.dim(),
                canopy: canopy.dim(),
            });
        }
        Ok(Self {
            origin,
            cell_size,
            ground,
            canopy,
        })
    }

    /// Bilinear sample of one raster at a plan point.
    fn sample(&self, raster: &Array2<f64>, point: PlanePoint) -> f64 {
        let (rows, columns) = raster.dim();
        if rows < 2 || columns < 2 {
            return f64::NAN;
        }
        let gx = (point.x - self.origin.x) / self.cell_size;
        let gy = (point.y - self.origin.y) / self.cell_size;
        let max_x = (columns - 1) as f64;
        let max_y = (rows - 1) as f64;
        if !(0.0..=max_x).contains(&gx) || !(0.0..=max_y).contains(&gy) {
            return f64::NAN;
        }
        let ix = (gx.floor() as usize).min(columns - 2);
        let iy = (gy.floor() as usize).min(rows - 2);
        let fx = gx - ix as f64;
        let fy = gy - iy as f64;
        let bottom = raster[[iy, ix]] * (1.0 - fx) + raster[[iy, ix + 1]] * fx;
        let top = raster[[iy + 1, ix]] * (1.0 - fx) + raster[[iy + 1, ix + 1]] * fx;
        bottom * (1.0 - fy) + top * fy
    }
}

impl TerrainQuery for RasterTerrain {
    fn ground_elevation(&self, point: PlanePoint) -> f64 {
        self.sample(&self.ground, point)
    }

    fn canopy_elevation(&self, point: PlanePoint) -> f64 {
        self.sample(&self.canopy, point)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;
    use crate::geometry::plane_point;

    fn ramp_terrain() -> RasterTerrain {
        // Ground rises 1 m per cell along X; canopy sits 10 m above ground.
        let ground = array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]];
        let canopy = &ground + 10.0;
        RasterTerrain::new(plane_point(0.0, 0.0), 5.0, ground, canopy).expect("valid rasters")
    }

    #[test]
    fn flat_terrain_is_uniform() {
        let terrain = FlatTerrain::new(120.0, 15.0);
        assert_relative_eq!(terrain.ground_elevation(plane_point(0.0, 0.0)), 120.0);
        assert_relative_eq!(terrain.canopy_elevation(plane_point(99.0, -3.0)), 135.0);
    }

    #[test]
    fn raster_interpolates_between_cells() {
        let terrain = ramp_terrain();
        assert_relative_eq!(terrain.ground_elevation(plane_point(0.0, 0.0)), 0.0);
        assert_relative_eq!(terrain.ground_elevation(plane_point(5.0, 5.0)), 1.0);
        assert_relative_eq!(terrain.ground_elevation(plane_point(2.5, 0.0)), 0.5);
        assert_relative_eq!(terrain.canopy_elevation(plane_point(2.5, 7.5)), 10.5);
    }

    #[test]
    fn points_outside_coverage_are_nan() {
        let terrain = ramp_terrain();
        assert!(terrain.ground_elevation(plane_point(-1.0, 0.0)).is_nan());
        assert!(terrain.ground_elevation(plane_point(0.0, 11.0)).is_nan());
        assert!(terrain.canopy_elevation(plane_point(50.0, 50.0)).is_nan());
    }

    #[test]
    fn nan_cells_poison_interpolation() {
        let ground = array![[0.0, f64::NAN], [0.0, 0.0]];
        let canopy = array![[5.0, 5.0], [5.0, 5.0]];
        let terrain = RasterTerrain::new(plane_point(0.0, 0.0), 1.0, ground, canopy)
            .expect("valid rasters");
        assert!(terrain.ground_elevation(plane_point(0.5, 0.25)).is_nan());
        assert_relative_eq!(terrain.canopy_elevation(plane_point(0.5, 0.25)), 5.0);
    }

    #[test]
    fn mismatched_rasters_are_rejected() {
        let ground = Array2::zeros((3, 3));
        let canopy = Array2::zeros((2, 3));
        let error = RasterTerrain::new(plane_point(0.0, 0.0), 1.0, ground, canopy)
            .expect_err("shape mismatch detected");
        assert_eq!(
            error,
            TerrainError::ShapeMismatch {
                ground: (3, 3),
                canopy: (2, 3),
            }
        );
    }

    #[test]
    fn batch_queries_match_single_queries() {
        let terrain = ramp_terrain();
        let points = [plane_point(0.0, 0.0), plane_point(5.0, 5.0)];
        let batch = terrain.ground_elevations(&points);
        assert_relative_eq!(batch[0], terrain.ground_elevation(points[0]));
        assert_relative_eq!(batch[1], terrain.ground_elevation(points[1]));
    }
}
