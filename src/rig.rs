//! Equilibrium of a load suspended by three cables from fixed anchors.
//!
//! The key physical observation: with the load's plan position fixed, the
//! ratios between the three horizontal tensions are set by geometry alone,
//! so balancing the load's weight is a one-dimensional search over a common
//! scale factor applied to all three cables.

use log::trace;
use nalgebra::{Matrix3, Vector3};

use crate::catenary::Catenary;
use crate::errors::{EquilibriumError, RigError};
use crate::geometry::{barycentric, plan_distance, plan_magnitude, Force, PlanePoint, Point};
use crate::terrain::TerrainQuery;

/// Iteration budget for the vertical balance refinement.
const BALANCE_MAX_ITERATIONS: usize = 60;
/// Step-halving attempts per Newton iteration of the refinement.
const BALANCE_DAMPING_STEPS: usize = 40;

/// A fixed installation of three anchors sharing one cable stock.
///
/// Anchors are set once; every load query is a pure solve against them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriCableRig {
    /// Anchor positions, typically mast tops.
    anchors: [Point; 3],
    /// Cable weight per unit length (force, not mass).
    unit_weight: f64,
}

impl TriCableRig {
    /// Create a rig from three anchor positions and a cable unit weight.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::NonPositiveUnitWeight`] for a bad unit weight and
    /// [`RigError::CollinearAnchors`] when the anchors' plan positions do
    /// not form a triangle.
    pub fn new(anchors: [Point; 3], unit_weight: f64) -> Result<Self, RigError> {
        if !(unit_weight > 0.0) {
            return Err(RigError::NonPositiveUnitWeight(unit_weight));
        }
        let centroid = PlanePoint::new(
            (anchors[0].x + anchors[1].x + anchors[2].x) / 3.0,
            (anchors[0].y + anchors[1].y + anchors[2].y) / 3.0,
        );
        if barycentric(
            centroid,
            anchors[0].plan(),
            anchors[1].plan(),
            anchors[2].plan(),
        )
        .is_none()
        {
            return Err(RigError::CollinearAnchors);
        }
        Ok(Self {
            anchors,
            unit_weight,
        })
    }

    /// Create a rig by standing masts of a given height on the terrain.
    ///
    /// Each anchor sits at the local ground elevation plus `mast_height`.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::UnknownGround`] when the terrain has no elevation
    /// at a mast base, plus the validation errors of [`TriCableRig::new`].
    pub fn on_terrain<T: TerrainQuery>(
        bases: [PlanePoint; 3],
        mast_height: f64,
        unit_weight: f64,
        terrain: &T,
    ) -> Result<Self, RigError> {
        let mut anchors = [Point::new(0.0, 0.0, 0.0); 3];
        for (anchor, base) in anchors.iter_mut().zip(bases) {
            let ground = terrain.ground_elevation(base);
            if ground.is_nan() {
                return Err(RigError::UnknownGround {
                    x: base.x,
                    y: base.y,
                });
            }
            *anchor = Point::new(base.x, base.y, ground + mast_height);
        }
        Self::new(anchors, unit_weight)
    }

    /// The three anchor positions.
    #[must_use]
    pub fn anchors(&self) -> [Point; 3] {
        self.anchors
    }

    /// Cable weight per unit length.
    #[must_use]
    pub fn unit_weight(&self) -> f64 {
        self.unit_weight
    }

    /// Idealized maximum elevation at a plan point: the height of the plane
    /// through the three anchors.
    ///
    /// With weightless, infinitely tensioned cables the load could approach
    /// this plane but never reach it, so it serves as a strict upper bound
    /// for elevation searches, not an attainable height.
    #[must_use]
    pub fn ceiling(&self, point: PlanePoint) -> f64 {
        match barycentric(
            point,
            self.anchors[0].plan(),
            self.anchors[1].plan(),
            self.anchors[2].plan(),
        ) {
            Some(weights) => {
                weights[0] * self.anchors[0].z
                    + weights[1] * self.anchors[1].z
                    + weights[2] * self.anchors[2].z
            }
            None => f64::NAN,
        }
    }

    /// Whether a plan point lies inside the anchor triangle.
    #[must_use]
    pub fn contains_plan(&self, point: PlanePoint) -> bool {
        crate::geometry::triangle_contains(
            point,
            self.anchors[0].plan(),
            self.anchors[1].plan(),
            self.anchors[2].plan(),
        )
    }

    /// Balance a load at `load` against the three anchors.
    ///
    /// Seeds the horizontal tensions from the massless straight-line
    /// approximation, then refines a common scale factor until the cables'
    /// vertical forces cancel the load weight.
    ///
    /// # Errors
    ///
    /// Returns [`EquilibriumError::InfeasibleLoad`] when even massless
    /// cables cannot support the position, [`EquilibriumError::SingularGeometry`]
    /// when the load coincides with an anchor, and
    /// [`EquilibriumError::NotConverged`] or a cable shape error when the
    /// refinement fails. No partially solved state is ever returned.
    pub fn solve(&self, load: Point, weight: f64) -> Result<Equilibrium, EquilibriumError> {
        let seed = self.massless_seed(load, weight)?;
        self.refine(load, weight, seed)
    }

    /// Straight-line tension estimate ignoring cable weight.
    ///
    /// Solves the 3x3 system whose columns are the unit directions from the
    /// load to each anchor against the gravity load, then keeps only the
    /// horizontal components as seeds for the catenary refinement.
    fn massless_seed(&self, load: Point, weight: f64) -> Result<[f64; 3], EquilibriumError> {
        if !(weight > 0.0) {
            return Err(EquilibriumError::NonPositiveWeight(weight));
        }
        let mut directions = [Vector3::zeros(); 3];
        for (direction, anchor) in directions.iter_mut().zip(&self.anchors) {
            let delta = anchor.to_vector() - load.to_vector();
            let distance = delta.norm();
            if distance <= f64::EPSILON {
                return Err(EquilibriumError::SingularGeometry);
            }
            *direction = delta / distance;
        }
        let basis = Matrix3::from_columns(&directions);
        let gravity = Vector3::new(0.0, 0.0, weight);
        let line_tensions = basis
            .lu()
            .solve(&gravity)
            .ok_or(EquilibriumError::SingularGeometry)?;

        let mut seed = [0.0; 3];
        for (cable, value) in seed.iter_mut().enumerate() {
            let tension = line_tensions[cable];
            if tension < 0.0 {
                return Err(EquilibriumError::InfeasibleLoad { cable, tension });
            }
            *value = tension * plan_magnitude(&directions[cable]);
        }
        Ok(seed)
    }

    /// Build the three catenaries for a common scale factor over the seeds.
    fn build_cables(
        &self,
        load: Point,
        seed: &[f64; 3],
        scale: f64,
    ) -> Result<[Catenary; 3], EquilibriumError> {
        let mut cables = [None; 3];
        for (slot, (anchor, th)) in cables.iter_mut().zip(self.anchors.iter().zip(seed)) {
            *slot = Some(Catenary::solve(
                anchor.z,
                load.z,
                plan_distance(*anchor, load),
                self.unit_weight,
                th * scale,
            )?);
        }
        // All three slots were just filled above.
        match cables {
            [Some(a), Some(b), Some(c)] => Ok([a, b, c]),
            _ => Err(EquilibriumError::SingularGeometry),
        }
    }

    /// Find the scale factor that cancels the load weight vertically.
    fn refine(
        &self,
        load: Point,
        weight: f64,
        seed: [f64; 3],
    ) -> Result<Equilibrium, EquilibriumError> {
        let tolerance = 1.0e-8 * weight.abs().max(1.0);
        let mut scale = 1.0_f64;
        let mut cables = self.build_cables(load, &seed, scale)?;
        let mut residual = vertical_residual(weight, &cables);

        for iteration in 0..BALANCE_MAX_ITERATIONS {
            if residual.abs() <= tolerance {
                trace!("vertical balance converged after {iteration} iterations (scale {scale})");
                return Ok(Equilibrium {
                    anchors: self.anchors,
                    cables,
                    horizontal_tensions: [
                        seed[0] * scale,
                        seed[1] * scale,
                        seed[2] * scale,
                    ],
                    load,
                    weight,
                });
            }

            let h = 1.0e-7 * scale.abs().max(1.0);
            let probe = self.build_cables(load, &seed, scale + h)?;
            let slope = (vertical_residual(weight, &probe) - residual) / h;
            if !slope.is_finite() || slope.abs() < f64::MIN_POSITIVE {
                return Err(EquilibriumError::NotConverged {
                    iterations: iteration,
                    residual,
                });
            }

            let mut step = -residual / slope;
            let mut accepted = false;
            for _ in 0..BALANCE_DAMPING_STEPS {
                let trial = scale + step;
                if trial > 0.0 {
                    if let Ok(trial_cables) = self.build_cables(load, &seed, trial) {
                        scale = trial;
                        cables = trial_cables;
                        residual = vertical_residual(weight, &cables);
                        accepted = true;
                        break;
                    }
                }
                step *= 0.5;
            }
            if !accepted {
                return Err(EquilibriumError::NotConverged {
                    iterations: iteration,
                    residual,
                });
            }
        }

        Err(EquilibriumError::NotConverged {
            iterations: BALANCE_MAX_ITERATIONS,
            residual,
        })
    }
}

/// Vertical force imbalance at the load point.
///
/// Zero at equilibrium: the cables' vertical force components at their load
/// ends exactly offset the load weight.
fn vertical_residual(weight: f64, cables: &[Catenary; 3]) -> f64 {
    weight
        + cables
            .iter()
            .map(|cable| cable.vertical_force(cable.span()))
            .sum::<f64>()
}

/// A successfully balanced load: three cable shapes and their tensions.
///
/// Immutable; produced only by [`TriCableRig::solve`] or
/// [`Equilibrium::adjust_elevation`].
#[derive(Clone, Copy, Debug)]
pub struct Equilibrium {
    /// Anchor positions the solve was performed against.
    anchors: [Point; 3],
    /// Solved cable shapes, anchor end at `x = 0`.
    cables: [Catenary; 3],
    /// Horizontal tension carried by each cable.
    horizontal_tensions: [f64; 3],
    /// Load position.
    load: Point,
    /// Load weight.
    weight: f64,
}

impl Equilibrium {
    /// The balanced load position.
    #[must_use]
    pub fn load(&self) -> Point {
        self.load
    }

    /// The balanced load weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The three solved cable shapes.
    #[must_use]
    pub fn cables(&self) -> &[Catenary; 3] {
        &self.cables
    }

    /// Horizontal tension carried by each cable.
    #[must_use]
    pub fn horizontal_tensions(&self) -> [f64; 3] {
        self.horizontal_tensions
    }

    /// Total tension magnitude at each cable's anchor end.
    ///
    /// This is where tension peaks for a load hanging below its anchors, so
    /// these are the values to rate cables and supports against.
    #[must_use]
    pub fn anchor_tensions(&self) -> [f64; 3] {
        [
            self.cables[0].total_tension(0.0),
            self.cables[1].total_tension(0.0),
            self.cables[2].total_tension(0.0),
        ]
    }

    /// Largest of the three anchor tensions.
    #[must_use]
    pub fn max_anchor_tension(&self) -> f64 {
        self.anchor_tensions()
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Force each cable exerts on the load point.
    ///
    /// After a successful solve the three vectors plus the gravity vector
    /// `(0, 0, -weight)` sum to approximately zero.
    #[must_use]
    pub fn tension_vectors(&self) -> [Force; 3] {
        let mut vectors = [Force::default(); 3];
        for (vector, (anchor, cable)) in vectors
            .iter_mut()
            .zip(self.anchors.iter().zip(&self.cables))
        {
            let toward_anchor = anchor.to_vector() - self.load.to_vector();
            let plan = plan_magnitude(&toward_anchor);
            let th = cable.horizontal_tension();
            // Horizontal pull toward the anchor; vertical pull is the
            // negated slope force at the load end of the curve.
            *vector = Force::new(
                th * toward_anchor.x / plan,
                th * toward_anchor.y / plan,
                -cable.vertical_force(cable.span()),
            );
        }
        vectors
    }

    /// Re-balance the same plan position at a different load height.
    ///
    /// Reuses the current horizontal tensions as the refinement seed, which
    /// skips the massless estimate and converges quickly for the small
    /// height steps of a bisection search.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`TriCableRig::solve`].
    pub fn adjust_elevation(
        &self,
        rig: &TriCableRig,
        z: f64,
    ) -> Result<Equilibrium, EquilibriumError> {
        let load = Point::new(self.load.x, self.load.y, z);
        rig.refine(load, self.weight, self.horizontal_tensions)
    }

    /// Minimum vertical gap between any cable and the canopy beneath it.
    ///
    /// Each cable is sampled along its span at roughly `resolution` plan
    /// spacing. Returns NaN when the canopy is unknown anywhere under a
    /// cable, which callers must treat as failing any clearance check.
    #[must_use]
    pub fn min_clearance<T: TerrainQuery>(&self, terrain: &T, resolution: f64) -> f64 {
        if !(resolution > 0.0) {
            return f64::NAN;
        }
        let mut minimum = f64::INFINITY;
        for (anchor, cable) in self.anchors.iter().zip(&self.cables) {
            let span = cable.span();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let samples = ((span / resolution).ceil() as usize).max(2);
            for index in 0..samples {
                let fraction = index as f64 / (samples - 1) as f64;
                let x = fraction * span;
                let plan = PlanePoint::new(
                    anchor.x + (self.load.x - anchor.x) * fraction,
                    anchor.y + (self.load.y - anchor.y) * fraction,
                );
                let gap = cable.height(x) - terrain.canopy_elevation(plan);
                if gap.is_nan() {
                    return f64::NAN;
                }
                minimum = minimum.min(gap);
            }
        }
        minimum
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{plane_point, point};
    use crate::terrain::FlatTerrain;

    fn survey_rig() -> TriCableRig {
        TriCableRig::new(
            [
                point(0.0, 0.0, 10.0),
                point(0.0, 200.0, 10.0),
                point(150.0, 100.0, 10.0),
            ],
            0.35,
        )
        .expect("valid rig")
    }

    #[test]
    fn rejects_collinear_anchors() {
        let error = TriCableRig::new(
            [
                point(0.0, 0.0, 10.0),
                point(10.0, 10.0, 10.0),
                point(20.0, 20.0, 10.0),
            ],
            0.35,
        )
        .expect_err("collinear anchors rejected");
        assert_eq!(error, RigError::CollinearAnchors);
    }

    #[test]
    fn rejects_non_positive_unit_weight() {
        let error = TriCableRig::new(
            [
                point(0.0, 0.0, 10.0),
                point(10.0, 0.0, 10.0),
                point(0.0, 10.0, 10.0),
            ],
            0.0,
        )
        .expect_err("unit weight rejected");
        assert_eq!(error, RigError::NonPositiveUnitWeight(0.0));
    }

    #[test]
    fn masts_stand_on_the_terrain() {
        let terrain = FlatTerrain::new(700.0, 20.0);
        let rig = TriCableRig::on_terrain(
            [
                plane_point(0.0, 0.0),
                plane_point(50.0, 0.0),
                plane_point(25.0, 40.0),
            ],
            30.0,
            0.35,
            &terrain,
        )
        .expect("masts placed");
        for anchor in rig.anchors() {
            assert_relative_eq!(anchor.z, 730.0);
        }
    }

    #[test]
    fn ceiling_interpolates_anchor_heights() {
        let rig = TriCableRig::new(
            [
                point(0.0, 0.0, 10.0),
                point(10.0, 0.0, 20.0),
                point(0.0, 10.0, 30.0),
            ],
            0.35,
        )
        .expect("valid rig");
        assert_relative_eq!(rig.ceiling(plane_point(0.0, 0.0)), 10.0, epsilon = 1.0e-9);
        assert_relative_eq!(rig.ceiling(plane_point(5.0, 0.0)), 15.0, epsilon = 1.0e-9);
        assert_relative_eq!(rig.ceiling(plane_point(0.0, 5.0)), 20.0, epsilon = 1.0e-9);
    }

    #[test]
    fn survey_example_balances_the_load() {
        let rig = survey_rig();
        let equilibrium = rig.solve(point(75.0, 100.0, 5.0), 100.0).expect("solvable");

        for tension in equilibrium.anchor_tensions() {
            assert!(tension > 0.0);
        }

        // The cables' vertical pulls on the load must carry its full weight.
        let vertical: f64 = equilibrium.tension_vectors().iter().map(|f| f.z).sum();
        assert_relative_eq!(vertical, 100.0, epsilon = 1.0e-5);

        // Full force balance including gravity.
        let total = equilibrium
            .tension_vectors()
            .iter()
            .fold(nalgebra::Vector3::zeros(), |sum, f| sum + f.to_vector())
            + nalgebra::Vector3::new(0.0, 0.0, -100.0);
        assert!(total.norm() < 1.0e-5);
    }

    #[test]
    fn symmetric_load_carries_equal_tensions() {
        // Equilateral anchors at equal height, load at the centroid.
        let radius = 50.0_f64;
        let mut anchors = [point(0.0, 0.0, 20.0); 3];
        for (index, anchor) in anchors.iter_mut().enumerate() {
            let angle = index as f64 * 2.0 * std::f64::consts::PI / 3.0;
            *anchor = point(radius * angle.cos(), radius * angle.sin(), 20.0);
        }
        let rig = TriCableRig::new(anchors, 0.35).expect("valid rig");
        let equilibrium = rig.solve(point(0.0, 0.0, 10.0), 80.0).expect("solvable");

        let tensions = equilibrium.anchor_tensions();
        assert_relative_eq!(tensions[0], tensions[1], epsilon = 1.0e-6);
        assert_relative_eq!(tensions[1], tensions[2], epsilon = 1.0e-6);
    }

    #[test]
    fn load_above_the_anchor_plane_is_infeasible() {
        let rig = survey_rig();
        let error = rig
            .solve(point(75.0, 100.0, 15.0), 100.0)
            .expect_err("unsupportable load rejected");
        assert!(matches!(error, EquilibriumError::InfeasibleLoad { .. }));
    }

    #[test]
    fn load_at_an_anchor_is_singular() {
        let rig = survey_rig();
        let error = rig
            .solve(point(0.0, 0.0, 10.0), 100.0)
            .expect_err("degenerate load rejected");
        assert_eq!(error, EquilibriumError::SingularGeometry);
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let rig = survey_rig();
        let error = rig
            .solve(point(75.0, 100.0, 5.0), 0.0)
            .expect_err("weightless load rejected");
        assert_eq!(error, EquilibriumError::NonPositiveWeight(0.0));
    }

    #[test]
    fn adjust_elevation_matches_fresh_solve() {
        let rig = survey_rig();
        let equilibrium = rig.solve(point(75.0, 100.0, 5.0), 100.0).expect("solvable");
        let adjusted = equilibrium
            .adjust_elevation(&rig, 4.0)
            .expect("adjustment converges");
        let fresh = rig.solve(point(75.0, 100.0, 4.0), 100.0).expect("solvable");

        let a = adjusted.horizontal_tensions();
        let b = fresh.horizontal_tensions();
        for cable in 0..3 {
            assert_relative_eq!(a[cable], b[cable], epsilon = 1.0e-4);
        }
    }

    #[test]
    fn clearance_over_flat_terrain_is_positive() {
        let rig = survey_rig();
        let equilibrium = rig.solve(point(75.0, 100.0, 5.0), 100.0).expect("solvable");
        let terrain = FlatTerrain::new(0.0, 2.0);
        let clearance = equilibrium.min_clearance(&terrain, 5.0);
        // Lowest cable point is at or below the load height of 5 m over a
        // 2 m canopy, so clearance sits in (0, 3].
        assert!(clearance > 0.0);
        assert!(clearance <= 3.0 + 1.0e-9);
    }
}
