//! Fundamental geometric types for cable rig modelling.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Position in three dimensional space measured in metres.
///
/// The Z axis points up; X and Y span the horizontal plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
    /// Elevation along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Project the point onto the horizontal plane.
    #[must_use]
    pub const fn plan(self) -> PlanePoint {
        PlanePoint::new(self.x, self.y)
    }
}

impl From<Vector3<f64>> for Point {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point> for Vector3<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Position in the horizontal plane measured in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanePoint {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
}

impl PlanePoint {
    /// Create a [`PlanePoint`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the plan position into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Cartesian vector representing a three dimensional force in newtons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Force {
    /// Force component acting along the global X axis.
    pub x: f64,
    /// Force component acting along the global Y axis.
    pub y: f64,
    /// Force component acting along the global Z axis.
    pub z: f64,
}

impl Force {
    /// Create a [`Force`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the force into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Magnitude of the force.
    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.to_vector().norm()
    }
}

impl Default for Force {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl From<Vector3<f64>> for Force {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Force> for Vector3<f64> {
    fn from(value: Force) -> Self {
        value.to_vector()
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use tricable::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.z, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// Convenience helper for creating [`PlanePoint`] instances.
#[must_use]
pub const fn plane_point(x: f64, y: f64) -> PlanePoint {
    PlanePoint::new(x, y)
}

/// Convenience helper for creating [`Force`] instances.
#[must_use]
pub const fn force(x: f64, y: f64, z: f64) -> Force {
    Force::new(x, y, z)
}

/// Distance between two points ignoring the elevation component.
#[must_use]
pub fn plan_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Magnitude of a vector's projection onto the horizontal plane.
///
/// Zero when the vector points straight up or down.
#[must_use]
pub fn plan_magnitude(v: &Vector3<f64>) -> f64 {
    v.x.hypot(v.y)
}

/// Barycentric coordinates of `p` with respect to the plan-view triangle
/// `(a, b, c)`, or `None` when the triangle is degenerate.
///
/// The weights sum to one; all three are non-negative exactly when `p` lies
/// inside the triangle or on its boundary.
#[must_use]
pub fn barycentric(
    p: PlanePoint,
    a: PlanePoint,
    b: PlanePoint,
    c: PlanePoint,
) -> Option<[f64; 3]> {
    let v0 = b.to_vector() - a.to_vector();
    let v1 = c.to_vector() - a.to_vector();
    let v2 = p.to_vector() - a.to_vector();
    let denominator = v0.x * v1.y - v1.x * v0.y;
    let scale = v0.norm().max(v1.norm());
    if denominator.abs() <= f64::EPSILON * scale * scale {
        return None;
    }
    let wb = (v2.x * v1.y - v1.x * v2.y) / denominator;
    let wc = (v0.x * v2.y - v2.x * v0.y) / denominator;
    Some([1.0 - wb - wc, wb, wc])
}

/// Whether `p` lies inside (or on the boundary of) the plan-view triangle.
#[must_use]
pub fn triangle_contains(p: PlanePoint, a: PlanePoint, b: PlanePoint, c: PlanePoint) -> bool {
    match barycentric(p, a, b, c) {
        Some(weights) => weights.iter().all(|&w| w >= -1.0e-9),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let original = Point::new(1.0, 2.0, 3.0);
        let vector: Vector3<f64> = original.into();
        assert_eq!(vector, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(Point::from(vector), original);
    }

    #[test]
    fn plan_distance_ignores_elevation() {
        let a = point(0.0, 0.0, 100.0);
        let b = point(3.0, 4.0, -50.0);
        assert_relative_eq!(plan_distance(a, b), 5.0);
    }

    #[test]
    fn plan_magnitude_of_vertical_vector_is_zero() {
        assert_relative_eq!(plan_magnitude(&Vector3::new(0.0, 0.0, 7.0)), 0.0);
    }

    #[test]
    fn barycentric_weights_sum_to_one() {
        let (a, b, c) = (
            plane_point(0.0, 0.0),
            plane_point(4.0, 0.0),
            plane_point(0.0, 4.0),
        );
        let weights = barycentric(plane_point(1.0, 1.0), a, b, c).expect("valid triangle");
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1.0e-12);
        assert!(weights.iter().all(|&w| w > 0.0));
    }

    #[test]
    fn degenerate_triangle_yields_none() {
        let (a, b, c) = (
            plane_point(0.0, 0.0),
            plane_point(1.0, 1.0),
            plane_point(2.0, 2.0),
        );
        assert!(barycentric(plane_point(0.5, 0.5), a, b, c).is_none());
        assert!(!triangle_contains(plane_point(0.5, 0.5), a, b, c));
    }

    #[test]
    fn triangle_containment_includes_boundary() {
        let (a, b, c) = (
            plane_point(0.0, 0.0),
            plane_point(4.0, 0.0),
            plane_point(0.0, 4.0),
        );
        assert!(triangle_contains(plane_point(1.0, 1.0), a, b, c));
        assert!(triangle_contains(plane_point(2.0, 0.0), a, b, c));
        assert!(!triangle_contains(plane_point(3.0, 3.0), a, b, c));
        assert!(!triangle_contains(plane_point(-0.1, 0.0), a, b, c));
    }
}
