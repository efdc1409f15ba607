//! Planar geometric types for truss modelling.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Position in the plane of the truss.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Angle in radians of the ray from this point toward `other`.
    #[must_use]
    pub fn bearing_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

impl From<Vector2<f64>> for Point {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Cartesian vector representing a planar force.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Force {
    /// Force component acting along the global X axis.
    pub x: f64,
    /// Force component acting along the global Y axis.
    pub y: f64,
}

impl Force {
    /// Create a [`Force`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a [`Force`] from a magnitude and a direction in degrees,
    /// measured counter-clockwise from the global X axis.
    ///
    /// # Examples
    /// ```
    /// use pinjoint::Force;
    ///
    /// let load = Force::from_polar(10.0, 90.0);
    /// assert!(load.x.abs() < 1.0e-12);
    /// assert!((load.y - 10.0).abs() < 1.0e-12);
    /// ```
    #[must_use]
    pub fn from_polar(magnitude: f64, angle_degrees: f64) -> Self {
        let theta = angle_degrees.to_radians();
        Self::new(magnitude * theta.cos(), magnitude * theta.sin())
    }

    /// Convert the force into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl Default for Force {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<Vector2<f64>> for Force {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Force> for Vector2<f64> {
    fn from(value: Force) -> Self {
        value.to_vector()
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use pinjoint::point;
///
/// let origin = point(0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Convenience helper for creating [`Force`] instances.
///
/// # Examples
/// ```
/// use pinjoint::force;
///
/// let load = force(1.0, -5.0);
/// assert_eq!(load.y, -5.0);
/// ```
#[must_use]
pub const fn force(x: f64, y: f64) -> Force {
    Force::new(x, y)
}
