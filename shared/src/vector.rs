use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

///Represents an immutable vector in 2D space.
/// Every operation returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f64,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen coordinates.
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    ///Returns a copy with the x component replaced.
    pub fn with_x(self, x: f64) -> Self {
        Self { x, y: self.y }
    }

    ///Returns a copy with the y component replaced.
    pub fn with_y(self, y: f64) -> Self {
        Self { x: self.x, y }
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    ///Returns the magnitude of the vector.
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(self, other: Vector) -> f64 {
        (self - other).length_squared()
    }

    pub fn distance(self, other: Vector) -> f64 {
        self.distance_squared(other).sqrt()
    }

    ///Returns the unit vector pointing the same way.
    /// A zero-length vector normalizes to the zero vector.
    pub fn normalize(self) -> Vector {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            Vector::ZERO
        } else {
            self / len
        }
    }

    ///Clamps each component into `[min, max]` of the matching component.
    pub fn clamp(self, min: Vector, max: Vector) -> Vector {
        Vector {
            x: self.x.max(min.x).min(max.x),
            y: self.y.max(min.y).min(max.y),
        }
    }

    ///Scales the vector down to `max` length without changing direction.
    pub fn clamp_length(self, max: f64) -> Vector {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    ///Rounds both components to the given number of decimal digits.
    pub fn round(self, decimals: i32) -> Vector {
        Vector {
            x: round_to(self.x, decimals),
            y: round_to(self.y, decimals),
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // value * factor overflows for huge magnitudes
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;
    fn div(self, rhs: f64) -> Vector {
        Vector::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_arithmetic_is_componentwise() {
        let a = Vector::new(1.0, 2.0);
        let b = Vector::new(3.0, -4.0);

        assert_eq!(a + b, Vector::new(4.0, -2.0));
        assert_eq!(a - b, Vector::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vector::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vector::new(1.5, -2.0));
        assert_eq!(-a, Vector::new(-1.0, -2.0));
        assert_eq!(a.dot(b), -5.0);
    }

    #[test]
    fn test_operations_do_not_mutate() {
        let a = Vector::new(3.0, 4.0);
        let _ = a.normalize();
        let _ = a.with_x(10.0);
        assert_eq!(a, Vector::new(3.0, 4.0));
    }

    #[test]
    fn test_length_and_distance() {
        let a = Vector::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a.length_squared(), 25.0);
        assert_eq!(Vector::new(1.0, 1.0).distance_squared(Vector::new(4.0, 5.0)), 25.0);
        assert_eq!(Vector::new(1.0, 1.0).distance(Vector::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn test_normalize() {
        let n = Vector::new(10.0, 0.0).normalize();
        assert_eq!(n, Vector::new(1.0, 0.0));

        let n = Vector::new(3.0, -4.0).normalize();
        assert_approx_eq!(n.length(), 1.0, 1e-12);
        assert_approx_eq!(n.x, 0.6, 1e-12);
        assert_approx_eq!(n.y, -0.8, 1e-12);
    }

    #[test]
    fn test_normalize_zero_vector_is_zero() {
        let n = Vector::zero().normalize();
        assert_eq!(n, Vector::ZERO);
        assert!(n.x.is_finite() && n.y.is_finite());
    }

    #[test]
    fn test_clamp_and_clamp_length() {
        let v = Vector::new(-10.0, 10.0);
        let c = v.clamp(Vector::new(-5.0, -5.0), Vector::new(5.0, 5.0));
        assert_eq!(c, Vector::new(-5.0, 5.0));

        let v = Vector::new(30.0, 40.0).clamp_length(5.0);
        assert_approx_eq!(v.x, 3.0, 1e-12);
        assert_approx_eq!(v.y, 4.0, 1e-12);

        let short = Vector::new(1.0, 1.0);
        assert_eq!(short.clamp_length(5.0), short);
    }

    #[test]
    fn test_round_to_five_decimals() {
        let v = Vector::new(1.234_567_89, -0.000_004_9).round(5);
        assert_eq!(v.x, 1.23457);
        assert_eq!(v.y, -0.0);
    }

    #[test]
    fn test_with_component() {
        let v = Vector::new(1.0, 2.0);
        assert_eq!(v.with_x(7.0), Vector::new(7.0, 2.0));
        assert_eq!(v.with_y(7.0), Vector::new(1.0, 7.0));
    }
}
