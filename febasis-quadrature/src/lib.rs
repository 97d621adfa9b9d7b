//! Quadrature rules for finite element reference cells.
//!
//! The main purpose of this crate is to support the `febasis` library. However, the rules
//! available here may be used completely independently of `febasis`.
//!
//! Univariate rules in [`univariate`] live on the interval `[-1, 1]`. All other rules live on
//! the unit reference cells: the interval `[0, 1]`, the triangle with vertices
//! `(0, 0), (1, 0), (0, 1)`, the unit square, the tetrahedron with vertices
//! `(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 0, 1)`, the unit cube, the prism spanned by the
//! reference triangle and the unit interval and the pyramid with base `[0, 1]^2` and apex
//! `(0, 0, 1)`.
//!
//! A rule is returned as a pair `(weights, points)`. The weights of every rule sum to the
//! volume of the reference cell.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod collapsed;
pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
    /// Newton iteration for the roots of an orthogonal polynomial failed to converge.
    NotConverged {
        /// The number of points requested.
        num_points: usize,
    },
    /// A computed rule has a weight that is not strictly positive.
    NonPositiveWeight {
        /// Index of the offending weight.
        index: usize,
        /// The offending weight.
        weight: f64,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(
                    f,
                    "There is no quadrature rule satisfying the requirements available"
                )
            }
            Self::NotConverged { num_points } => {
                write!(
                    f,
                    "Root finding did not converge for a rule with {num_points} points"
                )
            }
            Self::NonPositiveWeight { index, weight } => {
                write!(f, "Quadrature weight {index} is not positive ({weight})")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A three-dimensional point.
pub type Point3 = Point<3>;

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// A three-dimensional rule.
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, x)| w * f(x))
        .sum()
}

/// Rejects rules containing weights that are not strictly positive.
pub fn check_weights<const D: usize>(rule: Rule<D>) -> Result<Rule<D>, Error> {
    if let Some((index, &weight)) = rule
        .0
        .iter()
        .enumerate()
        .find(|(_, &w)| !(w > 0.0))
    {
        return Err(Error::NonPositiveWeight { index, weight });
    }
    Ok(rule)
}

/// The smallest number of Gauss points per axis that integrates polynomials of the given
/// degree exactly.
pub fn gauss_points_for_degree(degree: usize) -> usize {
    (degree + 2) / 2
}

/// The smallest number of Gauss-Lobatto points per axis that integrates polynomials of the
/// given degree exactly.
pub fn gauss_lobatto_points_for_degree(degree: usize) -> usize {
    (degree + 4) / 2
}
