//! Quadrature rules on reference cells, as used for moments and projections.
//!
//! The rules themselves are produced by `febasis-quadrature`. This module selects a scheme per
//! cell type and converts rules into the matrix layout used throughout the crate: a pair
//! `(weights, points)` with one point per row.
use crate::cell::CellType;
use crate::error::Error;
use febasis_quadrature::{collapsed, gauss_lobatto_points_for_degree, gauss_points_for_degree, tensor, Rule};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Weights and points (one row per point) of a quadrature rule.
pub type QuadraturePair = (Vec<f64>, DMatrix<f64>);

/// Quadrature schemes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuadratureType {
    /// Gauss-Jacobi based rules for every cell.
    #[default]
    Default,
    /// Collapsed Gauss-Jacobi rules on simplices and pyramids, Gauss-Legendre tensor rules
    /// otherwise.
    GaussJacobi,
    /// Gauss-Lobatto-Legendre tensor rules, on intervals, quadrilaterals and hexahedra.
    GaussLobattoLegendre,
}

impl Display for QuadratureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuadratureType::Default => "default",
            QuadratureType::GaussJacobi => "GJ",
            QuadratureType::GaussLobattoLegendre => "GLL",
        };
        write!(f, "{name}")
    }
}

impl FromStr for QuadratureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(QuadratureType::Default),
            "GJ" => Ok(QuadratureType::GaussJacobi),
            "GLL" => Ok(QuadratureType::GaussLobattoLegendre),
            other => Err(Error::Unimplemented(format!("quadrature type \"{other}\""))),
        }
    }
}

fn convert_rule<const D: usize>(rule: Rule<D>) -> QuadraturePair {
    let (weights, points) = rule;
    let num_points = points.len();
    let matrix = DMatrix::from_fn(num_points, D, |i, j| points[i][j]);
    (weights, matrix)
}

/// A rule on the reference cell that integrates polynomials of the given degree exactly.
pub fn make_quadrature(cell: CellType, degree: usize) -> Result<QuadraturePair, Error> {
    make_quadrature_of_type(QuadratureType::Default, cell, degree)
}

/// A rule of the requested scheme on the reference cell that integrates polynomials of the
/// given degree exactly.
pub fn make_quadrature_of_type(
    quadrature_type: QuadratureType,
    cell: CellType,
    degree: usize,
) -> Result<QuadraturePair, Error> {
    match quadrature_type {
        QuadratureType::Default | QuadratureType::GaussJacobi => make_gauss_jacobi_quadrature(cell, degree),
        QuadratureType::GaussLobattoLegendre => make_gll_quadrature(cell, degree),
    }
}

fn make_gauss_jacobi_quadrature(cell: CellType, degree: usize) -> Result<QuadraturePair, Error> {
    let m = gauss_points_for_degree(degree);
    let rule = match cell {
        CellType::Point => (vec![1.0], DMatrix::zeros(1, 0)),
        CellType::Interval => convert_rule(tensor::interval(m)?),
        CellType::Quadrilateral => convert_rule(tensor::quadrilateral(m)?),
        CellType::Hexahedron => convert_rule(tensor::hexahedron(m)?),
        CellType::Prism => convert_rule(tensor::prism(m)?),
        CellType::Triangle => convert_rule(collapsed::triangle(m)?),
        CellType::Tetrahedron => convert_rule(collapsed::tetrahedron(m)?),
        // Products of the rational pyramid functions need one extra point per axis
        CellType::Pyramid => convert_rule(collapsed::pyramid(m + 1)?),
    };
    Ok(rule)
}

fn make_gll_quadrature(cell: CellType, degree: usize) -> Result<QuadraturePair, Error> {
    let m = gauss_lobatto_points_for_degree(degree);
    match cell {
        CellType::Interval => Ok(convert_rule(tensor::interval_gauss_lobatto(m)?)),
        CellType::Quadrilateral => Ok(convert_rule(tensor::quadrilateral_gauss_lobatto(m)?)),
        CellType::Hexahedron => Ok(convert_rule(tensor::hexahedron_gauss_lobatto(m)?)),
        _ => Err(Error::UnsupportedCell {
            cell,
            context: "Gauss-Lobatto-Legendre quadrature",
        }),
    }
}
