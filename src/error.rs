//! Library-wide error type.
use crate::cell::CellType;
use std::error::Error as StdError;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors produced while constructing or evaluating finite elements.
///
/// Every error is fatal to the operation that produced it. Nothing in the library retries or
/// substitutes a fallback result.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The operation is not available on the given cell type.
    UnsupportedCell { cell: CellType, context: &'static str },
    /// Evaluation points do not have the topological dimension of the cell.
    PointDimensionMismatch { expected: usize, actual: usize },
    /// A sub-entity that does not exist on the cell was requested.
    InvalidEntity { dim: usize, index: usize },
    /// The requested degree is not valid for the operation.
    InvalidDegree { degree: usize, context: &'static str },
    /// The dual matrix is (numerically) singular against the candidate space.
    IllConditioned { rcond: f64 },
    /// The per-entity dof counts do not sum to the number of basis functions.
    EntityDofMismatch { expected: usize, actual: usize },
    /// A value buffer does not have the size implied by the mapping.
    ValueSizeMismatch { expected: usize, actual: usize },
    /// A matrix could not be factored into the precomputed form.
    SingularMatrix,
    /// A square matrix was expected.
    NotSquare { rows: usize, cols: usize },
    /// The requested combination is not implemented.
    Unimplemented(String),
    /// A quadrature rule could not be produced.
    Quadrature(febasis_quadrature::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCell { cell, context } => {
                write!(f, "Unsupported cell type {cell} for {context}")
            }
            Self::PointDimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Point dimension does not match element dimension (expected {expected}, got {actual})"
                )
            }
            Self::InvalidEntity { dim, index } => {
                write!(f, "Invalid sub-entity {index} of dimension {dim}")
            }
            Self::InvalidDegree { degree, context } => {
                write!(f, "Invalid degree {degree} for {context}")
            }
            Self::IllConditioned { rcond } => {
                write!(
                    f,
                    "Poorly conditioned B.D^T when computing expansion coefficients (rcond = {rcond:e})"
                )
            }
            Self::EntityDofMismatch { expected, actual } => {
                write!(
                    f,
                    "Number of entity dofs ({actual}) does not match total number of dofs ({expected})"
                )
            }
            Self::ValueSizeMismatch { expected, actual } => {
                write!(f, "Value size mismatch (expected {expected}, got {actual})")
            }
            Self::SingularMatrix => write!(f, "Matrix is singular and cannot be precomputed"),
            Self::NotSquare { rows, cols } => write!(f, "Expected a square matrix, got {rows}x{cols}"),
            Self::Unimplemented(what) => write!(f, "Not implemented: {what}"),
            Self::Quadrature(err) => write!(f, "Quadrature error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Quadrature(err) => Some(err),
            _ => None,
        }
    }
}

impl From<febasis_quadrature::Error> for Error {
    fn from(err: febasis_quadrature::Error) -> Self {
        Self::Quadrature(err)
    }
}
