//! Maps of function values between the reference cell and a physical cell.
//!
//! For a cell map with Jacobian `J` (`gdim x tdim`), determinant `det_j` and (pseudo-)inverse
//! `K` (`tdim x gdim`), vector values map as columns and matrix values are stored row-major.
use crate::error::Error;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How reference values of an element are mapped to a physical cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingType {
    #[serde(rename = "identity")]
    Identity,
    #[serde(rename = "covariant Piola")]
    CovariantPiola,
    #[serde(rename = "contravariant Piola")]
    ContravariantPiola,
    #[serde(rename = "double covariant Piola")]
    DoubleCovariantPiola,
    #[serde(rename = "double contravariant Piola")]
    DoubleContravariantPiola,
}

impl MappingType {
    pub const ALL: [MappingType; 5] = [
        MappingType::Identity,
        MappingType::CovariantPiola,
        MappingType::ContravariantPiola,
        MappingType::DoubleCovariantPiola,
        MappingType::DoubleContravariantPiola,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MappingType::Identity => "identity",
            MappingType::CovariantPiola => "covariant Piola",
            MappingType::ContravariantPiola => "contravariant Piola",
            MappingType::DoubleCovariantPiola => "double covariant Piola",
            MappingType::DoubleContravariantPiola => "double contravariant Piola",
        }
    }

    /// The size of a reference value, given the size of the element's reference values for
    /// the identity map and the topological dimension otherwise.
    fn reference_size(&self, value_size: usize, tdim: usize) -> usize {
        match self {
            MappingType::Identity => value_size,
            MappingType::CovariantPiola | MappingType::ContravariantPiola => tdim,
            MappingType::DoubleCovariantPiola | MappingType::DoubleContravariantPiola => tdim * tdim,
        }
    }

    /// The size of a physical value when the element's reference values have the given size.
    pub fn physical_value_size(&self, reference_value_size: usize, gdim: usize) -> usize {
        match self {
            MappingType::Identity => reference_value_size,
            MappingType::CovariantPiola | MappingType::ContravariantPiola => gdim,
            MappingType::DoubleCovariantPiola | MappingType::DoubleContravariantPiola => gdim * gdim,
        }
    }
}

impl Display for MappingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MappingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MappingType::ALL
            .iter()
            .find(|mapping| mapping.name() == s)
            .copied()
            .ok_or_else(|| Error::Unimplemented(format!("mapping type \"{s}\"")))
    }
}

fn check_size(expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ValueSizeMismatch { expected, actual })
    }
}

fn vector_to_vec(v: DVector<f64>) -> Vec<f64> {
    v.as_slice().to_vec()
}

/// Row-major flattening.
fn matrix_to_vec(m: DMatrix<f64>) -> Vec<f64> {
    m.transpose().as_slice().to_vec()
}

/// Maps a reference value to a physical cell.
///
/// For `Identity` the value is returned unchanged.
pub fn push_forward(
    mapping: MappingType,
    reference_value: &[f64],
    j: &DMatrix<f64>,
    det_j: f64,
    k: &DMatrix<f64>,
) -> Result<Vec<f64>, Error> {
    let (gdim, tdim) = j.shape();
    check_size(mapping.reference_size(reference_value.len(), tdim), reference_value.len())?;
    let mapped = match mapping {
        MappingType::Identity => reference_value.to_vec(),
        MappingType::CovariantPiola => {
            let v = DVector::from_column_slice(reference_value);
            vector_to_vec(k.transpose() * v)
        }
        MappingType::ContravariantPiola => {
            let v = DVector::from_column_slice(reference_value);
            vector_to_vec((j * v) / det_j)
        }
        MappingType::DoubleCovariantPiola => {
            let m = DMatrix::from_row_slice(tdim, tdim, reference_value);
            matrix_to_vec(k.transpose() * m * k)
        }
        MappingType::DoubleContravariantPiola => {
            let m = DMatrix::from_row_slice(tdim, tdim, reference_value);
            matrix_to_vec((j * m * j.transpose()) / (det_j * det_j))
        }
    };
    debug_assert_eq!(mapped.len(), mapping.physical_value_size(reference_value.len(), gdim));
    Ok(mapped)
}

/// Maps a physical value back to the reference cell. Inverse of [`push_forward`].
pub fn pull_back(
    mapping: MappingType,
    physical_value: &[f64],
    j: &DMatrix<f64>,
    det_j: f64,
    k: &DMatrix<f64>,
) -> Result<Vec<f64>, Error> {
    let gdim = j.nrows();
    check_size(mapping.reference_size(physical_value.len(), gdim), physical_value.len())?;
    let mapped = match mapping {
        MappingType::Identity => physical_value.to_vec(),
        MappingType::CovariantPiola => {
            let u = DVector::from_column_slice(physical_value);
            vector_to_vec(j.transpose() * u)
        }
        MappingType::ContravariantPiola => {
            let u = DVector::from_column_slice(physical_value);
            vector_to_vec((k * u) * det_j)
        }
        MappingType::DoubleCovariantPiola => {
            let m = DMatrix::from_row_slice(gdim, gdim, physical_value);
            matrix_to_vec(j.transpose() * m * j)
        }
        MappingType::DoubleContravariantPiola => {
            let m = DMatrix::from_row_slice(gdim, gdim, physical_value);
            matrix_to_vec((k * m * k.transpose()) * (det_j * det_j))
        }
    };
    Ok(mapped)
}
