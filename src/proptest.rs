//! Strategies for reference cells, points in them and cell map Jacobians.
use crate::cell::CellType;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use ::proptest::sample::select;
use nalgebra::DMatrix;

/// Any cell type, including the point.
pub fn cell_type() -> impl Strategy<Value = CellType> {
    select(CellType::ALL.to_vec())
}

/// Any cell type with a non-trivial interior.
pub fn non_point_cell_type() -> impl Strategy<Value = CellType> {
    select(CellType::ALL[1..].to_vec())
}

/// Maps a point of the unit cube of the cell's dimension into the reference cell.
fn fold_into_cell(cell: CellType, u: &[f64]) -> Vec<f64> {
    let sorted = |values: &[f64]| {
        let mut values = values.to_vec();
        values.sort_by(|a, b| a.total_cmp(b));
        values
    };
    match cell {
        CellType::Point => Vec::new(),
        CellType::Interval | CellType::Quadrilateral | CellType::Hexahedron => u.to_vec(),
        CellType::Triangle => {
            let s = sorted(&u[..2]);
            vec![s[0], s[1] - s[0]]
        }
        CellType::Tetrahedron => {
            let s = sorted(&u[..3]);
            vec![s[0], s[1] - s[0], s[2] - s[1]]
        }
        CellType::Prism => {
            let s = sorted(&u[..2]);
            vec![s[0], s[1] - s[0], u[2]]
        }
        CellType::Pyramid => {
            let z = u[2];
            vec![u[0] * (1.0 - z), u[1] * (1.0 - z), z]
        }
    }
}

/// A point in the closed reference cell.
pub fn point_in_cell(cell: CellType) -> impl Strategy<Value = Vec<f64>> {
    let tdim = cell.topological_dimension();
    vec(0.0f64..=1.0, tdim).prop_map(move |u| fold_into_cell(cell, &u))
}

/// `num_points` points in the reference cell, one point per row. Points stay clear of the
/// pyramid apex.
pub fn points_in_cell(cell: CellType, num_points: usize) -> impl Strategy<Value = DMatrix<f64>> {
    let tdim = cell.topological_dimension();
    vec(vec(0.0f64..=0.95, tdim), num_points).prop_map(move |points| {
        let mut matrix = DMatrix::zeros(points.len(), tdim);
        for (i, u) in points.iter().enumerate() {
            for (j, x_j) in fold_into_cell(cell, u).into_iter().enumerate() {
                matrix[(i, j)] = x_j;
            }
        }
        matrix
    })
}

/// A strictly diagonally dominant, hence invertible, `dim x dim` Jacobian.
pub fn invertible_jacobian(dim: usize) -> impl Strategy<Value = DMatrix<f64>> {
    let off_diagonal = vec(-0.5f64..0.5, dim * dim);
    let diagonal = vec((1.5f64..3.0, any::<bool>()), dim);
    (off_diagonal, diagonal).prop_map(move |(entries, diagonal)| {
        let mut jacobian = DMatrix::from_row_slice(dim, dim, &entries);
        for (i, (magnitude, negative)) in diagonal.into_iter().enumerate() {
            jacobian[(i, i)] = if negative { -magnitude } else { magnitude };
        }
        jacobian
    })
}
