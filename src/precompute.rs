//! Precomputed forms of permutations and matrices for repeated in-place application.
//!
//! Dof transformations are applied to many blocks of data, once per cell of a mesh. The
//! functions here factor a permutation or a square matrix once, so that applying it to a
//! block of data needs no temporary storage and no refactoring.
//!
//! Data is laid out dof-major: entry `b` of dof `i` is stored at `block_size * i + b`.
use crate::error::Error;
use nalgebra::DMatrix;

/// A permutation stored as a sequence of swaps.
///
/// Applying the swaps `(i, swaps[i])` for `i = 0, 1, ...` in order moves the entry at position
/// `perm[i]` to position `i`.
pub fn prepare_permutation(perm: &[usize]) -> Vec<usize> {
    let mut swaps = perm.to_vec();
    for row in 0..swaps.len() {
        // Earlier swaps have moved the wanted entry; follow its trail
        let mut index = swaps[row];
        while index < row {
            index = swaps[index];
        }
        swaps[row] = index;
    }
    swaps
}

/// Applies a permutation prepared by [`prepare_permutation`] to the dofs starting at `offset`.
pub fn apply_permutation<T>(swaps: &[usize], data: &mut [T], offset: usize, block_size: usize) {
    for (i, &swap) in swaps.iter().enumerate() {
        for b in 0..block_size {
            data.swap(block_size * (offset + i) + b, block_size * (offset + swap) + b);
        }
    }
}

/// A square matrix `A` factored for in-place application.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMatrix {
    /// Swaps, as produced by [`prepare_permutation`].
    pub permutation: Vec<usize>,
    pub diagonal: Vec<f64>,
    /// Coefficients of the off-diagonal updates; the diagonal is zero.
    pub updates: DMatrix<f64>,
}

impl PreparedMatrix {
    pub fn dim(&self) -> usize {
        self.diagonal.len()
    }
}

/// Factors a square matrix so that [`apply_matrix`] computes `A x` in place. Fails for
/// non-square and singular matrices.
///
/// The columns of `A` are first reordered, choosing at every step among the remaining columns
/// the one for which the leading principal submatrix has the determinant of largest magnitude.
/// With `B` the column-reordered matrix and `B_11` its leading `i x i` block, row `i` is then
/// split into `v = B_11^{-T} B[i, :i]`, used to express the contribution of the first `i`
/// columns in terms of already-updated entries, and the remainder.
pub fn prepare_matrix(matrix: &DMatrix<f64>) -> Result<PreparedMatrix, Error> {
    if !matrix.is_square() {
        return Err(Error::NotSquare {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        });
    }
    let dim = matrix.nrows();

    let mut perm: Vec<usize> = Vec::with_capacity(dim);
    let mut permuted = DMatrix::zeros(dim, dim);
    for row in 0..dim {
        let mut best: Option<(usize, f64)> = None;
        for col in (0..dim).filter(|col| !perm.contains(col)) {
            permuted.set_column(row, &matrix.column(col));
            let det = permuted.view((0, 0), (row + 1, row + 1)).determinant().abs();
            if best.map_or(true, |(_, best_det)| det > best_det) {
                best = Some((col, det));
            }
        }
        match best {
            Some((col, det)) if det > 0.0 => {
                perm.push(col);
                permuted.set_column(row, &matrix.column(col));
            }
            _ => return Err(Error::SingularMatrix),
        }
    }

    let mut diagonal = vec![0.0; dim];
    let mut updates = DMatrix::zeros(dim, dim);
    for i in 0..dim {
        let row = permuted.row(i);
        let v = if i == 0 {
            nalgebra::DVector::zeros(0)
        } else {
            let leading = permuted.view((0, 0), (i, i)).transpose();
            let rhs = row.columns(0, i).transpose();
            leading.lu().solve(&rhs).ok_or(Error::SingularMatrix)?
        };
        for j in 0..i {
            updates[(i, j)] = v[j];
        }
        let leading_column = |j: usize| -> f64 { (0..i).map(|l| v[l] * permuted[(l, j)]).sum() };
        diagonal[i] = row[i] - leading_column(i);
        for j in (i + 1)..dim {
            updates[(i, j)] = row[j] - leading_column(j);
        }
    }

    Ok(PreparedMatrix {
        permutation: prepare_permutation(&perm),
        diagonal,
        updates,
    })
}

/// Applies a matrix prepared by [`prepare_matrix`] to the dofs starting at `offset`.
pub fn apply_matrix(matrix: &PreparedMatrix, data: &mut [f64], offset: usize, block_size: usize) {
    apply_permutation(&matrix.permutation, data, offset, block_size);
    let dim = matrix.dim();
    for b in 0..block_size {
        let index = |i: usize| block_size * (offset + i) + b;
        for i in 0..dim {
            data[index(i)] *= matrix.diagonal[i];
            for j in 0..dim {
                if j != i {
                    data[index(i)] += matrix.updates[(i, j)] * data[index(j)];
                }
            }
        }
    }
}

/// Applies a matrix to the dofs starting at `offset` without preparation.
pub fn apply_matrix_unprepared(matrix: &DMatrix<f64>, data: &mut [f64], offset: usize, block_size: usize) {
    let dim = matrix.nrows();
    for b in 0..block_size {
        let x: Vec<f64> = (0..dim).map(|i| data[block_size * (offset + i) + b]).collect();
        for i in 0..dim {
            data[block_size * (offset + i) + b] = (0..dim).map(|j| matrix[(i, j)] * x[j]).sum();
        }
    }
}
