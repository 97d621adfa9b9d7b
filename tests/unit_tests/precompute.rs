use febasis::nalgebra::{DMatrix, DVector};
use febasis::precompute::{
    apply_matrix, apply_matrix_unprepared, apply_permutation, prepare_matrix, prepare_permutation,
};
use febasis::proptest::invertible_jacobian;
use febasis::Error;
use proptest::collection::vec;
use proptest::prelude::*;
use util::assert_approx_matrix_eq;

/// Applies `matrix` with the prepared form to every block of `data` and compares with the
/// plain matrix product.
fn check_prepared_matrix(matrix: &DMatrix<f64>, data: &[f64], offset: usize, block_size: usize) {
    let dim = matrix.nrows();
    let prepared = prepare_matrix(matrix).unwrap();
    assert_eq!(prepared.dim(), dim);

    let mut result = data.to_vec();
    apply_matrix(&prepared, &mut result, offset, block_size);

    for b in 0..block_size {
        let x = DVector::from_fn(dim, |i, _| data[block_size * (offset + i) + b]);
        let expected = matrix * x;
        let actual = DVector::from_fn(dim, |i, _| result[block_size * (offset + i) + b]);
        assert_approx_matrix_eq!(&actual, &expected, abstol = 1e-12);
    }
    // Entries before the offset are untouched
    assert_eq!(&result[..block_size * offset], &data[..block_size * offset]);
}

#[test]
fn prepared_matrix_with_zero_leading_entry() {
    #[rustfmt::skip]
    let matrix = DMatrix::from_row_slice(3, 3, &[
        0.0, 1.0, 0.0,
        0.0, 0.0, -1.0,
        2.0, 0.5, 0.0,
    ]);
    check_prepared_matrix(&matrix, &[1.0, 2.0, 3.0], 0, 1);
    check_prepared_matrix(&matrix, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 1, 2);
}

#[test]
fn prepared_edge_reflection() {
    // Reflection of three dofs on an edge, as for quartic Lagrange elements
    #[rustfmt::skip]
    let matrix = DMatrix::from_row_slice(3, 3, &[
        0.0, 0.0, 1.0,
        0.0, 1.0, 0.0,
        1.0, 0.0, 0.0,
    ]);
    let prepared = prepare_matrix(&matrix).unwrap();
    let mut data = vec![1.0, 2.0, 3.0];
    apply_matrix(&prepared, &mut data, 0, 1);
    assert_eq!(data, vec![3.0, 2.0, 1.0]);
}

#[test]
fn prepared_face_rotation() {
    // The rotation of a pair of moments on a triangle face
    let matrix = DMatrix::from_row_slice(2, 2, &[-1.0, -1.0, 1.0, 0.0]);
    check_prepared_matrix(&matrix, &[0.5, -2.0], 0, 1);
    let mut data = vec![0.5, -2.0];
    let prepared = prepare_matrix(&matrix).unwrap();
    for _ in 0..3 {
        apply_matrix(&prepared, &mut data, 0, 1);
    }
    assert_approx_matrix_eq!(&DVector::from_vec(data), &DVector::from_vec(vec![0.5, -2.0]), abstol = 1e-14);
}

#[test]
fn singular_matrices_cannot_be_prepared() {
    let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
    assert_eq!(prepare_matrix(&matrix), Err(Error::SingularMatrix));
    assert_eq!(prepare_matrix(&DMatrix::<f64>::zeros(3, 3)), Err(Error::SingularMatrix));
}

#[test]
fn non_square_matrices_cannot_be_prepared() {
    let matrix = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    assert_eq!(prepare_matrix(&matrix), Err(Error::NotSquare { rows: 2, cols: 3 }));
}

#[test]
fn unprepared_application_is_the_matrix_product() {
    let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let mut data = vec![9.0, 1.0, 10.0, 0.0, 1.0, 2.0];
    apply_matrix_unprepared(&matrix, &mut data, 1, 2);
    assert_eq!(data, vec![9.0, 1.0, 12.0, 4.0, 34.0, 8.0]);
}

#[test]
fn permutation_as_swaps() {
    let perm = [2, 0, 3, 1];
    let swaps = prepare_permutation(&perm);
    let mut data = vec!['a', 'b', 'c', 'd'];
    apply_permutation(&swaps, &mut data, 0, 1);
    assert_eq!(data, vec!['c', 'a', 'd', 'b']);
}

fn permutation(max_len: usize) -> impl Strategy<Value = Vec<usize>> {
    (1..=max_len).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn prepared_permutation_moves_entries(perm in permutation(8), block_size in 1..3usize, offset in 0..3usize) {
        let n = perm.len();
        let data: Vec<usize> = (0..block_size * (n + offset)).collect();
        let mut permuted = data.clone();
        apply_permutation(&prepare_permutation(&perm), &mut permuted, offset, block_size);
        for (i, &p) in perm.iter().enumerate() {
            for b in 0..block_size {
                prop_assert_eq!(permuted[block_size * (offset + i) + b], data[block_size * (offset + p) + b]);
            }
        }
    }

    #[test]
    fn prepared_matrices_compute_products(
        (matrix, data, columns) in (1..=3usize).prop_flat_map(|n| (
            invertible_jacobian(n),
            vec(-1.0f64..1.0, 2 * n + 2),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        )),
    ) {
        // Reorder columns so that the dominant entries are off the diagonal
        let n = matrix.nrows();
        let shuffled = DMatrix::from_fn(n, n, |i, j| matrix[(i, columns[j])]);
        check_prepared_matrix(&shuffled, &data, 1, 2);
    }
}
