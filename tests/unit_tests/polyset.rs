use febasis::cell::CellType;
use febasis::nalgebra::DMatrix;
use febasis::polyset::{derivative_index, derivative_multi_indices, dim, num_derivatives, tabulate};
use febasis::proptest::points_in_cell;
use febasis::quadrature::make_quadrature;
use febasis::Error;
use matrixcompare::assert_scalar_eq;
use paste::paste;
use proptest::prelude::*;
use util::{assert_approx_matrix_eq, assert_panics, central_difference};

/// `int phi_i phi_j` over the cell for all pairs of expansion functions.
fn mass_matrix(cell: CellType, degree: usize) -> DMatrix<f64> {
    let (weights, points) = make_quadrature(cell, 2 * degree).unwrap();
    let phi = tabulate(cell, degree, 0, &points).unwrap().swap_remove(0);
    let weighted = DMatrix::from_fn(phi.nrows(), phi.ncols(), |p, i| weights[p] * phi[(p, i)]);
    phi.transpose() * weighted
}

macro_rules! polyset_tests {
    ($($cell:ident: $max_degree:expr),*) => {
        paste! {
            $(
                #[test]
                fn [<expansion_set_is_orthonormal_on_ $cell:snake>]() {
                    let cell = CellType::$cell;
                    for degree in 0..=$max_degree {
                        let n = dim(cell, degree);
                        let mass = mass_matrix(cell, degree);
                        assert_eq!(mass.shape(), (n, n));
                        assert_approx_matrix_eq!(&mass, &DMatrix::<f64>::identity(n, n), abstol = 1e-10);
                    }
                }

                proptest! {
                    #[test]
                    fn [<first_derivatives_match_finite_differences_on_ $cell:snake>](
                        x in points_in_cell(CellType::$cell, 1)
                    ) {
                        let cell = CellType::$cell;
                        let degree = 3;
                        let tdim = cell.topological_dimension();
                        let tables = tabulate(cell, degree, 1, &x).unwrap();
                        prop_assert_eq!(tables.len(), num_derivatives(tdim, 1));

                        let values = |y: &DMatrix<f64>| tabulate(cell, degree, 0, y).unwrap().swap_remove(0);
                        let scale = 1.0 + tables[0].amax();
                        for axis in 0..tdim {
                            let mut alpha = vec![0; tdim];
                            alpha[axis] = 1;
                            let approx = central_difference(&values, &x, axis, 1e-6);
                            let exact = &tables[derivative_index(&alpha)];
                            assert_approx_matrix_eq!(exact, &approx, abstol = 1e-5 * scale);
                        }
                    }
                }
            )*
        }
    };
}

polyset_tests!(
    Interval: 6,
    Triangle: 5,
    Quadrilateral: 4,
    Tetrahedron: 4,
    Hexahedron: 3,
    Prism: 3,
    Pyramid: 3
);

#[test]
fn expansion_set_dimensions() {
    assert_eq!(dim(CellType::Point, 3), 1);
    assert_eq!(dim(CellType::Interval, 3), 4);
    assert_eq!(dim(CellType::Triangle, 3), 10);
    assert_eq!(dim(CellType::Quadrilateral, 3), 16);
    assert_eq!(dim(CellType::Tetrahedron, 3), 20);
    assert_eq!(dim(CellType::Hexahedron, 3), 64);
    assert_eq!(dim(CellType::Prism, 3), 40);
    assert_eq!(dim(CellType::Pyramid, 3), 30);
}

#[test]
fn interval_expansion_set_is_scaled_legendre() {
    let points = DMatrix::from_column_slice(3, 1, &[0.0, 0.25, 1.0]);
    let phi = tabulate(CellType::Interval, 2, 0, &points).unwrap().swap_remove(0);
    for (p, &x) in [0.0, 0.25, 1.0].iter().enumerate() {
        let s = 2.0 * x - 1.0;
        assert_scalar_eq!(phi[(p, 0)], 1.0, comp = abs, tol = 1e-14);
        assert_scalar_eq!(phi[(p, 1)], 3.0_f64.sqrt() * s, comp = abs, tol = 1e-14);
        assert_scalar_eq!(phi[(p, 2)], 5.0_f64.sqrt() * 0.5 * (3.0 * s * s - 1.0), comp = abs, tol = 1e-13);
    }
}

#[test]
fn simplex_expansion_sets_are_hierarchical() {
    let points = DMatrix::from_row_slice(4, 2, &[0.1, 0.2, 0.3, 0.3, 0.0, 1.0, 0.25, 0.5]);
    let high = tabulate(CellType::Triangle, 4, 1, &points).unwrap();
    for degree in 0..4 {
        let low = tabulate(CellType::Triangle, degree, 1, &points).unwrap();
        for (low, high) in low.iter().zip(&high) {
            let n = low.ncols();
            assert_approx_matrix_eq!(low, &high.columns(0, n).clone_owned(), abstol = 1e-12);
        }
    }
}

#[test]
fn derivative_tables_are_ordered_by_total_order() {
    assert_eq!(derivative_index(&[0, 0]), 0);
    assert_eq!(derivative_index(&[1, 0]), 1);
    assert_eq!(derivative_index(&[0, 1]), 2);
    assert_eq!(derivative_index(&[2, 0]), 3);
    assert_eq!(derivative_index(&[0, 0, 1]), 3);
    assert_panics!(derivative_index(&[0, 0, 0, 1]));

    for tdim in 1..=3 {
        let indices = derivative_multi_indices(tdim, 3);
        assert_eq!(indices.len(), num_derivatives(tdim, 3));
        for (i, alpha) in indices.iter().enumerate() {
            assert_eq!(derivative_index(&alpha[..tdim]), i);
        }
    }
}

#[test]
fn second_derivatives_of_quadratic_triangle_functions_are_constant() {
    let points = DMatrix::from_row_slice(2, 2, &[0.1, 0.2, 0.6, 0.3]);
    let tables = tabulate(CellType::Triangle, 2, 2, &points).unwrap();
    assert_eq!(tables.len(), 6);
    for table in &tables[3..] {
        let first = table.row(0).clone_owned();
        let second = table.row(1).clone_owned();
        assert_approx_matrix_eq!(&first, &second, abstol = 1e-11);
    }
    // Third derivatives vanish
    let tables = tabulate(CellType::Triangle, 2, 3, &points).unwrap();
    for table in &tables[6..] {
        assert!(table.amax() < 1e-11);
    }
}

#[test]
fn pyramid_apex_is_finite() {
    let apex = DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 1.0]);
    let tables = tabulate(CellType::Pyramid, 3, 1, &apex).unwrap();
    assert!(tables.iter().all(|table| table.iter().all(|v| v.is_finite())));
}

#[test]
fn tabulate_rejects_points_of_wrong_dimension() {
    let points = DMatrix::<f64>::zeros(2, 3);
    assert_eq!(
        tabulate(CellType::Triangle, 1, 0, &points),
        Err(Error::PointDimensionMismatch { expected: 2, actual: 3 })
    );
}
