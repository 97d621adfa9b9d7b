use super::{apply_base_transformations, assert_dual_basis, assert_slices_approx_eq, assert_transformation_relations, test_data};
use febasis::cell::CellType;
use febasis::element::{create_dlagrange, create_lagrange, create_tp, ElementFamily};
use febasis::nalgebra::DMatrix;
use febasis::polyset;
use febasis::proptest::point_in_cell;
use febasis::MappingType;
use paste::paste;
use proptest::prelude::*;
use util::assert_approx_matrix_eq;

macro_rules! lagrange_tests {
    ($($cell:ident: $max_degree:expr),*) => {
        paste! {
            $(
                #[test]
                fn [<lagrange_basis_is_nodal_on_ $cell:snake>]() {
                    let cell = CellType::$cell;
                    for degree in 0..=$max_degree {
                        let element = create_lagrange(cell, degree).unwrap();
                        let n = element.dim();
                        assert_eq!(n, polyset::dim(cell, degree));
                        assert_eq!(element.value_shape(), &[] as &[usize]);
                        assert_eq!(element.value_size(), 1);
                        assert_eq!(element.mapping_type(), MappingType::Identity);

                        let table = element.tabulate(0, element.points()).unwrap().swap_remove(0);
                        assert_approx_matrix_eq!(&table, &DMatrix::<f64>::identity(n, n), abstol = 1e-12);
                        assert_transformation_relations(&element);
                    }
                }

                proptest! {
                    #[test]
                    fn [<lagrange_basis_is_a_partition_of_unity_on_ $cell:snake>](
                        x in point_in_cell(CellType::$cell),
                        degree in 1..=$max_degree as usize,
                    ) {
                        let cell = CellType::$cell;
                        let element = create_lagrange(cell, degree).unwrap();
                        let tdim = cell.topological_dimension();
                        let points = DMatrix::from_row_slice(1, tdim, &x);
                        let tables = element.tabulate(1, &points).unwrap();
                        let sum: f64 = tables[0].iter().sum();
                        prop_assert!((sum - 1.0).abs() < 1e-10);
                        for derivative in &tables[1..] {
                            let sum: f64 = derivative.iter().sum();
                            prop_assert!(sum.abs() < 1e-9);
                        }
                    }
                }
            )*
        }
    };
}

lagrange_tests!(
    Interval: 5,
    Triangle: 4,
    Quadrilateral: 3,
    Tetrahedron: 3,
    Hexahedron: 3,
    Prism: 3,
    Pyramid: 2
);

#[test]
fn linear_triangle_basis_is_barycentric() {
    let element = create_lagrange(CellType::Triangle, 1).unwrap();
    assert_eq!(element.dim(), 3);
    assert_eq!(element.entity_dofs(), &[vec![1, 1, 1], vec![0, 0, 0], vec![0]]);

    let points = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0 / 3.0, 1.0 / 3.0]);
    let tables = element.tabulate(1, &points).unwrap();
    #[rustfmt::skip]
    let expected_values = DMatrix::from_row_slice(4, 3, &[
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
        1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0,
    ]);
    assert_approx_matrix_eq!(&tables[0], &expected_values, abstol = 1e-12);

    let expected_dx = DMatrix::from_fn(4, 3, |_, i| [-1.0, 1.0, 0.0][i]);
    let expected_dy = DMatrix::from_fn(4, 3, |_, i| [-1.0, 0.0, 1.0][i]);
    assert_approx_matrix_eq!(&tables[1], &expected_dx, abstol = 1e-12);
    assert_approx_matrix_eq!(&tables[2], &expected_dy, abstol = 1e-12);
}

#[test]
fn nodes_are_ordered_by_entity() {
    let element = create_lagrange(CellType::Tetrahedron, 3).unwrap();
    assert_eq!(
        element.entity_dofs(),
        &[vec![1; 4], vec![2; 6], vec![1; 4], vec![0]]
    );
    let points = element.points();
    // Vertices first
    let vertices = CellType::Tetrahedron.geometry();
    assert_approx_matrix_eq!(&points.rows(0, 4).clone_owned(), &vertices, abstol = 0.0);
    // Then the two nodes of edge 0, which joins vertices 2 and 3
    #[rustfmt::skip]
    let edge = DMatrix::from_row_slice(2, 3, &[
        0.0, 2.0 / 3.0, 1.0 / 3.0,
        0.0, 1.0 / 3.0, 2.0 / 3.0,
    ]);
    assert_approx_matrix_eq!(&points.rows(4, 2).clone_owned(), &edge, abstol = 1e-15);
    // The node of face 0 is its midpoint
    let face = DMatrix::from_row_slice(1, 3, &[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
    assert_approx_matrix_eq!(&points.rows(16, 1).clone_owned(), &face, abstol = 1e-15);
}

#[test]
fn constant_element_has_an_interior_node() {
    let element = create_lagrange(CellType::Quadrilateral, 0).unwrap();
    assert_eq!(element.dim(), 1);
    assert_eq!(element.entity_dofs(), &[vec![0; 4], vec![0; 4], vec![1]]);
    assert_approx_matrix_eq!(element.points(), &DMatrix::from_row_slice(1, 2, &[0.5, 0.5]), abstol = 1e-15);
}

#[test]
fn edge_reflection_reverses_edge_nodes() {
    let element = create_lagrange(CellType::Triangle, 3).unwrap();
    let reflection = &element.base_transformations()[1];
    // Edge 1 owns dofs 5 and 6
    let mut expected = DMatrix::<f64>::identity(10, 10);
    expected[(5, 5)] = 0.0;
    expected[(6, 6)] = 0.0;
    expected[(5, 6)] = 1.0;
    expected[(6, 5)] = 1.0;
    assert_approx_matrix_eq!(reflection, &expected, abstol = 0.0);
}

#[test]
fn dof_transformations_on_a_triangle() {
    let element = create_lagrange(CellType::Triangle, 4).unwrap();
    let transformations = element.base_transformations();
    let data = test_data(element.dim() * 2);

    // Reflect edges 0 and 2
    let mut transformed = data.clone();
    element.apply_dof_transformation(&mut transformed, 2, 0b101).unwrap();
    let expected = apply_base_transformations(&[&transformations[0], &transformations[2]], &data, 2);
    assert_slices_approx_eq(&transformed, &expected, 1e-12);
}

#[test]
fn dof_transformations_on_a_tetrahedron() {
    let element = create_lagrange(CellType::Tetrahedron, 4).unwrap();
    let transformations = element.base_transformations();
    let data = test_data(element.dim());

    // Edge 2 reflected, face 1 rotated twice and then reflected
    let cell_info = (1 << (3 * 4 + 2)) | (2 << 4) | (1 << 3);
    let mut transformed = data.clone();
    element.apply_dof_transformation(&mut transformed, 1, cell_info).unwrap();
    let expected = apply_base_transformations(
        &[&transformations[2], &transformations[8], &transformations[8], &transformations[9]],
        &data,
        1,
    );
    assert_slices_approx_eq(&transformed, &expected, 1e-12);

    // Without any flags the data is untouched
    let mut untouched = data.clone();
    element.apply_dof_transformation(&mut untouched, 1, 0).unwrap();
    assert_eq!(untouched, data);
}

#[test]
fn dof_transformations_on_hexahedron_faces() {
    let element = create_lagrange(CellType::Hexahedron, 3).unwrap();
    let transformations = element.base_transformations();
    let data = test_data(element.dim());

    // Face 5 rotated three times
    let cell_info = 3 << (3 * 5 + 1);
    let mut transformed = data.clone();
    element.apply_dof_transformation(&mut transformed, 1, cell_info).unwrap();
    let rotation = &transformations[12 + 2 * 5];
    let expected = apply_base_transformations(&[rotation, rotation, rotation], &data, 1);
    assert_slices_approx_eq(&transformed, &expected, 1e-12);
}

#[test]
fn discontinuous_lagrange_owns_all_dofs_in_the_interior() {
    let element = create_dlagrange(CellType::Triangle, 2).unwrap();
    assert_eq!(element.family(), ElementFamily::DiscontinuousLagrange);
    assert_eq!(element.entity_dofs(), &[vec![0; 3], vec![0; 3], vec![6]]);
    for t in element.base_transformations() {
        assert_eq!(t, &DMatrix::<f64>::identity(6, 6));
    }
    assert_dual_basis(&element, 1e-12);
}

#[test]
fn tensor_product_elements_are_nodal() {
    for cell in [CellType::Quadrilateral, CellType::Hexahedron, CellType::Prism, CellType::Pyramid] {
        let element = create_tp(cell, 2).unwrap();
        assert_eq!(element.family(), ElementFamily::TensorProduct);
        let n = element.dim();
        assert_eq!(element.entity_dofs()[cell.topological_dimension()], vec![n]);
        let table = element.tabulate(0, element.points()).unwrap().swap_remove(0);
        assert_approx_matrix_eq!(&table, &DMatrix::<f64>::identity(n, n), abstol = 1e-12);
    }
}
