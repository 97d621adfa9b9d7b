use super::{apply_base_transformations, assert_dual_basis, assert_slices_approx_eq, assert_transformation_relations, test_data};
use febasis::cell::CellType;
use febasis::element::create_rt;
use febasis::nalgebra::DMatrix;
use febasis::proptest::points_in_cell;
use febasis::MappingType;
use proptest::prelude::*;

#[test]
fn lowest_order_triangle_element() {
    let element = create_rt(CellType::Triangle, 1).unwrap();
    assert_eq!(element.dim(), 3);
    assert_eq!(element.value_shape(), &[2]);
    assert_eq!(element.value_size(), 2);
    assert_eq!(element.value_rank(), 1);
    assert_eq!(element.mapping_type(), MappingType::ContravariantPiola);
    assert_eq!(element.entity_dofs(), &[vec![0; 3], vec![1; 3], vec![0]]);
}

#[test]
fn lowest_order_normal_components_at_facet_midpoints() {
    // The normal component of a lowest order function is constant on every facet, so the
    // facet moments reduce to evaluation at the midpoint
    let element = create_rt(CellType::Triangle, 1).unwrap();
    let midpoints = DMatrix::from_row_slice(3, 2, &[0.5, 0.5, 0.0, 0.5, 0.5, 0.0]);
    let normals = [[-1.0, -1.0], [-1.0, 0.0], [0.0, 1.0]];
    let table = element.tabulate(0, &midpoints).unwrap().swap_remove(0);
    for i in 0..3 {
        for (e, normal) in normals.iter().enumerate() {
            let flux = table[(e, i)] * normal[0] + table[(e, 3 + i)] * normal[1];
            let expected = if i == e { 1.0 } else { 0.0 };
            assert!((flux - expected).abs() < 1e-12, "function {i}, facet {e}: {flux}");
        }
    }
}

#[test]
fn dimensions() {
    for k in 1..=3 {
        let triangle = create_rt(CellType::Triangle, k).unwrap();
        assert_eq!(triangle.dim(), k * (k + 2));
        assert_eq!(triangle.entity_dofs()[1], vec![k; 3]);
        assert_eq!(triangle.entity_dofs()[2], vec![k * (k - 1)]);

        let tetrahedron = create_rt(CellType::Tetrahedron, k).unwrap();
        assert_eq!(tetrahedron.dim(), k * (k + 1) * (k + 3) / 2);
        assert_eq!(tetrahedron.entity_dofs()[2], vec![k * (k + 1) / 2; 4]);
        assert_eq!(tetrahedron.entity_dofs()[1], vec![0; 6]);

        assert_dual_basis(&triangle, 1e-10);
        assert_dual_basis(&tetrahedron, 1e-10);
        assert_transformation_relations(&triangle);
        assert_transformation_relations(&tetrahedron);
    }
}

#[test]
fn face_reflection_flips_normal_moments() {
    let element = create_rt(CellType::Tetrahedron, 1).unwrap();
    let reflection = &element.base_transformations()[6 + 2 * 3 + 1];
    let rotation = &element.base_transformations()[6 + 2 * 3];
    assert!((reflection[(3, 3)] + 1.0).abs() < 1e-14);
    assert!((rotation[(3, 3)] - 1.0).abs() < 1e-14);
}

#[test]
fn dof_transformations_on_a_tetrahedron() {
    let element = create_rt(CellType::Tetrahedron, 3).unwrap();
    let transformations = element.base_transformations();
    let data = test_data(3 * element.dim());

    // Face 0 rotated once, face 2 reflected
    let cell_info = (1 << 1) | (1 << 6);
    let mut transformed = data.clone();
    element.apply_dof_transformation(&mut transformed, 3, cell_info).unwrap();
    let expected = apply_base_transformations(&[&transformations[6], &transformations[11]], &data, 3);
    assert_slices_approx_eq(&transformed, &expected, 1e-10);
}

proptest! {
    #[test]
    fn divergence_of_lowest_order_functions_is_constant(points in points_in_cell(CellType::Tetrahedron, 4)) {
        let element = create_rt(CellType::Tetrahedron, 1).unwrap();
        let n = element.dim();
        let tables = element.tabulate(1, &points).unwrap();
        for i in 0..n {
            let divergence = |p: usize| -> f64 { (0..3).map(|k| tables[1 + k][(p, k * n + i)]).sum() };
            let first = divergence(0);
            for p in 1..points.nrows() {
                prop_assert!((divergence(p) - first).abs() < 1e-10);
            }
        }
    }
}
