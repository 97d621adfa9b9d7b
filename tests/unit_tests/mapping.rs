use febasis::mapping::{pull_back, push_forward, MappingType};
use febasis::nalgebra::{DMatrix, DVector};
use febasis::proptest::invertible_jacobian;
use febasis::Error;
use matrixcompare::assert_scalar_eq;
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::select;
use util::assert_approx_matrix_eq;

fn reference_value_size(mapping: MappingType, tdim: usize) -> usize {
    match mapping {
        MappingType::Identity => 1,
        MappingType::CovariantPiola | MappingType::ContravariantPiola => tdim,
        MappingType::DoubleCovariantPiola | MappingType::DoubleContravariantPiola => tdim * tdim,
    }
}

fn mapping_case() -> impl Strategy<Value = (MappingType, DMatrix<f64>, Vec<f64>)> {
    (select(MappingType::ALL.to_vec()), 1..=3usize).prop_flat_map(|(mapping, dim)| {
        let size = reference_value_size(mapping, dim);
        (Just(mapping), invertible_jacobian(dim), vec(-1.0f64..1.0, size))
    })
}

proptest! {
    #[test]
    fn pull_back_inverts_push_forward((mapping, j, value) in mapping_case()) {
        let det_j = j.determinant();
        let k = j.clone().try_inverse().unwrap();
        let physical = push_forward(mapping, &value, &j, det_j, &k).unwrap();
        prop_assert_eq!(physical.len(), mapping.physical_value_size(value.len(), j.nrows()));
        let reference = pull_back(mapping, &physical, &j, det_j, &k).unwrap();
        let expected = DVector::from_vec(value);
        assert_approx_matrix_eq!(&DVector::from_vec(reference), &expected, abstol = 1e-12);
    }

    #[test]
    fn covariant_piola_preserves_tangential_components(
        j in invertible_jacobian(3),
        v in vec(-1.0f64..1.0, 3),
        w in vec(-1.0f64..1.0, 3),
    ) {
        // (K^T v) . (J w) = v . w
        let k = j.clone().try_inverse().unwrap();
        let mapped = DVector::from_vec(push_forward(MappingType::CovariantPiola, &v, &j, j.determinant(), &k).unwrap());
        let w = DVector::from_vec(w);
        let expected = DVector::from_vec(v).dot(&w);
        prop_assert!((mapped.dot(&(&j * &w)) - expected).abs() < 1e-12);
    }
}

#[test]
fn contravariant_piola_scales_by_determinant() {
    let j = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]);
    let k = DMatrix::from_row_slice(2, 2, &[0.5, 0.0, 0.0, 1.0]);
    let mapped = push_forward(MappingType::ContravariantPiola, &[1.0, 1.0], &j, 2.0, &k).unwrap();
    assert_scalar_eq!(mapped[0], 1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(mapped[1], 0.5, comp = abs, tol = 1e-15);
}

#[test]
fn double_covariant_piola_of_a_matrix() {
    let j = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
    let k = DMatrix::from_row_slice(2, 2, &[0.5, 0.0, 0.0, 0.25]);
    let mapped = push_forward(MappingType::DoubleCovariantPiola, &[1.0, 2.0, 3.0, 4.0], &j, 8.0, &k).unwrap();
    let expected = [0.25, 0.25, 0.375, 0.25];
    for (m, e) in mapped.iter().zip(expected) {
        assert_scalar_eq!(*m, e, comp = abs, tol = 1e-15);
    }
}

#[test]
fn piola_maps_from_a_surface() {
    // A triangle embedded in 3D
    let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    let k = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let mapped = push_forward(MappingType::CovariantPiola, &[0.5, -1.0], &j, 1.0, &k).unwrap();
    assert_eq!(mapped, vec![0.5, -1.0, 0.0]);
    let back = pull_back(MappingType::CovariantPiola, &mapped, &j, 1.0, &k).unwrap();
    assert_eq!(back, vec![0.5, -1.0]);
}

#[test]
fn value_sizes_are_checked() {
    let j = DMatrix::<f64>::identity(2, 2);
    let k = DMatrix::<f64>::identity(2, 2);
    assert_eq!(
        push_forward(MappingType::ContravariantPiola, &[1.0, 2.0, 3.0], &j, 1.0, &k),
        Err(Error::ValueSizeMismatch { expected: 2, actual: 3 })
    );
    assert_eq!(
        pull_back(MappingType::DoubleContravariantPiola, &[1.0, 2.0], &j, 1.0, &k),
        Err(Error::ValueSizeMismatch { expected: 4, actual: 2 })
    );
}

#[test]
fn mapping_names() {
    for mapping in MappingType::ALL {
        assert_eq!(mapping.name().parse::<MappingType>(), Ok(mapping));
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, format!("\"{mapping}\""));
    }
    assert_eq!(
        serde_json::from_str::<MappingType>("\"contravariant Piola\"").unwrap(),
        MappingType::ContravariantPiola
    );
    assert!("Piola".parse::<MappingType>().is_err());
}
