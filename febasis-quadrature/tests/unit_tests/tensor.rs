use febasis_quadrature::tensor::{
    hexahedron, hexahedron_gauss_lobatto, interval, prism, quadrilateral, quadrilateral_gauss_lobatto,
};
use febasis_quadrature::{gauss_lobatto_points_for_degree, gauss_points_for_degree, integrate};
use matrixcompare::assert_scalar_eq;

fn monomial_integral_1d(alpha: i32) -> f64 {
    1.0 / (alpha as f64 + 1.0)
}

#[test]
fn interval_rule_of_degree_three_integrates_cubic() {
    let rule = interval(gauss_points_for_degree(3)).unwrap();
    let total: f64 = rule.0.iter().sum();
    assert_scalar_eq!(total, 1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(integrate(&rule, |&[x]| x * x * x), 0.25, comp = abs, tol = 1e-15);
}

#[test]
fn quadrilateral_rules_satisfy_expected_accuracy() {
    // Number of points in each dimension of rule
    for n in 1..=12 {
        // Expected polynomial degree that the rule can exactly integrate *along each dimension*
        let expected_polynomial_degree = 2 * n - 1;
        let rule = quadrilateral(n).unwrap();

        // Also test that weights are positive
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            for beta in 0..=expected_polynomial_degree as i32 {
                let monomial_integral_2d = monomial_integral_1d(alpha) * monomial_integral_1d(beta);
                let estimated_integral = integrate(&rule, |&[x, y]| x.powi(alpha) * y.powi(beta));

                assert_scalar_eq!(estimated_integral, monomial_integral_2d, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn hexahedral_rules_satisfy_expected_accuracy() {
    for n in 1..=6 {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = hexahedron(n).unwrap();

        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            for beta in 0..=expected_polynomial_degree as i32 {
                for gamma in 0..=expected_polynomial_degree as i32 {
                    let expected =
                        monomial_integral_1d(alpha) * monomial_integral_1d(beta) * monomial_integral_1d(gamma);
                    let estimated_integral =
                        integrate(&rule, |&[x, y, z]| x.powi(alpha) * y.powi(beta) * z.powi(gamma));

                    assert_scalar_eq!(estimated_integral, expected, comp = abs, tol = 1e-13);
                }
            }
        }
    }
}

#[test]
fn prism_rules_integrate_products_of_triangle_and_interval_monomials() {
    fn factorial(n: i32) -> f64 {
        (1..=n).map(|i| i as f64).product()
    }

    for n in 1..=5 {
        let degree = 2 * n as i32 - 1;
        let rule = prism(n).unwrap();
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for a in 0..=degree {
            for b in 0..=(degree - a) {
                for c in 0..=degree {
                    let expected = factorial(a) * factorial(b) / factorial(a + b + 2) * monomial_integral_1d(c);
                    let estimated = integrate(&rule, |&[x, y, z]| x.powi(a) * y.powi(b) * z.powi(c));
                    assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-14);
                }
            }
        }
    }
}

#[test]
fn gauss_lobatto_tensor_rules_contain_vertices() {
    for degree in 1..=9 {
        let n = gauss_lobatto_points_for_degree(degree);
        let rule = quadrilateral_gauss_lobatto(n).unwrap();
        assert!(rule.1.contains(&[0.0, 0.0]));
        assert!(rule.1.contains(&[1.0, 1.0]));
        let area: f64 = rule.0.iter().sum();
        assert_scalar_eq!(area, 1.0, comp = abs, tol = 1e-14);

        let rule = hexahedron_gauss_lobatto(n).unwrap();
        let d = degree as i32;
        let estimated = integrate(&rule, |&[x, y, z]| x.powi(d) * y * z.powi(d));
        let expected = monomial_integral_1d(d) * monomial_integral_1d(1) * monomial_integral_1d(d);
        assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-13);
    }
}
