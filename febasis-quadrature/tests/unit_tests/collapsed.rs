use febasis_quadrature::collapsed::{pyramid, tetrahedron, triangle};
use febasis_quadrature::integrate;
use matrixcompare::assert_scalar_eq;

fn factorial(n: i32) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

#[test]
fn triangle_rules_integrate_monomials_of_total_degree() {
    for m in 1..=8 {
        let expected_polynomial_degree = 2 * m as i32 - 1;
        let rule = triangle(m).unwrap();
        assert_eq!(rule.0.len(), m * m);
        assert!(rule.0.iter().all(|&w| w > 0.0));
        assert!(rule.1.iter().all(|&[x, y]| x >= 0.0 && y >= 0.0 && x + y <= 1.0));

        for a in 0..=expected_polynomial_degree {
            for b in 0..=(expected_polynomial_degree - a) {
                let expected = factorial(a) * factorial(b) / factorial(a + b + 2);
                let estimated = integrate(&rule, |&[x, y]| x.powi(a) * y.powi(b));
                assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn tetrahedron_rules_integrate_monomials_of_total_degree() {
    for m in 1..=6 {
        let expected_polynomial_degree = 2 * m as i32 - 1;
        let rule = tetrahedron(m).unwrap();
        assert_eq!(rule.0.len(), m * m * m);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for a in 0..=expected_polynomial_degree {
            for b in 0..=(expected_polynomial_degree - a) {
                for c in 0..=(expected_polynomial_degree - a - b) {
                    let expected = factorial(a) * factorial(b) * factorial(c) / factorial(a + b + c + 3);
                    let estimated = integrate(&rule, |&[x, y, z]| x.powi(a) * y.powi(b) * z.powi(c));
                    assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-14);
                }
            }
        }
    }
}

#[test]
fn pyramid_rules_integrate_monomials_of_total_degree() {
    for m in 1..=6 {
        let expected_polynomial_degree = 2 * m as i32 - 1;
        let rule = pyramid(m).unwrap();
        assert!(rule.0.iter().all(|&w| w > 0.0));

        let volume: f64 = rule.0.iter().sum();
        assert_scalar_eq!(volume, 1.0 / 3.0, comp = abs, tol = 1e-14);

        for a in 0..=expected_polynomial_degree {
            for b in 0..=(expected_polynomial_degree - a) {
                for c in 0..=(expected_polynomial_degree - a - b) {
                    let expected = factorial(c) * factorial(a + b + 2)
                        / factorial(a + b + c + 3)
                        / ((a + 1) * (b + 1)) as f64;
                    let estimated = integrate(&rule, |&[x, y, z]| x.powi(a) * y.powi(b) * z.powi(c));
                    assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-14);
                }
            }
        }
    }
}
