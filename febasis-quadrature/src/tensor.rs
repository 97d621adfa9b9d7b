//! Rules on the unit interval, square, cube and prism formed by tensor products.
//!
//! For quadrilaterals and hexahedra, quadrature rules can be constructed as tensor products
//! of 1D rules. The prism rule is the product of a collapsed triangle rule with a 1D rule.

use crate::collapsed::triangle;
use crate::univariate::{gauss_jacobi, gauss_lobatto};
use crate::{check_weights, Error, Rule};

/// Maps a rule on `[-1, 1]` to the unit interval `[0, 1]`.
fn to_unit_interval(rule: Rule<1>) -> Rule<1> {
    let (weights, points) = rule;
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    let points = points.into_iter().map(|[x]| [0.5 * (1.0 + x)]).collect();
    (weights, points)
}

fn tensor2(rule1d: &Rule<1>) -> Rule<2> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d_iter = || weights1d.iter().zip(points1d);

    for (&wx, &[x]) in rule1d_iter() {
        for (&wy, &[y]) in rule1d_iter() {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}

fn tensor3(rule1d: &Rule<1>) -> Rule<3> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let mut weights3d = Vec::with_capacity(n * n * n);
    let mut points3d = Vec::with_capacity(n * n * n);

    let rule1d_iter = || weights1d.iter().zip(points1d);

    for (&wx, &[x]) in rule1d_iter() {
        for (&wy, &[y]) in rule1d_iter() {
            for (&wz, &[z]) in rule1d_iter() {
                weights3d.push(wx * wy * wz);
                points3d.push([x, y, z]);
            }
        }
    }

    (weights3d, points3d)
}

/// A Gauss rule on the unit interval with the given number of points.
pub fn interval(num_points: usize) -> Result<Rule<1>, Error> {
    Ok(to_unit_interval(gauss_jacobi(0.0, num_points)?))
}

/// A Gauss rule on the unit square with the given number of points per dimension.
pub fn quadrilateral(num_points_per_dim: usize) -> Result<Rule<2>, Error> {
    Ok(tensor2(&interval(num_points_per_dim)?))
}

/// A Gauss rule on the unit cube with the given number of points per dimension.
pub fn hexahedron(num_points_per_dim: usize) -> Result<Rule<3>, Error> {
    Ok(tensor3(&interval(num_points_per_dim)?))
}

/// A rule on the reference prism, formed by a collapsed triangle rule and a Gauss rule along
/// the prism axis, with the given number of points per dimension.
pub fn prism(num_points_per_dim: usize) -> Result<Rule<3>, Error> {
    let (tri_weights, tri_points) = triangle(num_points_per_dim)?;
    let (line_weights, line_points) = interval(num_points_per_dim)?;

    let n = tri_weights.len() * line_weights.len();
    let mut weights = Vec::with_capacity(n);
    let mut points = Vec::with_capacity(n);
    for (&wt, &[x, y]) in tri_weights.iter().zip(&tri_points) {
        for (&wl, &[z]) in line_weights.iter().zip(&line_points) {
            weights.push(wt * wl);
            points.push([x, y, z]);
        }
    }

    check_weights((weights, points))
}

/// A Gauss-Lobatto-Legendre rule on the unit interval.
pub fn interval_gauss_lobatto(num_points: usize) -> Result<Rule<1>, Error> {
    Ok(to_unit_interval(gauss_lobatto(num_points)?))
}

/// A Gauss-Lobatto-Legendre rule on the unit square.
pub fn quadrilateral_gauss_lobatto(num_points_per_dim: usize) -> Result<Rule<2>, Error> {
    Ok(tensor2(&interval_gauss_lobatto(num_points_per_dim)?))
}

/// A Gauss-Lobatto-Legendre rule on the unit cube.
pub fn hexahedron_gauss_lobatto(num_points_per_dim: usize) -> Result<Rule<3>, Error> {
    Ok(tensor3(&interval_gauss_lobatto(num_points_per_dim)?))
}
