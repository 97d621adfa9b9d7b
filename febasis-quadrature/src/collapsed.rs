//! Collapsed (Duffy-type) rules for the reference triangle, tetrahedron and pyramid.
//!
//! The cell is parametrized by a cube in which one or more axes collapse towards a vertex.
//! The Jacobian of this change of variables is a power of `(1 - t)` along each collapsing
//! axis, which is absorbed into a Gauss-Jacobi weight $(1 - t)^a$. The tensor product rule
//! therefore stays exact: `m` points per axis integrate polynomials of total degree up to
//! `2 m - 1`.

use crate::univariate::gauss_jacobi;
use crate::{check_weights, Error, Rule};

/// A collapsed Gauss-Jacobi rule for the reference triangle with `m` points per axis.
pub fn triangle(m: usize) -> Result<Rule<2>, Error> {
    let (wx, px) = gauss_jacobi(0.0, m)?;
    let (wy, py) = gauss_jacobi(1.0, m)?;

    let mut weights = Vec::with_capacity(m * m);
    let mut points = Vec::with_capacity(m * m);
    for (&w_i, &[x_i]) in wx.iter().zip(&px) {
        for (&w_j, &[y_j]) in wy.iter().zip(&py) {
            let x = 0.25 * (1.0 + x_i) * (1.0 - y_j);
            let y = 0.5 * (1.0 + y_j);
            points.push([x, y]);
            weights.push(w_i * w_j * 0.125);
        }
    }

    check_weights((weights, points))
}

/// A collapsed Gauss-Jacobi rule for the reference tetrahedron with `m` points per axis.
pub fn tetrahedron(m: usize) -> Result<Rule<3>, Error> {
    let (wx, px) = gauss_jacobi(0.0, m)?;
    let (wy, py) = gauss_jacobi(1.0, m)?;
    let (wz, pz) = gauss_jacobi(2.0, m)?;

    let mut weights = Vec::with_capacity(m * m * m);
    let mut points = Vec::with_capacity(m * m * m);
    for (&w_i, &[x_i]) in wx.iter().zip(&px) {
        for (&w_j, &[y_j]) in wy.iter().zip(&py) {
            for (&w_k, &[z_k]) in wz.iter().zip(&pz) {
                let x = 0.125 * (1.0 + x_i) * (1.0 - y_j) * (1.0 - z_k);
                let y = 0.25 * (1.0 + y_j) * (1.0 - z_k);
                let z = 0.5 * (1.0 + z_k);
                points.push([x, y, z]);
                weights.push(w_i * w_j * w_k * 0.125 * 0.125);
            }
        }
    }

    check_weights((weights, points))
}

/// A collapsed Gauss-Jacobi rule for the reference pyramid with `m` points per axis.
///
/// Both base axes collapse towards the apex, so the Jacobian is $(1 - z)^2$ up to scaling.
pub fn pyramid(m: usize) -> Result<Rule<3>, Error> {
    let (wx, px) = gauss_jacobi(0.0, m)?;
    let (wz, pz) = gauss_jacobi(2.0, m)?;

    let mut weights = Vec::with_capacity(m * m * m);
    let mut points = Vec::with_capacity(m * m * m);
    for (&w_i, &[x_i]) in wx.iter().zip(&px) {
        for (&w_j, &[y_j]) in wx.iter().zip(&px) {
            for (&w_k, &[z_k]) in wz.iter().zip(&pz) {
                let x = 0.25 * (1.0 + x_i) * (1.0 - z_k);
                let y = 0.25 * (1.0 + y_j) * (1.0 - z_k);
                let z = 0.5 * (1.0 + z_k);
                points.push([x, y, z]);
                weights.push(w_i * w_j * w_k * 0.03125);
            }
        }
    }

    check_weights((weights, points))
}
