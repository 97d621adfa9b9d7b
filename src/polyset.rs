//! Orthonormal polynomial expansion sets on reference cells.
//!
//! The expansion set of degree `n` on a cell is a basis of the polynomials of degree `n`
//! (total degree on simplices, degree per axis on quadrilaterals and hexahedra, and the product
//! space on prisms) that is orthonormal with respect to the $L^2$ inner product on the
//! reference cell. On pyramids the set spans the rational space that is the natural
//! counterpart of the other spaces, see [`tabulate`].
//!
//! Simplex sets are built from scaled Jacobi polynomials collapsed onto the cell (Dubiner
//! bases). They are hierarchical: the first `dim(cell, k)` functions span degree `k`. Simplex
//! basis functions and derivative multi-indices share the triangular ordering
//! `idx(p, q) = (p + q)(p + q + 1)/2 + q` and the tetrahedral ordering
//! `idx(p, q, r) = (p + q + r)(p + q + r + 1)(p + q + r + 2)/6 + (q + r)(q + r + 1)/2 + r`.
use crate::cell::CellType;
use crate::error::Error;
use nalgebra::DMatrix;
use num::integer::binomial;

/// Points closer to the pyramid apex than this are treated as the apex.
const PYRAMID_APEX_TOLERANCE: f64 = 1e-12;

/// The dimension of the expansion set of the given degree.
pub fn dim(cell: CellType, degree: usize) -> usize {
    let n = degree;
    match cell {
        CellType::Point => 1,
        CellType::Interval => n + 1,
        CellType::Triangle => (n + 1) * (n + 2) / 2,
        CellType::Quadrilateral => (n + 1) * (n + 1),
        CellType::Tetrahedron => (n + 1) * (n + 2) * (n + 3) / 6,
        CellType::Hexahedron => (n + 1) * (n + 1) * (n + 1),
        CellType::Prism => (n + 1) * (n + 1) * (n + 2) / 2,
        CellType::Pyramid => (n + 1) * (n + 2) * (2 * n + 3) / 6,
    }
}

/// The number of derivative multi-indices of total order up to `nderiv` in `tdim` variables.
pub fn num_derivatives(tdim: usize, nderiv: usize) -> usize {
    binomial(nderiv + tdim, tdim)
}

/// Index of the basis function or derivative with multi-index `(p)`, `(p, q)` or `(p, q, r)`.
pub fn derivative_index(alpha: &[usize]) -> usize {
    match *alpha {
        [] => 0,
        [p] => p,
        [p, q] => idx2(p, q),
        [p, q, r] => idx3(p, q, r),
        _ => panic!("multi-indices have at most three entries"),
    }
}

fn idx2(p: usize, q: usize) -> usize {
    (p + q) * (p + q + 1) / 2 + q
}

fn idx3(p: usize, q: usize, r: usize) -> usize {
    (p + q + r) * (p + q + r + 1) * (p + q + r + 2) / 6 + (q + r) * (q + r + 1) / 2 + r
}

/// All derivative multi-indices of total order up to `nderiv`, ordered by
/// [`derivative_index`]. Entries beyond `tdim` are zero.
pub fn derivative_multi_indices(tdim: usize, nderiv: usize) -> Vec<[usize; 3]> {
    let mut indices = Vec::with_capacity(num_derivatives(tdim, nderiv));
    match tdim {
        0 => indices.push([0, 0, 0]),
        1 => indices.extend((0..=nderiv).map(|k| [k, 0, 0])),
        2 => {
            for k in 0..=nderiv {
                indices.extend((0..=k).map(|q| [k - q, q, 0]));
            }
        }
        _ => {
            for k in 0..=nderiv {
                for qr in 0..=k {
                    indices.extend((0..=qr).map(|r| [k - qr, qr - r, r]));
                }
            }
        }
    }
    indices
}

/// Derivatives of the scaled Jacobi polynomials $s^k P_k^{(a, 0)}(2y/s - 1)$, $k = 0..n$, with
/// respect to both `y` and `s`, for all orders `i + j <= nderiv`.
///
/// The scaled polynomials are polynomials in `(y, s)` and obey the Jacobi three-term recurrence
/// with the linear factor `2 a_3 y + (a_2 - a_3) s` and the quadratic factor `s^2`; the
/// derivative tables follow by the Leibniz rule. With `s = 1` the table contains
/// $P_k^{(a, 0)}(2y - 1)$ and its derivatives in `y`.
struct ScaledJacobi {
    nderiv: usize,
    n: usize,
    values: Vec<f64>,
}

impl ScaledJacobi {
    fn evaluate(a: f64, n: usize, nderiv: usize, y: f64, s: f64) -> Self {
        let nd = nderiv;
        let mut table = Self {
            nderiv,
            n,
            values: vec![0.0; (nd + 1) * (nd + 1) * (n + 1)],
        };

        table.set(0, 0, 0, 1.0);
        if n == 0 {
            return table;
        }

        table.set(0, 0, 1, (a + 2.0) * y - s);
        if nd > 0 {
            table.set(1, 0, 1, a + 2.0);
            table.set(0, 1, 1, -1.0);
        }

        for k in 2..=n {
            let kf = k as f64;
            let a1 = 2.0 * kf * (kf + a) * (2.0 * kf + a - 2.0);
            let a2 = (2.0 * kf + a - 1.0) * a * a;
            let a3 = (2.0 * kf + a - 2.0) * (2.0 * kf + a - 1.0) * (2.0 * kf + a);
            let a4 = 2.0 * (kf + a - 1.0) * (kf - 1.0) * (2.0 * kf + a);
            let c_y = 2.0 * a3;
            let c_s = a2 - a3;
            let linear = c_y * y + c_s * s;

            for i in 0..=nd {
                for j in 0..=(nd - i) {
                    let (fi, fj) = (i as f64, j as f64);

                    let mut first = linear * table.get(i, j, k - 1);
                    if i > 0 {
                        first += fi * c_y * table.get(i - 1, j, k - 1);
                    }
                    if j > 0 {
                        first += fj * c_s * table.get(i, j - 1, k - 1);
                    }

                    let mut second = s * s * table.get(i, j, k - 2);
                    if j > 0 {
                        second += 2.0 * fj * s * table.get(i, j - 1, k - 2);
                    }
                    if j > 1 {
                        second += fj * (fj - 1.0) * table.get(i, j - 2, k - 2);
                    }

                    table.set(i, j, k, (first - a4 * second) / a1);
                }
            }
        }

        table
    }

    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        (i * (self.nderiv + 1) + j) * (self.n + 1) + k
    }

    /// The derivative of order `i` in `y` and `j` in `s` of the degree `k` polynomial.
    fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[self.offset(i, j, k)]
    }

    fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let offset = self.offset(i, j, k);
        self.values[offset] = value;
    }
}

fn sign(k: usize) -> f64 {
    if k % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

/// $s (s + 1) \cdots (s + k - 1)$
fn rising_factorial(s: usize, k: usize) -> f64 {
    (0..k).map(|i| (s + i) as f64).product()
}

/// Tabulates the expansion set of the given degree and its derivatives at a set of points.
///
/// `points` holds one point per row and must have as many columns as the topological dimension
/// of the cell. The result holds one `num_points x dim(cell, degree)` matrix per derivative
/// multi-index of total order up to `nderiv`, ordered by [`derivative_index`]; entry 0 holds
/// the values of the functions themselves.
///
/// On the pyramid, the functions are
/// $Q_p(x, t) Q_q(y, t) t^{-\min(p, q)} P_r^{(2m + 2, 0)}(2z - 1)$ with $t = 1 - z$,
/// $m = \max(p, q)$ and $r \le n - m$, where $Q_p(x, t) = t^p P_p(2x/t - 1)$. Functions with
/// $\min(p, q) > 0$ are rational; at the apex they take their limit value zero and their
/// derivatives are not defined (they are reported as zero).
pub fn tabulate(cell: CellType, degree: usize, nderiv: usize, points: &DMatrix<f64>) -> Result<Vec<DMatrix<f64>>, Error> {
    let tdim = cell.topological_dimension();
    if points.ncols() != tdim {
        return Err(Error::PointDimensionMismatch {
            expected: tdim,
            actual: points.ncols(),
        });
    }

    let derivatives = derivative_multi_indices(tdim, nderiv);
    let psize = dim(cell, degree);
    let num_points = points.nrows();
    let mut result = vec![DMatrix::zeros(num_points, psize); derivatives.len()];

    let mut values = vec![0.0; derivatives.len() * psize];
    let mut x = [0.0; 3];
    for point_index in 0..num_points {
        for (j, x_j) in x.iter_mut().enumerate().take(tdim) {
            *x_j = points[(point_index, j)];
        }
        values.iter_mut().for_each(|v| *v = 0.0);

        match cell {
            CellType::Point => values[0] = 1.0,
            CellType::Interval => tabulate_interval(degree, nderiv, &derivatives, x, &mut values),
            CellType::Triangle => tabulate_triangle(degree, nderiv, &derivatives, x, &mut values),
            CellType::Quadrilateral => tabulate_quadrilateral(degree, nderiv, &derivatives, x, &mut values),
            CellType::Tetrahedron => tabulate_tetrahedron(degree, nderiv, &derivatives, x, &mut values),
            CellType::Hexahedron => tabulate_hexahedron(degree, nderiv, &derivatives, x, &mut values),
            CellType::Prism => tabulate_prism(degree, nderiv, &derivatives, x, &mut values),
            CellType::Pyramid => tabulate_pyramid(degree, nderiv, &derivatives, x, &mut values),
        }

        for (d, matrix) in result.iter_mut().enumerate() {
            for basis_index in 0..psize {
                matrix[(point_index, basis_index)] = values[d * psize + basis_index];
            }
        }
    }

    Ok(result)
}

/// Orthonormal Legendre polynomials on [0, 1] and their derivatives.
fn legendre_table(n: usize, nderiv: usize, x: f64) -> ScaledJacobi {
    let mut table = ScaledJacobi::evaluate(0.0, n, nderiv, x, 1.0);
    for k in 0..=n {
        let norm = ((2 * k + 1) as f64).sqrt();
        for i in 0..=nderiv {
            let offset = table.offset(i, 0, k);
            table.values[offset] *= norm;
        }
    }
    table
}

fn tabulate_interval(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let psize = n + 1;
    let table = legendre_table(n, nderiv, x[0]);
    for (d, alpha) in derivatives.iter().enumerate() {
        for p in 0..=n {
            values[d * psize + p] = table.get(alpha[0], 0, p);
        }
    }
}

fn tabulate_quadrilateral(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let psize = (n + 1) * (n + 1);
    let tx = legendre_table(n, nderiv, x[0]);
    let ty = legendre_table(n, nderiv, x[1]);
    for (d, alpha) in derivatives.iter().enumerate() {
        for i in 0..=n {
            for j in 0..=n {
                values[d * psize + i * (n + 1) + j] = tx.get(alpha[0], 0, i) * ty.get(alpha[1], 0, j);
            }
        }
    }
}

fn tabulate_hexahedron(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let psize = (n + 1) * (n + 1) * (n + 1);
    let tx = legendre_table(n, nderiv, x[0]);
    let ty = legendre_table(n, nderiv, x[1]);
    let tz = legendre_table(n, nderiv, x[2]);
    for (d, alpha) in derivatives.iter().enumerate() {
        for i in 0..=n {
            for j in 0..=n {
                for k in 0..=n {
                    let index = (i * (n + 1) + j) * (n + 1) + k;
                    values[d * psize + index] =
                        tx.get(alpha[0], 0, i) * ty.get(alpha[1], 0, j) * tz.get(alpha[2], 0, k);
                }
            }
        }
    }
}

/// Derivatives of the triangle functions at `(x, y)`, stored by `idx2(p, q)` per derivative
/// `(alpha, beta)` in a `num_derivatives(2, nderiv) x dim(triangle, n)` layout.
fn triangle_table(n: usize, nderiv: usize, x: f64, y: f64) -> Vec<f64> {
    let psize = dim(CellType::Triangle, n);
    let derivatives = derivative_multi_indices(2, nderiv);
    let mut table = vec![0.0; derivatives.len() * psize];

    let a = ScaledJacobi::evaluate(0.0, n, nderiv, x, 1.0 - y);
    for p in 0..=n {
        let b = ScaledJacobi::evaluate((2 * p + 1) as f64, n - p, nderiv, y, 1.0);
        for q in 0..=(n - p) {
            let norm = (((2 * p + 1) * (2 * p + 2 * q + 2)) as f64).sqrt();
            for (d, &[alpha, beta, _]) in derivatives.iter().enumerate() {
                // d/dy acts on the second argument of Q_p(x, 1 - y) with a sign flip
                let value: f64 = (0..=beta)
                    .map(|k| binomial(beta, k) as f64 * sign(k) * a.get(alpha, k, p) * b.get(beta - k, 0, q))
                    .sum();
                table[d * psize + idx2(p, q)] = norm * value;
            }
        }
    }
    table
}

fn tabulate_triangle(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let table = triangle_table(n, nderiv, x[0], x[1]);
    debug_assert_eq!(table.len(), values.len());
    debug_assert_eq!(derivatives.len() * dim(CellType::Triangle, n), values.len());
    values.copy_from_slice(&table);
}

fn tabulate_tetrahedron(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let psize = dim(CellType::Tetrahedron, n);
    let [x, y, z] = x;

    let a = ScaledJacobi::evaluate(0.0, n, nderiv, x, 1.0 - y - z);
    for p in 0..=n {
        let b = ScaledJacobi::evaluate((2 * p + 1) as f64, n - p, nderiv, y, 1.0 - z);
        for q in 0..=(n - p) {
            let c = ScaledJacobi::evaluate((2 * p + 2 * q + 2) as f64, n - p - q, nderiv, z, 1.0);
            for r in 0..=(n - p - q) {
                let norm = (((2 * p + 1) * (2 * p + 2 * q + 2) * (2 * p + 2 * q + 2 * r + 3)) as f64).sqrt();
                for (d, &[alpha, beta, gamma]) in derivatives.iter().enumerate() {
                    // Q_p(x, 1 - y - z) depends on all three coordinates, S_q(y, 1 - z) on y and z
                    // and the Jacobi factor on z only
                    let mut value = 0.0;
                    for b1 in 0..=beta {
                        let b2 = beta - b1;
                        for g1 in 0..=gamma {
                            for g2 in 0..=(gamma - g1) {
                                let g3 = gamma - g1 - g2;
                                let coefficient = binomial(beta, b1) as f64 * factorial(gamma)
                                    / (factorial(g1) * factorial(g2) * factorial(g3));
                                value += coefficient
                                    * sign(b1 + g1 + g2)
                                    * a.get(alpha, b1 + g1, p)
                                    * b.get(b2, g2, q)
                                    * c.get(g3, 0, r);
                            }
                        }
                    }
                    values[d * psize + idx3(p, q, r)] = norm * value;
                }
            }
        }
    }
}

fn tabulate_prism(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let psize = dim(CellType::Prism, n);
    let tri_size = dim(CellType::Triangle, n);
    let triangle = triangle_table(n, nderiv, x[0], x[1]);
    let line = legendre_table(n, nderiv, x[2]);
    for (d, &[alpha, beta, gamma]) in derivatives.iter().enumerate() {
        let d_tri = idx2(alpha, beta);
        for t in 0..tri_size {
            for r in 0..=n {
                values[d * psize + t * (n + 1) + r] = triangle[d_tri * tri_size + t] * line.get(gamma, 0, r);
            }
        }
    }
}

/// The `(p, q, r)` triples of the pyramid set of degree `n`, in basis function order.
pub fn pyramid_indices(n: usize) -> Vec<(usize, usize, usize)> {
    let mut indices = Vec::with_capacity(dim(CellType::Pyramid, n));
    for p in 0..=n {
        for q in 0..=n {
            for r in 0..=(n - p.max(q)) {
                indices.push((p, q, r));
            }
        }
    }
    indices
}

fn tabulate_pyramid(n: usize, nderiv: usize, derivatives: &[[usize; 3]], x: [f64; 3], values: &mut [f64]) {
    let psize = dim(CellType::Pyramid, n);
    let [x, y, z] = x;
    let t = 1.0 - z;
    let at_apex = t.abs() < PYRAMID_APEX_TOLERANCE;

    let a = ScaledJacobi::evaluate(0.0, n, nderiv, x, t);
    let b = ScaledJacobi::evaluate(0.0, n, nderiv, y, t);
    let jacobi: Vec<ScaledJacobi> = (0..=n)
        .map(|m| ScaledJacobi::evaluate((2 * m + 2) as f64, n - m, nderiv, z, 1.0))
        .collect();

    for (index, (p, q, r)) in pyramid_indices(n).into_iter().enumerate() {
        let m = p.max(q);
        let s = p.min(q);
        if at_apex && s > 0 {
            continue;
        }
        let c = &jacobi[m];
        let norm = (((2 * p + 1) * (2 * q + 1) * (2 * r + 2 * m + 3)) as f64).sqrt();

        // z-derivatives of t^{-s}
        let t_power = |k: usize| -> f64 {
            if s == 0 {
                if k == 0 {
                    1.0
                } else {
                    0.0
                }
            } else {
                rising_factorial(s, k) * t.powi(-((s + k) as i32))
            }
        };

        for (d, &[alpha, beta, gamma]) in derivatives.iter().enumerate() {
            let mut value = 0.0;
            for g1 in 0..=gamma {
                for g2 in 0..=(gamma - g1) {
                    for g3 in 0..=(gamma - g1 - g2) {
                        let g4 = gamma - g1 - g2 - g3;
                        let coefficient =
                            factorial(gamma) / (factorial(g1) * factorial(g2) * factorial(g3) * factorial(g4));
                        value += coefficient
                            * sign(g1 + g2)
                            * a.get(alpha, g1, p)
                            * b.get(beta, g2, q)
                            * t_power(g3)
                            * c.get(g4, 0, r);
                    }
                }
            }
            values[d * psize + index] = norm * value;
        }
    }
}
