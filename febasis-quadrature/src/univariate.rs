//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::{check_weights, Error, Rule};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Recurrence relation for Legendre polynomials.
///
/// Note: we use a formula for which derivatives are *not* defined at |x| == 1, so it is only
/// suitable for evaluation in the open interval (-1, 1).
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // The current value, i.e. p_n(x)
    p1: f64,
    // The previous value in the recurrence, i.e. p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    pub fn evaluate(n: usize, x: f64) -> Self {
        // Use recurrence relation
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        let mut p3;
        for m in 1..=n {
            let m = m as f64;
            p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = &self;
        let n = *n as f64;
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }

    fn second_derivative(&self) -> f64 {
        let Self { n, x, p1, .. } = &self;
        let n = *n as f64;
        // From the Legendre equation (1 - x^2) p'' - 2 x p' + n (n + 1) p = 0
        (2.0 * x * self.derivative() - n * (n + 1.0) * p1) / (1.0 - x * x)
    }
}

/// Evaluates the Jacobi polynomial $P_n^{(a, 0)}$ and its first derivative at `x`.
///
/// Uses the three-term recurrence in the degree together with its differentiated form,
/// so it is well defined on the closed interval.
pub fn jacobi_value_and_derivative(a: f64, n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let mut p0 = 1.0;
    let mut dp0 = 0.0;
    let mut p1 = ((a + 2.0) * x + a) / 2.0;
    let mut dp1 = (a + 2.0) / 2.0;
    for k in 2..=n {
        let k = k as f64;
        let a1 = 2.0 * k * (k + a) * (2.0 * k + a - 2.0);
        let a2 = (2.0 * k + a - 1.0) * a * a;
        let a3 = (2.0 * k + a - 2.0) * (2.0 * k + a - 1.0) * (2.0 * k + a);
        let a4 = 2.0 * (k + a - 1.0) * (k - 1.0) * (2.0 * k + a);
        let p2 = ((a2 + a3 * x) * p1 - a4 * p0) / a1;
        let dp2 = ((a2 + a3 * x) * dp1 + a3 * p1 - a4 * dp0) / a1;
        p0 = p1;
        dp0 = dp1;
        p1 = p2;
        dp1 = dp2;
    }
    (p1, dp1)
}

/// Gauss-Jacobi quadrature for the weight $(1 - x)^a$ on the interval [-1, 1].
///
/// The `m` points are the roots of the Jacobi polynomial $P_m^{(a, 0)}$, found by Newton's
/// method with deflation against the roots already found. Given `m` points, the rule
/// integrates $(1 - x)^a p(x)$ exactly for polynomials $p$ of degree up to `2 m - 1`.
/// Points are returned in ascending order.
pub fn gauss_jacobi(a: f64, num_points: usize) -> Result<Rule<1>, Error> {
    let m = num_points;
    if m == 0 {
        return Err(Error::NoRuleAvailable);
    }

    let mut roots: Vec<f64> = Vec::with_capacity(m);
    for k in 0..m {
        // Chebyshev points are a good starting guess, and averaging with the previous root
        // keeps the iteration from jumping over a root it has not found yet
        let mut x = -(PI * (2 * k + 1) as f64 / (2 * m) as f64).cos();
        if let Some(previous) = roots.last() {
            x = 0.5 * (x + previous);
        }

        let mut converged = false;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let s: f64 = roots.iter().map(|r| 1.0 / (x - r)).sum();
            let (f, df) = jacobi_value_and_derivative(a, m, x);
            let delta = f / (df - f * s);
            x -= delta;
            if delta.abs() <= 1e-14 {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(Error::NotConverged { num_points: m });
        }
        roots.push(x);
    }

    let scale = 2.0f64.powf(a + 1.0);
    let weights = roots
        .iter()
        .map(|&x| {
            let (_, df) = jacobi_value_and_derivative(a, m, x);
            scale / ((1.0 - x * x) * df * df)
        })
        .collect();
    let points = roots.into_iter().map(|x| [x]).collect();

    check_weights((weights, points))
}

/// Gauss-Lobatto-Legendre quadrature for the reference interval [-1, 1].
///
/// The rule contains both end points. Given `n >= 2` points, the rule integrates
/// polynomials of order up to `2 n - 3` exactly. Returns `None` for fewer than two points.
pub fn try_gauss_lobatto(num_points: usize) -> Option<Rule<1>> {
    let n = num_points;
    if n < 2 {
        return None;
    }

    // The interior points are the roots of P'_{n - 1}
    let degree = n - 1;
    let nf = n as f64;
    let weight_of = |x: f64| {
        let p = LegendreRecurrence::evaluate(degree, x).value();
        2.0 / (nf * (nf - 1.0) * p * p)
    };

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    points.push([-1.0]);
    weights.push(2.0 / (nf * (nf - 1.0)));

    for i in 1..degree {
        // Chebyshev-Gauss-Lobatto points interlace the roots closely enough for plain Newton
        let mut x = -(PI * i as f64 / degree as f64).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let recurrence = LegendreRecurrence::evaluate(degree, x);
            let dx = -recurrence.derivative() / recurrence.second_derivative();
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        points.push([x]);
        weights.push(weight_of(x));
    }

    points.push([1.0]);
    weights.push(2.0 / (nf * (nf - 1.0)));

    Some((weights, points))
}

/// Gauss-Lobatto-Legendre quadrature, failing for fewer than two points.
pub fn gauss_lobatto(num_points: usize) -> Result<Rule<1>, Error> {
    let rule = try_gauss_lobatto(num_points).ok_or(Error::NoRuleAvailable)?;
    check_weights(rule)
}
