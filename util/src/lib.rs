use nalgebra::storage::RawStorage;
use nalgebra::{DMatrix, Dim, Matrix};

/// Poor man's approx assertion for matrices.
///
/// Each argument is evaluated once, so owned temporaries may be passed by reference.
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let (x, y) = (&$x, &$y);
        let tol: f64 = $tol;
        let max_absdiff = $crate::max_abs_diff(x, y);
        let approx_eq = max_absdiff <= tol;

        if !approx_eq {
            println!("abstol: {:e}", tol);
            println!("left: {}", x);
            println!("right: {}", y);
            println!("max absdiff: {:e}", max_absdiff);
        }
        assert!(approx_eq);
    }};
}

/// The largest entry of `|x - y|`. Panics if the shapes differ.
///
/// Static and dynamic dimensions may be mixed.
pub fn max_abs_diff<R1, C1, R2, C2, S1, S2>(x: &Matrix<f64, R1, C1, S1>, y: &Matrix<f64, R2, C2, S2>) -> f64
where
    R1: Dim,
    C1: Dim,
    R2: Dim,
    C2: Dim,
    S1: RawStorage<f64, R1, C1>,
    S2: RawStorage<f64, R2, C2>,
{
    assert_eq!(x.shape(), y.shape(), "Matrix dimensions must agree");
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Central difference approximation of the derivative of `f` at `x` along coordinate `axis`.
///
/// `f` maps a `1 x dim` matrix of points to any matrix of values.
pub fn central_difference<F>(f: F, x: &DMatrix<f64>, axis: usize, h: f64) -> DMatrix<f64>
where
    F: Fn(&DMatrix<f64>) -> DMatrix<f64>,
{
    let mut forward = x.clone();
    let mut backward = x.clone();
    forward[(0, axis)] += h;
    backward[(0, axis)] -= h;
    (f(&forward) - f(&backward)) / (2.0 * h)
}
