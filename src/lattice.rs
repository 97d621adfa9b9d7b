//! Equispaced point lattices on reference cells.
use crate::cell::CellType;
use crate::error::Error;
use itertools::iproduct;
use nalgebra::DMatrix;

/// Creates an equispaced lattice with spacing `1 / n` on the reference cell.
///
/// Points are ordered with the x coordinate varying fastest, then y, then z. If `exterior` is
/// `false`, points on the boundary of the cell are left out. For `n == 0` the lattice consists
/// of the vertex average of the cell only.
pub fn create_lattice(cell: CellType, n: usize, exterior: bool) -> Result<DMatrix<f64>, Error> {
    let tdim = cell.topological_dimension();
    if cell == CellType::Point {
        return Ok(DMatrix::zeros(1, 0));
    }
    if n == 0 {
        let midpoint = cell.vertex_average();
        return Ok(DMatrix::from_row_slice(1, tdim, &midpoint));
    }

    let b: isize = if exterior { 0 } else { 1 };
    let n_i = n as isize;
    let denominator = n as f64;
    let mut coords: Vec<f64> = Vec::new();
    let mut push = |point: &[isize]| coords.extend(point.iter().map(|&i| i as f64 / denominator));

    match cell {
        CellType::Interval => {
            for x in b..=n_i - b {
                push(&[x]);
            }
        }
        CellType::Triangle => {
            for y in b..=n_i - b {
                for x in b..=n_i - b - y {
                    push(&[x, y]);
                }
            }
        }
        CellType::Quadrilateral => {
            for (y, x) in iproduct!(b..=n_i - b, b..=n_i - b) {
                push(&[x, y]);
            }
        }
        CellType::Tetrahedron => {
            for z in b..=n_i - b {
                for y in b..=n_i - b - z {
                    for x in b..=n_i - b - z - y {
                        push(&[x, y, z]);
                    }
                }
            }
        }
        CellType::Hexahedron => {
            for (z, y, x) in iproduct!(b..=n_i - b, b..=n_i - b, b..=n_i - b) {
                push(&[x, y, z]);
            }
        }
        CellType::Prism => {
            for z in b..=n_i - b {
                for y in b..=n_i - b {
                    for x in b..=n_i - b - y {
                        push(&[x, y, z]);
                    }
                }
            }
        }
        CellType::Pyramid => {
            for z in b..=n_i - b {
                for y in b..=n_i - b - z {
                    for x in b..=n_i - b - z {
                        push(&[x, y, z]);
                    }
                }
            }
        }
        CellType::Point => unreachable!("handled above"),
    }

    let num_points = coords.len() / tdim;
    Ok(DMatrix::from_row_slice(num_points, tdim, &coords))
}

/// The number of points in a lattice, without creating it.
pub fn lattice_size(cell: CellType, n: usize, exterior: bool) -> usize {
    if cell == CellType::Point || n == 0 {
        return 1;
    }
    let m = |k: usize| -> usize {
        let interior = if exterior { 0 } else { k };
        (n + 1).saturating_sub(interior)
    };
    match cell {
        CellType::Interval => m(2),
        CellType::Triangle => {
            let k = m(3);
            k * (k + 1) / 2
        }
        CellType::Quadrilateral => m(2) * m(2),
        CellType::Tetrahedron => {
            let k = m(4);
            k * (k + 1) * (k + 2) / 6
        }
        CellType::Hexahedron => m(2) * m(2) * m(2),
        CellType::Prism => {
            let k = m(3);
            m(2) * k * (k + 1) / 2
        }
        CellType::Pyramid => {
            if exterior {
                (n + 1) * (n + 2) * (2 * n + 3) / 6
            } else {
                // Layers z = k / n for k = 1..n - 2 hold (n - k - 1)^2 points each
                (1..n.saturating_sub(1)).map(|k| (n - k - 1) * (n - k - 1)).sum()
            }
        }
        CellType::Point => 1,
    }
}
