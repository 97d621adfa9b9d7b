//! Integral moments against a moment space, and the dof transformations they induce.
//!
//! A moment space is a finite element on the reference cell of a sub-entity type. For every
//! sub-entity of that type in a parent cell, a quadrature rule on the moment space's cell is
//! placed on the sub-entity and the moment space basis is evaluated at the quadrature points.
//! Each constructor returns the quadrature points in parent coordinates (entity by entity) and
//! an interpolation matrix with one row per functional and `value_size * num_points` columns,
//! component-major: the weight of component `k` at point `p` is in column `k * num_points + p`.
//!
//! Tangents and normals are not normalized. Their length is the Jacobian of the entity
//! parametrization, so the functionals are integrals over the sub-entities in parent
//! coordinates.
use crate::cell::{map_to_entity, CellType};
use crate::element::FiniteElement;
use crate::error::Error;
use crate::mapping::pull_back;
use crate::quadrature::make_quadrature;
use nalgebra::{DMatrix, Vector3};

/// Points and interpolation matrix of a set of functionals.
pub type MomentData = (DMatrix<f64>, DMatrix<f64>);

/// A non-trivial symmetry of a reference cell, as an affine map of the cell onto itself.
#[derive(Clone)]
pub struct EntitySymmetry {
    map: fn(&[f64]) -> Vec<f64>,
    /// Jacobian of the map.
    pub jacobian: DMatrix<f64>,
    /// Inverse of the Jacobian.
    pub inverse: DMatrix<f64>,
}

impl EntitySymmetry {
    /// Applies the map to every row of `points`.
    pub fn map_points(&self, points: &DMatrix<f64>) -> DMatrix<f64> {
        let mut mapped = DMatrix::zeros(points.nrows(), points.ncols());
        for i in 0..points.nrows() {
            let x: Vec<f64> = points.row(i).iter().copied().collect();
            for (j, y_j) in (self.map)(&x).into_iter().enumerate() {
                mapped[(i, j)] = y_j;
            }
        }
        mapped
    }
}

/// The generating symmetries of a sub-entity type, in the order used for base
/// transformations: the reflection of an interval, and the rotation and then the reflection
/// of a triangle or quadrilateral.
///
/// Points have no symmetries. Sub-entities of dimension three are never reoriented.
pub fn entity_symmetries(cell: CellType) -> Result<Vec<EntitySymmetry>, Error> {
    let symmetry = |map: fn(&[f64]) -> Vec<f64>, jacobian: &[f64], inverse: &[f64]| {
        let n = cell.topological_dimension();
        EntitySymmetry {
            map,
            jacobian: DMatrix::from_row_slice(n, n, jacobian),
            inverse: DMatrix::from_row_slice(n, n, inverse),
        }
    };
    match cell {
        CellType::Point => Ok(Vec::new()),
        CellType::Interval => Ok(vec![symmetry(|x| vec![1.0 - x[0]], &[-1.0], &[-1.0])]),
        CellType::Triangle => Ok(vec![
            symmetry(
                |x| vec![x[1], 1.0 - x[0] - x[1]],
                &[0.0, 1.0, -1.0, -1.0],
                &[-1.0, -1.0, 1.0, 0.0],
            ),
            symmetry(|x| vec![x[1], x[0]], &[0.0, 1.0, 1.0, 0.0], &[0.0, 1.0, 1.0, 0.0]),
        ]),
        CellType::Quadrilateral => Ok(vec![
            symmetry(
                |x| vec![x[1], 1.0 - x[0]],
                &[0.0, 1.0, -1.0, 0.0],
                &[0.0, -1.0, 1.0, 0.0],
            ),
            symmetry(|x| vec![x[1], x[0]], &[0.0, 1.0, 1.0, 0.0], &[0.0, 1.0, 1.0, 0.0]),
        ]),
        _ => Err(Error::UnsupportedCell {
            cell,
            context: "dof transformations",
        }),
    }
}

/// Vertex 0 of a sub-entity and the offsets spanning it, one row per local axis.
fn entity_axes(cell: CellType, entity_type: CellType, dim: usize, index: usize) -> Result<(DMatrix<f64>, DMatrix<f64>), Error> {
    let geometry = cell.sub_entity_geometry(dim, index)?;
    let axis_vertices = entity_type.axis_vertices()?;
    let tdim = cell.topological_dimension();
    let axes = DMatrix::from_fn(axis_vertices.len(), tdim, |d, j| {
        geometry[(axis_vertices[d], j)] - geometry[(0, j)]
    });
    Ok((geometry, axes))
}

struct EntityQuadrature {
    entity_type: CellType,
    entity_dim: usize,
    num_entities: usize,
    weights: Vec<f64>,
    points: DMatrix<f64>,
    /// Moment space values at the quadrature points, `num_points x (dim * value_size)`.
    phi: DMatrix<f64>,
}

fn entity_quadrature(moment_space: &FiniteElement, cell: CellType, q_deg: usize) -> Result<EntityQuadrature, Error> {
    let entity_type = moment_space.cell_type();
    let entity_dim = entity_type.topological_dimension();
    if entity_dim == 0 {
        return Err(Error::UnsupportedCell {
            cell: entity_type,
            context: "integral moments",
        });
    }
    let (weights, points) = make_quadrature(entity_type, q_deg)?;
    let mut tables = moment_space.tabulate(0, &points)?;
    let phi = tables.swap_remove(0);
    Ok(EntityQuadrature {
        entity_type,
        entity_dim,
        num_entities: cell.sub_entity_count(entity_dim),
        weights,
        points,
        phi,
    })
}

/// Moments against every basis function of a scalar moment space.
///
/// For `value_size == 1` there is one functional per sub-entity and basis function. For vector
/// valued targets, each basis function is paired with every local axis of the sub-entity
/// (the offsets from vertex 0 to the neighbouring vertices), giving `entity_dim` functionals
/// per sub-entity and basis function.
pub fn make_integral_moments(
    moment_space: &FiniteElement,
    cell: CellType,
    value_size: usize,
    q_deg: usize,
) -> Result<MomentData, Error> {
    let q = entity_quadrature(moment_space, cell, q_deg)?;
    let tdim = cell.topological_dimension();
    let nq = q.weights.len();
    let num_functions = q.phi.ncols();
    let rows_per_function = if value_size == 1 { 1 } else { q.entity_dim };

    let mut points = DMatrix::zeros(q.num_entities * nq, tdim);
    let mut matrix = DMatrix::zeros(
        num_functions * q.num_entities * rows_per_function,
        q.num_entities * nq * value_size,
    );

    let mut row = 0;
    for e in 0..q.num_entities {
        let (geometry, axes) = entity_axes(cell, q.entity_type, q.entity_dim, e)?;
        let mapped = map_to_entity(q.entity_type, &geometry, &q.points)?;
        points.rows_mut(e * nq, nq).copy_from(&mapped);

        for j in 0..num_functions {
            if value_size == 1 {
                for p in 0..nq {
                    matrix[(row, e * nq + p)] = q.phi[(p, j)] * q.weights[p];
                }
                row += 1;
            } else {
                for d in 0..q.entity_dim {
                    for k in 0..value_size {
                        let offset = (k * q.num_entities + e) * nq;
                        for p in 0..nq {
                            matrix[(row, offset + p)] = q.phi[(p, j)] * q.weights[p] * axes[(d, k)];
                        }
                    }
                    row += 1;
                }
            }
        }
    }

    Ok((points, matrix))
}

/// Moments against a vector valued moment space, contracting the moment space value (pushed
/// onto the sub-entity along its local axes) with the test function.
pub fn make_dot_integral_moments(
    moment_space: &FiniteElement,
    cell: CellType,
    value_size: usize,
    q_deg: usize,
) -> Result<MomentData, Error> {
    let tdim = cell.topological_dimension();
    if value_size != tdim {
        return Err(Error::ValueSizeMismatch {
            expected: tdim,
            actual: value_size,
        });
    }
    let q = entity_quadrature(moment_space, cell, q_deg)?;
    let nq = q.weights.len();
    let moment_space_size = q.phi.ncols() / q.entity_dim;

    let mut points = DMatrix::zeros(q.num_entities * nq, tdim);
    let mut matrix = DMatrix::zeros(moment_space_size * q.num_entities, q.num_entities * nq * value_size);

    let mut row = 0;
    for e in 0..q.num_entities {
        let (geometry, axes) = entity_axes(cell, q.entity_type, q.entity_dim, e)?;
        let mapped = map_to_entity(q.entity_type, &geometry, &q.points)?;
        points.rows_mut(e * nq, nq).copy_from(&mapped);

        for j in 0..moment_space_size {
            for k in 0..value_size {
                let offset = (k * q.num_entities + e) * nq;
                for p in 0..nq {
                    let value: f64 = (0..q.entity_dim)
                        .map(|d| q.phi[(p, d * moment_space_size + j)] * axes[(d, k)])
                        .sum();
                    matrix[(row, offset + p)] = value * q.weights[p];
                }
            }
            row += 1;
        }
    }

    Ok((points, matrix))
}

/// Shared body of tangent and normal moments: one functional per sub-entity and moment
/// space basis function, contracting the test function with `direction(e)`.
fn make_directional_moments(
    q: &EntityQuadrature,
    cell: CellType,
    value_size: usize,
    direction: impl Fn(&DMatrix<f64>) -> Vec<f64>,
) -> Result<MomentData, Error> {
    let tdim = cell.topological_dimension();
    let nq = q.weights.len();
    let total_points = q.num_entities * nq;
    let num_functions = q.phi.ncols();

    let mut points = DMatrix::zeros(total_points, tdim);
    let mut matrix = DMatrix::zeros(q.num_entities * num_functions, total_points * value_size);

    let mut row = 0;
    for e in 0..q.num_entities {
        let (geometry, axes) = entity_axes(cell, q.entity_type, q.entity_dim, e)?;
        let mapped = map_to_entity(q.entity_type, &geometry, &q.points)?;
        points.rows_mut(e * nq, nq).copy_from(&mapped);
        let direction = direction(&axes);

        for j in 0..num_functions {
            for (k, direction_k) in direction.iter().enumerate() {
                for p in 0..nq {
                    matrix[(row, k * total_points + e * nq + p)] = q.phi[(p, j)] * q.weights[p] * direction_k;
                }
            }
            row += 1;
        }
    }

    Ok((points, matrix))
}

/// Moments of the tangential component along every edge of the cell.
///
/// The tangent of an edge is the (unnormalized) vector from its first to its second vertex.
pub fn make_tangent_integral_moments(
    moment_space: &FiniteElement,
    cell: CellType,
    value_size: usize,
    q_deg: usize,
) -> Result<MomentData, Error> {
    let tdim = cell.topological_dimension();
    if value_size != tdim {
        return Err(Error::ValueSizeMismatch {
            expected: tdim,
            actual: value_size,
        });
    }
    if moment_space.cell_type() != CellType::Interval {
        return Err(Error::UnsupportedCell {
            cell: moment_space.cell_type(),
            context: "tangent moments (only defined on edges)",
        });
    }
    let q = entity_quadrature(moment_space, cell, q_deg)?;
    make_directional_moments(&q, cell, value_size, |axes| axes.row(0).iter().copied().collect())
}

/// Moments of the normal component on every facet of the cell.
///
/// In 2D the normal is the edge tangent rotated by 90 degrees, `(-t_y, t_x)`. In 3D it is the
/// cross product of the offsets from vertex 0 to vertices 1 and 2 of the facet. Neither is
/// normalized.
pub fn make_normal_integral_moments(
    moment_space: &FiniteElement,
    cell: CellType,
    value_size: usize,
    q_deg: usize,
) -> Result<MomentData, Error> {
    let tdim = cell.topological_dimension();
    if value_size != tdim {
        return Err(Error::ValueSizeMismatch {
            expected: tdim,
            actual: value_size,
        });
    }
    let entity_dim = moment_space.cell_type().topological_dimension();
    if entity_dim + 1 != tdim {
        return Err(Error::UnsupportedCell {
            cell: moment_space.cell_type(),
            context: "normal moments (only defined on facets)",
        });
    }
    let q = entity_quadrature(moment_space, cell, q_deg)?;
    match tdim {
        2 => make_directional_moments(&q, cell, value_size, |axes| vec![-axes[(0, 1)], axes[(0, 0)]]),
        3 => make_directional_moments(&q, cell, value_size, |axes| {
            let t0 = Vector3::new(axes[(0, 0)], axes[(0, 1)], axes[(0, 2)]);
            let t1 = Vector3::new(axes[(1, 0)], axes[(1, 1)], axes[(1, 2)]);
            t0.cross(&t1).iter().copied().collect()
        }),
        _ => Err(Error::UnsupportedCell {
            cell,
            context: "normal moments",
        }),
    }
}

/// For every generating symmetry of the moment space's cell, the matrix expressing the
/// moment functionals on the reoriented entity in terms of the original ones.
///
/// The moment space is tabulated at the mapped interpolation points, pulled back through the
/// symmetry (with unit determinant) and the moment space interpolation matrix is applied.
pub fn create_dot_moment_dof_transformations(moment_space: &FiniteElement) -> Result<Vec<DMatrix<f64>>, Error> {
    let symmetries = entity_symmetries(moment_space.cell_type())?;
    let points = moment_space.points();
    let interpolation = moment_space.interpolation_matrix();
    let ndofs = moment_space.dim();
    let value_size = moment_space.value_size();
    let num_points = points.nrows();

    let mut transformations = Vec::with_capacity(symmetries.len());
    for symmetry in &symmetries {
        let mapped_points = symmetry.map_points(points);
        let values = moment_space.tabulate(0, &mapped_points)?.swap_remove(0);

        // pulled[(k * num_points + p, j)] is component k of basis function j at point p
        let mut pulled = DMatrix::zeros(value_size * num_points, ndofs);
        for p in 0..num_points {
            for j in 0..ndofs {
                let value: Vec<f64> = (0..value_size).map(|k| values[(p, k * ndofs + j)]).collect();
                let reference = pull_back(
                    moment_space.mapping_type(),
                    &value,
                    &symmetry.jacobian,
                    1.0,
                    &symmetry.inverse,
                )?;
                for (k, v) in reference.into_iter().enumerate() {
                    pulled[(k * num_points + p, j)] = v;
                }
            }
        }

        transformations.push(interpolation * pulled);
    }
    Ok(transformations)
}

/// Transformations for vector moments built with [`make_integral_moments`] on faces: every
/// scalar entry is expanded into a 2x2 block acting on the pair of functionals along the two
/// face axes.
pub fn create_moment_dof_transformations(moment_space: &FiniteElement) -> Result<Vec<DMatrix<f64>>, Error> {
    let t = create_dot_moment_dof_transformations(moment_space)?;
    let (rotation, reflection) = match moment_space.cell_type() {
        CellType::Interval => return Ok(t),
        CellType::Triangle => (
            DMatrix::from_row_slice(2, 2, &[-1.0, -1.0, 1.0, 0.0]),
            DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]),
        ),
        CellType::Quadrilateral => (
            DMatrix::from_row_slice(2, 2, &[0.0, -1.0, 1.0, 0.0]),
            DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]),
        ),
        cell => {
            return Err(Error::UnsupportedCell {
                cell,
                context: "moment dof transformations",
            })
        }
    };

    Ok(t
        .iter()
        .zip([rotation, reflection])
        .map(|(scalar, block)| scalar.kronecker(&block))
        .collect())
}

/// Transformations for normal moments: reflecting an edge or a face flips the normal.
pub fn create_normal_moment_dof_transformations(moment_space: &FiniteElement) -> Result<Vec<DMatrix<f64>>, Error> {
    let mut t = create_dot_moment_dof_transformations(moment_space)?;
    let tdim = moment_space.cell_type().topological_dimension();
    if tdim == 1 || tdim == 2 {
        t[tdim - 1] *= -1.0;
    }
    Ok(t)
}

/// Transformations for tangent moments: reversing an edge flips its tangent.
pub fn create_tangent_moment_dof_transformations(moment_space: &FiniteElement) -> Result<Vec<DMatrix<f64>>, Error> {
    if moment_space.cell_type() != CellType::Interval {
        return Err(Error::UnsupportedCell {
            cell: moment_space.cell_type(),
            context: "tangent moment dof transformations (only defined on edges)",
        });
    }
    let mut t = create_dot_moment_dof_transformations(moment_space)?;
    t[0] *= -1.0;
    Ok(t)
}
