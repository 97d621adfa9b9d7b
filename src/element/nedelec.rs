use super::{
    combine_interpolation_data, create_dlagrange, identity_transformations, lower_dim, ElementDefinition, ElementFamily,
    FiniteElement,
};
use crate::cell::CellType;
use crate::error::Error;
use crate::mapping::MappingType;
use crate::moments::{
    create_moment_dof_transformations, create_tangent_moment_dof_transformations, make_integral_moments,
    make_tangent_integral_moments,
};
use crate::polyset;
use crate::quadrature::make_quadrature;
use nalgebra::DMatrix;

/// Weighted inner products `int w x_axis phi_f phi_l` for every expansion function `l`, with
/// `phi_f` the hierarchical function of index `f`.
struct ProjectionData {
    weights: Vec<f64>,
    points: DMatrix<f64>,
    phi: DMatrix<f64>,
}

impl ProjectionData {
    fn new(cell: CellType, degree: usize) -> Result<Self, Error> {
        let (weights, points) = make_quadrature(cell, 2 * degree)?;
        let phi = polyset::tabulate(cell, degree, 0, &points)?.swap_remove(0);
        Ok(Self { weights, points, phi })
    }

    fn psize(&self) -> usize {
        self.phi.ncols()
    }

    fn moment(&self, f: usize, axis: usize, l: usize) -> f64 {
        (0..self.weights.len())
            .map(|p| self.weights[p] * self.phi[(p, f)] * self.points[(p, axis)] * self.phi[(p, l)])
            .sum()
    }
}

/// The span of the triangle Nedelec space of degree `d + 1`: vector polynomials of degree `d`
/// and `(y p, -x p)` for homogeneous `p` of degree `d`.
fn create_nedelec_2d_space(d: usize) -> Result<DMatrix<f64>, Error> {
    let cell = CellType::Triangle;
    let nv = polyset::dim(cell, d);
    let ns = d + 1;
    let ns0 = lower_dim(cell, d, 1);

    let q = ProjectionData::new(cell, d + 1)?;
    let psize = q.psize();
    let mut span = DMatrix::zeros(nv * 2 + ns, psize * 2);
    span.view_mut((0, 0), (nv, nv)).fill_with_identity();
    span.view_mut((nv, psize), (nv, nv)).fill_with_identity();

    for i in 0..ns {
        for l in 0..psize {
            span[(2 * nv + i, l)] = q.moment(ns0 + i, 1, l);
            span[(2 * nv + i, l + psize)] = -q.moment(ns0 + i, 0, l);
        }
    }
    Ok(span)
}

/// The span of the tetrahedron Nedelec space of degree `d + 1`: vector polynomials of degree
/// `d` and the cross product of `x` with homogeneous vector polynomials of degree `d`.
fn create_nedelec_3d_space(d: usize) -> Result<DMatrix<f64>, Error> {
    let cell = CellType::Tetrahedron;
    let tdim = 3;
    let nv = polyset::dim(cell, d);
    let ns = (d + 1) * (d + 2) / 2;
    let ns_remove = d * (d + 1) / 2;
    let ns0 = lower_dim(cell, d, 1);
    let ndofs = tdim * nv + 3 * ns - ns_remove;

    let q = ProjectionData::new(cell, d + 1)?;
    let psize = q.psize();
    let mut span = DMatrix::zeros(ndofs, psize * tdim);
    for i in 0..tdim {
        span.view_mut((nv * i, psize * i), (nv, nv)).fill_with_identity();
    }

    // (0, -z p, y p) for the functions not involving x, (z p, 0, -x p) and (-y p, x p, 0)
    let first = tdim * nv;
    for i in 0..ns {
        for l in 0..psize {
            let w = q.moment(ns0 + i, 2, l);
            if i >= ns_remove {
                span[(first + i - ns_remove, psize + l)] = -w;
            }
            span[(first + i + ns - ns_remove, l)] = w;
        }
    }
    for i in 0..ns {
        for l in 0..psize {
            let w = q.moment(ns0 + i, 1, l);
            span[(first + i + 2 * ns - ns_remove, l)] = -w;
            if i >= ns_remove {
                span[(first + i - ns_remove, 2 * psize + l)] = w;
            }
        }
    }
    for i in 0..ns {
        for l in 0..psize {
            let w = q.moment(ns0 + i, 0, l);
            span[(first + i + ns - ns_remove, 2 * psize + l)] = -w;
            span[(first + i + 2 * ns - ns_remove, psize + l)] = w;
        }
    }
    Ok(span)
}

/// Creates a Nedelec (first kind, H(curl)) element of degree `degree >= 1` on a triangle or
/// tetrahedron.
///
/// With `d = degree - 1`, the dofs are tangential moments against discontinuous Lagrange
/// functions of degree `d` on the edges, vector moments against degree `d - 1` functions on the
/// faces of a tetrahedron (for `d > 0`) and vector moments against degree `d - 1` (triangle) or
/// `d - 2` (tetrahedron) functions in the interior.
pub fn create_nedelec(cell: CellType, degree: usize) -> Result<FiniteElement, Error> {
    if !matches!(cell, CellType::Triangle | CellType::Tetrahedron) {
        return Err(Error::UnsupportedCell {
            cell,
            context: "Nedelec elements",
        });
    }
    if degree == 0 {
        return Err(Error::InvalidDegree {
            degree,
            context: "Nedelec elements (degrees start at 1)",
        });
    }
    let d = degree - 1;
    let tdim = cell.topological_dimension();
    let span = match tdim {
        2 => create_nedelec_2d_space(d)?,
        _ => create_nedelec_3d_space(d)?,
    };
    let ndofs = span.nrows();

    let quadrature_degree = 5 * (d + 1);
    let edge_space = create_dlagrange(CellType::Interval, d)?;
    let edge_dofs = edge_space.dim();
    let edge_transformations = create_tangent_moment_dof_transformations(&edge_space)?;
    let mut blocks = vec![make_tangent_integral_moments(&edge_space, cell, tdim, quadrature_degree)?];

    let mut entity_dofs: Vec<Vec<usize>> = cell
        .topology()
        .iter()
        .map(|entities| vec![0; entities.len()])
        .collect();
    entity_dofs[1].iter_mut().for_each(|n| *n = edge_dofs);

    let mut base_transformations = identity_transformations(cell, ndofs);
    let num_edges = cell.sub_entity_count(1);
    for edge in 0..num_edges {
        let start = edge_dofs * edge;
        base_transformations[edge]
            .view_mut((start, start), (edge_dofs, edge_dofs))
            .copy_from(&edge_transformations[0]);
    }

    if tdim == 2 {
        if d > 0 {
            let interior_space = create_dlagrange(CellType::Triangle, d - 1)?;
            blocks.push(make_integral_moments(&interior_space, cell, tdim, quadrature_degree)?);
            entity_dofs[2][0] = 2 * interior_space.dim();
        }
    } else {
        if d > 0 {
            let face_space = create_dlagrange(CellType::Triangle, d - 1)?;
            let face_dofs = 2 * face_space.dim();
            let face_transformations = create_moment_dof_transformations(&face_space)?;
            blocks.push(make_integral_moments(&face_space, cell, tdim, quadrature_degree)?);
            entity_dofs[2].iter_mut().for_each(|n| *n = face_dofs);

            for face in 0..cell.sub_entity_count(2) {
                let start = num_edges * edge_dofs + face * face_dofs;
                for (s, transformation) in face_transformations.iter().enumerate() {
                    base_transformations[num_edges + 2 * face + s]
                        .view_mut((start, start), (face_dofs, face_dofs))
                        .copy_from(transformation);
                }
            }
        }
        if d > 1 {
            let interior_space = create_dlagrange(CellType::Tetrahedron, d - 2)?;
            blocks.push(make_integral_moments(&interior_space, cell, tdim, quadrature_degree)?);
            entity_dofs[3][0] = 3 * interior_space.dim();
        }
    }

    let (points, interpolation_matrix) = combine_interpolation_data(&blocks, tdim, tdim);
    FiniteElement::new(ElementDefinition {
        family: ElementFamily::Nedelec,
        cell_type: cell,
        degree,
        value_shape: vec![tdim],
        span,
        points,
        interpolation_matrix,
        entity_dofs,
        base_transformations,
        mapping_type: MappingType::CovariantPiola,
    })
}
