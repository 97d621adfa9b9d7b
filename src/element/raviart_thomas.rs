use super::{
    combine_interpolation_data, create_dlagrange, identity_transformations, lower_dim, ElementDefinition, ElementFamily,
    FiniteElement,
};
use crate::cell::CellType;
use crate::error::Error;
use crate::mapping::MappingType;
use crate::moments::{create_normal_moment_dof_transformations, make_integral_moments, make_normal_integral_moments};
use crate::polyset;
use crate::quadrature::make_quadrature;
use nalgebra::DMatrix;

/// Creates a Raviart-Thomas element of degree `degree >= 1` on a triangle or tetrahedron.
///
/// The space is the vector polynomials of degree `degree - 1` extended by `x p` for the
/// homogeneous scalar polynomials `p` of degree `degree - 1`. The dofs are normal moments
/// against discontinuous Lagrange functions of degree `degree - 1` on the facets and, for
/// `degree > 1`, vector moments against discontinuous Lagrange functions of degree
/// `degree - 2` in the interior.
pub fn create_rt(cell: CellType, degree: usize) -> Result<FiniteElement, Error> {
    let facet_type = match cell {
        CellType::Triangle => CellType::Interval,
        CellType::Tetrahedron => CellType::Triangle,
        _ => {
            return Err(Error::UnsupportedCell {
                cell,
                context: "Raviart-Thomas elements",
            })
        }
    };
    if degree == 0 {
        return Err(Error::InvalidDegree {
            degree,
            context: "Raviart-Thomas elements (degrees start at 1)",
        });
    }
    let tdim = cell.topological_dimension();

    // Vector polynomials of degree - 1, and the degree - 1 part of the hierarchical set
    let nv = polyset::dim(cell, degree - 1);
    let ns0 = lower_dim(cell, degree, 2);
    let ns = polyset::dim(facet_type, degree - 1);

    let (weights, points) = make_quadrature(cell, 2 * degree)?;
    let phi = polyset::tabulate(cell, degree, 0, &points)?.swap_remove(0);
    let psize = phi.ncols();

    let mut span = DMatrix::zeros(nv * tdim + ns, psize * tdim);
    for j in 0..tdim {
        span.view_mut((nv * j, psize * j), (nv, nv)).fill_with_identity();
    }
    for i in 0..ns {
        for l in 0..psize {
            for j in 0..tdim {
                let w_sum: f64 = (0..weights.len())
                    .map(|p| weights[p] * phi[(p, ns0 + i)] * points[(p, j)] * phi[(p, l)])
                    .sum();
                span[(nv * tdim + i, l + psize * j)] = w_sum;
            }
        }
    }

    let quadrature_degree = 5 * degree;
    let facet_space = create_dlagrange(facet_type, degree - 1)?;
    let facet_moments = make_normal_integral_moments(&facet_space, cell, tdim, quadrature_degree)?;
    let facet_transformations = create_normal_moment_dof_transformations(&facet_space)?;
    let facet_dofs = facet_space.dim();

    let mut blocks = vec![facet_moments];
    if degree > 1 {
        let interior_space = create_dlagrange(cell, degree - 2)?;
        blocks.push(make_integral_moments(&interior_space, cell, tdim, quadrature_degree)?);
    }
    let (interpolation_points, interpolation_matrix) = combine_interpolation_data(&blocks, tdim, tdim);

    let ndofs = nv * tdim + ns;
    let mut base_transformations = identity_transformations(cell, ndofs);
    let num_edges = cell.sub_entity_count(1);
    for facet in 0..cell.facet_count() {
        let start = facet_dofs * facet;
        let range = (facet_dofs, facet_dofs);
        if tdim == 2 {
            base_transformations[facet]
                .view_mut((start, start), range)
                .copy_from(&facet_transformations[0]);
        } else {
            for s in 0..2 {
                base_transformations[num_edges + 2 * facet + s]
                    .view_mut((start, start), range)
                    .copy_from(&facet_transformations[s]);
            }
        }
    }

    let mut entity_dofs: Vec<Vec<usize>> = cell
        .topology()
        .iter()
        .map(|entities| vec![0; entities.len()])
        .collect();
    entity_dofs[tdim - 1].iter_mut().for_each(|n| *n = facet_dofs);
    entity_dofs[tdim][0] = ns0 * tdim;

    FiniteElement::new(ElementDefinition {
        family: ElementFamily::RaviartThomas,
        cell_type: cell,
        degree,
        value_shape: vec![tdim],
        span,
        points: interpolation_points,
        interpolation_matrix,
        entity_dofs,
        base_transformations,
        mapping_type: MappingType::ContravariantPiola,
    })
}
