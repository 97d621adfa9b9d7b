use super::{identity_transformations, ElementDefinition, ElementFamily, FiniteElement};
use crate::cell::{map_to_entity, CellType};
use crate::error::Error;
use crate::lattice::create_lattice;
use crate::mapping::MappingType;
use crate::moments::{entity_symmetries, EntitySymmetry};
use crate::polyset;
use nalgebra::DMatrix;

const LATTICE_MATCH_TOLERANCE: f64 = 1e-10;

/// The permutation `perm` with `points[perm[i]] == symmetry(points[i])`.
fn lattice_permutation(points: &DMatrix<f64>, symmetry: &EntitySymmetry) -> Result<Vec<usize>, Error> {
    let mapped = symmetry.map_points(points);
    (0..points.nrows())
        .map(|i| {
            (0..points.nrows())
                .find(|&j| (points.row(j) - mapped.row(i)).amax() < LATTICE_MATCH_TOLERANCE)
                .ok_or_else(|| Error::Unimplemented("lattice that is not closed under entity symmetries".to_string()))
        })
        .collect()
}

/// Writes the permutations of the interior lattice of `entity_type` into the base
/// transformations `first..first + num_symmetries` at dof offset `start`.
fn set_entity_permutations(
    transformations: &mut [DMatrix<f64>],
    first: usize,
    start: usize,
    entity_type: CellType,
    degree: usize,
) -> Result<(), Error> {
    let lattice = create_lattice(entity_type, degree, false)?;
    for (s, symmetry) in entity_symmetries(entity_type)?.iter().enumerate() {
        let perm = lattice_permutation(&lattice, symmetry)?;
        let t = &mut transformations[first + s];
        for i in 0..perm.len() {
            t[(start + i, start + i)] = 0.0;
        }
        for (i, &p) in perm.iter().enumerate() {
            t[(start + i, start + p)] = 1.0;
        }
    }
    Ok(())
}

/// Creates a (continuous) Lagrange element, with nodes on an equispaced lattice.
///
/// Nodes are ordered by entity: first the vertices, then the interior lattice of every edge,
/// then of every face, then of the cell. Degree 0 gives the constant element with its node at
/// the vertex average.
pub fn create_lagrange(cell: CellType, degree: usize) -> Result<FiniteElement, Error> {
    if cell == CellType::Point {
        return Err(Error::UnsupportedCell {
            cell,
            context: "Lagrange elements",
        });
    }

    let ndofs = polyset::dim(cell, degree);
    let tdim = cell.topological_dimension();
    let topology = cell.topology();
    let mut entity_dofs: Vec<Vec<usize>> = topology.iter().map(|entities| vec![0; entities.len()]).collect();
    let mut transformations = identity_transformations(cell, ndofs);

    let points = if degree == 0 {
        entity_dofs[tdim][0] = 1;
        create_lattice(cell, 0, true)?
    } else {
        let mut blocks = Vec::new();
        let mut offset = 0;
        for (dim, entities) in topology.iter().enumerate() {
            for index in 0..entities.len() {
                let entity_type = cell.sub_entity_type(dim, index)?;
                let block = match dim {
                    0 => cell.sub_entity_geometry(0, index)?,
                    _ if dim == tdim => create_lattice(cell, degree, false)?,
                    _ => {
                        let local = create_lattice(entity_type, degree, false)?;
                        map_to_entity(entity_type, &cell.sub_entity_geometry(dim, index)?, &local)?
                    }
                };

                if block.nrows() > 0 && dim > 0 && dim < tdim {
                    let first = match dim {
                        1 => index,
                        _ => cell.sub_entity_count(1) + 2 * index,
                    };
                    set_entity_permutations(&mut transformations, first, offset, entity_type, degree)?;
                }

                entity_dofs[dim][index] = block.nrows();
                offset += block.nrows();
                blocks.push(block);
            }
        }
        let mut points = DMatrix::zeros(offset, tdim);
        let mut row = 0;
        for block in &blocks {
            points.rows_mut(row, block.nrows()).copy_from(block);
            row += block.nrows();
        }
        points
    };

    FiniteElement::new(ElementDefinition {
        family: ElementFamily::Lagrange,
        cell_type: cell,
        degree,
        value_shape: Vec::new(),
        span: DMatrix::identity(ndofs, ndofs),
        interpolation_matrix: DMatrix::identity(points.nrows(), points.nrows()),
        points,
        entity_dofs,
        base_transformations: transformations,
        mapping_type: MappingType::Identity,
    })
}

/// Creates a discontinuous Lagrange element on an interval, triangle or tetrahedron. All
/// nodes, including those on the boundary, belong to the cell interior.
pub fn create_dlagrange(cell: CellType, degree: usize) -> Result<FiniteElement, Error> {
    if !matches!(cell, CellType::Interval | CellType::Triangle | CellType::Tetrahedron) {
        return Err(Error::UnsupportedCell {
            cell,
            context: "discontinuous Lagrange elements",
        });
    }
    create_interior_nodal_element(ElementFamily::DiscontinuousLagrange, cell, degree)
}

/// A nodal element on the full lattice with all dofs associated with the cell interior.
pub(super) fn create_interior_nodal_element(
    family: ElementFamily,
    cell: CellType,
    degree: usize,
) -> Result<FiniteElement, Error> {
    let ndofs = polyset::dim(cell, degree);
    let tdim = cell.topological_dimension();
    let points = create_lattice(cell, degree, true)?;

    let mut entity_dofs: Vec<Vec<usize>> = cell
        .topology()
        .iter()
        .map(|entities| vec![0; entities.len()])
        .collect();
    entity_dofs[tdim][0] = points.nrows();

    FiniteElement::new(ElementDefinition {
        family,
        cell_type: cell,
        degree,
        value_shape: Vec::new(),
        span: DMatrix::identity(ndofs, ndofs),
        interpolation_matrix: DMatrix::identity(points.nrows(), points.nrows()),
        points,
        entity_dofs,
        base_transformations: identity_transformations(cell, ndofs),
        mapping_type: MappingType::Identity,
    })
}
