//! Finite elements defined by a candidate polynomial space and a set of dual functionals.
//!
//! Every element is described in terms of the orthonormal expansion set of its cell (see
//! [`polyset`](crate::polyset)). A family factory chooses the span of the element as rows of
//! expansion coefficients and a set of functionals given by interpolation points and an
//! interpolation matrix. [`compute_expansion_coefficients`] then turns these into the
//! coefficients of the basis dual to the functionals.
//!
//! Vector valued functions are expanded component by component: a coefficient row holds
//! `value_size` blocks of `dim(cell, degree)` entries.
use crate::cell::CellType;
use crate::error::Error;
use crate::mapping::{pull_back, push_forward, MappingType};
use crate::moments::MomentData;
use crate::polyset;
use crate::precompute::{apply_matrix, prepare_matrix, PreparedMatrix};
use log::{debug, trace};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod lagrange;
mod nedelec;
mod raviart_thomas;
mod tensor_product;

pub use lagrange::{create_dlagrange, create_lagrange};
pub use nedelec::create_nedelec;
pub use raviart_thomas::create_rt;
pub use tensor_product::create_tp;

/// Below this reciprocal condition number of the equilibrated `W D^T` the functionals are not
/// considered unisolvent.
pub const UNISOLVENCE_TOLERANCE: f64 = 1e-6;

/// The element families.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementFamily {
    #[serde(rename = "Lagrange")]
    Lagrange,
    #[serde(rename = "Discontinuous Lagrange")]
    DiscontinuousLagrange,
    #[serde(rename = "Raviart-Thomas")]
    RaviartThomas,
    #[serde(rename = "Nedelec 1st kind H(curl)")]
    Nedelec,
    #[serde(rename = "Tensor Product")]
    TensorProduct,
}

impl ElementFamily {
    pub const ALL: [ElementFamily; 5] = [
        ElementFamily::Lagrange,
        ElementFamily::DiscontinuousLagrange,
        ElementFamily::RaviartThomas,
        ElementFamily::Nedelec,
        ElementFamily::TensorProduct,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ElementFamily::Lagrange => "Lagrange",
            ElementFamily::DiscontinuousLagrange => "Discontinuous Lagrange",
            ElementFamily::RaviartThomas => "Raviart-Thomas",
            ElementFamily::Nedelec => "Nedelec 1st kind H(curl)",
            ElementFamily::TensorProduct => "Tensor Product",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            ElementFamily::Lagrange => "P",
            ElementFamily::DiscontinuousLagrange => "DP",
            ElementFamily::RaviartThomas => "RT",
            ElementFamily::Nedelec => "N1curl",
            ElementFamily::TensorProduct => "TP",
        }
    }
}

impl Display for ElementFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ElementFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementFamily::ALL
            .iter()
            .find(|family| family.name() == s || family.short_name() == s)
            .copied()
            .ok_or_else(|| Error::Unimplemented(format!("element family \"{s}\"")))
    }
}

/// Creates an element of the given family.
pub fn create_element(family: ElementFamily, cell: CellType, degree: usize) -> Result<FiniteElement, Error> {
    match family {
        ElementFamily::Lagrange => create_lagrange(cell, degree),
        ElementFamily::DiscontinuousLagrange => create_dlagrange(cell, degree),
        ElementFamily::RaviartThomas => create_rt(cell, degree),
        ElementFamily::Nedelec => create_nedelec(cell, degree),
        ElementFamily::TensorProduct => create_tp(cell, degree),
    }
}

/// Computes the coefficients of the basis dual to a set of functionals.
///
/// `span` holds the candidate space, one function per row in expansion coefficients, and
/// `dual` holds the functionals applied to the expansion set, one functional per row. The
/// result `C` satisfies `dual * C^T = I` and spans the same space as `span`.
pub fn compute_expansion_coefficients(span: &DMatrix<f64>, dual: &DMatrix<f64>) -> Result<DMatrix<f64>, Error> {
    debug!(
        "Computing expansion coefficients: span is {}x{}, dual matrix is {}x{}",
        span.nrows(),
        span.ncols(),
        dual.nrows(),
        dual.ncols()
    );
    if span.nrows() != dual.nrows() {
        return Err(Error::EntityDofMismatch {
            expected: span.nrows(),
            actual: dual.nrows(),
        });
    }
    if span.ncols() != dual.ncols() {
        return Err(Error::ValueSizeMismatch {
            expected: span.ncols(),
            actual: dual.ncols(),
        });
    }
    trace!("Initial coefficients: {span}");

    let a = span * dual.transpose();
    let rcond = equilibrated_rcond(&a);
    debug!("det(W D^T) = {:e}, rcond = {rcond:e}", a.determinant());
    if rcond < UNISOLVENCE_TOLERANCE {
        return Err(Error::IllConditioned { rcond });
    }

    let coefficients = a
        .col_piv_qr()
        .solve(span)
        .ok_or(Error::IllConditioned { rcond })?;
    trace!("Expansion coefficients: {coefficients}");
    Ok(coefficients)
}

/// The reciprocal 2-norm condition number of `a` after scaling its rows and then its columns
/// to unit length.
///
/// Rows of `W D^T` scale with the candidate functions and columns with the functionals, and
/// the result does not depend on either scaling. A zero row or column gives zero.
fn equilibrated_rcond(a: &DMatrix<f64>) -> f64 {
    let mut scaled = a.clone();
    for mut row in scaled.row_iter_mut() {
        let norm = row.norm();
        if norm == 0.0 {
            return 0.0;
        }
        row /= norm;
    }
    for mut column in scaled.column_iter_mut() {
        let norm = column.norm();
        if norm == 0.0 {
            return 0.0;
        }
        column /= norm;
    }
    let singular_values = scaled.singular_values();
    let max = singular_values.max();
    if max == 0.0 {
        0.0
    } else {
        singular_values.min() / max
    }
}

/// Applies the functionals given by interpolation points and matrix to the expansion set of
/// the given degree, giving the dual matrix in expansion coefficients.
pub fn compute_dual_matrix(
    cell: CellType,
    degree: usize,
    value_size: usize,
    points: &DMatrix<f64>,
    interpolation_matrix: &DMatrix<f64>,
) -> Result<DMatrix<f64>, Error> {
    let num_points = points.nrows();
    if interpolation_matrix.ncols() != num_points * value_size {
        return Err(Error::ValueSizeMismatch {
            expected: num_points * value_size,
            actual: interpolation_matrix.ncols(),
        });
    }
    let psize = polyset::dim(cell, degree);
    let expansion = polyset::tabulate(cell, degree, 0, points)?.swap_remove(0);

    let mut dual = DMatrix::zeros(interpolation_matrix.nrows(), psize * value_size);
    for k in 0..value_size {
        let block = interpolation_matrix.columns(k * num_points, num_points) * &expansion;
        dual.columns_mut(k * psize, psize).copy_from(&block);
    }
    Ok(dual)
}

/// Stacks the points of several sets of functionals and places their interpolation matrices
/// block-diagonally, keeping the component-major column layout.
pub fn combine_interpolation_data(blocks: &[MomentData], tdim: usize, value_size: usize) -> MomentData {
    let total_points: usize = blocks.iter().map(|(points, _)| points.nrows()).sum();
    let total_rows: usize = blocks.iter().map(|(_, matrix)| matrix.nrows()).sum();

    let mut points = DMatrix::zeros(total_points, tdim);
    let mut matrix = DMatrix::zeros(total_rows, total_points * value_size);
    let (mut point_offset, mut row_offset) = (0, 0);
    for (block_points, block_matrix) in blocks {
        let n = block_points.nrows();
        points.rows_mut(point_offset, n).copy_from(block_points);
        for k in 0..value_size {
            matrix
                .view_mut((row_offset, k * total_points + point_offset), (block_matrix.nrows(), n))
                .copy_from(&block_matrix.columns(k * n, n));
        }
        point_offset += n;
        row_offset += block_matrix.nrows();
    }
    (points, matrix)
}

/// Everything a family factory determines about an element.
#[derive(Debug, Clone)]
pub struct ElementDefinition {
    pub family: ElementFamily,
    pub cell_type: CellType,
    pub degree: usize,
    /// Empty for scalar elements.
    pub value_shape: Vec<usize>,
    /// The candidate space in expansion coefficients of `degree`, one function per row.
    pub span: DMatrix<f64>,
    pub points: DMatrix<f64>,
    pub interpolation_matrix: DMatrix<f64>,
    pub entity_dofs: Vec<Vec<usize>>,
    pub base_transformations: Vec<DMatrix<f64>>,
    pub mapping_type: MappingType,
}

/// The transformations acting on the dofs of a single sub-entity.
#[derive(Debug, Clone)]
struct EntityTransformations {
    offset: usize,
    /// Reflection for edges; rotation and reflection for faces.
    matrices: Vec<PreparedMatrix>,
}

/// A finite element on a reference cell.
///
/// Elements are immutable once created and may be shared between threads.
#[derive(Debug, Clone)]
pub struct FiniteElement {
    family: ElementFamily,
    cell_type: CellType,
    degree: usize,
    value_shape: Vec<usize>,
    coefficients: DMatrix<f64>,
    entity_dofs: Vec<Vec<usize>>,
    base_transformations: Vec<DMatrix<f64>>,
    points: DMatrix<f64>,
    interpolation_matrix: DMatrix<f64>,
    mapping_type: MappingType,
    edge_transformations: Vec<EntityTransformations>,
    face_transformations: Vec<EntityTransformations>,
}

impl FiniteElement {
    /// Builds an element, solving for the coefficients of the dual basis.
    pub fn new(definition: ElementDefinition) -> Result<Self, Error> {
        let ElementDefinition {
            family,
            cell_type,
            degree,
            value_shape,
            span,
            points,
            interpolation_matrix,
            entity_dofs,
            base_transformations,
            mapping_type,
        } = definition;

        let value_size: usize = value_shape.iter().product();
        let ndofs = span.nrows();
        let num_entity_dofs: usize = entity_dofs.iter().flatten().sum();
        if num_entity_dofs != ndofs {
            return Err(Error::EntityDofMismatch {
                expected: ndofs,
                actual: num_entity_dofs,
            });
        }

        let dual = compute_dual_matrix(cell_type, degree, value_size, &points, &interpolation_matrix)?;
        let coefficients = compute_expansion_coefficients(&span, &dual)?;

        let (edge_transformations, face_transformations) =
            prepare_entity_transformations(cell_type, &entity_dofs, &base_transformations)?;

        debug!("Created {family} element of degree {degree} on {cell_type} with {ndofs} dofs");
        Ok(Self {
            family,
            cell_type,
            degree,
            value_shape,
            coefficients,
            entity_dofs,
            base_transformations,
            points,
            interpolation_matrix,
            mapping_type,
            edge_transformations,
            face_transformations,
        })
    }

    pub fn family(&self) -> ElementFamily {
        self.family
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The shape of a basis function value, `[]` for scalar elements and `[tdim]` for vector
    /// elements.
    pub fn value_shape(&self) -> &[usize] {
        &self.value_shape
    }

    pub fn value_size(&self) -> usize {
        self.value_shape.iter().product()
    }

    pub fn value_rank(&self) -> usize {
        self.value_shape.len()
    }

    /// The number of degrees of freedom.
    pub fn dim(&self) -> usize {
        self.coefficients.nrows()
    }

    /// The number of dofs on each sub-entity, indexed by entity dimension and then by entity.
    pub fn entity_dofs(&self) -> &[Vec<usize>] {
        &self.entity_dofs
    }

    /// The number of dofs on each sub-entity of the given dimension.
    pub fn num_entity_dofs(&self, dim: usize) -> Result<&[usize], Error> {
        self.entity_dofs
            .get(dim)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidEntity { dim, index: 0 })
    }

    /// Basis functions in expansion coefficients, one per row.
    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    /// The matrices describing how the dofs change when an entity is reflected or rotated.
    ///
    /// Edges have one transformation each (a reflection). In 3D, faces follow the edges with
    /// two each (a rotation and a reflection).
    pub fn base_transformations(&self) -> &[DMatrix<f64>] {
        &self.base_transformations
    }

    /// Interpolation points, one per row.
    pub fn points(&self) -> &DMatrix<f64> {
        &self.points
    }

    pub fn interpolation_matrix(&self) -> &DMatrix<f64> {
        &self.interpolation_matrix
    }

    pub fn mapping_type(&self) -> MappingType {
        self.mapping_type
    }

    /// Tabulates the basis functions and their derivatives up to order `nderiv`.
    ///
    /// Returns one `num_points x (dim * value_size)` matrix per derivative multi-index, in the
    /// order of [`polyset::derivative_index`]. Component `k` of basis function `i` is in
    /// column `k * dim + i`.
    pub fn tabulate(&self, nderiv: usize, points: &DMatrix<f64>) -> Result<Vec<DMatrix<f64>>, Error> {
        let expansion = polyset::tabulate(self.cell_type, self.degree, nderiv, points)?;
        let psize = polyset::dim(self.cell_type, self.degree);
        let ndofs = self.dim();
        let value_size = self.value_size();

        let tables = expansion
            .iter()
            .map(|table| {
                let mut result = DMatrix::zeros(points.nrows(), ndofs * value_size);
                for k in 0..value_size {
                    let block = table * self.coefficients.columns(k * psize, psize).transpose();
                    result.columns_mut(k * ndofs, ndofs).copy_from(&block);
                }
                result
            })
            .collect();
        Ok(tables)
    }

    /// Maps reference values to physical values, one point per row.
    ///
    /// Row `p` of `reference_values` is mapped with `j[p]`, `det_j[p]` and `k[p]`.
    pub fn map_push_forward(
        &self,
        reference_values: &DMatrix<f64>,
        j: &[DMatrix<f64>],
        det_j: &[f64],
        k: &[DMatrix<f64>],
    ) -> Result<DMatrix<f64>, Error> {
        self.map_rows(reference_values, j, det_j, k, push_forward)
    }

    /// Maps physical values back to the reference cell, one point per row.
    pub fn map_pull_back(
        &self,
        physical_values: &DMatrix<f64>,
        j: &[DMatrix<f64>],
        det_j: &[f64],
        k: &[DMatrix<f64>],
    ) -> Result<DMatrix<f64>, Error> {
        self.map_rows(physical_values, j, det_j, k, pull_back)
    }

    fn map_rows(
        &self,
        values: &DMatrix<f64>,
        j: &[DMatrix<f64>],
        det_j: &[f64],
        k: &[DMatrix<f64>],
        map: fn(MappingType, &[f64], &DMatrix<f64>, f64, &DMatrix<f64>) -> Result<Vec<f64>, Error>,
    ) -> Result<DMatrix<f64>, Error> {
        let num_points = values.nrows();
        for len in [j.len(), det_j.len(), k.len()] {
            if len != num_points {
                return Err(Error::ValueSizeMismatch {
                    expected: num_points,
                    actual: len,
                });
            }
        }

        let mut rows = Vec::with_capacity(num_points);
        for p in 0..num_points {
            let value: Vec<f64> = values.row(p).iter().copied().collect();
            rows.push(map(self.mapping_type, &value, &j[p], det_j[p], &k[p])?);
        }
        let ncols = rows.first().map_or(0, Vec::len);
        Ok(DMatrix::from_fn(num_points, ncols, |p, c| rows[p][c]))
    }

    /// Applies the entity transformations selected by `cell_info` to dof-major data.
    ///
    /// Bit `3 f` of `cell_info` flags a reflection of face `f` and bits `3 f + 1` and
    /// `3 f + 2` hold the number of times it is rotated. The reflection flag of edge `e`
    /// follows at bit `3 * num_faces + e` (at bit `e` in 2D). Faces are rotated before they
    /// are reflected.
    pub fn apply_dof_transformation(&self, data: &mut [f64], block_size: usize, cell_info: u32) -> Result<(), Error> {
        let expected = self.dim() * block_size;
        if data.len() != expected {
            return Err(Error::ValueSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let tdim = self.cell_type.topological_dimension();
        if tdim < 2 {
            return Ok(());
        }
        let edge_start = if tdim == 3 {
            3 * self.cell_type.sub_entity_count(2)
        } else {
            0
        };

        for (e, edge) in self.edge_transformations.iter().enumerate() {
            if cell_info >> (edge_start + e) & 1 == 1 {
                apply_matrix(&edge.matrices[0], data, edge.offset, block_size);
            }
        }

        for (f, face) in self.face_transformations.iter().enumerate() {
            let rotations = cell_info >> (3 * f + 1) & 3;
            for _ in 0..rotations {
                apply_matrix(&face.matrices[0], data, face.offset, block_size);
            }
            if cell_info >> (3 * f) & 1 == 1 {
                apply_matrix(&face.matrices[1], data, face.offset, block_size);
            }
        }
        Ok(())
    }
}

/// Extracts and factors the block of every base transformation that acts on its entity.
fn prepare_entity_transformations(
    cell: CellType,
    entity_dofs: &[Vec<usize>],
    base_transformations: &[DMatrix<f64>],
) -> Result<(Vec<EntityTransformations>, Vec<EntityTransformations>), Error> {
    let tdim = cell.topological_dimension();
    let mut offsets = Vec::with_capacity(entity_dofs.len());
    let mut offset = 0;
    for dofs in entity_dofs {
        offsets.push(offset);
        offset += dofs.iter().sum::<usize>();
    }

    let prepare = |dim: usize, first_transformation: usize, per_entity: usize| {
        let mut prepared = Vec::new();
        let Some(dofs) = entity_dofs.get(dim) else {
            return Ok(prepared);
        };
        let mut entity_offset = offsets[dim];
        for (index, &n) in dofs.iter().enumerate() {
            let mut matrices = Vec::with_capacity(per_entity);
            for s in 0..per_entity {
                let t = first_transformation + per_entity * index + s;
                let matrix = base_transformations
                    .get(t)
                    .ok_or(Error::InvalidEntity { dim, index })?;
                matrices.push(prepare_matrix(
                    &matrix.view((entity_offset, entity_offset), (n, n)).clone_owned(),
                )?);
            }
            prepared.push(EntityTransformations {
                offset: entity_offset,
                matrices,
            });
            entity_offset += n;
        }
        Ok::<_, Error>(prepared)
    };

    let edges = if tdim >= 2 { prepare(1, 0, 1)? } else { Vec::new() };
    let faces = if tdim == 3 {
        prepare(2, cell.sub_entity_count(1), 2)?
    } else {
        Vec::new()
    };
    Ok((edges, faces))
}

/// Number of base transformations of an element on the cell: one per edge, and in 3D also
/// two per face.
pub(crate) fn num_base_transformations(cell: CellType) -> usize {
    let tdim = cell.topological_dimension();
    (1..tdim).map(|dim| cell.sub_entity_count(dim) * dim).sum()
}

/// Identity base transformations for an element with `ndofs` dofs.
pub(crate) fn identity_transformations(cell: CellType, ndofs: usize) -> Vec<DMatrix<f64>> {
    vec![DMatrix::identity(ndofs, ndofs); num_base_transformations(cell)]
}

/// `dim(cell, degree - offset)`, zero when the difference is negative.
pub(crate) fn lower_dim(cell: CellType, degree: usize, offset: usize) -> usize {
    degree.checked_sub(offset).map_or(0, |d| polyset::dim(cell, d))
}
