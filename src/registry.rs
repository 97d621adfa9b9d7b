//! Handle-based access to elements, for callers that cannot hold Rust values.
//!
//! Elements are stored in an [`ElementRegistry`], an arena addressed by [`ElementHandle`]s.
//! Each slot carries a generation counter that is bumped when its element is released, so a
//! handle that outlives its element is detected instead of silently addressing a newer
//! element in the same slot.
//!
//! The free functions operate on a process-wide registry. Registering and releasing take a
//! write lock; every other operation clones the element's `Arc` under a read lock and works
//! without holding the lock. Output is written to caller-provided flat buffers in row-major
//! order.
use crate::cell::CellType;
use crate::element::{create_element, ElementFamily, FiniteElement};
use crate::mapping::{pull_back, push_forward};
use eyre::{eyre, WrapErr};
use log::{debug, warn};
use nalgebra::DMatrix;
use parking_lot::{const_rwlock, RwLock};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An opaque reference to an element in a registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    index: u32,
    generation: u32,
}

impl From<ElementHandle> for u64 {
    fn from(handle: ElementHandle) -> Self {
        (u64::from(handle.generation) << 32) | u64::from(handle.index)
    }
}

impl From<u64> for ElementHandle {
    fn from(value: u64) -> Self {
        Self {
            index: (value & 0xffff_ffff) as u32,
            generation: (value >> 32) as u32,
        }
    }
}

impl Display for ElementHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Arc<FiniteElement>>,
}

/// An arena of elements with explicit insertion and removal.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ElementRegistry {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// The number of live elements.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, element: FiniteElement) -> eyre::Result<ElementHandle> {
        let element = Some(Arc::new(element));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = element;
            return Ok(ElementHandle {
                index,
                generation: slot.generation,
            });
        }
        let index = u32::try_from(self.slots.len()).wrap_err("Element registry is full")?;
        self.slots.push(Slot {
            generation: 0,
            element,
        });
        Ok(ElementHandle { index, generation: 0 })
    }

    fn slot(&self, handle: ElementHandle) -> eyre::Result<&Slot> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or_else(|| eyre!("Element handle {handle} is out of range"))?;
        if slot.generation != handle.generation || slot.element.is_none() {
            return Err(eyre!("Element handle {handle} refers to a released element"));
        }
        Ok(slot)
    }

    pub fn get(&self, handle: ElementHandle) -> eyre::Result<Arc<FiniteElement>> {
        let slot = self.slot(handle)?;
        slot.element
            .clone()
            .ok_or_else(|| eyre!("Element handle {handle} refers to a released element"))
    }

    /// Removes an element. Its handle, and every copy of it, becomes invalid.
    pub fn remove(&mut self, handle: ElementHandle) -> eyre::Result<Arc<FiniteElement>> {
        self.slot(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let element = slot
            .element
            .take()
            .ok_or_else(|| eyre!("Element handle {handle} refers to a released element"))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(element)
    }
}

static REGISTRY: RwLock<ElementRegistry> = const_rwlock(ElementRegistry::new());

fn element(handle: ElementHandle) -> eyre::Result<Arc<FiniteElement>> {
    REGISTRY.read().get(handle).map_err(|err| {
        warn!("Rejected element handle: {err}");
        err
    })
}

fn parse_cell(cell_name: &str) -> eyre::Result<CellType> {
    cell_name
        .parse()
        .wrap_err_with(|| format!("Failed to parse cell type \"{cell_name}\""))
}

fn row_major(matrix: &DMatrix<f64>) -> Vec<f64> {
    matrix.transpose().as_slice().to_vec()
}

/// Creates an element and registers it in the process-wide registry.
///
/// `family_name` accepts the long and short family names, for example `"Lagrange"` or `"P"`.
pub fn register_element(family_name: &str, cell_name: &str, degree: usize) -> eyre::Result<ElementHandle> {
    let family: ElementFamily = family_name
        .parse()
        .wrap_err_with(|| format!("Failed to parse element family \"{family_name}\""))?;
    let cell = parse_cell(cell_name)?;
    let element = create_element(family, cell, degree)
        .wrap_err_with(|| format!("Failed to create {family} element of degree {degree} on {cell}"))?;
    let handle = REGISTRY.write().insert(element)?;
    debug!("Registered {family} element of degree {degree} on {cell} as {handle}");
    Ok(handle)
}

/// Releases an element of the process-wide registry.
pub fn release_element(handle: ElementHandle) -> eyre::Result<()> {
    REGISTRY.write().remove(handle).map_err(|err| {
        warn!("Rejected release: {err}");
        err
    })?;
    debug!("Released element {handle}");
    Ok(())
}

/// The length of the output of [`tabulate`].
pub fn tabulate_size(handle: ElementHandle, nderiv: usize, num_points: usize) -> eyre::Result<usize> {
    let element = element(handle)?;
    let tdim = element.cell_type().topological_dimension();
    let num_derivatives = crate::polyset::num_derivatives(tdim, nderiv);
    Ok(num_derivatives * element.value_size() * element.dim() * num_points)
}

/// Tabulates the basis functions and their derivatives up to order `nderiv`.
///
/// `points` holds `num_points x tdim` coordinates. `out` has the shape
/// `[num_derivatives][value_size][dim][num_points]`.
pub fn tabulate(handle: ElementHandle, nderiv: usize, points: &[f64], out: &mut [f64]) -> eyre::Result<()> {
    let element = element(handle)?;
    let tdim = element.cell_type().topological_dimension();
    if tdim == 0 || points.len() % tdim != 0 {
        return Err(eyre!(
            "Point buffer of length {} does not hold points of dimension {tdim}",
            points.len()
        ));
    }
    let num_points = points.len() / tdim;
    let expected = tabulate_size(handle, nderiv, num_points)?;
    if out.len() != expected {
        return Err(eyre!("Output buffer has length {}, expected {expected}", out.len()));
    }

    let points = DMatrix::from_row_slice(num_points, tdim, points);
    let tables = element.tabulate(nderiv, &points)?;
    let (ndofs, value_size) = (element.dim(), element.value_size());
    for (d, table) in tables.iter().enumerate() {
        for k in 0..value_size {
            for i in 0..ndofs {
                for p in 0..num_points {
                    out[((d * value_size + k) * ndofs + i) * num_points + p] = table[(p, k * ndofs + i)];
                }
            }
        }
    }
    Ok(())
}

/// Jacobian (`physical_dim x tdim`) and inverse (`tdim x physical_dim`) from row-major buffers.
fn jacobians(element: &FiniteElement, j: &[f64], k: &[f64], physical_dim: usize) -> eyre::Result<(DMatrix<f64>, DMatrix<f64>)> {
    let tdim = element.cell_type().topological_dimension();
    if j.len() != physical_dim * tdim || k.len() != physical_dim * tdim {
        return Err(eyre!(
            "Jacobian buffers must hold {physical_dim}x{tdim} entries (got {} and {})",
            j.len(),
            k.len()
        ));
    }
    Ok((
        DMatrix::from_row_slice(physical_dim, tdim, j),
        DMatrix::from_row_slice(tdim, physical_dim, k),
    ))
}

fn check_buffer(name: &str, buffer: &[f64], expected: usize) -> eyre::Result<()> {
    if buffer.len() == expected {
        Ok(())
    } else {
        Err(eyre!("{name} buffer has length {}, expected {expected}", buffer.len()))
    }
}

/// Maps the reference value of one basis function at one point to a physical cell.
#[allow(clippy::too_many_arguments)]
pub fn map_push_forward(
    handle: ElementHandle,
    out: &mut [f64],
    reference_data: &[f64],
    j: &[f64],
    det_j: f64,
    k: &[f64],
    physical_dim: usize,
    physical_value_size: usize,
) -> eyre::Result<()> {
    let element = element(handle)?;
    let (j, k) = jacobians(&element, j, k, physical_dim)?;
    let mapping = element.mapping_type();
    check_buffer("Reference value", reference_data, element.value_size())?;
    check_buffer(
        "Output",
        out,
        mapping.physical_value_size(element.value_size(), physical_dim),
    )?;
    check_buffer("Output", out, physical_value_size)?;
    let mapped = push_forward(mapping, reference_data, &j, det_j, &k)?;
    out.copy_from_slice(&mapped);
    Ok(())
}

/// Maps the physical value of one function at one point back to the reference cell.
#[allow(clippy::too_many_arguments)]
pub fn map_pull_back(
    handle: ElementHandle,
    out: &mut [f64],
    physical_data: &[f64],
    j: &[f64],
    det_j: f64,
    k: &[f64],
    physical_dim: usize,
    physical_value_size: usize,
) -> eyre::Result<()> {
    let element = element(handle)?;
    let (j, k) = jacobians(&element, j, k, physical_dim)?;
    let mapping = element.mapping_type();
    check_buffer("Physical value", physical_data, physical_value_size)?;
    check_buffer(
        "Physical value",
        physical_data,
        mapping.physical_value_size(element.value_size(), physical_dim),
    )?;
    check_buffer("Output", out, element.value_size())?;
    let mapped = pull_back(mapping, physical_data, &j, det_j, &k)?;
    out.copy_from_slice(&mapped);
    Ok(())
}

pub fn cell_type(handle: ElementHandle) -> eyre::Result<CellType> {
    Ok(element(handle)?.cell_type())
}

pub fn degree(handle: ElementHandle) -> eyre::Result<usize> {
    Ok(element(handle)?.degree())
}

/// The number of value dimensions: 0 for scalar elements, 1 for vector-valued ones.
pub fn value_rank(handle: ElementHandle) -> eyre::Result<usize> {
    Ok(element(handle)?.value_rank())
}

/// The value shape of the element. Scalar elements have the empty shape `[]`, not `[1]`;
/// their value size, the product of the shape, is still 1.
pub fn value_shape(handle: ElementHandle) -> eyre::Result<Vec<usize>> {
    Ok(element(handle)?.value_shape().to_vec())
}

/// The number of dofs of the element.
pub fn dim(handle: ElementHandle) -> eyre::Result<usize> {
    Ok(element(handle)?.dim())
}

pub fn family_name(handle: ElementHandle) -> eyre::Result<&'static str> {
    Ok(element(handle)?.family().name())
}

pub fn mapping_name(handle: ElementHandle) -> eyre::Result<&'static str> {
    Ok(element(handle)?.mapping_type().name())
}

/// The number of dofs on each sub-entity of dimension `dim`.
pub fn entity_dofs(handle: ElementHandle, dim: usize) -> eyre::Result<Vec<usize>> {
    let element = element(handle)?;
    let dofs = element
        .num_entity_dofs(dim)
        .wrap_err_with(|| format!("Element {handle} has no entities of dimension {dim}"))?;
    Ok(dofs.to_vec())
}

pub fn interpolation_num_points(handle: ElementHandle) -> eyre::Result<usize> {
    Ok(element(handle)?.points().nrows())
}

/// Interpolation points, `num_points x tdim`, row-major.
pub fn interpolation_points(handle: ElementHandle) -> eyre::Result<Vec<f64>> {
    Ok(row_major(element(handle)?.points()))
}

/// Interpolation matrix, `dim x (num_points * value_size)`, row-major.
pub fn interpolation_matrix(handle: ElementHandle) -> eyre::Result<Vec<f64>> {
    Ok(row_major(element(handle)?.interpolation_matrix()))
}

pub fn cell_geometry_num_points(cell_name: &str) -> eyre::Result<usize> {
    Ok(parse_cell(cell_name)?.num_vertices())
}

pub fn cell_geometry_dimension(cell_name: &str) -> eyre::Result<usize> {
    Ok(parse_cell(cell_name)?.topological_dimension())
}

/// Reference vertex coordinates, `num_vertices x tdim`, row-major.
pub fn cell_geometry(cell_name: &str) -> eyre::Result<Vec<f64>> {
    Ok(row_major(&parse_cell(cell_name)?.geometry()))
}

/// Vertex lists of every sub-entity, indexed by dimension and then by entity.
pub fn topology(cell_name: &str) -> eyre::Result<Vec<Vec<Vec<usize>>>> {
    Ok(parse_cell(cell_name)?.topology())
}
