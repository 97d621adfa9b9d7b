use super::lagrange::create_interior_nodal_element;
use super::{ElementFamily, FiniteElement};
use crate::cell::CellType;
use crate::error::Error;

/// Creates the nodal element on the full equispaced lattice of a quadrilateral, hexahedron,
/// prism or pyramid. All dofs are associated with the cell interior.
pub fn create_tp(cell: CellType, degree: usize) -> Result<FiniteElement, Error> {
    match cell {
        CellType::Quadrilateral | CellType::Hexahedron | CellType::Prism | CellType::Pyramid => {
            create_interior_nodal_element(ElementFamily::TensorProduct, cell, degree)
        }
        _ => Err(Error::UnsupportedCell {
            cell,
            context: "tensor product elements",
        }),
    }
}
