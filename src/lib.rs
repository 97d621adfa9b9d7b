//! Finite element basis functions on reference cells.
//!
//! Elements are built from an orthonormal expansion set on the reference cell
//! ([`polyset`]) and a set of dual functionals: point evaluations for nodal families,
//! integral moments over sub-entities ([`moments`]) for Raviart-Thomas and Nedelec
//! elements. Once created, an [`element::FiniteElement`] tabulates its basis functions and
//! their derivatives at arbitrary points, and its values are mapped to physical cells with
//! the functions in [`mapping`].
//!
//! The [`registry`] module exposes elements through opaque handles and flat buffers.
pub mod cell;
pub mod element;
pub mod error;
pub mod lattice;
pub mod mapping;
pub mod moments;
pub mod polyset;
pub mod precompute;
pub mod quadrature;
pub mod registry;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;

pub use cell::CellType;
pub use element::{create_element, ElementFamily, FiniteElement};
pub use error::Error;
pub use mapping::MappingType;
pub use quadrature::{make_quadrature, QuadratureType};
