//! Reference cells: topology and geometry tables.
//!
//! All tables are compile-time constants. Vertices of a sub-entity are listed in ascending
//! order, so that for simplices the entity of codimension one with index `i` is the one
//! opposite vertex `i`. For quadrilateral entities, vertices 1 and 2 of the entity are the
//! neighbours of vertex 0, so the entity is the parallelogram they span.
use crate::error::Error;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The reference cell types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Point,
    Interval,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

type Topology = &'static [&'static [&'static [usize]]];

const POINT_VERTICES: &[&[f64]] = &[&[]];
const INTERVAL_VERTICES: &[&[f64]] = &[&[0.0], &[1.0]];
const TRIANGLE_VERTICES: &[&[f64]] = &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]];
const QUADRILATERAL_VERTICES: &[&[f64]] = &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]];
const TETRAHEDRON_VERTICES: &[&[f64]] = &[
    &[0.0, 0.0, 0.0],
    &[1.0, 0.0, 0.0],
    &[0.0, 1.0, 0.0],
    &[0.0, 0.0, 1.0],
];
const HEXAHEDRON_VERTICES: &[&[f64]] = &[
    &[0.0, 0.0, 0.0],
    &[1.0, 0.0, 0.0],
    &[0.0, 1.0, 0.0],
    &[1.0, 1.0, 0.0],
    &[0.0, 0.0, 1.0],
    &[1.0, 0.0, 1.0],
    &[0.0, 1.0, 1.0],
    &[1.0, 1.0, 1.0],
];
const PRISM_VERTICES: &[&[f64]] = &[
    &[0.0, 0.0, 0.0],
    &[1.0, 0.0, 0.0],
    &[0.0, 1.0, 0.0],
    &[0.0, 0.0, 1.0],
    &[1.0, 0.0, 1.0],
    &[0.0, 1.0, 1.0],
];
const PYRAMID_VERTICES: &[&[f64]] = &[
    &[0.0, 0.0, 0.0],
    &[1.0, 0.0, 0.0],
    &[0.0, 1.0, 0.0],
    &[1.0, 1.0, 0.0],
    &[0.0, 0.0, 1.0],
];

const POINT_TOPOLOGY: Topology = &[&[&[0]]];
const INTERVAL_TOPOLOGY: Topology = &[&[&[0], &[1]], &[&[0, 1]]];
const TRIANGLE_TOPOLOGY: Topology = &[
    &[&[0], &[1], &[2]],
    &[&[1, 2], &[0, 2], &[0, 1]],
    &[&[0, 1, 2]],
];
const QUADRILATERAL_TOPOLOGY: Topology = &[
    &[&[0], &[1], &[2], &[3]],
    &[&[0, 1], &[0, 2], &[1, 3], &[2, 3]],
    &[&[0, 1, 2, 3]],
];
const TETRAHEDRON_TOPOLOGY: Topology = &[
    &[&[0], &[1], &[2], &[3]],
    &[&[2, 3], &[1, 3], &[1, 2], &[0, 3], &[0, 2], &[0, 1]],
    &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]],
    &[&[0, 1, 2, 3]],
];
const HEXAHEDRON_TOPOLOGY: Topology = &[
    &[&[0], &[1], &[2], &[3], &[4], &[5], &[6], &[7]],
    &[
        &[0, 1],
        &[0, 2],
        &[0, 4],
        &[1, 3],
        &[1, 5],
        &[2, 3],
        &[2, 6],
        &[3, 7],
        &[4, 5],
        &[4, 6],
        &[5, 7],
        &[6, 7],
    ],
    &[
        &[0, 1, 2, 3],
        &[0, 1, 4, 5],
        &[0, 2, 4, 6],
        &[1, 3, 5, 7],
        &[2, 3, 6, 7],
        &[4, 5, 6, 7],
    ],
    &[&[0, 1, 2, 3, 4, 5, 6, 7]],
];
const PRISM_TOPOLOGY: Topology = &[
    &[&[0], &[1], &[2], &[3], &[4], &[5]],
    &[
        &[0, 1],
        &[0, 2],
        &[0, 3],
        &[1, 2],
        &[1, 4],
        &[2, 5],
        &[3, 4],
        &[3, 5],
        &[4, 5],
    ],
    &[&[0, 1, 2], &[0, 1, 3, 4], &[0, 2, 3, 5], &[1, 2, 4, 5], &[3, 4, 5]],
    &[&[0, 1, 2, 3, 4, 5]],
];
const PYRAMID_TOPOLOGY: Topology = &[
    &[&[0], &[1], &[2], &[3], &[4]],
    &[
        &[0, 1],
        &[0, 2],
        &[0, 4],
        &[1, 3],
        &[1, 4],
        &[2, 3],
        &[2, 4],
        &[3, 4],
    ],
    &[&[0, 1, 2, 3], &[0, 1, 4], &[0, 2, 4], &[1, 3, 4], &[2, 3, 4]],
    &[&[0, 1, 2, 3, 4]],
];

impl CellType {
    /// All cell types, in declaration order.
    pub const ALL: [CellType; 8] = [
        CellType::Point,
        CellType::Interval,
        CellType::Triangle,
        CellType::Quadrilateral,
        CellType::Tetrahedron,
        CellType::Hexahedron,
        CellType::Prism,
        CellType::Pyramid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CellType::Point => "point",
            CellType::Interval => "interval",
            CellType::Triangle => "triangle",
            CellType::Quadrilateral => "quadrilateral",
            CellType::Tetrahedron => "tetrahedron",
            CellType::Hexahedron => "hexahedron",
            CellType::Prism => "prism",
            CellType::Pyramid => "pyramid",
        }
    }

    pub fn topological_dimension(&self) -> usize {
        match self {
            CellType::Point => 0,
            CellType::Interval => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron | CellType::Prism | CellType::Pyramid => 3,
        }
    }

    pub fn is_simplex(&self) -> bool {
        matches!(
            self,
            CellType::Point | CellType::Interval | CellType::Triangle | CellType::Tetrahedron
        )
    }

    /// The simplex of the given topological dimension.
    pub fn simplex_type(dim: usize) -> Result<CellType, Error> {
        match dim {
            0 => Ok(CellType::Point),
            1 => Ok(CellType::Interval),
            2 => Ok(CellType::Triangle),
            3 => Ok(CellType::Tetrahedron),
            _ => Err(Error::Unimplemented(format!("simplex of dimension {dim}"))),
        }
    }

    /// Reference vertex coordinates, one slice per vertex.
    pub fn vertices(&self) -> &'static [&'static [f64]] {
        match self {
            CellType::Point => POINT_VERTICES,
            CellType::Interval => INTERVAL_VERTICES,
            CellType::Triangle => TRIANGLE_VERTICES,
            CellType::Quadrilateral => QUADRILATERAL_VERTICES,
            CellType::Tetrahedron => TETRAHEDRON_VERTICES,
            CellType::Hexahedron => HEXAHEDRON_VERTICES,
            CellType::Prism => PRISM_VERTICES,
            CellType::Pyramid => PYRAMID_VERTICES,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices().len()
    }

    /// Reference vertex coordinates as a `num_vertices x tdim` matrix.
    pub fn geometry(&self) -> DMatrix<f64> {
        let vertices = self.vertices();
        let tdim = self.topological_dimension();
        DMatrix::from_fn(vertices.len(), tdim, |i, j| vertices[i][j])
    }

    fn topology_table(&self) -> Topology {
        match self {
            CellType::Point => POINT_TOPOLOGY,
            CellType::Interval => INTERVAL_TOPOLOGY,
            CellType::Triangle => TRIANGLE_TOPOLOGY,
            CellType::Quadrilateral => QUADRILATERAL_TOPOLOGY,
            CellType::Tetrahedron => TETRAHEDRON_TOPOLOGY,
            CellType::Hexahedron => HEXAHEDRON_TOPOLOGY,
            CellType::Prism => PRISM_TOPOLOGY,
            CellType::Pyramid => PYRAMID_TOPOLOGY,
        }
    }

    /// Vertex lists of every sub-entity, indexed by dimension and then by entity.
    pub fn topology(&self) -> Vec<Vec<Vec<usize>>> {
        self.topology_table()
            .iter()
            .map(|entities| entities.iter().map(|vertices| vertices.to_vec()).collect())
            .collect()
    }

    /// The number of sub-entities of the given dimension.
    pub fn sub_entity_count(&self, dim: usize) -> usize {
        self.topology_table()
            .get(dim)
            .map(|entities| entities.len())
            .unwrap_or(0)
    }

    /// The number of entities of each dimension, from vertices up to the cell itself.
    pub fn entity_counts(&self) -> Vec<usize> {
        self.topology_table().iter().map(|e| e.len()).collect()
    }

    pub fn facet_count(&self) -> usize {
        match self.topological_dimension() {
            0 => 0,
            tdim => self.sub_entity_count(tdim - 1),
        }
    }

    /// The vertices (as indices into the cell's vertices) of a sub-entity.
    pub fn sub_entity_vertices(&self, dim: usize, index: usize) -> Result<&'static [usize], Error> {
        self.topology_table()
            .get(dim)
            .and_then(|entities| entities.get(index))
            .copied()
            .ok_or(Error::InvalidEntity { dim, index })
    }

    /// Vertex coordinates of a sub-entity as a `num_entity_vertices x tdim` matrix.
    pub fn sub_entity_geometry(&self, dim: usize, index: usize) -> Result<DMatrix<f64>, Error> {
        let entity = self.sub_entity_vertices(dim, index)?;
        let vertices = self.vertices();
        let tdim = self.topological_dimension();
        Ok(DMatrix::from_fn(entity.len(), tdim, |i, j| vertices[entity[i]][j]))
    }

    /// The cell type of a sub-entity.
    pub fn sub_entity_type(&self, dim: usize, index: usize) -> Result<CellType, Error> {
        let num_vertices = self.sub_entity_vertices(dim, index)?.len();
        let cell = match (dim, num_vertices) {
            (0, _) => CellType::Point,
            (1, _) => CellType::Interval,
            (2, 3) => CellType::Triangle,
            (2, 4) => CellType::Quadrilateral,
            (3, _) => *self,
            _ => return Err(Error::InvalidEntity { dim, index }),
        };
        Ok(cell)
    }

    /// The volume (length, area) of the reference cell.
    pub fn volume(&self) -> f64 {
        match self {
            CellType::Point => 0.0,
            CellType::Interval | CellType::Quadrilateral | CellType::Hexahedron => 1.0,
            CellType::Triangle | CellType::Prism => 0.5,
            CellType::Tetrahedron => 1.0 / 6.0,
            CellType::Pyramid => 1.0 / 3.0,
        }
    }

    /// The average of the reference vertices.
    pub fn vertex_average(&self) -> Vec<f64> {
        let vertices = self.vertices();
        let n = vertices.len() as f64;
        (0..self.topological_dimension())
            .map(|j| vertices.iter().map(|v| v[j]).sum::<f64>() / n)
            .collect()
    }

    /// Indices of the entity vertices whose offsets from vertex 0 span the entity.
    ///
    /// A point with local coordinates `x` on an entity of this type is placed at
    /// `v_0 + sum_j x_j (v_{axis_j} - v_0)`.
    pub fn axis_vertices(&self) -> Result<&'static [usize], Error> {
        match self {
            CellType::Point => Ok(&[]),
            CellType::Interval => Ok(&[1]),
            CellType::Triangle | CellType::Quadrilateral => Ok(&[1, 2]),
            CellType::Tetrahedron | CellType::Prism => Ok(&[1, 2, 3]),
            CellType::Hexahedron | CellType::Pyramid => Ok(&[1, 2, 4]),
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing an unknown cell name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCellType(pub String);

impl Display for UnknownCellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cell type \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownCellType {}

impl FromStr for CellType {
    type Err = UnknownCellType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellType::ALL
            .iter()
            .find(|cell| cell.name() == s)
            .copied()
            .ok_or_else(|| UnknownCellType(s.to_string()))
    }
}

/// Maps points given in the local coordinates of a sub-entity into the coordinates of the
/// parent cell.
///
/// `entity_geometry` holds the entity vertices in parent coordinates and `local_points` is a
/// `num_points x entity_tdim` matrix.
pub fn map_to_entity(entity_type: CellType, entity_geometry: &DMatrix<f64>, local_points: &DMatrix<f64>) -> Result<DMatrix<f64>, Error> {
    let axes = entity_type.axis_vertices()?;
    let tdim = entity_geometry.ncols();
    if local_points.ncols() != axes.len() {
        return Err(Error::PointDimensionMismatch {
            expected: axes.len(),
            actual: local_points.ncols(),
        });
    }
    let origin = entity_geometry.row(0);
    let mut mapped = DMatrix::zeros(local_points.nrows(), tdim);
    for p in 0..local_points.nrows() {
        for j in 0..tdim {
            let mut x = origin[j];
            for (d, &axis) in axes.iter().enumerate() {
                x += local_points[(p, d)] * (entity_geometry[(axis, j)] - origin[j]);
            }
            mapped[(p, j)] = x;
        }
    }
    Ok(mapped)
}
