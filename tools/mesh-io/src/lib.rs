//! Reading and writing of the mesh files handled by meshport.
//!
//! - [medit]: the ASCII Medit format, as described by Frey in
//!   [MEDIT : An interactive Mesh visualization Software](https://hal.inria.fr/inria-00069921),
//! - [partition]: one part id per element, in a small binary format.

use itertools::Itertools as _;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

pub mod medit;
pub mod partition;

/// Integer tag attached to nodes and elements.
pub type Ref = isize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Vertex,
    Edge,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl ElementType {
    pub fn dimension(self) -> usize {
        match self {
            ElementType::Vertex => 0,
            ElementType::Edge => 1,
            ElementType::Triangle | ElementType::Quadrilateral => 2,
            ElementType::Tetrahedron | ElementType::Hexahedron => 3,
        }
    }

    pub fn node_count(self) -> usize {
        match self {
            ElementType::Vertex => 1,
            ElementType::Edge => 2,
            ElementType::Triangle => 3,
            ElementType::Quadrilateral | ElementType::Tetrahedron => 4,
            ElementType::Hexahedron => 8,
        }
    }
}

/// A mesh as stored in a file: node coordinates and refs, and one list of
/// elements per element type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub(crate) dimension: usize,
    pub(crate) coordinates: Vec<f64>,
    pub(crate) node_refs: Vec<Ref>,
    pub(crate) topology: Vec<(ElementType, Vec<usize>, Vec<Ref>)>,
}

impl Mesh {
    /// # Panics
    ///
    /// This function panics if the lengths of the arrays do not agree with
    /// the dimension and the element types.
    pub fn from_raw_parts(
        dimension: usize,
        coordinates: Vec<f64>,
        node_refs: Vec<Ref>,
        topology: Vec<(ElementType, Vec<usize>, Vec<Ref>)>,
    ) -> Self {
        assert_ne!(dimension, 0);
        assert_eq!(coordinates.len(), dimension * node_refs.len());
        for (el_type, el_nodes, el_refs) in &topology {
            assert_eq!(el_nodes.len(), el_refs.len() * el_type.node_count());
        }
        Self {
            dimension,
            coordinates,
            node_refs,
            topology,
        }
    }

    /// Read a Medit mesh file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Mesh, medit::ParseError> {
        let file = fs::File::open(path)?;
        Mesh::from_reader(io::BufReader::new(file))
    }

    /// Read a Medit mesh from a stream of bytes.
    pub fn from_reader(r: impl io::BufRead) -> Result<Mesh, medit::ParseError> {
        medit::parse_ascii(r)
    }

    /// Dimension of the space the nodes live in.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Coordinates of all nodes, one after the other: `[x1, y1, x2, y2, ...]`.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn node_refs(&self) -> &[Ref] {
        &self.node_refs
    }

    pub fn node(&self, idx: usize) -> &[f64] {
        &self.coordinates[idx * self.dimension..(idx + 1) * self.dimension]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&[f64], Ref)> {
        self.coordinates
            .chunks_exact(self.dimension)
            .zip(self.node_refs.iter().cloned())
    }

    pub fn node_count(&self) -> usize {
        self.node_refs.len()
    }

    /// Element lists, one per element type.
    pub fn topology(&self) -> &[(ElementType, Vec<usize>, Vec<Ref>)] {
        &self.topology
    }

    /// All elements: their type, their node indices and their ref.
    pub fn elements(&self) -> impl Iterator<Item = (ElementType, &[usize], Ref)> {
        self.topology
            .iter()
            .flat_map(|(element_type, nodes, refs)| {
                nodes
                    .chunks_exact(element_type.node_count())
                    .zip(refs)
                    .map(|(node_chunk, element_ref)| (*element_type, node_chunk, *element_ref))
            })
    }

    pub fn element_count(&self) -> usize {
        self.topology.iter().map(|(_, _, refs)| refs.len()).sum()
    }

    /// Highest dimension among the elements, if any.
    pub fn element_dimension(&self) -> Option<usize> {
        self.topology
            .iter()
            .map(|(element_type, _, _)| element_type.dimension())
            .max()
    }

    /// Smallest and largest coordinate along each axis.
    pub fn bounding_box(&self) -> Vec<(f64, f64)> {
        (0..self.dimension)
            .filter_map(|axis| {
                self.coordinates
                    .iter()
                    .cloned()
                    .skip(axis)
                    .step_by(self.dimension)
                    .minmax()
                    .into_option()
            })
            .collect()
    }

    /// Split each edge, triangle and quadrilateral in smaller elements of the
    /// same type, adding one node in the middle of each edge and of each
    /// quadrilateral.
    ///
    /// Returns `None` when the mesh holds elements that cannot be split this
    /// way (tetrahedra, hexahedra).
    pub fn refine(&self) -> Option<Mesh> {
        if self
            .topology
            .iter()
            .any(|(element_type, _, _)| element_type.dimension() > 2)
        {
            return None;
        }

        let dimension = self.dimension;
        let mut middles: HashMap<(usize, usize), usize> = HashMap::new();
        let mut coordinates = self.coordinates.clone();
        let mut node_refs = self.node_refs.clone();
        let mut middle = |p0: usize, p1: usize| -> usize {
            let key = (usize::min(p0, p1), usize::max(p0, p1));
            *middles.entry(key).or_insert_with(|| {
                let id = node_refs.len();
                node_refs.push((node_refs[p0] + node_refs[p1]) / 2);
                for axis in 0..dimension {
                    let m = (coordinates[p0 * dimension + axis]
                        + coordinates[p1 * dimension + axis])
                        / 2.0;
                    coordinates.push(m);
                }
                id
            })
        };

        let mut topology = Vec::with_capacity(self.topology.len());
        for (element_type, nodes, refs) in &self.topology {
            let chunk = element_type.node_count();
            let mut new_nodes = Vec::with_capacity(4 * nodes.len());
            let mut new_refs = Vec::with_capacity(4 * refs.len());
            for (element, &element_ref) in nodes.chunks_exact(chunk).zip(refs) {
                let pieces = match *element {
                    [v] => {
                        new_nodes.push(v);
                        1
                    }
                    [v0, v1] => {
                        let m = middle(v0, v1);
                        new_nodes.extend_from_slice(&[v0, m, m, v1]);
                        2
                    }
                    [v0, v1, v2] => {
                        let m01 = middle(v0, v1);
                        let m12 = middle(v1, v2);
                        let m20 = middle(v2, v0);
                        new_nodes.extend_from_slice(&[v0, m01, m20]);
                        new_nodes.extend_from_slice(&[m01, v1, m12]);
                        new_nodes.extend_from_slice(&[m20, m12, v2]);
                        new_nodes.extend_from_slice(&[m01, m12, m20]);
                        4
                    }
                    [v0, v1, v2, v3] => {
                        let m01 = middle(v0, v1);
                        let m12 = middle(v1, v2);
                        let m23 = middle(v2, v3);
                        let m30 = middle(v3, v0);
                        let center = middle(m01, m23);
                        new_nodes.extend_from_slice(&[v0, m01, center, m30]);
                        new_nodes.extend_from_slice(&[m01, v1, m12, center]);
                        new_nodes.extend_from_slice(&[center, m12, v2, m23]);
                        new_nodes.extend_from_slice(&[m30, center, m23, v3]);
                        4
                    }
                    _ => unreachable!("elements of dimension 3 are rejected above"),
                };
                new_refs.extend(std::iter::repeat(element_ref).take(pieces));
            }
            topology.push((*element_type, new_nodes, new_refs));
        }

        Some(Mesh {
            dimension,
            coordinates,
            node_refs,
            topology,
        })
    }
}
