//! The target mesh: contiguous vertices, typed elements and an explicit
//! boundary-element table.

use crate::space::FiniteElementSpace;
use crate::Attribute;
use crate::ElementKind;
use crate::Error;
use crate::Geometry;
use crate::Order;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A body element of the target mesh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    vertices: Vec<usize>,
    attribute: Attribute,
}

impl Element {
    /// Kind of the source element, which may be of higher order than the
    /// vertex list.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn geometry(&self) -> Geometry {
        self.kind.descriptor().geometry
    }

    /// Target-format type code.
    pub fn type_code(&self) -> i32 {
        self.geometry().code()
    }

    /// Vertex indices, corners only.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Block the element comes from.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }
}

/// A face (or edge, in 2D) of the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryElement {
    geometry: Geometry,
    vertices: Vec<usize>,
    attribute: Attribute,
}

impl BoundaryElement {
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn type_code(&self) -> i32 {
        self.geometry.code()
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Boundary id of the face.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }
}

/// Unique edges of the mesh, and the edges of each element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeTable {
    edges: Vec<[usize; 2]>,
    offsets: Vec<usize>,
    element_edges: Vec<usize>,
}

impl EdgeTable {
    fn new(elements: &[Element]) -> Self {
        let mut index: HashMap<[usize; 2], usize> = HashMap::new();
        let mut edges = Vec::new();
        let mut offsets = Vec::with_capacity(elements.len() + 1);
        let mut element_edges = Vec::new();
        offsets.push(0);
        for element in elements {
            for &[a, b] in element.kind.descriptor().edges() {
                let (a, b) = (element.vertices[a], element.vertices[b]);
                let key = [usize::min(a, b), usize::max(a, b)];
                let edge = match index.entry(key) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        edges.push(key);
                        *entry.insert(edges.len() - 1)
                    }
                };
                element_edges.push(edge);
            }
            offsets.push(element_edges.len());
        }
        EdgeTable {
            edges,
            offsets,
            element_edges,
        }
    }

    /// Vertex pairs of the edges, smallest index first.
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Edge indices of an element, in the local edge order of its kind.
    pub fn element_edges(&self, element: usize) -> &[usize] {
        &self.element_edges[self.offsets[element]..self.offsets[element + 1]]
    }
}

/// Second-order nodes of a quadratic mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticNodes {
    pub space: FiniteElementSpace,
    /// Coordinates of every dof of `space`.
    pub coordinates: Vec<[f64; 3]>,
    /// Node indices of each element, in the local order of its quadratic
    /// kind, as resolved from the source node ids.
    pub element_nodes: Vec<Vec<usize>>,
}

/// The converted mesh. Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetMesh {
    dimension: usize,
    space_dimension: usize,
    vertices: Vec<[f64; 3]>,
    elements: Vec<Element>,
    boundary: Vec<BoundaryElement>,
    edges: Option<EdgeTable>,
    quadratic: Option<QuadraticNodes>,
}

impl TargetMesh {
    /// Topological dimension of the elements.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of meaningful coordinates per vertex, at least
    /// [TargetMesh::dimension].
    pub fn space_dimension(&self) -> usize {
        self.space_dimension
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn boundary_elements(&self) -> &[BoundaryElement] {
        &self.boundary
    }

    pub fn boundary_element_count(&self) -> usize {
        self.boundary.len()
    }

    /// Present iff edge generation was requested.
    pub fn edges(&self) -> Option<&EdgeTable> {
        self.edges.as_ref()
    }

    pub fn order(&self) -> Order {
        if self.quadratic.is_some() {
            Order::Quadratic
        } else {
            Order::Linear
        }
    }

    pub fn quadratic_nodes(&self) -> Option<&QuadraticNodes> {
        self.quadratic.as_ref()
    }

    /// Coordinates of all nodes: the vertices of a linear mesh, or every dof
    /// of a quadratic one.
    pub fn nodes(&self) -> &[[f64; 3]] {
        match &self.quadratic {
            Some(quadratic) => &quadratic.coordinates,
            None => &self.vertices,
        }
    }

    /// Node indices of an element, higher-order nodes included.
    pub fn element_nodes(&self, element: usize) -> &[usize] {
        match &self.quadratic {
            Some(quadratic) => &quadratic.element_nodes[element],
            None => &self.elements[element].vertices,
        }
    }

    /// The same mesh with second-order nodes.
    pub fn with_quadratic_nodes(self, quadratic: QuadraticNodes) -> TargetMesh {
        debug_assert_eq!(quadratic.space.element_count(), self.elements.len());
        debug_assert_eq!(quadratic.element_nodes.len(), self.elements.len());
        TargetMesh {
            quadratic: Some(quadratic),
            ..self
        }
    }
}

/// Accumulates the parts of a [TargetMesh].
///
/// Vertices, elements and boundary elements are appended in the order they
/// are given; [MeshBuilder::finalize] checks the topology and locks it.
#[derive(Debug)]
pub struct MeshBuilder {
    dimension: usize,
    space_dimension: usize,
    vertices: Vec<[f64; 3]>,
    elements: Vec<Element>,
    boundary: Vec<BoundaryElement>,
    generate_edges: bool,
}

impl MeshBuilder {
    pub fn new(dimension: usize) -> Self {
        MeshBuilder {
            dimension,
            space_dimension: dimension,
            vertices: Vec::new(),
            elements: Vec::new(),
            boundary: Vec::new(),
            generate_edges: false,
        }
    }

    pub fn with_capacity(
        dimension: usize,
        vertex_count: usize,
        element_count: usize,
        boundary_count: usize,
    ) -> Self {
        MeshBuilder {
            dimension,
            space_dimension: dimension,
            vertices: Vec::with_capacity(vertex_count),
            elements: Vec::with_capacity(element_count),
            boundary: Vec::with_capacity(boundary_count),
            generate_edges: false,
        }
    }

    /// # Panics
    ///
    /// This function panics if `space_dimension` is smaller than the
    /// dimension of the elements or greater than 3.
    pub fn set_space_dimension(&mut self, space_dimension: usize) {
        assert!(self.dimension <= space_dimension && space_dimension <= 3);
        self.space_dimension = space_dimension;
    }

    /// Returns the index of the new vertex.
    pub fn add_vertex(&mut self, coordinates: [f64; 3]) -> usize {
        self.vertices.push(coordinates);
        self.vertices.len() - 1
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn add_element(&mut self, kind: ElementKind, vertices: Vec<usize>, attribute: Attribute) {
        debug_assert_eq!(vertices.len(), kind.descriptor().corner_count);
        self.elements.push(Element {
            kind,
            vertices,
            attribute,
        });
    }

    pub fn add_boundary_element(
        &mut self,
        geometry: Geometry,
        vertices: Vec<usize>,
        attribute: Attribute,
    ) {
        debug_assert_eq!(vertices.len(), geometry.vertex_count());
        self.boundary.push(BoundaryElement {
            geometry,
            vertices,
            attribute,
        });
    }

    /// Build the edge table on finalization.
    pub fn generate_edges(&mut self, yes: bool) {
        self.generate_edges = yes;
    }

    /// Check that every element refers to existing vertices and lock the
    /// topology.
    pub fn finalize(self) -> Result<TargetMesh, Error> {
        let vertex_count = self.vertices.len();
        let elements = self
            .elements
            .iter()
            .map(|e| (false, &e.vertices))
            .chain(self.boundary.iter().map(|b| (true, &b.vertices)));
        let mut counts = [0, 0];
        for (boundary, vertices) in elements {
            let element = counts[boundary as usize];
            counts[boundary as usize] += 1;
            if let Some(&vertex) = vertices.iter().find(|&&v| v >= vertex_count) {
                return Err(Error::VertexOutOfBounds {
                    vertex,
                    vertex_count,
                    element,
                    boundary,
                });
            }
        }

        let edges = if self.generate_edges {
            let edges = EdgeTable::new(&self.elements);
            tracing::debug!(edges = edges.edges().len(), "generated edges");
            Some(edges)
        } else {
            None
        };

        Ok(TargetMesh {
            dimension: self.dimension,
            space_dimension: self.space_dimension,
            vertices: self.vertices,
            elements: self.elements,
            boundary: self.boundary,
            edges,
            quadratic: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshBuilder {
        let mut builder = MeshBuilder::new(2);
        builder.add_vertex([0.0, 0.0, 0.0]);
        builder.add_vertex([1.0, 0.0, 0.0]);
        builder.add_vertex([0.0, 1.0, 0.0]);
        builder.add_element(ElementKind::Tri3, vec![0, 1, 2], 1);
        builder.add_boundary_element(Geometry::Segment, vec![0, 1], 5);
        builder
    }

    #[test]
    fn finalize_keeps_everything() {
        let mesh = triangle().finalize().unwrap();
        assert_eq!(mesh.dimension(), 2);
        assert_eq!(mesh.space_dimension(), 2);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.element_count(), 1);
        assert_eq!(mesh.elements()[0].type_code(), Geometry::Triangle.code());
        assert_eq!(mesh.elements()[0].attribute(), 1);
        assert_eq!(mesh.boundary_elements()[0].geometry(), Geometry::Segment);
        assert_eq!(mesh.boundary_elements()[0].attribute(), 5);
        assert_eq!(mesh.order(), Order::Linear);
        assert_eq!(mesh.element_nodes(0), &[0, 1, 2]);
        assert!(mesh.edges().is_none());
    }

    #[test]
    fn out_of_bounds_vertices_are_rejected() {
        let mut builder = triangle();
        builder.add_boundary_element(Geometry::Segment, vec![2, 3], 5);
        match builder.finalize() {
            Err(Error::VertexOutOfBounds {
                vertex: 3,
                vertex_count: 3,
                element: 1,
                boundary: true,
            }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn edge_table() {
        let mut builder = triangle();
        builder.add_vertex([1.0, 1.0, 0.0]);
        builder.add_element(ElementKind::Tri3, vec![1, 3, 2], 1);
        builder.generate_edges(true);
        let mesh = builder.finalize().unwrap();
        let edges = mesh.edges().unwrap();
        assert_eq!(edges.edges(), &[[0, 1], [1, 2], [0, 2], [1, 3], [2, 3]]);
        assert_eq!(edges.element_edges(0), &[0, 1, 2]);
        assert_eq!(edges.element_edges(1), &[3, 4, 1]);
    }
}
