//! Degrees of freedom attached to the elements of a target mesh.

use crate::mesh::TargetMesh;
use crate::Order;
use crate::Support;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Mesh entity a second-order dof is attached to, in global vertex indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Entity {
    Edge([usize; 2]),
    Face(Vec<usize>),
    Interior(usize),
}

/// H1-conforming finite-element space of order 1 or 2.
///
/// Vertex dofs share the vertex numbering. Higher-order dofs are numbered
/// after them, in the order their entity is first met while walking the
/// elements. Dofs of an element are listed in the local node order of the
/// element kind at the space order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiniteElementSpace {
    order: Order,
    dof_count: usize,
    offsets: Vec<usize>,
    dofs: Vec<usize>,
}

impl FiniteElementSpace {
    pub fn linear(mesh: &TargetMesh) -> Self {
        let mut offsets = Vec::with_capacity(mesh.element_count() + 1);
        let mut dofs = Vec::new();
        offsets.push(0);
        for element in mesh.elements() {
            dofs.extend_from_slice(element.vertices());
            offsets.push(dofs.len());
        }
        FiniteElementSpace {
            order: Order::Linear,
            dof_count: mesh.vertex_count(),
            offsets,
            dofs,
        }
    }

    pub fn quadratic(mesh: &TargetMesh) -> Self {
        let mut entity_dofs: HashMap<Entity, usize> = HashMap::new();
        let mut dof_count = mesh.vertex_count();
        let mut offsets = Vec::with_capacity(mesh.element_count() + 1);
        let mut dofs = Vec::new();
        offsets.push(0);

        for (e, element) in mesh.elements().iter().enumerate() {
            let vertices = element.vertices();
            let descriptor = element.kind().with_order(Order::Quadratic).descriptor();
            dofs.extend_from_slice(vertices);
            for support in descriptor.higher_order_nodes() {
                let entity = match *support {
                    Support::Edge(a, b) => {
                        let (a, b) = (vertices[a], vertices[b]);
                        Entity::Edge([usize::min(a, b), usize::max(a, b)])
                    }
                    Support::Face(side) => {
                        let mut face: Vec<usize> = descriptor.faces()[side]
                            .iter()
                            .map(|&c| vertices[c])
                            .collect();
                        face.sort_unstable();
                        Entity::Face(face)
                    }
                    Support::Interior => Entity::Interior(e),
                };
                let dof = match entity_dofs.entry(entity) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        dof_count += 1;
                        *entry.insert(dof_count - 1)
                    }
                };
                dofs.push(dof);
            }
            offsets.push(dofs.len());
        }

        tracing::debug!(
            vertices = mesh.vertex_count(),
            dofs = dof_count,
            "built quadratic space",
        );

        FiniteElementSpace {
            order: Order::Quadratic,
            dof_count,
            offsets,
            dofs,
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn dof_count(&self) -> usize {
        self.dof_count
    }

    pub fn element_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// # Panics
    ///
    /// This function will panic iff `element` is greater or equal to the
    /// number of elements.
    pub fn element_dofs(&self, element: usize) -> &[usize] {
        &self.dofs[self.offsets[element]..self.offsets[element + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;
    use crate::ElementKind;

    /// Two unit squares side by side, sharing the edge 1-4.
    fn two_squares() -> TargetMesh {
        let mut builder = MeshBuilder::new(2);
        for [x, y] in [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]] {
            builder.add_vertex([x, y, 0.0]);
        }
        builder.add_element(ElementKind::Quad4, vec![0, 1, 4, 3], 1);
        builder.add_element(ElementKind::Quad4, vec![1, 2, 5, 4], 1);
        builder.finalize().unwrap()
    }

    #[test]
    fn linear_space_is_the_vertex_numbering() {
        let mesh = two_squares();
        let space = FiniteElementSpace::linear(&mesh);
        assert_eq!(space.order(), Order::Linear);
        assert_eq!(space.dof_count(), 6);
        assert_eq!(space.element_dofs(1), &[1, 2, 5, 4]);
    }

    #[test]
    fn quadratic_space_shares_edge_dofs() {
        let mesh = two_squares();
        let space = FiniteElementSpace::quadratic(&mesh);
        // 6 vertices, 7 edges, 2 interiors.
        assert_eq!(space.dof_count(), 15);
        assert_eq!(space.element_count(), 2);
        assert_eq!(space.element_dofs(0), &[0, 1, 4, 3, 6, 7, 8, 9, 10]);
        // Edge 1-4 is the second edge of the first square and the last edge
        // of the second one.
        assert_eq!(space.element_dofs(1), &[1, 2, 5, 4, 11, 12, 13, 7, 14]);
    }

    #[test]
    fn hexahedra_share_face_dofs() {
        let mut builder = MeshBuilder::new(3);
        for i in 0..12 {
            let x = (i % 3) as f64;
            let y = ((i / 3) % 2) as f64;
            let z = (i / 6) as f64;
            builder.add_vertex([x, y, z]);
        }
        builder.add_element(ElementKind::Hex8, vec![0, 1, 4, 3, 6, 7, 10, 9], 1);
        builder.add_element(ElementKind::Hex8, vec![1, 2, 5, 4, 7, 8, 11, 10], 1);
        let mesh = builder.finalize().unwrap();
        let space = FiniteElementSpace::quadratic(&mesh);
        // 12 vertices, 20 edges, 11 faces, 2 interiors.
        assert_eq!(space.dof_count(), 45);
        let first = space.element_dofs(0);
        let second = space.element_dofs(1);
        assert_eq!(first.len(), 27);
        // Side 2 of the first hexahedron is side 4 of the second one.
        assert_eq!(first[20 + 2], second[20 + 4]);
    }
}
