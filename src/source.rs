//! Read-only views over the mesh being converted.

use crate::Attribute;
use crate::ElementId;
use crate::ElementKind;
use crate::Error;
use crate::NodeId;
use crate::Owner;
use std::collections::HashMap;
use std::collections::HashSet;

/// The queries the converter makes on the source mesh.
///
/// Blocks, boundaries and the elements they contain must be enumerated in a
/// stable order: target indices are assigned in that order.
pub trait SourceMesh {
    /// Topological dimension of the body elements (2 or 3).
    fn dimension(&self) -> usize;

    /// Number of meaningful coordinates per node, between `dimension()` and
    /// 3. Surface meshes embedded in 3D space return 3.
    fn space_dimension(&self) -> usize {
        self.dimension()
    }

    /// Number of body elements in the mesh.
    fn element_count(&self) -> usize;

    fn block_ids(&self) -> &[Attribute];

    /// Elements of the given block.
    fn block_elements(&self, block: Attribute) -> &[ElementId];

    /// Node ids of the given element, in local node order.
    fn element_nodes(&self, element: ElementId) -> Option<&[NodeId]>;

    fn boundary_ids(&self) -> &[Attribute];

    /// `(element, local side)` pairs of the given boundary.
    fn boundary_sides(&self, boundary: Attribute) -> &[(ElementId, usize)];

    fn coordinates(&self, node: NodeId) -> Option<[f64; 3]>;

    /// Every node id that has coordinates.
    fn node_ids(&self) -> Box<dyn Iterator<Item = NodeId> + '_>;

    /// Partition the element belongs to, for distributed execution.
    fn element_partition(&self, _element: ElementId) -> usize {
        0
    }
}

/// Node ids of all sides of `boundary`, without duplicates, in the order they
/// are first met.
pub fn boundary_node_ids<S>(source: &S, boundary: Attribute) -> Result<Vec<NodeId>, Error>
where
    S: SourceMesh + ?Sized,
{
    let owner = Owner::Boundary(boundary);
    let mut seen = HashSet::new();
    let mut node_ids = Vec::new();
    for &(element, side) in source.boundary_sides(boundary) {
        let nodes = source
            .element_nodes(element)
            .ok_or(Error::MissingElement { element, owner })?;
        let kind = ElementKind::infer(source.dimension(), nodes.len()).ok_or(
            Error::UnknownElementType {
                element,
                dimension: source.dimension(),
                node_count: nodes.len(),
            },
        )?;
        let descriptor = kind.descriptor();
        let side_nodes = descriptor.side_nodes(side).ok_or(Error::InvalidSide {
            boundary,
            element,
            side,
            side_count: descriptor.face_count(),
        })?;
        for local in side_nodes {
            let node = nodes[local];
            if seen.insert(node) {
                node_ids.push(node);
            }
        }
    }
    Ok(node_ids)
}

/// An owned, in-memory source mesh.
///
/// Blocks and boundaries are enumerated in the order they are first used.
#[derive(Clone, Debug, Default)]
pub struct TableSource {
    dimension: usize,
    space_dimension: usize,
    coordinates: HashMap<NodeId, [f64; 3]>,
    node_order: Vec<NodeId>,
    block_ids: Vec<Attribute>,
    blocks: HashMap<Attribute, Vec<ElementId>>,
    element_nodes: HashMap<ElementId, Vec<NodeId>>,
    boundary_ids: Vec<Attribute>,
    boundaries: HashMap<Attribute, Vec<(ElementId, usize)>>,
    partition: HashMap<ElementId, usize>,
}

impl TableSource {
    pub fn new(dimension: usize) -> Self {
        assert!(
            dimension == 2 || dimension == 3,
            "only 2D and 3D meshes are supported",
        );
        TableSource {
            dimension,
            space_dimension: dimension,
            ..Default::default()
        }
    }

    /// # Panics
    ///
    /// This function panics if `space_dimension` is smaller than the mesh
    /// dimension or greater than 3.
    pub fn set_space_dimension(&mut self, space_dimension: usize) -> &mut Self {
        assert!(
            self.dimension <= space_dimension && space_dimension <= 3,
            "space dimension must be between {} and 3",
            self.dimension,
        );
        self.space_dimension = space_dimension;
        self
    }

    /// Register the coordinates of a node. Registering a node twice
    /// overwrites its coordinates.
    pub fn add_node(&mut self, node: NodeId, coordinates: [f64; 3]) -> &mut Self {
        if self.coordinates.insert(node, coordinates).is_none() {
            self.node_order.push(node);
        }
        self
    }

    /// Append an element to a block.
    pub fn add_element(
        &mut self,
        block: Attribute,
        element: ElementId,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> &mut Self {
        if !self.blocks.contains_key(&block) {
            self.block_ids.push(block);
        }
        self.blocks.entry(block).or_default().push(element);
        self.element_nodes
            .insert(element, nodes.into_iter().collect());
        self
    }

    /// Append the side of an element to a boundary.
    pub fn add_side(&mut self, boundary: Attribute, element: ElementId, side: usize) -> &mut Self {
        if !self.boundaries.contains_key(&boundary) {
            self.boundary_ids.push(boundary);
        }
        self.boundaries
            .entry(boundary)
            .or_default()
            .push((element, side));
        self
    }

    pub fn set_partition(&mut self, element: ElementId, part: usize) -> &mut Self {
        self.partition.insert(element, part);
        self
    }
}

impl SourceMesh for TableSource {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn space_dimension(&self) -> usize {
        self.space_dimension
    }

    fn element_count(&self) -> usize {
        self.element_nodes.len()
    }

    fn block_ids(&self) -> &[Attribute] {
        &self.block_ids
    }

    fn block_elements(&self, block: Attribute) -> &[ElementId] {
        self.blocks.get(&block).map_or(&[], Vec::as_slice)
    }

    fn element_nodes(&self, element: ElementId) -> Option<&[NodeId]> {
        self.element_nodes.get(&element).map(Vec::as_slice)
    }

    fn boundary_ids(&self) -> &[Attribute] {
        &self.boundary_ids
    }

    fn boundary_sides(&self, boundary: Attribute) -> &[(ElementId, usize)] {
        self.boundaries.get(&boundary).map_or(&[], Vec::as_slice)
    }

    fn coordinates(&self, node: NodeId) -> Option<[f64; 3]> {
        self.coordinates.get(&node).copied()
    }

    fn node_ids(&self) -> Box<dyn Iterator<Item = NodeId> + '_> {
        Box::new(self.node_order.iter().copied())
    }

    fn element_partition(&self, element: ElementId) -> usize {
        self.partition.get(&element).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> TableSource {
        let mut source = TableSource::new(2);
        for (i, id) in [1, 2, 3, 4, 5, 6].into_iter().enumerate() {
            let x = (i % 3) as f64;
            let y = (i / 3) as f64;
            source.add_node(id, [x, y, 0.0]);
        }
        source
            .add_element(7, 100, [1, 2, 5, 4])
            .add_element(7, 101, [2, 3, 6, 5])
            .add_side(3, 100, 0)
            .add_side(3, 101, 0)
            .add_side(4, 101, 1);
        source
    }

    #[test]
    fn tables_keep_insertion_order() {
        let source = two_quads();
        assert_eq!(source.block_ids(), &[7]);
        assert_eq!(source.block_elements(7), &[100, 101]);
        assert_eq!(source.block_elements(8), &[] as &[ElementId]);
        assert_eq!(source.boundary_ids(), &[3, 4]);
        assert_eq!(source.element_count(), 2);
        assert_eq!(source.node_ids().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(source.element_partition(100), 0);
        assert_eq!(source.space_dimension(), 2);
    }

    #[test]
    fn boundary_nodes_are_deduplicated() {
        let source = two_quads();
        assert_eq!(boundary_node_ids(&source, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(boundary_node_ids(&source, 4).unwrap(), vec![3, 6]);
        assert!(boundary_node_ids(&source, 5).unwrap().is_empty());
    }

    #[test]
    fn boundary_nodes_reject_bad_sides() {
        let mut source = two_quads();
        source.add_side(9, 100, 4);
        assert!(matches!(
            boundary_node_ids(&source, 9),
            Err(Error::InvalidSide { side: 4, .. }),
        ));
    }
}
