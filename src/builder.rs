use crate::mesh::MeshBuilder;
use crate::mesh::QuadraticNodes;
use crate::mesh::TargetMesh;
use crate::resolver;
use crate::resolver::NodeIdentityMap;
use crate::resolver::VerifyOptions;
use crate::space::FiniteElementSpace;
use crate::Attribute;
use crate::ElementId;
use crate::ElementKind;
use crate::Error;
use crate::NodeId;
use crate::Order;
use crate::Owner;
use crate::SourceMesh;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Settings of [convert].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConvertOptions {
    /// Build the edge table of the target mesh.
    pub generate_edges: bool,
    pub verify: VerifyOptions,
}

/// Result of a successful conversion.
#[derive(Clone, Debug)]
pub struct Conversion {
    mesh: TargetMesh,
    nodes: NodeIdentityMap,
    element_ids: Vec<ElementId>,
    partitioning: Vec<usize>,
}

impl Conversion {
    pub fn mesh(&self) -> &TargetMesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> TargetMesh {
        self.mesh
    }

    /// Source node id to target index map, to carry field data back to the
    /// source mesh.
    pub fn node_map(&self) -> &NodeIdentityMap {
        &self.nodes
    }

    /// Source element id of each target element.
    pub fn element_ids(&self) -> &[ElementId] {
        &self.element_ids
    }

    /// Partition of each target element.
    pub fn partitioning(&self) -> &[usize] {
        &self.partitioning
    }
}

/// A body element that passed validation.
#[derive(Debug)]
struct Classified<'a> {
    element: ElementId,
    block: Attribute,
    kind: ElementKind,
    nodes: &'a [NodeId],
}

/// The source mesh, checked and classified.
#[derive(Debug)]
struct Validated<'a> {
    elements: Vec<Classified<'a>>,
    /// Position of each element in `elements`.
    positions: HashMap<ElementId, usize>,
    order: Order,
    side_count: usize,
}

/// Check every element and every side of the source mesh before building
/// anything.
fn validate<S>(source: &S) -> Result<Validated<'_>, Error>
where
    S: SourceMesh + ?Sized,
{
    let dimension = source.dimension();
    let mut elements = Vec::with_capacity(source.element_count());
    let mut positions = HashMap::with_capacity(source.element_count());
    let mut order = None;

    for &block in source.block_ids() {
        for &element in source.block_elements(block) {
            let nodes = source.element_nodes(element).ok_or(Error::MissingElement {
                element,
                owner: Owner::Block(block),
            })?;
            let kind = ElementKind::infer(dimension, nodes.len()).ok_or(
                Error::UnknownElementType {
                    element,
                    dimension,
                    node_count: nodes.len(),
                },
            )?;
            match order {
                None => order = Some(kind.order()),
                Some(expected) if expected != kind.order() => {
                    return Err(Error::MixedOrder {
                        element,
                        expected,
                        actual: kind.order(),
                    });
                }
                Some(_) => {}
            }
            if let Some(&node) = nodes
                .iter()
                .find(|&&node| source.coordinates(node).is_none())
            {
                return Err(Error::MissingCoordinates {
                    node,
                    owner: Owner::Element(element),
                });
            }
            match positions.entry(element) {
                Entry::Occupied(entry) => {
                    let first: &Classified<'_> = &elements[*entry.get()];
                    return Err(Error::DuplicateElement {
                        element,
                        first: first.block,
                        second: block,
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(elements.len());
                }
            }
            elements.push(Classified {
                element,
                block,
                kind,
                nodes,
            });
        }
    }

    if elements.len() != source.element_count() {
        return Err(Error::ElementCountMismatch {
            expected: source.element_count(),
            actual: elements.len(),
        });
    }

    let mut side_count = 0;
    for &boundary in source.boundary_ids() {
        for &(element, side) in source.boundary_sides(boundary) {
            let position = *positions.get(&element).ok_or(Error::MissingElement {
                element,
                owner: Owner::Boundary(boundary),
            })?;
            let descriptor = elements[position].kind.descriptor();
            if descriptor.face(side).is_none() {
                return Err(Error::InvalidSide {
                    boundary,
                    element,
                    side,
                    side_count: descriptor.face_count(),
                });
            }
            side_count += 1;
        }
    }

    Ok(Validated {
        elements,
        positions,
        order: order.unwrap_or(Order::Linear),
        side_count,
    })
}

fn vertex_indices<I>(map: &NodeIdentityMap, nodes: I, owner: Owner) -> Result<Vec<usize>, Error>
where
    I: IntoIterator<Item = NodeId>,
{
    nodes
        .into_iter()
        .map(|node| {
            map.vertex_index(node)
                .ok_or(Error::UnmappedNode { node, owner })
        })
        .collect()
}

/// Vertices, elements and boundary elements, in source order.
fn build_linear<S>(
    source: &S,
    validated: &Validated<'_>,
    map: &NodeIdentityMap,
    options: &ConvertOptions,
) -> Result<TargetMesh, Error>
where
    S: SourceMesh + ?Sized,
{
    let mut builder = MeshBuilder::with_capacity(
        source.dimension(),
        map.vertex_count(),
        validated.elements.len(),
        validated.side_count,
    );
    builder.set_space_dimension(usize::clamp(source.space_dimension(), source.dimension(), 3));

    for (index, &node) in map.corner_nodes().iter().enumerate() {
        let coordinates = source.coordinates(node).ok_or(Error::MissingCoordinates {
            node,
            owner: Owner::Vertex(index),
        })?;
        builder.add_vertex(coordinates);
    }

    for classified in &validated.elements {
        let corner_count = classified.kind.descriptor().corner_count;
        let vertices = vertex_indices(
            map,
            classified.nodes[..corner_count].iter().copied(),
            Owner::Element(classified.element),
        )?;
        builder.add_element(classified.kind, vertices, classified.block);
    }

    for &boundary in source.boundary_ids() {
        for &(element, side) in source.boundary_sides(boundary) {
            let classified = &validated.elements[validated.positions[&element]];
            let descriptor = classified.kind.descriptor();
            let face = descriptor.face(side).ok_or(Error::InvalidSide {
                boundary,
                element,
                side,
                side_count: descriptor.face_count(),
            })?;
            let vertices = vertex_indices(
                map,
                face.iter().map(|&local| classified.nodes[local]),
                Owner::Boundary(boundary),
            )?;
            builder.add_boundary_element(descriptor.face_geometry, vertices, boundary);
        }
    }

    builder.generate_edges(options.generate_edges);
    builder.finalize()
}

/// Turn a linear mesh into a quadratic one, numbering the midside nodes and
/// checking them against the finite-element space.
fn upgrade_quadratic<S>(
    mesh: TargetMesh,
    source: &S,
    validated: &Validated<'_>,
    map: NodeIdentityMap,
    options: VerifyOptions,
) -> Result<(TargetMesh, NodeIdentityMap), Error>
where
    S: SourceMesh + ?Sized,
{
    let space = FiniteElementSpace::quadratic(&mesh);

    let map = map.assign_second_order_indices(
        validated
            .elements
            .iter()
            .map(|c| (c.nodes, c.kind.descriptor().corner_count)),
    );
    tracing::debug!(
        vertices = map.vertex_count(),
        nodes = map.node_count(),
        "assigned second-order indices",
    );

    let element_nodes = validated
        .elements
        .iter()
        .map(|c| {
            c.nodes
                .iter()
                .map(|&node| {
                    map.node_index(node).ok_or(Error::UnmappedNode {
                        node,
                        owner: Owner::Element(c.element),
                    })
                })
                .collect::<Result<Vec<usize>, Error>>()
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let coordinates: Vec<[f64; 3]> = (0..space.dof_count())
        .map(|dof| {
            map.source_node(dof)
                .and_then(|node| source.coordinates(node))
                .unwrap_or([f64::NAN; 3])
        })
        .collect();

    let element_ids: Vec<ElementId> = validated.elements.iter().map(|c| c.element).collect();
    let report = resolver::verify(&space, source, &element_ids, &map, &coordinates, options);
    if !report.is_empty() {
        tracing::warn!(discrepancies = report.len(), "{report}");
        return Err(Error::Consistency(report));
    }

    let mesh = mesh.with_quadratic_nodes(QuadraticNodes {
        space,
        coordinates,
        element_nodes,
    });
    Ok((mesh, map))
}

/// Convert a source mesh into a target mesh.
///
/// Vertices are numbered in the order their node is first met when walking
/// the blocks, elements in block order, boundary elements in boundary order.
/// Quadratic meshes get their midside nodes numbered after all vertices, and
/// the resulting mapping is verified.
pub fn convert<S>(source: &S, options: &ConvertOptions) -> Result<Conversion, Error>
where
    S: SourceMesh + ?Sized,
{
    let span = tracing::info_span!("convert");
    let _enter = span.enter();

    let validated = validate(source)?;
    tracing::info!(
        elements = validated.elements.len(),
        boundary_faces = validated.side_count,
        order = %validated.order,
        "validated source mesh",
    );

    let map = NodeIdentityMap::assign_vertex_indices(validated.elements.iter().flat_map(|c| {
        c.nodes[..c.kind.descriptor().corner_count].iter().copied()
    }));

    let mesh = {
        let span = tracing::info_span!("build linear mesh");
        let _enter = span.enter();
        build_linear(source, &validated, &map, options)?
    };
    tracing::info!(vertices = mesh.vertex_count(), "built linear mesh");

    let (mesh, map) = match validated.order {
        Order::Linear => (mesh, map),
        Order::Quadratic => {
            let span = tracing::info_span!("upgrade to quadratic");
            let _enter = span.enter();
            upgrade_quadratic(mesh, source, &validated, map, options.verify)?
        }
    };

    let element_ids: Vec<ElementId> = validated.elements.iter().map(|c| c.element).collect();
    let partitioning = element_ids
        .iter()
        .map(|&element| source.element_partition(element))
        .collect();

    Ok(Conversion {
        mesh,
        nodes: map,
        element_ids,
        partitioning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::Geometry;
    use crate::TableSource;

    fn unit_square(nodes: [NodeId; 4]) -> TableSource {
        let mut source = TableSource::new(2);
        let points = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (node, [x, y]) in nodes.into_iter().zip(points) {
            source.add_node(node, [x, y, 0.0]);
        }
        source.add_element(2, 40, nodes);
        source
    }

    #[test]
    fn boundary_faces_follow_the_side_table() {
        let mut source = unit_square([7, 3, 9, 1]);
        source.add_side(11, 40, 2).add_side(12, 40, 3);
        let conversion = convert(&source, &ConvertOptions::default()).unwrap();
        let mesh = conversion.mesh();
        assert_eq!(mesh.elements()[0].vertices(), &[0, 1, 2, 3]);
        let boundary = mesh.boundary_elements();
        assert_eq!(boundary.len(), 2);
        assert_eq!(boundary[0].vertices(), &[2, 3]);
        assert_eq!(boundary[0].geometry(), Geometry::Segment);
        assert_eq!(boundary[1].vertices(), &[3, 0]);
        assert_eq!(boundary[1].attribute(), 12);
        assert_eq!(conversion.element_ids(), &[40]);
        assert_eq!(conversion.partitioning(), &[0]);
    }

    #[test]
    fn unknown_element_type() {
        let mut source = unit_square([1, 2, 3, 4]);
        source.add_node(5, [0.5, 0.5, 0.0]);
        source.add_element(2, 41, [1, 2, 3, 4, 5]);
        let err = convert(&source, &ConvertOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(
            err,
            Error::UnknownElementType {
                element: 41,
                dimension: 2,
                node_count: 5,
            },
        ));
    }

    #[test]
    fn mixed_orders_are_rejected() {
        let mut source = unit_square([1, 2, 3, 4]);
        for node in 5..10 {
            source.add_node(node, [node as f64, 0.0, 0.0]);
        }
        source.add_element(2, 41, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let err = convert(&source, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MixedOrder {
                element: 41,
                expected: Order::Linear,
                actual: Order::Quadratic,
            },
        ));
    }

    #[test]
    fn bad_sides_are_rejected() {
        let mut source = unit_square([1, 2, 3, 4]);
        source.add_side(3, 40, 4);
        let err = convert(&source, &ConvertOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let mut source = unit_square([1, 2, 3, 4]);
        source.add_side(3, 99, 0);
        let err = convert(&source, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingElement {
                element: 99,
                owner: Owner::Boundary(3),
            },
        ));
    }

    #[test]
    fn elements_listed_twice() {
        let mut source = unit_square([1, 2, 3, 4]);
        source.add_element(6, 40, [1, 2, 3, 4]);
        let err = convert(&source, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateElement {
                element: 40,
                first: 2,
                second: 6,
            },
        ));
    }

    #[test]
    fn partition_tags_follow_target_order() {
        let mut source = unit_square([1, 2, 3, 4]);
        source.add_node(5, [2.0, 0.0, 0.0]).add_node(6, [2.0, 1.0, 0.0]);
        source.add_element(1, 50, [2, 5, 6, 3]);
        source.set_partition(50, 3).set_partition(40, 1);
        let conversion = convert(&source, &ConvertOptions::default()).unwrap();
        assert_eq!(conversion.element_ids(), &[40, 50]);
        assert_eq!(conversion.partitioning(), &[1, 3]);
    }

    #[test]
    fn edges_on_request() {
        let source = unit_square([1, 2, 3, 4]);
        let options = ConvertOptions {
            generate_edges: true,
            ..ConvertOptions::default()
        };
        let conversion = convert(&source, &options).unwrap();
        assert_eq!(conversion.mesh().edges().unwrap().edges().len(), 4);
    }

    #[test]
    fn empty_mesh() {
        let source = TableSource::new(3);
        let conversion = convert(&source, &ConvertOptions::default()).unwrap();
        assert_eq!(conversion.mesh().vertex_count(), 0);
        assert_eq!(conversion.mesh().element_count(), 0);
        assert_eq!(conversion.mesh().order(), Order::Linear);
    }
}
