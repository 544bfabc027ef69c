//! Conversion of meshes stored in Medit files.

use crate::builder::Conversion;
use crate::builder::ConvertOptions;
use crate::convert;
use crate::Attribute;
use crate::ElementId;
use crate::ElementKind;
use crate::Error;
use crate::Geometry;
use crate::NodeId;
use crate::TableSource;
use mesh_io::ElementType;
use nalgebra::Matrix3;
use nalgebra::Vector3;
use std::collections::HashMap;
use std::io;
use std::path::Path;

type Point3D = Vector3<f64>;

/// Settings of [convert_file] and [convert_reader].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileOptions {
    /// Build the edge table of the target mesh.
    pub generate_edges: bool,
    /// Number of uniform refinement passes applied before conversion.
    pub refine: usize,
    /// Reorder the nodes of inverted elements.
    pub fix_orientation: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        FileOptions {
            generate_edges: false,
            refine: 0,
            fix_orientation: true,
        }
    }
}

/// Convert the Medit mesh stored at `path`.
pub fn convert_file(path: impl AsRef<Path>, options: &FileOptions) -> Result<Conversion, Error> {
    let mesh = {
        let span = tracing::info_span!("read mesh");
        let _enter = span.enter();
        mesh_io::Mesh::from_file(path)?
    };
    convert_medit(mesh, options)
}

/// Convert the Medit mesh read from `reader`.
pub fn convert_reader<R: io::BufRead>(reader: R, options: &FileOptions) -> Result<Conversion, Error> {
    let mesh = {
        let span = tracing::info_span!("read mesh");
        let _enter = span.enter();
        mesh_io::Mesh::from_reader(reader)?
    };
    convert_medit(mesh, options)
}

fn convert_medit(mut mesh: mesh_io::Mesh, options: &FileOptions) -> Result<Conversion, Error> {
    tracing::info!(
        dimension = mesh.dimension(),
        nodes = mesh.node_count(),
        elements = mesh.element_count(),
        "read mesh",
    );

    for pass in 0..options.refine {
        let span = tracing::info_span!("refine", pass);
        let _enter = span.enter();
        mesh = mesh.refine().ok_or(Error::UnsupportedRefinement)?;
        tracing::info!(
            nodes = mesh.node_count(),
            elements = mesh.element_count(),
            "refined mesh",
        );
    }

    let source = source_from_medit(&mesh, options.fix_orientation)?;
    let options = ConvertOptions {
        generate_edges: options.generate_edges,
        ..ConvertOptions::default()
    };
    convert(&source, &options)
}

fn element_kind(element_type: ElementType) -> Option<ElementKind> {
    Some(match element_type {
        ElementType::Triangle => ElementKind::Tri3,
        ElementType::Quadrilateral => ElementKind::Quad4,
        ElementType::Tetrahedron => ElementKind::Tet4,
        ElementType::Hexahedron => ElementKind::Hex8,
        ElementType::Vertex | ElementType::Edge => return None,
    })
}

fn element_type(geometry: Geometry) -> ElementType {
    match geometry {
        Geometry::Point => ElementType::Vertex,
        Geometry::Segment => ElementType::Edge,
        Geometry::Triangle => ElementType::Triangle,
        Geometry::Square => ElementType::Quadrilateral,
        Geometry::Tetrahedron => ElementType::Tetrahedron,
        Geometry::Cube => ElementType::Hexahedron,
    }
}

fn attribute(element_ref: mesh_io::Ref) -> Result<Attribute, Error> {
    Attribute::try_from(element_ref).map_err(|_| Error::RefOutOfRange { element_ref })
}

fn point(mesh: &mesh_io::Mesh, node: usize) -> Point3D {
    let mut p = Point3D::zeros();
    for (axis, &x) in mesh.node(node).iter().take(3).enumerate() {
        p[axis] = x;
    }
    p
}

/// Signed area or volume of an element, up to a positive factor.
///
/// Surface elements are measured in the xy plane.
fn signed_measure(mesh: &mesh_io::Mesh, element_type: ElementType, nodes: &[usize]) -> f64 {
    let p = |i: usize| point(mesh, nodes[i]);
    match element_type {
        ElementType::Triangle => (p(1) - p(0)).cross(&(p(2) - p(0))).z,
        ElementType::Quadrilateral => (p(2) - p(0)).cross(&(p(3) - p(1))).z,
        ElementType::Tetrahedron => {
            Matrix3::from_columns(&[p(1) - p(0), p(2) - p(0), p(3) - p(0)]).determinant()
        }
        ElementType::Hexahedron => {
            Matrix3::from_columns(&[p(1) - p(0), p(3) - p(0), p(4) - p(0)]).determinant()
        }
        ElementType::Vertex | ElementType::Edge => 0.0,
    }
}

/// Reorder the nodes of an element so that its orientation flips.
fn flip(element_type: ElementType, nodes: &mut [NodeId]) {
    match element_type {
        ElementType::Triangle | ElementType::Tetrahedron => nodes.swap(1, 2),
        ElementType::Quadrilateral => nodes.swap(1, 3),
        ElementType::Hexahedron => {
            nodes.swap(1, 3);
            nodes.swap(5, 7);
        }
        ElementType::Vertex | ElementType::Edge => {}
    }
}

/// Build a source view of a Medit mesh.
///
/// Node ids are the 1-based node indices of the file, element ids the 1-based
/// rank of the element among the elements of highest dimension. Those
/// elements are grouped into blocks by their ref. Elements one dimension
/// lower are boundary faces, grouped into boundaries by their ref and matched
/// to the element side with the same nodes. Other elements are ignored.
pub fn source_from_medit(mesh: &mesh_io::Mesh, fix_orientation: bool) -> Result<TableSource, Error> {
    let dimension = match mesh.element_dimension() {
        Some(dimension @ (2 | 3)) => dimension,
        _ => usize::clamp(mesh.dimension(), 2, 3),
    };
    // Orientation is only defined for elements that fill the space.
    let fix_orientation = fix_orientation && dimension == mesh.dimension();

    let mut source = TableSource::new(dimension);
    source.set_space_dimension(usize::clamp(mesh.dimension(), dimension, 3));
    for node in 0..mesh.node_count() {
        let p = point(mesh, node);
        source.add_node(node + 1, [p.x, p.y, p.z]);
    }

    let mut sides: HashMap<Vec<NodeId>, (ElementId, usize)> = HashMap::new();
    let mut element = 0;
    let mut flipped = 0;
    for (element_type, nodes, element_ref) in mesh.elements() {
        if element_type.dimension() != dimension {
            continue;
        }
        let kind = match element_kind(element_type) {
            Some(kind) => kind,
            None => continue,
        };
        element += 1;
        let mut node_ids: Vec<NodeId> = nodes.iter().map(|&node| node + 1).collect();
        if fix_orientation && signed_measure(mesh, element_type, nodes) < 0.0 {
            flip(element_type, &mut node_ids);
            flipped += 1;
        }
        for (side, face) in kind.descriptor().faces().iter().enumerate() {
            let mut key: Vec<NodeId> = face.iter().map(|&local| node_ids[local]).collect();
            key.sort_unstable();
            sides.entry(key).or_insert((element, side));
        }
        source.add_element(attribute(element_ref)?, element, node_ids);
    }
    if flipped != 0 {
        tracing::info!(flipped, "fixed element orientation");
    }

    let mut ignored = 0;
    for (element_type, nodes, element_ref) in mesh.elements() {
        if element_type.dimension() + 1 != dimension {
            if element_type.dimension() + 1 < dimension {
                ignored += 1;
            }
            continue;
        }
        let node_ids: Vec<NodeId> = nodes.iter().map(|&node| node + 1).collect();
        let mut key = node_ids.clone();
        key.sort_unstable();
        let boundary = attribute(element_ref)?;
        let &(element, side) = sides.get(&key).ok_or(Error::UnmatchedFace {
            boundary,
            nodes: node_ids,
        })?;
        source.add_side(boundary, element, side);
    }
    if ignored != 0 {
        tracing::debug!(ignored, "ignored lower-dimensional elements");
    }

    Ok(source)
}

impl Conversion {
    /// The target mesh as a Medit mesh: vertices, then body elements and
    /// boundary faces with their attribute as ref. Vertices keep
    /// [TargetMesh::space_dimension] coordinates. Second-order nodes are
    /// dropped.
    ///
    /// [TargetMesh::space_dimension]: crate::TargetMesh::space_dimension
    pub fn to_medit(&self) -> mesh_io::Mesh {
        let mesh = self.mesh();
        let dimension = mesh.space_dimension();

        let mut coordinates = Vec::with_capacity(dimension * mesh.vertex_count());
        for vertex in mesh.vertices() {
            coordinates.extend_from_slice(&vertex[..dimension]);
        }
        let node_refs = vec![0; mesh.vertex_count()];

        let mut topology: Vec<(ElementType, Vec<usize>, Vec<mesh_io::Ref>)> = Vec::new();
        let elements = mesh
            .elements()
            .iter()
            .map(|e| (e.geometry(), e.vertices(), e.attribute()));
        let boundary = mesh
            .boundary_elements()
            .iter()
            .map(|b| (b.geometry(), b.vertices(), b.attribute()));
        for (geometry, vertices, attribute) in elements.chain(boundary) {
            let element_type = element_type(geometry);
            let section = match topology.iter().position(|(t, _, _)| *t == element_type) {
                Some(section) => section,
                None => {
                    topology.push((element_type, Vec::new(), Vec::new()));
                    topology.len() - 1
                }
            };
            let (_, nodes, refs) = &mut topology[section];
            nodes.extend_from_slice(vertices);
            refs.push(attribute as mesh_io::Ref);
        }

        mesh_io::Mesh::from_raw_parts(dimension, coordinates, node_refs, topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceMesh as _;

    const SQUARE: &str = "MeshVersionFormatted 2
Dimension 2
Vertices
4
0 0 0
1 0 0
1 1 0
0 1 0
Triangles
2
1 2 3 1
1 4 3 2
Edges
2
1 2 5
3 4 6
End
";

    fn square() -> mesh_io::Mesh {
        mesh_io::Mesh::from_reader(SQUARE.as_bytes()).unwrap()
    }

    #[test]
    fn blocks_and_boundaries_from_refs() {
        let source = source_from_medit(&square(), true).unwrap();
        assert_eq!(source.dimension(), 2);
        assert_eq!(source.block_ids(), &[1, 2]);
        assert_eq!(source.block_elements(2), &[2]);
        assert_eq!(source.element_nodes(2), Some(&[1, 3, 4][..]));
        assert_eq!(source.boundary_ids(), &[5, 6]);
        assert_eq!(source.boundary_sides(5), &[(1, 0)]);
        assert_eq!(source.boundary_sides(6), &[(2, 1)]);
        assert_eq!(source.coordinates(3), Some([1.0, 1.0, 0.0]));
    }

    #[test]
    fn orientation_is_kept_on_request() {
        let source = source_from_medit(&square(), false).unwrap();
        assert_eq!(source.element_nodes(2), Some(&[1, 4, 3][..]));
        assert_eq!(source.boundary_sides(6), &[(2, 1)]);
    }

    #[test]
    fn hexahedron_orientation() {
        let input = "MeshVersionFormatted 2
Dimension 3
Vertices
8
0 0 0 0
1 0 0 0
1 1 0 0
0 1 0 0
0 0 1 0
1 0 1 0
1 1 1 0
0 1 1 0
Hexahedra
1
1 4 3 2 5 8 7 6 1
Quadrilaterals
1
1 2 3 4 3
End
";
        let mesh = mesh_io::Mesh::from_reader(input.as_bytes()).unwrap();
        let source = source_from_medit(&mesh, true).unwrap();
        assert_eq!(source.element_nodes(1), Some(&[1, 2, 3, 4, 5, 6, 7, 8][..]));
        assert_eq!(source.boundary_sides(3), &[(1, 0)]);

        let conversion = convert(&source, &ConvertOptions::default()).unwrap();
        let boundary = &conversion.mesh().boundary_elements()[0];
        assert_eq!(boundary.geometry(), Geometry::Square);
        assert_eq!(boundary.vertices(), &[0, 3, 2, 1]);
    }

    #[test]
    fn unmatched_faces_are_rejected() {
        let input = SQUARE.replace("3 4 6", "2 4 9");
        let err = convert_reader(input.as_bytes(), &FileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnmatchedFace { boundary: 9, ref nodes } if nodes == &[2, 4],
        ));
    }

    #[test]
    fn refinement_passes() {
        let options = FileOptions {
            refine: 1,
            ..FileOptions::default()
        };
        let conversion = convert_reader(SQUARE.as_bytes(), &options).unwrap();
        let mesh = conversion.mesh();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.element_count(), 8);
        assert_eq!(mesh.boundary_element_count(), 4);

        let input = "MeshVersionFormatted 2\nDimension 3\nVertices\n4\n\
                     0 0 0 0\n1 0 0 0\n0 1 0 0\n0 0 1 0\nTetrahedra\n1\n1 2 3 4 1\nEnd\n";
        let err = convert_reader(input.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRefinement));
    }

    #[test]
    fn surfaces_keep_their_coordinates() {
        let input = "MeshVersionFormatted 2
Dimension 3
Vertices
3
0 0 5 0
1 0 5 0
0 1 5 0
Triangles
1
1 2 3 1
End
";
        let conversion = convert_reader(input.as_bytes(), &FileOptions::default()).unwrap();
        assert_eq!(conversion.mesh().dimension(), 2);
        assert_eq!(conversion.mesh().space_dimension(), 3);
        let medit = conversion.to_medit();
        assert_eq!(medit.dimension(), 3);
        assert_eq!(medit.node(0), &[0.0, 0.0, 5.0]);
        assert_eq!(medit.node(2), &[0.0, 1.0, 5.0]);
    }

    #[test]
    fn refs_must_fit_attributes() {
        let input = SQUARE.replace("1 2 3 1", "1 2 3 3000000000");
        let err = convert_reader(input.as_bytes(), &FileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::RefOutOfRange {
                element_ref: 3000000000,
            },
        ));
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn parse_errors_are_io_errors() {
        let err = convert_reader("Dimension 2".as_bytes(), &FileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn write_back() {
        let conversion = convert_reader(SQUARE.as_bytes(), &FileOptions::default()).unwrap();
        let medit = conversion.to_medit();
        assert_eq!(medit.dimension(), 2);
        assert_eq!(medit.node_count(), 4);
        assert_eq!(medit.node(2), &[1.0, 1.0]);
        let elements: Vec<_> = medit
            .elements()
            .map(|(t, nodes, r)| (t, nodes.to_vec(), r))
            .collect();
        assert_eq!(
            elements,
            vec![
                (ElementType::Triangle, vec![0, 1, 2], 1),
                (ElementType::Triangle, vec![0, 2, 3], 2),
                (ElementType::Edge, vec![0, 1], 5),
                (ElementType::Edge, vec![2, 3], 6),
            ],
        );

        let text = medit.display_medit_ascii().to_string();
        let again = convert_reader(text.as_bytes(), &FileOptions::default()).unwrap();
        assert_eq!(again.mesh(), conversion.mesh());
    }
}
