//! Conversion of unstructured finite-element meshes given as loose
//! node/element/side tables into a strict target representation with typed
//! elements, contiguous vertices and an explicit boundary-element table.
//!
//! The entry point is [convert], which takes any [SourceMesh] and returns a
//! [Conversion]. Meshes stored in Medit files go through [convert_file].
//!
//! # Example
//!
//! ```rust
//! # fn main() -> Result<(), meshport::Error> {
//! let mut source = meshport::TableSource::new(2);
//! source
//!     .add_node(10, [0.0, 0.0, 0.0])
//!     .add_node(11, [1.0, 0.0, 0.0])
//!     .add_node(12, [0.0, 1.0, 0.0])
//!     .add_element(1, 1, [10, 11, 12])
//!     .add_side(5, 1, 0);
//!
//! let conversion = meshport::convert(&source, &meshport::ConvertOptions::default())?;
//! let mesh = conversion.mesh();
//! assert_eq!(mesh.vertex_count(), 3);
//! assert_eq!(mesh.boundary_elements()[0].attribute(), 5);
//! assert_eq!(conversion.node_map().vertex_index(12), Some(2));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;

mod builder;
mod file;
pub mod mesh;
pub mod resolver;
pub mod source;
pub mod space;
pub mod taxonomy;

pub use builder::convert;
pub use builder::Conversion;
pub use builder::ConvertOptions;
pub use file::convert_file;
pub use file::convert_reader;
pub use file::source_from_medit;
pub use file::FileOptions;
pub use mesh::TargetMesh;
pub use resolver::NodeIdentityMap;
pub use resolver::VerificationReport;
pub use resolver::VerifyOptions;
pub use source::SourceMesh;
pub use source::TableSource;
pub use taxonomy::Category;
pub use taxonomy::ElementKind;
pub use taxonomy::ElementTypeDescriptor;
pub use taxonomy::Geometry;
pub use taxonomy::Order;
pub use taxonomy::Support;

/// Identifier of a node in the source mesh.
pub type NodeId = usize;

/// Identifier of an element in the source mesh.
pub type ElementId = usize;

/// Block id or boundary id, as carried by target elements.
pub type Attribute = i32;

/// What a faulty reference was found in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Owner {
    Element(ElementId),
    Block(Attribute),
    Boundary(Attribute),
    Vertex(usize),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Element(id) => write!(f, "element {id}"),
            Owner::Block(id) => write!(f, "block {id}"),
            Owner::Boundary(id) => write!(f, "boundary {id}"),
            Owner::Vertex(index) => write!(f, "vertex {index}"),
        }
    }
}

/// Broad category of an [Error].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The element types cannot be mapped to the target format.
    Configuration,
    /// Something refers to a node or an element that does not exist.
    Referential,
    /// The node mapping is not a bijection.
    Consistency,
    /// A target element refers to a vertex past the vertex array.
    Bounds,
    /// The mesh file could not be read.
    Io,
}

/// Errors returned by the conversion. None of them leaves a usable mesh.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// No element kind has this number of nodes in this dimension.
    UnknownElementType {
        element: ElementId,
        dimension: usize,
        node_count: usize,
    },

    /// Linear and quadratic elements in the same mesh.
    MixedOrder {
        element: ElementId,
        expected: Order,
        actual: Order,
    },

    /// A boundary uses a side the element does not have.
    InvalidSide {
        boundary: Attribute,
        element: ElementId,
        side: usize,
        side_count: usize,
    },

    /// Uniform refinement is not available for these elements.
    UnsupportedRefinement,

    MissingCoordinates { node: NodeId, owner: Owner },

    MissingElement { element: ElementId, owner: Owner },

    /// An element is listed twice in the blocks.
    DuplicateElement { element: ElementId, first: Attribute, second: Attribute },

    /// A boundary face of a mesh file matches no side of any element.
    UnmatchedFace { boundary: Attribute, nodes: Vec<NodeId> },

    /// The blocks do not hold as many elements as announced.
    ElementCountMismatch { expected: usize, actual: usize },

    /// A node has no target index.
    UnmappedNode { node: NodeId, owner: Owner },

    /// The quadratic node mapping failed verification.
    Consistency(VerificationReport),

    VertexOutOfBounds {
        vertex: usize,
        vertex_count: usize,
        element: usize,
        boundary: bool,
    },

    /// A Medit ref does not fit in an [Attribute].
    RefOutOfRange { element_ref: isize },

    Io(io::Error),

    Parse(mesh_io::medit::ParseError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownElementType { .. }
            | Error::MixedOrder { .. }
            | Error::InvalidSide { .. }
            | Error::UnsupportedRefinement => ErrorKind::Configuration,
            Error::MissingCoordinates { .. }
            | Error::MissingElement { .. }
            | Error::DuplicateElement { .. }
            | Error::UnmatchedFace { .. }
            | Error::ElementCountMismatch { .. } => ErrorKind::Referential,
            Error::Consistency(_) => ErrorKind::Consistency,
            Error::UnmappedNode { .. } | Error::VertexOutOfBounds { .. } => ErrorKind::Bounds,
            Error::RefOutOfRange { .. } | Error::Io(_) | Error::Parse(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownElementType {
                element,
                dimension,
                node_count,
            } => write!(
                f,
                "element {element}: no {dimension}D element type has {node_count} nodes",
            ),
            Error::MixedOrder {
                element,
                expected,
                actual,
            } => write!(
                f,
                "element {element} is {actual} but previous elements are {expected}",
            ),
            Error::InvalidSide {
                boundary,
                element,
                side,
                side_count,
            } => write!(
                f,
                "boundary {boundary}: element {element} has no side {side} (it has {side_count})",
            ),
            Error::UnsupportedRefinement => {
                write!(f, "only triangle and quadrilateral meshes can be refined")
            }
            Error::MissingCoordinates { node, owner } => {
                write!(f, "node {node} of {owner} has no coordinates")
            }
            Error::MissingElement { element, owner } => {
                write!(f, "{owner} refers to unknown element {element}")
            }
            Error::DuplicateElement {
                element,
                first,
                second,
            } => write!(f, "element {element} is in both block {first} and block {second}"),
            Error::UnmatchedFace { boundary, nodes } => write!(
                f,
                "boundary {boundary}: face {nodes:?} is not the side of any element",
            ),
            Error::ElementCountMismatch { expected, actual } => write!(
                f,
                "expected {expected} elements, found {actual} in the blocks",
            ),
            Error::UnmappedNode { node, owner } => {
                write!(f, "node {node} of {owner} has no target index")
            }
            Error::Consistency(report) => write!(f, "inconsistent node mapping: {report}"),
            Error::VertexOutOfBounds {
                vertex,
                vertex_count,
                element,
                boundary,
            } => write!(
                f,
                "{} {element} refers to vertex {vertex}, but there are only {vertex_count}",
                if *boundary { "boundary element" } else { "element" },
            ),
            Error::RefOutOfRange { element_ref } => {
                write!(f, "element ref {element_ref} does not fit in an attribute")
            }
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Parse(err) => write!(f, "failed to parse mesh: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<mesh_io::medit::ParseError> for Error {
    fn from(err: mesh_io::medit::ParseError) -> Error {
        Error::Parse(err)
    }
}
