//! Static table of the supported element kinds.
//!
//! Local node numbering follows the source mesh convention: corners come
//! first, then one node per edge, then one node per quadrilateral side, then
//! the interior node. Sides are listed with an outward normal.

use std::fmt;
use std::str;

/// Shape family of an element, regardless of its polynomial order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl Category {
    /// Topological dimension of elements of this category.
    pub fn dimension(self) -> usize {
        match self {
            Category::Triangle | Category::Quadrilateral => 2,
            Category::Tetrahedron | Category::Hexahedron => 3,
        }
    }
}

/// Polynomial order of an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Order {
    Linear,
    Quadratic,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Linear => write!(f, "linear"),
            Order::Quadratic => write!(f, "quadratic"),
        }
    }
}

/// Geometry of an element in the target format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    Point,
    Segment,
    Triangle,
    Square,
    Tetrahedron,
    Cube,
}

impl Geometry {
    /// Integer type code written in the target format.
    pub fn code(self) -> i32 {
        match self {
            Geometry::Point => 0,
            Geometry::Segment => 1,
            Geometry::Triangle => 2,
            Geometry::Square => 3,
            Geometry::Tetrahedron => 4,
            Geometry::Cube => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Geometry::Point,
            1 => Geometry::Segment,
            2 => Geometry::Triangle,
            3 => Geometry::Square,
            4 => Geometry::Tetrahedron,
            5 => Geometry::Cube,
            _ => return None,
        })
    }

    pub fn dimension(self) -> usize {
        match self {
            Geometry::Point => 0,
            Geometry::Segment => 1,
            Geometry::Triangle | Geometry::Square => 2,
            Geometry::Tetrahedron | Geometry::Cube => 3,
        }
    }

    /// Number of vertices of this geometry.
    pub fn vertex_count(self) -> usize {
        match self {
            Geometry::Point => 1,
            Geometry::Segment => 2,
            Geometry::Triangle => 3,
            Geometry::Square | Geometry::Tetrahedron => 4,
            Geometry::Cube => 8,
        }
    }
}

/// Mesh entity a higher-order node sits on, in local corner numbering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Support {
    /// Midpoint of the edge between two local corners.
    Edge(usize, usize),
    /// Center of the given side.
    Face(usize),
    /// Center of the element.
    Interior,
}

/// Everything the conversion needs to know about one element kind.
#[derive(Debug)]
pub struct ElementTypeDescriptor {
    pub category: Category,
    pub order: Order,
    pub node_count: usize,
    pub corner_count: usize,
    pub geometry: Geometry,
    pub face_geometry: Geometry,
    faces: &'static [&'static [usize]],
    edges: &'static [[usize; 2]],
    higher_order: &'static [Support],
}

impl ElementTypeDescriptor {
    /// Local corner indices of side `side`, oriented outward.
    pub fn face(&self, side: usize) -> Option<&'static [usize]> {
        self.faces.get(side).copied()
    }

    pub fn faces(&self) -> &'static [&'static [usize]] {
        self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Local corner pairs of the element edges.
    pub fn edges(&self) -> &'static [[usize; 2]] {
        self.edges
    }

    /// Supports of local nodes `corner_count..node_count`, in order.
    pub fn higher_order_nodes(&self) -> &'static [Support] {
        self.higher_order
    }

    /// All local nodes lying on side `side`: its corners followed by the
    /// higher-order nodes of its edges and of the side itself.
    pub fn side_nodes(&self, side: usize) -> Option<Vec<usize>> {
        let face = self.face(side)?;
        let mut nodes = face.to_vec();
        for (i, support) in self.higher_order.iter().enumerate() {
            let on_side = match *support {
                Support::Edge(a, b) => face.contains(&a) && face.contains(&b),
                Support::Face(s) => s == side,
                Support::Interior => false,
            };
            if on_side {
                nodes.push(self.corner_count + i);
            }
        }
        Some(nodes)
    }
}

const TRI_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const TRI_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [2, 0]];

const QUAD_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const QUAD_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [2, 3], [3, 0]];

const TET_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]];
const TET_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [0, 2], [0, 3], [1, 3], [2, 3]];

const HEX_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[4, 5, 6, 7],
];
const HEX_EDGES: &[[usize; 2]] = &[
    [0, 1],
    [1, 2],
    [2, 3],
    [0, 3],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
    [4, 5],
    [5, 6],
    [6, 7],
    [4, 7],
];

static TRI3: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Triangle,
    order: Order::Linear,
    node_count: 3,
    corner_count: 3,
    geometry: Geometry::Triangle,
    face_geometry: Geometry::Segment,
    faces: TRI_FACES,
    edges: TRI_EDGES,
    higher_order: &[],
};

static TRI6: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Triangle,
    order: Order::Quadratic,
    node_count: 6,
    corner_count: 3,
    geometry: Geometry::Triangle,
    face_geometry: Geometry::Segment,
    faces: TRI_FACES,
    edges: TRI_EDGES,
    higher_order: &[Support::Edge(0, 1), Support::Edge(1, 2), Support::Edge(2, 0)],
};

static QUAD4: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Quadrilateral,
    order: Order::Linear,
    node_count: 4,
    corner_count: 4,
    geometry: Geometry::Square,
    face_geometry: Geometry::Segment,
    faces: QUAD_FACES,
    edges: QUAD_EDGES,
    higher_order: &[],
};

static QUAD9: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Quadrilateral,
    order: Order::Quadratic,
    node_count: 9,
    corner_count: 4,
    geometry: Geometry::Square,
    face_geometry: Geometry::Segment,
    faces: QUAD_FACES,
    edges: QUAD_EDGES,
    higher_order: &[
        Support::Edge(0, 1),
        Support::Edge(1, 2),
        Support::Edge(2, 3),
        Support::Edge(3, 0),
        Support::Interior,
    ],
};

static TET4: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Tetrahedron,
    order: Order::Linear,
    node_count: 4,
    corner_count: 4,
    geometry: Geometry::Tetrahedron,
    face_geometry: Geometry::Triangle,
    faces: TET_FACES,
    edges: TET_EDGES,
    higher_order: &[],
};

static TET10: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Tetrahedron,
    order: Order::Quadratic,
    node_count: 10,
    corner_count: 4,
    geometry: Geometry::Tetrahedron,
    face_geometry: Geometry::Triangle,
    faces: TET_FACES,
    edges: TET_EDGES,
    higher_order: &[
        Support::Edge(0, 1),
        Support::Edge(1, 2),
        Support::Edge(0, 2),
        Support::Edge(0, 3),
        Support::Edge(1, 3),
        Support::Edge(2, 3),
    ],
};

static HEX8: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Hexahedron,
    order: Order::Linear,
    node_count: 8,
    corner_count: 8,
    geometry: Geometry::Cube,
    face_geometry: Geometry::Square,
    faces: HEX_FACES,
    edges: HEX_EDGES,
    higher_order: &[],
};

static HEX27: ElementTypeDescriptor = ElementTypeDescriptor {
    category: Category::Hexahedron,
    order: Order::Quadratic,
    node_count: 27,
    corner_count: 8,
    geometry: Geometry::Cube,
    face_geometry: Geometry::Square,
    faces: HEX_FACES,
    edges: HEX_EDGES,
    higher_order: &[
        Support::Edge(0, 1),
        Support::Edge(1, 2),
        Support::Edge(2, 3),
        Support::Edge(0, 3),
        Support::Edge(0, 4),
        Support::Edge(1, 5),
        Support::Edge(2, 6),
        Support::Edge(3, 7),
        Support::Edge(4, 5),
        Support::Edge(5, 6),
        Support::Edge(6, 7),
        Support::Edge(4, 7),
        Support::Face(0),
        Support::Face(1),
        Support::Face(2),
        Support::Face(3),
        Support::Face(4),
        Support::Face(5),
        Support::Interior,
    ],
};

/// One entry of the element taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Tri3,
    Tri6,
    Quad4,
    Quad9,
    Tet4,
    Tet10,
    Hex8,
    Hex27,
}

impl ElementKind {
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Tri3,
        ElementKind::Tri6,
        ElementKind::Quad4,
        ElementKind::Quad9,
        ElementKind::Tet4,
        ElementKind::Tet10,
        ElementKind::Hex8,
        ElementKind::Hex27,
    ];

    pub fn new(category: Category, order: Order) -> Self {
        match (category, order) {
            (Category::Triangle, Order::Linear) => ElementKind::Tri3,
            (Category::Triangle, Order::Quadratic) => ElementKind::Tri6,
            (Category::Quadrilateral, Order::Linear) => ElementKind::Quad4,
            (Category::Quadrilateral, Order::Quadratic) => ElementKind::Quad9,
            (Category::Tetrahedron, Order::Linear) => ElementKind::Tet4,
            (Category::Tetrahedron, Order::Quadratic) => ElementKind::Tet10,
            (Category::Hexahedron, Order::Linear) => ElementKind::Hex8,
            (Category::Hexahedron, Order::Quadratic) => ElementKind::Hex27,
        }
    }

    /// Guess the kind of an element from the dimension of the mesh and the
    /// number of nodes the element lists.
    pub fn infer(dimension: usize, node_count: usize) -> Option<Self> {
        Some(match (dimension, node_count) {
            (2, 3) => ElementKind::Tri3,
            (2, 6) => ElementKind::Tri6,
            (2, 4) => ElementKind::Quad4,
            (2, 9) => ElementKind::Quad9,
            (3, 4) => ElementKind::Tet4,
            (3, 10) => ElementKind::Tet10,
            (3, 8) => ElementKind::Hex8,
            (3, 27) => ElementKind::Hex27,
            _ => return None,
        })
    }

    pub fn descriptor(self) -> &'static ElementTypeDescriptor {
        match self {
            ElementKind::Tri3 => &TRI3,
            ElementKind::Tri6 => &TRI6,
            ElementKind::Quad4 => &QUAD4,
            ElementKind::Quad9 => &QUAD9,
            ElementKind::Tet4 => &TET4,
            ElementKind::Tet10 => &TET10,
            ElementKind::Hex8 => &HEX8,
            ElementKind::Hex27 => &HEX27,
        }
    }

    pub fn category(self) -> Category {
        self.descriptor().category
    }

    pub fn order(self) -> Order {
        self.descriptor().order
    }

    /// The same category at the requested order.
    pub fn with_order(self, order: Order) -> Self {
        ElementKind::new(self.category(), order)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Tri3 => "TRI3",
            ElementKind::Tri6 => "TRI6",
            ElementKind::Quad4 => "QUAD4",
            ElementKind::Quad9 => "QUAD9",
            ElementKind::Tet4 => "TET4",
            ElementKind::Tet10 => "TET10",
            ElementKind::Hex8 => "HEX8",
            ElementKind::Hex27 => "HEX27",
        };
        f.write_str(name)
    }
}

impl str::FromStr for ElementKind {
    type Err = ();

    fn from_str(s: &str) -> Result<ElementKind, ()> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "tri3" => ElementKind::Tri3,
            "tri6" => ElementKind::Tri6,
            "quad4" => ElementKind::Quad4,
            "quad9" => ElementKind::Quad9,
            "tet4" => ElementKind::Tet4,
            "tet10" => ElementKind::Tet10,
            "hex8" => ElementKind::Hex8,
            "hex27" => ElementKind::Hex27,
            _ => return Err(()),
        })
    }
}

impl str::FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Category, ()> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "tri" | "triangle" | "triangles" => Category::Triangle,
            "quad" | "quadrilateral" | "quadrilaterals" => Category::Quadrilateral,
            "tet" | "tetra" | "tetrahedron" | "tetrahedra" => Category::Tetrahedron,
            "hex" | "hexahedron" | "hexahedra" => Category::Hexahedron,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_are_consistent() {
        for kind in ElementKind::ALL {
            let d = kind.descriptor();
            assert!(d.corner_count <= d.node_count, "{kind}");
            assert_eq!(d.geometry.vertex_count(), d.corner_count, "{kind}");
            assert_eq!(d.higher_order_nodes().len(), d.node_count - d.corner_count);
            assert_eq!(d.geometry.dimension(), d.category.dimension());
            assert_eq!(d.face_geometry.dimension() + 1, d.geometry.dimension());
            for face in d.faces() {
                assert_eq!(face.len(), d.face_geometry.vertex_count(), "{kind}");
                assert!(face.iter().all(|&c| c < d.corner_count), "{kind}");
            }
            for support in d.higher_order_nodes() {
                match *support {
                    Support::Edge(a, b) => assert!(
                        d.edges().contains(&[a, b]) || d.edges().contains(&[b, a]),
                        "{kind}: ({a}, {b}) is not an edge",
                    ),
                    Support::Face(s) => assert!(s < d.face_count()),
                    Support::Interior => {}
                }
            }
        }
    }

    #[test]
    fn every_corner_lies_on_a_face() {
        for kind in ElementKind::ALL {
            let d = kind.descriptor();
            for c in 0..d.corner_count {
                assert!(d.faces().iter().any(|f| f.contains(&c)), "{kind} {c}");
            }
        }
    }

    #[test]
    fn lookup_and_inference_agree() {
        for kind in ElementKind::ALL {
            let d = kind.descriptor();
            assert_eq!(ElementKind::new(d.category, d.order), kind);
            assert_eq!(
                ElementKind::infer(d.category.dimension(), d.node_count),
                Some(kind),
            );
            assert_eq!(kind.to_string().parse::<ElementKind>(), Ok(kind));
        }
        assert_eq!(ElementKind::infer(2, 8), None);
        assert_eq!(ElementKind::infer(3, 20), None);
        assert_eq!(ElementKind::infer(1, 2), None);
    }

    #[test]
    fn side_nodes_of_quadratic_kinds() {
        let quad9 = ElementKind::Quad9.descriptor();
        assert_eq!(quad9.side_nodes(0), Some(vec![0, 1, 4]));
        assert_eq!(quad9.side_nodes(3), Some(vec![3, 0, 7]));
        assert_eq!(quad9.side_nodes(4), None);

        let hex27 = ElementKind::Hex27.descriptor();
        let top = hex27.side_nodes(5).unwrap();
        assert_eq!(top, vec![4, 5, 6, 7, 16, 17, 18, 19, 25]);

        let tet10 = ElementKind::Tet10.descriptor();
        assert_eq!(tet10.side_nodes(0), Some(vec![0, 2, 1, 4, 5, 6]));
    }

    #[test]
    fn geometry_codes_round_trip() {
        for code in 0..6 {
            assert_eq!(Geometry::from_code(code).map(Geometry::code), Some(code));
        }
        assert_eq!(Geometry::from_code(6), None);
    }

    #[test]
    fn category_names() {
        assert_eq!("Hexahedra".parse(), Ok(Category::Hexahedron));
        assert_eq!("tri".parse(), Ok(Category::Triangle));
        assert_eq!("prism".parse::<Category>(), Err(()));
    }
}
