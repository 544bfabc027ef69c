//! The ASCII Medit mesh format.
//!
//! A file is a header (`MeshVersionFormatted`, `Dimension`) followed by
//! sections, each made of a keyword, an entry count and the entries. Node
//! indices are 1-based in files and 0-based in [Mesh](crate::Mesh).

pub use parser::parse_ascii;
pub use parser::Error as ParseError;
pub use parser::ErrorKind as ParseErrorKind;
pub use serializer::DisplayAscii;

mod parser;
mod serializer;

use crate::ElementType;

impl ElementType {
    /// Section keyword of this element type.
    pub fn medit_keyword(self) -> &'static str {
        match self {
            ElementType::Vertex => "Vertices",
            ElementType::Edge => "Edges",
            ElementType::Triangle => "Triangles",
            ElementType::Quadrilateral => "Quadrilaterals",
            ElementType::Tetrahedron => "Tetrahedra",
            ElementType::Hexahedron => "Hexahedra",
        }
    }

    /// Element type of a section keyword, case-insensitive.
    pub fn from_medit_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword.to_ascii_lowercase().as_str() {
            "edges" => ElementType::Edge,
            "triangles" => ElementType::Triangle,
            "quadrilaterals" | "quadrangles" => ElementType::Quadrilateral,
            "tetrahedra" => ElementType::Tetrahedron,
            "hexahedra" => ElementType::Hexahedron,
            _ => return None,
        })
    }
}
