use crate::ElementType;
use crate::Mesh;
use std::fmt;

/// Serialize a mesh into the ASCII Medit format.
#[derive(Debug)]
pub struct DisplayAscii<'a> {
    mesh: &'a Mesh,
}

impl Mesh {
    pub fn display_medit_ascii(&self) -> DisplayAscii<'_> {
        DisplayAscii { mesh: self }
    }
}

impl fmt::Display for DisplayAscii<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MeshVersionFormatted 2\nDimension {}\n\nVertices\n\t{}\n",
            self.mesh.dimension,
            self.mesh.node_count(),
        )?;
        for (coordinates, node_ref) in self.mesh.nodes() {
            for coordinate in coordinates {
                write!(f, " {}", coordinate)?;
            }
            writeln!(f, " {}", node_ref)?;
        }
        for (element_type, nodes, refs) in &self.mesh.topology {
            if *element_type == ElementType::Vertex {
                // Medit has no such section.
                continue;
            }
            write!(
                f,
                "\n{}\n\t{}\n",
                element_type.medit_keyword(),
                refs.len(),
            )?;
            for (element, element_ref) in nodes.chunks(element_type.node_count()).zip(refs) {
                for node in element {
                    write!(f, " {}", node + 1)?;
                }
                writeln!(f, " {}", element_ref)?;
            }
        }
        write!(f, "\nEnd")
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_ascii;

    #[test]
    fn serialize_parsed_mesh() {
        let input = "MeshVersionFormatted 2
Dimension 3

Vertices
\t4
 2.3 0 1 0
 1231 2 3.14 0
 -21.2 21 0.0001 0
 -0.2 -0.2 -0.2 0

Triangles
\t2
 1 2 3 0
 2 3 4 0

End";
        let mesh = parse_ascii(input.as_bytes()).unwrap();
        let output = mesh.display_medit_ascii().to_string();
        assert_eq!(input, output);
    }
}
