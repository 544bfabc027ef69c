use crate::ElementType;
use crate::Mesh;
use crate::Ref;
use std::error;
use std::fmt;
use std::io;
use std::num;
use std::str;

#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    UnexpectedToken { expected: String, found: String },
    UnexpectedEof,
    BadDimension(usize),
    NodeOutOfRange { node: usize, node_count: usize },
    Io(io::Error),
    BadInteger(num::ParseIntError),
    BadFloat(num::ParseFloatError),
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    lineno: usize,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Line the error was found at, starting from 1, or 0 when the error is
    /// not tied to a line.
    pub fn lineno(&self) -> usize {
        self.lineno
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found {:?}", expected, found)
            }
            ErrorKind::UnexpectedEof => write!(f, "unexpected end of file"),
            ErrorKind::BadDimension(dimension) => {
                write!(f, "dimension must be 2 or 3, got {}", dimension)
            }
            ErrorKind::NodeOutOfRange { node, node_count } => write!(
                f,
                "node {} does not exist, there are only {} nodes",
                node, node_count,
            ),
            ErrorKind::Io(err) => write!(f, "io error: {}", err),
            ErrorKind::BadInteger(err) => write!(f, "when parsing integer: {}", err),
            ErrorKind::BadFloat(err) => write!(f, "when parsing float: {}", err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at line {}: {}", self.lineno, self.kind)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err),
            ErrorKind::BadInteger(err) => Some(err),
            ErrorKind::BadFloat(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error {
            kind: ErrorKind::Io(err),
            lineno: 0,
        }
    }
}

impl From<num::ParseIntError> for ErrorKind {
    fn from(err: num::ParseIntError) -> ErrorKind {
        ErrorKind::BadInteger(err)
    }
}

impl From<num::ParseFloatError> for ErrorKind {
    fn from(err: num::ParseFloatError) -> ErrorKind {
        ErrorKind::BadFloat(err)
    }
}

/// Whitespace-separated words of the input, `#` comments removed, along with
/// the line they are on.
struct Tokens<'a> {
    tokens: Vec<(usize, &'a str)>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let tokens = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| {
                let line = match line.find('#') {
                    Some(comment) => &line[..comment],
                    None => line,
                };
                line.split_whitespace().map(move |token| (i + 1, token))
            })
            .collect();
        Tokens {
            tokens,
            position: 0,
        }
    }

    /// Line of the last token read.
    fn lineno(&self) -> usize {
        match self.position.checked_sub(1) {
            Some(last) => self.tokens[last].0,
            None => 1,
        }
    }

    fn error(&self, kind: impl Into<ErrorKind>) -> Error {
        Error {
            kind: kind.into(),
            lineno: self.lineno(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        let (_, token) = *self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn word(&mut self) -> Result<&'a str, Error> {
        self.next().ok_or_else(|| self.error(ErrorKind::UnexpectedEof))
    }

    fn expect(&mut self, keyword: &str) -> Result<(), Error> {
        let found = self.word()?;
        if !found.eq_ignore_ascii_case(keyword) {
            return Err(self.error(ErrorKind::UnexpectedToken {
                expected: format!("{:?}", keyword),
                found: found.to_owned(),
            }));
        }
        Ok(())
    }

    fn integer<T>(&mut self) -> Result<T, Error>
    where
        T: str::FromStr<Err = num::ParseIntError>,
    {
        let word = self.word()?;
        word.parse().map_err(|err| self.error(err))
    }

    fn float(&mut self) -> Result<f64, Error> {
        let word = self.word()?;
        word.parse().map_err(|err| self.error(err))
    }

    /// A 1-based node index, returned 0-based.
    fn node(&mut self, node_count: usize) -> Result<usize, Error> {
        let node: usize = self.integer()?;
        if node == 0 || node > node_count {
            return Err(self.error(ErrorKind::NodeOutOfRange { node, node_count }));
        }
        Ok(node - 1)
    }
}

/// Room reserved for `count` entries of `width` values each.
///
/// Counts come from the file and may be bogus, so only a bounded amount is
/// reserved up front.
fn capacity(count: usize, width: usize) -> usize {
    usize::min(count, 1 << 16).saturating_mul(width)
}

/// Sections whose content is not needed and that are read over.
const IGNORED_SECTIONS: &[&str] = &["corners", "ridges", "requiredvertices", "requirededges"];

/// Parse an ASCII Medit mesh.
///
/// Keywords are case-insensitive. Reading stops at `End`, or at the end of
/// the input when the keyword is missing.
pub fn parse_ascii<R: io::BufRead>(mut input: R) -> Result<Mesh, Error> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let mut tokens = Tokens::new(&text);

    tokens.expect("MeshVersionFormatted")?;
    let _version: u32 = tokens.integer()?;
    tokens.expect("Dimension")?;
    let dimension: usize = tokens.integer()?;
    if dimension != 2 && dimension != 3 {
        return Err(tokens.error(ErrorKind::BadDimension(dimension)));
    }

    let mut mesh = Mesh {
        dimension,
        ..Mesh::default()
    };

    while let Some(keyword) = tokens.next() {
        let keyword = keyword.to_ascii_lowercase();
        if keyword == "end" {
            break;
        }
        if keyword == "vertices" {
            let count: usize = tokens.integer()?;
            mesh.coordinates.reserve(capacity(count, dimension));
            mesh.node_refs.reserve(capacity(count, 1));
            for _ in 0..count {
                for _ in 0..dimension {
                    mesh.coordinates.push(tokens.float()?);
                }
                mesh.node_refs.push(tokens.integer::<Ref>()?);
            }
            continue;
        }
        if IGNORED_SECTIONS.contains(&keyword.as_str()) {
            let count: usize = tokens.integer()?;
            for _ in 0..count {
                tokens.word()?;
            }
            continue;
        }
        let element_type = match ElementType::from_medit_keyword(&keyword) {
            Some(element_type) => element_type,
            None => {
                return Err(tokens.error(ErrorKind::UnexpectedToken {
                    expected: "a section keyword".to_owned(),
                    found: keyword,
                }));
            }
        };

        let count: usize = tokens.integer()?;
        let node_count = mesh.node_count();
        let section = match mesh
            .topology
            .iter()
            .position(|(t, _, _)| *t == element_type)
        {
            Some(section) => section,
            None => {
                mesh.topology.push((element_type, Vec::new(), Vec::new()));
                mesh.topology.len() - 1
            }
        };
        let (_, nodes, refs) = &mut mesh.topology[section];
        nodes.reserve(capacity(count, element_type.node_count()));
        refs.reserve(capacity(count, 1));
        for _ in 0..count {
            for _ in 0..element_type.node_count() {
                nodes.push(tokens.node(node_count)?);
            }
            refs.push(tokens.integer::<Ref>()?);
        }
    }

    Ok(mesh)
}
