use anyhow::Context as _;
use anyhow::Result;
use meshport::FileOptions;
use std::io::Write as _;

const USAGE: &str = "Usage: mesh-convert [options] [in.mesh [out.mesh]]";

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("e", "edges", "generate the edge table");
    options.optflag("h", "help", "print this help menu");
    options.optflag("", "keep-orientation", "do not fix inverted elements");
    options.optopt("p", "partition", "write the partition array to FILE", "FILE");
    options.optopt(
        "r",
        "refine",
        "number of uniform refinement passes (default: 0)",
        "N",
    );
    options.optopt("t", "trace", "emit a chrome trace", "FILE");

    let matches = meshport_tools::parse_args(options, USAGE, 2)?;

    let _chrome_trace_guard = meshport_tools::init_tracing(matches.opt_str("t"));

    let file_options = FileOptions {
        generate_edges: matches.opt_present("e"),
        refine: matches
            .opt_get("r")
            .context("invalid value for option 'refine'")?
            .unwrap_or(0),
        fix_orientation: !matches.opt_present("keep-orientation"),
    };

    let input = meshport_tools::reader(matches.free.first())?;
    let conversion =
        meshport::convert_reader(input, &file_options).context("failed to convert mesh")?;

    let mesh = conversion.mesh();
    eprintln!(" -> Dimension: {}", mesh.dimension());
    eprintln!(" -> Order: {}", mesh.order());
    eprintln!(" -> Vertices: {}", mesh.vertex_count());
    eprintln!(" -> Nodes: {}", mesh.nodes().len());
    eprintln!(" -> Elements: {}", mesh.element_count());
    eprintln!(" -> Boundary elements: {}", mesh.boundary_element_count());
    if let Some(edges) = mesh.edges() {
        eprintln!(" -> Edges: {}", edges.edges().len());
    }

    let medit = conversion.to_medit();
    for (axis, (min, max)) in ["x", "y", "z"].iter().zip(medit.bounding_box()) {
        eprintln!(" -> Bounds along {axis}: [{min}, {max}]");
    }

    let mut output = meshport_tools::writer(matches.free.get(1))?;
    write!(output, "{}", medit.display_medit_ascii())
        .context("failed to write mesh")?;
    output.flush().context("failed to write mesh")?;

    if let Some(partition_file) = matches.opt_str("p") {
        let mut partition_file = meshport_tools::writer(Some(&partition_file))?;
        mesh_io::partition::write(&mut partition_file, conversion.partitioning().iter().copied())
            .context("failed to write partition file")?;
        partition_file
            .flush()
            .context("failed to write partition file")?;
    }

    Ok(())
}
