use anyhow::Context as _;
use anyhow::Result;
use std::env;
use std::fs;
use std::io;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

/// Parse the command-line arguments, print the help and exit when `-h` is
/// given, and reject more than `max_free` positional arguments.
///
/// `options` must define the `h`/`help` flag.
pub fn parse_args(
    options: getopts::Options,
    usage: &str,
    max_free: usize,
) -> Result<getopts::Matches> {
    let matches = parse_args_from(&options, usage, max_free, env::args().skip(1))?;
    if matches.opt_present("h") {
        eprintln!("{}", options.usage(usage));
        std::process::exit(0);
    }
    Ok(matches)
}

fn parse_args_from<I>(
    options: &getopts::Options,
    usage: &str,
    max_free: usize,
    args: I,
) -> Result<getopts::Matches>
where
    I: IntoIterator<Item = String>,
{
    let matches = options.parse(args)?;
    if matches.free.len() > max_free {
        anyhow::bail!("too many arguments\n\n{}", options.usage(usage));
    }
    Ok(matches)
}

/// Log to stderr, filtered by the `LOG` environment variable, and to a chrome
/// trace when `trace_file` is given.
///
/// The trace is written when the returned guard is dropped.
pub fn init_tracing(trace_file: Option<String>) -> Option<tracing_chrome::FlushGuard> {
    let registry = Registry::default().with(EnvFilter::from_env("LOG")).with(
        HierarchicalLayer::new(4)
            .with_targets(true)
            .with_bracketed_fields(true),
    );
    match trace_file {
        Some(filename) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(filename)
                .build();
            registry.with(chrome_layer).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// The given file, or stdin.
pub fn reader(path: Option<&String>) -> Result<Box<dyn io::BufRead>> {
    Ok(match path {
        Some(path) => {
            let file = fs::File::open(path).with_context(|| format!("failed to open {path:?}"))?;
            Box::new(io::BufReader::new(file))
        }
        None => Box::new(io::BufReader::new(io::stdin().lock())),
    })
}

/// The given file, created or truncated, or stdout.
pub fn writer(path: Option<&String>) -> Result<Box<dyn io::Write>> {
    Ok(match path {
        Some(path) => {
            let file =
                fs::File::create(path).with_context(|| format!("failed to create {path:?}"))?;
            Box::new(io::BufWriter::new(file))
        }
        None => Box::new(io::BufWriter::new(io::stdout().lock())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> getopts::Options {
        let mut options = getopts::Options::new();
        options.optflag("h", "help", "print this help menu");
        options.optopt("r", "refine", "refinement passes", "N");
        options
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn positional_arguments() {
        let matches =
            parse_args_from(&options(), "usage", 2, args(&["-r", "2", "a", "b"])).unwrap();
        assert_eq!(matches.opt_get::<usize>("r").unwrap(), Some(2));
        assert_eq!(matches.free, vec!["a", "b"]);

        let err = parse_args_from(&options(), "usage", 1, args(&["a", "b"])).unwrap_err();
        assert!(err.to_string().starts_with("too many arguments"));
        assert!(parse_args_from(&options(), "usage", 1, args(&["--bogus"])).is_err());
    }
}
