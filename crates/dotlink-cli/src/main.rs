use clap::Parser;
use dotlink::{LinkError, Pipeline, parse_dot, to_dot_string};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dotlink-cli")]
#[command(about = "Link and transform Graphviz DOT call graphs")]
struct Cli {
    /// Input DOT files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Pipeline configuration file, one pass per line.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the transformed graph here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Merge all inputs before the first pass, like a `link` config line.
    #[arg(short, long)]
    link: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

// Logs go to stderr so the DOT output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), LinkError> {
    let mut pipeline = match cli.config.as_deref() {
        Some(path) => Pipeline::from_file(path)?,
        None => Pipeline::new(),
    };
    if cli.link {
        pipeline = pipeline.with_link();
    }

    let mut graphs = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        debug!(path = %path.display(), "reading input graph");
        let source = fs::read_to_string(path).map_err(|err| LinkError::io(path, err))?;
        graphs.push(parse_dot(&source)?);
    }

    let graph = pipeline.run(graphs)?;
    let mut dot = to_dot_string(&graph);
    dot.push('\n');

    match cli.output.as_deref() {
        Some(path) => {
            debug!(path = %path.display(), "writing output graph");
            fs::write(path, &dot).map_err(|err| LinkError::io(path, err))?;
        }
        None => print!("{dot}"),
    }
    Ok(())
}
