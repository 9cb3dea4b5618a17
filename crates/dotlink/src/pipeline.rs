use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::errors::LinkError;
use crate::graph::{Graph, link_graphs};
use crate::passes::{
    CutDegPass, ExtractSubgraphPass, Pass, RegexEdgeGenPass, RemoveEdgesPass, RemoveNodesPass,
    ReparentPass, ReversePass, UniqueEdgesPass,
};
use crate::rules;

/// An ordered list of passes plus the link flag.
///
/// Parsing a config file reads every referenced rule file and compiles every
/// pattern up front, so a pipeline that constructs successfully cannot fail
/// on configuration once it runs.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
    link: bool,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "passes",
                &self.passes.iter().map(|pass| pass.name()).collect::<Vec<_>>(),
            )
            .field("link", &self.link)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a pipeline config file: one pass per line, `#` comments and
    /// blank lines skipped, tokens whitespace-separated.
    pub fn from_file(path: &Path) -> Result<Self, LinkError> {
        let text = fs::read_to_string(path).map_err(|err| LinkError::io(path, err))?;
        let mut pipeline = Self::default();
        for (number, raw_line) in text.lines().enumerate() {
            let line = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            };
            let mut tokens = line.split_whitespace();
            let Some(pass_name) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();
            pipeline.add_config_line(path, number + 1, pass_name, &args)?;
        }
        Ok(pipeline)
    }

    /// Append a pass.
    pub fn with_pass(mut self, pass: Box<dyn Pass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Enable the link step; a `link` line in the config does the same.
    pub fn with_link(mut self) -> Self {
        self.link = true;
        self
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn link_enabled(&self) -> bool {
        self.link
    }

    /// Execute the pipeline over the loaded graphs and return the final one.
    ///
    /// With the link flag set the inputs are merged before the first pass.
    /// Without it exactly one input is required; multiple inputs without a
    /// link step are rejected rather than silently merged.
    pub fn run(&self, graphs: Vec<Graph>) -> Result<Graph, LinkError> {
        if graphs.is_empty() {
            return Err(LinkError::Config("no input graphs".to_string()));
        }

        let mut graph = match (self.link, graphs.len()) {
            (true, count) => {
                info!(inputs = count, "linking input graphs");
                link_graphs(graphs)
            }
            (false, 1) => link_graphs(graphs),
            (false, count) => {
                return Err(LinkError::Config(format!(
                    "{count} input graphs but no link step; add 'link' to the config or pass --link"
                )));
            }
        };

        for (index, pass) in self.passes.iter().enumerate() {
            debug!(
                index,
                pass = pass.name(),
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "applying pass"
            );
            pass.apply(&mut graph)
                .map_err(|err| err.in_pass(index, pass.name()))?;
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "pipeline complete"
        );
        Ok(graph)
    }

    fn add_config_line(
        &mut self,
        path: &Path,
        line: usize,
        pass_name: &str,
        args: &[&str],
    ) -> Result<(), LinkError> {
        match pass_name {
            "link" => {
                expect_no_args(path, line, pass_name, args)?;
                self.link = true;
            }
            "remove_nodes" => {
                let file = single_file_arg(path, line, pass_name, args)?;
                let patterns = rules::load_patterns(Path::new(file))
                    .map_err(|err| locate_pattern_error(path, line, err))?;
                self.passes.push(Box::new(RemoveNodesPass::matching(patterns)));
            }
            "remove_edges" => {
                let file = single_file_arg(path, line, pass_name, args)?;
                let edge_rules = rules::load_edge_rules(Path::new(file))
                    .map_err(|err| locate_pattern_error(path, line, err))?;
                self.passes.push(Box::new(RemoveEdgesPass::new(edge_rules)));
            }
            "regex_edge_gen" => {
                let file = single_file_arg(path, line, pass_name, args)?;
                let gen_rules = rules::load_gen_rules(Path::new(file))
                    .map_err(|err| locate_pattern_error(path, line, err))?;
                self.passes.push(Box::new(RegexEdgeGenPass::new(gen_rules)));
            }
            "cut_deg" => {
                let (max_in, max_out) = parse_deg_bounds(path, line, args)?;
                self.passes.push(Box::new(CutDegPass::new(max_in, max_out)));
            }
            "unique_edges" => {
                expect_no_args(path, line, pass_name, args)?;
                self.passes.push(Box::new(UniqueEdgesPass));
            }
            "extract_subgraph" => {
                let file = single_file_arg(path, line, pass_name, args)?;
                let names = rules::load_name_list(Path::new(file))?;
                self.passes.push(Box::new(ExtractSubgraphPass::new(names)));
            }
            "reverse" => {
                expect_no_args(path, line, pass_name, args)?;
                self.passes.push(Box::new(ReversePass));
            }
            "reparent" => {
                let file = single_file_arg(path, line, pass_name, args)?;
                let names = rules::load_name_list(Path::new(file))?;
                self.passes.push(Box::new(ReparentPass::new(names)));
            }
            other => {
                return Err(LinkError::config_at(
                    path,
                    line,
                    format!("unknown pass '{other}'"),
                ));
            }
        }
        Ok(())
    }
}

/// Attach the config location to a pattern-compile failure so the error
/// points at the pass line that referenced the rule file. Io and per-line
/// rule-file errors already carry their own location.
fn locate_pattern_error(path: &Path, line: usize, err: LinkError) -> LinkError {
    match err {
        LinkError::Pattern { pattern, message } => LinkError::config_at(
            path,
            line,
            format!("invalid pattern '{pattern}': {message}"),
        ),
        other => other,
    }
}

fn expect_no_args(
    path: &Path,
    line: usize,
    pass_name: &str,
    args: &[&str],
) -> Result<(), LinkError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(LinkError::config_at(
            path,
            line,
            format!("'{pass_name}' takes no arguments"),
        ))
    }
}

fn single_file_arg<'a>(
    path: &Path,
    line: usize,
    pass_name: &str,
    args: &[&'a str],
) -> Result<&'a str, LinkError> {
    match args {
        [file] => Ok(file),
        [] => Err(LinkError::config_at(
            path,
            line,
            format!("'{pass_name}' expects a file argument"),
        )),
        _ => Err(LinkError::config_at(
            path,
            line,
            format!("'{pass_name}' expects exactly one file argument"),
        )),
    }
}

/// `+N` bounds incoming degree, `-N` outgoing. Repeating a sign overwrites
/// the earlier bound.
fn parse_deg_bounds(
    path: &Path,
    line: usize,
    args: &[&str],
) -> Result<(Option<usize>, Option<usize>), LinkError> {
    let mut max_in = None;
    let mut max_out = None;
    for arg in args {
        if let Some(rest) = arg.strip_prefix('+') {
            max_in = Some(parse_bound(path, line, arg, rest)?);
        } else if let Some(rest) = arg.strip_prefix('-') {
            max_out = Some(parse_bound(path, line, arg, rest)?);
        } else {
            return Err(LinkError::config_at(
                path,
                line,
                format!("degree bound '{arg}' must start with '+' or '-'"),
            ));
        }
    }
    Ok((max_in, max_out))
}

fn parse_bound(path: &Path, line: usize, arg: &str, rest: &str) -> Result<usize, LinkError> {
    rest.parse::<usize>()
        .map_err(|_| LinkError::config_at(path, line, format!("invalid degree bound '{arg}'")))
}
