use std::collections::{HashMap, HashSet};

use crate::errors::LinkError;
use crate::graph::Graph;
use crate::matcher::{EdgeRule, NamePattern};
use crate::rules::{GenDirection, GenRule};

/// A single transformation over the graph. Passes run in config order, each
/// mutating the graph in place; the first failure aborts the pipeline.
pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError>;
}

#[derive(Clone, Debug)]
enum NodeSelector {
    Matching(Vec<NamePattern>),
    Named(HashSet<String>),
}

/// Removes nodes (and their incident edges) by pattern or by exact name.
#[derive(Clone, Debug)]
pub struct RemoveNodesPass {
    selector: NodeSelector,
}

impl RemoveNodesPass {
    /// Remove every node whose name matches one of the patterns.
    pub fn matching(patterns: Vec<NamePattern>) -> Self {
        Self {
            selector: NodeSelector::Matching(patterns),
        }
    }

    /// Remove exactly the named nodes.
    pub fn named(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            selector: NodeSelector::Named(names.into_iter().collect()),
        }
    }
}

impl Pass for RemoveNodesPass {
    fn name(&self) -> &'static str {
        "remove_nodes"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        graph.retain_nodes(|name| match &self.selector {
            NodeSelector::Matching(patterns) => {
                !patterns.iter().any(|pattern| pattern.is_match(name))
            }
            NodeSelector::Named(names) => !names.contains(name),
        });
        Ok(())
    }
}

/// Removes every edge selected by at least one source/destination rule.
#[derive(Clone, Debug)]
pub struct RemoveEdgesPass {
    rules: Vec<EdgeRule>,
}

impl RemoveEdgesPass {
    pub fn new(rules: Vec<EdgeRule>) -> Self {
        Self { rules }
    }
}

impl Pass for RemoveEdgesPass {
    fn name(&self) -> &'static str {
        "remove_edges"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        let mut keep = Vec::with_capacity(graph.edge_count());
        for edge in graph.edges() {
            let mut selected = false;
            for rule in &self.rules {
                if rule.matches(&edge.from, &edge.to)? {
                    selected = true;
                    break;
                }
            }
            keep.push(!selected);
        }
        let mut index = 0;
        graph.retain_edges(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
        Ok(())
    }
}

/// Adds edges between pattern-matched nodes and a literal target node.
#[derive(Clone, Debug)]
pub struct RegexEdgeGenPass {
    rules: Vec<GenRule>,
}

impl RegexEdgeGenPass {
    pub fn new(rules: Vec<GenRule>) -> Self {
        Self { rules }
    }
}

impl Pass for RegexEdgeGenPass {
    fn name(&self) -> &'static str {
        "regex_edge_gen"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        for rule in &self.rules {
            // Snapshot before the target is inserted so a freshly created
            // target never matches its own rule.
            let matched: Vec<String> = graph
                .nodes()
                .filter(|name| rule.pattern.is_match(name))
                .map(str::to_string)
                .collect();
            graph.add_node(rule.target.clone());
            for name in matched {
                match rule.direction {
                    GenDirection::ToTarget => graph.add_edge(name, rule.target.clone()),
                    GenDirection::FromTarget => graph.add_edge(rule.target.clone(), name),
                }
            }
        }
        Ok(())
    }
}

/// Keeps only nodes whose degrees stay within the configured bounds.
///
/// Degrees are measured once, against the graph as it stands when the pass
/// starts; duplicate edges count individually. Either bound may be absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct CutDegPass {
    max_in: Option<usize>,
    max_out: Option<usize>,
}

impl CutDegPass {
    pub fn new(max_in: Option<usize>, max_out: Option<usize>) -> Self {
        Self { max_in, max_out }
    }
}

impl Pass for CutDegPass {
    fn name(&self) -> &'static str {
        "cut_deg"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        if self.max_in.is_none() && self.max_out.is_none() {
            return Ok(());
        }
        let mut incoming: HashMap<String, usize> = HashMap::new();
        let mut outgoing: HashMap<String, usize> = HashMap::new();
        for edge in graph.edges() {
            *outgoing.entry(edge.from.clone()).or_insert(0) += 1;
            *incoming.entry(edge.to.clone()).or_insert(0) += 1;
        }
        graph.retain_nodes(|name| {
            let in_deg = incoming.get(name).copied().unwrap_or(0);
            let out_deg = outgoing.get(name).copied().unwrap_or(0);
            self.max_in.is_none_or(|bound| in_deg <= bound)
                && self.max_out.is_none_or(|bound| out_deg <= bound)
        });
        Ok(())
    }
}

/// Drops duplicate edges, keeping each (from, to) pair's first occurrence.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniqueEdgesPass;

impl Pass for UniqueEdgesPass {
    fn name(&self) -> &'static str {
        "unique_edges"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        graph.retain_edges(|edge| seen.insert((edge.from.clone(), edge.to.clone())));
        Ok(())
    }
}

/// Keeps exactly the listed nodes; everything else is removed with cascade.
#[derive(Clone, Debug)]
pub struct ExtractSubgraphPass {
    names: HashSet<String>,
}

impl ExtractSubgraphPass {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl Pass for ExtractSubgraphPass {
    fn name(&self) -> &'static str {
        "extract_subgraph"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        graph.retain_nodes(|name| self.names.contains(name));
        Ok(())
    }
}

/// Swaps every edge's direction.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReversePass;

impl Pass for ReversePass {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        graph.reverse_edges();
        Ok(())
    }
}

/// Splices listed nodes out of the graph: each pair of a non-loop incoming
/// and non-loop outgoing edge around a listed node becomes a direct edge,
/// then the node is removed. Names are processed in list order, so a chain
/// of listed nodes collapses step by step. Absent names are skipped.
#[derive(Clone, Debug)]
pub struct ReparentPass {
    names: Vec<String>,
}

impl ReparentPass {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl Pass for ReparentPass {
    fn name(&self) -> &'static str {
        "reparent"
    }

    fn apply(&self, graph: &mut Graph) -> Result<(), LinkError> {
        for name in &self.names {
            if !graph.contains_node(name) {
                continue;
            }
            let sources: Vec<String> = graph
                .incoming_edges(name)
                .filter(|edge| edge.from != *name)
                .map(|edge| edge.from.clone())
                .collect();
            let targets: Vec<String> = graph
                .outgoing_edges(name)
                .filter(|edge| edge.to != *name)
                .map(|edge| edge.to.clone())
                .collect();
            for source in &sources {
                for target in &targets {
                    graph.add_edge(source.clone(), target.clone());
                }
            }
            graph.remove_node(name);
        }
        Ok(())
    }
}
