use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// In-memory directed graph: nodes unique by name, edges as an ordered list
/// with duplicates allowed. Nodes and edges enumerate in insertion order so
/// repeated runs print identical output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub id: String,
    nodes: Vec<String>,
    node_set: HashSet<String>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
            node_set: HashSet::new(),
            edges: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.node_set.contains(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Insert a node, keeping the first insertion's position. Returns whether
    /// the node was new.
    pub fn add_node(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.node_set.contains(&name) {
            return false;
        }
        self.node_set.insert(name.clone());
        self.nodes.push(name);
        true
    }

    /// Append an edge. Unknown endpoints are inserted as nodes first, the way
    /// a DOT edge statement declares its endpoints, so every edge always
    /// references nodes present in the graph.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        let to = to.into();
        self.add_node(from.clone());
        self.add_node(to.clone());
        self.edges.push(Edge { from, to });
    }

    /// Remove a node and every edge touching it. Removing a name that is not
    /// in the graph is a no-op: passes work from best-effort name lists that
    /// may reference nodes earlier passes already dropped.
    pub fn remove_node(&mut self, name: &str) {
        if !self.node_set.remove(name) {
            return;
        }
        self.nodes.retain(|n| n != name);
        self.edges.retain(|e| e.from != name && e.to != name);
    }

    /// Keep only nodes for which `keep` returns true, cascading removal to
    /// every edge that loses an endpoint.
    pub fn retain_nodes<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let mut removed: HashSet<String> = HashSet::new();
        self.nodes.retain(|name| {
            if keep(name) {
                true
            } else {
                removed.insert(name.clone());
                false
            }
        });
        if removed.is_empty() {
            return;
        }
        for name in &removed {
            self.node_set.remove(name);
        }
        self.edges
            .retain(|edge| !removed.contains(&edge.from) && !removed.contains(&edge.to));
    }

    /// Keep only edges for which `keep` returns true. The node set is
    /// untouched.
    pub fn retain_edges<F>(&mut self, keep: F)
    where
        F: FnMut(&Edge) -> bool,
    {
        self.edges.retain(keep);
    }

    /// Swap every edge's endpoints in place. Edge list order is preserved.
    pub fn reverse_edges(&mut self) {
        for edge in &mut self.edges {
            std::mem::swap(&mut edge.from, &mut edge.to);
        }
    }

    pub fn outgoing_edges<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.from == node)
    }

    pub fn incoming_edges<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.to == node)
    }

    /// Fold another graph into this one: nodes union by name (the first
    /// occurrence keeps its position), edges concatenate after the existing
    /// list. The receiving graph keeps its id.
    pub fn merge(&mut self, other: Graph) {
        for name in other.nodes {
            self.add_node(name);
        }
        self.edges.extend(other.edges);
    }
}

/// Merge any number of graphs into one, in input order. The merged graph
/// takes the first graph's id. Linking a single graph returns it unchanged;
/// linking nothing yields an empty graph.
pub fn link_graphs(graphs: impl IntoIterator<Item = Graph>) -> Graph {
    let mut iter = graphs.into_iter();
    let Some(mut merged) = iter.next() else {
        return Graph::default();
    };
    for graph in iter {
        merged.merge(graph);
    }
    merged
}
