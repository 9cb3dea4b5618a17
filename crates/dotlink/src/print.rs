use graphviz_rust::dot_structures::{
    Edge as DotEdge, EdgeTy, Graph as DotGraph, Id, Node as DotNode, NodeId, Stmt, Vertex,
};
use graphviz_rust::printer::{DotPrinter, PrinterContext};

use crate::graph::Graph;

/// Serialize a [`Graph`] back to DOT text.
///
/// The output is a non-strict `digraph`: a strict one would let Graphviz
/// collapse duplicate edges, and edge multiplicity is part of the model.
/// Every node is declared first, in insertion order (isolated nodes must
/// survive a round trip), then every edge in list order.
pub fn to_dot_string(graph: &Graph) -> String {
    let mut stmts: Vec<Stmt> = Vec::with_capacity(graph.node_count() + graph.edge_count());
    for name in graph.nodes() {
        stmts.push(Stmt::Node(DotNode::new(node_id(name), vec![])));
    }
    for edge in graph.edges() {
        stmts.push(Stmt::Edge(DotEdge {
            ty: EdgeTy::Pair(Vertex::N(node_id(&edge.from)), Vertex::N(node_id(&edge.to))),
            attributes: vec![],
        }));
    }

    let dot_graph = DotGraph::DiGraph {
        id: graph_id(&graph.id),
        strict: false,
        stmts,
    };
    dot_graph.print(&mut PrinterContext::default())
}

fn node_id(name: &str) -> NodeId {
    NodeId(quote_id(name), None)
}

fn graph_id(id: &str) -> Id {
    if id.is_empty() {
        Id::Anonymous(String::new())
    } else {
        quote_id(id)
    }
}

// Case-insensitive in the DOT grammar, so "Node" needs quoting too.
const KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

fn is_keyword(name: &str) -> bool {
    KEYWORDS.iter().any(|kw| name.eq_ignore_ascii_case(kw))
}

/// Plain DOT ids and numerals print bare; anything else is quoted with DOT
/// escaping so the name parses back verbatim.
fn quote_id(name: &str) -> Id {
    if is_plain_id(name) && !is_keyword(name) {
        Id::Plain(name.to_string())
    } else {
        Id::Escaped(format!("\"{}\"", escape_dot_string(name)))
    }
}

fn is_plain_id(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_alphabetic() || first == '_' {
        return chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    }
    is_numeral(name)
}

fn is_numeral(name: &str) -> bool {
    let rest = name.strip_prefix('-').unwrap_or(name);
    if rest.is_empty() {
        return false;
    }
    match rest.split_once('.') {
        Some((integral, fractional)) => {
            if integral.is_empty() && fractional.is_empty() {
                return false;
            }
            integral.bytes().all(|b| b.is_ascii_digit())
                && fractional.bytes().all(|b| b.is_ascii_digit())
        }
        None => rest.bytes().all(|b| b.is_ascii_digit()),
    }
}

fn escape_dot_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\t' => output.push_str("\\t"),
            other => output.push(other),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_dot;

    fn pairs(graph: &Graph) -> Vec<(&str, &str)> {
        graph
            .edges()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect()
    }

    #[test]
    fn to_dot_round_trip_expected_names_and_edges_preserved() {
        let mut graph = Graph::new("calls");
        graph.add_edge("my node", "say \"hi\"");
        graph.add_edge("a", "my node");
        graph.add_node("lonely");

        let text = to_dot_string(&graph);
        let reparsed = parse_dot(&text).expect("printed DOT should parse");

        assert_eq!(reparsed.id, "calls");
        assert_eq!(
            reparsed.nodes().collect::<Vec<_>>(),
            vec!["my node", "say \"hi\"", "a", "lonely"]
        );
        assert_eq!(
            pairs(&reparsed),
            vec![("my node", "say \"hi\""), ("a", "my node")]
        );
    }

    #[test]
    fn to_dot_duplicate_edges_expected_non_strict_output() {
        let mut graph = Graph::new("g");
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");

        let text = to_dot_string(&graph);

        assert!(!text.contains("strict"));
        let reparsed = parse_dot(&text).expect("printed DOT should parse");
        assert_eq!(reparsed.edge_count(), 2);
    }

    #[test]
    fn to_dot_plain_name_expected_unquoted() {
        let mut graph = Graph::new("g");
        graph.add_node("plain_name");

        let text = to_dot_string(&graph);

        assert!(text.contains("plain_name"));
        assert!(!text.contains("\"plain_name\""));
    }

    #[test]
    fn to_dot_numeral_name_expected_unquoted() {
        let mut graph = Graph::new("g");
        graph.add_edge("5", "1.5");

        let text = to_dot_string(&graph);

        assert!(!text.contains('"'));
        let reparsed = parse_dot(&text).expect("printed DOT should parse");
        assert_eq!(pairs(&reparsed), vec![("5", "1.5")]);
    }

    #[test]
    fn to_dot_keyword_name_expected_quoted() {
        let mut graph = Graph::new("g");
        graph.add_edge("node", "Edge");

        let text = to_dot_string(&graph);
        let reparsed = parse_dot(&text).expect("printed DOT should parse");

        assert!(reparsed.contains_node("node"));
        assert!(reparsed.contains_node("Edge"));
    }

    #[test]
    fn to_dot_empty_graph_id_expected_anonymous_round_trip() {
        let mut graph = Graph::new("");
        graph.add_edge("a", "b");

        let text = to_dot_string(&graph);
        let reparsed = parse_dot(&text).expect("printed DOT should parse");

        assert_eq!(reparsed.id, "");
        assert_eq!(pairs(&reparsed), vec![("a", "b")]);
    }
}
