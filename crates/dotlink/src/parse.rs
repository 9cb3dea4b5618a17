use graphviz_rust::dot_structures::{
    Edge as DotEdge, EdgeTy, Graph as DotGraph, Id, NodeId, Stmt, Vertex,
};

use crate::errors::LinkError;
use crate::graph::Graph;

/// Parse DOT source into a [`Graph`].
///
/// Only `digraph` input is accepted. Node names round-trip verbatim: quoted
/// ids are unquoted and unescaped, everything else is taken as written.
/// Attributes carry styling only and are ignored; the model is names and
/// edges.
pub fn parse_dot(source: &str) -> Result<Graph, LinkError> {
    if has_undirected_edge(source) {
        return Err(LinkError::InvalidGraph(
            "undirected edge token '--' is not supported".to_string(),
        ));
    }

    let dot_graph = graphviz_rust::parse(source).map_err(LinkError::DotParse)?;
    convert_graph(dot_graph)
}

fn convert_graph(dot_graph: DotGraph) -> Result<Graph, LinkError> {
    // `strict` only changes how Graphviz deduplicates when rendering;
    // statements are read as written either way.
    let (id, stmts) = match dot_graph {
        DotGraph::DiGraph { id, stmts, .. } => (id, stmts),
        DotGraph::Graph { .. } => {
            return Err(LinkError::InvalidGraph(
                "only 'digraph' is supported".to_string(),
            ));
        }
    };

    let mut graph = Graph::new(graph_id_to_string(id)?);
    collect_statements(&mut graph, &stmts)?;
    Ok(graph)
}

fn collect_statements(graph: &mut Graph, stmts: &[Stmt]) -> Result<(), LinkError> {
    for stmt in stmts {
        match stmt {
            Stmt::Node(node) => {
                graph.add_node(node_name(&node.id)?);
            }
            Stmt::Edge(edge) => collect_edge(graph, edge)?,
            Stmt::Subgraph(subgraph) => collect_statements(graph, &subgraph.stmts)?,
            Stmt::Attribute(_) | Stmt::GAttribute(_) => {}
        }
    }
    Ok(())
}

fn collect_edge(graph: &mut Graph, edge: &DotEdge) -> Result<(), LinkError> {
    let endpoints = match &edge.ty {
        EdgeTy::Pair(from, to) => vec![vertex_name(from)?, vertex_name(to)?],
        EdgeTy::Chain(chain) => {
            let mut names = Vec::with_capacity(chain.len());
            for vertex in chain {
                names.push(vertex_name(vertex)?);
            }
            names
        }
    };

    if endpoints.len() < 2 {
        return Err(LinkError::InvalidGraph(
            "edge chain must contain at least two vertices".to_string(),
        ));
    }

    for pair in endpoints.windows(2) {
        graph.add_edge(pair[0].clone(), pair[1].clone());
    }
    Ok(())
}

fn vertex_name(vertex: &Vertex) -> Result<String, LinkError> {
    match vertex {
        Vertex::N(node_id) => node_name(node_id),
        Vertex::S(_) => Err(LinkError::InvalidGraph(
            "subgraphs as edge endpoints are not supported".to_string(),
        )),
    }
}

// A port picks a compass point for rendering; only the base id names the
// node, so ports are dropped.
fn node_name(node_id: &NodeId) -> Result<String, LinkError> {
    id_to_string(&node_id.0)
}

fn graph_id_to_string(id: Id) -> Result<String, LinkError> {
    match id {
        // The upstream parser stuffs anonymous ids with a random number;
        // the graph had no name, so the model keeps none.
        Id::Anonymous(_) => Ok(String::new()),
        other => id_to_string(&other),
    }
}

fn id_to_string(id: &Id) -> Result<String, LinkError> {
    match id {
        Id::Plain(value) => Ok(value.clone()),
        Id::Escaped(value) => {
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .ok_or_else(|| {
                    LinkError::InvalidGraph(format!("escaped string id '{value}' is missing quotes"))
                })?;
            Ok(unescape_dot_string(unquoted))
        }
        Id::Html(_) => Err(LinkError::InvalidGraph(
            "HTML ids are not supported".to_string(),
        )),
        Id::Anonymous(_) => Ok(String::new()),
    }
}

fn unescape_dot_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('"') => output.push('"'),
            Some('\\') => output.push('\\'),
            Some(other) => output.push(other),
            None => output.push('\\'),
        }
    }
    output
}

#[derive(Clone, Copy, PartialEq)]
enum Lex {
    Code,
    Str,
    LineComment,
    BlockComment,
}

/// Scan for a `--` token outside strings and comments. The upstream grammar
/// would otherwise read `a -- b` inside a digraph as two nodes and lose the
/// edge silently.
fn has_undirected_edge(source: &str) -> bool {
    let mut state = Lex::Code;
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            Lex::Code => match ch {
                '"' => state = Lex::Str,
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = Lex::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = Lex::BlockComment;
                }
                '-' if chars.peek() == Some(&'-') => return true,
                _ => {}
            },
            Lex::Str => match ch {
                '\\' => {
                    chars.next();
                }
                '"' => state = Lex::Code,
                _ => {}
            },
            Lex::LineComment => {
                if ch == '\n' {
                    state = Lex::Code;
                }
            }
            Lex::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Lex::Code;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(graph: &Graph) -> Vec<(&str, &str)> {
        graph
            .edges()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect()
    }

    #[test]
    fn parse_dot_chain_expected_consecutive_pairs() {
        let graph = parse_dot("digraph G { a -> b -> c }").expect("graph should parse");

        assert_eq!(graph.id, "G");
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(pairs(&graph), vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn parse_dot_anonymous_graph_expected_empty_id() {
        let graph = parse_dot("digraph { a -> b }").expect("graph should parse");
        assert_eq!(graph.id, "");
    }

    #[test]
    fn parse_dot_quoted_id_expected_unescaped_name() {
        let graph =
            parse_dot(r#"digraph { "my node" -> "say \"hi\"" }"#).expect("graph should parse");

        assert!(graph.contains_node("my node"));
        assert!(graph.contains_node("say \"hi\""));
    }

    #[test]
    fn parse_dot_duplicate_edges_expected_preserved() {
        let graph = parse_dot("digraph { a -> b a -> b }").expect("graph should parse");
        assert_eq!(pairs(&graph), vec![("a", "b"), ("a", "b")]);
    }

    #[test]
    fn parse_dot_strict_keyword_expected_statements_read_as_written() {
        let graph = parse_dot("strict digraph { a -> b a -> b }").expect("graph should parse");
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn parse_dot_isolated_node_expected_kept() {
        let graph = parse_dot("digraph { lonely a -> b }").expect("graph should parse");
        assert!(graph.contains_node("lonely"));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn parse_dot_subgraph_statements_expected_flattened() {
        let graph = parse_dot(
            r#"
            digraph G {
                a -> b
                subgraph cluster_inner {
                    c -> d
                    e
                }
            }
            "#,
        )
        .expect("graph should parse");

        assert_eq!(graph.node_count(), 5);
        assert_eq!(pairs(&graph), vec![("a", "b"), ("c", "d")]);
    }

    #[test]
    fn parse_dot_subgraph_as_edge_endpoint_expected_error() {
        let err = parse_dot("digraph g { a -> subgraph { b } }").expect_err("must fail");
        assert!(err.to_string().contains("subgraphs as edge endpoints"));
    }

    #[test]
    fn parse_dot_port_on_node_id_expected_base_name_kept() {
        let graph = parse_dot("digraph { a:n -> b }").expect("graph should parse");
        assert_eq!(pairs(&graph), vec![("a", "b")]);
    }

    #[test]
    fn parse_dot_attributes_expected_ignored() {
        let graph = parse_dot(
            r#"digraph { rankdir=LR; node [shape=box]; a [label="A!"]; a -> b [style=dotted] }"#,
        )
        .expect("graph should parse");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(pairs(&graph), vec![("a", "b")]);
    }

    #[test]
    fn parse_dot_undirected_token_expected_error() {
        let err = parse_dot("digraph G { a -- b }").expect_err("must fail");
        assert!(err.to_string().contains("undirected edge token"));
    }

    #[test]
    fn parse_dot_undirected_token_in_comment_or_string_expected_accepted() {
        let graph = parse_dot("digraph { // a -- b\n \"x--y\" -> z }").expect("graph should parse");
        assert!(graph.contains_node("x--y"));
    }

    #[test]
    fn parse_dot_graph_keyword_expected_error() {
        let err = parse_dot("graph G { a }").expect_err("must fail");
        assert!(err.to_string().contains("only 'digraph'"));
    }

    #[test]
    fn parse_dot_malformed_source_expected_parse_error() {
        let err = parse_dot("digraph {").expect_err("must fail");
        assert!(matches!(err, LinkError::DotParse(_)));
    }
}
