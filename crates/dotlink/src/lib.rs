//! Call-graph linking and transformation for Graphviz DOT files.
//!
//! dotlink parses DOT digraphs, optionally links several into one graph,
//! runs an ordered pipeline of transformation passes over it, and prints
//! the result back as DOT.

pub mod errors;
pub mod graph;
pub mod matcher;
pub mod parse;
pub mod passes;
pub mod pipeline;
pub mod print;
pub mod rules;

pub use errors::*;
pub use graph::*;
pub use matcher::*;
pub use parse::*;
pub use passes::*;
pub use pipeline::*;
pub use print::*;
pub use rules::*;
