pub mod document;
pub mod graph;
