//! Reusable view components.
pub mod architecture_graph;
