//! Layered architecture diagram drawn on a single canvas: deterministic layer
//! layout, orthogonal edges, animated data packets and pointer editing.

mod camera;
mod component;
mod error;
mod interaction;
mod layout;
mod minimap;
mod overlay;
mod path;
mod render;
mod simulation;
mod state;
mod types;

pub use component::ArchitectureGraph;
pub use interaction::{GraphEvent, PointerInput};
pub use render::node_style;
pub use state::GraphView;
pub use types::{Edge, Graph, LayerKey, Node, NodeType, Point};
