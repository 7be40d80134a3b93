//! Externally driven highlight state layered on top of the graph.

use std::collections::HashSet;

use super::types::LayerKey;

/// Status halo drawn around a node. Variants are declared in precedence order,
/// so the minimum of several applicable states is the one shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeStatus {
	Error,
	Success,
	Attention,
}

impl NodeStatus {
	pub fn color(self) -> &'static str {
		match self {
			NodeStatus::Error => "#ef4444",
			NodeStatus::Success => "#22c55e",
			NodeStatus::Attention => "#fbbf24",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlays {
	/// Walkthrough focus.
	pub highlighted_node: Option<String>,
	pub highlighted_edge: Option<String>,
	/// Transient attention requested by an assistant.
	pub attention_nodes: HashSet<String>,
	pub attention_layer: Option<LayerKey>,
	/// Validation feedback.
	pub success_nodes: HashSet<String>,
	pub error_nodes: HashSet<String>,
}

impl Overlays {
	pub fn status(&self, node_id: &str) -> Option<NodeStatus> {
		[
			(NodeStatus::Error, &self.error_nodes),
			(NodeStatus::Success, &self.success_nodes),
			(NodeStatus::Attention, &self.attention_nodes),
		]
		.into_iter()
		.filter(|(_, ids)| ids.contains(node_id))
		.map(|(status, _)| status)
		.min()
	}

	pub fn is_layer_active(&self, layer: LayerKey) -> bool {
		self.attention_layer == Some(layer)
	}
}
