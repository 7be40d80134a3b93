use std::collections::HashSet;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::camera::Camera;
use super::interaction::{Interaction, PointerMode};
use super::layout::Layout;
use super::overlay::Overlays;
use super::path::{OrthogonalPath, edge_path};
use super::simulation::{FlowSimulation, Packet};
use super::types::{Edge, Graph, LayerKey, Node};

/// What a layout was computed from. A new graph with the same structure keeps
/// the current positions, including manually dragged ones.
#[derive(Clone, Debug, Default, PartialEq)]
struct Structure {
	node_ids: Vec<String>,
	edge_count: usize,
}

impl Structure {
	fn of(graph: &Graph) -> Self {
		Self {
			node_ids: graph.nodes.iter().map(|n| n.id.clone()).collect(),
			edge_count: graph.edges.len(),
		}
	}
}

/// All mutable state of one graph view. Pointer handlers, the simulation
/// timer and the frame loop each borrow it in turn.
pub struct GraphView {
	pub(super) graph: Graph,
	pub(super) layout: Layout,
	pub(super) collapsed: HashSet<LayerKey>,
	structure: Structure,
	/// Current view transform.
	pub camera: Camera,
	/// Gesture and hover state.
	pub interaction: Interaction,
	pub(super) simulation: FlowSimulation,
	/// Externally driven highlights and statuses.
	pub overlays: Overlays,
	pub(super) linking_mode: bool,
	pub(super) delete_enabled: bool,
	/// Canvas width in screen pixels.
	pub width: f64,
	/// Canvas height in screen pixels.
	pub height: f64,
	rng: SmallRng,
}

impl GraphView {
	/// Lays out `graph` for a canvas of the given size. `seed` drives the
	/// packet spawner.
	pub fn new(graph: Graph, width: f64, height: f64, seed: u64) -> Self {
		let mut view = Self {
			structure: Structure::of(&graph),
			layout: Layout::default(),
			graph,
			collapsed: HashSet::new(),
			camera: Camera::centered(width),
			interaction: Interaction::default(),
			simulation: FlowSimulation::default(),
			overlays: Overlays::default(),
			linking_mode: false,
			delete_enabled: true,
			width,
			height,
			rng: SmallRng::seed_from_u64(seed),
		};
		view.relayout();
		view
	}

	/// The graph as last handed in.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Node positions and layer bands of the last recompute.
	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	/// Live packets, oldest first.
	pub fn packets(&self) -> &[Packet] {
		self.simulation.packets()
	}

	/// Whether the band for `key` is folded into its header.
	pub fn is_collapsed(&self, key: LayerKey) -> bool {
		self.collapsed.contains(&key)
	}

	/// Replaces the graph. Layout is recomputed only when the node identities
	/// or the edge count changed.
	pub fn set_graph(&mut self, graph: Graph) {
		let structure = Structure::of(&graph);
		self.graph = graph;
		if structure != self.structure {
			self.structure = structure;
			self.relayout();
		}
		self.forget_stale_references();
	}

	/// Recomputes the grid layout. The node under an active drag keeps its
	/// live position.
	fn relayout(&mut self) {
		let mut layout = Layout::compute(&self.graph.nodes, &self.collapsed);
		if let Some(id) = self.interaction.dragged_node() {
			if let (Some(live), Some(slot)) = (self.layout.position(id), layout.positions.get_mut(id)) {
				*slot = live;
			}
		}
		self.layout = layout;
		info!(
			"layout: {} nodes placed across {} layers",
			self.layout.positions.len(),
			self.layout.layers.len()
		);
	}

	fn forget_stale_references(&mut self) {
		let graph = &self.graph;
		let interaction = &mut self.interaction;
		if interaction
			.hovered_node
			.as_deref()
			.is_some_and(|id| graph.node(id).is_none())
		{
			interaction.hovered_node = None;
		}
		if interaction
			.hovered_edge
			.as_deref()
			.is_some_and(|id| graph.edge(id).is_none())
		{
			interaction.hovered_edge = None;
			interaction.delete_hovered = false;
		}
		let orphaned = match &interaction.mode {
			PointerMode::DraggingNode(id)
			| PointerMode::LinkDragging { source: id }
			| PointerMode::LinkClickPending { source: id } => graph.node(id).is_none(),
			PointerMode::Idle | PointerMode::Panning => false,
		};
		if orphaned {
			interaction.mode = PointerMode::Idle;
		}
	}

	/// Collapses or expands one layer band and lays the graph out again.
	pub fn toggle_layer(&mut self, key: LayerKey) {
		if !self.collapsed.remove(&key) {
			self.collapsed.insert(key);
		}
		debug!("layer {key:?} collapsed: {}", self.is_collapsed(key));
		self.relayout();
	}

	/// Turning linking mode off abandons a pending two-click link.
	pub fn set_linking_mode(&mut self, enabled: bool) {
		self.linking_mode = enabled;
		if !enabled && matches!(self.interaction.mode, PointerMode::LinkClickPending { .. }) {
			self.interaction.mode = PointerMode::Idle;
		}
	}

	/// Whether the edge delete affordance is shown and clickable.
	pub fn set_delete_enabled(&mut self, enabled: bool) {
		self.delete_enabled = enabled;
		if !enabled {
			self.interaction.delete_hovered = false;
		}
	}

	/// Starts or stops the packet animation. Stopping empties it at once.
	pub fn set_simulating(&mut self, active: bool) {
		if active != self.simulation.is_active() {
			info!("simulation {}", if active { "started" } else { "stopped" });
		}
		self.simulation.set_active(active);
	}

	/// One simulation step; a no-op while stopped.
	pub fn tick_simulation(&mut self) {
		self.simulation.tick(
			&self.graph,
			&self.layout.positions,
			self.overlays.highlighted_edge.as_deref(),
			&mut self.rng,
		);
	}

	/// Records a new canvas size. The camera is left alone.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Current route of `edge`, `None` while an endpoint is hidden or missing.
	pub fn edge_path(&self, edge: &Edge) -> Option<OrthogonalPath> {
		edge_path(edge, &self.graph, &self.layout.positions)
	}

	/// Nodes that no edge touches.
	pub fn disconnected_nodes(&self) -> impl Iterator<Item = &Node> {
		let connected = self.graph.connected_node_ids();
		self.graph
			.nodes
			.iter()
			.filter(move |n| !connected.contains(n.id.as_str()))
	}
}
