//! Pointer gesture state machine: pan, wheel zoom, node drag, edge hover and
//! delete, layer header toggles, and the two ways of drawing a new link.

use log::debug;

use super::path::{DELETE_HIT_RADIUS, EDGE_HIT_DISTANCE};
use super::state::GraphView;
use super::types::{LayerKey, Node, Point};

/// The gesture currently in progress. Hover state lives beside it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PointerMode {
	#[default]
	Idle,
	Panning,
	DraggingNode(String),
	/// Shift-drag from `source`, committed on release over another node.
	LinkDragging { source: String },
	/// Linking mode: `source` was clicked, waiting for the second click.
	LinkClickPending { source: String },
}

#[derive(Clone, Debug, Default)]
pub struct Interaction {
	pub mode: PointerMode,
	pub hovered_node: Option<String>,
	pub hovered_edge: Option<String>,
	/// Pointer is over the hovered edge's delete affordance.
	pub delete_hovered: bool,
	pub hovered_layer: Option<LayerKey>,
	/// World-space end of the link preview line.
	pub rubber_band: Point,
	/// Screen-space position of the previous pointer event.
	pub last_pointer: Point,
}

impl Interaction {
	pub fn link_source(&self) -> Option<&str> {
		match &self.mode {
			PointerMode::LinkDragging { source } | PointerMode::LinkClickPending { source } => {
				Some(source)
			}
			_ => None,
		}
	}

	pub fn dragged_node(&self) -> Option<&str> {
		match &self.mode {
			PointerMode::DraggingNode(id) => Some(id),
			_ => None,
		}
	}

	pub fn is_grabbing(&self) -> bool {
		matches!(self.mode, PointerMode::Panning | PointerMode::DraggingNode(_))
	}

	fn clear_hover(&mut self) {
		self.hovered_node = None;
		self.hovered_edge = None;
		self.delete_hovered = false;
		self.hovered_layer = None;
	}
}

/// A pointer event in canvas-relative screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
	/// Pixels from the canvas' left edge.
	pub x: f64,
	/// Pixels from the canvas' top edge.
	pub y: f64,
	/// Shift held, which turns a node drag into a link drag.
	pub shift: bool,
}

impl PointerInput {
	/// Unmodified pointer at `(x, y)`.
	pub fn at(x: f64, y: f64) -> Self {
		Self { x, y, shift: false }
	}

	/// Same position with shift held.
	pub fn with_shift(self) -> Self {
		Self {
			shift: true,
			..self
		}
	}

	fn screen(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Notifications for whoever owns the graph.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// A plain click on a node, which also starts dragging it.
	NodeClicked(Node),
	/// A link gesture finished between two distinct nodes. The receiver
	/// de-duplicates and assigns the edge id.
	Connect {
		/// Node the gesture started on.
		source: String,
		/// Node it was released or second-clicked on.
		target: String,
	},
	/// The delete affordance of this edge was clicked.
	DeleteEdge(String),
}

impl GraphView {
	/// Starts a gesture. Clicks on the delete affordance, a layer header or a
	/// node resolve here; anything else starts a pan.
	pub fn pointer_down(&mut self, input: PointerInput) -> Option<GraphEvent> {
		let screen = input.screen();
		let world = self.camera.to_world(screen);
		self.interaction.last_pointer = screen;

		if self.delete_enabled && self.interaction.delete_hovered {
			if let Some(edge_id) = self.interaction.hovered_edge.take() {
				self.interaction.delete_hovered = false;
				debug!("delete requested for edge {edge_id}");
				return Some(GraphEvent::DeleteEdge(edge_id));
			}
		}

		if let Some(key) = self.layout.header_at(world) {
			self.toggle_layer(key);
			return None;
		}

		let Some(node) = self.layout.node_at(&self.graph.nodes, world).cloned() else {
			self.interaction.mode = PointerMode::Panning;
			return None;
		};

		if self.linking_mode {
			let pending = match &self.interaction.mode {
				PointerMode::LinkClickPending { source } => Some(source.clone()),
				_ => None,
			};
			return match pending {
				None => {
					self.interaction.mode = PointerMode::LinkClickPending { source: node.id };
					self.interaction.rubber_band = world;
					None
				}
				Some(source) => {
					self.interaction.mode = PointerMode::Idle;
					if source == node.id {
						debug!("link from {source} cancelled");
						None
					} else {
						debug!("link {source} -> {}", node.id);
						Some(GraphEvent::Connect {
							source,
							target: node.id,
						})
					}
				}
			};
		}

		if input.shift {
			self.interaction.mode = PointerMode::LinkDragging { source: node.id };
			self.interaction.rubber_band = world;
			return None;
		}

		self.interaction.mode = PointerMode::DraggingNode(node.id.clone());
		Some(GraphEvent::NodeClicked(node))
	}

	/// Drives the active gesture, then refreshes hover state.
	pub fn pointer_move(&mut self, input: PointerInput) {
		let screen = input.screen();
		let (dx, dy) = (
			screen.x - self.interaction.last_pointer.x,
			screen.y - self.interaction.last_pointer.y,
		);
		self.interaction.last_pointer = screen;

		match &self.interaction.mode {
			PointerMode::DraggingNode(id) => {
				if let Some(p) = self.layout.positions.get_mut(id) {
					p.x += dx / self.camera.scale;
					p.y += dy / self.camera.scale;
				}
			}
			PointerMode::Panning => self.camera.pan(dx, dy),
			PointerMode::LinkDragging { .. } | PointerMode::LinkClickPending { .. } => {
				self.interaction.rubber_band = self.camera.to_world(screen);
			}
			PointerMode::Idle => {}
		}

		self.update_hover(self.camera.to_world(screen));
	}

	/// Ends the gesture. A link drag released over another node connects.
	pub fn pointer_up(&mut self) -> Option<GraphEvent> {
		match std::mem::take(&mut self.interaction.mode) {
			PointerMode::LinkDragging { source } => {
				let target = self.interaction.hovered_node.clone()?;
				if target == source {
					return None;
				}
				debug!("link {source} -> {target}");
				Some(GraphEvent::Connect { source, target })
			}
			PointerMode::LinkClickPending { source } if self.linking_mode => {
				self.interaction.mode = PointerMode::LinkClickPending { source };
				None
			}
			_ => None,
		}
	}

	/// Leaving the canvas ends the gesture exactly like a release.
	pub fn pointer_leave(&mut self) -> Option<GraphEvent> {
		let event = self.pointer_up();
		self.interaction.clear_hover();
		event
	}

	/// Zooms around the pointer.
	pub fn wheel(&mut self, input: PointerInput, delta_y: f64) {
		self.camera.wheel(input.screen(), delta_y);
	}

	/// Header pills shadow nodes, and nodes shadow edges.
	fn update_hover(&mut self, world: Point) {
		let layer = self.layout.header_at(world);
		let node = match layer {
			Some(_) => None,
			None => self
				.layout
				.node_at(&self.graph.nodes, world)
				.map(|n| n.id.clone()),
		};
		let edge = match (layer, &node) {
			(None, None) => self.edge_at(world),
			_ => None,
		};

		self.interaction.hovered_layer = layer;
		self.interaction.hovered_node = node;
		match edge {
			Some((id, over_delete)) => {
				self.interaction.hovered_edge = Some(id);
				self.interaction.delete_hovered = over_delete && self.delete_enabled;
			}
			None => {
				self.interaction.hovered_edge = None;
				self.interaction.delete_hovered = false;
			}
		}
	}

	/// Closest edge within [`EDGE_HIT_DISTANCE`], and whether the point is also
	/// on its delete affordance.
	fn edge_at(&self, world: Point) -> Option<(String, bool)> {
		let mut best = None;
		let mut best_distance = EDGE_HIT_DISTANCE;
		for edge in &self.graph.edges {
			let Some(path) = self.edge_path(edge) else {
				continue;
			};
			let distance = path.distance_to(world);
			if distance < best_distance {
				best_distance = distance;
				best = Some((edge, path));
			}
		}
		best.map(|(edge, path)| {
			(
				edge.id.clone(),
				path.midpoint().distance(world) < DELETE_HIT_RADIUS,
			)
		})
	}

	/// CSS cursor for the current state.
	pub fn cursor(&self) -> &'static str {
		if self.interaction.is_grabbing() {
			"grabbing"
		} else if self.interaction.delete_hovered {
			"pointer"
		} else if self.linking_mode {
			"crosshair"
		} else {
			"grab"
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::architecture_graph::layout::NODE_HEIGHT;
	use crate::components::architecture_graph::types::{Edge, Graph, NodeType};

	fn node(id: &str, node_type: NodeType) -> Node {
		Node {
			id: id.into(),
			label: id.into(),
			node_type,
			description: String::new(),
			technologies: vec!["Rust".into()],
		}
	}

	fn edge(id: &str, source: &str, target: &str) -> Edge {
		Edge {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			label: None,
		}
	}

	/// `a` and `b` sit side by side in the service band, `c` in the data band.
	fn view() -> GraphView {
		let graph = Graph {
			nodes: vec![
				node("a", NodeType::Server),
				node("b", NodeType::Worker),
				node("c", NodeType::Database),
			],
			edges: vec![edge("ab", "a", "b"), edge("bc", "b", "c")],
			..Default::default()
		};
		GraphView::new(graph, 1000.0, 800.0, 3)
	}

	fn screen_of(view: &GraphView, world: Point) -> PointerInput {
		let p = view.camera.to_screen(world);
		PointerInput::at(p.x, p.y)
	}

	fn on_node(view: &GraphView, id: &str) -> PointerInput {
		screen_of(view, view.layout().position(id).unwrap())
	}

	fn edge_mid(view: &GraphView, id: &str) -> Point {
		let edge = view.graph().edge(id).unwrap().clone();
		view.edge_path(&edge).unwrap().midpoint()
	}

	#[test]
	fn plain_click_drags_and_reports_node() {
		let mut view = view();
		let start = on_node(&view, "a");
		let event = view.pointer_down(start);
		assert!(matches!(event, Some(GraphEvent::NodeClicked(ref n)) if n.id == "a"));
		assert_eq!(view.interaction.dragged_node(), Some("a"));

		let before = view.layout().position("a").unwrap();
		view.pointer_move(PointerInput::at(start.x + 30.0, start.y - 15.0));
		let after = view.layout().position("a").unwrap();
		let scale = view.camera.scale;
		assert!((after.x - before.x - 30.0 / scale).abs() < 1e-9);
		assert!((after.y - before.y + 15.0 / scale).abs() < 1e-9);

		assert_eq!(view.pointer_up(), None);
		assert_eq!(view.interaction.mode, PointerMode::Idle);
	}

	#[test]
	fn empty_space_pans_by_raw_delta() {
		let mut view = view();
		let camera = view.camera;
		view.pointer_down(PointerInput::at(5.0, 790.0));
		assert_eq!(view.interaction.mode, PointerMode::Panning);
		view.pointer_move(PointerInput::at(25.0, 770.0));
		assert_eq!(view.camera.offset_x, camera.offset_x + 20.0);
		assert_eq!(view.camera.offset_y, camera.offset_y - 20.0);
		view.pointer_up();
		assert!(!view.interaction.is_grabbing());
	}

	#[test]
	fn header_click_toggles_collapse() {
		let mut view = view();
		let header_y = view.layout().layers[&LayerKey::Service].y;
		let input = screen_of(&view, Point::new(0.0, header_y));
		assert_eq!(view.pointer_down(input), None);
		assert!(view.is_collapsed(LayerKey::Service));
		assert!(view.layout().position("a").is_none());
		assert_eq!(view.interaction.mode, PointerMode::Idle);
	}

	#[test]
	fn shift_drag_links_to_hovered_node() {
		let mut view = view();
		assert_eq!(view.pointer_down(on_node(&view, "a").with_shift()), None);
		assert_eq!(view.interaction.link_source(), Some("a"));
		let over_c = on_node(&view, "c");
		view.pointer_move(over_c);
		assert_eq!(
			view.interaction.rubber_band,
			view.layout().position("c").unwrap()
		);
		assert_eq!(
			view.pointer_up(),
			Some(GraphEvent::Connect {
				source: "a".into(),
				target: "c".into()
			})
		);
		assert_eq!(view.interaction.link_source(), None);
	}

	#[test]
	fn shift_drag_released_on_itself_does_nothing() {
		let mut view = view();
		let on_a = on_node(&view, "a");
		view.pointer_down(on_a.with_shift());
		view.pointer_move(on_a);
		assert_eq!(view.pointer_up(), None);
		assert_eq!(view.interaction.mode, PointerMode::Idle);
	}

	#[test]
	fn two_click_linking() {
		let mut view = view();
		view.set_linking_mode(true);
		assert_eq!(view.pointer_down(on_node(&view, "a")), None);
		view.pointer_up();
		assert_eq!(view.interaction.link_source(), Some("a"));

		let over_b = on_node(&view, "b");
		view.pointer_move(over_b);
		assert_eq!(
			view.interaction.rubber_band,
			view.layout().position("b").unwrap()
		);
		assert_eq!(
			view.pointer_down(over_b),
			Some(GraphEvent::Connect {
				source: "a".into(),
				target: "b".into()
			})
		);
		assert_eq!(view.interaction.link_source(), None);
	}

	#[test]
	fn second_click_on_same_node_cancels() {
		let mut view = view();
		view.set_linking_mode(true);
		let on_a = on_node(&view, "a");
		view.pointer_down(on_a);
		view.pointer_up();
		assert_eq!(view.pointer_down(on_a), None);
		assert_eq!(view.interaction.link_source(), None);
	}

	#[test]
	fn clicking_background_cancels_pending_link() {
		let mut view = view();
		view.set_linking_mode(true);
		view.pointer_down(on_node(&view, "a"));
		view.pointer_up();
		view.pointer_down(PointerInput::at(5.0, 790.0));
		assert_eq!(view.interaction.mode, PointerMode::Panning);
		view.pointer_up();
		assert_eq!(view.interaction.link_source(), None);
	}

	#[test]
	fn hovering_edge_midpoint_arms_delete() {
		let mut view = view();
		let mid = edge_mid(&view, "bc");
		view.pointer_move(screen_of(&view, mid));
		assert_eq!(view.interaction.hovered_edge.as_deref(), Some("bc"));
		assert!(view.interaction.delete_hovered);
		assert_eq!(view.cursor(), "pointer");

		let event = view.pointer_down(screen_of(&view, mid));
		assert_eq!(event, Some(GraphEvent::DeleteEdge("bc".into())));
		assert_eq!(view.interaction.hovered_edge, None);
	}

	#[test]
	fn edge_hover_away_from_midpoint_does_not_arm_delete() {
		let mut view = view();
		let edge = view.graph().edge("bc").unwrap().clone();
		let path = view.edge_path(&edge).unwrap();
		let near_start = Point::new(path.start().x + 4.0, path.start().y + 10.0);
		view.pointer_move(screen_of(&view, near_start));
		assert_eq!(view.interaction.hovered_edge.as_deref(), Some("bc"));
		assert!(!view.interaction.delete_hovered);
	}

	#[test]
	fn delete_affordance_respects_disable() {
		let mut view = view();
		view.set_delete_enabled(false);
		let mid = edge_mid(&view, "bc");
		view.pointer_move(screen_of(&view, mid));
		assert_eq!(view.interaction.hovered_edge.as_deref(), Some("bc"));
		assert!(!view.interaction.delete_hovered);
		assert_eq!(view.pointer_down(screen_of(&view, mid)), None);
	}

	#[test]
	fn self_loop_is_hit_just_below_its_node() {
		let graph = Graph {
			nodes: vec![node("a", NodeType::Server)],
			edges: vec![edge("aa", "a", "a")],
			..Default::default()
		};
		let mut view = GraphView::new(graph, 1000.0, 800.0, 3);
		let center = view.layout().position("a").unwrap();
		let below = Point::new(center.x, center.y + NODE_HEIGHT / 2.0 + 6.0);
		view.pointer_move(screen_of(&view, below));
		assert_eq!(view.interaction.hovered_node, None);
		assert_eq!(view.interaction.hovered_edge.as_deref(), Some("aa"));
		assert!(view.interaction.delete_hovered);
		assert_eq!(
			view.pointer_down(screen_of(&view, below)),
			Some(GraphEvent::DeleteEdge("aa".into()))
		);
	}

	#[test]
	fn node_hover_suppresses_edge_hover() {
		let mut view = view();
		view.pointer_move(on_node(&view, "b"));
		assert_eq!(view.interaction.hovered_node.as_deref(), Some("b"));
		assert_eq!(view.interaction.hovered_edge, None);
	}

	#[test]
	fn leaving_canvas_releases_everything() {
		let mut view = view();
		view.pointer_down(on_node(&view, "a").with_shift());
		view.pointer_move(on_node(&view, "b"));
		let event = view.pointer_leave();
		assert!(matches!(event, Some(GraphEvent::Connect { .. })));
		assert_eq!(view.interaction.mode, PointerMode::Idle);
		assert_eq!(view.interaction.hovered_node, None);
	}

	#[test]
	fn wheel_keeps_world_point_under_cursor() {
		let mut view = view();
		let cursor = PointerInput::at(321.0, 456.0);
		let before = view.camera.to_world(Point::new(cursor.x, cursor.y));
		view.wheel(cursor, -250.0);
		let after = view.camera.to_world(Point::new(cursor.x, cursor.y));
		assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
		assert!(view.camera.scale > 0.75);
	}
}
