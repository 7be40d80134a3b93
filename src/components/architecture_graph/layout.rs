//! Layered grid layout: nodes are bucketed by [`LayerKey`] and each bucket is
//! laid out as a centered four-column grid, bands stacked top to bottom.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::types::{LayerKey, Node, Point, Rect};

pub const NODE_WIDTH: f64 = 180.0;
pub const NODE_HEIGHT: f64 = 70.0;
pub const GRID_COLUMNS: usize = 4;
pub const COL_SPACING: f64 = 250.0;
pub const ROW_SPACING: f64 = 150.0;
pub const LAYER_MARGIN: f64 = 200.0;

/// World y of the first band's header.
const LAYOUT_TOP: f64 = 100.0;
/// Distance from a band's header to its first row of node centers.
const HEADER_TO_ROWS: f64 = 80.0;
const BAND_PADDING: f64 = 40.0;
const HEADER_HEIGHT: f64 = 60.0;
pub const COLLAPSED_HEIGHT: f64 = 60.0;
const COLLAPSED_ADVANCE: f64 = 100.0;

pub const BAND_WIDTH: f64 = GRID_COLUMNS as f64 * COL_SPACING + 100.0;
pub const PILL_WIDTH: f64 = 280.0;
pub const PILL_HEIGHT: f64 = 40.0;

/// Vertical extent of one layer band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerBounds {
	pub y: f64,
	pub height: f64,
	pub collapsed: bool,
	pub count: usize,
}

impl LayerBounds {
	pub fn band(&self) -> Rect {
		Rect::new(-BAND_WIDTH / 2.0, self.y, BAND_WIDTH, self.height)
	}

	/// The clickable header pill straddling the band's top border.
	pub fn pill(&self) -> Rect {
		Rect::new(
			-PILL_WIDTH / 2.0,
			self.y - PILL_HEIGHT / 2.0,
			PILL_WIDTH,
			PILL_HEIGHT,
		)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	/// World-space centers. Nodes in collapsed layers have no entry.
	pub positions: HashMap<String, Point>,
	/// Only non-empty layers appear here.
	pub layers: BTreeMap<LayerKey, LayerBounds>,
}

impl Layout {
	pub fn compute(nodes: &[Node], collapsed: &HashSet<LayerKey>) -> Self {
		let mut buckets: BTreeMap<LayerKey, Vec<&Node>> = BTreeMap::new();
		for node in nodes {
			buckets.entry(node.layer()).or_default().push(node);
		}

		let mut layout = Layout::default();
		let mut current_y = LAYOUT_TOP;

		for key in LayerKey::ALL {
			let Some(members) = buckets.get(&key) else {
				continue;
			};
			let count = members.len();

			if collapsed.contains(&key) {
				layout.layers.insert(
					key,
					LayerBounds {
						y: current_y,
						height: COLLAPSED_HEIGHT,
						collapsed: true,
						count,
					},
				);
				current_y += COLLAPSED_ADVANCE;
				continue;
			}

			let rows = count.div_ceil(GRID_COLUMNS);
			let rows_top = current_y + HEADER_TO_ROWS;
			for (idx, node) in members.iter().enumerate() {
				let (row, col) = (idx / GRID_COLUMNS, idx % GRID_COLUMNS);
				let in_row = if row == rows - 1 {
					match count % GRID_COLUMNS {
						0 => GRID_COLUMNS,
						rest => rest,
					}
				} else {
					GRID_COLUMNS
				};
				let row_width = (in_row - 1) as f64 * COL_SPACING;
				let x = -row_width / 2.0 + col as f64 * COL_SPACING;
				let y = rows_top + row as f64 * ROW_SPACING;
				layout.positions.insert(node.id.clone(), Point::new(x, y));
			}

			let grid_height = rows as f64 * ROW_SPACING + BAND_PADDING;
			layout.layers.insert(
				key,
				LayerBounds {
					y: current_y,
					height: grid_height + HEADER_HEIGHT,
					collapsed: false,
					count,
				},
			);
			current_y += grid_height + LAYER_MARGIN;
		}

		layout
	}

	pub fn position(&self, id: &str) -> Option<Point> {
		self.positions.get(id).copied()
	}

	/// Layer whose header pill contains the world point. Later bands win ties.
	pub fn header_at(&self, world: Point) -> Option<LayerKey> {
		self.layers
			.iter()
			.filter(|(_, bounds)| bounds.pill().contains(world))
			.map(|(key, _)| *key)
			.last()
	}

	/// Node whose body rectangle contains the world point, first in list order.
	pub fn node_at<'a>(&self, nodes: &'a [Node], world: Point) -> Option<&'a Node> {
		nodes.iter().find(|node| {
			self.position(&node.id)
				.is_some_and(|c| Rect::centered(c, NODE_WIDTH, NODE_HEIGHT).contains(world))
		})
	}

	/// Span covering every band and every placed node center.
	pub fn extent(&self) -> Option<Rect> {
		if self.positions.is_empty() {
			return None;
		}
		let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
		let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
		for bounds in self.layers.values() {
			min_y = min_y.min(bounds.y);
			max_y = max_y.max(bounds.y + bounds.height);
		}
		for p in self.positions.values() {
			min_x = min_x.min(p.x);
			max_x = max_x.max(p.x);
			min_y = min_y.min(p.y);
			max_y = max_y.max(p.y);
		}
		Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::architecture_graph::types::NodeType;

	fn node(id: &str, node_type: NodeType) -> Node {
		Node {
			id: id.into(),
			label: id.to_uppercase(),
			node_type,
			description: String::new(),
			technologies: Vec::new(),
		}
	}

	fn services(n: usize) -> Vec<Node> {
		(0..n).map(|i| node(&format!("s{i}"), NodeType::Microservice)).collect()
	}

	#[test]
	fn layers_stack_in_key_order() {
		let nodes = vec![
			node("db", NodeType::Database),
			node("web", NodeType::Client),
			node("api", NodeType::Server),
		];
		let layout = Layout::compute(&nodes, &HashSet::new());
		let y = |id: &str| layout.position(id).unwrap().y;
		assert!(y("web") < y("api"));
		assert!(y("api") < y("db"));
		assert!(!layout.layers.contains_key(&LayerKey::Gateway));
		assert!(!layout.layers.contains_key(&LayerKey::Infra));
	}

	#[test]
	fn rows_are_centered_and_last_row_uses_its_own_width() {
		let layout = Layout::compute(&services(6), &HashSet::new());
		let p = |i: usize| layout.position(&format!("s{i}")).unwrap();
		assert_eq!(p(0).x, -375.0);
		assert_eq!(p(3).x, 375.0);
		assert_eq!(p(4).x, -125.0);
		assert_eq!(p(5).x, 125.0);
		assert_eq!(p(4).y - p(0).y, ROW_SPACING);
	}

	#[test]
	fn single_band_bounds() {
		let layout = Layout::compute(&services(5), &HashSet::new());
		let bounds = layout.layers[&LayerKey::Service];
		assert_eq!(bounds.y, 100.0);
		assert_eq!(bounds.height, 2.0 * ROW_SPACING + 40.0 + 60.0);
		assert_eq!(bounds.count, 5);
		assert_eq!(layout.position("s0").unwrap().y, 180.0);
	}

	#[test]
	fn collapse_hides_positions_and_shrinks_band() {
		let mut nodes = services(3);
		nodes.push(node("db", NodeType::Cache));
		let open = Layout::compute(&nodes, &HashSet::new());

		let collapsed = HashSet::from([LayerKey::Service]);
		let closed = Layout::compute(&nodes, &collapsed);
		assert!(closed.position("s0").is_none());
		let bounds = closed.layers[&LayerKey::Service];
		assert!(bounds.collapsed);
		assert_eq!(bounds.height, COLLAPSED_HEIGHT);
		assert_eq!(bounds.count, 3);
		assert!(closed.position("db").unwrap().y < open.position("db").unwrap().y);

		assert_eq!(Layout::compute(&nodes, &HashSet::new()), open);
	}

	#[test]
	fn layout_is_deterministic() {
		let mut nodes = services(9);
		nodes.push(node("gw", NodeType::ApiGateway));
		nodes.push(node("x", NodeType::External));
		let a = Layout::compute(&nodes, &HashSet::new());
		let b = Layout::compute(&nodes, &HashSet::new());
		assert_eq!(a, b);
	}

	#[test]
	fn header_and_node_hits() {
		let nodes = services(1);
		let layout = Layout::compute(&nodes, &HashSet::new());
		assert_eq!(
			layout.header_at(Point::new(0.0, 100.0)),
			Some(LayerKey::Service)
		);
		assert_eq!(layout.header_at(Point::new(200.0, 100.0)), None);
		let hit = layout.node_at(&nodes, Point::new(80.0, 200.0));
		assert_eq!(hit.map(|n| n.id.as_str()), Some("s0"));
		assert!(layout.node_at(&nodes, Point::new(95.0, 180.0)).is_none());
	}
}
