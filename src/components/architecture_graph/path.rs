//! Orthogonal edge routing and constant-speed sampling along the route.

use std::collections::HashMap;

use super::layout::NODE_HEIGHT;
use super::types::{Edge, Graph, Point};

/// Sideways shift applied to each half of an anti-parallel edge pair.
pub const ANTIPARALLEL_OFFSET: f64 = 8.0;
/// World-space distance within which the pointer hovers an edge.
pub const EDGE_HIT_DISTANCE: f64 = 10.0;
/// World-space radius around the midpoint that arms the delete affordance.
pub const DELETE_HIT_RADIUS: f64 = 15.0;

/// Four-point right-angle route: down from the source's bottom anchor to a
/// shared midline, across, then down into the target's top anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthogonalPath {
	pub points: [Point; 4],
}

impl OrthogonalPath {
	pub fn route(source: Point, target: Point, lateral: f64) -> Self {
		let start_y = source.y + NODE_HEIGHT / 2.0;
		let end_y = target.y - NODE_HEIGHT / 2.0;
		let mid_y = (start_y + end_y) / 2.0;
		Self {
			points: [
				Point::new(source.x + lateral, start_y),
				Point::new(source.x + lateral, mid_y),
				Point::new(target.x + lateral, mid_y),
				Point::new(target.x + lateral, end_y),
			],
		}
	}

	/// All four points on the node's bottom anchor.
	pub fn self_loop(node: Point) -> Self {
		Self {
			points: [Point::new(node.x, node.y + NODE_HEIGHT / 2.0); 4],
		}
	}

	pub fn start(&self) -> Point {
		self.points[0]
	}

	pub fn end(&self) -> Point {
		self.points[3]
	}

	/// Manhattan length of each segment.
	pub fn segment_lengths(&self) -> [f64; 3] {
		let p = &self.points;
		std::array::from_fn(|i| (p[i + 1].x - p[i].x).abs() + (p[i + 1].y - p[i].y).abs())
	}

	pub fn length(&self) -> f64 {
		self.segment_lengths().iter().sum()
	}

	/// Segment index and local parameter for a global arc-length fraction `t`.
	fn locate(&self, t: f64) -> Option<(usize, f64)> {
		let lengths = self.segment_lengths();
		let total: f64 = lengths.iter().sum();
		if total == 0.0 {
			return None;
		}
		let mut travelled = t.clamp(0.0, 1.0) * total;
		for (i, len) in lengths.iter().enumerate() {
			if travelled < *len || i == 2 {
				let local = if *len == 0.0 { 1.0 } else { travelled / len };
				return Some((i, local.min(1.0)));
			}
			travelled -= len;
		}
		None
	}

	/// Point reached after covering fraction `t` of the total path length.
	pub fn point_at(&self, t: f64) -> Point {
		let Some((i, local)) = self.locate(t) else {
			return self.start();
		};
		let (a, b) = (self.points[i], self.points[i + 1]);
		Point::new(a.x + (b.x - a.x) * local, a.y + (b.y - a.y) * local)
	}

	/// Heading (radians) of the segment containing fraction `t`.
	pub fn angle_at(&self, t: f64) -> f64 {
		let Some((i, _)) = self.locate(t) else {
			return 0.0;
		};
		let (a, b) = (self.points[i], self.points[i + 1]);
		(b.y - a.y).atan2(b.x - a.x)
	}

	/// Heading of the arrowhead at the target end. Falls back to the middle
	/// segment when the last one has zero length.
	pub fn end_angle(&self) -> f64 {
		let [_, p1, p2, p3] = self.points;
		if p3 == p2 {
			(p2.y - p1.y).atan2(p2.x - p1.x)
		} else {
			(p3.y - p2.y).atan2(p3.x - p2.x)
		}
	}

	/// Center of the horizontal run, where the delete affordance sits.
	pub fn midpoint(&self) -> Point {
		self.points[1].midpoint(self.points[2])
	}

	pub fn distance_to(&self, p: Point) -> f64 {
		self.points
			.windows(2)
			.map(|w| distance_to_segment(p, w[0], w[1]))
			.fold(f64::INFINITY, f64::min)
	}
}

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len2 = dx * dx + dy * dy;
	if len2 == 0.0 {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Lateral shift for `edge`: non-zero only when a reverse edge exists, with the
/// sign chosen by comparing the endpoint ids so the pair splits apart.
pub fn lateral_offset(edge: &Edge, graph: &Graph) -> f64 {
	if !graph.has_reverse(edge) {
		0.0
	} else if edge.source < edge.target {
		ANTIPARALLEL_OFFSET
	} else {
		-ANTIPARALLEL_OFFSET
	}
}

/// Route for `edge`, or `None` when either endpoint has no position.
pub fn edge_path(
	edge: &Edge,
	graph: &Graph,
	positions: &HashMap<String, Point>,
) -> Option<OrthogonalPath> {
	let source = *positions.get(&edge.source)?;
	if edge.is_self_loop() {
		return Some(OrthogonalPath::self_loop(source));
	}
	let target = *positions.get(&edge.target)?;
	Some(OrthogonalPath::route(
		source,
		target,
		lateral_offset(edge, graph),
	))
}
