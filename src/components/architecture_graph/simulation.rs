//! Packet particles that travel along edges to visualize data flow.

use std::collections::{HashMap, VecDeque};

use rand::Rng;

use super::path::edge_path;
use super::types::{Edge, Graph, Point};

/// Milliseconds between simulation ticks.
pub const TICK_INTERVAL_MS: i32 = 16;
/// Progress added to each packet per tick.
pub const PACKET_STEP: f64 = 0.008;
pub const TRAIL_LENGTH: usize = 3;
const HIGHLIGHT_SPAWN_CHANCE: f64 = 0.2;
/// Used when the edge's source node cannot be found.
pub const DEFAULT_PACKET_COLOR: &str = "#22d3ee";

#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
	pub id: u64,
	pub edge_id: String,
	/// Fraction of the route covered, in `[0, 1]` while alive.
	pub progress: f64,
	pub color: &'static str,
	/// Most recent sample first.
	pub trail: VecDeque<Point>,
}

/// Upper bound on live packets for a graph with `edge_count` edges.
pub fn population_cap(edge_count: usize) -> usize {
	match edge_count {
		0..10 => 15,
		10..30 => 30,
		_ => 50,
	}
}

pub fn spawn_attempts(edge_count: usize) -> usize {
	match edge_count {
		0..=15 => 1,
		16..=30 => 2,
		_ => 3,
	}
}

/// Per-attempt spawn probability; denser graphs spawn less per edge.
pub fn spawn_chance(edge_count: usize) -> f64 {
	match edge_count {
		0..=20 => 0.15,
		21..=50 => 0.08,
		_ => 0.05,
	}
}

/// Packets only spawn on edges with two placed, distinct endpoints.
fn routable(edge: &Edge, positions: &HashMap<String, Point>) -> bool {
	!edge.is_self_loop()
		&& positions.contains_key(&edge.source)
		&& positions.contains_key(&edge.target)
}

#[derive(Clone, Debug, Default)]
pub struct FlowSimulation {
	active: bool,
	packets: Vec<Packet>,
	next_id: u64,
}

impl FlowSimulation {
	pub fn is_active(&self) -> bool {
		self.active
	}

	/// Stopping drops every packet at once.
	pub fn set_active(&mut self, active: bool) {
		self.active = active;
		if !active {
			self.packets.clear();
		}
	}

	pub fn packets(&self) -> &[Packet] {
		&self.packets
	}

	/// One simulation step: advance, cull, then spawn. Inert while stopped.
	pub fn tick<R: Rng>(
		&mut self,
		graph: &Graph,
		positions: &HashMap<String, Point>,
		highlighted_edge: Option<&str>,
		rng: &mut R,
	) {
		if !self.active {
			return;
		}

		self.advance(graph, positions);

		let edge_count = graph.edges.len();
		let cap = population_cap(edge_count);
		self.packets.truncate(cap);
		if self.packets.len() >= cap || edge_count == 0 {
			return;
		}

		if let Some(edge) = highlighted_edge
			.and_then(|id| graph.edge(id))
			.filter(|edge| routable(edge, positions))
		{
			if rng.gen_bool(HIGHLIGHT_SPAWN_CHANCE) {
				self.spawn(edge, graph);
				return;
			}
		}

		let chance = spawn_chance(edge_count);
		for _ in 0..spawn_attempts(edge_count) {
			if self.packets.len() >= cap {
				break;
			}
			if !rng.gen_bool(chance) {
				continue;
			}
			let edge = &graph.edges[rng.gen_range(0..edge_count)];
			if routable(edge, positions) {
				self.spawn(edge, graph);
			}
		}
	}

	fn advance(&mut self, graph: &Graph, positions: &HashMap<String, Point>) {
		self.packets.retain_mut(|packet| {
			let Some(edge) = graph.edge(&packet.edge_id) else {
				return false;
			};
			packet.progress += PACKET_STEP;
			if packet.progress > 1.0 {
				return false;
			}
			if let Some(path) = edge_path(edge, graph, positions) {
				packet.trail.push_front(path.point_at(packet.progress));
				packet.trail.truncate(TRAIL_LENGTH);
			}
			true
		});
	}

	fn spawn(&mut self, edge: &Edge, graph: &Graph) {
		let color = graph
			.node(&edge.source)
			.map_or(DEFAULT_PACKET_COLOR, |n| n.layer().packet_color());
		self.packets.push(Packet {
			id: self.next_id,
			edge_id: edge.id.clone(),
			progress: 0.0,
			color,
			trail: VecDeque::with_capacity(TRAIL_LENGTH),
		});
		self.next_id += 1;
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::*;
	use crate::components::architecture_graph::layout::Layout;
	use crate::components::architecture_graph::types::{LayerKey, Node, NodeType};

	fn chain(node_count: usize) -> Graph {
		let types = [NodeType::Client, NodeType::Server, NodeType::Database];
		let nodes = (0..node_count)
			.map(|i| Node {
				id: format!("n{i}"),
				label: format!("N{i}"),
				node_type: types[i % types.len()],
				description: String::new(),
				technologies: Vec::new(),
			})
			.collect();
		let edges = (1..node_count)
			.map(|i| Edge {
				id: format!("e{i}"),
				source: format!("n{}", i - 1),
				target: format!("n{i}"),
				label: None,
			})
			.collect();
		Graph {
			nodes,
			edges,
			..Default::default()
		}
	}

	fn run(graph: &Graph, ticks: usize, seed: u64) -> FlowSimulation {
		let layout = Layout::compute(&graph.nodes, &HashSet::new());
		let mut rng = SmallRng::seed_from_u64(seed);
		let mut sim = FlowSimulation::default();
		sim.set_active(true);
		let cap = population_cap(graph.edges.len());
		for _ in 0..ticks {
			sim.tick(graph, &layout.positions, None, &mut rng);
			assert!(sim.packets().len() <= cap);
		}
		sim
	}

	#[test]
	fn caps_by_edge_bracket() {
		assert_eq!(population_cap(0), 15);
		assert_eq!(population_cap(9), 15);
		assert_eq!(population_cap(10), 30);
		assert_eq!(population_cap(29), 30);
		assert_eq!(population_cap(30), 50);
		assert!(spawn_chance(5) > spawn_chance(40));
		assert!(spawn_chance(40) > spawn_chance(80));
		assert!(spawn_attempts(80) > spawn_attempts(5));
	}

	#[test]
	fn population_never_exceeds_cap() {
		for (nodes, seed) in [(5, 1), (20, 2), (60, 3)] {
			let graph = chain(nodes);
			let sim = run(&graph, 2000, seed);
			assert!(!sim.packets().is_empty());
		}
	}

	#[test]
	fn shrinking_graph_truncates_population() {
		let big = chain(60);
		let mut sim = run(&big, 2000, 9);
		let layout = Layout::compute(&big.nodes, &HashSet::new());
		let mut small = big.clone();
		small.edges.truncate(5);
		let mut rng = SmallRng::seed_from_u64(9);
		sim.tick(&small, &layout.positions, None, &mut rng);
		assert!(sim.packets().len() <= population_cap(5));
		assert!(sim.packets().iter().all(|p| small.edge(&p.edge_id).is_some()));
	}

	#[test]
	fn packets_advance_and_record_trail() {
		let graph = chain(2);
		let sim = run(&graph, 400, 4);
		for packet in sim.packets() {
			assert!(packet.progress <= 1.0);
			assert!(packet.trail.len() <= TRAIL_LENGTH);
			if packet.progress > 2.0 * PACKET_STEP {
				assert_eq!(packet.trail.len(), TRAIL_LENGTH);
			}
		}
	}

	#[test]
	fn packet_color_follows_source_layer() {
		let mut graph = chain(2);
		graph.edges.push(Edge {
			id: "dangling".into(),
			source: "ghost".into(),
			target: "n0".into(),
			label: None,
		});
		let mut sim = FlowSimulation::default();
		sim.spawn(&graph.edges[0], &graph);
		sim.spawn(&graph.edges[1], &graph);
		assert_eq!(sim.packets[0].color, LayerKey::Presentation.packet_color());
		assert_eq!(sim.packets[1].color, DEFAULT_PACKET_COLOR);
		assert_ne!(sim.packets[0].id, sim.packets[1].id);
	}

	#[test]
	fn highlighted_edge_gets_priority() {
		let graph = chain(40);
		let layout = Layout::compute(&graph.nodes, &HashSet::new());
		let mut rng = SmallRng::seed_from_u64(7);
		let mut sim = FlowSimulation::default();
		sim.set_active(true);
		for _ in 0..200 {
			sim.tick(&graph, &layout.positions, Some("e7"), &mut rng);
		}
		let on_highlight = sim.packets().iter().filter(|p| p.edge_id == "e7").count();
		let others_max = (1..40)
			.filter(|i| *i != 7)
			.map(|i| {
				let id = format!("e{i}");
				sim.packets().iter().filter(|p| p.edge_id == id).count()
			})
			.max()
			.unwrap_or(0);
		assert!(on_highlight > others_max);
	}

	#[test]
	fn highlighted_self_loop_never_spawns() {
		let mut graph = chain(1);
		graph.edges.push(Edge {
			id: "loop".into(),
			source: "n0".into(),
			target: "n0".into(),
			label: None,
		});
		let layout = Layout::compute(&graph.nodes, &HashSet::new());
		let mut rng = SmallRng::seed_from_u64(1);
		let mut sim = FlowSimulation::default();
		sim.set_active(true);
		for _ in 0..200 {
			sim.tick(&graph, &layout.positions, Some("loop"), &mut rng);
			assert!(sim.packets().is_empty());
		}
	}

	#[test]
	fn highlighted_edge_into_collapsed_layer_never_spawns() {
		let graph = chain(2);
		let collapsed = HashSet::from([LayerKey::Service]);
		let layout = Layout::compute(&graph.nodes, &collapsed);
		assert!(layout.position("n1").is_none());
		let mut rng = SmallRng::seed_from_u64(3);
		let mut sim = FlowSimulation::default();
		sim.set_active(true);
		for _ in 0..200 {
			sim.tick(&graph, &layout.positions, Some("e1"), &mut rng);
			assert!(sim.packets().is_empty());
		}
	}

	#[test]
	fn stopping_clears_packets_and_goes_inert() {
		let graph = chain(5);
		let mut sim = run(&graph, 500, 5);
		assert!(!sim.packets().is_empty());
		sim.set_active(false);
		assert!(sim.packets().is_empty());
		let layout = Layout::compute(&graph.nodes, &HashSet::new());
		let mut rng = SmallRng::seed_from_u64(5);
		sim.tick(&graph, &layout.positions, None, &mut rng);
		assert!(sim.packets().is_empty());
	}

	#[test]
	fn removed_edge_drops_its_packets() {
		let mut graph = chain(3);
		let mut sim = FlowSimulation::default();
		sim.set_active(true);
		sim.spawn(&graph.edges[0], &graph);
		graph.remove_edge("e1");
		let layout = Layout::compute(&graph.nodes, &HashSet::new());
		let mut rng = SmallRng::seed_from_u64(0);
		sim.tick(&graph, &layout.positions, None, &mut rng);
		assert!(sim.packets().iter().all(|p| p.edge_id != "e1"));
	}
}
