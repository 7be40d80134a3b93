use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A point in either world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate, growing rightwards.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}

	/// Point halfway to `other`.
	pub fn midpoint(self, other: Point) -> Point {
		Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
	}
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub w: f64,
	pub h: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
		Self { x, y, w, h }
	}

	pub fn centered(center: Point, w: f64, h: f64) -> Self {
		Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
	}

	/// Inclusive on all four edges.
	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
	}
}

/// Component categories an architecture node can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
	/// Web or desktop client.
	Client,
	/// Sensor or embedded device.
	IotDevice,
	/// Mobile app.
	Mobile,
	/// Layer 4/7 load balancer.
	LoadBalancer,
	/// API gateway.
	ApiGateway,
	/// Pub/sub broker for device traffic.
	MqttBroker,
	/// Content delivery network.
	Cdn,
	/// Monolithic application server.
	Server,
	/// Independently deployed service.
	Microservice,
	/// Background job runner.
	Worker,
	/// Serverless function.
	Function,
	/// Inference model.
	MlModel,
	/// On-chain contract.
	SmartContract,
	/// Relational or document database.
	Database,
	/// In-memory cache.
	Cache,
	/// Message queue.
	Queue,
	/// Object or blob storage.
	Storage,
	/// Append-only ledger.
	Ledger,
	/// Vector database.
	VectorDb,
	/// Third-party system outside the architecture.
	External,
	/// Any type string this build does not know about.
	#[serde(other)]
	Unknown,
}

impl NodeType {
	/// Wire name, as found in JSON.
	pub fn name(self) -> &'static str {
		match self {
			NodeType::Client => "CLIENT",
			NodeType::IotDevice => "IOT_DEVICE",
			NodeType::Mobile => "MOBILE",
			NodeType::LoadBalancer => "LOAD_BALANCER",
			NodeType::ApiGateway => "API_GATEWAY",
			NodeType::MqttBroker => "MQTT_BROKER",
			NodeType::Cdn => "CDN",
			NodeType::Server => "SERVER",
			NodeType::Microservice => "MICROSERVICE",
			NodeType::Worker => "WORKER",
			NodeType::Function => "FUNCTION",
			NodeType::MlModel => "ML_MODEL",
			NodeType::SmartContract => "SMART_CONTRACT",
			NodeType::Database => "DATABASE",
			NodeType::Cache => "CACHE",
			NodeType::Queue => "QUEUE",
			NodeType::Storage => "STORAGE",
			NodeType::Ledger => "LEDGER",
			NodeType::VectorDb => "VECTOR_DB",
			NodeType::External => "EXTERNAL",
			NodeType::Unknown => "UNKNOWN",
		}
	}
}

/// The five horizontal bands nodes are grouped into, in top-to-bottom order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKey {
	/// Clients and devices.
	Presentation,
	/// Ingress: load balancers, gateways, brokers.
	Gateway,
	/// Processing and logic.
	Service,
	/// Data and state.
	Data,
	/// External infrastructure.
	Infra,
}

impl LayerKey {
	/// Every layer in band order.
	pub const ALL: [LayerKey; 5] = [
		LayerKey::Presentation,
		LayerKey::Gateway,
		LayerKey::Service,
		LayerKey::Data,
		LayerKey::Infra,
	];

	/// Total classification of node types. Types without a dedicated band,
	/// including [`NodeType::Unknown`], land in [`LayerKey::Service`].
	pub fn of(node_type: NodeType) -> LayerKey {
		match node_type {
			NodeType::Client | NodeType::Mobile | NodeType::IotDevice => LayerKey::Presentation,
			NodeType::LoadBalancer | NodeType::ApiGateway | NodeType::MqttBroker | NodeType::Cdn => {
				LayerKey::Gateway
			}
			NodeType::Database
			| NodeType::Cache
			| NodeType::Storage
			| NodeType::Ledger
			| NodeType::VectorDb => LayerKey::Data,
			NodeType::External => LayerKey::Infra,
			NodeType::Server
			| NodeType::Microservice
			| NodeType::Worker
			| NodeType::Function
			| NodeType::MlModel
			| NodeType::SmartContract
			| NodeType::Queue
			| NodeType::Unknown => LayerKey::Service,
		}
	}

	/// Header pill caption.
	pub fn label(self) -> &'static str {
		match self {
			LayerKey::Presentation => "CLIENTS & DEVICES",
			LayerKey::Gateway => "GATEWAY & INGRESS",
			LayerKey::Service => "PROCESSING & LOGIC",
			LayerKey::Data => "DATA & STATE",
			LayerKey::Infra => "INFRASTRUCTURE",
		}
	}

	/// Accent colour of the band and its nodes.
	pub fn color(self) -> &'static str {
		match self {
			LayerKey::Presentation => "#3b82f6",
			LayerKey::Gateway => "#a855f7",
			LayerKey::Service => "#f59e0b",
			LayerKey::Data => "#10b981",
			LayerKey::Infra => "#64748b",
		}
	}

	/// Emoji shown in the header pill.
	pub fn icon(self) -> &'static str {
		match self {
			LayerKey::Presentation => "📱",
			LayerKey::Gateway => "🛡️",
			LayerKey::Service => "⚙️",
			LayerKey::Data => "💾",
			LayerKey::Infra => "☁️",
		}
	}

	/// Colour of packets spawned on edges leaving a node of this layer.
	pub fn packet_color(self) -> &'static str {
		match self {
			LayerKey::Presentation => "#60a5fa",
			LayerKey::Gateway => "#a855f7",
			LayerKey::Service => "#fbbf24",
			LayerKey::Data => "#34d399",
			LayerKey::Infra => "#94a3b8",
		}
	}
}

/// One component of the architecture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique within the graph.
	pub id: String,
	/// Display name.
	pub label: String,
	/// Category, serialized as `type`.
	#[serde(rename = "type")]
	pub node_type: NodeType,
	/// Free-form summary.
	#[serde(default)]
	pub description: String,
	/// Stack names; the first one is shown on the card.
	#[serde(default)]
	pub technologies: Vec<String>,
}

impl Node {
	/// Band this node is placed in.
	pub fn layer(&self) -> LayerKey {
		LayerKey::of(self.node_type)
	}
}

/// Directed connection between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	/// Unique within the graph.
	pub id: String,
	/// Id of the node the edge leaves.
	pub source: String,
	/// Id of the node the edge enters.
	pub target: String,
	/// Optional caption.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
}

impl Edge {
	/// Source and target are the same node.
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}

	/// Whether `node_id` is either endpoint.
	pub fn touches(&self, node_id: &str) -> bool {
		self.source == node_id || self.target == node_id
	}
}

/// The externally owned architecture: an ordered node list and edge list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	/// Diagram heading.
	#[serde(default)]
	pub title: String,
	/// Short summary shown under the heading.
	#[serde(default)]
	pub description: String,
	/// Nodes in display order. Order decides grid placement within a band.
	pub nodes: Vec<Node>,
	/// Directed connections between nodes.
	pub edges: Vec<Edge>,
}

impl Graph {
	/// Parses the `nodes`/`edges` JSON document.
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}

	/// Node with `id`, if present.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Edge with `id`, if present.
	pub fn edge(&self, id: &str) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}

	/// Ids of every node that appears as an endpoint of some edge.
	pub fn connected_node_ids(&self) -> HashSet<&str> {
		self.edges
			.iter()
			.flat_map(|e| [e.source.as_str(), e.target.as_str()])
			.collect()
	}

	/// Whether another edge runs the opposite way between the same two nodes.
	pub fn has_reverse(&self, edge: &Edge) -> bool {
		self.edges
			.iter()
			.any(|e| e.id != edge.id && e.source == edge.target && e.target == edge.source)
	}

	/// Appends `source -> target` unless it would be a self-link or duplicate
	/// an existing edge with the same direction. Returns the new edge id.
	pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
		if source == target
			|| self
				.edges
				.iter()
				.any(|e| e.source == source && e.target == target)
		{
			return None;
		}
		let mut n = self.edges.len();
		let id = loop {
			let candidate = format!("edge-{n}");
			if self.edge(&candidate).is_none() {
				break candidate;
			}
			n += 1;
		};
		self.edges.push(Edge {
			id: id.clone(),
			source: source.to_string(),
			target: target.to_string(),
			label: None,
		});
		Some(id)
	}

	/// Removes the edge with `id`, leaving every other edge and node untouched.
	pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
		let idx = self.edges.iter().position(|e| e.id == id)?;
		Some(self.edges.remove(idx))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_type_maps_to_one_layer() {
		let data = [
			(NodeType::Client, LayerKey::Presentation),
			(NodeType::IotDevice, LayerKey::Presentation),
			(NodeType::Mobile, LayerKey::Presentation),
			(NodeType::LoadBalancer, LayerKey::Gateway),
			(NodeType::ApiGateway, LayerKey::Gateway),
			(NodeType::MqttBroker, LayerKey::Gateway),
			(NodeType::Cdn, LayerKey::Gateway),
			(NodeType::Server, LayerKey::Service),
			(NodeType::Queue, LayerKey::Service),
			(NodeType::SmartContract, LayerKey::Service),
			(NodeType::Database, LayerKey::Data),
			(NodeType::VectorDb, LayerKey::Data),
			(NodeType::Ledger, LayerKey::Data),
			(NodeType::External, LayerKey::Infra),
		];
		for (ty, layer) in data {
			assert_eq!(LayerKey::of(ty), layer, "{ty:?}");
		}
	}

	#[test]
	fn unknown_type_string_defaults_to_service() {
		let json = r#"{"id":"x","label":"X","type":"QUANTUM_COMPUTER"}"#;
		let node: Node = serde_json::from_str(json).unwrap();
		assert_eq!(node.node_type, NodeType::Unknown);
		assert_eq!(node.layer(), LayerKey::Service);
		assert!(node.technologies.is_empty());
	}

	#[test]
	fn graph_parses_plain_lists() {
		let graph = Graph::from_json(
			r#"{
				"title": "Shop",
				"nodes": [
					{"id": "web", "label": "Web", "type": "CLIENT", "technologies": ["React"]},
					{"id": "db", "label": "DB", "type": "DATABASE", "description": "orders"}
				],
				"edges": [{"id": "e1", "source": "web", "target": "db", "label": "SQL"}]
			}"#,
		)
		.unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[1].node_type, NodeType::Database);
		assert_eq!(graph.edges[0].label.as_deref(), Some("SQL"));
	}

	#[test]
	fn connect_refuses_duplicates_and_self_links() {
		let mut graph = Graph::default();
		assert_eq!(graph.connect("a", "b").as_deref(), Some("edge-0"));
		assert_eq!(graph.connect("a", "b"), None);
		assert_eq!(graph.connect("a", "a"), None);
		assert_eq!(graph.connect("b", "a").as_deref(), Some("edge-1"));
		assert!(graph.has_reverse(&graph.edges[0]));
	}

	#[test]
	fn connect_skips_taken_ids() {
		let mut graph = Graph::default();
		graph.connect("a", "b");
		graph.connect("b", "c");
		graph.remove_edge("edge-0");
		assert_eq!(graph.connect("c", "d").as_deref(), Some("edge-2"));
	}
}
