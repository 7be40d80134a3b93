use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::error::CanvasError;
use super::layout::{LayerBounds, NODE_HEIGHT, NODE_WIDTH};
use super::minimap::Minimap;
use super::overlay::NodeStatus;
use super::path::OrthogonalPath;
use super::state::GraphView;
use super::types::{Edge, LayerKey, Node, Point, Rect};

const BACKGROUND: &str = "#0f172a";
const EDGE_COLOR: &str = "#64748b";
const EDGE_HIGHLIGHT: &str = "#f59e0b";
const LINK_COLOR: &str = "#22d3ee";
const DANGER: &str = "#ef4444";
const LABEL_MAX_CHARS: usize = 22;
/// Milliseconds per dash-offset unit of the flowing edge animation.
const DASH_PERIOD_MS: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub opacity: f64,
	pub color: &'static str,
	pub highlighted: bool,
}

/// Emphasis for an edge: full strength when it or an endpoint is in focus,
/// faded when some other node is hovered.
pub fn edge_style(view: &GraphView, edge: &Edge) -> EdgeStyle {
	let interaction = &view.interaction;
	let overlays = &view.overlays;
	let (mut opacity, mut highlighted) = (0.5, false);

	if let Some(hovered) = interaction.hovered_node.as_deref() {
		if edge.touches(hovered) {
			(opacity, highlighted) = (1.0, true);
		} else {
			opacity = 0.1;
		}
	}
	let focused = overlays.highlighted_edge.as_deref() == Some(edge.id.as_str())
		|| interaction.hovered_edge.as_deref() == Some(edge.id.as_str())
		|| overlays
			.highlighted_node
			.as_deref()
			.is_some_and(|id| edge.touches(id));
	if focused {
		(opacity, highlighted) = (1.0, true);
	}

	EdgeStyle {
		opacity,
		color: if highlighted { EDGE_HIGHLIGHT } else { EDGE_COLOR },
		highlighted,
	}
}

/// Packets hide while a node that is not an endpoint of their edge is hovered.
pub fn packet_visible(view: &GraphView, edge: &Edge) -> bool {
	view.interaction
		.hovered_node
		.as_deref()
		.is_none_or(|id| edge.touches(id))
}

/// Border treatment of a node card, highest precedence first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeOutline {
	Status(NodeStatus),
	LinkSource,
	Selected,
	Plain,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub outline: NodeOutline,
	pub accent: &'static str,
	/// Dashed border, kept under a status halo as well.
	pub link_source: bool,
	/// No edge touches this node.
	pub disconnected: bool,
}

/// How a node card is drawn this frame. `connected` holds the ids touched
/// by some edge.
pub fn node_style(view: &GraphView, node: &Node, connected: &HashSet<&str>) -> NodeStyle {
	let id = node.id.as_str();
	let interaction = &view.interaction;
	let link_source = interaction.link_source() == Some(id);
	let selected = interaction.hovered_node.as_deref() == Some(id)
		|| interaction.dragged_node() == Some(id)
		|| view.overlays.highlighted_node.as_deref() == Some(id);

	let outline = if let Some(status) = view.overlays.status(id) {
		NodeOutline::Status(status)
	} else if link_source {
		NodeOutline::LinkSource
	} else if selected {
		NodeOutline::Selected
	} else {
		NodeOutline::Plain
	};

	NodeStyle {
		outline,
		accent: node.layer().color(),
		link_source,
		disconnected: !connected.contains(id),
	}
}

/// Cuts labels longer than the card allows to 20 characters plus "..".
pub fn truncate_label(label: &str) -> String {
	if label.chars().count() > LABEL_MAX_CHARS {
		let head: String = label.chars().take(LABEL_MAX_CHARS - 2).collect();
		format!("{head}..")
	} else {
		label.to_string()
	}
}

/// First listed technology, else the type name.
pub fn secondary_text(node: &Node) -> String {
	let text = node
		.technologies
		.first()
		.map_or(node.node_type.name(), String::as_str);
	text.chars().take(LABEL_MAX_CHARS).collect()
}

/// Draws one full frame. `time_ms` drives the dash animation.
pub fn render(
	view: &GraphView,
	ctx: &CanvasRenderingContext2d,
	time_ms: f64,
) -> Result<(), CanvasError> {
	ctx.clear_rect(0.0, 0.0, view.width, view.height);

	ctx.save();
	let camera = &view.camera;
	let drawn = ctx
		.translate(camera.offset_x, camera.offset_y)
		.and_then(|_| ctx.scale(camera.scale, camera.scale))
		.map_err(CanvasError::from)
		.and_then(|_| draw_world(view, ctx, time_ms));
	ctx.restore();
	drawn?;

	draw_minimap(view, ctx)
}

fn draw_world(
	view: &GraphView,
	ctx: &CanvasRenderingContext2d,
	time_ms: f64,
) -> Result<(), CanvasError> {
	for (key, bounds) in &view.layout.layers {
		draw_layer(view, ctx, *key, bounds)?;
	}
	for edge in &view.graph.edges {
		if let Some(path) = view.edge_path(edge) {
			draw_edge(view, ctx, edge, &path, time_ms)?;
		}
	}
	draw_packets(view, ctx)?;

	let connected = view.graph.connected_node_ids();
	for node in &view.graph.nodes {
		if let Some(center) = view.layout.position(&node.id) {
			draw_node(ctx, node, center, node_style(view, node, &connected))?;
		}
	}
	draw_rubber_band(view, ctx)
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, r: Rect, radius: f64) {
	let Rect { x, y, w, h } = r;
	ctx.begin_path();
	ctx.move_to(x + radius, y);
	ctx.line_to(x + w - radius, y);
	ctx.quadratic_curve_to(x + w, y, x + w, y + radius);
	ctx.line_to(x + w, y + h - radius);
	ctx.quadratic_curve_to(x + w, y + h, x + w - radius, y + h);
	ctx.line_to(x + radius, y + h);
	ctx.quadratic_curve_to(x, y + h, x, y + h - radius);
	ctx.line_to(x, y + radius);
	ctx.quadratic_curve_to(x, y, x + radius, y);
	ctx.close_path();
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: Option<(f64, f64)>) -> Result<(), CanvasError> {
	let pattern = match dash {
		Some((on, off)) => js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)),
		None => js_sys::Array::new(),
	};
	ctx.set_line_dash(&pattern)?;
	Ok(())
}

fn draw_layer(
	view: &GraphView,
	ctx: &CanvasRenderingContext2d,
	key: LayerKey,
	bounds: &LayerBounds,
) -> Result<(), CanvasError> {
	let color = key.color();
	let active = view.overlays.is_layer_active(key);

	if !bounds.collapsed {
		rounded_rect(ctx, bounds.band(), 24.0);
		ctx.set_stroke_style_str(if active { EDGE_HIGHLIGHT } else { color });
		ctx.set_line_width(if active { 4.0 } else { 2.0 });
		if active {
			ctx.set_shadow_color(EDGE_HIGHLIGHT);
			ctx.set_shadow_blur(20.0);
		}
		ctx.set_global_alpha(if active { 0.5 } else { 0.3 });
		ctx.stroke();
		ctx.set_shadow_blur(0.0);

		ctx.set_fill_style_str(color);
		ctx.set_global_alpha(0.02);
		ctx.fill();
		ctx.set_global_alpha(1.0);
	}

	let pill = bounds.pill();
	// Mask the band border behind the pill.
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(pill.x - 10.0, bounds.y - 4.0, pill.w + 20.0, 8.0);

	let hovered = view.interaction.hovered_layer == Some(key);
	rounded_rect(ctx, pill, 20.0);
	ctx.set_fill_style_str(if hovered { "#1e293b" } else { BACKGROUND });
	ctx.fill();
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(if hovered { 2.0 } else { 1.5 });
	ctx.stroke();

	let arrow = if bounds.collapsed { "▶" } else { "▼" };
	let text = if bounds.collapsed {
		format!("{arrow} {} {} ({})", key.icon(), key.label(), bounds.count)
	} else {
		format!("{arrow} {} {}", key.icon(), key.label())
	};
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font("bold 13px JetBrains Mono");
	ctx.set_fill_style_str(color);
	ctx.fill_text(&text, 0.0, pill.y + pill.h / 2.0)?;
	Ok(())
}

fn draw_edge(
	view: &GraphView,
	ctx: &CanvasRenderingContext2d,
	edge: &Edge,
	path: &OrthogonalPath,
	time_ms: f64,
) -> Result<(), CanvasError> {
	let style = edge_style(view, edge);
	let [p0, p1, p2, p3] = path.points;

	ctx.set_global_alpha(style.opacity);
	ctx.set_stroke_style_str(style.color);
	ctx.set_line_width(if style.highlighted { 3.0 } else { 2.0 });
	ctx.set_shadow_color(style.color);
	ctx.set_shadow_blur(if style.highlighted { 15.0 } else { 0.0 });

	if edge.is_self_loop() {
		ctx.begin_path();
		ctx.arc(p0.x, p0.y + 12.0, 12.0, -PI / 2.0, 3.0 * PI / 2.0 - 0.4)?;
		ctx.stroke();
	} else {
		set_dash(ctx, Some((8.0, 8.0)))?;
		ctx.set_line_dash_offset(-time_ms / DASH_PERIOD_MS);
		ctx.begin_path();
		ctx.move_to(p0.x, p0.y);
		ctx.line_to(p1.x, p1.y);
		ctx.line_to(p2.x, p2.y);
		ctx.line_to(p3.x, p3.y);
		ctx.stroke();
		set_dash(ctx, None)?;
	}
	ctx.set_shadow_blur(0.0);

	if style.opacity > 0.1 {
		ctx.set_fill_style_str(style.color);
		ctx.begin_path();
		ctx.arc(p0.x, p0.y, 2.0, 0.0, TAU)?;
		ctx.fill();
		let size = if style.highlighted { 1.5 } else { 1.2 };
		draw_arrow_head(ctx, p3, path.end_angle(), style.color, size)?;
	}
	ctx.set_global_alpha(1.0);

	if view.delete_enabled && view.interaction.hovered_edge.as_deref() == Some(edge.id.as_str()) {
		draw_delete_button(ctx, path.midpoint(), view.interaction.delete_hovered)?;
	}
	Ok(())
}

fn draw_arrow_head(
	ctx: &CanvasRenderingContext2d,
	tip: Point,
	angle: f64,
	color: &str,
	size: f64,
) -> Result<(), CanvasError> {
	ctx.save();
	ctx.translate(tip.x, tip.y)?;
	ctx.rotate(angle)?;
	ctx.begin_path();
	ctx.move_to(0.0, 0.0);
	ctx.line_to(-6.0 * size, -3.0 * size);
	ctx.line_to(-6.0 * size, 3.0 * size);
	ctx.close_path();
	ctx.set_fill_style_str(color);
	ctx.fill();
	ctx.restore();
	Ok(())
}

fn draw_delete_button(
	ctx: &CanvasRenderingContext2d,
	at: Point,
	hovered: bool,
) -> Result<(), CanvasError> {
	let (radius, cross) = if hovered { (14.0, 4.0) } else { (10.0, 3.0) };
	ctx.begin_path();
	ctx.arc(at.x, at.y, radius, 0.0, TAU)?;
	ctx.set_fill_style_str(if hovered { DANGER } else { "#1e293b" });
	ctx.fill();
	ctx.set_stroke_style_str(DANGER);
	ctx.set_line_width(2.0);
	ctx.stroke();

	ctx.begin_path();
	ctx.move_to(at.x - cross, at.y - cross);
	ctx.line_to(at.x + cross, at.y + cross);
	ctx.move_to(at.x + cross, at.y - cross);
	ctx.line_to(at.x - cross, at.y + cross);
	ctx.set_stroke_style_str(if hovered { "#fff" } else { DANGER });
	ctx.stroke();
	Ok(())
}

fn draw_packets(view: &GraphView, ctx: &CanvasRenderingContext2d) -> Result<(), CanvasError> {
	for packet in view.packets() {
		let Some(edge) = view.graph.edge(&packet.edge_id) else {
			continue;
		};
		if !packet_visible(view, edge) {
			continue;
		}
		let Some(path) = view.edge_path(edge) else {
			continue;
		};

		ctx.set_fill_style_str(packet.color);
		for (age, p) in packet.trail.iter().enumerate().skip(1) {
			ctx.set_global_alpha(0.35 / age as f64);
			ctx.begin_path();
			ctx.arc(p.x, p.y, 2.0, 0.0, TAU)?;
			ctx.fill();
		}
		ctx.set_global_alpha(1.0);

		ctx.set_shadow_color(packet.color);
		ctx.set_shadow_blur(8.0);
		draw_chevron(
			ctx,
			path.point_at(packet.progress),
			path.angle_at(packet.progress),
			packet.color,
			1.5,
		)?;
		ctx.set_shadow_blur(0.0);
	}
	Ok(())
}

fn draw_chevron(
	ctx: &CanvasRenderingContext2d,
	at: Point,
	angle: f64,
	color: &str,
	size: f64,
) -> Result<(), CanvasError> {
	ctx.save();
	ctx.translate(at.x, at.y)?;
	ctx.rotate(angle)?;
	ctx.begin_path();
	ctx.set_line_width(2.0 * size);
	ctx.set_line_cap("round");
	ctx.set_stroke_style_str(color);
	ctx.move_to(-4.0 * size, -4.0 * size);
	ctx.line_to(2.0 * size, 0.0);
	ctx.line_to(-4.0 * size, 4.0 * size);
	ctx.stroke();
	ctx.restore();
	Ok(())
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &Node,
	center: Point,
	style: NodeStyle,
) -> Result<(), CanvasError> {
	let card = Rect::centered(center, NODE_WIDTH, NODE_HEIGHT);
	let Rect { x, y, .. } = card;

	// Drop shadow, replaced by a coloured halo for status overlays.
	match style.outline {
		NodeOutline::Status(status) => {
			ctx.set_shadow_color(status.color());
			ctx.set_shadow_blur(30.0);
			ctx.set_shadow_offset_y(0.0);
		}
		_ => {
			ctx.set_shadow_color("rgba(0,0,0,0.5)");
			ctx.set_shadow_blur(12.0);
			ctx.set_shadow_offset_y(4.0);
		}
	}
	rounded_rect(ctx, card, 8.0);
	ctx.set_fill_style_str("#1e293b");
	ctx.fill();

	let (border, width) = match style.outline {
		NodeOutline::Status(status) => (status.color(), 3.0),
		NodeOutline::LinkSource => (LINK_COLOR, 2.0),
		NodeOutline::Selected => (style.accent, 2.0),
		NodeOutline::Plain => ("#475569", 1.0),
	};
	match style.outline {
		NodeOutline::Status(_) => {}
		NodeOutline::Selected => {
			ctx.set_shadow_color(style.accent);
			ctx.set_shadow_blur(10.0);
			ctx.set_shadow_offset_y(0.0);
		}
		NodeOutline::LinkSource | NodeOutline::Plain => {
			ctx.set_shadow_blur(0.0);
			ctx.set_shadow_offset_y(0.0);
		}
	}
	if style.link_source {
		set_dash(ctx, Some((5.0, 5.0)))?;
	}
	ctx.set_line_width(width);
	ctx.set_stroke_style_str(border);
	rounded_rect(ctx, card, 8.0);
	ctx.stroke();

	ctx.set_shadow_blur(0.0);
	ctx.set_shadow_offset_y(0.0);
	ctx.set_shadow_color("transparent");
	set_dash(ctx, None)?;

	// Accent bar along the left edge.
	ctx.set_fill_style_str(style.accent);
	ctx.begin_path();
	ctx.move_to(x + 6.0, y);
	ctx.line_to(x + 5.0, y);
	ctx.arc_to(x, y, x, y + 6.0, 6.0)?;
	ctx.line_to(x, y + NODE_HEIGHT - 6.0);
	ctx.arc_to(x, y + NODE_HEIGHT, x + 6.0, y + NODE_HEIGHT, 6.0)?;
	ctx.line_to(x + 5.0, y + NODE_HEIGHT);
	ctx.line_to(x + 5.0, y);
	ctx.fill();

	let icon = Point::new(x + 28.0, center.y);
	ctx.begin_path();
	ctx.arc(icon.x, icon.y, 14.0, 0.0, TAU)?;
	ctx.set_fill_style_str("rgba(255,255,255,0.05)");
	ctx.fill();
	ctx.begin_path();
	ctx.arc(icon.x, icon.y, 5.0, 0.0, TAU)?;
	ctx.set_fill_style_str(style.accent);
	ctx.fill();

	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str("#f1f5f9");
	ctx.set_font("600 12px Inter");
	ctx.fill_text(&truncate_label(&node.label), x + 50.0, y + 16.0)?;
	ctx.set_fill_style_str("#94a3b8");
	ctx.set_font("500 10px JetBrains Mono");
	ctx.fill_text(&secondary_text(node), x + 50.0, y + 36.0)?;

	if style.disconnected {
		draw_disconnected_badge(ctx, Point::new(x + NODE_WIDTH, y))?;
	}
	Ok(())
}

fn draw_disconnected_badge(ctx: &CanvasRenderingContext2d, at: Point) -> Result<(), CanvasError> {
	ctx.begin_path();
	ctx.arc(at.x, at.y, 14.0, 0.0, TAU)?;
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill();
	ctx.set_stroke_style_str(DANGER);
	ctx.set_line_width(2.0);
	ctx.stroke();

	ctx.set_fill_style_str(DANGER);
	ctx.set_font("16px \"Material Icons\"");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.fill_text("link_off", at.x, at.y)?;
	Ok(())
}

fn draw_rubber_band(view: &GraphView, ctx: &CanvasRenderingContext2d) -> Result<(), CanvasError> {
	let Some(start) = view
		.interaction
		.link_source()
		.and_then(|id| view.layout.position(id))
	else {
		return Ok(());
	};
	let end = view.interaction.rubber_band;
	ctx.begin_path();
	ctx.move_to(start.x, start.y + NODE_HEIGHT / 2.0);
	ctx.line_to(end.x, end.y);
	ctx.set_stroke_style_str(LINK_COLOR);
	ctx.set_line_width(3.0);
	set_dash(ctx, Some((6.0, 6.0)))?;
	ctx.stroke();
	set_dash(ctx, None)
}

fn draw_minimap(view: &GraphView, ctx: &CanvasRenderingContext2d) -> Result<(), CanvasError> {
	let Some(minimap) = Minimap::new(&view.layout, view.width, view.height) else {
		return Ok(());
	};
	let frame = minimap.frame;

	ctx.save();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(frame.x, frame.y, frame.w, frame.h);
	ctx.set_stroke_style_str("#475569");
	ctx.set_line_width(2.0);
	ctx.stroke_rect(frame.x, frame.y, frame.w, frame.h);

	for node in &view.graph.nodes {
		if let Some(pos) = view.layout.position(&node.id) {
			let mark = minimap.project(pos);
			ctx.set_fill_style_str(node.layer().color());
			ctx.fill_rect(mark.x - 4.0, mark.y - 2.0, 8.0, 4.0);
		}
	}

	let viewport = minimap.viewport(&view.camera, view.width, view.height);
	ctx.begin_path();
	ctx.rect(frame.x, frame.y, frame.w, frame.h);
	ctx.clip();
	ctx.set_stroke_style_str("#fff");
	ctx.set_line_width(1.5);
	ctx.stroke_rect(viewport.x, viewport.y, viewport.w, viewport.h);
	ctx.restore();
	Ok(())
}
