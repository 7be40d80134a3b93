use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use leptos::ev;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::camera::Camera;
use super::error::CanvasError;
use super::interaction::{GraphEvent, PointerInput};
use super::overlay::Overlays;
use super::render;
use super::simulation::TICK_INTERVAL_MS;
use super::state::GraphView;
use super::types::{Graph, LayerKey, Node};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> Result<(f64, f64), CanvasError> {
	Ok((
		window.inner_width()?.as_f64().unwrap_or(800.0),
		window.inner_height()?.as_f64().unwrap_or(600.0),
	))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, CanvasError> {
	canvas
		.get_context("2d")?
		.ok_or(CanvasError::ContextUnavailable)?
		.dyn_into()
		.map_err(|_| CanvasError::ContextUnavailable)
}

fn pointer_input(ev: &MouseEvent, canvas_ref: NodeRef<leptos::html::Canvas>) -> Option<PointerInput> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(PointerInput {
		x: ev.client_x() as f64 - rect.left(),
		y: ev.client_y() as f64 - rect.top(),
		shift: ev.shift_key(),
	})
}

fn id_set(ids: Option<Vec<String>>) -> HashSet<String> {
	ids.unwrap_or_default().into_iter().collect()
}

/// Interactive canvas for an architecture graph. The graph itself stays owned
/// by the caller; edits come back through the callbacks.
#[component]
pub fn ArchitectureGraph(
	/// Nodes and edges to draw. Layout is recomputed when the structure changes.
	#[prop(into)]
	data: Signal<Graph>,
	/// Runs the packet animation while `true`; `false` drops every packet.
	#[prop(into)]
	simulating: Signal<bool>,
	/// Node drawn as selected, e.g. by a walkthrough.
	#[prop(optional, into)]
	highlighted_node_id: MaybeProp<String>,
	/// Edge drawn emphasized and favoured by the packet spawner.
	#[prop(optional, into)]
	highlighted_edge_id: MaybeProp<String>,
	/// Nodes with the attention halo.
	#[prop(optional, into)]
	active_highlight_nodes: MaybeProp<Vec<String>>,
	/// Layer band drawn with a glowing border.
	#[prop(optional, into)]
	active_highlight_layer: MaybeProp<LayerKey>,
	/// Nodes with the success halo.
	#[prop(optional, into)]
	success_node_ids: MaybeProp<Vec<String>>,
	/// Nodes with the error halo, which beats every other status.
	#[prop(optional, into)]
	error_node_ids: MaybeProp<Vec<String>>,
	/// Two-click linking instead of drag and pan on node clicks.
	#[prop(optional, into)]
	linking_mode: MaybeProp<bool>,
	/// Plain click on a node.
	#[prop(optional)]
	on_node_click: Option<Callback<Node>>,
	/// A finished link gesture as `(source, target)`.
	#[prop(optional)]
	on_connect: Option<Callback<(String, String)>>,
	/// Delete affordance clicked. Without it the affordance is hidden.
	#[prop(optional)]
	on_delete_edge: Option<Callback<String>>,
	/// Size to the window and follow its resizes.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width; defaults to the parent's width.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height; defaults to the parent's height.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let seed = js_sys::Date::now() as u64;
	let state = Rc::new(RefCell::new(GraphView::new(
		data.get_untracked(),
		0.0,
		0.0,
		seed,
	)));
	state.borrow_mut().set_delete_enabled(on_delete_edge.is_some());

	let cursor = RwSignal::new("grab");
	let camera = RwSignal::new(Camera::default());

	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let ticker: FrameCallback = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let interval_id = Arc::new(AtomicI32::new(0));

	{
		let (alive, interval_id) = (alive.clone(), interval_id.clone());
		on_cleanup(move || {
			alive.store(false, Ordering::Relaxed);
			if let Some(window) = web_sys::window() {
				window.clear_interval_with_handle(interval_id.load(Ordering::Relaxed));
			}
		});
	}

	let state_sync = state.clone();
	Effect::new(move |_| {
		let graph = data.get();
		state_sync.borrow_mut().set_graph(graph);
	});

	let state_sim = state.clone();
	Effect::new(move |_| {
		let active = simulating.get();
		state_sim.borrow_mut().set_simulating(active);
	});

	let state_link = state.clone();
	Effect::new(move |_| {
		let enabled = linking_mode.get().unwrap_or(false);
		let mut view = state_link.borrow_mut();
		view.set_linking_mode(enabled);
		cursor.set(view.cursor());
	});

	let state_overlay = state.clone();
	Effect::new(move |_| {
		let overlays = Overlays {
			highlighted_node: highlighted_node_id.get(),
			highlighted_edge: highlighted_edge_id.get(),
			attention_nodes: id_set(active_highlight_nodes.get()),
			attention_layer: active_highlight_layer.get(),
			success_nodes: id_set(success_node_ids.get()),
			error_nodes: id_set(error_node_ids.get()),
		};
		state_overlay.borrow_mut().overlays = overlays;
	});

	let (state_init, animate_init, ticker_init) = (state.clone(), animate.clone(), ticker.clone());
	let (alive_init, interval_init) = (alive.clone(), interval_id.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let mounted = start(
			canvas,
			fullscreen,
			width,
			height,
			Loops {
				state: state_init.clone(),
				animate: animate_init.clone(),
				ticker: ticker_init.clone(),
				alive: alive_init.clone(),
				interval_id: interval_init.clone(),
			},
		);
		match mounted {
			Ok(resize) => {
				camera.set(state_init.borrow().camera);
				if let Some(handle) = resize {
					on_cleanup(move || handle.remove());
				}
			}
			Err(err) => warn!("architecture graph not started: {err}"),
		}
	});

	let dispatch = move |event: Option<GraphEvent>| match event {
		Some(GraphEvent::NodeClicked(node)) => {
			if let Some(cb) = on_node_click {
				cb.run(node);
			}
		}
		Some(GraphEvent::Connect { source, target }) => {
			info!("connect {source} -> {target}");
			if let Some(cb) = on_connect {
				cb.run((source, target));
			}
		}
		Some(GraphEvent::DeleteEdge(edge_id)) => {
			info!("delete edge {edge_id}");
			if let Some(cb) = on_delete_edge {
				cb.run(edge_id);
			}
		}
		None => {}
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(input) = pointer_input(&ev, canvas_ref) else {
			return;
		};
		let event = {
			let mut view = state_md.borrow_mut();
			let event = view.pointer_down(input);
			cursor.set(view.cursor());
			event
		};
		dispatch(event);
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(input) = pointer_input(&ev, canvas_ref) else {
			return;
		};
		let mut view = state_mm.borrow_mut();
		view.pointer_move(input);
		cursor.set(view.cursor());
		camera.set(view.camera);
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let event = {
			let mut view = state_mu.borrow_mut();
			let event = view.pointer_up();
			cursor.set(view.cursor());
			event
		};
		dispatch(event);
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let event = {
			let mut view = state_ml.borrow_mut();
			let event = view.pointer_leave();
			cursor.set(view.cursor());
			event
		};
		dispatch(event);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(input) = pointer_input(&ev, canvas_ref) else {
			return;
		};
		let mut view = state_wh.borrow_mut();
		view.wheel(input, ev.delta_y());
		camera.set(view.camera);
	};

	let grid_style = move || {
		let c = camera.get();
		let cell = 40.0 * c.scale;
		format!(
			"position: absolute; inset: 0; opacity: 0.1; pointer-events: none; \
			 background-image: linear-gradient(#334155 1px, transparent 1px), \
			 linear-gradient(90deg, #334155 1px, transparent 1px); \
			 background-size: {cell}px {cell}px; background-position: {}px {}px;",
			c.offset_x, c.offset_y
		)
	};

	view! {
		<div
			class="architecture-graph"
			style="position: relative; overflow: hidden; width: 100%; height: 100%; background: #0f172a; user-select: none;"
		>
			<div style=grid_style />
			<canvas
				node_ref=canvas_ref
				class="architecture-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style=move || format!("position: relative; display: block; cursor: {};", cursor.get())
			/>
			<div class="graph-hint">"SCROLL to Zoom • DRAG to Pan • CLICK Headers to Collapse"</div>
		</div>
	}
}

/// Shared handles the frame loop and simulation timer run on.
struct Loops {
	state: Rc<RefCell<GraphView>>,
	animate: FrameCallback,
	ticker: FrameCallback,
	alive: Arc<AtomicBool>,
	interval_id: Arc<AtomicI32>,
}

/// Sizes the canvas, then starts the render loop and the simulation timer.
/// Returns the window resize listener when tracking fullscreen.
fn start(
	canvas: HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
	loops: Loops,
) -> Result<Option<WindowListenerHandle>, CanvasError> {
	let window = web_sys::window().ok_or(CanvasError::NoWindow)?;
	let parent = canvas.parent_element();
	let (w, h) = if fullscreen {
		window_size(&window)?
	} else {
		(
			width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
			height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
		)
	};
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	let ctx = context_2d(&canvas)?;
	{
		let mut view = loops.state.borrow_mut();
		view.resize(w, h);
		view.camera = Camera::centered(w);
	}
	info!("architecture graph mounted at {w}x{h}");

	let resize = fullscreen.then(|| {
		let (state_resize, canvas_resize) = (loops.state.clone(), canvas.clone());
		window_event_listener(ev::resize, move |_| {
			let Some(win) = web_sys::window() else {
				return;
			};
			match window_size(&win) {
				Ok((nw, nh)) => {
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					state_resize.borrow_mut().resize(nw, nh);
				}
				Err(err) => warn!("resize ignored: {err}"),
			}
		})
	});

	let (state_tick, alive_tick) = (loops.state.clone(), loops.alive.clone());
	*loops.ticker.borrow_mut() = Some(Closure::new(move || {
		if alive_tick.load(Ordering::Relaxed) {
			state_tick.borrow_mut().tick_simulation();
		}
	}));
	if let Some(ref cb) = *loops.ticker.borrow() {
		let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
			cb.as_ref().unchecked_ref(),
			TICK_INTERVAL_MS,
		)?;
		loops.interval_id.store(id, Ordering::Relaxed);
	}

	let (state_anim, animate_inner, alive_anim) =
		(loops.state.clone(), loops.animate.clone(), loops.alive.clone());
	*loops.animate.borrow_mut() = Some(Closure::new(move || {
		if !alive_anim.load(Ordering::Relaxed) {
			return;
		}
		if let Err(err) = render::render(&state_anim.borrow(), &ctx, js_sys::Date::now()) {
			warn!("frame skipped: {err}");
		}
		let Some(win) = web_sys::window() else {
			return;
		};
		if let Some(ref cb) = *animate_inner.borrow() {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *loops.animate.borrow() {
		window.request_animation_frame(cb.as_ref().unchecked_ref())?;
	}
	Ok(resize)
}
